use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use intake::{
    ApplicationSession, FixedClock, InMemoryFile, LocalFile, MediaPayload, MediaSlot, MediaSource,
    NoticeLevel,
    NoticeLog, SectionId, SessionError, Submission, SubmissionEndpoint, SubmissionError,
    SubmissionReply, SubmitOutcome, SubmitStart, Track, Transition,
};
use pretty_assertions::assert_eq;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn session(track: Track) -> (ApplicationSession, NoticeLog) {
    let log = NoticeLog::new();
    let session = ApplicationSession::builder(track)
        .with_notifier(Arc::new(log.clone()))
        .with_clock(Arc::new(FixedClock::on(today())))
        .build()
        .unwrap();
    (session, log)
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

fn png(name: &str, len: usize) -> Option<Arc<dyn MediaSource>> {
    Some(Arc::new(InMemoryFile::new(name, vec![7u8; len])))
}

/// Fill every rule-bearing participant field with valid data.
async fn fill_participant(s: &mut ApplicationSession) {
    s.set_text("dateOfBirth", "2000-05-20").unwrap();
    for flag in [
        "isEligible",
        "hasValidPassport",
        "canTravel",
        "isGoodHealth",
        "willFollowRules",
        "agreeTerms",
    ] {
        s.set_flag(flag, true).unwrap();
    }
    for (field, value) in [
        ("firstName", "Ada"),
        ("lastName", "Lovelace"),
        ("email", "ada@example.com"),
        ("phone", "+233 20 000 0000"),
        ("country", "Ghana"),
        ("city", "Accra"),
        ("ethnicity", "Akan"),
        ("representCountry", "Ghana"),
        ("experience", "Analyst"),
        ("education", "BSc"),
        ("skills", "Mathematics"),
        ("bio", "Short bio."),
        ("socialMedia", "@ada"),
        ("countryOverview", "Overview."),
        ("culturalInfo", "Culture."),
    ] {
        s.set_text(field, value).unwrap();
    }
    s.set_text("motivation", words(20)).unwrap();
    s.set_text("goals", words(30)).unwrap();
    s.set_text("strategy", words(50)).unwrap();
    assert!(s.attach_media(MediaSlot::HeadShot1, png("head.png", 64)).await.unwrap());
    assert!(s.attach_media(MediaSlot::BodyShot1, png("body.png", 64)).await.unwrap());
}

#[derive(Default)]
struct RecordingEndpoint {
    received: Mutex<Vec<Submission>>,
    reply: Option<SubmissionReply>,
}

#[async_trait]
impl SubmissionEndpoint for RecordingEndpoint {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReply, SubmissionError> {
        self.received.lock().unwrap().push(submission.clone());
        self.reply
            .clone()
            .ok_or_else(|| SubmissionError::Transport("connection refused".into()))
    }
}

#[test]
fn seventeen_year_old_fails_the_age_rule() {
    let (mut s, _) = session(Track::Participant);
    let dob = today().checked_sub_months(Months::new(17 * 12)).unwrap();
    s.set_text("dateOfBirth", dob.format("%Y-%m-%d").to_string()).unwrap();
    let errors = s.engine().validate(SectionId::Eligibility, s.fields());
    let age: Vec<_> = errors.iter().filter(|e| e.field == "dateOfBirth").collect();
    assert_eq!(age.len(), 1);
    assert_eq!(
        age[0].message,
        "You must be between 18 and 35 years old to participate."
    );
    assert_eq!(s.fields().text("age"), "17");
}

#[test]
fn full_name_skips_missing_middle_name() {
    let (mut s, _) = session(Track::Participant);
    s.set_text("firstName", "Ada").unwrap();
    s.set_text("middleName", "").unwrap();
    s.set_text("lastName", "Lovelace").unwrap();
    assert_eq!(s.fields().text("fullName"), "Ada Lovelace");
}

#[test]
fn motivation_needs_twenty_words() {
    let (mut s, _) = session(Track::Participant);
    s.set_text("goals", words(25)).unwrap();
    s.set_text("motivation", words(19)).unwrap();
    assert_eq!(s.engine().validate(SectionId::Motivation, s.fields()).len(), 1);
    s.set_text("motivation", words(20)).unwrap();
    assert!(s.engine().validate(SectionId::Motivation, s.fields()).is_empty());
}

#[tokio::test]
async fn oversize_photo_stays_absent_and_notifies() {
    let (mut s, log) = session(Track::Participant);
    let attached = s
        .attach_media(MediaSlot::HeadShot1, png("huge.jpg", 3 * 1024 * 1024))
        .await
        .unwrap();
    assert!(!attached);
    assert!(s.fields().media(MediaSlot::HeadShot1).is_none());

    let notices = log.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].title, "File size exceeds 2MB limit.");
    assert_eq!(
        notices[0].description.as_deref(),
        Some("Please upload a smaller image for Head Shot 1.")
    );

    let photos = s.engine().validate(SectionId::Photos, s.fields());
    assert!(photos.iter().any(|e| e.field == "headShot1"));
}

#[test]
fn loaded_snapshot_media_obeys_size_and_format_rules() {
    let (mut s, _) = session(Track::Participant);
    let huge = MediaPayload::encode("image/png", &vec![7u8; 3 * 1024 * 1024]);
    let snapshot = serde_json::json!({ "headShot1": huge.as_str() });
    assert!(matches!(
        s.load_json(snapshot.as_object().unwrap()),
        Err(SessionError::Field(_))
    ));
    assert!(s.fields().media(MediaSlot::HeadShot1).is_none());

    let text = serde_json::json!({ "bodyShot1": "data:text/plain;base64,aGk=" });
    assert!(s.load_json(text.as_object().unwrap()).is_err());
    assert!(s.fields().media(MediaSlot::BodyShot1).is_none());

    let photo = MediaPayload::encode("image/jpeg", &[1, 2, 3]);
    let good = serde_json::json!({ "bodyShot1": photo.as_str() });
    assert_eq!(s.load_json(good.as_object().unwrap()).unwrap(), 1);
    assert_eq!(s.fields().media(MediaSlot::BodyShot1), Some(&photo));
}

#[tokio::test]
async fn unreadable_format_notifies_read_failure() {
    let (mut s, log) = session(Track::Participant);
    let attached = s
        .attach_media(MediaSlot::BodyShot2, png("résumé.pdf", 10))
        .await
        .unwrap();
    assert!(!attached);
    assert_eq!(log.drain()[0].title, "Failed to read image file.");
}

#[tokio::test]
async fn superseded_read_does_not_clobber_newer_selection() {
    let (mut s, _) = session(Track::Participant);
    let old = s
        .select_media(MediaSlot::HeadShot1, png("old.png", 8))
        .unwrap()
        .unwrap();
    let new = s
        .select_media(MediaSlot::HeadShot1, png("new.gif", 8))
        .unwrap()
        .unwrap();

    let new = new.read().await;
    assert!(s.complete_media(new).unwrap());
    let old = old.read().await;
    assert!(!s.complete_media(old).unwrap());

    let payload = s.fields().media(MediaSlot::HeadShot1).unwrap();
    assert_eq!(payload.mime(), Some("image/gif"));
}

#[tokio::test]
async fn clearing_the_input_is_synchronous() {
    let (mut s, _) = session(Track::Participant);
    s.attach_media(MediaSlot::AdditionalImage1, png("a.png", 4)).await.unwrap();
    assert!(s.fields().media(MediaSlot::AdditionalImage1).is_some());
    assert!(s.select_media(MediaSlot::AdditionalImage1, None).unwrap().is_none());
    assert!(s.fields().media(MediaSlot::AdditionalImage1).is_none());
}

#[tokio::test]
async fn local_file_round_trips_through_the_pipeline() {
    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    let bytes: Vec<u8> = (0u8..=255).collect();
    file.write_all(&bytes).unwrap();

    let source = LocalFile::open(file.path()).await.unwrap();
    assert_eq!(source.size(), 256);

    let (mut s, _) = session(Track::Participant);
    assert!(s.attach_media(MediaSlot::BodyShot1, Some(Arc::new(source))).await.unwrap());
    let (mime, decoded) = s.fields().media(MediaSlot::BodyShot1).unwrap().decode().unwrap();
    assert_eq!(mime, "image/png");
    assert_eq!(decoded, bytes);
}

#[tokio::test]
async fn next_walks_a_complete_application_to_review() {
    let (mut s, _) = session(Track::Participant);
    fill_participant(&mut s).await;
    let mut visited = vec![s.current()];
    while let Transition::Moved { to, .. } = s.next() {
        visited.push(to);
    }
    assert_eq!(s.current(), SectionId::Review);
    assert_eq!(visited.len(), 11);
    assert!(s.errors().is_empty());
}

#[test]
fn next_never_advances_past_violations() {
    let (mut s, _) = session(Track::Participant);
    for _ in 0..3 {
        assert!(matches!(s.next(), Transition::Blocked(_)));
        assert_eq!(s.current(), SectionId::Eligibility);
    }
}

#[tokio::test]
async fn contact_only_error_relocates_to_contact() {
    let (mut s, log) = session(Track::Participant);
    fill_participant(&mut s).await;
    while let Transition::Moved { .. } = s.next() {}
    assert_eq!(s.current(), SectionId::Review);

    s.set_text("email", "not-an-email").unwrap();
    let endpoint = RecordingEndpoint::default();
    let outcome = s.submit(&endpoint).await.unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Blocked {
            section: Some(SectionId::Contact),
            errors: vec![intake::FormError::new("email", "Email is invalid.")],
        }
    );
    assert_eq!(s.current(), SectionId::Contact);
    assert_eq!(s.errors().len(), 1);
    assert!(endpoint.received.lock().unwrap().is_empty());
    assert_eq!(log.drain().last().unwrap().title, "Please fix the errors before submitting");
}

#[tokio::test]
async fn missing_terms_blocks_submission_at_terms() {
    let (mut s, _) = session(Track::Participant);
    fill_participant(&mut s).await;
    s.set_flag("agreeTerms", false).unwrap();
    let outcome = s.submit(&RecordingEndpoint::default()).await.unwrap();
    assert!(matches!(
        outcome,
        SubmitOutcome::Blocked { section: Some(SectionId::Terms), .. }
    ));
    assert_eq!(s.current(), SectionId::Terms);
}

#[tokio::test]
async fn accepted_submission_clears_the_store() {
    let (mut s, log) = session(Track::Participant);
    fill_participant(&mut s).await;
    let endpoint = RecordingEndpoint {
        reply: Some(SubmissionReply::accepted()),
        ..Default::default()
    };

    assert_eq!(s.submit(&endpoint).await.unwrap(), SubmitOutcome::Submitted);
    assert!(!s.is_submitting());
    assert_eq!(s.fields().text("firstName"), "");
    assert!(s.fields().media(MediaSlot::HeadShot1).is_none());

    let sent = endpoint.received.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].fields["fullName"], "Ada Lovelace");
    assert!(sent[0].fields["headShot1"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(log.drain().last().unwrap().title, "Application submitted successfully!");
}

#[tokio::test]
async fn refused_submission_keeps_state() {
    let (mut s, log) = session(Track::Participant);
    fill_participant(&mut s).await;
    let endpoint = RecordingEndpoint {
        reply: Some(SubmissionReply::refused("Duplicate email")),
        ..Default::default()
    };
    assert_eq!(
        s.submit(&endpoint).await.unwrap(),
        SubmitOutcome::Rejected {
            message: "Duplicate email".into()
        }
    );
    assert_eq!(s.fields().text("firstName"), "Ada");
    assert_eq!(log.drain().last().unwrap().title, "Submission failed: Duplicate email.");
}

#[tokio::test]
async fn transport_failure_reports_network_error() {
    let (mut s, log) = session(Track::Participant);
    fill_participant(&mut s).await;
    let outcome = s.submit(&RecordingEndpoint::default()).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
    assert_eq!(s.fields().text("firstName"), "Ada");
    assert_eq!(
        log.drain().last().unwrap().title,
        "Network error. Please ensure the backend server is running and try again."
    );
}

#[tokio::test]
async fn stale_submission_result_is_discarded() {
    let (mut s, _) = session(Track::Participant);
    fill_participant(&mut s).await;

    let SubmitStart::Send(ticket) = s.begin_submit().unwrap() else {
        panic!("expected a clean application");
    };
    assert!(s.is_submitting());
    assert!(matches!(s.begin_submit(), Err(SessionError::SubmissionInFlight)));

    // The user keeps working while the request is pending.
    s.previous();
    s.restart();
    s.set_text("firstName", "Grace").unwrap();

    let endpoint = RecordingEndpoint {
        reply: Some(SubmissionReply::accepted()),
        ..Default::default()
    };
    let result = ticket.send(&endpoint).await;
    assert_eq!(s.finish_submit(result), SubmitOutcome::Discarded);
    assert_eq!(s.fields().text("firstName"), "Grace");
}

#[tokio::test]
async fn abandoned_submission_can_be_retried() {
    let (mut s, _) = session(Track::Participant);
    fill_participant(&mut s).await;
    let SubmitStart::Send(first) = s.begin_submit().unwrap() else {
        panic!()
    };
    s.abandon_submission();
    let SubmitStart::Send(second) = s.begin_submit().unwrap() else {
        panic!()
    };

    let endpoint = RecordingEndpoint {
        reply: Some(SubmissionReply::accepted()),
        ..Default::default()
    };
    let late = first.send(&endpoint).await;
    assert_eq!(s.finish_submit(late), SubmitOutcome::Discarded);
    let fresh = second.send(&endpoint).await;
    assert_eq!(s.finish_submit(fresh), SubmitOutcome::Submitted);
}

#[tokio::test]
async fn director_application_flow() {
    let (mut s, _) = session(Track::Director);
    assert_eq!(s.sections().len(), 6);
    for (field, value) in [
        ("fullName", "Kofi Mensah"),
        ("email", "kofi@example.org"),
        ("phone", "0241234567"),
        ("country", "Ghana"),
        ("city", "Kumasi"),
        ("motivation", "I want to grow the pageant nationally."),
        ("goals", "Run a national final every year."),
        ("strategy", "Partner with schools, media and sponsors in every region."),
        ("dateOfBirth", "1985-03-02"),
        ("bio", "Event organiser."),
        ("socialMedia", "@kofi"),
        ("countryOverview", "Overview."),
        ("culturalInfo", "Culture."),
    ] {
        s.set_text(field, value).unwrap();
    }

    // Agreement gates progress until both flags are set.
    while let Transition::Moved { .. } = s.next() {}
    assert_eq!(s.current(), SectionId::Agreement);
    s.set_flag("agreeToTerms", true).unwrap();
    s.set_flag("agreeToConfidentiality", true).unwrap();
    while let Transition::Moved { .. } = s.next() {}
    assert_eq!(s.current(), SectionId::CountryInfo);

    let endpoint = RecordingEndpoint {
        reply: Some(SubmissionReply::accepted()),
        ..Default::default()
    };
    assert_eq!(s.submit(&endpoint).await.unwrap(), SubmitOutcome::Submitted);
    let sent = endpoint.received.lock().unwrap();
    assert!(sent[0].fields.get("headShot1").is_none());
    assert_eq!(sent[0].fields["agreeToConfidentiality"], true);
}
