use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use intake::media::LocalFile;
use intake::payment::PaymentForm;
use intake::{
    ApplicationSession, FormError, IntakeSettings, Notice, NoticeLog, SectionId, SubmitOutcome,
    Track,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::cli::{Attachment, Cmd};
use crate::endpoint::HttpEndpoint;

/// Run one command. `Ok(false)` means the command completed but found
/// problems (violations, refused submission).
pub async fn run(cmd: Cmd, settings: &IntakeSettings) -> Result<bool> {
    match cmd {
        Cmd::Sections { track } => {
            sections(track);
            Ok(true)
        }
        Cmd::Validate {
            track,
            input,
            section,
        } => validate(settings, track, &input, section),
        Cmd::Submit {
            track,
            input,
            attachments,
        } => submit(settings, track, &input, &attachments).await,
        Cmd::Quote {
            track,
            amount,
            country,
            email,
        } => quote(settings, track, amount, country, email),
    }
}

fn sections(track: Track) {
    for s in track.sections() {
        println!("{:>2}. {:<26} {}", s.badge, s.title, s.id);
    }
}

fn load_snapshot(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    match serde_json::from_str::<Value>(&raw).wrap_err_with(|| format!("parsing {}", path.display()))? {
        Value::Object(map) => Ok(map),
        _ => Err(eyre!("{} must contain a JSON object", path.display())),
    }
}

fn open_session(
    settings: &IntakeSettings,
    track: Track,
    input: &Path,
    log: &NoticeLog,
) -> Result<ApplicationSession> {
    let mut session = ApplicationSession::builder(track)
        .with_settings(settings.clone())
        .with_notifier(Arc::new(log.clone()))
        .build()?;
    let snapshot = load_snapshot(input)?;
    let count = session.load_json(&snapshot)?;
    info!(session = %session.id(), %track, count, "snapshot loaded");
    Ok(session)
}

fn print_errors(errors: &[FormError]) {
    for e in errors {
        println!("  - {}: {}", e.field, e.message);
    }
}

fn print_notices(notices: &[Notice]) {
    for n in notices {
        match &n.description {
            Some(d) => println!("[{}] {} ({d})", n.level, n.title),
            None => println!("[{}] {}", n.level, n.title),
        }
    }
}

fn validate(
    settings: &IntakeSettings,
    track: Track,
    input: &Path,
    only: Option<SectionId>,
) -> Result<bool> {
    let log = NoticeLog::new();
    let session = open_session(settings, track, input, &log)?;
    let targets: Vec<_> = match only {
        Some(id) => vec![track
            .section(id)
            .ok_or_else(|| eyre!("section {id} is not part of the {track} track"))?],
        None => track.sections().iter().collect(),
    };

    let mut clean = true;
    for section in targets {
        let errors = session.engine().validate(section.id, session.fields());
        if errors.is_empty() {
            println!("{:>2}. {}: ok", section.badge, section.title);
        } else {
            clean = false;
            println!("{:>2}. {}: {} problem(s)", section.badge, section.title, errors.len());
            print_errors(&errors);
        }
    }
    Ok(clean)
}

async fn submit(
    settings: &IntakeSettings,
    track: Track,
    input: &Path,
    attachments: &[Attachment],
) -> Result<bool> {
    let log = NoticeLog::new();
    let mut session = open_session(settings, track, input, &log)?;

    for a in attachments {
        let file = LocalFile::open(&a.path)
            .await
            .wrap_err_with(|| format!("opening {}", a.path.display()))?;
        let attached = session.attach_media(a.slot, Some(Arc::new(file))).await?;
        println!(
            "{} <- {}: {}",
            a.slot,
            a.path.display(),
            if attached { "attached" } else { "rejected" }
        );
    }

    let endpoint = HttpEndpoint::new(
        settings.submission.endpoint.clone(),
        Duration::from_secs(settings.submission.timeout_secs),
    )?;
    let outcome = session.submit(&endpoint).await?;
    print_notices(&log.drain());

    match outcome {
        SubmitOutcome::Submitted => {
            println!("submitted to {}", settings.submission.endpoint);
            Ok(true)
        }
        SubmitOutcome::Blocked { section, errors } => {
            if let Some(section) = section {
                println!("first section to fix: {section}");
            }
            print_errors(&errors);
            Ok(false)
        }
        SubmitOutcome::Rejected { .. } | SubmitOutcome::Failed { .. } | SubmitOutcome::Discarded => {
            Ok(false)
        }
    }
}

fn quote(
    settings: &IntakeSettings,
    track: Track,
    amount: Option<String>,
    country: Option<String>,
    email: String,
) -> Result<bool> {
    let mut form = PaymentForm::prefilled(&settings.payment);
    if let Some(amount) = amount {
        form.amount_usd = amount;
    }
    if let Some(country) = country {
        form.country = country;
    }
    form.email = email;

    match form.quote(track, &settings.payment) {
        Ok(quote) => {
            println!("{} ({})", quote.display_amount(), quote.currency);
            println!("{}", serde_json::to_string_pretty(&quote)?);
            Ok(true)
        }
        Err(errors) => {
            println!("Please fix the errors before proceeding.");
            print_errors(&errors);
            Ok(false)
        }
    }
}
