//! One interactive application session.
//!
//! The session is the single writer of its field store and wizard state.
//! Suspending work (media reads, the submission request) is split into a
//! synchronous start that hands out a tagged request, the I/O itself which
//! borrows nothing from the session, and a synchronous completion that
//! drops results the session has moved past.

use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::derived::DerivedFields;
use crate::fields::{FieldError, FieldSchema, FieldStore};
use crate::media::{MediaError, MediaPipeline, MediaSlot, MediaSource, PendingRead, ReadOutcome, Selection};
use crate::navigator::{Navigator, SectionStatus, Transition};
use crate::notify::{Notice, NoticeLog, Notifier};
use crate::sections::{Section, SectionId, Track};
use crate::settings::IntakeSettings;
use crate::submission::{
    preflight, Preflight, SubmissionEndpoint, SubmissionResult, SubmissionTicket, SubmitOutcome,
};
use crate::validation::{FormError, RuleCatalog, ValidationEngine};

const MIB: u64 = 1024 * 1024;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),
}

/// First half of a submission.
#[derive(Debug)]
pub enum SubmitStart {
    /// Clean; send the ticket and pass its result to `finish_submit`.
    Send(SubmissionTicket),
    /// Violations were published and the navigator moved to the first
    /// errored section (if it could be identified).
    Blocked(SubmitOutcome),
}

pub struct ApplicationSessionBuilder {
    track: Track,
    settings: IntakeSettings,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ApplicationSessionBuilder {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            settings: IntakeSettings::default(),
            notifier: None,
            clock: None,
        }
    }

    pub fn with_settings(mut self, settings: IntakeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Where user-facing notices go. Defaults to a private `NoticeLog`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<ApplicationSession, SessionError> {
        let settings = self.settings;
        if settings.eligibility.min_age > settings.eligibility.max_age {
            return Err(SessionError::InvalidSettings("min_age exceeds max_age"));
        }
        if settings.media.max_bytes == 0 {
            return Err(SessionError::InvalidSettings("media max_bytes must be positive"));
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(NoticeLog::new()));
        let catalog = Arc::new(RuleCatalog::for_track(self.track, &settings.eligibility));

        let session = ApplicationSession {
            id: Uuid::new_v4(),
            track: self.track,
            store: FieldStore::new(FieldSchema::for_track(self.track)),
            derived: DerivedFields::for_track(self.track),
            engine: ValidationEngine::new(catalog, clock.clone()),
            navigator: Navigator::new(self.track),
            media: MediaPipeline::new(settings.media.max_bytes),
            notifier,
            clock,
            settings,
            focused: None,
            submitting: false,
            generation: 0,
        };
        debug!(session = %session.id, track = %session.track, "session created");
        Ok(session)
    }
}

pub struct ApplicationSession {
    id: Uuid,
    track: Track,
    settings: IntakeSettings,
    store: FieldStore,
    derived: DerivedFields,
    engine: ValidationEngine,
    navigator: Navigator,
    media: MediaPipeline,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    /// Field the user is editing, if any.
    focused: Option<String>,
    submitting: bool,
    /// Bumped whenever in-flight submissions must be ignored.
    generation: u64,
}

impl ApplicationSession {
    pub fn builder(track: Track) -> ApplicationSessionBuilder {
        ApplicationSessionBuilder::new(track)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn track(&self) -> Track {
        self.track
    }

    pub fn settings(&self) -> &IntakeSettings {
        &self.settings
    }

    pub fn fields(&self) -> &FieldStore {
        &self.store
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    pub fn sections(&self) -> &'static [Section] {
        self.track.sections()
    }

    pub fn current(&self) -> SectionId {
        self.navigator.current()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn status(&self, id: SectionId) -> Option<SectionStatus> {
        self.navigator.status(id)
    }

    /// Currently published violations.
    pub fn errors(&self) -> &[FormError] {
        self.navigator.errors()
    }

    pub fn error_for(&self, field: &str) -> Option<&FormError> {
        self.errors().iter().find(|e| e.field == field)
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn focus(&mut self, field: Option<&str>) {
        self.focused = field.map(str::to_string);
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) -> Result<(), SessionError> {
        self.store.set_text(name, value)?;
        self.derived.on_change(&mut self.store, name, self.clock.today());
        Ok(())
    }

    pub fn set_flag(&mut self, name: &str, value: bool) -> Result<(), SessionError> {
        self.store.set_flag(name, value)?;
        self.derived.on_change(&mut self.store, name, self.clock.today());
        Ok(())
    }

    /// Merge a saved snapshot. Derived fields are recomputed afterwards.
    pub fn load_json(&mut self, snapshot: &JsonMap<String, JsonValue>) -> Result<usize, SessionError> {
        let names = self.store.apply_json(snapshot, self.settings.media.max_bytes)?;
        self.derived.recompute_all(&mut self.store, self.clock.today());
        debug!(session = %self.id, count = names.len(), "snapshot loaded");
        Ok(names.len())
    }

    /// Start an attachment. Clears and oversize rejections take effect
    /// immediately; otherwise the returned read must be driven and handed
    /// to `complete_media`.
    pub fn select_media(
        &mut self,
        slot: MediaSlot,
        file: Option<Arc<dyn MediaSource>>,
    ) -> Result<Option<PendingRead>, SessionError> {
        if !self.store.schema().has_slot(slot) {
            return Err(FieldError::UnknownField(slot.field().to_string()).into());
        }
        match self.media.select(slot, file) {
            Selection::Cleared => {
                self.store.set_media(slot, None)?;
                Ok(None)
            }
            Selection::Rejected { size, limit } => {
                self.store.set_media(slot, None)?;
                warn!(session = %self.id, %slot, size, limit, "upload over size limit");
                self.notify_oversize(slot, limit);
                Ok(None)
            }
            Selection::Pending(read) => Ok(Some(read)),
        }
    }

    /// Apply a finished read. Returns `false` when it was superseded.
    pub fn complete_media(&mut self, outcome: ReadOutcome) -> Result<bool, SessionError> {
        if !self.media.accepts(&outcome) {
            return Ok(false);
        }
        let slot = outcome.slot;
        match outcome.result {
            Ok(payload) => {
                info!(session = %self.id, %slot, "image attached");
                self.store.set_media(slot, Some(payload))?;
            }
            Err(MediaError::TooLarge { size, limit }) => {
                self.store.set_media(slot, None)?;
                warn!(session = %self.id, %slot, size, limit, "upload over size limit");
                self.notify_oversize(slot, limit);
            }
            Err(e) => {
                self.store.set_media(slot, None)?;
                warn!(session = %self.id, %slot, "image read failed: {e}");
                self.notifier.notify(
                    Notice::error("Failed to read image file.")
                        .with_description("Please try another image or format."),
                );
            }
        }
        Ok(true)
    }

    /// Select, read and apply in one go. Returns whether the slot now holds
    /// a payload.
    pub async fn attach_media(
        &mut self,
        slot: MediaSlot,
        file: Option<Arc<dyn MediaSource>>,
    ) -> Result<bool, SessionError> {
        if let Some(read) = self.select_media(slot, file)? {
            let outcome = read.read().await;
            self.complete_media(outcome)?;
        }
        Ok(self.store.media(slot).is_some())
    }

    pub fn next(&mut self) -> Transition {
        let transition = self.navigator.next(&self.engine, &self.store);
        if let Transition::Blocked(errors) = &transition {
            self.notifier.notify(Notice::violations(
                "Please fix the errors before proceeding to the next section.",
                errors,
            ));
        }
        transition
    }

    pub fn previous(&mut self) -> Transition {
        self.navigator.previous()
    }

    pub fn jump_to(&mut self, target: SectionId) -> Transition {
        self.navigator.jump_to(target)
    }

    /// Re-validate everything and either hand out a ticket or relocate to
    /// the first errored section.
    pub fn begin_submit(&mut self) -> Result<SubmitStart, SessionError> {
        if self.submitting {
            return Err(SessionError::SubmissionInFlight);
        }
        match preflight(&self.engine, &self.store, self.clock.now()) {
            Preflight::Ready(submission) => {
                self.submitting = true;
                self.navigator.publish(Vec::new());
                debug!(session = %self.id, generation = self.generation, "submission started");
                Ok(SubmitStart::Send(SubmissionTicket::new(self.generation, submission)))
            }
            Preflight::Blocked { section, errors } => {
                self.navigator.publish(errors.clone());
                if let Some(target) = section {
                    self.navigator.relocate(target);
                }
                debug!(
                    session = %self.id,
                    count = errors.len(),
                    section = ?section,
                    "submission blocked"
                );
                self.notifier.notify(Notice::violations(
                    "Please fix the errors before submitting",
                    &errors,
                ));
                Ok(SubmitStart::Blocked(SubmitOutcome::Blocked { section, errors }))
            }
        }
    }

    pub fn finish_submit(&mut self, result: SubmissionResult) -> SubmitOutcome {
        if result.generation != self.generation {
            debug!(
                session = %self.id,
                stale = result.generation,
                current = self.generation,
                "discarding stale submission result"
            );
            return SubmitOutcome::Discarded;
        }
        self.submitting = false;

        match result.result {
            Ok(reply) if reply.accepted => {
                info!(session = %self.id, "application submitted");
                self.store.clear();
                self.media.invalidate_all();
                self.notifier.notify(
                    Notice::success("Application submitted successfully!")
                        .with_description("We'll review your application and contact you soon."),
                );
                SubmitOutcome::Submitted
            }
            Ok(reply) => {
                let message = reply.message.unwrap_or_else(|| "Unknown error".to_string());
                warn!(session = %self.id, %message, "submission refused");
                self.notifier.notify(
                    Notice::error(format!("Submission failed: {message}."))
                        .with_description("Please check your input and try again."),
                );
                SubmitOutcome::Rejected { message }
            }
            Err(e) => {
                warn!(session = %self.id, "submission failed: {e}");
                self.notifier.notify(Notice::error(
                    "Network error. Please ensure the backend server is running and try again.",
                ));
                SubmitOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Whole submission in one call.
    pub async fn submit(&mut self, endpoint: &dyn SubmissionEndpoint) -> Result<SubmitOutcome, SessionError> {
        match self.begin_submit()? {
            SubmitStart::Blocked(outcome) => Ok(outcome),
            SubmitStart::Send(ticket) => {
                let result = ticket.send(endpoint).await;
                Ok(self.finish_submit(result))
            }
        }
    }

    /// Stop waiting for the in-flight submission; its result will be discarded.
    pub fn abandon_submission(&mut self) {
        if self.submitting {
            self.generation += 1;
            self.submitting = false;
            debug!(session = %self.id, "submission abandoned");
        }
    }

    /// Back to the initial state: empty store, first section, nothing pending.
    pub fn restart(&mut self) {
        self.store.clear();
        self.navigator.reset();
        self.media.invalidate_all();
        self.generation += 1;
        self.submitting = false;
        self.focused = None;
        debug!(session = %self.id, "session restarted");
    }

    fn notify_oversize(&self, slot: MediaSlot, limit: u64) {
        let ceiling = if limit % MIB == 0 {
            format!("{}MB", limit / MIB)
        } else {
            format!("{limit} byte")
        };
        self.notifier.notify(
            Notice::error(format!("File size exceeds {ceiling} limit."))
                .with_description(format!("Please upload a smaller image for {}.", slot.label())),
        );
    }
}

impl std::fmt::Debug for ApplicationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationSession")
            .field("id", &self.id)
            .field("track", &self.track)
            .field("current", &self.navigator.current())
            .field("submitting", &self.submitting)
            .finish_non_exhaustive()
    }
}
