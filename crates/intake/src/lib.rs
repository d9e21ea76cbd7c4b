//! Core of the application intake wizard.
//!
//! Layers, leaves first:
//!   * `fields`     : per-session field store (text, flags, media payloads)
//!   * `derived`    : recomputation of dependent fields (full name, age)
//!   * `media`      : file -> size-checked, encoded payload pipeline
//!   * `validation` : per-section rule catalogs and their evaluation
//!   * `navigator`  : ordered section state machine
//!   * `submission` : final aggregation + hand-off to the submit endpoint
//!   * `session`    : owns all of the above for one interactive user
//!
//! `payment` and `notify` describe the collaborators the session talks to.
//! Rendering, routing and transport are left to the embedding application.

pub mod clock;
pub mod derived;
pub mod fields;
pub mod media;
pub mod navigator;
pub mod notify;
pub mod payment;
pub mod sections;
pub mod session;
pub mod settings;
pub mod submission;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use fields::{FieldError, FieldKind, FieldSchema, FieldStore, FieldValue};
pub use media::{
    InMemoryFile, LocalFile, MediaError, MediaPayload, MediaPipeline, MediaSlot, MediaSource,
};
pub use navigator::{Navigator, SectionStatus, Transition};
pub use notify::{Notice, NoticeLevel, NoticeLog, Notifier};
pub use payment::{PaymentForm, PaymentOutcome, PaymentQuote, PaymentStep};
pub use sections::{Section, SectionId, SectionKind, Track};
pub use session::{ApplicationSession, ApplicationSessionBuilder, SessionError, SubmitStart};
pub use settings::IntakeSettings;
pub use submission::{
    Submission, SubmissionEndpoint, SubmissionError, SubmissionReply, SubmissionTicket, SubmitOutcome,
};
pub use validation::{FormError, RuleCatalog, ValidationEngine};
