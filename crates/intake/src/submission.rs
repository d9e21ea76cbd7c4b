//! Submission coordinator.
//!
//! Re-validates the whole application, decides between sending and sending
//! the user back to the first errored section, and wraps the request so a
//! late reply can be matched against the session that issued it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

use crate::fields::FieldStore;
use crate::sections::SectionId;
use crate::validation::{FormError, ValidationEngine};

/// The request body: every field plus the submission timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(flatten)]
    pub fields: JsonMap<String, JsonValue>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(fields: &FieldStore, submitted_at: DateTime<Utc>) -> Self {
        Self {
            fields: fields.to_json(),
            submitted_at,
        }
    }
}

/// What the endpoint said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReply {
    pub accepted: bool,
    /// Shown verbatim when the submission is refused.
    pub message: Option<String>,
}

impl SubmissionReply {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            message: None,
        }
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

/// External receiver of completed applications.
#[async_trait]
pub trait SubmissionEndpoint: Send + Sync {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReply, SubmissionError>;
}

/// Result of the pre-send check.
#[derive(Debug, Clone, PartialEq)]
pub enum Preflight {
    Ready(Submission),
    Blocked {
        /// First section owning a violation, if any could be identified.
        section: Option<SectionId>,
        errors: Vec<FormError>,
    },
}

/// Validate everything that must hold before sending.
pub fn preflight(engine: &ValidationEngine, fields: &FieldStore, now: DateTime<Utc>) -> Preflight {
    let errors = engine.validate_for_submission(fields);
    if errors.is_empty() {
        return Preflight::Ready(Submission::new(fields, now));
    }
    let section = engine
        .catalog()
        .first_offending_section(errors.iter().map(|e| e.field.as_str()));
    Preflight::Blocked { section, errors }
}

/// A submission in flight, tagged with the session generation it belongs to.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub(crate) generation: u64,
    submission: Submission,
}

impl SubmissionTicket {
    pub(crate) fn new(generation: u64, submission: Submission) -> Self {
        Self {
            generation,
            submission,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    /// Perform the request. Touches no session state, so the caller may
    /// keep interacting with the session meanwhile.
    pub async fn send(self, endpoint: &dyn SubmissionEndpoint) -> SubmissionResult {
        let result = endpoint.submit(&self.submission).await;
        SubmissionResult {
            generation: self.generation,
            result,
        }
    }
}

/// Terminal result of a `SubmissionTicket`.
#[derive(Debug)]
pub struct SubmissionResult {
    pub(crate) generation: u64,
    pub result: Result<SubmissionReply, SubmissionError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted; the store has been cleared.
    Submitted,
    /// The endpoint refused; state is intact.
    Rejected { message: String },
    /// The request never got a usable reply; state is intact.
    Failed { error: String },
    /// Violations found; nothing was sent.
    Blocked {
        section: Option<SectionId>,
        errors: Vec<FormError>,
    },
    /// The session moved on (restart or abandon) before the reply arrived.
    Discarded,
}
