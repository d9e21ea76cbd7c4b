//! Notification collaborator.
//!
//! The core only produces message text; presentation is up to the embedder.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{info, warn};

use crate::validation::FormError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Error notice whose description lists every violation, `"; "`-joined.
    pub fn violations(title: impl Into<String>, errors: &[FormError]) -> Self {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Self::error(title).with_description(joined)
    }
}

/// Fire-and-forget sink for user-facing messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that records every notice and mirrors it to the log.
///
/// Clones share the same buffer, so a caller can hand one clone to a
/// session and drain the other.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        let description = notice.description.as_deref().unwrap_or_default();
        match notice.level {
            NoticeLevel::Error => warn!(title = %notice.title, description, "notice"),
            _ => info!(level = %notice.level, title = %notice.title, description, "notice"),
        }
        match self.notices.lock() {
            Ok(mut guard) => guard.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_are_joined() {
        let notice = Notice::violations(
            "Please fix the errors before submitting",
            &[
                FormError::new("bio", "Bio is required."),
                FormError::new("city", "City is required."),
            ],
        );
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(
            notice.description.as_deref(),
            Some("Bio is required.; City is required.")
        );
    }

    #[test]
    fn clones_share_the_buffer() {
        let log = NoticeLog::new();
        let handle: Arc<dyn Notifier> = Arc::new(log.clone());
        handle.notify(Notice::success("done"));
        assert_eq!(log.snapshot().len(), 1);
        assert_eq!(log.drain()[0].title, "done");
        assert!(log.snapshot().is_empty());
    }
}
