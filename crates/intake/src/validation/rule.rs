//! Rule descriptors.
//!
//! A rule is bound to one field and evaluates to at most one `FormError`.
//! Rules only read the store.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use super::FormError;
use crate::derived::{age_on, parse_date};
use crate::fields::FieldStore;
use crate::media::MediaSlot;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Non-empty after trimming.
    Required,
    /// Required, then `local@domain.tld`.
    Email,
    /// Required `YYYY-MM-DD` date whose age lies in `[min, max]`.
    AgeRange { min: i32, max: i32 },
    /// Required `YYYY-MM-DD` date.
    IsoDate,
    /// Flag must be `true`.
    Affirmed,
    /// Whitespace-delimited token count in `[min, max]`.
    WordCount { min: usize, max: usize },
    /// Non-empty, and character count in `[min, max]`.
    CharCount { min: usize, max: usize },
    /// Media slot must hold a payload.
    MediaPresent(MediaSlot),
}

/// Why a rule failed; picks the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Missing,
    Malformed,
    OutOfRange,
    TooShort,
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    field: &'static str,
    label: &'static str,
    kind: RuleKind,
    message: Option<&'static str>,
}

impl Rule {
    pub fn new(field: &'static str, label: &'static str, kind: RuleKind) -> Self {
        Self {
            field,
            label,
            kind,
            message: None,
        }
    }

    pub fn required(field: &'static str, label: &'static str) -> Self {
        Self::new(field, label, RuleKind::Required)
    }

    pub fn email(field: &'static str, label: &'static str) -> Self {
        Self::new(field, label, RuleKind::Email)
    }

    pub fn affirmed(field: &'static str, message: &'static str) -> Self {
        Self::new(field, field, RuleKind::Affirmed).message(message)
    }

    pub fn words(field: &'static str, label: &'static str, min: usize, max: usize) -> Self {
        Self::new(field, label, RuleKind::WordCount { min, max })
    }

    pub fn chars(field: &'static str, label: &'static str, min: usize, max: usize) -> Self {
        Self::new(field, label, RuleKind::CharCount { min, max })
    }

    pub fn media(slot: MediaSlot) -> Self {
        Self::new(slot.field(), slot.label(), RuleKind::MediaPresent(slot))
    }

    /// Fixed message used for every failure of this rule.
    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn evaluate(&self, store: &FieldStore, today: NaiveDate) -> Option<FormError> {
        let failure = self.check(store, today)?;
        Some(FormError::new(self.field, self.describe(failure)))
    }

    fn check(&self, store: &FieldStore, today: NaiveDate) -> Option<Failure> {
        let text = store.text(self.field);
        match &self.kind {
            RuleKind::Required => text.trim().is_empty().then_some(Failure::Missing),
            RuleKind::Email => {
                if text.trim().is_empty() {
                    Some(Failure::Missing)
                } else if !is_email(text) {
                    Some(Failure::Malformed)
                } else {
                    None
                }
            }
            RuleKind::AgeRange { min, max } => {
                if text.trim().is_empty() {
                    return Some(Failure::Missing);
                }
                let Some(dob) = parse_date(text) else {
                    return Some(Failure::Malformed);
                };
                let age = age_on(dob, today);
                (age < *min || age > *max).then_some(Failure::OutOfRange)
            }
            RuleKind::IsoDate => {
                if text.trim().is_empty() {
                    Some(Failure::Missing)
                } else if parse_date(text).is_none() {
                    Some(Failure::Malformed)
                } else {
                    None
                }
            }
            RuleKind::Affirmed => (!store.flag(self.field)).then_some(Failure::Missing),
            RuleKind::WordCount { min, max } => {
                let n = count_words(text);
                (n < *min || n > *max).then_some(Failure::OutOfRange)
            }
            RuleKind::CharCount { min, max } => {
                if text.trim().is_empty() {
                    return Some(Failure::Missing);
                }
                let n = count_chars(text);
                if n < *min {
                    Some(Failure::TooShort)
                } else if n > *max {
                    Some(Failure::TooLong)
                } else {
                    None
                }
            }
            RuleKind::MediaPresent(slot) => store.media(*slot).is_none().then_some(Failure::Missing),
        }
    }

    fn describe(&self, failure: Failure) -> String {
        if let Some(m) = self.message {
            return m.to_string();
        }
        let label = self.label;
        match (&self.kind, failure) {
            (RuleKind::AgeRange { min, max }, Failure::OutOfRange) => {
                format!("You must be between {min} and {max} years old to participate.")
            }
            (RuleKind::AgeRange { .. } | RuleKind::IsoDate, Failure::Malformed) => {
                format!("{label} must be in YYYY-MM-DD format.")
            }
            (RuleKind::Email, Failure::Malformed) => format!("{label} is invalid."),
            (RuleKind::WordCount { min, max }, _) => {
                format!("{label} must be between {min} and {max} words.")
            }
            (RuleKind::CharCount { min, .. }, Failure::TooShort) => {
                format!("{label} must be at least {min} characters.")
            }
            (RuleKind::CharCount { max, .. }, Failure::TooLong) => {
                format!("{label} must be {max} characters or less.")
            }
            (RuleKind::Affirmed, _) => format!("{label} must be confirmed."),
            _ => format!("{label} is required."),
        }
    }
}

/// Basic `local@domain.tld` shape.
pub fn is_email(text: &str) -> bool {
    EMAIL.is_match(text.trim())
}

/// Whitespace-delimited, non-empty tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Unicode scalar values, not bytes.
pub fn count_chars(text: &str) -> usize {
    text.chars().count()
}
