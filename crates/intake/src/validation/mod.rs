//! Validation engine.
//!
//! `validate(section, fields)` evaluates every rule the section owns and
//! returns all violations; rule-less sections are always clean.

mod catalog;
mod rule;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use catalog::RuleCatalog;
pub use rule::{count_chars, count_words, is_email, Rule, RuleKind};

use crate::clock::Clock;
use crate::fields::FieldStore;
use crate::sections::{SectionId, SectionKind};

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormError {
    pub field: String,
    pub message: String,
}

impl FormError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Clone)]
pub struct ValidationEngine {
    catalog: Arc<RuleCatalog>,
    clock: Arc<dyn Clock>,
}

impl ValidationEngine {
    pub fn new(catalog: Arc<RuleCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn validate(&self, section: SectionId, fields: &FieldStore) -> Vec<FormError> {
        let today = self.clock.today();
        self.catalog
            .rules_for(section)
            .iter()
            .filter_map(|rule| rule.evaluate(fields, today))
            .collect()
    }

    /// Union of every form section's violations followed by the
    /// terms-acceptance check, in section order.
    pub fn validate_for_submission(&self, fields: &FieldStore) -> Vec<FormError> {
        let mut errors: Vec<FormError> = self
            .catalog
            .sections()
            .iter()
            .filter(|s| s.kind == SectionKind::Form)
            .flat_map(|s| self.validate(s.id, fields))
            .collect();
        if let Some(terms) = self.catalog.terms_section() {
            errors.extend(self.validate(terms, fields));
        }
        errors
    }
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("track", &self.catalog.track())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clock::FixedClock;
    use crate::fields::FieldSchema;
    use crate::sections::Track;
    use crate::settings::EligibilitySettings;

    fn engine(track: Track) -> ValidationEngine {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        ValidationEngine::new(
            Arc::new(RuleCatalog::for_track(track, &EligibilitySettings::default())),
            Arc::new(FixedClock::on(today)),
        )
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn empty_contact_reports_every_rule() {
        let e = engine(Track::Participant);
        let store = FieldStore::new(FieldSchema::for_track(Track::Participant));
        let fields: Vec<_> = e
            .validate(SectionId::Contact, &store)
            .into_iter()
            .map(|err| err.field)
            .collect();
        assert_eq!(fields, ["firstName", "lastName", "email", "phone", "country", "city"]);
    }

    #[test]
    fn motivation_word_threshold() {
        let e = engine(Track::Participant);
        let mut store = FieldStore::new(FieldSchema::for_track(Track::Participant));
        store.set_text("goals", words(20)).unwrap();

        store.set_text("motivation", words(19)).unwrap();
        assert_eq!(
            e.validate(SectionId::Motivation, &store),
            vec![FormError::new("motivation", "Motivation must be between 20 and 500 words.")]
        );

        store.set_text("motivation", words(20)).unwrap();
        assert!(e.validate(SectionId::Motivation, &store).is_empty());
    }

    #[test]
    fn out_of_window_age_is_a_single_violation() {
        let e = engine(Track::Participant);
        let mut store = FieldStore::new(FieldSchema::for_track(Track::Participant));
        store.set_text("dateOfBirth", "2009-10-16").unwrap();
        let age_errors: Vec<_> = e
            .validate(SectionId::Eligibility, &store)
            .into_iter()
            .filter(|err| err.field == "dateOfBirth")
            .collect();
        assert_eq!(
            age_errors,
            vec![FormError::new(
                "dateOfBirth",
                "You must be between 18 and 35 years old to participate."
            )]
        );
    }

    #[test]
    fn review_always_validates_clean() {
        let e = engine(Track::Participant);
        let store = FieldStore::new(FieldSchema::for_track(Track::Participant));
        assert!(e.validate(SectionId::Review, &store).is_empty());
    }

    #[test]
    fn submission_check_includes_terms_last() {
        let e = engine(Track::Participant);
        let store = FieldStore::new(FieldSchema::for_track(Track::Participant));
        let all = e.validate_for_submission(&store);
        assert_eq!(all.first().map(|err| err.field.as_str()), Some("dateOfBirth"));
        assert_eq!(all.last().map(|err| err.field.as_str()), Some("agreeTerms"));
        assert_eq!(all.iter().filter(|err| err.field == "agreeTerms").count(), 1);
    }

    #[test]
    fn director_rules_use_character_minimums() {
        let e = engine(Track::Director);
        let mut store = FieldStore::new(FieldSchema::for_track(Track::Director));
        store.set_text("fullName", "A").unwrap();
        store.set_text("email", "nope").unwrap();
        store.set_text("phone", "0241234567").unwrap();
        store.set_text("country", "Ghana").unwrap();
        store.set_text("city", "Accra").unwrap();
        assert_eq!(
            e.validate(SectionId::Contact, &store),
            vec![
                FormError::new("fullName", "Full name is required."),
                FormError::new("email", "Valid email address is required."),
            ]
        );

        store.set_text("dateOfBirth", "12/01/1990").unwrap();
        let profile = e.validate(SectionId::Profile, &store);
        assert_eq!(profile[0].message, "Date of birth must be in YYYY-MM-DD format.");
    }
}
