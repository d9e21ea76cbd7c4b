//! Derived fields: values recomputed from other fields whenever those change.

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::fields::FieldStore;
use crate::sections::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Space-joined non-empty name parts, in the given order.
    FullName {
        parts: [&'static str; 3],
        target: &'static str,
    },
    /// Whole years elapsed since a `YYYY-MM-DD` date.
    Age {
        source: &'static str,
        target: &'static str,
    },
}

impl Derivation {
    pub fn triggered_by(&self, field: &str) -> bool {
        match self {
            Derivation::FullName { parts, .. } => parts.iter().any(|p| *p == field),
            Derivation::Age { source, .. } => *source == field,
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            Derivation::FullName { target, .. } | Derivation::Age { target, .. } => *target,
        }
    }

    fn apply(&self, store: &mut FieldStore, today: NaiveDate) {
        let value = match self {
            Derivation::FullName { parts, .. } => {
                let [first, middle, last] = *parts;
                full_name(&[store.text(first), store.text(middle), store.text(last)])
            }
            Derivation::Age { source, .. } => {
                // Missing or unreadable dates leave the previous age in place.
                let Some(dob) = parse_date(store.text(source)) else {
                    return;
                };
                age_on(dob, today).to_string()
            }
        };
        if let Err(e) = store.set_text(self.target(), value) {
            warn!("derived field {} not written: {e}", self.target());
        }
    }
}

/// The derivations a track's store is kept consistent with.
#[derive(Debug, Clone, Default)]
pub struct DerivedFields {
    derivations: Vec<Derivation>,
}

impl DerivedFields {
    pub fn for_track(track: Track) -> Self {
        let derivations = match track {
            Track::Participant => vec![
                Derivation::FullName {
                    parts: ["firstName", "middleName", "lastName"],
                    target: "fullName",
                },
                Derivation::Age {
                    source: "dateOfBirth",
                    target: "age",
                },
            ],
            // Directors type their full name and no age is shown.
            Track::Director => Vec::new(),
        };
        Self { derivations }
    }

    pub fn derivations(&self) -> &[Derivation] {
        &self.derivations
    }

    /// Recompute everything that depends on `changed`.
    pub fn on_change(&self, store: &mut FieldStore, changed: &str, today: NaiveDate) {
        for d in self.derivations.iter().filter(|d| d.triggered_by(changed)) {
            d.apply(store, today);
        }
    }

    /// Recompute every derivation (after a bulk load).
    pub fn recompute_all(&self, store: &mut FieldStore, today: NaiveDate) {
        for d in &self.derivations {
            d.apply(store, today);
        }
    }
}

pub fn full_name(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Calendar-year difference, minus one if this year's birthday is still ahead.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldSchema;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_name_skips_empty_parts() {
        let cases: [([&str; 3], &str); 8] = [
            (["", "", ""], ""),
            (["Ada", "", ""], "Ada"),
            (["", "Byron", ""], "Byron"),
            (["", "", "Lovelace"], "Lovelace"),
            (["Ada", "Byron", ""], "Ada Byron"),
            (["Ada", "", "Lovelace"], "Ada Lovelace"),
            (["", "Byron", "Lovelace"], "Byron Lovelace"),
            (["Ada", "Byron", "Lovelace"], "Ada Byron Lovelace"),
        ];
        for (parts, expected) in cases {
            assert_eq!(full_name(&parts), expected, "{parts:?}");
        }
    }

    #[test]
    fn age_counts_birthday_boundary() {
        let today = date(2026, 10, 16);
        assert_eq!(age_on(date(2008, 10, 16), today), 18);
        assert_eq!(age_on(date(2008, 10, 17), today), 17);
        assert_eq!(age_on(date(2008, 11, 1), today), 17);
        assert_eq!(age_on(date(1990, 1, 1), today), 36);
    }

    #[test]
    fn parse_date_is_strict() {
        assert_eq!(parse_date("2000-02-29"), Some(date(2000, 2, 29)));
        assert_eq!(parse_date("2001-02-29"), None);
        assert_eq!(parse_date("2000-2-9"), None);
        assert_eq!(parse_date("02/09/2000"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn participant_store_tracks_name_and_age() {
        let derived = DerivedFields::for_track(Track::Participant);
        let mut store = FieldStore::new(FieldSchema::for_track(Track::Participant));
        let today = date(2026, 10, 16);

        store.set_text("firstName", "Ada").unwrap();
        derived.on_change(&mut store, "firstName", today);
        store.set_text("lastName", "Lovelace").unwrap();
        derived.on_change(&mut store, "lastName", today);
        assert_eq!(store.text("fullName"), "Ada Lovelace");

        store.set_text("dateOfBirth", "2000-06-01").unwrap();
        derived.on_change(&mut store, "dateOfBirth", today);
        assert_eq!(store.text("age"), "26");

        // Clearing the date keeps the stale age.
        store.set_text("dateOfBirth", "").unwrap();
        derived.on_change(&mut store, "dateOfBirth", today);
        assert_eq!(store.text("age"), "26");
    }

    #[test]
    fn unrelated_change_triggers_nothing() {
        let derived = DerivedFields::for_track(Track::Participant);
        assert!(derived.derivations().iter().all(|d| !d.triggered_by("city")));
    }
}
