//! Wizard navigator: state machine over a track's ordered sections.
//!
//! Only `next()` can move past the current section, and only when the
//! current section validates clean. `previous()` and `jump_to()` move
//! backwards (or stay) without validating. The published error list is
//! replaced wholesale by each validation pass.

use tracing::debug;

use crate::fields::FieldStore;
use crate::sections::{Section, SectionId, Track};
use crate::validation::{FormError, ValidationEngine};

/// Where a section sits relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    /// Before the current section.
    Completed,
    /// The displayed section.
    Current,
    /// After the current section; not reachable by `jump_to`.
    Upcoming,
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The current section changed.
    Moved { from: SectionId, to: SectionId },
    /// Request accepted but there is nowhere to go (first/last/same section).
    Unchanged,
    /// Current section has violations; they are now published.
    Blocked(Vec<FormError>),
    /// `jump_to` target is ahead of the current section or not in this track.
    Rejected { target: SectionId },
}

#[derive(Debug, Clone)]
pub struct Navigator {
    track: Track,
    /// Index into `track.sections()`.
    current: usize,
    /// Furthest index reached through `next()`.
    frontier: usize,
    errors: Vec<FormError>,
}

impl Navigator {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            current: 0,
            frontier: 0,
            errors: Vec::new(),
        }
    }

    pub fn sections(&self) -> &'static [Section] {
        self.track.sections()
    }

    pub fn current(&self) -> SectionId {
        self.sections()[self.current].id
    }

    pub fn current_section(&self) -> &'static Section {
        &self.sections()[self.current]
    }

    pub fn frontier(&self) -> SectionId {
        self.sections()[self.frontier].id
    }

    pub fn errors(&self) -> &[FormError] {
        &self.errors
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.sections().len()
    }

    /// `(1-based position, total)` for a progress indicator.
    pub fn progress(&self) -> (usize, usize) {
        (self.current + 1, self.sections().len())
    }

    pub fn status(&self, id: SectionId) -> Option<SectionStatus> {
        let index = self.index_of(id)?;
        Some(match index.cmp(&self.current) {
            std::cmp::Ordering::Less => SectionStatus::Completed,
            std::cmp::Ordering::Equal => SectionStatus::Current,
            std::cmp::Ordering::Greater => SectionStatus::Upcoming,
        })
    }

    pub fn next(&mut self, engine: &ValidationEngine, fields: &FieldStore) -> Transition {
        let errors = engine.validate(self.current(), fields);
        if !errors.is_empty() {
            debug!(section = %self.current(), count = errors.len(), "next blocked");
            self.errors = errors.clone();
            return Transition::Blocked(errors);
        }
        self.errors.clear();
        if self.is_last() {
            return Transition::Unchanged;
        }
        let transition = self.move_to(self.current + 1);
        self.frontier = self.frontier.max(self.current);
        transition
    }

    pub fn previous(&mut self) -> Transition {
        if self.is_first() {
            return Transition::Unchanged;
        }
        self.move_to(self.current - 1)
    }

    pub fn jump_to(&mut self, target: SectionId) -> Transition {
        match self.index_of(target) {
            Some(index) if index <= self.current => self.move_to(index),
            _ => {
                debug!(%target, current = %self.current(), "jump rejected");
                Transition::Rejected { target }
            }
        }
    }

    /// Replace the published error list without moving.
    pub fn publish(&mut self, errors: Vec<FormError>) {
        self.errors = errors;
    }

    /// Move to an errored section at submission time. Unlike `jump_to` this
    /// may target any section of the track.
    pub(crate) fn relocate(&mut self, target: SectionId) -> Transition {
        let Some(index) = self.index_of(target) else {
            return Transition::Unchanged;
        };
        let transition = self.move_to(index);
        self.frontier = self.frontier.max(self.current);
        transition
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.track);
    }

    fn move_to(&mut self, index: usize) -> Transition {
        if index == self.current {
            return Transition::Unchanged;
        }
        let from = self.current();
        self.current = index;
        let to = self.current();
        debug!(%from, %to, "section changed");
        Transition::Moved { from, to }
    }

    fn index_of(&self, id: SectionId) -> Option<usize> {
        self.sections().iter().position(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clock::FixedClock;
    use crate::fields::FieldSchema;
    use crate::settings::EligibilitySettings;
    use crate::validation::RuleCatalog;

    fn engine(track: Track) -> ValidationEngine {
        ValidationEngine::new(
            Arc::new(RuleCatalog::for_track(track, &EligibilitySettings::default())),
            Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())),
        )
    }

    fn eligible_store() -> FieldStore {
        let mut store = FieldStore::new(FieldSchema::for_track(Track::Participant));
        store.set_text("dateOfBirth", "2000-01-01").unwrap();
        for flag in ["isEligible", "hasValidPassport", "canTravel", "isGoodHealth", "willFollowRules"] {
            store.set_flag(flag, true).unwrap();
        }
        store
    }

    #[test]
    fn starts_on_first_section_without_errors() {
        let nav = Navigator::new(Track::Participant);
        assert_eq!(nav.current(), SectionId::Eligibility);
        assert!(nav.errors().is_empty());
        assert_eq!(nav.progress(), (1, 11));
    }

    #[test]
    fn next_is_gated_by_violations() {
        let e = engine(Track::Participant);
        let mut nav = Navigator::new(Track::Participant);
        let empty = FieldStore::new(FieldSchema::for_track(Track::Participant));

        let Transition::Blocked(errors) = nav.next(&e, &empty) else {
            panic!("expected blocked");
        };
        assert_eq!(errors.len(), 6);
        assert_eq!(nav.current(), SectionId::Eligibility);
        assert_eq!(nav.errors(), errors.as_slice());

        assert_eq!(
            nav.next(&e, &eligible_store()),
            Transition::Moved {
                from: SectionId::Eligibility,
                to: SectionId::Contact
            }
        );
        assert!(nav.errors().is_empty());
        assert_eq!(nav.frontier(), SectionId::Contact);
    }

    #[test]
    fn previous_is_free_and_stops_at_first() {
        let e = engine(Track::Participant);
        let mut nav = Navigator::new(Track::Participant);
        assert_eq!(nav.previous(), Transition::Unchanged);
        nav.next(&e, &eligible_store());
        assert_eq!(
            nav.previous(),
            Transition::Moved {
                from: SectionId::Contact,
                to: SectionId::Eligibility
            }
        );
        // Frontier is not lowered by going back.
        assert_eq!(nav.frontier(), SectionId::Contact);
    }

    #[test]
    fn jump_only_goes_back_or_stays() {
        let e = engine(Track::Participant);
        let mut nav = Navigator::new(Track::Participant);
        nav.next(&e, &eligible_store());

        assert_eq!(
            nav.jump_to(SectionId::Personal),
            Transition::Rejected {
                target: SectionId::Personal
            }
        );
        assert_eq!(nav.jump_to(SectionId::Contact), Transition::Unchanged);
        assert_eq!(
            nav.jump_to(SectionId::Eligibility),
            Transition::Moved {
                from: SectionId::Contact,
                to: SectionId::Eligibility
            }
        );
        // Contact was reached before but is now ahead of the current section.
        assert!(matches!(nav.jump_to(SectionId::Contact), Transition::Rejected { .. }));
    }

    #[test]
    fn jump_to_unknown_section_is_rejected() {
        let mut nav = Navigator::new(Track::Director);
        assert!(matches!(nav.jump_to(SectionId::Photos), Transition::Rejected { .. }));
    }

    #[test]
    fn status_classifies_around_current() {
        let e = engine(Track::Participant);
        let mut nav = Navigator::new(Track::Participant);
        nav.next(&e, &eligible_store());
        assert_eq!(nav.status(SectionId::Eligibility), Some(SectionStatus::Completed));
        assert_eq!(nav.status(SectionId::Contact), Some(SectionStatus::Current));
        assert_eq!(nav.status(SectionId::Review), Some(SectionStatus::Upcoming));
        assert_eq!(nav.status(SectionId::Agreement), None);
    }

    #[test]
    fn next_on_last_section_stays() {
        let e = engine(Track::Participant);
        let mut nav = Navigator::new(Track::Participant);
        nav.relocate(SectionId::Review);
        assert!(nav.is_last());
        assert_eq!(nav.next(&e, &eligible_store()), Transition::Unchanged);
        assert_eq!(nav.current(), SectionId::Review);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut nav = Navigator::new(Track::Participant);
        nav.relocate(SectionId::Photos);
        nav.publish(vec![FormError::new("headShot1", "Head Shot 1 is required.")]);
        nav.reset();
        assert_eq!(nav.current(), SectionId::Eligibility);
        assert!(nav.errors().is_empty());
    }
}
