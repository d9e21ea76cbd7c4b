//! Section catalog: the fixed, ordered pages of each application track.
//!
//! Order is part of the contract. It drives navigation, the
//! completed/upcoming classification and the choice of section the
//! submission coordinator jumps back to.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Stable section identifiers (wire names are camelCase).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SectionId {
    Eligibility,
    Contact,
    Personal,
    Background,
    Motivation,
    Business,
    Photos,
    Terms,
    Agreement,
    Profile,
    CountryInfo,
    Review,
}

/// What a section is for; decides how submission treats it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Regular data-entry page. Re-validated on submit.
    Form,
    /// Holds the single terms-acceptance affirmation. Checked separately on submit.
    Terms,
    /// Read-only summary; never has rules.
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub title: &'static str,
    /// 1-based position shown in the progress indicator.
    pub badge: u8,
    pub kind: SectionKind,
}

impl Section {
    const fn new(id: SectionId, title: &'static str, badge: u8, kind: SectionKind) -> Self {
        Self {
            id,
            title,
            badge,
            kind,
        }
    }
}

const PARTICIPANT_SECTIONS: [Section; 11] = [
    Section::new(SectionId::Eligibility, "Eligibility", 1, SectionKind::Form),
    Section::new(SectionId::Contact, "Contact Information", 2, SectionKind::Form),
    Section::new(SectionId::Personal, "Personal Details", 3, SectionKind::Form),
    Section::new(SectionId::Background, "Background & Experience", 4, SectionKind::Form),
    Section::new(SectionId::Motivation, "Motivation & Goals", 5, SectionKind::Form),
    Section::new(SectionId::Business, "Business Plan", 6, SectionKind::Form),
    Section::new(SectionId::Photos, "Photos", 7, SectionKind::Form),
    Section::new(SectionId::Terms, "Terms & Conditions", 8, SectionKind::Terms),
    Section::new(SectionId::Profile, "Personal Profile", 9, SectionKind::Form),
    Section::new(SectionId::CountryInfo, "Country Information", 10, SectionKind::Form),
    Section::new(SectionId::Review, "Review & Submit", 11, SectionKind::Review),
];

const DIRECTOR_SECTIONS: [Section; 6] = [
    Section::new(SectionId::Contact, "Contact Information", 1, SectionKind::Form),
    Section::new(SectionId::Motivation, "Motivation & Goals", 2, SectionKind::Form),
    Section::new(SectionId::Business, "Business Plan", 3, SectionKind::Form),
    Section::new(SectionId::Agreement, "Agreement", 4, SectionKind::Form),
    Section::new(SectionId::Profile, "Personal Profile", 5, SectionKind::Form),
    Section::new(SectionId::CountryInfo, "Country Information", 6, SectionKind::Form),
];

/// Which application is being filled in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Track {
    Participant,
    Director,
}

impl Track {
    /// Sections in navigation order. Never empty.
    pub fn sections(self) -> &'static [Section] {
        match self {
            Track::Participant => &PARTICIPANT_SECTIONS,
            Track::Director => &DIRECTOR_SECTIONS,
        }
    }

    pub fn section(self, id: SectionId) -> Option<&'static Section> {
        self.sections().iter().find(|s| s.id == id)
    }

    /// Label forwarded to the payment gateway metadata.
    pub fn application_type(self) -> &'static str {
        match self {
            Track::Participant => "Participant Application",
            Track::Director => "National Director Application",
        }
    }
}
