//! Per-track rule catalogs: section id -> ordered rule list.

use std::collections::HashMap;

use super::rule::{Rule, RuleKind};
use crate::media::MediaSlot;
use crate::sections::{Section, SectionId, SectionKind, Track};
use crate::settings::EligibilitySettings;

const TEXT_CEILING: usize = 2500;

#[derive(Debug, Clone)]
pub struct RuleCatalog {
    track: Track,
    rules: HashMap<SectionId, Vec<Rule>>,
}

impl RuleCatalog {
    pub fn for_track(track: Track, eligibility: &EligibilitySettings) -> Self {
        let rules = match track {
            Track::Participant => participant_rules(eligibility),
            Track::Director => director_rules(),
        };
        Self {
            track,
            rules: rules.into_iter().collect(),
        }
    }

    pub fn track(&self) -> Track {
        self.track
    }

    pub fn sections(&self) -> &'static [Section] {
        self.track.sections()
    }

    /// Rules owned by `section`; empty for rule-less sections.
    pub fn rules_for(&self, section: SectionId) -> &[Rule] {
        self.rules.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First section, in navigation order, owning a rule on `field`.
    pub fn owner_of(&self, field: &str) -> Option<SectionId> {
        self.sections()
            .iter()
            .map(|s| s.id)
            .find(|id| self.rules_for(*id).iter().any(|r| r.field() == field))
    }

    /// First section, in navigation order, owning any of `fields`.
    pub fn first_offending_section<'a>(
        &self,
        fields: impl IntoIterator<Item = &'a str>,
    ) -> Option<SectionId> {
        fields
            .into_iter()
            .filter_map(|f| self.owner_of(f))
            .min_by_key(|id| self.position(*id))
    }

    /// The terms-acceptance step, if the track has one.
    pub fn terms_section(&self) -> Option<SectionId> {
        self.sections()
            .iter()
            .find(|s| s.kind == SectionKind::Terms)
            .map(|s| s.id)
    }

    pub(crate) fn position(&self, id: SectionId) -> usize {
        self.sections()
            .iter()
            .position(|s| s.id == id)
            .unwrap_or(usize::MAX)
    }
}

fn participant_rules(eligibility: &EligibilitySettings) -> Vec<(SectionId, Vec<Rule>)> {
    use SectionId::*;
    vec![
        (
            Eligibility,
            vec![
                Rule::new(
                    "dateOfBirth",
                    "Date of birth",
                    RuleKind::AgeRange {
                        min: eligibility.min_age,
                        max: eligibility.max_age,
                    },
                ),
                Rule::affirmed("isEligible", "You must confirm eligibility."),
                Rule::affirmed("hasValidPassport", "You must confirm having a valid passport."),
                Rule::affirmed("canTravel", "You must confirm ability to travel."),
                Rule::affirmed("isGoodHealth", "You must confirm good health."),
                Rule::affirmed("willFollowRules", "You must agree to follow rules."),
            ],
        ),
        (
            Contact,
            vec![
                Rule::required("firstName", "First name"),
                Rule::required("lastName", "Last name"),
                Rule::email("email", "Email"),
                Rule::required("phone", "Cell phone"),
                Rule::required("country", "Country"),
                Rule::required("city", "City"),
            ],
        ),
        (
            Personal,
            vec![
                Rule::required("ethnicity", "Ethnicity"),
                Rule::required("representCountry", "Country to represent"),
            ],
        ),
        (
            Background,
            vec![
                Rule::required("experience", "Work experience"),
                Rule::required("education", "Education"),
                Rule::required("skills", "Skills").message("Skills are required."),
            ],
        ),
        (
            Motivation,
            vec![
                Rule::words("motivation", "Motivation", 20, 500),
                Rule::words("goals", "Goals", 20, 500),
            ],
        ),
        (Business, vec![Rule::words("strategy", "Strategy", 50, 1000)]),
        (
            Photos,
            vec![
                Rule::media(MediaSlot::HeadShot1),
                Rule::media(MediaSlot::BodyShot1),
            ],
        ),
        (
            Terms,
            vec![Rule::affirmed(
                "agreeTerms",
                "You must agree to the terms and conditions.",
            )],
        ),
        (
            Profile,
            vec![
                Rule::chars("bio", "Bio", 1, TEXT_CEILING),
                Rule::required("socialMedia", "Social Media Handles")
                    .message("Social Media Handles are required."),
            ],
        ),
        (
            CountryInfo,
            vec![
                Rule::chars("countryOverview", "Country overview", 1, TEXT_CEILING),
                Rule::chars("culturalInfo", "Cultural information", 1, TEXT_CEILING),
            ],
        ),
    ]
}

fn director_rules() -> Vec<(SectionId, Vec<Rule>)> {
    use SectionId::*;
    let at_least = |field, label, min| Rule::chars(field, label, min, usize::MAX);
    vec![
        (
            Contact,
            vec![
                at_least("fullName", "Full name", 2).message("Full name is required."),
                Rule::email("email", "Email").message("Valid email address is required."),
                at_least("phone", "Phone", 8).message("Valid phone number is required."),
                at_least("country", "Country", 2).message("Country is required."),
                at_least("city", "City", 2).message("City is required."),
            ],
        ),
        (
            Motivation,
            vec![
                at_least("motivation", "Motivation", 20),
                at_least("goals", "Goals", 20),
            ],
        ),
        (Business, vec![at_least("strategy", "Strategy", 50)]),
        (
            Agreement,
            vec![
                Rule::affirmed("agreeToTerms", "You must agree to the terms and conditions."),
                Rule::affirmed(
                    "agreeToConfidentiality",
                    "You must agree to the confidentiality terms.",
                ),
            ],
        ),
        (
            Profile,
            vec![
                Rule::new("dateOfBirth", "Date of birth", RuleKind::IsoDate),
                Rule::chars("bio", "Bio", 1, TEXT_CEILING),
                at_least("socialMedia", "Social media information", 2)
                    .message("Social media information is required."),
            ],
        ),
        (
            CountryInfo,
            vec![
                Rule::chars("countryOverview", "Country overview", 1, TEXT_CEILING),
                Rule::chars("culturalInfo", "Cultural information", 1, TEXT_CEILING),
            ],
        ),
    ]
}
