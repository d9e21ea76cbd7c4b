//! Field store: the current value of every form field for one session.
//!
//! The set of fields is fixed per track by its `FieldSchema`; the store is
//! created with every field present (empty text, `false`, or absent media),
//! so rules never observe an undefined field. Field names are the camelCase
//! keys the submission endpoint expects.

use std::collections::BTreeMap;

use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

use crate::media::{MediaPayload, MediaSlot};
use crate::sections::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Text holding a `YYYY-MM-DD` date.
    Date,
    Flag,
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }
    const fn date(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Date,
        }
    }
    const fn flag(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Flag,
        }
    }
    const fn media(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Media,
        }
    }
}

const PARTICIPANT_FIELDS: &[FieldSpec] = &[
    // contact
    FieldSpec::text("firstName"),
    FieldSpec::text("middleName"),
    FieldSpec::text("lastName"),
    FieldSpec::text("fullName"),
    FieldSpec::text("email"),
    FieldSpec::text("phone"),
    FieldSpec::text("homePhone"),
    FieldSpec::text("country"),
    FieldSpec::text("city"),
    FieldSpec::text("street"),
    FieldSpec::text("addressLine2"),
    FieldSpec::text("stateRegion"),
    FieldSpec::text("zipCode"),
    // background
    FieldSpec::text("experience"),
    FieldSpec::text("education"),
    FieldSpec::text("skills"),
    FieldSpec::text("schoolAttended"),
    FieldSpec::text("fieldOfStudy"),
    FieldSpec::text("highestEducation"),
    // motivation / business
    FieldSpec::text("motivation"),
    FieldSpec::text("goals"),
    FieldSpec::text("strategy"),
    // personal
    FieldSpec::date("dateOfBirth"),
    FieldSpec::text("age"),
    FieldSpec::text("ethnicity"),
    FieldSpec::text("representCountry"),
    FieldSpec::text("alternateCountry"),
    FieldSpec::text("height"),
    FieldSpec::text("weight"),
    FieldSpec::text("bust"),
    FieldSpec::text("waist"),
    FieldSpec::text("hips"),
    FieldSpec::text("dressSize"),
    FieldSpec::text("shoeSize"),
    FieldSpec::text("swimsuitSizeTop"),
    FieldSpec::text("swimsuitSizeBottom"),
    // profile
    FieldSpec::text("bio"),
    FieldSpec::text("socialMedia"),
    FieldSpec::text("threeWords"),
    FieldSpec::text("hobbies"),
    FieldSpec::text("pageantExperience"),
    FieldSpec::text("charity"),
    FieldSpec::text("hearAboutUs"),
    // country
    FieldSpec::text("countryOverview"),
    FieldSpec::text("culturalInfo"),
    // photos
    FieldSpec::media("headShot1"),
    FieldSpec::media("headShot2"),
    FieldSpec::media("bodyShot1"),
    FieldSpec::media("bodyShot2"),
    FieldSpec::media("additionalImage1"),
    FieldSpec::media("additionalImage2"),
    // affirmations
    FieldSpec::flag("isEligible"),
    FieldSpec::flag("hasValidPassport"),
    FieldSpec::flag("canTravel"),
    FieldSpec::flag("isGoodHealth"),
    FieldSpec::flag("willFollowRules"),
    FieldSpec::flag("agreeTerms"),
];

const DIRECTOR_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("fullName"),
    FieldSpec::text("email"),
    FieldSpec::text("phone"),
    FieldSpec::text("country"),
    FieldSpec::text("city"),
    FieldSpec::text("motivation"),
    FieldSpec::text("goals"),
    FieldSpec::text("strategy"),
    FieldSpec::flag("agreeToTerms"),
    FieldSpec::flag("agreeToConfidentiality"),
    FieldSpec::date("dateOfBirth"),
    FieldSpec::text("bio"),
    FieldSpec::text("socialMedia"),
    FieldSpec::text("countryOverview"),
    FieldSpec::text("culturalInfo"),
];

/// Declarative list of the fields one track collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    track: Track,
    fields: &'static [FieldSpec],
}

impl FieldSchema {
    pub fn for_track(track: Track) -> Self {
        let fields = match track {
            Track::Participant => PARTICIPANT_FIELDS,
            Track::Director => DIRECTOR_FIELDS,
        };
        Self { track, fields }
    }

    pub fn track(&self) -> Track {
        self.track
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn spec(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_slot(&self, slot: MediaSlot) -> bool {
        self.spec(slot.field())
            .is_some_and(|f| f.kind == FieldKind::Media)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Media(Option<MediaPayload>),
}

impl FieldValue {
    fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text | FieldKind::Date => FieldValue::Text(String::new()),
            FieldKind::Flag => FieldValue::Flag(false),
            FieldKind::Media => FieldValue::Media(None),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Text(s) => JsonValue::String(s.clone()),
            FieldValue::Flag(b) => JsonValue::Bool(*b),
            FieldValue::Media(Some(p)) => JsonValue::String(p.as_str().to_string()),
            FieldValue::Media(None) => JsonValue::Null,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {field} is not a {expected:?} field")]
    KindMismatch {
        field: String,
        expected: FieldKind,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Current values of every field of one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStore {
    schema: FieldSchema,
    values: BTreeMap<&'static str, FieldValue>,
}

impl FieldStore {
    pub fn new(schema: FieldSchema) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|f| (f.name, FieldValue::empty(f.kind)))
            .collect();
        Self { schema, values }
    }

    pub fn schema(&self) -> FieldSchema {
        self.schema
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text value, or `""` for unknown or non-text fields.
    pub fn text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Flag value; unknown and non-flag fields read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(FieldValue::Flag(true)))
    }

    pub fn media(&self, slot: MediaSlot) -> Option<&MediaPayload> {
        match self.values.get(slot.field()) {
            Some(FieldValue::Media(p)) => p.as_ref(),
            _ => None,
        }
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) -> Result<(), FieldError> {
        let spec = self.spec_of(name)?;
        match spec.kind {
            FieldKind::Text | FieldKind::Date => {
                self.values.insert(spec.name, FieldValue::Text(value.into()));
                Ok(())
            }
            _ => Err(FieldError::KindMismatch {
                field: name.to_string(),
                expected: spec.kind,
            }),
        }
    }

    pub fn set_flag(&mut self, name: &str, value: bool) -> Result<(), FieldError> {
        let spec = self.spec_of(name)?;
        if spec.kind != FieldKind::Flag {
            return Err(FieldError::KindMismatch {
                field: name.to_string(),
                expected: spec.kind,
            });
        }
        self.values.insert(spec.name, FieldValue::Flag(value));
        Ok(())
    }

    pub fn set_media(
        &mut self,
        slot: MediaSlot,
        payload: Option<MediaPayload>,
    ) -> Result<(), FieldError> {
        let spec = self.spec_of(slot.field())?;
        if spec.kind != FieldKind::Media {
            return Err(FieldError::KindMismatch {
                field: spec.name.to_string(),
                expected: spec.kind,
            });
        }
        self.values.insert(spec.name, FieldValue::Media(payload));
        Ok(())
    }

    /// Reset every field to its empty initial value.
    pub fn clear(&mut self) {
        for spec in self.schema.fields() {
            self.values.insert(spec.name, FieldValue::empty(spec.kind));
        }
    }

    /// Merge a JSON object into the store.
    ///
    /// Text fields accept strings and numbers, flags accept booleans, media
    /// slots accept `null` or an encoded image payload of at most
    /// `max_media_bytes`. Nothing is applied unless every entry is valid.
    /// Returns the names that were set.
    pub fn apply_json(
        &mut self,
        obj: &JsonMap<String, JsonValue>,
        max_media_bytes: u64,
    ) -> Result<Vec<&'static str>, FieldError> {
        let mut staged = Vec::with_capacity(obj.len());
        for (key, raw) in obj {
            let spec = self.spec_of(key)?;
            let invalid = |reason: &str| FieldError::InvalidValue {
                field: key.clone(),
                reason: reason.to_string(),
            };
            let value = match (spec.kind, raw) {
                (FieldKind::Text | FieldKind::Date, JsonValue::String(s)) => FieldValue::Text(s.clone()),
                (FieldKind::Text | FieldKind::Date, JsonValue::Number(n)) => FieldValue::Text(n.to_string()),
                (FieldKind::Text | FieldKind::Date, JsonValue::Null) => FieldValue::Text(String::new()),
                (FieldKind::Flag, JsonValue::Bool(b)) => FieldValue::Flag(*b),
                (FieldKind::Media, JsonValue::Null) => FieldValue::Media(None),
                (FieldKind::Media, JsonValue::String(s)) => {
                    let payload = MediaPayload::parse_image(s, max_media_bytes)
                        .map_err(|e| invalid(&e.to_string()))?;
                    FieldValue::Media(Some(payload))
                }
                (FieldKind::Text | FieldKind::Date, _) => return Err(invalid("expected a string")),
                (FieldKind::Flag, _) => return Err(invalid("expected a boolean")),
                (FieldKind::Media, _) => return Err(invalid("expected an encoded payload or null")),
            };
            staged.push((spec.name, value));
        }

        let names: Vec<&'static str> = staged.iter().map(|(n, _)| *n).collect();
        self.values.extend(staged);
        Ok(names)
    }

    /// Full snapshot as a JSON object, keyed by wire name.
    pub fn to_json(&self) -> JsonMap<String, JsonValue> {
        self.values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect()
    }

    fn spec_of(&self, name: &str) -> Result<&'static FieldSpec, FieldError> {
        self.schema
            .spec(name)
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))
    }
}
