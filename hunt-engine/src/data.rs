//! Hunt and challenge definitions.
//!
//! Hunts arrive as loosely-typed JSON records (`HuntRecord`, `ChallengeRecord`) and are
//! converted into the strongly-typed [`Hunt`] / [`Challenge`] shapes at load time. The
//! conversion normalizes challenge ordering and rejects any challenge that lacks a field
//! its type requires, so play never encounters a malformed definition.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::geo::LatLng;

/// Identifier that may be authored as either a JSON string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Text(String),
    Number(i64),
}

impl RecordId {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(number) => number.to_string(),
        }
    }
}

/// A JSON value that may be a single item or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(single) => vec![single],
            Self::Many(many) => many,
        }
    }
}

/// Authored feedback messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedbackTexts {
    #[serde(default)]
    pub correct: String,
    #[serde(default)]
    pub incorrect: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
struct FeedbackRecord {
    #[serde(default)]
    correct: String,
    #[serde(default)]
    incorrect: OneOrMany,
}

/// Loosely-typed challenge as stored by the authoring backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feedback_texts: Option<FeedbackRecord>,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clues: Vec<String>,
}

/// Loosely-typed hunt as stored by the authoring backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HuntRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub challenges: Vec<ChallengeRecord>,
    #[serde(default)]
    pub day_only: bool,
    #[serde(default)]
    pub is_public: bool,
}

/// Challenge type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChallengeType {
    Travel,
    Story,
    MultipleChoice,
    TrueFalse,
    TextInput,
    AreaSearch,
}

impl ChallengeType {
    pub const ALL: &'static [Self] = &[
        Self::Travel,
        Self::Story,
        Self::MultipleChoice,
        Self::TrueFalse,
        Self::TextInput,
        Self::AreaSearch,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Story => "story",
            Self::MultipleChoice => "multipleChoice",
            Self::TrueFalse => "trueFalse",
            Self::TextInput => "textInput",
            Self::AreaSearch => "areaSearch",
        }
    }

    /// Parse a type tag. Accepts the camelCase keys plus the kebab/snake spellings
    /// found in older exports.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.key().to_ascii_lowercase() == folded)
    }

    /// Whether the type is completed by submitting an answer.
    #[must_use]
    pub const fn is_answerable(self) -> bool {
        matches!(
            self,
            Self::MultipleChoice | Self::TrueFalse | Self::TextInput
        )
    }

    /// Whether the type is completed by reaching a geofence.
    #[must_use]
    pub const fn is_geofenced(self) -> bool {
        matches!(self, Self::Travel | Self::AreaSearch)
    }
}

/// Variant-specific configuration. Exactly one per challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChallengeKind {
    #[serde(rename_all = "camelCase")]
    Travel {
        target_location: LatLng,
        radius: f64,
        completion_feedback: String,
    },
    Story,
    #[serde(rename_all = "camelCase")]
    MultipleChoice {
        options: Vec<String>,
        correct_answer: String,
    },
    #[serde(rename_all = "camelCase")]
    TrueFalse { correct_answer: bool },
    #[serde(rename_all = "camelCase")]
    TextInput { correct_answer: String },
    #[serde(rename_all = "camelCase")]
    AreaSearch {
        clues: Vec<String>,
        target_location: LatLng,
        radius: f64,
    },
}

impl ChallengeKind {
    #[must_use]
    pub const fn challenge_type(&self) -> ChallengeType {
        match self {
            Self::Travel { .. } => ChallengeType::Travel,
            Self::Story => ChallengeType::Story,
            Self::MultipleChoice { .. } => ChallengeType::MultipleChoice,
            Self::TrueFalse { .. } => ChallengeType::TrueFalse,
            Self::TextInput { .. } => ChallengeType::TextInput,
            Self::AreaSearch { .. } => ChallengeType::AreaSearch,
        }
    }
}

/// A validated challenge ready for play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    /// Zero-based position inside the hunt after normalization.
    pub order: usize,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub feedback_texts: FeedbackTexts,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(flatten)]
    pub kind: ChallengeKind,
}

impl Challenge {
    #[must_use]
    pub const fn challenge_type(&self) -> ChallengeType {
        self.kind.challenge_type()
    }

    /// Target and radius for geofenced challenges.
    #[must_use]
    pub fn geofence(&self) -> Option<(LatLng, f64)> {
        match &self.kind {
            ChallengeKind::Travel {
                target_location,
                radius,
                ..
            }
            | ChallengeKind::AreaSearch {
                target_location,
                radius,
                ..
            } => Some((*target_location, *radius)),
            _ => None,
        }
    }

    /// Message shown when a geofenced challenge is reached.
    #[must_use]
    pub fn completion_feedback(&self) -> &str {
        match &self.kind {
            ChallengeKind::Travel {
                completion_feedback,
                ..
            } if !completion_feedback.is_empty() => completion_feedback,
            _ => &self.feedback_texts.correct,
        }
    }

    /// Clues for area-search challenges; empty for every other type.
    #[must_use]
    pub fn clues(&self) -> &[String] {
        match &self.kind {
            ChallengeKind::AreaSearch { clues, .. } => clues,
            _ => &[],
        }
    }

    /// Convert a raw record, validating the fields its type requires.
    ///
    /// # Errors
    ///
    /// Returns `HuntConfigError` when the record is missing its id or type, carries an
    /// unknown type, or lacks or malforms a field that its type requires.
    pub fn from_record(
        mut record: ChallengeRecord,
        position: usize,
    ) -> Result<Self, HuntConfigError> {
        let id = record
            .id
            .take()
            .map(RecordId::into_text)
            .filter(|id| !id.is_empty())
            .ok_or(HuntConfigError::MissingId { position })?;
        let raw_kind = record
            .kind
            .clone()
            .ok_or_else(|| HuntConfigError::MissingField {
                id: id.clone(),
                field: "type",
            })?;
        let challenge_type =
            ChallengeType::parse(&raw_kind).ok_or_else(|| HuntConfigError::UnknownType {
                id: id.clone(),
                kind: raw_kind,
            })?;
        let kind = build_kind(&id, challenge_type, &record)?;
        let feedback = record.feedback_texts.unwrap_or_default();

        Ok(Self {
            id,
            order: position,
            title: record.title,
            description: record.description,
            question: record.question,
            hints: record.hints,
            feedback_texts: FeedbackTexts {
                correct: feedback.correct,
                incorrect: feedback.incorrect.into_vec(),
            },
            repeatable: record.repeatable,
            kind,
        })
    }
}

fn build_kind(
    id: &str,
    challenge_type: ChallengeType,
    record: &ChallengeRecord,
) -> Result<ChallengeKind, HuntConfigError> {
    let kind = match challenge_type {
        ChallengeType::Travel => {
            let (target_location, radius) = require_geofence(id, record)?;
            ChallengeKind::Travel {
                target_location,
                radius,
                completion_feedback: record.completion_feedback.clone().unwrap_or_default(),
            }
        }
        ChallengeType::Story => ChallengeKind::Story,
        ChallengeType::MultipleChoice => {
            if record.options.is_empty() {
                return Err(HuntConfigError::MissingField {
                    id: id.to_string(),
                    field: "options",
                });
            }
            let correct_answer = require_text_answer(id, record)?;
            if !record.options.contains(&correct_answer) {
                return Err(HuntConfigError::InvalidField {
                    id: id.to_string(),
                    field: "correctAnswer",
                    reason: format!("'{correct_answer}' is not one of the options"),
                });
            }
            ChallengeKind::MultipleChoice {
                options: record.options.clone(),
                correct_answer,
            }
        }
        ChallengeType::TrueFalse => ChallengeKind::TrueFalse {
            correct_answer: require_bool_answer(id, record)?,
        },
        ChallengeType::TextInput => ChallengeKind::TextInput {
            correct_answer: require_text_answer(id, record)?,
        },
        ChallengeType::AreaSearch => {
            let (target_location, radius) = require_geofence(id, record)?;
            ChallengeKind::AreaSearch {
                clues: record.clues.clone(),
                target_location,
                radius,
            }
        }
    };
    Ok(kind)
}

fn require_geofence(id: &str, record: &ChallengeRecord) -> Result<(LatLng, f64), HuntConfigError> {
    let target = record
        .target_location
        .ok_or_else(|| HuntConfigError::MissingField {
            id: id.to_string(),
            field: "targetLocation",
        })?;
    if !target.is_valid() {
        return Err(HuntConfigError::InvalidField {
            id: id.to_string(),
            field: "targetLocation",
            reason: format!(
                "({}, {}) is outside valid coordinate ranges",
                target.latitude, target.longitude
            ),
        });
    }
    let radius = record.radius.ok_or_else(|| HuntConfigError::MissingField {
        id: id.to_string(),
        field: "radius",
    })?;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(HuntConfigError::InvalidField {
            id: id.to_string(),
            field: "radius",
            reason: format!("{radius} must be a positive number of meters"),
        });
    }
    Ok((target, radius))
}

fn require_text_answer(id: &str, record: &ChallengeRecord) -> Result<String, HuntConfigError> {
    match &record.correct_answer {
        Some(serde_json::Value::String(answer)) if !answer.is_empty() => Ok(answer.clone()),
        Some(serde_json::Value::Number(number)) => Ok(number.to_string()),
        Some(_) => Err(HuntConfigError::InvalidField {
            id: id.to_string(),
            field: "correctAnswer",
            reason: "expected a non-empty string".to_string(),
        }),
        None => Err(HuntConfigError::MissingField {
            id: id.to_string(),
            field: "correctAnswer",
        }),
    }
}

fn require_bool_answer(id: &str, record: &ChallengeRecord) -> Result<bool, HuntConfigError> {
    match &record.correct_answer {
        Some(serde_json::Value::Bool(answer)) => Ok(*answer),
        Some(serde_json::Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(HuntConfigError::InvalidField {
                id: id.to_string(),
                field: "correctAnswer",
                reason: format!("'{text}' is not true or false"),
            }),
        },
        Some(_) => Err(HuntConfigError::InvalidField {
            id: id.to_string(),
            field: "correctAnswer",
            reason: "expected a boolean".to_string(),
        }),
        None => Err(HuntConfigError::MissingField {
            id: id.to_string(),
            field: "correctAnswer",
        }),
    }
}

/// A validated hunt. Immutable for the duration of play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "HuntRecord")]
pub struct Hunt {
    pub id: String,
    pub title: String,
    pub description: String,
    pub challenges: Vec<Challenge>,
    pub day_only: bool,
    pub is_public: bool,
}

impl Hunt {
    /// Parse and validate a hunt from JSON.
    ///
    /// # Errors
    ///
    /// Returns `HuntLoadError::Json` for malformed JSON and `HuntLoadError::Config` when the
    /// hunt parses but violates a definition invariant.
    pub fn from_json(json: &str) -> Result<Self, HuntLoadError> {
        let record: HuntRecord = serde_json::from_str(json)?;
        Ok(Self::from_record(record)?)
    }

    /// Validate a raw hunt record.
    ///
    /// Ordering uses each challenge's `order` when present and its array position
    /// otherwise; the result is renumbered densely from zero.
    ///
    /// # Errors
    ///
    /// Returns the first `HuntConfigError` found.
    pub fn from_record(record: HuntRecord) -> Result<Self, HuntConfigError> {
        let id = record
            .id
            .map(RecordId::into_text)
            .filter(|id| !id.is_empty())
            .ok_or(HuntConfigError::MissingHuntId)?;
        if record.challenges.is_empty() {
            return Err(HuntConfigError::Empty { hunt_id: id });
        }

        let mut keyed: Vec<(u64, ChallengeRecord)> = record
            .challenges
            .into_iter()
            .enumerate()
            .map(|(index, challenge)| {
                let key = challenge
                    .order
                    .map_or(u64::try_from(index).unwrap_or(u64::MAX), u64::from);
                (key, challenge)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        for pair in keyed.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(HuntConfigError::DuplicateOrder { order: pair[0].0 });
            }
        }

        let mut seen = HashSet::new();
        let mut challenges = Vec::with_capacity(keyed.len());
        for (position, (_, raw)) in keyed.into_iter().enumerate() {
            let challenge = Challenge::from_record(raw, position)?;
            if !seen.insert(challenge.id.clone()) {
                return Err(HuntConfigError::DuplicateChallengeId { id: challenge.id });
            }
            challenges.push(challenge);
        }

        Ok(Self {
            id,
            title: record.title,
            description: record.description,
            challenges,
            day_only: record.day_only,
            is_public: record.is_public,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    #[must_use]
    pub fn challenge(&self, index: usize) -> Option<&Challenge> {
        self.challenges.get(index)
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.challenges.len().saturating_sub(1)
    }
}

impl TryFrom<HuntRecord> for Hunt {
    type Error = HuntConfigError;

    fn try_from(record: HuntRecord) -> Result<Self, Self::Error> {
        Self::from_record(record)
    }
}

/// Definition errors detected when a hunt is loaded.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HuntConfigError {
    #[error("hunt has no id")]
    MissingHuntId,
    #[error("hunt {hunt_id} has no challenges")]
    Empty { hunt_id: String },
    #[error("challenge at position {position} has no id")]
    MissingId { position: usize },
    #[error("challenge {id} has unknown type '{kind}'")]
    UnknownType { id: String, kind: String },
    #[error("challenge {id} is missing required field `{field}`")]
    MissingField { id: String, field: &'static str },
    #[error("challenge {id} field `{field}` is invalid: {reason}")]
    InvalidField {
        id: String,
        field: &'static str,
        reason: String,
    },
    #[error("challenge id {id} appears more than once")]
    DuplicateChallengeId { id: String },
    #[error("more than one challenge uses order {order}")]
    DuplicateOrder { order: u64 },
}

/// Failure to turn JSON into a playable hunt.
#[derive(Debug, Error)]
pub enum HuntLoadError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid hunt definition: {0}")]
    Config(#[from] HuntConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "id": 17,
            "title": "Old Town",
            "description": "A short walk",
            "dayOnly": true,
            "challenges": [
                {
                    "id": "q1",
                    "type": "multipleChoice",
                    "order": 2,
                    "title": "Which bard?",
                    "options": ["Shakespeare", "Marlowe"],
                    "correctAnswer": "Shakespeare",
                    "feedbackTexts": { "correct": "Yes!", "incorrect": "Nope" }
                },
                {
                    "id": "t1",
                    "type": "travel",
                    "order": 1,
                    "title": "Walk to the square",
                    "targetLocation": { "latitude": 40.0, "longitude": -74.0 },
                    "radius": 50,
                    "completionFeedback": "You made it"
                },
                {
                    "id": 3,
                    "type": "true-false",
                    "order": 5,
                    "title": "Is the sky blue?",
                    "correctAnswer": "TRUE"
                }
            ]
        }"#
    }

    #[test]
    fn hunt_from_json_normalizes_order_and_ids() {
        let hunt = Hunt::from_json(sample_json()).unwrap();
        assert_eq!(hunt.id, "17");
        assert!(hunt.day_only);
        let ids: Vec<_> = hunt.challenges.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["t1", "q1", "3"]);
        let orders: Vec<_> = hunt.challenges.iter().map(|c| c.order).collect();
        assert_eq!(orders, [0, 1, 2]);
        assert_eq!(hunt.challenges[1].feedback_texts.incorrect, ["Nope"]);
        assert_eq!(
            hunt.challenges[2].kind,
            ChallengeKind::TrueFalse {
                correct_answer: true
            }
        );
        assert_eq!(hunt.challenges[0].completion_feedback(), "You made it");
    }

    #[test]
    fn challenge_record_with_numeric_id_builds_its_kind() {
        let record: ChallengeRecord = serde_json::from_str(
            r#"{
                "id": 42,
                "type": "textInput",
                "title": "Name the play",
                "correctAnswer": "Macbeth",
                "feedbackTexts": { "correct": "Yes", "incorrect": ["No", "Still no"] }
            }"#,
        )
        .unwrap();
        let challenge = Challenge::from_record(record, 3).unwrap();
        assert_eq!(challenge.id, "42");
        assert_eq!(challenge.order, 3);
        assert_eq!(
            challenge.kind,
            ChallengeKind::TextInput {
                correct_answer: "Macbeth".into()
            }
        );
        assert_eq!(challenge.feedback_texts.incorrect, ["No", "Still no"]);
    }

    #[test]
    fn array_position_orders_challenges_without_order() {
        let json = r#"{"id":"h","challenges":[
            {"id":"a","type":"story"},
            {"id":"b","type":"story"}
        ]}"#;
        let hunt = Hunt::from_json(json).unwrap();
        assert_eq!(hunt.challenges[0].id, "a");
        assert_eq!(hunt.challenges[1].order, 1);
    }

    #[test]
    fn travel_without_radius_is_rejected_at_load() {
        let json = r#"{"id":"h","challenges":[
            {"id":"t","type":"travel","targetLocation":{"latitude":1.0,"longitude":2.0}}
        ]}"#;
        let err = Hunt::from_json(json).unwrap_err();
        match err {
            HuntLoadError::Config(HuntConfigError::MissingField { id, field }) => {
                assert_eq!(id, "t");
                assert_eq!(field, "radius");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn invalid_definitions_report_typed_errors() {
        let cases = [
            (
                r#"{"id":"h","challenges":[]}"#,
                HuntConfigError::Empty {
                    hunt_id: "h".into(),
                },
            ),
            (
                r#"{"id":"h","challenges":[{"id":"x","type":"riddle"}]}"#,
                HuntConfigError::UnknownType {
                    id: "x".into(),
                    kind: "riddle".into(),
                },
            ),
            (
                r#"{"id":"h","challenges":[{"id":"x","type":"story"},{"id":"x","type":"story"}]}"#,
                HuntConfigError::DuplicateChallengeId { id: "x".into() },
            ),
            (
                r#"{"id":"h","challenges":[{"id":"a","type":"story","order":1},{"id":"b","type":"story","order":1}]}"#,
                HuntConfigError::DuplicateOrder { order: 1 },
            ),
            (
                r#"{"id":"h","challenges":[{"type":"story"}]}"#,
                HuntConfigError::MissingId { position: 0 },
            ),
        ];
        for (json, expected) in cases {
            match Hunt::from_json(json) {
                Err(HuntLoadError::Config(err)) => assert_eq!(err, expected),
                other => panic!("expected {expected:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn multiple_choice_answer_must_be_an_option() {
        let json = r#"{"id":"h","challenges":[
            {"id":"m","type":"multipleChoice","options":["a","b"],"correctAnswer":"c"}
        ]}"#;
        assert!(matches!(
            Hunt::from_json(json),
            Err(HuntLoadError::Config(HuntConfigError::InvalidField {
                field: "correctAnswer",
                ..
            }))
        ));
    }

    #[test]
    fn zero_radius_and_bad_coordinates_are_rejected() {
        let zero = r#"{"id":"h","challenges":[
            {"id":"a","type":"areaSearch","targetLocation":{"latitude":1.0,"longitude":2.0},"radius":0}
        ]}"#;
        assert!(matches!(
            Hunt::from_json(zero),
            Err(HuntLoadError::Config(HuntConfigError::InvalidField { field: "radius", .. }))
        ));
        let far = r#"{"id":"h","challenges":[
            {"id":"a","type":"travel","targetLocation":{"latitude":91.0,"longitude":2.0},"radius":5}
        ]}"#;
        assert!(matches!(
            Hunt::from_json(far),
            Err(HuntLoadError::Config(HuntConfigError::InvalidField {
                field: "targetLocation",
                ..
            }))
        ));
    }

    #[test]
    fn deserializing_a_hunt_directly_validates() {
        let parsed: Result<Hunt, _> = serde_json::from_str(r#"{"id":"h","challenges":[]}"#);
        assert!(parsed.is_err());
        let hunt: Hunt = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(hunt.len(), 3);
    }

    #[test]
    fn challenge_type_parse_accepts_legacy_spellings() {
        assert_eq!(
            ChallengeType::parse("multiple_choice"),
            Some(ChallengeType::MultipleChoice)
        );
        assert_eq!(ChallengeType::parse("AreaSearch"), Some(ChallengeType::AreaSearch));
        assert_eq!(ChallengeType::parse("puzzle"), None);
    }
}
