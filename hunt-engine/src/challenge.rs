//! Per-challenge state and the pure transitions that drive it.
//!
//! Every transition takes the current [`ChallengeState`] by reference and returns the
//! next one, so the caller commits a whole new snapshot per event and two events can
//! never interleave on the same state.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AnswerMatch, EngineConfig};
use crate::data::{Challenge, ChallengeKind};
use crate::geo::{LatLng, is_within_geofence};
use crate::visibility;

/// Ephemeral state for the active challenge. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeState {
    pub attempts: u32,
    pub is_correct: bool,
    pub feedback: String,
    pub hint_index: usize,
    /// Number of area-search clues disclosed so far.
    pub clues_revealed: usize,
    pub is_location_reached: bool,
    pub start_time: DateTime<Utc>,
    pub text_visible: bool,
    pub skipped: bool,
    /// Set once the challenge may be left through Continue without further input.
    pub ready_to_advance: bool,
    /// Earliest moment a view should auto-advance a one-shot challenge. Cosmetic only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advance_at: Option<DateTime<Utc>>,
}

impl ChallengeState {
    /// Whether the challenge reached one of its terminal states.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.is_correct || self.is_location_reached || self.skipped
    }
}

/// A player's answer to an answerable challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Text(String),
    Bool(bool),
    Empty,
}

impl Answer {
    /// Build an answer from raw input, mapping blank input to [`Answer::Empty`].
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        if input.is_empty() {
            Self::Empty
        } else {
            Self::Text(input.to_string())
        }
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Self::from_input(value)
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Result of checking one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// Transitions rejected by the state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("{kind} challenges do not accept answers")]
    NotAnswerable { kind: &'static str },
    #[error("challenge is already resolved")]
    AlreadyResolved,
    #[error("challenge does not allow another attempt")]
    NoAttemptsLeft,
    #[error("skip is not available yet")]
    SkipUnavailable,
    #[error("hints are closed once the challenge is answered")]
    HintUnavailable,
}

/// Fresh state for a newly activated challenge.
#[must_use]
pub fn initialize(_challenge: &Challenge, now: DateTime<Utc>) -> ChallengeState {
    ChallengeState {
        attempts: 0,
        is_correct: false,
        feedback: String::new(),
        hint_index: 0,
        clues_revealed: 0,
        is_location_reached: false,
        start_time: now,
        text_visible: false,
        skipped: false,
        ready_to_advance: false,
        advance_at: None,
    }
}

/// Check an answer and record the attempt.
///
/// # Errors
///
/// Returns `ChallengeError::NotAnswerable` for travel, story and area-search challenges,
/// `AlreadyResolved` once the challenge is complete and `NoAttemptsLeft` for a second
/// attempt at a non-repeatable challenge.
pub fn submit(
    challenge: &Challenge,
    state: &ChallengeState,
    answer: &Answer,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<(ChallengeState, Verdict), ChallengeError> {
    let challenge_type = challenge.challenge_type();
    if !challenge_type.is_answerable() {
        return Err(ChallengeError::NotAnswerable {
            kind: challenge_type.key(),
        });
    }
    if state.is_resolved() {
        return Err(ChallengeError::AlreadyResolved);
    }
    if !challenge.repeatable && state.attempts > 0 {
        return Err(ChallengeError::NoAttemptsLeft);
    }

    let verdict = if check_answer(&challenge.kind, answer, cfg.answer_match) {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    };

    let mut next = state.clone();
    next.attempts = state.attempts.saturating_add(1);
    match verdict {
        Verdict::Correct => {
            next.is_correct = true;
            next.feedback.clone_from(&challenge.feedback_texts.correct);
            next.ready_to_advance = true;
        }
        Verdict::Incorrect => {
            next.feedback = incorrect_feedback(challenge, next.attempts).to_string();
            next.ready_to_advance = !challenge.repeatable;
        }
    }
    if next.ready_to_advance && !challenge.repeatable {
        next.advance_at = Some(now + cfg.transition_delay());
    }

    log::debug!(
        "challenge {} attempt {} -> {:?}",
        challenge.id,
        next.attempts,
        verdict
    );
    Ok((next, verdict))
}

fn check_answer(kind: &ChallengeKind, answer: &Answer, policy: AnswerMatch) -> bool {
    match (kind, answer) {
        (
            ChallengeKind::MultipleChoice { correct_answer, .. }
            | ChallengeKind::TextInput { correct_answer },
            Answer::Text(text),
        ) => policy.matches(text, correct_answer),
        (ChallengeKind::TrueFalse { correct_answer }, Answer::Bool(value)) => {
            value == correct_answer
        }
        (ChallengeKind::TrueFalse { correct_answer }, Answer::Text(text)) => {
            parse_bool(text).is_some_and(|value| value == *correct_answer)
        }
        _ => false,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Incorrect feedback for the given one-based attempt; the last message repeats once
/// the list is exhausted.
#[must_use]
pub fn incorrect_feedback(challenge: &Challenge, attempts: u32) -> &str {
    let messages = &challenge.feedback_texts.incorrect;
    if messages.is_empty() {
        return "";
    }
    let wanted = usize::try_from(attempts.saturating_sub(1)).unwrap_or(usize::MAX);
    &messages[wanted.min(messages.len() - 1)]
}

/// Advance to the next hint, wrapping around, and return it.
///
/// The index moves before the lookup, so the first request yields the hint at index 1.
/// Challenges without hints are left untouched.
#[must_use]
pub fn request_hint(challenge: &Challenge, state: &ChallengeState) -> (ChallengeState, Option<String>) {
    if challenge.hints.is_empty() {
        return (state.clone(), None);
    }
    let mut next = state.clone();
    next.hint_index = (state.hint_index + 1) % challenge.hints.len();
    let hint = challenge.hints[next.hint_index].clone();
    (next, Some(hint))
}

/// Disclose the next area-search clue. Once every clue is out the last one is repeated.
#[must_use]
pub fn reveal_clue(challenge: &Challenge, state: &ChallengeState) -> (ChallengeState, Option<String>) {
    let clues = challenge.clues();
    if clues.is_empty() {
        return (state.clone(), None);
    }
    let mut next = state.clone();
    next.clues_revealed = (state.clues_revealed + 1).min(clues.len());
    let clue = clues[next.clues_revealed - 1].clone();
    (next, Some(clue))
}

/// Show the body text of a challenge.
#[must_use]
pub fn reveal_text(state: &ChallengeState) -> ChallengeState {
    let mut next = state.clone();
    next.text_visible = true;
    next
}

/// Mark a geofenced challenge reached when `position` is inside its radius.
///
/// Returns whether this call performed the transition; repeated deliveries after
/// arrival leave the state untouched and return `false`.
#[must_use]
pub fn check_arrival(
    challenge: &Challenge,
    state: &ChallengeState,
    position: LatLng,
) -> (ChallengeState, bool) {
    let Some((target, radius)) = challenge.geofence() else {
        return (state.clone(), false);
    };
    if state.is_location_reached || state.skipped {
        return (state.clone(), false);
    }
    if !is_within_geofence(position, target, radius) {
        return (state.clone(), false);
    }

    let mut next = state.clone();
    next.is_location_reached = true;
    next.ready_to_advance = true;
    next.feedback = challenge.completion_feedback().to_string();
    log::debug!("challenge {} reached", challenge.id);
    (next, true)
}

/// Give up on the current challenge once the skip grace period has passed.
///
/// # Errors
///
/// Returns `ChallengeError::SkipUnavailable` while Skip is hidden.
pub fn skip(
    challenge: &Challenge,
    state: &ChallengeState,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<ChallengeState, ChallengeError> {
    if !visibility::should_show_skip(challenge, state, now, cfg.skip_grace()) {
        return Err(ChallengeError::SkipUnavailable);
    }
    let mut next = state.clone();
    next.skipped = true;
    next.ready_to_advance = true;
    log::debug!("challenge {} skipped", challenge.id);
    Ok(next)
}

/// Whether Continue may move past this challenge.
#[must_use]
pub fn can_continue(challenge: &Challenge, state: &ChallengeState) -> bool {
    state.skipped || visibility::should_show_continue(challenge, state)
}
