//! Which player affordances are offered for a challenge in its current state.
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeState;
use crate::data::{Challenge, ChallengeType};

/// Submit is offered for answerable challenges that still accept an attempt.
#[must_use]
pub fn should_show_submit(challenge: &Challenge, state: &ChallengeState) -> bool {
    challenge.challenge_type().is_answerable()
        && !state.is_correct
        && !state.skipped
        && (state.attempts == 0 || challenge.repeatable)
}

/// Continue is offered once the challenge has nothing left to ask of the player.
#[must_use]
pub fn should_show_continue(challenge: &Challenge, state: &ChallengeState) -> bool {
    let challenge_type = challenge.challenge_type();
    state.is_correct
        || (challenge_type.is_answerable() && !challenge.repeatable && state.attempts > 0)
        || challenge_type == ChallengeType::Story
        || (challenge_type.is_geofenced() && state.is_location_reached)
}

/// Skip is offered after `grace` has elapsed on a challenge that cannot yet be continued.
#[must_use]
pub fn should_show_skip(
    challenge: &Challenge,
    state: &ChallengeState,
    now: DateTime<Utc>,
    grace: TimeDelta,
) -> bool {
    !state.skipped
        && !should_show_continue(challenge, state)
        && now.signed_duration_since(state.start_time) > grace
}

/// Hint is offered while hints exist and the challenge is unanswered.
#[must_use]
pub fn should_show_hint(challenge: &Challenge, state: &ChallengeState) -> bool {
    !challenge.hints.is_empty() && !state.is_correct
}

/// Time left until Skip appears, or `None` when it is already shown or never will be.
#[must_use]
pub fn skip_available_in(
    challenge: &Challenge,
    state: &ChallengeState,
    now: DateTime<Utc>,
    grace: TimeDelta,
) -> Option<TimeDelta> {
    if state.skipped || should_show_continue(challenge, state) {
        return None;
    }
    let elapsed = now.signed_duration_since(state.start_time);
    if elapsed > grace {
        return None;
    }
    Some(grace - elapsed)
}

/// All affordances for one poll of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affordances {
    pub submit: bool,
    #[serde(rename = "continue")]
    pub proceed: bool,
    pub skip: bool,
    pub hint: bool,
    /// Area-search clue disclosure; independent of the four primary actions.
    pub clue: bool,
}

impl Affordances {
    /// Derive every affordance. Recomputed on each poll so skip timing never relies on a
    /// timer that could outlive the view.
    #[must_use]
    pub fn derive(
        challenge: &Challenge,
        state: &ChallengeState,
        now: DateTime<Utc>,
        grace: TimeDelta,
    ) -> Self {
        Self {
            submit: should_show_submit(challenge, state),
            proceed: should_show_continue(challenge, state),
            skip: should_show_skip(challenge, state, now, grace),
            hint: should_show_hint(challenge, state),
            clue: !challenge.clues().is_empty() && !state.is_location_reached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{Answer, initialize, submit};
    use crate::config::EngineConfig;
    use crate::data::{ChallengeKind, FeedbackTexts};
    use crate::geo::LatLng;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn build(kind: ChallengeKind, repeatable: bool, hints: &[&str]) -> Challenge {
        Challenge {
            id: "v".into(),
            order: 0,
            title: "Visibility".into(),
            description: None,
            question: None,
            hints: hints.iter().map(|h| (*h).to_string()).collect(),
            feedback_texts: FeedbackTexts::default(),
            repeatable,
            kind,
        }
    }

    fn text_input(repeatable: bool) -> Challenge {
        build(
            ChallengeKind::TextInput {
                correct_answer: "yes".into(),
            },
            repeatable,
            &["think"],
        )
    }

    fn grace() -> TimeDelta {
        TimeDelta::minutes(5)
    }

    #[test]
    fn submit_and_continue_are_exclusive_for_answerable() {
        let cfg = EngineConfig::default();
        for repeatable in [true, false] {
            let c = text_input(repeatable);
            let mut state = initialize(&c, at(0));
            for answer in ["no", "no", "yes"] {
                let shown = Affordances::derive(&c, &state, at(1), grace());
                assert!(
                    !(shown.submit && shown.proceed),
                    "both shown for repeatable={repeatable}: {shown:?}"
                );
                match submit(&c, &state, &Answer::from(answer), &cfg, at(1)) {
                    Ok((next, _)) => state = next,
                    Err(_) => break,
                }
            }
            let shown = Affordances::derive(&c, &state, at(1), grace());
            assert!(shown.proceed);
            assert!(!shown.submit);
        }
    }

    #[test]
    fn repeatable_wrong_answer_keeps_submit() {
        let cfg = EngineConfig::default();
        let c = text_input(true);
        let state = initialize(&c, at(0));
        let (state, _) = submit(&c, &state, &"no".into(), &cfg, at(1)).unwrap();
        assert!(should_show_submit(&c, &state));
        assert!(!should_show_continue(&c, &state));
        assert!(should_show_hint(&c, &state));
    }

    #[test]
    fn one_shot_wrong_answer_offers_continue() {
        let cfg = EngineConfig::default();
        let c = text_input(false);
        let state = initialize(&c, at(0));
        let (state, _) = submit(&c, &state, &"no".into(), &cfg, at(1)).unwrap();
        assert!(!should_show_submit(&c, &state));
        assert!(should_show_continue(&c, &state));
    }

    #[test]
    fn hint_hidden_once_correct_or_without_hints() {
        let cfg = EngineConfig::default();
        let c = text_input(true);
        let state = initialize(&c, at(0));
        assert!(should_show_hint(&c, &state));
        let (state, _) = submit(&c, &state, &"yes".into(), &cfg, at(1)).unwrap();
        assert!(!should_show_hint(&c, &state));

        let bare = build(ChallengeKind::Story, false, &[]);
        assert!(!should_show_hint(&bare, &initialize(&bare, at(0))));
    }

    #[test]
    fn story_always_continues() {
        let c = build(ChallengeKind::Story, false, &[]);
        let state = initialize(&c, at(0));
        let shown = Affordances::derive(&c, &state, at(10_000), grace());
        assert!(shown.proceed);
        assert!(!shown.submit);
        assert!(!shown.skip);
    }

    #[test]
    fn travel_skip_appears_after_grace() {
        let c = build(
            ChallengeKind::Travel {
                target_location: LatLng::new(0.0, 0.0),
                radius: 10.0,
                completion_feedback: String::new(),
            },
            false,
            &[],
        );
        let state = initialize(&c, at(0));
        assert!(!should_show_continue(&c, &state));
        assert!(!should_show_skip(&c, &state, at(299), grace()));
        assert!(!should_show_skip(&c, &state, at(300), grace()));
        assert!(should_show_skip(&c, &state, at(301), grace()));
        assert_eq!(
            skip_available_in(&c, &state, at(240), grace()),
            Some(TimeDelta::seconds(60))
        );
        assert_eq!(skip_available_in(&c, &state, at(301), grace()), None);

        let mut reached = state.clone();
        reached.is_location_reached = true;
        assert!(should_show_continue(&c, &reached));
        assert!(!should_show_skip(&c, &reached, at(1_000), grace()));
    }

    #[test]
    fn clue_affordance_tracks_area_search() {
        let c = build(
            ChallengeKind::AreaSearch {
                clues: vec!["north side".into()],
                target_location: LatLng::new(0.0, 0.0),
                radius: 10.0,
            },
            false,
            &[],
        );
        let state = initialize(&c, at(0));
        assert!(Affordances::derive(&c, &state, at(1), grace()).clue);
    }
}
