//! Hunt orchestration: activation, location handling, player actions and advancement.
//!
//! [`HuntRunner`] is the single state container for a hunt in play. Position samples and
//! player actions both arrive through [`HuntRunner::dispatch`], which applies one pure
//! transition at a time and reports what changed as [`RunnerEvent`]s.
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::challenge::{self, Answer, ChallengeError, ChallengeState, Verdict};
use crate::config::{EngineConfig, EngineConfigError};
use crate::data::{Challenge, Hunt};
use crate::event::{AudioCue, FeedbackSink, FeedbackTone, RunnerEvent, RunnerEvents, emit};
use crate::geo::DistanceScale;
use crate::location::{
    LocationError, LocationProvider, LocationSampler, LocationStatus, LocationWatch, Position,
    SampleDecision,
};
use crate::navigation::{self, Navigation};
use crate::numbers::usize_to_f64;
use crate::progress::{PersistenceStore, ProgressError, ProgressTracker};
use crate::visibility::{self, Affordances};

/// Where the player is in the hunt as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum HuntPhase {
    Loading,
    Active { index: usize },
    Completed,
}

/// Discrete input from the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "answer", rename_all = "snake_case")]
pub enum PlayerAction {
    Submit(Answer),
    RequestHint,
    RevealClue,
    RevealText,
    Skip,
    Continue,
}

/// Anything the runner reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum HuntEvent {
    Position(Position),
    LocationFailed(LocationError),
    Action(PlayerAction),
}

impl From<PlayerAction> for HuntEvent {
    fn from(action: PlayerAction) -> Self {
        Self::Action(action)
    }
}

impl From<Position> for HuntEvent {
    fn from(position: Position) -> Self {
        Self::Position(position)
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no challenge is active")]
    NotActive,
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
    #[error("challenge {id} cannot be continued yet")]
    ContinueUnavailable { id: String },
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Read-only view of the runner for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HuntSnapshot {
    pub hunt_id: String,
    pub phase: HuntPhase,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ChallengeState>,
    pub affordances: Affordances,
    /// Seconds until Skip appears, while it is still pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_in_secs: Option<i64>,
    /// Fraction of challenges behind the player, `0.0..=1.0`.
    pub progress: f64,
    pub location: LocationStatus,
}

/// Drives one hunt for one player.
pub struct HuntRunner<S, F, P>
where
    S: PersistenceStore,
    F: FeedbackSink,
    P: LocationProvider,
{
    hunt: Hunt,
    config: EngineConfig,
    progress: ProgressTracker<S>,
    feedback: F,
    watch: LocationWatch<P>,
    phase: HuntPhase,
    state: Option<ChallengeState>,
    last_position: Option<Position>,
}

impl<S, F, P> HuntRunner<S, F, P>
where
    S: PersistenceStore,
    F: FeedbackSink,
    P: LocationProvider,
{
    /// Build a runner in the `Loading` phase.
    ///
    /// # Errors
    ///
    /// Returns `EngineConfigError` when `config` fails validation.
    pub fn new(
        hunt: Hunt,
        config: EngineConfig,
        store: S,
        feedback: F,
        provider: P,
    ) -> Result<Self, EngineConfigError> {
        config.validate()?;
        let sampler = LocationSampler::from_config(&config);
        Ok(Self {
            hunt,
            config,
            progress: ProgressTracker::new(store),
            feedback,
            watch: LocationWatch::new(provider, sampler),
            phase: HuntPhase::Loading,
            state: None,
            last_position: None,
        })
    }

    #[must_use]
    pub const fn hunt(&self) -> &Hunt {
        &self.hunt
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> HuntPhase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> Option<&ChallengeState> {
        self.state.as_ref()
    }

    #[must_use]
    pub const fn progress(&self) -> &ProgressTracker<S> {
        &self.progress
    }

    #[must_use]
    pub const fn feedback(&self) -> &F {
        &self.feedback
    }

    #[must_use]
    pub const fn location(&self) -> &LocationWatch<P> {
        &self.watch
    }

    pub const fn location_mut(&mut self) -> &mut LocationWatch<P> {
        &mut self.watch
    }

    #[must_use]
    pub const fn last_position(&self) -> Option<&Position> {
        self.last_position.as_ref()
    }

    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        match self.phase {
            HuntPhase::Active { index } => Some(index),
            HuntPhase::Loading | HuntPhase::Completed => None,
        }
    }

    #[must_use]
    pub fn current_challenge(&self) -> Option<&Challenge> {
        self.current_index().and_then(|i| self.hunt.challenge(i))
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.phase, HuntPhase::Completed)
    }

    /// Begin the hunt from its first challenge, discarding earlier progress.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be written.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<RunnerEvents, RunnerError> {
        self.progress.restart(&self.hunt.id)?;
        log::info!("starting hunt {}", self.hunt.id);
        let mut events = RunnerEvents::new();
        self.activate(0, now, &mut events);
        Ok(events)
    }

    /// Re-enter the hunt at `requested`, clamped to the progress the player has earned.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be read or written.
    pub fn resume(
        &mut self,
        requested: usize,
        now: DateTime<Utc>,
    ) -> Result<RunnerEvents, RunnerError> {
        let allowed = self
            .progress
            .validate_requested_index(&self.hunt.id, requested)?;
        let resolved = allowed.min(self.hunt.last_index());
        self.progress.save(&self.hunt.id, resolved)?;

        let mut events = RunnerEvents::new();
        if resolved != requested {
            events.push(RunnerEvent::Redirected {
                requested,
                resolved,
            });
        }
        log::info!("resuming hunt {} at challenge {resolved}", self.hunt.id);
        self.activate(resolved, now, &mut events);
        Ok(events)
    }

    /// Leave the hunt and forget its progress.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be cleared.
    pub fn abandon(&mut self) -> Result<RunnerEvents, RunnerError> {
        self.progress.clear()?;
        self.watch.stop();
        self.phase = HuntPhase::Loading;
        self.state = None;
        log::info!("hunt {} abandoned", self.hunt.id);
        let mut events = RunnerEvents::new();
        events.push(RunnerEvent::Abandoned {
            hunt_id: self.hunt.id.clone(),
        });
        Ok(events)
    }

    /// Apply one event to the active challenge.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::NotActive` for player actions outside the `Active` phase, the
    /// state machine's rejection for invalid actions and `ContinueUnavailable` when the
    /// challenge cannot be left yet. Position events never fail.
    pub fn dispatch(
        &mut self,
        event: HuntEvent,
        now: DateTime<Utc>,
    ) -> Result<RunnerEvents, RunnerError> {
        let mut events = RunnerEvents::new();
        match event {
            HuntEvent::Position(position) => {
                let decision = self.watch.offer(Ok(position), now);
                self.apply_sample(decision, &mut events);
            }
            HuntEvent::LocationFailed(error) => {
                let decision = self.watch.offer(Err(error), now);
                self.apply_sample(decision, &mut events);
            }
            HuntEvent::Action(action) => self.apply_action(action, now, &mut events)?,
        }
        emit(&mut self.feedback, &events);
        Ok(events)
    }

    /// Pull a sample from the location provider when the active challenge needs one.
    pub fn poll_location(&mut self, now: DateTime<Utc>) -> RunnerEvents {
        let mut events = RunnerEvents::new();
        if self.awaiting_arrival() {
            let decision = self.watch.tick(now);
            self.apply_sample(decision, &mut events);
            emit(&mut self.feedback, &events);
        }
        events
    }

    /// Release the location provider.
    pub fn stop_location(&mut self) {
        self.watch.stop();
    }

    /// Affordances for the active challenge, recomputed against `now`.
    #[must_use]
    pub fn affordances(&self, now: DateTime<Utc>) -> Affordances {
        match (self.current_challenge(), &self.state) {
            (Some(challenge), Some(state)) => {
                Affordances::derive(challenge, state, now, self.config.skip_grace())
            }
            _ => Affordances::default(),
        }
    }

    /// Distance and direction from the last known position to the active target.
    #[must_use]
    pub fn navigation(&self) -> Option<Navigation> {
        let challenge = self.current_challenge()?;
        let position = self.last_position.as_ref()?;
        navigation::navigate(
            challenge,
            position.coords(),
            self.config.use_metric,
            DistanceScale::Large,
        )
    }

    /// Area-search distance hint from the last known position.
    #[must_use]
    pub fn search_hint(&self) -> Option<String> {
        let challenge = self.current_challenge()?;
        let position = self.last_position.as_ref()?;
        navigation::search_hint(challenge, position.coords(), self.config.use_metric)
    }

    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> HuntSnapshot {
        let total = self.hunt.len();
        let challenge = self.current_challenge();
        let skip_in_secs = match (challenge, &self.state) {
            (Some(challenge), Some(state)) => {
                visibility::skip_available_in(challenge, state, now, self.config.skip_grace())
                    .map(ceil_secs)
            }
            _ => None,
        };
        let progress = match self.phase {
            HuntPhase::Loading => 0.0,
            HuntPhase::Active { index } => usize_to_f64(index) / usize_to_f64(total.max(1)),
            HuntPhase::Completed => 1.0,
        };
        HuntSnapshot {
            hunt_id: self.hunt.id.clone(),
            phase: self.phase,
            total,
            challenge_id: challenge.map(|c| c.id.clone()),
            state: self.state.clone(),
            affordances: self.affordances(now),
            skip_in_secs,
            progress,
            location: self.watch.status().clone(),
        }
    }

    fn awaiting_arrival(&self) -> bool {
        match (self.current_challenge(), &self.state) {
            (Some(challenge), Some(state)) => {
                challenge.challenge_type().is_geofenced()
                    && !state.is_location_reached
                    && !state.skipped
            }
            _ => false,
        }
    }

    fn activate(&mut self, index: usize, now: DateTime<Utc>, events: &mut RunnerEvents) {
        let Some(challenge) = self.hunt.challenge(index) else {
            return;
        };
        self.state = Some(challenge::initialize(challenge, now));
        self.phase = HuntPhase::Active { index };
        if challenge.challenge_type().is_geofenced() {
            self.watch.resume();
            self.watch.refresh();
        } else {
            self.watch.reset();
        }
        log::debug!(
            "activated challenge {index} ({}) of hunt {}",
            challenge.id,
            self.hunt.id
        );
        events.push(RunnerEvent::ChallengeActivated {
            index,
            challenge_id: challenge.id.clone(),
        });
    }

    fn apply_sample(&mut self, decision: SampleDecision, events: &mut RunnerEvents) {
        match decision {
            SampleDecision::Idle | SampleDecision::Duplicate => {}
            SampleDecision::Fresh(position) => {
                self.last_position = Some(position);
                self.check_arrival(position, events);
            }
            SampleDecision::RetryScheduled { error, .. } => {
                events.push(RunnerEvent::LocationNotice {
                    error,
                    terminal: false,
                });
            }
            SampleDecision::Exhausted(error) => {
                events.push(RunnerEvent::LocationNotice {
                    error,
                    terminal: true,
                });
            }
        }
    }

    fn check_arrival(&mut self, position: Position, events: &mut RunnerEvents) {
        let Some(index) = self.current_index() else {
            return;
        };
        let (Some(challenge), Some(state)) = (self.hunt.challenge(index), &self.state) else {
            return;
        };
        let (next, arrived) = challenge::check_arrival(challenge, state, position.coords());
        if !arrived {
            return;
        }
        push_feedback(events, &next.feedback, FeedbackTone::Positive);
        events.push(RunnerEvent::Audio {
            cue: AudioCue::LocationReached,
        });
        events.push(RunnerEvent::LocationReached {
            challenge_id: challenge.id.clone(),
        });
        self.state = Some(next);
    }

    fn apply_action(
        &mut self,
        action: PlayerAction,
        now: DateTime<Utc>,
        events: &mut RunnerEvents,
    ) -> Result<(), RunnerError> {
        let HuntPhase::Active { index } = self.phase else {
            return Err(RunnerError::NotActive);
        };
        let (Some(challenge), Some(state)) = (self.hunt.challenge(index), &self.state) else {
            return Err(RunnerError::NotActive);
        };

        match action {
            PlayerAction::Submit(answer) => {
                let (next, verdict) =
                    challenge::submit(challenge, state, &answer, &self.config, now)?;
                let (tone, cue) = match verdict {
                    Verdict::Correct => (FeedbackTone::Positive, AudioCue::Correct),
                    Verdict::Incorrect => (FeedbackTone::Negative, AudioCue::Wrong),
                };
                push_feedback(events, &next.feedback, tone);
                events.push(RunnerEvent::Audio { cue });
                self.state = Some(next);
            }
            PlayerAction::RequestHint => {
                // A challenge without hints stays a silent no-op.
                if !challenge.hints.is_empty()
                    && !visibility::should_show_hint(challenge, state)
                {
                    return Err(ChallengeError::HintUnavailable.into());
                }
                let (next, hint) = challenge::request_hint(challenge, state);
                if let Some(text) = hint {
                    log::debug!("hint {} for challenge {}", next.hint_index, challenge.id);
                    events.push(RunnerEvent::Hint {
                        index: next.hint_index,
                        text,
                    });
                }
                self.state = Some(next);
            }
            PlayerAction::RevealClue => {
                let (next, clue) = challenge::reveal_clue(challenge, state);
                if let Some(text) = clue {
                    events.push(RunnerEvent::Clue {
                        revealed: next.clues_revealed,
                        text,
                    });
                }
                self.state = Some(next);
            }
            PlayerAction::RevealText => {
                self.state = Some(challenge::reveal_text(state));
                events.push(RunnerEvent::TextRevealed);
            }
            PlayerAction::Skip => {
                let next = challenge::skip(challenge, state, &self.config, now)?;
                events.push(RunnerEvent::Skipped {
                    challenge_id: challenge.id.clone(),
                });
                self.state = Some(next);
                self.advance(index, now, events)?;
            }
            PlayerAction::Continue => {
                if !challenge::can_continue(challenge, state) {
                    return Err(RunnerError::ContinueUnavailable {
                        id: challenge.id.clone(),
                    });
                }
                self.advance(index, now, events)?;
            }
        }
        Ok(())
    }

    fn advance(
        &mut self,
        index: usize,
        now: DateTime<Utc>,
        events: &mut RunnerEvents,
    ) -> Result<(), RunnerError> {
        let next = index + 1;
        self.progress.save(&self.hunt.id, next)?;
        if next >= self.hunt.len() {
            self.progress.clear()?;
            self.watch.stop();
            self.phase = HuntPhase::Completed;
            self.state = None;
            log::info!("hunt {} completed", self.hunt.id);
            events.push(RunnerEvent::Completed {
                hunt_id: self.hunt.id.clone(),
            });
            return Ok(());
        }
        log::info!("hunt {} advanced {index} -> {next}", self.hunt.id);
        events.push(RunnerEvent::Advanced {
            from: index,
            to: next,
        });
        self.activate(next, now, events);
        Ok(())
    }
}

fn push_feedback(events: &mut RunnerEvents, text: &str, tone: FeedbackTone) {
    if !text.is_empty() {
        events.push(RunnerEvent::Feedback {
            text: text.to_string(),
            tone,
        });
    }
}

fn ceil_secs(delta: TimeDelta) -> i64 {
    let secs = delta.num_seconds();
    if delta.subsec_nanos() > 0 { secs + 1 } else { secs }
}
