use chrono::{DateTime, TimeDelta, Utc};
use colored::Colorize;
use hunt_engine::geo::offset;
use hunt_engine::{
    EngineConfig, Hunt, HuntEvent, HuntRunner, LatLng, MemoryStore, NoLocation, PlayerAction,
    Position, RecordingFeedback, RunnerError, RunnerEvent, RunnerEvents,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::script::{Expectations, Script, ScriptAnswer, Step, StepAction};

/// Simulated wall clock origin for every scripted run.
const CLOCK_ORIGIN_SECS: i64 = 1_700_000_000;

type ScriptedRunner = HuntRunner<MemoryStore, RecordingFeedback, NoLocation>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub events_emitted: usize,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_index: Option<usize>,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

pub struct ScriptRunner {
    verbose: bool,
}

impl ScriptRunner {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run(&self, hunt: &Hunt, config: &EngineConfig, script: &Script) -> ScenarioResult {
        let started = Instant::now();
        if self.verbose {
            println!("🧪 Running script: {}", script.name.bright_white());
        }

        let mut failures = Vec::new();
        let mut steps_run = 0;
        let mut events_emitted = 0;
        let mut outcome = None;

        match HuntRunner::new(
            hunt.clone(),
            config.clone(),
            MemoryStore::new(),
            RecordingFeedback::default(),
            NoLocation,
        ) {
            Ok(mut runner) => {
                let mut play = Playthrough::new(&mut runner);
                match play.start() {
                    Ok(count) => {
                        events_emitted += count;
                        for (number, step) in script.steps.iter().enumerate() {
                            steps_run += 1;
                            let (count, step_failures) = play.run_step(number + 1, step);
                            events_emitted += count;
                            if self.verbose {
                                log_step(number + 1, step, &step_failures);
                            }
                            failures.extend(step_failures);
                        }
                    }
                    Err(err) => failures.push(format!("could not start hunt: {err}")),
                }
                outcome = Some((runner.is_completed(), runner.current_index()));
            }
            Err(err) => failures.push(format!("invalid engine configuration: {err}")),
        }

        let (completed, final_index) = outcome.unwrap_or((false, None));
        ScenarioResult {
            scenario_name: script.name.clone(),
            passed: failures.is_empty(),
            steps_run,
            events_emitted,
            completed,
            final_index,
            failures,
            duration: started.elapsed(),
        }
    }
}

fn log_step(number: usize, step: &Step, failures: &[String]) {
    if failures.is_empty() {
        println!("  ✓ step {number}: {}", step.action.label());
    } else {
        println!("  ✗ step {number}: {}", step.action.label().red());
    }
}

/// One scripted run against a live runner on a simulated clock.
struct Playthrough<'a> {
    runner: &'a mut ScriptedRunner,
    now: DateTime<Utc>,
    last_feedback: Option<String>,
    last_hint: Option<String>,
}

impl<'a> Playthrough<'a> {
    fn new(runner: &'a mut ScriptedRunner) -> Self {
        Self {
            runner,
            now: DateTime::from_timestamp(CLOCK_ORIGIN_SECS, 0).unwrap_or_default(),
            last_feedback: None,
            last_hint: None,
        }
    }

    fn start(&mut self) -> Result<usize, RunnerError> {
        let events = self.runner.start(self.now)?;
        Ok(events.len())
    }

    fn tick(&mut self) {
        self.now += TimeDelta::seconds(1);
    }

    fn run_step(&mut self, number: usize, step: &Step) -> (usize, Vec<String>) {
        let mut failures = Vec::new();
        let outcome = self.apply(&step.action);
        let count = match &outcome {
            Ok(events) => {
                self.remember_feedback(events);
                events.len()
            }
            Err(_) => 0,
        };

        let expect_error = step.expect.expect_error.unwrap_or(false);
        match (&outcome, expect_error) {
            (Err(err), false) => failures.push(format!(
                "step {number} ({}): rejected: {err}",
                step.action.label()
            )),
            (Ok(_), true) => failures.push(format!(
                "step {number} ({}): expected the engine to reject it",
                step.action.label()
            )),
            _ => {}
        }
        failures.extend(
            self.check(&step.expect)
                .into_iter()
                .map(|failure| format!("step {number} ({}): {failure}", step.action.label())),
        );
        (count, failures)
    }

    fn apply(&mut self, action: &StepAction) -> Result<RunnerEvents, RunnerError> {
        match action {
            StepAction::Position {
                latitude,
                longitude,
            } => {
                self.tick();
                let position = Position::new(LatLng::new(*latitude, *longitude), self.now);
                self.runner.dispatch(HuntEvent::Position(position), self.now)
            }
            StepAction::Approach {
                distance_m,
                bearing_deg,
            } => {
                self.tick();
                let Some((target, _)) = self
                    .runner
                    .current_challenge()
                    .and_then(|challenge| challenge.geofence())
                else {
                    return Ok(RunnerEvents::new());
                };
                let spot = offset(target, *bearing_deg, *distance_m);
                self.runner
                    .dispatch(HuntEvent::Position(Position::new(spot, self.now)), self.now)
            }
            StepAction::Submit { answer } => {
                self.tick();
                let answer = ScriptAnswer::to_answer(answer.as_ref());
                self.action(PlayerAction::Submit(answer))
            }
            StepAction::Hint => self.action(PlayerAction::RequestHint),
            StepAction::Clue => self.action(PlayerAction::RevealClue),
            StepAction::RevealText => self.action(PlayerAction::RevealText),
            StepAction::Skip => self.action(PlayerAction::Skip),
            StepAction::Continue => {
                self.tick();
                self.action(PlayerAction::Continue)
            }
            StepAction::WaitSecs { secs } => {
                self.now += TimeDelta::try_seconds(*secs).unwrap_or_default();
                Ok(RunnerEvents::new())
            }
            StepAction::LocationError { error } => {
                self.tick();
                self.runner
                    .dispatch(HuntEvent::LocationFailed(error.clone()), self.now)
            }
            StepAction::Resume { index } => {
                self.tick();
                self.runner.resume(*index, self.now)
            }
            StepAction::Abandon => self.runner.abandon(),
            StepAction::Check => Ok(RunnerEvents::new()),
        }
    }

    fn action(&mut self, action: PlayerAction) -> Result<RunnerEvents, RunnerError> {
        self.runner.dispatch(HuntEvent::Action(action), self.now)
    }

    fn remember_feedback(&mut self, events: &[RunnerEvent]) {
        for event in events {
            match event {
                RunnerEvent::Feedback { text, .. } => self.last_feedback = Some(text.clone()),
                RunnerEvent::Hint { text, .. } | RunnerEvent::Clue { text, .. } => {
                    self.last_hint = Some(text.clone());
                }
                RunnerEvent::ChallengeActivated { .. } => {
                    self.last_feedback = None;
                    self.last_hint = None;
                }
                _ => {}
            }
        }
    }

    fn check(&self, expect: &Expectations) -> Vec<String> {
        let mut failures = Vec::new();
        let state = self.runner.state();

        if let Some(wanted) = expect.expect_reached {
            let actual = state.is_some_and(|s| s.is_location_reached);
            if actual != wanted {
                failures.push(format!("expected reached={wanted}, got {actual}"));
            }
        }
        if let Some(wanted) = expect.expect_correct {
            let actual = state.is_some_and(|s| s.is_correct);
            if actual != wanted {
                failures.push(format!("expected correct={wanted}, got {actual}"));
            }
        }
        if let Some(wanted) = expect.expect_completed {
            let actual = self.runner.is_completed();
            if actual != wanted {
                failures.push(format!("expected completed={wanted}, got {actual}"));
            }
        }
        if let Some(wanted) = expect.expect_index {
            let actual = self.runner.current_index();
            if actual != Some(wanted) {
                failures.push(format!("expected challenge {wanted}, got {actual:?}"));
            }
        }
        if let Some(wanted) = &expect.expect_feedback {
            let actual = self.last_feedback.as_deref().unwrap_or("");
            if actual != wanted {
                failures.push(format!("expected feedback '{wanted}', got '{actual}'"));
            }
        }
        if let Some(wanted) = &expect.expect_hint {
            let actual = self.last_hint.as_deref().unwrap_or("");
            if actual != wanted {
                failures.push(format!("expected hint '{wanted}', got '{actual}'"));
            }
        }
        failures
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::sample_hunt;

    fn run(script: &Script) -> ScenarioResult {
        ScriptRunner::new(false).run(&sample_hunt().unwrap(), &EngineConfig::default(), script)
    }

    #[test]
    fn failed_expectations_are_reported_per_step() {
        let script = Script::new("bad", "")
            .step(StepAction::Continue)
            .expect(Expectations::index(3));
        let result = run(&script);
        assert!(!result.passed);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].starts_with("step 1 (continue): rejected"));
        assert!(result.failures[1].contains("expected challenge 3"));
    }

    #[test]
    fn expected_rejections_pass() {
        let mut script = Script::new("guarded", "");
        script.steps.push(Step {
            action: StepAction::Continue,
            expect: Expectations::error(),
        });
        let result = run(&script);
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.final_index, Some(0));
    }

    #[test]
    fn approach_reaches_active_target() {
        let mut script = Script::new("walk", "");
        script.steps.push(Step {
            action: StepAction::Approach {
                distance_m: 5.0,
                bearing_deg: 45.0,
            },
            expect: Expectations {
                expect_reached: Some(true),
                expect_feedback: Some("You found the fountain!".into()),
                ..Expectations::default()
            },
        });
        let result = run(&script);
        assert!(result.passed, "{:?}", result.failures);
    }
}
