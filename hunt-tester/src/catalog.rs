use anyhow::{Context, Result};
use hunt_engine::{Hunt, LocationError};

use crate::script::{Expectations, Script, ScriptAnswer, Step, StepAction};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown scenario '{0}' (see --list-scenarios)")]
    Unknown(String),
    #[error("no scenarios selected")]
    Empty,
}

const SAMPLE_HUNT: &str = include_str!("../data/sample_hunt.json");

/// The bundled hunt every built-in scenario plays.
pub fn sample_hunt() -> Result<Hunt> {
    Hunt::from_json(SAMPLE_HUNT).context("bundled sample hunt is invalid")
}

pub struct BuiltinScenario {
    pub key: &'static str,
    pub description: &'static str,
    build: fn() -> Script,
}

impl BuiltinScenario {
    pub fn script(&self) -> Script {
        (self.build)()
    }
}

pub fn catalog_scenarios() -> Vec<BuiltinScenario> {
    vec![
        BuiltinScenario {
            key: "smoke",
            description: "Happy path through every challenge type",
            build: smoke,
        },
        BuiltinScenario {
            key: "wrong-answers",
            description: "Feedback escalation and one-shot answers",
            build: wrong_answers,
        },
        BuiltinScenario {
            key: "hints",
            description: "Hint rotation on the opening challenge",
            build: hints,
        },
        BuiltinScenario {
            key: "skip-travel",
            description: "Skip appears only after the grace period",
            build: skip_travel,
        },
        BuiltinScenario {
            key: "location-failure",
            description: "Location retries exhaust and skip still works",
            build: location_failure,
        },
        BuiltinScenario {
            key: "skip-ahead",
            description: "Requested challenges are clamped to earned progress",
            build: skip_ahead,
        },
        BuiltinScenario {
            key: "abandon",
            description: "Abandoning forgets progress",
            build: abandon,
        },
    ]
}

pub fn find_scenario(key: &str) -> Option<BuiltinScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Resolve a comma separated selection; `all` expands to the whole catalog.
pub fn resolve_scenarios(selection: &str) -> Result<Vec<BuiltinScenario>, CatalogError> {
    let keys = split_csv(selection);
    if keys.is_empty() {
        return Err(CatalogError::Empty);
    }
    if keys.iter().any(|key| key == "all") {
        return Ok(catalog_scenarios());
    }
    keys.into_iter()
        .map(|key| find_scenario(&key).ok_or(CatalogError::Unknown(key)))
        .collect()
}

fn step(action: StepAction, expect: Expectations) -> Step {
    Step { action, expect }
}

fn approach(distance_m: f64) -> StepAction {
    StepAction::Approach {
        distance_m,
        bearing_deg: 90.0,
    }
}

fn submit(answer: &str) -> StepAction {
    StepAction::Submit {
        answer: Some(ScriptAnswer::Text(answer.to_string())),
    }
}

fn submit_bool(answer: bool) -> StepAction {
    StepAction::Submit {
        answer: Some(ScriptAnswer::Bool(answer)),
    }
}

fn correct() -> Expectations {
    Expectations {
        expect_correct: Some(true),
        ..Expectations::default()
    }
}

fn incorrect(feedback: &str) -> Expectations {
    Expectations {
        expect_correct: Some(false),
        expect_feedback: Some(feedback.to_string()),
        ..Expectations::default()
    }
}

fn scripted(name: &str, description: &str, steps: Vec<Step>) -> Script {
    let mut script = Script::new(name, description);
    script.steps = steps;
    script
}

/// Reach the fountain and move on to the second challenge.
fn opening() -> Vec<Step> {
    vec![
        step(
            approach(200.0),
            Expectations {
                expect_reached: Some(false),
                ..Expectations::default()
            },
        ),
        step(
            approach(10.0),
            Expectations {
                expect_reached: Some(true),
                expect_feedback: Some("You found the fountain!".into()),
                ..Expectations::default()
            },
        ),
        step(StepAction::Continue, Expectations::index(1)),
    ]
}

fn smoke() -> Script {
    let mut steps = opening();
    steps.extend([
        step(submit("Angel of the Waters"), correct()),
        step(StepAction::Continue, Expectations::index(2)),
        step(
            submit_bool(true),
            Expectations {
                expect_correct: Some(true),
                expect_feedback: Some("Yes, at the Loeb Boathouse.".into()),
                ..Expectations::default()
            },
        ),
        step(StepAction::Continue, Expectations::index(3)),
        step(submit("Macbeth"), Expectations::feedback("Double, double toil and trouble.")),
        step(StepAction::Continue, Expectations::index(4)),
        step(StepAction::Clue, Expectations::hint("It faces the Mall")),
        step(approach(80.0), Expectations::default()),
        step(
            approach(5.0),
            Expectations {
                expect_feedback: Some("You found the bench.".into()),
                ..Expectations::reached()
            },
        ),
        step(StepAction::Continue, Expectations::index(5)),
        step(StepAction::RevealText, Expectations::default()),
        step(StepAction::Continue, Expectations::completed()),
    ]);
    scripted("smoke", "Happy path through every challenge type", steps)
}

fn wrong_answers() -> Script {
    let mut steps = opening();
    steps.extend([
        step(submit("Winged Victory"), incorrect("Not quite.")),
        step(submit("Spirit of the Park"), incorrect("Look at the plaque.")),
        step(submit("Winged Victory"), incorrect("Look at the plaque.")),
        step(submit("Angel of the Waters"), correct()),
        step(StepAction::Continue, Expectations::index(2)),
        step(submit_bool(false), incorrect("They can, at the Loeb Boathouse.")),
        step(submit_bool(true), Expectations::error()),
        step(StepAction::Continue, Expectations::index(3)),
        step(submit("macbeth"), incorrect("Try again.")),
        step(submit(""), incorrect("Think of the Scottish play.")),
        step(submit("Macbeth"), correct()),
    ]);
    scripted("wrong-answers", "Feedback escalation and one-shot answers", steps)
}

fn hints() -> Script {
    Script::new("hints", "Hint rotation on the opening challenge")
        .step(StepAction::Hint)
        .expect(Expectations::hint("Follow the stairs down"))
        .step(StepAction::Hint)
        .expect(Expectations::hint("Look for the angel"))
        .step(StepAction::Hint)
        .expect(Expectations::hint("Head for the terrace"))
        .step(StepAction::Hint)
        .expect(Expectations::hint("Follow the stairs down"))
}

fn skip_travel() -> Script {
    scripted(
        "skip-travel",
        "Skip appears only after the grace period",
        vec![
            step(StepAction::Skip, Expectations::error()),
            step(StepAction::WaitSecs { secs: 300 }, Expectations::default()),
            step(StepAction::Skip, Expectations::error()),
            step(StepAction::WaitSecs { secs: 1 }, Expectations::default()),
            step(StepAction::Skip, Expectations::index(1)),
        ],
    )
}

fn location_failure() -> Script {
    let timeout = || StepAction::LocationError {
        error: LocationError::Timeout,
    };
    scripted(
        "location-failure",
        "Location retries exhaust and skip still works",
        vec![
            step(timeout(), Expectations::default()),
            step(timeout(), Expectations::default()),
            step(timeout(), Expectations::default()),
            step(timeout(), Expectations::default()),
            step(
                approach(5.0),
                Expectations {
                    expect_reached: Some(false),
                    ..Expectations::default()
                },
            ),
            step(StepAction::WaitSecs { secs: 301 }, Expectations::default()),
            step(StepAction::Skip, Expectations::index(1)),
            step(submit("Angel of the Waters"), correct()),
        ],
    )
}

fn skip_ahead() -> Script {
    let mut steps = vec![step(StepAction::Resume { index: 4 }, Expectations::index(0))];
    steps.extend(opening());
    steps.extend([
        step(StepAction::Resume { index: 5 }, Expectations::index(1)),
        step(StepAction::Resume { index: 0 }, Expectations::index(0)),
        step(StepAction::Resume { index: 3 }, Expectations::index(1)),
    ]);
    scripted(
        "skip-ahead",
        "Requested challenges are clamped to earned progress",
        steps,
    )
}

fn abandon() -> Script {
    let mut steps = opening();
    steps.extend([
        step(StepAction::Abandon, Expectations::default()),
        step(StepAction::Continue, Expectations::error()),
        step(StepAction::Resume { index: 1 }, Expectations::index(0)),
    ]);
    scripted("abandon", "Abandoning forgets progress", steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ScriptRunner;
    use hunt_engine::EngineConfig;

    #[test]
    fn sample_hunt_loads() {
        let hunt = sample_hunt().unwrap();
        assert_eq!(hunt.len(), 6);
        assert!(hunt.day_only);
    }

    #[test]
    fn every_builtin_scenario_passes() {
        let hunt = sample_hunt().unwrap();
        let runner = ScriptRunner::new(false);
        for scenario in catalog_scenarios() {
            let result = runner.run(&hunt, &EngineConfig::default(), &scenario.script());
            assert!(result.passed, "{}: {:?}", scenario.key, result.failures);
        }
    }

    #[test]
    fn smoke_completes_the_hunt() {
        let hunt = sample_hunt().unwrap();
        let script = find_scenario("smoke").unwrap().script();
        let result = ScriptRunner::new(false).run(&hunt, &EngineConfig::default(), &script);
        assert!(result.completed);
        assert_eq!(result.final_index, None);
    }

    #[test]
    fn resolves_selections() {
        let picked = resolve_scenarios(" hints, skip-travel ,").unwrap();
        let keys: Vec<_> = picked.iter().map(|s| s.key).collect();
        assert_eq!(keys, ["hints", "skip-travel"]);
        assert_eq!(
            resolve_scenarios("smoke,all").unwrap().len(),
            catalog_scenarios().len()
        );
        assert!(matches!(
            resolve_scenarios("smoke,nope"),
            Err(CatalogError::Unknown(key)) if key == "nope"
        ));
        assert!(matches!(resolve_scenarios(" , "), Err(CatalogError::Empty)));
    }

    #[test]
    fn scripts_roundtrip_through_json() {
        let script = find_scenario("wrong-answers").unwrap().script();
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(Script::from_json(&json).unwrap(), script);
    }
}
