use anyhow::{Context, Result};
use hunt_engine::{Answer, LocationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A scripted play-through of one hunt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn step(mut self, action: StepAction) -> Self {
        self.steps.push(Step {
            action,
            expect: Expectations::default(),
        });
        self
    }

    #[must_use]
    pub fn expect(mut self, expect: Expectations) -> Self {
        self.steps.push(Step {
            action: StepAction::Check,
            expect,
        });
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("script is not valid JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: StepAction,
    #[serde(flatten)]
    pub expect: Expectations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepAction {
    /// Report an absolute position.
    Position { latitude: f64, longitude: f64 },
    /// Report a position `distance_m` from the active target, standing on `bearing_deg`.
    Approach {
        distance_m: f64,
        #[serde(default)]
        bearing_deg: f64,
    },
    Submit {
        #[serde(default)]
        answer: Option<ScriptAnswer>,
    },
    Hint,
    Clue,
    RevealText,
    Skip,
    Continue,
    WaitSecs { secs: i64 },
    LocationError { error: LocationError },
    /// Re-enter the hunt at a requested challenge.
    Resume { index: usize },
    Abandon,
    /// Only evaluate expectations.
    Check,
}

impl StepAction {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Position { .. } => "position",
            Self::Approach { .. } => "approach",
            Self::Submit { .. } => "submit",
            Self::Hint => "hint",
            Self::Clue => "clue",
            Self::RevealText => "reveal_text",
            Self::Skip => "skip",
            Self::Continue => "continue",
            Self::WaitSecs { .. } => "wait_secs",
            Self::LocationError { .. } => "location_error",
            Self::Resume { .. } => "resume",
            Self::Abandon => "abandon",
            Self::Check => "check",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptAnswer {
    Bool(bool),
    Text(String),
}

impl ScriptAnswer {
    pub fn to_answer(answer: Option<&Self>) -> Answer {
        match answer {
            Some(Self::Bool(value)) => Answer::Bool(*value),
            Some(Self::Text(text)) => Answer::from_input(text),
            None => Answer::Empty,
        }
    }
}

/// Assertions checked after a step runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_reached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_hint: Option<String>,
    /// Whether the step itself should be rejected by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<bool>,
}

impl Expectations {
    pub fn index(index: usize) -> Self {
        Self {
            expect_index: Some(index),
            ..Self::default()
        }
    }

    pub fn feedback(text: &str) -> Self {
        Self {
            expect_feedback: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn hint(text: &str) -> Self {
        Self {
            expect_hint: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn reached() -> Self {
        Self {
            expect_reached: Some(true),
            ..Self::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            expect_completed: Some(true),
            ..Self::default()
        }
    }

    pub fn error() -> Self {
        Self {
            expect_error: Some(true),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_with_inline_expectations() {
        let script = Script::from_json(
            r#"{
                "name": "inline",
                "steps": [
                    { "step": "approach", "distance_m": 10, "expect_reached": true },
                    { "step": "submit", "answer": true, "expect_correct": true },
                    { "step": "submit", "answer": "Macbeth" },
                    { "step": "location_error", "error": { "kind": "timeout" } },
                    { "step": "wait_secs", "secs": 301 },
                    { "step": "continue", "expect_completed": true }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 6);
        assert_eq!(
            script.steps[0].action,
            StepAction::Approach {
                distance_m: 10.0,
                bearing_deg: 0.0
            }
        );
        assert_eq!(script.steps[0].expect, Expectations::reached());
        assert_eq!(
            script.steps[1].action,
            StepAction::Submit {
                answer: Some(ScriptAnswer::Bool(true))
            }
        );
        assert_eq!(
            script.steps[3].action,
            StepAction::LocationError {
                error: LocationError::Timeout
            }
        );
    }

    #[test]
    fn answers_map_to_engine_answers() {
        assert_eq!(
            ScriptAnswer::to_answer(Some(&ScriptAnswer::Text(String::new()))),
            Answer::Empty
        );
        assert_eq!(ScriptAnswer::to_answer(None), Answer::Empty);
        assert_eq!(
            ScriptAnswer::to_answer(Some(&ScriptAnswer::Bool(false))),
            Answer::Bool(false)
        );
    }
}
