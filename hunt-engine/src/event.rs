//! Structured events emitted by the hunt runner, and the audio/speech feedback seam.
//!
//! A view renders these directly instead of re-deriving what a dispatch changed.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::convert::Infallible;

use crate::location::LocationError;

/// Sound played for an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioCue {
    Correct,
    Wrong,
    LocationReached,
}

/// Tone of a feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTone {
    Positive,
    Negative,
    Neutral,
}

/// Severity tier for a runner event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

/// Hint for how the UI should surface an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiSurfaceHint {
    Log,
    Toast,
    Modal,
}

/// One observable outcome of a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunnerEvent {
    ChallengeActivated {
        index: usize,
        challenge_id: String,
    },
    Feedback {
        text: String,
        tone: FeedbackTone,
    },
    Audio {
        cue: AudioCue,
    },
    Hint {
        index: usize,
        text: String,
    },
    Clue {
        revealed: usize,
        text: String,
    },
    TextRevealed,
    LocationReached {
        challenge_id: String,
    },
    /// Position acquisition failed; `terminal` once retries are exhausted.
    LocationNotice {
        error: LocationError,
        terminal: bool,
    },
    /// A requested challenge index was clamped to the earned one.
    Redirected {
        requested: usize,
        resolved: usize,
    },
    Skipped {
        challenge_id: String,
    },
    Advanced {
        from: usize,
        to: usize,
    },
    Completed {
        hunt_id: String,
    },
    Abandoned {
        hunt_id: String,
    },
}

impl RunnerEvent {
    #[must_use]
    pub const fn severity(&self) -> EventSeverity {
        match self {
            Self::LocationNotice { terminal: true, .. } => EventSeverity::Critical,
            Self::LocationNotice { .. } | Self::Redirected { .. } => EventSeverity::Warning,
            _ => EventSeverity::Info,
        }
    }

    #[must_use]
    pub const fn ui_surface_hint(&self) -> UiSurfaceHint {
        match self {
            Self::Completed { .. } | Self::LocationNotice { terminal: true, .. } => {
                UiSurfaceHint::Modal
            }
            Self::Feedback { .. }
            | Self::LocationReached { .. }
            | Self::LocationNotice { .. }
            | Self::Hint { .. }
            | Self::Clue { .. } => UiSurfaceHint::Toast,
            _ => UiSurfaceHint::Log,
        }
    }
}

/// Events from one dispatch; most dispatches emit a handful.
pub type RunnerEvents = SmallVec<[RunnerEvent; 4]>;

/// Audio and speech output.
/// Platform-specific implementations should provide this
pub trait FeedbackSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Play a sound for an outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the cue cannot be played. Callers log and continue.
    fn play_audio(&mut self, cue: AudioCue) -> Result<(), Self::Error>;

    /// Speak feedback text aloud.
    ///
    /// # Errors
    ///
    /// Returns an error if speech is unavailable. Callers log and continue.
    fn speak(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// Sink that discards all output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentFeedback;

impl FeedbackSink for SilentFeedback {
    type Error = Infallible;

    fn play_audio(&mut self, _cue: AudioCue) -> Result<(), Self::Error> {
        Ok(())
    }

    fn speak(&mut self, _text: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Sink that records what it was asked to play; used in tests and scripted runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingFeedback {
    pub cues: Vec<AudioCue>,
    pub spoken: Vec<String>,
}

impl FeedbackSink for RecordingFeedback {
    type Error = Infallible;

    fn play_audio(&mut self, cue: AudioCue) -> Result<(), Self::Error> {
        self.cues.push(cue);
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<(), Self::Error> {
        self.spoken.push(text.to_string());
        Ok(())
    }
}

/// Forward cue and speech events to a sink. Failures are logged and never propagate.
pub fn emit<F: FeedbackSink>(sink: &mut F, events: &[RunnerEvent]) {
    for event in events {
        let outcome = match event {
            RunnerEvent::Audio { cue } => sink.play_audio(*cue),
            RunnerEvent::Feedback { text, .. } if !text.is_empty() => sink.speak(text),
            _ => Ok(()),
        };
        if let Err(err) = outcome {
            log::warn!("feedback output failed: {err}");
        }
    }
}
