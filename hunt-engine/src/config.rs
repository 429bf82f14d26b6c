//! Engine configuration: timing windows, location sampling and answer matching.
use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::numbers::u64_to_i64;

/// How submitted text is compared against a challenge's correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMatch {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Equality after trimming surrounding whitespace.
    Trimmed,
    /// Trimmed, Unicode case-folded equality.
    CaseInsensitive,
}

impl AnswerMatch {
    #[must_use]
    pub fn matches(self, submitted: &str, expected: &str) -> bool {
        match self {
            Self::Exact => submitted == expected,
            Self::Trimmed => submitted.trim() == expected.trim(),
            Self::CaseInsensitive => {
                submitted.trim().to_lowercase() == expected.trim().to_lowercase()
            }
        }
    }
}

/// Runtime configuration for hunt play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds a challenge must be active before Skip is offered.
    #[serde(default = "EngineConfig::default_skip_grace_secs")]
    pub skip_grace_secs: u64,
    /// Cosmetic pause between answering a one-shot challenge and advancing.
    #[serde(default = "EngineConfig::default_transition_delay_ms")]
    pub transition_delay_ms: u64,
    /// Minimum spacing between location samples.
    #[serde(default = "EngineConfig::default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    #[serde(default = "EngineConfig::default_location_max_retries")]
    pub location_max_retries: u32,
    #[serde(default = "EngineConfig::default_location_retry_delay_ms")]
    pub location_retry_delay_ms: u64,
    #[serde(default)]
    pub answer_match: AnswerMatch,
    #[serde(default = "EngineConfig::default_use_metric")]
    pub use_metric: bool,
    /// First local hour (inclusive) during which day-only hunts may start.
    #[serde(default = "EngineConfig::default_daylight_start_hour")]
    pub daylight_start_hour: u32,
    /// Local hour (exclusive) after which day-only hunts may not start.
    #[serde(default = "EngineConfig::default_daylight_end_hour")]
    pub daylight_end_hour: u32,
}

impl EngineConfig {
    const fn default_skip_grace_secs() -> u64 {
        300
    }

    const fn default_transition_delay_ms() -> u64 {
        2_000
    }

    const fn default_sample_interval_ms() -> u64 {
        1_000
    }

    const fn default_location_max_retries() -> u32 {
        3
    }

    const fn default_location_retry_delay_ms() -> u64 {
        5_000
    }

    const fn default_use_metric() -> bool {
        true
    }

    const fn default_daylight_start_hour() -> u32 {
        6
    }

    const fn default_daylight_end_hour() -> u32 {
        20
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field violates its bounds.
    pub fn from_json(json: &str) -> Result<Self, EngineConfigError> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|err| EngineConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `EngineConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        Self::check_min("skip_grace_secs", 1, self.skip_grace_secs)?;
        Self::check_max("transition_delay_ms", 10_000, self.transition_delay_ms)?;
        Self::check_min("sample_interval_ms", 100, self.sample_interval_ms)?;
        Self::check_max(
            "location_max_retries",
            10,
            u64::from(self.location_max_retries),
        )?;
        Self::check_min("location_retry_delay_ms", 100, self.location_retry_delay_ms)?;
        self.validate_daylight()
    }

    fn check_min(field: &'static str, min: u64, value: u64) -> Result<(), EngineConfigError> {
        if value < min {
            return Err(EngineConfigError::MinViolation { field, min, value });
        }
        Ok(())
    }

    fn check_max(field: &'static str, max: u64, value: u64) -> Result<(), EngineConfigError> {
        if value > max {
            return Err(EngineConfigError::MaxViolation { field, max, value });
        }
        Ok(())
    }

    fn validate_daylight(&self) -> Result<(), EngineConfigError> {
        if self.daylight_start_hour > 23
            || self.daylight_end_hour > 24
            || self.daylight_start_hour >= self.daylight_end_hour
        {
            return Err(EngineConfigError::DaylightWindow {
                start: self.daylight_start_hour,
                end: self.daylight_end_hour,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn skip_grace(&self) -> TimeDelta {
        TimeDelta::try_seconds(u64_to_i64(self.skip_grace_secs)).unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn transition_delay(&self) -> TimeDelta {
        TimeDelta::try_milliseconds(u64_to_i64(self.transition_delay_ms)).unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn sample_interval(&self) -> TimeDelta {
        TimeDelta::try_milliseconds(u64_to_i64(self.sample_interval_ms)).unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn location_retry_delay(&self) -> TimeDelta {
        TimeDelta::try_milliseconds(u64_to_i64(self.location_retry_delay_ms))
            .unwrap_or(TimeDelta::MAX)
    }

    /// Whether a day-only hunt may start at the given local wall-clock time.
    #[must_use]
    pub fn is_daylight(&self, local_time: NaiveTime) -> bool {
        (self.daylight_start_hour..self.daylight_end_hour).contains(&local_time.hour())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skip_grace_secs: Self::default_skip_grace_secs(),
            transition_delay_ms: Self::default_transition_delay_ms(),
            sample_interval_ms: Self::default_sample_interval_ms(),
            location_max_retries: Self::default_location_max_retries(),
            location_retry_delay_ms: Self::default_location_retry_delay_ms(),
            answer_match: AnswerMatch::default(),
            use_metric: Self::default_use_metric(),
            daylight_start_hour: Self::default_daylight_start_hour(),
            daylight_end_hour: Self::default_daylight_end_hour(),
        }
    }
}

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineConfigError {
    #[error("configuration could not be parsed: {0}")]
    Parse(String),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("{field} must be at most {max} (got {value})")]
    MaxViolation {
        field: &'static str,
        max: u64,
        value: u64,
    },
    #[error("daylight window invalid (start {start}, end {end})")]
    DaylightWindow { start: u32, end: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_equals_default() {
        let cfg = EngineConfig::from_json("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.skip_grace(), TimeDelta::minutes(5));
        assert_eq!(cfg.transition_delay(), TimeDelta::seconds(2));
        assert_eq!(cfg.location_max_retries, 3);
        assert_eq!(cfg.location_retry_delay(), TimeDelta::seconds(5));
        assert_eq!(cfg.answer_match, AnswerMatch::Exact);
    }

    #[test]
    fn validation_flags_out_of_range_fields() {
        let err = EngineConfig::from_json(r#"{"sample_interval_ms": 10}"#).unwrap_err();
        assert_eq!(
            err,
            EngineConfigError::MinViolation {
                field: "sample_interval_ms",
                min: 100,
                value: 10
            }
        );
        let err = EngineConfig::from_json(r#"{"location_max_retries": 50}"#).unwrap_err();
        assert!(matches!(err, EngineConfigError::MaxViolation { .. }));
        let err =
            EngineConfig::from_json(r#"{"daylight_start_hour": 20, "daylight_end_hour": 6}"#)
                .unwrap_err();
        assert_eq!(err, EngineConfigError::DaylightWindow { start: 20, end: 6 });
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(EngineConfigError::Parse(_))
        ));
    }

    #[test]
    fn answer_match_policies() {
        assert!(AnswerMatch::Exact.matches("Macbeth", "Macbeth"));
        assert!(!AnswerMatch::Exact.matches("macbeth", "Macbeth"));
        assert!(!AnswerMatch::Exact.matches("Macbeth ", "Macbeth"));
        assert!(AnswerMatch::Trimmed.matches(" Macbeth ", "Macbeth"));
        assert!(!AnswerMatch::Trimmed.matches("macbeth", "Macbeth"));
        assert!(AnswerMatch::CaseInsensitive.matches(" mACBETH", "Macbeth"));
    }

    #[test]
    fn daylight_window_is_half_open() {
        let cfg = EngineConfig::default();
        let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert!(!cfg.is_daylight(at(5, 59)));
        assert!(cfg.is_daylight(at(6, 0)));
        assert!(cfg.is_daylight(at(19, 59)));
        assert!(!cfg.is_daylight(at(20, 0)));
    }
}
