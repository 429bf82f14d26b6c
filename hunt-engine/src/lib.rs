//! Hunt Engine
//!
//! Platform-agnostic progression engine for location-based scavenger hunts.
//! This crate provides challenge rules, geofencing, progress persistence and hunt
//! orchestration without UI or platform-specific dependencies.

pub mod challenge;
pub mod config;
pub mod data;
pub mod event;
pub mod geo;
pub mod location;
pub mod navigation;
pub mod numbers;
pub mod progress;
#[cfg(feature = "async")]
pub mod pump;
pub mod runner;
pub mod visibility;

// Re-export commonly used types
pub use challenge::{Answer, ChallengeError, ChallengeState, Verdict};
pub use config::{AnswerMatch, EngineConfig, EngineConfigError};
pub use data::{
    Challenge, ChallengeKind, ChallengeType, FeedbackTexts, Hunt, HuntConfigError, HuntLoadError,
};
pub use event::{
    AudioCue, EventSeverity, FeedbackSink, FeedbackTone, RecordingFeedback, RunnerEvent,
    RunnerEvents, SilentFeedback, UiSurfaceHint,
};
pub use geo::{
    CompassPoint, DistanceScale, DistanceUnit, FormattedDistance, LatLng, bearing,
    distance_meters, format_distance, is_within_geofence,
};
pub use location::{
    LocationError, LocationProvider, LocationStatus, LocationWatch, NoLocation, Position,
    ScriptedLocation,
};
pub use navigation::Navigation;
pub use progress::{HuntProgress, MemoryStore, PersistenceStore, ProgressError, ProgressTracker};
#[cfg(feature = "async")]
pub use pump::{PumpExit, PumpReport, drive};
pub use runner::{HuntEvent, HuntPhase, HuntRunner, HuntSnapshot, PlayerAction, RunnerError};
pub use visibility::Affordances;

use chrono::{DateTime, NaiveTime, Utc};
use thiserror::Error;

/// Trait for abstracting hunt retrieval
/// Platform-specific implementations should provide this
pub trait HuntRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a validated hunt by id
    ///
    /// # Errors
    ///
    /// Returns an error if the hunt cannot be fetched or fails validation.
    fn load_hunt(&self, hunt_id: &str) -> Result<Hunt, Self::Error>;

    /// Make a hunt and its assets available without a network connection
    ///
    /// # Errors
    ///
    /// Returns an error if the hunt cannot be downloaded.
    fn download_for_offline(&self, hunt_id: &str) -> Result<(), Self::Error>;
}

/// Reasons a hunt may not be started right now.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HuntStartError {
    #[error("hunt {hunt_id} can only be started between {start:02}:00 and {end:02}:00")]
    OutsideDaylight {
        hunt_id: String,
        start: u32,
        end: u32,
    },
}

/// Main engine for loading hunts and creating runners
pub struct HuntEngine<R, S>
where
    R: HuntRepository,
    S: PersistenceStore + Clone,
{
    repository: R,
    store: S,
    config: EngineConfig,
}

impl<R, S> HuntEngine<R, S>
where
    R: HuntRepository,
    S: PersistenceStore + Clone,
{
    /// Create a new engine with the provided repository, progress store and configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(repository: R, store: S, config: EngineConfig) -> Result<Self, EngineConfigError> {
        config.validate()?;
        Ok(Self {
            repository,
            store,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Progress tracker over the engine's store.
    #[must_use]
    pub fn progress(&self) -> ProgressTracker<S> {
        ProgressTracker::new(self.store.clone())
    }

    /// Load a hunt
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot provide the hunt.
    pub fn load_hunt(&self, hunt_id: &str) -> Result<Hunt, R::Error> {
        self.repository.load_hunt(hunt_id)
    }

    /// Download a hunt for offline play
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails to download the hunt.
    pub fn prepare_offline(&self, hunt_id: &str) -> Result<(), R::Error> {
        log::info!("preparing hunt {hunt_id} for offline play");
        self.repository.download_for_offline(hunt_id)
    }

    /// Check a day-only hunt against the configured daylight window
    ///
    /// # Errors
    ///
    /// Returns `HuntStartError::OutsideDaylight` for a day-only hunt outside the window.
    pub fn check_daylight(&self, hunt: &Hunt, local_time: NaiveTime) -> Result<(), HuntStartError> {
        if hunt.day_only && !self.config.is_daylight(local_time) {
            return Err(HuntStartError::OutsideDaylight {
                hunt_id: hunt.id.clone(),
                start: self.config.daylight_start_hour,
                end: self.config.daylight_end_hour,
            });
        }
        Ok(())
    }

    /// Load a hunt and start it from the first challenge
    ///
    /// # Errors
    ///
    /// Returns an error if the hunt cannot be loaded, is day-only outside daylight hours,
    /// or progress cannot be written.
    pub fn begin<F, P>(
        &self,
        hunt_id: &str,
        local_time: NaiveTime,
        now: DateTime<Utc>,
        feedback: F,
        provider: P,
    ) -> Result<(HuntRunner<S, F, P>, RunnerEvents), anyhow::Error>
    where
        F: FeedbackSink,
        P: LocationProvider,
    {
        let hunt = self.repository.load_hunt(hunt_id)?;
        self.check_daylight(&hunt, local_time)?;
        let mut runner = self.runner(hunt, feedback, provider)?;
        let events = runner.start(now)?;
        Ok((runner, events))
    }

    /// Load a hunt and re-enter it at the requested challenge, clamped to earned progress
    ///
    /// # Errors
    ///
    /// Returns an error if the hunt cannot be loaded or progress cannot be read.
    pub fn resume<F, P>(
        &self,
        hunt_id: &str,
        requested_index: usize,
        now: DateTime<Utc>,
        feedback: F,
        provider: P,
    ) -> Result<(HuntRunner<S, F, P>, RunnerEvents), anyhow::Error>
    where
        F: FeedbackSink,
        P: LocationProvider,
    {
        let hunt = self.repository.load_hunt(hunt_id)?;
        let mut runner = self.runner(hunt, feedback, provider)?;
        let events = runner.resume(requested_index, now)?;
        Ok((runner, events))
    }

    fn runner<F, P>(
        &self,
        hunt: Hunt,
        feedback: F,
        provider: P,
    ) -> Result<HuntRunner<S, F, P>, EngineConfigError>
    where
        F: FeedbackSink,
        P: LocationProvider,
    {
        HuntRunner::new(
            hunt,
            self.config.clone(),
            self.store.clone(),
            feedback,
            provider,
        )
    }
}
