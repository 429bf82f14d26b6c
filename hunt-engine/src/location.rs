//! Position samples, the location provider seam and the rate-limited sampler.
//!
//! A [`LocationWatch`] owns a provider and decides when to ask it for a sample: no more
//! than once per sampling interval, never twice for the same fix, and with bounded
//! retries after a failed acquisition. Dropping the watch releases the provider.
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::geo::LatLng;

/// One fix from the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    #[must_use]
    pub const fn new(coords: LatLng, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude: coords.latitude,
            longitude: coords.longitude,
            accuracy_meters: None,
            timestamp,
        }
    }

    #[must_use]
    pub const fn coords(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
    #[error("location request timed out")]
    Timeout,
}

impl LocationError {
    /// Permission problems will not fix themselves with a retry.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

/// Source of position fixes.
/// Platform-specific implementations should provide this
pub trait LocationProvider {
    /// Latest fix, an acquisition error, or `None` when nothing new is available.
    fn sample(&mut self) -> Option<Result<Position, LocationError>>;

    /// Ask the device for a fresh fix on the next sample.
    fn refresh(&mut self);

    /// Release any underlying watch handle.
    fn stop(&mut self);

    /// Re-acquire the watch handle after [`LocationProvider::stop`].
    fn start(&mut self);
}

/// Provider for platforms without positioning. Never yields a fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn sample(&mut self) -> Option<Result<Position, LocationError>> {
        None
    }

    fn refresh(&mut self) {}

    fn stop(&mut self) {}

    fn start(&mut self) {}
}

/// Provider replaying a fixed queue of samples; used by tests and scripted runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLocation {
    queue: VecDeque<Result<Position, LocationError>>,
    refreshes: u32,
    stopped: bool,
}

impl ScriptedLocation {
    #[must_use]
    pub fn new(samples: impl IntoIterator<Item = Result<Position, LocationError>>) -> Self {
        Self {
            queue: samples.into_iter().collect(),
            refreshes: 0,
            stopped: false,
        }
    }

    pub fn push(&mut self, sample: Result<Position, LocationError>) {
        self.queue.push_back(sample);
    }

    #[must_use]
    pub const fn refreshes(&self) -> u32 {
        self.refreshes
    }

    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl LocationProvider for ScriptedLocation {
    fn sample(&mut self) -> Option<Result<Position, LocationError>> {
        if self.stopped {
            return None;
        }
        self.queue.pop_front()
    }

    fn refresh(&mut self) {
        self.refreshes = self.refreshes.saturating_add(1);
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn start(&mut self) {
        self.stopped = false;
    }
}

/// Health of the position stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationStatus {
    Idle,
    Tracking,
    Retrying {
        attempt: u32,
        next_attempt_at: DateTime<Utc>,
    },
    Failed {
        error: LocationError,
    },
    Stopped,
}

/// What the sampler made of one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleDecision {
    /// Nothing to do: too early, waiting on a retry, or no new fix.
    Idle,
    Fresh(Position),
    /// Same or older fix than the last accepted one.
    Duplicate,
    RetryScheduled {
        attempt: u32,
        at: DateTime<Utc>,
        error: LocationError,
    },
    Exhausted(LocationError),
}

/// Rate limiting, deduplication and retry bookkeeping for a position stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSampler {
    interval: TimeDelta,
    max_retries: u32,
    retry_delay: TimeDelta,
    last_poll: Option<DateTime<Utc>>,
    last_fix: Option<DateTime<Utc>>,
    failures: u32,
    status: LocationStatus,
}

impl LocationSampler {
    #[must_use]
    pub const fn new(interval: TimeDelta, max_retries: u32, retry_delay: TimeDelta) -> Self {
        Self {
            interval,
            max_retries,
            retry_delay,
            last_poll: None,
            last_fix: None,
            failures: 0,
            status: LocationStatus::Idle,
        }
    }

    #[must_use]
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(
            cfg.sample_interval(),
            cfg.location_max_retries,
            cfg.location_retry_delay(),
        )
    }

    #[must_use]
    pub const fn status(&self) -> &LocationStatus {
        &self.status
    }

    /// Whether the provider should be asked for a sample at `now`.
    #[must_use]
    pub fn should_poll(&self, now: DateTime<Utc>) -> bool {
        match &self.status {
            LocationStatus::Failed { .. } | LocationStatus::Stopped => false,
            LocationStatus::Retrying {
                next_attempt_at, ..
            } => now >= *next_attempt_at,
            LocationStatus::Idle | LocationStatus::Tracking => self
                .last_poll
                .is_none_or(|last| now.signed_duration_since(last) >= self.interval),
        }
    }

    /// Record that a poll happened at `now`.
    pub fn mark_polled(&mut self, now: DateTime<Utc>) {
        self.last_poll = Some(now);
    }

    /// Fold one provider result into the sampler.
    pub fn accept(
        &mut self,
        sample: Result<Position, LocationError>,
        now: DateTime<Utc>,
    ) -> SampleDecision {
        match sample {
            Ok(position) => {
                self.failures = 0;
                self.status = LocationStatus::Tracking;
                if self
                    .last_fix
                    .is_some_and(|last| position.timestamp <= last)
                {
                    return SampleDecision::Duplicate;
                }
                self.last_fix = Some(position.timestamp);
                SampleDecision::Fresh(position)
            }
            Err(error) => self.record_failure(error, now),
        }
    }

    fn record_failure(&mut self, error: LocationError, now: DateTime<Utc>) -> SampleDecision {
        self.failures = self.failures.saturating_add(1);
        if error.is_terminal() || self.failures > self.max_retries {
            log::error!(
                "location acquisition gave up after {} failure(s): {error}",
                self.failures
            );
            self.status = LocationStatus::Failed {
                error: error.clone(),
            };
            return SampleDecision::Exhausted(error);
        }
        let at = now + self.retry_delay;
        log::warn!(
            "location attempt {} of {} failed: {error}",
            self.failures,
            self.max_retries
        );
        self.status = LocationStatus::Retrying {
            attempt: self.failures,
            next_attempt_at: at,
        };
        SampleDecision::RetryScheduled {
            attempt: self.failures,
            at,
            error,
        }
    }

    /// Fold a sample pushed by the platform rather than polled.
    ///
    /// Fixes arriving faster than the sampling interval are dropped. Failures are always
    /// recorded unless the stream already failed or was stopped.
    pub fn offer(
        &mut self,
        sample: Result<Position, LocationError>,
        now: DateTime<Utc>,
    ) -> SampleDecision {
        if matches!(
            self.status,
            LocationStatus::Failed { .. } | LocationStatus::Stopped
        ) {
            return SampleDecision::Idle;
        }
        if sample.is_ok() {
            if self
                .last_poll
                .is_some_and(|last| now.signed_duration_since(last) < self.interval)
            {
                return SampleDecision::Idle;
            }
            self.mark_polled(now);
        }
        self.accept(sample, now)
    }

    /// Forget failures and start over, e.g. for a newly activated challenge.
    pub fn reset(&mut self) {
        self.failures = 0;
        self.last_poll = None;
        if !matches!(self.status, LocationStatus::Stopped) {
            self.status = LocationStatus::Idle;
        }
    }

    pub fn stop(&mut self) {
        self.status = LocationStatus::Stopped;
    }

    pub fn resume(&mut self) {
        if matches!(self.status, LocationStatus::Stopped) {
            self.status = LocationStatus::Idle;
            self.failures = 0;
            self.last_poll = None;
        }
    }
}

/// A provider paired with its sampler.
#[derive(Debug)]
pub struct LocationWatch<P: LocationProvider> {
    provider: P,
    sampler: LocationSampler,
}

impl<P: LocationProvider> LocationWatch<P> {
    pub const fn new(provider: P, sampler: LocationSampler) -> Self {
        Self { provider, sampler }
    }

    /// Poll the provider if the sampler allows it.
    pub fn tick(&mut self, now: DateTime<Utc>) -> SampleDecision {
        if !self.sampler.should_poll(now) {
            return SampleDecision::Idle;
        }
        if matches!(self.sampler.status(), LocationStatus::Retrying { .. }) {
            self.provider.refresh();
        }
        self.sampler.mark_polled(now);
        match self.provider.sample() {
            Some(sample) => self.sampler.accept(sample, now),
            None => SampleDecision::Idle,
        }
    }

    /// Fold a pushed sample; see [`LocationSampler::offer`].
    pub fn offer(
        &mut self,
        sample: Result<Position, LocationError>,
        now: DateTime<Utc>,
    ) -> SampleDecision {
        self.sampler.offer(sample, now)
    }

    /// Force a fresh fix and clear any failure state.
    pub fn refresh(&mut self) {
        self.sampler.reset();
        self.provider.refresh();
    }

    pub fn reset(&mut self) {
        self.sampler.reset();
    }

    #[must_use]
    pub const fn status(&self) -> &LocationStatus {
        self.sampler.status()
    }

    pub fn stop(&mut self) {
        if !matches!(self.sampler.status(), LocationStatus::Stopped) {
            self.provider.stop();
            self.sampler.stop();
        }
    }

    /// Re-acquire a stopped provider and resume sampling.
    pub fn resume(&mut self) {
        if matches!(self.sampler.status(), LocationStatus::Stopped) {
            self.provider.start();
            self.sampler.resume();
        }
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }
}

impl<P: LocationProvider> Drop for LocationWatch<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000 + millis).unwrap()
    }

    fn fix(millis: i64) -> Position {
        Position::new(LatLng::new(40.0, -74.0), at(millis))
    }

    fn sampler() -> LocationSampler {
        LocationSampler::from_config(&EngineConfig::default())
    }

    #[test]
    fn polls_at_most_once_per_interval() {
        let mut sampler = sampler();
        assert!(sampler.should_poll(at(0)));
        sampler.mark_polled(at(0));
        assert!(!sampler.should_poll(at(999)));
        assert!(sampler.should_poll(at(1_000)));
    }

    #[test]
    fn duplicate_timestamps_are_dropped() {
        let mut sampler = sampler();
        assert_eq!(sampler.accept(Ok(fix(0)), at(0)), SampleDecision::Fresh(fix(0)));
        assert_eq!(sampler.accept(Ok(fix(0)), at(1_000)), SampleDecision::Duplicate);
        assert_eq!(
            sampler.accept(Ok(fix(1_000)), at(2_000)),
            SampleDecision::Fresh(fix(1_000))
        );
    }

    #[test]
    fn failures_retry_three_times_then_fail() {
        let mut sampler = sampler();
        for attempt in 1..=3 {
            let decision = sampler.accept(Err(LocationError::Timeout), at(0));
            assert_eq!(
                decision,
                SampleDecision::RetryScheduled {
                    attempt,
                    at: at(5_000),
                    error: LocationError::Timeout
                }
            );
            assert!(!sampler.should_poll(at(4_999)));
            assert!(sampler.should_poll(at(5_000)));
        }
        assert_eq!(
            sampler.accept(Err(LocationError::Timeout), at(0)),
            SampleDecision::Exhausted(LocationError::Timeout)
        );
        assert!(!sampler.should_poll(at(60_000)));
        sampler.reset();
        assert!(sampler.should_poll(at(60_000)));
    }

    #[test]
    fn pushed_fixes_are_rate_limited() {
        let mut sampler = sampler();
        assert_eq!(sampler.offer(Ok(fix(0)), at(0)), SampleDecision::Fresh(fix(0)));
        assert_eq!(sampler.offer(Ok(fix(500)), at(500)), SampleDecision::Idle);
        assert_eq!(
            sampler.offer(Ok(fix(1_000)), at(1_000)),
            SampleDecision::Fresh(fix(1_000))
        );
        sampler.stop();
        assert_eq!(sampler.offer(Ok(fix(9_000)), at(9_000)), SampleDecision::Idle);
    }

    #[test]
    fn permission_denied_fails_immediately() {
        let mut sampler = sampler();
        assert_eq!(
            sampler.accept(Err(LocationError::PermissionDenied), at(0)),
            SampleDecision::Exhausted(LocationError::PermissionDenied)
        );
    }

    #[test]
    fn success_clears_failure_count() {
        let mut sampler = sampler();
        let _ = sampler.accept(Err(LocationError::Timeout), at(0));
        let _ = sampler.accept(Ok(fix(5_000)), at(5_000));
        assert_eq!(sampler.status(), &LocationStatus::Tracking);
        for _ in 0..3 {
            assert!(matches!(
                sampler.accept(Err(LocationError::Timeout), at(6_000)),
                SampleDecision::RetryScheduled { .. }
            ));
        }
    }

    #[test]
    fn watch_refreshes_on_retry_and_stops_provider() {
        let provider = ScriptedLocation::new([
            Err(LocationError::Unavailable("no fix".into())),
            Ok(fix(5_000)),
        ]);
        let mut watch = LocationWatch::new(provider, sampler());
        assert!(matches!(watch.tick(at(0)), SampleDecision::RetryScheduled { .. }));
        assert_eq!(watch.tick(at(1_000)), SampleDecision::Idle);
        assert_eq!(watch.tick(at(5_000)), SampleDecision::Fresh(fix(5_000)));
        assert_eq!(watch.provider().refreshes(), 1);
        watch.stop();
        assert!(watch.provider().is_stopped());
        assert_eq!(watch.tick(at(10_000)), SampleDecision::Idle);
        watch.resume();
        assert_eq!(watch.status(), &LocationStatus::Idle);
    }

    #[test]
    fn resumed_watch_reacquires_a_stopped_provider() {
        let mut watch = LocationWatch::new(ScriptedLocation::default(), sampler());
        watch.stop();
        watch.provider_mut().push(Ok(fix(2_000)));
        assert_eq!(watch.tick(at(2_000)), SampleDecision::Idle);

        watch.resume();
        assert!(!watch.provider().is_stopped());
        assert_eq!(watch.tick(at(3_000)), SampleDecision::Fresh(fix(2_000)));

        watch.resume();
        assert_eq!(watch.status(), &LocationStatus::Tracking);
    }
}
