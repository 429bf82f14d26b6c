//! Serialized event pump for async hosts.
//!
//! Positions and player actions arrive on one channel and are applied to the runner in
//! arrival order. The location provider is polled on the configured sampling interval
//! between messages. The pump owns no timers beyond its own interval, so dropping or
//! cancelling it leaves nothing running.
use chrono::Utc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::event::{FeedbackSink, RunnerEvents};
use crate::location::LocationProvider;
use crate::progress::PersistenceStore;
use crate::runner::{HuntEvent, HuntRunner};

/// Why the pump returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// Every sender was dropped.
    Closed,
    Cancelled,
    /// The hunt finished.
    Completed,
}

/// Counters for one pump run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    pub exit: PumpExit,
    pub dispatched: usize,
    pub rejected: usize,
}

/// Run `runner` until the channel closes, `cancel` fires or the hunt completes.
///
/// Only a value sent on `cancel` stops the pump; dropping its sender leaves the pump
/// running until the channel closes. Every batch of runner events is handed to `on_events`. Rejected actions are logged
/// and counted; they never stop the pump. The location provider is released on exit.
pub async fn drive<S, F, P>(
    runner: &mut HuntRunner<S, F, P>,
    mut events: mpsc::Receiver<HuntEvent>,
    mut cancel: oneshot::Receiver<()>,
    mut on_events: impl FnMut(&RunnerEvents),
) -> PumpReport
where
    S: PersistenceStore,
    F: FeedbackSink,
    P: LocationProvider,
{
    let period = runner
        .config()
        .sample_interval()
        .to_std()
        .unwrap_or(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut dispatched = 0_usize;
    let mut rejected = 0_usize;
    let mut cancel_open = true;
    let exit = loop {
        if runner.is_completed() {
            break PumpExit::Completed;
        }
        tokio::select! {
            biased;
            signal = &mut cancel, if cancel_open => {
                if signal.is_ok() {
                    break PumpExit::Cancelled;
                }
                cancel_open = false;
            }
            message = events.recv() => {
                let Some(event) = message else {
                    break PumpExit::Closed;
                };
                match runner.dispatch(event, Utc::now()) {
                    Ok(batch) => {
                        dispatched += 1;
                        if !batch.is_empty() {
                            on_events(&batch);
                        }
                    }
                    Err(err) => {
                        rejected += 1;
                        log::warn!("rejected hunt event: {err}");
                    }
                }
            }
            _ = ticker.tick() => {
                let batch = runner.poll_location(Utc::now());
                if !batch.is_empty() {
                    on_events(&batch);
                }
            }
        }
    };

    runner.stop_location();
    log::debug!("event pump exited ({exit:?}) after {dispatched} event(s)");
    PumpReport {
        exit,
        dispatched,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::data::Hunt;
    use crate::event::{RecordingFeedback, RunnerEvent};
    use crate::location::ScriptedLocation;
    use crate::progress::MemoryStore;
    use crate::runner::PlayerAction;

    fn story_hunt() -> Hunt {
        Hunt::from_json(
            r#"{
                "id": "pump",
                "title": "Pump",
                "challenges": [
                    { "id": "a", "type": "story", "title": "Intro" },
                    { "id": "b", "type": "story", "title": "Outro" }
                ]
            }"#,
        )
        .unwrap()
    }

    fn runner() -> HuntRunner<MemoryStore, RecordingFeedback, ScriptedLocation> {
        HuntRunner::new(
            story_hunt(),
            EngineConfig::default(),
            MemoryStore::new(),
            RecordingFeedback::default(),
            ScriptedLocation::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn pump_applies_events_in_order_until_completion() {
        let mut runner = runner();
        runner.start(Utc::now()).unwrap();
        let (tx, rx) = mpsc::channel(8);
        let (_cancel_tx, cancel_rx) = oneshot::channel();
        tx.send(PlayerAction::Continue.into()).await.unwrap();
        tx.send(PlayerAction::Continue.into()).await.unwrap();
        tx.send(PlayerAction::Continue.into()).await.unwrap();

        let mut seen = Vec::new();
        let report = drive(&mut runner, rx, cancel_rx, |batch| {
            seen.extend(batch.iter().cloned());
        })
        .await;

        assert_eq!(report.exit, PumpExit::Completed);
        assert_eq!(report.dispatched, 2);
        assert!(seen.contains(&RunnerEvent::Completed {
            hunt_id: "pump".into()
        }));
        assert!(runner.location().provider().is_stopped());
    }

    #[tokio::test]
    async fn pump_counts_rejections_and_stops_when_closed() {
        let mut runner = runner();
        let (tx, rx) = mpsc::channel(4);
        let (_cancel_tx, cancel_rx) = oneshot::channel();
        tx.send(PlayerAction::Continue.into()).await.unwrap();
        drop(tx);

        let report = drive(&mut runner, rx, cancel_rx, |_| {}).await;
        assert_eq!(report.exit, PumpExit::Closed);
        assert_eq!(report.rejected, 1);
    }

    #[tokio::test]
    async fn dropped_cancel_sender_does_not_stop_the_pump() {
        let mut runner = runner();
        runner.start(Utc::now()).unwrap();
        let (tx, rx) = mpsc::channel(4);
        let (_, cancel_rx) = oneshot::channel();
        tx.send(PlayerAction::RevealText.into()).await.unwrap();
        tx.send(PlayerAction::Continue.into()).await.unwrap();
        drop(tx);

        let report = drive(&mut runner, rx, cancel_rx, |_| {}).await;
        assert_eq!(report.exit, PumpExit::Closed);
        assert_eq!(report.dispatched, 2);
        assert_eq!(runner.current_index(), Some(1));
    }

    #[tokio::test]
    async fn pump_stops_on_cancel() {
        let mut runner = runner();
        runner.start(Utc::now()).unwrap();
        let (_tx, rx) = mpsc::channel::<HuntEvent>(4);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        cancel_tx.send(()).unwrap();

        let report = drive(&mut runner, rx, cancel_rx, |_| {}).await;
        assert_eq!(report.exit, PumpExit::Cancelled);
        assert_eq!(report.dispatched, 0);
    }
}
