//! Timer-driven playback of a run.
//!
//! Two independent loops drive a live run: a [`Player`] issues one step per
//! tick and a [`LatestPoller`] refreshes `t_latest` on its own interval so a
//! [`Scrubber`] bound stays fresh while paused. A [`ReplayCursor`] walks
//! already-computed frames without stepping.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use awsrt_core::api::{LatestResponse, StepResponse};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// The two calls playback needs from the server.
#[async_trait]
pub trait RunApi: Send + Sync {
    async fn step(&self, run_id: &str) -> Result<StepResponse, ClientError>;
    async fn latest(&self, run_id: &str) -> Result<LatestResponse, ClientError>;
}

/// How a playback session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// A step response reported `done`.
    Done { t: u32 },
    /// The stop signal fired. `t` is the last step seen, if any.
    Stopped { t: Option<u32> },
    /// A step request failed; playback does not retry.
    Failed { error: String },
}

/// Steps a run once per tick until it is done, stopped, or a step fails.
pub struct Player<A: ?Sized> {
    api: Arc<A>,
    run_id: String,
    interval: Duration,
}

impl<A: RunApi + ?Sized> Player<A> {
    pub fn new(api: Arc<A>, run_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            api,
            run_id: run_id.into(),
            interval,
        }
    }

    /// Drive playback, calling `on_step` after every successful step.
    ///
    /// The first step is issued one interval after the call. Each step is awaited before the next tick is taken, so at most one step
    /// request is in flight. A slow step delays the schedule instead of
    /// bunching ticks. Setting `stop` to `true` ends playback at the next tick;
    /// dropping its sender does not.
    pub async fn run<F>(&self, mut stop: watch::Receiver<bool>, mut on_step: F) -> PlayOutcome
    where
        F: FnMut(&StepResponse),
    {
        let mut ticker = delayed_ticker(self.interval);
        let mut watching = true;
        let mut last_t = None;

        loop {
            if *stop.borrow() {
                return PlayOutcome::Stopped { t: last_t };
            }
            tokio::select! {
                changed = stop.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            match self.api.step(&self.run_id).await {
                Ok(step) => {
                    last_t = Some(step.t);
                    on_step(&step);
                    if step.done {
                        info!(run_id = %self.run_id, t = step.t, "Playback reached the horizon");
                        return PlayOutcome::Done { t: step.t };
                    }
                }
                Err(e) => {
                    warn!(run_id = %self.run_id, error = %e, "Step failed, stopping playback");
                    return PlayOutcome::Failed {
                        error: e.to_string(),
                    };
                }
            }
        }
    }
}

/// Ticks every `period`, starting one period from now.
fn delayed_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Background task that polls `latest` and publishes `t_latest`.
///
/// Failed polls are logged at debug level and skipped. The task is aborted
/// when the poller is dropped.
pub struct LatestPoller {
    rx: watch::Receiver<Option<u32>>,
    handle: JoinHandle<()>,
}

impl LatestPoller {
    pub fn spawn<A>(api: Arc<A>, run_id: impl Into<String>, every: Duration) -> Self
    where
        A: RunApi + ?Sized + 'static,
    {
        let run_id = run_id.into();
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = delayed_ticker(every);
            loop {
                ticker.tick().await;
                match api.latest(&run_id).await {
                    Ok(latest) => {
                        tx.send_replace(Some(latest.t_latest));
                    }
                    Err(e) => debug!(run_id = %run_id, error = %e, "Latest poll failed"),
                }
            }
        });
        Self { rx, handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<u32>> {
        self.rx.clone()
    }

    /// Last polled `t_latest`, or `None` before the first successful poll.
    pub fn current(&self) -> Option<u32> {
        *self.rx.borrow()
    }
}

impl Drop for LatestPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Bounds of a time slider over computed frames.
///
/// `max` is always the most recently observed `t_latest`; the viewed `t`
/// never exceeds it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scrubber {
    max: u32,
    t: u32,
}

impl Scrubber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn t(&self) -> u32 {
        self.t
    }

    /// Record a polled `t_latest`.
    pub fn set_max(&mut self, t_latest: u32) {
        self.max = t_latest;
        self.t = self.t.min(self.max);
    }

    /// Move the viewed step, clamped to `[0, max]`.
    pub fn seek(&mut self, t: i64) -> u32 {
        self.t = t.clamp(0, i64::from(self.max)) as u32;
        self.t
    }

    /// A step response is also a `t_latest` observation; the view snaps to it.
    pub fn observe_step(&mut self, step: &StepResponse) {
        self.max = step.t;
        self.t = step.t;
    }
}

/// Walks stored frames `0..T` for replay without stepping the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayCursor {
    t: u32,
    frames: u32,
}

impl ReplayCursor {
    /// Start at the latest stored frame, `max(0, T - 1)`.
    pub fn at_latest(frames: u32) -> Self {
        Self {
            t: frames.saturating_sub(1),
            frames,
        }
    }

    pub fn from_start(frames: u32) -> Self {
        Self { t: 0, frames }
    }

    pub fn t(&self) -> u32 {
        self.t
    }

    /// Advance one frame. Returns `None` once `T - 1` is reached, leaving the
    /// cursor there.
    pub fn advance(&mut self) -> Option<u32> {
        let next = self.t + 1;
        if next >= self.frames {
            return None;
        }
        self.t = next;
        Some(next)
    }
}
