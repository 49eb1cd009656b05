use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

pub type PollCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct Campaign {
    handle: JoinHandle<()>,
    interval_tx: watch::Sender<Duration>,
    active_interval: Duration,
    background_interval: Duration,
}

/// Drives periodic invocation of an async callback on a single repeating
/// timer. Ticks are serialized: if the previous invocation has not settled
/// when the timer fires, that tick is skipped. The interval can be
/// retargeted while running (page hidden vs visible) by restarting the
/// timer at the new period.
#[derive(Default)]
pub struct PollScheduler {
    campaign: Mutex<Option<Campaign>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn campaign(&self) -> MutexGuard<'_, Option<Campaign>> {
        self.campaign.lock().expect("poll scheduler mutex poisoned")
    }

    /// Begins ticking at `active_interval`. A running campaign is stopped
    /// first, so restarting is not an error.
    pub fn start(
        &self,
        callback: PollCallback,
        active_interval: Duration,
        background_interval: Duration,
    ) {
        self.stop();

        let (interval_tx, mut interval_rx) = watch::channel(active_interval);
        let in_flight = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(async move {
            let mut period = *interval_rx.borrow();
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if in_flight.swap(true, Ordering::SeqCst) {
                            trace!("poll tick skipped, previous invocation still in flight");
                            continue;
                        }
                        callback().await;
                        in_flight.store(false, Ordering::SeqCst);
                    }
                    changed = interval_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        period = *interval_rx.borrow();
                        timer = interval_at(Instant::now() + period, period);
                        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    }
                }
            }
        });

        *self.campaign() = Some(Campaign {
            handle,
            interval_tx,
            active_interval,
            background_interval,
        });
    }

    /// Cancels the pending timer. No tick fires after this returns; a
    /// callback already in flight may still settle. No-op when idle.
    pub fn stop(&self) {
        if let Some(campaign) = self.campaign().take() {
            campaign.handle.abort();
        }
    }

    /// While running, switches between the active and background intervals.
    /// The timer simply restarts at the new period.
    pub fn on_visibility_change(&self, hidden: bool) {
        if let Some(campaign) = self.campaign().as_ref() {
            let period = if hidden {
                campaign.background_interval
            } else {
                campaign.active_interval
            };
            let _ = campaign.interval_tx.send(period);
        }
    }

    pub fn is_running(&self) -> bool {
        self.campaign()
            .as_ref()
            .map(|campaign| !campaign.handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
