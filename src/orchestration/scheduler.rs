//! Periodic driver for the auto-validation sweep.

use super::sweeper::{AutoValidationSweeper, SweepReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Stops a running [`Scheduler`] when dropped or signalled.
#[derive(Debug)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    sweeper: Arc<AutoValidationSweeper>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(sweeper: Arc<AutoValidationSweeper>, interval: Duration) -> Self {
        Self { sweeper, interval }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Tick until `shutdown` flips to true or its sender goes away.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "sweep scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("sweep scheduler stopped");
    }

    /// One scheduled pass. Skips the sweep when nothing has expired.
    pub async fn tick(&self) -> Option<SweepReport> {
        match self.sweeper.expired_count().await {
            Ok(0) => {
                debug!("no expired pending matches");
                None
            }
            Ok(expired) => match self.sweeper.run_now().await {
                Ok(report) => {
                    debug!(expired, confirmed = report.confirmed(), "scheduled sweep done");
                    Some(report)
                }
                Err(e) => {
                    warn!(error = %e, "scheduled sweep failed");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "could not count expired matches");
                None
            }
        }
    }
}
