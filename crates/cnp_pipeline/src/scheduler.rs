use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::orchestrator::{CycleReport, Orchestrator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Started(CycleReport),
    /// A cycle was already running; this trigger did nothing.
    Skipped,
}

/// Recurring trigger that runs at most one cycle at a time. A tick that fires
/// while a cycle is still running is skipped, never queued.
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    running: Mutex<()>,
    last_report: RwLock<Option<CycleReport>>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, cancel: CancellationToken) -> Self {
        Self {
            orchestrator,
            running: Mutex::new(()),
            last_report: RwLock::new(None),
            cancel,
        }
    }

    pub async fn trigger(&self) -> Trigger {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("⏭️ Previous cycle still running, skipping this trigger");
            return Trigger::Skipped;
        };
        if self.cancel.is_cancelled() {
            info!("⏭️ Shutdown requested, skipping this trigger");
            return Trigger::Skipped;
        }
        info!("🚀 Starting pipeline cycle");
        let report = self.orchestrator.run_cycle(&self.cancel).await;
        *self.last_report.write().await = Some(report.clone());
        Trigger::Started(report)
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().await.clone()
    }

    /// Fire a trigger every `interval`, starting immediately, until cancelled.
    /// Each trigger runs on its own task so an overrunning cycle shows up as
    /// skipped ticks. On shutdown, waits for the running cycle to wind down.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("⏰ Scheduler started, one cycle every {:?}", interval);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let scheduler = self.clone();
                    tokio::spawn(async move {
                        scheduler.trigger().await;
                    });
                }
            }
        }

        let _guard = self.running.lock().await;
        info!("⏰ Scheduler stopped");
    }
}
