use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::notifier::Notifier;
use super::reconciler::StatusReconciler;
use super::reminder::ReminderTicker;
use super::source::SnapshotSource;

/// Cadence of the two background jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub reconcile_every: Duration,
    pub remind_every: Duration,
}

/// Handle to the background status-check and reminder jobs.
///
/// Jobs run on their own tokio tasks, independent of request handling. On shutdown each job
/// finishes the cycle it is in, then stops.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start<S, N>(
        reconciler: Arc<StatusReconciler<S, N>>,
        reminders: Arc<ReminderTicker<N>>,
        schedule: Schedule,
    ) -> Self
    where
        S: SnapshotSource + ?Sized + 'static,
        N: Notifier + ?Sized + 'static,
    {
        let (shutdown, signal) = watch::channel(false);

        let status_job = spawn_job(
            "status_check_job",
            schedule.reconcile_every,
            signal.clone(),
            move || {
                let reconciler = reconciler.clone();
                async move {
                    reconciler.reconcile(Utc::now()).await;
                }
            },
        );

        let reminder_job = spawn_job(
            "reminder_check_job",
            schedule.remind_every,
            signal,
            move || {
                let reminders = reminders.clone();
                async move {
                    reminders.run(Utc::now()).await;
                }
            },
        );

        info!(
            reconcile_secs = schedule.reconcile_every.as_secs(),
            remind_secs = schedule.remind_every.as_secs(),
            "scheduler started"
        );

        Self {
            shutdown,
            handles: vec![status_job, reminder_job],
        }
    }

    /// Stop scheduling new cycles and wait for in-flight ones to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "scheduler job ended abnormally");
            }
        }
        info!("scheduler stopped");
    }
}

fn spawn_job<F, Fut>(
    name: &'static str,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut cycle: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(job = name, "job stopped");
    })
}
