//! # Watcher
//!
//! Background task that keeps the mirror fresh without a caller:
//!
//! - every `poll_interval` it polls all attached agents,
//! - whenever an agent delivers a [`NotificationBatch`] it applies it.
//!
//! Both sources are multiplexed with `tokio::select!` in a single task, so polls and
//! notifications never run concurrently from the watcher itself; per-agent ordering against
//! REST writes is still enforced by the engine's transactions.
//!
//! ```rust,ignore
//! let (watcher, notifier) = Watcher::spawn(engine.clone());
//! notifier.send(NotificationBatch::new("agent-1", notifications)).await?;
//! watcher.shutdown().await;
//! ```

use crate::engine::{NotificationBatch, SyncEngine};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

/// Sender side used by agent connections to deliver notifications.
pub type Notifier = mpsc::Sender<NotificationBatch>;

pub struct Watcher {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Watcher {
    /// Starts the watcher task and returns it with the notification sender.
    pub fn spawn(engine: Arc<SyncEngine>) -> (Self, Notifier) {
        let (sender, receiver) = mpsc::channel(engine.config().eventing.notification_buffer);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(engine, receiver, shutdown_rx));
        (Self { shutdown, handle }, sender)
    }

    /// Signals the task to stop and waits for it.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!(error = %e, "Watcher task panicked");
        }
    }
}

async fn run(
    engine: Arc<SyncEngine>,
    mut notifications: mpsc::Receiver<NotificationBatch>,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = engine.config().poll_interval();
    info!(poll_interval = ?interval, "Watcher started");

    let mut ticker = interval.map(|period| {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            batch = notifications.recv() => match batch {
                Some(batch) => {
                    debug!(agent = %batch.agent_id, count = batch.notifications.len(), "Notification batch");
                    if let Err(e) = engine.process_notification(batch).await {
                        error!(error = %e, "Notification batch rejected");
                    }
                }
                None => break,
            },
            _ = tick(&mut ticker) => {
                debug!("Poll tick");
                engine.poll_all().await;
            }
        }
    }

    info!("Watcher stopped");
}

/// Waits for the next tick, or forever when polling is disabled.
async fn tick(ticker: &mut Option<time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
