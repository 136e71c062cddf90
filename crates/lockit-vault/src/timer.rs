//! Inactivity auto-lock: one timer task, one deadline
//!
//! A single spawned task owns the deadline. Activity pings push it out;
//! silence first emits a warning a fixed lead before expiry, then fires
//! [`VaultSession::lock`] exactly once when the deadline passes. Because
//! there is only ever the one task and the one deadline, duplicate or
//! orphaned timers cannot occur.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::session::VaultSession;
use crate::store::EnvelopeStore;

/// Timing parameters for the auto-lock.
#[derive(Debug, Clone, Copy)]
pub struct AutoLockConfig {
    /// Inactivity span after which the vault locks.
    pub timeout: Duration,
    /// How long before the lock the warning fires.
    pub warning_lead: Duration,
}

impl Default for AutoLockConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5 * 60),
            warning_lead: Duration::from_secs(30),
        }
    }
}

/// What the timer last did, observable by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoLockEvent {
    /// Activity observed; the deadline moved out.
    Active,
    /// The warning window opened; lock is imminent unless activity arrives.
    Warning,
    /// The deadline passed and the vault was locked.
    Locked,
}

/// Handle to a running auto-lock task. Aborts the task on drop.
pub struct AutoLockHandle {
    activity_tx: mpsc::UnboundedSender<()>,
    events_rx: watch::Receiver<AutoLockEvent>,
    task: JoinHandle<()>,
}

impl AutoLockHandle {
    /// Report user activity; resets the inactivity deadline.
    pub fn activity(&self) {
        // A closed channel means the task is gone; nothing left to reset.
        let _ = self.activity_tx.send(());
    }

    /// Subscribe to timer events.
    pub fn events(&self) -> watch::Receiver<AutoLockEvent> {
        self.events_rx.clone()
    }
}

impl Drop for AutoLockHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the auto-lock task for a session.
///
/// `warning_lead` is clamped below `timeout`; a lead at or past the timeout
/// would mean warning before any inactivity has accrued.
pub fn spawn_auto_lock<S>(session: Arc<VaultSession<S>>, config: AutoLockConfig) -> AutoLockHandle
where
    S: EnvelopeStore + 'static,
{
    let lead = config.warning_lead.min(config.timeout);
    let (activity_tx, mut activity_rx) = mpsc::unbounded_channel::<()>();
    let (events_tx, events_rx) = watch::channel(AutoLockEvent::Active);

    let task = tokio::spawn(async move {
        let mut deadline = Instant::now() + config.timeout;
        let mut warned = false;

        loop {
            let next_fire = if warned {
                deadline
            } else {
                deadline - lead
            };

            tokio::select! {
                ping = activity_rx.recv() => {
                    match ping {
                        Some(()) => {
                            deadline = Instant::now() + config.timeout;
                            warned = false;
                            let _ = events_tx.send(AutoLockEvent::Active);
                        }
                        // All handles dropped; stop the task.
                        None => break,
                    }
                }
                () = tokio::time::sleep_until(next_fire) => {
                    if warned {
                        session.lock().await;
                        tracing::info!("inactivity timeout, vault locked");
                        let _ = events_tx.send(AutoLockEvent::Locked);
                        // Re-arm for the (already locked, idempotent) next
                        // cycle rather than spinning on an expired deadline.
                        deadline = Instant::now() + config.timeout;
                        warned = false;
                    } else {
                        tracing::debug!("inactivity warning window opened");
                        let _ = events_tx.send(AutoLockEvent::Warning);
                        warned = true;
                    }
                }
            }
        }
    });

    AutoLockHandle {
        activity_tx,
        events_rx,
        task,
    }
}
