//! # Alert scheduler
//!
//! Start/stop lifecycle around the deadline alert processor. The scheduler
//! owns an explicit single-flight flag: when a tick fires while the previous
//! one is still running, the new tick is skipped entirely (never queued)
//! and a warning is recorded.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::alerts::processor::{AlertScanOutcome, DeadlineAlertProcessor};
use crate::config::AlertConfig;
use crate::error::{DocRouteError, Result};

/// One schedulable scan. The scheduler only needs the tick entry point, so
/// anything implementing this can be driven on an interval.
#[async_trait]
pub trait AlertTick: Send + Sync {
    async fn run_tick(&self) -> Result<AlertScanOutcome>;
}

#[async_trait]
impl AlertTick for DeadlineAlertProcessor {
    async fn run_tick(&self) -> Result<AlertScanOutcome> {
        self.process().await
    }
}

/// Periodic driver for the deadline alert processor
pub struct AlertScheduler {
    scheduler_id: Uuid,
    tick: Arc<dyn AlertTick>,
    config: AlertConfig,
    running: Arc<AtomicBool>,
    tick_in_flight: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AlertScheduler {
    pub fn new<T: AlertTick + 'static>(tick: T, config: AlertConfig) -> Self {
        Self::with_shared(Arc::new(tick), config)
    }

    pub fn with_shared(tick: Arc<dyn AlertTick>, config: AlertConfig) -> Self {
        Self {
            scheduler_id: Uuid::new_v4(),
            tick,
            config,
            running: Arc::new(AtomicBool::new(false)),
            tick_in_flight: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    /// Start the periodic loop. Fails if the scheduler is disabled by
    /// configuration or already running.
    pub fn start(&self) -> Result<()> {
        if !self.config.enabled {
            return Err(DocRouteError::Configuration(
                "Alert scheduler is disabled".to_string(),
            ));
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DocRouteError::Conflict(
                "Alert scheduler is already running".to_string(),
            ));
        }

        let scheduler_id = self.scheduler_id;
        let tick = Arc::clone(&self.tick);
        let running = Arc::clone(&self.running);
        let tick_in_flight = Arc::clone(&self.tick_in_flight);
        let shutdown = Arc::clone(&self.shutdown_notify);
        let interval_duration = Duration::from_secs(self.config.interval_minutes * 60);
        let run_on_startup = self.config.run_on_startup;

        let task = tokio::spawn(async move {
            info!(
                scheduler_id = %scheduler_id,
                interval_minutes = interval_duration.as_secs() / 60,
                run_on_startup = run_on_startup,
                "Alert scheduler started"
            );

            if run_on_startup {
                Self::fire_tick(&tick, &tick_in_flight);
            }

            let mut interval = tokio::time::interval(interval_duration);
            // The immediate first tick of tokio intervals is not wanted here
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = interval.tick() => {
                        if !running.load(Ordering::Acquire) {
                            break;
                        }
                        Self::fire_tick(&tick, &tick_in_flight);
                    }
                }
            }

            info!(scheduler_id = %scheduler_id, "Alert scheduler stopped");
        });

        if let Ok(mut guard) = self.handle.lock() {
            *guard = Some(task);
        }

        Ok(())
    }

    /// Launch one tick unless the previous one is still in flight
    fn fire_tick(tick: &Arc<dyn AlertTick>, tick_in_flight: &Arc<AtomicBool>) {
        if tick_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Previous alert tick still running; skipping this tick");
            return;
        }

        let tick = Arc::clone(tick);
        let in_flight = Arc::clone(tick_in_flight);
        tokio::spawn(async move {
            if let Err(e) = tick.run_tick().await {
                error!(error = %e, "Deadline alert tick failed");
            }
            in_flight.store(false, Ordering::Release);
        });
    }

    /// Stop the loop. Idempotent; a tick already in flight finishes on its own.
    pub fn stop(&self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.shutdown_notify.notify_waiters();
        }
    }

    /// Whether the periodic loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for AlertScheduler {
    fn drop(&mut self) {
        self.stop();
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}
