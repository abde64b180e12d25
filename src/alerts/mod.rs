//! # Deadline Alert Processor
//!
//! Periodic scan of open stages against due-date thresholds, emitting
//! deduplicated notifications. Classification is pure, the processor is
//! read-only over routing state, and the scheduler enforces single-flight
//! ticks.

pub mod classify;
pub mod processor;
pub mod scheduler;

pub use classify::{classify_due_date, AlertThresholds};
pub use processor::{AlertScanOutcome, AlertSink, DeadlineAlertProcessor};
pub use scheduler::{AlertScheduler, AlertTick};
