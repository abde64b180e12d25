use chrono::{DateTime, Duration, Utc};

use crate::models::AlertKind;

/// Thresholds the classifier measures a due date against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    pub reminder_window: Duration,
    pub escalation_threshold: Duration,
}

/// Classify a stage's due date against the three independent thresholds.
///
/// The conditions are non-exclusive: a stage far past its due date is both
/// overdue and escalated at once. Comments and other non-terminal actions
/// never affect classification; it is keyed purely on the due date.
pub fn classify_due_date(
    due_at: DateTime<Utc>,
    now: DateTime<Utc>,
    thresholds: AlertThresholds,
) -> Vec<AlertKind> {
    let mut kinds = Vec::new();

    if now < due_at && due_at <= now + thresholds.reminder_window {
        kinds.push(AlertKind::DueSoon);
    }
    if due_at <= now {
        kinds.push(AlertKind::Overdue);
    }
    if due_at <= now - thresholds.escalation_threshold {
        kinds.push(AlertKind::Escalation);
    }

    kinds
}
