//! Deadline classification scenarios against configured thresholds,
//! including the configuration-to-threshold conversion path.

use chrono::{Duration, TimeZone, Utc};

use docroute_core::alerts::{classify_due_date, AlertThresholds};
use docroute_core::config::AlertConfig;
use docroute_core::models::AlertKind;

fn default_thresholds() -> AlertThresholds {
    AlertConfig::default().thresholds()
}

#[test]
fn test_default_config_produces_24_hour_thresholds() {
    let thresholds = default_thresholds();
    assert_eq!(thresholds.reminder_window, Duration::hours(24));
    assert_eq!(thresholds.escalation_threshold, Duration::hours(24));
}

#[test]
fn test_stage_48_hours_past_due_escalates() {
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let due_at = now - Duration::hours(48);

    let kinds = classify_due_date(due_at, now, default_thresholds());
    assert_eq!(kinds, vec![AlertKind::Overdue, AlertKind::Escalation]);
}

#[test]
fn test_stage_due_tomorrow_morning_is_due_soon() {
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap();
    let due_at = Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap();

    let kinds = classify_due_date(due_at, now, default_thresholds());
    assert_eq!(kinds, vec![AlertKind::DueSoon]);
}

#[test]
fn test_stage_due_next_week_is_quiet() {
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let due_at = now + Duration::days(7);

    let kinds = classify_due_date(due_at, now, default_thresholds());
    assert!(kinds.is_empty());
}

#[test]
fn test_reminder_window_boundary_is_inclusive() {
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

    let at_window_edge = now + Duration::hours(24);
    assert_eq!(
        classify_due_date(at_window_edge, now, default_thresholds()),
        vec![AlertKind::DueSoon]
    );

    let just_beyond = now + Duration::hours(24) + Duration::seconds(1);
    assert!(classify_due_date(just_beyond, now, default_thresholds()).is_empty());
}

#[test]
fn test_overdue_without_escalation_inside_grace_period() {
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let due_at = now - Duration::hours(12);

    let kinds = classify_due_date(due_at, now, default_thresholds());
    assert_eq!(kinds, vec![AlertKind::Overdue]);
}

#[test]
fn test_custom_escalation_threshold_shifts_the_boundary() {
    let config = AlertConfig {
        escalation_threshold_hours: 72,
        ..AlertConfig::default()
    };
    let thresholds = config.thresholds();
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

    // 48 hours past due: overdue but not yet escalated under a 72-hour threshold
    assert_eq!(
        classify_due_date(now - Duration::hours(48), now, thresholds),
        vec![AlertKind::Overdue]
    );
    assert_eq!(
        classify_due_date(now - Duration::hours(72), now, thresholds),
        vec![AlertKind::Overdue, AlertKind::Escalation]
    );
}

#[test]
fn test_classification_is_stable_across_repeated_scans() {
    // Two scans at the same instant classify identically; dedup of the
    // resulting alerts is the database's job, not the classifier's.
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let due_at = now - Duration::hours(30);
    let thresholds = default_thresholds();

    let first = classify_due_date(due_at, now, thresholds);
    let second = classify_due_date(due_at, now, thresholds);
    assert_eq!(first, second);
    assert_eq!(first, vec![AlertKind::Overdue, AlertKind::Escalation]);
}
