use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;

use crate::error::Result;

/// Deadline alert conditions. The three thresholds are independent and
/// non-exclusive, so one stage can carry several kinds at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DueSoon,
    Overdue,
    Escalation,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DueSoon => write!(f, "due_soon"),
            Self::Overdue => write!(f, "overdue"),
            Self::Escalation => write!(f, "escalation"),
        }
    }
}

impl std::str::FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "due_soon" => Ok(Self::DueSoon),
            "overdue" => Ok(Self::Overdue),
            "escalation" => Ok(Self::Escalation),
            _ => Err(format!("Invalid alert kind: {s}")),
        }
    }
}

/// One unread alert per (stage, recipient, kind) condition.
/// Maps to `docroute_alerts` table.
///
/// The dedup key is a partial unique index on (stage_id, recipient_id, kind)
/// WHERE status = 'unread', so re-running the processor never duplicates an
/// unread alert even across concurrent processor instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Alert {
    pub alert_id: i64,
    pub document_id: i64,
    pub stage_id: i64,
    pub recipient_id: i64,
    pub kind: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

const ALERT_COLUMNS: &str =
    "alert_id, document_id, stage_id, recipient_id, kind, status, created_at, read_at";

impl Alert {
    /// Insert an unread alert unless an unread alert with the same
    /// (stage, recipient, kind) key already exists. Returns whether a row
    /// was actually created.
    pub async fn create_if_absent(
        executor: impl PgExecutor<'_>,
        document_id: i64,
        stage_id: i64,
        recipient_id: i64,
        kind: AlertKind,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO docroute_alerts (document_id, stage_id, recipient_id, kind, status)
            VALUES ($1, $2, $3, $4, 'unread')
            ON CONFLICT (stage_id, recipient_id, kind) WHERE status = 'unread'
            DO NOTHING
            "#,
        )
        .bind(document_id)
        .bind(stage_id)
        .bind(recipient_id)
        .bind(kind.to_string())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unread alerts for a recipient, newest first
    pub async fn find_unread_for_recipient(
        executor: impl PgExecutor<'_>,
        recipient_id: i64,
    ) -> Result<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            FROM docroute_alerts
            WHERE recipient_id = $1 AND status = 'unread'
            ORDER BY created_at DESC, alert_id DESC
            "#,
        ))
        .bind(recipient_id)
        .fetch_all(executor)
        .await?;

        Ok(alerts)
    }

    /// Mark an alert read, releasing its dedup slot
    pub async fn mark_read(executor: impl PgExecutor<'_>, alert_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE docroute_alerts
            SET status = 'read',
                read_at = NOW()
            WHERE alert_id = $1 AND status = 'unread'
            "#,
        )
        .bind(alert_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_kind_round_trip() {
        assert_eq!("due_soon".parse::<AlertKind>().unwrap(), AlertKind::DueSoon);
        assert_eq!("overdue".parse::<AlertKind>().unwrap(), AlertKind::Overdue);
        assert_eq!(AlertKind::Escalation.to_string(), "escalation");
        assert!("reminder".parse::<AlertKind>().is_err());
    }
}
