use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;

use crate::error::Result;

/// Kinds of history events the engine records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    Created,
    Submitted,
    Forwarded,
    ResponsibleAssigned,
    RouteAction,
    Override,
}

impl fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Submitted => write!(f, "submitted"),
            Self::Forwarded => write!(f, "forwarded"),
            Self::ResponsibleAssigned => write!(f, "responsible_assigned"),
            Self::RouteAction => write!(f, "route_action"),
            Self::Override => write!(f, "override"),
        }
    }
}

/// Append-only document event log.
/// Maps to `docroute_document_history` table.
///
/// Besides audit, the override authority reads this log: a department manager
/// may only override a document they previously created, submitted, or
/// forwarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DocumentHistory {
    pub history_id: i64,
    pub document_id: i64,
    pub event: String,
    pub actor_id: i64,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl DocumentHistory {
    /// Append a history event
    pub async fn record(
        executor: impl PgExecutor<'_>,
        document_id: i64,
        event: HistoryEvent,
        actor_id: i64,
        details: serde_json::Value,
    ) -> Result<DocumentHistory> {
        let entry = sqlx::query_as::<_, DocumentHistory>(
            r#"
            INSERT INTO docroute_document_history (document_id, event, actor_id, details)
            VALUES ($1, $2, $3, $4)
            RETURNING history_id, document_id, event, actor_id, details, created_at
            "#,
        )
        .bind(document_id)
        .bind(event.to_string())
        .bind(actor_id)
        .bind(details)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    /// Whether an actor appears in the document's participation trail
    /// (created / submitted / forwarded events)
    pub async fn actor_participated(
        executor: impl PgExecutor<'_>,
        document_id: i64,
        actor_id: i64,
    ) -> Result<bool> {
        let (participated,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM docroute_document_history
                WHERE document_id = $1
                  AND actor_id = $2
                  AND event IN ('created', 'submitted', 'forwarded')
            )
            "#,
        )
        .bind(document_id)
        .bind(actor_id)
        .fetch_one(executor)
        .await?;

        Ok(participated)
    }
}
