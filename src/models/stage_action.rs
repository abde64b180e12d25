use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use crate::error::Result;
use crate::state_machine::{StageActionKind, StageState};

/// Immutable audit record of one actor's decision on a stage.
/// Maps to `docroute_stage_actions` table. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StageAction {
    pub stage_action_id: i64,
    pub stage_id: i64,
    pub action: String,
    pub resulting_state: String,
    pub acted_by: i64,
    /// Set only when the action was executed via delegation
    pub on_behalf_of: Option<i64>,
    pub comment: Option<String>,
    pub reason_code: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New StageAction for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStageAction {
    pub stage_id: i64,
    pub action: StageActionKind,
    pub resulting_state: StageState,
    pub acted_by: i64,
    pub on_behalf_of: Option<i64>,
    pub comment: Option<String>,
    pub reason_code: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

const ACTION_COLUMNS: &str = "stage_action_id, stage_id, action, resulting_state, acted_by, \
     on_behalf_of, comment, reason_code, ip_address, user_agent, created_at";

impl StageAction {
    /// Record an action (insert-only)
    pub async fn create(
        executor: impl PgExecutor<'_>,
        new_action: NewStageAction,
    ) -> Result<StageAction> {
        let action = sqlx::query_as::<_, StageAction>(&format!(
            r#"
            INSERT INTO docroute_stage_actions
                (stage_id, action, resulting_state, acted_by, on_behalf_of,
                 comment, reason_code, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ACTION_COLUMNS}
            "#,
        ))
        .bind(new_action.stage_id)
        .bind(new_action.action.to_string())
        .bind(new_action.resulting_state.to_string())
        .bind(new_action.acted_by)
        .bind(new_action.on_behalf_of)
        .bind(new_action.comment)
        .bind(new_action.reason_code)
        .bind(new_action.ip_address)
        .bind(new_action.user_agent)
        .fetch_one(executor)
        .await?;

        Ok(action)
    }

    /// All actions recorded for a route's stages, oldest first
    pub async fn find_by_route(
        executor: impl PgExecutor<'_>,
        route_id: i64,
    ) -> Result<Vec<StageAction>> {
        let actions = sqlx::query_as::<_, StageAction>(&format!(
            r#"
            SELECT {ACTION_COLUMNS}
            FROM docroute_stage_actions
            WHERE stage_id IN (SELECT stage_id FROM docroute_stages WHERE route_id = $1)
            ORDER BY created_at ASC, stage_action_id ASC
            "#,
        ))
        .bind(route_id)
        .fetch_all(executor)
        .await?;

        Ok(actions)
    }
}
