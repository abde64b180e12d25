//! # Override executor
//!
//! Privileged force-termination of an active route. Remaining open stages
//! are closed as `skipped` with synthetic audit records attributed to the
//! overriding actor, and the route and document jump straight to their
//! terminal states atomically, like every other mutating engine call.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use tracing::{info, instrument};

use crate::authorization::{authorize_override, Actor, StageAuthorizer};
use crate::error::{DocRouteError, Result};
use crate::models::{
    Document, DocumentHistory, HistoryEvent, NewStageAction, Route, Stage, StageAction,
};
use crate::routing::types::OverrideOutcome;
use crate::state_machine::{DocumentStatus, RouteState, StageActionKind, StageState};

/// Direction of a forced termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideAction {
    ForceApprove,
    ForceReject,
}

impl OverrideAction {
    fn route_state(self) -> RouteState {
        match self {
            Self::ForceApprove => RouteState::Completed,
            Self::ForceReject => RouteState::Rejected,
        }
    }

    fn document_status(self) -> DocumentStatus {
        match self {
            Self::ForceApprove => DocumentStatus::Approved,
            Self::ForceReject => DocumentStatus::Rejected,
        }
    }

    fn action_kind(self) -> StageActionKind {
        match self {
            Self::ForceApprove => StageActionKind::OverrideApproved,
            Self::ForceReject => StageActionKind::OverrideRejected,
        }
    }
}

impl fmt::Display for OverrideAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForceApprove => write!(f, "force_approve"),
            Self::ForceReject => write!(f, "force_reject"),
        }
    }
}

/// Force-terminates active routes for eligible actors
#[derive(Clone)]
pub struct OverrideExecutor {
    pool: PgPool,
    authorizer: StageAuthorizer,
}

impl OverrideExecutor {
    pub fn new(pool: PgPool) -> Self {
        let authorizer = StageAuthorizer::new(pool.clone());
        Self { pool, authorizer }
    }

    /// Force-terminate the document's active route.
    ///
    /// Delegations are not honored here: override eligibility is a property
    /// of the actor's own role and prior participation on the document.
    #[instrument(skip(self, reason))]
    pub async fn execute(
        &self,
        document_id: i64,
        action: OverrideAction,
        reason: String,
        actor_id: i64,
    ) -> Result<OverrideOutcome> {
        if reason.trim().is_empty() {
            return Err(DocRouteError::Validation(
                "Override reason must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let (actor, _) = self.authorizer.resolve_actor(actor_id, now).await?;

        let mut tx = self.pool.begin().await?;

        let document = Document::find_by_id_locked(&mut *tx, document_id)
            .await?
            .ok_or_else(|| DocRouteError::NotFound(format!("Document {document_id}")))?;

        let route_id = document.current_route_id.ok_or_else(|| {
            DocRouteError::Conflict(format!("Document {document_id} has no active route"))
        })?;
        let route = Route::find_by_id(&mut *tx, route_id)
            .await?
            .ok_or_else(|| DocRouteError::NotFound(format!("Route {route_id}")))?;
        if route.route_state()? != RouteState::Active {
            return Err(DocRouteError::Conflict(format!(
                "Route {route_id} is not active"
            )));
        }

        self.check_eligibility(&mut tx, &actor, &document).await?;

        let stages = Stage::lock_by_route(&mut *tx, route_id).await?;
        let mut skipped = Vec::new();
        for stage in &stages {
            if stage.stage_state()?.is_open() {
                skipped.push(stage.stage_id);
            }
        }

        if !skipped.is_empty() {
            Stage::skip_open(&mut *tx, &skipped).await?;
        }
        for stage_id in &skipped {
            StageAction::create(
                &mut *tx,
                NewStageAction {
                    stage_id: *stage_id,
                    action: action.action_kind(),
                    resulting_state: StageState::Skipped,
                    acted_by: actor.user_id,
                    on_behalf_of: None,
                    comment: None,
                    reason_code: Some(reason.clone()),
                    ip_address: None,
                    user_agent: None,
                },
            )
            .await?;
        }

        Route::finish(&mut *tx, route_id, action.route_state(), Some(&reason)).await?;
        Document::set_route_outcome(&mut *tx, document_id, action.document_status(), now).await?;

        DocumentHistory::record(
            &mut *tx,
            document_id,
            HistoryEvent::Override,
            actor.user_id,
            serde_json::json!({
                "route_id": route_id,
                "action": action.to_string(),
                "reason": reason,
                "skipped_stages": skipped,
            }),
        )
        .await?;

        tx.commit().await?;

        info!(
            document_id = document_id,
            route_id = route_id,
            action = %action,
            skipped_stages = skipped.len(),
            "Route force-terminated"
        );

        Ok(OverrideOutcome {
            document_status: action.document_status(),
            skipped_stages: skipped,
        })
    }

    /// Global roles pass unconditionally; department managers need prior
    /// participation (creator, or an actor in created/submitted/forwarded
    /// history).
    async fn check_eligibility(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        actor: &Actor,
        document: &Document,
    ) -> Result<()> {
        let participated = if actor.role.is_department_manager() {
            DocumentHistory::actor_participated(&mut **tx, document.document_id, actor.user_id)
                .await?
        } else {
            false
        };

        authorize_override(actor, document.created_by, participated)
    }
}
