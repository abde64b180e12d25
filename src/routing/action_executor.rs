//! # Stage action executor
//!
//! Executes one actor's decision on a stage and runs the progression
//! algorithm. The whole call (authorization, stage transition, audit
//! record, cohort progression, route/document side effects) happens inside
//! one transaction over row-locked stage rows, so racing approvals on
//! sibling stages serialize and the first-approver-wins rule under
//! `parallel_any_of` cannot double-apply.

use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::authorization::{authorize_stage_action, Grant, Permission, StageAuthorizer};
use crate::error::{DocRouteError, Result};
use crate::models::{
    Document, DocumentHistory, HistoryEvent, NewStageAction, Route, Stage, StageAction,
};
use crate::routing::progression::{plan_after_approval, StageSnapshot};
use crate::routing::types::{ActionOutcome, StageActionRequest};
use crate::state_machine::{
    stage_transition, DocumentStatus, RouteState, StageActionKind, StageState,
};

/// Executes stage actions against a document's current route
#[derive(Clone)]
pub struct StageActionExecutor {
    pool: PgPool,
    authorizer: StageAuthorizer,
}

impl StageActionExecutor {
    pub fn new(pool: PgPool) -> Self {
        let authorizer = StageAuthorizer::new(pool.clone());
        Self { pool, authorizer }
    }

    /// Execute an action on a stage of the document's current route.
    #[instrument(
        skip(self, request),
        fields(
            document_id = request.document_id,
            stage_id = request.stage_id,
            action = %request.action,
            actor_id = request.actor_id,
        )
    )]
    pub async fn execute(&self, request: StageActionRequest) -> Result<ActionOutcome> {
        if !request.action.is_caller_action() {
            return Err(DocRouteError::Validation(format!(
                "Action {} is reserved for the override authority",
                request.action
            )));
        }

        let now = Utc::now();
        let (actor, delegations) = self.authorizer.resolve_actor(request.actor_id, now).await?;

        let mut tx = self.pool.begin().await?;

        let document = Document::find_by_id_locked(&mut *tx, request.document_id)
            .await?
            .ok_or_else(|| {
                DocRouteError::NotFound(format!("Document {}", request.document_id))
            })?;

        let route_id = document.current_route_id.ok_or_else(|| {
            DocRouteError::Conflict(format!(
                "Document {} has no active route",
                document.document_id
            ))
        })?;
        let route = Route::find_by_id(&mut *tx, route_id)
            .await?
            .ok_or_else(|| DocRouteError::NotFound(format!("Route {route_id}")))?;
        if route.route_state()? != RouteState::Active {
            return Err(DocRouteError::Conflict(format!(
                "Route {route_id} is not active"
            )));
        }
        let policy = route.policy()?;

        // Row locks on the whole route's stages serialize racing siblings
        let stages = Stage::lock_by_route(&mut *tx, route_id).await?;
        let stage = stages
            .iter()
            .find(|s| s.stage_id == request.stage_id)
            .ok_or_else(|| {
                DocRouteError::NotFound(format!(
                    "Stage {} on the current route of document {}",
                    request.stage_id, document.document_id
                ))
            })?
            .clone();

        let current_state = stage.stage_state()?;
        if !current_state.is_open() {
            return Err(DocRouteError::Conflict(format!(
                "Stage {} is already closed ({current_state})",
                stage.stage_id
            )));
        }

        let assignee = stage.assignee()?;
        let stage_department = assignee
            .department_id()
            .or(Some(document.department_id));
        let grant = authorize_stage_action(
            &actor,
            &assignee,
            stage_department,
            Permission::ExecuteRouteStage,
            &delegations,
            now,
        )?;

        let resulting_state = stage_transition(current_state, request.action)
            .map_err(|e| DocRouteError::StateTransition(e.to_string()))?;

        let (route_state, document_status) = match request.action {
            StageActionKind::Commented => {
                // A comment keeps the stage open; a comment on a pending
                // stage activates it to match the recorded resulting state.
                if current_state == StageState::Pending {
                    Stage::activate(&mut *tx, &[stage.stage_id]).await?;
                }
                (RouteState::Active, document.document_status()?)
            }
            StageActionKind::Rejected => {
                Stage::close(&mut *tx, stage.stage_id, StageState::Rejected).await?;
                Route::finish(&mut *tx, route_id, RouteState::Rejected, None).await?;
                Document::set_route_outcome(
                    &mut *tx,
                    document.document_id,
                    DocumentStatus::Rejected,
                    now,
                )
                .await?;
                (RouteState::Rejected, DocumentStatus::Rejected)
            }
            StageActionKind::ReturnedForRevision => {
                Stage::close(&mut *tx, stage.stage_id, StageState::Returned).await?;
                Route::finish(&mut *tx, route_id, RouteState::Returned, None).await?;
                Document::set_route_outcome(
                    &mut *tx,
                    document.document_id,
                    DocumentStatus::ReturnedForRevision,
                    now,
                )
                .await?;
                (RouteState::Returned, DocumentStatus::ReturnedForRevision)
            }
            StageActionKind::Approved => {
                Stage::close(&mut *tx, stage.stage_id, StageState::Approved).await?;

                let snapshots: Vec<StageSnapshot> = stages
                    .iter()
                    .map(|s| {
                        Ok(StageSnapshot {
                            stage_id: s.stage_id,
                            order_no: s.order_no,
                            group_no: s.stage_group_no,
                            state: s.stage_state()?,
                        })
                    })
                    .collect::<Result<_>>()?;
                let plan = plan_after_approval(&snapshots, stage.stage_id, policy);

                debug!(
                    route_id = route_id,
                    skipped = plan.skip.len(),
                    activated = plan.activate.len(),
                    route_exhausted = plan.route_exhausted,
                    "Progression plan computed"
                );

                if !plan.skip.is_empty() {
                    Stage::skip_open(&mut *tx, &plan.skip).await?;
                }
                if !plan.activate.is_empty() {
                    Stage::activate(&mut *tx, &plan.activate).await?;
                }

                if plan.route_exhausted {
                    Route::finish(&mut *tx, route_id, RouteState::Completed, None).await?;
                    Document::set_route_outcome(
                        &mut *tx,
                        document.document_id,
                        DocumentStatus::Approved,
                        now,
                    )
                    .await?;
                    (RouteState::Completed, DocumentStatus::Approved)
                } else {
                    (RouteState::Active, DocumentStatus::InRoute)
                }
            }
            StageActionKind::OverrideApproved | StageActionKind::OverrideRejected => {
                unreachable!("override kinds rejected above")
            }
        };

        self.record_action(&mut tx, &request, &grant, resulting_state, &document)
            .await?;

        tx.commit().await?;

        info!(
            document_id = document.document_id,
            stage_id = stage.stage_id,
            stage_state = %resulting_state,
            route_state = %route_state,
            document_status = %document_status,
            on_behalf_of = grant.on_behalf_of,
            "Stage action executed"
        );

        Ok(ActionOutcome {
            action: request.action,
            stage_state: resulting_state,
            route_state,
            document_status,
        })
    }

    /// Write the immutable audit record and the route_action history event
    async fn record_action(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        request: &StageActionRequest,
        grant: &Grant,
        resulting_state: StageState,
        document: &Document,
    ) -> Result<()> {
        StageAction::create(
            &mut **tx,
            NewStageAction {
                stage_id: request.stage_id,
                action: request.action,
                resulting_state,
                acted_by: grant.acted_by,
                on_behalf_of: grant.on_behalf_of,
                comment: request.comment.clone(),
                reason_code: request.reason_code.clone(),
                ip_address: request.provenance.ip_address.clone(),
                user_agent: request.provenance.user_agent.clone(),
            },
        )
        .await?;

        DocumentHistory::record(
            &mut **tx,
            document.document_id,
            HistoryEvent::RouteAction,
            grant.acted_by,
            serde_json::json!({
                "stage_id": request.stage_id,
                "action": request.action.to_string(),
                "resulting_state": resulting_state.to_string(),
                "on_behalf_of": grant.on_behalf_of,
            }),
        )
        .await?;

        Ok(())
    }
}
