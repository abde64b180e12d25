//! # Engine facade
//!
//! Bundles the routing components behind the five operations the engine
//! exposes to its callers: submit, execute stage action, override, find
//! route, and process deadline alerts.

use sqlx::PgPool;

use crate::alerts::{AlertScanOutcome, DeadlineAlertProcessor};
use crate::config::AlertConfig;
use crate::error::Result;
use crate::routing::{
    ActionOutcome, OverrideAction, OverrideExecutor, OverrideOutcome, RouteDetails, RouteFinder,
    RouteSubmitter, StageActionExecutor, StageActionRequest, SubmitOutcome, SubmitRequest,
};

/// One handle over the whole routing engine
#[derive(Clone)]
pub struct DocRouteEngine {
    submitter: RouteSubmitter,
    actions: StageActionExecutor,
    overrides: OverrideExecutor,
    finder: RouteFinder,
    alerts: DeadlineAlertProcessor,
}

impl DocRouteEngine {
    pub fn new(pool: PgPool, alert_config: AlertConfig) -> Self {
        Self {
            submitter: RouteSubmitter::new(pool.clone()),
            actions: StageActionExecutor::new(pool.clone()),
            overrides: OverrideExecutor::new(pool.clone()),
            finder: RouteFinder::new(pool.clone()),
            alerts: DeadlineAlertProcessor::new(pool, alert_config),
        }
    }

    /// Submit a document to a route (explicit stages or template)
    pub async fn submit_to_route(&self, request: SubmitRequest) -> Result<SubmitOutcome> {
        self.submitter.submit_to_route(request).await
    }

    /// Execute one actor's action on a stage of the current route
    pub async fn execute_stage_action(
        &self,
        request: StageActionRequest,
    ) -> Result<ActionOutcome> {
        self.actions.execute(request).await
    }

    /// Force-terminate the document's active route
    pub async fn override_route(
        &self,
        document_id: i64,
        action: OverrideAction,
        reason: String,
        actor_id: i64,
    ) -> Result<OverrideOutcome> {
        self.overrides.execute(document_id, action, reason, actor_id).await
    }

    /// The document's current route with stages and audit trail
    pub async fn find_route(&self, document_id: i64) -> Result<RouteDetails> {
        self.finder.find_route(document_id).await
    }

    /// Run one deadline alert scan on demand
    pub async fn process_deadline_alerts(&self) -> Result<AlertScanOutcome> {
        self.alerts.process().await
    }

    /// The alert processor, for wiring into a scheduler
    pub fn alert_processor(&self) -> DeadlineAlertProcessor {
        self.alerts.clone()
    }
}
