//! # Deadline alert processor
//!
//! Scans open stages with due dates, classifies them against the configured
//! thresholds, and inserts deduplicated alerts for the resolved recipients.
//! The processor is strictly read-only with respect to routing state: it
//! never mutates a stage, route, or document.
//!
//! A single stage failing recipient resolution is logged and skipped rather
//! than aborting the tick, and the dedup key makes repeated or concurrent
//! ticks idempotent (at-least-once execution is safe).

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::alerts::classify::classify_due_date;
use crate::authorization::UserRole;
use crate::config::AlertConfig;
use crate::error::{DocRouteError, Result};
use crate::models::{Alert, AlertKind, Assignee, Document, Stage, User};

/// Result of one processor tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertScanOutcome {
    pub stages_scanned: usize,
    pub alerts_created: usize,
}

/// Storage side of one scan: the due-stage query and the per-stage alert
/// fan-out with its recipient resolution and dedup insert.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Open stages on active routes that carry a due date
    async fn due_stages(&self) -> Result<Vec<Stage>>;

    /// Insert deduplicated alerts for one classified stage, returning how
    /// many rows were actually created
    async fn emit_for_stage(&self, stage: &Stage, kinds: &[AlertKind]) -> Result<usize>;
}

/// Scans due stages and emits deduplicated alerts
#[derive(Clone)]
pub struct DeadlineAlertProcessor {
    sink: Arc<dyn AlertSink>,
    config: AlertConfig,
}

impl DeadlineAlertProcessor {
    pub fn new(pool: PgPool, config: AlertConfig) -> Self {
        Self::with_sink(Arc::new(PgAlertSink { pool }), config)
    }

    pub fn with_sink(sink: Arc<dyn AlertSink>, config: AlertConfig) -> Self {
        Self { sink, config }
    }

    /// Run one scan over every open stage carrying a due date.
    #[instrument(skip(self))]
    pub async fn process(&self) -> Result<AlertScanOutcome> {
        let now = Utc::now();
        let thresholds = self.config.thresholds();

        let stages = self.sink.due_stages().await?;

        let mut outcome = AlertScanOutcome {
            stages_scanned: stages.len(),
            alerts_created: 0,
        };

        for stage in &stages {
            let Some(due_at) = stage.due_at else {
                continue;
            };
            let kinds = classify_due_date(due_at, now, thresholds);
            if kinds.is_empty() {
                continue;
            }

            match self.sink.emit_for_stage(stage, &kinds).await {
                Ok(created) => outcome.alerts_created += created,
                Err(e) => {
                    // One stage's resolution failure must not abort the tick
                    warn!(
                        stage_id = stage.stage_id,
                        error = %e,
                        "Skipping stage in alert scan"
                    );
                }
            }
        }

        info!(
            stages_scanned = outcome.stages_scanned,
            alerts_created = outcome.alerts_created,
            "Deadline alert scan finished"
        );

        Ok(outcome)
    }
}

/// SQLx-backed sink over the live schema
pub struct PgAlertSink {
    pool: PgPool,
}

#[async_trait]
impl AlertSink for PgAlertSink {
    async fn due_stages(&self) -> Result<Vec<Stage>> {
        let stages = Stage::scope()
            .on_active_routes()
            .open()
            .with_due_date()
            .all(&self.pool)
            .await?;
        Ok(stages)
    }

    /// Insert alerts for one classified stage, deduplicated per
    /// (stage, recipient, kind)
    async fn emit_for_stage(&self, stage: &Stage, kinds: &[AlertKind]) -> Result<usize> {
        let document = Document::find_by_route_id(&self.pool, stage.route_id)
            .await?
            .ok_or_else(|| {
                DocRouteError::NotFound(format!("Document for route {}", stage.route_id))
            })?;

        let assignee = stage.assignee()?;
        let base_recipients = self.resolve_recipients(&assignee).await?;

        let mut created = 0;
        for kind in kinds {
            let recipients = if *kind == AlertKind::Escalation {
                self.resolve_escalation_recipients(&assignee, &document)
                    .await?
            } else {
                base_recipients.clone()
            };

            if recipients.is_empty() {
                debug!(
                    stage_id = stage.stage_id,
                    kind = %kind,
                    "No recipients resolved for alert"
                );
                continue;
            }

            for recipient_id in recipients {
                let inserted = Alert::create_if_absent(
                    &self.pool,
                    document.document_id,
                    stage.stage_id,
                    recipient_id,
                    *kind,
                )
                .await?;
                if inserted {
                    created += 1;
                }
            }
        }

        Ok(created)
    }
}

impl PgAlertSink {
    /// Recipients of due-soon and overdue alerts, per assignee variant
    async fn resolve_recipients(&self, assignee: &Assignee) -> Result<BTreeSet<i64>> {
        let users = match assignee {
            Assignee::User { user_id } => return Ok(BTreeSet::from([*user_id])),
            Assignee::Role {
                role,
                department_id,
            } => User::find_active_by_role(&self.pool, role, *department_id).await?,
            Assignee::DepartmentHead { department_id } => {
                User::find_active_by_role(
                    &self.pool,
                    &UserRole::DepartmentManager.to_string(),
                    Some(*department_id),
                )
                .await?
            }
        };

        Ok(users.into_iter().map(|u| u.user_id).collect())
    }

    /// Escalation replaces the recipient set: global-role users, the stage
    /// department's managers, and the document's creator.
    async fn resolve_escalation_recipients(
        &self,
        assignee: &Assignee,
        document: &Document,
    ) -> Result<BTreeSet<i64>> {
        let mut recipients = BTreeSet::new();

        for user in
            User::find_active_by_role(&self.pool, &UserRole::Admin.to_string(), None).await?
        {
            recipients.insert(user.user_id);
        }

        let department_id = assignee.department_id().unwrap_or(document.department_id);
        for user in User::find_active_by_role(
            &self.pool,
            &UserRole::DepartmentManager.to_string(),
            Some(department_id),
        )
        .await?
        {
            recipients.insert(user.user_id);
        }

        recipients.insert(document.created_by);

        Ok(recipients)
    }
}
