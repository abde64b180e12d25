//! # Route submitter
//!
//! Atomic route creation with stage fan-out and first-cohort activation.
//!
//! A submission allocates the next route version for the document, creates
//! every stage in `pending`, activates the first cohort, and moves the
//! document into `in_route`, all inside one transaction, so a failure at
//! any point leaves no partial route visible. Resubmission after revision
//! runs the same path and never touches earlier routes.

use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument};

use crate::error::{DocRouteError, Result};
use crate::models::{
    Assignee, CompletionPolicy, Document, DocumentHistory, HistoryEvent, NewStage, Route,
    RouteTemplate, Stage,
};
use crate::routing::progression::{initial_cohort, StageSnapshot};
use crate::routing::types::{RouteSource, StageSpec, SubmitOutcome, SubmitRequest};
use crate::state_machine::StageState;

/// Creates routes for documents and activates their first cohort
#[derive(Clone)]
pub struct RouteSubmitter {
    pool: PgPool,
}

impl RouteSubmitter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submit a document to a route built from explicit stage specs or an
    /// expanded template.
    #[instrument(skip(self, request), fields(document_id = request.document_id))]
    pub async fn submit_to_route(&self, request: SubmitRequest) -> Result<SubmitOutcome> {
        let (specs, policy) = self
            .expand_source(&request.source, request.completion_policy)
            .await?;

        if specs.is_empty() {
            return Err(DocRouteError::Validation(
                "Stage list must not be empty".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let document = Document::find_by_id_locked(&mut *tx, request.document_id)
            .await?
            .ok_or_else(|| {
                DocRouteError::NotFound(format!("Document {}", request.document_id))
            })?;

        let status = document.document_status()?;
        if !status.can_submit() {
            return Err(DocRouteError::Conflict(format!(
                "Document {} cannot be submitted from status {status}",
                document.document_id
            )));
        }

        if Route::find_active_by_document(&mut *tx, document.document_id)
            .await?
            .is_some()
        {
            return Err(DocRouteError::Conflict(format!(
                "Document {} already has an active route",
                document.document_id
            )));
        }

        let version_no = Route::next_version_no(&mut *tx, document.document_id).await?;
        let route = Route::create(&mut *tx, document.document_id, version_no, policy).await?;

        debug!(
            route_id = route.route_id,
            version_no = version_no,
            policy = %policy,
            stage_count = specs.len(),
            "Created route"
        );

        let mut stages = Vec::with_capacity(specs.len());
        for spec in specs {
            let stage = Stage::create(
                &mut *tx,
                NewStage {
                    route_id: route.route_id,
                    order_no: spec.order_no,
                    stage_group_no: spec.group_no,
                    stage_type: spec.stage_type,
                    assignee: spec.assignee,
                    due_at: spec.due_at,
                },
            )
            .await?;
            stages.push(stage);
        }

        let snapshots: Vec<StageSnapshot> = stages
            .iter()
            .map(|s| StageSnapshot {
                stage_id: s.stage_id,
                order_no: s.order_no,
                group_no: s.stage_group_no,
                state: StageState::Pending,
            })
            .collect();
        let first_cohort = initial_cohort(&snapshots, policy);
        Stage::activate(&mut *tx, &first_cohort).await?;

        Document::set_in_route(&mut *tx, document.document_id, route.route_id).await?;

        self.record_submission_history(
            &mut tx,
            &document,
            &stages,
            &first_cohort,
            request.submitted_by,
        )
        .await?;

        tx.commit().await?;

        info!(
            document_id = document.document_id,
            route_id = route.route_id,
            version_no = version_no,
            first_cohort_size = first_cohort.len(),
            "Document submitted to route"
        );

        Ok(SubmitOutcome {
            route_id: route.route_id,
            version_no,
            stage_ids: stages.iter().map(|s| s.stage_id).collect(),
        })
    }

    /// Resolve the submission source into concrete stage specs and the
    /// effective completion policy. Template submissions carry the policy
    /// stored on the template.
    async fn expand_source(
        &self,
        source: &RouteSource,
        requested_policy: CompletionPolicy,
    ) -> Result<(Vec<StageSpec>, CompletionPolicy)> {
        match source {
            RouteSource::Stages(specs) => Ok((specs.clone(), requested_policy)),
            RouteSource::Template { template_id } => {
                let template = RouteTemplate::find_by_id(&self.pool, *template_id)
                    .await?
                    .ok_or_else(|| {
                        DocRouteError::NotFound(format!("Route template {template_id}"))
                    })?;
                let policy = template.completion_policy.parse().map_err(|_| {
                    DocRouteError::Validation(format!(
                        "Template {template_id} has invalid completion policy"
                    ))
                })?;

                let now = Utc::now();
                let mut specs = Vec::new();
                for row in RouteTemplate::find_stages(&self.pool, *template_id).await? {
                    let assignee = Assignee::from_columns(
                        &row.assignee_type,
                        row.assignee_user_id,
                        row.assignee_role.as_deref(),
                        row.assignee_department_id,
                    )?;
                    let stage_type = row.stage_type.parse().map_err(|_| {
                        DocRouteError::Validation(format!(
                            "Template {template_id} has invalid stage type {}",
                            row.stage_type
                        ))
                    })?;
                    specs.push(StageSpec {
                        order_no: row.order_no,
                        group_no: row.stage_group_no,
                        stage_type,
                        assignee,
                        due_at: row
                            .due_in_hours
                            .map(|hours| now + Duration::hours(i64::from(hours))),
                    });
                }

                debug!(
                    template_id = template_id,
                    stage_count = specs.len(),
                    "Expanded route template"
                );
                Ok((specs, policy))
            }
        }
    }

    /// Record the submission trail: one submitted event, plus forwarded and
    /// (for concrete user assignees) responsible-assigned events for every
    /// first-hop stage.
    async fn record_submission_history(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document: &Document,
        stages: &[Stage],
        first_cohort: &[i64],
        submitted_by: i64,
    ) -> Result<()> {
        DocumentHistory::record(
            &mut **tx,
            document.document_id,
            HistoryEvent::Submitted,
            submitted_by,
            serde_json::json!({ "stage_count": stages.len() }),
        )
        .await?;

        for stage in stages.iter().filter(|s| first_cohort.contains(&s.stage_id)) {
            DocumentHistory::record(
                &mut **tx,
                document.document_id,
                HistoryEvent::Forwarded,
                submitted_by,
                serde_json::json!({
                    "stage_id": stage.stage_id,
                    "assignee_type": stage.assignee_type,
                }),
            )
            .await?;

            if let Assignee::User { user_id } = stage.assignee()? {
                DocumentHistory::record(
                    &mut **tx,
                    document.document_id,
                    HistoryEvent::ResponsibleAssigned,
                    submitted_by,
                    serde_json::json!({
                        "stage_id": stage.stage_id,
                        "responsible_user_id": user_id,
                    }),
                )
                .await?;
            }
        }

        Ok(())
    }
}
