use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use crate::error::Result;

/// Named, reusable route definition. A template reference handed to
/// `submit_to_route` expands into the same stage-spec list a caller could
/// have passed directly.
/// Maps to `docroute_route_templates` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RouteTemplate {
    pub template_id: i64,
    pub name: String,
    pub completion_policy: String,
    pub created_at: DateTime<Utc>,
}

/// One templated hop. `due_in_hours` becomes a concrete `due_at` relative to
/// submission time during expansion.
/// Maps to `docroute_route_template_stages` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RouteTemplateStage {
    pub template_stage_id: i64,
    pub template_id: i64,
    pub order_no: i32,
    pub stage_group_no: Option<i32>,
    pub stage_type: String,
    pub assignee_type: String,
    pub assignee_user_id: Option<i64>,
    pub assignee_role: Option<String>,
    pub assignee_department_id: Option<i64>,
    pub due_in_hours: Option<i32>,
}

impl RouteTemplate {
    /// Find a template by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<RouteTemplate>> {
        let template = sqlx::query_as::<_, RouteTemplate>(
            r#"
            SELECT template_id, name, completion_policy, created_at
            FROM docroute_route_templates
            WHERE template_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(template)
    }

    /// Templated stages in hop order
    pub async fn find_stages(
        executor: impl PgExecutor<'_>,
        template_id: i64,
    ) -> Result<Vec<RouteTemplateStage>> {
        let stages = sqlx::query_as::<_, RouteTemplateStage>(
            r#"
            SELECT template_stage_id, template_id, order_no, stage_group_no, stage_type,
                   assignee_type, assignee_user_id, assignee_role, assignee_department_id,
                   due_in_hours
            FROM docroute_route_template_stages
            WHERE template_id = $1
            ORDER BY order_no ASC, stage_group_no ASC NULLS FIRST, template_stage_id ASC
            "#,
        )
        .bind(template_id)
        .fetch_all(executor)
        .await?;

        Ok(stages)
    }
}
