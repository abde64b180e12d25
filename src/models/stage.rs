use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;

use crate::error::{DocRouteError, Result};
use crate::state_machine::StageState;

/// Kind of decision a stage asks its assignee for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    Review,
    Sign,
    Approve,
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Review => write!(f, "review"),
            Self::Sign => write!(f, "sign"),
            Self::Approve => write!(f, "approve"),
        }
    }
}

impl std::str::FromStr for StageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "review" => Ok(Self::Review),
            "sign" => Ok(Self::Sign),
            "approve" => Ok(Self::Approve),
            _ => Err(format!("Invalid stage type: {s}")),
        }
    }
}

/// Closed assignee variants. Each variant carries only the fields valid for
/// it, enforced at construction, so downstream code dispatches on the variant
/// instead of inspecting nullable columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "assignee_type", rename_all = "snake_case")]
pub enum Assignee {
    /// A concrete user
    User { user_id: i64 },
    /// Every holder of a role, optionally narrowed to one department
    Role {
        role: String,
        department_id: Option<i64>,
    },
    /// The manager(s) of a department
    DepartmentHead { department_id: i64 },
}

impl Assignee {
    /// Wire string for the `assignee_type` column
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Role { .. } => "role",
            Self::DepartmentHead { .. } => "department_head",
        }
    }

    /// Department the assignment is scoped to, when one applies
    pub fn department_id(&self) -> Option<i64> {
        match self {
            Self::User { .. } => None,
            Self::Role { department_id, .. } => *department_id,
            Self::DepartmentHead { department_id } => Some(*department_id),
        }
    }

    /// Reconstruct the variant from persisted columns, rejecting rows whose
    /// columns are inconsistent with the declared type.
    pub fn from_columns(
        assignee_type: &str,
        user_id: Option<i64>,
        role: Option<&str>,
        department_id: Option<i64>,
    ) -> Result<Assignee> {
        match assignee_type {
            "user" => {
                let user_id = user_id.ok_or_else(|| {
                    DocRouteError::Validation("user assignee requires a user id".to_string())
                })?;
                Ok(Self::User { user_id })
            }
            "role" => {
                let role = role.ok_or_else(|| {
                    DocRouteError::Validation("role assignee requires a role".to_string())
                })?;
                Ok(Self::Role {
                    role: role.to_string(),
                    department_id,
                })
            }
            "department_head" => {
                let department_id = department_id.ok_or_else(|| {
                    DocRouteError::Validation(
                        "department_head assignee requires a department id".to_string(),
                    )
                })?;
                Ok(Self::DepartmentHead { department_id })
            }
            other => Err(DocRouteError::Validation(format!(
                "Invalid assignee type: {other}"
            ))),
        }
    }
}

/// One hop in a route. Stages sharing an `order_no` (and, for parallel
/// policies, a `stage_group_no`) execute concurrently as one cohort.
/// Maps to `docroute_stages` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Stage {
    pub stage_id: i64,
    pub route_id: i64,
    pub order_no: i32,
    pub stage_group_no: Option<i32>,
    pub stage_type: String,
    pub assignee_type: String,
    pub assignee_user_id: Option<i64>,
    pub assignee_role: Option<String>,
    pub assignee_department_id: Option<i64>,
    pub state: String,
    pub due_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// New Stage for creation (always starts pending)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStage {
    pub route_id: i64,
    pub order_no: i32,
    pub stage_group_no: Option<i32>,
    pub stage_type: StageType,
    pub assignee: Assignee,
    pub due_at: Option<DateTime<Utc>>,
}

const STAGE_COLUMNS: &str = "stage_id, route_id, order_no, stage_group_no, stage_type, \
     assignee_type, assignee_user_id, assignee_role, assignee_department_id, state, due_at, \
     started_at, completed_at, created_at";

impl Stage {
    /// Create a new stage in `pending` state
    pub async fn create(executor: impl PgExecutor<'_>, new_stage: NewStage) -> Result<Stage> {
        let (user_id, role, department_id) = match &new_stage.assignee {
            Assignee::User { user_id } => (Some(*user_id), None, None),
            Assignee::Role {
                role,
                department_id,
            } => (None, Some(role.clone()), *department_id),
            Assignee::DepartmentHead { department_id } => (None, None, Some(*department_id)),
        };

        let stage = sqlx::query_as::<_, Stage>(&format!(
            r#"
            INSERT INTO docroute_stages
                (route_id, order_no, stage_group_no, stage_type, assignee_type,
                 assignee_user_id, assignee_role, assignee_department_id, state, due_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9)
            RETURNING {STAGE_COLUMNS}
            "#,
        ))
        .bind(new_stage.route_id)
        .bind(new_stage.order_no)
        .bind(new_stage.stage_group_no)
        .bind(new_stage.stage_type.to_string())
        .bind(new_stage.assignee.type_str())
        .bind(user_id)
        .bind(role)
        .bind(department_id)
        .bind(new_stage.due_at)
        .fetch_one(executor)
        .await?;

        Ok(stage)
    }

    /// Find a stage by ID
    pub async fn find_by_id(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<Stage>> {
        let stage = sqlx::query_as::<_, Stage>(&format!(
            r#"
            SELECT {STAGE_COLUMNS}
            FROM docroute_stages
            WHERE stage_id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(stage)
    }

    /// Find all stages of a route in hop order
    pub async fn find_by_route(
        executor: impl PgExecutor<'_>,
        route_id: i64,
    ) -> Result<Vec<Stage>> {
        let stages = sqlx::query_as::<_, Stage>(&format!(
            r#"
            SELECT {STAGE_COLUMNS}
            FROM docroute_stages
            WHERE route_id = $1
            ORDER BY order_no ASC, stage_group_no ASC NULLS FIRST, stage_id ASC
            "#,
        ))
        .bind(route_id)
        .fetch_all(executor)
        .await?;

        Ok(stages)
    }

    /// Load and row-lock all stages of a route. Racing actors on sibling
    /// stages of one cohort serialize here, so the progression algorithm
    /// never double-applies.
    pub async fn lock_by_route(
        executor: impl PgExecutor<'_>,
        route_id: i64,
    ) -> Result<Vec<Stage>> {
        let stages = sqlx::query_as::<_, Stage>(&format!(
            r#"
            SELECT {STAGE_COLUMNS}
            FROM docroute_stages
            WHERE route_id = $1
            ORDER BY order_no ASC, stage_group_no ASC NULLS FIRST, stage_id ASC
            FOR UPDATE
            "#,
        ))
        .bind(route_id)
        .fetch_all(executor)
        .await?;

        Ok(stages)
    }

    /// Flip a set of pending stages to `in_progress`, stamping `started_at`
    pub async fn activate(executor: impl PgExecutor<'_>, stage_ids: &[i64]) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE docroute_stages
            SET state = 'in_progress',
                started_at = NOW()
            WHERE stage_id = ANY($1) AND state = 'pending'
            "#,
        )
        .bind(stage_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Close a stage with a terminal state, stamping `completed_at`
    pub async fn close(
        executor: impl PgExecutor<'_>,
        stage_id: i64,
        state: StageState,
    ) -> Result<Stage> {
        let stage = sqlx::query_as::<_, Stage>(&format!(
            r#"
            UPDATE docroute_stages
            SET state = $2,
                completed_at = NOW()
            WHERE stage_id = $1
            RETURNING {STAGE_COLUMNS}
            "#,
        ))
        .bind(stage_id)
        .bind(state.to_string())
        .fetch_one(executor)
        .await?;

        Ok(stage)
    }

    /// Mark a set of still-open stages as skipped
    pub async fn skip_open(executor: impl PgExecutor<'_>, stage_ids: &[i64]) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE docroute_stages
            SET state = 'skipped',
                completed_at = NOW()
            WHERE stage_id = ANY($1) AND state IN ('pending', 'in_progress')
            "#,
        )
        .bind(stage_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Parse the persisted state column
    pub fn stage_state(&self) -> Result<StageState> {
        self.state.parse().map_err(|_| {
            DocRouteError::StateTransition(format!("Invalid stage state in database: {}", self.state))
        })
    }

    /// Reconstruct the assignee variant from the persisted columns
    pub fn assignee(&self) -> Result<Assignee> {
        Assignee::from_columns(
            &self.assignee_type,
            self.assignee_user_id,
            self.assignee_role.as_deref(),
            self.assignee_department_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignee_from_consistent_columns() {
        let assignee = Assignee::from_columns("user", Some(42), None, None).unwrap();
        assert_eq!(assignee, Assignee::User { user_id: 42 });
        assert_eq!(assignee.type_str(), "user");
        assert_eq!(assignee.department_id(), None);

        let assignee = Assignee::from_columns("role", None, Some("clerk"), Some(3)).unwrap();
        assert_eq!(
            assignee,
            Assignee::Role {
                role: "clerk".to_string(),
                department_id: Some(3)
            }
        );
        assert_eq!(assignee.department_id(), Some(3));

        let assignee = Assignee::from_columns("department_head", None, None, Some(7)).unwrap();
        assert_eq!(assignee, Assignee::DepartmentHead { department_id: 7 });
    }

    #[test]
    fn test_assignee_rejects_inconsistent_columns() {
        assert!(matches!(
            Assignee::from_columns("user", None, None, None),
            Err(DocRouteError::Validation(_))
        ));
        assert!(matches!(
            Assignee::from_columns("role", Some(1), None, None),
            Err(DocRouteError::Validation(_))
        ));
        assert!(matches!(
            Assignee::from_columns("department_head", None, None, None),
            Err(DocRouteError::Validation(_))
        ));
        assert!(matches!(
            Assignee::from_columns("group", None, None, None),
            Err(DocRouteError::Validation(_))
        ));
    }

    #[test]
    fn test_stage_type_round_trip() {
        assert_eq!("sign".parse::<StageType>().unwrap(), StageType::Sign);
        assert_eq!(StageType::Approve.to_string(), "approve");
    }
}
