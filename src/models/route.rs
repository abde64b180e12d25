use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;

use crate::error::{DocRouteError, Result};
use crate::state_machine::RouteState;

/// Rule for when a cohort of stages is considered resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Stages resolve one cohort at a time, every stage must approve
    Sequential,
    /// Parallel cohorts, every stage in a cohort must approve
    ParallelAllOf,
    /// Parallel cohorts, the first approval resolves the cohort and skips siblings
    ParallelAnyOf,
}

impl fmt::Display for CompletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::ParallelAllOf => write!(f, "parallel_all_of"),
            Self::ParallelAnyOf => write!(f, "parallel_any_of"),
        }
    }
}

impl std::str::FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(Self::Sequential),
            "parallel_all_of" => Ok(Self::ParallelAllOf),
            "parallel_any_of" => Ok(Self::ParallelAnyOf),
            _ => Err(format!("Invalid completion policy: {s}")),
        }
    }
}

/// One version of a document's approval path.
/// Maps to `docroute_routes` table.
///
/// `version_no` increases monotonically per document; a resubmission always
/// creates a new route, never mutates an old one. A partial unique index on
/// (document_id) WHERE state = 'active' enforces at most one active route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub route_id: i64,
    pub document_id: i64,
    pub version_no: i32,
    pub state: String,
    pub completion_policy: String,
    pub override_reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const ROUTE_COLUMNS: &str = "route_id, document_id, version_no, state, completion_policy, \
     override_reason, started_at, finished_at, created_at";

impl Route {
    /// Create a new active route at the next version for the document
    pub async fn create(
        executor: impl PgExecutor<'_>,
        document_id: i64,
        version_no: i32,
        completion_policy: CompletionPolicy,
    ) -> Result<Route> {
        let route = sqlx::query_as::<_, Route>(&format!(
            r#"
            INSERT INTO docroute_routes (document_id, version_no, state, completion_policy, started_at)
            VALUES ($1, $2, 'active', $3, NOW())
            RETURNING {ROUTE_COLUMNS}
            "#,
        ))
        .bind(document_id)
        .bind(version_no)
        .bind(completion_policy.to_string())
        .fetch_one(executor)
        .await?;

        Ok(route)
    }

    /// Find a route by ID
    pub async fn find_by_id(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<Route>> {
        let route = sqlx::query_as::<_, Route>(&format!(
            r#"
            SELECT {ROUTE_COLUMNS}
            FROM docroute_routes
            WHERE route_id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(route)
    }

    /// Find the active route for a document, if any
    pub async fn find_active_by_document(
        executor: impl PgExecutor<'_>,
        document_id: i64,
    ) -> Result<Option<Route>> {
        let route = sqlx::query_as::<_, Route>(&format!(
            r#"
            SELECT {ROUTE_COLUMNS}
            FROM docroute_routes
            WHERE document_id = $1 AND state = 'active'
            "#,
        ))
        .bind(document_id)
        .fetch_optional(executor)
        .await?;

        Ok(route)
    }

    /// Next route version for a document (1 for the first submission)
    pub async fn next_version_no(
        executor: impl PgExecutor<'_>,
        document_id: i64,
    ) -> Result<i32> {
        let (version,): (i32,) = sqlx::query_as(
            r#"
            SELECT COALESCE(MAX(version_no), 0) + 1
            FROM docroute_routes
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .fetch_one(executor)
        .await?;

        Ok(version)
    }

    /// Move the route to a terminal state, stamping `finished_at`.
    /// `override_reason` is set only when terminated via the override authority.
    pub async fn finish(
        executor: impl PgExecutor<'_>,
        route_id: i64,
        state: RouteState,
        override_reason: Option<&str>,
    ) -> Result<Route> {
        let route = sqlx::query_as::<_, Route>(&format!(
            r#"
            UPDATE docroute_routes
            SET state = $2,
                override_reason = $3,
                finished_at = NOW()
            WHERE route_id = $1
            RETURNING {ROUTE_COLUMNS}
            "#,
        ))
        .bind(route_id)
        .bind(state.to_string())
        .bind(override_reason)
        .fetch_one(executor)
        .await?;

        Ok(route)
    }

    /// Parse the persisted state column
    pub fn route_state(&self) -> Result<RouteState> {
        self.state.parse().map_err(|_| {
            DocRouteError::StateTransition(format!("Invalid route state in database: {}", self.state))
        })
    }

    /// Parse the persisted completion policy column
    pub fn policy(&self) -> Result<CompletionPolicy> {
        self.completion_policy.parse().map_err(|_| {
            DocRouteError::StateTransition(format!(
                "Invalid completion policy in database: {}",
                self.completion_policy
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_policy_round_trip() {
        assert_eq!(
            "parallel_any_of".parse::<CompletionPolicy>().unwrap(),
            CompletionPolicy::ParallelAnyOf
        );
        assert_eq!(CompletionPolicy::Sequential.to_string(), "sequential");
        assert!("any_of".parse::<CompletionPolicy>().is_err());
    }

    #[test]
    fn test_route_state_parse_helper() {
        let route = Route {
            route_id: 1,
            document_id: 2,
            version_no: 1,
            state: "active".to_string(),
            completion_policy: "sequential".to_string(),
            override_reason: None,
            started_at: Utc::now(),
            finished_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(route.route_state().unwrap(), RouteState::Active);
        assert_eq!(route.policy().unwrap(), CompletionPolicy::Sequential);
    }
}
