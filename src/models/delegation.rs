use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;

use crate::error::Result;

/// Delegation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    Active,
    Revoked,
    Expired,
}

impl fmt::Display for DelegationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Revoked => write!(f, "revoked"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for DelegationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "revoked" => Ok(Self::Revoked),
            "expired" => Ok(Self::Expired),
            _ => Err(format!("Invalid delegation status: {s}")),
        }
    }
}

/// Time-boxed, permission-scoped grant letting `delegate` act as `delegator`.
/// Maps to `docroute_delegations` table.
///
/// Scope is either global (`department_id` null) or one department. A
/// delegation never grants more than the delegator's own scope, and a
/// delegate may not re-delegate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Delegation {
    pub delegation_id: i64,
    pub delegator_id: i64,
    pub delegate_id: i64,
    /// Null means global scope
    pub department_id: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub permissions: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// New Delegation for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDelegation {
    pub delegator_id: i64,
    pub delegate_id: i64,
    pub department_id: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub permissions: Vec<String>,
}

const DELEGATION_COLUMNS: &str = "delegation_id, delegator_id, delegate_id, department_id, \
     valid_from, valid_to, permissions, status, created_at";

impl Delegation {
    /// Create a new active delegation
    pub async fn create(
        executor: impl PgExecutor<'_>,
        new_delegation: NewDelegation,
    ) -> Result<Delegation> {
        let delegation = sqlx::query_as::<_, Delegation>(&format!(
            r#"
            INSERT INTO docroute_delegations
                (delegator_id, delegate_id, department_id, valid_from, valid_to, permissions, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING {DELEGATION_COLUMNS}
            "#,
        ))
        .bind(new_delegation.delegator_id)
        .bind(new_delegation.delegate_id)
        .bind(new_delegation.department_id)
        .bind(new_delegation.valid_from)
        .bind(new_delegation.valid_to)
        .bind(&new_delegation.permissions)
        .fetch_one(executor)
        .await?;

        Ok(delegation)
    }

    /// Active delegations naming this delegate whose validity window contains
    /// `at`. Scope and permission filtering happen in the authorizer, which
    /// needs the delegator identity anyway.
    pub async fn find_applicable(
        executor: impl PgExecutor<'_>,
        delegate_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Vec<Delegation>> {
        let delegations = sqlx::query_as::<_, Delegation>(&format!(
            r#"
            SELECT {DELEGATION_COLUMNS}
            FROM docroute_delegations
            WHERE delegate_id = $1
              AND status = 'active'
              AND valid_from <= $2
              AND valid_to >= $2
            ORDER BY delegation_id
            "#,
        ))
        .bind(delegate_id)
        .bind(at)
        .fetch_all(executor)
        .await?;

        Ok(delegations)
    }

    /// Revoke an active delegation
    pub async fn revoke(executor: impl PgExecutor<'_>, delegation_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE docroute_delegations
            SET status = 'revoked'
            WHERE delegation_id = $1 AND status = 'active'
            "#,
        )
        .bind(delegation_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Whether the validity window contains the given instant
    pub fn in_window(&self, at: DateTime<Utc>) -> bool {
        self.valid_from <= at && at <= self.valid_to
    }

    /// Whether the scope covers a stage in the given department.
    /// Global scope (null department) covers everything.
    pub fn covers_department(&self, department_id: Option<i64>) -> bool {
        match self.department_id {
            None => true,
            Some(scope) => department_id == Some(scope),
        }
    }
}
