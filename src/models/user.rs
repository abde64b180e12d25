use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// User lookup record consumed by the engine (external collaborator surface).
/// Maps to `docroute_users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub full_name: String,
    pub role: String,
    pub department_id: Option<i64>,
    pub active: bool,
}

impl User {
    /// Find a user by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, full_name, role, department_id, active
            FROM docroute_users
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Find all active users holding a role, optionally narrowed to one department
    pub async fn find_active_by_role(
        executor: impl PgExecutor<'_>,
        role: &str,
        department_id: Option<i64>,
    ) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, full_name, role, department_id, active
            FROM docroute_users
            WHERE role = $1
              AND active = true
              AND ($2::bigint IS NULL OR department_id = $2)
            ORDER BY user_id
            "#,
        )
        .bind(role)
        .bind(department_id)
        .fetch_all(executor)
        .await
    }
}
