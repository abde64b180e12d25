use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// Department lookup record (external collaborator surface).
/// Maps to `docroute_departments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub department_id: i64,
    pub name: String,
    pub parent_department_id: Option<i64>,
}

impl Department {
    /// Find a department by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Department>, sqlx::Error> {
        sqlx::query_as::<_, Department>(
            r#"
            SELECT department_id, name, parent_department_id
            FROM docroute_departments
            WHERE department_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
