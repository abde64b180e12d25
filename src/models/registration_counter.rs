use sqlx::{Postgres, Transaction};

use crate::error::Result;

/// Per-(department, document type, year) registration sequence.
/// Maps to `docroute_registration_counters` table.
///
/// Allocation is the one place optimistic find-then-save is insufficient:
/// the upsert takes a row lock on the counter, so concurrent submissions for
/// the same department/type/year serialize and never receive the same number.
pub struct RegistrationCounter;

impl RegistrationCounter {
    /// Allocate the next sequence value, creating the counter row on first use
    pub async fn allocate(
        tx: &mut Transaction<'_, Postgres>,
        department_id: i64,
        document_type: &str,
        year: i32,
    ) -> Result<i64> {
        let (value,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO docroute_registration_counters (department_id, document_type, year, last_value)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (department_id, document_type, year)
            DO UPDATE SET last_value = docroute_registration_counters.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(department_id)
        .bind(document_type)
        .bind(year)
        .fetch_one(&mut **tx)
        .await?;

        Ok(value)
    }
}
