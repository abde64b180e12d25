use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::Stage;

/// Query builder for Stage scopes
pub struct StageScope {
    query: QueryBuilder<'static, Postgres>,
    has_routes_join: bool,
    has_conditions: bool,
}

impl Stage {
    /// Start building a scoped stage query
    pub fn scope() -> StageScope {
        let query = QueryBuilder::new("SELECT docroute_stages.* FROM docroute_stages");
        StageScope {
            query,
            has_routes_join: false,
            has_conditions: false,
        }
    }
}

impl StageScope {
    /// Add WHERE clause helper
    fn add_condition(&mut self, condition: &str) {
        if self.has_conditions {
            self.query.push(" AND ");
        } else {
            self.query.push(" WHERE ");
            self.has_conditions = true;
        }
        self.query.push(condition);
    }

    /// Restrict to stages on routes that are still active
    pub fn on_active_routes(mut self) -> Self {
        if !self.has_routes_join {
            self.query.push(
                " INNER JOIN docroute_routes \
                 ON docroute_routes.route_id = docroute_stages.route_id",
            );
            self.has_routes_join = true;
        }
        self.add_condition("docroute_routes.state = 'active'");
        self
    }

    /// Restrict to open stages (pending or in progress)
    pub fn open(mut self) -> Self {
        self.add_condition("docroute_stages.state IN ('pending', 'in_progress')");
        self
    }

    /// Restrict to stages carrying a due date
    pub fn with_due_date(mut self) -> Self {
        self.add_condition("docroute_stages.due_at IS NOT NULL");
        self
    }

    /// Execute and return all matching stages
    pub async fn all(mut self, pool: &PgPool) -> Result<Vec<Stage>, sqlx::Error> {
        self.query
            .push(" ORDER BY docroute_stages.due_at ASC NULLS LAST, docroute_stages.stage_id ASC");
        self.query.build_query_as::<Stage>().fetch_all(pool).await
    }
}
