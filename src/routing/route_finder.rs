use sqlx::PgPool;

use crate::error::{DocRouteError, Result};
use crate::models::{Document, Route, Stage, StageAction};
use crate::routing::types::RouteDetails;

/// Read-only view over a document's current route
#[derive(Clone)]
pub struct RouteFinder {
    pool: PgPool,
}

impl RouteFinder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The document's current route with its stages and audit trail
    pub async fn find_route(&self, document_id: i64) -> Result<RouteDetails> {
        let document = Document::find_by_id(&self.pool, document_id)
            .await?
            .ok_or_else(|| DocRouteError::NotFound(format!("Document {document_id}")))?;

        let route_id = document.current_route_id.ok_or_else(|| {
            DocRouteError::NotFound(format!("Document {document_id} has no route"))
        })?;
        let route = Route::find_by_id(&self.pool, route_id)
            .await?
            .ok_or_else(|| DocRouteError::NotFound(format!("Route {route_id}")))?;

        let stages = Stage::find_by_route(&self.pool, route_id).await?;
        let actions = StageAction::find_by_route(&self.pool, route_id).await?;

        Ok(RouteDetails {
            route,
            stages,
            actions,
        })
    }
}
