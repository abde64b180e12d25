use thiserror::Error;

/// Crate-level error taxonomy for the routing engine.
///
/// The variants map to distinct caller behaviors: validation errors are safe to
/// retry after correcting input, conflict errors signal a state race and require
/// a re-fetch, authorization errors are never retried automatically, and
/// not-found errors are terminal for the request.
#[derive(Debug, Error)]
pub enum DocRouteError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict error: {0}")]
    Conflict(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("State transition error: {0}")]
    StateTransition(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, DocRouteError>;

impl DocRouteError {
    /// Whether the caller may retry the operation after re-reading current state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DocRouteError::Authorization("stage not assigned to actor".to_string());
        assert_eq!(
            err.to_string(),
            "Authorization error: stage not assigned to actor"
        );
    }

    #[test]
    fn test_retryability() {
        assert!(DocRouteError::Conflict("route already active".into()).is_retryable());
        assert!(!DocRouteError::Authorization("denied".into()).is_retryable());
        assert!(!DocRouteError::Validation("empty stage list".into()).is_retryable());
        assert!(!DocRouteError::NotFound("document 1".into()).is_retryable());
    }
}
