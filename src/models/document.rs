use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use std::fmt;

use crate::error::{DocRouteError, Result};
use crate::models::registration_counter::RegistrationCounter;
use crate::state_machine::DocumentStatus;

/// Document kinds handled by the routing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Incoming,
    Outgoing,
    Internal,
    Order,
    Resolution,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "incoming"),
            Self::Outgoing => write!(f, "outgoing"),
            Self::Internal => write!(f, "internal"),
            Self::Order => write!(f, "order"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Self::Incoming),
            "outgoing" => Ok(Self::Outgoing),
            "internal" => Ok(Self::Internal),
            "order" => Ok(Self::Order),
            "resolution" => Ok(Self::Resolution),
            _ => Err(format!("Invalid document type: {s}")),
        }
    }
}

/// Document owns identity, lifecycle status, and the pointer to its current route.
/// Maps to `docroute_documents` table.
///
/// Invariant: `status == in_route` holds exactly when `current_route_id` is
/// non-null and that route is `active`. Historical routes accumulate; the
/// pointer always names the latest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub document_id: i64,
    pub document_type: String,
    pub title: String,
    pub status: String,
    pub department_id: i64,
    pub created_by: i64,
    pub registration_number: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub current_route_id: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Document for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub document_type: DocumentType,
    pub title: String,
    pub department_id: i64,
    pub created_by: i64,
    pub due_at: Option<DateTime<Utc>>,
}

const DOCUMENT_COLUMNS: &str = "document_id, document_type, title, status, department_id, \
     created_by, registration_number, due_at, current_route_id, approved_at, rejected_at, \
     archived_at, created_at, updated_at";

impl Document {
    /// Create a new document in `draft` status
    pub async fn create(
        executor: impl PgExecutor<'_>,
        new_document: NewDocument,
    ) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO docroute_documents (document_type, title, status, department_id, created_by, due_at)
            VALUES ($1, $2, 'draft', $3, $4, $5)
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(new_document.document_type.to_string())
        .bind(new_document.title)
        .bind(new_document.department_id)
        .bind(new_document.created_by)
        .bind(new_document.due_at)
        .fetch_one(executor)
        .await?;

        Ok(document)
    }

    /// Find a document by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM docroute_documents
            WHERE document_id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(document)
    }

    /// Find the document a route belongs to
    pub async fn find_by_route_id(
        executor: impl PgExecutor<'_>,
        route_id: i64,
    ) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM docroute_documents
            WHERE document_id = (SELECT document_id FROM docroute_routes WHERE route_id = $1)
            "#,
        ))
        .bind(route_id)
        .fetch_optional(executor)
        .await?;

        Ok(document)
    }

    /// Find a document by ID, taking a row lock. Concurrent submissions and
    /// overrides against the same document serialize on this lock.
    pub async fn find_by_id_locked(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM docroute_documents
            WHERE document_id = $1
            FOR UPDATE
            "#,
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(document)
    }

    /// Parse the persisted status column
    pub fn document_status(&self) -> Result<DocumentStatus> {
        self.status
            .parse()
            .map_err(|_| DocRouteError::StateTransition(format!("Invalid status in database: {}", self.status)))
    }

    /// Point the document at a freshly created active route. Clears any prior
    /// approval/rejection timestamps left behind by earlier routes.
    pub async fn set_in_route(
        executor: impl PgExecutor<'_>,
        document_id: i64,
        route_id: i64,
    ) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE docroute_documents
            SET status = 'in_route',
                current_route_id = $2,
                approved_at = NULL,
                rejected_at = NULL,
                updated_at = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(document_id)
        .bind(route_id)
        .fetch_one(executor)
        .await?;

        Ok(document)
    }

    /// Record a terminal routing outcome on the document. The matching
    /// timestamp column is stamped for approved/rejected outcomes.
    pub async fn set_route_outcome(
        executor: impl PgExecutor<'_>,
        document_id: i64,
        status: DocumentStatus,
        at: DateTime<Utc>,
    ) -> Result<Document> {
        let (approved_at, rejected_at) = match status {
            DocumentStatus::Approved => (Some(at), None),
            DocumentStatus::Rejected => (None, Some(at)),
            _ => (None, None),
        };

        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE docroute_documents
            SET status = $2,
                approved_at = COALESCE($3, approved_at),
                rejected_at = COALESCE($4, rejected_at),
                updated_at = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(document_id)
        .bind(status.to_string())
        .bind(approved_at)
        .bind(rejected_at)
        .fetch_one(executor)
        .await?;

        Ok(document)
    }

    /// Assign the document its external registration number.
    ///
    /// The per-(department, type, year) counter row serializes concurrent
    /// registrations, so two simultaneous calls can never produce the same
    /// number. Fails with a conflict error if the document is already
    /// registered.
    pub async fn register(pool: &PgPool, document_id: i64) -> Result<Document> {
        let mut tx = pool.begin().await?;

        let document = Self::find_by_id(&mut *tx, document_id)
            .await?
            .ok_or_else(|| DocRouteError::NotFound(format!("Document {document_id}")))?;

        if document.registration_number.is_some() {
            return Err(DocRouteError::Conflict(format!(
                "Document {document_id} is already registered"
            )));
        }

        let year = Utc::now().year();
        let sequence = RegistrationCounter::allocate(
            &mut tx,
            document.department_id,
            &document.document_type,
            year,
        )
        .await?;

        let number = format!("{}-{}/{}", document.department_id, year, sequence);

        let registered = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE docroute_documents
            SET registration_number = $2,
                updated_at = NOW()
            WHERE document_id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(document_id)
        .bind(&number)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_round_trip() {
        assert_eq!("order".parse::<DocumentType>().unwrap(), DocumentType::Order);
        assert_eq!(DocumentType::Resolution.to_string(), "resolution");
        assert!("memo".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_status_parse_helper() {
        let doc = Document {
            document_id: 1,
            document_type: "internal".to_string(),
            title: "Test".to_string(),
            status: "in_route".to_string(),
            department_id: 10,
            created_by: 5,
            registration_number: None,
            due_at: None,
            current_route_id: Some(7),
            approved_at: None,
            rejected_at: None,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(doc.document_status().unwrap(), DocumentStatus::InRoute);
    }
}
