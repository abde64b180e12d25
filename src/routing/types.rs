use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Assignee, CompletionPolicy, Route, Stage, StageAction, StageType};
use crate::state_machine::{DocumentStatus, RouteState, StageActionKind, StageState};

/// One requested hop of a route submission. Assignee consistency is enforced
/// by the `Assignee` variants at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub order_no: i32,
    pub group_no: Option<i32>,
    pub stage_type: StageType,
    pub assignee: Assignee,
    pub due_at: Option<DateTime<Utc>>,
}

/// What a submission routes through: an explicit stage list or a template
/// reference that expands into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteSource {
    Stages(Vec<StageSpec>),
    Template { template_id: i64 },
}

/// Caller-supplied request provenance recorded on the audit trail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestProvenance {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of submitting a document to a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub route_id: i64,
    pub version_no: i32,
    pub stage_ids: Vec<i64>,
}

/// Result of executing a stage action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: StageActionKind,
    pub stage_state: StageState,
    pub route_state: RouteState,
    pub document_status: DocumentStatus,
}

/// Result of a force-termination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideOutcome {
    pub document_status: DocumentStatus,
    pub skipped_stages: Vec<i64>,
}

/// A route with its stages and audit trail, as returned by `find_route`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDetails {
    pub route: Route,
    pub stages: Vec<Stage>,
    pub actions: Vec<StageAction>,
}

/// Parameters of a route submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub document_id: i64,
    pub source: RouteSource,
    pub completion_policy: CompletionPolicy,
    pub submitted_by: i64,
}

/// Parameters of a stage action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageActionRequest {
    pub document_id: i64,
    pub stage_id: i64,
    pub action: StageActionKind,
    pub actor_id: i64,
    pub comment: Option<String>,
    pub reason_code: Option<String>,
    #[serde(default)]
    pub provenance: RequestProvenance,
}
