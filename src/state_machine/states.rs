use serde::{Deserialize, Serialize};
use std::fmt;

/// Document lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Initial state when document is created
    Draft,
    /// Document is travelling through an active route
    InRoute,
    /// Route completed successfully
    Approved,
    /// Route was rejected at some stage
    Rejected,
    /// Route was returned to the author for revision
    ReturnedForRevision,
    /// Document was archived
    Archived,
}

impl DocumentStatus {
    /// Check if the document may be (re)submitted to a route
    pub fn can_submit(&self) -> bool {
        matches!(self, Self::Draft | Self::ReturnedForRevision)
    }

    /// Check if the document is currently in an active route
    pub fn is_in_route(&self) -> bool {
        matches!(self, Self::InRoute)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::InRoute => write!(f, "in_route"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::ReturnedForRevision => write!(f, "returned_for_revision"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "in_route" => Ok(Self::InRoute),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "returned_for_revision" => Ok(Self::ReturnedForRevision),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Invalid document status: {s}")),
        }
    }
}

/// Route lifecycle states. Every state except `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    /// Route has open stages and accepts stage actions
    Active,
    /// All cohorts resolved successfully (or force-approved)
    Completed,
    /// A stage was rejected (or force-rejected)
    Rejected,
    /// A stage returned the document for revision
    Returned,
    /// Route was cancelled before resolution
    Cancelled,
}

impl RouteState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Rejected => write!(f, "rejected"),
            Self::Returned => write!(f, "returned"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for RouteState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "returned" => Ok(Self::Returned),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid route state: {s}")),
        }
    }
}

/// Stage lifecycle states. `Pending` and `InProgress` are the only open states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Created but its cohort has not been activated yet
    Pending,
    /// Cohort is active, awaiting a decision from the assignee
    InProgress,
    /// Assignee approved
    Approved,
    /// Assignee rejected
    Rejected,
    /// Assignee returned the document for revision
    Returned,
    /// Closed without a decision (any-of sibling resolution or override)
    Skipped,
    /// Closed by deadline expiry
    Expired,
}

impl StageState {
    /// Check if the stage still accepts actions
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Returned => write!(f, "returned"),
            Self::Skipped => write!(f, "skipped"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for StageState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "returned" => Ok(Self::Returned),
            "skipped" => Ok(Self::Skipped),
            "expired" => Ok(Self::Expired),
            _ => Err(format!("Invalid stage state: {s}")),
        }
    }
}

impl Default for DocumentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl Default for RouteState {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for StageState {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_state_terminal_check() {
        assert!(!RouteState::Active.is_terminal());
        assert!(RouteState::Completed.is_terminal());
        assert!(RouteState::Rejected.is_terminal());
        assert!(RouteState::Returned.is_terminal());
        assert!(RouteState::Cancelled.is_terminal());
    }

    #[test]
    fn test_stage_open_states() {
        assert!(StageState::Pending.is_open());
        assert!(StageState::InProgress.is_open());
        assert!(!StageState::Approved.is_open());
        assert!(!StageState::Skipped.is_open());
        assert!(!StageState::Expired.is_open());
    }

    #[test]
    fn test_document_submit_eligibility() {
        assert!(DocumentStatus::Draft.can_submit());
        assert!(DocumentStatus::ReturnedForRevision.can_submit());
        assert!(!DocumentStatus::InRoute.can_submit());
        assert!(!DocumentStatus::Approved.can_submit());
        assert!(!DocumentStatus::Archived.can_submit());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(DocumentStatus::InRoute.to_string(), "in_route");
        assert_eq!(
            "returned_for_revision".parse::<DocumentStatus>().unwrap(),
            DocumentStatus::ReturnedForRevision
        );
        assert_eq!(StageState::InProgress.to_string(), "in_progress");
        assert_eq!("skipped".parse::<StageState>().unwrap(), StageState::Skipped);
        assert_eq!(RouteState::Returned.to_string(), "returned");
        assert!("bogus".parse::<RouteState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let state = StageState::InProgress;
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let parsed: StageState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
