use serde::{Deserialize, Serialize};
use std::fmt;

use super::states::StageState;

/// Actions an actor can take on a stage. The override kinds are only ever
/// produced by the override executor, never accepted from stage-action callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageActionKind {
    Approved,
    Rejected,
    ReturnedForRevision,
    Commented,
    OverrideApproved,
    OverrideRejected,
}

impl StageActionKind {
    /// Whether this kind may be submitted through `execute_stage_action`
    pub fn is_caller_action(&self) -> bool {
        !matches!(self, Self::OverrideApproved | Self::OverrideRejected)
    }

    /// Whether this action closes the stage
    pub fn is_terminal_action(&self) -> bool {
        !matches!(self, Self::Commented)
    }
}

impl fmt::Display for StageActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::ReturnedForRevision => write!(f, "returned_for_revision"),
            Self::Commented => write!(f, "commented"),
            Self::OverrideApproved => write!(f, "override_approved"),
            Self::OverrideRejected => write!(f, "override_rejected"),
        }
    }
}

impl std::str::FromStr for StageActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "returned_for_revision" => Ok(Self::ReturnedForRevision),
            "commented" => Ok(Self::Commented),
            "override_approved" => Ok(Self::OverrideApproved),
            "override_rejected" => Ok(Self::OverrideRejected),
            _ => Err(format!("Invalid stage action kind: {s}")),
        }
    }
}

/// Error raised for transitions the stage state machine does not allow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    #[error("Invalid transition from {from} via {action}")]
    InvalidTransition { from: String, action: String },
}

/// Determine the stage state an action produces.
///
/// Only open stages accept actions. `Commented` keeps the stage in progress
/// (a comment on a pending stage activates it, matching the audit record's
/// resulting-state field).
pub fn stage_transition(
    current: StageState,
    action: StageActionKind,
) -> Result<StageState, StateMachineError> {
    if !current.is_open() {
        return Err(StateMachineError::InvalidTransition {
            from: current.to_string(),
            action: action.to_string(),
        });
    }

    let target = match action {
        StageActionKind::Approved => StageState::Approved,
        StageActionKind::Rejected => StageState::Rejected,
        StageActionKind::ReturnedForRevision => StageState::Returned,
        StageActionKind::Commented => StageState::InProgress,
        StageActionKind::OverrideApproved | StageActionKind::OverrideRejected => {
            StageState::Skipped
        }
    };

    Ok(target)
}
