use serde::{Deserialize, Serialize};
use std::fmt;

/// Permissions a delegation can carry. Delegations store these as wire
/// strings; a delegation whose subset lacks the permission an action
/// requires is not honored for that action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Execute an action on a route stage
    ExecuteRouteStage,
    /// Submit a document to a route
    SubmitRoute,
    /// Force-terminate an active route
    OverrideRoute,
    /// Trigger the deadline alert processor on demand
    ProcessAlerts,
}

impl Permission {
    /// Wire string stored in delegation permission subsets
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecuteRouteStage => "route.stage.execute",
            Self::SubmitRoute => "route.submit",
            Self::OverrideRoute => "route.override",
            Self::ProcessAlerts => "alerts.process",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_wire_strings() {
        assert_eq!(Permission::ExecuteRouteStage.as_str(), "route.stage.execute");
        assert_eq!(Permission::SubmitRoute.as_str(), "route.submit");
        assert_eq!(Permission::OverrideRoute.as_str(), "route.override");
        assert_eq!(Permission::ProcessAlerts.as_str(), "alerts.process");
    }
}
