use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed role set the engine reasons about.
///
/// `Admin` is the global role: it passes every assignment match and may
/// override any active route. `DepartmentManager` satisfies
/// department-head assignments for its own department and may override
/// only with prior participation on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    DepartmentManager,
    Clerk,
    Employee,
}

impl UserRole {
    /// Global roles pass authorization unconditionally
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Roles that satisfy `department_head` stage assignments
    pub fn is_department_manager(&self) -> bool {
        matches!(self, Self::DepartmentManager)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::DepartmentManager => write!(f, "department_manager"),
            Self::Clerk => write!(f, "clerk"),
            Self::Employee => write!(f, "employee"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "department_manager" => Ok(Self::DepartmentManager),
            "clerk" => Ok(Self::Clerk),
            "employee" => Ok(Self::Employee),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}
