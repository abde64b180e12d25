// Authorization module: role taxonomy, permission wire strings, and the
// delegation-aware predicates gating stage actions and overrides.

pub mod authorizer;
pub mod permissions;
pub mod roles;

pub use authorizer::{
    authorize_override, authorize_stage_action, direct_match, Actor, DelegationContext, Grant,
    StageAuthorizer,
};
pub use permissions::Permission;
pub use roles::UserRole;
