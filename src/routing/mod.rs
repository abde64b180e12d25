//! # Route & Stage Engine
//!
//! Creates routes for documents, advances stages on action, and decides when
//! a route, and therefore its document, reaches a terminal state. Every
//! mutating entry point runs inside one transaction against row-locked
//! state, so partial progress is never visible.

pub mod action_executor;
pub mod override_executor;
pub mod progression;
pub mod route_finder;
pub mod route_submitter;
pub mod types;

pub use action_executor::StageActionExecutor;
pub use override_executor::{OverrideAction, OverrideExecutor};
pub use progression::{initial_cohort, plan_after_approval, ProgressionPlan, StageSnapshot};
pub use route_finder::RouteFinder;
pub use route_submitter::RouteSubmitter;
pub use types::{
    ActionOutcome, OverrideOutcome, RequestProvenance, RouteDetails, RouteSource,
    StageActionRequest, StageSpec, SubmitOutcome, SubmitRequest,
};
