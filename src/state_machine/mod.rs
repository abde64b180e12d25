// State machine module for document routing
//
// Typed document/route/stage states and the stage-action transition table.
// Route and document side effects of a transition live in the routing engine;
// this module only answers "what state does this action produce".

pub mod events;
pub mod states;

// Re-export main types for convenient access
pub use events::{stage_transition, StageActionKind, StateMachineError};
pub use states::{DocumentStatus, RouteState, StageState};
