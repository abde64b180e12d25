//! # Data layer
//!
//! `FromRow` models with direct SQLx query methods, one file per table.
//! State columns persist as strings and parse into the typed enums from
//! [`crate::state_machine`] at the edges.

pub mod alert;
pub mod delegation;
pub mod department;
pub mod document;
pub mod history;
pub mod registration_counter;
pub mod route;
pub mod route_template;
pub mod stage;
pub mod stage_action;
pub mod user;

pub use alert::{Alert, AlertKind};
pub use delegation::{Delegation, DelegationStatus, NewDelegation};
pub use department::Department;
pub use document::{Document, DocumentType, NewDocument};
pub use history::{DocumentHistory, HistoryEvent};
pub use registration_counter::RegistrationCounter;
pub use route::{CompletionPolicy, Route};
pub use route_template::{RouteTemplate, RouteTemplateStage};
pub use stage::{Assignee, NewStage, Stage, StageType};
pub use stage_action::{NewStageAction, StageAction};
pub use user::User;
