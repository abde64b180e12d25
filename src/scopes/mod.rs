//! # Query scopes
//!
//! Chainable `QueryBuilder` scopes for stage queries that cut across
//! routes, used by the deadline alert scan. JOINs must be added before
//! WHERE conditions, so scopes that require a join come first in a chain.

pub mod stage;

pub use stage::StageScope;
