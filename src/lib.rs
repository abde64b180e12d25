#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # DocRoute Core
//!
//! Document routing and approval engine: multi-step routes with role-,
//! department-, and delegation-aware authorization, privileged overrides,
//! and a scheduled deadline-alert processor.
//!
//! ## Overview
//!
//! A document is submitted to a *route*: an ordered, optionally grouped
//! list of *stages*. Stages sharing an order position (and, for parallel
//! policies, a group number) form a *cohort* that activates together. Each
//! stage action runs inside one atomic transaction: authorization, the
//! stage transition, the immutable audit record, and the progression
//! algorithm that activates the next cohort or completes the route.
//!
//! ## Module Organization
//!
//! - [`models`] - Data layer: documents, routes, stages, actions, delegations, alerts
//! - [`state_machine`] - Document/route/stage states and the action transition table
//! - [`routing`] - Route submission, stage-action execution, progression, override
//! - [`authorization`] - Roles, permissions, and the delegation-aware authorizer
//! - [`alerts`] - Deadline classification, alert processor, single-flight scheduler
//! - [`scopes`] - Composable stage query scopes
//! - [`config`] - Process configuration
//! - [`error`] - Error taxonomy shared by all operations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docroute_core::config::AlertConfig;
//! use docroute_core::engine::DocRouteEngine;
//!
//! # async fn example(pool: sqlx::PgPool) -> docroute_core::error::Result<()> {
//! let engine = DocRouteEngine::new(pool, AlertConfig::default());
//! let scan = engine.process_deadline_alerts().await?;
//! println!("scanned {} stages", scan.stages_scanned);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod authorization;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod routing;
pub mod scopes;
pub mod state_machine;

pub use config::{AlertConfig, DocRouteConfig};
pub use engine::DocRouteEngine;
pub use error::{DocRouteError, Result};
