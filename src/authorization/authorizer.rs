//! # Stage authorizer
//!
//! One authorization predicate per resource kind, taking an actor and a
//! resource descriptor, so the routing engine never inlines role or
//! department conditionals. Direct assignment matching is tried first;
//! failing that, exactly one level of delegation may satisfy the match,
//! in which case the action proceeds *as the delegator* and the audit
//! record carries the on-behalf-of attribution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use super::permissions::Permission;
use super::roles::UserRole;
use crate::error::{DocRouteError, Result};
use crate::models::{Assignee, Delegation, User};

/// Resolved acting identity used by authorization predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: UserRole,
    pub department_id: Option<i64>,
    pub active: bool,
}

impl Actor {
    /// Build an actor from a user record, rejecting unknown role strings
    pub fn from_user(user: &User) -> Result<Actor> {
        let role = user
            .role
            .parse()
            .map_err(|_| DocRouteError::Authorization(format!("Unknown role: {}", user.role)))?;

        Ok(Actor {
            user_id: user.user_id,
            role,
            department_id: user.department_id,
            active: user.active,
        })
    }
}

/// A delegation paired with its delegator's resolved identity, which the
/// assignment match needs (a role-assigned stage is satisfied when the
/// *delegator* holds the role).
#[derive(Debug, Clone)]
pub struct DelegationContext {
    pub delegation: Delegation,
    pub delegator: Actor,
}

/// Successful authorization outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub acted_by: i64,
    /// Delegator the action is executed on behalf of, when delegated
    pub on_behalf_of: Option<i64>,
}

/// Whether the actor directly satisfies the stage assignment
pub fn direct_match(actor: &Actor, assignee: &Assignee) -> bool {
    if actor.role.is_global() {
        return true;
    }

    match assignee {
        Assignee::User { user_id } => actor.user_id == *user_id,
        Assignee::Role { role, .. } => actor.role.to_string() == *role,
        Assignee::DepartmentHead { department_id } => {
            actor.role.is_department_manager() && actor.department_id == Some(*department_id)
        }
    }
}

/// Authorize an actor to execute an action on a stage.
///
/// `stage_department` is the department context the delegation scope is
/// checked against (the assignee's department where one applies, otherwise
/// the document's owning department). `delegations` must already be filtered
/// to active records naming this actor as delegate; window, scope, and
/// permission-subset checks happen here. One level only: an actor already
/// operating under a delegation cannot apply a second one, which is why the
/// delegator match uses `direct_match` rather than recursing.
pub fn authorize_stage_action(
    actor: &Actor,
    assignee: &Assignee,
    stage_department: Option<i64>,
    required: Permission,
    delegations: &[DelegationContext],
    now: DateTime<Utc>,
) -> Result<Grant> {
    if !actor.active {
        return Err(DocRouteError::Authorization(format!(
            "User {} is not active",
            actor.user_id
        )));
    }

    if direct_match(actor, assignee) {
        return Ok(Grant {
            acted_by: actor.user_id,
            on_behalf_of: None,
        });
    }

    for ctx in delegations {
        let delegation = &ctx.delegation;

        if delegation.delegate_id != actor.user_id {
            continue;
        }
        if !delegation.in_window(now) {
            continue;
        }
        if !delegation.covers_department(stage_department) {
            continue;
        }
        if !delegation
            .permissions
            .iter()
            .any(|p| p == required.as_str())
        {
            continue;
        }
        if !ctx.delegator.active {
            continue;
        }

        if direct_match(&ctx.delegator, assignee) {
            debug!(
                delegation_id = delegation.delegation_id,
                delegate_id = actor.user_id,
                delegator_id = ctx.delegator.user_id,
                "Stage action authorized via delegation"
            );
            return Ok(Grant {
                acted_by: actor.user_id,
                on_behalf_of: Some(ctx.delegator.user_id),
            });
        }
    }

    Err(DocRouteError::Authorization(format!(
        "Stage is not assigned to user {} and no applicable delegation exists",
        actor.user_id
    )))
}

/// Authorize a force-termination of an active route.
///
/// Global roles pass unconditionally. Department managers must have prior
/// participation on the document: they created it or appear as an actor in
/// its created/submitted/forwarded history. Membership alone is not enough.
pub fn authorize_override(
    actor: &Actor,
    document_created_by: i64,
    participated: bool,
) -> Result<()> {
    if !actor.active {
        return Err(DocRouteError::Authorization(format!(
            "User {} is not active",
            actor.user_id
        )));
    }

    if actor.role.is_global() {
        return Ok(());
    }

    if actor.role.is_department_manager()
        && (actor.user_id == document_created_by || participated)
    {
        return Ok(());
    }

    Err(DocRouteError::Authorization(format!(
        "User {} may not override this route",
        actor.user_id
    )))
}

/// Database-backed authorizer that loads the actor and applicable
/// delegations, then defers to the pure predicates.
#[derive(Clone)]
pub struct StageAuthorizer {
    pool: PgPool,
}

impl StageAuthorizer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the acting user and their live delegation contexts as of `now`
    pub async fn resolve_actor(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(Actor, Vec<DelegationContext>)> {
        let user = User::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| DocRouteError::NotFound(format!("User {user_id}")))?;
        let actor = Actor::from_user(&user)?;

        let mut contexts = Vec::new();
        for delegation in Delegation::find_applicable(&self.pool, user_id, now).await? {
            let Some(delegator) = User::find_by_id(&self.pool, delegation.delegator_id).await?
            else {
                debug!(
                    delegation_id = delegation.delegation_id,
                    delegator_id = delegation.delegator_id,
                    "Skipping delegation with missing delegator"
                );
                continue;
            };
            contexts.push(DelegationContext {
                delegation,
                delegator: Actor::from_user(&delegator)?,
            });
        }

        Ok((actor, contexts))
    }
}
