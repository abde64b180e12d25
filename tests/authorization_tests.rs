//! Authorization scenarios exercised through the pure predicates: direct
//! assignment matching, delegation grants with on-behalf-of attribution,
//! and the override eligibility matrix.

use chrono::{Duration, Utc};

use docroute_core::authorization::{
    authorize_override, authorize_stage_action, direct_match, Actor, DelegationContext, Grant,
    Permission, UserRole,
};
use docroute_core::error::DocRouteError;
use docroute_core::models::{Assignee, Delegation};

fn actor(user_id: i64, role: UserRole, department_id: Option<i64>) -> Actor {
    Actor {
        user_id,
        role,
        department_id,
        active: true,
    }
}

fn delegation(
    delegation_id: i64,
    delegator: &Actor,
    delegate_id: i64,
    department_id: Option<i64>,
    permissions: &[&str],
) -> DelegationContext {
    let now = Utc::now();
    DelegationContext {
        delegation: Delegation {
            delegation_id,
            delegator_id: delegator.user_id,
            delegate_id,
            department_id,
            valid_from: now - Duration::days(1),
            valid_to: now + Duration::days(1),
            permissions: permissions.iter().map(|p| (*p).to_string()).collect(),
            status: "active".to_string(),
            created_at: now,
        },
        delegator: delegator.clone(),
    }
}

#[test]
fn test_role_assigned_stage_matches_any_holder_of_the_role() {
    let assignee = Assignee::Role {
        role: "clerk".to_string(),
        department_id: Some(4),
    };

    let clerk = actor(11, UserRole::Clerk, Some(4));
    let grant = authorize_stage_action(
        &clerk,
        &assignee,
        Some(4),
        Permission::ExecuteRouteStage,
        &[],
        Utc::now(),
    )
    .unwrap();
    assert_eq!(
        grant,
        Grant {
            acted_by: 11,
            on_behalf_of: None
        }
    );

    let employee = actor(12, UserRole::Employee, Some(4));
    assert!(matches!(
        authorize_stage_action(
            &employee,
            &assignee,
            Some(4),
            Permission::ExecuteRouteStage,
            &[],
            Utc::now(),
        ),
        Err(DocRouteError::Authorization(_))
    ));
}

#[test]
fn test_department_head_stage_requires_manager_of_that_department() {
    let assignee = Assignee::DepartmentHead { department_id: 2 };

    let right_manager = actor(21, UserRole::DepartmentManager, Some(2));
    assert!(direct_match(&right_manager, &assignee));

    let wrong_manager = actor(22, UserRole::DepartmentManager, Some(3));
    assert!(!direct_match(&wrong_manager, &assignee));
}

#[test]
fn test_admin_bypasses_assignment_matching() {
    let admin = actor(1, UserRole::Admin, None);
    let grant = authorize_stage_action(
        &admin,
        &Assignee::User { user_id: 555 },
        Some(9),
        Permission::ExecuteRouteStage,
        &[],
        Utc::now(),
    )
    .unwrap();
    assert_eq!(grant.on_behalf_of, None);
}

#[test]
fn test_delegated_action_carries_on_behalf_of_attribution() {
    let delegator = actor(30, UserRole::DepartmentManager, Some(5));
    let delegate = actor(31, UserRole::Employee, Some(5));
    let ctx = delegation(1, &delegator, 31, Some(5), &["route.stage.execute"]);

    let grant = authorize_stage_action(
        &delegate,
        &Assignee::DepartmentHead { department_id: 5 },
        Some(5),
        Permission::ExecuteRouteStage,
        &[ctx],
        Utc::now(),
    )
    .unwrap();

    assert_eq!(grant.acted_by, 31);
    assert_eq!(grant.on_behalf_of, Some(30));
}

#[test]
fn test_unscoped_delegation_covers_any_department() {
    let delegator = actor(30, UserRole::Clerk, Some(5));
    let delegate = actor(31, UserRole::Employee, Some(6));
    let ctx = delegation(1, &delegator, 31, None, &["route.stage.execute"]);

    let grant = authorize_stage_action(
        &delegate,
        &Assignee::Role {
            role: "clerk".to_string(),
            department_id: None,
        },
        Some(8),
        Permission::ExecuteRouteStage,
        &[ctx],
        Utc::now(),
    )
    .unwrap();
    assert_eq!(grant.on_behalf_of, Some(30));
}

#[test]
fn test_delegation_does_not_chain() {
    // A delegated to B, B delegated to C. C acting on A's stage finds no
    // grant: B's delegation from A cannot be exercised through C.
    let a = actor(40, UserRole::Employee, Some(1));
    let b = actor(41, UserRole::Employee, Some(1));
    let c = actor(42, UserRole::Employee, Some(1));

    let b_from_a = delegation(1, &a, b.user_id, Some(1), &["route.stage.execute"]);
    let c_from_b = delegation(2, &b, c.user_id, Some(1), &["route.stage.execute"]);

    let result = authorize_stage_action(
        &c,
        &Assignee::User { user_id: a.user_id },
        Some(1),
        Permission::ExecuteRouteStage,
        &[b_from_a, c_from_b],
        Utc::now(),
    );

    assert!(matches!(result, Err(DocRouteError::Authorization(_))));
}

#[test]
fn test_inactive_delegator_invalidates_the_grant() {
    let mut delegator = actor(30, UserRole::Clerk, Some(5));
    let delegate = actor(31, UserRole::Employee, Some(5));
    delegator.active = false;
    let ctx = delegation(1, &delegator, 31, Some(5), &["route.stage.execute"]);

    let result = authorize_stage_action(
        &delegate,
        &Assignee::User { user_id: 30 },
        Some(5),
        Permission::ExecuteRouteStage,
        &[ctx],
        Utc::now(),
    );

    assert!(matches!(result, Err(DocRouteError::Authorization(_))));
}

#[test]
fn test_delegation_permission_subset_is_literal() {
    let delegator = actor(30, UserRole::Clerk, Some(5));
    let delegate = actor(31, UserRole::Employee, Some(5));
    // Holds submit and override but not stage execution
    let ctx = delegation(
        1,
        &delegator,
        31,
        Some(5),
        &["route.submit", "route.override"],
    );

    let result = authorize_stage_action(
        &delegate,
        &Assignee::User { user_id: 30 },
        Some(5),
        Permission::ExecuteRouteStage,
        &[ctx],
        Utc::now(),
    );
    assert!(matches!(result, Err(DocRouteError::Authorization(_))));
}

#[test]
fn test_direct_assignment_wins_over_delegation() {
    // The actor is both directly assigned and holds a delegation; the grant
    // must carry no on-behalf-of attribution.
    let delegator = actor(30, UserRole::Employee, Some(5));
    let delegate = actor(31, UserRole::Employee, Some(5));
    let ctx = delegation(1, &delegator, 31, Some(5), &["route.stage.execute"]);

    let grant = authorize_stage_action(
        &delegate,
        &Assignee::User { user_id: 31 },
        Some(5),
        Permission::ExecuteRouteStage,
        &[ctx],
        Utc::now(),
    )
    .unwrap();
    assert_eq!(grant.on_behalf_of, None);
}

#[test]
fn test_override_eligibility_matrix() {
    let admin = actor(1, UserRole::Admin, None);
    let manager = actor(2, UserRole::DepartmentManager, Some(1));
    let clerk = actor(3, UserRole::Clerk, Some(1));
    let employee = actor(4, UserRole::Employee, Some(1));

    // Admins always pass
    assert!(authorize_override(&admin, 99, false).is_ok());

    // Managers need creatorship or recorded participation
    assert!(authorize_override(&manager, manager.user_id, false).is_ok());
    assert!(authorize_override(&manager, 99, true).is_ok());
    assert!(authorize_override(&manager, 99, false).is_err());

    // Clerks and employees never override, participation or not
    assert!(authorize_override(&clerk, clerk.user_id, true).is_err());
    assert!(authorize_override(&employee, employee.user_id, true).is_err());
}
