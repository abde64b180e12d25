//! Progression algorithm invariants and full-route walkthroughs, driven
//! entirely through in-memory stage snapshots.

use proptest::prelude::*;

use docroute_core::models::CompletionPolicy;
use docroute_core::routing::{initial_cohort, plan_after_approval, ProgressionPlan, StageSnapshot};
use docroute_core::state_machine::StageState;

fn snapshot(stage_id: i64, order_no: i32, group_no: Option<i32>, state: StageState) -> StageSnapshot {
    StageSnapshot {
        stage_id,
        order_no,
        group_no,
        state,
    }
}

/// Apply a plan to a snapshot set the way the action executor applies it to
/// locked rows: skips close, activations open.
fn apply_plan(stages: &mut [StageSnapshot], plan: &ProgressionPlan) {
    for stage in stages.iter_mut() {
        if plan.skip.contains(&stage.stage_id) {
            stage.state = StageState::Skipped;
        }
        if plan.activate.contains(&stage.stage_id) {
            stage.state = StageState::InProgress;
        }
    }
}

/// Approve one in-progress stage and run the planner over the result
fn approve(stages: &mut Vec<StageSnapshot>, stage_id: i64, policy: CompletionPolicy) -> ProgressionPlan {
    let stage = stages
        .iter_mut()
        .find(|s| s.stage_id == stage_id)
        .expect("stage exists");
    assert!(stage.state.is_open(), "only open stages accept approvals");
    stage.state = StageState::Approved;

    let plan = plan_after_approval(stages, stage_id, policy);
    apply_plan(stages, &plan);
    plan
}

/// A fresh route layout: n stages with strictly increasing order positions
fn sequential_route(n: i64) -> Vec<StageSnapshot> {
    (1..=n)
        .map(|i| snapshot(i, i as i32, None, StageState::Pending))
        .collect()
}

fn policy_strategy() -> impl Strategy<Value = CompletionPolicy> {
    prop_oneof![
        Just(CompletionPolicy::Sequential),
        Just(CompletionPolicy::ParallelAllOf),
        Just(CompletionPolicy::ParallelAnyOf),
    ]
}

/// Arbitrary stage layouts: ids are unique, orders and groups vary, every
/// stage starts pending or in progress.
fn layout_strategy() -> impl Strategy<Value = Vec<StageSnapshot>> {
    prop::collection::vec((1..5i32, prop::option::of(1..3i32), prop::bool::ANY), 1..8).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (order_no, group_no, open))| {
                    snapshot(
                        i as i64 + 1,
                        order_no,
                        group_no,
                        if open { StageState::InProgress } else { StageState::Pending },
                    )
                })
                .collect()
        },
    )
}

proptest! {
    /// Property: the planner never activates a stage that is not pending
    #[test]
    fn plans_only_activate_pending_stages(stages in layout_strategy(), policy in policy_strategy()) {
        let Some(acted) = stages.iter().find(|s| s.state == StageState::InProgress) else {
            return Ok(());
        };
        let plan = plan_after_approval(&stages, acted.stage_id, policy);
        for id in &plan.activate {
            let stage = stages.iter().find(|s| s.stage_id == *id).unwrap();
            prop_assert_eq!(stage.state, StageState::Pending);
        }
    }

    /// Property: the planner never skips a closed stage or the acted stage
    #[test]
    fn plans_only_skip_open_siblings(stages in layout_strategy(), policy in policy_strategy()) {
        let Some(acted) = stages.iter().find(|s| s.state == StageState::InProgress) else {
            return Ok(());
        };
        let plan = plan_after_approval(&stages, acted.stage_id, policy);
        for id in &plan.skip {
            prop_assert_ne!(*id, acted.stage_id);
            let stage = stages.iter().find(|s| s.stage_id == *id).unwrap();
            prop_assert!(stage.state.is_open());
        }
    }

    /// Property: only the any-of policy ever produces skips
    #[test]
    fn skips_are_exclusive_to_any_of(stages in layout_strategy(), policy in policy_strategy()) {
        let Some(acted) = stages.iter().find(|s| s.state == StageState::InProgress) else {
            return Ok(());
        };
        let plan = plan_after_approval(&stages, acted.stage_id, policy);
        if policy != CompletionPolicy::ParallelAnyOf {
            prop_assert!(plan.skip.is_empty());
        }
    }

    /// Property: all activated stages share one order position, and for
    /// parallel policies one group number.
    #[test]
    fn activations_form_a_single_cohort(stages in layout_strategy(), policy in policy_strategy()) {
        let Some(acted) = stages.iter().find(|s| s.state == StageState::InProgress) else {
            return Ok(());
        };
        let plan = plan_after_approval(&stages, acted.stage_id, policy);
        let activated: Vec<&StageSnapshot> = stages
            .iter()
            .filter(|s| plan.activate.contains(&s.stage_id))
            .collect();
        if let Some(first) = activated.first() {
            for stage in &activated {
                prop_assert_eq!(stage.order_no, first.order_no);
                if policy != CompletionPolicy::Sequential {
                    prop_assert_eq!(stage.group_no, first.group_no);
                }
            }
        }
    }

    /// Property: an exhausted route reports no further work
    #[test]
    fn exhaustion_excludes_activations(stages in layout_strategy(), policy in policy_strategy()) {
        let Some(acted) = stages.iter().find(|s| s.state == StageState::InProgress) else {
            return Ok(());
        };
        let plan = plan_after_approval(&stages, acted.stage_id, policy);
        if plan.route_exhausted {
            prop_assert!(plan.activate.is_empty());
        }
    }

    /// Property: approving stages of a single-stage-per-order route in order
    /// visits every stage exactly once and then exhausts.
    #[test]
    fn sequential_routes_terminate_in_order(n in 1..7i64) {
        let mut stages = sequential_route(n);
        let first = initial_cohort(&stages, CompletionPolicy::Sequential);
        apply_plan(&mut stages, &ProgressionPlan {
            skip: vec![],
            activate: first,
            route_exhausted: false,
        });

        for expected in 1..=n {
            let open: Vec<i64> = stages
                .iter()
                .filter(|s| s.state == StageState::InProgress)
                .map(|s| s.stage_id)
                .collect();
            prop_assert_eq!(&open, &vec![expected], "exactly one stage active at a time");

            let plan = approve(&mut stages, expected, CompletionPolicy::Sequential);
            if expected == n {
                prop_assert!(plan.route_exhausted);
            } else {
                prop_assert_eq!(&plan.activate, &vec![expected + 1]);
            }
        }

        prop_assert!(stages.iter().all(|s| s.state == StageState::Approved));
    }
}

#[test]
fn test_two_stage_sequential_route_walkthrough() {
    let mut stages = vec![
        snapshot(1, 1, None, StageState::Pending),
        snapshot(2, 2, None, StageState::Pending),
    ];

    let first = initial_cohort(&stages, CompletionPolicy::Sequential);
    assert_eq!(first, vec![1]);
    stages[0].state = StageState::InProgress;

    let plan = approve(&mut stages, 1, CompletionPolicy::Sequential);
    assert_eq!(plan.activate, vec![2]);
    assert!(!plan.route_exhausted);
    assert_eq!(stages[1].state, StageState::InProgress);

    let plan = approve(&mut stages, 2, CompletionPolicy::Sequential);
    assert!(plan.route_exhausted);
}

#[test]
fn test_any_of_winner_skips_losers_and_route_completes() {
    let mut stages = vec![
        snapshot(1, 1, Some(1), StageState::Pending),
        snapshot(2, 1, Some(1), StageState::Pending),
        snapshot(3, 1, Some(1), StageState::Pending),
    ];

    let first = initial_cohort(&stages, CompletionPolicy::ParallelAnyOf);
    assert_eq!(first, vec![1, 2, 3]);
    for stage in stages.iter_mut() {
        stage.state = StageState::InProgress;
    }

    let plan = approve(&mut stages, 2, CompletionPolicy::ParallelAnyOf);
    assert_eq!(plan.skip, vec![1, 3]);
    assert!(plan.route_exhausted);
    assert_eq!(stages[0].state, StageState::Skipped);
    assert_eq!(stages[1].state, StageState::Approved);
    assert_eq!(stages[2].state, StageState::Skipped);
}

#[test]
fn test_all_of_route_needs_every_cohort_member() {
    let mut stages = vec![
        snapshot(1, 1, Some(1), StageState::Pending),
        snapshot(2, 1, Some(1), StageState::Pending),
        snapshot(3, 2, Some(1), StageState::Pending),
    ];

    let first = initial_cohort(&stages, CompletionPolicy::ParallelAllOf);
    apply_plan(
        &mut stages,
        &ProgressionPlan {
            skip: vec![],
            activate: first,
            route_exhausted: false,
        },
    );
    assert_eq!(stages[0].state, StageState::InProgress);
    assert_eq!(stages[1].state, StageState::InProgress);
    assert_eq!(stages[2].state, StageState::Pending);

    let plan = approve(&mut stages, 1, CompletionPolicy::ParallelAllOf);
    assert!(plan.is_waiting(), "one approval is not enough for all-of");

    let plan = approve(&mut stages, 2, CompletionPolicy::ParallelAllOf);
    assert_eq!(plan.activate, vec![3]);

    let plan = approve(&mut stages, 3, CompletionPolicy::ParallelAllOf);
    assert!(plan.route_exhausted);
}

#[test]
fn test_parallel_groups_advance_within_one_order_position() {
    // Two groups at order 1, then a final stage at order 2
    let mut stages = vec![
        snapshot(1, 1, Some(1), StageState::Pending),
        snapshot(2, 1, Some(2), StageState::Pending),
        snapshot(3, 2, Some(1), StageState::Pending),
    ];

    let first = initial_cohort(&stages, CompletionPolicy::ParallelAllOf);
    assert_eq!(first, vec![1], "first cohort is the minimum group only");
    stages[0].state = StageState::InProgress;

    let plan = approve(&mut stages, 1, CompletionPolicy::ParallelAllOf);
    assert_eq!(plan.activate, vec![2], "next group at the same order goes first");

    let plan = approve(&mut stages, 2, CompletionPolicy::ParallelAllOf);
    assert_eq!(plan.activate, vec![3]);

    let plan = approve(&mut stages, 3, CompletionPolicy::ParallelAllOf);
    assert!(plan.route_exhausted);
}
