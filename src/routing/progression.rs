//! # Progression planner
//!
//! Pure decision logic for what happens to a route after a stage approval.
//! The planner works on in-memory stage snapshots and returns a plan of
//! stage ids to skip, stage ids to activate, and whether the route is
//! exhausted. The action executor applies the plan inside the same
//! transaction that recorded the approval, over rows it already holds
//! locks on, so the decision can stay side-effect free here.

use serde::{Deserialize, Serialize};

use crate::models::CompletionPolicy;
use crate::state_machine::StageState;

/// Minimal stage view the planner needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub stage_id: i64,
    pub order_no: i32,
    pub group_no: Option<i32>,
    pub state: StageState,
}

/// Outcome of running the progression algorithm after one approval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressionPlan {
    /// Open any-of siblings resolved by the winning approval
    pub skip: Vec<i64>,
    /// Pending stages of the next cohort to flip to in_progress
    pub activate: Vec<i64>,
    /// No cohort remains: route completes and the document is approved
    pub route_exhausted: bool,
}

impl ProgressionPlan {
    /// The cohort is not yet fully resolved; nothing to apply
    pub fn is_waiting(&self) -> bool {
        self.skip.is_empty() && self.activate.is_empty() && !self.route_exhausted
    }
}

/// Stages that became active together: same order position and, for
/// parallel policies, the same group number.
fn same_cohort(a: &StageSnapshot, b: &StageSnapshot, policy: CompletionPolicy) -> bool {
    a.order_no == b.order_no
        && (policy == CompletionPolicy::Sequential || a.group_no == b.group_no)
}

/// The cohort activated at submission: the minimum order position, narrowed
/// to the minimum group number for non-sequential policies. `None` groups
/// sort before numbered groups.
pub fn initial_cohort(stages: &[StageSnapshot], policy: CompletionPolicy) -> Vec<i64> {
    let Some(min_order) = stages.iter().map(|s| s.order_no).min() else {
        return Vec::new();
    };

    let at_order: Vec<&StageSnapshot> =
        stages.iter().filter(|s| s.order_no == min_order).collect();

    match policy {
        CompletionPolicy::Sequential => at_order.iter().map(|s| s.stage_id).collect(),
        CompletionPolicy::ParallelAllOf | CompletionPolicy::ParallelAnyOf => {
            let min_group = at_order.iter().map(|s| s.group_no).min().flatten();
            at_order
                .iter()
                .filter(|s| s.group_no == min_group)
                .map(|s| s.stage_id)
                .collect()
        }
    }
}

/// Run the progression algorithm after `approved_stage_id` was approved.
///
/// The planner applies the approval to its own working copy, so callers may
/// pass snapshots taken before or after persisting the acted stage's state.
pub fn plan_after_approval(
    stages: &[StageSnapshot],
    approved_stage_id: i64,
    policy: CompletionPolicy,
) -> ProgressionPlan {
    let mut working: Vec<StageSnapshot> = stages.to_vec();
    let Some(approved) = working
        .iter_mut()
        .find(|s| s.stage_id == approved_stage_id)
    else {
        return ProgressionPlan::default();
    };
    approved.state = StageState::Approved;
    let approved = approved.clone();

    let mut plan = ProgressionPlan::default();

    // First approval wins under any-of: open cohort siblings are skipped,
    // never approved or rejected on the winner's behalf.
    if policy == CompletionPolicy::ParallelAnyOf {
        for stage in working.iter_mut() {
            if stage.stage_id != approved.stage_id
                && same_cohort(stage, &approved, policy)
                && stage.state.is_open()
            {
                plan.skip.push(stage.stage_id);
                stage.state = StageState::Skipped;
            }
        }
    }

    // The acted stage's own cohort must fully resolve before anything new
    // activates. Under any-of the winning approval already skipped its open
    // siblings above, so the cohort reads as resolved here. Open stages in
    // OTHER cohorts never block: a sibling group at the same order position
    // is the next cohort, not part of this one.
    let cohort_unresolved = working
        .iter()
        .any(|s| same_cohort(s, &approved, policy) && s.state.is_open());
    if cohort_unresolved {
        return plan;
    }

    // Find the next cohort among stages still open
    let next_order = working
        .iter()
        .filter(|s| s.state.is_open())
        .map(|s| s.order_no)
        .min();

    let Some(next_order) = next_order else {
        plan.route_exhausted = true;
        return plan;
    };

    let open_at_order: Vec<&StageSnapshot> = working
        .iter()
        .filter(|s| s.order_no == next_order && s.state.is_open())
        .collect();

    let cohort: Vec<&StageSnapshot> = match policy {
        CompletionPolicy::Sequential => open_at_order,
        CompletionPolicy::ParallelAllOf | CompletionPolicy::ParallelAnyOf => {
            let min_group = open_at_order.iter().map(|s| s.group_no).min().flatten();
            open_at_order
                .into_iter()
                .filter(|s| s.group_no == min_group)
                .collect()
        }
    };

    plan.activate = cohort
        .iter()
        .filter(|s| s.state == StageState::Pending)
        .map(|s| s.stage_id)
        .collect();

    plan
}
