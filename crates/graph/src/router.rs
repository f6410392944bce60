//! Shared routing decision for every conditional edge.

use arachne_common::TaskState;

/// Node id of the planning node (the graph entry point).
pub const PLAN_NODE: &str = "plan";

/// Node id of the solver node (the last node before End).
pub const SOLVE_NODE: &str = "solve";

/// Where the traversal goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextNode {
    /// Execute the named agent node for the first unresolved step.
    Agent(String),

    /// Every step has evidence; aggregate the final answer.
    Solve,
}

/// The routing function consulted after `plan` and after every agent
/// node. Pure over the accumulated state.
pub fn route(state: &TaskState) -> NextNode {
    match state.current_step() {
        Some(step) => NextNode::Agent(step.agent.clone()),
        None => NextNode::Solve,
    }
}
