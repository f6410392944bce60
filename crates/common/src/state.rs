//! Per-invocation task state threaded through the graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One planned step: which agent runs, with what input, and under which
/// evidence placeholder the result is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Free-text description from the planner
    pub description: String,

    /// Evidence placeholder, e.g. `#E1`. Doubles as the key under which
    /// the step's result is stored and substituted into later inputs.
    pub id: String,

    /// Name of the agent (graph node) that executes this step
    pub agent: String,

    /// Raw tool input, possibly referencing earlier placeholders
    pub input: String,
}

impl PlanStep {
    pub fn new(
        description: impl Into<String>,
        id: impl Into<String>,
        agent: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            id: id.into(),
            agent: agent.into(),
            input: input.into(),
        }
    }
}

/// Accumulated state for a single task invocation.
///
/// Steps and results only ever grow; a fresh value is created per
/// invocation and dropped when it completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskState {
    /// Invocation id, used in logs
    pub id: uuid::Uuid,

    /// The user's task, verbatim
    pub task: String,

    /// Raw planner output
    pub plan_string: String,

    /// Ordered plan steps
    pub steps: Vec<PlanStep>,

    /// Recorded evidence, keyed by step id
    pub results: BTreeMap<String, String>,

    /// Final aggregated answer, set by the solve node
    pub result: Option<String>,
}

impl TaskState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            task: task.into(),
            plan_string: String::new(),
            steps: Vec::new(),
            results: BTreeMap::new(),
            result: None,
        }
    }

    /// The first step without recorded evidence, or `None` once every
    /// step has been resolved.
    pub fn current_step(&self) -> Option<&PlanStep> {
        self.steps.get(self.results.len())
    }

    /// True when a non-empty plan has evidence for every step.
    pub fn all_resolved(&self) -> bool {
        !self.steps.is_empty() && self.results.len() >= self.steps.len()
    }

    /// Record evidence for a step.
    pub fn record_result(&mut self, step_id: impl Into<String>, value: impl Into<String>) {
        self.results.insert(step_id.into(), value.into());
    }

    /// Replace evidence placeholders in `text` with their recorded values.
    ///
    /// Longer ids are substituted first so `#E1` cannot clobber `#E10`.
    pub fn substitute(&self, text: &str) -> String {
        let mut pairs: Vec<(&str, &str)> = self
            .results
            .iter()
            .map(|(id, value)| (id.as_str(), value.as_str()))
            .collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut out = text.to_string();
        for (id, value) in pairs {
            out = out.replace(id, value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step_state() -> TaskState {
        let mut state = TaskState::new("what's 3*6 divided by 2");
        state.steps = vec![
            PlanStep::new("Multiply.", "#E1", "calculate", "3 * 6"),
            PlanStep::new("Halve.", "#E2", "calculate", "#E1 / 2"),
        ];
        state
    }

    #[test]
    fn test_current_step_follows_recorded_results() {
        let mut state = two_step_state();
        assert_eq!(state.current_step().unwrap().id, "#E1");

        state.record_result("#E1", "18");
        assert_eq!(state.current_step().unwrap().id, "#E2");

        state.record_result("#E2", "9");
        assert!(state.current_step().is_none());
        assert!(state.all_resolved());
    }

    #[test]
    fn test_empty_plan_is_not_resolved() {
        let state = TaskState::new("anything");
        assert!(!state.all_resolved());
        assert!(state.current_step().is_none());
    }

    #[test]
    fn test_substitute_replaces_recorded_evidence() {
        let mut state = two_step_state();
        state.record_result("#E1", "18");

        assert_eq!(state.substitute("#E1 / 2"), "18 / 2");
        // Unrecorded placeholders pass through untouched.
        assert_eq!(state.substitute("#E2 + 1"), "#E2 + 1");
    }

    #[test]
    fn test_substitute_prefers_longer_ids() {
        let mut state = TaskState::new("t");
        state.record_result("#E1", "one");
        state.record_result("#E10", "ten");

        assert_eq!(state.substitute("#E10 and #E1"), "ten and one");
    }

    #[test]
    fn test_fresh_state_per_invocation() {
        let a = TaskState::new("a");
        let b = TaskState::new("b");
        assert_ne!(a.id, b.id);
        assert!(a.results.is_empty());
        assert!(a.result.is_none());
    }
}
