//! Builds the standard task graph and runs tasks through it.

use std::sync::Arc;

use arachne_common::{ArachneError, Result, TaskState};
use arachne_llm::TierSet;
use tracing::info;

use crate::agent::AgentNode;
use crate::builder::{CompiledGraph, EdgeTarget, GraphBuilder, GraphConfig};
use crate::dispatch::{EventSink, ToolDispatcher};
use crate::plan::PlanNode;
use crate::registry::AgentRegistry;
use crate::router::{PLAN_NODE, SOLVE_NODE};
use crate::solve::SolveNode;

/// Assemble the fixed topology: `plan`, one node per registry agent,
/// `solve`, router-driven edges after `plan` and after every agent,
/// and `solve → End`.
pub fn build_task_graph(
    registry: &AgentRegistry,
    tiers: &TierSet,
    dispatcher: Arc<dyn ToolDispatcher>,
    sink: Arc<dyn EventSink>,
    config: GraphConfig,
) -> Result<CompiledGraph> {
    let mut builder = GraphBuilder::new()
        .add_node(Arc::new(PlanNode::new(
            tiers.select(config.planner_tier),
            registry,
            sink.clone(),
        )))
        .add_node(Arc::new(SolveNode::new(
            tiers.select(config.solver_tier),
            sink,
        )))
        .add_conditional_edges(PLAN_NODE)
        .add_edge(SOLVE_NODE, EdgeTarget::End);

    for spec in registry.iter() {
        builder = builder
            .add_node(Arc::new(AgentNode::new(
                spec.clone(),
                tiers.select(spec.tier),
                dispatcher.clone(),
            )))
            .add_conditional_edges(spec.name.clone());
    }

    builder.set_entry_point(PLAN_NODE).compile(config)
}

/// Owns a compiled graph and runs one task at a time through it.
pub struct TaskRunner {
    graph: CompiledGraph,
}

impl TaskRunner {
    pub fn new(
        registry: &AgentRegistry,
        tiers: &TierSet,
        dispatcher: Arc<dyn ToolDispatcher>,
        sink: Arc<dyn EventSink>,
        config: GraphConfig,
    ) -> Result<Self> {
        Ok(Self {
            graph: build_task_graph(registry, tiers, dispatcher, sink, config)?,
        })
    }

    /// Invoke the graph with a fresh state and return the final answer.
    pub async fn run(&self, task: impl Into<String>) -> Result<String> {
        let mut state = TaskState::new(task);
        info!(task_id = %state.id, task = %state.task, "Running task");

        self.graph.invoke(&mut state).await?;

        state
            .result
            .ok_or_else(|| ArachneError::Plan("Graph finished without a result".to_string()))
    }
}
