//! Graph assembly and traversal.
//!
//! The engine executes exactly one topology: an entry node, conditional
//! edges resolved by the shared router, and fixed edges ending at
//! [`EdgeTarget::End`]. It is not a general workflow library.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use arachne_common::{ArachneError, Result, TaskState};
use arachne_llm::ModelTier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::router::{route, NextNode, SOLVE_NODE};

/// A node in the task graph. Nodes mutate the shared state additively.
#[async_trait]
pub trait GraphNode: Send + Sync {
    /// Unique node id; agent nodes use their registry name.
    fn id(&self) -> &str;

    async fn run(&self, state: &mut TaskState) -> Result<()>;
}

/// Target of a fixed edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTarget {
    Node(String),
    End,
}

/// Traversal guards and tier assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Upper bound on node executions per invocation
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Per-node execution timeout in milliseconds
    #[serde(default = "default_node_timeout_ms")]
    pub node_timeout_ms: u64,

    /// Tier answering for the planning node
    #[serde(default = "default_planner_tier")]
    pub planner_tier: ModelTier,

    /// Tier answering for the solver node
    #[serde(default = "default_solver_tier")]
    pub solver_tier: ModelTier,
}

fn default_max_hops() -> usize {
    24
}

fn default_node_timeout_ms() -> u64 {
    120_000
}

fn default_planner_tier() -> ModelTier {
    ModelTier::Strong
}

fn default_solver_tier() -> ModelTier {
    ModelTier::Fast
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            node_timeout_ms: default_node_timeout_ms(),
            planner_tier: default_planner_tier(),
            solver_tier: default_solver_tier(),
        }
    }
}

/// Assembles nodes and edges, then validates them into a
/// [`CompiledGraph`].
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<Arc<dyn GraphNode>>,
    conditional: HashSet<String>,
    fixed: HashMap<String, EdgeTarget>,
    entry: Option<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, node: Arc<dyn GraphNode>) -> Self {
        self.nodes.push(node);
        self
    }

    /// After `from` runs, the shared router picks the next node.
    pub fn add_conditional_edges(mut self, from: impl Into<String>) -> Self {
        self.conditional.insert(from.into());
        self
    }

    /// After `from` runs, the traversal always moves to `to`.
    pub fn add_edge(mut self, from: impl Into<String>, to: EdgeTarget) -> Self {
        self.fixed.insert(from.into(), to);
        self
    }

    pub fn set_entry_point(mut self, id: impl Into<String>) -> Self {
        self.entry = Some(id.into());
        self
    }

    /// Validate the assembled topology.
    ///
    /// Rejects duplicate node ids, a missing or unknown entry point, and
    /// edges whose endpoints are not nodes.
    pub fn compile(self, config: GraphConfig) -> Result<CompiledGraph> {
        let mut nodes: HashMap<String, Arc<dyn GraphNode>> = HashMap::new();
        for node in self.nodes {
            let id = node.id().to_string();
            if nodes.insert(id.clone(), node).is_some() {
                return Err(ArachneError::Config(format!("Duplicate graph node: {id}")));
            }
        }

        let entry = self
            .entry
            .ok_or_else(|| ArachneError::Config("Graph has no entry point".to_string()))?;
        if !nodes.contains_key(&entry) {
            return Err(ArachneError::Config(format!(
                "Entry point '{entry}' is not a node"
            )));
        }

        for from in &self.conditional {
            if !nodes.contains_key(from) {
                return Err(ArachneError::Config(format!(
                    "Conditional edge from unknown node '{from}'"
                )));
            }
        }

        for (from, to) in &self.fixed {
            if !nodes.contains_key(from) {
                return Err(ArachneError::Config(format!(
                    "Edge from unknown node '{from}'"
                )));
            }
            if let EdgeTarget::Node(to) = to {
                if !nodes.contains_key(to) {
                    return Err(ArachneError::Config(format!(
                        "Edge to unknown node '{to}'"
                    )));
                }
            }
        }

        Ok(CompiledGraph {
            nodes,
            conditional: self.conditional,
            fixed: self.fixed,
            entry,
            config,
        })
    }
}

/// A validated graph ready to invoke.
pub struct CompiledGraph {
    nodes: HashMap<String, Arc<dyn GraphNode>>,
    conditional: HashSet<String>,
    fixed: HashMap<String, EdgeTarget>,
    entry: String,
    config: GraphConfig,
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("conditional", &self.conditional)
            .field("fixed", &self.fixed)
            .field("entry", &self.entry)
            .field("config", &self.config)
            .finish()
    }
}

impl CompiledGraph {
    /// Run the graph over `state` until a fixed edge reaches End.
    ///
    /// Every node execution is bounded by the configured timeout, and
    /// the whole traversal by the hop limit.
    pub async fn invoke(&self, state: &mut TaskState) -> Result<()> {
        let timeout = Duration::from_millis(self.config.node_timeout_ms);
        let mut current = self.entry.clone();
        let mut hops = 0usize;

        loop {
            hops += 1;
            if hops > self.config.max_hops {
                return Err(ArachneError::Plan(format!(
                    "Traversal exceeded {} hops",
                    self.config.max_hops
                )));
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| ArachneError::Plan(format!("No node named '{current}'")))?;

            debug!(task_id = %state.id, node = %current, hop = hops, "Executing node");

            match tokio::time::timeout(timeout, node.run(state)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ArachneError::Agent(format!(
                        "Node '{current}' timed out after {}ms",
                        self.config.node_timeout_ms
                    )));
                }
            }

            if self.conditional.contains(&current) {
                current = match route(state) {
                    NextNode::Agent(name) => {
                        if !self.nodes.contains_key(&name) {
                            return Err(ArachneError::Plan(format!(
                                "Plan step targets unknown agent: {name}"
                            )));
                        }
                        name
                    }
                    NextNode::Solve => SOLVE_NODE.to_string(),
                };
            } else {
                match self.fixed.get(&current) {
                    Some(EdgeTarget::Node(next)) => current = next.clone(),
                    Some(EdgeTarget::End) => {
                        info!(task_id = %state.id, hops, "Traversal complete");
                        return Ok(());
                    }
                    None => {
                        return Err(ArachneError::Config(format!(
                            "Node '{current}' has no outgoing edge"
                        )));
                    }
                }
            }
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn node_ids(&self) -> BTreeSet<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Node ids the traversal may visit immediately after `id`.
    ///
    /// A conditional node may be followed by any node the router can
    /// select, which is every node except the entry.
    pub fn successors(&self, id: &str) -> BTreeSet<String> {
        if self.conditional.contains(id) {
            self.nodes
                .keys()
                .filter(|n| **n != self.entry)
                .cloned()
                .collect()
        } else {
            match self.fixed.get(id) {
                Some(EdgeTarget::Node(next)) => BTreeSet::from([next.clone()]),
                _ => BTreeSet::new(),
            }
        }
    }

    /// Every node reachable from the entry point, entry included.
    pub fn reachable_from_entry(&self) -> BTreeSet<String> {
        let mut seen = BTreeSet::from([self.entry.clone()]);
        let mut frontier = vec![self.entry.clone()];
        while let Some(id) = frontier.pop() {
            for next in self.successors(&id) {
                if seen.insert(next.clone()) {
                    frontier.push(next);
                }
            }
        }
        seen
    }
}
