//! Task graph for arachne: agent registry, typed nodes, and a small
//! explicit traversal engine.
//!
//! A task flows plan → agents → solve. The plan node turns the task
//! into ordered steps; the shared router sends each unresolved step to
//! its agent node; the solve node aggregates the recorded evidence.
//!
//! # Architecture
//!
//! ```text
//!            task
//!              │
//!              ▼
//!          ┌────────┐
//!          │  plan  │
//!          └───┬────┘
//!              │ router
//!    ┌─────────┼──────────┐
//!    ▼         ▼          ▼
//! [calculate] [organize] ... one node per agent
//!    │         │          │
//!    └────── router ──────┘  (next step, or all resolved)
//!              │
//!              ▼
//!          ┌───────┐
//!          │ solve │ ──► End
//!          └───────┘
//! ```

pub mod agent;
pub mod builder;
pub mod dispatch;
pub mod plan;
pub mod registry;
pub mod router;
pub mod runner;
pub mod solve;

pub use agent::AgentNode;
pub use builder::{CompiledGraph, EdgeTarget, GraphBuilder, GraphConfig, GraphNode};
pub use dispatch::{EventSink, ToolDispatcher};
pub use plan::PlanNode;
pub use registry::{AgentRegistry, AgentSpec, ClientContext, ToolKind};
pub use router::{route, NextNode, PLAN_NODE, SOLVE_NODE};
pub use runner::{build_task_graph, TaskRunner};
pub use solve::SolveNode;
