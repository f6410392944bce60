//! Common types shared across arachne crates.
//!
//! This crate provides the error type, the wire-protocol frames spoken
//! between the gateway and its clients, and the per-invocation task state
//! threaded through the graph.

pub mod error;
pub mod protocol;
pub mod state;

pub use error::{ArachneError, Result};
pub use protocol::{ClientFrame, ServerFrame, ToolCall, ToolReply};
pub use state::{PlanStep, TaskState};
