//! Interactive client for the Arachne gateway.
//!
//! Opens one long-lived WebSocket, forwards the operator's tasks, and
//! answers the gateway's tool calls: arithmetic locally, the demo data
//! query from canned rows, and everything else by asking the operator.
//! Plans and results are printed as they arrive; a dropped connection is
//! retried after a fixed delay.

pub mod bridge;
pub mod calculator;
pub mod resolver;

pub use bridge::{Action, Bridge, BridgeState, DEFAULT_TASK, RECONNECT_DELAY};
pub use resolver::{Prompter, ResolverChain, StdinPrompter, ToolResolver};
