//! Seams between the graph and the transport.
//!
//! The gateway implements both traits on its per-connection bridge;
//! tests implement them with recording mocks.

use arachne_common::{Result, ServerFrame, ToolCall, ToolReply};
use async_trait::async_trait;

/// Sends tool calls to the connected client and awaits its replies.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// Dispatch one batch of calls. The reply batch answers the calls in
    /// order, one reply per call.
    async fn dispatch(&self, calls: Vec<ToolCall>) -> Result<Vec<ToolReply>>;
}

/// Surfaces out-of-band frames (plan, result) to the client.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, frame: ServerFrame) -> Result<()>;
}
