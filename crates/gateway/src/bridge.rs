//! Per-connection bridge between the task graph and the WebSocket client.
//!
//! Each connection owns a writer task fed by an mpsc channel, a
//! [`BridgeDispatcher`] that parks tool calls until the client's
//! `toolResponse` arrives, and a read loop that dispatches incoming
//! frames. One task may be in flight per connection at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arachne_common::{ArachneError, ClientFrame, Result, ServerFrame, ToolCall, ToolReply};
use arachne_graph::{EventSink, TaskRunner, ToolDispatcher};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Sends frames to the connected client and parks each tool batch until
/// the matching `toolResponse` frame arrives.
pub struct BridgeDispatcher {
    outbound: mpsc::Sender<ServerFrame>,
    pending: Mutex<Option<oneshot::Sender<Vec<ToolReply>>>>,
}

impl BridgeDispatcher {
    pub fn new(outbound: mpsc::Sender<ServerFrame>) -> Self {
        Self {
            outbound,
            pending: Mutex::new(None),
        }
    }

    /// Hand a decoded `toolResponse` batch to the parked dispatch.
    ///
    /// A batch with nothing pending is unsolicited; it is logged and
    /// dropped.
    pub async fn complete(&self, replies: Vec<ToolReply>) {
        match self.pending.lock().await.take() {
            Some(tx) => {
                if tx.send(replies).is_err() {
                    warn!("Tool replies arrived after the waiting step gave up");
                }
            }
            None => warn!("Unsolicited toolResponse frame; dropping"),
        }
    }
}

#[async_trait]
impl ToolDispatcher for BridgeDispatcher {
    async fn dispatch(&self, calls: Vec<ToolCall>) -> Result<Vec<ToolReply>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            // A stale sender from a timed-out step may still be parked;
            // only a live one blocks a new dispatch.
            if pending.as_ref().is_some_and(|tx| !tx.is_closed()) {
                return Err(ArachneError::Tool(
                    "A tool batch is already awaiting its response".to_string(),
                ));
            }
            *pending = Some(tx);
        }

        self.outbound
            .send(ServerFrame::Tool { functions: calls })
            .await
            .map_err(|_| {
                ArachneError::Transport("Connection closed while dispatching tools".to_string())
            })?;

        rx.await.map_err(|_| {
            ArachneError::Transport("Connection closed while awaiting tool response".to_string())
        })
    }
}

#[async_trait]
impl EventSink for BridgeDispatcher {
    async fn emit(&self, frame: ServerFrame) -> Result<()> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| ArachneError::Transport("Connection closed".to_string()))
    }
}

/// Handle one WebSocket connection for its whole lifetime.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerFrame>(32);

    // Writer task: serializes every outbound frame onto the socket.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Failed to serialize frame");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let dispatcher = Arc::new(BridgeDispatcher::new(outbound_tx.clone()));

    let runner = match TaskRunner::new(
        &state.registry,
        &state.tiers,
        dispatcher.clone(),
        dispatcher.clone(),
        state.config.graph.clone(),
    ) {
        Ok(runner) => Arc::new(runner),
        Err(e) => {
            error!(error = %e, "Failed to build task graph");
            let _ = outbound_tx
                .send(ServerFrame::result(format!("Gateway error: {e}")))
                .await;
            return;
        }
    };

    let busy = Arc::new(AtomicBool::new(false));
    info!("Client connected");

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Query { task }) => {
                    if busy.swap(true, Ordering::SeqCst) {
                        debug!("Rejecting overlapping query");
                        let _ = outbound_tx
                            .send(ServerFrame::result(
                                "A task is already running on this connection; \
                                 wait for its result before sending another query.",
                            ))
                            .await;
                        continue;
                    }

                    let runner = runner.clone();
                    let outbound = outbound_tx.clone();
                    let busy = busy.clone();
                    tokio::spawn(async move {
                        // Success emits its own result frame through the
                        // sink; only failures are reported here.
                        if let Err(e) = runner.run(task).await {
                            error!(error = %e, "Task failed");
                            let _ = outbound
                                .send(ServerFrame::result(format!("Task failed: {e}")))
                                .await;
                        }
                        busy.store(false, Ordering::SeqCst);
                    });
                }
                Ok(ClientFrame::ToolResponse { response }) => {
                    match ToolReply::decode_batch(&response) {
                        Ok(replies) => dispatcher.complete(replies).await,
                        Err(e) => warn!(error = %e, "Undecodable toolResponse payload"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Unparsable client frame");
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client disconnected");
                break;
            }
            Err(e) => {
                warn!(error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Ends any in-flight dispatch with a transport error.
    writer.abort();
}
