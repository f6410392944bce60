//! Wire-protocol frames exchanged between the gateway and the client.
//!
//! All frames are JSON text messages tagged by a `type` field. The
//! `toolResponse` payload is itself a JSON-encoded array of
//! [`ToolReply`] records, mirrored exactly by [`ToolReply::encode_batch`]
//! and [`ToolReply::decode_batch`].

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A single tool invocation requested by an agent node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Wire name of the tool function (e.g. `calculate`)
    pub function_name: String,

    /// Structured arguments produced by the agent's model
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(function_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            function_name: function_name.into(),
            arguments,
        }
    }
}

/// The client's answer to one [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReply {
    /// Echoes the `function_name` of the call being answered
    pub function_name: String,

    /// Free-text result of the tool invocation
    pub response: String,
}

impl ToolReply {
    pub fn new(function_name: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            response: response.into(),
        }
    }

    /// Encode a batch of replies into the nested `response` string carried
    /// by a `toolResponse` frame.
    pub fn encode_batch(replies: &[ToolReply]) -> Result<String> {
        Ok(serde_json::to_string(replies)?)
    }

    /// Decode the nested `response` string of a `toolResponse` frame.
    pub fn decode_batch(response: &str) -> Result<Vec<ToolReply>> {
        Ok(serde_json::from_str(response)?)
    }
}

/// Frames sent by the client to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Submit a task for execution.
    Query { task: String },

    /// Answer an outstanding `tool` frame. `response` is a JSON-encoded
    /// array of [`ToolReply`] records.
    ToolResponse { response: String },
}

impl ClientFrame {
    pub fn query(task: impl Into<String>) -> Self {
        Self::Query { task: task.into() }
    }

    /// Build a `toolResponse` frame from resolved replies.
    pub fn tool_response(replies: &[ToolReply]) -> Result<Self> {
        Ok(Self::ToolResponse {
            response: ToolReply::encode_batch(replies)?,
        })
    }
}

/// Frames sent by the gateway to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Request the client to resolve one or more tool calls.
    Tool { functions: Vec<ToolCall> },

    /// Final (or failure) outcome of a query.
    Result { message: String },

    /// The plan produced for the current query, surfaced for visibility.
    Plan { message: String },
}

impl ServerFrame {
    pub fn result(message: impl Into<String>) -> Self {
        Self::Result {
            message: message.into(),
        }
    }

    pub fn plan(message: impl Into<String>) -> Self {
        Self::Plan {
            message: message.into(),
        }
    }
}
