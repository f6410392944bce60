//! Agent node: one per registered agent, executing one plan step.

use std::sync::Arc;

use arachne_common::{ArachneError, Result, TaskState, ToolCall};
use arachne_llm::{LlmClient, LlmRequest};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::builder::GraphNode;
use crate::dispatch::ToolDispatcher;
use crate::registry::AgentSpec;

pub struct AgentNode {
    spec: AgentSpec,
    client: Arc<dyn LlmClient>,
    dispatcher: Arc<dyn ToolDispatcher>,
}

impl AgentNode {
    pub fn new(
        spec: AgentSpec,
        client: Arc<dyn LlmClient>,
        dispatcher: Arc<dyn ToolDispatcher>,
    ) -> Self {
        Self {
            spec,
            client,
            dispatcher,
        }
    }
}

/// Pull a JSON object out of model output. Models often wrap the object
/// in prose or code fences, so fall back to the outermost brace pair.
fn extract_json_object(text: &str) -> Result<serde_json::Value> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if value.is_object() {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&trimmed[start..=end]) {
                if value.is_object() {
                    return Ok(value);
                }
            }
        }
    }

    Err(ArachneError::Agent(format!(
        "Model output is not a JSON argument object: {trimmed}"
    )))
}

#[async_trait]
impl GraphNode for AgentNode {
    fn id(&self) -> &str {
        &self.spec.name
    }

    async fn run(&self, state: &mut TaskState) -> Result<()> {
        let step = state
            .current_step()
            .ok_or_else(|| {
                ArachneError::Plan(format!(
                    "Agent '{}' reached with no pending step",
                    self.spec.name
                ))
            })?
            .clone();

        if step.agent != self.spec.name {
            return Err(ArachneError::Plan(format!(
                "Step {} targets '{}' but reached node '{}'",
                step.id, step.agent, self.spec.name
            )));
        }

        let input = state.substitute(&step.input);
        info!(
            task_id = %state.id,
            agent = %self.spec.name,
            step = %step.id,
            "Executing step"
        );

        let system = format!(
            "{}\n\nRespond with only a JSON object of arguments for the `{}` tool.",
            self.spec.prompt,
            self.spec.tool.wire_name()
        );
        let response = self
            .client
            .complete(LlmRequest::with_system(system, &input))
            .await?;

        let arguments = extract_json_object(&response.content)?;
        let call = ToolCall::new(self.spec.tool.wire_name(), arguments);
        debug!(
            task_id = %state.id,
            agent = %self.spec.name,
            function = %call.function_name,
            "Dispatching tool call"
        );

        let replies = self.dispatcher.dispatch(vec![call]).await?;
        if replies.is_empty() {
            return Err(ArachneError::Tool(format!(
                "No reply for step {} ({})",
                step.id, self.spec.name
            )));
        }

        let evidence = replies
            .iter()
            .map(|r| r.response.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        state.record_result(&step.id, evidence);
        Ok(())
    }
}
