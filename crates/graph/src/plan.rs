//! Planning node: turns a task into ordered, tool-addressed steps.

use std::sync::{Arc, LazyLock};

use arachne_common::{ArachneError, PlanStep, Result, ServerFrame, TaskState};
use arachne_llm::{LlmClient, LlmRequest};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use crate::builder::GraphNode;
use crate::dispatch::EventSink;
use crate::registry::AgentRegistry;
use crate::router::PLAN_NODE;

const PLANNER_SYSTEM_PROMPT: &str = r#"For the following task, make plans that can solve the problem step by step. For each plan, indicate which external tool together with tool input to retrieve evidence. You can store the evidence into a variable #E that can be called by later tools. (Plan, #E1, Plan, #E2, Plan, ...)

Each step must have exactly this form:
Plan: <what this step achieves>
#E<n> = <tool>[<input, which may reference earlier #E variables>]

Begin! Describe your plans with rich details. Each Plan should be followed by only one #E."#;

/// Matches one `Plan: ... #En = tool[input]` step. `(?s)` lets the
/// description span lines; the lazy `.+?` stops it at the evidence id.
static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Plan:\s*(.+?)\s*(#E\d+)\s*=\s*(\w+)\s*\[([^\]]*)\]").unwrap()
});

pub struct PlanNode {
    client: Arc<dyn LlmClient>,
    system_prompt: String,
    sink: Arc<dyn EventSink>,
}

impl PlanNode {
    pub fn new(
        client: Arc<dyn LlmClient>,
        registry: &AgentRegistry,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let system_prompt = format!(
            "{PLANNER_SYSTEM_PROMPT}\n\nTools can be one of the following:\n{}",
            registry.planner_roster()
        );
        Self {
            client,
            system_prompt,
            sink,
        }
    }

    /// Extract ordered steps from planner output.
    pub fn parse_steps(text: &str) -> Vec<PlanStep> {
        STEP_RE
            .captures_iter(text)
            .map(|caps| {
                PlanStep::new(
                    caps[1].trim(),
                    caps[2].trim(),
                    caps[3].trim(),
                    caps[4].trim(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl GraphNode for PlanNode {
    fn id(&self) -> &str {
        PLAN_NODE
    }

    async fn run(&self, state: &mut TaskState) -> Result<()> {
        let request = LlmRequest::with_system(
            self.system_prompt.clone(),
            format!("Task: {}", state.task),
        );
        let response = self.client.complete(request).await?;

        let steps = Self::parse_steps(&response.content);
        if steps.is_empty() {
            return Err(ArachneError::Plan(format!(
                "Planner produced no parsable steps: {}",
                response.content
            )));
        }

        info!(
            task_id = %state.id,
            steps = steps.len(),
            model = %response.model,
            "Plan ready"
        );
        debug!(task_id = %state.id, plan = %response.content, "Raw plan");

        state.plan_string = response.content;
        state.steps = steps;

        self.sink
            .emit(ServerFrame::plan(state.plan_string.clone()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arachne_llm::LlmResponse;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: String,
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: "scripted".to_string(),
                usage: None,
                finish_reason: None,
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct RecordingSink {
        frames: Mutex<Vec<ServerFrame>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                frames: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn emit(&self, frame: ServerFrame) -> Result<()> {
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }
    }

    fn registry() -> AgentRegistry {
        use crate::registry::ClientContext;
        AgentRegistry::standard(
            &ClientContext::new(vec!["test corp".to_string(), "tables".to_string()]).unwrap(),
        )
        .unwrap()
    }

    const TWO_STEP_PLAN: &str = "Plan: Multiply 3 by 6 to get the product. #E1 = calculate[3 * 6]\n\
         Plan: Divide the product by 2. #E2 = calculate[#E1 / 2]";

    #[test]
    fn test_parse_steps_extracts_ordered_steps() {
        let steps = PlanNode::parse_steps(TWO_STEP_PLAN);
        assert_eq!(steps.len(), 2);

        assert_eq!(steps[0].id, "#E1");
        assert_eq!(steps[0].agent, "calculate");
        assert_eq!(steps[0].input, "3 * 6");
        assert_eq!(steps[0].description, "Multiply 3 by 6 to get the product.");

        assert_eq!(steps[1].id, "#E2");
        assert_eq!(steps[1].input, "#E1 / 2");
    }

    #[test]
    fn test_parse_steps_handles_multiline_descriptions() {
        let text = "Plan: First find all the rows\nfor the thriller novel.\n#E1 = get_data[thriller novel sales]";
        let steps = PlanNode::parse_steps(text);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].agent, "get_data");
        assert!(steps[0].description.contains("thriller novel"));
    }

    #[test]
    fn test_parse_steps_ignores_unstructured_text() {
        assert!(PlanNode::parse_steps("I cannot plan this.").is_empty());
        assert!(PlanNode::parse_steps("").is_empty());
    }

    #[tokio::test]
    async fn test_run_stores_plan_and_emits_frame() {
        let sink = Arc::new(RecordingSink::new());
        let node = PlanNode::new(
            Arc::new(ScriptedClient {
                reply: TWO_STEP_PLAN.to_string(),
            }),
            &registry(),
            sink.clone(),
        );

        let mut state = TaskState::new("what's 3*6 divided by 2");
        node.run(&mut state).await.unwrap();

        assert_eq!(state.steps.len(), 2);
        assert_eq!(state.plan_string, TWO_STEP_PLAN);

        let frames = sink.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], ServerFrame::Plan { .. }));
    }

    #[tokio::test]
    async fn test_run_rejects_unparsable_plan() {
        let node = PlanNode::new(
            Arc::new(ScriptedClient {
                reply: "no steps here".to_string(),
            }),
            &registry(),
            Arc::new(RecordingSink::new()),
        );

        let mut state = TaskState::new("t");
        let err = node.run(&mut state).await.unwrap_err();
        assert!(matches!(err, ArachneError::Plan(_)));
    }
}
