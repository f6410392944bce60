//! Solver node: aggregates recorded evidence into the final answer.

use std::sync::Arc;

use arachne_common::{Result, ServerFrame, TaskState};
use arachne_llm::{LlmClient, LlmRequest};
use async_trait::async_trait;
use tracing::info;

use crate::builder::GraphNode;
use crate::dispatch::EventSink;
use crate::router::SOLVE_NODE;

const SOLVER_SYSTEM_PROMPT: &str = r#"Solve the following task. To assist you, a step-by-step plan was executed and the evidence for each step is recorded below. Use the evidence with caution, since long evidence might contain irrelevant information. Respond with the answer directly, with no extra words."#;

pub struct SolveNode {
    client: Arc<dyn LlmClient>,
    sink: Arc<dyn EventSink>,
}

impl SolveNode {
    pub fn new(client: Arc<dyn LlmClient>, sink: Arc<dyn EventSink>) -> Self {
        Self { client, sink }
    }

    /// Render the executed plan: each step with its substituted input
    /// and the evidence it produced.
    fn render_worked_plan(state: &TaskState) -> String {
        let mut out = String::new();
        for step in &state.steps {
            let input = state.substitute(&step.input);
            let evidence = state
                .results
                .get(&step.id)
                .map(String::as_str)
                .unwrap_or("<missing>");
            out.push_str(&format!(
                "Plan: {}\n{} = {}[{}]\nEvidence: {}\n\n",
                step.description, step.id, step.agent, input, evidence
            ));
        }
        out
    }
}

#[async_trait]
impl GraphNode for SolveNode {
    fn id(&self) -> &str {
        SOLVE_NODE
    }

    async fn run(&self, state: &mut TaskState) -> Result<()> {
        let worked_plan = Self::render_worked_plan(state);
        let request = LlmRequest::with_system(
            SOLVER_SYSTEM_PROMPT,
            format!("{worked_plan}Task: {}", state.task),
        );
        let response = self.client.complete(request).await?;

        let answer = response.content.trim().to_string();
        info!(task_id = %state.id, model = %response.model, "Task solved");

        state.result = Some(answer.clone());
        self.sink.emit(ServerFrame::result(answer)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arachne_common::PlanStep;
    use arachne_llm::LlmResponse;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: String,
        seen: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
            self.seen.lock().unwrap().push(request);
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

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn emit(&self, frame: ServerFrame) -> Result<()> {
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }
    }

    fn solved_state() -> TaskState {
        let mut state = TaskState::new("what's 3*6 divided by 2");
        state.steps = vec![
            PlanStep::new("Multiply 3 by 6.", "#E1", "calculate", "3 * 6"),
            PlanStep::new("Divide the product by 2.", "#E2", "calculate", "#E1 / 2"),
        ];
        state.record_result("#E1", "18");
        state.record_result("#E2", "9");
        state
    }

    #[test]
    fn test_render_worked_plan_substitutes_evidence() {
        let rendered = SolveNode::render_worked_plan(&solved_state());

        assert!(rendered.contains("Plan: Multiply 3 by 6.\n#E1 = calculate[3 * 6]\nEvidence: 18"));
        // The second step's input has #E1 replaced by the recorded 18.
        assert!(rendered.contains("#E2 = calculate[18 / 2]\nEvidence: 9"));
    }

    #[tokio::test]
    async fn test_run_sets_result_and_emits_frame() {
        let sink = Arc::new(RecordingSink {
            frames: Mutex::new(Vec::new()),
        });
        let client = Arc::new(ScriptedClient {
            reply: "  9\n".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let node = SolveNode::new(client.clone(), sink.clone());

        let mut state = solved_state();
        node.run(&mut state).await.unwrap();

        assert_eq!(state.result.as_deref(), Some("9"));

        // The solver prompt carried the worked plan and the task.
        let seen = client.seen.lock().unwrap();
        assert!(seen[0].messages[0].content.contains("Evidence: 18"));
        assert!(seen[0].messages[0]
            .content
            .ends_with("Task: what's 3*6 divided by 2"));

        let frames = sink.frames.lock().unwrap();
        assert_eq!(
            frames[0],
            ServerFrame::Result {
                message: "9".to_string()
            }
        );
    }
}
