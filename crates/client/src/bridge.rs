//! Client-side state machine for the gateway connection.
//!
//! [`Bridge`] holds no socket; it maps connection events and server
//! frames to [`Action`]s for the caller to perform. That keeps the
//! protocol logic testable without a network in sight.

use std::time::Duration;

use arachne_common::{ClientFrame, Result, ServerFrame};

use crate::resolver::ResolverChain;

/// Task sent when the operator submits an empty line.
pub const DEFAULT_TASK: &str = "what's 3*6 divided by 2";

/// Delay before the single reconnect attempt that follows a disconnect.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No connection; waiting to (re)connect.
    Disconnected,

    /// Connected with no task in flight.
    Idle,

    /// Query sent; expecting tool frames or a result.
    AwaitingToolResponses,

    /// Tool replies sent; expecting more tool frames or a result.
    AwaitingResult,
}

/// What the caller should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Ask the operator for the next task, then call [`Bridge::submit`].
    Prompt,

    /// Send this frame to the gateway.
    Send(ClientFrame),

    /// Show this line to the operator.
    Display(String),

    /// Wait out the delay, then attempt exactly one reconnect.
    Reconnect(Duration),
}

/// Typed state machine for one client session: connection events and
/// server frames come in, actions for the driver loop come out.
pub struct Bridge {
    state: BridgeState,
}

impl Bridge {
    pub fn new() -> Self {
        Self {
            state: BridgeState::Disconnected,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// The connection opened: greet and prompt for the first task.
    pub fn opened(&mut self) -> Vec<Action> {
        self.state = BridgeState::Idle;
        vec![
            Action::Display("Connected to server".to_string()),
            Action::Prompt,
        ]
    }

    /// The operator submitted a task line; empty input falls back to
    /// [`DEFAULT_TASK`].
    pub fn submit(&mut self, task: &str) -> Vec<Action> {
        let task = task.trim();
        let mut actions = Vec::new();

        let task = if task.is_empty() {
            actions.push(Action::Display(format!(
                "No input provided, using: {DEFAULT_TASK}"
            )));
            DEFAULT_TASK
        } else {
            task
        };

        actions.push(Action::Send(ClientFrame::query(task)));
        self.state = BridgeState::AwaitingToolResponses;
        actions
    }

    /// Dispatch one server frame.
    ///
    /// Tool frames are resolved through `resolvers` and answered with
    /// exactly one `toolResponse` whose entries preserve the incoming
    /// order and names. A resolver error propagates to the caller and
    /// ends the session; the normal reconnect path follows.
    pub fn handle_frame(
        &mut self,
        frame: ServerFrame,
        resolvers: &ResolverChain,
    ) -> Result<Vec<Action>> {
        match frame {
            ServerFrame::Tool { functions } => {
                let replies = resolvers.resolve_batch(&functions)?;
                self.state = BridgeState::AwaitingResult;
                Ok(vec![Action::Send(ClientFrame::tool_response(&replies)?)])
            }
            ServerFrame::Result { message } => {
                self.state = BridgeState::Idle;
                Ok(vec![
                    Action::Display(format!("Result: {message}")),
                    Action::Prompt,
                ])
            }
            ServerFrame::Plan { message } => {
                // Surfaced without a state change.
                Ok(vec![Action::Display(format!("Here is the plan:\n{message}"))])
            }
        }
    }

    /// The connection dropped (or never opened): schedule one retry.
    pub fn closed(&mut self) -> Vec<Action> {
        self.state = BridgeState::Disconnected;
        vec![
            Action::Display("Disconnected from server".to_string()),
            Action::Reconnect(RECONNECT_DELAY),
        ]
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Prompter;
    use arachne_common::{ToolCall, ToolReply};
    use serde_json::json;

    struct NoPrompter;

    impl Prompter for NoPrompter {
        fn prompt(&self, _message: &str) -> Result<String> {
            panic!("the prompter should not be reached in this test");
        }
    }

    struct FixedPrompter(&'static str);

    impl Prompter for FixedPrompter {
        fn prompt(&self, _message: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn resolvers() -> ResolverChain {
        ResolverChain::standard(Box::new(NoPrompter))
    }

    fn decoded_replies(actions: &[Action]) -> Vec<ToolReply> {
        let sends: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(ClientFrame::ToolResponse { response }) => Some(response),
                _ => None,
            })
            .collect();
        assert_eq!(sends.len(), 1, "expected exactly one toolResponse");
        ToolReply::decode_batch(sends[0]).unwrap()
    }

    #[test]
    fn test_opened_greets_and_prompts() {
        let mut bridge = Bridge::new();
        assert_eq!(bridge.state(), BridgeState::Disconnected);

        let actions = bridge.opened();

        assert_eq!(bridge.state(), BridgeState::Idle);
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], Action::Display(_)));
        assert_eq!(actions[1], Action::Prompt);
    }

    #[test]
    fn test_submit_sends_query() {
        let mut bridge = Bridge::new();
        bridge.opened();

        let actions = bridge.submit("what's 3*6");

        assert_eq!(bridge.state(), BridgeState::AwaitingToolResponses);
        assert_eq!(actions, vec![Action::Send(ClientFrame::query("what's 3*6"))]);
    }

    #[test]
    fn test_empty_submit_falls_back_to_default_task() {
        let mut bridge = Bridge::new();
        bridge.opened();

        let actions = bridge.submit("   ");

        assert!(matches!(actions[0], Action::Display(_)));
        assert_eq!(actions[1], Action::Send(ClientFrame::query(DEFAULT_TASK)));
    }

    #[test]
    fn test_tool_frame_yields_one_matching_tool_response() {
        let mut bridge = Bridge::new();
        bridge.opened();
        bridge.submit("what's 3*6 divided by 2");

        let frame = ServerFrame::Tool {
            functions: vec![ToolCall::new(
                "calculate",
                json!({"a": 3, "b": 6, "operator": "multiply"}),
            )],
        };
        let actions = bridge.handle_frame(frame, &resolvers()).unwrap();

        assert_eq!(bridge.state(), BridgeState::AwaitingResult);
        let replies = decoded_replies(&actions);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].function_name, "calculate");
        assert_eq!(replies[0].response, "18");
    }

    #[test]
    fn test_batch_tool_frame_preserves_order_and_names() {
        let mut bridge = Bridge::new();
        bridge.opened();
        bridge.submit("chart the sales");

        let frame = ServerFrame::Tool {
            functions: vec![
                ToolCall::new("calculate", json!({"a": 2, "b": 10, "operator": "^"})),
                ToolCall::new("draw_chart", json!({"data": "..."})),
            ],
        };
        let chain = ResolverChain::standard(Box::new(FixedPrompter("a bar chart")));
        let actions = bridge.handle_frame(frame, &chain).unwrap();

        let replies = decoded_replies(&actions);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].function_name, "calculate");
        assert_eq!(replies[0].response, "1024");
        assert_eq!(replies[1].function_name, "draw_chart");
        assert_eq!(replies[1].response, "a bar chart");
    }

    #[test]
    fn test_tool_frame_while_awaiting_result_is_handled() {
        let mut bridge = Bridge::new();
        bridge.opened();
        bridge.submit("multi step");

        let step = |op: &str| ServerFrame::Tool {
            functions: vec![ToolCall::new(
                "calculate",
                json!({"a": 18, "b": 3, "operator": op}),
            )],
        };

        bridge.handle_frame(step("multiply"), &resolvers()).unwrap();
        assert_eq!(bridge.state(), BridgeState::AwaitingResult);

        // A second tool frame arrives for the next plan step.
        let actions = bridge.handle_frame(step("divide"), &resolvers()).unwrap();
        assert_eq!(bridge.state(), BridgeState::AwaitingResult);
        assert_eq!(decoded_replies(&actions)[0].response, "6");
    }

    #[test]
    fn test_result_surfaces_and_reprompts() {
        let mut bridge = Bridge::new();
        bridge.opened();
        bridge.submit("what's 3*6 divided by 2");

        let actions = bridge
            .handle_frame(ServerFrame::result("9"), &resolvers())
            .unwrap();

        assert_eq!(bridge.state(), BridgeState::Idle);
        assert_eq!(actions[0], Action::Display("Result: 9".to_string()));
        assert_eq!(actions[1], Action::Prompt);
    }

    #[test]
    fn test_plan_surfaces_without_state_change() {
        let mut bridge = Bridge::new();
        bridge.opened();
        bridge.submit("what's 3*6 divided by 2");

        let actions = bridge
            .handle_frame(ServerFrame::plan("Plan: ..."), &resolvers())
            .unwrap();

        assert_eq!(bridge.state(), BridgeState::AwaitingToolResponses);
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], Action::Display(text) if text.contains("Plan: ...")));
    }

    #[test]
    fn test_close_schedules_exactly_one_reconnect() {
        let mut bridge = Bridge::new();
        bridge.opened();
        bridge.submit("what's 3*6");

        let actions = bridge.closed();

        assert_eq!(bridge.state(), BridgeState::Disconnected);
        let reconnects: Vec<_> = actions
            .iter()
            .filter(|a| matches!(a, Action::Reconnect(_)))
            .collect();
        assert_eq!(reconnects.len(), 1);
        assert_eq!(*reconnects[0], Action::Reconnect(RECONNECT_DELAY));
    }

    #[test]
    fn test_reprompt_only_after_successful_open() {
        let mut bridge = Bridge::new();
        bridge.opened();
        let actions = bridge.closed();
        assert!(!actions.contains(&Action::Prompt));

        // Only the successful reopen prompts again.
        let actions = bridge.opened();
        assert_eq!(bridge.state(), BridgeState::Idle);
        assert!(actions.contains(&Action::Prompt));
    }

    #[test]
    fn test_resolver_error_propagates_out_of_handle_frame() {
        let mut bridge = Bridge::new();
        bridge.opened();
        bridge.submit("bad math");

        let frame = ServerFrame::Tool {
            functions: vec![ToolCall::new(
                "calculate",
                json!({"a": 1, "b": 2, "operator": "modulo"}),
            )],
        };
        let err = bridge.handle_frame(frame, &resolvers()).unwrap_err();
        assert!(err.to_string().contains("Unknown operator"));
    }
}
