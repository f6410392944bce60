//! Tool resolution for the client side of the bridge.
//!
//! Incoming tool calls are offered to a chain of resolvers. A resolver
//! either answers the call, passes, or fails it; anything every resolver
//! passes on falls through to the operator via a [`Prompter`].

use std::io::{self, Write};

use arachne_common::{Result, ToolCall, ToolReply};
use serde_json::json;
use tracing::debug;

use crate::calculator;

/// One handler in the resolution chain.
pub trait ToolResolver: Send + Sync {
    /// Try to answer `call`; `Ok(None)` passes it to the next resolver.
    fn try_resolve(&self, call: &ToolCall) -> Result<Option<String>>;
}

/// Asks the operator for a free-text reply.
pub trait Prompter: Send + Sync {
    fn prompt(&self, message: &str) -> Result<String>;
}

/// Blocking stdin prompter used by the interactive client.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&self, message: &str) -> Result<String> {
        print!("{message}");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

/// Answers `calculate` calls locally.
pub struct CalculatorResolver;

impl ToolResolver for CalculatorResolver {
    fn try_resolve(&self, call: &ToolCall) -> Result<Option<String>> {
        if call.function_name != "calculate" {
            return Ok(None);
        }
        let result = calculator::calculate(&call.arguments)?;
        debug!(result = %result, "Calculated locally");
        Ok(Some(result))
    }
}

/// Answers `run_query` calls with a fixed set of transaction rows.
pub struct CannedQueryResolver;

impl ToolResolver for CannedQueryResolver {
    fn try_resolve(&self, call: &ToolCall) -> Result<Option<String>> {
        if call.function_name != "run_query" {
            return Ok(None);
        }
        debug!(query = %call.arguments, "Answering query from the canned rows");
        Ok(Some(canned_transactions()?))
    }
}

/// The stub dataset: three "Thriller Novel" purchases, serialized as JSON.
fn canned_transactions() -> Result<String> {
    let rows = json!([
        {
            "TRANSACTION_ID": 1, "USER_ID": 101, "USER_NAME": "John Doe",
            "PRODUCT_ID": 201, "PRODUCT_NAME": "Thriller Novel", "CATEGORY": "Books",
            "PRICE": 14.99, "TRANSACTION_DATE": "2024-05-10"
        },
        {
            "TRANSACTION_ID": 2, "USER_ID": 102, "USER_NAME": "Jane Smith",
            "PRODUCT_ID": 201, "PRODUCT_NAME": "Thriller Novel", "CATEGORY": "Books",
            "PRICE": 14.99, "TRANSACTION_DATE": "2024-05-11"
        },
        {
            "TRANSACTION_ID": 3, "USER_ID": 103, "USER_NAME": "Alice Johnson",
            "PRODUCT_ID": 201, "PRODUCT_NAME": "Thriller Novel", "CATEGORY": "Books",
            "PRICE": 14.99, "TRANSACTION_DATE": "2024-05-12"
        }
    ]);
    Ok(serde_json::to_string(&rows)?)
}

/// The ordered chain plus the human fallback.
pub struct ResolverChain {
    resolvers: Vec<Box<dyn ToolResolver>>,
    prompter: Box<dyn Prompter>,
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Box<dyn ToolResolver>>, prompter: Box<dyn Prompter>) -> Self {
        Self {
            resolvers,
            prompter,
        }
    }

    /// Calculator, then canned queries, then the operator.
    pub fn standard(prompter: Box<dyn Prompter>) -> Self {
        Self::new(
            vec![Box::new(CalculatorResolver), Box::new(CannedQueryResolver)],
            prompter,
        )
    }

    /// Resolve one call, falling through to the prompter.
    pub fn resolve(&self, call: &ToolCall) -> Result<ToolReply> {
        for resolver in &self.resolvers {
            if let Some(response) = resolver.try_resolve(call)? {
                return Ok(ToolReply::new(&call.function_name, response));
            }
        }

        let response = self
            .prompter
            .prompt(&format!("Enter your response for {}: ", call.function_name))?;
        Ok(ToolReply::new(&call.function_name, response))
    }

    /// Resolve a whole `tool` frame, preserving order and names.
    pub fn resolve_batch(&self, calls: &[ToolCall]) -> Result<Vec<ToolReply>> {
        calls
            .iter()
            .map(|call| {
                debug!(
                    function = %call.function_name,
                    arguments = %call.arguments,
                    "Resolving tool call"
                );
                self.resolve(call)
            })
            .collect()
    }
}
