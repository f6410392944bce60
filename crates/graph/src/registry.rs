//! Agent roster: which agents exist, and which tier, prompt, and tool
//! each one is bound to.

use arachne_common::{ArachneError, Result};
use arachne_llm::ModelTier;

/// Deployment-provided context for the standard roster.
///
/// Entry 0 describes the company and its users; entry 1 lists the tables
/// and their columns, and is interpolated into the data-retrieval prompt.
#[derive(Debug, Clone)]
pub struct ClientContext {
    entries: Vec<String>,
}

impl ClientContext {
    /// At least two entries are required; anything less is a
    /// configuration error.
    pub fn new(entries: Vec<String>) -> Result<Self> {
        if entries.len() < 2 {
            return Err(ArachneError::Config(
                "Client context needs at least 2 entries: \
                 0 = company and user description, 1 = tables and their structure"
                    .to_string(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn deployment(&self) -> &str {
        &self.entries[0]
    }

    pub fn schema(&self) -> &str {
        &self.entries[1]
    }
}

/// The tool a registered agent is allowed to call.
///
/// A closed capability descriptor: each kind knows its wire-level
/// function name and a one-line description used in the planner prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Calculator,
    OrganizeItems,
    FilterRows,
    ListTables,
    RunQuery,
    DrawChart,
}

impl ToolKind {
    /// Function name carried in `tool` frames.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ToolKind::Calculator => "calculate",
            ToolKind::OrganizeItems => "organize_items",
            ToolKind::FilterRows => "filter_rows",
            ToolKind::ListTables => "list_tables",
            ToolKind::RunQuery => "run_query",
            ToolKind::DrawChart => "draw_chart",
        }
    }

    /// One-line capability description for the planner roster.
    pub fn describe(&self) -> &'static str {
        match self {
            ToolKind::Calculator => {
                "Performs one arithmetic operation. Input is a plain math \
                 expression such as 18 / 3."
            }
            ToolKind::OrganizeItems => "Rearranges the items of an array as requested.",
            ToolKind::FilterRows => "Filters a JSON array of rows by a requested field.",
            ToolKind::ListTables => {
                "Selects the most relevant tables from a list of table names."
            }
            ToolKind::RunQuery => {
                "Runs a PostgreSQL query against the deployment's data and \
                 returns the rows."
            }
            ToolKind::DrawChart => {
                "Renders chart data (labels, data, chartType) from a JSON array."
            }
        }
    }
}

/// One registered agent. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    /// Registry and graph-node name; also the name the planner uses
    pub name: String,

    /// Which model tier answers for this agent
    pub tier: ModelTier,

    /// System prompt for the agent's model
    pub prompt: String,

    /// The single tool this agent may call
    pub tool: ToolKind,

    /// Whether the tool is ultimately resolved by a human on the client
    pub forwards_to_human: bool,
}

/// Ordered, name-unique collection of [`AgentSpec`]s.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: Vec<AgentSpec>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Names must be unique.
    pub fn register(&mut self, spec: AgentSpec) -> Result<()> {
        if self.get(&spec.name).is_some() {
            return Err(ArachneError::Config(format!(
                "Duplicate agent name: {}",
                spec.name
            )));
        }
        self.agents.push(spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Agents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSpec> {
        self.agents.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Numbered tool list for the planner prompt, one line per agent.
    pub fn planner_roster(&self) -> String {
        self.agents
            .iter()
            .enumerate()
            .map(|(i, a)| format!("({}) {}[input]: {}", i + 1, a.name, a.tool.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The standard deployment roster.
    ///
    /// Construction is deterministic: the same context always yields the
    /// same names, prompts, and tool bindings, in the same order.
    pub fn standard(context: &ClientContext) -> Result<Self> {
        let mut registry = Self::new();

        registry.register(AgentSpec {
            name: "calculate".to_string(),
            tier: ModelTier::Fast,
            prompt: "You are an LLM specialized in math operations, with access to a \
                     calculator tool. You are asked to perform one math operation at a time."
                .to_string(),
            tool: ToolKind::Calculator,
            forwards_to_human: false,
        })?;

        registry.register(AgentSpec {
            name: "organize".to_string(),
            tier: ModelTier::Fast,
            prompt: "You are an LLM specialized in rearranging the items of an array as \
                     requested by the user."
                .to_string(),
            tool: ToolKind::OrganizeItems,
            forwards_to_human: true,
        })?;

        registry.register(AgentSpec {
            name: "filter_data".to_string(),
            tier: ModelTier::Fast,
            prompt: "You are an LLM specialized in filtering items in an array as \
                     requested by the user. Given a stringified JSON array, filter it by \
                     the requested field and return the filtered array of objects."
                .to_string(),
            tool: ToolKind::FilterRows,
            forwards_to_human: true,
        })?;

        registry.register(AgentSpec {
            name: "get_tables".to_string(),
            tier: ModelTier::Strong,
            prompt: "You are an LLM with advanced capabilities in analyzing database \
                     schemas. From the list of table names that follows the string \
                     'based on these table names:', select the tables most relevant to \
                     the user's objective. Only use table names from that list; never \
                     invent new ones."
                .to_string(),
            tool: ToolKind::ListTables,
            forwards_to_human: true,
        })?;

        registry.register(AgentSpec {
            name: "get_data".to_string(),
            tier: ModelTier::Fast,
            prompt: format!(
                "You are an LLM specialized in generating PostgreSQL queries. Based on \
                 the table columns below and the user's request, generate the query that \
                 retrieves what the user needs. Never alter table or column names.\n\n\
                 Relevant tables:\n{}",
                context.schema()
            ),
            tool: ToolKind::RunQuery,
            forwards_to_human: true,
        })?;

        registry.register(AgentSpec {
            name: "create_chart".to_string(),
            tier: ModelTier::Strong,
            prompt: "You are an LLM specialized in turning JSON arrays into chart data. \
                     If no chart type is indicated, pick the most suitable one. Always \
                     produce the labels, data, and chartType fields, for example: \
                     {\"labels\": [\"A\", \"B\"], \"data\": [1, 2], \"chartType\": \"line\"}."
                .to_string(),
            tool: ToolKind::DrawChart,
            forwards_to_human: true,
        })?;

        Ok(registry)
    }
}
