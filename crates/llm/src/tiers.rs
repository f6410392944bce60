//! Model tiers: a fast workhorse model and a strong reasoning model.
//!
//! Agents, the planner, and the solver each name a tier rather than a
//! concrete provider/model; configuration maps the two tiers onto real
//! clients.

use std::sync::Arc;

use arachne_common::Result;
use serde::{Deserialize, Serialize};

use crate::client::LlmClient;
use crate::config::{build_llm_client, LlmConfig};
use crate::retry::RetryConfig;

/// Capability level an agent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Strong,
}

/// Per-tier provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TiersConfig {
    pub fast: LlmConfig,
    pub strong: LlmConfig,
}

impl Default for TiersConfig {
    fn default() -> Self {
        // Defaults target a local OpenAI-compatible runtime so the stack
        // starts without any API keys.
        Self {
            fast: LlmConfig {
                provider: "openai".to_string(),
                model: "llama3.2".to_string(),
                api_key: None,
                api_url: None,
                temperature: None,
                max_tokens: None,
                max_concurrent_requests: 2,
                retry: RetryConfig::default(),
            },
            strong: LlmConfig {
                provider: "openai".to_string(),
                model: "llama3.3:70b".to_string(),
                api_key: None,
                api_url: None,
                temperature: None,
                max_tokens: None,
                max_concurrent_requests: 2,
                retry: RetryConfig::default(),
            },
        }
    }
}

/// The two constructed tier clients, shared across a session.
#[derive(Clone)]
pub struct TierSet {
    pub fast: Arc<dyn LlmClient>,
    pub strong: Arc<dyn LlmClient>,
}

impl TierSet {
    pub fn from_config(config: &TiersConfig) -> Result<Self> {
        Ok(Self {
            fast: build_llm_client(&config.fast)?,
            strong: build_llm_client(&config.strong)?,
        })
    }

    pub fn select(&self, tier: ModelTier) -> Arc<dyn LlmClient> {
        match tier {
            ModelTier::Fast => self.fast.clone(),
            ModelTier::Strong => self.strong.clone(),
        }
    }
}
