pub mod anthropic;
pub mod client;
pub mod config;
pub mod openai;
pub mod retry;
pub mod tiers;

pub use anthropic::AnthropicClient;
pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};
pub use config::{LlmConfig, SemaphoredClient, build_llm_client};
pub use openai::OpenAiClient;
pub use retry::{RetryConfig, RetryingClient};
pub use tiers::{ModelTier, TierSet, TiersConfig};
