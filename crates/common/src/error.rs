//! Error types for arachne.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArachneError {
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Planning error: {0}")]
    Plan(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArachneError>;
