//! Application state for the gateway server.

use arachne_common::Result;
use arachne_graph::{AgentRegistry, ClientContext};
use arachne_llm::TierSet;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// Registry and tiers are read-only after construction; per-connection
/// state lives in the bridge.
pub struct AppState {
    pub config: GatewayConfig,
    pub tiers: TierSet,
    pub registry: AgentRegistry,

    /// Server start time (for health checks)
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build state from configuration, constructing the tier clients and
    /// the standard agent roster.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let tiers = TierSet::from_config(&config.tiers)?;
        Self::with_tiers(config, tiers)
    }

    /// Build state with pre-constructed tier clients. Tests use this to
    /// inject scripted models.
    pub fn with_tiers(config: GatewayConfig, tiers: TierSet) -> Result<Self> {
        let context = ClientContext::new(config.client_context.clone())?;
        let registry = AgentRegistry::standard(&context)?;

        Ok(Self {
            config,
            tiers,
            registry,
            start_time: std::time::Instant::now(),
        })
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
