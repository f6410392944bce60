//! Gateway configuration.
//!
//! Config files are TOML. On Unix the loader validates file permissions
//! and refuses world-readable files that carry API keys; keys belong in
//! the environment (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`).

use arachne_graph::GraphConfig;
use arachne_llm::TiersConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Main gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address to bind the server to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment context for the agent roster. Entry 0 describes the
    /// company and its users; entry 1 lists the tables and their columns.
    #[serde(default = "default_client_context")]
    pub client_context: Vec<String>,

    /// Model tier providers
    #[serde(default)]
    pub tiers: TiersConfig,

    /// Graph traversal guards and tier assignments
    #[serde(default)]
    pub graph: GraphConfig,
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_client_context() -> Vec<String> {
    vec![
        "An online bookstore selling novels to retail customers".into(),
        "transactions(TRANSACTION_ID, USER_ID, USER_NAME, PRODUCT_ID, PRODUCT_NAME, \
         CATEGORY, PRICE, TRANSACTION_DATE)"
            .into(),
    ]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            client_context: default_client_context(),
            tiers: TiersConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    ///
    /// On Unix this validates that the file is a regular file, is not
    /// world-writable, and is not world-readable if it contains an API
    /// key.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        validate_config_file_permissions(path)?;

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;

        if config.tiers.fast.api_key.is_some() || config.tiers.strong.api_key.is_some() {
            warn!(
                "API key found in config file '{}'. For better security, \
                 use environment variables instead (OPENAI_API_KEY, ANTHROPIC_API_KEY).",
                path.display()
            );
        }

        Ok(config)
    }

    /// Load configuration from a TOML file without permission checks.
    ///
    /// Use this only for testing or when you've already validated the file.
    pub fn from_file_unchecked(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// The address the server binds to, `bind:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Validate config file permissions on Unix systems.
///
/// Requirements:
/// - File must be a regular file (not symlink, directory, etc.)
/// - File must not be world-writable (mode & 0o002 == 0)
/// - If file contains API key patterns, must not be world-readable
#[cfg(unix)]
fn validate_config_file_permissions(path: &std::path::Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!(
            "Config path '{}' is not a regular file. Symlinks and directories are not allowed.",
            path.display()
        );
    }

    let mode = metadata.permissions().mode();
    let permission_bits = mode & 0o777;

    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). \
             This is a security risk. Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    let content = std::fs::read_to_string(path).unwrap_or_default();
    let has_api_key =
        content.contains("api_key") && (content.contains("sk-") || content.contains("key ="));

    if has_api_key && permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains an API key but is world-readable (mode {:04o}). \
             This is a security risk. Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_api_key && permission_bits & 0o040 != 0 {
        warn!(
            "Config file '{}' contains an API key and is group-readable (mode {:04o}). \
             Consider restricting access with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.client_context.len(), 2);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_minimal_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 9090").unwrap();

        let config = GatewayConfig::from_file_unchecked(file.path()).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.graph.max_hops, 24);
        assert_eq!(config.tiers.fast.provider, "openai");
    }

    #[test]
    fn test_full_file_round_trip() {
        let toml_str = r#"
bind = "0.0.0.0"
port = 8081
client_context = [
    "A hardware store",
    "orders(id, sku, quantity)",
]

[tiers.fast]
provider = "openai"
model = "llama3.2"

[tiers.strong]
provider = "anthropic"
model = "claude-sonnet-4-20250514"

[graph]
max_hops = 12
node_timeout_ms = 60000
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_str.as_bytes()).unwrap();

        let config = GatewayConfig::from_file_unchecked(file.path()).unwrap();
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.client_context[0], "A hardware store");
        assert_eq!(config.tiers.strong.provider, "anthropic");
        assert_eq!(config.graph.max_hops, 12);
        assert_eq!(config.graph.node_timeout_ms, 60_000);
    }

    #[cfg(unix)]
    #[test]
    fn test_world_writable_file_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 8080").unwrap();
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o666)).unwrap();

        let err = GatewayConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-writable"));
    }

    #[cfg(unix)]
    #[test]
    fn test_world_readable_file_with_api_key_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tiers.strong]").unwrap();
        writeln!(file, "provider = \"anthropic\"").unwrap();
        writeln!(file, "model = \"claude-sonnet-4-20250514\"").unwrap();
        writeln!(file, "api_key = \"sk-ant-secret\"").unwrap();
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        let err = GatewayConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-readable"));
    }

    #[cfg(unix)]
    #[test]
    fn test_private_file_with_api_key_accepted() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tiers.strong]").unwrap();
        writeln!(file, "provider = \"anthropic\"").unwrap();
        writeln!(file, "model = \"claude-sonnet-4-20250514\"").unwrap();
        writeln!(file, "api_key = \"sk-ant-secret\"").unwrap();
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600)).unwrap();

        let config = GatewayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tiers.strong.api_key.as_deref(), Some("sk-ant-secret"));
    }
}
