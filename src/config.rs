//! Declared configuration: provider settings and resource instances
//!
//! ```toml
//! [provider]
//! api_token = "..."
//! timeout_secs = 30
//!
//! [resource.database.orders]
//! organization_name = "acme"
//! name = "orders"
//! group = "default"
//! ```

use anyhow::{Context, Result};
use declarative::{Address, Attributes, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tursokit::ClientConfig;

use crate::paths;
use crate::resource::ResourceType;

/// Environment variable holding the platform API token
pub const ENV_API_TOKEN: &str = "TURSO_API_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{address}: {attribute} is a {kind}; only strings, booleans and integers are supported")]
    UnsupportedValue {
        address: Address,
        attribute: String,
        kind: &'static str,
    },

    #[error(
        "No API token configured. Set TURSO_API_TOKEN, provider.api_token, or api_token in {credentials}"
    )]
    MissingToken { credentials: String },
}

/// The `tursoform.toml` file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Declared instances: resource type -> label -> attributes
    #[serde(default)]
    pub resource: BTreeMap<String, BTreeMap<String, toml::Table>>,
}

/// The `[provider]` section
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Platform API token; prefer the environment or the credentials file
    pub api_token: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `<config_dir>/tursoform/credentials.toml`
#[derive(Debug, Deserialize)]
struct Credentials {
    api_token: String,
}

impl Config {
    /// Load the configuration file; it must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the configuration file, or fall back to an empty one
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Config file does not exist, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        for resource_type in config.resource.keys() {
            resource_type.parse::<ResourceType>()?;
        }
        Ok(config)
    }

    /// Declared attributes of every instance, keyed by address
    pub fn desired(&self) -> Result<BTreeMap<Address, Attributes>, ConfigError> {
        let mut desired = BTreeMap::new();
        for (resource_type, instances) in &self.resource {
            for (label, table) in instances {
                let address = Address::new(resource_type.as_str(), label.as_str());
                let attributes = attributes(&address, table)?;
                desired.insert(address, attributes);
            }
        }
        Ok(desired)
    }

    /// Build API client settings, resolving the token
    pub fn client_config(&self) -> Result<ClientConfig> {
        let credentials = paths::credentials_file().ok();
        let token = resolve_api_token(
            self.provider.api_token.as_deref(),
            std::env::var(ENV_API_TOKEN).ok(),
            credentials.as_deref(),
        )?;

        let mut client = ClientConfig::new(token)
            .with_user_agent(concat!("tursoform/", env!("CARGO_PKG_VERSION")));
        if let Some(base_url) = &self.provider.base_url {
            client = client.with_base_url(base_url.as_str());
        }
        if let Some(secs) = self.provider.timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs));
        }
        Ok(client)
    }
}

fn attributes(address: &Address, table: &toml::Table) -> Result<Attributes, ConfigError> {
    table
        .iter()
        .map(|(name, value)| {
            let value = match value {
                toml::Value::String(s) => Value::String(s.clone()),
                toml::Value::Boolean(b) => Value::Bool(*b),
                toml::Value::Integer(n) => Value::Number(*n),
                other => {
                    return Err(ConfigError::UnsupportedValue {
                        address: address.clone(),
                        attribute: name.clone(),
                        kind: other.type_str(),
                    });
                }
            };
            Ok((name.clone(), value))
        })
        .collect()
}

/// Token priority: configuration, then environment, then credentials file
pub fn resolve_api_token(
    configured: Option<&str>,
    from_env: Option<String>,
    credentials: Option<&Path>,
) -> Result<String> {
    if let Some(token) = configured.filter(|t| !t.trim().is_empty()) {
        log::debug!("Using API token from provider configuration");
        return Ok(token.to_string());
    }

    if let Some(token) = from_env.filter(|t| !t.trim().is_empty()) {
        log::debug!("Using API token from {ENV_API_TOKEN}");
        return Ok(token);
    }

    if let Some(path) = credentials.filter(|p| p.exists()) {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;
        let credentials: Credentials = toml::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {}", path.display()))?;
        log::debug!("Using API token from {}", path.display());
        return Ok(credentials.api_token);
    }

    Err(ConfigError::MissingToken {
        credentials: credentials.map_or_else(
            || "the credentials file".to_string(),
            |p| p.display().to_string(),
        ),
    }
    .into())
}
