//! # tursokit
//!
//! Blocking client for the Turso Platform API.
//!
//! This crate provides:
//! - Typed request/response models for databases, configuration, tokens,
//!   organizations and instances
//! - An [`Api`] trait with an HTTP implementation ([`HttpApi`]) and an
//!   in-memory one for tests ([`MockApi`])
//! - A categorized error type that separates "not found" from failed calls
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tursokit::{Api, ClientConfig, HttpApi};
//!
//! let config = ClientConfig::new(std::env::var("TURSO_API_TOKEN").unwrap())
//!     .with_timeout(Duration::from_secs(10));
//! let api = HttpApi::new(&config).expect("valid configuration");
//!
//! for token in api.list_api_tokens().unwrap() {
//!     println!("{} ({})", token.name, token.id);
//! }
//! ```

pub mod backend;
pub mod error;
pub mod types;

pub use backend::http::HttpApi;
pub use backend::{Api, MockApi};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    ApiToken, CreateDatabaseInput, CreateDatabaseTokenInput, CreatedApiToken, Database,
    DatabaseConfiguration, DatabaseToken, Instance, InstanceType, Organization,
    TokenAuthorization,
};

use std::time::Duration;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.turso.tech";

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Platform API token, sent as a bearer token.
    pub api_token: String,
    /// Global deadline for each request.
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: api_token.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("tursokit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.user_agent.starts_with("tursokit/"));
    }

    #[test]
    fn test_client_config_builders() {
        let config = ClientConfig::new("secret")
            .with_base_url("http://127.0.0.1:9000")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("tursoform/0.1.0");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "tursoform/0.1.0");
    }
}
