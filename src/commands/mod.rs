//! CLI command implementations

pub mod declarative;
pub mod import;
pub mod lookup;
pub mod schema;
pub mod state;

use anyhow::{Context as AnyhowContext, Result};
use tursokit::HttpApi;

use crate::config::Config;

/// Build the API client from provider configuration
pub(crate) fn connect(config: &Config) -> Result<HttpApi> {
    let client = config.client_config()?;
    let api = HttpApi::new(&client).context("Failed to create Turso API client")?;
    log::debug!("Connected to {}", api.base_url());
    Ok(api)
}
