//! Turso resource kinds
//!
//! Every managed kind is a static [`ResourceSchema`] plus a gateway that maps
//! attribute maps onto the Platform API:
//! - `database` - a database inside an organization group
//! - `database_configuration` - size limit and access blocks of a database
//! - `database_token` - a minted database access token
//! - `api_token` - a platform API token

pub mod api_token;
pub mod database;
pub mod database_configuration;
pub mod database_token;

use anyhow::bail;
use declarative::{Attributes, GatewayError, Lookup, ResourceGateway, ResourceSchema, Value};
use std::fmt;
use std::str::FromStr;
use tursokit::Api;

/// Closed set of managed resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Database,
    DatabaseConfiguration,
    DatabaseToken,
    ApiToken,
}

impl ResourceType {
    pub const ALL: [Self; 4] = [
        Self::Database,
        Self::DatabaseConfiguration,
        Self::DatabaseToken,
        Self::ApiToken,
    ];

    /// Attribute policy table of this kind
    pub fn schema(self) -> &'static ResourceSchema {
        match self {
            Self::Database => &database::SCHEMA,
            Self::DatabaseConfiguration => &database_configuration::SCHEMA,
            Self::DatabaseToken => &database_token::SCHEMA,
            Self::ApiToken => &api_token::SCHEMA,
        }
    }

    pub fn name(self) -> &'static str {
        self.schema().type_name
    }

    /// Gateway for this kind over a shared API client
    pub fn gateway(self, api: &dyn Api) -> Box<dyn ResourceGateway + '_> {
        match self {
            Self::Database => Box::new(database::Gateway::new(api)),
            Self::DatabaseConfiguration => Box::new(database_configuration::Gateway::new(api)),
            Self::DatabaseToken => Box::new(database_token::Gateway::new(api)),
            Self::ApiToken => Box::new(api_token::Gateway::new(api)),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(found) = Self::ALL.into_iter().find(|t| t.name() == s) {
            return Ok(found);
        }
        let known: Vec<&str> = Self::ALL.iter().map(|t| t.name()).collect();
        bail!(
            "Unknown resource type {s:?} (expected one of: {})",
            known.join(", ")
        )
    }
}

// ============================================================================
// API -> gateway mapping helpers
// ============================================================================

/// A failed API call, with its status kept for diagnostics
pub(crate) fn transport(err: tursokit::Error) -> GatewayError {
    GatewayError::transport(err.to_string(), err.status())
}

/// Point lookup where a 404 is an answer, not a failure
pub(crate) fn lookup<T>(result: tursokit::Result<T>) -> Result<Lookup<T>, GatewayError> {
    match result {
        Ok(found) => Ok(Lookup::Found(found)),
        Err(err) if err.is_not_found() => Ok(Lookup::NotFound),
        Err(err) => Err(transport(err)),
    }
}

pub(crate) fn required_str<'a>(
    attributes: &'a Attributes,
    name: &str,
) -> Result<&'a str, GatewayError> {
    attributes
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::invalid(name, "expected a string"))
}

pub(crate) fn optional_str(attributes: &Attributes, name: &str) -> Option<String> {
    attributes
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub(crate) fn optional_bool(attributes: &Attributes, name: &str) -> Option<bool> {
    attributes.get(name).and_then(Value::as_bool)
}

/// Collect the set fields of a response into a remote object
pub(crate) fn remote_object<const N: usize>(
    fields: [(&str, Option<Value>); N],
) -> Attributes {
    fields
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
}
