//! Request and response models for the Turso Platform API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A database as returned by the API.
///
/// The service uses capitalized keys for the core fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Database name, unique within the organization.
    #[serde(rename = "Name")]
    pub name: String,
    /// Universal unique identifier.
    #[serde(rename = "DbId")]
    pub db_id: String,
    /// DNS hostname for libSQL and HTTP connections.
    #[serde(rename = "Hostname")]
    pub hostname: String,
    /// Group the database lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Whether this is a parent schema database.
    #[serde(default)]
    pub is_schema: bool,
    /// Parent schema database, for child databases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// Body of a create-database request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDatabaseInput {
    pub name: String,
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_schema: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// Database configuration, used both as request and response.
///
/// Unset fields are left out of PATCH requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfiguration {
    /// Maximum size, e.g. `256mb` or `1gb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reads: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_writes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_protection: Option<bool>,
}

impl DatabaseConfiguration {
    /// Overlay the fields set in `patch`.
    pub fn apply(&mut self, patch: &Self) {
        if let Some(size_limit) = &patch.size_limit {
            self.size_limit = Some(size_limit.clone());
        }
        if patch.block_reads.is_some() {
            self.block_reads = patch.block_reads;
        }
        if patch.block_writes.is_some() {
            self.block_writes = patch.block_writes;
        }
        if patch.delete_protection.is_some() {
            self.delete_protection = patch.delete_protection;
        }
    }
}

/// Access level granted by a database token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenAuthorization {
    #[default]
    FullAccess,
    ReadOnly,
}

impl TokenAuthorization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullAccess => "full-access",
            Self::ReadOnly => "read-only",
        }
    }
}

impl fmt::Display for TokenAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenAuthorization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-access" => Ok(Self::FullAccess),
            "read-only" => Ok(Self::ReadOnly),
            other => Err(format!(
                "unknown authorization {other:?} (expected full-access or read-only)"
            )),
        }
    }
}

/// Query parameters for minting a database token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateDatabaseTokenInput {
    /// Lifetime such as `2w1d30m`, or `never`.
    pub expiration: Option<String>,
    pub authorization: Option<TokenAuthorization>,
}

/// A freshly minted database token. The JWT is only ever shown once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseToken {
    pub jwt: String,
}

/// A platform API token as listed by the API (no secret).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: String,
    pub name: String,
}

/// A freshly created platform API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedApiToken {
    pub id: String,
    pub name: String,
    pub token: String,
}

/// An organization (or personal account).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    pub slug: String,
    /// `personal` or `team`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Role of a database instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Primary,
    Replica,
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Replica => f.write_str("replica"),
        }
    }
}

/// One location a database is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub uuid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InstanceType,
    pub region: String,
    pub hostname: String,
}
