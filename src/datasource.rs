//! Read-only data sources
//!
//! Lookups for objects tursoform does not manage: an existing database, its
//! configuration, one of its instances, or an organization.

use anyhow::bail;
use declarative::{
    AttributeSpec, Attributes, DataSource, GatewayError, Lifecycle, Lookup, RemoteObject,
    ResourceSchema, Value, ValueKind,
};
use std::fmt;
use std::str::FromStr;
use tursokit::{Api, Database, DatabaseConfiguration};

use crate::resource::{lookup, remote_object, required_str};

/// Closed set of data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceType {
    Database,
    DatabaseConfiguration,
    DatabaseInstance,
    Organization,
}

impl DataSourceType {
    pub const ALL: [Self; 4] = [
        Self::Database,
        Self::DatabaseConfiguration,
        Self::DatabaseInstance,
        Self::Organization,
    ];

    pub fn schema(self) -> &'static ResourceSchema {
        match self {
            Self::Database => &DATABASE,
            Self::DatabaseConfiguration => &DATABASE_CONFIGURATION,
            Self::DatabaseInstance => &DATABASE_INSTANCE,
            Self::Organization => &ORGANIZATION,
        }
    }

    pub fn name(self) -> &'static str {
        self.schema().type_name
    }

    pub fn source(self, api: &dyn Api) -> Box<dyn DataSource + '_> {
        Box::new(Source { kind: self, api })
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataSourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(found) = Self::ALL.into_iter().find(|t| t.name() == s) {
            return Ok(found);
        }
        let known: Vec<&str> = Self::ALL.iter().map(|t| t.name()).collect();
        bail!(
            "Unknown data source {s:?} (expected one of: {})",
            known.join(", ")
        )
    }
}

// ============================================================================
// Schemas
// ============================================================================

pub static DATABASE: ResourceSchema = ResourceSchema {
    type_name: "database",
    description: "Look up an existing database",
    attributes: &[
        AttributeSpec::required("organization_name", ValueKind::String),
        AttributeSpec::required("name", ValueKind::String),
        AttributeSpec::computed("group", ValueKind::String),
        AttributeSpec::computed("is_schema", ValueKind::Bool),
        AttributeSpec::computed("schema", ValueKind::String),
        AttributeSpec::computed("db_id", ValueKind::String),
        AttributeSpec::computed("hostname", ValueKind::String),
    ],
    identity: &["organization_name", "name"],
    import: None,
    lifecycle: Lifecycle::READ_ONLY,
};

pub static DATABASE_CONFIGURATION: ResourceSchema = ResourceSchema {
    type_name: "database_configuration",
    description: "Look up the configuration of a database",
    attributes: &[
        AttributeSpec::required("organization_slug", ValueKind::String),
        AttributeSpec::required("database_name", ValueKind::String),
        AttributeSpec::computed("size_limit", ValueKind::String),
        AttributeSpec::computed("block_reads", ValueKind::Bool),
        AttributeSpec::computed("block_writes", ValueKind::Bool),
        AttributeSpec::computed("delete_protection", ValueKind::Bool),
    ],
    identity: &["organization_slug", "database_name"],
    import: None,
    lifecycle: Lifecycle::READ_ONLY,
};

pub static DATABASE_INSTANCE: ResourceSchema = ResourceSchema {
    type_name: "database_instance",
    description: "Look up one location a database is served from",
    attributes: &[
        AttributeSpec::required("organization_slug", ValueKind::String),
        AttributeSpec::required("database_name", ValueKind::String),
        AttributeSpec::required("name", ValueKind::String).describe("Instance name"),
        AttributeSpec::computed("uuid", ValueKind::String),
        AttributeSpec::computed("type", ValueKind::String).describe("primary or replica"),
        AttributeSpec::computed("region", ValueKind::String),
        AttributeSpec::computed("hostname", ValueKind::String),
    ],
    identity: &["organization_slug", "database_name", "name"],
    import: None,
    lifecycle: Lifecycle::READ_ONLY,
};

pub static ORGANIZATION: ResourceSchema = ResourceSchema {
    type_name: "organization",
    description: "Look up an organization or personal account",
    attributes: &[
        AttributeSpec::required("slug", ValueKind::String),
        AttributeSpec::computed("name", ValueKind::String),
        AttributeSpec::computed("type", ValueKind::String).describe("personal or team"),
    ],
    identity: &["slug"],
    import: None,
    lifecycle: Lifecycle::READ_ONLY,
};

// ============================================================================
// Lookups
// ============================================================================

struct Source<'a> {
    kind: DataSourceType,
    api: &'a dyn Api,
}

fn database(db: Database) -> RemoteObject {
    remote_object([
        ("group", db.group.map(Value::from)),
        ("is_schema", Some(db.is_schema.into())),
        ("schema", db.schema.map(Value::from)),
        ("db_id", Some(db.db_id.into())),
        ("hostname", Some(db.hostname.into())),
    ])
}

fn configuration(configuration: DatabaseConfiguration) -> RemoteObject {
    remote_object([
        ("size_limit", configuration.size_limit.map(Value::from)),
        ("block_reads", configuration.block_reads.map(Value::from)),
        ("block_writes", configuration.block_writes.map(Value::from)),
        (
            "delete_protection",
            configuration.delete_protection.map(Value::from),
        ),
    ])
}

impl DataSource for Source<'_> {
    fn schema(&self) -> &'static ResourceSchema {
        self.kind.schema()
    }

    fn read(&self, keys: &Attributes) -> Result<Lookup<RemoteObject>, GatewayError> {
        let api = self.api;
        match self.kind {
            DataSourceType::Database => {
                let org = required_str(keys, "organization_name")?;
                let name = required_str(keys, "name")?;
                Ok(lookup(api.get_database(org, name))?.map(database))
            }
            DataSourceType::DatabaseConfiguration => {
                let org = required_str(keys, "organization_slug")?;
                let db = required_str(keys, "database_name")?;
                Ok(lookup(api.get_database_configuration(org, db))?.map(configuration))
            }
            DataSourceType::DatabaseInstance => {
                let org = required_str(keys, "organization_slug")?;
                let db = required_str(keys, "database_name")?;
                let name = required_str(keys, "name")?;
                Ok(lookup(api.get_instance(org, db, name))?.map(|i| {
                    remote_object([
                        ("uuid", Some(i.uuid.into())),
                        ("type", Some(i.kind.to_string().into())),
                        ("region", Some(i.region.into())),
                        ("hostname", Some(i.hostname.into())),
                    ])
                }))
            }
            DataSourceType::Organization => {
                let slug = required_str(keys, "slug")?;
                Ok(lookup(api.get_organization(slug))?.map(|o| {
                    remote_object([
                        ("name", Some(o.name.into())),
                        ("type", Some(o.kind.into())),
                    ])
                }))
            }
        }
    }
}

/// Parse `key=value` arguments into lookup keys, typed by the schema
pub fn parse_keys(schema: &ResourceSchema, pairs: &[String]) -> anyhow::Result<Attributes> {
    let mut keys = Attributes::new();
    for pair in pairs {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("Expected key=value, got {pair:?}");
        };
        let value = match schema.policy(name).map(|spec| spec.kind) {
            Some(ValueKind::Bool) => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => bail!("{name} must be true or false, got {raw:?}"),
            },
            Some(ValueKind::Number) => match raw.parse::<i64>() {
                Ok(n) => Value::Number(n),
                Err(_) => bail!("{name} must be a number, got {raw:?}"),
            },
            _ => Value::from(raw),
        };
        keys.insert(name.to_string(), value);
    }
    Ok(keys)
}
