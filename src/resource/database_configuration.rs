//! `database_configuration` resource
//!
//! The configuration endpoint has no partial-update semantics, so create and
//! update both PATCH the whole mutable set. The configuration lives and dies
//! with its database; delete only forgets state.

use super::{lookup, optional_bool, optional_str, remote_object, transport};
use declarative::{
    AttributeSpec, Attributes, DeletePolicy, GatewayError, ImportSpec, Lifecycle, Lookup,
    MissingPolicy, RefreshPolicy, RemoteObject, ResourceGateway, ResourceSchema, Scope,
    UpdatePolicy, Value, ValueKind,
};
use tursokit::{Api, DatabaseConfiguration};

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "database_configuration",
    description: "Size limit and access blocks of a database",
    attributes: &[
        AttributeSpec::required("organization_slug", ValueKind::String)
            .immutable()
            .describe("Organization that owns the database"),
        AttributeSpec::required("database_name", ValueKind::String)
            .immutable()
            .describe("Database to configure"),
        AttributeSpec::optional("size_limit", ValueKind::String)
            .describe("Maximum database size, e.g. 256mb"),
        AttributeSpec::optional("block_reads", ValueKind::Bool)
            .describe("Reject read queries"),
        AttributeSpec::optional("block_writes", ValueKind::Bool)
            .describe("Reject write queries"),
        AttributeSpec::optional("delete_protection", ValueKind::Bool)
            .describe("Refuse database deletion"),
    ],
    identity: &["organization_slug", "database_name"],
    import: Some(ImportSpec::new(
        &["organization", "database"],
        &["organization_slug", "database_name"],
    )),
    lifecycle: Lifecycle {
        update: UpdatePolicy::FullSet,
        delete: DeletePolicy::NoOp,
        refresh: RefreshPolicy::Remote,
        on_missing: MissingPolicy::Fail,
    },
};

fn configuration(attributes: &Attributes) -> DatabaseConfiguration {
    DatabaseConfiguration {
        size_limit: optional_str(attributes, "size_limit"),
        block_reads: optional_bool(attributes, "block_reads"),
        block_writes: optional_bool(attributes, "block_writes"),
        delete_protection: optional_bool(attributes, "delete_protection"),
    }
}

fn remote_configuration(configuration: DatabaseConfiguration) -> RemoteObject {
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

pub struct Gateway<'a> {
    api: &'a dyn Api,
}

impl<'a> Gateway<'a> {
    pub fn new(api: &'a dyn Api) -> Self {
        Self { api }
    }

    fn patch(&self, scope: &Scope, attributes: &Attributes) -> Result<RemoteObject, GatewayError> {
        let org = scope.str("organization_slug")?;
        let database = scope.str("database_name")?;
        self.api
            .update_database_configuration(org, database, &configuration(attributes))
            .map(remote_configuration)
            .map_err(transport)
    }
}

impl ResourceGateway for Gateway<'_> {
    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    fn create(&self, scope: &Scope, attributes: &Attributes) -> Result<RemoteObject, GatewayError> {
        self.patch(scope, attributes)
    }

    fn read(&self, scope: &Scope) -> Result<Lookup<RemoteObject>, GatewayError> {
        let org = scope.str("organization_slug")?;
        let database = scope.str("database_name")?;
        Ok(lookup(self.api.get_database_configuration(org, database))?.map(remote_configuration))
    }

    fn update(&self, scope: &Scope, delta: &Attributes) -> Result<RemoteObject, GatewayError> {
        self.patch(scope, delta)
    }
}
