//! `database_token` resource
//!
//! A token is minted once and never shown again. The API cannot read, update,
//! revoke or look up a single token, so every operation after create is a
//! declared no-op and the minted JWT lives only in state.

use super::{optional_str, remote_object, transport};
use declarative::{
    AttributeSpec, Attributes, DeletePolicy, GatewayError, Lifecycle, Lookup, MissingPolicy,
    RefreshPolicy, RemoteObject, ResourceGateway, ResourceSchema, Scope, UpdatePolicy, Value,
    ValueKind,
};
use tursokit::{Api, CreateDatabaseTokenInput, TokenAuthorization};

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "database_token",
    description: "An access token for one database",
    attributes: &[
        AttributeSpec::required("organization_name", ValueKind::String)
            .immutable()
            .describe("Organization that owns the database"),
        AttributeSpec::required("database_name", ValueKind::String)
            .immutable()
            .describe("Database the token grants access to"),
        AttributeSpec::optional("expiration", ValueKind::String)
            .immutable()
            .describe("Token lifetime, e.g. 2w1d30m, or never"),
        AttributeSpec::optional("authorization", ValueKind::String)
            .immutable()
            .validated(valid_authorization)
            .describe("full-access or read-only"),
        AttributeSpec::computed("jwt", ValueKind::String)
            .sensitive()
            .preserve_prior()
            .describe("The minted token"),
    ],
    identity: &["organization_name", "database_name"],
    import: None,
    lifecycle: Lifecycle {
        update: UpdatePolicy::NoOp,
        delete: DeletePolicy::NoOp,
        refresh: RefreshPolicy::KeepPrior,
        on_missing: MissingPolicy::Forget,
    },
};

fn valid_authorization(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(s) => s.parse::<TokenAuthorization>().map(|_| ()),
        None => Ok(()),
    }
}

pub struct Gateway<'a> {
    api: &'a dyn Api,
}

impl<'a> Gateway<'a> {
    pub fn new(api: &'a dyn Api) -> Self {
        Self { api }
    }
}

impl ResourceGateway for Gateway<'_> {
    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    fn create(&self, scope: &Scope, attributes: &Attributes) -> Result<RemoteObject, GatewayError> {
        let org = scope.str("organization_name")?;
        let database = scope.str("database_name")?;
        let authorization = optional_str(attributes, "authorization")
            .map(|s| s.parse::<TokenAuthorization>())
            .transpose()
            .map_err(|reason| GatewayError::invalid("authorization", reason))?;
        let input = CreateDatabaseTokenInput {
            expiration: optional_str(attributes, "expiration"),
            authorization,
        };

        let token = self
            .api
            .create_database_token(org, database, &input)
            .map_err(transport)?;
        Ok(remote_object([("jwt", Some(token.jwt.into()))]))
    }

    fn read(&self, _scope: &Scope) -> Result<Lookup<RemoteObject>, GatewayError> {
        Err(GatewayError::Unsupported {
            resource_type: SCHEMA.type_name,
            operation: "read",
        })
    }
}
