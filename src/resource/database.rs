//! `database` resource
//!
//! Only `size_limit` can change in place; it is sent through the database
//! configuration endpoint. Every other user-set attribute forces replacement.

use super::{lookup, optional_bool, optional_str, remote_object, required_str, transport};
use declarative::{
    AttributeSpec, Attributes, DeletePolicy, GatewayError, ImportSpec, Lifecycle, Lookup,
    MissingPolicy, RefreshPolicy, RemoteObject, ResourceGateway, ResourceSchema, Scope,
    UpdatePolicy, Value, ValueKind,
};
use regex::Regex;
use std::sync::LazyLock;
use tursokit::{Api, CreateDatabaseInput, Database, DatabaseConfiguration};

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "database",
    description: "A database in a Turso organization",
    attributes: &[
        AttributeSpec::required("organization_name", ValueKind::String)
            .immutable()
            .describe("Organization that owns the database"),
        AttributeSpec::required("name", ValueKind::String)
            .immutable()
            .validated(valid_name)
            .describe("Database name, unique within the organization"),
        AttributeSpec::required("group", ValueKind::String)
            .immutable()
            .describe("Group the database is placed in"),
        AttributeSpec::optional("size_limit", ValueKind::String)
            .describe("Maximum database size, e.g. 256mb"),
        AttributeSpec::optional("is_schema", ValueKind::Bool)
            .immutable()
            .describe("Create a parent schema database"),
        AttributeSpec::optional("schema", ValueKind::String)
            .immutable()
            .describe("Parent schema database to attach to"),
        AttributeSpec::computed("db_id", ValueKind::String)
            .preserve_prior()
            .describe("Universal unique identifier"),
        AttributeSpec::computed("hostname", ValueKind::String)
            .preserve_prior()
            .describe("DNS hostname for libSQL and HTTP connections"),
    ],
    identity: &["organization_name", "name"],
    import: Some(ImportSpec::new(
        &["organization", "name"],
        &["organization_name", "name"],
    )),
    lifecycle: Lifecycle {
        update: UpdatePolicy::Delta,
        delete: DeletePolicy::Remote,
        refresh: RefreshPolicy::Remote,
        on_missing: MissingPolicy::Forget,
    },
};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]{1,32}$").expect("Invalid database name regex"));

fn valid_name(value: &Value) -> Result<(), String> {
    let Some(name) = value.as_str() else {
        return Ok(());
    };
    if NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(format!(
            "database name {name:?} must be 1 to 32 lowercase letters, digits or dashes"
        ))
    }
}

fn remote_database(db: Database) -> RemoteObject {
    remote_object([
        ("db_id", Some(db.db_id.into())),
        ("hostname", Some(db.hostname.into())),
        ("group", db.group.map(Value::from)),
        ("is_schema", Some(db.is_schema.into())),
        ("schema", db.schema.map(Value::from)),
    ])
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
        let input = CreateDatabaseInput {
            name: scope.str("name")?.to_string(),
            group: required_str(attributes, "group")?.to_string(),
            size_limit: optional_str(attributes, "size_limit"),
            is_schema: optional_bool(attributes, "is_schema"),
            schema: optional_str(attributes, "schema"),
        };

        let db = self.api.create_database(org, &input).map_err(transport)?;
        log::debug!("created database {} ({})", db.name, db.db_id);

        // The create response carries no reliable group/schema fields
        Ok(remote_object([
            ("db_id", Some(db.db_id.into())),
            ("hostname", Some(db.hostname.into())),
        ]))
    }

    fn read(&self, scope: &Scope) -> Result<Lookup<RemoteObject>, GatewayError> {
        let org = scope.str("organization_name")?;
        let name = scope.str("name")?;
        Ok(lookup(self.api.get_database(org, name))?.map(remote_database))
    }

    fn update(&self, scope: &Scope, delta: &Attributes) -> Result<RemoteObject, GatewayError> {
        let org = scope.str("organization_name")?;
        let name = scope.str("name")?;
        let patch = DatabaseConfiguration {
            size_limit: optional_str(delta, "size_limit"),
            ..Default::default()
        };

        let configuration = self
            .api
            .update_database_configuration(org, name, &patch)
            .map_err(transport)?;
        Ok(remote_object([(
            "size_limit",
            configuration.size_limit.map(Value::from),
        )]))
    }

    fn delete(&self, scope: &Scope) -> Result<(), GatewayError> {
        let org = scope.str("organization_name")?;
        let name = scope.str("name")?;
        self.api.delete_database(org, name).map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{DiagnosticKind, Plan, Reconciler, State};
    use tursokit::MockApi;

    fn plan() -> Plan {
        Plan::new()
            .with("organization_name", "acme")
            .with("name", "orders")
            .with("group", "default")
            .with_unknown("db_id")
            .with_unknown("hostname")
    }

    fn created(api: &MockApi) -> State {
        let gateway = Gateway::new(api);
        let outcome = Reconciler::new(&gateway).create(&plan());
        assert!(!outcome.has_error(), "{:?}", outcome.diagnostics);
        outcome.state.unwrap()
    }

    #[test]
    fn test_create_fills_computed_fields() {
        let api = MockApi::new();
        let state = created(&api);

        assert_eq!(
            state.get_str("db_id"),
            Some("00000000-0000-4000-8000-000000000001")
        );
        assert_eq!(state.get_str("hostname"), Some("orders-acme.turso.io"));
        assert_eq!(state.get_str("organization_name"), Some("acme"));
        assert_eq!(state.get_str("name"), Some("orders"));
        assert_eq!(state.get_str("group"), Some("default"));
        assert_eq!(state.len(), 5);
    }

    #[test]
    fn test_invalid_name_never_reaches_api() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let outcome = Reconciler::new(&gateway).create(&plan().with("name", "Orders_DB"));

        assert!(outcome.state.is_none());
        assert!(outcome.diagnostics.has_kind(DiagnosticKind::Validation));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_name_pattern() {
        assert!(valid_name(&Value::from("orders-2")).is_ok());
        assert!(valid_name(&Value::from("a".repeat(32))).is_ok());
        assert!(valid_name(&Value::from("a".repeat(33))).is_err());
        assert!(valid_name(&Value::from("")).is_err());
        assert!(valid_name(&Value::from("has space")).is_err());
    }

    #[test]
    fn test_read_keeps_preserved_identifiers() {
        let api = MockApi::new();
        let mut prior = created(&api);
        prior.set("db_id", "pinned-id");

        let gateway = Gateway::new(&api);
        let read = Reconciler::new(&gateway).read(&prior);
        let state = read.state.unwrap();
        assert_eq!(state.get_str("db_id"), Some("pinned-id"));
        assert_eq!(state.get_bool("is_schema"), Some(false));
    }

    #[test]
    fn test_read_missing_database_is_not_found() {
        let api = MockApi::new();
        let prior = created(&api);
        api.forget_database("acme", "orders");

        let gateway = Gateway::new(&api);
        let outcome = Reconciler::new(&gateway).read(&prior);
        assert!(outcome.is_not_found());
        assert!(!outcome.has_error());
        assert_eq!(outcome.state, Some(prior));
    }

    #[test]
    fn test_update_sends_size_limit_to_configuration() {
        let api = MockApi::new();
        let prior = created(&api);
        let gateway = Gateway::new(&api);

        let next = plan()
            .with("size_limit", "2gb")
            .with("db_id", prior.get_str("db_id").unwrap())
            .with("hostname", "orders-acme.turso.io");
        let outcome = Reconciler::new(&gateway).update(&prior, &next);

        assert!(!outcome.has_error(), "{:?}", outcome.diagnostics);
        assert_eq!(outcome.state.unwrap().get_str("size_limit"), Some("2gb"));
        assert_eq!(
            api.get_database_configuration("acme", "orders")
                .unwrap()
                .size_limit
                .as_deref(),
            Some("2gb")
        );
        assert!(
            api.calls()
                .contains(&"PATCH /v1/organizations/acme/databases/orders/configuration".to_string())
        );
    }

    #[test]
    fn test_update_rejects_group_change() {
        let api = MockApi::new();
        let prior = created(&api);
        let gateway = Gateway::new(&api);
        let calls_before = api.calls().len();

        let outcome = Reconciler::new(&gateway).update(&prior, &plan().with("group", "eu"));
        assert!(outcome.state.is_none());
        assert!(outcome.has_error());
        assert!(SCHEMA.requires_replacement(&prior, &plan().with("group", "eu")));
        assert_eq!(api.calls().len(), calls_before);
    }

    #[test]
    fn test_delete_absent_database_is_transport_error() {
        let api = MockApi::new();
        let state = State::new()
            .with("organization_name", "acme")
            .with("name", "ghost")
            .with("group", "default");
        let gateway = Gateway::new(&api);

        let diagnostics = Reconciler::new(&gateway).delete(&state);
        assert!(diagnostics.has_error());
        assert!(diagnostics.has_kind(DiagnosticKind::Transport));
        let detail = &diagnostics.iter().next().unwrap().detail;
        assert!(detail.contains("Unable to delete database"));
        assert!(detail.contains("not found"));
    }

    #[test]
    fn test_import_by_identifier() {
        let api = MockApi::new();
        created(&api);
        let gateway = Gateway::new(&api);
        let reconciler = Reconciler::new(&gateway);

        let outcome = reconciler.import("acme/orders");
        assert!(!outcome.has_error());
        let state = outcome.state.unwrap();
        assert_eq!(state.get_str("hostname"), Some("orders-acme.turso.io"));
        assert_eq!(state.get_str("group"), Some("default"));

        let decoded = reconciler.decode_import_identifier("acme/orders").unwrap();
        assert_eq!(decoded.get_str("organization_name"), Some("acme"));
        assert_eq!(decoded.get_str("name"), Some("orders"));
    }

    #[test]
    fn test_import_identifier_without_delimiter() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let err = Reconciler::new(&gateway)
            .decode_import_identifier("acme")
            .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Validation);
        assert!(err.detail.contains("organization/name"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_import_identifier_with_extra_delimiter() {
        let api = MockApi::new();
        created(&api);
        let gateway = Gateway::new(&api);
        let reconciler = Reconciler::new(&gateway);
        let before = api.calls().len();

        for identifier in ["acme/orders/eu", "acme/orders/instances/x"] {
            let outcome = reconciler.import(identifier);
            assert!(outcome.state.is_none(), "{identifier} should be rejected");
            assert!(outcome.has_error());
        }
        assert_eq!(api.calls().len(), before);
    }

    #[test]
    fn test_import_checks_name_pattern() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let err = Reconciler::new(&gateway)
            .decode_import_identifier("acme/Orders_DB")
            .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Validation);
        assert_eq!(err.attribute.as_deref(), Some("name"));
        assert!(api.calls().is_empty());
    }
}
