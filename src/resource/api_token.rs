//! `api_token` resource
//!
//! The API has no point read for platform tokens: Read lists every token of
//! the account and scans for the name. Listing never returns the secret, so
//! the token value only ever comes from create or import.

use super::{remote_object, transport};
use declarative::{
    AttributeSpec, Attributes, DeletePolicy, GatewayError, ImportSpec, Lifecycle, Lookup,
    MissingPolicy, RefreshPolicy, RemoteObject, ResourceGateway, ResourceSchema, Scope,
    UpdatePolicy, ValueKind, find_by,
};
use tursokit::Api;

pub static SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "api_token",
    description: "A platform API token",
    attributes: &[
        AttributeSpec::required("name", ValueKind::String)
            .immutable()
            .describe("Token name, unique within the account"),
        AttributeSpec::computed("id", ValueKind::String).describe("Token identifier"),
        AttributeSpec::computed("token", ValueKind::String)
            .sensitive()
            .preserve_prior()
            .describe("The token secret"),
    ],
    identity: &["name"],
    import: Some(ImportSpec::new(&["name", "token"], &["name", "token"])),
    lifecycle: Lifecycle {
        update: UpdatePolicy::NoOp,
        delete: DeletePolicy::Remote,
        refresh: RefreshPolicy::Remote,
        on_missing: MissingPolicy::Forget,
    },
};

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

    fn create(&self, scope: &Scope, _attributes: &Attributes) -> Result<RemoteObject, GatewayError> {
        let created = self
            .api
            .create_api_token(scope.str("name")?)
            .map_err(transport)?;
        Ok(remote_object([
            ("id", Some(created.id.into())),
            ("token", Some(created.token.into())),
        ]))
    }

    fn read(&self, scope: &Scope) -> Result<Lookup<RemoteObject>, GatewayError> {
        let name = scope
            .get("name")
            .ok_or_else(|| GatewayError::invalid("name", "identifying attribute is not set"))?;
        let tokens = self.list(scope)?;
        log::trace!("scanning {} api tokens for {name}", tokens.len());
        Ok(find_by(tokens, "name", name))
    }

    fn delete(&self, scope: &Scope) -> Result<(), GatewayError> {
        self.api
            .revoke_api_token(scope.str("name")?)
            .map_err(transport)
    }

    fn list(&self, _scope: &Scope) -> Result<Vec<RemoteObject>, GatewayError> {
        let tokens = self.api.list_api_tokens().map_err(transport)?;
        Ok(tokens
            .into_iter()
            .map(|t| {
                remote_object([
                    ("name", Some(t.name.into())),
                    ("id", Some(t.id.into())),
                ])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{DiagnosticKind, Plan, Reconciler};
    use tursokit::MockApi;

    fn plan(name: &str) -> Plan {
        Plan::new()
            .with("name", name)
            .with_unknown("id")
            .with_unknown("token")
    }

    #[test]
    fn test_create_returns_secret_once() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let state = Reconciler::new(&gateway).create(&plan("ci")).state.unwrap();

        assert_eq!(state.get_str("id"), Some("tok-1"));
        assert_eq!(state.get_str("token"), Some("turso-api-ci-1"));
    }

    #[test]
    fn test_read_scans_list_and_keeps_token() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let reconciler = Reconciler::new(&gateway);
        reconciler.create(&plan("deploy")).state.unwrap();
        let prior = reconciler.create(&plan("ci")).state.unwrap();

        let read = reconciler.read(&prior);
        let state = read.state.unwrap();
        assert_eq!(state.get_str("id"), Some("tok-2"));
        assert_eq!(state.get_str("token"), prior.get_str("token"));
        assert!(api.calls().contains(&"GET /v1/auth/api-tokens".to_string()));
    }

    #[test]
    fn test_import_populates_name_and_token() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let reconciler = Reconciler::new(&gateway);
        reconciler.create(&plan("ci")).state.unwrap();

        let outcome = reconciler.import("ci/turso-api-ci-1");
        assert!(!outcome.has_error());
        let state = outcome.state.unwrap();
        assert_eq!(state.get_str("name"), Some("ci"));
        assert_eq!(state.get_str("id"), Some("tok-1"));
        assert_eq!(state.get_str("token"), Some("turso-api-ci-1"));
    }

    #[test]
    fn test_import_unknown_name_reports_gap() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let outcome = Reconciler::new(&gateway).import("ghost/secret");

        assert!(outcome.is_not_found());
        let state = outcome.state.unwrap();
        assert_eq!(state.get_str("name"), Some("ghost"));
        assert!(!state.contains("id"));
    }

    #[test]
    fn test_revoke_and_transport_failure() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let reconciler = Reconciler::new(&gateway);
        let state = reconciler.create(&plan("ci")).state.unwrap();

        assert!(reconciler.delete(&state).is_empty());
        assert!(api.list_api_tokens().unwrap().is_empty());

        api.set_offline(true);
        let read = reconciler.read(&state);
        assert!(read.state.is_none());
        assert!(read.diagnostics.has_kind(DiagnosticKind::Transport));
        assert!(!read.is_not_found());
    }

    #[test]
    fn test_import_rejects_extra_delimiter() {
        let api = MockApi::new();
        let gateway = Gateway::new(&api);
        let reconciler = Reconciler::new(&gateway);

        let err = reconciler.decode_import_identifier("acme/orders/eu").unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::Validation);
        assert!(err.detail.contains("name/token"));

        assert!(reconciler.import("ci/tok/extra").state.is_none());
        assert!(api.calls().is_empty());
    }
}
