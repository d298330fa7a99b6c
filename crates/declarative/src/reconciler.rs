//! The resource reconciler - one generic state machine for every resource type
//!
//! ```text
//! Absent --create/import--> Persisted --update*--> Persisted --delete--> Absent
//! ```
//!
//! The reconciler holds no state between calls: it borrows a gateway, takes
//! plans and states by reference and hands back new state plus diagnostics.
//! Failed calls never produce a partially merged state.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::gateway::{GatewayError, Lookup, RemoteObject, ResourceGateway, Scope};
use crate::schema::{DeletePolicy, RefreshPolicy, ResourceSchema, UpdatePolicy};
use crate::value::{Attributes, Plan, PlanValue, State, Value};

/// Result of a reconciliation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// New state; `None` when the call failed and prior state must be kept
    pub state: Option<State>,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    fn committed(state: State, diagnostics: Diagnostics) -> Self {
        Self {
            state: Some(state),
            diagnostics,
        }
    }

    fn failed(diagnostics: impl Into<Diagnostics>) -> Self {
        Self {
            state: None,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    /// The remote object was reported missing
    pub fn is_not_found(&self) -> bool {
        self.diagnostics.has_kind(DiagnosticKind::NotFound)
    }
}

/// Turn a gateway failure into a diagnostic
///
/// The underlying error text is always kept in the detail.
pub fn gateway_diagnostic(schema: &ResourceSchema, action: &str, err: &GatewayError) -> Diagnostic {
    match err {
        GatewayError::Transport { .. } => Diagnostic::transport(
            "Client Error",
            format!(
                "Unable to {action} {}, got error: {err}",
                schema.type_name
            ),
        ),
        GatewayError::Unsupported { .. } => {
            Diagnostic::error(DiagnosticKind::Unsupported, "Unsupported operation", err.to_string())
        }
        GatewayError::InvalidAttribute { attribute, .. } => {
            Diagnostic::validation("Invalid attribute", err.to_string()).with_attribute(attribute)
        }
    }
}

/// Drives create/read/update/delete/import for one resource type
pub struct Reconciler<'g, G: ResourceGateway + ?Sized> {
    gateway: &'g G,
    schema: &'static ResourceSchema,
}

impl<'g, G: ResourceGateway + ?Sized> Reconciler<'g, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self {
            gateway,
            schema: gateway.schema(),
        }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    /// Create the remote object described by `plan`
    pub fn create(&self, plan: &Plan) -> Outcome {
        let diagnostics = self.schema.validate_plan(plan, None);
        if diagnostics.has_error() {
            return Outcome::failed(diagnostics);
        }

        let attributes = plan.known_values();
        let scope = match Scope::from_values(self.schema, &attributes) {
            Ok(scope) => scope,
            Err(err) => return Outcome::failed(self.fail("create", &err)),
        };

        match self.gateway.create(&scope, &attributes) {
            Ok(remote) => {
                log::trace!("created {} {}", self.schema.type_name, scope);
                let state = self.overwrite(State::from(attributes), remote);
                Outcome::committed(state, diagnostics)
            }
            Err(err) => Outcome::failed(self.fail("create", &err)),
        }
    }

    /// Refresh `state` from the remote side
    ///
    /// Only the identifying attributes are sent. Identifying and preserved
    /// attributes keep their prior values; everything else the remote
    /// reports overwrites state.
    pub fn read(&self, state: &State) -> Outcome {
        if self.schema.lifecycle.refresh == RefreshPolicy::KeepPrior {
            log::trace!("{} cannot be read back, keeping prior state", self.schema.type_name);
            return Outcome::committed(state.clone(), Diagnostics::new());
        }

        let scope = match Scope::from_state(self.schema, state) {
            Ok(scope) => scope,
            Err(err) => return Outcome::failed(self.fail("read", &err)),
        };

        match self.gateway.read(&scope) {
            Ok(Lookup::Found(remote)) => {
                Outcome::committed(self.refresh(state, remote), Diagnostics::new())
            }
            Ok(Lookup::NotFound) => {
                log::debug!("{} {} not found remotely", self.schema.type_name, scope);
                let diagnostic = Diagnostic::not_found(
                    "Resource not found",
                    format!("{} {scope} does not exist on the remote service", self.schema.type_name),
                );
                Outcome::committed(state.clone(), diagnostic.into())
            }
            Err(err) => Outcome::failed(self.fail("read", &err)),
        }
    }

    /// Converge `prior` onto `plan` in place
    ///
    /// Changing an immutable attribute is rejected; the host must replace
    /// the resource (delete then create) instead.
    pub fn update(&self, prior: &State, plan: &Plan) -> Outcome {
        let plan = self.schema.resolve_unknowns(plan, prior);
        let mut diagnostics = self.schema.validate_plan(&plan, Some(prior));

        for attribute in self.schema.replacement_attributes(prior, &plan) {
            diagnostics.push(
                Diagnostic::validation(
                    "Attribute requires replacement",
                    format!(
                        "{attribute:?} cannot be changed in place; the {} must be destroyed and re-created",
                        self.schema.type_name
                    ),
                )
                .with_attribute(attribute),
            );
        }
        if diagnostics.has_error() {
            return Outcome::failed(diagnostics);
        }

        let merged = self.merge_plan(prior, &plan);
        let delta: Attributes = match self.schema.lifecycle.update {
            UpdatePolicy::NoOp => {
                log::trace!("{} update is a no-op", self.schema.type_name);
                return Outcome::committed(merged, diagnostics);
            }
            UpdatePolicy::Delta => self
                .schema
                .mutable_attributes()
                .filter_map(|a| {
                    plan.known(a.name)
                        .filter(|v| prior.get(a.name) != Some(*v))
                        .map(|v| (a.name.to_string(), v.clone()))
                })
                .collect(),
            UpdatePolicy::FullSet => self
                .schema
                .mutable_attributes()
                .filter_map(|a| plan.known(a.name).map(|v| (a.name.to_string(), v.clone())))
                .collect(),
        };

        if delta.is_empty() && self.schema.lifecycle.update == UpdatePolicy::Delta {
            return Outcome::committed(merged, diagnostics);
        }

        let scope = match Scope::from_state(self.schema, prior) {
            Ok(scope) => scope,
            Err(err) => return Outcome::failed(self.fail("update", &err)),
        };

        match self.gateway.update(&scope, &delta) {
            Ok(remote) => {
                log::trace!("updated {} {}", self.schema.type_name, scope);
                Outcome::committed(self.overwrite(merged, remote), diagnostics)
            }
            Err(err) => Outcome::failed(self.fail("update", &err)),
        }
    }

    /// Delete the remote object
    ///
    /// An already-absent object is reported as an error unless the type
    /// declares delete a no-op.
    pub fn delete(&self, state: &State) -> Diagnostics {
        if self.schema.lifecycle.delete == DeletePolicy::NoOp {
            log::debug!(
                "{} delete is a no-op, only forgetting state",
                self.schema.type_name
            );
            return Diagnostics::new();
        }

        let result = Scope::from_state(self.schema, state)
            .and_then(|scope| self.gateway.delete(&scope).map(|()| scope));

        match result {
            Ok(scope) => {
                log::trace!("deleted {} {}", self.schema.type_name, scope);
                Diagnostics::new()
            }
            Err(err) => self.fail("delete", &err).into(),
        }
    }

    /// Import an existing remote object from its composite identifier
    pub fn import(&self, identifier: &str) -> Outcome {
        match self.decode_import_identifier(identifier) {
            Ok(state) => {
                log::debug!("importing {} {identifier}", self.schema.type_name);
                self.read(&state)
            }
            Err(diagnostic) => Outcome::failed(diagnostic),
        }
    }

    /// Decode an import identifier into the attributes it names
    pub fn decode_import_identifier(&self, identifier: &str) -> Result<State, Diagnostic> {
        let Some(import) = self.schema.import else {
            return Err(self.schema.unsupported("import"));
        };

        let decoded = import.format.decode(identifier).map_err(|err| {
            Diagnostic::validation("Unexpected Import Identifier", err.to_string())
        })?;

        let mut state = State::new();
        for (field, component) in import.fields.iter().zip(decoded.into_components()) {
            let value = Value::from(component);
            self.schema.validate_value(field, &value)?;
            state.set(field, value);
        }
        Ok(state)
    }

    fn fail(&self, action: &str, err: &GatewayError) -> Diagnostic {
        log::debug!("{} {action} failed: {err}", self.schema.type_name);
        gateway_diagnostic(self.schema, action, err)
    }

    /// Remote values overwrite base values
    fn overwrite(&self, mut base: State, remote: RemoteObject) -> State {
        for (name, value) in remote {
            if self.schema.policy(&name).is_some() {
                base.set(&name, value);
            } else {
                log::warn!(
                    "ignoring unexpected attribute {name:?} returned for {}",
                    self.schema.type_name
                );
            }
        }
        base
    }

    /// Remote values overwrite everything except identity and preserved values
    fn refresh(&self, prior: &State, remote: RemoteObject) -> State {
        let mut next = prior.clone();
        for (name, value) in remote {
            let Some(spec) = self.schema.policy(&name) else {
                log::warn!(
                    "ignoring unexpected attribute {name:?} returned for {}",
                    self.schema.type_name
                );
                continue;
            };
            if self.schema.is_identifying(&name)
                || (spec.preserve_unknown_as_prior_value && prior.contains(&name))
            {
                continue;
            }
            next.set(&name, value);
        }
        next
    }

    /// Plan values laid over prior state
    ///
    /// User-settable attributes missing from the plan are unset; unknown
    /// values keep whatever prior state had.
    fn merge_plan(&self, prior: &State, plan: &Plan) -> State {
        let mut next = prior.clone();
        for spec in self.schema.attributes {
            match plan.get(spec.name) {
                Some(PlanValue::Known(value)) => next.set(spec.name, value.clone()),
                Some(PlanValue::Unknown) => {}
                None if !spec.is_computed() => {
                    next.remove(spec.name);
                }
                None => {}
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::WIDGET;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory gateway for the test widget
    #[derive(Default)]
    struct FakeGateway {
        objects: Mutex<BTreeMap<String, Attributes>>,
        calls: Mutex<Vec<String>>,
        offline: bool,
    }

    impl FakeGateway {
        fn key(scope: &Scope) -> String {
            scope.to_string()
        }

        fn record(&self, call: &str) -> Result<(), GatewayError> {
            self.calls.lock().unwrap().push(call.to_string());
            if self.offline {
                return Err(GatewayError::transport("connection refused", None));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ResourceGateway for FakeGateway {
        fn schema(&self) -> &'static ResourceSchema {
            &WIDGET
        }

        fn create(&self, scope: &Scope, attributes: &Attributes) -> Result<RemoteObject, GatewayError> {
            self.record("create")?;
            let mut objects = self.objects.lock().unwrap();
            let id = format!("w-{}", objects.len() + 1);
            let mut stored = attributes.clone();
            stored.insert("id".into(), Value::from(id.as_str()));
            stored.insert("status".into(), Value::from("ready"));
            objects.insert(Self::key(scope), stored);
            Ok(RemoteObject::from([
                ("id".to_string(), Value::from(id.as_str())),
                ("secret".to_string(), Value::from(format!("secret-{id}"))),
                ("status".to_string(), Value::from("ready")),
            ]))
        }

        fn read(&self, scope: &Scope) -> Result<Lookup<RemoteObject>, GatewayError> {
            self.record("read")?;
            let objects = self.objects.lock().unwrap();
            Ok(match objects.get(&Self::key(scope)) {
                Some(object) => Lookup::Found(object.clone()),
                None => Lookup::NotFound,
            })
        }

        fn update(&self, scope: &Scope, delta: &Attributes) -> Result<RemoteObject, GatewayError> {
            self.record("update")?;
            let mut objects = self.objects.lock().unwrap();
            let object = objects
                .get_mut(&Self::key(scope))
                .ok_or_else(|| GatewayError::transport("HTTP 404: widget not found", Some(404)))?;
            object.extend(delta.clone());
            Ok(RemoteObject::from([("status".to_string(), Value::from("updated"))]))
        }

        fn delete(&self, scope: &Scope) -> Result<(), GatewayError> {
            self.record("delete")?;
            self.objects
                .lock()
                .unwrap()
                .remove(&Self::key(scope))
                .map(|_| ())
                .ok_or_else(|| GatewayError::transport("HTTP 404: widget not found", Some(404)))
        }
    }

    fn plan() -> Plan {
        Plan::new()
            .with("scope", "acme")
            .with("name", "orders")
            .with("size", "1gb")
            .with_unknown("id")
            .with_unknown("secret")
            .with_unknown("status")
    }

    #[test]
    fn test_create_merges_remote_values() {
        let gateway = FakeGateway::default();
        let outcome = Reconciler::new(&gateway).create(&plan());

        assert!(outcome.diagnostics.is_empty());
        let state = outcome.state.unwrap();
        assert_eq!(state.get_str("scope"), Some("acme"));
        assert_eq!(state.get_str("name"), Some("orders"));
        assert_eq!(state.get_str("size"), Some("1gb"));
        assert_eq!(state.get_str("id"), Some("w-1"));
        assert_eq!(state.get_str("secret"), Some("secret-w-1"));
    }

    #[test]
    fn test_create_validation_error_skips_gateway() {
        let gateway = FakeGateway::default();
        let outcome = Reconciler::new(&gateway).create(&Plan::new().with("scope", "acme"));

        assert!(outcome.state.is_none());
        assert!(outcome.diagnostics.has_kind(DiagnosticKind::Validation));
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn test_create_transport_error_has_no_state() {
        let gateway = FakeGateway {
            offline: true,
            ..Default::default()
        };
        let outcome = Reconciler::new(&gateway).create(&plan());

        assert!(outcome.state.is_none());
        assert_eq!(outcome.diagnostics.len(), 1);
        let diag = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(diag.kind, DiagnosticKind::Transport);
        assert!(diag.detail.contains("connection refused"));
        assert!(diag.detail.contains("Unable to create widget"));
    }

    #[test]
    fn test_create_then_read_converges() {
        let gateway = FakeGateway::default();
        let reconciler = Reconciler::new(&gateway);
        let created = reconciler.create(&plan()).state.unwrap();
        let refreshed = reconciler.read(&created).state.unwrap();

        for (name, value) in created.iter() {
            if !WIDGET.is_sensitive(name) {
                assert_eq!(refreshed.get(name), Some(value), "{name} drifted");
            }
        }
    }

    #[test]
    fn test_read_preserves_secret_and_identity() {
        let gateway = FakeGateway::default();
        let reconciler = Reconciler::new(&gateway);
        let created = reconciler.create(&plan()).state.unwrap();

        // The remote side never re-exposes the secret
        let refreshed = reconciler.read(&created).state.unwrap();
        assert_eq!(refreshed.get("secret"), created.get("secret"));
        assert_eq!(refreshed.get("id"), created.get("id"));
    }

    #[test]
    fn test_read_not_found_keeps_prior_state() {
        let gateway = FakeGateway::default();
        let prior = State::new()
            .with("scope", "acme")
            .with("name", "gone")
            .with("id", "w-9");
        let outcome = Reconciler::new(&gateway).read(&prior);

        assert!(outcome.is_not_found());
        assert!(!outcome.has_error());
        assert_eq!(outcome.state, Some(prior));
    }

    #[test]
    fn test_read_transport_error_is_not_not_found() {
        let gateway = FakeGateway {
            offline: true,
            ..Default::default()
        };
        let prior = State::new().with("scope", "acme").with("name", "orders");
        let outcome = Reconciler::new(&gateway).read(&prior);

        assert!(outcome.has_error());
        assert!(!outcome.is_not_found());
        assert!(outcome.state.is_none());
    }

    #[test]
    fn test_update_sends_delta_only() {
        let gateway = FakeGateway::default();
        let reconciler = Reconciler::new(&gateway);
        let created = reconciler.create(&plan()).state.unwrap();

        let outcome = reconciler.update(&created, &plan().with("size", "2gb"));
        assert!(!outcome.has_error(), "{:?}", outcome.diagnostics);
        let state = outcome.state.unwrap();
        assert_eq!(state.get_str("size"), Some("2gb"));
        assert_eq!(state.get_str("status"), Some("updated"));
        assert_eq!(state.get_str("secret"), Some("secret-w-1"));
    }

    #[test]
    fn test_update_without_changes_skips_gateway() {
        let gateway = FakeGateway::default();
        let reconciler = Reconciler::new(&gateway);
        let created = reconciler.create(&plan()).state.unwrap();

        let outcome = reconciler.update(&created, &plan());
        assert!(!outcome.has_error());
        assert_eq!(gateway.calls(), ["create"]);
    }

    #[test]
    fn test_update_rejects_immutable_change() {
        let gateway = FakeGateway::default();
        let reconciler = Reconciler::new(&gateway);
        let created = reconciler.create(&plan()).state.unwrap();

        let outcome = reconciler.update(&created, &plan().with("name", "invoices"));
        assert!(outcome.state.is_none());
        let diag = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Attribute requires replacement");
        assert_eq!(diag.attribute.as_deref(), Some("name"));
        assert_eq!(gateway.calls(), ["create"]);
    }

    #[test]
    fn test_delete_absent_object_is_reported() {
        let gateway = FakeGateway::default();
        let state = State::new().with("scope", "acme").with("name", "gone");
        let diags = Reconciler::new(&gateway).delete(&state);

        assert!(diags.has_error());
        assert!(diags.has_kind(DiagnosticKind::Transport));
    }

    #[test]
    fn test_import_then_read() {
        let gateway = FakeGateway::default();
        let reconciler = Reconciler::new(&gateway);
        reconciler.create(&plan());

        let outcome = reconciler.import("acme/orders");
        let state = outcome.state.unwrap();
        assert_eq!(state.get_str("scope"), Some("acme"));
        assert_eq!(state.get_str("name"), Some("orders"));
        assert_eq!(state.get_str("size"), Some("1gb"));
        assert_eq!(state.get_str("id"), Some("w-1"));
    }

    #[test]
    fn test_import_not_found_keeps_components() {
        let gateway = FakeGateway::default();
        let outcome = Reconciler::new(&gateway).import("acme/missing");

        assert!(outcome.is_not_found());
        let state = outcome.state.unwrap();
        assert_eq!(state.get_str("name"), Some("missing"));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_import_malformed_identifier() {
        let gateway = FakeGateway::default();
        let outcome = Reconciler::new(&gateway).import("acme");

        assert!(outcome.state.is_none());
        let diag = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(diag.kind, DiagnosticKind::Validation);
        assert!(diag.detail.contains("scope/name"));
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn test_import_rejects_extra_delimiters() {
        let gateway = FakeGateway::default();
        let outcome = Reconciler::new(&gateway).import("acme/orders/eu");

        assert!(outcome.state.is_none());
        assert!(outcome.has_error());
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn test_import_validates_components() {
        let gateway = FakeGateway::default();
        let reconciler = Reconciler::new(&gateway);

        let diag = reconciler.decode_import_identifier("acme/two words").unwrap_err();
        assert_eq!(diag.kind, DiagnosticKind::Validation);
        assert_eq!(diag.attribute.as_deref(), Some("name"));

        assert!(reconciler.import("acme/two words").state.is_none());
        assert!(gateway.calls().is_empty());
    }
}
