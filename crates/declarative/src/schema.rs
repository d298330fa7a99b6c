//! Attribute policy tables
//!
//! Each resource type declares a static [`ResourceSchema`]: which attributes
//! the user sets, which the remote side computes, which are secret, which
//! force replacement when changed, and how the type behaves across its
//! lifecycle. Everything here is pure lookup; no I/O.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::identifier::IdentifierFormat;
use crate::value::{Plan, PlanValue, State, Value, ValueKind};
use std::collections::BTreeMap;

/// Who supplies an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Must be set in every plan
    Required,
    /// May be set by the user
    Optional,
    /// Filled in by the remote side, never by the user
    Computed,
}

/// Extra check applied to a concrete value
pub type Validator = fn(&Value) -> Result<(), String>;

/// Policy for one attribute
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub kind: ValueKind,
    pub role: Role,
    pub sensitive: bool,
    /// Changing this attribute forces delete + create
    pub immutable_after_create: bool,
    /// Once known, the prior value is always carried forward
    pub preserve_unknown_as_prior_value: bool,
    pub description: &'static str,
    pub validator: Option<Validator>,
}

impl AttributeSpec {
    const fn new(name: &'static str, kind: ValueKind, role: Role) -> Self {
        Self {
            name,
            kind,
            role,
            sensitive: false,
            immutable_after_create: false,
            preserve_unknown_as_prior_value: false,
            description: "",
            validator: None,
        }
    }

    pub const fn required(name: &'static str, kind: ValueKind) -> Self {
        Self::new(name, kind, Role::Required)
    }

    pub const fn optional(name: &'static str, kind: ValueKind) -> Self {
        Self::new(name, kind, Role::Optional)
    }

    pub const fn computed(name: &'static str, kind: ValueKind) -> Self {
        Self::new(name, kind, Role::Computed)
    }

    pub const fn immutable(self) -> Self {
        Self {
            immutable_after_create: true,
            ..self
        }
    }

    pub const fn sensitive(self) -> Self {
        Self {
            sensitive: true,
            ..self
        }
    }

    pub const fn preserve_prior(self) -> Self {
        Self {
            preserve_unknown_as_prior_value: true,
            ..self
        }
    }

    pub const fn describe(self, description: &'static str) -> Self {
        Self {
            description,
            ..self
        }
    }

    pub const fn validated(self, validator: Validator) -> Self {
        Self {
            validator: Some(validator),
            ..self
        }
    }

    pub fn is_computed(&self) -> bool {
        self.role == Role::Computed
    }

    /// User-settable and changeable in place
    pub fn is_mutable(&self) -> bool {
        !self.is_computed() && !self.immutable_after_create
    }
}

/// How Update reaches the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Send only the mutable attributes that changed
    Delta,
    /// Send every mutable attribute (remote has no partial update)
    FullSet,
    /// Nothing to send; the remote object cannot change after creation
    NoOp,
}

/// How Delete reaches the remote side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    Remote,
    /// Lifecycle is owned elsewhere (e.g. by a parent resource)
    NoOp,
}

/// How Read refreshes state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    Remote,
    /// The remote side cannot be read back; prior state is kept as-is
    KeepPrior,
}

/// What a host should do when refresh finds the remote object gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Drop the instance from state
    Forget,
    /// Keep the instance and report an error
    Fail,
}

/// Lifecycle behavior of a resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub update: UpdatePolicy,
    pub delete: DeletePolicy,
    pub refresh: RefreshPolicy,
    pub on_missing: MissingPolicy,
}

impl Lifecycle {
    /// Lifecycle for read-only data sources
    pub const READ_ONLY: Self = Self {
        update: UpdatePolicy::NoOp,
        delete: DeletePolicy::NoOp,
        refresh: RefreshPolicy::Remote,
        on_missing: MissingPolicy::Fail,
    };
}

/// How an import identifier maps onto attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSpec {
    pub format: IdentifierFormat,
    /// Attribute populated by each identifier component, in order
    pub fields: &'static [&'static str],
}

impl ImportSpec {
    pub const fn new(labels: &'static [&'static str], fields: &'static [&'static str]) -> Self {
        Self {
            format: IdentifierFormat::new(labels),
            fields,
        }
    }
}

/// Full policy table for one resource type
#[derive(Debug, Clone, Copy)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub attributes: &'static [AttributeSpec],
    /// Attributes that identify the remote object, in lookup order
    pub identity: &'static [&'static str],
    /// `None` when the type cannot be imported
    pub import: Option<ImportSpec>,
    pub lifecycle: Lifecycle,
}

impl ResourceSchema {
    /// Policy for one attribute
    pub fn policy(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn is_identifying(&self, name: &str) -> bool {
        self.identity.contains(&name)
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.policy(name).is_some_and(|a| a.sensitive)
    }

    pub fn mutable_attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| a.is_mutable())
    }

    /// True iff any immutable attribute differs between prior and planned
    pub fn requires_replacement(&self, prior: &State, planned: &Plan) -> bool {
        !self.replacement_attributes(prior, planned).is_empty()
    }

    /// Immutable attributes whose planned value differs from prior state
    ///
    /// Unknown planned values never force replacement.
    pub fn replacement_attributes(&self, prior: &State, planned: &Plan) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|a| a.immutable_after_create)
            .filter(|a| match planned.get(a.name) {
                Some(PlanValue::Known(v)) => prior.get(a.name) != Some(v),
                Some(PlanValue::Unknown) => false,
                None => !a.is_computed() && prior.contains(a.name),
            })
            .map(|a| a.name)
            .collect()
    }

    /// Check a plan against the policy table
    ///
    /// `prior` is the state being updated, if any; it decides whether a
    /// concrete value on a computed attribute is a legal carry-forward.
    pub fn validate_plan(&self, plan: &Plan, prior: Option<&State>) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        for (name, value) in plan.iter() {
            let Some(spec) = self.policy(name) else {
                diagnostics.push(
                    Diagnostic::validation(
                        "Unsupported attribute",
                        format!("{} has no attribute named {name:?}", self.type_name),
                    )
                    .with_attribute(name),
                );
                continue;
            };

            if let PlanValue::Known(v) = value
                && let Err(diagnostic) = check_value(spec, v)
            {
                diagnostics.push(diagnostic);
            }
        }

        for spec in self.attributes {
            match (spec.role, plan.get(spec.name)) {
                (Role::Required, None) => diagnostics.push(
                    Diagnostic::validation(
                        "Missing required attribute",
                        format!("{} requires {:?} to be set", self.type_name, spec.name),
                    )
                    .with_attribute(spec.name),
                ),
                (Role::Required, Some(PlanValue::Unknown)) => diagnostics.push(
                    Diagnostic::validation(
                        "Required attribute value unknown",
                        format!("{:?} must be known before it can be applied", spec.name),
                    )
                    .with_attribute(spec.name),
                ),
                (Role::Computed, Some(PlanValue::Known(v))) => {
                    let carried_forward = spec.preserve_unknown_as_prior_value
                        && prior.and_then(|p| p.get(spec.name)) == Some(v);
                    if !carried_forward {
                        diagnostics.push(
                            Diagnostic::validation(
                                "Computed attribute cannot be set",
                                format!("{:?} is computed by the remote service", spec.name),
                            )
                            .with_attribute(spec.name),
                        );
                    }
                }
                _ => {}
            }
        }

        diagnostics
    }

    /// Check one concrete value against its attribute's kind and validator
    pub fn validate_value(&self, name: &str, value: &Value) -> Result<(), Diagnostic> {
        match self.policy(name) {
            Some(spec) => check_value(spec, value),
            None => Err(Diagnostic::validation(
                "Unsupported attribute",
                format!("{} has no attribute named {name:?}", self.type_name),
            )
            .with_attribute(name)),
        }
    }

    /// Replace unknown values of preserved attributes with their prior value
    pub fn resolve_unknowns(&self, plan: &Plan, prior: &State) -> Plan {
        let mut resolved = plan.clone();
        for spec in self
            .attributes
            .iter()
            .filter(|a| a.preserve_unknown_as_prior_value)
        {
            if plan.is_unknown(spec.name)
                && let Some(value) = prior.get(spec.name)
            {
                resolved.insert(spec.name, PlanValue::Known(value.clone()));
            }
        }
        resolved
    }

    /// Render state for display, masking sensitive values
    pub fn redact(&self, state: &State) -> BTreeMap<String, String> {
        state
            .iter()
            .map(|(name, value)| {
                let shown = if self.is_sensitive(name) {
                    "(sensitive)".to_string()
                } else {
                    value.to_string()
                };
                (name.to_string(), shown)
            })
            .collect()
    }

    /// Error diagnostic for a kind of operation the type does not offer
    pub fn unsupported(&self, operation: &str) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::Unsupported,
            format!("{operation} not supported"),
            format!("{} resources do not support {operation}", self.type_name),
        )
    }
}

fn check_value(spec: &AttributeSpec, value: &Value) -> Result<(), Diagnostic> {
    if value.kind() != spec.kind {
        return Err(Diagnostic::validation(
            "Incorrect attribute value type",
            format!("{} must be a {}, got {}", spec.name, spec.kind, value.kind()),
        )
        .with_attribute(spec.name));
    }
    if let Some(validate) = spec.validator {
        validate(value).map_err(|reason| {
            Diagnostic::validation("Invalid attribute value", reason).with_attribute(spec.name)
        })?;
    }
    Ok(())
}
