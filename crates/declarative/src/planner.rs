//! Change planner - decides what each resource instance needs
//!
//! Given prior state and desired attributes, [`plan_change`] works out the
//! [`Action`] and builds the [`Plan`] the reconciler will be handed.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::schema::{ResourceSchema, Role};
use crate::value::{Attributes, Plan, PlanValue, State};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What has to happen to one resource instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    NoOp,
    Create,
    Update,
    /// Delete then create, because an immutable attribute changed
    Replace,
    Delete,
}

impl Action {
    /// Symbol used when rendering plans
    pub fn symbol(self) -> &'static str {
        match self {
            Self::NoOp => " ",
            Self::Create => "+",
            Self::Update => "~",
            Self::Replace => "-/+",
            Self::Delete => "-",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::NoOp => "no changes",
            Self::Create => "create",
            Self::Update => "update in-place",
            Self::Replace => "replace",
            Self::Delete => "destroy",
        };
        f.write_str(verb)
    }
}

/// The planned change for one resource instance
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub action: Action,
    /// Plan to hand the reconciler; `None` for deletes and no-ops without config
    pub plan: Option<Plan>,
    pub prior: Option<State>,
    /// Immutable attributes that force replacement
    pub replace_reasons: Vec<&'static str>,
    pub diagnostics: Diagnostics,
}

impl PlannedChange {
    fn new(action: Action, plan: Option<Plan>, prior: Option<&State>) -> Self {
        Self {
            action,
            plan,
            prior: prior.cloned(),
            replace_reasons: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.action == Action::NoOp
    }
}

/// Work out what it takes to move `prior` to `desired`
///
/// `desired` is `None` when the instance was removed from configuration.
/// Optional attributes left out of `desired` keep their prior value: an
/// unset optional attribute is treated as unmanaged, not as a request to
/// clear it.
pub fn plan_change(
    schema: &ResourceSchema,
    prior: Option<&State>,
    desired: Option<&Attributes>,
) -> PlannedChange {
    let Some(desired) = desired else {
        let action = if prior.is_some() {
            Action::Delete
        } else {
            Action::NoOp
        };
        return PlannedChange::new(action, None, prior);
    };

    let Some(prior_state) = prior else {
        let plan = build_plan(schema, desired, None);
        let mut change = PlannedChange::new(Action::Create, None, None);
        change.diagnostics = schema.validate_plan(&plan, None);
        change.plan = Some(plan);
        return change;
    };

    let plan = build_plan(schema, desired, Some(prior_state));
    let diagnostics = schema.validate_plan(&plan, Some(prior_state));

    let reasons = schema.replacement_attributes(prior_state, &plan);
    if !reasons.is_empty() {
        // A replacement starts from nothing, so nothing is carried forward
        let fresh = build_plan(schema, desired, None);
        let mut change = PlannedChange::new(Action::Replace, None, prior);
        change.diagnostics = schema.validate_plan(&fresh, None);
        change.plan = Some(fresh);
        change.replace_reasons = reasons;
        return change;
    }

    let changed = schema
        .attributes
        .iter()
        .filter(|a| !a.is_computed())
        .any(|a| plan.known(a.name) != prior_state.get(a.name));

    let action = if changed { Action::Update } else { Action::NoOp };
    let mut change = PlannedChange::new(action, Some(plan), prior);
    change.diagnostics = diagnostics;
    change
}

fn build_plan(schema: &ResourceSchema, desired: &Attributes, prior: Option<&State>) -> Plan {
    let mut plan = Plan::from_attributes(desired);

    for spec in schema.attributes {
        if desired.contains_key(spec.name) {
            continue;
        }
        let prior_value = prior.and_then(|p| p.get(spec.name));
        match (spec.role, prior_value) {
            (Role::Computed, Some(value)) if spec.preserve_unknown_as_prior_value => {
                plan.insert(spec.name, PlanValue::Known(value.clone()));
            }
            (Role::Computed, _) => plan.set_unknown(spec.name),
            (Role::Optional, Some(value)) => plan.set(spec.name, value.clone()),
            _ => {}
        }
    }

    plan
}

/// Address of a resource instance in configuration and state: `type.label`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    pub resource_type: String,
    pub label: String,
}

impl Address {
    pub fn new(resource_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            label: label.into(),
        }
    }

    /// Whether the address is selected by a `--target` filter
    ///
    /// Target format: "type" or "type.label"
    pub fn matches(&self, target: Option<&str>) -> bool {
        let Some(target) = target else {
            return true;
        };
        match target.split_once('.') {
            Some((resource_type, label)) => {
                self.resource_type == resource_type && self.label == label
            }
            None => self.resource_type == target,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.label)
    }
}

impl FromStr for Address {
    type Err = Diagnostic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((resource_type, label))
                if !resource_type.is_empty() && !label.is_empty() && !label.contains('.') =>
            {
                Ok(Self::new(resource_type, label))
            }
            _ => Err(Diagnostic::validation(
                "Invalid resource address",
                format!("expected an address of the form type.label, got {s:?}"),
            )),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse().map_err(|d: Diagnostic| d.detail)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::WIDGET;
    use crate::value::Value;

    fn desired() -> Attributes {
        Attributes::from([
            ("scope".to_string(), Value::from("acme")),
            ("name".to_string(), Value::from("orders")),
            ("size".to_string(), Value::from("1gb")),
        ])
    }

    fn prior() -> State {
        State::new()
            .with("scope", "acme")
            .with("name", "orders")
            .with("size", "1gb")
            .with("id", "w-1")
            .with("secret", "s3cr3t")
            .with("status", "ready")
    }

    #[test]
    fn test_new_instance_is_created() {
        let change = plan_change(&WIDGET, None, Some(&desired()));
        assert_eq!(change.action, Action::Create);
        assert!(change.diagnostics.is_empty());

        let plan = change.plan.unwrap();
        assert!(plan.is_unknown("id"));
        assert!(plan.is_unknown("secret"));
        assert_eq!(plan.known("size"), Some(&Value::from("1gb")));
    }

    #[test]
    fn test_unchanged_instance_is_noop() {
        let change = plan_change(&WIDGET, Some(&prior()), Some(&desired()));
        assert_eq!(change.action, Action::NoOp);

        let plan = change.plan.unwrap();
        assert_eq!(plan.known("id"), Some(&Value::from("w-1")));
        assert!(plan.is_unknown("status"));
    }

    #[test]
    fn test_unset_optional_is_carried_forward() {
        let mut desired = desired();
        desired.remove("size");
        let change = plan_change(&WIDGET, Some(&prior()), Some(&desired));
        assert_eq!(change.action, Action::NoOp);
    }

    #[test]
    fn test_mutable_change_is_update() {
        let mut desired = desired();
        desired.insert("size".into(), Value::from("2gb"));
        let change = plan_change(&WIDGET, Some(&prior()), Some(&desired));
        assert_eq!(change.action, Action::Update);
        assert!(change.replace_reasons.is_empty());
    }

    #[test]
    fn test_immutable_change_is_replace() {
        let mut desired = desired();
        desired.insert("tier".into(), Value::from("pro"));
        let change = plan_change(&WIDGET, Some(&prior()), Some(&desired));
        assert_eq!(change.action, Action::Replace);
        assert_eq!(change.replace_reasons, ["tier"]);
        assert!(change.plan.unwrap().is_unknown("id"));
    }

    #[test]
    fn test_removed_instance_is_deleted() {
        let change = plan_change(&WIDGET, Some(&prior()), None);
        assert_eq!(change.action, Action::Delete);
        assert!(change.plan.is_none());
        assert!(plan_change(&WIDGET, None, None).is_noop());
    }

    #[test]
    fn test_invalid_desired_is_reported() {
        let mut desired = desired();
        desired.insert("id".into(), Value::from("mine"));
        let change = plan_change(&WIDGET, None, Some(&desired));
        assert!(change.diagnostics.has_error());
    }

    #[test]
    fn test_address_parse_and_target() {
        let address: Address = "widget.main".parse().unwrap();
        assert_eq!(address, Address::new("widget", "main"));
        assert_eq!(address.to_string(), "widget.main");

        assert!(address.matches(None));
        assert!(address.matches(Some("widget")));
        assert!(address.matches(Some("widget.main")));
        assert!(!address.matches(Some("widget.other")));
        assert!(!address.matches(Some("gadget")));

        assert!("widget".parse::<Address>().is_err());
        assert!("widget.".parse::<Address>().is_err());
    }
}
