//! Change planner: declared configuration + state -> per-address changes

use anyhow::{Context, Result};
use declarative::{Action, Address, Attributes, PlannedChange, plan_change};
use std::collections::{BTreeMap, BTreeSet};

use crate::resource::ResourceType;
use crate::state::StateFile;

/// The planned change for one address
#[derive(Debug, Clone)]
pub struct Change {
    pub address: Address,
    pub resource_type: ResourceType,
    pub planned: PlannedChange,
}

impl Change {
    pub fn action(&self) -> Action {
        self.planned.action
    }

    pub fn is_noop(&self) -> bool {
        self.planned.is_noop()
    }

    /// Execution phase; lower phases run first
    ///
    /// Deletes run before everything else, children before parents.
    /// Creates and updates then run parents before children.
    pub fn phase(&self) -> usize {
        let position = ResourceType::ALL
            .iter()
            .position(|t| *t == self.resource_type)
            .unwrap_or_default();
        match self.action() {
            Action::Delete => ResourceType::ALL.len() - 1 - position,
            _ => ResourceType::ALL.len() + position,
        }
    }
}

fn resource_type(address: &Address) -> Result<ResourceType> {
    address
        .resource_type
        .parse()
        .with_context(|| format!("Cannot plan {address}"))
}

/// Plan every address that is declared, recorded in state, or both
pub fn plan(
    desired: &BTreeMap<Address, Attributes>,
    state: &StateFile,
    target: Option<&str>,
) -> Result<Vec<Change>> {
    let addresses: BTreeSet<&Address> = desired.keys().chain(state.addresses()).collect();

    let mut changes = Vec::new();
    for address in addresses.into_iter().filter(|a| a.matches(target)) {
        let resource_type = resource_type(address)?;
        let planned = plan_change(
            resource_type.schema(),
            state.get(address),
            desired.get(address),
        );
        log::debug!("{address}: {}", planned.action);
        changes.push(Change {
            address: address.clone(),
            resource_type,
            planned,
        });
    }
    Ok(changes)
}

/// Plan the deletion of every recorded instance
pub fn plan_destroy(state: &StateFile, target: Option<&str>) -> Result<Vec<Change>> {
    state
        .addresses()
        .filter(|a| a.matches(target))
        .map(|address| {
            let resource_type = resource_type(address)?;
            Ok(Change {
                address: address.clone(),
                resource_type,
                planned: plan_change(resource_type.schema(), state.get(address), None),
            })
        })
        .collect()
}

/// Changes with something to do
pub fn pending(changes: &[Change]) -> impl Iterator<Item = &Change> {
    changes.iter().filter(|c| !c.is_noop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{State, Value};

    fn database(group: &str) -> Attributes {
        Attributes::from([
            ("organization_name".to_string(), Value::from("acme")),
            ("name".to_string(), Value::from("orders")),
            ("group".to_string(), Value::from(group)),
        ])
    }

    fn recorded() -> StateFile {
        let mut state = StateFile::default();
        state.insert(
            Address::new("database", "orders"),
            State::new()
                .with("organization_name", "acme")
                .with("name", "orders")
                .with("group", "default")
                .with("is_schema", false)
                .with("db_id", "00000000-0000-4000-8000-000000000001")
                .with("hostname", "orders-acme.turso.io"),
        );
        state
    }

    #[test]
    fn test_new_declaration_is_create() {
        let desired = BTreeMap::from([(Address::new("database", "orders"), database("default"))]);
        let changes = plan(&desired, &StateFile::default(), None).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action(), Action::Create);
        assert_eq!(changes[0].resource_type, ResourceType::Database);
    }

    #[test]
    fn test_converged_is_noop() {
        let desired = BTreeMap::from([(Address::new("database", "orders"), database("default"))]);
        let changes = plan(&desired, &recorded(), None).unwrap();
        assert!(changes[0].is_noop());
        assert_eq!(pending(&changes).count(), 0);
    }

    #[test]
    fn test_immutable_change_is_replace() {
        let desired = BTreeMap::from([(Address::new("database", "orders"), database("eu"))]);
        let changes = plan(&desired, &recorded(), None).unwrap();
        assert_eq!(changes[0].action(), Action::Replace);
        assert_eq!(changes[0].planned.replace_reasons, vec!["group"]);
    }

    #[test]
    fn test_undeclared_is_delete() {
        let changes = plan(&BTreeMap::new(), &recorded(), None).unwrap();
        assert_eq!(changes[0].action(), Action::Delete);
    }

    #[test]
    fn test_target_filters() {
        let desired = BTreeMap::from([
            (Address::new("database", "orders"), database("default")),
            (Address::new("api_token", "ci"), Attributes::new()),
        ]);
        let changes = plan(&desired, &StateFile::default(), Some("database")).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].address.label, "orders");
    }

    #[test]
    fn test_missing_required_reported() {
        let desired = BTreeMap::from([(Address::new("api_token", "ci"), Attributes::new())]);
        let changes = plan(&desired, &StateFile::default(), None).unwrap();
        assert!(changes[0].planned.diagnostics.has_error());
    }

    #[test]
    fn test_unknown_type_in_state_fails() {
        let mut state = StateFile::default();
        state.insert(Address::new("bucket", "logs"), State::new());
        let err = plan(&BTreeMap::new(), &state, None).unwrap_err();
        assert!(err.to_string().contains("bucket.logs"));
    }

    #[test]
    fn test_destroy_plans_every_entry() {
        let changes = plan_destroy(&recorded(), None).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action(), Action::Delete);
        assert!(plan_destroy(&recorded(), Some("api_token")).unwrap().is_empty());
    }

    #[test]
    fn test_phases_order_parents_and_children() {
        let create = |resource_type: ResourceType| Change {
            address: Address::new(resource_type.name(), "x"),
            resource_type,
            planned: plan_change(resource_type.schema(), None, Some(&Attributes::new())),
        };
        let delete = |resource_type: ResourceType| Change {
            address: Address::new(resource_type.name(), "x"),
            resource_type,
            planned: plan_change(resource_type.schema(), Some(&State::new()), None),
        };

        assert!(create(ResourceType::Database).phase() < create(ResourceType::DatabaseConfiguration).phase());
        assert!(delete(ResourceType::DatabaseToken).phase() < delete(ResourceType::Database).phase());
        assert!(delete(ResourceType::Database).phase() < create(ResourceType::Database).phase());
    }
}
