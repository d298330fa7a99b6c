//! Attribute-level diffs for rendering planned changes

use crate::planner::{Action, PlannedChange};
use crate::schema::ResourceSchema;
use crate::value::{PlanValue, State};
use serde::{Deserialize, Serialize};

const SENSITIVE: &str = "(sensitive value)";

/// A single attribute changing between prior state and plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub name: String,
    /// Rendered prior value
    pub before: Option<String>,
    /// Rendered planned value
    pub after: Option<String>,
    /// This change alone forces replacement
    pub forces_replacement: bool,
}

impl AttributeChange {
    pub fn is_addition(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    pub fn is_removal(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }
}

/// Attribute changes for one planned change, sensitive values masked
///
/// Attributes whose value stays the same are left out.
pub fn attribute_changes(schema: &ResourceSchema, change: &PlannedChange) -> Vec<AttributeChange> {
    let empty = State::new();
    let prior = change.prior.as_ref().unwrap_or(&empty);
    let render = |name: &str, text: String| {
        if schema.is_sensitive(name) {
            SENSITIVE.to_string()
        } else {
            text
        }
    };

    let mut changes = Vec::new();
    for spec in schema.attributes {
        let before = match change.action {
            Action::Create => None,
            _ => prior.get(spec.name),
        };
        let after = change.plan.as_ref().and_then(|p| p.get(spec.name));

        let differs = match (before, after) {
            (Some(b), Some(PlanValue::Known(a))) => b != a,
            (None, None) => false,
            // Computed values only show as pending on a fresh object
            (_, Some(PlanValue::Unknown)) => {
                matches!(change.action, Action::Create | Action::Replace)
            }
            _ => true,
        };
        if !differs {
            continue;
        }

        changes.push(AttributeChange {
            name: spec.name.to_string(),
            before: before.map(|v| render(spec.name, v.to_string())),
            after: after.map(|v| render(spec.name, v.to_string())),
            forces_replacement: change.replace_reasons.contains(&spec.name),
        });
    }
    changes
}

/// Counts of planned actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub creates: usize,
    pub updates: usize,
    pub replaces: usize,
    pub deletes: usize,
}

impl DiffSummary {
    pub fn from_actions(actions: impl IntoIterator<Item = Action>) -> Self {
        let mut summary = Self::default();
        for action in actions {
            match action {
                Action::Create => summary.creates += 1,
                Action::Update => summary.updates += 1,
                Action::Replace => summary.replaces += 1,
                Action::Delete => summary.deletes += 1,
                Action::NoOp => {}
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.replaces + self.deletes
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Resources that will be added, counting replacements
    pub fn to_add(&self) -> usize {
        self.creates + self.replaces
    }

    /// Resources that will be destroyed, counting replacements
    pub fn to_destroy(&self) -> usize {
        self.deletes + self.replaces
    }
}
