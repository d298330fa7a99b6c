//! Plan rendering

use colored::{ColoredString, Colorize};
use declarative::{Action, Diagnostics, DiffSummary, Severity, attribute_changes};

use super::planner::{Change, pending};
use crate::ui;

fn symbol(action: Action) -> ColoredString {
    match action {
        Action::Create => "+".green(),
        Action::Update => "~".yellow(),
        Action::Replace => "-/+".red(),
        Action::Delete => "-".red(),
        Action::NoOp => " ".normal(),
    }
}

/// Display planned changes and return their counts
pub fn display_plan(changes: &[Change]) -> DiffSummary {
    let summary = DiffSummary::from_actions(changes.iter().map(Change::action));

    if summary.is_empty() {
        println!();
        println!(
            "  {} No changes. Remote resources match the configuration.",
            "✓".green()
        );
        return summary;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    for change in pending(changes) {
        let action = change.action();
        println!(
            "│ {} {} {}",
            symbol(action),
            change.address.to_string().bold(),
            format!("will be {}", past_tense(action)).dimmed()
        );

        for attribute in attribute_changes(change.resource_type.schema(), &change.planned) {
            let value = match (&attribute.before, &attribute.after) {
                (Some(before), Some(after)) => format!("{before} → {after}"),
                (None, Some(after)) => after.clone(),
                (Some(before), None) => format!("{before} → null"),
                (None, None) => continue,
            };
            let forces = if attribute.forces_replacement {
                format!(" {}", "# forces replacement".red())
            } else {
                String::new()
            };
            println!("│     {:<20} {}{}", attribute.name, value.dimmed(), forces);
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Plan: {} to add, {} to change, {} to destroy.",
        summary.to_add().to_string().green(),
        summary.updates.to_string().yellow(),
        summary.to_destroy().to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");

    summary
}

fn past_tense(action: Action) -> &'static str {
    match action {
        Action::Create => "created",
        Action::Update => "updated in-place",
        Action::Replace => "replaced",
        Action::Delete => "destroyed",
        Action::NoOp => "left unchanged",
    }
}

/// Print the diagnostics of one address; returns true if any is an error
pub fn display_diagnostics(subject: &str, diagnostics: &Diagnostics) -> bool {
    for diagnostic in diagnostics {
        let msg = format!("{subject}: {}", diagnostic.summary);
        match diagnostic.severity {
            Severity::Error => ui::error(&msg),
            Severity::Warning => ui::warn(&msg),
        }
        if !diagnostic.detail.is_empty() {
            ui::dim(&diagnostic.detail);
        }
        if let Some(attribute) = &diagnostic.attribute {
            ui::dim(&format!("attribute: {attribute}"));
        }
    }
    diagnostics.has_error()
}

/// Print planning diagnostics; returns true if any change cannot be applied
pub fn display_plan_diagnostics(changes: &[Change]) -> bool {
    let mut failed = false;
    for change in changes {
        failed |= display_diagnostics(&change.address.to_string(), &change.planned.diagnostics);
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::planner::plan;
    use crate::state::StateFile;
    use declarative::{Address, Attributes, Diagnostic, State, Value};
    use std::collections::BTreeMap;

    #[test]
    fn test_display_plan_counts() {
        let mut state = StateFile::default();
        state.insert(
            Address::new("api_token", "old"),
            State::new().with("name", "old").with("id", "tok-1"),
        );
        let desired = BTreeMap::from([(
            Address::new("api_token", "ci"),
            Attributes::from([("name".to_string(), Value::from("ci"))]),
        )]);

        let changes = plan(&desired, &state, None).unwrap();
        let summary = display_plan(&changes);
        assert_eq!(summary.to_add(), 1);
        assert_eq!(summary.to_destroy(), 1);
        assert!(!display_plan_diagnostics(&changes));
    }

    #[test]
    fn test_display_diagnostics_reports_errors() {
        let warning: Diagnostics = Diagnostic::not_found("Resource not found", "gone").into();
        assert!(!display_diagnostics("database.orders", &warning));

        let error: Diagnostics = Diagnostic::validation("Invalid attribute value", "bad").into();
        assert!(display_diagnostics("database.orders", &error));
    }
}
