//! `tursoform schema [type]` - print attribute policy tables

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{AttributeSpec, ResourceSchema, Role};

use crate::datasource::DataSourceType;
use crate::resource::ResourceType;
use crate::ui;

pub fn run(name: Option<&str>) -> Result<()> {
    let schemas = select(name)?;
    for (kind, schema) in schemas {
        print_schema(kind, schema);
    }
    Ok(())
}

/// Schemas to print: every one, or those named `name`
fn select(name: Option<&str>) -> Result<Vec<(&'static str, &'static ResourceSchema)>> {
    let all = ResourceType::ALL
        .iter()
        .map(|t| ("resource", t.schema()))
        .chain(DataSourceType::ALL.iter().map(|t| ("data source", t.schema())));

    let selected: Vec<_> = all
        .filter(|(_, schema)| name.is_none_or(|n| n == schema.type_name))
        .collect();
    if selected.is_empty() {
        bail!("No resource or data source named {:?}", name.unwrap_or_default());
    }
    Ok(selected)
}

fn print_schema(kind: &str, schema: &ResourceSchema) {
    ui::header(&format!("{} ({kind})", schema.type_name));
    ui::dim(schema.description);
    println!();

    for spec in schema.attributes {
        println!(
            "  {:<20} {:<7} {:<9} {}",
            spec.name.bold(),
            spec.kind.to_string(),
            role(spec),
            flags(spec).join(", ").yellow()
        );
        if !spec.description.is_empty() {
            println!("  {:<20} {}", "", spec.description.dimmed());
        }
    }

    println!();
    ui::kv("identity", &schema.identity.join(", "));
    match schema.import {
        Some(import) => ui::kv("import", &import.format.to_string()),
        None => ui::kv("import", "not supported"),
    }
}

fn role(spec: &AttributeSpec) -> &'static str {
    match spec.role {
        Role::Required => "required",
        Role::Optional => "optional",
        Role::Computed => "computed",
    }
}

fn flags(spec: &AttributeSpec) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if spec.immutable_after_create {
        flags.push("forces replacement");
    }
    if spec.sensitive {
        flags.push("sensitive");
    }
    if spec.preserve_unknown_as_prior_value {
        flags.push("preserved");
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all() {
        let selected = select(None).unwrap();
        assert_eq!(
            selected.len(),
            ResourceType::ALL.len() + DataSourceType::ALL.len()
        );
    }

    #[test]
    fn test_select_by_name_includes_data_source() {
        // `database` is both a resource and a data source
        let selected = select(Some("database")).unwrap();
        let kinds: Vec<&str> = selected.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, vec!["resource", "data source"]);

        assert!(select(Some("bucket")).is_err());
    }

    #[test]
    fn test_flags() {
        let jwt = ResourceType::DatabaseToken
            .schema()
            .policy("jwt")
            .unwrap();
        assert_eq!(flags(jwt), vec!["sensitive", "preserved"]);
        assert_eq!(role(jwt), "computed");
    }
}
