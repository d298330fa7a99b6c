//! `tursoform import <address> <identifier>`

use anyhow::{Result, anyhow, bail};
use declarative::{Address, Diagnostic, Reconciler, State};
use tursokit::Api;

use super::connect;
use crate::Context;
use crate::config::Config;
use crate::engine;
use crate::resource::ResourceType;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context, address: &str, identifier: &str) -> Result<()> {
    let address: Address = address
        .parse()
        .map_err(|d: Diagnostic| anyhow!("{}", d.detail))?;
    let config = Config::load_or_default(&ctx.config_path)?;
    let mut state = StateFile::load(&ctx.state_path)?;

    let api = connect(&config)?;
    let imported = import(&api, &mut state, &address, identifier)?;
    state.save(&ctx.state_path)?;

    ui::success(&format!("Imported {address}"));
    if !ctx.quiet {
        for (name, value) in address_schema(&address)?.redact(&imported) {
            ui::kv(&name, &value);
        }
    }
    Ok(())
}

fn address_schema(address: &Address) -> Result<&'static declarative::ResourceSchema> {
    Ok(address.resource_type.parse::<ResourceType>()?.schema())
}

/// Import the object named by `identifier` into state at `address`
pub fn import(
    api: &dyn Api,
    state: &mut StateFile,
    address: &Address,
    identifier: &str,
) -> Result<State> {
    let resource_type: ResourceType = address.resource_type.parse()?;
    if state.contains(address) {
        bail!("{address} is already managed; remove it with `tursoform state rm {address}` first");
    }

    let gateway = resource_type.gateway(api);
    let outcome = Reconciler::new(gateway.as_ref()).import(identifier);
    engine::display_diagnostics(&address.to_string(), &outcome.diagnostics);

    if outcome.has_error() {
        bail!("Failed to import {address}");
    }
    if outcome.is_not_found() {
        bail!("Cannot import {address}: {resource_type} {identifier} does not exist");
    }
    let Some(imported) = outcome.state else {
        bail!("Failed to import {address}: no state returned");
    };

    log::debug!("imported {address} from {identifier}");
    state.insert(address.clone(), imported.clone());
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tursokit::{CreateDatabaseInput, MockApi};

    fn api_with_orders() -> MockApi {
        let api = MockApi::new();
        api.create_database(
            "acme",
            &CreateDatabaseInput {
                name: "orders".to_string(),
                group: "default".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        api
    }

    #[test]
    fn test_import_database() {
        let api = api_with_orders();
        let mut state = StateFile::default();
        let address = Address::new("database", "orders");

        let imported = import(&api, &mut state, &address, "acme/orders").unwrap();
        assert_eq!(imported.get_str("organization_name"), Some("acme"));
        assert_eq!(imported.get_str("group"), Some("default"));
        assert_eq!(state.get(&address), Some(&imported));
    }

    #[test]
    fn test_import_refuses_managed_address() {
        let api = api_with_orders();
        let mut state = StateFile::default();
        let address = Address::new("database", "orders");
        import(&api, &mut state, &address, "acme/orders").unwrap();

        let err = import(&api, &mut state, &address, "acme/orders").unwrap_err();
        assert!(err.to_string().contains("already managed"));
    }

    #[test]
    fn test_import_missing_object_not_saved() {
        let api = MockApi::new();
        let mut state = StateFile::default();
        let address = Address::new("database", "ghost");

        let err = import(&api, &mut state, &address, "acme/ghost").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(state.is_empty());
    }

    #[test]
    fn test_import_bad_identifier() {
        let api = MockApi::new();
        let mut state = StateFile::default();
        let err = import(&api, &mut state, &Address::new("database", "orders"), "acme").unwrap_err();
        assert!(err.to_string().contains("Failed to import"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_import_unsupported_type() {
        let api = MockApi::new();
        let mut state = StateFile::default();
        let address = Address::new("database_token", "app");
        assert!(import(&api, &mut state, &address, "acme/orders").is_err());
        assert!(state.is_empty());
    }
}
