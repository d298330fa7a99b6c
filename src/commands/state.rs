//! `tursoform state list|show|rm`

use anyhow::{Result, anyhow, bail};
use declarative::{Address, Diagnostic};
use std::collections::BTreeMap;

use crate::Context;
use crate::resource::ResourceType;
use crate::state::{ResourceEntry, StateFile};
use crate::ui;

fn parse_address(address: &str) -> Result<Address> {
    address
        .parse()
        .map_err(|d: Diagnostic| anyhow!("{}", d.detail))
}

pub fn list(ctx: &Context) -> Result<()> {
    let state = StateFile::load(&ctx.state_path)?;
    if state.is_empty() {
        ui::info("No resources in state");
        return Ok(());
    }
    for address in state.addresses() {
        println!("{address}");
    }
    Ok(())
}

pub fn show(ctx: &Context, address: &str) -> Result<()> {
    let state = StateFile::load(&ctx.state_path)?;
    let address = parse_address(address)?;
    let Some(entry) = state.resources.get(&address) else {
        bail!("{address} is not in state");
    };

    ui::header(&address.to_string());
    for (name, value) in redacted(entry)? {
        ui::kv(&name, &value);
    }
    Ok(())
}

/// Attribute values for display, sensitive ones masked
pub fn redacted(entry: &ResourceEntry) -> Result<BTreeMap<String, String>> {
    let resource_type: ResourceType = entry.resource_type.parse()?;
    Ok(resource_type.schema().redact(&entry.attributes))
}

pub fn rm(ctx: &Context, address: &str) -> Result<()> {
    let mut state = StateFile::load(&ctx.state_path)?;
    let address = parse_address(address)?;
    remove(&mut state, &address)?;
    state.save(&ctx.state_path)?;
    ui::success(&format!("Removed {address} from state"));
    ui::dim("The remote object was not touched and is no longer managed");
    Ok(())
}

/// Forget an instance without touching the remote side
pub fn remove(state: &mut StateFile, address: &Address) -> Result<ResourceEntry> {
    state
        .remove(address)
        .ok_or_else(|| anyhow!("{address} is not in state"))
}
