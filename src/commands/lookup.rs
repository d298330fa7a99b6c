//! `tursoform lookup <data-source> key=value...`

use anyhow::{Result, bail};
use declarative::{State, read_data_source};
use tursokit::Api;

use super::connect;
use crate::Context;
use crate::config::Config;
use crate::datasource::{DataSourceType, parse_keys};
use crate::engine;
use crate::ui;

pub fn run(ctx: &Context, source: &str, pairs: &[String]) -> Result<()> {
    let kind: DataSourceType = source.parse()?;
    let config = Config::load_or_default(&ctx.config_path)?;
    let api = connect(&config)?;

    let found = lookup(&api, kind, pairs)?;
    ui::header(&format!("{kind} lookup"));
    for (name, value) in kind.schema().redact(&found) {
        ui::kv(&name, &value);
    }
    Ok(())
}

/// Run a data source with `key=value` arguments
pub fn lookup(api: &dyn Api, kind: DataSourceType, pairs: &[String]) -> Result<State> {
    let keys = parse_keys(kind.schema(), pairs)?;
    let source = kind.source(api);
    let outcome = read_data_source(source.as_ref(), &keys);

    if engine::display_diagnostics(kind.name(), &outcome.diagnostics) {
        bail!("{kind} lookup failed");
    }
    match outcome.state {
        Some(state) => Ok(state),
        None => bail!("{kind} lookup returned nothing"),
    }
}
