//! Declarative commands
//!
//! - `plan` - Preview what apply would change
//! - `apply` - Make remote resources match the configuration
//! - `refresh` - Re-read every recorded instance
//! - `destroy` - Delete every recorded instance

use anyhow::{Result, bail};

use super::connect;
use crate::Context;
use crate::config::Config;
use crate::engine::{self, Applied, ExecuteSummary};
use crate::state::StateFile;
use crate::ui;

pub fn plan(ctx: &Context, target: Option<&str>) -> Result<()> {
    ui::header("Plan");
    let config = Config::load(&ctx.config_path)?;
    let state = StateFile::load(&ctx.state_path)?;

    let changes = engine::plan(&config.desired()?, &state, target)?;
    engine::display_plan(&changes);

    if engine::display_plan_diagnostics(&changes) {
        bail!("Plan has errors");
    }
    Ok(())
}

pub fn apply(ctx: &Context, target: Option<&str>, yes: bool, jobs: usize) -> Result<()> {
    ui::header("Apply");
    let config = Config::load(&ctx.config_path)?;
    let mut state = StateFile::load(&ctx.state_path)?;

    let changes = engine::plan(&config.desired()?, &state, target)?;
    let summary = engine::display_plan(&changes);

    if engine::display_plan_diagnostics(&changes) {
        bail!("Plan has errors; nothing was applied");
    }
    if summary.is_empty() {
        return Ok(());
    }

    if !yes && !engine::confirm_proceed()? {
        ui::warn("Aborted");
        return Ok(());
    }

    let api = connect(&config)?;
    let results = engine::execute(&changes, &api, jobs)?;
    finish(ctx, "Apply", &mut state, results)
}

pub fn refresh(ctx: &Context, target: Option<&str>, jobs: usize) -> Result<()> {
    ui::header("Refresh");
    let config = Config::load_or_default(&ctx.config_path)?;
    let mut state = StateFile::load(&ctx.state_path)?;

    if state.is_empty() {
        ui::info("State is empty, nothing to refresh");
        return Ok(());
    }

    let api = connect(&config)?;
    let results = engine::refresh(&state, &api, jobs, target)?;
    finish(ctx, "Refresh", &mut state, results)
}

pub fn destroy(ctx: &Context, target: Option<&str>, yes: bool, jobs: usize) -> Result<()> {
    ui::header("Destroy");
    let config = Config::load_or_default(&ctx.config_path)?;
    let mut state = StateFile::load(&ctx.state_path)?;

    let changes = engine::plan_destroy(&state, target)?;
    let summary = engine::display_plan(&changes);
    if summary.is_empty() {
        return Ok(());
    }

    if !yes && !engine::confirm_proceed()? {
        ui::warn("Aborted");
        return Ok(());
    }

    let api = connect(&config)?;
    let results = engine::execute(&changes, &api, jobs)?;
    finish(ctx, "Destroy", &mut state, results)
}

/// Report diagnostics, record results and save state
fn finish(
    ctx: &Context,
    operation: &str,
    state: &mut StateFile,
    results: Vec<Applied>,
) -> Result<()> {
    for applied in &results {
        if !ctx.quiet || applied.failed() {
            engine::display_diagnostics(&applied.address.to_string(), &applied.diagnostics);
        }
    }

    let summary: ExecuteSummary = engine::record(state, results);
    state.save(&ctx.state_path)?;
    engine::print_summary(operation, &summary);

    if !summary.is_success() {
        bail!("{} resources failed", summary.failed);
    }
    Ok(())
}
