//! Executor: runs planned changes against the remote service
//!
//! Independent changes run on a rayon pool. Workers only return
//! [`Applied`] records; the state file is updated afterwards on the calling
//! thread by [`record`].

use anyhow::{Context as AnyhowContext, Result, anyhow};
use colored::Colorize;
use declarative::{
    Action, Address, Diagnostic, DiagnosticKind, Diagnostics, MissingPolicy, Reconciler, State,
};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tursokit::Api;

use super::planner::{Change, pending};
use crate::progress;
use crate::resource::ResourceType;
use crate::state::StateFile;

/// What to do with the state entry of an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    Record(State),
    Forget,
    Keep,
}

/// Result of reconciling one address
#[derive(Debug, Clone)]
pub struct Applied {
    pub address: Address,
    pub action: Action,
    pub change: StateChange,
    pub diagnostics: Diagnostics,
}

impl Applied {
    pub fn failed(&self) -> bool {
        self.diagnostics.has_error()
    }
}

/// Counts of what an apply, destroy or refresh did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub destroyed: usize,
    pub refreshed: usize,
    pub forgotten: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================================
// Apply
// ============================================================================

/// Execute every pending change, phase by phase
pub fn execute(changes: &[Change], api: &dyn Api, jobs: usize) -> Result<Vec<Applied>> {
    let mut phases: BTreeMap<usize, Vec<&Change>> = BTreeMap::new();
    for change in pending(changes) {
        phases.entry(change.phase()).or_default().push(change);
    }

    let total: usize = phases.values().map(Vec::len).sum();
    let pb = progress::bar(total as u64, "Applying");

    let mut applied = Vec::with_capacity(total);
    for (phase, batch) in phases {
        log::debug!("phase {phase}: {} changes", batch.len());
        applied.extend(run_parallel(&batch, jobs, &pb, |change| {
            apply_one(change, api)
        })?);
    }

    pb.finish_and_clear();
    applied.sort_by(|a, b| a.address.cmp(&b.address));
    Ok(applied)
}

fn apply_one(change: &Change, api: &dyn Api) -> Applied {
    let gateway = change.resource_type.gateway(api);
    let reconciler = Reconciler::new(gateway.as_ref());
    let planned = &change.planned;
    let applied = |change_state: StateChange, diagnostics: Diagnostics| Applied {
        address: change.address.clone(),
        action: planned.action,
        change: change_state,
        diagnostics,
    };

    match (planned.action, planned.plan.as_ref(), planned.prior.as_ref()) {
        (Action::Create, Some(plan), _) => {
            let outcome = reconciler.create(plan);
            match outcome.state {
                Some(state) => applied(StateChange::Record(state), outcome.diagnostics),
                None => applied(StateChange::Keep, outcome.diagnostics),
            }
        }
        (Action::Update, Some(plan), Some(prior)) => {
            let outcome = reconciler.update(prior, plan);
            match outcome.state {
                Some(state) => applied(StateChange::Record(state), outcome.diagnostics),
                None => applied(StateChange::Keep, outcome.diagnostics),
            }
        }
        (Action::Replace, Some(plan), Some(prior)) => {
            let deleted = reconciler.delete(prior);
            if deleted.has_error() {
                return applied(StateChange::Keep, deleted);
            }
            let mut outcome = reconciler.create(plan);
            let mut diagnostics = deleted;
            diagnostics.append(std::mem::take(&mut outcome.diagnostics));
            match outcome.state {
                Some(state) => applied(StateChange::Record(state), diagnostics),
                // The old object is gone, so the entry no longer describes anything
                None => applied(StateChange::Forget, diagnostics),
            }
        }
        (Action::Delete, _, Some(prior)) => {
            let diagnostics = reconciler.delete(prior);
            if diagnostics.has_error() {
                applied(StateChange::Keep, diagnostics)
            } else {
                applied(StateChange::Forget, diagnostics)
            }
        }
        (Action::NoOp, ..) => applied(StateChange::Keep, Diagnostics::new()),
        (action, ..) => applied(
            StateChange::Keep,
            Diagnostic::validation(
                "Incomplete plan",
                format!("{} cannot {action} without a plan and prior state", change.address),
            )
            .into(),
        ),
    }
}

// ============================================================================
// Refresh
// ============================================================================

/// Read every recorded instance back from the remote service
pub fn refresh(
    state: &StateFile,
    api: &dyn Api,
    jobs: usize,
    target: Option<&str>,
) -> Result<Vec<Applied>> {
    let entries = state
        .resources
        .iter()
        .filter(|(address, _)| address.matches(target))
        .map(|(address, entry)| {
            let resource_type: ResourceType = entry
                .resource_type
                .parse()
                .with_context(|| format!("Cannot refresh {address}"))?;
            Ok((address, resource_type, &entry.attributes))
        })
        .collect::<Result<Vec<_>>>()?;

    let pb = progress::bar(entries.len() as u64, "Refreshing");
    let mut refreshed = run_parallel(&entries, jobs, &pb, |(address, resource_type, prior)| {
        refresh_one(address, *resource_type, prior, api)
    })?;
    pb.finish_and_clear();

    refreshed.sort_by(|a, b| a.address.cmp(&b.address));
    Ok(refreshed)
}

fn refresh_one(address: &Address, resource_type: ResourceType, prior: &State, api: &dyn Api) -> Applied {
    let gateway = resource_type.gateway(api);
    let outcome = Reconciler::new(gateway.as_ref()).read(prior);
    let mut diagnostics = outcome.diagnostics.clone();

    let change = if outcome.is_not_found() {
        match resource_type.schema().lifecycle.on_missing {
            MissingPolicy::Forget => StateChange::Forget,
            MissingPolicy::Fail => {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::NotFound,
                    "Resource missing",
                    format!(
                        "{address} no longer exists remotely; re-create it with apply or forget it with `state rm`"
                    ),
                ));
                StateChange::Keep
            }
        }
    } else {
        outcome.state.map_or(StateChange::Keep, StateChange::Record)
    };

    Applied {
        address: address.clone(),
        action: Action::NoOp,
        change,
        diagnostics,
    }
}

// ============================================================================
// Shared
// ============================================================================

/// Run `reconcile` for every item on a pool of `jobs` threads
fn run_parallel<T, F>(items: &[T], jobs: usize, pb: &ProgressBar, reconcile: F) -> Result<Vec<Applied>>
where
    T: Sync,
    F: Fn(&T) -> Applied + Sync,
{
    let results: Arc<Mutex<Vec<Applied>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to create reconcile thread pool")?;

    pool.install(|| {
        items.par_iter().for_each(|item| {
            let applied = reconcile(item);
            let symbol = if applied.failed() { "✗" } else { "✓" };
            pb.set_message(format!("{symbol} {}", applied.address));
            pb.inc(1);
            push_applied(&results, applied);
        });
    });

    into_applied(results)
}

fn push_applied(results: &Arc<Mutex<Vec<Applied>>>, applied: Applied) {
    match results.lock() {
        Ok(mut locked) => locked.push(applied),
        Err(poisoned) => poisoned.into_inner().push(applied),
    }
}

fn into_applied(results: Arc<Mutex<Vec<Applied>>>) -> Result<Vec<Applied>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow!("Failed to collect reconcile results: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Apply results to the state file and count them
pub fn record(state: &mut StateFile, results: Vec<Applied>) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();
    for applied in results {
        if applied.failed() {
            summary.failed += 1;
        } else {
            match applied.action {
                Action::Create => summary.created += 1,
                Action::Update => summary.updated += 1,
                Action::Replace => summary.replaced += 1,
                Action::Delete => summary.destroyed += 1,
                Action::NoOp if applied.change == StateChange::Forget => summary.forgotten += 1,
                Action::NoOp => summary.refreshed += 1,
            }
        }

        match applied.change {
            StateChange::Record(attributes) => state.insert(applied.address, attributes),
            StateChange::Forget => {
                state.remove(&applied.address);
            }
            StateChange::Keep => {}
        }
    }
    summary
}

/// Confirm with user
pub fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// First line of the summary, e.g. "Refresh complete!"
fn headline(operation: &str, summary: &ExecuteSummary) -> String {
    if summary.is_success() {
        format!("{operation} complete!")
    } else {
        format!("{operation} finished with errors")
    }
}

/// Print final summary
pub fn print_summary(operation: &str, summary: &ExecuteSummary) {
    println!();
    let symbol = if summary.is_success() {
        "✓".green().bold()
    } else {
        "⚠".yellow().bold()
    };
    println!("  {symbol} {}", headline(operation, summary));

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources updated", summary.updated);
    }
    if summary.replaced > 0 {
        println!("    • {} resources replaced", summary.replaced);
    }
    if summary.destroyed > 0 {
        println!("    • {} resources destroyed", summary.destroyed);
    }
    if summary.refreshed > 0 {
        println!("    • {} resources refreshed", summary.refreshed);
    }
    if summary.forgotten > 0 {
        println!("    • {} resources forgotten", summary.forgotten);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
