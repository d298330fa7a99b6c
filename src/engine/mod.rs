//! Host engine for tursoform
//!
//! The engine orchestrates:
//! 1. Planning - Match declared configuration against recorded state
//! 2. Diffing - Render what each address needs
//! 3. Executing - Reconcile independent changes in parallel, then record state

pub mod differ;
pub mod executor;
pub mod planner;

pub use differ::{display_diagnostics, display_plan, display_plan_diagnostics};
pub use executor::{Applied, ExecuteSummary, confirm_proceed, execute, print_summary, record, refresh};
pub use planner::{Change, pending, plan, plan_destroy};
