//! # Declarative
//!
//! Generic reconciliation of remote resources against declared configuration.
//!
//! Every managed resource type is described by a static [`ResourceSchema`]
//! (its attribute policy table) and reached through a [`ResourceGateway`].
//! One [`Reconciler`] drives the create/read/update/delete/import lifecycle
//! for all of them, so per-type code only has to map attributes onto the
//! remote API.
//!
//! ## Core Concepts
//!
//! - **Plan**: desired attribute values, some possibly unknown until applied
//! - **State**: last-known concrete values, owned and persisted by the host
//! - **Diagnostics**: ordered errors and warnings returned by every call
//! - **Composite identifier**: `org/name` style keys for importing objects
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{Plan, Reconciler};
//!
//! let reconciler = Reconciler::new(&gateway);
//! let plan = Plan::new()
//!     .with("organization_name", "acme")
//!     .with("name", "orders")
//!     .with("group", "default")
//!     .with_unknown("db_id");
//!
//! let outcome = reconciler.create(&plan);
//! for diagnostic in &outcome.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! ```

pub mod datasource;
pub mod diagnostics;
pub mod diff;
pub mod gateway;
pub mod identifier;
pub mod planner;
pub mod reconciler;
pub mod schema;
pub mod value;

// Re-export main types at crate root
pub use datasource::{DataSource, read_data_source};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use diff::{AttributeChange, DiffSummary, attribute_changes};
pub use gateway::{GatewayError, Lookup, RemoteObject, ResourceGateway, Scope, find_by};
pub use identifier::{CompositeIdentifier, IdentifierError, IdentifierFormat};
pub use planner::{Action, Address, PlannedChange, plan_change};
pub use reconciler::{Outcome, Reconciler, gateway_diagnostic};
pub use schema::{
    AttributeSpec, DeletePolicy, ImportSpec, Lifecycle, MissingPolicy, RefreshPolicy,
    ResourceSchema, Role, UpdatePolicy,
};
pub use value::{Attributes, Plan, PlanValue, State, Value, ValueKind};
