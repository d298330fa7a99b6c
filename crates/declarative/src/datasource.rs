//! Read-only data sources
//!
//! A data source shares the attribute policy machinery with resources but
//! only ever reads: the user supplies lookup keys, the remote side fills in
//! the rest. A missing object is an error here, not a warning.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::gateway::{GatewayError, Lookup, RemoteObject};
use crate::reconciler::{Outcome, gateway_diagnostic};
use crate::schema::ResourceSchema;
use crate::value::{Attributes, Plan, State};

/// A read-only lookup against the remote service
pub trait DataSource: Send + Sync {
    fn schema(&self) -> &'static ResourceSchema;

    /// Fetch the object named by the lookup keys
    fn read(&self, keys: &Attributes) -> Result<Lookup<RemoteObject>, GatewayError>;
}

/// Validate lookup keys, read, and merge the result
pub fn read_data_source(source: &dyn DataSource, keys: &Attributes) -> Outcome {
    let schema = source.schema();

    let mut plan = Plan::from_attributes(keys);
    for spec in schema.attributes.iter().filter(|a| a.is_computed()) {
        if !keys.contains_key(spec.name) {
            plan.set_unknown(spec.name);
        }
    }
    let diagnostics = schema.validate_plan(&plan, None);
    if diagnostics.has_error() {
        return Outcome {
            state: None,
            diagnostics,
        };
    }

    match source.read(keys) {
        Ok(Lookup::Found(remote)) => {
            let mut state = State::from(keys.clone());
            for (name, value) in remote {
                if schema.policy(&name).is_some() {
                    state.set(&name, value);
                }
            }
            Outcome {
                state: Some(state),
                diagnostics,
            }
        }
        Ok(Lookup::NotFound) => {
            let described: Vec<String> = keys.iter().map(|(k, v)| format!("{k}={v}")).collect();
            let diagnostic = Diagnostic::error(
                DiagnosticKind::NotFound,
                format!("{} not found", schema.type_name),
                format!("no {} matches {}", schema.type_name, described.join(", ")),
            );
            Outcome {
                state: None,
                diagnostics: Diagnostics::from(diagnostic),
            }
        }
        Err(err) => Outcome {
            state: None,
            diagnostics: gateway_diagnostic(schema, "read", &err).into(),
        },
    }
}
