//! Remote resource gateway - the seam between the reconciler and a remote API
//!
//! A gateway speaks in attribute maps: it receives the identifying scope of a
//! resource plus the values to send, and returns whatever the remote side
//! reported back. One gateway exists per resource type.

use crate::schema::ResourceSchema;
use crate::value::{Attributes, State, Value};
use std::fmt;
use thiserror::Error;

/// Attribute values returned by the remote side
pub type RemoteObject = Attributes;

/// Result of a point lookup
///
/// Not-found is a valid answer, distinct from a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(t) => Some(t),
            Self::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(t) => Lookup::Found(f(t)),
            Self::NotFound => Lookup::NotFound,
        }
    }
}

/// Errors a gateway call can return
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote call failed (network, auth, 4xx/5xx)
    #[error("{message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// The gateway does not implement this operation
    #[error("{operation} is not supported for {resource_type}")]
    Unsupported {
        resource_type: &'static str,
        operation: &'static str,
    },

    /// A value needed to address the remote object is missing or malformed
    #[error("invalid attribute {attribute:?}: {reason}")]
    InvalidAttribute { attribute: String, reason: String },
}

impl GatewayError {
    pub fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            message: message.into(),
            status,
        }
    }

    pub fn invalid(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}

/// Identifying attribute values of one resource instance, in identity order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    entries: Vec<(&'static str, Value)>,
}

impl Scope {
    /// Pick the identifying attributes of `schema` out of `values`
    pub fn from_values(schema: &ResourceSchema, values: &Attributes) -> Result<Self, GatewayError> {
        let mut entries = Vec::with_capacity(schema.identity.len());
        for name in schema.identity {
            let value = values
                .get(*name)
                .ok_or_else(|| GatewayError::invalid(*name, "identifying attribute is not set"))?;
            entries.push((*name, value.clone()));
        }
        Ok(Self { entries })
    }

    pub fn from_state(schema: &ResourceSchema, state: &State) -> Result<Self, GatewayError> {
        Self::from_values(schema, state.attributes())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// A string component of the scope
    pub fn str(&self, name: &str) -> Result<&str, GatewayError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::invalid(name, "expected a string"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(_, v)| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        f.write_str(&parts.join("/"))
    }
}

/// Abstract CRUD against the remote service for one resource type
///
/// Implementations must be safe to share between threads: several
/// reconciliations may use the same gateway concurrently.
pub trait ResourceGateway: Send + Sync {
    /// Policy table of the resource type this gateway serves
    fn schema(&self) -> &'static ResourceSchema;

    /// Create the remote object; returns the values the remote side computed
    fn create(&self, scope: &Scope, attributes: &Attributes) -> Result<RemoteObject, GatewayError>;

    /// Fetch the remote object
    fn read(&self, scope: &Scope) -> Result<Lookup<RemoteObject>, GatewayError>;

    /// Change mutable attributes in place
    fn update(&self, _scope: &Scope, _delta: &Attributes) -> Result<RemoteObject, GatewayError> {
        Err(GatewayError::Unsupported {
            resource_type: self.schema().type_name,
            operation: "update",
        })
    }

    fn delete(&self, _scope: &Scope) -> Result<(), GatewayError> {
        Err(GatewayError::Unsupported {
            resource_type: self.schema().type_name,
            operation: "delete",
        })
    }

    /// List objects under a scope, for types without a point read
    fn list(&self, _scope: &Scope) -> Result<Vec<RemoteObject>, GatewayError> {
        Err(GatewayError::Unsupported {
            resource_type: self.schema().type_name,
            operation: "list",
        })
    }
}

/// Linear scan for the first object whose `attribute` equals `value`
pub fn find_by(objects: Vec<RemoteObject>, attribute: &str, value: &Value) -> Lookup<RemoteObject> {
    objects
        .into_iter()
        .find(|o| o.get(attribute) == Some(value))
        .map_or(Lookup::NotFound, Lookup::Found)
}
