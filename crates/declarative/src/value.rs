//! Attribute values, plans and persisted state
//!
//! A [`Plan`] is what the host wants a resource to look like: every attribute
//! is either a concrete [`Value`] or [`PlanValue::Unknown`] (to be filled in
//! by the remote side). A [`State`] is the last-known concrete view of a
//! resource, owned and persisted by the host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Concrete attribute values keyed by attribute name
pub type Attributes = BTreeMap<String, Value>;

/// Kind of value an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Bool,
    Number,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Number => "number",
        };
        f.write_str(name)
    }
}

/// A concrete attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(i64),
    String(String),
}

impl Value {
    /// The kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// A planned attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanValue {
    /// Value is known at plan time
    Known(Value),
    /// Value will be computed by the remote side
    Unknown,
}

impl PlanValue {
    pub fn known(&self) -> Option<&Value> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for PlanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(v) => write!(f, "{v}"),
            Self::Unknown => f.write_str("(known after apply)"),
        }
    }
}

/// Desired attribute values for one resource instance
///
/// Attributes missing from the plan are null (unset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    values: BTreeMap<String, PlanValue>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan where every attribute is known
    pub fn from_attributes(attributes: &Attributes) -> Self {
        Self {
            values: attributes
                .iter()
                .map(|(k, v)| (k.clone(), PlanValue::Known(v.clone())))
                .collect(),
        }
    }

    /// Builder-style setter for a known value
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style setter for an unknown value
    pub fn with_unknown(mut self, name: &str) -> Self {
        self.set_unknown(name);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.values
            .insert(name.to_string(), PlanValue::Known(value.into()));
    }

    pub fn set_unknown(&mut self, name: &str) {
        self.values.insert(name.to_string(), PlanValue::Unknown);
    }

    pub fn insert(&mut self, name: &str, value: PlanValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PlanValue> {
        self.values.get(name)
    }

    /// The known value of an attribute, if any
    pub fn known(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(PlanValue::known)
    }

    pub fn is_unknown(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(PlanValue::is_unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlanValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All known values, dropping unknowns
    pub fn known_values(&self) -> Attributes {
        self.values
            .iter()
            .filter_map(|(k, v)| v.known().map(|v| (k.clone(), v.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Last-known concrete attribute values of a resource instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Attributes);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attributes(&self) -> &Attributes {
        &self.0
    }

    pub fn into_attributes(self) -> Attributes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Attributes> for State {
    fn from(attributes: Attributes) -> Self {
        Self(attributes)
    }
}

impl FromIterator<(String, Value)> for State {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
