//! Composite identifiers used to import existing remote objects
//!
//! An identifier is an ordered list of scoping components joined with `/`,
//! e.g. `acme/orders` for database `orders` in organization `acme`.
//!
//! No component may be empty or contain the delimiter; [`encode`] and
//! [`decode`] both reject such identifiers.

use std::fmt;
use thiserror::Error;

/// Component delimiter
pub const DELIMITER: char = '/';

/// Errors from encoding or decoding an identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier does not split into the expected number of components
    #[error("expected import identifier with format: {format}. Got: {input:?}")]
    WrongComponentCount {
        format: String,
        expected: usize,
        found: usize,
        input: String,
    },

    /// A component is empty
    #[error("expected import identifier with format: {format}. Got: {input:?} (component {index} is empty)")]
    EmptyComponent {
        format: String,
        index: usize,
        input: String,
    },

    /// A component cannot be encoded
    #[error("identifier component {index} ({component:?}) is empty or contains '/'")]
    InvalidComponent { index: usize, component: String },
}

/// Join components with the delimiter
pub fn encode<S: AsRef<str>>(components: &[S]) -> Result<String, IdentifierError> {
    for (index, component) in components.iter().enumerate() {
        let component = component.as_ref();
        if component.is_empty() || component.contains(DELIMITER) {
            return Err(IdentifierError::InvalidComponent {
                index,
                component: component.to_string(),
            });
        }
    }

    Ok(components
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/"))
}

/// Split on the first `expected_parts - 1` delimiters
///
/// A delimiter left in the last component means the input had too many
/// components; that is rejected like any other wrong count.
pub fn decode(input: &str, expected_parts: usize) -> Result<Vec<String>, IdentifierError> {
    let format = vec!["<component>"; expected_parts].join("/");
    split(input, expected_parts, &format)
}

fn split(input: &str, expected_parts: usize, format: &str) -> Result<Vec<String>, IdentifierError> {
    let parts: Vec<&str> = if expected_parts == 0 {
        Vec::new()
    } else {
        input.splitn(expected_parts, DELIMITER).collect()
    };

    let overflow = parts.last().is_some_and(|last| last.contains(DELIMITER));
    if expected_parts == 0 || parts.len() != expected_parts || overflow {
        return Err(IdentifierError::WrongComponentCount {
            format: format.to_string(),
            expected: expected_parts,
            found: input.split(DELIMITER).count(),
            input: input.to_string(),
        });
    }

    if let Some(index) = parts.iter().position(|p| p.is_empty()) {
        return Err(IdentifierError::EmptyComponent {
            format: format.to_string(),
            index,
            input: input.to_string(),
        });
    }

    Ok(parts.into_iter().map(str::to_string).collect())
}

/// Expected shape of an identifier, e.g. `organization/name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierFormat {
    labels: &'static [&'static str],
}

impl IdentifierFormat {
    pub const fn new(labels: &'static [&'static str]) -> Self {
        Self { labels }
    }

    /// Number of components
    pub fn parts(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn decode(&self, input: &str) -> Result<CompositeIdentifier, IdentifierError> {
        let components = split(input, self.parts(), &self.to_string())?;
        Ok(CompositeIdentifier { components })
    }
}

impl fmt::Display for IdentifierFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels.join("/"))
    }
}

/// A decoded identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIdentifier {
    components: Vec<String>,
}

impl CompositeIdentifier {
    /// Build from components, validating each one
    pub fn new(components: Vec<String>) -> Result<Self, IdentifierError> {
        encode(&components)?;
        Ok(Self { components })
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn into_components(self) -> Vec<String> {
        self.components
    }
}

impl fmt::Display for CompositeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.components.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATABASE: IdentifierFormat = IdentifierFormat::new(&["organization", "name"]);

    #[test]
    fn test_decode_two_parts() {
        assert_eq!(decode("acme/orders", 2).unwrap(), ["acme", "orders"]);
    }

    #[test]
    fn test_round_trip() {
        let samples: &[&[&str]] = &[&["acme", "orders"], &["a"], &["x", "y", "z"]];
        for components in samples {
            let encoded = encode(components).unwrap();
            assert_eq!(decode(&encoded, components.len()).unwrap(), *components);
        }
    }

    #[test]
    fn test_missing_delimiter_cites_format() {
        let err = DATABASE.decode("acme").unwrap_err();
        assert!(matches!(
            err,
            IdentifierError::WrongComponentCount {
                expected: 2,
                found: 1,
                ..
            }
        ));
        let message = err.to_string();
        assert!(message.contains("organization/name"));
        assert!(message.contains("\"acme\""));
    }

    #[test]
    fn test_empty_components_rejected() {
        for input in ["/orders", "acme/", "/", ""] {
            assert!(DATABASE.decode(input).is_err(), "{input:?} should fail");
        }
        assert!(matches!(
            DATABASE.decode("acme/").unwrap_err(),
            IdentifierError::EmptyComponent { index: 1, .. }
        ));
    }

    #[test]
    fn test_extra_delimiters_rejected() {
        assert!(matches!(
            decode("acme/orders/eu", 2).unwrap_err(),
            IdentifierError::WrongComponentCount {
                expected: 2,
                found: 3,
                ..
            }
        ));
        assert!(DATABASE.decode("acme/orders/instances/x").is_err());
    }

    #[test]
    fn test_zero_parts_is_an_error() {
        assert!(decode("acme", 0).is_err());
    }

    #[test]
    fn test_encode_rejects_bad_components() {
        assert!(encode(&["acme", ""]).is_err());
        assert!(matches!(
            encode(&["acme", "a/b"]).unwrap_err(),
            IdentifierError::InvalidComponent { index: 1, .. }
        ));
    }

    #[test]
    fn test_composite_display() {
        let id = DATABASE.decode("acme/orders").unwrap();
        assert_eq!(id.to_string(), "acme/orders");
        assert_eq!(DATABASE.to_string(), "organization/name");
    }
}
