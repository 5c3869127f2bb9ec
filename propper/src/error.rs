//! Error types for managed properties

use thiserror::Error;

use crate::value::PropValue;

/// Result type for property operations
pub type Result<T> = std::result::Result<T, PropError>;

/// Errors raised while registering or accessing managed properties.
///
/// `InvalidName`, `UnknownTypeTest`, `InvalidPattern` and `InheritanceCycle`
/// are configuration errors raised synchronously at registration time.
/// `BadValue` is what the default bad-value policy returns from a rejected
/// assignment.
#[derive(Debug, Error)]
pub enum PropError {
    /// Property name failed the identifier test
    #[error("{message}")]
    InvalidName { message: String },

    /// A type-name specifier has no entry in the type-test table
    #[error("no validator named {type_name}")]
    UnknownTypeTest { type_name: String },

    /// A declared `/pattern/` could not be compiled
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// An assignment failed validation under the throwing policy
    #[error("{message}")]
    BadValue {
        message: String,
        value: PropValue,
        target: String,
    },

    /// Accessor used with a name that was never registered for the type
    #[error("no property named {name} on {target}")]
    UnknownProperty { name: String, target: String },

    /// Linking a schema to its parent would make the chain circular
    #[error("{child} cannot extend {parent}: inheritance cycle")]
    InheritanceCycle { child: String, parent: String },

    /// YAML declaration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON declaration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PropError {
    /// Create a bad-value error carrying the rejected value.
    pub fn bad_value(message: impl Into<String>, value: &PropValue, target: impl Into<String>) -> Self {
        Self::BadValue {
            message: message.into(),
            value: value.clone(),
            target: target.into(),
        }
    }

    /// Create an unknown-property error.
    pub fn unknown_property(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnknownProperty {
            name: name.into(),
            target: target.into(),
        }
    }

    /// The rejected value, for errors produced by a failed assignment.
    pub fn value(&self) -> Option<&PropValue> {
        match self {
            Self::BadValue { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Whether this error was raised while registering a property.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::UnknownTypeTest { .. }
                | Self::InvalidPattern(_)
                | Self::InheritanceCycle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_test_display() {
        let err = PropError::UnknownTypeTest {
            type_name: "strnig".into(),
        };
        assert_eq!(err.to_string(), "no validator named strnig");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_bad_value_carries_value() {
        let err = PropError::bad_value("nope", &PropValue::from(-1), "User");
        assert_eq!(err.to_string(), "nope");
        assert_eq!(err.value(), Some(&PropValue::from(-1)));
        assert!(!err.is_configuration());
        if let PropError::BadValue { target, .. } = err {
            assert_eq!(target, "User");
        } else {
            panic!("expected BadValue");
        }
    }
}
