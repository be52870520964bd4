//! Error types for configuration tree operations.

use thiserror::Error;

/// Result type alias for config-tree operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while reading, writing or (de)serializing a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A path segment addresses a value where a section was expected.
    #[error("{path} is not a section")]
    NotSection {
        /// Root-relative path of the offending segment
        path: String,
    },

    /// Forced section creation targets an occupied key.
    #[error("{path} already exists")]
    AlreadyExists {
        /// Root-relative path of the occupied key
        path: String,
    },

    /// Neither a registered serializer nor tag-based reflection applies.
    #[error("Couldn't find any serializer for {type_name}")]
    NoSerializer {
        /// Rust type name of the object
        type_name: &'static str,
    },

    /// A reflective type has no usable constructor.
    #[error("{type_name} has neither a matching parameterized constructor nor an empty constructor")]
    Construction {
        /// Rust type name of the deserialization target
        type_name: &'static str,
    },

    /// A serializer is already registered for the type.
    #[error("Serializer for {type_name} is already registered")]
    AlreadyRegistered {
        /// Rust type name the serializer handles
        type_name: &'static str,
    },

    /// No serializer is registered for the type.
    #[error("Serializer for {type_name} is not registered")]
    NotRegistered {
        /// Rust type name the caller tried to unregister
        type_name: &'static str,
    },

    /// A serialized value could not be converted into a tagged field.
    #[error("{owner}.{key}: expected {expected}, found {found}")]
    FieldType {
        /// Type owning the field
        owner: &'static str,
        /// Tag name of the field
        key: String,
        /// Expected Rust type
        expected: &'static str,
        /// Kind of the value found in the mapping
        found: &'static str,
    },

    /// A required tagged field is absent from the serialized mapping.
    #[error("{owner}.{key}: missing value")]
    MissingField {
        /// Type owning the field
        owner: &'static str,
        /// Tag name of the field
        key: String,
    },

    /// Free-form failure raised by a user serializer.
    #[error("{0}")]
    Custom(String),
}

impl ConfigError {
    /// Create a free-form error, typically from inside a [`ConfigSerializer`](crate::ConfigSerializer).
    pub fn custom(message: impl Into<String>) -> Self {
        ConfigError::Custom(message.into())
    }

    /// True for the "no strategy applies" failure, which value classification
    /// treats as a fall-through rather than an error.
    pub fn is_unserializable(&self) -> bool {
        matches!(self, ConfigError::NoSerializer { .. })
    }
}
