use thiserror::Error;

use crate::core::name::QualifiedName;

#[derive(Error, Debug)]
/// Binding error
pub enum BindingError {
    /// The XML input is not well-formed.
    #[error("malformed XML at {location}: {message}")]
    Parse { location: String, message: String },

    /// No element binding exists for the resolved root name.
    #[error("no element binding for {0}")]
    UnknownElement(QualifiedName),

    /// The root element carries no namespace and neither a default nor a
    /// fallback namespace is available.
    #[error("cannot resolve the namespace of element '{0}'")]
    UnresolvedNamespace(String),

    /// The element content does not fit the bound type.
    #[error("content of {element} does not match its type: {message}")]
    SchemaViolation {
        element: QualifiedName,
        message: String,
    },

    #[error("element {0} is already bound")]
    DuplicateBinding(QualifiedName),

    #[error("element {found} is outside the registry namespace '{expected}'")]
    NamespaceMismatch {
        expected: String,
        found: QualifiedName,
    },

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl BindingError {
    /// Returns `true` for errors caused by malformed XML input.
    pub fn is_parse(&self) -> bool {
        matches!(self, BindingError::Parse { .. })
    }
}
