use thiserror::Error;
use xsd2sql_xsd::{QName, XsdError};

/// Fatal conversion errors. Anything recoverable is a [`Diagnostic`](crate::diagnostics::Diagnostic).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("type {name} (referenced from {referenced_from}) is not defined in any loaded schema")]
    UnresolvedType { name: QName, referenced_from: String },

    #[error("element {name} (referenced from {referenced_from}) is not declared in any loaded schema")]
    UnresolvedElement { name: QName, referenced_from: String },

    #[error("model group {name} (referenced from {referenced_from}) is not defined in any loaded schema")]
    UnresolvedGroup { name: QName, referenced_from: String },

    #[error(transparent)]
    Registry(#[from] XsdError),
}

impl ConvertError {
    /// Attaches the referencing location to a resolution failure from the registry.
    pub(crate) fn referenced_from(error: XsdError, location: &str) -> Self {
        let referenced_from = location.to_string();
        match error {
            XsdError::UnresolvedType(name) => Self::UnresolvedType {
                name,
                referenced_from,
            },
            XsdError::UnresolvedElement(name) => Self::UnresolvedElement {
                name,
                referenced_from,
            },
            XsdError::UnresolvedGroup(name) => Self::UnresolvedGroup {
                name,
                referenced_from,
            },
            other => Self::Registry(other),
        }
    }
}
