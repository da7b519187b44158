use thiserror::Error;

use super::xstypes::QName;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum XsdError {
    #[error("failed to resolve prefix {0:?} to a namespace URI")]
    NamePrefixNotResolved(String),

    #[error("expected a <schema> document element, found <{0}>")]
    NotASchema(String),

    #[error("<{element}> is missing the required `{attribute}` attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("invalid value {value:?} for attribute `{attribute}` on <{element}>")]
    InvalidAttributeValue {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("<{element}> must contain one of {expected}")]
    MissingContent {
        element: String,
        expected: &'static str,
    },

    #[error("type {0} is defined more than once with different content")]
    DuplicateType(QName),

    #[error("element {0} is declared more than once with different content")]
    DuplicateElement(QName),

    #[error("model group {0} is defined more than once with different content")]
    DuplicateGroup(QName),

    #[error("built-in type {0} may not be redefined")]
    BuiltinRedefined(QName),

    #[error("type {0} is not defined in any loaded schema")]
    UnresolvedType(QName),

    #[error("element {0} is not declared in any loaded schema")]
    UnresolvedElement(QName),

    #[error("model group {0} is not defined in any loaded schema")]
    UnresolvedGroup(QName),
}
