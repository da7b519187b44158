use std::fmt;

use super::error::XsdError;

pub type NCName = String;
pub type AnyURI = String;

/// Expanded name: an optional namespace URI plus a local part.
///
/// Displayed in Clark notation (`{namespace}local`), or as the bare local name when there is no
/// namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace_name: Option<AnyURI>,
    pub local_name: NCName,
}

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace_name {
            Some(namespace) => write!(f, "{{{namespace}}}{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

impl QName {
    pub fn new(namespace_name: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace_name: namespace_name.map(Into::into),
            local_name: local_name.into(),
        }
    }

    pub fn with_namespace(namespace_name: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace_name), local_name)
    }

    /// A name without namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self::new(None::<String>, local_name)
    }

    /// Parses a lexical QName (`prefix:local` or `local`) using the namespace bindings in scope at
    /// `context`. An unprefixed name takes the default namespace, if one is declared.
    pub fn parse(source: &str, context: roxmltree::Node) -> Result<Self, XsdError> {
        let (namespace, local) = match source.trim().split_once(':') {
            Some((prefix, local)) => (Some(resolve_prefix(prefix, context)?), local),
            None => (context.lookup_namespace_uri(None), source.trim()),
        };
        Ok(Self::new(namespace, local))
    }

    pub fn is_in_namespace(&self, namespace_name: &str) -> bool {
        self.namespace_name.as_deref() == Some(namespace_name)
    }
}

/// `xml` is bound without a declaration.
fn resolve_prefix<'a>(prefix: &str, context: roxmltree::Node<'a, '_>) -> Result<&'a str, XsdError> {
    if prefix == "xml" {
        return Ok(XML_NAMESPACE);
    }
    context
        .lookup_namespace_uri(Some(prefix))
        .ok_or_else(|| XsdError::NamePrefixNotResolved(prefix.to_owned()))
}

pub type Sequence<T> = Vec<T>;
