use roxmltree::Node;

use crate::error::XsdError;
use crate::particle::MaxOccurs;
use crate::xstypes::QName;

/// Conversion from an attribute's normalized value to its actual value.
pub trait ActualValue: Sized {
    /// `None` when `src` is not in the lexical space of the target type.
    fn convert(src: &str, parent: Node) -> Option<Self>;
}

impl ActualValue for String {
    fn convert(src: &str, _parent: Node) -> Option<Self> {
        Some(src.to_string())
    }
}

impl ActualValue for bool {
    fn convert(src: &str, _parent: Node) -> Option<Self> {
        match src.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ActualValue for u64 {
    fn convert(src: &str, _parent: Node) -> Option<Self> {
        src.trim().parse().ok()
    }
}

impl ActualValue for MaxOccurs {
    fn convert(src: &str, parent: Node) -> Option<Self> {
        match src.trim() {
            "unbounded" => Some(MaxOccurs::Unbounded),
            other => u64::convert(other, parent).map(MaxOccurs::Count),
        }
    }
}

/// Reads the attribute `name` of `node`, converted to its actual value.
pub fn attribute<T: ActualValue>(node: Node, name: &str) -> Result<Option<T>, XsdError> {
    let Some(raw) = node.attribute(name) else {
        return Ok(None);
    };
    T::convert(raw, node)
        .map(Some)
        .ok_or_else(|| XsdError::InvalidAttributeValue {
            element: node.tag_name().name().to_string(),
            attribute: name.to_string(),
            value: raw.to_string(),
        })
}

pub fn required_attribute<T: ActualValue>(node: Node, name: &'static str) -> Result<T, XsdError> {
    attribute(node, name)?.ok_or_else(|| XsdError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute: name,
    })
}

pub fn qname_attribute(node: Node, name: &str) -> Result<Option<QName>, XsdError> {
    node.attribute(name)
        .map(|raw| QName::parse(raw, node))
        .transpose()
}

/// Reads a whitespace separated list of QNames, e.g. `memberTypes`.
pub fn qname_list_attribute(node: Node, name: &str) -> Result<Vec<QName>, XsdError> {
    // NOTE: This assumes a list with whiteSpace="collapse"
    node.attribute(name)
        .map(|raw| {
            raw.split_ascii_whitespace()
                .map(|item| QName::parse(item, node))
                .collect()
        })
        .unwrap_or_else(|| Ok(Vec::new()))
}
