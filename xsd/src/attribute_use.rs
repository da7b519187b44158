use log::debug;
use roxmltree::Node;

use super::{
    error::XsdError,
    mapping_context::first_child_named,
    values::{attribute, qname_attribute},
    xstypes::{NCName, QName},
    MappingContext, SimpleTypeDefinition,
};

/// Schema Component: Attribute Use, with its Attribute Declaration folded in (§3.5, §3.2)
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeUse {
    pub name: NCName,
    pub type_: AttributeType,
    pub required: bool,
    /// `use="prohibited"`: removes an inherited attribute instead of declaring one.
    pub prohibited: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeType {
    Named(QName),
    Anonymous(SimpleTypeDefinition),
    /// No type given, or a reference to a global attribute; treated as `xs:anySimpleType`.
    Default,
}

impl AttributeUse {
    pub const TAG_NAME: &'static str = "attribute";

    pub(super) fn map_from_xml(context: &MappingContext, node: Node) -> Result<Self, XsdError> {
        let (name, type_) = match node.attribute("name") {
            Some(name) => {
                let type_ = if let Some(simple_type) =
                    first_child_named(node, SimpleTypeDefinition::TAG_NAME)
                {
                    AttributeType::Anonymous(SimpleTypeDefinition::map_from_xml(
                        context,
                        simple_type,
                        false,
                    )?)
                } else if let Some(type_name) = qname_attribute(node, "type")? {
                    AttributeType::Named(type_name)
                } else {
                    AttributeType::Default
                };
                (name.to_string(), type_)
            }
            None => {
                let reference =
                    qname_attribute(node, "ref")?.ok_or(XsdError::MissingAttribute {
                        element: Self::TAG_NAME.into(),
                        attribute: "name",
                    })?;
                debug!("attribute reference {reference} is stored with the default type");
                (reference.local_name, AttributeType::Default)
            }
        };

        let use_: Option<String> = attribute(node, "use")?;
        let (required, prohibited) = match use_.as_deref() {
            None | Some("optional") => (false, false),
            Some("required") => (true, false),
            Some("prohibited") => (false, true),
            Some(other) => {
                return Err(XsdError::InvalidAttributeValue {
                    element: Self::TAG_NAME.into(),
                    attribute: "use".into(),
                    value: other.into(),
                })
            }
        };

        Ok(Self {
            name,
            type_,
            required,
            prohibited,
        })
    }
}
