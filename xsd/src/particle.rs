use roxmltree::Node;

use super::{
    error::XsdError,
    model_group::Compositor,
    shared::Term,
    values::{attribute, qname_attribute},
    ElementDeclaration, MappingContext, ModelGroup, ModelGroupDefinition,
};

/// Schema Component: Particle, a kind of Component (§3.9)
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub min_occurs: u64,
    pub max_occurs: MaxOccurs,
    pub term: Term,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaxOccurs {
    Unbounded,
    Count(u64),
}

impl MaxOccurs {
    /// Whether more than one occurrence is allowed.
    pub fn is_many(self) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Count(count) => count > 1,
        }
    }
}

impl Particle {
    /// Maps a content model child (`element`, `group`, `all`, `choice`, `sequence` or `any`).
    ///
    /// Returns `None` for other elements (annotations, attributes) and for particles with
    /// `maxOccurs="0"`, which can never occur.
    pub(super) fn map_from_xml(context: &MappingContext, node: Node) -> Result<Option<Self>, XsdError> {
        let tag_name = node.tag_name().name();
        let term = match tag_name {
            ElementDeclaration::TAG_NAME => match qname_attribute(node, "ref")? {
                Some(name) => Term::ElementRef(name),
                None => Term::Element(ElementDeclaration::map_from_xml_local(context, node)?),
            },
            ModelGroupDefinition::TAG_NAME => {
                let name = qname_attribute(node, "ref")?.ok_or(XsdError::MissingAttribute {
                    element: ModelGroupDefinition::TAG_NAME.into(),
                    attribute: "ref",
                })?;
                Term::GroupRef(name)
            }
            "any" => Term::Wildcard,
            _ if Compositor::from_tag_name(tag_name).is_some() => {
                Term::ModelGroup(ModelGroup::map_from_xml(context, node)?)
            }
            _ => return Ok(None),
        };

        let min_occurs = attribute(node, "minOccurs")?.unwrap_or(1);
        let max_occurs = attribute(node, "maxOccurs")?.unwrap_or(MaxOccurs::Count(1));
        if max_occurs == MaxOccurs::Count(0) {
            return Ok(None);
        }

        Ok(Some(Self {
            min_occurs,
            max_occurs,
            term,
        }))
    }

    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }

    pub fn is_repeated(&self) -> bool {
        self.max_occurs.is_many()
    }
}
