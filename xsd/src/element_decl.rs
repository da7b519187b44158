use roxmltree::Node;

use super::{
    error::XsdError,
    mapping_context::first_child_named,
    values::{attribute, qname_attribute, required_attribute},
    xstypes::{AnyURI, NCName, QName},
    ComplexTypeDefinition, MappingContext, SimpleTypeDefinition, TypeDefinition,
};

/// Schema Component: Element Declaration, a kind of Term (§3.3)
#[derive(Clone, Debug, PartialEq)]
pub struct ElementDeclaration {
    pub name: NCName,
    /// The schema's target namespace for top-level declarations, `None` for local ones.
    pub target_namespace: Option<AnyURI>,
    pub type_: ElementType,
    pub nillable: bool,
    pub abstract_: bool,
}

/// The declared type of an element.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// `type="..."`
    Named(QName),
    /// A nested `<simpleType>` or `<complexType>`
    Anonymous(Box<TypeDefinition>),
    /// Neither; the type is `xs:anyType`.
    Default,
}

impl ElementDeclaration {
    pub const TAG_NAME: &'static str = "element";

    pub fn qualified_name(&self) -> QName {
        QName::new(self.target_namespace.as_ref(), &self.name)
    }

    pub(super) fn map_from_xml_top_level(
        context: &MappingContext,
        element: Node,
    ) -> Result<Self, XsdError> {
        let mut declaration = Self::map_from_xml_local(context, element)?;
        declaration.target_namespace = context.target_namespace().map(String::from);
        Ok(declaration)
    }

    pub(super) fn map_from_xml_local(
        context: &MappingContext,
        element: Node,
    ) -> Result<Self, XsdError> {
        let name = required_attribute(element, "name")?;

        // {type definition}: a nested definition wins over the type [attribute]; a
        // substitutionGroup head's type is not looked up, so such elements default to anyType.
        let type_ = if let Some(simple_type) =
            first_child_named(element, SimpleTypeDefinition::TAG_NAME)
        {
            ElementType::Anonymous(Box::new(TypeDefinition::Simple(
                SimpleTypeDefinition::map_from_xml(context, simple_type, false)?,
            )))
        } else if let Some(complex_type) =
            first_child_named(element, ComplexTypeDefinition::TAG_NAME)
        {
            ElementType::Anonymous(Box::new(TypeDefinition::Complex(
                ComplexTypeDefinition::map_from_xml(context, complex_type, false)?,
            )))
        } else if let Some(type_name) = qname_attribute(element, "type")? {
            ElementType::Named(type_name)
        } else {
            ElementType::Default
        };

        Ok(Self {
            name,
            target_namespace: None,
            type_,
            nillable: attribute(element, "nillable")?.unwrap_or(false),
            abstract_: attribute(element, "abstract")?.unwrap_or(false),
        })
    }
}
