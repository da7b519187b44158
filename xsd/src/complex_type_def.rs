use std::collections::HashSet;

use log::{debug, warn};
use roxmltree::Node;

use super::{
    attribute_use::AttributeUse,
    builtins::BuiltinType,
    components::SchemaComponentTable,
    constraining_facet::ConstrainingFacets,
    error::XsdError,
    mapping_context::first_child_named,
    particle::Particle,
    simple_type_def::ResolvedSimpleType,
    values::{attribute, qname_attribute},
    xstypes::{QName, Sequence},
    MappingContext, SimpleTypeDefinition, TypeDefinition,
};

/// Schema Component: Complex Type Definition, a kind of Type Definition (§3.4)
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexTypeDefinition {
    /// `None` for anonymous definitions
    pub name: Option<QName>,
    pub abstract_: bool,
    pub derivation: Option<Derivation>,
    pub content_type: ContentType,
    /// Attribute uses declared by this definition itself
    pub attribute_uses: Sequence<AttributeUse>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Derivation {
    pub method: DerivationMethod,
    pub base: QName,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivationMethod {
    Extension,
    Restriction,
}

/// Property Record: Content Type (§3.4.1), holding what this definition itself declares.
///
/// For an extension the base's content comes first; it is not copied in here.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentType {
    Empty,
    /// Character content; carries the facets of a `<simpleContent><restriction>`.
    Simple(ConstrainingFacets),
    ElementOnly(Particle),
    Mixed(Particle),
}

impl ComplexTypeDefinition {
    pub const TAG_NAME: &'static str = "complexType";

    pub(super) fn map_from_xml(
        context: &MappingContext,
        complex_type: Node,
        top_level: bool,
    ) -> Result<Self, XsdError> {
        let name = if top_level {
            Some(context.top_level_name(complex_type)?)
        } else {
            None
        };
        let abstract_ = attribute(complex_type, "abstract")?.unwrap_or(false);
        let mixed = attribute(complex_type, "mixed")?.unwrap_or(false);

        let mut definition = if let Some(simple_content) =
            first_child_named(complex_type, "simpleContent")
        {
            Self::map_with_simple_content(context, simple_content)?
        } else if let Some(complex_content) = first_child_named(complex_type, "complexContent") {
            let mixed = attribute(complex_content, "mixed")?.unwrap_or(mixed);
            Self::map_with_explicit_complex_content(context, complex_content, mixed)?
        } else {
            Self::map_with_implicit_complex_content(context, complex_type, mixed)?
        };

        definition.name = name;
        definition.abstract_ = abstract_;
        Ok(definition)
    }

    fn map_with_simple_content(
        context: &MappingContext,
        simple_content: Node,
    ) -> Result<Self, XsdError> {
        let (method, derivation_node) = Self::derivation_node(simple_content)?;
        let base = Self::derivation_base(derivation_node)?;

        let facets = match method {
            DerivationMethod::Restriction => ConstrainingFacets::map_from_xml(derivation_node)?,
            DerivationMethod::Extension => ConstrainingFacets::default(),
        };

        Ok(Self {
            name: None,
            abstract_: false,
            derivation: Some(Derivation { method, base }),
            content_type: ContentType::Simple(facets),
            attribute_uses: Self::map_attribute_uses(context, derivation_node)?,
        })
    }

    fn map_with_explicit_complex_content(
        context: &MappingContext,
        complex_content: Node,
        mixed: bool,
    ) -> Result<Self, XsdError> {
        let (method, derivation_node) = Self::derivation_node(complex_content)?;
        let base = Self::derivation_base(derivation_node)?;

        Ok(Self {
            name: None,
            abstract_: false,
            derivation: Some(Derivation { method, base }),
            content_type: Self::map_content_type(context, derivation_node, mixed)?,
            attribute_uses: Self::map_attribute_uses(context, derivation_node)?,
        })
    }

    fn map_with_implicit_complex_content(
        context: &MappingContext,
        complex_type: Node,
        mixed: bool,
    ) -> Result<Self, XsdError> {
        Ok(Self {
            name: None,
            abstract_: false,
            derivation: None,
            content_type: Self::map_content_type(context, complex_type, mixed)?,
            attribute_uses: Self::map_attribute_uses(context, complex_type)?,
        })
    }

    /// Finds the `<extension>` or `<restriction>` child of `<simpleContent>` / `<complexContent>`.
    fn derivation_node<'a, 'input>(
        content: Node<'a, 'input>,
    ) -> Result<(DerivationMethod, Node<'a, 'input>), XsdError> {
        if let Some(extension) = first_child_named(content, "extension") {
            Ok((DerivationMethod::Extension, extension))
        } else if let Some(restriction) = first_child_named(content, "restriction") {
            Ok((DerivationMethod::Restriction, restriction))
        } else {
            Err(XsdError::MissingContent {
                element: content.tag_name().name().to_string(),
                expected: "<extension> or <restriction>",
            })
        }
    }

    fn derivation_base(derivation_node: Node) -> Result<QName, XsdError> {
        qname_attribute(derivation_node, "base")?.ok_or_else(|| XsdError::MissingAttribute {
            element: derivation_node.tag_name().name().to_string(),
            attribute: "base",
        })
    }

    fn map_content_type(
        context: &MappingContext,
        parent: Node,
        mixed: bool,
    ) -> Result<ContentType, XsdError> {
        let mut particle = None;
        for child in parent.children().filter(|c| c.is_element()) {
            if let Some(mapped) = Particle::map_from_xml(context, child)? {
                particle = Some(mapped);
                break;
            }
        }

        Ok(match particle {
            None => ContentType::Empty,
            Some(particle) if mixed => ContentType::Mixed(particle),
            Some(particle) => ContentType::ElementOnly(particle),
        })
    }

    fn map_attribute_uses(
        context: &MappingContext,
        parent: Node,
    ) -> Result<Sequence<AttributeUse>, XsdError> {
        let mut attribute_uses = Sequence::new();
        for child in parent.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                AttributeUse::TAG_NAME => {
                    attribute_uses.push(AttributeUse::map_from_xml(context, child)?)
                }
                "attributeGroup" => warn!(
                    "attribute group references are not expanded ({})",
                    child.attribute("ref").unwrap_or("?")
                ),
                "anyAttribute" => debug!("skipping <anyAttribute>"),
                _ => {}
            }
        }
        Ok(attribute_uses)
    }

    /// The particle this definition itself declares, if any.
    pub fn particle(&self) -> Option<&Particle> {
        match &self.content_type {
            ContentType::ElementOnly(particle) | ContentType::Mixed(particle) => Some(particle),
            ContentType::Empty | ContentType::Simple(_) => None,
        }
    }

    pub fn extension_base(&self) -> Option<&QName> {
        self.derivation
            .as_ref()
            .filter(|d| d.method == DerivationMethod::Extension)
            .map(|d| &d.base)
    }

    /// Whether this definition or one of its bases has simple content.
    pub fn has_simple_content(&self, table: &SchemaComponentTable) -> bool {
        let mut visited = HashSet::new();
        let mut current = self;
        loop {
            if let ContentType::Simple(_) = current.content_type {
                return true;
            }
            let Some(base) = current.extension_base() else {
                return false;
            };
            let Ok(ref_) = table.resolve_type(base) else {
                return false;
            };
            if !visited.insert(ref_) {
                return false;
            }
            match table.get(ref_) {
                TypeDefinition::Simple(_) => return true,
                TypeDefinition::Complex(complex) => current = complex,
            }
        }
    }

    /// Resolves the simple type of the character content, applying every `<simpleContent>`
    /// restriction between this definition and the simple base.
    ///
    /// A definition without a simple base resolves to `xs:anySimpleType`.
    pub fn resolve_simple_content(
        &self,
        table: &SchemaComponentTable,
    ) -> Result<ResolvedSimpleType, XsdError> {
        let mut restrictions = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self;

        let mut resolved = loop {
            if let ContentType::Simple(facets) = &current.content_type {
                restrictions.push(facets);
            }
            let Some(derivation) = &current.derivation else {
                break Self::any_simple_type(table)?;
            };
            let ref_ = table.resolve_type(&derivation.base)?;
            if !visited.insert(ref_) {
                warn!("Derivation chain of {} loops back onto itself", derivation.base);
                break Self::any_simple_type(table)?;
            }
            match table.get(ref_) {
                TypeDefinition::Simple(simple) => break ResolvedSimpleType::resolve(table, simple)?,
                TypeDefinition::Complex(complex) => current = complex,
            }
        };

        for facets in restrictions.into_iter().rev() {
            resolved = resolved.restricted_by(facets);
        }
        Ok(resolved)
    }

    fn any_simple_type(table: &SchemaComponentTable) -> Result<ResolvedSimpleType, XsdError> {
        ResolvedSimpleType::resolve(
            table,
            &SimpleTypeDefinition::builtin(BuiltinType::AnySimpleType),
        )
    }
}
