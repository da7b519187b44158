use log::debug;
use roxmltree::Node;

use super::{
    element_decl::ElementDeclaration,
    error::XsdError,
    import::Import,
    model_group_def::ModelGroupDefinition,
    shared::TypeDefinition,
    xstypes::{AnyURI, Sequence},
    ComplexTypeDefinition, MappingContext, SimpleTypeDefinition,
};

/// Schema Component: Schema (§3.17), as read from a single document.
///
/// Components of included and imported documents are not merged in here; register every loaded
/// schema with the same [`SchemaComponentTable`](super::SchemaComponentTable) instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    pub target_namespace: Option<AnyURI>,
    /// Top-level type definitions in document order
    pub type_definitions: Sequence<TypeDefinition>,
    /// Top-level element declarations in document order
    pub element_declarations: Sequence<ElementDeclaration>,
    pub model_group_definitions: Sequence<ModelGroupDefinition>,
    /// `<include>` and `<import>` directives
    pub imports: Sequence<Import>,
}

impl Schema {
    pub const TAG_NAME: &'static str = "schema";

    pub fn map_from_xml(schema: Node) -> Result<Self, XsdError> {
        if schema.tag_name().name() != Self::TAG_NAME {
            return Err(XsdError::NotASchema(schema.tag_name().name().to_string()));
        }

        let context = MappingContext::new(schema);
        let mut result = Self {
            target_namespace: context.target_namespace().map(String::from),
            ..Default::default()
        };

        for top_level_element in context.schema_node().children().filter(|e| e.is_element()) {
            match top_level_element.tag_name().name() {
                SimpleTypeDefinition::TAG_NAME => {
                    result.type_definitions.push(TypeDefinition::Simple(
                        SimpleTypeDefinition::map_from_xml(&context, top_level_element, true)?,
                    ));
                }
                ComplexTypeDefinition::TAG_NAME => {
                    result.type_definitions.push(TypeDefinition::Complex(
                        ComplexTypeDefinition::map_from_xml(&context, top_level_element, true)?,
                    ));
                }
                ElementDeclaration::TAG_NAME => {
                    result
                        .element_declarations
                        .push(ElementDeclaration::map_from_xml_top_level(
                            &context,
                            top_level_element,
                        )?);
                }
                ModelGroupDefinition::TAG_NAME => {
                    result
                        .model_group_definitions
                        .push(ModelGroupDefinition::map_from_xml(
                            &context,
                            top_level_element,
                        )?);
                }
                Import::TAG_NAME | Import::INCLUDE_TAG_NAME => {
                    result.imports.push(Import::map_from_xml(top_level_element)?);
                }
                other => debug!("skipping top-level <{other}>"),
            }
        }

        Ok(result)
    }

    pub fn element_declaration(&self, name: &str) -> Option<&ElementDeclaration> {
        self.element_declarations.iter().find(|e| e.name == name)
    }

    /// Named top-level complex type definitions in document order.
    pub fn complex_type_definitions(&self) -> impl Iterator<Item = &ComplexTypeDefinition> {
        self.type_definitions
            .iter()
            .filter_map(TypeDefinition::complex)
    }
}
