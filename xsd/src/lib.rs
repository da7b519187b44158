//! Reads XSD documents into a small component model and resolves names across documents.

pub mod attribute_use;
pub mod builtins;
pub mod complex_type_def;
pub mod constraining_facet;
pub mod element_decl;
pub mod error;
pub mod import;
pub mod model_group;
pub mod model_group_def;
pub mod particle;
pub mod schema;
pub mod shared;
pub mod simple_type_def;
pub mod xstypes;

mod components;
mod mapping_context;
mod values;

pub use attribute_use::{AttributeType, AttributeUse};
pub use builtins::{BuiltinType, IntegerWidth, TypeFamily};
pub use complex_type_def::{ComplexTypeDefinition, ContentType, Derivation, DerivationMethod};
pub use constraining_facet::ConstrainingFacets;
pub use element_decl::{ElementDeclaration, ElementType};
pub use error::XsdError;
pub use import::{Import, ImportKind};
pub use model_group::{Compositor, ModelGroup};
pub use model_group_def::ModelGroupDefinition;
pub use particle::{MaxOccurs, Particle};
pub use schema::Schema;
pub use shared::{Term, TypeDefinition};
pub use simple_type_def::{ResolvedSimpleType, ResolvedVariety, SimpleBase, SimpleTypeDefinition, Variety};
pub use xstypes::QName;

pub use components::{Component, Ref, SchemaComponentTable};
use mapping_context::MappingContext;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuiltinOverwriteAction {
    Deny,
    Warn,
    Allow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegisterBuiltins {
    Yes,
    No,
}

/// Maps the document element of `document`, which must be an `<xs:schema>`.
pub fn read_schema(document: &roxmltree::Document) -> Result<Schema, XsdError> {
    Schema::map_from_xml(document.root_element())
}
