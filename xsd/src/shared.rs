use super::{
    complex_type_def::ComplexTypeDefinition, element_decl::ElementDeclaration,
    model_group::ModelGroup, simple_type_def::SimpleTypeDefinition, xstypes::QName,
};

/// Supertype of [simple](SimpleTypeDefinition) and [complex](ComplexTypeDefinition) type
/// definition (§2.2.1)
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDefinition {
    Simple(SimpleTypeDefinition),
    Complex(ComplexTypeDefinition),
}

impl TypeDefinition {
    /// `None` for anonymous definitions.
    pub fn name(&self) -> Option<&QName> {
        match self {
            Self::Simple(simple) => simple.name.as_ref(),
            Self::Complex(complex) => complex.name.as_ref(),
        }
    }

    pub fn simple(&self) -> Option<&SimpleTypeDefinition> {
        match self {
            Self::Simple(simple) => Some(simple),
            Self::Complex(_) => None,
        }
    }

    pub fn complex(&self) -> Option<&ComplexTypeDefinition> {
        match self {
            Self::Simple(_) => None,
            Self::Complex(complex) => Some(complex),
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }
}

/// The term of a [`Particle`](super::Particle) (§3.9)
///
/// References are kept by name and resolved through the component table on use, so a content
/// model may refer to components of schemas registered later.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// A local element declaration
    Element(ElementDeclaration),
    /// `<element ref="..."/>`
    ElementRef(QName),
    ModelGroup(ModelGroup),
    /// `<group ref="..."/>`
    GroupRef(QName),
    /// `<any>`
    Wildcard,
}
