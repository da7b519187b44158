use roxmltree::Node;

use super::{error::XsdError, values::attribute};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImportKind {
    /// `<include>`: same target namespace
    Include,
    /// `<import>`: components of another namespace
    Import,
}

/// This structure represents the `include` and `import` elements; they are not schema components.
///
/// Note that an import is allowed to have neither a `schemaLocation` nor a `namespace` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub kind: ImportKind,
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

impl Import {
    pub const TAG_NAME: &'static str = "import";
    pub const INCLUDE_TAG_NAME: &'static str = "include";

    pub(super) fn map_from_xml(import: Node) -> Result<Self, XsdError> {
        let kind = if import.tag_name().name() == Self::INCLUDE_TAG_NAME {
            ImportKind::Include
        } else {
            ImportKind::Import
        };
        Ok(Self {
            kind,
            namespace: attribute(import, "namespace")?,
            schema_location: attribute(import, "schemaLocation")?,
        })
    }
}
