use roxmltree::Node;

use super::error::XsdError;
use super::values::required_attribute;
use super::xstypes::QName;

/// Per-document state shared by the `map_from_xml` functions.
#[derive(Copy, Clone)]
pub(super) struct MappingContext<'a, 'input> {
    schema: Node<'a, 'input>,
    target_namespace: Option<&'a str>,
}

impl<'a, 'input: 'a> MappingContext<'a, 'input> {
    pub(super) fn new(schema: Node<'a, 'input>) -> Self {
        Self {
            schema,
            target_namespace: schema.attribute("targetNamespace"),
        }
    }

    pub(super) fn schema_node(&self) -> Node<'a, 'input> {
        self.schema
    }

    pub(super) fn target_namespace(&self) -> Option<&'a str> {
        self.target_namespace
    }

    /// The name of a top-level definition: its `name` attribute in the target namespace.
    pub(super) fn top_level_name(&self, node: Node) -> Result<QName, XsdError> {
        let local_name: String = required_attribute(node, "name")?;
        Ok(QName::new(self.target_namespace, local_name))
    }
}

/// Child elements of `node` with the given local name.
pub(super) fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

pub(super) fn first_child_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Option<Node<'a, 'input>> {
    children_named(node, name).next()
}
