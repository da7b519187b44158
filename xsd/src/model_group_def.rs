use roxmltree::Node;

use super::{
    error::XsdError, model_group::Compositor, xstypes::QName, MappingContext, ModelGroup,
};

/// Schema Component: Model Group Definition, a kind of Annotated Component (§3.7)
#[derive(Clone, Debug, PartialEq)]
pub struct ModelGroupDefinition {
    pub name: QName,
    pub model_group: ModelGroup,
}

impl ModelGroupDefinition {
    pub const TAG_NAME: &'static str = "group";

    pub(super) fn map_from_xml(context: &MappingContext, group: Node) -> Result<Self, XsdError> {
        let name = context.top_level_name(group)?;

        let model_group = group
            .children()
            .find(|c| c.is_element() && Compositor::from_tag_name(c.tag_name().name()).is_some())
            .ok_or_else(|| XsdError::MissingContent {
                element: Self::TAG_NAME.into(),
                expected: "<all>, <choice> or <sequence>",
            })?;

        Ok(Self {
            name,
            model_group: ModelGroup::map_from_xml(context, model_group)?,
        })
    }
}
