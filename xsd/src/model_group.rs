use roxmltree::Node;

use super::{error::XsdError, particle::Particle, xstypes::Sequence, MappingContext};

/// Schema Component: Model Group, a kind of Term (§3.8)
#[derive(Clone, Debug, PartialEq)]
pub struct ModelGroup {
    pub compositor: Compositor,
    pub particles: Sequence<Particle>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compositor {
    All,
    Choice,
    Sequence,
}

impl Compositor {
    pub fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Self::All),
            "choice" => Some(Self::Choice),
            "sequence" => Some(Self::Sequence),
            _ => None,
        }
    }
}

impl ModelGroup {
    /// Maps an `<all>`, `<choice>` or `<sequence>` element, ignoring its own occurrence bounds.
    pub(super) fn map_from_xml(context: &MappingContext, group: Node) -> Result<Self, XsdError> {
        let compositor = Compositor::from_tag_name(group.tag_name().name()).ok_or_else(|| {
            XsdError::MissingContent {
                element: group.tag_name().name().to_string(),
                expected: "<all>, <choice> or <sequence>",
            }
        })?;

        let mut particles = Sequence::new();
        for child in group.children().filter(|c| c.is_element()) {
            if let Some(particle) = Particle::map_from_xml(context, child)? {
                particles.push(particle);
            }
        }

        Ok(Self {
            compositor,
            particles,
        })
    }
}
