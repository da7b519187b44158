use log::debug;
use roxmltree::Node;

use super::error::XsdError;
use super::values::{attribute, required_attribute};
use super::xstypes::Sequence;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WhiteSpaceValue {
    Preserve,
    Replace,
    Collapse,
}

/// The constraining facets (pt. 2, §4.3) that influence storage, collected from the facet children
/// of one `<restriction>`.
///
/// Value-range facets (minInclusive and friends), assertions and explicitTimezone are read past.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstrainingFacets {
    pub length: Option<u64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    /// Every `pattern` of the type and, after [`inherit`](Self::inherit), of its bases.
    pub patterns: Sequence<String>,
    pub enumeration: Sequence<String>,
    pub total_digits: Option<u64>,
    pub fraction_digits: Option<u64>,
    pub white_space: Option<WhiteSpaceValue>,
}

impl ConstrainingFacets {
    /// Reads the facet children of `restriction`.
    pub(crate) fn map_from_xml(restriction: Node) -> Result<Self, XsdError> {
        let mut facets = Self::default();

        for facet in restriction.children().filter(|e| e.is_element()) {
            match facet.tag_name().name() {
                "length" => facets.length = Some(required_attribute(facet, "value")?),
                "minLength" => facets.min_length = Some(required_attribute(facet, "value")?),
                "maxLength" => facets.max_length = Some(required_attribute(facet, "value")?),
                "pattern" => facets.patterns.push(required_attribute(facet, "value")?),
                "enumeration" => facets.enumeration.push(required_attribute(facet, "value")?),
                "totalDigits" => facets.total_digits = Some(required_attribute(facet, "value")?),
                "fractionDigits" => {
                    facets.fraction_digits = Some(required_attribute(facet, "value")?)
                }
                "whiteSpace" => {
                    let value: String = required_attribute(facet, "value")?;
                    facets.white_space = Some(match value.as_str() {
                        "preserve" => WhiteSpaceValue::Preserve,
                        "replace" => WhiteSpaceValue::Replace,
                        "collapse" => WhiteSpaceValue::Collapse,
                        _ => {
                            return Err(XsdError::InvalidAttributeValue {
                                element: "whiteSpace".into(),
                                attribute: "value".into(),
                                value,
                            })
                        }
                    });
                }
                "annotation" | "simpleType" | "sequence" | "choice" | "all" | "group"
                | "attribute" | "attributeGroup" | "anyAttribute" => {}
                other => {
                    // Remaining facets still have to be well-formed
                    let _: Option<String> = attribute(facet, "value")?;
                    debug!("ignoring facet <{other}>");
                }
            }
        }

        Ok(facets)
    }

    /// Fills in what this (more derived) facet set leaves open from `base`.
    ///
    /// Single-valued facets keep the nearest value. Patterns accumulate, since every pattern of
    /// every step in the derivation constrains the value. An enumeration is taken from `base` only
    /// if this set has none, because a restriction's enumeration replaces its base's.
    pub fn inherit(&mut self, base: &ConstrainingFacets) {
        self.length = self.length.or(base.length);
        self.min_length = self.min_length.or(base.min_length);
        self.max_length = self.max_length.or(base.max_length);
        self.patterns.extend(base.patterns.iter().cloned());
        if self.enumeration.is_empty() {
            self.enumeration = base.enumeration.clone();
        }
        self.total_digits = self.total_digits.or(base.total_digits);
        self.fraction_digits = self.fraction_digits.or(base.fraction_digits);
        self.white_space = self.white_space.or(base.white_space);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
