use std::collections::HashSet;

use log::warn;
use roxmltree::Node;

use super::builtins::{BuiltinType, TypeFamily};
use super::components::SchemaComponentTable;
use super::constraining_facet::ConstrainingFacets;
use super::error::XsdError;
use super::mapping_context::{children_named, first_child_named, MappingContext};
use super::values::{qname_attribute, qname_list_attribute};
use super::xstypes::{QName, Sequence};
use super::TypeDefinition;

/// Schema Component: Simple Type Definition (§3.16)
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleTypeDefinition {
    /// `None` for anonymous definitions
    pub name: Option<QName>,
    pub variety: Variety,
    /// The facets of this definition's own `<restriction>`, not including inherited ones.
    pub facets: ConstrainingFacets,
}

/// How a simple type definition obtains its value space.
#[derive(Clone, Debug, PartialEq)]
pub enum Variety {
    /// One of the pre-registered built-ins
    Builtin(BuiltinType),
    /// Restriction of `base`
    Atomic(SimpleBase),
    List(SimpleBase),
    Union(Sequence<SimpleBase>),
}

/// A reference to another simple type: by name, or an anonymous definition nested in place.
#[derive(Clone, Debug, PartialEq)]
pub enum SimpleBase {
    Named(QName),
    Anonymous(Box<SimpleTypeDefinition>),
}

impl SimpleTypeDefinition {
    pub const TAG_NAME: &'static str = "simpleType";

    pub fn builtin(builtin: BuiltinType) -> Self {
        Self {
            name: Some(builtin.name()),
            variety: Variety::Builtin(builtin),
            facets: ConstrainingFacets::default(),
        }
    }

    pub(super) fn map_from_xml(
        context: &MappingContext,
        simple_type: Node,
        top_level: bool,
    ) -> Result<Self, XsdError> {
        let name = if top_level {
            Some(context.top_level_name(simple_type)?)
        } else {
            None
        };

        if let Some(restriction) = first_child_named(simple_type, "restriction") {
            let base = Self::base_or_nested(context, restriction, "base")?;
            return Ok(Self {
                name,
                variety: Variety::Atomic(base),
                facets: ConstrainingFacets::map_from_xml(restriction)?,
            });
        }

        if let Some(list) = first_child_named(simple_type, "list") {
            let item = Self::base_or_nested(context, list, "itemType")?;
            return Ok(Self {
                name,
                variety: Variety::List(item),
                facets: ConstrainingFacets::default(),
            });
        }

        if let Some(union) = first_child_named(simple_type, "union") {
            let mut members = qname_list_attribute(union, "memberTypes")?
                .into_iter()
                .map(SimpleBase::Named)
                .collect::<Sequence<_>>();
            for nested in children_named(union, Self::TAG_NAME) {
                members.push(SimpleBase::Anonymous(Box::new(Self::map_from_xml(
                    context, nested, false,
                )?)));
            }
            return Ok(Self {
                name,
                variety: Variety::Union(members),
                facets: ConstrainingFacets::default(),
            });
        }

        Err(XsdError::MissingContent {
            element: Self::TAG_NAME.into(),
            expected: "<restriction>, <list> or <union>",
        })
    }

    /// Reads the base of a `<restriction>` or the item type of a `<list>`: either the named type
    /// in `attribute_name` or a nested `<simpleType>`.
    fn base_or_nested(
        context: &MappingContext,
        node: Node,
        attribute_name: &'static str,
    ) -> Result<SimpleBase, XsdError> {
        if let Some(name) = qname_attribute(node, attribute_name)? {
            return Ok(SimpleBase::Named(name));
        }
        match first_child_named(node, Self::TAG_NAME) {
            Some(nested) => Ok(SimpleBase::Anonymous(Box::new(Self::map_from_xml(
                context, nested, false,
            )?))),
            None => Err(XsdError::MissingAttribute {
                element: node.tag_name().name().to_string(),
                attribute: attribute_name,
            }),
        }
    }
}

/// Shape of a resolved simple type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResolvedVariety {
    Atomic,
    List,
    Union,
}

/// A simple type with its restriction chain followed down to the built-in primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSimpleType {
    /// The built-in the chain ends in; `None` for lists, unions and broken chains.
    pub builtin: Option<BuiltinType>,
    pub variety: ResolvedVariety,
    /// Effective facets: own facets merged with those of every base.
    pub facets: ConstrainingFacets,
    /// Names of the named types on the chain, most derived first, ending with the built-in's name.
    pub type_names: Sequence<QName>,
}

impl ResolvedSimpleType {
    /// Follows the restriction chain of `definition` through `table`.
    ///
    /// A chain that loops back onto itself is cut at the repeated type with a warning; the
    /// result then has no built-in and counts as an unrecognized type.
    pub fn resolve(
        table: &SchemaComponentTable,
        definition: &SimpleTypeDefinition,
    ) -> Result<Self, XsdError> {
        let mut resolved = Self {
            builtin: None,
            variety: ResolvedVariety::Atomic,
            facets: definition.facets.clone(),
            type_names: definition.name.iter().cloned().collect(),
        };
        let mut visited = HashSet::new();
        let mut current = definition;

        loop {
            let base = match &current.variety {
                Variety::Builtin(builtin) => {
                    resolved.builtin = Some(*builtin);
                    return Ok(resolved);
                }
                Variety::List(_) => {
                    resolved.variety = ResolvedVariety::List;
                    return Ok(resolved);
                }
                Variety::Union(_) => {
                    resolved.variety = ResolvedVariety::Union;
                    return Ok(resolved);
                }
                Variety::Atomic(base) => base,
            };

            current = match base {
                SimpleBase::Anonymous(nested) => nested.as_ref(),
                SimpleBase::Named(name) => {
                    let ref_ = table.resolve_type(name)?;
                    if !visited.insert(ref_) {
                        warn!("Restriction chain of {name} loops back onto itself; cutting it");
                        return Ok(resolved);
                    }
                    match table.get(ref_) {
                        TypeDefinition::Simple(simple) => simple,
                        TypeDefinition::Complex(_) => {
                            warn!("Simple type restricts complex type {name}");
                            return Ok(resolved);
                        }
                    }
                }
            };

            if let Some(name) = &current.name {
                resolved.type_names.push(name.clone());
            }
            resolved.facets.inherit(&current.facets);
        }
    }

    /// Layers a more derived restriction's facets over this type.
    pub fn restricted_by(mut self, facets: &ConstrainingFacets) -> Self {
        let mut merged = facets.clone();
        merged.inherit(&self.facets);
        self.facets = merged;
        self
    }

    /// The family of the built-in; lists, unions and broken chains are [`TypeFamily::Other`].
    pub fn family(&self) -> TypeFamily {
        match (self.variety, self.builtin) {
            (ResolvedVariety::Atomic, Some(builtin)) => builtin.family(),
            _ => TypeFamily::Other,
        }
    }
}

impl SchemaComponentTable {
    /// Shorthand for [`ResolvedSimpleType::resolve`].
    pub fn resolve_simple(
        &self,
        definition: &SimpleTypeDefinition,
    ) -> Result<ResolvedSimpleType, XsdError> {
        ResolvedSimpleType::resolve(self, definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{read_schema, Schema};

    const DECIMALS: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:simpleType name="TDec">
            <xs:restriction base="xs:decimal"><xs:totalDigits value="15"/></xs:restriction>
        </xs:simpleType>
        <xs:simpleType name="TDec_1302">
            <xs:restriction base="TDec"><xs:fractionDigits value="2"/></xs:restriction>
        </xs:simpleType>
        <xs:simpleType name="TCodes">
            <xs:restriction>
                <xs:simpleType><xs:restriction base="xs:string"><xs:maxLength value="5"/></xs:restriction></xs:simpleType>
                <xs:enumeration value="A"/>
            </xs:restriction>
        </xs:simpleType>
        <xs:simpleType name="TList"><xs:list itemType="xs:int"/></xs:simpleType>
        <xs:simpleType name="TLoopA"><xs:restriction base="TLoopB"/></xs:simpleType>
        <xs:simpleType name="TLoopB"><xs:restriction base="TLoopA"/></xs:simpleType>
    </xs:schema>"#;

    fn setup() -> (Schema, SchemaComponentTable) {
        let doc = roxmltree::Document::parse(DECIMALS).unwrap();
        let schema = read_schema(&doc).unwrap();
        let mut table = SchemaComponentTable::default();
        table.register(&schema).unwrap();
        (schema, table)
    }

    fn resolve(table: &SchemaComponentTable, name: &str) -> ResolvedSimpleType {
        let definition = table
            .type_definition(&QName::local(name))
            .unwrap()
            .simple()
            .unwrap();
        ResolvedSimpleType::resolve(table, definition).unwrap()
    }

    #[test]
    fn facets_merge_along_the_chain() {
        let (_, table) = setup();
        let resolved = resolve(&table, "TDec_1302");
        assert_eq!(resolved.builtin, Some(BuiltinType::Decimal));
        assert_eq!(resolved.facets.total_digits, Some(15));
        assert_eq!(resolved.facets.fraction_digits, Some(2));
        assert_eq!(
            resolved.type_names,
            vec![
                QName::local("TDec_1302"),
                QName::local("TDec"),
                BuiltinType::Decimal.name()
            ]
        );
    }

    #[test]
    fn anonymous_base_is_followed() {
        let (_, table) = setup();
        let resolved = resolve(&table, "TCodes");
        assert_eq!(resolved.family(), TypeFamily::String);
        assert_eq!(resolved.facets.max_length, Some(5));
        assert_eq!(resolved.facets.enumeration, vec!["A".to_string()]);
    }

    #[test]
    fn lists_and_loops_have_no_family() {
        let (_, table) = setup();
        assert_eq!(resolve(&table, "TList").variety, ResolvedVariety::List);
        assert_eq!(resolve(&table, "TList").family(), TypeFamily::Other);
        assert_eq!(resolve(&table, "TLoopA").builtin, None);
    }

    #[test]
    fn unresolved_base_is_an_error() {
        let doc = roxmltree::Document::parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:simpleType name="T"><xs:restriction base="Missing"/></xs:simpleType>
            </xs:schema>"#,
        )
        .unwrap();
        let schema = read_schema(&doc).unwrap();
        let mut table = SchemaComponentTable::default();
        table.register(&schema).unwrap();
        let definition = table
            .type_definition(&QName::local("T"))
            .unwrap()
            .simple()
            .unwrap();
        assert_eq!(
            ResolvedSimpleType::resolve(&table, definition),
            Err(XsdError::UnresolvedType(QName::local("Missing")))
        );
    }
}
