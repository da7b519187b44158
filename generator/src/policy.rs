//! Domain policies: the per-domain decisions and overrides consulted by the walker and the type
//! mapper.

use serde::Deserialize;
use xsd2sql_xsd::QName;

use crate::config::DomainConfig;

/// Outcome of [`DomainPolicy::should_create_table`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Table,
    Column,
    /// Let the structural rules decide.
    UseDefault,
}

/// Fallback sizes for types without facets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MappingDefaults {
    pub string_size: u32,
    pub numeric_precision: u32,
    pub numeric_scale: u32,
}

impl Default for MappingDefaults {
    fn default() -> Self {
        Self {
            string_size: 255,
            numeric_precision: 15,
            numeric_scale: 2,
        }
    }
}

/// A `pattern` facet that maps to a fixed SQL type.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PatternMapping {
    pub pattern: String,
    pub sql_type: String,
}

/// A column that is placed right after the key columns.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EssentialField {
    pub name: String,
    /// Type of the column; an absent column is only added when this is set.
    #[serde(default, rename = "type")]
    pub sql_type: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// What a policy gets to see of an element at a decision point.
#[derive(Copy, Clone, Debug)]
pub struct ElementContext<'a> {
    pub name: &'a str,
    /// Declared type name, `None` for anonymous and default types.
    pub type_name: Option<&'a QName>,
    pub is_complex: bool,
    pub is_repeated: bool,
}

/// Domain-specific behaviour. Every hook has a neutral default, so an empty impl is a complete
/// policy.
pub trait DomainPolicy {
    fn domain_name(&self) -> &str {
        "generic"
    }

    fn should_create_table(
        &self,
        _element: &ElementContext<'_>,
        _parent_table: Option<&str>,
    ) -> Decision {
        Decision::UseDefault
    }

    /// Drops an element and everything below it.
    fn skip_element(&self, _element: &ElementContext<'_>, _parent_table: Option<&str>) -> bool {
        false
    }

    /// Fixed SQL type for the column `column` of `table`.
    fn field_override(&self, _table: &str, _column: &str) -> Option<String> {
        None
    }

    /// Fixed SQL type for every use of the named XSD type.
    fn custom_type(&self, _type_name: &QName) -> Option<String> {
        None
    }

    fn pattern_mappings(&self) -> &[PatternMapping] {
        &[]
    }

    fn essential_fields(&self, _table: &str) -> &[EssentialField] {
        &[]
    }

    fn defaults(&self) -> MappingDefaults {
        MappingDefaults::default()
    }

    /// Name prefixes of complex types that become roots when the main document has no global
    /// elements.
    fn root_type_prefixes(&self) -> &[String] {
        &[]
    }
}

/// The policy without any domain knowledge.
#[derive(Copy, Clone, Debug, Default)]
pub struct GenericPolicy;

impl DomainPolicy for GenericPolicy {}

/// A policy driven by a [`DomainConfig`].
#[derive(Clone, Debug)]
pub struct ConfiguredPolicy {
    config: DomainConfig,
    /// `field_name_rules` with lowercased needles
    name_rules: Vec<(String, String)>,
}

impl ConfiguredPolicy {
    pub fn new(config: DomainConfig) -> Self {
        let name_rules = config
            .field_name_rules
            .iter()
            .map(|rule| (rule.contains.to_lowercase(), rule.sql_type.clone()))
            .collect();
        Self { config, name_rules }
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    /// Whether `list` names the element, either bare or as `parent.element`.
    fn names_element(list: &[String], element: &str, parent_table: Option<&str>) -> bool {
        list.iter().any(|entry| match entry.split_once('.') {
            Some((parent, name)) => name == element && Some(parent) == parent_table,
            None => entry == element,
        })
    }
}

impl DomainPolicy for ConfiguredPolicy {
    fn domain_name(&self) -> &str {
        &self.config.domain
    }

    fn should_create_table(
        &self,
        element: &ElementContext<'_>,
        parent_table: Option<&str>,
    ) -> Decision {
        if Self::names_element(&self.config.table_elements, element.name, parent_table) {
            Decision::Table
        } else if Self::names_element(&self.config.column_elements, element.name, parent_table) {
            Decision::Column
        } else {
            Decision::UseDefault
        }
    }

    fn skip_element(&self, element: &ElementContext<'_>, parent_table: Option<&str>) -> bool {
        Self::names_element(&self.config.skip_elements, element.name, parent_table)
    }

    fn field_override(&self, table: &str, column: &str) -> Option<String> {
        let overrides = &self.config.field_overrides;
        if let Some(sql_type) = overrides
            .get(&format!("{table}.{column}"))
            .or_else(|| overrides.get(column))
        {
            return Some(sql_type.clone());
        }

        let column = column.to_lowercase();
        self.name_rules
            .iter()
            .find(|(needle, _)| column.contains(needle.as_str()))
            .map(|(_, sql_type)| sql_type.clone())
    }

    fn custom_type(&self, type_name: &QName) -> Option<String> {
        let custom_types = &self.config.custom_types;
        custom_types
            .get(&type_name.local_name)
            .or_else(|| custom_types.get(&type_name.to_string()))
            .cloned()
    }

    fn pattern_mappings(&self) -> &[PatternMapping] {
        &self.config.pattern_mappings
    }

    fn essential_fields(&self, table: &str) -> &[EssentialField] {
        self.config
            .essential_fields
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn defaults(&self) -> MappingDefaults {
        self.config.defaults
    }

    fn root_type_prefixes(&self) -> &[String] {
        &self.config.root_type_prefixes
    }
}
