//! Simple type → SQL column type.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use xsd2sql_xsd::{IntegerWidth, ResolvedSimpleType, TypeFamily};

use crate::policy::{DomainPolicy, MappingDefaults};

/// Type used when nothing more specific applies.
pub const FALLBACK_SQL_TYPE: &str = "VARCHAR(255)";

lazy_static! {
    /// A backslash in front of a regex metacharacter
    static ref ESCAPED_META: Regex = Regex::new(r"\\([\[\]{}()*+?.^$|])").unwrap();
    /// One atom with one bounded quantifier, e.g. `[0-9]{8}` or `\d{1,15}`
    static ref SINGLE_QUANTIFIER: Regex =
        Regex::new(r"^(?:\[[^\]]*\]|\\d|\\w|\.)\{(\d+)(?:,(\d+))?\}$").unwrap();
}

/// Which rule produced a [`MappedType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeSource {
    FieldOverride,
    CustomType,
    Pattern,
    Builtin,
    /// No rule matched.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappedType {
    pub sql_type: String,
    pub source: TypeSource,
}

impl MappedType {
    fn new(sql_type: impl Into<String>, source: TypeSource) -> Self {
        Self {
            sql_type: sql_type.into(),
            source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == TypeSource::Fallback
    }
}

/// Maps resolved simple types to SQL types under a domain policy.
///
/// Rules in order, first match wins: field override, custom type (checked for every named type
/// on the derivation chain, most derived first), pattern mapping, built-in family.
pub struct TypeMapper<'p> {
    policy: &'p dyn DomainPolicy,
    defaults: MappingDefaults,
}

impl<'p> TypeMapper<'p> {
    pub fn new(policy: &'p dyn DomainPolicy) -> Self {
        Self {
            policy,
            defaults: policy.defaults(),
        }
    }

    pub fn map_type(&self, resolved: &ResolvedSimpleType, table: &str, column: &str) -> MappedType {
        if let Some(sql_type) = self.policy.field_override(table, column) {
            debug!("{table}.{column}: field override {sql_type}");
            return MappedType::new(sql_type, TypeSource::FieldOverride);
        }

        for type_name in &resolved.type_names {
            if let Some(sql_type) = self.policy.custom_type(type_name) {
                debug!("{table}.{column}: custom type {sql_type} for {type_name}");
                return MappedType::new(sql_type, TypeSource::CustomType);
            }
        }

        if let Some(sql_type) = self.match_pattern(&resolved.facets.patterns) {
            debug!("{table}.{column}: pattern mapping {sql_type}");
            return MappedType::new(sql_type, TypeSource::Pattern);
        }

        self.map_builtin(resolved)
    }

    /// Type of a complex element that is stored as a single column.
    pub fn map_flattened(&self, table: &str, column: &str) -> MappedType {
        match self.policy.field_override(table, column) {
            Some(sql_type) => MappedType::new(sql_type, TypeSource::FieldOverride),
            None => MappedType::new(
                format!("VARCHAR({})", self.defaults.string_size),
                TypeSource::Builtin,
            ),
        }
    }

    fn match_pattern(&self, patterns: &[String]) -> Option<String> {
        if patterns.is_empty() {
            return None;
        }
        let patterns: Vec<_> = patterns.iter().map(|p| normalize_pattern(p)).collect();
        self.policy
            .pattern_mappings()
            .iter()
            .find(|mapping| {
                let wanted = normalize_pattern(&mapping.pattern);
                patterns.iter().any(|p| *p == wanted)
            })
            .map(|mapping| mapping.sql_type.clone())
    }

    fn map_builtin(&self, resolved: &ResolvedSimpleType) -> MappedType {
        let facets = &resolved.facets;
        let sql_type = match resolved.family() {
            TypeFamily::String => {
                let size = facets
                    .max_length
                    .or(facets.length)
                    .or_else(|| facets.patterns.iter().find_map(|p| pattern_length(p)))
                    .or_else(|| (!facets.enumeration.is_empty()).then_some(255))
                    .filter(|&size| size > 0)
                    .unwrap_or(u64::from(self.defaults.string_size));
                format!("VARCHAR({size})")
            }
            TypeFamily::Decimal => {
                let precision = facets
                    .total_digits
                    .unwrap_or(u64::from(self.defaults.numeric_precision));
                let scale = facets
                    .fraction_digits
                    .unwrap_or(u64::from(self.defaults.numeric_scale))
                    .min(precision);
                format!("NUMERIC({precision},{scale})")
            }
            TypeFamily::Integer(IntegerWidth::Small) => "SMALLINT".into(),
            TypeFamily::Integer(IntegerWidth::Regular) => "INTEGER".into(),
            TypeFamily::Integer(IntegerWidth::Big) => "BIGINT".into(),
            TypeFamily::Integer(IntegerWidth::Unbounded) => match facets.total_digits {
                Some(precision) => format!("NUMERIC({precision},0)"),
                None => "BIGINT".into(),
            },
            TypeFamily::Float => "REAL".into(),
            TypeFamily::Double => "DOUBLE PRECISION".into(),
            TypeFamily::Date => "DATE".into(),
            TypeFamily::DateTime => "TIMESTAMP".into(),
            TypeFamily::Time => "TIME".into(),
            TypeFamily::Boolean => FALLBACK_SQL_TYPE.into(),
            TypeFamily::Other => return MappedType::new(FALLBACK_SQL_TYPE, TypeSource::Fallback),
        };
        MappedType::new(sql_type, TypeSource::Builtin)
    }
}

/// Brings a pattern into the form used for comparison: escaped metacharacters are unescaped, and
/// one pair of `^ … $` anchors and one enclosing `( … )` group are removed.
pub fn normalize_pattern(pattern: &str) -> String {
    let unescaped = ESCAPED_META.replace_all(pattern.trim(), "$1");
    let mut normalized: &str = &unescaped;

    if normalized.len() >= 2 && normalized.starts_with('^') && normalized.ends_with('$') {
        normalized = &normalized[1..normalized.len() - 1];
    }
    if let Some(inner) = strip_enclosing_group(normalized) {
        normalized = inner;
    }

    normalized.to_string()
}

/// `Some(inner)` if the whole pattern is one parenthesized group.
fn strip_enclosing_group(pattern: &str) -> Option<&str> {
    let inner = pattern.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0usize;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// Upper length bound of a pattern made of a single quantified atom.
fn pattern_length(pattern: &str) -> Option<u64> {
    let normalized = normalize_pattern(pattern);
    let captures = SINGLE_QUANTIFIER.captures(&normalized)?;
    captures
        .get(2)
        .or_else(|| captures.get(1))
        .and_then(|bound| bound.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DomainConfig;
    use crate::policy::{ConfiguredPolicy, GenericPolicy};
    use xsd2sql_xsd::{BuiltinType, ConstrainingFacets, QName, ResolvedVariety};

    fn resolved(builtin: BuiltinType, facets: ConstrainingFacets) -> ResolvedSimpleType {
        ResolvedSimpleType {
            builtin: Some(builtin),
            variety: ResolvedVariety::Atomic,
            facets,
            type_names: vec![QName::local("TLocal"), builtin.name()],
        }
    }

    fn string_with_pattern(pattern: &str) -> ResolvedSimpleType {
        resolved(
            BuiltinType::String,
            ConstrainingFacets {
                patterns: vec![pattern.into()],
                ..Default::default()
            },
        )
    }

    fn configured(yaml: &str) -> ConfiguredPolicy {
        ConfiguredPolicy::new(DomainConfig::from_yaml_str(yaml).unwrap())
    }

    #[test]
    fn string_length_sources() {
        let mapper = TypeMapper::new(&GenericPolicy);
        let with_max = resolved(
            BuiltinType::String,
            ConstrainingFacets {
                max_length: Some(10),
                length: Some(3),
                ..Default::default()
            },
        );
        assert_eq!(mapper.map_type(&with_max, "t", "c").sql_type, "VARCHAR(10)");
        assert_eq!(
            mapper
                .map_type(&string_with_pattern("[0-9]{8}"), "t", "c")
                .sql_type,
            "VARCHAR(8)"
        );
        assert_eq!(
            mapper
                .map_type(&string_with_pattern(r"\d{1,15}"), "t", "c")
                .sql_type,
            "VARCHAR(15)"
        );
        let plain = resolved(BuiltinType::Token, ConstrainingFacets::default());
        assert_eq!(mapper.map_type(&plain, "t", "c").sql_type, "VARCHAR(255)");
    }

    #[test]
    fn numeric_families() {
        let mapper = TypeMapper::new(&GenericPolicy);
        let money = resolved(
            BuiltinType::Decimal,
            ConstrainingFacets {
                total_digits: Some(13),
                fraction_digits: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(mapper.map_type(&money, "t", "c").sql_type, "NUMERIC(13,2)");
        let plain = resolved(BuiltinType::Decimal, ConstrainingFacets::default());
        assert_eq!(mapper.map_type(&plain, "t", "c").sql_type, "NUMERIC(15,2)");
        let tiny = resolved(
            BuiltinType::Decimal,
            ConstrainingFacets {
                total_digits: Some(1),
                fraction_digits: Some(4),
                ..Default::default()
            },
        );
        assert_eq!(mapper.map_type(&tiny, "t", "c").sql_type, "NUMERIC(1,1)");
        let counter = resolved(
            BuiltinType::NonNegativeInteger,
            ConstrainingFacets {
                total_digits: Some(9),
                ..Default::default()
            },
        );
        assert_eq!(mapper.map_type(&counter, "t", "c").sql_type, "NUMERIC(9,0)");
        let short = resolved(BuiltinType::Short, ConstrainingFacets::default());
        assert_eq!(mapper.map_type(&short, "t", "c").sql_type, "SMALLINT");
    }

    #[test]
    fn temporal_and_boolean() {
        let mapper = TypeMapper::new(&GenericPolicy);
        let map = |b| mapper.map_type(&resolved(b, ConstrainingFacets::default()), "t", "c");
        assert_eq!(map(BuiltinType::Date).sql_type, "DATE");
        assert_eq!(map(BuiltinType::DateTime).sql_type, "TIMESTAMP");
        assert_eq!(map(BuiltinType::Time).sql_type, "TIME");
        let boolean = map(BuiltinType::Boolean);
        assert_eq!(boolean.sql_type, "VARCHAR(255)");
        assert!(!boolean.is_fallback());
    }

    #[test]
    fn unrecognized_types_fall_back() {
        let mapper = TypeMapper::new(&GenericPolicy);
        let duration = mapper.map_type(
            &resolved(BuiltinType::Duration, ConstrainingFacets::default()),
            "t",
            "c",
        );
        assert_eq!(duration.sql_type, FALLBACK_SQL_TYPE);
        assert!(duration.is_fallback());

        let list = ResolvedSimpleType {
            builtin: None,
            variety: ResolvedVariety::List,
            facets: ConstrainingFacets::default(),
            type_names: vec![],
        };
        assert!(mapper.map_type(&list, "t", "c").is_fallback());
    }

    #[test]
    fn pattern_mapping_overrides_length() {
        let policy = configured(
            r#"
pattern_mappings:
  - pattern: '([0-9]{4})'
    sql_type: CHAR(4)
"#,
        );
        let mapper = TypeMapper::new(&policy);
        let mapped = mapper.map_type(&string_with_pattern("[0-9]{4}"), "t", "c");
        assert_eq!(mapped.sql_type, "CHAR(4)");
        assert_eq!(mapped.source, TypeSource::Pattern);
        // only equal patterns match
        assert_eq!(
            mapper
                .map_type(&string_with_pattern("[0-9]{4}[A-Z]"), "t", "c")
                .sql_type,
            "VARCHAR(255)"
        );
    }

    #[test]
    fn precedence_override_then_custom_then_pattern() {
        let policy = configured(
            r#"
field_overrides:
  t.code: TEXT
custom_types:
  TLocal: CHAR(9)
pattern_mappings:
  - pattern: '\[0-9\]\{4\}'
    sql_type: CHAR(4)
"#,
        );
        let mapper = TypeMapper::new(&policy);
        let value = string_with_pattern("[0-9]{4}");
        assert_eq!(mapper.map_type(&value, "t", "code").source, TypeSource::FieldOverride);
        let custom = mapper.map_type(&value, "t", "other");
        assert_eq!(custom.sql_type, "CHAR(9)");
        assert_eq!(custom.source, TypeSource::CustomType);
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_pattern(r"\[0-9\]\{4\}"), "[0-9]{4}");
        assert_eq!(normalize_pattern("^([0-9]{4})$"), "[0-9]{4}");
        assert_eq!(normalize_pattern("(a)|(b)"), "(a)|(b)");
        assert_eq!(normalize_pattern(r"\d{3}"), r"\d{3}");
    }

    #[test]
    fn flattened_complex_elements() {
        let policy = configured("field_overrides: { Address: VARCHAR(500) }");
        let mapper = TypeMapper::new(&policy);
        assert_eq!(mapper.map_flattened("Order", "Address").sql_type, "VARCHAR(500)");
        assert_eq!(mapper.map_flattened("Order", "Geo").sql_type, "VARCHAR(255)");
    }
}
