//! Picks the domain configuration that fits a schema.

use log::{debug, info};
use xsd2sql_xsd::Schema;

use crate::config::DomainConfig;

/// The first config whose `namespace_indicators` occur in the target namespace of `main`, or
/// whose `root_element_indicators` name a global element or a complex type of `main`.
pub fn detect_domain<'c>(main: &Schema, configs: &'c [DomainConfig]) -> Option<&'c DomainConfig> {
    let detected = configs
        .iter()
        .find(|config| matches_namespace(main, config) || matches_root_element(main, config));
    match detected {
        Some(config) => info!("detected domain `{}`", config.domain),
        None => debug!("no domain config matches the schema"),
    }
    detected
}

fn matches_namespace(main: &Schema, config: &DomainConfig) -> bool {
    let Some(namespace) = &main.target_namespace else {
        return false;
    };
    config
        .namespace_indicators
        .iter()
        .any(|indicator| namespace.contains(indicator.as_str()))
}

fn matches_root_element(main: &Schema, config: &DomainConfig) -> bool {
    config.root_element_indicators.iter().any(|indicator| {
        main.element_declaration(indicator).is_some()
            || main
                .complex_type_definitions()
                .filter_map(|c| c.name.as_ref())
                .any(|name| name.local_name == *indicator)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use xsd2sql_xsd::read_schema;

    fn configs() -> Vec<DomainConfig> {
        vec![
            DomainConfig::from_yaml_str("domain: generic").unwrap(),
            DomainConfig::from_yaml_str(
                r#"
domain: nfe
namespace_indicators: [portalfiscal.inf.br/nfe]
root_element_indicators: [TNFe, NFe]
"#,
            )
            .unwrap(),
        ]
    }

    fn schema(xsd: &str) -> Schema {
        read_schema(&roxmltree::Document::parse(xsd).unwrap()).unwrap()
    }

    #[test]
    fn detects_by_namespace() {
        let main = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                targetNamespace="http://www.portalfiscal.inf.br/nfe"/>"#,
        );
        let configs = configs();
        assert_eq!(detect_domain(&main, &configs).map(|c| c.domain.as_str()), Some("nfe"));
    }

    #[test]
    fn detects_by_root_type() {
        let main = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="TNFe"/>
            </xs:schema>"#,
        );
        let configs = configs();
        assert_eq!(detect_domain(&main, &configs).map(|c| c.domain.as_str()), Some("nfe"));
    }

    #[test]
    fn nothing_matches() {
        let main = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:shop">
                <xs:element name="order" type="xs:string"/>
            </xs:schema>"#,
        );
        assert!(detect_domain(&main, &configs()).is_none());
    }
}
