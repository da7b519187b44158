//! YAML domain configuration.
//!
//! One file per domain, e.g. `config/domains/nfe.yaml`. Every key is optional:
//!
//! ```yaml
//! domain: nfe
//! defaults: { string_size: 255, numeric_precision: 15, numeric_scale: 2 }
//! pattern_mappings:
//!   - { pattern: '[0-9]{14}', sql_type: CHAR(14) }
//! field_overrides: { NCM: VARCHAR(8), emit.CNPJ: CHAR(14) }
//! field_name_rules:
//!   - { contains: cnpj, sql_type: CHAR(14) }
//! custom_types: { TDec_1302: NUMERIC(15,2) }
//! essential_fields:
//!   emit: [{ name: CNPJ, type: CHAR(14) }]
//! table_elements: [det]
//! column_elements: [enderEmit]
//! skip_elements: [Signature]
//! root_type_prefixes: [T]
//! namespace_indicators: [portalfiscal.inf.br/nfe]
//! root_element_indicators: [NFe, TNFe]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::policy::{EssentialField, MappingDefaults, PatternMapping};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("failed to parse config {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("no domain config named `{0}`")]
    UnknownDomain(String),
}

/// `field_name_rules` entry: columns whose name contains `contains` (case-insensitive) get
/// `sql_type`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FieldNameRule {
    pub contains: String,
    pub sql_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Name of the domain; defaults to the file stem when loaded from a directory.
    pub domain: String,
    pub defaults: MappingDefaults,
    pub pattern_mappings: Vec<PatternMapping>,
    pub field_overrides: HashMap<String, String>,
    pub field_name_rules: Vec<FieldNameRule>,
    pub custom_types: HashMap<String, String>,
    pub essential_fields: HashMap<String, Vec<EssentialField>>,
    pub table_elements: Vec<String>,
    pub column_elements: Vec<String>,
    pub skip_elements: Vec<String>,
    pub root_type_prefixes: Vec<String>,
    pub namespace_indicators: Vec<String>,
    pub root_element_indicators: Vec<String>,
}

impl DomainConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(ConfigError::Parse)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Self = serde_yaml::from_str(&contents).map_err(|source| {
            ConfigError::ParseFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        if config.domain.is_empty() {
            config.domain = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(config)
    }
}

/// Loads every `*.yaml` file of `dir` whose name does not start with `_`, sorted by file name.
///
/// A file that fails to parse is skipped with a warning; only an unreadable directory is an
/// error.
pub fn load_config_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<DomainConfig>, ConfigError> {
    let dir = dir.as_ref();
    let read_error = |source| ConfigError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let is_yaml = path.extension().is_some_and(|ext| ext == "yaml");
        let is_hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('_'));
        if is_yaml && !is_hidden && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut configs = Vec::with_capacity(paths.len());
    for path in paths {
        match DomainConfig::from_yaml_file(&path) {
            Ok(config) => {
                debug!("loaded domain config `{}` from {}", config.domain, path.display());
                configs.push(config);
            }
            Err(e) => warn!("skipping domain config: {e}"),
        }
    }
    Ok(configs)
}
