//! Reads XSD files from disk into one [`SchemaComponentTable`], following `include` and
//! `import` directives.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;
use xsd2sql_xsd::{read_schema, Schema, SchemaComponentTable, XsdError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not well-formed XML: {source}")]
    Xml {
        path: PathBuf,
        source: roxmltree::Error,
    },

    #[error("{path}: {source}")]
    Schema { path: PathBuf, source: XsdError },
}

#[derive(Copy, Clone, Debug)]
pub struct LoadOptions {
    /// Accept documents with a DTD.
    pub allow_dtd: bool,
    /// Load the files named by `schemaLocation` of `include` and `import`.
    pub follow_includes: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            allow_dtd: false,
            follow_includes: true,
        }
    }
}

/// Registers every file it loads in one table; each file is read at most once.
pub struct SchemaLoader {
    options: LoadOptions,
    table: SchemaComponentTable,
    visited: HashSet<PathBuf>,
}

impl SchemaLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            table: SchemaComponentTable::default(),
            visited: HashSet::new(),
        }
    }

    /// Loads `path` and everything it includes. Returns `None` if the file was already loaded.
    pub fn load(&mut self, path: &Path) -> Result<Option<Schema>, LoadError> {
        let read_error = |source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        };
        let canonical = fs::canonicalize(path).map_err(read_error)?;
        if !self.visited.insert(canonical.clone()) {
            debug!("{} already loaded", path.display());
            return Ok(None);
        }

        let text = fs::read_to_string(&canonical).map_err(read_error)?;
        let options = roxmltree::ParsingOptions {
            allow_dtd: self.options.allow_dtd,
            ..roxmltree::ParsingOptions::default()
        };
        let document = roxmltree::Document::parse_with_options(&text, options).map_err(|source| {
            LoadError::Xml {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let schema_error = |source| LoadError::Schema {
            path: path.to_path_buf(),
            source,
        };
        let schema = read_schema(&document).map_err(schema_error)?;
        self.table.register(&schema).map_err(schema_error)?;
        info!(
            "loaded {} ({} types, {} elements)",
            path.display(),
            schema.type_definitions.len(),
            schema.element_declarations.len()
        );

        if self.options.follow_includes {
            let base_dir = canonical.parent().unwrap_or_else(|| Path::new("."));
            for import in &schema.imports {
                let Some(location) = &import.schema_location else {
                    debug!("{:?} of {} has no schemaLocation", import.kind, path.display());
                    continue;
                };
                if location.contains("://") {
                    warn!("not fetching remote schema {location} referenced from {}", path.display());
                    continue;
                }
                let target = base_dir.join(location);
                if !target.is_file() {
                    warn!("schema {location} referenced from {} not found", path.display());
                    continue;
                }
                self.load(&target)?;
            }
        }

        Ok(Some(schema))
    }

    pub fn into_table(self) -> SchemaComponentTable {
        self.table
    }
}

/// The main schema and the table of everything loaded with it.
pub struct LoadedSchemas {
    pub main: Schema,
    pub table: SchemaComponentTable,
}

/// Loads the main file, then the type files. A type file that is also reached through an
/// include of the main file is read once.
pub fn load_schemas(
    main: &Path,
    type_files: &[PathBuf],
    options: LoadOptions,
) -> Result<LoadedSchemas, LoadError> {
    let mut loader = SchemaLoader::new(options);
    // A fresh loader has not seen any file yet.
    let main = loader.load(main)?.unwrap_or_default();
    for path in type_files {
        loader.load(path)?;
    }
    Ok(LoadedSchemas {
        main,
        table: loader.into_table(),
    })
}
