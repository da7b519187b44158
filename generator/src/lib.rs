//! Converts XSD schemas into relational SQL DDL.
//!
//! Every complex element of the schema becomes a table with a synthetic `id` key and a foreign
//! key to its parent table; simple elements and attributes become columns. A [`DomainPolicy`]
//! adjusts the decisions and column types per domain.

pub mod config;
pub mod ddl;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod mapping;
pub mod naming;
pub mod policy;
pub mod table_graph;
pub mod walker;

use log::info;
use xsd2sql_xsd::{read_schema, Schema, SchemaComponentTable};

pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::ConvertError;
pub use policy::{ConfiguredPolicy, Decision, DomainPolicy, GenericPolicy};
pub use table_graph::TableGraph;

/// Result of one conversion.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub ddl: String,
    pub graph: TableGraph,
    pub diagnostics: Diagnostics,
}

/// Converts the roots of `main`. Every schema `main` refers to must already be registered in
/// `table`, together with `main` itself.
pub fn convert(
    table: &SchemaComponentTable,
    main: &Schema,
    policy: &dyn DomainPolicy,
) -> Result<Conversion, ConvertError> {
    let roots = walker::select_roots(table, main, policy)?;
    info!("{} root(s) for domain `{}`", roots.len(), policy.domain_name());

    let mut walker = walker::Walker::new(table, policy);
    for root in &roots {
        walker.walk_root(root)?;
    }
    let (graph, mut diagnostics) = walker.finish();
    let ddl = ddl::emit(&graph, policy.domain_name(), &mut diagnostics);

    Ok(Conversion {
        ddl,
        graph,
        diagnostics,
    })
}

/// Parses and registers the documents, then converts `main`.
pub fn convert_documents(
    main: &roxmltree::Document,
    type_documents: &[roxmltree::Document],
    policy: &dyn DomainPolicy,
) -> Result<Conversion, ConvertError> {
    let mut table = SchemaComponentTable::default();
    for document in type_documents {
        table.register(&read_schema(document)?)?;
    }
    let main = read_schema(main)?;
    table.register(&main)?;
    convert(&table, &main, policy)
}
