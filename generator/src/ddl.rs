//! Renders a [`TableGraph`] as SQL DDL.

use std::collections::HashSet;
use std::fmt::Write;

use crate::{
    diagnostics::{Diagnostic, Diagnostics},
    table_graph::{ColumnRole, ColumnSpec, ForeignKeyConstraint, TableGraph, TableSpec},
};

/// Writes `CREATE TABLE` statements in discovery order, then the foreign keys whose parent
/// table is emitted, then the choice group comments.
///
/// Foreign keys to missing tables are left out and recorded as
/// [`Diagnostic::DanglingForeignKeySkipped`].
pub fn emit(graph: &TableGraph, domain: &str, diagnostics: &mut Diagnostics) -> String {
    let mut ddl = String::new();
    let _ = writeln!(ddl, "-- SQL DDL from XSD Schema (Domain: {domain})");
    let _ = writeln!(ddl, "-- Generated with generalized XSD to SQL converter");
    ddl.push('\n');

    for table in graph.tables() {
        write_table(&mut ddl, table);
    }

    let (valid, dangling) = validate_foreign_keys(graph);
    ddl.push_str("\n-- Foreign Key Constraints (Validated)\n");
    for constraint in &valid {
        let _ = writeln!(
            ddl,
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}(id);",
            constraint.child_table,
            constraint.name(),
            constraint.column,
            constraint.parent_table
        );
    }
    if valid.is_empty() {
        ddl.push_str("-- No valid foreign key constraints generated\n");
    } else {
        let _ = writeln!(ddl, "-- Generated {} valid foreign key constraints", valid.len());
    }
    if !dangling.is_empty() {
        let _ = writeln!(
            ddl,
            "-- Skipped {} foreign key constraints referencing missing tables",
            dangling.len()
        );
    }
    for constraint in dangling {
        diagnostics.push(Diagnostic::DanglingForeignKeySkipped {
            child_table: constraint.child_table.clone(),
            column: constraint.column.clone(),
            parent_table: constraint.parent_table.clone(),
        });
    }

    let mut groups = graph.choice_groups().peekable();
    if groups.peek().is_some() {
        ddl.push_str("\n-- Choice Groups (mutually exclusive elements)\n");
        for group in groups {
            let members = group
                .members
                .iter()
                .map(|m| format!("'{m}'"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                ddl,
                "-- Table {}: Only one of [{members}] should be populated",
                group.table
            );
        }
    }

    ddl
}

fn write_table(ddl: &mut String, table: &TableSpec) {
    let columns = table
        .columns
        .iter()
        .map(column_definition)
        .collect::<Vec<_>>()
        .join(",\n");
    let _ = write!(ddl, "CREATE TABLE {} (\n{columns}\n);\n\n", table.name);
}

fn column_definition(column: &ColumnSpec) -> String {
    match column.role {
        ColumnRole::PrimaryKey => format!("    {} {} PRIMARY KEY", column.name, column.sql_type),
        _ if column.nullable => format!("    {} {}", column.name, column.sql_type),
        _ => format!("    {} {} NOT NULL", column.name, column.sql_type),
    }
}

/// Splits the foreign keys into those whose parent precedes the child and the rest.
fn validate_foreign_keys(
    graph: &TableGraph,
) -> (Vec<&ForeignKeyConstraint>, Vec<&ForeignKeyConstraint>) {
    let mut emitted = HashSet::new();
    let mut valid = Vec::new();
    let mut dangling = Vec::new();
    let mut constraints = graph.foreign_keys().iter().peekable();

    for table in graph.tables() {
        emitted.insert(table.name.as_str());
        while let Some(constraint) = constraints.next_if(|c| c.child_table == table.name) {
            if emitted.contains(constraint.parent_table.as_str()) {
                valid.push(constraint);
            } else {
                dangling.push(constraint);
            }
        }
    }
    dangling.extend(constraints);
    (valid, dangling)
}
