use std::fmt;

use log::{info, warn};

/// A recoverable event of one conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A type was reached again while it was still being expanded; the occurrence got only its
    /// key columns.
    Cycle { type_name: String, table: String },
    /// No mapping rule matched; the column uses the fallback type.
    UnmappedType {
        table: String,
        column: String,
        type_name: String,
    },
    /// A foreign key pointed at a table that is not emitted.
    DanglingForeignKeySkipped {
        child_table: String,
        column: String,
        parent_table: String,
    },
    /// A named type's table was reached from a second parent and was reused.
    SharedTable { table: String, parent: String },
    /// An element column with the same name already existed and was dropped.
    DuplicateColumn { table: String, column: String },
}

impl Diagnostic {
    /// Informational diagnostics describe expected outcomes rather than lossy ones.
    pub fn is_warning(&self) -> bool {
        !matches!(
            self,
            Self::DanglingForeignKeySkipped { .. } | Self::SharedTable { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { type_name, table } => write!(
                f,
                "type {type_name} is already being expanded; truncated recursion at table {table}"
            ),
            Self::UnmappedType {
                table,
                column,
                type_name,
            } => write!(
                f,
                "no mapping for type {type_name} of {table}.{column}; using fallback"
            ),
            Self::DanglingForeignKeySkipped {
                child_table,
                column,
                parent_table,
            } => write!(
                f,
                "skipped foreign key {child_table}.{column} -> {parent_table}: table not emitted"
            ),
            Self::SharedTable { table, parent } => {
                write!(f, "table {table} is shared with parent {parent}")
            }
            Self::DuplicateColumn { table, column } => {
                write!(f, "duplicate column {table}.{column} dropped")
            }
        }
    }
}

/// Diagnostics in the order they were raised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Records and logs a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_warning() {
            warn!("{diagnostic}");
        } else {
            info!("{diagnostic}");
        }
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, predicate: impl Fn(&Diagnostic) -> bool) -> usize {
        self.entries.iter().filter(|d| predicate(d)).count()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
