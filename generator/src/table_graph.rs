//! The relational result of a walk: tables, their columns, parent edges and choice groups.

use std::collections::HashMap;

use log::debug;
use xsd2sql_xsd::QName;

use crate::{
    naming::{self, same_identifier},
    policy::{DomainPolicy, EssentialField},
};

/// Position class of a column; columns are ordered by rank, ties keep insertion order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortRank {
    PrimaryKey,
    ParentKey,
    /// Index in the domain's essential field list
    Essential(usize),
    /// Declaration order within the table
    Declared(usize),
}

/// Where a column came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    PrimaryKey,
    ParentKey,
    Element,
    Attribute,
    /// Character content of a simple content type or a repeated simple element
    Value,
}

impl ColumnRole {
    pub fn is_key(self) -> bool {
        matches!(self, Self::PrimaryKey | Self::ParentKey)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub role: ColumnRole,
    pub rank: SortRank,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentRef {
    pub table: String,
    /// Foreign key column in the child table
    pub column: String,
}

/// Members of one `choice`; at most one of them is populated per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceGroup {
    pub table: String,
    pub members: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    /// `None` for root tables
    pub parent: Option<ParentRef>,
    pub choice_groups: Vec<ChoiceGroup>,
}

impl TableSpec {
    fn new(name: String, parent: Option<&str>) -> Self {
        let mut columns = vec![ColumnSpec {
            name: naming::ID_COLUMN.to_string(),
            sql_type: "SERIAL".to_string(),
            nullable: false,
            role: ColumnRole::PrimaryKey,
            rank: SortRank::PrimaryKey,
        }];
        let parent = parent.map(|parent| {
            let column = naming::parent_key_column(parent);
            columns.push(ColumnSpec {
                name: column.clone(),
                sql_type: "INTEGER".to_string(),
                nullable: false,
                role: ColumnRole::ParentKey,
                rank: SortRank::ParentKey,
            });
            ParentRef {
                table: parent.to_string(),
                column,
            }
        });
        Self {
            name,
            columns,
            parent,
            choice_groups: Vec::new(),
        }
    }

    /// Looks up a column by SQL identifier.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| same_identifier(&c.name, name))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| same_identifier(&c.name, name))
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Moves essential fields behind the key columns, then sorts by rank. A missing field named
    /// like a key column is added as `<name>_elem`.
    fn apply_essential_fields(&mut self, essentials: &[EssentialField]) {
        for (index, field) in essentials.iter().enumerate() {
            let existing = self
                .columns
                .iter()
                .position(|c| !c.role.is_key() && same_identifier(&c.name, &field.name));
            match (existing, &field.sql_type) {
                (Some(position), sql_type) => {
                    let column = &mut self.columns[position];
                    column.rank = SortRank::Essential(index);
                    if let Some(sql_type) = sql_type {
                        column.sql_type = sql_type.clone();
                    }
                }
                (None, Some(sql_type)) => {
                    let mut name = naming::sql_identifier(&field.name);
                    if self.position(&name).is_some() {
                        name = format!("{name}_elem");
                    }
                    if self.position(&name).is_some() {
                        debug!("{}: essential field {} already present", self.name, name);
                        continue;
                    }
                    self.columns.push(ColumnSpec {
                        name,
                        sql_type: sql_type.clone(),
                        nullable: !field.required,
                        role: ColumnRole::Element,
                        rank: SortRank::Essential(index),
                    });
                }
                (None, None) => {}
            }
        }
        self.columns.sort_by_key(|c| c.rank);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKeyConstraint {
    pub child_table: String,
    pub column: String,
    pub parent_table: String,
}

impl ForeignKeyConstraint {
    pub fn name(&self) -> String {
        naming::foreign_key_name(&self.child_table, &self.column)
    }
}

/// Tables in first-discovery order with one foreign key per parent edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableGraph {
    tables: Vec<TableSpec>,
    foreign_keys: Vec<ForeignKeyConstraint>,
}

impl TableGraph {
    pub fn new(tables: Vec<TableSpec>, foreign_keys: Vec<ForeignKeyConstraint>) -> Self {
        Self {
            tables,
            foreign_keys,
        }
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyConstraint] {
        &self.foreign_keys
    }

    /// Choice groups of all tables, in table order.
    pub fn choice_groups(&self) -> impl Iterator<Item = &ChoiceGroup> {
        self.tables.iter().flat_map(|t| t.choice_groups.iter())
    }
}

/// Identity of a table. Named types share one table wherever they occur; anonymous types get
/// one table per parent table and element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TableKey {
    Named(QName),
    Anonymous { parent: Option<String>, element: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TableId(usize);

pub(crate) enum OpenedTable {
    New { id: TableId, name: String },
    Existing {
        name: String,
        parent: Option<String>,
    },
}

pub(crate) struct NewColumn {
    pub(crate) name: String,
    pub(crate) sql_type: String,
    pub(crate) nullable: bool,
    pub(crate) role: ColumnRole,
}

#[derive(Default)]
pub(crate) struct TableGraphBuilder {
    tables: Vec<TableSpec>,
    keys: HashMap<TableKey, TableId>,
    foreign_keys: Vec<ForeignKeyConstraint>,
}

impl TableGraphBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the table for `key`, creating it with its key columns on first use.
    pub(crate) fn open_table(
        &mut self,
        key: TableKey,
        base_name: &str,
        parent: Option<&str>,
    ) -> OpenedTable {
        if let Some(id) = self.keys.get(&key) {
            let table = &self.tables[id.0];
            return OpenedTable::Existing {
                name: table.name.clone(),
                parent: table.parent.as_ref().map(|p| p.table.clone()),
            };
        }

        let name = naming::disambiguate_table(&naming::sql_identifier(base_name), parent, |n| {
            self.tables.iter().any(|t| same_identifier(&t.name, n))
        });
        let table = TableSpec::new(name.clone(), parent);
        if let Some(parent) = &table.parent {
            self.foreign_keys.push(ForeignKeyConstraint {
                child_table: name.clone(),
                column: parent.column.clone(),
                parent_table: parent.table.clone(),
            });
        }

        let id = TableId(self.tables.len());
        self.tables.push(table);
        self.keys.insert(key, id);
        OpenedTable::New { id, name }
    }

    /// Adds a column, resolving case-insensitive name collisions. Returns the final column
    /// name, or `None` when the column duplicates an existing one and was dropped.
    pub(crate) fn add_column(&mut self, table: TableId, column: NewColumn) -> Option<String> {
        let spec = &mut self.tables[table.0];
        let mut name = column.name;

        if let Some(index) = spec.position(&name) {
            let existing_role = spec.columns[index].role;
            match (column.role, existing_role) {
                (ColumnRole::Attribute, _) => name = format!("{name}_attr"),
                (_, role) if role.is_key() => name = format!("{name}_elem"),
                (_, ColumnRole::Attribute) => {
                    let renamed = format!("{}_attr", spec.columns[index].name);
                    if spec.position(&renamed).is_some() {
                        return None;
                    }
                    spec.columns[index].name = renamed;
                }
                _ => return None,
            }
            if spec.position(&name).is_some() {
                return None;
            }
        }

        let rank = SortRank::Declared(spec.columns.len());
        spec.columns.push(ColumnSpec {
            name: name.clone(),
            sql_type: column.sql_type,
            nullable: column.nullable,
            role: column.role,
            rank,
        });
        Some(name)
    }

    pub(crate) fn add_choice_group(&mut self, table: TableId, members: Vec<String>) {
        let spec = &mut self.tables[table.0];
        let group = ChoiceGroup {
            table: spec.name.clone(),
            members,
        };
        spec.choice_groups.push(group);
    }

    #[cfg(test)]
    pub(crate) fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub(crate) fn finish(mut self, policy: &dyn DomainPolicy) -> TableGraph {
        for table in &mut self.tables {
            table.apply_essential_fields(policy.essential_fields(&table.name));
        }
        TableGraph::new(self.tables, self.foreign_keys)
    }
}
