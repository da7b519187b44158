//! Depth-first walk over the element graph of the root types, deciding for every element whether
//! it becomes a table or a column.

use std::collections::HashSet;

use log::debug;
use xsd2sql_xsd::{
    builtins::XS_ANY_TYPE_NAME, AttributeType, AttributeUse, BuiltinType, ComplexTypeDefinition,
    Compositor, ElementDeclaration, ElementType, ModelGroup, Particle, QName,
    ResolvedSimpleType, Schema, SchemaComponentTable, SimpleTypeDefinition, Term, TypeDefinition,
};

use crate::{
    diagnostics::{Diagnostic, Diagnostics},
    error::ConvertError,
    mapping::{MappedType, TypeMapper},
    naming,
    policy::{Decision, DomainPolicy, ElementContext},
    table_graph::{ColumnRole, NewColumn, OpenedTable, TableGraph, TableGraphBuilder, TableId, TableKey},
};

/// Where a walk starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Root {
    /// A global element with a complex type
    Element(QName),
    /// A named complex type
    Type(QName),
}

/// How often an element occurs, accumulated over the enclosing compositors.
#[derive(Copy, Clone, Debug, Default)]
struct Occurrence {
    optional: bool,
    repeated: bool,
    in_choice: bool,
}

impl Occurrence {
    fn within(self, particle: &Particle) -> Self {
        Self {
            optional: self.optional || particle.is_optional(),
            repeated: self.repeated || particle.is_repeated(),
            in_choice: self.in_choice,
        }
    }

    fn nullable(self) -> bool {
        self.optional || self.in_choice
    }
}

/// The table receiving columns.
struct Frame {
    id: TableId,
    name: String,
}

pub struct Walker<'a> {
    table: &'a SchemaComponentTable,
    policy: &'a dyn DomainPolicy,
    mapper: TypeMapper<'a>,
    builder: TableGraphBuilder,
    diagnostics: Diagnostics,
    /// Named types on the current path
    active_types: HashSet<QName>,
    active_groups: HashSet<QName>,
    /// Global elements on the current path, entered as a root or through `ref`
    active_elements: HashSet<QName>,
    /// Members of the choices being collected, innermost last
    choices: Vec<Vec<String>>,
}

impl<'a> Walker<'a> {
    pub fn new(table: &'a SchemaComponentTable, policy: &'a dyn DomainPolicy) -> Self {
        Self {
            table,
            policy,
            mapper: TypeMapper::new(policy),
            builder: TableGraphBuilder::new(),
            diagnostics: Diagnostics::default(),
            active_types: HashSet::new(),
            active_groups: HashSet::new(),
            active_elements: HashSet::new(),
            choices: Vec::new(),
        }
    }

    /// Adds the tables reachable from `root`. Tables that already exist are reused.
    pub fn walk_root(&mut self, root: &Root) -> Result<(), ConvertError> {
        let table = self.table;
        match root {
            Root::Element(name) => {
                let element = table
                    .resolve_element(name)
                    .map_err(|e| ConvertError::referenced_from(e, "root"))?;
                let element = table.get(element);
                let (definition, type_name) = self.element_type(element, &element.name)?;
                let TypeDefinition::Complex(complex) = definition else {
                    debug!("root element {name} has a simple type; no table");
                    return Ok(());
                };
                let context = ElementContext {
                    name: &element.name,
                    type_name,
                    is_complex: true,
                    is_repeated: false,
                };
                if self.policy.skip_element(&context, None) {
                    debug!("root element {name} skipped by policy");
                    return Ok(());
                }
                let (key, base_name) = Self::table_key(element, type_name, None);
                self.active_elements.insert(name.clone());
                let result = self.expand_table(key, base_name, None, complex, type_name);
                self.active_elements.remove(name);
                result?;
            }
            Root::Type(name) => {
                let definition = table
                    .type_definition(name)
                    .map_err(|e| ConvertError::referenced_from(e, "root"))?;
                let TypeDefinition::Complex(complex) = definition else {
                    debug!("root type {name} is simple; no table");
                    return Ok(());
                };
                let key = TableKey::Named(name.clone());
                self.expand_table(key, &name.local_name, None, complex, Some(name))?;
            }
        }
        Ok(())
    }

    /// Orders columns and returns the finished graph with everything recorded along the way.
    pub fn finish(self) -> (TableGraph, Diagnostics) {
        let graph = self.builder.finish(self.policy);
        (graph, self.diagnostics)
    }

    fn table_key<'e>(
        element: &'e ElementDeclaration,
        type_name: Option<&'e QName>,
        parent: Option<&str>,
    ) -> (TableKey, &'e str) {
        match type_name {
            Some(type_name) => (TableKey::Named(type_name.clone()), &type_name.local_name),
            None => (
                TableKey::Anonymous {
                    parent: parent.map(String::from),
                    element: element.name.clone(),
                },
                &element.name,
            ),
        }
    }

    /// Opens the table for `key` and fills it on first use. Returns the table name.
    fn expand_table(
        &mut self,
        key: TableKey,
        base_name: &str,
        parent: Option<&str>,
        complex: &'a ComplexTypeDefinition,
        type_name: Option<&QName>,
    ) -> Result<String, ConvertError> {
        match self.builder.open_table(key, base_name, parent) {
            OpenedTable::Existing {
                name,
                parent: first_parent,
            } => {
                if let Some(parent) = parent {
                    if first_parent.as_deref() != Some(parent) {
                        self.diagnostics.push(Diagnostic::SharedTable {
                            table: name.clone(),
                            parent: parent.to_string(),
                        });
                    }
                }
                Ok(name)
            }
            OpenedTable::New { id, name } => {
                debug!("table {name}");
                let frame = Frame {
                    id,
                    name: name.clone(),
                };
                if let Some(type_name) = type_name {
                    self.active_types.insert(type_name.clone());
                }
                let result = self.walk_complex_content(&frame, complex);
                if let Some(type_name) = type_name {
                    self.active_types.remove(type_name);
                }
                result.map(|()| name)
            }
        }
    }

    fn walk_complex_content(
        &mut self,
        frame: &Frame,
        complex: &'a ComplexTypeDefinition,
    ) -> Result<(), ConvertError> {
        let table = self.table;
        if complex.has_simple_content(table) {
            let resolved = complex
                .resolve_simple_content(table)
                .map_err(|e| ConvertError::referenced_from(e, &frame.name))?;
            let mapped = self.mapper.map_type(&resolved, &frame.name, naming::VALUE_COLUMN);
            self.add_mapped_column(
                frame,
                naming::VALUE_COLUMN.to_string(),
                mapped,
                Some(&resolved),
                false,
                ColumnRole::Value,
            );
        } else {
            self.walk_elements(frame, complex, &mut HashSet::new())?;
        }
        self.walk_attributes(frame, complex)
    }

    /// Element content, with extension bases expanded in place before the type's own particles.
    fn walk_elements(
        &mut self,
        frame: &Frame,
        complex: &'a ComplexTypeDefinition,
        bases: &mut HashSet<QName>,
    ) -> Result<(), ConvertError> {
        let table = self.table;
        if let Some(base) = complex.extension_base() {
            let definition = table
                .type_definition(base)
                .map_err(|e| ConvertError::referenced_from(e, &frame.name))?;
            if !bases.insert(base.clone()) {
                self.diagnostics.push(Diagnostic::Cycle {
                    type_name: base.to_string(),
                    table: frame.name.clone(),
                });
            } else if let TypeDefinition::Complex(base) = definition {
                self.walk_elements(frame, base, bases)?;
            }
        }
        if let Some(particle) = complex.particle() {
            self.walk_particle(frame, particle, Occurrence::default())?;
        }
        Ok(())
    }

    fn walk_particle(
        &mut self,
        frame: &Frame,
        particle: &'a Particle,
        occurrence: Occurrence,
    ) -> Result<(), ConvertError> {
        let table = self.table;
        let occurrence = occurrence.within(particle);
        match &particle.term {
            Term::Element(element) => self.walk_element(frame, element, occurrence),
            Term::ElementRef(name) => {
                let element = table
                    .resolve_element(name)
                    .map_err(|e| ConvertError::referenced_from(e, &frame.name))?;
                if !self.active_elements.insert(name.clone()) {
                    self.diagnostics.push(Diagnostic::Cycle {
                        type_name: name.to_string(),
                        table: frame.name.clone(),
                    });
                    return Ok(());
                }
                let result = self.walk_element(frame, table.get(element), occurrence);
                self.active_elements.remove(name);
                result
            }
            Term::ModelGroup(group) => self.walk_model_group(frame, group, occurrence),
            Term::GroupRef(name) => {
                let group = table
                    .resolve_group(name)
                    .map_err(|e| ConvertError::referenced_from(e, &frame.name))?;
                if !self.active_groups.insert(name.clone()) {
                    self.diagnostics.push(Diagnostic::Cycle {
                        type_name: name.to_string(),
                        table: frame.name.clone(),
                    });
                    return Ok(());
                }
                let result =
                    self.walk_model_group(frame, &table.get(group).model_group, occurrence);
                self.active_groups.remove(name);
                result
            }
            Term::Wildcard => {
                debug!("{}: skipping wildcard", frame.name);
                Ok(())
            }
        }
    }

    fn walk_model_group(
        &mut self,
        frame: &Frame,
        group: &'a ModelGroup,
        occurrence: Occurrence,
    ) -> Result<(), ConvertError> {
        // Compositors nested in a choice add to the enclosing group.
        if group.compositor != Compositor::Choice || occurrence.in_choice {
            for particle in &group.particles {
                self.walk_particle(frame, particle, occurrence)?;
            }
            return Ok(());
        }

        self.choices.push(Vec::new());
        let members_occurrence = Occurrence {
            in_choice: true,
            ..occurrence
        };
        for particle in &group.particles {
            self.walk_particle(frame, particle, members_occurrence)?;
        }
        let members = self.choices.pop().unwrap_or_default();
        if !members.is_empty() {
            debug!("{}: choice group {members:?}", frame.name);
            self.builder.add_choice_group(frame.id, members);
        }
        Ok(())
    }

    fn walk_element(
        &mut self,
        frame: &Frame,
        element: &'a ElementDeclaration,
        occurrence: Occurrence,
    ) -> Result<(), ConvertError> {
        let table = self.table;
        let location = format!("{}.{}", frame.name, element.name);
        let (definition, type_name) = self.element_type(element, &location)?;
        let context = ElementContext {
            name: &element.name,
            type_name,
            is_complex: definition.is_complex(),
            is_repeated: occurrence.repeated,
        };
        if self.policy.skip_element(&context, Some(&frame.name)) {
            debug!("{location}: skipped by policy");
            return Ok(());
        }

        let column = naming::sql_identifier(&element.name);
        let decision = self.policy.should_create_table(&context, Some(&frame.name));
        let as_table = occurrence.repeated
            || match decision {
                Decision::Table => true,
                Decision::Column => false,
                Decision::UseDefault => {
                    definition.is_complex()
                        && self.policy.field_override(&frame.name, &column).is_none()
                }
            };
        debug!("{location}: {decision:?} -> {}", if as_table { "table" } else { "column" });

        if as_table {
            return match definition {
                TypeDefinition::Complex(complex) => {
                    self.walk_child_table(frame, element, complex, type_name, occurrence)
                }
                TypeDefinition::Simple(simple) => {
                    self.walk_value_table(frame, element, simple, occurrence)
                }
            };
        }

        let nullable = occurrence.nullable() || element.nillable;
        let added = match definition {
            TypeDefinition::Complex(_) => {
                let mapped = self.mapper.map_flattened(&frame.name, &column);
                self.add_mapped_column(frame, column, mapped, None, nullable, ColumnRole::Element)
            }
            TypeDefinition::Simple(simple) => {
                let resolved = table
                    .resolve_simple(simple)
                    .map_err(|e| ConvertError::referenced_from(e, &location))?;
                let mapped = self.mapper.map_type(&resolved, &frame.name, &column);
                self.add_mapped_column(
                    frame,
                    column,
                    mapped,
                    Some(&resolved),
                    nullable,
                    ColumnRole::Element,
                )
            }
        };
        if let Some(name) = added {
            self.note_choice_member(occurrence, name);
        }
        Ok(())
    }

    fn walk_child_table(
        &mut self,
        frame: &Frame,
        element: &'a ElementDeclaration,
        complex: &'a ComplexTypeDefinition,
        type_name: Option<&'a QName>,
        occurrence: Occurrence,
    ) -> Result<(), ConvertError> {
        if let Some(type_name) = type_name.filter(|name| self.active_types.contains(*name)) {
            self.diagnostics.push(Diagnostic::Cycle {
                type_name: type_name.to_string(),
                table: frame.name.clone(),
            });
            return Ok(());
        }

        let (key, base_name) = Self::table_key(element, type_name, Some(&frame.name));
        self.expand_table(key, base_name, Some(&frame.name), complex, type_name)?;
        self.note_choice_member(occurrence, naming::sql_identifier(&element.name));
        Ok(())
    }

    /// A repeated simple element: a child table holding one value per row.
    fn walk_value_table(
        &mut self,
        frame: &Frame,
        element: &'a ElementDeclaration,
        simple: &'a SimpleTypeDefinition,
        occurrence: Occurrence,
    ) -> Result<(), ConvertError> {
        let key = TableKey::Anonymous {
            parent: Some(frame.name.clone()),
            element: element.name.clone(),
        };
        if let OpenedTable::New { id, name } =
            self.builder.open_table(key, &element.name, Some(&frame.name))
        {
            let child = Frame { id, name };
            let resolved = self
                .table
                .resolve_simple(simple)
                .map_err(|e| ConvertError::referenced_from(e, &child.name))?;
            let mapped = self.mapper.map_type(&resolved, &child.name, naming::VALUE_COLUMN);
            self.add_mapped_column(
                &child,
                naming::VALUE_COLUMN.to_string(),
                mapped,
                Some(&resolved),
                false,
                ColumnRole::Value,
            );
        }
        self.note_choice_member(occurrence, naming::sql_identifier(&element.name));
        Ok(())
    }

    fn walk_attributes(
        &mut self,
        frame: &Frame,
        complex: &'a ComplexTypeDefinition,
    ) -> Result<(), ConvertError> {
        let table = self.table;
        for attribute in self.effective_attributes(frame, complex)? {
            let location = format!("{}@{}", frame.name, attribute.name);
            let resolved = match &attribute.type_ {
                AttributeType::Named(name) => {
                    match table
                        .type_definition(name)
                        .map_err(|e| ConvertError::referenced_from(e, &location))?
                    {
                        TypeDefinition::Simple(simple) => table.resolve_simple(simple),
                        TypeDefinition::Complex(_) => {
                            debug!("{location}: attribute of complex type {name}");
                            Self::any_simple_type(table)
                        }
                    }
                }
                AttributeType::Anonymous(simple) => table.resolve_simple(simple),
                AttributeType::Default => Self::any_simple_type(table),
            }
            .map_err(|e| ConvertError::referenced_from(e, &location))?;

            let column = naming::sql_identifier(&attribute.name);
            let mapped = self.mapper.map_type(&resolved, &frame.name, &column);
            self.add_mapped_column(
                frame,
                column,
                mapped,
                Some(&resolved),
                !attribute.required,
                ColumnRole::Attribute,
            );
        }
        Ok(())
    }

    /// Attribute uses of `complex` and its bases, base first. A derived declaration replaces the
    /// inherited one of the same name; a prohibited one removes it.
    fn effective_attributes(
        &self,
        frame: &Frame,
        complex: &'a ComplexTypeDefinition,
    ) -> Result<Vec<&'a AttributeUse>, ConvertError> {
        let table = self.table;
        let mut chain = vec![complex];
        let mut seen = HashSet::new();
        let mut current = complex;
        while let Some(derivation) = &current.derivation {
            let base = table
                .resolve_type(&derivation.base)
                .map_err(|e| ConvertError::referenced_from(e, &frame.name))?;
            if !seen.insert(base) {
                break;
            }
            match table.get(base) {
                TypeDefinition::Complex(base) => {
                    chain.push(base);
                    current = base;
                }
                TypeDefinition::Simple(_) => break,
            }
        }

        let mut attributes: Vec<&'a AttributeUse> = Vec::new();
        for definition in chain.into_iter().rev() {
            for attribute in &definition.attribute_uses {
                let inherited = attributes.iter().position(|a| a.name == attribute.name);
                match (inherited, attribute.prohibited) {
                    (Some(index), true) => {
                        attributes.remove(index);
                    }
                    (Some(index), false) => attributes[index] = attribute,
                    (None, true) => {}
                    (None, false) => attributes.push(attribute),
                }
            }
        }
        Ok(attributes)
    }

    fn element_type(
        &self,
        element: &'a ElementDeclaration,
        location: &str,
    ) -> Result<(&'a TypeDefinition, Option<&'a QName>), ConvertError> {
        let table = self.table;
        match &element.type_ {
            ElementType::Named(name) => {
                let definition = table
                    .type_definition(name)
                    .map_err(|e| ConvertError::referenced_from(e, location))?;
                Ok((definition, Some(name)))
            }
            ElementType::Anonymous(definition) => Ok((definition.as_ref(), None)),
            ElementType::Default => {
                let name: &'static QName = &XS_ANY_TYPE_NAME;
                let definition = table
                    .type_definition(name)
                    .map_err(|e| ConvertError::referenced_from(e, location))?;
                Ok((definition, Some(name)))
            }
        }
    }

    fn any_simple_type(
        table: &SchemaComponentTable,
    ) -> Result<ResolvedSimpleType, xsd2sql_xsd::XsdError> {
        table.resolve_simple(&SimpleTypeDefinition::builtin(BuiltinType::AnySimpleType))
    }

    fn add_mapped_column(
        &mut self,
        frame: &Frame,
        column: String,
        mapped: MappedType,
        resolved: Option<&ResolvedSimpleType>,
        nullable: bool,
        role: ColumnRole,
    ) -> Option<String> {
        if mapped.is_fallback() {
            let type_name = resolved
                .and_then(|r| r.type_names.first())
                .map_or_else(|| "anonymous type".to_string(), QName::to_string);
            self.diagnostics.push(Diagnostic::UnmappedType {
                table: frame.name.clone(),
                column: column.clone(),
                type_name,
            });
        }

        let added = self.builder.add_column(
            frame.id,
            NewColumn {
                name: column.clone(),
                sql_type: mapped.sql_type,
                nullable,
                role,
            },
        );
        if added.is_none() {
            self.diagnostics.push(Diagnostic::DuplicateColumn {
                table: frame.name.clone(),
                column,
            });
        }
        added
    }

    fn note_choice_member(&mut self, occurrence: Occurrence, name: String) {
        if occurrence.in_choice {
            if let Some(members) = self.choices.last_mut() {
                members.push(name);
            }
        }
    }
}

/// Walks a single root into a fresh table graph.
pub fn walk(
    table: &SchemaComponentTable,
    root: &Root,
    policy: &dyn DomainPolicy,
) -> Result<(TableGraph, Diagnostics), ConvertError> {
    let mut walker = Walker::new(table, policy);
    walker.walk_root(root)?;
    Ok(walker.finish())
}

/// Picks the roots of `main`: its global elements with a complex type, in document order.
///
/// Without such elements, the named complex types of `main` are used instead: those starting
/// with one of the policy's root type prefixes or, without prefixes, those that no other complex
/// type of `main` refers to (all of them when each one is referenced).
pub fn select_roots(
    table: &SchemaComponentTable,
    main: &Schema,
    policy: &dyn DomainPolicy,
) -> Result<Vec<Root>, ConvertError> {
    let mut roots = Vec::new();
    for element in &main.element_declarations {
        let is_complex = match &element.type_ {
            ElementType::Named(name) => table
                .type_definition(name)
                .map_err(|e| ConvertError::referenced_from(e, &element.name))?
                .is_complex(),
            ElementType::Anonymous(definition) => definition.is_complex(),
            ElementType::Default => false,
        };
        if is_complex {
            roots.push(Root::Element(element.qualified_name()));
        }
    }
    if !roots.is_empty() {
        return Ok(roots);
    }

    let named: Vec<&QName> = main
        .complex_type_definitions()
        .filter_map(|c| c.name.as_ref())
        .collect();
    let prefixes = policy.root_type_prefixes();
    let selected: Vec<&QName> = if !prefixes.is_empty() {
        named
            .into_iter()
            .filter(|name| prefixes.iter().any(|p| name.local_name.starts_with(p.as_str())))
            .collect()
    } else {
        let referenced = referenced_types(main);
        let unreferenced: Vec<&QName> = named
            .iter()
            .copied()
            .filter(|name| !referenced.contains(name))
            .collect();
        if unreferenced.is_empty() {
            named
        } else {
            unreferenced
        }
    };
    Ok(selected.into_iter().cloned().map(Root::Type).collect())
}

/// Names of the complex types of `main` that another complex type or a model group of `main`
/// refers to, as element type or as derivation base.
fn referenced_types(main: &Schema) -> HashSet<&QName> {
    fn from_particle<'s>(particle: &'s Particle, out: &mut HashSet<&'s QName>) {
        match &particle.term {
            Term::Element(element) => match &element.type_ {
                ElementType::Named(name) => {
                    out.insert(name);
                }
                ElementType::Anonymous(definition) => {
                    if let Some(complex) = definition.complex() {
                        from_complex(complex, out);
                    }
                }
                ElementType::Default => {}
            },
            Term::ModelGroup(group) => {
                for particle in &group.particles {
                    from_particle(particle, out);
                }
            }
            Term::ElementRef(_) | Term::GroupRef(_) | Term::Wildcard => {}
        }
    }

    fn from_complex<'s>(complex: &'s ComplexTypeDefinition, out: &mut HashSet<&'s QName>) {
        if let Some(derivation) = &complex.derivation {
            out.insert(&derivation.base);
        }
        if let Some(particle) = complex.particle() {
            from_particle(particle, out);
        }
    }

    let mut referenced = HashSet::new();
    for complex in main.complex_type_definitions() {
        let mut own = HashSet::new();
        from_complex(complex, &mut own);
        if let Some(name) = &complex.name {
            own.remove(name);
        }
        referenced.extend(own);
    }
    for group in &main.model_group_definitions {
        for particle in &group.model_group.particles {
            from_particle(particle, &mut referenced);
        }
    }
    referenced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DomainConfig,
        policy::{ConfiguredPolicy, GenericPolicy},
        table_graph::TableSpec,
    };
    use xsd2sql_xsd::read_schema;

    fn walk_schema(xsd: &str, policy: &dyn DomainPolicy) -> (TableGraph, Diagnostics) {
        try_walk_schema(xsd, policy).unwrap()
    }

    fn try_walk_schema(
        xsd: &str,
        policy: &dyn DomainPolicy,
    ) -> Result<(TableGraph, Diagnostics), ConvertError> {
        let doc = roxmltree::Document::parse(xsd).unwrap();
        let schema = read_schema(&doc).unwrap();
        let mut table = SchemaComponentTable::default();
        table.register(&schema).unwrap();

        let mut walker = Walker::new(&table, policy);
        for root in select_roots(&table, &schema, policy)? {
            walker.walk_root(&root)?;
        }
        Ok(walker.finish())
    }

    fn table_names(graph: &TableGraph) -> Vec<&str> {
        graph.tables().iter().map(|t| t.name.as_str()).collect()
    }

    fn columns(table: &TableSpec) -> Vec<(&str, &str, bool)> {
        table
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.sql_type.as_str(), c.nullable))
            .collect()
    }

    fn cycles(diagnostics: &Diagnostics) -> Vec<&Diagnostic> {
        diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::Cycle { .. }))
            .collect()
    }

    #[test]
    fn cycles_are_truncated() {
        let (graph, diagnostics) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="A"><xs:sequence>
                    <xs:element name="name" type="xs:string"/>
                    <xs:element name="b" type="B" minOccurs="0"/>
                </xs:sequence></xs:complexType>
                <xs:complexType name="B"><xs:sequence>
                    <xs:element name="a" type="A" minOccurs="0"/>
                </xs:sequence></xs:complexType>
            </xs:schema>"#,
            &GenericPolicy,
        );

        assert_eq!(table_names(&graph), ["A", "B"]);
        assert_eq!(
            columns(graph.table("B").unwrap()),
            [("id", "SERIAL", false), ("a_id", "INTEGER", false)]
        );
        assert_eq!(
            cycles(&diagnostics),
            [&Diagnostic::Cycle {
                type_name: "A".into(),
                table: "B".into()
            }]
        );
    }

    #[test]
    fn recursive_element_refs_are_truncated() {
        let (graph, diagnostics) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="node"><xs:complexType><xs:sequence>
                    <xs:element name="label" type="xs:string"/>
                    <xs:element ref="node" minOccurs="0" maxOccurs="unbounded"/>
                </xs:sequence></xs:complexType></xs:element>
            </xs:schema>"#,
            &GenericPolicy,
        );

        assert_eq!(table_names(&graph), ["node"]);
        assert_eq!(
            columns(graph.table("node").unwrap()),
            [("id", "SERIAL", false), ("label", "VARCHAR(255)", false)]
        );
        assert_eq!(
            cycles(&diagnostics),
            [&Diagnostic::Cycle {
                type_name: "node".into(),
                table: "node".into()
            }]
        );
    }

    #[test]
    fn element_refs_cycle_through_nested_tables() {
        let (graph, diagnostics) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="folder"><xs:complexType><xs:sequence>
                    <xs:element ref="entry" maxOccurs="unbounded"/>
                </xs:sequence></xs:complexType></xs:element>
                <xs:element name="entry"><xs:complexType><xs:sequence>
                    <xs:element name="title" type="xs:string"/>
                    <xs:element ref="entry" minOccurs="0" maxOccurs="unbounded"/>
                </xs:sequence></xs:complexType></xs:element>
            </xs:schema>"#,
            &GenericPolicy,
        );

        // The anonymous type gets one table under `folder` and one as a root of its own.
        assert_eq!(table_names(&graph), ["folder", "entry", "entry_root"]);
        assert_eq!(
            columns(graph.table("entry").unwrap()),
            [
                ("id", "SERIAL", false),
                ("folder_id", "INTEGER", false),
                ("title", "VARCHAR(255)", false)
            ]
        );
        assert_eq!(
            cycles(&diagnostics),
            [
                &Diagnostic::Cycle {
                    type_name: "entry".into(),
                    table: "entry".into()
                },
                &Diagnostic::Cycle {
                    type_name: "entry".into(),
                    table: "entry_root".into()
                }
            ]
        );
    }

    #[test]
    fn recursive_groups_are_truncated() {
        let (graph, diagnostics) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:group name="Terms"><xs:sequence>
                    <xs:element name="term" type="xs:string"/>
                    <xs:group ref="Terms" minOccurs="0"/>
                </xs:sequence></xs:group>
                <xs:element name="glossary"><xs:complexType>
                    <xs:group ref="Terms"/>
                </xs:complexType></xs:element>
            </xs:schema>"#,
            &GenericPolicy,
        );

        assert_eq!(table_names(&graph), ["glossary"]);
        assert_eq!(
            columns(graph.table("glossary").unwrap()),
            [("id", "SERIAL", false), ("term", "VARCHAR(255)", false)]
        );
        assert_eq!(
            cycles(&diagnostics),
            [&Diagnostic::Cycle {
                type_name: "Terms".into(),
                table: "glossary".into()
            }]
        );
    }

    #[test]
    fn choice_members_are_nullable_and_grouped() {
        let (graph, _) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="Payment"><xs:complexType><xs:sequence>
                    <xs:element name="amount" type="xs:decimal"/>
                    <xs:choice>
                        <xs:element name="x" type="xs:string"/>
                        <xs:element name="y" type="xs:int"/>
                        <xs:element name="z"><xs:complexType><xs:choice>
                            <xs:element name="p" type="xs:string"/>
                            <xs:element name="q" type="xs:string"/>
                        </xs:choice></xs:complexType></xs:element>
                    </xs:choice>
                </xs:sequence></xs:complexType></xs:element>
            </xs:schema>"#,
            &GenericPolicy,
        );

        assert_eq!(table_names(&graph), ["Payment", "z"]);
        let payment = graph.table("Payment").unwrap();
        assert_eq!(
            columns(payment),
            [
                ("id", "SERIAL", false),
                ("amount", "NUMERIC(15,2)", false),
                ("x", "VARCHAR(255)", true),
                ("y", "INTEGER", true),
            ]
        );
        assert_eq!(payment.choice_groups.len(), 1);
        assert_eq!(payment.choice_groups[0].members, ["x", "y", "z"]);

        // the member's own choice stays on its table
        let z = graph.table("z").unwrap();
        assert_eq!(z.choice_groups.len(), 1);
        assert_eq!(z.choice_groups[0].members, ["p", "q"]);
        assert!(z.column("p").unwrap().nullable);
    }

    #[test]
    fn sequences_inside_a_choice_join_its_group() {
        let (graph, _) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="dest"><xs:complexType><xs:choice>
                    <xs:element name="CNPJ" type="xs:string"/>
                    <xs:sequence>
                        <xs:element name="CPF" type="xs:string"/>
                        <xs:choice><xs:element name="a" type="xs:string"/><xs:element name="b" type="xs:string"/></xs:choice>
                    </xs:sequence>
                </xs:choice></xs:complexType></xs:element>
            </xs:schema>"#,
            &GenericPolicy,
        );
        let dest = graph.table("dest").unwrap();
        assert_eq!(dest.choice_groups.len(), 1);
        assert_eq!(dest.choice_groups[0].members, ["CNPJ", "CPF", "a", "b"]);
    }

    #[test]
    fn inheritance_is_flattened_per_occurrence() {
        let (graph, _) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="holder" type="Holder"/>
                <xs:complexType name="Holder"><xs:sequence>
                    <xs:element name="da" type="DerivedA"/>
                    <xs:element name="db" type="DerivedB"/>
                </xs:sequence></xs:complexType>
                <xs:complexType name="Base">
                    <xs:sequence>
                        <xs:element name="code" type="xs:string"/>
                        <xs:choice><xs:element name="c1" type="xs:string"/><xs:element name="c2" type="xs:string"/></xs:choice>
                    </xs:sequence>
                    <xs:attribute name="version" type="xs:string" use="required"/>
                    <xs:attribute name="legacy" type="xs:string"/>
                </xs:complexType>
                <xs:complexType name="DerivedA"><xs:complexContent><xs:extension base="Base">
                    <xs:sequence><xs:element name="a" type="xs:string"/></xs:sequence>
                </xs:extension></xs:complexContent></xs:complexType>
                <xs:complexType name="DerivedB"><xs:complexContent><xs:extension base="Base">
                    <xs:sequence><xs:element name="b" type="xs:string"/></xs:sequence>
                    <xs:attribute name="legacy" use="prohibited"/>
                </xs:extension></xs:complexContent></xs:complexType>
            </xs:schema>"#,
            &GenericPolicy,
        );

        assert_eq!(table_names(&graph), ["Holder", "DerivedA", "DerivedB"]);
        let names = |table: &str| -> Vec<String> {
            graph
                .table(table)
                .unwrap()
                .columns
                .iter()
                .map(|c| c.name.clone())
                .collect()
        };
        assert_eq!(
            names("DerivedA"),
            ["id", "holder_id", "code", "c1", "c2", "a", "version", "legacy"]
        );
        assert_eq!(names("DerivedB"), ["id", "holder_id", "code", "c1", "c2", "b", "version"]);
        for table in ["DerivedA", "DerivedB"] {
            let groups = &graph.table(table).unwrap().choice_groups;
            assert_eq!(groups.len(), 1);
            assert_eq!(groups[0].table, table);
            assert_eq!(groups[0].members, ["c1", "c2"]);
        }
    }

    #[test]
    fn cardinality_forces_tables() {
        let policy = ConfiguredPolicy::new(
            DomainConfig::from_yaml_str("column_elements: [line]").unwrap(),
        );
        let (graph, _) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="Doc"><xs:complexType><xs:sequence>
                    <xs:element name="tag" type="xs:string" maxOccurs="unbounded"/>
                    <xs:element name="line" maxOccurs="2"><xs:complexType><xs:sequence>
                        <xs:element name="text" type="xs:string"/>
                    </xs:sequence></xs:complexType></xs:element>
                    <xs:sequence minOccurs="0">
                        <xs:element name="note" type="xs:string"/>
                    </xs:sequence>
                    <xs:element name="deleted" type="xs:date" nillable="true"/>
                </xs:sequence></xs:complexType></xs:element>
            </xs:schema>"#,
            &policy,
        );

        assert_eq!(table_names(&graph), ["Doc", "tag", "line"]);
        assert_eq!(
            columns(graph.table("tag").unwrap()),
            [
                ("id", "SERIAL", false),
                ("doc_id", "INTEGER", false),
                ("value", "VARCHAR(255)", false)
            ]
        );
        assert_eq!(
            columns(graph.table("Doc").unwrap()),
            [
                ("id", "SERIAL", false),
                ("note", "VARCHAR(255)", true),
                ("deleted", "DATE", true)
            ]
        );
    }

    #[test]
    fn simple_content_gets_a_value_column() {
        let (graph, diagnostics) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="Invoice"><xs:complexType><xs:sequence>
                    <xs:element name="total" type="Amount"/>
                </xs:sequence></xs:complexType></xs:element>
                <xs:complexType name="Amount"><xs:simpleContent>
                    <xs:extension base="xs:decimal">
                        <xs:attribute name="currency" type="xs:string" use="required"/>
                        <xs:attribute name="rate"/>
                    </xs:extension>
                </xs:simpleContent></xs:complexType>
            </xs:schema>"#,
            &GenericPolicy,
        );

        assert_eq!(
            columns(graph.table("Amount").unwrap()),
            [
                ("id", "SERIAL", false),
                ("invoice_id", "INTEGER", false),
                ("value", "NUMERIC(15,2)", false),
                ("currency", "VARCHAR(255)", false),
                ("rate", "VARCHAR(255)", true),
            ]
        );
        assert!(diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnmappedType { column, .. } if column == "rate"
        )));
    }

    #[test]
    fn references_are_resolved_and_wildcards_skipped() {
        let (graph, _) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="Doc"><xs:complexType><xs:sequence>
                    <xs:element ref="title"/>
                    <xs:group ref="Audit" minOccurs="0"/>
                    <xs:any processContents="lax"/>
                </xs:sequence></xs:complexType></xs:element>
                <xs:element name="title" type="xs:string"/>
                <xs:group name="Audit"><xs:sequence>
                    <xs:element name="created" type="xs:dateTime"/>
                </xs:sequence></xs:group>
            </xs:schema>"#,
            &GenericPolicy,
        );

        assert_eq!(table_names(&graph), ["Doc"]);
        assert_eq!(
            columns(graph.table("Doc").unwrap()),
            [
                ("id", "SERIAL", false),
                ("title", "VARCHAR(255)", false),
                ("created", "TIMESTAMP", true)
            ]
        );
    }

    #[test]
    fn policy_decisions() {
        let policy = ConfiguredPolicy::new(
            DomainConfig::from_yaml_str(
                r#"
field_overrides:
  Customer.billing: TEXT
skip_elements: [Signature]
table_elements: [code]
"#,
            )
            .unwrap(),
        );
        let (graph, diagnostics) = walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="Customer"><xs:complexType><xs:sequence>
                    <xs:element name="code" type="xs:string"/>
                    <xs:element name="billing" type="AddressType"/>
                    <xs:element name="shipping" type="AddressType"/>
                    <xs:element name="Signature" type="AddressType"/>
                </xs:sequence></xs:complexType></xs:element>
                <xs:element name="Supplier"><xs:complexType><xs:sequence>
                    <xs:element name="address" type="AddressType"/>
                </xs:sequence></xs:complexType></xs:element>
                <xs:complexType name="AddressType"><xs:sequence>
                    <xs:element name="street" type="xs:string"/>
                </xs:sequence></xs:complexType>
            </xs:schema>"#,
            &policy,
        );

        assert_eq!(table_names(&graph), ["Customer", "code", "AddressType", "Supplier"]);
        let customer = graph.table("Customer").unwrap();
        assert_eq!(customer.column("billing").unwrap().sql_type, "TEXT");
        assert!(customer.column("Signature").is_none());
        assert!(diagnostics.iter().any(|d| *d
            == Diagnostic::SharedTable {
                table: "AddressType".into(),
                parent: "Supplier".into()
            }));
    }

    #[test]
    fn root_types_without_global_elements() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="TNFe"><xs:sequence>
                <xs:element name="ide" type="TIde"/>
            </xs:sequence></xs:complexType>
            <xs:complexType name="TIde"><xs:sequence>
                <xs:element name="cUF" type="xs:string"/>
            </xs:sequence></xs:complexType>
            <xs:complexType name="Other"><xs:sequence>
                <xs:element name="x" type="xs:string"/>
            </xs:sequence></xs:complexType>
        </xs:schema>"#;
        let doc = roxmltree::Document::parse(xsd).unwrap();
        let schema = read_schema(&doc).unwrap();
        let mut table = SchemaComponentTable::default();
        table.register(&schema).unwrap();

        let unreferenced = select_roots(&table, &schema, &GenericPolicy).unwrap();
        assert_eq!(
            unreferenced,
            [Root::Type(QName::local("TNFe")), Root::Type(QName::local("Other"))]
        );

        let policy = ConfiguredPolicy::new(
            DomainConfig::from_yaml_str("root_type_prefixes: [T]").unwrap(),
        );
        let prefixed = select_roots(&table, &schema, &policy).unwrap();
        assert_eq!(
            prefixed,
            [Root::Type(QName::local("TNFe")), Root::Type(QName::local("TIde"))]
        );
    }

    #[test]
    fn unresolved_types_are_fatal() {
        let result = try_walk_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="Order"><xs:complexType><xs:sequence>
                    <xs:element name="status" type="Status"/>
                </xs:sequence></xs:complexType></xs:element>
            </xs:schema>"#,
            &GenericPolicy,
        );
        assert_eq!(
            result.unwrap_err(),
            ConvertError::UnresolvedType {
                name: QName::local("Status"),
                referenced_from: "Order.status".into()
            }
        );
    }
}
