//! The arena every schema of one conversion is registered into.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use log::{debug, warn};

use super::builtins::{self, BuiltinType};
use super::error::XsdError;
use super::xstypes::QName;
use super::{
    BuiltinOverwriteAction, ElementDeclaration, ModelGroupDefinition, RegisterBuiltins, Schema,
    TypeDefinition,
};

/// A named top-level component kind with its own symbol space in a [`SchemaComponentTable`].
pub trait Component: Sized + PartialEq {
    const KIND: &'static str;

    #[doc(hidden)]
    fn arena(table: &SchemaComponentTable) -> &Arena<Self>;
}

/// Index of a component in the arena of its kind.
pub struct Ref<R: Component> {
    slot: u32,
    kind: PhantomData<fn() -> R>,
}

impl<R: Component> Ref<R> {
    fn new(slot: usize) -> Self {
        let slot = u32::try_from(slot).unwrap_or_else(|_| panic!("too many {} components", R::KIND));
        Self {
            slot,
            kind: PhantomData,
        }
    }

    fn slot(self) -> usize {
        self.slot as usize
    }

    pub fn get(self, table: &SchemaComponentTable) -> &R {
        table.get(self)
    }
}

// Written out by hand: a derive would demand the same trait of `R`.
impl<R: Component> Clone for Ref<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Component> Copy for Ref<R> {}

impl<R: Component> PartialEq for Ref<R> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl<R: Component> Eq for Ref<R> {}

impl<R: Component> Hash for Ref<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
    }
}

impl<R: Component> fmt::Debug for Ref<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]", R::KIND, self.slot)
    }
}

/// Storage for one component kind plus its name index.
#[doc(hidden)]
pub struct Arena<R: Component> {
    values: Vec<R>,
    names: HashMap<QName, Ref<R>>,
}

impl<R: Component> Default for Arena<R> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            names: HashMap::new(),
        }
    }
}

impl<R: Component> Arena<R> {
    fn push(&mut self, name: QName, value: R) {
        let ref_ = Ref::new(self.values.len());
        self.values.push(value);
        self.names.insert(name, ref_);
    }

    /// Inserts `value` under `name` unless the name is taken. An identical value already
    /// registered under the name counts as success.
    fn insert(&mut self, name: QName, value: R) -> Registered<R> {
        let existing = self.names.get(&name).copied();
        match existing {
            None => {
                self.push(name, value);
                Registered::New
            }
            Some(existing) if self.values[existing.slot()] == value => Registered::Identical,
            Some(existing) => Registered::Conflict(existing, value),
        }
    }
}

macro_rules! component {
    ($type_name:ty, $field:ident, $kind:literal) => {
        impl Component for $type_name {
            const KIND: &'static str = $kind;

            fn arena(table: &SchemaComponentTable) -> &Arena<Self> {
                &table.$field
            }
        }
    };
}

component!(TypeDefinition, types, "type");
component!(ElementDeclaration, elements, "element");
component!(ModelGroupDefinition, groups, "group");

enum Registered<R: Component> {
    New,
    Identical,
    /// Carries the rejected value.
    Conflict(Ref<R>, R),
}

/// Named components are looked up across every registered schema, so a type defined in an included
/// or imported file resolves the same way as one defined in the main file.
pub struct SchemaComponentTable {
    /// Simple and complex type definitions share one symbol space.
    types: Arena<TypeDefinition>,
    elements: Arena<ElementDeclaration>,
    groups: Arena<ModelGroupDefinition>,
    builtin_overwrite: BuiltinOverwriteAction,
}

impl Default for SchemaComponentTable {
    fn default() -> Self {
        Self::new(RegisterBuiltins::Yes, BuiltinOverwriteAction::Deny)
    }
}

impl SchemaComponentTable {
    pub fn new(
        register_builtins: RegisterBuiltins,
        builtin_overwrite: BuiltinOverwriteAction,
    ) -> Self {
        let mut table = Self {
            types: Arena::default(),
            elements: Arena::default(),
            groups: Arena::default(),
            builtin_overwrite,
        };
        if register_builtins == RegisterBuiltins::Yes {
            builtins::register_builtins(&mut table);
        }
        table
    }

    /// Panics if `ref_` was handed out by another table.
    pub fn get<R: Component>(&self, ref_: Ref<R>) -> &R {
        &R::arena(self).values[ref_.slot()]
    }

    pub fn lookup<R: Component>(&self, name: &QName) -> Option<Ref<R>> {
        R::arena(self).names.get(name).copied()
    }

    pub(super) fn insert_builtin(&mut self, name: QName, value: TypeDefinition) {
        self.types.push(name, value);
    }

    /// Registers all named top-level components of `schema`.
    ///
    /// Registering a component whose name is already taken by an identical definition is a no-op,
    /// which makes it safe to register a schema reached through several include paths.
    pub fn register(&mut self, schema: &Schema) -> Result<(), XsdError> {
        for type_definition in &schema.type_definitions {
            let Some(name) = type_definition.name().cloned() else {
                debug!("skipping unnamed top-level type definition");
                continue;
            };
            self.register_type(name, type_definition.clone())?;
        }

        for element in &schema.element_declarations {
            let name = element.qualified_name();
            if let Registered::Conflict(..) = self.elements.insert(name.clone(), element.clone()) {
                return Err(XsdError::DuplicateElement(name));
            }
        }

        for group in &schema.model_group_definitions {
            let name = group.name.clone();
            if let Registered::Conflict(..) = self.groups.insert(name.clone(), group.clone()) {
                return Err(XsdError::DuplicateGroup(name));
            }
        }

        Ok(())
    }

    fn register_type(&mut self, name: QName, value: TypeDefinition) -> Result<(), XsdError> {
        match self.types.insert(name.clone(), value) {
            Registered::New | Registered::Identical => Ok(()),
            Registered::Conflict(existing, value) => {
                if BuiltinType::from_name(&name).is_none() {
                    return Err(XsdError::DuplicateType(name));
                }
                match self.builtin_overwrite {
                    BuiltinOverwriteAction::Deny => Err(XsdError::BuiltinRedefined(name)),
                    BuiltinOverwriteAction::Warn | BuiltinOverwriteAction::Allow => {
                        if self.builtin_overwrite == BuiltinOverwriteAction::Warn {
                            warn!("Overwriting built-in type {name}");
                        }
                        self.types.values[existing.slot()] = value;
                        Ok(())
                    }
                }
            }
        }
    }

    pub fn resolve_type(&self, name: &QName) -> Result<Ref<TypeDefinition>, XsdError> {
        self.lookup(name)
            .ok_or_else(|| XsdError::UnresolvedType(name.clone()))
    }

    pub fn resolve_element(&self, name: &QName) -> Result<Ref<ElementDeclaration>, XsdError> {
        self.lookup(name)
            .ok_or_else(|| XsdError::UnresolvedElement(name.clone()))
    }

    pub fn resolve_group(&self, name: &QName) -> Result<Ref<ModelGroupDefinition>, XsdError> {
        self.lookup(name)
            .ok_or_else(|| XsdError::UnresolvedGroup(name.clone()))
    }

    pub fn type_definition(&self, name: &QName) -> Result<&TypeDefinition, XsdError> {
        self.resolve_type(name).map(|ref_| self.get(ref_))
    }

    /// Number of registered type definitions, built-ins included.
    pub fn type_count(&self) -> usize {
        self.types.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_schema;

    fn schema(text: &str) -> Schema {
        let doc = roxmltree::Document::parse(text).unwrap();
        read_schema(&doc).unwrap()
    }

    const ORDER: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:o">
        <xs:complexType name="Order"><xs:sequence>
            <xs:element name="id" type="xs:int"/>
        </xs:sequence></xs:complexType>
        <xs:element name="order" type="Order"/>
    </xs:schema>"#;

    #[test]
    fn builtins_are_preregistered() {
        let table = SchemaComponentTable::default();
        let string = table.resolve_type(&builtins::XS_STRING_NAME).unwrap();
        assert!(table.get(string).simple().is_some());
        assert_eq!(table.type_count(), BuiltinType::ALL.len());
    }

    #[test]
    fn identical_reregistration_is_accepted() {
        let mut table = SchemaComponentTable::default();
        let order = schema(ORDER);
        table.register(&order).unwrap();
        let count = table.type_count();
        table.register(&order).unwrap();
        assert_eq!(table.type_count(), count);
        assert!(table
            .resolve_element(&QName::with_namespace("urn:o", "order"))
            .is_ok());
    }

    #[test]
    fn conflicting_redefinition_is_rejected() {
        let mut table = SchemaComponentTable::default();
        table.register(&schema(ORDER)).unwrap();
        let other = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:o">
                <xs:complexType name="Order"><xs:sequence>
                    <xs:element name="id" type="xs:long"/>
                </xs:sequence></xs:complexType>
            </xs:schema>"#,
        );
        assert_eq!(
            table.register(&other),
            Err(XsdError::DuplicateType(QName::with_namespace("urn:o", "Order")))
        );
    }

    #[test]
    fn unresolved_names_are_reported() {
        let table = SchemaComponentTable::default();
        let missing = QName::local("Missing");
        assert_eq!(
            table.resolve_type(&missing),
            Err(XsdError::UnresolvedType(missing.clone()))
        );
        assert_eq!(
            table.resolve_group(&missing),
            Err(XsdError::UnresolvedGroup(missing))
        );
    }

    #[test]
    fn builtin_overwrite_follows_policy() {
        let redefinition = schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                targetNamespace="http://www.w3.org/2001/XMLSchema">
                <xs:simpleType name="string"><xs:restriction base="xs:token"/></xs:simpleType>
            </xs:schema>"#,
        );

        let mut strict = SchemaComponentTable::default();
        assert_eq!(
            strict.register(&redefinition),
            Err(XsdError::BuiltinRedefined(builtins::XS_STRING_NAME.clone()))
        );

        let mut lenient =
            SchemaComponentTable::new(RegisterBuiltins::Yes, BuiltinOverwriteAction::Allow);
        lenient.register(&redefinition).unwrap();
        assert_eq!(lenient.type_count(), BuiltinType::ALL.len());
    }
}
