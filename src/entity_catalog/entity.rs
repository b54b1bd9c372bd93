//! Static entity descriptions
//!
//! An entity is a plain Rust struct that describes one table. The description is
//! the Rust counterpart of table/column/key annotations: it is produced once by
//! [`Entity::descriptor`] and turned into [`EntityMetadata`](super::EntityMetadata)
//! by the resolver.
//!
//! Most entities get their impl from [`impl_entity!`](crate::impl_entity); the
//! trait can also be written by hand when a field needs custom conversion.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use super::errors::FieldAssignError;

/// How the store populates a column, mirroring the identity/computed options
/// of a database-generated annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseGenerated {
    #[default]
    None,
    Identity,
    Computed,
}

impl DatabaseGenerated {
    pub fn is_generated(&self) -> bool {
        matches!(self, DatabaseGenerated::Identity | DatabaseGenerated::Computed)
    }
}

/// Table annotation: explicit table name, optionally inside a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAnnotation {
    pub name: String,
    pub schema: Option<String>,
}

/// One field of an entity together with its mapping annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust field name, as used by join predicates and member accessors
    pub name: String,
    /// Column annotation; `None` means the column is named after the field
    pub column: Option<String>,
    pub key: bool,
    pub generated: DatabaseGenerated,
    /// Field is never persisted
    pub not_mapped: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: None,
            key: false,
            generated: DatabaseGenerated::None,
            not_mapped: false,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.generated = DatabaseGenerated::Identity;
        self
    }

    pub fn computed(mut self) -> Self {
        self.generated = DatabaseGenerated::Computed;
        self
    }

    pub fn not_mapped(mut self) -> Self {
        self.not_mapped = true;
        self
    }
}

/// Everything the resolver needs to know about an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub type_name: String,
    pub table: Option<TableAnnotation>,
    /// Declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn table(mut self, name: impl Into<String>) -> Self {
        let schema = self.table.take().and_then(|t| t.schema);
        self.table = Some(TableAnnotation {
            name: name.into(),
            schema,
        });
        self
    }

    /// Sets the schema segment. Has no effect unless a table name is annotated.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        if let Some(table) = self.table.as_mut() {
            table.schema = Some(schema.into());
        }
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

/// A record type that maps onto one table.
pub trait Entity: Send + Sync + 'static {
    fn descriptor() -> EntityDescriptor
    where
        Self: Sized;

    /// Current value of a field, `None` if the entity has no such field.
    /// An unset optional field reads as `Some(Value::Null)`.
    fn field_value(&self, field: &str) -> Option<Value>;

    fn set_field_value(&mut self, field: &str, value: Value) -> Result<(), FieldAssignError>;
}

/// Copyable identity of an entity type.
///
/// Join specs, filters and alias tables refer to entity types through this
/// handle instead of generic parameters, so chains of any length can live in a
/// single `Vec`.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
    descriptor: fn() -> EntityDescriptor,
}

impl EntityType {
    pub fn of<T: Entity>() -> Self {
        let full = std::any::type_name::<T>();
        let name = full.rsplit("::").next().unwrap_or(full);
        Self {
            id: TypeId::of::<T>(),
            name,
            descriptor: T::descriptor,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn descriptor(&self) -> EntityDescriptor {
        (self.descriptor)()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.name)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
