//! Entity catalog
//!
//! Describes record types (table name, columns, keys) and resolves those
//! descriptions into [`EntityMetadata`]. This is the leaf every statement
//! builder depends on.

mod cache;
mod entity;
mod errors;
mod macros;
mod metadata;

pub use cache::MetadataCache;
pub use entity::{
    DatabaseGenerated, Entity, EntityDescriptor, EntityType, FieldDescriptor, TableAnnotation,
};
pub use errors::FieldAssignError;
pub use metadata::{ColumnInfo, EntityMetadata, ResolveOptions};
