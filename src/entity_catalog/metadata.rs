//! Entity metadata resolution
//!
//! Turns an [`EntityDescriptor`] into the table and column facts every
//! statement builder works from. Resolution never fails: an entity without
//! usable columns resolves to an empty column list, and the consumer that needs
//! columns decides whether that is an error (see [`EntityMetadata::require_columns`]).

use crate::errors::{SynthesisError, SynthesisResult};

use super::entity::{EntityDescriptor, TableAnnotation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Keep fields marked as not mapped in the column list
    pub include_excluded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub source_field_name: String,
    pub column_name: String,
    pub is_key: bool,
    pub is_generated_by_database: bool,
    pub is_excluded: bool,
}

impl ColumnInfo {
    /// Can be written by INSERT
    pub fn is_insertable(&self) -> bool {
        !self.is_excluded && !self.is_generated_by_database
    }

    /// Can appear in an UPDATE SET list
    pub fn is_settable(&self) -> bool {
        self.is_insertable() && !self.is_key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    pub entity_name: String,
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
}

impl EntityMetadata {
    pub fn resolve(descriptor: &EntityDescriptor) -> Self {
        Self::resolve_with(descriptor, ResolveOptions::default())
    }

    pub fn resolve_with(descriptor: &EntityDescriptor, options: ResolveOptions) -> Self {
        let table_name = resolve_table_name(&descriptor.type_name, descriptor.table.as_ref());

        let columns = descriptor
            .fields
            .iter()
            .filter(|field| options.include_excluded || !field.not_mapped)
            .map(|field| ColumnInfo {
                source_field_name: field.name.clone(),
                column_name: field.column.clone().unwrap_or_else(|| field.name.clone()),
                is_key: field.key,
                is_generated_by_database: field.generated.is_generated(),
                is_excluded: field.not_mapped,
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Resolved entity {} -> table {} ({} columns)",
            descriptor.type_name,
            table_name,
            columns.len()
        );

        EntityMetadata {
            entity_name: descriptor.type_name.clone(),
            table_name,
            columns,
        }
    }

    /// Columns that take part in generated SQL
    pub fn mapped_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| !c.is_excluded)
    }

    pub fn insertable_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.is_insertable())
    }

    pub fn settable_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.is_settable())
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.is_key && !c.is_excluded)
    }

    pub fn generated_key_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.key_columns().filter(|c| c.is_generated_by_database)
    }

    pub fn column_for_field(&self, field: &str) -> Option<&ColumnInfo> {
        self.mapped_columns().find(|c| c.source_field_name == field)
    }

    pub fn column_by_name(&self, column: &str) -> Option<&ColumnInfo> {
        self.mapped_columns().find(|c| c.column_name == column)
    }

    /// Column name for a field, or `UnknownField`
    pub fn require_column_for_field(&self, field: &str) -> SynthesisResult<&ColumnInfo> {
        self.column_for_field(field)
            .ok_or_else(|| SynthesisError::UnknownField {
                entity: self.entity_name.clone(),
                field: field.to_string(),
            })
    }

    /// Fails with `NoMappableColumns` unless at least one mapped column exists
    pub fn require_columns(&self, operation: &str) -> SynthesisResult<()> {
        if self.mapped_columns().next().is_none() {
            return Err(SynthesisError::no_mappable_columns(
                &self.entity_name,
                operation,
            ));
        }
        Ok(())
    }
}

fn resolve_table_name(type_name: &str, table: Option<&TableAnnotation>) -> String {
    match table {
        Some(TableAnnotation {
            name,
            schema: Some(schema),
        }) => format!("[{}].[{}]", schema, name),
        Some(TableAnnotation { name, schema: None }) => name.clone(),
        None => type_name.to_string(),
    }
}
