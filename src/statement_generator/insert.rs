use serde_json::Value;
use uuid::Uuid;

use crate::dialect::{Dialect, GeneratedKeyKind};
use crate::entity_catalog::{ColumnInfo, EntityMetadata};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::sql_builder::parameters::parameter_name;

use super::binding::ParameterBinding;
use super::require_key_columns;

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub sql: String,
    pub bindings: Vec<ParameterBinding>,
    /// Field that receives the generated key after execution
    pub key_field: Option<String>,
    pub key_kind: GeneratedKeyKind,
}

impl InsertStatement {
    pub fn normalize_key(&self, value: Value) -> Value {
        normalize_generated_key(self.key_kind, value)
    }
}

/// Unique-identifier keys come back in whatever form the store renders them
/// (`{6F96...}`, upper case); they are re-rendered hyphenated lower case.
/// Anything else passes through.
pub fn normalize_generated_key(key_kind: GeneratedKeyKind, value: Value) -> Value {
    match (key_kind, &value) {
        (GeneratedKeyKind::UniqueIdentifier, Value::String(text)) => match Uuid::parse_str(text) {
            Ok(id) => Value::String(id.hyphenated().to_string()),
            Err(err) => {
                log::warn!("Returned key '{}' is not a unique identifier: {}", text, err);
                value
            }
        },
        _ => value,
    }
}

/// Insert template shared by every row of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchInsertStatement {
    pub sql: String,
    pub bindings: Vec<ParameterBinding>,
    /// Field that receives the first returned key column
    pub key_field: Option<String>,
    pub key_kind: GeneratedKeyKind,
}

impl BatchInsertStatement {
    pub fn normalize_key(&self, value: Value) -> Value {
        normalize_generated_key(self.key_kind, value)
    }
}

struct InsertParts {
    table: String,
    columns: String,
    values: String,
    bindings: Vec<ParameterBinding>,
}

fn insert_parts(metadata: &EntityMetadata, dialect: &dyn Dialect) -> SynthesisResult<InsertParts> {
    let insertable: Vec<_> = metadata.insertable_columns().collect();
    if insertable.is_empty() {
        return Err(SynthesisError::no_mappable_columns(
            &metadata.entity_name,
            "insert",
        ));
    }

    let mut columns = Vec::with_capacity(insertable.len());
    let mut values = Vec::with_capacity(insertable.len());
    let mut bindings = Vec::with_capacity(insertable.len());
    for column in insertable {
        let parameter = parameter_name(&column.column_name);
        columns.push(dialect.identifier(&column.column_name));
        values.push(dialect.placeholder(&parameter));
        bindings.push(ParameterBinding::new(parameter, &column.source_field_name));
    }

    Ok(InsertParts {
        table: dialect.table(&metadata.table_name),
        columns: columns.join(", "),
        values: values.join(", "),
        bindings,
    })
}

/// Key columns returned through `OUTPUT INSERTED`: the generated ones, or every
/// key column when none is generated.
fn returned_keys<'m>(metadata: &'m EntityMetadata, keys: Vec<&'m ColumnInfo>) -> Vec<&'m ColumnInfo> {
    let generated: Vec<_> = metadata.generated_key_columns().collect();
    if generated.is_empty() {
        keys
    } else {
        generated
    }
}

/// Single-row INSERT with identity retrieval.
///
/// Integer keys are read back with a trailing `SELECT CAST(SCOPE_IDENTITY() AS int)`
/// when the entity has a generated key; unique-identifier keys come back through
/// `OUTPUT INSERTED`. Write-back happens only when exactly one key column is returned.
pub fn insert_statement(
    metadata: &EntityMetadata,
    dialect: &dyn Dialect,
    key_kind: GeneratedKeyKind,
) -> SynthesisResult<InsertStatement> {
    let keys = require_key_columns(metadata, "insert")?;
    let parts = insert_parts(metadata, dialect)?;

    let (sql, key_field) = match key_kind {
        GeneratedKeyKind::Integer => {
            let generated: Vec<_> = metadata.generated_key_columns().collect();
            let mut sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                parts.table, parts.columns, parts.values
            );
            if !generated.is_empty() {
                sql.push_str("; ");
                sql.push_str(&dialect.scope_identity());
            }
            let key_field = match (keys.len(), generated.as_slice()) {
                (1, [key]) => Some(key.source_field_name.clone()),
                _ => None,
            };
            (sql, key_field)
        }
        GeneratedKeyKind::UniqueIdentifier => {
            let returned = returned_keys(metadata, keys);
            let names: Vec<&str> = returned.iter().map(|c| c.column_name.as_str()).collect();
            let sql = format!(
                "INSERT INTO {} ({}) {} VALUES ({})",
                parts.table,
                parts.columns,
                dialect.output_inserted(&names),
                parts.values
            );
            let key_field = match returned.as_slice() {
                [key] => Some(key.source_field_name.clone()),
                _ => None,
            };
            (sql, key_field)
        }
    };

    log::debug!("Insert statement for {}: {}", metadata.entity_name, sql);

    Ok(InsertStatement {
        sql,
        bindings: parts.bindings,
        key_field,
        key_kind,
    })
}

/// Per-row INSERT template for batches, returning the key columns through
/// `OUTPUT INSERTED` whatever the key kind; `key_kind` only governs how the
/// returned keys are normalized.
pub fn batch_insert_statement(
    metadata: &EntityMetadata,
    dialect: &dyn Dialect,
    key_kind: GeneratedKeyKind,
) -> SynthesisResult<BatchInsertStatement> {
    let keys = require_key_columns(metadata, "batch insert")?;
    let parts = insert_parts(metadata, dialect)?;
    let returned = returned_keys(metadata, keys);
    let names: Vec<&str> = returned.iter().map(|c| c.column_name.as_str()).collect();

    let sql = format!(
        "INSERT INTO {} ({}) {} VALUES ({})",
        parts.table,
        parts.columns,
        dialect.output_inserted(&names),
        parts.values
    );

    Ok(BatchInsertStatement {
        sql,
        bindings: parts.bindings,
        key_field: returned.first().map(|c| c.source_field_name.clone()),
        key_kind,
    })
}
