//! CRUD statement generation
//!
//! Each generator returns SQL text plus the bindings that tie its placeholders
//! to record fields. Values are read off the record when the statement is
//! bound, not when it is generated; the exceptions are the key predicates of
//! update and delete, whose shape depends on which key values are present.
//!
//! Update and delete append the dialect's affected-row select so a scalar
//! execution reports how many rows were touched.

mod binding;
mod delete;
mod insert;
mod update;

pub use binding::{bind_parameters, ParameterBinding};
pub use delete::{delete_statement, DeleteStatement};
pub use insert::{
    batch_insert_statement, insert_statement, normalize_generated_key, BatchInsertStatement,
    InsertStatement,
};
pub use update::{update_many_statement, update_statement, UpdateManyStatement, UpdateStatement};

use serde_json::Value;

use crate::dialect::Dialect;
use crate::entity_catalog::{ColumnInfo, Entity, EntityMetadata};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::sql_builder::parameters::parameter_name;

/// Rejects empty batches and batches above `max_rows`
pub fn check_batch_size(rows: usize, max_rows: usize) -> SynthesisResult<()> {
    if rows == 0 {
        return Err(SynthesisError::EmptyBatch);
    }
    if rows > max_rows {
        return Err(SynthesisError::BatchTooLarge {
            rows,
            max: max_rows,
        });
    }
    Ok(())
}

/// Key columns of `metadata`, or `NoMappableColumns` when it has none
fn require_key_columns<'m>(
    metadata: &'m EntityMetadata,
    operation: &str,
) -> SynthesisResult<Vec<&'m ColumnInfo>> {
    metadata.require_columns(operation)?;
    let keys: Vec<_> = metadata.key_columns().collect();
    if keys.is_empty() {
        return Err(SynthesisError::no_mappable_columns(
            &metadata.entity_name,
            format!("{} (no key columns)", operation),
        ));
    }
    Ok(keys)
}

/// `Key = @Key AND ...` over the key columns whose current value is non-null.
///
/// Fails when every key value is null, since the statement would otherwise
/// touch every row.
fn key_predicate<T: Entity>(
    metadata: &EntityMetadata,
    keys: &[&ColumnInfo],
    entity: &T,
    dialect: &dyn Dialect,
    operation: &str,
) -> SynthesisResult<(String, Vec<ParameterBinding>)> {
    let mut conditions = Vec::new();
    let mut bindings = Vec::new();
    for key in keys {
        match entity.field_value(&key.source_field_name) {
            None | Some(Value::Null) => continue,
            Some(_) => {
                let parameter = parameter_name(&key.column_name);
                conditions.push(format!(
                    "{} = {}",
                    dialect.identifier(&key.column_name),
                    dialect.placeholder(&parameter)
                ));
                bindings.push(ParameterBinding::new(parameter, &key.source_field_name));
            }
        }
    }
    if conditions.is_empty() {
        return Err(SynthesisError::no_mappable_columns(
            &metadata.entity_name,
            format!("{} (all key values are null)", operation),
        ));
    }
    Ok((conditions.join(" AND "), bindings))
}
