use std::collections::HashSet;

use serde_json::Value;

use crate::dialect::Dialect;
use crate::entity_catalog::{Entity, EntityMetadata};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::sql_builder::parameters::{normalize_name, parameter_name};
use crate::sql_builder::Parameters;

use super::binding::ParameterBinding;
use super::{check_batch_size, key_predicate, require_key_columns};

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub sql: String,
    pub bindings: Vec<ParameterBinding>,
}

/// Batch update with every value already bound
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateManyStatement {
    pub sql: String,
    pub parameters: Parameters,
    pub rows: usize,
}

/// `UPDATE <table> SET <settable> = @.. WHERE <non-null keys> = @..`
pub fn update_statement<T: Entity>(
    metadata: &EntityMetadata,
    entity: &T,
    dialect: &dyn Dialect,
) -> SynthesisResult<UpdateStatement> {
    let keys = require_key_columns(metadata, "update")?;

    let settable: Vec<_> = metadata.settable_columns().collect();
    if settable.is_empty() {
        return Err(SynthesisError::no_mappable_columns(
            &metadata.entity_name,
            "update",
        ));
    }

    let mut assignments = Vec::with_capacity(settable.len());
    let mut bindings = Vec::with_capacity(settable.len() + keys.len());
    for column in settable {
        let parameter = parameter_name(&column.column_name);
        assignments.push(format!(
            "{} = {}",
            dialect.identifier(&column.column_name),
            dialect.placeholder(&parameter)
        ));
        bindings.push(ParameterBinding::new(parameter, &column.source_field_name));
    }

    let (predicate, key_bindings) = key_predicate(metadata, &keys, entity, dialect, "update")?;
    bindings.extend(key_bindings);

    let sql = format!(
        "UPDATE {} SET {} WHERE {}; {}",
        dialect.table(&metadata.table_name),
        assignments.join(", "),
        predicate,
        dialect.affected_rows()
    );

    Ok(UpdateStatement { sql, bindings })
}

/// One UPDATE applying `properties_to_set` (column name → value) to every row
/// in `rows`, matched by key.
///
/// Each row contributes its own parenthesised key predicate; the predicates are
/// ORed. Key values travel as `@k_<row>` parameters (`@k_<row>_<n>` for
/// composite keys).
pub fn update_many_statement<T: Entity>(
    metadata: &EntityMetadata,
    rows: &[T],
    properties_to_set: &Parameters,
    dialect: &dyn Dialect,
    max_rows: usize,
) -> SynthesisResult<UpdateManyStatement> {
    check_batch_size(rows.len(), max_rows)?;
    let keys = require_key_columns(metadata, "batch update")?;

    if properties_to_set.is_empty() {
        return Err(SynthesisError::no_mappable_columns(
            &metadata.entity_name,
            "batch update",
        ));
    }

    let mut parameters = Parameters::new();
    let mut assignments = Vec::with_capacity(properties_to_set.len());
    let mut assigned: HashSet<&str> = HashSet::with_capacity(properties_to_set.len());
    for (name, value) in properties_to_set {
        let column = metadata
            .column_by_name(normalize_name(name))
            .filter(|c| c.is_settable())
            .ok_or_else(|| SynthesisError::UnknownColumn {
                entity: metadata.entity_name.clone(),
                column: name.clone(),
            })?;
        // `Phone` and `@Phone` name the same column
        if !assigned.insert(column.column_name.as_str()) {
            return Err(SynthesisError::DuplicateColumn {
                entity: metadata.entity_name.clone(),
                column: column.column_name.clone(),
            });
        }
        let parameter = parameter_name(&column.column_name);
        assignments.push(format!(
            "{} = {}",
            dialect.identifier(&column.column_name),
            dialect.placeholder(&parameter)
        ));
        parameters.insert(parameter, value.clone());
    }

    let composite = keys.len() > 1;
    let mut row_predicates = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.iter().enumerate() {
        let mut conditions = Vec::with_capacity(keys.len());
        for (key_index, key) in keys.iter().enumerate() {
            let value = match row.field_value(&key.source_field_name) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };
            let parameter = if composite {
                format!("k_{}_{}", row_index, key_index)
            } else {
                format!("k_{}", row_index)
            };
            conditions.push(format!(
                "{} = {}",
                dialect.identifier(&key.column_name),
                dialect.placeholder(&parameter)
            ));
            parameters.insert(parameter, value);
        }
        if conditions.is_empty() {
            return Err(SynthesisError::no_mappable_columns(
                &metadata.entity_name,
                format!("batch update (row {} has no key values)", row_index),
            ));
        }
        row_predicates.push(format!("({})", conditions.join(" AND ")));
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {}; {}",
        dialect.table(&metadata.table_name),
        assignments.join(", "),
        row_predicates.join(" OR "),
        dialect.affected_rows()
    );

    Ok(UpdateManyStatement {
        sql,
        parameters,
        rows: rows.len(),
    })
}
