//! Result row materialization
//!
//! Store rows arrive as ordered `(name, value)` pairs and may repeat a name
//! when several joined tables share a column. Materializing keeps every value:
//! the first occurrence keeps its name, later ones are renamed after the alias
//! of the table they came from (`Name_t2`), or after their occurrence number
//! (`Name_2`) when the source is unknown.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::entity_catalog::EntityMetadata;

/// One store row in column order
pub type RowRecord = Vec<(String, Value)>;

/// Row with unique keys, in column order
pub type MaterializedRow = Map<String, Value>;

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Failed to build {entity} from row: {source}")]
    Deserialize {
        entity: String,
        #[source]
        source: serde_json::Error,
    },
}

/// `column_sources[i]` is the table alias of column `i`; pass an empty slice
/// when the SQL was not synthesized.
pub fn materialize(row: RowRecord, column_sources: &[String]) -> MaterializedRow {
    let mut result = MaterializedRow::new();
    let mut seen: Vec<(String, usize)> = Vec::new();

    for (position, (name, value)) in row.into_iter().enumerate() {
        let occurrence = match seen.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => {
                *count += 1;
                *count
            }
            None => {
                seen.push((name.clone(), 1));
                1
            }
        };

        let key = if occurrence == 1 && !result.contains_key(&name) {
            name
        } else {
            let candidate = match column_sources.get(position) {
                Some(alias) => format!("{}_{}", name, alias),
                None => format!("{}_{}", name, occurrence.max(2)),
            };
            unique_key(&result, candidate)
        };

        result.insert(key, value);
    }

    result
}

fn unique_key(existing: &MaterializedRow, candidate: String) -> String {
    if !existing.contains_key(&candidate) {
        return candidate;
    }
    let mut counter = 2;
    loop {
        let next = format!("{}_{}", candidate, counter);
        if !existing.contains_key(&next) {
            return next;
        }
        counter += 1;
    }
}

/// Builds a typed record from a row, renaming columns back to field names
/// through `metadata`. Columns the entity does not map are passed through
/// under their own names.
pub fn materialize_into<T: DeserializeOwned>(
    row: RowRecord,
    metadata: &EntityMetadata,
) -> Result<T, MaterializeError> {
    let mut fields = Map::new();
    for (name, value) in row {
        let field = metadata
            .column_by_name(&name)
            .map(|c| c.source_field_name.clone())
            .unwrap_or(name);
        // First occurrence wins; joined duplicates belong to other tables
        if !fields.contains_key(&field) {
            fields.insert(field, value);
        }
    }

    serde_json::from_value(Value::Object(fields)).map_err(|source| MaterializeError::Deserialize {
        entity: metadata.entity_name.clone(),
        source,
    })
}
