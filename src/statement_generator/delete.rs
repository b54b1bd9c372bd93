use crate::dialect::Dialect;
use crate::entity_catalog::{Entity, EntityMetadata};
use crate::errors::SynthesisResult;

use super::binding::ParameterBinding;
use super::{key_predicate, require_key_columns};

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub sql: String,
    pub bindings: Vec<ParameterBinding>,
}

pub fn delete_statement<T: Entity>(
    metadata: &EntityMetadata,
    entity: &T,
    dialect: &dyn Dialect,
) -> SynthesisResult<DeleteStatement> {
    let keys = require_key_columns(metadata, "delete")?;
    let (predicate, bindings) = key_predicate(metadata, &keys, entity, dialect, "delete")?;

    let sql = format!(
        "DELETE FROM {} WHERE {}; {}",
        dialect.table(&metadata.table_name),
        predicate,
        dialect.affected_rows()
    );

    Ok(DeleteStatement { sql, bindings })
}
