use serde_json::Value;

use crate::entity_catalog::Entity;
use crate::sql_builder::Parameters;

/// Placeholder `@parameter` takes its value from `field` of the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    pub parameter: String,
    pub field: String,
}

impl ParameterBinding {
    pub fn new(parameter: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            field: field.into(),
        }
    }
}

/// Reads the bound fields off `entity`. Fields the entity does not expose bind
/// as NULL.
pub fn bind_parameters<T: Entity>(entity: &T, bindings: &[ParameterBinding]) -> Parameters {
    bindings
        .iter()
        .map(|b| {
            let value = entity.field_value(&b.field).unwrap_or_else(|| {
                log::warn!("Field '{}' has no value to bind; using NULL", b.field);
                Value::Null
            });
            (b.parameter.clone(), value)
        })
        .collect()
}
