use thiserror::Error;

/// Errors raised when a value is written onto an entity field by name
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FieldAssignError {
    #[error("Entity '{entity}' has no field named '{field}'")]
    UnknownField { entity: String, field: String },

    #[error("Value for field '{field}' has the wrong shape: {message}")]
    TypeMismatch { field: String, message: String },
}
