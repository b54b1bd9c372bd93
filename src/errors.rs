use thiserror::Error;

use crate::join_predicate::PredicateSide;
use crate::materializer::MaterializeError;

/// Failures raised while a statement is being synthesized.
///
/// Every variant is produced before anything is sent to the store, so none of
/// them is ever retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SynthesisError {
    #[error("Missing parameter: {0} (placeholder appears in SQL but no value was supplied)")]
    MissingParameter(String),

    #[error("Malformed join predicate on the {side} side: {reason}\n  Predicate: {predicate}")]
    MalformedJoinPredicate {
        side: PredicateSide,
        predicate: String,
        reason: String,
    },

    #[error(
        "Join references type '{entity}' which has no alias yet (reorder the joins so that '{entity}' is introduced first, or reduce the number of joined tables)"
    )]
    UnresolvedJoinAlias { entity: String },

    #[error("Filter or ordering references type '{entity}' which is not part of the join chain")]
    UnresolvedFilterAlias { entity: String },

    #[error("Entity '{entity}' has no mappable columns for {operation}")]
    NoMappableColumns { entity: String, operation: String },

    #[error("Batch of {rows} rows exceeds the maximum of {max} rows per call")]
    BatchTooLarge { rows: usize, max: usize },

    #[error("Batch is empty (at least one row is required)")]
    EmptyBatch,

    #[error("Join chain is empty (at least one join step is required)")]
    EmptyJoinChain,

    #[error("Join chain spans {tables} tables but at most {max} are allowed")]
    TooManyJoins { tables: usize, max: usize },

    #[error("Entity '{entity}' has no mapped field named '{field}'")]
    UnknownField { entity: String, field: String },

    #[error("Entity '{entity}' has no settable column named '{column}'")]
    UnknownColumn { entity: String, column: String },

    #[error("Column '{column}' of entity '{entity}' is assigned more than once")]
    DuplicateColumn { entity: String, column: String },

    #[error("Parameter '{name}' is bound to different values by different filters")]
    ConflictingParameter { name: String },

    #[error("'{name}' is not a supported aggregate function")]
    UnknownAggregateFunction { name: String },
}

impl SynthesisError {
    pub fn no_mappable_columns(entity: impl Into<String>, operation: impl Into<String>) -> Self {
        SynthesisError::NoMappableColumns {
            entity: entity.into(),
            operation: operation.into(),
        }
    }

    pub fn malformed_predicate(
        side: PredicateSide,
        predicate: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SynthesisError::MalformedJoinPredicate {
            side,
            predicate: predicate.into(),
            reason: reason.into(),
        }
    }
}

pub type SynthesisResult<T> = std::result::Result<T, SynthesisError>;

/// Failure of an operation that reached the execution boundary.
///
/// Store errors are carried as-is; the engine never wraps or rewrites them.
#[derive(Debug, Error)]
pub enum ExecutionError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error("Store error: {0}")]
    Store(#[source] E),
}

impl<E> ExecutionError<E>
where
    E: std::error::Error + 'static,
{
    pub fn is_synthesis(&self) -> bool {
        matches!(self, ExecutionError::Synthesis(_))
    }

    pub fn synthesis(&self) -> Option<&SynthesisError> {
        match self {
            ExecutionError::Synthesis(err) => Some(err),
            _ => None,
        }
    }
}
