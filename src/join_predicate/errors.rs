use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredicateParseError {
    #[error("Unable to parse predicate at offset {position} (near '{near}')")]
    Syntax { position: usize, near: String },

    #[error("Unexpected trailing input after predicate: '{0}'")]
    TrailingInput(String),
}
