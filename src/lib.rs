//! sqlsynth - SQL statement synthesis from typed entity descriptions
//!
//! This crate turns entity descriptions and declarative expressions into
//! parameterized SQL:
//! - Multi-table INNER JOIN chains from equality predicates
//! - Paged reads and aggregate queries
//! - Single and batch INSERT / UPDATE / DELETE with generated-key retrieval
//! - Result rows with deterministic handling of duplicate column names
//!
//! Statements are executed through a caller-supplied [`SqlExecutor`].

// Re-exported for `impl_entity!`
pub use serde_json;

pub mod config;
pub mod dialect;
pub mod entity_catalog;
pub mod errors;
pub mod executor;
pub mod join_predicate;
pub mod materializer;
pub mod query_helpers;
pub mod render_plan;
pub mod sql_builder;
pub mod statement_generator;

pub use config::{ConfigError, EngineConfig};
pub use dialect::{Dialect, GeneratedKeyKind, SqlServerDialect};
pub use entity_catalog::{Entity, EntityMetadata, EntityType, MetadataCache};
pub use errors::{ExecutionError, SynthesisError, SynthesisResult};
pub use executor::{Session, SqlExecutor};
pub use join_predicate::{FieldRef, JoinPredicate};
pub use materializer::{MaterializedRow, RowRecord};
pub use render_plan::{JoinFilter, JoinOrder, JoinSpec};
pub use sql_builder::{Parameters, QuerySelector, SqlBuilder};
