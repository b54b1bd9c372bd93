//! Execution boundary
//!
//! The engine never talks to a database itself. A client library is plugged in
//! by implementing [`SqlExecutor`]; [`Session`] then runs synthesized
//! statements through it and materializes the results.

mod session;

pub use session::Session;

use async_trait::async_trait;
use serde_json::Value;

use crate::materializer::RowRecord;
use crate::sql_builder::Parameters;

/// The two primitives the engine needs from a database client.
///
/// Parameter names arrive without the `@` sigil. Batch operations are wrapped
/// in `begin_batch`/`commit_batch`, with `rollback_batch` on the first
/// failure; clients without transactions can keep the no-op defaults.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a query and returns its rows in store column order
    async fn query(&self, sql: &str, parameters: &Parameters)
        -> Result<Vec<RowRecord>, Self::Error>;

    /// Runs a statement and returns the first column of the first row, if any
    async fn execute_scalar(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<Option<Value>, Self::Error>;

    async fn begin_batch(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn commit_batch(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn rollback_batch(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
