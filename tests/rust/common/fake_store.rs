//! In-memory executor
//!
//! Serves a 77-row Products table for paged queries, replays queued results
//! for everything else and records every statement it receives.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlsynth::{Parameters, RowRecord, SqlExecutor};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FakeStoreError {
    #[error("fake store failure: {0}")]
    Failure(String),
}

#[derive(Default)]
pub struct FakeStore {
    products: Vec<RowRecord>,
    statements: Mutex<Vec<(String, Parameters)>>,
    queued_rows: Mutex<VecDeque<Vec<RowRecord>>>,
    queued_scalars: Mutex<VecDeque<Result<Option<Value>, FakeStoreError>>>,
    batch_events: Mutex<Vec<&'static str>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose Products table holds ids 1..=77
    pub fn northwind() -> Self {
        let products = (1..=77)
            .map(|id| {
                vec![
                    ("ProductID".to_string(), json!(id)),
                    ("ProductName".to_string(), json!(format!("Product {}", id))),
                    ("SupplierID".to_string(), json!(1 + id % 29)),
                    ("CategoryID".to_string(), json!(1 + id % 8)),
                    ("UnitPrice".to_string(), json!(10.0 + id as f64)),
                    ("Discontinued".to_string(), json!(id % 10 == 0)),
                ]
            })
            .collect();
        Self {
            products,
            ..Default::default()
        }
    }

    pub fn queue_rows(&self, rows: Vec<RowRecord>) {
        self.queued_rows.lock().unwrap().push_back(rows);
    }

    pub fn queue_scalar(&self, result: Result<Option<Value>, FakeStoreError>) {
        self.queued_scalars.lock().unwrap().push_back(result);
    }

    pub fn statements(&self) -> Vec<(String, Parameters)> {
        self.statements.lock().unwrap().clone()
    }

    pub fn batch_events(&self) -> Vec<&'static str> {
        self.batch_events.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, parameters: &Parameters) {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), parameters.clone()));
    }

    fn page(&self, sql: &str, parameters: &Parameters) -> Vec<RowRecord> {
        let skip = parameters.get("Skip").and_then(Value::as_u64).unwrap_or(0) as usize;
        let next = parameters
            .get("Next")
            .and_then(Value::as_u64)
            .unwrap_or(u64::MAX) as usize;
        let mut rows = self.products.clone();
        if sql.contains("DESC") {
            rows.reverse();
        }
        rows.into_iter().skip(skip).take(next).collect()
    }
}

#[async_trait]
impl SqlExecutor for FakeStore {
    type Error = FakeStoreError;

    async fn query(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<Vec<RowRecord>, FakeStoreError> {
        self.record(sql, parameters);
        if let Some(rows) = self.queued_rows.lock().unwrap().pop_front() {
            return Ok(rows);
        }
        Ok(self.page(sql, parameters))
    }

    async fn execute_scalar(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<Option<Value>, FakeStoreError> {
        self.record(sql, parameters);
        self.queued_scalars
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Some(json!(1))))
    }

    async fn begin_batch(&self) -> Result<(), FakeStoreError> {
        self.batch_events.lock().unwrap().push("begin");
        Ok(())
    }

    async fn commit_batch(&self) -> Result<(), FakeStoreError> {
        self.batch_events.lock().unwrap().push("commit");
        Ok(())
    }

    async fn rollback_batch(&self) -> Result<(), FakeStoreError> {
        self.batch_events.lock().unwrap().push("rollback");
        Ok(())
    }
}
