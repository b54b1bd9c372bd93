use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::dialect::{Dialect, GeneratedKeyKind, SqlServerDialect};
use crate::entity_catalog::{Entity, MetadataCache};
use crate::errors::ExecutionError;
use crate::join_predicate::FieldRef;
use crate::materializer::{materialize, materialize_into, MaterializedRow, RowRecord};
use crate::query_helpers::{page_query, AggregateQuery, Page};
use crate::render_plan::{JoinFilter, JoinQueryBuilder, JoinSpec};
use crate::sql_builder::parameters::{interpolate, normalized};
use crate::sql_builder::{validate_parameters, Parameters, QuerySelector};
use crate::statement_generator::{
    batch_insert_statement, bind_parameters, check_batch_size, delete_statement,
    insert_statement, update_many_statement, update_statement,
};

use super::SqlExecutor;

static SQL_SERVER: SqlServerDialect = SqlServerDialect;

type SessionResult<T, E> = Result<T, ExecutionError<<E as SqlExecutor>::Error>>;

/// Synthesizes statements and runs them through one executor.
///
/// Holds only borrows; create one wherever an executor, a cache and a config
/// are at hand.
pub struct Session<'a, E: SqlExecutor> {
    executor: &'a E,
    cache: &'a MetadataCache,
    config: &'a EngineConfig,
    dialect: &'a dyn Dialect,
}

impl<'a, E: SqlExecutor> Session<'a, E> {
    pub fn new(executor: &'a E, cache: &'a MetadataCache, config: &'a EngineConfig) -> Self {
        Self {
            executor,
            cache,
            config,
            dialect: &SQL_SERVER,
        }
    }

    pub fn with_dialect(mut self, dialect: &'a dyn Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Join builder bound to this session's cache, dialect and join limit
    pub fn join_builder(&self) -> JoinQueryBuilder<'a> {
        JoinQueryBuilder::new(self.cache, self.dialect, self.config.max_join_tables)
    }

    /// Runs hand-written SQL; every `@name` in it must have a value.
    pub async fn query(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> SessionResult<Vec<MaterializedRow>, E> {
        let rows = self.fetch(sql, parameters).await?;
        Ok(rows.into_iter().map(|row| materialize(row, &[])).collect())
    }

    /// Runs a rendered selector, renaming duplicate columns after their source alias
    pub async fn query_selector(
        &self,
        selector: &QuerySelector,
    ) -> SessionResult<Vec<MaterializedRow>, E> {
        let rows = self.fetch(selector.raw_sql(), selector.parameters()).await?;
        Ok(rows
            .into_iter()
            .map(|row| materialize(row, selector.column_sources()))
            .collect())
    }

    pub async fn query_as<T>(&self, sql: &str, parameters: &Parameters) -> SessionResult<Vec<T>, E>
    where
        T: Entity + DeserializeOwned,
    {
        let metadata = self.cache.resolve::<T>();
        let rows = self.fetch(sql, parameters).await?;
        rows.into_iter()
            .map(|row| materialize_into::<T>(row, &metadata).map_err(ExecutionError::from))
            .collect()
    }

    pub async fn query_joined(
        &self,
        joins: Vec<JoinSpec>,
        filters: Vec<JoinFilter>,
    ) -> SessionResult<Vec<MaterializedRow>, E> {
        let selector = self.join_builder().joins(joins).filters(filters).build()?;
        self.query_selector(&selector).await
    }

    /// One page of `sql`, or `None` when the request cannot be paged
    /// (empty SQL, negative page number, non-positive page size).
    pub async fn get_page<T>(
        &self,
        sort_key: &FieldRef<T>,
        sql: &str,
        parameters: &Parameters,
        page: Page,
    ) -> SessionResult<Option<Vec<T>>, E>
    where
        T: Entity + DeserializeOwned,
    {
        let metadata = self.cache.resolve::<T>();
        let Some(selector) =
            page_query(sql, parameters, sort_key, page, &metadata, self.dialect)?
        else {
            log::debug!("Page request {:?} yields no query", page);
            return Ok(None);
        };

        let rows = self.fetch(selector.raw_sql(), selector.parameters()).await?;
        let records = rows
            .into_iter()
            .map(|row| materialize_into::<T>(row, &metadata))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(records))
    }

    pub async fn get_aggregate<T: Entity>(
        &self,
        query: &AggregateQuery<T>,
    ) -> SessionResult<Vec<MaterializedRow>, E> {
        let metadata = self.cache.resolve::<T>();
        let sql = query.render(&metadata, self.dialect, &self.config.aggregate_alias)?;
        self.query(&sql, &Parameters::new()).await
    }

    /// Inserts `entity` and returns the generated key, writing it back onto
    /// the entity when it has exactly one key column.
    pub async fn insert<T: Entity>(&self, entity: &mut T) -> SessionResult<Option<Value>, E> {
        self.insert_with_key_kind(entity, self.config.generated_key_kind).await
    }

    /// [`insert`](Self::insert) with the key retrieval chosen for this call
    /// instead of taken from the config
    pub async fn insert_with_key_kind<T: Entity>(
        &self,
        entity: &mut T,
        key_kind: GeneratedKeyKind,
    ) -> SessionResult<Option<Value>, E> {
        let metadata = self.cache.resolve::<T>();
        let statement = insert_statement(&metadata, self.dialect, key_kind)?;
        let parameters = bind_parameters(&*entity, &statement.bindings);

        let key = self
            .scalar(&statement.sql, &parameters)
            .await?
            .filter(|value| !value.is_null())
            .map(|value| statement.normalize_key(value));

        if let (Some(field), Some(value)) = (&statement.key_field, &key) {
            write_back(entity, field, value.clone());
        }
        Ok(key)
    }

    /// Inserts every row inside one batch scope and returns the keys that came
    /// back, in row order. Rows without a returned key are skipped.
    pub async fn insert_many<T: Entity>(&self, rows: &mut [T]) -> SessionResult<Vec<Value>, E> {
        self.insert_many_with_key_kind(rows, self.config.generated_key_kind).await
    }

    /// [`insert_many`](Self::insert_many) with the key kind chosen for this call
    pub async fn insert_many_with_key_kind<T: Entity>(
        &self,
        rows: &mut [T],
        key_kind: GeneratedKeyKind,
    ) -> SessionResult<Vec<Value>, E> {
        check_batch_size(rows.len(), self.config.max_batch_rows)?;
        let metadata = self.cache.resolve::<T>();
        let statement = batch_insert_statement(&metadata, self.dialect, key_kind)?;

        self.executor
            .begin_batch()
            .await
            .map_err(ExecutionError::Store)?;

        let mut keys = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter_mut().enumerate() {
            let parameters = bind_parameters(&*row, &statement.bindings);
            let key = match self.scalar(&statement.sql, &parameters).await {
                Ok(key) => key,
                Err(err) => {
                    self.rollback().await;
                    return Err(err);
                }
            };
            match (key, &statement.key_field) {
                (Some(value), Some(field)) if !value.is_null() => {
                    let value = statement.normalize_key(value);
                    write_back(row, field, value.clone());
                    keys.push(value);
                }
                _ => log::debug!("Row {} of batch insert returned no key", index),
            }
        }

        self.executor
            .commit_batch()
            .await
            .map_err(ExecutionError::Store)?;

        log::info!(
            "Inserted {} rows into {} ({} keys returned)",
            rows.len(),
            metadata.table_name,
            keys.len()
        );
        Ok(keys)
    }

    /// Updates `entity` by key; returns the affected row count
    pub async fn update<T: Entity>(&self, entity: &T) -> SessionResult<u64, E> {
        let metadata = self.cache.resolve::<T>();
        let statement = update_statement(&metadata, entity, self.dialect)?;
        let parameters = bind_parameters(entity, &statement.bindings);
        let affected = self.scalar(&statement.sql, &parameters).await?;
        Ok(affected_rows(affected))
    }

    /// Applies `properties_to_set` (column name → value) to every row, in one
    /// statement inside a batch scope; returns the affected row count
    pub async fn update_many<T: Entity>(
        &self,
        rows: &[T],
        properties_to_set: &Parameters,
    ) -> SessionResult<u64, E> {
        let metadata = self.cache.resolve::<T>();
        let statement = update_many_statement(
            &metadata,
            rows,
            properties_to_set,
            self.dialect,
            self.config.max_batch_rows,
        )?;

        self.executor
            .begin_batch()
            .await
            .map_err(ExecutionError::Store)?;
        let affected = match self.scalar(&statement.sql, &statement.parameters).await {
            Ok(affected) => affected_rows(affected),
            Err(err) => {
                self.rollback().await;
                return Err(err);
            }
        };
        self.executor
            .commit_batch()
            .await
            .map_err(ExecutionError::Store)?;

        log::info!(
            "Batch update of {} rows in {} affected {}",
            statement.rows,
            metadata.table_name,
            affected
        );
        Ok(affected)
    }

    pub async fn delete<T: Entity>(&self, entity: &T) -> SessionResult<u64, E> {
        let metadata = self.cache.resolve::<T>();
        let statement = delete_statement(&metadata, entity, self.dialect)?;
        let parameters = bind_parameters(entity, &statement.bindings);
        let affected = self.scalar(&statement.sql, &parameters).await?;
        Ok(affected_rows(affected))
    }

    fn prepare(&self, sql: &str, parameters: &Parameters) -> SessionResult<Parameters, E> {
        validate_parameters(sql, parameters)?;
        if self.config.log_statements {
            log::debug!(
                "SQL ({}): {}",
                self.dialect.name(),
                interpolate(sql, parameters, self.dialect)
            );
        } else {
            log::debug!("SQL ({}): {}", self.dialect.name(), sql);
        }
        Ok(normalized(parameters))
    }

    async fn fetch(&self, sql: &str, parameters: &Parameters) -> SessionResult<Vec<RowRecord>, E> {
        let parameters = self.prepare(sql, parameters)?;
        self.executor
            .query(sql, &parameters)
            .await
            .map_err(ExecutionError::Store)
    }

    async fn scalar(&self, sql: &str, parameters: &Parameters) -> SessionResult<Option<Value>, E> {
        let parameters = self.prepare(sql, parameters)?;
        self.executor
            .execute_scalar(sql, &parameters)
            .await
            .map_err(ExecutionError::Store)
    }

    async fn rollback(&self) {
        if let Err(err) = self.executor.rollback_batch().await {
            log::warn!("Rollback of failed batch also failed: {}", err);
        }
    }
}

/// Generated-key write-back never fails the insert
fn write_back<T: Entity>(entity: &mut T, field: &str, value: Value) {
    if let Err(err) = entity.set_field_value(field, value) {
        log::warn!("Could not write generated key back to '{}': {}", field, err);
    }
}

fn affected_rows(value: Option<Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|v| v.max(0) as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
