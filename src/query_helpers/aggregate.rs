//! Aggregate query rendering
//!
//! `select <fn>(<column|*>) as <alias>[,<group cols>] from <table>` with an
//! optional `group by` line.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::dialect::Dialect;
use crate::entity_catalog::{Entity, EntityMetadata};
use crate::errors::{SynthesisError, SynthesisResult};
use crate::join_predicate::FieldRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    CountBig,
    Sum,
    Min,
    Max,
    Avg,
    Var,
    Varp,
    Stdev,
    Stdevp,
}

impl AggregateFunction {
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::CountBig => "count_big",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Var => "var",
            AggregateFunction::Varp => "varp",
            AggregateFunction::Stdev => "stdev",
            AggregateFunction::Stdevp => "stdevp",
        }
    }

    /// Case-insensitive lookup by SQL name (`count_big`, `STDEVP`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        AGGREGATE_FUNCTIONS
            .get(name.trim().to_lowercase().as_str())
            .copied()
    }
}

impl FromStr for AggregateFunction {
    type Err = SynthesisError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_name(name).ok_or_else(|| SynthesisError::UnknownAggregateFunction {
            name: name.to_string(),
        })
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

lazy_static::lazy_static! {
    static ref AGGREGATE_FUNCTIONS: HashMap<&'static str, AggregateFunction> = {
        let mut m = HashMap::new();
        for function in [
            AggregateFunction::Count,
            AggregateFunction::CountBig,
            AggregateFunction::Sum,
            AggregateFunction::Min,
            AggregateFunction::Max,
            AggregateFunction::Avg,
            AggregateFunction::Var,
            AggregateFunction::Varp,
            AggregateFunction::Stdev,
            AggregateFunction::Stdevp,
        ] {
            m.insert(function.sql_name(), function);
        }
        m
    };
}

/// `count(*) as Value,CategoryID`
pub fn aggregate_expression(
    function: AggregateFunction,
    column: Option<&str>,
    group_columns: &[String],
    alias: &str,
) -> String {
    let mut expression = format!("{}({}) as {}", function, column.unwrap_or("*"), alias);
    if !group_columns.is_empty() {
        expression.push(',');
        expression.push_str(&group_columns.join(","));
    }
    expression
}

pub struct AggregateQuery<T> {
    function: AggregateFunction,
    column: Option<FieldRef<T>>,
    group_by: Vec<FieldRef<T>>,
    table: Option<String>,
    alias: Option<String>,
}

impl<T: Entity> AggregateQuery<T> {
    /// Aggregate over `*`
    pub fn new(function: AggregateFunction) -> Self {
        Self {
            function,
            column: None,
            group_by: Vec::new(),
            table: None,
            alias: None,
        }
    }

    pub fn column(mut self, column: FieldRef<T>) -> Self {
        self.column = Some(column);
        self
    }

    pub fn group_by(mut self, column: FieldRef<T>) -> Self {
        self.group_by.push(column);
        self
    }

    /// Overrides the entity's table
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Overrides the configured result alias
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn render(
        &self,
        metadata: &EntityMetadata,
        dialect: &dyn Dialect,
        default_alias: &str,
    ) -> SynthesisResult<String> {
        let column = match &self.column {
            Some(field) => Some(dialect.identifier(&field.resolve(metadata)?.column_name)),
            None => None,
        };
        let group_columns = self
            .group_by
            .iter()
            .map(|field| Ok(dialect.identifier(&field.resolve(metadata)?.column_name)))
            .collect::<SynthesisResult<Vec<_>>>()?;

        let alias = self.alias.as_deref().unwrap_or(default_alias);
        let table = match &self.table {
            Some(table) => dialect.table(table),
            None => dialect.table(&metadata.table_name),
        };

        let mut sql = format!(
            "select {} from {}",
            aggregate_expression(self.function, column.as_deref(), &group_columns, alias),
            table
        );
        if !group_columns.is_empty() {
            sql.push_str("\ngroup by ");
            sql.push_str(&group_columns.join(","));
        }

        log::debug!("Aggregate query: {}", sql.replace('\n', " "));
        Ok(sql)
    }
}
