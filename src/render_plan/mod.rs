//! Join graph assembly
//!
//! A join chain (ordered [`JoinSpec`]s plus optional [`JoinFilter`]s) is first
//! turned into a [`JoinPlan`]: aliased tables, the full select list and the
//! INNER JOIN fragments. The plan is then rendered through the template
//! builder into a [`QuerySelector`](crate::sql_builder::QuerySelector).

mod alias_table;
mod join_builder;

pub use alias_table::AliasTable;
pub use join_builder::{JoinFilter, JoinOrder, JoinQueryBuilder, JoinSpec};

use crate::sql_builder::{Parameters, QuerySelector, SqlBuilder};

pub trait ToSql {
    fn to_sql(&self) -> String;
}

/// `alias.column` in the select list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub table_alias: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub table_name: String,
    pub table_alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerJoin {
    pub table: TableRef,
    /// Alias of the already-joined table the condition points back to
    pub existing_alias: String,
    pub left_column: String,
    pub right_column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    pub select: Vec<SelectColumn>,
    pub from: TableRef,
    pub joins: Vec<InnerJoin>,
    /// Alias-qualified conditions, ANDed in order
    pub filters: Vec<String>,
    /// Alias-qualified ORDER BY terms
    pub order_by: Vec<String>,
    pub parameters: Parameters,
}

impl ToSql for SelectColumn {
    fn to_sql(&self) -> String {
        format!("{}.{}", self.table_alias, self.column)
    }
}

impl ToSql for TableRef {
    fn to_sql(&self) -> String {
        format!("{} {}", self.table_name, self.table_alias)
    }
}

impl ToSql for InnerJoin {
    fn to_sql(&self) -> String {
        format!(
            "{} ON {}.{} = {}.{}",
            self.table.to_sql(),
            self.existing_alias,
            self.left_column,
            self.table.table_alias,
            self.right_column
        )
    }
}

impl JoinPlan {
    pub fn template(&self) -> String {
        let columns = self
            .select
            .iter()
            .map(ToSql::to_sql)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {} FROM {} /**innerjoin**/ /**where**/ /**orderby**/",
            columns,
            self.from.to_sql()
        )
    }

    pub fn into_selector(self) -> QuerySelector {
        let template = self.template();
        let mut builder = SqlBuilder::new();
        for join in &self.joins {
            builder.inner_join(join.to_sql());
        }
        for filter in &self.filters {
            builder.and_where(filter.clone(), Parameters::new());
        }
        for term in &self.order_by {
            builder.order_by(term.clone());
        }
        builder
            .add_parameters(self.parameters)
            .column_sources(self.select.into_iter().map(|c| c.table_alias).collect());
        builder.render(&template)
    }
}
