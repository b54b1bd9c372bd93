use serde_json::Value;

use super::parameters::{normalize_name, Parameters};

pub const INNER_JOIN_PLACEHOLDER: &str = "/**innerjoin**/";
pub const WHERE_PLACEHOLDER: &str = "/**where**/";
pub const ORDER_BY_PLACEHOLDER: &str = "/**orderby**/";

/// Rendered statement plus the parameters it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySelector {
    raw_sql: String,
    parameters: Parameters,
    /// Owning table alias per select-list position; empty for hand-written SQL
    column_sources: Vec<String>,
}

impl QuerySelector {
    pub fn new(raw_sql: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            raw_sql: raw_sql.into(),
            parameters,
            column_sources: Vec::new(),
        }
    }

    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn column_sources(&self) -> &[String] {
        &self.column_sources
    }

    pub fn into_parts(self) -> (String, Parameters, Vec<String>) {
        (self.raw_sql, self.parameters, self.column_sources)
    }
}

/// Accumulates join, filter and ordering fragments and renders them into a
/// template containing `/**innerjoin**/`, `/**where**/` and `/**orderby**/`.
#[derive(Debug, Clone, Default)]
pub struct SqlBuilder {
    inner_joins: Vec<String>,
    wheres: Vec<String>,
    order_bys: Vec<String>,
    parameters: Parameters,
    column_sources: Vec<String>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `clause` is everything after `INNER JOIN`
    pub fn inner_join(&mut self, clause: impl Into<String>) -> &mut Self {
        self.inner_joins.push(clause.into());
        self
    }

    /// Adds a condition ANDed with the others, together with its parameters
    pub fn and_where(&mut self, clause: impl Into<String>, parameters: Parameters) -> &mut Self {
        self.wheres.push(clause.into());
        self.add_parameters(parameters)
    }

    pub fn order_by(&mut self, clause: impl Into<String>) -> &mut Self {
        self.order_bys.push(clause.into());
        self
    }

    /// Later values for the same name replace earlier ones
    pub fn add_parameter(&mut self, name: &str, value: Value) -> &mut Self {
        self.parameters
            .insert(normalize_name(name).to_string(), value);
        self
    }

    pub fn add_parameters(&mut self, parameters: Parameters) -> &mut Self {
        for (name, value) in parameters {
            self.add_parameter(&name, value);
        }
        self
    }

    pub fn column_sources(&mut self, sources: Vec<String>) -> &mut Self {
        self.column_sources = sources;
        self
    }

    pub fn render(&self, template: &str) -> QuerySelector {
        let joins = self
            .inner_joins
            .iter()
            .map(|j| format!("INNER JOIN {}", j))
            .collect::<Vec<_>>()
            .join(" ");
        let filter = if self.wheres.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.wheres.join(" AND "))
        };
        let ordering = if self.order_bys.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", self.order_bys.join(", "))
        };

        let sql = substitute(template, INNER_JOIN_PLACEHOLDER, &joins);
        let sql = substitute(&sql, WHERE_PLACEHOLDER, &filter);
        let sql = substitute(&sql, ORDER_BY_PLACEHOLDER, &ordering);

        log::debug!("Rendered template: {}", sql);

        QuerySelector {
            raw_sql: sql,
            parameters: self.parameters.clone(),
            column_sources: self.column_sources.clone(),
        }
    }
}

/// Replaces `placeholder` with `fragment`; an empty fragment also swallows
/// one leading space so no double blanks are left behind.
fn substitute(sql: &str, placeholder: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        let spaced = format!(" {}", placeholder);
        sql.replace(&spaced, "").replace(placeholder, "")
    } else {
        sql.replace(placeholder, fragment)
    }
}
