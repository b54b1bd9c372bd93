use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::dialect::Dialect;
use crate::entity_catalog::{Entity, EntityMetadata};
use crate::errors::SynthesisResult;
use crate::join_predicate::FieldRef;
use crate::sql_builder::{Parameters, QuerySelector};

pub const SKIP_PARAMETER: &str = "Skip";
pub const NEXT_PARAMETER: &str = "Next";

static ORDER_BY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\border\s+by\b").unwrap());

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
    pub ascending: bool,
}

impl Page {
    pub fn new(number: i64, size: i64) -> Self {
        Self {
            number,
            size,
            ascending: true,
        }
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.number >= 0 && self.size > 0
    }

    pub fn skip(&self) -> i64 {
        self.number.saturating_mul(self.size)
    }
}

/// Appends ordering and `OFFSET/FETCH` paging to `base_sql`.
///
/// Returns `Ok(None)` when there is nothing to page: empty SQL, a negative
/// page number or a non-positive page size. If the SQL already orders its
/// rows, `sort_key` is ignored.
pub fn page_query<T: Entity>(
    base_sql: &str,
    base_parameters: &Parameters,
    sort_key: &FieldRef<T>,
    page: Page,
    metadata: &EntityMetadata,
    dialect: &dyn Dialect,
) -> SynthesisResult<Option<QuerySelector>> {
    if base_sql.trim().is_empty() || !page.is_valid() {
        return Ok(None);
    }

    let mut sql = base_sql.trim_end().to_string();
    if !ORDER_BY_PATTERN.is_match(&sql) {
        let column = sort_key.resolve(metadata)?;
        sql.push_str(&format!(
            " ORDER BY {} {}",
            dialect.quote_identifier(&column.column_name),
            if page.ascending { "ASC" } else { "DESC" }
        ));
    }
    sql.push(' ');
    sql.push_str(&dialect.paging_clause(SKIP_PARAMETER, NEXT_PARAMETER));

    let mut parameters = base_parameters.clone();
    parameters.insert(SKIP_PARAMETER.to_string(), Value::from(page.skip()));
    parameters.insert(NEXT_PARAMETER.to_string(), Value::from(page.size));

    Ok(Some(QuerySelector::new(sql, parameters)))
}
