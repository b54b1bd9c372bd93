//! SQL dialect boundary
//!
//! Every dialect-specific token the statement builders emit goes through the
//! [`Dialect`] trait: identifier quoting, parameter placeholders, identity
//! retrieval, `OUTPUT` clauses, paging and row counts. [`SqlServerDialect`] is
//! the only shipped implementation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Type of the database-assigned key returned after a single-row insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedKeyKind {
    #[default]
    Integer,
    UniqueIdentifier,
}

#[derive(Debug, Error)]
#[error("Unknown generated key kind '{0}' (expected 'integer' or 'unique_identifier')")]
pub struct UnknownKeyKind(String);

impl FromStr for GeneratedKeyKind {
    type Err = UnknownKeyKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(GeneratedKeyKind::Integer),
            "unique_identifier" | "uniqueidentifier" | "uuid" | "guid" => {
                Ok(GeneratedKeyKind::UniqueIdentifier)
            }
            _ => Err(UnknownKeyKind(s.to_string())),
        }
    }
}

pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn placeholder(&self, parameter: &str) -> String {
        format!("@{}", parameter)
    }

    /// Always-quoted identifier
    fn quote_identifier(&self, ident: &str) -> String;

    /// Identifier as it should appear in generated SQL; quoted only when it is
    /// not a plain word.
    fn identifier(&self, ident: &str) -> String {
        if is_plain_identifier(ident) {
            ident.to_string()
        } else {
            self.quote_identifier(ident)
        }
    }

    /// Table reference; names that already carry quoting are kept verbatim.
    fn table(&self, table_name: &str) -> String;

    /// Statement appended after an INSERT to read back an integer identity
    fn scope_identity(&self) -> String;

    /// Clause placed between the column list and VALUES to return generated columns
    fn output_inserted(&self, columns: &[&str]) -> String;

    fn paging_clause(&self, skip_parameter: &str, next_parameter: &str) -> String;

    /// Statement appended after UPDATE/DELETE so the scalar primitive reports
    /// the affected row count
    fn affected_rows(&self) -> String;

    /// Inline SQL literal, used only when rendering statements for logs
    fn quote_literal(&self, value: &Value) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn table(&self, table_name: &str) -> String {
        if table_name.starts_with('[') {
            table_name.to_string()
        } else {
            self.identifier(table_name)
        }
    }

    fn scope_identity(&self) -> String {
        "SELECT CAST(SCOPE_IDENTITY() AS int)".to_string()
    }

    fn output_inserted(&self, columns: &[&str]) -> String {
        let inserted = columns
            .iter()
            .map(|c| format!("INSERTED.{}", self.identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OUTPUT {}", inserted)
    }

    fn paging_clause(&self, skip_parameter: &str, next_parameter: &str) -> String {
        format!(
            "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            self.placeholder(skip_parameter),
            self.placeholder(next_parameter)
        )
    }

    fn affected_rows(&self) -> String {
        "SELECT @@ROWCOUNT".to_string()
    }

    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::String(s) => format!("N'{}'", escape_string(s)),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Null => "NULL".to_string(),
            // Arrays and objects are bound as their JSON text
            other => format!("N'{}'", escape_string(&other.to_string())),
        }
    }
}

/// Escape a string for a T-SQL literal: single quotes are doubled, nothing else
/// is special inside `N'...'`.
fn escape_string(s: &str) -> String {
    s.replace('\'', "''")
}

/// Letters, digits and underscores, not starting with a digit
pub fn is_plain_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
