//! Parameter sets and placeholder validation
//!
//! Parameters are an ordered name→value map. Names are stored without the `@`
//! sigil; callers may supply either form and lookups normalise it away.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::dialect::Dialect;
use crate::errors::{SynthesisError, SynthesisResult};

/// Ordered parameter name → value map
pub type Parameters = Map<String, Value>;

/// Quoted literals and bracketed identifiers are matched so they can be skipped;
/// `@@name` is matched so system variables are not mistaken for parameters.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'(?:[^']|'')*'|\[[^\]]*\]|@@?[A-Za-z_][A-Za-z0-9_]*").unwrap()
});

/// Strips a leading `@` from a parameter name
pub fn normalize_name(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

/// Distinct `@name` placeholders in order of first appearance, without the sigil
pub fn placeholders(sql: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in PLACEHOLDER_PATTERN.find_iter(sql) {
        let token = m.as_str();
        if !token.starts_with('@') || token.starts_with("@@") {
            continue;
        }
        let name = &token[1..];
        if !found.iter().any(|f| f == name) {
            found.push(name.to_string());
        }
    }
    found
}

pub fn get_parameter<'p>(parameters: &'p Parameters, name: &str) -> Option<&'p Value> {
    let name = normalize_name(name);
    parameters
        .get(name)
        .or_else(|| parameters.get(&format!("@{}", name)))
}

/// Checks that every placeholder in `sql` has a value.
///
/// Supplied parameters that the SQL never references are tolerated and logged.
pub fn validate_parameters(sql: &str, parameters: &Parameters) -> SynthesisResult<()> {
    let referenced = placeholders(sql);

    if let Some(missing) = referenced
        .iter()
        .find(|name| get_parameter(parameters, name).is_none())
    {
        return Err(SynthesisError::MissingParameter(missing.clone()));
    }

    for key in parameters.keys() {
        let name = normalize_name(key);
        if !referenced.iter().any(|r| r == name) {
            log::warn!("Parameter '{}' is not referenced by the statement", key);
        }
    }

    Ok(())
}

/// Copy of `parameters` keyed by bare names, as handed to the executor
pub fn normalized(parameters: &Parameters) -> Parameters {
    parameters
        .iter()
        .map(|(k, v)| (normalize_name(k).to_string(), v.clone()))
        .collect()
}

/// Renders `sql` with every placeholder replaced by an inline literal.
///
/// For logs only. Placeholders without a value are left as they are.
pub fn interpolate(sql: &str, parameters: &Parameters, dialect: &dyn Dialect) -> String {
    let mut result = String::with_capacity(sql.len() * 2);
    let mut last = 0;
    for m in PLACEHOLDER_PATTERN.find_iter(sql) {
        let token = m.as_str();
        if !token.starts_with('@') || token.starts_with("@@") {
            continue;
        }
        if let Some(value) = get_parameter(parameters, token) {
            result.push_str(&sql[last..m.start()]);
            result.push_str(&dialect.quote_literal(value));
            last = m.end();
        }
    }
    result.push_str(&sql[last..]);
    result
}

/// Turns a column name into something usable as a parameter name
pub fn parameter_name(column: &str) -> String {
    let mut name: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) || name.is_empty() {
        name.insert(0, '_');
    }
    name
}
