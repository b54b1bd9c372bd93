use serde_json::Value;

use crate::sql_builder::parameters::normalize_name;
use crate::sql_builder::Parameters;

/// Contains-pattern for a LIKE comparison with the term's own metacharacters
/// escaped. `[` goes first so the brackets added for `%` and `_` are not
/// escaped again.
///
/// Returns `None` for an empty term.
pub fn escape_like(term: &str) -> Option<String> {
    if term.is_empty() {
        return None;
    }
    let escaped = term
        .replace('[', "[[]")
        .replace('%', "[%]")
        .replace('_', "[_]");
    Some(format!("%{}%", escaped))
}

/// Single-entry parameter set binding `name` to the escaped pattern of
/// `term`, or to NULL (matching nothing) when the term is empty.
pub fn like_parameter(name: &str, term: &str) -> Parameters {
    let value = escape_like(term).map(Value::String).unwrap_or(Value::Null);
    let mut parameters = Parameters::new();
    parameters.insert(normalize_name(name).to_string(), value);
    parameters
}
