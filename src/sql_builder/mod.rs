//! Query template composition
//!
//! [`SqlBuilder`] fills the named insertion points of a base SQL string;
//! [`parameters`] owns the parameter map and placeholder checks shared by
//! every query path.

pub mod parameters;
mod template;

pub use parameters::{validate_parameters, Parameters};
pub use template::{
    QuerySelector, SqlBuilder, INNER_JOIN_PLACEHOLDER, ORDER_BY_PLACEHOLDER, WHERE_PLACEHOLDER,
};
