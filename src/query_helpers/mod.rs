//! Paging, aggregate and LIKE helpers

pub mod aggregate;
pub mod like;
pub mod paging;

pub use aggregate::{aggregate_expression, AggregateFunction, AggregateQuery};
pub use like::{escape_like, like_parameter};
pub use paging::{page_query, Page, NEXT_PARAMETER, SKIP_PARAMETER};
