//! Unit tests - synthesis without an executor
//!
//! Everything here runs against metadata and rendered SQL only.

#[path = "../common/mod.rs"]
mod common;

mod entity_catalog_tests;
mod statement_tests;
