//! SQL utilities for domain-store
//!
//! Provides identifier validation and statement rendering for the MySQL
//! dialect subset the store emits.

pub mod ident;
pub mod render;

pub use ident::{MYSQL_RESERVED_WORDS, validate_identifier};
