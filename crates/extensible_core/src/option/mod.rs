//! Extension option schema and coercion.
//!
//! # Responsibility
//! - Declare typed constructor parameters of extension implementations.
//! - Convert raw option mappings (often text) into typed values.
//!
//! # Invariants
//! - Option types form a fixed set: `string`, `int`, `float`, `bool`.
//! - An option is required iff it declares no default.

pub mod coerce;
pub mod spec;
pub mod value;
