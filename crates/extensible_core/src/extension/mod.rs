//! Extension registry contracts.
//!
//! This module defines extension points, implementation declarations and the
//! in-process registry wiring them together. Registration is explicit: an
//! application registers every implementation once during startup, and
//! callers afterwards resolve implementations by name only.

pub mod descriptor;
pub mod global;
pub mod implementation;
pub mod registry;
