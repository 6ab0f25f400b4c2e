//! Lua runtime used for configuration and data documents.

pub mod convert;
pub mod runtime;
