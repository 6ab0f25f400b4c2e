//! Shared utilities.
//!
//! Filesystem helpers for the working directories, and test doubles.

pub mod fs;

#[cfg(test)]
pub mod testutil;
