//! confab-lib: Core types and logic for confab
//!
//! This crate provides the pieces that turn an environment definition into
//! configuration files on remote hosts:
//! - `resolve`: which hosts play which roles
//! - `data`: layered configuration data per (host, role, component)
//! - `conffile`: rendering, pulling, diffing and pushing individual files
//! - `sync`: the pull/generate/diff/confirm/push pipeline across hosts

pub mod conffile;
pub mod consts;
pub mod data;
pub mod lua;
pub mod mime;
pub mod remote;
pub mod resolve;
pub mod settings;
pub mod sync;
pub mod template;
pub mod util;
