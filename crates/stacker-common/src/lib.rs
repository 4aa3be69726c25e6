//! # stacker-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire Stacker workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the request types that travel between the
//! compose loader and its callers.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
