//! # stacker-compose
//!
//! Turns compose templates into stack specifications.
//!
//! Handles:
//! - **Template**: The `$VAR` / `${VAR...}` substitution grammar and its
//!   substitution engine.
//! - **Properties**: Extraction of the variables a template references,
//!   with their defaults.
//! - **Config**: Parsing of raw documents and schema version detection.
//! - **Loader**: Interpolation, type casting, merging, and typed decoding.
//! - **Convert**: The two-phase parse/convert surface and its warnings.

pub mod config;
pub mod convert;
pub mod error;
pub mod loader;
pub mod properties;
pub mod template;

pub use convert::{Conversion, ConversionWarnings, StackConverter, StackSpec, parse_compose_input};
pub use error::{ComposeError, Result};
