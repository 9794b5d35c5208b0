//! Trellis Image Config
//!
//! This crate contains the data model for the per-framework container image
//! configuration tables, plus the [`ConfigSource`] seam for loading them.
//!
//! Each framework ships one JSON file describing which scopes, versions,
//! interpreter runtimes, processors, and regional registries its pre-built
//! images cover. The tables are externally maintained and read-only; the
//! resolver in `trellis-image-resolver` walks them to produce image URIs.

mod config;
mod error;
mod source;

pub use config::{
  FrameworkConfig, ImageConfig, NestedConfig, ScopeConfig, SharedConfig, VersionConfig,
};
pub use error::ConfigError;
pub use source::{ConfigSource, FsConfigSource};
