//! Trellis Image Resolver
//!
//! Resolves symbolic framework/version/instance-type requests into fully
//! qualified container image URIs for the platform's pre-built images.
//!
//! Resolution is a deterministic walk over the per-framework configuration
//! tables from `trellis-image-config`: select a scope, a version, an
//! interpreter runtime, and a processor family, then assemble
//! `{registry}.dkr.{hostname}/{repository}:{tag}`. Every rejection names the
//! offending value and the full set of valid options.

mod error;
mod resolver;
mod spec;

pub use error::ResolveError;
pub use resolver::{ImageResolver, StandardResolver};
pub use spec::ImageSpec;
