//! Trellis Platform
//!
//! This crate holds the seams between Trellis and the hosting platform's web
//! API. Everything the SDK needs from the platform is expressed as a trait:
//!
//! - [`PlatformSession`] - account identity and region for the caller
//! - [`EndpointResolver`] - region to container-registry hostname lookup
//! - [`FunctionClient`] - serverless function provisioning
//!
//! Production impls wrap the platform's service clients; tests substitute
//! in-memory fakes. None of the traits promise retries or concurrent reuse.

mod endpoints;
mod error;
mod function;
mod session;

pub use endpoints::{EndpointResolver, StandardEndpoints};
pub use error::{CONFLICT_MARKER, PlatformError};
pub use function::{FunctionClient, function_arn, partition_for_region};
pub use session::PlatformSession;
