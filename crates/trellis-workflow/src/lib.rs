//! Trellis Workflow
//!
//! This crate contains the pipeline step definitions for Trellis. A step is
//! a declarative descriptor the pipeline author constructs once; at
//! submission time each step serializes itself into the request structure
//! the orchestration service consumes.
//!
//! The one step type shipped here is [`FunctionStep`], which invokes a
//! serverless function: its inputs pass through verbatim, its declared
//! outputs become referenceable properties other steps can consume before
//! the pipeline runs, and the function itself is provisioned lazily when
//! the request structure is built.

mod error;
mod function_step;
mod properties;
mod step;

pub use error::StepError;
pub use function_step::{FunctionOutput, FunctionStep, OutputType};
pub use properties::{Properties, StepProperties};
pub use step::{CacheConfig, RequestMap, Step, StepType};
