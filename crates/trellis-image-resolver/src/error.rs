use thiserror::Error;

use trellis_image_config::ConfigError;
use trellis_platform::PlatformError;

#[derive(Debug, Error)]
pub enum ResolveError {
  /// A supplied (or omitted-but-required) value is not in the set the
  /// configuration table declares for it.
  #[error(
    "unsupported {kind}: {}. supported {kind}s: {}",
    .value.as_deref().unwrap_or("none"),
    .options.join(", ")
  )]
  Unsupported {
    kind: String,
    value: Option<String>,
    options: Vec<String>,
  },

  #[error("training compiler images are only supported with the huggingface framework, got: {framework}")]
  UnsupportedTrainingCompiler { framework: String },

  #[error("invalid elastic inference accelerator type: {0}")]
  InvalidAcceleratorType(String),

  #[error("an instance type is required to choose between the supported processors")]
  MissingInstanceType,

  #[error("invalid instance type: {0}")]
  InvalidInstanceType(String),

  #[error("base framework version must start with pytorch or tensorflow, got: {0}")]
  MalformedBaseFramework(String),

  /// The configuration table itself breaks the documented shape.
  #[error("malformed image configuration: {0}")]
  MalformedConfig(String),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Platform(#[from] PlatformError),
}

impl ResolveError {
  pub(crate) fn unsupported(
    kind: impl Into<String>,
    value: Option<&str>,
    options: impl IntoIterator<Item = impl Into<String>>,
  ) -> Self {
    ResolveError::Unsupported {
      kind: kind.into(),
      value: value.map(str::to_string),
      options: options.into_iter().map(Into::into).collect(),
    }
  }
}
