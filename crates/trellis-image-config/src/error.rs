use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("no image configuration for framework: {framework}")]
  UnknownFramework { framework: String },

  #[error("failed to read image configuration: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid image configuration for framework {framework}: {source}")]
  Parse {
    framework: String,
    source: serde_json::Error,
  },
}
