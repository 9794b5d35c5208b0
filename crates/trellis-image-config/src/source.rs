use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::config::FrameworkConfig;
use crate::error::ConfigError;

/// Source of per-framework image configuration tables.
#[async_trait]
pub trait ConfigSource: Send + Sync {
  /// Load the configuration for the given framework name.
  async fn load(&self, framework: &str) -> Result<FrameworkConfig, ConfigError>;
}

/// Filesystem-backed configuration source.
///
/// Tables are stored one file per framework:
/// ```text
/// {root}/
/// ├── tensorflow.json
/// ├── pytorch.json
/// └── huggingface.json
/// ```
///
/// Files are re-read on every load; callers that resolve in a tight loop
/// can wrap the source with their own cache.
pub struct FsConfigSource {
  root: PathBuf,
}

impl FsConfigSource {
  /// Create a new filesystem source rooted at the given directory.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory of the source.
  pub fn root(&self) -> &Path {
    &self.root
  }
}

#[async_trait]
impl ConfigSource for FsConfigSource {
  async fn load(&self, framework: &str) -> Result<FrameworkConfig, ConfigError> {
    let path = self.root.join(format!("{}.json", framework));

    let content = match fs::read_to_string(&path).await {
      Ok(content) => content,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Err(ConfigError::UnknownFramework {
          framework: framework.to_string(),
        });
      }
      Err(err) => return Err(err.into()),
    };

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      framework: framework.to_string(),
      source,
    })
  }
}
