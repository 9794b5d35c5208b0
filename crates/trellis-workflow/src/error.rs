use thiserror::Error;

use trellis_platform::PlatformError;

#[derive(Debug, Error)]
pub enum StepError {
  #[error(transparent)]
  Platform(#[from] PlatformError),
}
