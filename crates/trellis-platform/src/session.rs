use async_trait::async_trait;

use crate::error::PlatformError;

/// Identity and placement of the caller on the hosting platform.
#[async_trait]
pub trait PlatformSession: Send + Sync {
  /// The account identifier the session is authenticated as.
  async fn account_id(&self) -> Result<String, PlatformError>;

  /// The region the session operates in.
  fn region(&self) -> &str;
}
