use async_trait::async_trait;

use crate::error::PlatformError;

/// Region to endpoint-hostname resolution for the container registry.
#[async_trait]
pub trait EndpointResolver: Send + Sync {
  /// Resolve the container-registry hostname for the given region.
  async fn registry_hostname(&self, region: &str) -> Result<String, PlatformError>;
}

/// Endpoint resolver backed by the platform's standard DNS scheme.
///
/// Regions in the China partition use the `.com.cn` suffix.
#[derive(Debug, Clone, Default)]
pub struct StandardEndpoints;

#[async_trait]
impl EndpointResolver for StandardEndpoints {
  async fn registry_hostname(&self, region: &str) -> Result<String, PlatformError> {
    let suffix = if region.starts_with("cn-") {
      "amazonaws.com.cn"
    } else {
      "amazonaws.com"
    };
    Ok(format!("ecr.{}.{}", region, suffix))
  }
}
