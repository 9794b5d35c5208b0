use async_trait::async_trait;

use crate::error::PlatformError;
use crate::session::PlatformSession;

/// Client for a single serverless function on the hosting platform.
///
/// The function may already exist (in which case [`FunctionClient::function_arn`]
/// carries its identifier) or be created on demand via [`FunctionClient::create`].
#[async_trait]
pub trait FunctionClient: Send + Sync {
  /// The function's name.
  fn function_name(&self) -> &str;

  /// The function's identifier, if it is already provisioned.
  fn function_arn(&self) -> Option<&str>;

  /// The session the client calls the platform with.
  fn session(&self) -> &dyn PlatformSession;

  /// Create the function, returning the identifier issued by the platform.
  async fn create(&self) -> Result<String, PlatformError>;
}

/// Map a region to its cloud partition.
pub fn partition_for_region(region: &str) -> &'static str {
  let region = region.to_ascii_lowercase();
  if region == "cn-north-1" || region == "cn-northwest-1" {
    "aws-cn"
  } else {
    "aws"
  }
}

/// Build a function identifier from its coordinates.
pub fn function_arn(partition: &str, region: &str, account_id: &str, name: &str) -> String {
  format!(
    "arn:{}:lambda:{}:{}:function:{}",
    partition, region, account_id, name
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partition_for_china_regions() {
    assert_eq!(partition_for_region("cn-north-1"), "aws-cn");
    assert_eq!(partition_for_region("cn-northwest-1"), "aws-cn");
    assert_eq!(partition_for_region("CN-NORTH-1"), "aws-cn");
  }

  #[test]
  fn test_partition_for_other_regions() {
    assert_eq!(partition_for_region("us-east-1"), "aws");
    assert_eq!(partition_for_region("eu-west-1"), "aws");
  }

  #[test]
  fn test_function_arn_format() {
    assert_eq!(
      function_arn("aws", "us-west-2", "123456789012", "ingest"),
      "arn:aws:lambda:us-west-2:123456789012:function:ingest"
    );
  }
}
