use async_trait::async_trait;
use serde_json::Value;

use crate::error::StepError;

/// The request structure the orchestration service consumes, one JSON object
/// per step.
pub type RequestMap = serde_json::Map<String, Value>;

/// The orchestration service's step type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
  /// A step that invokes a serverless function.
  Lambda,
}

impl StepType {
  pub fn as_str(&self) -> &'static str {
    match self {
      StepType::Lambda => "Lambda",
    }
  }
}

/// Caching configuration for a step.
///
/// When enabled, the orchestration service reuses the result of a previous
/// execution with the same arguments instead of re-running the step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheConfig {
  pub enable_caching: bool,
  /// How long a cached result stays valid, as an ISO 8601 duration string.
  /// Passed through verbatim.
  pub expire_after: Option<String>,
}

impl CacheConfig {
  /// The request fields to merge into the owning step's request structure.
  pub fn config(&self) -> RequestMap {
    let mut cache = RequestMap::new();
    cache.insert("Enabled".to_string(), Value::Bool(self.enable_caching));
    if let Some(expire_after) = &self.expire_after {
      cache.insert(
        "ExpireAfter".to_string(),
        Value::String(expire_after.clone()),
      );
    }

    let mut config = RequestMap::new();
    config.insert("CacheConfig".to_string(), Value::Object(cache));
    config
  }
}

/// A pipeline step.
///
/// Implementations describe one unit of work; the pipeline serializes each
/// step via [`Step::to_request`] at submission time.
#[async_trait]
pub trait Step: Send + Sync {
  /// The step name, unique within its pipeline.
  fn name(&self) -> &str;

  /// Optional display name for the pipeline UI.
  fn display_name(&self) -> Option<&str>;

  /// Optional human-readable description.
  fn description(&self) -> Option<&str>;

  fn step_type(&self) -> StepType;

  /// Names of the steps that must complete before this one starts.
  fn depends_on(&self) -> &[String];

  /// The arguments passed to the step's work at execution time.
  fn arguments(&self) -> RequestMap;

  /// Build the request structure for the orchestration service.
  async fn to_request(&self) -> Result<RequestMap, StepError>;

  /// The request fields shared by every step type. Optional fields are
  /// omitted entirely when absent.
  fn base_request(&self) -> RequestMap {
    let mut request = RequestMap::new();
    request.insert(
      "Name".to_string(),
      Value::String(self.name().to_string()),
    );
    request.insert(
      "Type".to_string(),
      Value::String(self.step_type().as_str().to_string()),
    );
    request.insert("Arguments".to_string(), Value::Object(self.arguments()));

    if let Some(display_name) = self.display_name() {
      request.insert(
        "DisplayName".to_string(),
        Value::String(display_name.to_string()),
      );
    }
    if let Some(description) = self.description() {
      request.insert(
        "Description".to_string(),
        Value::String(description.to_string()),
      );
    }
    if !self.depends_on().is_empty() {
      request.insert(
        "DependsOn".to_string(),
        Value::Array(
          self
            .depends_on()
            .iter()
            .map(|name| Value::String(name.clone()))
            .collect(),
        ),
      );
    }

    request
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_config_with_expiry() {
    let cache = CacheConfig {
      enable_caching: true,
      expire_after: Some("P30D".to_string()),
    };

    let config = cache.config();
    let inner = config.get("CacheConfig").and_then(Value::as_object).unwrap();
    assert_eq!(inner.get("Enabled"), Some(&Value::Bool(true)));
    assert_eq!(
      inner.get("ExpireAfter").and_then(Value::as_str),
      Some("P30D")
    );
  }

  #[test]
  fn test_cache_config_omits_unset_expiry() {
    let cache = CacheConfig::default();

    let config = cache.config();
    let inner = config.get("CacheConfig").and_then(Value::as_object).unwrap();
    assert_eq!(inner.get("Enabled"), Some(&Value::Bool(false)));
    assert!(!inner.contains_key("ExpireAfter"));
  }
}
