use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use trellis_platform::{FunctionClient, PlatformError, PlatformSession};
use trellis_workflow::{CacheConfig, FunctionOutput, FunctionStep, OutputType, RequestMap, Step};

struct MockSession {
  account_id: String,
  region: String,
}

#[async_trait]
impl PlatformSession for MockSession {
  async fn account_id(&self) -> Result<String, PlatformError> {
    Ok(self.account_id.clone())
  }

  fn region(&self) -> &str {
    &self.region
  }
}

enum CreateBehavior {
  Succeed(String),
  Conflict,
  RawConflict,
  Fail(String),
}

/// Mock function client for testing.
struct MockFunction {
  name: String,
  arn: Option<String>,
  session: MockSession,
  behavior: CreateBehavior,
  create_calls: Arc<AtomicUsize>,
}

impl MockFunction {
  fn new(region: &str, behavior: CreateBehavior) -> (Self, Arc<AtomicUsize>) {
    let create_calls = Arc::new(AtomicUsize::new(0));
    let function = Self {
      name: "my-function".to_string(),
      arn: None,
      session: MockSession {
        account_id: "123456789012".to_string(),
        region: region.to_string(),
      },
      behavior,
      create_calls: create_calls.clone(),
    };
    (function, create_calls)
  }

  fn with_arn(mut self, arn: &str) -> Self {
    self.arn = Some(arn.to_string());
    self
  }
}

#[async_trait]
impl FunctionClient for MockFunction {
  fn function_name(&self) -> &str {
    &self.name
  }

  fn function_arn(&self) -> Option<&str> {
    self.arn.as_deref()
  }

  fn session(&self) -> &dyn PlatformSession {
    &self.session
  }

  async fn create(&self) -> Result<String, PlatformError> {
    self.create_calls.fetch_add(1, Ordering::SeqCst);
    match &self.behavior {
      CreateBehavior::Succeed(arn) => Ok(arn.clone()),
      CreateBehavior::Conflict => Err(PlatformError::ResourceConflict {
        name: self.name.clone(),
      }),
      CreateBehavior::RawConflict => Err(PlatformError::Api {
        message: "An error occurred (ResourceConflictException) when calling CreateFunction"
          .to_string(),
      }),
      CreateBehavior::Fail(message) => Err(PlatformError::Api {
        message: message.clone(),
      }),
    }
  }
}

fn inputs() -> RequestMap {
  let mut inputs = RequestMap::new();
  inputs.insert(
    "bucket".to_string(),
    Value::String("training-data".to_string()),
  );
  inputs
}

#[test]
fn test_outputs_become_properties_at_construction() {
  let (function, _) = MockFunction::new("us-west-2", CreateBehavior::Conflict);
  let step = FunctionStep::new(
    "process",
    function,
    RequestMap::new(),
    vec![
      FunctionOutput::new("A", OutputType::String),
      FunctionOutput::new("B", OutputType::Integer),
    ],
  );

  let expr = step.properties().output("A").unwrap().expr();
  assert_eq!(
    expr.get("Get").and_then(Value::as_str),
    Some("Steps.process.OutputParameters['A']")
  );
  assert_eq!(step.properties().root().path(), "Steps.process");
  assert!(step.properties().output("C").is_none());
}

#[test]
fn test_arguments_pass_through_verbatim() {
  let (function, _) = MockFunction::new("us-west-2", CreateBehavior::Conflict);
  let step = FunctionStep::new("process", function, inputs(), vec![]);

  assert_eq!(step.arguments(), inputs());
}

#[tokio::test]
async fn test_request_structure() {
  let (function, _) = MockFunction::new(
    "us-west-2",
    CreateBehavior::Succeed("arn:aws:lambda:us-west-2:123456789012:function:my-function".into()),
  );
  let step = FunctionStep::new(
    "process",
    function,
    inputs(),
    vec![
      FunctionOutput::new("B", OutputType::Boolean),
      FunctionOutput::new("A", OutputType::Float),
    ],
  )
  .with_display_name("Process data")
  .with_description("Runs the processing function")
  .with_depends_on(vec!["ingest".to_string()]);

  let request = step.to_request().await.unwrap();

  assert_eq!(request.get("Name").and_then(Value::as_str), Some("process"));
  assert_eq!(request.get("Type").and_then(Value::as_str), Some("Lambda"));
  assert_eq!(
    request.get("DisplayName").and_then(Value::as_str),
    Some("Process data")
  );
  assert_eq!(
    request.get("DependsOn"),
    Some(&Value::Array(vec![Value::String("ingest".to_string())]))
  );
  assert_eq!(
    request.get("Arguments").and_then(Value::as_object),
    Some(&inputs())
  );
  assert_eq!(
    request.get("FunctionArn").and_then(Value::as_str),
    Some("arn:aws:lambda:us-west-2:123456789012:function:my-function")
  );

  // One entry per declared output, in declaration order.
  let outputs = request
    .get("OutputParameters")
    .and_then(Value::as_array)
    .unwrap();
  assert_eq!(outputs.len(), 2);
  assert_eq!(
    outputs[0].get("OutputName").and_then(Value::as_str),
    Some("B")
  );
  assert_eq!(
    outputs[0].get("OutputType").and_then(Value::as_str),
    Some("Boolean")
  );
  assert_eq!(
    outputs[1].get("OutputName").and_then(Value::as_str),
    Some("A")
  );
}

#[tokio::test]
async fn test_optional_fields_omitted() {
  let (function, _) = MockFunction::new(
    "us-west-2",
    CreateBehavior::Succeed("arn:aws:lambda:us-west-2:123456789012:function:my-function".into()),
  );
  let step = FunctionStep::new("process", function, RequestMap::new(), vec![]);

  let request = step.to_request().await.unwrap();

  assert!(!request.contains_key("DisplayName"));
  assert!(!request.contains_key("Description"));
  assert!(!request.contains_key("DependsOn"));
  assert!(!request.contains_key("CacheConfig"));
}

#[tokio::test]
async fn test_cache_config_merged_into_request() {
  let (function, _) = MockFunction::new(
    "us-west-2",
    CreateBehavior::Succeed("arn:aws:lambda:us-west-2:123456789012:function:my-function".into()),
  );
  let step = FunctionStep::new("process", function, RequestMap::new(), vec![]).with_cache_config(
    CacheConfig {
      enable_caching: true,
      expire_after: Some("PT12H".to_string()),
    },
  );

  let request = step.to_request().await.unwrap();
  let cache = request.get("CacheConfig").and_then(Value::as_object).unwrap();
  assert_eq!(cache.get("Enabled"), Some(&Value::Bool(true)));
  assert_eq!(cache.get("ExpireAfter").and_then(Value::as_str), Some("PT12H"));
}

#[tokio::test]
async fn test_pre_provisioned_arn_skips_creation() {
  let (function, create_calls) = MockFunction::new("us-west-2", CreateBehavior::Conflict);
  let function = function.with_arn("arn:aws:lambda:us-west-2:123456789012:function:existing");
  let step = FunctionStep::new("process", function, RequestMap::new(), vec![]);

  let request = step.to_request().await.unwrap();

  assert_eq!(
    request.get("FunctionArn").and_then(Value::as_str),
    Some("arn:aws:lambda:us-west-2:123456789012:function:existing")
  );
  assert_eq!(create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_conflict_synthesizes_arn() {
  let (function, create_calls) = MockFunction::new("us-west-2", CreateBehavior::Conflict);
  let step = FunctionStep::new("process", function, RequestMap::new(), vec![]);

  let request = step.to_request().await.unwrap();

  assert_eq!(
    request.get("FunctionArn").and_then(Value::as_str),
    Some("arn:aws:lambda:us-west-2:123456789012:function:my-function")
  );
  assert_eq!(create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_raw_conflict_marker_synthesizes_arn() {
  let (function, _) = MockFunction::new("us-west-2", CreateBehavior::RawConflict);
  let step = FunctionStep::new("process", function, RequestMap::new(), vec![]);

  let request = step.to_request().await.unwrap();

  assert_eq!(
    request.get("FunctionArn").and_then(Value::as_str),
    Some("arn:aws:lambda:us-west-2:123456789012:function:my-function")
  );
}

#[tokio::test]
async fn test_china_region_uses_china_partition() {
  let (function, _) = MockFunction::new("cn-north-1", CreateBehavior::Conflict);
  let step = FunctionStep::new("process", function, RequestMap::new(), vec![]);

  let request = step.to_request().await.unwrap();

  assert_eq!(
    request.get("FunctionArn").and_then(Value::as_str),
    Some("arn:aws-cn:lambda:cn-north-1:123456789012:function:my-function")
  );
}

#[tokio::test]
async fn test_other_creation_failure_propagates() {
  let (function, _) = MockFunction::new(
    "us-west-2",
    CreateBehavior::Fail("AccessDeniedException: not authorized".to_string()),
  );
  let step = FunctionStep::new("process", function, RequestMap::new(), vec![]);

  let err = step.to_request().await.unwrap_err();
  assert!(err.to_string().contains("AccessDeniedException"));
}
