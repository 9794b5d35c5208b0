use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use trellis_platform::{FunctionClient, function_arn, partition_for_region};

use crate::error::StepError;
use crate::properties::{Properties, StepProperties};
use crate::step::{CacheConfig, RequestMap, Step, StepType};

/// The type of a function step output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputType {
  #[default]
  String,
  Integer,
  Boolean,
  Float,
}

impl OutputType {
  pub fn as_str(&self) -> &'static str {
    match self {
      OutputType::String => "String",
      OutputType::Integer => "Integer",
      OutputType::Boolean => "Boolean",
      OutputType::Float => "Float",
    }
  }
}

/// One declared output of a function step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionOutput {
  pub output_name: String,
  #[serde(default)]
  pub output_type: OutputType,
}

impl FunctionOutput {
  pub fn new(output_name: impl Into<String>, output_type: OutputType) -> Self {
    Self {
      output_name: output_name.into(),
      output_type,
    }
  }

  /// Get the request structure for workflow service calls.
  pub fn to_request(&self) -> RequestMap {
    let mut request = RequestMap::new();
    request.insert(
      "OutputName".to_string(),
      Value::String(self.output_name.clone()),
    );
    request.insert(
      "OutputType".to_string(),
      Value::String(self.output_type.as_str().to_string()),
    );
    request
  }

  /// The `Get` expression referencing this output on the named step.
  pub fn expr(&self, step_name: &str) -> RequestMap {
    Properties::new(output_path(step_name, &self.output_name)).expr()
  }
}

fn output_path(step_name: &str, output_name: &str) -> String {
  format!("Steps.{}.OutputParameters['{}']", step_name, output_name)
}

/// A pipeline step that invokes a serverless function.
///
/// If the function already carries an identifier the step just invokes it;
/// otherwise the function is created when the pipeline request is built.
/// Inputs pass through to the function verbatim. Declared outputs become
/// referenceable properties at construction time, so downstream steps can
/// consume them before the pipeline runs.
pub struct FunctionStep<F> {
  name: String,
  display_name: Option<String>,
  description: Option<String>,
  function: F,
  inputs: RequestMap,
  outputs: Vec<FunctionOutput>,
  cache_config: Option<CacheConfig>,
  depends_on: Vec<String>,
  properties: StepProperties,
}

impl<F: FunctionClient> FunctionStep<F> {
  /// Construct a function step.
  ///
  /// Inputs are the arguments handed to the function at execution time;
  /// outputs declare the values the function's result exposes to the rest
  /// of the pipeline.
  pub fn new(
    name: impl Into<String>,
    function: F,
    inputs: RequestMap,
    outputs: Vec<FunctionOutput>,
  ) -> Self {
    let name = name.into();

    let root = Properties::new(format!("Steps.{}", name));
    let output_properties: BTreeMap<String, Properties> = outputs
      .iter()
      .map(|output| {
        (
          output.output_name.clone(),
          Properties::new(output_path(&name, &output.output_name)),
        )
      })
      .collect();

    Self {
      name,
      display_name: None,
      description: None,
      function,
      inputs,
      outputs,
      cache_config: None,
      depends_on: Vec::new(),
      properties: StepProperties::new(root, output_properties),
    }
  }

  pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
    self.display_name = Some(display_name.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_cache_config(mut self, cache_config: CacheConfig) -> Self {
    self.cache_config = Some(cache_config);
    self
  }

  pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
    self.depends_on = depends_on;
    self
  }

  /// The referenceable properties of this step.
  pub fn properties(&self) -> &StepProperties {
    &self.properties
  }

  pub fn outputs(&self) -> &[FunctionOutput] {
    &self.outputs
  }

  /// Resolve the function's identifier, provisioning it if necessary.
  ///
  /// A pre-provisioned identifier is returned unchanged. Otherwise the
  /// function is created; a naming conflict means it already exists, so the
  /// identifier is synthesized from the session's coordinates instead.
  async fn resolve_function_arn(&self) -> Result<String, StepError> {
    let session = self.function.session();
    let region = session.region().to_string();
    let partition = partition_for_region(&region);

    if let Some(arn) = self.function.function_arn() {
      return Ok(arn.to_string());
    }

    let account_id = session.account_id().await?;
    match self.function.create().await {
      Ok(arn) => Ok(arn),
      Err(err) if err.is_conflict() => Ok(function_arn(
        partition,
        &region,
        &account_id,
        self.function.function_name(),
      )),
      Err(err) => Err(err.into()),
    }
  }
}

#[async_trait]
impl<F: FunctionClient> Step for FunctionStep<F> {
  fn name(&self) -> &str {
    &self.name
  }

  fn display_name(&self) -> Option<&str> {
    self.display_name.as_deref()
  }

  fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  fn step_type(&self) -> StepType {
    StepType::Lambda
  }

  fn depends_on(&self) -> &[String] {
    &self.depends_on
  }

  fn arguments(&self) -> RequestMap {
    self.inputs.clone()
  }

  async fn to_request(&self) -> Result<RequestMap, StepError> {
    let mut request = self.base_request();

    if let Some(cache_config) = &self.cache_config {
      request.extend(cache_config.config());
    }

    request.insert(
      "FunctionArn".to_string(),
      Value::String(self.resolve_function_arn().await?),
    );

    request.insert(
      "OutputParameters".to_string(),
      Value::Array(
        self
          .outputs
          .iter()
          .map(|output| Value::Object(output.to_request()))
          .collect(),
      ),
    );

    Ok(request)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_output_request_structure() {
    let output = FunctionOutput::new("count", OutputType::Integer);
    let request = output.to_request();
    assert_eq!(
      request.get("OutputName").and_then(Value::as_str),
      Some("count")
    );
    assert_eq!(
      request.get("OutputType").and_then(Value::as_str),
      Some("Integer")
    );
  }

  #[test]
  fn test_output_type_defaults_to_string() {
    let output: FunctionOutput =
      serde_json::from_value(serde_json::json!({"output_name": "status"})).unwrap();
    assert_eq!(output.output_type, OutputType::String);
  }

  #[test]
  fn test_output_expr() {
    let output = FunctionOutput::new("status", OutputType::String);
    let expr = output.expr("ingest");
    assert_eq!(
      expr.get("Get").and_then(Value::as_str),
      Some("Steps.ingest.OutputParameters['status']")
    );
  }
}
