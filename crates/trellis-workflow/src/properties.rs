use std::collections::BTreeMap;

use serde_json::Value;

use crate::step::RequestMap;

/// A symbolic reference to a value that only exists once the pipeline runs.
///
/// Properties let downstream steps consume a step's not-yet-computed values
/// by path; the orchestration service substitutes the real value at
/// execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct Properties {
  path: String,
}

impl Properties {
  pub fn new(path: impl Into<String>) -> Self {
    Self { path: path.into() }
  }

  /// The reference path, e.g. `Steps.my-step.OutputParameters['foo']`.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// The `Get` expression the orchestration service resolves at runtime.
  pub fn expr(&self) -> RequestMap {
    let mut expr = RequestMap::new();
    expr.insert("Get".to_string(), Value::String(self.path.clone()));
    expr
  }
}

/// The referenceable properties of one step: its root path plus one entry
/// per declared output.
#[derive(Debug, Clone, PartialEq)]
pub struct StepProperties {
  root: Properties,
  outputs: BTreeMap<String, Properties>,
}

impl StepProperties {
  pub(crate) fn new(root: Properties, outputs: BTreeMap<String, Properties>) -> Self {
    Self { root, outputs }
  }

  /// The step's root reference, e.g. `Steps.my-step`.
  pub fn root(&self) -> &Properties {
    &self.root
  }

  /// The reference for one declared output.
  pub fn output(&self, name: &str) -> Option<&Properties> {
    self.outputs.get(name)
  }

  /// All output references, keyed by output name.
  pub fn outputs(&self) -> &BTreeMap<String, Properties> {
    &self.outputs
  }
}
