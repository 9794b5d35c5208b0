use serde_json::Value;

/// A request for a pre-built framework image.
///
/// Only `framework` and `region` are always required; the other fields are
/// required exactly when the framework's configuration table offers more
/// than one choice for them.
#[derive(Debug, Clone, Default)]
pub struct ImageSpec {
  /// The name of the framework or algorithm.
  pub framework: String,

  /// The region to pull the image from.
  pub region: String,

  /// The framework or algorithm version. Required if there is more than one
  /// supported version for the given framework.
  pub version: Option<String>,

  /// The interpreter runtime version (e.g. "py38"). Required if there is
  /// more than one supported runtime for the given framework version.
  pub py_version: Option<String>,

  /// The instance type the image will run on. Required if there are
  /// different images for different processor families.
  pub instance_type: Option<String>,

  /// Elastic inference accelerator type. Forces the image scope to `eia`.
  pub accelerator_type: Option<String>,

  /// What the image is used for: "training", "inference", or "eia".
  pub image_scope: Option<String>,

  /// The container version of the image. Overridden when the configuration
  /// table declares one per processor.
  pub container_version: Option<String>,

  /// Distributed-training configuration, passed through opaquely. Only its
  /// keys influence resolution.
  pub distribution: Option<serde_json::Map<String, Value>>,

  /// The base framework version for composite frameworks
  /// (e.g. "pytorch1.9.1").
  pub base_framework_version: Option<String>,

  /// Whether the image must bundle the training compiler. Only the
  /// composite framework supports this.
  pub training_compiler: bool,
}
