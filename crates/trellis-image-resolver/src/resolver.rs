use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{info, warn};

use trellis_image_config::{ConfigSource, ScopeConfig, VersionConfig};
use trellis_platform::EndpointResolver;

use crate::error::ResolveError;
use crate::spec::ImageSpec;

/// The one composite framework: its version table nests one level deeper by
/// base framework version, and only it publishes training-compiler images.
const HUGGING_FACE_FRAMEWORK: &str = "huggingface";

/// Spark images carry no interpreter runtime in their tag.
const SPARK_FRAMEWORK: &str = "spark";

/// Accelerator sentinel for notebooks running in local mode.
const LOCAL_NOTEBOOK_ACCELERATOR: &str = "local_notebook";

/// Repositories whose tag embeds the resolved framework version instead of
/// the caller-supplied one.
const COMPILER_REPOSITORIES: [&str; 2] = [
  "huggingface-pytorch-trcomp-training",
  "huggingface-tensorflow-trcomp-training",
];

/// Container-version corrections for images published before the tables
/// recorded one. Closed set, keyed by framework name and formatted tag.
const LEGACY_CONTAINER_VERSIONS: &[(&str, &str)] = &[
  ("tensorflow-2.3-gpu-py37", "cu110-ubuntu18.04-v3"),
  ("tensorflow-2.3.1-gpu-py37", "cu110-ubuntu18.04"),
  ("tensorflow-2.3.2-gpu-py37", "cu110-ubuntu18.04"),
  ("tensorflow-1.15-gpu-py37", "cu110-ubuntu18.04-v8"),
  ("tensorflow-1.15.4-gpu-py37", "cu110-ubuntu18.04"),
  ("tensorflow-1.15.5-gpu-py37", "cu110-ubuntu18.04"),
  ("mxnet-1.8-gpu-py37", "cu110-ubuntu16.04-v1"),
  ("mxnet-1.8.0-gpu-py37", "cu110-ubuntu16.04"),
  ("pytorch-1.6-gpu-py36", "cu110-ubuntu18.04-v3"),
  ("pytorch-1.6.0-gpu-py36", "cu110-ubuntu18.04"),
  ("pytorch-1.6-gpu-py3", "cu110-ubuntu18.04-v3"),
  ("pytorch-1.6.0-gpu-py3", "cu110-ubuntu18.04"),
];

/// Matches "ml.<family>.<size>" and "ml_<family>" instance types.
static INSTANCE_TYPE_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^ml[\._]([a-z\d]+)\.?\w*$").unwrap());

/// Splits a base framework version into framework name and version.
static BASE_FRAMEWORK_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(pytorch|tensorflow)(.*)$").unwrap());

/// Resolves an [`ImageSpec`] into a fully qualified container image URI.
#[async_trait]
pub trait ImageResolver: Send + Sync {
  /// Resolve the image URI matching the given spec.
  ///
  /// Resolution walks the framework's configuration table in a fixed order:
  /// scope, version, base framework (composite frameworks only), runtime
  /// version, registry, processor, tag.
  async fn resolve(&self, spec: &ImageSpec) -> Result<String, ResolveError>;
}

/// Standard resolver backed by a [`ConfigSource`] and an [`EndpointResolver`].
pub struct StandardResolver<S, E> {
  source: S,
  endpoints: E,
}

impl<S: ConfigSource, E: EndpointResolver> StandardResolver<S, E> {
  /// Create a new resolver over the given configuration tables and endpoint
  /// lookup.
  pub fn new(source: S, endpoints: E) -> Self {
    Self { source, endpoints }
  }

  /// Load the framework's configuration and narrow it to one scope.
  async fn scoped_config(&self, spec: &ImageSpec) -> Result<ScopeConfig, ResolveError> {
    let config_name = if !spec.training_compiler {
      spec.framework.clone()
    } else if spec.framework == HUGGING_FACE_FRAMEWORK {
      format!("{}-training-compiler", spec.framework)
    } else {
      return Err(ResolveError::UnsupportedTrainingCompiler {
        framework: spec.framework.clone(),
      });
    };

    let config = self.source.load(&config_name).await?;

    let mut image_scope = spec.image_scope.clone();
    if let Some(accelerator_type) = &spec.accelerator_type {
      validate_accelerator_type(accelerator_type)?;

      if !matches!(image_scope.as_deref(), Some("eia") | Some("inference")) {
        warn!(
          image_scope = image_scope.as_deref().unwrap_or("none"),
          "elastic inference images are inference-only, ignoring requested image scope"
        );
      }
      image_scope = Some("eia".to_string());
    }

    let available_scopes = config.available_scopes();

    if available_scopes.len() == 1 {
      if let Some(requested) = image_scope.as_deref()
        && requested != available_scopes[0]
      {
        warn!(
          requested,
          scope = %available_scopes[0],
          "defaulting to the only supported image scope"
        );
      }
      image_scope = Some(available_scopes[0].clone());
    }

    let scope_set: HashSet<&str> = available_scopes.iter().map(String::as_str).collect();
    if image_scope.is_none()
      && config.is_shared()
      && scope_set == HashSet::from(["training", "inference"])
    {
      info!(
        scope = %available_scopes[0],
        "same images are used for training and inference, defaulting image scope"
      );
      image_scope = Some(available_scopes[0].clone());
    }

    let scope = image_scope
      .as_deref()
      .filter(|scope| available_scopes.iter().any(|s| s == scope))
      .ok_or_else(|| {
        ResolveError::unsupported("image scope", image_scope.as_deref(), available_scopes.clone())
      })?;

    config
      .scope_config(scope)
      .cloned()
      .ok_or_else(|| ResolveError::MalformedConfig(format!("no table for scope {}", scope)))
  }
}

#[async_trait]
impl<S: ConfigSource, E: EndpointResolver> ImageResolver for StandardResolver<S, E> {
  async fn resolve(&self, spec: &ImageSpec) -> Result<String, ResolveError> {
    let config = self.scoped_config(spec).await?;

    let version = select_version(spec.version.as_deref(), &config, &spec.framework)?;
    let canonical_version = config.canonical_version(&version).to_string();
    let mut version_config = config
      .versions
      .get(&canonical_version)
      .cloned()
      .ok_or_else(|| {
        ResolveError::MalformedConfig(format!(
          "version alias {} points at missing version {}",
          version, canonical_version
        ))
      })?;

    if spec.framework == HUGGING_FACE_FRAMEWORK {
      version_config =
        select_base_framework(&version_config, spec.base_framework_version.as_deref())?;
    }

    let py_version = select_py_version(spec.py_version.as_deref(), &version_config, &spec.framework)?;

    if let Some(py) = py_version.as_deref() {
      let runtime_config = version_config
        .as_nested()
        .and_then(|nested| nested.get(py))
        .cloned();
      if let Some(runtime_config) = runtime_config {
        version_config = runtime_config;
      }
    }

    let image = version_config.as_leaf().ok_or_else(|| {
      ResolveError::MalformedConfig(format!(
        "no image entry for {} version {}",
        spec.framework, canonical_version
      ))
    })?;

    let registry = image
      .registries
      .get(&spec.region)
      .ok_or_else(|| {
        ResolveError::unsupported(
          "region",
          Some(spec.region.as_str()),
          image.registries.keys().cloned(),
        )
      })?
      .clone();

    let hostname = self.endpoints.registry_hostname(&spec.region).await?;

    let available_processors = if !config.processors.is_empty() {
      config.processors.clone()
    } else {
      image.processors.clone()
    };
    let processor = select_processor(spec.instance_type.as_deref(), &available_processors)?;

    // A per-processor container version in the table wins over the caller's.
    let mut container_version = spec.container_version.clone();
    if !image.container_version.is_empty() {
      let key = processor.as_deref().unwrap_or("none");
      container_version = Some(
        image
          .container_version
          .get(key)
          .cloned()
          .ok_or_else(|| {
            ResolveError::MalformedConfig(format!(
              "no container version for processor {} in {}",
              key, image.repository
            ))
          })?,
      );
    }

    let tag_prefix = if spec.framework == HUGGING_FACE_FRAMEWORK {
      let base = spec.base_framework_version.as_deref().unwrap_or_default();
      let captures = BASE_FRAMEWORK_PATTERN
        .captures(base)
        .ok_or_else(|| ResolveError::MalformedBaseFramework(base.to_string()))?;
      let base_version = captures[2].to_string();

      let transformers_version = if COMPILER_REPOSITORIES.contains(&image.repository.as_str()) {
        version.clone()
      } else {
        spec.version.clone().unwrap_or_else(|| version.clone())
      };
      format!("{}-transformers{}", base_version, transformers_version)
    } else {
      image.tag_prefix.clone().unwrap_or_else(|| version.clone())
    };

    let mut tag = format_tag(
      &tag_prefix,
      processor.as_deref(),
      py_version.as_deref(),
      container_version.as_deref(),
    );

    if should_auto_select_container_version(spec.instance_type.as_deref(), spec.distribution.as_ref())
    {
      let key = format!("{}-{}", spec.framework, tag);
      if let Some((_, suffix)) = LEGACY_CONTAINER_VERSIONS.iter().find(|(k, _)| *k == key) {
        tag = format!("{}-{}", tag, suffix);
      }
    }

    let mut repository = image.repository.clone();
    if !tag.is_empty() {
      repository = format!("{}:{}", repository, tag);
    }

    Ok(format!("{}.dkr.{}/{}", registry, hostname, repository))
  }
}

/// Check that the accelerator type is one the platform knows.
fn validate_accelerator_type(accelerator_type: &str) -> Result<(), ResolveError> {
  if accelerator_type.starts_with("ml.eia") || accelerator_type == LOCAL_NOTEBOOK_ACCELERATOR {
    Ok(())
  } else {
    Err(ResolveError::InvalidAcceleratorType(
      accelerator_type.to_string(),
    ))
  }
}

/// Pick the framework version, defaulting when the table leaves no choice.
fn select_version(
  version: Option<&str>,
  config: &ScopeConfig,
  framework: &str,
) -> Result<String, ResolveError> {
  let known_alias = version
    .map(|v| config.version_aliases.contains_key(v))
    .unwrap_or(false);

  let mut available = config.versions.keys();
  if let (Some(only), None) = (available.next(), available.next())
    && !known_alias
  {
    match version {
      Some(v) if v != only.as_str() => warn!(
        version = v,
        default = %only,
        "ignoring unsupported framework version, defaulting to the only supported one"
      ),
      None => info!(version = %only, "defaulting to the only supported framework version"),
      _ => {}
    }
    return Ok(only.clone());
  }

  let options: Vec<String> = config
    .versions
    .keys()
    .chain(config.version_aliases.keys())
    .cloned()
    .collect();

  match version {
    Some(v) if options.iter().any(|o| o == v) => Ok(v.to_string()),
    _ => Err(ResolveError::unsupported(
      format!("{} version", framework),
      version,
      options,
    )),
  }
}

/// Descend into the composite framework's base-framework level.
fn select_base_framework(
  version_config: &VersionConfig,
  base_framework_version: Option<&str>,
) -> Result<VersionConfig, ResolveError> {
  match version_config {
    VersionConfig::Nested(nested) => {
      let full_version = base_framework_version.map(|base| nested.canonical_key(base));
      match full_version.and_then(|v| nested.get(v)) {
        Some(config) => Ok(config.clone()),
        None => Err(ResolveError::unsupported(
          "base framework",
          full_version,
          nested.keys().cloned(),
        )),
      }
    }
    // No base-framework table at this level.
    VersionConfig::Leaf(_) => Ok(version_config.clone()),
  }
}

/// Pick the interpreter runtime version for the selected framework version.
fn select_py_version(
  py_version: Option<&str>,
  version_config: &VersionConfig,
  framework: &str,
) -> Result<Option<String>, ResolveError> {
  let available: Vec<String> = match version_config {
    VersionConfig::Leaf(image) => image.py_versions.clone(),
    VersionConfig::Nested(nested) => nested.keys().cloned().collect(),
  };

  if available.is_empty() {
    if let Some(py) = py_version {
      info!(py_version = py, "ignoring unnecessary runtime version");
    }
    return Ok(None);
  }

  // Spark tags never carry a runtime version.
  if py_version.is_none() && framework == SPARK_FRAMEWORK {
    return Ok(None);
  }

  if py_version.is_none() && available.len() == 1 {
    info!(py_version = %available[0], "defaulting to the only supported runtime version");
    return Ok(Some(available[0].clone()));
  }

  match py_version {
    Some(py) if available.iter().any(|a| a == py) => Ok(Some(py.to_string())),
    _ => Err(ResolveError::unsupported(
      "runtime version",
      py_version,
      available,
    )),
  }
}

/// Map the instance type to a processor family from the declared set.
fn select_processor(
  instance_type: Option<&str>,
  available: &[String],
) -> Result<Option<String>, ResolveError> {
  if available.is_empty() {
    if let Some(instance_type) = instance_type {
      info!(instance_type, "ignoring unnecessary instance type");
    }
    return Ok(None);
  }

  if available.len() == 1 && instance_type.is_none() {
    info!(processor = %available[0], "defaulting to the only supported processor");
    return Ok(Some(available[0].clone()));
  }

  let instance_type = instance_type.ok_or(ResolveError::MissingInstanceType)?;

  let processor = if instance_type.starts_with("local") {
    let family = if instance_type == "local" { "cpu" } else { "gpu" };
    family.to_string()
  } else {
    let family = INSTANCE_TYPE_PATTERN
      .captures(instance_type)
      .map(|captures| captures[1].to_string())
      .ok_or_else(|| ResolveError::InvalidInstanceType(instance_type.to_string()))?;

    // Optimized images exist for specific families (e.g. c5, p3) and use the
    // family name in the tag; everything else collapses to cpu/gpu/inf.
    if available.iter().any(|p| *p == family) {
      family
    } else if family.starts_with("inf") {
      "inf".to_string()
    } else if family.starts_with(['g', 'p']) {
      "gpu".to_string()
    } else {
      "cpu".to_string()
    }
  };

  if available.iter().any(|p| *p == processor) {
    Ok(Some(processor))
  } else {
    Err(ResolveError::unsupported(
      "processor",
      Some(processor.as_str()),
      available.to_vec(),
    ))
  }
}

/// Whether the legacy container-version correction table applies.
fn should_auto_select_container_version(
  instance_type: Option<&str>,
  distribution: Option<&serde_json::Map<String, Value>>,
) -> bool {
  let p4d = instance_type
    .and_then(|instance_type| INSTANCE_TYPE_PATTERN.captures(instance_type))
    .map(|captures| &captures[1] == "p4d")
    .unwrap_or(false);

  let smdistributed = distribution
    .map(|distribution| distribution.contains_key("smdistributed"))
    .unwrap_or(false);

  p4d || smdistributed
}

/// Join the non-empty tag parts in their fixed order.
fn format_tag(
  tag_prefix: &str,
  processor: Option<&str>,
  py_version: Option<&str>,
  container_version: Option<&str>,
) -> String {
  [Some(tag_prefix), processor, py_version, container_version]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("-")
}
