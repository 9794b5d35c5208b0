use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level shape of a framework's image configuration file.
///
/// Frameworks either publish distinct tables per image scope (training,
/// inference, eia) or a single table shared across scopes. Shared files
/// carry a `scope` array naming the scopes they serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameworkConfig {
  Shared(SharedConfig),
  PerScope(BTreeMap<String, ScopeConfig>),
}

impl FrameworkConfig {
  /// The scopes this configuration covers, as declared in the file.
  pub fn available_scopes(&self) -> Vec<String> {
    match self {
      FrameworkConfig::Shared(shared) => shared.scope.clone(),
      FrameworkConfig::PerScope(scopes) => scopes.keys().cloned().collect(),
    }
  }

  /// Whether one table is shared across all scopes.
  pub fn is_shared(&self) -> bool {
    matches!(self, FrameworkConfig::Shared(_))
  }

  /// The table for the given scope. Shared configurations return their
  /// single table regardless of the scope asked for.
  pub fn scope_config(&self, scope: &str) -> Option<&ScopeConfig> {
    match self {
      FrameworkConfig::Shared(shared) => Some(&shared.config),
      FrameworkConfig::PerScope(scopes) => scopes.get(scope),
    }
  }
}

/// A scope-independent configuration: one version table serving the scopes
/// listed in `scope`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
  pub scope: Vec<String>,
  #[serde(flatten)]
  pub config: ScopeConfig,
}

/// The version table for one image scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeConfig {
  pub versions: BTreeMap<String, VersionConfig>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub version_aliases: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub processors: Vec<String>,
}

impl ScopeConfig {
  /// Resolve a version alias to its canonical version, leaving unaliased
  /// values unchanged.
  pub fn canonical_version<'a>(&'a self, version: &'a str) -> &'a str {
    self
      .version_aliases
      .get(version)
      .map(String::as_str)
      .unwrap_or(version)
  }
}

/// One level of the version table.
///
/// A version either maps directly to an image ([`VersionConfig::Leaf`]) or
/// nests one level deeper ([`VersionConfig::Nested`]) - by base framework
/// version for composite frameworks, or by interpreter runtime version.
/// Deserialization discriminates on the presence of the `repository` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionConfig {
  Leaf(ImageConfig),
  Nested(NestedConfig),
}

impl VersionConfig {
  pub fn as_leaf(&self) -> Option<&ImageConfig> {
    match self {
      VersionConfig::Leaf(image) => Some(image),
      VersionConfig::Nested(_) => None,
    }
  }

  pub fn as_nested(&self) -> Option<&NestedConfig> {
    match self {
      VersionConfig::Leaf(_) => None,
      VersionConfig::Nested(nested) => Some(nested),
    }
  }
}

/// A concrete image: repository plus the regional registries that host it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
  pub repository: String,
  pub registries: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub processors: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tag_prefix: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub py_versions: Vec<String>,
  /// Per-processor tag suffix, overriding any caller-supplied value.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub container_version: BTreeMap<String, String>,
}

/// An intermediate nesting level keyed by base framework version or
/// interpreter runtime version, with its own alias table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedConfig {
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub version_aliases: BTreeMap<String, String>,
  #[serde(flatten)]
  pub entries: BTreeMap<String, VersionConfig>,
}

impl NestedConfig {
  /// Resolve an alias to its canonical key, leaving unaliased values
  /// unchanged.
  pub fn canonical_key<'a>(&'a self, key: &'a str) -> &'a str {
    self
      .version_aliases
      .get(key)
      .map(String::as_str)
      .unwrap_or(key)
  }

  pub fn get(&self, key: &str) -> Option<&VersionConfig> {
    self.entries.get(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &String> {
    self.entries.keys()
  }
}
