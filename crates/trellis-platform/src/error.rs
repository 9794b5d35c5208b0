use thiserror::Error;

/// Marker substring the platform embeds in naming-conflict failures.
///
/// Clients wrapping foreign SDK errors often surface the conflict as plain
/// text instead of a structured variant; [`PlatformError::is_conflict`]
/// recognizes both forms.
pub const CONFLICT_MARKER: &str = "ResourceConflictException";

#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("function already exists: {name}")]
  ResourceConflict { name: String },

  #[error("{message}")]
  Api { message: String },
}

impl PlatformError {
  /// Whether this failure signals a naming conflict on an existing resource.
  pub fn is_conflict(&self) -> bool {
    match self {
      PlatformError::ResourceConflict { .. } => true,
      PlatformError::Api { message } => message.contains(CONFLICT_MARKER),
    }
  }
}
