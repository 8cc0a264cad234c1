//! Loading and saving workflow definitions.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::workflow::WorkflowDef;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read workflow file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write workflow file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse workflow definition: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("failed to parse YAML workflow definition: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("unsupported workflow file format: {0}")]
  UnsupportedFormat(String),
}

/// On-disk encoding of a workflow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Json,
  Yaml,
}

impl Format {
  /// Pick the format from a file extension: `.json`, `.yml` or `.yaml`.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("<none>");
    match ext.to_ascii_lowercase().as_str() {
      "json" => Ok(Self::Json),
      "yml" | "yaml" => Ok(Self::Yaml),
      _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
  }
}

/// Read and parse a workflow definition from a JSON or YAML file.
pub fn load_workflow_def(path: impl AsRef<Path>) -> Result<WorkflowDef, ConfigError> {
  let path = path.as_ref();
  let format = Format::from_path(path)?;

  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  parse_workflow_def_as(&content, format)
}

/// Parse a workflow definition from a JSON string.
pub fn parse_workflow_def(content: &str) -> Result<WorkflowDef, ConfigError> {
  parse_workflow_def_as(content, Format::Json)
}

/// Parse a workflow definition encoded as `format`.
pub fn parse_workflow_def_as(content: &str, format: Format) -> Result<WorkflowDef, ConfigError> {
  match format {
    Format::Json => Ok(serde_json::from_str(content)?),
    Format::Yaml => Ok(serde_yaml::from_str(content)?),
  }
}

/// Serialize `def` in the format implied by `path` and write it, creating
/// parent directories as needed.
pub fn save_workflow_def(def: &WorkflowDef, path: impl AsRef<Path>) -> Result<(), ConfigError> {
  let path = path.as_ref();
  let content = match Format::from_path(path)? {
    Format::Json => serde_json::to_string_pretty(def)?,
    Format::Yaml => serde_yaml::to_string(def)?,
  };

  let write_err = |source| ConfigError::Write {
    path: path.to_path_buf(),
    source,
  };
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).map_err(write_err)?;
  }
  std::fs::write(path, content).map_err(write_err)
}
