//! Component execution results.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a component within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
  Pending,
  Running,
  Completed,
  Failed,
  Skipped,
}

impl ComponentStatus {
  /// Completed, failed and skipped are terminal. A component in a terminal
  /// status never changes status again within the run.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Failed | Self::Skipped)
  }
}

impl std::fmt::Display for ComponentStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::Pending => "pending",
      Self::Running => "running",
      Self::Completed => "completed",
      Self::Failed => "failed",
      Self::Skipped => "skipped",
    };
    f.write_str(s)
  }
}

/// Result of a single component execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResult {
  pub status: ComponentStatus,
  /// Output payload. Opaque to the orchestrator.
  pub data: serde_json::Value,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors: Vec<String>,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub metadata: serde_json::Map<String, serde_json::Value>,
  #[serde(rename = "duration_ms", with = "crate::duration_ms")]
  pub duration: Duration,
}

impl ComponentResult {
  fn with_status(status: ComponentStatus, data: serde_json::Value, errors: Vec<String>) -> Self {
    Self {
      status,
      data,
      errors,
      metadata: serde_json::Map::new(),
      duration: Duration::ZERO,
    }
  }

  /// A successful result carrying `data` as output.
  pub fn completed(data: serde_json::Value) -> Self {
    Self::with_status(ComponentStatus::Completed, data, Vec::new())
  }

  /// A failed result with the given errors.
  pub fn failed<I, S>(errors: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::with_status(
      ComponentStatus::Failed,
      serde_json::Value::Null,
      errors.into_iter().map(Into::into).collect(),
    )
  }

  /// A component that never ran. The reason is recorded as its only error.
  pub fn skipped(reason: impl Into<String>) -> Self {
    Self::with_status(
      ComponentStatus::Skipped,
      serde_json::Value::Null,
      vec![reason.into()],
    )
  }

  pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
    self.metadata.insert(key.into(), value);
    self
  }

  pub fn with_duration(mut self, duration: Duration) -> Self {
    self.duration = duration;
    self
  }

  pub fn is_completed(&self) -> bool {
    self.status == ComponentStatus::Completed
  }
}
