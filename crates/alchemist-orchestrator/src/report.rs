//! Run report types.

use std::collections::BTreeMap;
use std::time::Duration;

use alchemist_component::{ComponentResult, ComponentStatus};
use serde::{Deserialize, Serialize};

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
  /// Every component completed.
  Completed,
  /// At least one component completed and at least one failed or was skipped.
  PartiallyCompleted,
  /// No component completed.
  Failed,
}

impl WorkflowStatus {
  /// Derive the overall status from the final status of every component.
  ///
  /// An empty run is `Completed`.
  pub fn aggregate<I>(statuses: I) -> Self
  where
    I: IntoIterator<Item = ComponentStatus>,
  {
    let mut total = 0usize;
    let mut completed = 0usize;
    for status in statuses {
      total += 1;
      if status == ComponentStatus::Completed {
        completed += 1;
      }
    }

    if completed == total {
      Self::Completed
    } else if completed == 0 {
      Self::Failed
    } else {
      Self::PartiallyCompleted
    }
  }
}

impl std::fmt::Display for WorkflowStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::Completed => "completed",
      Self::PartiallyCompleted => "partially_completed",
      Self::Failed => "failed",
    };
    f.write_str(s)
  }
}

/// Final report of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowReport {
  pub execution_id: String,
  pub workflow: String,
  pub status: WorkflowStatus,
  /// Results keyed by component name.
  pub results: BTreeMap<String, ComponentResult>,
  #[serde(rename = "duration_ms", with = "alchemist_component::duration_ms")]
  pub duration: Duration,
  /// Every component error, prefixed with the component name.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors: Vec<String>,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl WorkflowReport {
  /// Status of a single component.
  pub fn status_of(&self, name: &str) -> Option<ComponentStatus> {
    self.results.get(name).map(|r| r.status)
  }

  /// Names of the components that ended with `status`.
  pub fn components_with_status(&self, status: ComponentStatus) -> Vec<&str> {
    self
      .results
      .iter()
      .filter(|(_, r)| r.status == status)
      .map(|(name, _)| name.as_str())
      .collect()
  }

  /// Output payloads of the completed components.
  pub fn outputs(&self) -> serde_json::Map<String, serde_json::Value> {
    self
      .results
      .iter()
      .filter(|(_, r)| r.is_completed())
      .map(|(name, r)| (name.clone(), r.data.clone()))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ComponentStatus::*;

  #[test]
  fn test_aggregate_status_law() {
    assert_eq!(
      WorkflowStatus::aggregate([Completed, Completed]),
      WorkflowStatus::Completed
    );
    assert_eq!(
      WorkflowStatus::aggregate([Completed, Failed, Skipped]),
      WorkflowStatus::PartiallyCompleted
    );
    assert_eq!(
      WorkflowStatus::aggregate([Completed, Skipped]),
      WorkflowStatus::PartiallyCompleted
    );
    assert_eq!(
      WorkflowStatus::aggregate([Failed, Skipped]),
      WorkflowStatus::Failed
    );
    assert_eq!(WorkflowStatus::aggregate([Skipped]), WorkflowStatus::Failed);
  }

  #[test]
  fn test_empty_run_is_completed() {
    let none = std::iter::empty::<ComponentStatus>();
    assert_eq!(WorkflowStatus::aggregate(none), WorkflowStatus::Completed);
  }

  #[test]
  fn test_status_serialization() {
    assert_eq!(
      serde_json::to_value(WorkflowStatus::PartiallyCompleted).unwrap(),
      "partially_completed"
    );
    assert_eq!(WorkflowStatus::PartiallyCompleted.to_string(), "partially_completed");
  }
}
