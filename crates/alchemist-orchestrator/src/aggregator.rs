//! Run aggregation.
//!
//! The aggregator owns the results of one run. It is mutated only by the
//! coordinating task, one record at a time, so every component gets exactly
//! one terminal result.

use std::collections::BTreeMap;
use std::time::Instant;

use alchemist_component::{ComponentResult, ComponentStatus};
use alchemist_workflow::ValidatedWorkflow;

use crate::error::InvariantViolation;
use crate::report::{WorkflowReport, WorkflowStatus};

#[derive(Debug)]
pub struct RunAggregator {
  results: BTreeMap<String, ComponentResult>,
  started_at: Instant,
}

impl RunAggregator {
  pub fn new() -> Self {
    Self {
      results: BTreeMap::new(),
      started_at: Instant::now(),
    }
  }

  /// Record the terminal result of a component.
  ///
  /// Recording twice for the same name, or recording a non-terminal status,
  /// is rejected and leaves the stored result untouched.
  pub fn record(
    &mut self,
    name: &str,
    result: ComponentResult,
  ) -> Result<(), InvariantViolation> {
    if !result.status.is_terminal() {
      return Err(InvariantViolation::NonTerminalResult {
        component: name.to_string(),
        status: result.status.to_string(),
      });
    }
    if self.results.contains_key(name) {
      return Err(InvariantViolation::DuplicateResult(name.to_string()));
    }
    self.results.insert(name.to_string(), result);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&ComponentResult> {
    self.results.get(name)
  }

  pub fn status_of(&self, name: &str) -> Option<ComponentStatus> {
    self.results.get(name).map(|r| r.status)
  }

  /// Whether `name` has reached a terminal status.
  pub fn is_finalized(&self, name: &str) -> bool {
    self.results.contains_key(name)
  }

  /// Names of every finalized component, whatever its status.
  pub fn completed_set(&self) -> impl Iterator<Item = &str> {
    self.results.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.results.len()
  }

  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }

  /// Overall status over the results recorded so far.
  pub fn overall_status(&self) -> WorkflowStatus {
    WorkflowStatus::aggregate(self.results.values().map(|r| r.status))
  }

  /// Assemble the final report.
  pub fn finish(self, execution_id: String, workflow: &ValidatedWorkflow) -> WorkflowReport {
    let status = self.overall_status();
    let errors = self
      .results
      .iter()
      .filter(|(_, r)| r.status == ComponentStatus::Failed)
      .flat_map(|(name, r)| r.errors.iter().map(move |e| format!("{name}: {e}")))
      .collect();

    WorkflowReport {
      execution_id,
      workflow: workflow.name().to_string(),
      status,
      duration: self.started_at.elapsed(),
      results: self.results,
      errors,
      metadata: workflow.metadata().clone(),
    }
  }
}

impl Default for RunAggregator {
  fn default() -> Self {
    Self::new()
  }
}
