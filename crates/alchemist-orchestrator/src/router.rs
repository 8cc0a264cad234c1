//! Data routing between components.

use alchemist_component::{ComponentInput, ComponentStatus};
use alchemist_workflow::Graph;

use crate::aggregator::RunAggregator;
use crate::error::InvariantViolation;

/// Assembles a component's input from the outputs of its dependencies.
///
/// Routing is structural only: payloads are copied as-is and never inspected.
pub struct DataRouter<'a> {
  graph: &'a Graph,
  aggregator: &'a RunAggregator,
}

impl<'a> DataRouter<'a> {
  pub fn new(graph: &'a Graph, aggregator: &'a RunAggregator) -> Self {
    Self { graph, aggregator }
  }

  /// Map each upstream dependency of `name` to its output.
  ///
  /// Every dependency must already be finalized as `completed`.
  pub fn build_input(&self, name: &str) -> Result<ComponentInput, InvariantViolation> {
    if !self.graph.contains(name) {
      return Err(InvariantViolation::UnknownComponent(name.to_string()));
    }

    self
      .graph
      .upstream(name)
      .iter()
      .map(|dep| match self.aggregator.get(dep) {
        Some(result) if result.status == ComponentStatus::Completed => {
          Ok((dep.clone(), result.data.clone()))
        }
        _ => Err(InvariantViolation::UnfinalizedDependency {
          component: name.to_string(),
          dependency: dep.clone(),
        }),
      })
      .collect()
  }

  /// The first direct dependency of `name` that finalized without completing.
  pub fn unmet_dependency(&self, name: &str) -> Option<&'a str> {
    self
      .graph
      .upstream(name)
      .iter()
      .find(|dep| {
        self
          .aggregator
          .status_of(dep)
          .is_some_and(|s| s != ComponentStatus::Completed)
      })
      .map(String::as_str)
  }

  /// Whether every dependency of `name` is finalized, successfully or not.
  pub fn dependencies_finalized(&self, name: &str) -> bool {
    self
      .graph
      .upstream(name)
      .iter()
      .all(|dep| self.aggregator.is_finalized(dep))
  }
}
