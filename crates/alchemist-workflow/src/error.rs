use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
  #[error("component already registered: {0}")]
  DuplicateComponent(String),

  #[error("component not found: {0}")]
  ComponentNotFound(String),

  #[error("component '{component}' depends on unknown component '{dependency}'")]
  UnknownDependency {
    component: String,
    dependency: String,
  },

  #[error("dependency cycle detected: {}", format_cycle(.cycle))]
  CycleDetected { cycle: Vec<String> },

  #[error("component '{0}' has invalid configuration")]
  ConfigValidation(String),
}

fn format_cycle(cycle: &[String]) -> String {
  let mut path = cycle.join(" -> ");
  if let Some(first) = cycle.first() {
    path.push_str(" -> ");
    path.push_str(first);
  }
  path
}
