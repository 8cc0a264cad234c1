use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use alchemist_component::Component;
use tracing::debug;

use crate::error::WorkflowError;
use crate::graph::{Graph, find_cycle};

/// A component registered into a workflow together with its dependencies.
#[derive(Clone)]
pub struct Registration {
  pub component: Arc<dyn Component>,
  pub dependencies: BTreeSet<String>,
}

impl std::fmt::Debug for Registration {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Registration")
      .field("dependencies", &self.dependencies)
      .finish_non_exhaustive()
  }
}

/// A workflow under construction.
///
/// Components and edges can be added and removed freely. Nothing is checked
/// across components until [`Workflow::validate`], which produces the
/// [`ValidatedWorkflow`] the orchestrator runs.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
  name: String,
  metadata: serde_json::Map<String, serde_json::Value>,
  components: BTreeMap<String, Registration>,
}

impl Workflow {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      metadata: serde_json::Map::new(),
      components: BTreeMap::new(),
    }
  }

  pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
    self.metadata = metadata;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn len(&self) -> usize {
    self.components.len()
  }

  pub fn is_empty(&self) -> bool {
    self.components.is_empty()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.components.contains_key(name)
  }

  /// Register a component under `name` with the given upstream dependencies.
  ///
  /// The component's configuration is checked here, once. Dependencies do not
  /// have to be registered yet; they are resolved by [`Workflow::validate`].
  pub fn register_component<I, S>(
    &mut self,
    name: impl Into<String>,
    dependencies: I,
    component: Arc<dyn Component>,
  ) -> Result<(), WorkflowError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let name = name.into();
    if self.components.contains_key(&name) {
      return Err(WorkflowError::DuplicateComponent(name));
    }
    if !component.validate_config() {
      return Err(WorkflowError::ConfigValidation(name));
    }

    let dependencies: BTreeSet<String> = dependencies.into_iter().map(Into::into).collect();
    debug!(component = %name, dependencies = ?dependencies, "component_registered");

    self.components.insert(
      name,
      Registration {
        component,
        dependencies,
      },
    );
    Ok(())
  }

  /// Remove a component. Dependents keep their edge to it, so validation
  /// fails until they are removed or rewired.
  pub fn remove_component(&mut self, name: &str) -> Result<Registration, WorkflowError> {
    self
      .components
      .remove(name)
      .ok_or_else(|| WorkflowError::ComponentNotFound(name.to_string()))
  }

  /// Make `target` consume the output of `source`.
  pub fn connect(&mut self, source: &str, target: &str) -> Result<(), WorkflowError> {
    if !self.components.contains_key(source) {
      return Err(WorkflowError::ComponentNotFound(source.to_string()));
    }
    let registration = self
      .components
      .get_mut(target)
      .ok_or_else(|| WorkflowError::ComponentNotFound(target.to_string()))?;
    registration.dependencies.insert(source.to_string());
    Ok(())
  }

  /// Declared dependencies of a component.
  pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
    self.components.get(name).map(|r| &r.dependencies)
  }

  /// Component name -> declared dependencies, for every registered component.
  pub fn dependency_map(&self) -> BTreeMap<String, BTreeSet<String>> {
    self
      .components
      .iter()
      .map(|(name, r)| (name.clone(), r.dependencies.clone()))
      .collect()
  }

  /// Check the dependency relation and freeze the workflow for execution.
  ///
  /// Fails on the first dependency that names an unregistered component, then
  /// on the first cycle found.
  pub fn validate(&self) -> Result<ValidatedWorkflow, WorkflowError> {
    let dependencies = self.dependency_map();

    for (name, deps) in &dependencies {
      if let Some(unknown) = deps.iter().find(|d| !dependencies.contains_key(*d)) {
        return Err(WorkflowError::UnknownDependency {
          component: name.clone(),
          dependency: unknown.clone(),
        });
      }
    }

    if let Some(cycle) = find_cycle(&dependencies) {
      return Err(WorkflowError::CycleDetected { cycle });
    }

    let graph = Graph::new(&dependencies);
    let components = self
      .components
      .iter()
      .map(|(name, r)| (name.clone(), r.component.clone()))
      .collect();

    debug!(
      workflow = %self.name,
      components = graph.len(),
      waves = graph.waves().len(),
      "workflow_validated"
    );

    Ok(ValidatedWorkflow {
      name: self.name.clone(),
      metadata: self.metadata.clone(),
      components,
      graph,
    })
  }
}

/// A workflow whose graph has passed validation. Immutable.
#[derive(Clone)]
pub struct ValidatedWorkflow {
  name: String,
  metadata: serde_json::Map<String, serde_json::Value>,
  components: BTreeMap<String, Arc<dyn Component>>,
  graph: Graph,
}

impl std::fmt::Debug for ValidatedWorkflow {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ValidatedWorkflow")
      .field("name", &self.name)
      .field("graph", &self.graph)
      .finish_non_exhaustive()
  }
}

impl ValidatedWorkflow {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
    &self.metadata
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Get a component by name.
  pub fn get_component(&self, name: &str) -> Option<&Arc<dyn Component>> {
    self.components.get(name)
  }

  pub fn len(&self) -> usize {
    self.components.len()
  }

  pub fn is_empty(&self) -> bool {
    self.components.is_empty()
  }
}
