use alchemist_component::ComponentConfig;
use alchemist_config::WorkflowDef;
use alchemist_workflow::Workflow;
use tracing::debug;

use crate::error::ResolveError;
use crate::registry::ComponentRegistry;

/// Build a [`Workflow`] from its definition.
///
/// Every enabled component is created through `registry`, from its own
/// config laid over the workflow's `global_config`, and registered with its
/// declared dependencies. Disabled components are left out, so anything
/// depending on one fails validation with an unknown dependency. The result
/// is not validated yet.
pub fn resolve(def: &WorkflowDef, registry: &ComponentRegistry) -> Result<Workflow, ResolveError> {
  let mut workflow = Workflow::new(&def.name).with_metadata(def.metadata.clone());

  for component_def in def.enabled_components() {
    let config = ComponentConfig::from(def.effective_config(component_def));
    let component = registry
      .create(&component_def.kind, config)
      .map_err(|source| ResolveError::Component {
        name: component_def.name.clone(),
        source,
      })?;

    workflow.register_component(
      &component_def.name,
      component_def.dependencies.iter().cloned(),
      component,
    )?;
  }

  let disabled = def.components.len() - workflow.len();
  debug!(workflow = %def.name, components = workflow.len(), disabled, "workflow_resolved");
  Ok(workflow)
}
