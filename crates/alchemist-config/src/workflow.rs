use serde::{Deserialize, Serialize};

use crate::component::ComponentDef;
use crate::settings::RunSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub name: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub description: String,
  #[serde(default)]
  pub settings: RunSettings,
  /// Defaults applied to every component's config. Keys set on a component
  /// take precedence.
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub global_config: serde_json::Map<String, serde_json::Value>,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub metadata: serde_json::Map<String, serde_json::Value>,
  #[serde(default)]
  pub components: Vec<ComponentDef>,
}

impl WorkflowDef {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      settings: RunSettings::default(),
      global_config: serde_json::Map::new(),
      metadata: serde_json::Map::new(),
      components: Vec::new(),
    }
  }

  /// Get a component definition by name.
  pub fn get_component(&self, name: &str) -> Option<&ComponentDef> {
    self.components.iter().find(|c| c.name == name)
  }

  /// The config a component is built with: `global_config` overlaid with
  /// the component's own keys.
  pub fn effective_config(
    &self,
    component: &ComponentDef,
  ) -> serde_json::Map<String, serde_json::Value> {
    let mut config = self.global_config.clone();
    config.extend(component.config.iter().map(|(k, v)| (k.clone(), v.clone())));
    config
  }

  /// Component definitions that will be built into the workflow.
  pub fn enabled_components(&self) -> impl Iterator<Item = &ComponentDef> {
    self.components.iter().filter(|c| c.enabled)
  }
}
