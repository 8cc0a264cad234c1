use serde::{Deserialize, Serialize};

/// Definition of a single component in a workflow file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
  /// Unique name of the component within the workflow.
  pub name: String,

  /// Registry kind used to build the component, e.g. "passthrough".
  pub kind: String,

  /// Opaque configuration handed to the component factory.
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub config: serde_json::Map<String, serde_json::Value>,

  /// Names of the components whose output this component consumes.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dependencies: Vec<String>,

  /// Disabled components are left out of the workflow entirely.
  #[serde(default = "default_enabled")]
  pub enabled: bool,
}

fn default_enabled() -> bool {
  true
}

impl ComponentDef {
  pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: kind.into(),
      config: serde_json::Map::new(),
      dependencies: Vec::new(),
      enabled: true,
    }
  }

  pub fn with_config(mut self, config: serde_json::Map<String, serde_json::Value>) -> Self {
    self.config = config;
    self
  }

  pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.dependencies = dependencies.into_iter().map(Into::into).collect();
    self
  }

  pub fn disabled(mut self) -> Self {
    self.enabled = false;
    self
  }
}
