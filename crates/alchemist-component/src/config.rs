use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Per-component configuration.
///
/// An opaque key/value mapping interpreted only by the component that owns it.
/// It is fixed once the component is built: clones share the same map and
/// there is no way to mutate it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentConfig(Arc<serde_json::Map<String, serde_json::Value>>);

impl ComponentConfig {
  pub fn new(values: serde_json::Map<String, serde_json::Value>) -> Self {
    Self(Arc::new(values))
  }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.0.get(key).and_then(|v| v.as_str())
  }

  pub fn get_u64(&self, key: &str) -> Option<u64> {
    self.0.get(key).and_then(|v| v.as_u64())
  }

  pub fn get_bool(&self, key: &str) -> Option<bool> {
    self.0.get(key).and_then(|v| v.as_bool())
  }
}

impl Deref for ComponentConfig {
  type Target = serde_json::Map<String, serde_json::Value>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl From<serde_json::Map<String, serde_json::Value>> for ComponentConfig {
  fn from(values: serde_json::Map<String, serde_json::Value>) -> Self {
    Self::new(values)
  }
}
