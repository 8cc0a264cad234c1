use std::collections::BTreeMap;
use std::sync::Arc;

use alchemist_component::{Component, ComponentConfig};
use tracing::debug;

use crate::builtin::{Constant, Delay, Fail, Passthrough};
use crate::error::RegistryError;

/// Builds a component of one kind from its configuration.
pub type ComponentFactory =
  Arc<dyn Fn(ComponentConfig) -> Result<Arc<dyn Component>, RegistryError> + Send + Sync>;

/// Registry of component kinds.
///
/// Kinds are plain names ("passthrough", "constant", ...). Each one maps to a
/// factory that turns a component's configuration into a ready-to-register
/// component.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
  factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with the built-in kinds: `passthrough`, `constant`, `delay`
  /// and `fail`.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    let builtins: [(&str, ComponentFactory); 4] = [
      ("passthrough", factory(|_| Passthrough)),
      ("constant", factory(Constant::new)),
      ("delay", factory(Delay::new)),
      ("fail", factory(Fail::new)),
    ];
    for (kind, factory) in builtins {
      registry.factories.insert(kind.to_string(), factory);
    }
    registry
  }

  /// Register a factory for `kind`.
  pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> Result<(), RegistryError>
  where
    F: Fn(ComponentConfig) -> Result<Arc<dyn Component>, RegistryError> + Send + Sync + 'static,
  {
    let kind = kind.into();
    if self.factories.contains_key(&kind) {
      return Err(RegistryError::DuplicateKind(kind));
    }
    debug!(kind = %kind, "component_kind_registered");
    self.factories.insert(kind, Arc::new(factory));
    Ok(())
  }

  /// Build a component of `kind` from `config`.
  pub fn create(
    &self,
    kind: &str,
    config: ComponentConfig,
  ) -> Result<Arc<dyn Component>, RegistryError> {
    let factory = self
      .factories
      .get(kind)
      .ok_or_else(|| RegistryError::UnknownKind(kind.to_string()))?;
    factory(config)
  }

  pub fn contains(&self, kind: &str) -> bool {
    self.factories.contains_key(kind)
  }

  /// Registered kinds, sorted.
  pub fn kinds(&self) -> Vec<&str> {
    self.factories.keys().map(String::as_str).collect()
  }
}

/// Wrap an infallible constructor as a factory.
fn factory<C, F>(build: F) -> ComponentFactory
where
  C: Component + 'static,
  F: Fn(ComponentConfig) -> C + Send + Sync + 'static,
{
  Arc::new(move |config: ComponentConfig| {
    let component: Arc<dyn Component> = Arc::new(build(config));
    Ok::<_, RegistryError>(component)
  })
}

impl std::fmt::Debug for ComponentRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ComponentRegistry")
      .field("kinds", &self.kinds())
      .finish()
  }
}
