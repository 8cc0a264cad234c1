//! Built-in component kinds.

use std::time::Duration;

use alchemist_component::{
  Component, ComponentConfig, ComponentInput, ComponentResult, ExecutionContext,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

fn input_object(input: &ComponentInput) -> Value {
  Value::Object(input.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

/// Outputs its input mapping as a JSON object keyed by dependency name.
#[derive(Debug, Clone, Default)]
pub struct Passthrough;

#[async_trait]
impl Component for Passthrough {
  fn validate_config(&self) -> bool {
    true
  }

  async fn execute(&self, input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    ComponentResult::completed(input_object(input))
  }
}

/// Outputs the `value` from its configuration.
#[derive(Debug, Clone)]
pub struct Constant {
  config: ComponentConfig,
}

impl Constant {
  pub fn new(config: ComponentConfig) -> Self {
    Self { config }
  }
}

#[async_trait]
impl Component for Constant {
  fn validate_config(&self) -> bool {
    self.config.contains_key("value")
  }

  async fn execute(&self, _input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    match self.config.get("value") {
      Some(value) => ComponentResult::completed(value.clone()),
      None => ComponentResult::failed(["missing 'value' in config"]),
    }
  }
}

/// Waits `millis` milliseconds, then behaves like [`Passthrough`].
///
/// Stops waiting if the run is cancelled and reports a failure instead.
#[derive(Debug, Clone)]
pub struct Delay {
  config: ComponentConfig,
}

impl Delay {
  pub fn new(config: ComponentConfig) -> Self {
    Self { config }
  }

  fn millis(&self) -> Option<u64> {
    self.config.get_u64("millis")
  }
}

#[async_trait]
impl Component for Delay {
  fn validate_config(&self) -> bool {
    self.millis().is_some()
  }

  async fn execute(&self, input: &ComponentInput, ctx: &ExecutionContext) -> ComponentResult {
    let Some(millis) = self.millis() else {
      return ComponentResult::failed(["missing 'millis' in config"]);
    };

    tokio::select! {
      _ = tokio::time::sleep(Duration::from_millis(millis)) => {
        ComponentResult::completed(input_object(input)).with_metadata("delay_ms", millis.into())
      }
      _ = ctx.cancel.cancelled() => {
        debug!(component = %ctx.component, "delay interrupted by cancellation");
        ComponentResult::failed(["cancelled"])
      }
    }
  }
}

/// Always fails with the configured `message`.
#[derive(Debug, Clone)]
pub struct Fail {
  config: ComponentConfig,
}

impl Fail {
  pub const DEFAULT_MESSAGE: &'static str = "component failed";

  pub fn new(config: ComponentConfig) -> Self {
    Self { config }
  }
}

#[async_trait]
impl Component for Fail {
  fn validate_config(&self) -> bool {
    self.config.get("message").is_none_or(Value::is_string)
  }

  async fn execute(&self, _input: &ComponentInput, _ctx: &ExecutionContext) -> ComponentResult {
    let message = self
      .config
      .get_str("message")
      .unwrap_or(Self::DEFAULT_MESSAGE);
    ComponentResult::failed([message])
  }
}
