// servitor/src/outcome.rs

//! The result of a call.

use crate::error::ServiceError;
use crate::service::definition::ServiceDefinition;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;

/// Output values of a successful call. Every declared output has an entry;
/// unassigned ones hold `Nil`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
  values: IndexMap<String, Value>,
}

impl Outputs {
  /// `None` when no output of that name is declared.
  pub fn get(&self, name: &str) -> Option<&Value> {
    self.values.get(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// Immutable success/failure of one call.
#[derive(Clone)]
pub struct ServiceOutcome {
  service: String,
  outputs: Outputs,
  error: Option<ServiceError>,
  predicates_enabled: bool,
}

impl ServiceOutcome {
  pub(crate) fn success(definition: &ServiceDefinition, outputs: IndexMap<String, Value>) -> Self {
    Self {
      service: definition.name.clone(),
      outputs: Outputs { values: outputs },
      error: None,
      predicates_enabled: definition.config.predicate_methods_enabled(),
    }
  }

  pub(crate) fn failure(definition: &ServiceDefinition, error: ServiceError) -> Self {
    Self {
      service: definition.name.clone(),
      outputs: Outputs::default(),
      error: Some(error),
      predicates_enabled: definition.config.predicate_methods_enabled(),
    }
  }

  pub fn service(&self) -> &str {
    &self.service
  }

  pub fn is_success(&self) -> bool {
    self.error.is_none()
  }

  pub fn is_failure(&self) -> bool {
    self.error.is_some()
  }

  /// Failure of the given type. `"all"` matches any failure.
  pub fn is_failure_of(&self, failure_type: &str) -> bool {
    match &self.error {
      Some(error) => failure_type == "all" || error.failure_type() == failure_type,
      None => false,
    }
  }

  pub fn error(&self) -> Option<&ServiceError> {
    self.error.as_ref()
  }

  pub fn on_success(&self, f: impl FnOnce(&Outputs)) -> &Self {
    if self.error.is_none() {
      f(&self.outputs);
    }
    self
  }

  pub fn on_failure(&self, f: impl FnOnce(&ServiceError)) -> &Self {
    if let Some(error) = &self.error {
      f(error);
    }
    self
  }

  pub fn on_failure_of(&self, failure_type: &str, f: impl FnOnce(&ServiceError)) -> &Self {
    if let Some(error) = &self.error {
      if self.is_failure_of(failure_type) {
        f(error);
      }
    }
    self
  }

  /// Named output. `None` when the output is not declared or the call failed.
  pub fn output(&self, name: &str) -> Option<&Value> {
    self.outputs.get(name)
  }

  /// Truthiness of an output, or `None` when predicates are disabled in the
  /// service's configuration or the output is unknown.
  pub fn predicate(&self, name: &str) -> Option<bool> {
    if !self.predicates_enabled {
      return None;
    }
    self.outputs.get(name).map(Value::query)
  }

  pub fn outputs(&self) -> &Outputs {
    &self.outputs
  }

  /// Outputs as a map, leaving out `Nil` values.
  pub fn to_h(&self) -> IndexMap<String, Value> {
    self
      .outputs
      .iter()
      .filter(|(_, value)| !value.is_nil())
      .map(|(name, value)| (name.to_string(), value.clone()))
      .collect()
  }

  pub fn into_result(self) -> Result<Outputs, ServiceError> {
    match self.error {
      Some(error) => Err(error),
      None => Ok(self.outputs),
    }
  }
}

impl fmt::Debug for ServiceOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.error {
      None => {
        let rendered: Vec<String> = self
          .outputs
          .iter()
          .map(|(name, value)| format!("{}={}", name, value.inspect()))
          .collect();
        write!(f, "#<ServiceOutcome {} success {}>", self.service, rendered.join(", "))
      }
      Some(error) => write!(
        f,
        "#<ServiceOutcome {} failure type={} message={:?}>",
        self.service,
        error.failure_type(),
        error.message()
      ),
    }
  }
}
