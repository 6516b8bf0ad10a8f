// servitor/src/core/context.rs

//! The per-call execution context handed to every step.
//!
//! A `Context` is built fresh for each call and never outlives it. Inputs are
//! frozen once validated; internal and output slots start as `Nil` and every
//! write goes through the attribute's validation before it is stored.

use super::control::{CallState, StepControl, StepResult};
use crate::attributes::kind::AttributeKind;
use crate::attributes::spec::AttributeSpec;
use crate::error::{Failure, ServiceError};
use crate::outcome::ServiceOutcome;
use crate::service::definition::ServiceDefinition;
use crate::validation::{self, messages};
use crate::value::{Meta, Value};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use tracing::{event, Level};

/// Read-only view over validated inputs, keyed by the name steps use.
#[derive(Debug, Clone)]
pub struct Inputs {
  service: String,
  values: IndexMap<String, Value>,
}

impl Inputs {
  pub(crate) fn new(service: &str, values: IndexMap<String, Value>) -> Self {
    Self {
      service: service.to_string(),
      values,
    }
  }

  pub fn get(&self, name: &str) -> Result<&Value, ServiceError> {
    self.values.get(name).ok_or_else(|| undefined(&self.service, AttributeKind::Input, name))
  }

  /// Predicate form: `false` for nil, `false`, zero and blank values.
  pub fn is(&self, name: &str) -> Result<bool, ServiceError> {
    self.get(name).map(Value::query)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }
}

/// Internal or output storage. Every declared name has a slot from the start.
#[derive(Debug, Clone)]
pub struct Slots {
  kind: AttributeKind,
  service: String,
  values: IndexMap<String, Value>,
  assigned: IndexSet<String>,
}

impl Slots {
  fn new<'a>(kind: AttributeKind, service: &str, specs: impl Iterator<Item = &'a AttributeSpec>) -> Self {
    Self {
      kind,
      service: service.to_string(),
      values: specs.map(|s| (s.name().to_string(), Value::Nil)).collect(),
      assigned: IndexSet::new(),
    }
  }

  pub fn get(&self, name: &str) -> Result<&Value, ServiceError> {
    self.values.get(name).ok_or_else(|| undefined(&self.service, self.kind, name))
  }

  pub fn is(&self, name: &str) -> Result<bool, ServiceError> {
    self.get(name).map(Value::query)
  }

  /// True once a step stored a value, even `Nil`.
  pub fn is_assigned(&self, name: &str) -> bool {
    self.assigned.contains(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }

  fn store(&mut self, name: &str, value: Value) {
    if let Some(slot) = self.values.get_mut(name) {
      *slot = value;
      self.assigned.insert(name.to_string());
    }
  }

  pub(crate) fn into_values(self) -> IndexMap<String, Value> {
    self.values
  }
}

fn undefined(service: &str, kind: AttributeKind, name: &str) -> ServiceError {
  kind.error(service, name, messages::undefined(service, kind, name), Meta::new())
}

pub struct Context {
  definition: Arc<ServiceDefinition>,
  inputs: Inputs,
  internals: Slots,
  outputs: Slots,
  state: CallState,
}

impl Context {
  pub(crate) fn new(definition: Arc<ServiceDefinition>, inputs: Inputs) -> Self {
    let name = definition.name.clone();
    let internals = Slots::new(AttributeKind::Internal, &name, definition.internals.iter());
    let outputs = Slots::new(AttributeKind::Output, &name, definition.outputs.iter());
    Self {
      definition,
      inputs,
      internals,
      outputs,
      state: CallState::InputsValidated,
    }
  }

  pub fn service_name(&self) -> &str {
    &self.definition.name
  }

  pub fn state(&self) -> &CallState {
    &self.state
  }

  pub(crate) fn set_state(&mut self, state: CallState) {
    event!(Level::TRACE, service = %self.definition.name, state = %state, "Call state changed.");
    self.state = state;
  }

  // --- Inputs ---

  pub fn inputs(&self) -> &Inputs {
    &self.inputs
  }

  pub fn input(&self, name: &str) -> Result<&Value, ServiceError> {
    self.inputs.get(name)
  }

  // --- Internals ---

  pub fn internals(&self) -> &Slots {
    &self.internals
  }

  pub fn internal(&self, name: &str) -> Result<&Value, ServiceError> {
    self.internals.get(name)
  }

  /// Validates `value` against the internal attribute's declaration and stores it.
  pub fn set_internal(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ServiceError> {
    let value = value.into();
    let spec = self
      .definition
      .internals
      .get(name)
      .ok_or_else(|| undefined(&self.definition.name, AttributeKind::Internal, name))?;
    validation::validate_assignment(&self.definition.name, spec, &value)?;
    self.internals.store(name, value);
    Ok(())
  }

  // --- Outputs ---

  pub fn outputs(&self) -> &Slots {
    &self.outputs
  }

  pub fn output(&self, name: &str) -> Result<&Value, ServiceError> {
    self.outputs.get(name)
  }

  /// Validates `value` against the output attribute's declaration and stores it.
  pub fn set_output(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ServiceError> {
    let value = value.into();
    let spec = self
      .definition
      .outputs
      .get(name)
      .ok_or_else(|| undefined(&self.definition.name, AttributeKind::Output, name))?;
    validation::validate_assignment(&self.definition.name, spec, &value)?;
    self.outputs.store(name, value);
    Ok(())
  }

  pub(crate) fn into_outputs(self) -> Slots {
    self.outputs
  }

  // --- Exits ---

  /// Ends the call successfully with the outputs assigned so far.
  pub fn success(&self) -> StepResult {
    event!(Level::DEBUG, service = %self.definition.name, "Early success requested.");
    Ok(StepControl::Success)
  }

  /// Ends the call with a business failure.
  pub fn fail(&self, failure: Failure) -> StepResult {
    Err(failure.owned_by(&self.definition.name).into())
  }

  pub fn fail_input(&self, name: &str, message: impl Into<String>) -> StepResult {
    self.fail_attribute(AttributeKind::Input, name, message.into(), Meta::new())
  }

  pub fn fail_input_with(&self, name: &str, message: impl Into<String>, meta: Meta) -> StepResult {
    self.fail_attribute(AttributeKind::Input, name, message.into(), meta)
  }

  pub fn fail_internal(&self, name: &str, message: impl Into<String>) -> StepResult {
    self.fail_attribute(AttributeKind::Internal, name, message.into(), Meta::new())
  }

  pub fn fail_output(&self, name: &str, message: impl Into<String>) -> StepResult {
    self.fail_attribute(AttributeKind::Output, name, message.into(), Meta::new())
  }

  /// Re-raises another service's failed outcome as a failure of this one,
  /// keeping its type, message and meta. A successful outcome is a no-op.
  pub fn fail_result(&self, outcome: &ServiceOutcome) -> StepResult {
    match outcome.error() {
      Some(error) => {
        let failure = Failure::new(error.message())
          .of_type(error.failure_type())
          .with_meta_map(error.meta().cloned().unwrap_or_default());
        self.fail(failure)
      }
      None => Ok(StepControl::Continue),
    }
  }

  fn fail_attribute(&self, kind: AttributeKind, name: &str, message: String, meta: Meta) -> StepResult {
    Err(kind.error(&self.definition.name, name, message, meta).into())
  }
}

impl std::fmt::Debug for Context {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Context")
      .field("service", &self.definition.name)
      .field("state", &self.state)
      .field("inputs", &self.inputs)
      .field("internals", &self.internals)
      .field("outputs", &self.outputs)
      .finish()
  }
}
