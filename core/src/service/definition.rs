// servitor/src/service/definition.rs

//! `ServiceBuilder` collects declarations; `build` resolves them once into an
//! immutable `ServiceDefinition` shared by every call of the resulting `Service`.

use super::hooks::{AfterAction, CallHook, RescueHandler};
use crate::attributes::builder::AttributeBuilder;
use crate::attributes::collection::AttributeCollection;
use crate::attributes::kind::AttributeKind;
use crate::config::Configuration;
use crate::core::context::Context;
use crate::core::control::StepResult;
use crate::core::step::{Stage, StageBuilder, Step};
use crate::error::ServiceError;
use std::fmt;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Everything a call needs, resolved and frozen at build time.
pub struct ServiceDefinition {
  pub(crate) name: String,
  pub(crate) config: Configuration,
  pub(crate) inputs: AttributeCollection,
  pub(crate) internals: AttributeCollection,
  pub(crate) outputs: AttributeCollection,
  /// Stages sorted by position; steps inside each are sorted by position.
  pub(crate) stages: Vec<Stage>,
  /// Checked last-registered first.
  pub(crate) rescues: Vec<RescueHandler>,
  /// First registered runs outermost.
  pub(crate) hooks: Vec<Arc<dyn CallHook>>,
  /// Sorted by ascending priority.
  pub(crate) after_actions: Vec<AfterAction>,
}

impl ServiceDefinition {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn config(&self) -> &Configuration {
    &self.config
  }

  pub fn inputs(&self) -> &AttributeCollection {
    &self.inputs
  }

  pub fn internals(&self) -> &AttributeCollection {
    &self.internals
  }

  pub fn outputs(&self) -> &AttributeCollection {
    &self.outputs
  }

  pub fn stages(&self) -> &[Stage] {
    &self.stages
  }

  pub(crate) fn step_count(&self) -> usize {
    self.stages.iter().map(|s| s.steps.len()).sum()
  }
}

impl fmt::Debug for ServiceDefinition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceDefinition")
      .field("name", &self.name)
      .field("inputs", &self.inputs)
      .field("internals", &self.internals)
      .field("outputs", &self.outputs)
      .field("stages", &self.stages)
      .field("rescues", &self.rescues.len())
      .field("hooks", &self.hooks.len())
      .field("after_actions", &self.after_actions.len())
      .finish()
  }
}

/// A built service. Cheap to clone; calls may run concurrently.
#[derive(Clone)]
pub struct Service {
  pub(crate) definition: Arc<ServiceDefinition>,
}

impl Service {
  pub fn builder(name: impl Into<String>) -> ServiceBuilder {
    ServiceBuilder::new(name)
  }

  pub fn name(&self) -> &str {
    &self.definition.name
  }

  pub fn definition(&self) -> &ServiceDefinition {
    &self.definition
  }
}

impl fmt::Debug for Service {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Service").field(&self.definition.name).finish()
  }
}

/// Fluent declaration of a service.
///
/// Attribute declarations are resolved in [`build`](Self::build), against the
/// configuration as it stands at that point.
pub struct ServiceBuilder {
  pub(crate) name: String,
  pub(crate) config: Configuration,
  parent: Option<Arc<ServiceDefinition>>,
  inputs: Vec<AttributeBuilder>,
  internals: Vec<AttributeBuilder>,
  outputs: Vec<AttributeBuilder>,
  stages: Vec<Stage>,
  pub(crate) rescues: Vec<RescueHandler>,
  pub(crate) hooks: Vec<Arc<dyn CallHook>>,
  pub(crate) after_actions: Vec<AfterAction>,
}

impl ServiceBuilder {
  /// Starts a declaration from a snapshot of the global configuration.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      config: Configuration::global(),
      parent: None,
      inputs: Vec::new(),
      internals: Vec::new(),
      outputs: Vec::new(),
      stages: Vec::new(),
      rescues: Vec::new(),
      hooks: Vec::new(),
      after_actions: Vec::new(),
    }
  }

  /// Starts a subclass of `parent`: its attributes, stages, configuration,
  /// rescues, hooks and after-actions come first. Redeclaring an attribute
  /// replaces the parent's declaration in place.
  pub fn inherit(parent: &Service, name: impl Into<String>) -> Self {
    let definition = parent.definition.clone();
    Self {
      name: name.into(),
      config: definition.config.clone(),
      rescues: definition.rescues.clone(),
      hooks: definition.hooks.clone(),
      after_actions: definition.after_actions.clone(),
      parent: Some(definition),
      inputs: Vec::new(),
      internals: Vec::new(),
      outputs: Vec::new(),
      stages: Vec::new(),
    }
  }

  /// Edits this service's own configuration copy.
  pub fn configure(mut self, f: impl FnOnce(&mut Configuration)) -> Self {
    f(&mut self.config);
    self
  }

  pub fn input(mut self, attribute: AttributeBuilder) -> Self {
    self.inputs.push(attribute);
    self
  }

  pub fn internal(mut self, attribute: AttributeBuilder) -> Self {
    self.internals.push(attribute);
    self
  }

  pub fn output(mut self, attribute: AttributeBuilder) -> Self {
    self.outputs.push(attribute);
    self
  }

  /// Declares a step outside any stage. It runs as a stage of its own, placed
  /// by the step's position when one is given.
  pub fn make(
    self,
    name: impl Into<String>,
    f: impl Fn(&mut Context) -> StepResult + Send + Sync + 'static,
  ) -> Self {
    self.make_step(Step::new(name, f))
  }

  pub fn make_step(mut self, step: Step) -> Self {
    self.stages.push(Stage::single(step));
    self
  }

  pub fn stage(mut self, f: impl FnOnce(&mut StageBuilder)) -> Self {
    let mut stage = StageBuilder::new();
    f(&mut stage);
    self.stages.push(stage.build());
    self
  }

  #[instrument(name = "ServiceBuilder::build", skip_all, fields(service = %self.name))]
  pub fn build(self) -> Result<Service, ServiceError> {
    let name = self.name;
    let config = self.config;

    let (mut inputs, mut internals, mut outputs, mut stages) = match &self.parent {
      Some(parent) => (
        parent.inputs.clone(),
        parent.internals.clone(),
        parent.outputs.clone(),
        parent.stages.clone(),
      ),
      None => (
        AttributeCollection::new(AttributeKind::Input),
        AttributeCollection::new(AttributeKind::Internal),
        AttributeCollection::new(AttributeKind::Output),
        Vec::new(),
      ),
    };

    for (collection, declared) in [
      (&mut inputs, self.inputs),
      (&mut internals, self.internals),
      (&mut outputs, self.outputs),
    ] {
      let kind = collection.kind();
      for attribute in declared {
        collection.insert(attribute.resolve(kind, &name, &config)?);
      }
    }

    inputs.check_reserved_names(&name)?;
    internals.check_reserved_names(&name)?;
    outputs.check_reserved_names(&name)?;
    AttributeCollection::check_overlap(&internals, &outputs, &name)?;

    let mut positioned: usize = stages.iter().map(|s| s.steps.len()).sum();
    for mut stage in self.stages {
      if stage.position.is_none() {
        stage.position = Some(stages.len() + 1);
      }
      positioned = stage.assign_positions(positioned);
      stages.push(stage);
    }
    // Stable, so equal positions keep declaration order with inherited stages first.
    stages.sort_by_key(|s| s.position.unwrap_or(usize::MAX));

    let mut after_actions = self.after_actions;
    after_actions.sort_by_key(|a| a.priority);

    let definition = ServiceDefinition {
      name,
      config,
      inputs,
      internals,
      outputs,
      stages,
      rescues: self.rescues,
      hooks: self.hooks,
      after_actions,
    };
    event!(
      Level::DEBUG,
      inputs = definition.inputs.len(),
      internals = definition.internals.len(),
      outputs = definition.outputs.len(),
      steps = definition.step_count(),
      "Service built."
    );
    Ok(Service {
      definition: Arc::new(definition),
    })
  }
}
