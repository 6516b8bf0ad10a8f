// servitor/src/service/execution.rs

//! `Service::call` and `Service::call_strict`: binding, input validation, the
//! hook chain, stages and steps, error recovery and result construction.

use super::arguments::Arguments;
use super::definition::Service;
use super::hooks::CallHook;
use crate::attributes::kind::AttributeKind;
use crate::config::ValidationMode;
use crate::core::context::{Context, Inputs};
use crate::core::control::{CallState, StepControl, StepResult};
use crate::core::step::Stage;
use crate::error::{Failure, ServiceError};
use crate::outcome::ServiceOutcome;
use crate::validation::{self, messages};
use crate::value::{Meta, Value};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{event, instrument, span, Level};

impl Service {
  /// Runs the service and folds every framework error (attribute errors and
  /// failures) into a failed outcome.
  ///
  /// Returns `Err` only for configuration errors and for foreign errors no
  /// `fail_on` mapping matched.
  #[instrument(name = "Service::call", skip_all, fields(service = %self.definition.name))]
  pub fn call(&self, arguments: impl Into<Arguments>) -> Result<ServiceOutcome, ServiceError> {
    match self.execute(arguments.into()) {
      Ok(outcome) => Ok(outcome),
      Err(error) if error.is_recoverable() => {
        event!(Level::INFO, failure_type = %error.failure_type(), error = %error, "Call finished with failure.");
        Ok(ServiceOutcome::failure(&self.definition, error))
      }
      Err(error) => {
        event!(Level::ERROR, error = %error, "Call aborted.");
        Err(error)
      }
    }
  }

  /// Runs the service and returns every error, framework ones included, as `Err`.
  #[instrument(name = "Service::call_strict", skip_all, fields(service = %self.definition.name), err(Display))]
  pub fn call_strict(&self, arguments: impl Into<Arguments>) -> Result<ServiceOutcome, ServiceError> {
    self.execute(arguments.into())
  }

  fn execute(&self, arguments: Arguments) -> Result<ServiceOutcome, ServiceError> {
    event!(Level::DEBUG, state = %CallState::Initialized, "Call starting.");
    let provided = self.bind_inputs(arguments)?;
    let inputs = self.validate_inputs(provided)?;

    let mut ctx = Context::new(self.definition.clone(), inputs);
    if let Err(error) = self.run_hooked(&self.definition.hooks, &mut ctx) {
      ctx.set_state(CallState::Failed);
      return Err(self.resolve_error(error));
    }
    ctx.set_state(CallState::Completed);
    self.finish(ctx)
  }

  fn bind_inputs(&self, arguments: Arguments) -> Result<IndexMap<String, Value>, ServiceError> {
    let definition = &self.definition;
    let provided = arguments.into_inner();
    let unexpected: Vec<String> = provided
      .keys()
      .filter(|name| !definition.inputs.contains(name))
      .cloned()
      .collect();
    if let Some(first) = unexpected.first() {
      let message = messages::unexpected_attributes(&definition.name, &unexpected);
      let mut meta = Meta::new();
      meta.insert("unexpected_attributes".to_string(), Value::array(unexpected.iter().cloned()));
      return Err(AttributeKind::Input.error(&definition.name, first, message, meta));
    }
    event!(Level::TRACE, state = %CallState::InputsBound, arguments = provided.len(), "Inputs bound.");
    Ok(provided)
  }

  fn validate_inputs(&self, provided: IndexMap<String, Value>) -> Result<Inputs, ServiceError> {
    let definition = &self.definition;
    let mode = definition.config.validation_mode();
    let mut values = IndexMap::with_capacity(definition.inputs.len());
    let mut errors: Vec<ServiceError> = Vec::new();

    for spec in definition.inputs.iter() {
      match validation::validate_input(&definition.name, spec, provided.get(spec.name())) {
        Ok(value) => {
          values.insert(spec.access_name().to_string(), value);
        }
        Err(error) if mode == ValidationMode::FirstError => return Err(error),
        Err(error) => errors.push(error),
      }
    }

    let mut errors = errors.into_iter();
    if let Some(first) = errors.next() {
      return Err(collect_errors(first, errors));
    }
    Ok(Inputs::new(&definition.name, values))
  }

  fn run_hooked(&self, hooks: &[Arc<dyn CallHook>], ctx: &mut Context) -> StepResult {
    match hooks.split_first() {
      Some((hook, rest)) => {
        event!(Level::TRACE, hook = %hook.name(), "Entering call hook.");
        hook.around(ctx, &mut |ctx: &mut Context| self.run_hooked(rest, ctx))
      }
      None => self.run_body(ctx),
    }
  }

  fn run_body(&self, ctx: &mut Context) -> StepResult {
    let control = self.run_stages(ctx)?;
    for action in &self.definition.after_actions {
      let action_span = span!(Level::DEBUG, "after_success", name = %action.name, priority = action.priority);
      let _action_guard = action_span.enter();
      (action.action)(ctx)?;
    }
    Ok(control)
  }

  fn run_stages(&self, ctx: &mut Context) -> StepResult {
    for (stage_index, stage) in self.definition.stages.iter().enumerate() {
      let stage_span = span!(Level::DEBUG, "stage", stage_index);
      let _stage_guard = stage_span.enter();

      if !stage.allows(ctx) {
        event!(Level::DEBUG, "Stage skipped by its condition.");
        continue;
      }
      if self.run_stage(stage, ctx)? == StepControl::Success {
        ctx.set_state(CallState::Succeeded);
        return Ok(StepControl::Success);
      }
    }
    Ok(StepControl::Continue)
  }

  fn run_stage(&self, stage: &Stage, ctx: &mut Context) -> StepResult {
    let result = match &stage.wrapper {
      Some(wrapper) => wrapper(ctx, &mut |ctx: &mut Context| self.run_steps(stage, ctx)),
      None => self.run_steps(stage, ctx),
    };
    let error = match result {
      Ok(control) => return Ok(control),
      Err(error) => error,
    };

    if let Some(rollback) = &stage.rollback {
      event!(Level::WARN, error = %error, "Stage failed; running rollback.");
      return rollback(ctx, &error);
    }
    if stage.wrapper.is_some() && !is_framework_error(&error) {
      event!(Level::WARN, error = %error, "Stage wrapper failed.");
      let failure = Failure::new(error.to_string())
        .with_meta("original_exception", error.to_string())
        .owned_by(&self.definition.name);
      return Err(failure.into());
    }
    Err(error)
  }

  fn run_steps(&self, stage: &Stage, ctx: &mut Context) -> StepResult {
    for step in &stage.steps {
      let step_span = span!(
        Level::INFO,
        "step",
        step_name = %step.name,
        position = step.position.unwrap_or_default()
      );
      let _step_guard = step_span.enter();

      if !step.allows(ctx) {
        event!(Level::DEBUG, "Step skipped by its condition.");
        continue;
      }
      ctx.set_state(CallState::Running {
        step: step.name.clone(),
      });
      match (step.run)(ctx) {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Success) => {
          event!(Level::DEBUG, "Step ended the call early.");
          return Ok(StepControl::Success);
        }
        Err(error) => {
          event!(Level::DEBUG, error = %error, "Step failed.");
          return Err(self.rescue(error));
        }
      }
    }
    Ok(StepControl::Continue)
  }

  /// Applies `fail_on` mappings to a foreign error; framework errors pass through.
  fn rescue(&self, error: anyhow::Error) -> anyhow::Error {
    if is_framework_error(&error) {
      return error;
    }
    for handler in self.definition.rescues.iter().rev() {
      if let Some(message) = handler.try_map(&error) {
        event!(Level::INFO, error_type = handler.error_type, "Error mapped to failure.");
        let failure = Failure::new(message)
          .with_meta("original_exception", error.to_string())
          .owned_by(&self.definition.name);
        return failure.into();
      }
    }
    error
  }

  fn resolve_error(&self, error: anyhow::Error) -> ServiceError {
    match ServiceError::recover(error) {
      Ok(ServiceError::Failure(failure)) => ServiceError::Failure(failure.owned_by(&self.definition.name)),
      Ok(service_error) => service_error,
      Err(foreign) => {
        event!(Level::ERROR, error = %foreign, "Unhandled error raised by a step.");
        ServiceError::Unhandled {
          service: self.definition.name.clone(),
          error: Arc::new(foreign),
        }
      }
    }
  }

  fn finish(&self, ctx: Context) -> Result<ServiceOutcome, ServiceError> {
    let definition = &self.definition;
    let outputs = ctx.into_outputs();
    if let Some(missing) = definition
      .outputs
      .iter()
      .find(|spec| spec.is_required() && !outputs.is_assigned(spec.name()))
    {
      let message = messages::unassigned_output(&definition.name, missing.name());
      return Err(AttributeKind::Output.error(&definition.name, missing.name(), message, Meta::new()));
    }
    event!(Level::DEBUG, "Call finished successfully.");
    Ok(ServiceOutcome::success(definition, outputs.into_values()))
  }
}

fn is_framework_error(error: &anyhow::Error) -> bool {
  error.is::<ServiceError>() || error.is::<Failure>()
}

/// First error's message, with every message listed under `meta["errors"]`.
fn collect_errors(mut first: ServiceError, rest: impl Iterator<Item = ServiceError>) -> ServiceError {
  let mut all = vec![Value::from(first.message())];
  all.extend(rest.map(|e| Value::from(e.message())));
  if let ServiceError::Input { meta, .. } = &mut first {
    meta.insert("errors".to_string(), Value::Array(all));
  }
  first
}
