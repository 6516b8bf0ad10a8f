// servitor/src/validation/mod.rs

//! The fixed-order validation pipeline.
//!
//! Inputs: required/default resolution, type, then rules by phase
//! (inclusion, must-style rules, `consists_of`, `schema`), then normalization
//! (schema defaults and `prepare`). Internal and output assignments: type, then rules.
//! The first failure ends validation of that attribute.

pub(crate) mod messages;

use crate::attributes::rule::{MessageContext, OptionBody};
use crate::attributes::spec::{AttributeSpec, ResolvedRule};
use crate::error::ServiceError;
use crate::options::{CheckOutcome, RuleInput, RulePhase};
use crate::value::{Meta, Value, ValueType};
use tracing::{event, Level};

/// Validates a call-time input and returns the value steps will see.
///
/// `provided` is `None` when the caller did not pass the argument at all.
pub(crate) fn validate_input(service: &str, spec: &AttributeSpec, provided: Option<&Value>) -> Result<Value, ServiceError> {
  let mut value = provided.cloned().unwrap_or_default();

  if spec.is_optional() && value.is_blank() {
    if let Some(default) = spec.default_value() {
      value = default.clone();
    }
  }

  if spec.is_required() && value.is_blank() {
    let message = match &spec.required_message {
      Some(custom) => {
        let meta = Meta::new();
        custom.render(&MessageContext {
          service,
          attribute: spec,
          value: &value,
          option_name: "required",
          option_value: None,
          reason: None,
          meta: &meta,
        })
      }
      None => messages::required(service, spec),
    };
    return Err(spec.kind().error(service, spec.name(), message, Meta::new()));
  }

  // Optional and still nil: nothing to check.
  if value.is_nil() {
    return Ok(value);
  }

  check_type(service, spec, &value)?;
  run_rules(service, spec, &value)?;

  Ok(normalize_input(spec, value))
}

/// Validates a value a step assigns to an internal or output slot.
pub(crate) fn validate_assignment(service: &str, spec: &AttributeSpec, value: &Value) -> Result<(), ServiceError> {
  check_type(service, spec, value)?;
  if value.is_nil() {
    return Ok(());
  }
  run_rules(service, spec, value)
}

fn check_type(service: &str, spec: &AttributeSpec, value: &Value) -> Result<(), ServiceError> {
  if ValueType::matches_any(spec.types(), value) {
    return Ok(());
  }
  let mut meta = Meta::new();
  meta.insert("expected_type".to_string(), ValueType::join(spec.types()).into());
  meta.insert("given_type".to_string(), value.type_name().into());
  Err(spec.kind().error(service, spec.name(), messages::wrong_type(service, spec, value), meta))
}

fn run_rules(service: &str, spec: &AttributeSpec, value: &Value) -> Result<(), ServiceError> {
  for rule in spec.rules() {
    run_rule(service, spec, rule, value)?;
  }
  Ok(())
}

fn run_rule(service: &str, spec: &AttributeSpec, rule: &ResolvedRule, value: &Value) -> Result<(), ServiceError> {
  let outcome = match (&rule.predicate, &rule.option) {
    (Some(predicate), _) => match predicate(value, spec) {
      Ok(passed) => CheckOutcome::from_bool(passed),
      Err(error) => {
        event!(Level::WARN, service, attribute = %spec.name(), code = %rule.code, error = %error, "Rule predicate raised.");
        let mut meta = Meta::new();
        meta.insert("code".to_string(), rule.code.clone().into());
        meta.insert("original_exception".to_string(), error.to_string().into());
        let message = messages::syntax_error(service, spec, &rule.code, &error);
        return Err(spec.kind().error(service, spec.name(), message, meta));
      }
    },
    (None, Some(option)) => option.condition(&RuleInput {
      service,
      attribute: spec,
      value,
      option_name: &rule.option_name,
      body: rule.body.as_ref(),
      properties: &rule.properties,
    }),
    (None, None) => CheckOutcome::Pass,
  };

  let (reason, mut meta) = match outcome {
    CheckOutcome::Pass => return Ok(()),
    CheckOutcome::Fail { reason, meta } => (reason, meta),
  };

  let message = {
    let ctx = MessageContext {
      service,
      attribute: spec,
      value,
      option_name: &rule.option_name,
      option_value: rule.body.as_ref(),
      reason: reason.as_deref(),
      meta: &meta,
    };
    match (&rule.message, &rule.option) {
      (Some(custom), _) => custom.render(&ctx),
      (None, Some(option)) => option.message(&ctx),
      (None, None) => messages::must(service, spec, &rule.code, value),
    }
  };

  meta.shift_insert(0, "code".to_string(), rule.code.clone().into());
  if let Some(reason) = reason {
    meta.insert("reason".to_string(), reason.into());
  }
  event!(Level::DEBUG, service, attribute = %spec.name(), code = %rule.code, "Rule failed.");
  Err(spec.kind().error(service, spec.name(), message, meta))
}

/// Schema defaults and field `prepare` first, then the attribute's own `prepare`.
fn normalize_input(spec: &AttributeSpec, value: Value) -> Value {
  let mut value = value;
  for rule in spec.rules().iter().filter(|r| r.phase == RulePhase::Schema) {
    if let Some(OptionBody::Schema(schema)) = &rule.body {
      value = schema.normalize(value);
    }
  }
  match &spec.prepare {
    Some(prepare) => prepare(value),
    None => value,
  }
}
