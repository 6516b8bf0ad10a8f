// servitor/src/options/inclusion.rs

//! `inclusion`: the value must be one of a fixed list, or fall within a range.

use super::{CheckOutcome, DynamicOption, OptionDeclaration, RuleInput, RulePhase};
use crate::attributes::kind::AttributeKind;
use crate::attributes::rule::{MessageContext, OptionBody};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct Inclusion;

impl DynamicOption for Inclusion {
  fn code(&self) -> &str {
    "be_included"
  }

  fn phase(&self) -> RulePhase {
    RulePhase::Inclusion
  }

  fn verify(&self, declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    verify_members(declaration)
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome {
    CheckOutcome::from_bool(input.body.map_or(false, |body| body_contains(body, input.value)))
  }

  fn message(&self, ctx: &MessageContext<'_>) -> String {
    let subject = match ctx.attribute.kind() {
      AttributeKind::Input => format!("`{}`", ctx.attribute.name()),
      kind => format!("{} `{}`", kind.label(), ctx.attribute.name()),
    };
    format!(
      "[{}] Wrong value in {}, must be one of `{}`, got `{}`",
      ctx.service,
      subject,
      ctx.option_value.map(render_members).unwrap_or_default(),
      ctx.value.inspect()
    )
  }
}

/// Shared by `inclusion` and `target`: a list or a range, never empty.
pub(crate) fn verify_members(declaration: &OptionDeclaration<'_>) -> Result<(), String> {
  match declaration.body {
    Some(OptionBody::Value(Value::Array(items))) | Some(OptionBody::Value(Value::Set(items))) if !items.is_empty() => Ok(()),
    Some(OptionBody::Range(_)) => Ok(()),
    Some(OptionBody::Value(value)) if value.is_present() && value.as_slice().is_none() => Ok(()),
    _ => Err(declaration.missing_value()),
  }
}

pub(crate) fn body_contains(body: &OptionBody, value: &Value) -> bool {
  match body {
    OptionBody::Value(Value::Array(items)) | OptionBody::Value(Value::Set(items)) => items.contains(value),
    OptionBody::Value(single) => single == value,
    OptionBody::Range(range) => range.contains(value),
    _ => false,
  }
}

pub(crate) fn render_members(body: &OptionBody) -> String {
  match body {
    OptionBody::Value(Value::Set(items)) => Value::Array(items.clone()).inspect(),
    OptionBody::Value(Value::Array(_)) => body.as_value().map(Value::inspect).unwrap_or_default(),
    OptionBody::Value(single) => Value::Array(vec![single.clone()]).inspect(),
    other => other.to_string(),
  }
}
