// servitor/src/options/min_max.rs

//! `min` / `max` (`minimum` / `maximum` on internals and outputs).
//!
//! Numbers compare by magnitude; strings and collections compare by size.
//! Values that are neither fail the rule.

use super::{CheckOutcome, DynamicOption, OptionDeclaration, RuleInput};
use crate::attributes::rule::{MessageContext, OptionBody};
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

impl DynamicOption for Min {
  fn code(&self) -> &str {
    "be_greater_than_or_equal_to"
  }

  fn verify(&self, declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    verify_bound(declaration)
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome {
    compare_with_bound(input, |ordering| ordering != Ordering::Less)
  }

  fn message(&self, ctx: &MessageContext<'_>) -> String {
    bound_message(ctx, "less than")
  }
}

impl DynamicOption for Max {
  fn code(&self) -> &str {
    "be_less_than_or_equal_to"
  }

  fn verify(&self, declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    verify_bound(declaration)
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome {
    compare_with_bound(input, |ordering| ordering != Ordering::Greater)
  }

  fn message(&self, ctx: &MessageContext<'_>) -> String {
    bound_message(ctx, "greater than")
  }
}

fn bound_of(body: Option<&OptionBody>) -> Option<&Value> {
  body.and_then(OptionBody::as_value).filter(|v| v.is_numeric())
}

fn verify_bound(declaration: &OptionDeclaration<'_>) -> Result<(), String> {
  match bound_of(declaration.body) {
    Some(_) => Ok(()),
    None => Err(format!(
      "[{}] {} `{}` has an invalid value in `{}` option, expected a number",
      declaration.service,
      declaration.kind().title(),
      declaration.attribute.name(),
      declaration.option_name
    )),
  }
}

fn compare_with_bound(input: &RuleInput<'_>, accept: impl Fn(Ordering) -> bool) -> CheckOutcome {
  let Some(bound) = bound_of(input.body) else {
    return CheckOutcome::fail();
  };

  let measured = if input.value.is_numeric() {
    input.value.clone()
  } else {
    match input.value.size() {
      Some(size) => Value::count(size),
      None => return CheckOutcome::fail_because("not_comparable"),
    }
  };

  match measured.compare(bound) {
    Some(ordering) => CheckOutcome::from_bool(accept(ordering)),
    None => CheckOutcome::fail_because("not_comparable"),
  }
}

fn bound_message(ctx: &MessageContext<'_>, relation: &str) -> String {
  format!(
    "[{}] {} `{}` received value `{}`, which is {} `{}`",
    ctx.service,
    ctx.attribute.kind().title(),
    ctx.attribute.name(),
    ctx.value.inspect(),
    relation,
    ctx.option_value.map(ToString::to_string).unwrap_or_default()
  )
}
