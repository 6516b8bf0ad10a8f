// servitor/src/options/multiple_of.rs

//! `multiple_of` (`divisible_by` on internals).

use super::{CheckOutcome, DynamicOption, OptionDeclaration, RuleInput};
use crate::attributes::rule::{MessageContext, OptionBody};
use crate::value::Value;

/// Relative tolerance for float remainders.
const FLOAT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct MultipleOf;

impl DynamicOption for MultipleOf {
  fn code(&self) -> &str {
    "be_multiple_of"
  }

  fn verify(&self, declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    let divisor = declaration.body.and_then(OptionBody::as_value).filter(|v| v.is_numeric());
    match divisor.and_then(Value::as_f64) {
      None => Err(declaration.missing_value()),
      Some(d) if d == 0.0 => Err(format!(
        "[{}] {} `{}` has an invalid value `{}` in `{}` option, cannot divide by zero",
        declaration.service,
        declaration.kind().title(),
        declaration.attribute.name(),
        divisor.map(ToString::to_string).unwrap_or_default(),
        declaration.option_name
      )),
      Some(_) => Ok(()),
    }
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome {
    let divisor = input.body.and_then(OptionBody::as_value);
    match (input.value, divisor) {
      (Value::Integer(v), Some(Value::Integer(d))) if *d != 0 => CheckOutcome::from_bool(v.wrapping_rem(*d) == 0),
      (value, Some(divisor)) if value.is_numeric() && divisor.is_numeric() => {
        let (v, d) = match (value.as_f64(), divisor.as_f64()) {
          (Some(v), Some(d)) if d != 0.0 => (v, d),
          _ => return CheckOutcome::fail(),
        };
        let quotient = v / d;
        let off_by = (quotient - quotient.round()).abs();
        CheckOutcome::from_bool(off_by <= FLOAT_TOLERANCE * quotient.abs().max(1.0))
      }
      _ => CheckOutcome::fail_because("not_numeric"),
    }
  }

  fn message(&self, ctx: &MessageContext<'_>) -> String {
    format!(
      "[{}] {} `{}` has the value `{}`, which is not a multiple of `{}`",
      ctx.service,
      ctx.attribute.kind().title(),
      ctx.attribute.name(),
      ctx.value.inspect(),
      ctx.option_value.map(ToString::to_string).unwrap_or_default()
    )
  }
}
