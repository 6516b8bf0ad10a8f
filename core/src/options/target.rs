// servitor/src/options/target.rs

//! `target` (internal attributes call it `expect`): like `inclusion`, but meant for
//! values that name a kind of thing, such as a service or a class symbol.

use super::inclusion::{body_contains, render_members, verify_members};
use super::{CheckOutcome, DynamicOption, OptionDeclaration, RuleInput};
use crate::attributes::rule::MessageContext;

#[derive(Debug, Clone, Copy, Default)]
pub struct Target;

impl DynamicOption for Target {
  fn code(&self) -> &str {
    "be_target"
  }

  fn verify(&self, declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    verify_members(declaration)
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome {
    CheckOutcome::from_bool(input.body.map_or(false, |body| body_contains(body, input.value)))
  }

  fn message(&self, ctx: &MessageContext<'_>) -> String {
    format!(
      "[{}] {} `{}` has wrong target, expected `{}`, got `{}`",
      ctx.service,
      ctx.attribute.kind().title(),
      ctx.attribute.name(),
      ctx.option_value.map(render_members).unwrap_or_default(),
      ctx.value.inspect()
    )
  }
}
