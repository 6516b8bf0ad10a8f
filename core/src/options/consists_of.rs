// servitor/src/options/consists_of.rs

//! `consists_of`: element checks for Array/Set attributes.
//!
//! Nested arrays are flattened first. Every element must be present unless `Nil`
//! is among the element types, and every element must match one of them.

use super::{CheckOutcome, DynamicOption, OptionDeclaration, RuleInput, RulePhase};
use crate::attributes::kind::AttributeKind;
use crate::attributes::rule::{MessageContext, OptionBody};
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistsOf;

impl DynamicOption for ConsistsOf {
  fn code(&self) -> &str {
    "consist_of"
  }

  fn phase(&self) -> RulePhase {
    RulePhase::ConsistsOf
  }

  fn verify(&self, declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    if element_types(declaration.body).map_or(true, |types| types.is_empty()) {
      return Err(declaration.missing_value());
    }
    let is_collection = declaration
      .attribute
      .types()
      .iter()
      .any(|t| declaration.collection_mode_types.contains(t));
    if !is_collection {
      return Err(format!(
        "[{}] {} `{}` uses `{}` but is not declared as a collection (`{}`)",
        declaration.service,
        declaration.kind().title(),
        declaration.attribute.name(),
        declaration.option_name,
        ValueType::join(declaration.collection_mode_types)
      ));
    }
    Ok(())
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome {
    let Some(types) = element_types(input.body) else {
      return CheckOutcome::fail();
    };
    let Some(items) = input.value.as_slice() else {
      // Not a collection at all; the type check owns that failure.
      return CheckOutcome::Pass;
    };

    let elements = flatten(items);

    if !types.contains(&ValueType::Nil) && presence_required(input) {
      if let Some(index) = elements.iter().position(|e| e.is_blank()) {
        return CheckOutcome::fail_because("required").with_meta("index", Value::count(index));
      }
    }

    let mut first_offender: Option<(usize, &Value)> = None;
    let mut given: Vec<&str> = Vec::new();
    for (index, element) in elements.iter().enumerate() {
      if ValueType::matches_any(types, element) {
        continue;
      }
      first_offender.get_or_insert((index, *element));
      if !given.contains(&element.type_name()) {
        given.push(element.type_name());
      }
    }

    match first_offender {
      None => CheckOutcome::Pass,
      Some((index, element)) => CheckOutcome::fail_because("wrong_element_type")
        .with_meta("expected_type", ValueType::join(types))
        .with_meta("given_type", given.join(", "))
        .with_meta("index", Value::count(index))
        .with_meta("value", element.clone()),
    }
  }

  fn message(&self, ctx: &MessageContext<'_>) -> String {
    let kind = ctx.attribute.kind();
    match ctx.reason {
      Some("required") => format!(
        "[{}] Required element in {} `{}` is missing",
        ctx.service,
        kind.collection_label(),
        ctx.attribute.name()
      ),
      _ => format!(
        "[{}] Wrong element type in {} `{}`, expected `{}`, got `{}`",
        ctx.service,
        kind.collection_label(),
        ctx.attribute.name(),
        ctx.meta_str("expected_type"),
        ctx.meta_str("given_type")
      ),
    }
  }
}

fn element_types(body: Option<&OptionBody>) -> Option<&[ValueType]> {
  match body {
    Some(OptionBody::Types(types)) => Some(types.as_slice()),
    _ => None,
  }
}

fn flatten(items: &[Value]) -> Vec<&Value> {
  let mut out = Vec::with_capacity(items.len());
  for item in items {
    match item {
      Value::Array(nested) => out.extend(flatten(nested)),
      other => out.push(other),
    }
  }
  out
}

/// Inputs only demand present elements when required, or when optional and non-empty.
fn presence_required(input: &RuleInput<'_>) -> bool {
  match input.attribute.kind() {
    AttributeKind::Input => input.attribute.is_required() || input.value.is_present(),
    _ => true,
  }
}
