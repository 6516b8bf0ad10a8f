// servitor/src/options/schema.rs

//! `schema`: key-by-key checks for Hash attributes.

use super::{blank_allowed, CheckOutcome, DynamicOption, OptionDeclaration, RuleInput, RulePhase};
use crate::attributes::rule::{MessageContext, OptionBody};
use crate::attributes::schema::Schema;
use crate::value::{Value, ValueType, NIL};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaOption;

/// First mismatch found while walking a schema.
struct Mismatch {
  reason: &'static str,
  key_path: Vec<String>,
  expected: String,
  given: String,
}

impl DynamicOption for SchemaOption {
  fn code(&self) -> &str {
    "match_schema"
  }

  fn phase(&self) -> RulePhase {
    RulePhase::Schema
  }

  fn verify(&self, declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    if !matches!(declaration.body, Some(OptionBody::Schema(_))) {
      return Err(declaration.missing_value());
    }
    let is_hash = declaration
      .attribute
      .types()
      .iter()
      .any(|t| declaration.hash_mode_types.contains(t));
    if !is_hash {
      return Err(format!(
        "[{}] {} `{}` uses `{}` but is not declared as a hash (`{}`)",
        declaration.service,
        declaration.kind().title(),
        declaration.attribute.name(),
        declaration.option_name,
        ValueType::join(declaration.hash_mode_types)
      ));
    }
    Ok(())
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome {
    let Some(OptionBody::Schema(schema)) = input.body else {
      return CheckOutcome::fail();
    };
    if blank_allowed(input.attribute, input.value) {
      return CheckOutcome::Pass;
    }
    let Some(map) = input.value.as_hash() else {
      return CheckOutcome::Pass;
    };

    let mut path = Vec::new();
    match check_object(schema, map, &mut path) {
      Ok(()) => CheckOutcome::Pass,
      Err(mismatch) => CheckOutcome::fail_because(mismatch.reason)
        .with_meta("key_name", mismatch.key_path.last().cloned().unwrap_or_default())
        .with_meta("key_path", mismatch.key_path.join("."))
        .with_meta("expected_type", mismatch.expected)
        .with_meta("given_type", mismatch.given),
    }
  }

  fn message(&self, ctx: &MessageContext<'_>) -> String {
    let kind = ctx.attribute.kind();
    match ctx.reason {
      Some("wrong_element_value") => format!(
        "[{}] Wrong value in {} `{}`, expected value of type `{}` for `{}`, got `{}`",
        ctx.service,
        kind.hash_label(),
        ctx.attribute.name(),
        ctx.meta_str("expected_type"),
        ctx.meta_str("key_name"),
        ctx.meta_str("given_type")
      ),
      _ => format!(
        "[{}] Wrong type in {} `{}`, expected `{}` for `{}`, got `{}`",
        ctx.service,
        kind.hash_label(),
        ctx.attribute.name(),
        ctx.meta_str("expected_type"),
        ctx.meta_str("key_name"),
        ctx.meta_str("given_type")
      ),
    }
  }
}

fn check_object(schema: &Schema, map: &IndexMap<String, Value>, path: &mut Vec<String>) -> Result<(), Mismatch> {
  for (key, field) in schema.fields() {
    path.push(key.to_string());
    let current = map.get(key).unwrap_or(&NIL);

    if let Some(nested) = field.nested_schema() {
      match current {
        Value::Hash(child) => check_object(nested, child, path)?,
        Value::Nil if !map.contains_key(key) => check_object(nested, &IndexMap::new(), path)?,
        Value::Nil if !field.is_required() => {}
        other => {
          return Err(Mismatch {
            reason: "wrong_element_value",
            key_path: path.clone(),
            expected: ValueType::join(field.types()),
            given: other.type_name().to_string(),
          })
        }
      }
      path.pop();
      continue;
    }

    let has_default = field.default_value().is_some();
    if field.is_required() || has_default || current.is_present() {
      let prepared = match field.default_value() {
        Some(default) if !field.is_required() && current.is_blank() => default,
        _ => current,
      };
      if !ValueType::matches_any(field.types(), prepared) {
        return Err(Mismatch {
          reason: "wrong_element_type",
          key_path: path.clone(),
          expected: ValueType::join(field.types()),
          given: prepared.type_name().to_string(),
        });
      }
    }
    path.pop();
  }
  Ok(())
}
