// servitor/src/validation/messages.rs

//! Default message templates for checks owned by the engine itself.
//! Option-specific templates live next to their options.

use crate::attributes::kind::AttributeKind;
use crate::attributes::spec::AttributeSpec;
use crate::value::{Value, ValueType};

pub(crate) fn required(service: &str, spec: &AttributeSpec) -> String {
  format!("[{}] Required {} `{}` is missing", service, spec.kind().label(), spec.name())
}

pub(crate) fn wrong_type(service: &str, spec: &AttributeSpec, value: &Value) -> String {
  format!(
    "[{}] Wrong type of {} `{}`, expected `{}`, got `{}`",
    service,
    spec.kind().label(),
    spec.name(),
    ValueType::join(spec.types()),
    value.type_name()
  )
}

pub(crate) fn must(service: &str, spec: &AttributeSpec, code: &str, value: &Value) -> String {
  format!(
    "[{}] {} `{}` must \"{}\", got `{}`",
    service,
    spec.kind().title(),
    spec.name(),
    code,
    value.inspect()
  )
}

pub(crate) fn syntax_error(service: &str, spec: &AttributeSpec, code: &str, error: &anyhow::Error) -> String {
  format!(
    "[{}] Syntax error inside `{}` of `{}` {}: {}",
    service,
    code,
    spec.name(),
    spec.kind().label(),
    error
  )
}

pub(crate) fn undefined(service: &str, kind: AttributeKind, name: &str) -> String {
  format!("[{}] Undefined {} attribute `{}`", service, kind.namespace(), name)
}

pub(crate) fn unassigned_output(service: &str, name: &str) -> String {
  format!("[{}] Required output attribute `{}` was not assigned", service, name)
}

pub(crate) fn unexpected_attributes(service: &str, names: &[String]) -> String {
  let listed: Vec<String> = names.iter().map(|n| format!("`{}`", n)).collect();
  format!("[{}] Unexpected attributes: {}", service, listed.join(", "))
}
