// servitor/src/attributes/spec.rs

//! Resolved, immutable attribute declarations.

use crate::attributes::kind::AttributeKind;
use crate::attributes::rule::{Message, OptionBody, PredicateFn, PrepareFn, Properties};
use crate::options::{DynamicOption, RulePhase};
use crate::value::{Value, ValueType};
use std::fmt;
use std::sync::Arc;

/// One declared input, internal or output, after its options were resolved.
#[derive(Clone)]
pub struct AttributeSpec {
  pub(crate) kind: AttributeKind,
  pub(crate) name: String,
  pub(crate) alias: Option<String>,
  pub(crate) types: Vec<ValueType>,
  pub(crate) required: bool,
  pub(crate) required_message: Option<Message>,
  pub(crate) default: Option<Value>,
  pub(crate) prepare: Option<PrepareFn>,
  pub(crate) rules: Vec<ResolvedRule>,
}

impl AttributeSpec {
  pub fn kind(&self) -> AttributeKind {
    self.kind
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Name steps read the value under: the `as` alias when one is set.
  pub fn access_name(&self) -> &str {
    self.alias.as_deref().unwrap_or(&self.name)
  }

  pub fn types(&self) -> &[ValueType] {
    &self.types
  }

  pub fn is_required(&self) -> bool {
    self.required
  }

  pub fn is_optional(&self) -> bool {
    !self.required
  }

  pub fn default_value(&self) -> Option<&Value> {
    self.default.as_ref()
  }

  pub fn has_prepare(&self) -> bool {
    self.prepare.is_some()
  }

  /// Declared option keys in the order they run, e.g. `["inclusion", "must", "format"]`.
  pub fn option_names(&self) -> Vec<&str> {
    self.rules.iter().map(|r| r.option_name.as_str()).collect()
  }

  pub fn has_option(&self, option_name: &str) -> bool {
    self.rules.iter().any(|r| r.option_name == option_name)
  }

  pub(crate) fn rules(&self) -> &[ResolvedRule] {
    &self.rules
  }

  pub(crate) fn has_phase(&self, phase: RulePhase) -> bool {
    self.rules.iter().any(|r| r.phase == phase)
  }
}

impl fmt::Debug for AttributeSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AttributeSpec")
      .field("kind", &self.kind)
      .field("name", &self.name)
      .field("alias", &self.alias)
      .field("types", &self.types)
      .field("required", &self.required)
      .field("default", &self.default)
      .field("prepare_present", &self.prepare.is_some())
      .field("options", &self.option_names())
      .finish()
  }
}

/// A rule in its uniform, check-ready form.
#[derive(Clone)]
pub(crate) struct ResolvedRule {
  /// Key as declared (`format`, `minimum`, `must`, ...).
  pub(crate) option_name: String,
  pub(crate) code: String,
  pub(crate) phase: RulePhase,
  pub(crate) option: Option<Arc<dyn DynamicOption>>,
  /// When set, replaces the option's own condition.
  pub(crate) predicate: Option<PredicateFn>,
  pub(crate) body: Option<OptionBody>,
  pub(crate) message: Option<Message>,
  pub(crate) properties: Properties,
}
