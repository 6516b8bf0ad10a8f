// servitor/src/options/mod.rs

//! Dynamic options: named rules that expand a declared option value into a
//! concrete check plus a default message.
//!
//! Every option implements [`DynamicOption`]. Options are looked up by key in the
//! per-namespace [`OptionHelperRegistry`] held by the service's configuration, so a
//! service can add its own or replace the built-in ones.

pub mod consists_of;
pub mod format;
pub mod helper;
pub mod inclusion;
pub mod min_max;
pub mod multiple_of;
pub mod schema;
pub mod target;

use crate::attributes::kind::AttributeKind;
use crate::attributes::rule::{MessageContext, OptionBody, Properties};
use crate::attributes::spec::AttributeSpec;
use crate::value::{Meta, Value, ValueType};

pub use consists_of::ConsistsOf;
pub use format::{Format, FormatEntry};
pub use helper::{OptionHelper, OptionHelperRegistry};
pub use inclusion::Inclusion;
pub use min_max::{Max, Min};
pub use multiple_of::MultipleOf;
pub use schema::SchemaOption;
pub use target::Target;

/// Order in which resolved rules run. Rules of the same phase keep declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RulePhase {
  Inclusion,
  Must,
  ConsistsOf,
  Schema,
}

/// Result of evaluating one rule against one value.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
  Pass,
  Fail { reason: Option<String>, meta: Meta },
}

impl CheckOutcome {
  pub fn fail() -> Self {
    CheckOutcome::Fail {
      reason: None,
      meta: Meta::new(),
    }
  }

  pub fn fail_because(reason: impl Into<String>) -> Self {
    CheckOutcome::Fail {
      reason: Some(reason.into()),
      meta: Meta::new(),
    }
  }

  pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    if let CheckOutcome::Fail { meta, .. } = &mut self {
      meta.insert(key.into(), value.into());
    }
    self
  }

  pub fn from_bool(passed: bool) -> Self {
    if passed {
      CheckOutcome::Pass
    } else {
      CheckOutcome::fail()
    }
  }

  pub fn is_pass(&self) -> bool {
    matches!(self, CheckOutcome::Pass)
  }
}

/// What a rule sees at check time.
pub struct RuleInput<'a> {
  pub service: &'a str,
  pub attribute: &'a AttributeSpec,
  pub value: &'a Value,
  pub option_name: &'a str,
  pub body: Option<&'a OptionBody>,
  pub properties: &'a Properties,
}

/// What a rule sees when the service is built, before any call.
pub struct OptionDeclaration<'a> {
  pub service: &'a str,
  pub attribute: &'a AttributeSpec,
  pub option_name: &'a str,
  pub body: Option<&'a OptionBody>,
  pub properties: &'a Properties,
  pub collection_mode_types: &'a [ValueType],
  pub hash_mode_types: &'a [ValueType],
}

impl OptionDeclaration<'_> {
  pub fn kind(&self) -> AttributeKind {
    self.attribute.kind()
  }

  /// `"[Service] Input `name` has missing value in `option` option"`
  pub fn missing_value(&self) -> String {
    format!(
      "[{}] {} `{}` has missing value in `{}` option",
      self.service,
      self.kind().title(),
      self.attribute.name(),
      self.option_name
    )
  }
}

/// A pluggable rule behind an option key.
pub trait DynamicOption: Send + Sync {
  /// Code the rule runs under, e.g. `be_in_format`. Shown in syntax-error messages.
  fn code(&self) -> &str;

  fn phase(&self) -> RulePhase {
    RulePhase::Must
  }

  /// Rejects malformed option values when the service is built.
  ///
  /// The returned string is the complete configuration error message.
  fn verify(&self, _declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    Ok(())
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome;

  fn message(&self, ctx: &MessageContext<'_>) -> String;
}

/// Canonical option names map to a namespace's own key names.
///
/// Internal attributes read `check_format`, `minimum`, `maximum`, `divisible_by` and
/// `expect`; outputs read `minimum` and `maximum`; inputs use the short forms.
pub fn option_key(kind: AttributeKind, canonical: &str) -> &str {
  match (kind, canonical) {
    (AttributeKind::Internal, "format") => "check_format",
    (AttributeKind::Internal, "min") | (AttributeKind::Output, "min") => "minimum",
    (AttributeKind::Internal, "max") | (AttributeKind::Output, "max") => "maximum",
    (AttributeKind::Internal, "multiple_of") => "divisible_by",
    (AttributeKind::Internal, "target") => "expect",
    (_, other) => other,
  }
}

/// True when the value may skip rules: blank, and either an optional input or an
/// attribute whose types admit `Nil`.
pub(crate) fn blank_allowed(attribute: &AttributeSpec, value: &Value) -> bool {
  if !value.is_blank() {
    return false;
  }
  let optional_input = attribute.kind() == AttributeKind::Input && !attribute.is_required();
  optional_input || attribute.types().contains(&ValueType::Nil)
}
