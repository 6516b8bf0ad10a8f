// servitor/src/attributes/rule.rs

//! Declaration-side representation of rule options.
//!
//! An option value may be given as a plain literal (`format("date")`), a structured
//! rule carrying a custom message and extra properties, or a predicate closure. All
//! three are normalized into a resolved rule when the service is built.

use crate::attributes::schema::Schema;
use crate::attributes::spec::AttributeSpec;
use crate::value::{Meta, Value, ValueRange, ValueType};
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Predicate used by `must` rules and predicate-style options.
///
/// Returning `Err` does not count as a plain "false": it is reported as a syntax
/// error inside the rule, carrying the error's message.
pub type PredicateFn = Arc<dyn Fn(&Value, &AttributeSpec) -> anyhow::Result<bool> + Send + Sync>;

/// Value transformer used by `prepare` on inputs and schema fields.
pub type PrepareFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Plain validator used by `format` entries.
pub type ValidatorFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// The `is:` part of an option.
#[derive(Clone, Debug)]
pub enum OptionBody {
  Value(Value),
  Range(ValueRange),
  Types(Vec<ValueType>),
  Schema(Schema),
}

impl OptionBody {
  pub fn as_value(&self) -> Option<&Value> {
    match self {
      OptionBody::Value(value) => Some(value),
      _ => None,
    }
  }

  /// Treats a nil literal as a missing body.
  pub fn is_missing(&self) -> bool {
    match self {
      OptionBody::Value(value) => value.is_nil(),
      OptionBody::Types(types) => types.is_empty(),
      _ => false,
    }
  }
}

impl fmt::Display for OptionBody {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OptionBody::Value(value) => write!(f, "{}", value),
      OptionBody::Range(range) => write!(f, "{}", range),
      OptionBody::Types(types) => f.write_str(&ValueType::join(types)),
      OptionBody::Schema(schema) => write!(f, "{}", schema),
    }
  }
}

/// Extra named properties of a structured option, e.g. a format's `pattern`.
#[derive(Clone)]
pub enum Property {
  Value(Value),
  Pattern(Regex),
  Validator(ValidatorFn),
}

impl fmt::Debug for Property {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Property::Value(value) => write!(f, "Value({})", value.inspect()),
      Property::Pattern(regex) => write!(f, "Pattern({})", regex.as_str()),
      Property::Validator(_) => f.write_str("Validator(<fn>)"),
    }
  }
}

pub type Properties = IndexMap<String, Property>;

/// Everything a custom message callback can look at.
pub struct MessageContext<'a> {
  pub service: &'a str,
  pub attribute: &'a AttributeSpec,
  pub value: &'a Value,
  /// The option key as declared, e.g. `format`, `check_format`, `must`.
  pub option_name: &'a str,
  pub option_value: Option<&'a OptionBody>,
  /// Machine-readable failure reason reported by the rule, when it has several.
  pub reason: Option<&'a str>,
  /// Rule-reported details, e.g. `expected_type` / `given_type` / `key_name`.
  pub meta: &'a Meta,
}

impl MessageContext<'_> {
  pub fn meta_str(&self, key: &str) -> String {
    self.meta.get(key).map(|v| v.to_string()).unwrap_or_default()
  }
}

/// An error message override: a fixed string or a callback.
#[derive(Clone)]
pub enum Message {
  Static(String),
  Dynamic(Arc<dyn Fn(&MessageContext<'_>) -> String + Send + Sync>),
}

impl Message {
  pub fn dynamic(f: impl Fn(&MessageContext<'_>) -> String + Send + Sync + 'static) -> Self {
    Message::Dynamic(Arc::new(f))
  }

  pub(crate) fn render(&self, ctx: &MessageContext<'_>) -> String {
    match self {
      Message::Static(text) => text.clone(),
      Message::Dynamic(f) => f(ctx),
    }
  }
}

impl fmt::Debug for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Message::Static(text) => write!(f, "Static({:?})", text),
      Message::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
    }
  }
}

impl From<&str> for Message {
  fn from(text: &str) -> Self {
    Message::Static(text.to_string())
  }
}

impl From<String> for Message {
  fn from(text: String) -> Self {
    Message::Static(text)
  }
}

/// `{ is:, message:, pattern:, validator:, ... }`
#[derive(Clone, Default, Debug)]
pub struct StructuredRule {
  pub is: Option<OptionBody>,
  pub message: Option<Message>,
  pub properties: Properties,
}

impl StructuredRule {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is(mut self, body: impl Into<RuleConfig>) -> Self {
    self.is = body.into().into_body();
    self
  }

  pub fn message(mut self, message: impl Into<Message>) -> Self {
    self.message = Some(message.into());
    self
  }

  pub fn pattern(mut self, pattern: Regex) -> Self {
    self.properties.insert("pattern".to_string(), Property::Pattern(pattern));
    self
  }

  pub fn validator(mut self, validator: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
    self.properties.insert("validator".to_string(), Property::Validator(Arc::new(validator)));
    self
  }

  pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.properties.insert(key.into(), Property::Value(value.into()));
    self
  }
}

/// How an option was written at the declaration site.
#[derive(Clone)]
pub enum RuleConfig {
  Literal(OptionBody),
  Structured(StructuredRule),
  /// Replaces the option's built-in condition, keeping its message.
  Predicate(PredicateFn),
}

impl RuleConfig {
  pub fn value(value: impl Into<Value>) -> Self {
    RuleConfig::Literal(OptionBody::Value(value.into()))
  }

  pub fn types(types: impl IntoTypes) -> Self {
    RuleConfig::Literal(OptionBody::Types(types.into_types()))
  }

  pub fn predicate(f: impl Fn(&Value, &AttributeSpec) -> anyhow::Result<bool> + Send + Sync + 'static) -> Self {
    RuleConfig::Predicate(Arc::new(f))
  }

  fn into_body(self) -> Option<OptionBody> {
    match self {
      RuleConfig::Literal(body) => Some(body),
      RuleConfig::Structured(rule) => rule.is,
      RuleConfig::Predicate(_) => None,
    }
  }
}

impl fmt::Debug for RuleConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RuleConfig::Literal(body) => f.debug_tuple("Literal").field(body).finish(),
      RuleConfig::Structured(rule) => f.debug_tuple("Structured").field(rule).finish(),
      RuleConfig::Predicate(_) => f.write_str("Predicate(<fn>)"),
    }
  }
}

macro_rules! literal_rule_config {
  ($($t:ty),*) => {
    $(
      impl From<$t> for RuleConfig {
        fn from(v: $t) -> Self {
          RuleConfig::value(v)
        }
      }
    )*
  };
}

literal_rule_config!(bool, i32, i64, u32, f64, &str, String, Value);

impl<T: Into<Value>> From<Vec<T>> for RuleConfig {
  fn from(items: Vec<T>) -> Self {
    RuleConfig::value(Value::array(items))
  }
}

impl From<ValueRange> for RuleConfig {
  fn from(range: ValueRange) -> Self {
    RuleConfig::Literal(OptionBody::Range(range))
  }
}

impl From<std::ops::RangeInclusive<i64>> for RuleConfig {
  fn from(range: std::ops::RangeInclusive<i64>) -> Self {
    RuleConfig::Literal(OptionBody::Range(range.into()))
  }
}

impl From<ValueType> for RuleConfig {
  fn from(t: ValueType) -> Self {
    RuleConfig::types(t)
  }
}

impl<const N: usize> From<[ValueType; N]> for RuleConfig {
  fn from(types: [ValueType; N]) -> Self {
    RuleConfig::types(types)
  }
}

impl From<Schema> for RuleConfig {
  fn from(schema: Schema) -> Self {
    RuleConfig::Literal(OptionBody::Schema(schema))
  }
}

impl From<StructuredRule> for RuleConfig {
  fn from(rule: StructuredRule) -> Self {
    RuleConfig::Structured(rule)
  }
}

/// Anything that can stand for "one or more accepted types".
pub trait IntoTypes {
  fn into_types(self) -> Vec<ValueType>;
}

impl IntoTypes for ValueType {
  fn into_types(self) -> Vec<ValueType> {
    vec![self]
  }
}

impl IntoTypes for Vec<ValueType> {
  fn into_types(self) -> Vec<ValueType> {
    self
  }
}

impl IntoTypes for &[ValueType] {
  fn into_types(self) -> Vec<ValueType> {
    self.to_vec()
  }
}

impl<const N: usize> IntoTypes for [ValueType; N] {
  fn into_types(self) -> Vec<ValueType> {
    self.to_vec()
  }
}

/// A user-defined `must` rule: a code naming the expectation and its predicate.
#[derive(Clone)]
pub struct MustRule {
  pub(crate) code: String,
  pub(crate) predicate: PredicateFn,
  pub(crate) message: Option<Message>,
}

impl MustRule {
  pub fn new(
    code: impl Into<String>,
    predicate: impl Fn(&Value, &AttributeSpec) -> anyhow::Result<bool> + Send + Sync + 'static,
  ) -> Self {
    Self {
      code: code.into(),
      predicate: Arc::new(predicate),
      message: None,
    }
  }

  pub fn message(mut self, message: impl Into<Message>) -> Self {
    self.message = Some(message.into());
    self
  }
}

impl fmt::Debug for MustRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MustRule")
      .field("code", &self.code)
      .field("message", &self.message)
      .finish()
  }
}
