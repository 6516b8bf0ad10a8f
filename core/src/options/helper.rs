// servitor/src/options/helper.rs

//! Option helpers and the per-namespace registry that resolves option keys.

use super::{option_key, ConsistsOf, DynamicOption, Format, Inclusion, Max, Min, MultipleOf, SchemaOption, Target};
use crate::attributes::builder::AttributeBuilder;
use crate::attributes::kind::AttributeKind;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// What an option key or shorthand name expands to.
#[derive(Clone)]
pub enum OptionHelper {
  /// Rewrites the declaration, e.g. `optional` turning `required` off.
  Equivalent(Arc<dyn Fn(AttributeBuilder) -> AttributeBuilder + Send + Sync>),
  /// A rule with its own condition and message.
  Dynamic(Arc<dyn DynamicOption>),
}

impl OptionHelper {
  pub fn equivalent(f: impl Fn(AttributeBuilder) -> AttributeBuilder + Send + Sync + 'static) -> Self {
    OptionHelper::Equivalent(Arc::new(f))
  }

  pub fn dynamic(option: impl DynamicOption + 'static) -> Self {
    OptionHelper::Dynamic(Arc::new(option))
  }
}

impl fmt::Debug for OptionHelper {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OptionHelper::Equivalent(_) => f.write_str("Equivalent(<fn>)"),
      OptionHelper::Dynamic(option) => write!(f, "Dynamic({})", option.code()),
    }
  }
}

/// Name-keyed helpers for one attribute namespace. Later registrations replace earlier ones.
#[derive(Clone, Debug, Default)]
pub struct OptionHelperRegistry {
  helpers: IndexMap<String, OptionHelper>,
}

impl OptionHelperRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The built-in helpers, registered under the namespace's own key names.
  pub fn defaults_for(kind: AttributeKind) -> Self {
    let mut registry = Self::new();
    registry
      .register("optional", OptionHelper::equivalent(|attr| attr.required(false)))
      .register("consists_of", OptionHelper::dynamic(ConsistsOf))
      .register("schema", OptionHelper::dynamic(SchemaOption))
      .register("inclusion", OptionHelper::dynamic(Inclusion))
      .register(option_key(kind, "format"), OptionHelper::dynamic(Format::default()))
      .register(option_key(kind, "min"), OptionHelper::dynamic(Min))
      .register(option_key(kind, "max"), OptionHelper::dynamic(Max))
      .register(option_key(kind, "multiple_of"), OptionHelper::dynamic(MultipleOf))
      .register(option_key(kind, "target"), OptionHelper::dynamic(Target));
    registry
  }

  pub fn register(&mut self, name: impl Into<String>, helper: OptionHelper) -> &mut Self {
    self.helpers.insert(name.into(), helper);
    self
  }

  pub fn remove(&mut self, name: &str) -> Option<OptionHelper> {
    self.helpers.shift_remove(name)
  }

  pub fn get(&self, name: &str) -> Option<&OptionHelper> {
    self.helpers.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.helpers.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.helpers.keys().map(String::as_str)
  }
}
