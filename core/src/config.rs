// servitor/src/config.rs

//! Service configuration.
//!
//! A process-wide default is kept behind a lock and edited with [`configure`].
//! Every `ServiceBuilder` takes a snapshot of it when created and may adjust its own
//! copy; a built service never reads the global again.

use crate::attributes::kind::AttributeKind;
use crate::options::{OptionHelper, OptionHelperRegistry};
use crate::value::ValueType;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// How input validation reports problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
  /// Stop at the first failing input.
  #[default]
  FirstError,
  /// Validate every input; the error carries the first message and lists all of
  /// them under `meta["errors"]`.
  AllErrors,
}

#[derive(Clone, Debug)]
pub struct Configuration {
  input_option_helpers: OptionHelperRegistry,
  internal_option_helpers: OptionHelperRegistry,
  output_option_helpers: OptionHelperRegistry,
  collection_mode_types: Vec<ValueType>,
  hash_mode_types: Vec<ValueType>,
  predicate_methods_enabled: bool,
  validation_mode: ValidationMode,
}

impl Default for Configuration {
  fn default() -> Self {
    Self {
      input_option_helpers: OptionHelperRegistry::defaults_for(AttributeKind::Input),
      internal_option_helpers: OptionHelperRegistry::defaults_for(AttributeKind::Internal),
      output_option_helpers: OptionHelperRegistry::defaults_for(AttributeKind::Output),
      collection_mode_types: vec![ValueType::Array, ValueType::Set],
      hash_mode_types: vec![ValueType::Hash],
      predicate_methods_enabled: true,
      validation_mode: ValidationMode::FirstError,
    }
  }
}

impl Configuration {
  pub fn option_helpers(&self, kind: AttributeKind) -> &OptionHelperRegistry {
    match kind {
      AttributeKind::Input => &self.input_option_helpers,
      AttributeKind::Internal => &self.internal_option_helpers,
      AttributeKind::Output => &self.output_option_helpers,
    }
  }

  pub fn option_helpers_mut(&mut self, kind: AttributeKind) -> &mut OptionHelperRegistry {
    match kind {
      AttributeKind::Input => &mut self.input_option_helpers,
      AttributeKind::Internal => &mut self.internal_option_helpers,
      AttributeKind::Output => &mut self.output_option_helpers,
    }
  }

  /// Registers a helper for one namespace.
  pub fn register_option_helper(
    &mut self,
    kind: AttributeKind,
    name: impl Into<String>,
    helper: OptionHelper,
  ) -> &mut Self {
    self.option_helpers_mut(kind).register(name, helper);
    self
  }

  /// Registers a helper for all three namespaces under the same name.
  pub fn register_shared_option_helper(&mut self, name: impl Into<String>, helper: OptionHelper) -> &mut Self {
    let name = name.into();
    for kind in [AttributeKind::Input, AttributeKind::Internal, AttributeKind::Output] {
      self.option_helpers_mut(kind).register(name.clone(), helper.clone());
    }
    self
  }

  pub fn collection_mode_types(&self) -> &[ValueType] {
    &self.collection_mode_types
  }

  pub fn set_collection_mode_types(&mut self, types: Vec<ValueType>) -> &mut Self {
    self.collection_mode_types = types;
    self
  }

  pub fn hash_mode_types(&self) -> &[ValueType] {
    &self.hash_mode_types
  }

  pub fn set_hash_mode_types(&mut self, types: Vec<ValueType>) -> &mut Self {
    self.hash_mode_types = types;
    self
  }

  pub fn predicate_methods_enabled(&self) -> bool {
    self.predicate_methods_enabled
  }

  pub fn set_predicate_methods_enabled(&mut self, enabled: bool) -> &mut Self {
    self.predicate_methods_enabled = enabled;
    self
  }

  pub fn validation_mode(&self) -> ValidationMode {
    self.validation_mode
  }

  pub fn set_validation_mode(&mut self, mode: ValidationMode) -> &mut Self {
    self.validation_mode = mode;
    self
  }

  /// Snapshot of the process-wide default.
  pub fn global() -> Configuration {
    GLOBAL_CONFIGURATION.read().clone()
  }
}

static GLOBAL_CONFIGURATION: Lazy<RwLock<Configuration>> = Lazy::new(|| RwLock::new(Configuration::default()));

/// Edits the process-wide default configuration.
///
/// Only services whose builders are created afterwards see the change.
pub fn configure(f: impl FnOnce(&mut Configuration)) {
  let mut guard = GLOBAL_CONFIGURATION.write();
  f(&mut guard);
}

/// Restores the built-in defaults.
pub fn reset_configuration() {
  *GLOBAL_CONFIGURATION.write() = Configuration::default();
}
