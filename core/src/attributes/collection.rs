// servitor/src/attributes/collection.rs

//! Ordered, name-unique attribute sets for one namespace.

use crate::attributes::kind::AttributeKind;
use crate::attributes::spec::AttributeSpec;
use crate::error::ServiceError;
use indexmap::IndexMap;

/// Names that would shadow the execution context's own accessors.
pub const RESERVED_NAMES: &[&str] = &[
  "inputs",
  "internals",
  "outputs",
  "input",
  "internal",
  "output",
  "success",
  "fail",
  "fail_input",
  "fail_internal",
  "fail_output",
  "fail_result",
  "call",
];

#[derive(Clone, Debug)]
pub struct AttributeCollection {
  kind: AttributeKind,
  attributes: IndexMap<String, AttributeSpec>,
}

impl AttributeCollection {
  pub fn new(kind: AttributeKind) -> Self {
    Self {
      kind,
      attributes: IndexMap::new(),
    }
  }

  pub fn kind(&self) -> AttributeKind {
    self.kind
  }

  /// Adds a declaration; redeclaring a name replaces it in place.
  pub(crate) fn insert(&mut self, spec: AttributeSpec) {
    self.attributes.insert(spec.name().to_string(), spec);
  }

  pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
    self.attributes.get(name)
  }

  /// Lookup by the name steps use, which differs from the declared one under `as`.
  pub fn find_by_access_name(&self, name: &str) -> Option<&AttributeSpec> {
    self.attributes.values().find(|spec| spec.access_name() == name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.attributes.contains_key(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &AttributeSpec> {
    self.attributes.values()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.attributes.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.attributes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.attributes.is_empty()
  }

  pub(crate) fn check_reserved_names(&self, service: &str) -> Result<(), ServiceError> {
    let offending: Vec<&str> = self
      .iter()
      .map(AttributeSpec::access_name)
      .filter(|name| RESERVED_NAMES.contains(name))
      .collect();
    if offending.is_empty() {
      return Ok(());
    }
    Err(ServiceError::configuration(
      service,
      format!(
        "[{}] Reserved {} names used: {}",
        service,
        self.kind.label(),
        quoted_list(&offending)
      ),
    ))
  }

  /// Internal and output names share the step-facing namespace and must not overlap.
  pub(crate) fn check_overlap(internals: &Self, outputs: &Self, service: &str) -> Result<(), ServiceError> {
    let shared: Vec<&str> = internals.names().filter(|name| outputs.contains(name)).collect();
    if shared.is_empty() {
      return Ok(());
    }
    Err(ServiceError::configuration(
      service,
      format!(
        "[{}] Conflict between internal and output attributes: {}",
        service,
        quoted_list(&shared)
      ),
    ))
  }
}

fn quoted_list(names: &[&str]) -> String {
  names.iter().map(|n| format!("`{}`", n)).collect::<Vec<_>>().join(", ")
}
