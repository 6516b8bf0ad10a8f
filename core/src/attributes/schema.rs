// servitor/src/attributes/schema.rs

//! Declared shape of a Hash-typed attribute.

use crate::attributes::rule::{IntoTypes, PrepareFn};
use crate::value::{Value, ValueType};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// An ordered set of expected keys.
#[derive(Clone, Debug, Default)]
pub struct Schema {
  fields: IndexMap<String, SchemaField>,
}

impl Schema {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn field(mut self, key: impl Into<String>, field: SchemaField) -> Self {
    self.fields.insert(key.into(), field);
    self
  }

  pub fn fields(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
    self.fields.iter().map(|(k, f)| (k.as_str(), f))
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  /// Fills in defaults and runs field `prepare` callbacks, recursing into nested schemas.
  ///
  /// Keys the schema does not mention are kept as they are.
  pub fn normalize(&self, value: Value) -> Value {
    let mut map = match value {
      Value::Hash(map) => map,
      other => return other,
    };

    for (key, field) in &self.fields {
      if let Some(nested) = &field.nested {
        match map.get_mut(key) {
          Some(child @ Value::Hash(_)) => {
            let taken = std::mem::take(child);
            *child = nested.normalize(taken);
          }
          None => {
            let child = nested.normalize(Value::Hash(IndexMap::new()));
            map.insert(key.clone(), child);
          }
          Some(_) => {}
        }
        continue;
      }

      let current = map.get(key).cloned().unwrap_or_default();
      let mut prepared = current;
      if !field.required && prepared.is_blank() {
        if let Some(default) = &field.default {
          prepared = default.clone();
        }
      }
      if let Some(prepare) = &field.prepare {
        if prepared.is_present() {
          prepared = prepare(prepared);
        }
      }
      if map.contains_key(key) || !prepared.is_nil() {
        map.insert(key.clone(), prepared);
      }
    }

    Value::Hash(map)
  }
}

impl fmt::Display for Schema {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let body = self
      .fields
      .iter()
      .map(|(key, field)| format!("{}: {}", key, ValueType::join(&field.types)))
      .collect::<Vec<_>>()
      .join(", ");
    write!(f, "{{{}}}", body)
  }
}

/// One key of a [`Schema`].
#[derive(Clone)]
pub struct SchemaField {
  pub(crate) types: Vec<ValueType>,
  pub(crate) required: bool,
  pub(crate) default: Option<Value>,
  pub(crate) prepare: Option<PrepareFn>,
  pub(crate) nested: Option<Schema>,
}

impl SchemaField {
  /// A required field accepting `types`.
  pub fn new(types: impl IntoTypes) -> Self {
    Self {
      types: types.into_types(),
      required: true,
      default: None,
      prepare: None,
      nested: None,
    }
  }

  /// A required Hash field validated against `schema`.
  pub fn nested(schema: Schema) -> Self {
    Self {
      nested: Some(schema),
      ..Self::new(ValueType::Hash)
    }
  }

  pub fn optional(mut self) -> Self {
    self.required = false;
    self
  }

  pub fn required(mut self, required: bool) -> Self {
    self.required = required;
    self
  }

  pub fn default(mut self, value: impl Into<Value>) -> Self {
    self.default = Some(value.into());
    self
  }

  pub fn prepare(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
    self.prepare = Some(Arc::new(f));
    self
  }

  pub fn types(&self) -> &[ValueType] {
    &self.types
  }

  pub fn is_required(&self) -> bool {
    self.required
  }

  pub fn default_value(&self) -> Option<&Value> {
    self.default.as_ref()
  }

  pub fn nested_schema(&self) -> Option<&Schema> {
    self.nested.as_ref()
  }
}

impl fmt::Debug for SchemaField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SchemaField")
      .field("types", &self.types)
      .field("required", &self.required)
      .field("default", &self.default)
      .field("prepare_present", &self.prepare.is_some())
      .field("nested", &self.nested)
      .finish()
  }
}
