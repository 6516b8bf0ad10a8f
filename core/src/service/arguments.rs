// servitor/src/service/arguments.rs

use crate::value::Value;
use indexmap::IndexMap;

/// Call-time arguments, keyed by declared input name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(IndexMap<String, Value>);

impl Arguments {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.insert(name, value);
    self
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
    self.0.insert(name.into(), value.into());
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.0.get(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub(crate) fn into_inner(self) -> IndexMap<String, Value> {
    self.0
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Arguments {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Arguments {
  fn from(entries: [(K, V); N]) -> Self {
    entries.into_iter().collect()
  }
}

impl From<IndexMap<String, Value>> for Arguments {
  fn from(map: IndexMap<String, Value>) -> Self {
    Self(map)
  }
}

impl From<()> for Arguments {
  fn from(_: ()) -> Self {
    Self::default()
  }
}
