// servitor/src/value.rs

//! Dynamic values carried by inputs, internals and outputs, together with the
//! type descriptors (`ValueType`) and ranges (`ValueRange`) that rules check them against.

use indexmap::IndexMap;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::num::TryFromIntError;
use std::ops::{Range, RangeFrom, RangeInclusive, RangeToInclusive};
use std::sync::Arc;

/// Structured metadata attached to errors and failures.
pub type Meta = IndexMap<String, Value>;

/// Shared nil, for lookups that fall back to a borrowed value.
pub(crate) static NIL: Value = Value::Nil;

/// A shared, type-erased host object stored inside a `Value`.
///
/// The `type_name` is what type checks and messages see; it is chosen by the caller
/// so that domain names ("User", "Invoice") show up in error messages.
#[derive(Clone)]
pub struct ObjectRef {
  type_name: Arc<str>,
  inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
  pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
    Self {
      type_name: Arc::from(type_name.into()),
      inner: Arc::new(value),
    }
  }

  pub fn type_name(&self) -> &str {
    &self.type_name
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.inner.downcast_ref::<T>()
  }

  pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for ObjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#<{}>", self.type_name)
  }
}

/// A dynamically typed value.
///
/// `Set` keeps insertion order and holds no duplicates; build it with [`Value::set`].
#[derive(Clone, Default)]
pub enum Value {
  #[default]
  Nil,
  Boolean(bool),
  Integer(i64),
  Float(f64),
  String(String),
  Symbol(String),
  Array(Vec<Value>),
  Set(Vec<Value>),
  Hash(IndexMap<String, Value>),
  Object(ObjectRef),
}

impl Value {
  pub fn symbol(name: impl Into<String>) -> Self {
    Value::Symbol(name.into())
  }

  pub fn object<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
    Value::Object(ObjectRef::new(type_name, value))
  }

  /// Builds a `Set`, dropping repeated elements while keeping first-seen order.
  pub fn set<I, V>(items: I) -> Self
  where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
  {
    let mut unique: Vec<Value> = Vec::new();
    for item in items {
      let item = item.into();
      if !unique.contains(&item) {
        unique.push(item);
      }
    }
    Value::Set(unique)
  }

  /// A length or index as an `Integer`. Allocations never exceed `isize::MAX`,
  /// so the conversion only saturates on targets wider than 64 bits.
  pub fn count(n: usize) -> Self {
    Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
  }

  pub fn array<I, V>(items: I) -> Self
  where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
  {
    Value::Array(items.into_iter().map(Into::into).collect())
  }

  pub fn hash<I, K, V>(entries: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
  {
    Value::Hash(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }

  /// Name of the runtime type, as used in "got `...`" parts of messages.
  pub fn type_name(&self) -> &str {
    match self {
      Value::Nil => "Nil",
      Value::Boolean(_) => "Boolean",
      Value::Integer(_) => "Integer",
      Value::Float(_) => "Float",
      Value::String(_) => "String",
      Value::Symbol(_) => "Symbol",
      Value::Array(_) => "Array",
      Value::Set(_) => "Set",
      Value::Hash(_) => "Hash",
      Value::Object(obj) => obj.type_name(),
    }
  }

  pub fn is_nil(&self) -> bool {
    matches!(self, Value::Nil)
  }

  /// Present means not nil and, for strings and collections, not empty.
  pub fn is_present(&self) -> bool {
    match self {
      Value::Nil => false,
      Value::String(s) | Value::Symbol(s) => !s.is_empty(),
      Value::Array(items) | Value::Set(items) => !items.is_empty(),
      Value::Hash(map) => !map.is_empty(),
      _ => true,
    }
  }

  pub fn is_blank(&self) -> bool {
    !self.is_present()
  }

  /// Truthiness used by `<name>?` predicates: false, nil, zero and blank values are false.
  pub fn query(&self) -> bool {
    match self {
      Value::Nil => false,
      Value::Boolean(b) => *b,
      Value::Integer(i) => *i != 0,
      Value::Float(f) => *f != 0.0,
      Value::String(s) | Value::Symbol(s) => !s.trim().is_empty(),
      other => other.is_present(),
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Boolean(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Integer(i) => Some(*i),
      _ => None,
    }
  }

  /// Integers widen to floats here.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Integer(i) => Some(*i as f64),
      Value::Float(f) => Some(*f),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) | Value::Symbol(s) => Some(s.as_str()),
      _ => None,
    }
  }

  /// Elements of an `Array` or a `Set`.
  pub fn as_slice(&self) -> Option<&[Value]> {
    match self {
      Value::Array(items) | Value::Set(items) => Some(items.as_slice()),
      _ => None,
    }
  }

  pub fn as_hash(&self) -> Option<&IndexMap<String, Value>> {
    match self {
      Value::Hash(map) => Some(map),
      _ => None,
    }
  }

  pub fn as_object<T: Any>(&self) -> Option<&T> {
    match self {
      Value::Object(obj) => obj.downcast_ref::<T>(),
      _ => None,
    }
  }

  pub fn is_numeric(&self) -> bool {
    matches!(self, Value::Integer(_) | Value::Float(_))
  }

  /// Length for strings (in characters) and collections; `None` for everything else.
  pub fn size(&self) -> Option<usize> {
    match self {
      Value::String(s) | Value::Symbol(s) => Some(s.chars().count()),
      Value::Array(items) | Value::Set(items) => Some(items.len()),
      Value::Hash(map) => Some(map.len()),
      _ => None,
    }
  }

  /// Looks up a key in a `Hash` value.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.as_hash().and_then(|map| map.get(key))
  }

  /// Ordering between comparable values: numbers (mixed integer/float) and strings.
  pub fn compare(&self, other: &Value) -> Option<Ordering> {
    match (self, other) {
      (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
      (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64()?.partial_cmp(&b.as_f64()?),
      (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
      (Value::Symbol(a), Value::Symbol(b)) => Some(a.cmp(b)),
      _ => None,
    }
  }

  /// Debug-style rendering: strings quoted, nil spelled out.
  pub fn inspect(&self) -> String {
    match self {
      Value::Nil => "nil".to_string(),
      Value::String(s) => format!("{:?}", s),
      Value::Symbol(s) => format!(":{}", s),
      Value::Array(items) => format!("[{}]", join_inspected(items.iter())),
      Value::Set(items) => format!("#<Set: {{{}}}>", join_inspected(items.iter())),
      Value::Hash(map) => {
        let body = map
          .iter()
          .map(|(k, v)| format!("{:?} => {}", k, v.inspect()))
          .collect::<Vec<_>>()
          .join(", ");
        format!("{{{}}}", body)
      }
      other => other.to_string(),
    }
  }
}

fn join_inspected<'a>(items: impl Iterator<Item = &'a Value>) -> String {
  items.map(Value::inspect).collect::<Vec<_>>().join(", ")
}

fn format_float(f: f64) -> String {
  if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
    format!("{:.1}", f)
  } else {
    format!("{}", f)
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Nil => Ok(()),
      Value::Boolean(b) => write!(f, "{}", b),
      Value::Integer(i) => write!(f, "{}", i),
      Value::Float(x) => f.write_str(&format_float(*x)),
      Value::String(s) | Value::Symbol(s) => f.write_str(s),
      Value::Object(obj) => write!(f, "#<{}>", obj.type_name()),
      collection => f.write_str(&collection.inspect()),
    }
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.inspect())
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Nil, Value::Nil) => true,
      (Value::Boolean(a), Value::Boolean(b)) => a == b,
      (Value::Integer(a), Value::Integer(b)) => a == b,
      (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64() == b.as_f64(),
      (Value::String(a), Value::String(b)) => a == b,
      (Value::Symbol(a), Value::Symbol(b)) => a == b,
      (Value::Array(a), Value::Array(b)) => a == b,
      (Value::Set(a), Value::Set(b)) => a.len() == b.len() && a.iter().all(|item| b.contains(item)),
      (Value::Hash(a), Value::Hash(b)) => a == b,
      (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
      _ => false,
    }
  }
}

// --- Conversions ---

impl From<bool> for Value {
  fn from(v: bool) -> Self {
    Value::Boolean(v)
  }
}

macro_rules! integer_into_value {
  ($($t:ty),*) => {
    $(
      impl From<$t> for Value {
        fn from(v: $t) -> Self {
          Value::Integer(i64::from(v))
        }
      }
    )*
  };
}

integer_into_value!(i8, i16, i32, i64, u8, u16, u32);

// Wider unsigned integers may not fit an `Integer`.
macro_rules! integer_try_into_value {
  ($($t:ty),*) => {
    $(
      impl TryFrom<$t> for Value {
        type Error = TryFromIntError;

        fn try_from(v: $t) -> Result<Self, Self::Error> {
          i64::try_from(v).map(Value::Integer)
        }
      }
    )*
  };
}

integer_try_into_value!(u64, usize);

impl From<f32> for Value {
  fn from(v: f32) -> Self {
    Value::Float(v as f64)
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Value::Float(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Value::String(v.to_string())
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Value::String(v)
  }
}

impl From<&String> for Value {
  fn from(v: &String) -> Self {
    Value::String(v.clone())
  }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(v: Vec<T>) -> Self {
    Value::Array(v.into_iter().map(Into::into).collect())
  }
}

impl From<IndexMap<String, Value>> for Value {
  fn from(v: IndexMap<String, Value>) -> Self {
    Value::Hash(v)
  }
}

impl From<ObjectRef> for Value {
  fn from(v: ObjectRef) -> Self {
    Value::Object(v)
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self {
    v.map_or(Value::Nil, Into::into)
  }
}

// --- Type descriptors ---

/// A type an attribute accepts. Values matching any of an attribute's types pass the type check.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
  Any,
  Nil,
  Boolean,
  Integer,
  Float,
  /// Integer or Float.
  Numeric,
  String,
  Symbol,
  Array,
  Set,
  Hash,
  /// Host objects, matched by the name given to [`Value::object`].
  Object(String),
}

impl ValueType {
  pub fn object(type_name: impl Into<String>) -> Self {
    ValueType::Object(type_name.into())
  }

  pub fn name(&self) -> &str {
    match self {
      ValueType::Any => "Any",
      ValueType::Nil => "Nil",
      ValueType::Boolean => "Boolean",
      ValueType::Integer => "Integer",
      ValueType::Float => "Float",
      ValueType::Numeric => "Numeric",
      ValueType::String => "String",
      ValueType::Symbol => "Symbol",
      ValueType::Array => "Array",
      ValueType::Set => "Set",
      ValueType::Hash => "Hash",
      ValueType::Object(name) => name,
    }
  }

  pub fn matches(&self, value: &Value) -> bool {
    match (self, value) {
      (ValueType::Any, _) => true,
      (ValueType::Nil, Value::Nil) => true,
      (ValueType::Boolean, Value::Boolean(_)) => true,
      (ValueType::Integer, Value::Integer(_)) => true,
      (ValueType::Float, Value::Float(_)) => true,
      (ValueType::Numeric, Value::Integer(_) | Value::Float(_)) => true,
      (ValueType::String, Value::String(_)) => true,
      (ValueType::Symbol, Value::Symbol(_)) => true,
      (ValueType::Array, Value::Array(_)) => true,
      (ValueType::Set, Value::Set(_)) => true,
      (ValueType::Hash, Value::Hash(_)) => true,
      (ValueType::Object(name), Value::Object(obj)) => name == obj.type_name(),
      _ => false,
    }
  }

  pub fn matches_any(types: &[ValueType], value: &Value) -> bool {
    types.iter().any(|t| t.matches(value))
  }

  /// `"Integer, Float"` style listing used in messages.
  pub fn join(types: &[ValueType]) -> String {
    types.iter().map(ValueType::name).collect::<Vec<_>>().join(", ")
  }
}

impl fmt::Display for ValueType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl From<&str> for ValueType {
  fn from(name: &str) -> Self {
    match name {
      "Any" => ValueType::Any,
      "Nil" | "NilClass" => ValueType::Nil,
      "Boolean" | "TrueClass" | "FalseClass" => ValueType::Boolean,
      "Integer" => ValueType::Integer,
      "Float" => ValueType::Float,
      "Numeric" => ValueType::Numeric,
      "String" => ValueType::String,
      "Symbol" => ValueType::Symbol,
      "Array" => ValueType::Array,
      "Set" => ValueType::Set,
      "Hash" => ValueType::Hash,
      other => ValueType::Object(other.to_string()),
    }
  }
}

// --- Ranges ---

/// A range of comparable values, used by `inclusion` and `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueRange {
  pub start: Option<Value>,
  pub end: Option<Value>,
  pub inclusive: bool,
}

impl ValueRange {
  pub fn inclusive(start: impl Into<Value>, end: impl Into<Value>) -> Self {
    Self {
      start: Some(start.into()),
      end: Some(end.into()),
      inclusive: true,
    }
  }

  pub fn exclusive(start: impl Into<Value>, end: impl Into<Value>) -> Self {
    Self {
      start: Some(start.into()),
      end: Some(end.into()),
      inclusive: false,
    }
  }

  pub fn contains(&self, value: &Value) -> bool {
    if let Some(start) = &self.start {
      match value.compare(start) {
        Some(Ordering::Less) | None => return false,
        _ => {}
      }
    }
    if let Some(end) = &self.end {
      match value.compare(end) {
        Some(Ordering::Less) => {}
        Some(Ordering::Equal) if self.inclusive => {}
        _ => return false,
      }
    }
    true
  }
}

impl fmt::Display for ValueRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(start) = &self.start {
      write!(f, "{}", start.inspect())?;
    }
    f.write_str(if self.inclusive && self.end.is_some() { "..=" } else { ".." })?;
    if let Some(end) = &self.end {
      write!(f, "{}", end.inspect())?;
    }
    Ok(())
  }
}

impl<T: Into<Value>> From<RangeInclusive<T>> for ValueRange {
  fn from(range: RangeInclusive<T>) -> Self {
    let (start, end) = range.into_inner();
    ValueRange::inclusive(start, end)
  }
}

impl<T: Into<Value>> From<Range<T>> for ValueRange {
  fn from(range: Range<T>) -> Self {
    ValueRange::exclusive(range.start, range.end)
  }
}

impl<T: Into<Value>> From<RangeFrom<T>> for ValueRange {
  fn from(range: RangeFrom<T>) -> Self {
    Self {
      start: Some(range.start.into()),
      end: None,
      inclusive: true,
    }
  }
}

impl<T: Into<Value>> From<RangeToInclusive<T>> for ValueRange {
  fn from(range: RangeToInclusive<T>) -> Self {
    Self {
      start: None,
      end: Some(range.end.into()),
      inclusive: true,
    }
  }
}
