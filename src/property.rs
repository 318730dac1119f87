use crate::value::{JsStr, Value};
use std::fmt;

/// A property key: a string or a canonical non-negative integer index.
///
/// A string is canonicalized to [`PropertyKey::Index`] exactly when it is the
/// decimal representation of a `u32` below `2^32 - 1` with no leading zeros
/// (the `ToString(ToUint32(P)) === P` condition used for array indices), so one
/// key never has two representations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
  Str(JsStr),
  Index(u32),
}

impl PropertyKey {
  /// Canonicalizes `s` into a key, folding array-index strings to
  /// [`PropertyKey::Index`].
  pub fn from_str(s: &str) -> Self {
    match parse_array_index(s) {
      Some(idx) => PropertyKey::Index(idx),
      None => PropertyKey::Str(JsStr::from(s)),
    }
  }

  pub fn from_js_str(s: JsStr) -> Self {
    match parse_array_index(&s) {
      Some(idx) => PropertyKey::Index(idx),
      None => PropertyKey::Str(s),
    }
  }

  pub fn index(idx: u32) -> Self {
    PropertyKey::Index(idx)
  }

  pub fn as_index(&self) -> Option<u32> {
    match self {
      PropertyKey::Index(idx) => Some(*idx),
      PropertyKey::Str(_) => None,
    }
  }

  /// The key as a language-level string value (indices print in decimal).
  pub fn to_value(&self) -> Value {
    match self {
      PropertyKey::Str(s) => Value::String(s.clone()),
      PropertyKey::Index(idx) => Value::string(&idx.to_string()),
    }
  }
}

impl fmt::Display for PropertyKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PropertyKey::Str(s) => f.write_str(s),
      PropertyKey::Index(idx) => write!(f, "{idx}"),
    }
  }
}

/// Attempts to parse `s` as an array index.
///
/// Matches the `ToString(ToUint32(P)) === P` and `ToUint32(P) != 2^32-1`
/// conditions: ASCII digits only, no leading zeros (except the single `"0"`),
/// value below `u32::MAX`.
pub(crate) fn parse_array_index(s: &str) -> Option<u32> {
  let bytes = s.as_bytes();
  if bytes.is_empty() {
    return None;
  }
  if bytes.len() > 1 && bytes[0] == b'0' {
    return None;
  }

  let mut value: u64 = 0;
  for &b in bytes {
    if !b.is_ascii_digit() {
      return None;
    }
    value = value.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    if value > u32::MAX as u64 {
      return None;
    }
  }

  // Exclude 2^32-1.
  if value == u32::MAX as u64 {
    return None;
  }
  Some(value as u32)
}

/// A concrete property descriptor.
#[derive(Debug, Clone)]
pub struct Property {
  pub enumerable: bool,
  pub configurable: bool,
  pub kind: PropertyKind,
}

impl Property {
  /// A `{value, writable, enumerable, configurable}` data property with the
  /// given attribute triple.
  pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
    Self {
      enumerable,
      configurable,
      kind: PropertyKind::Data { value, writable },
    }
  }

  /// A data property with all attributes `true` (the shape plain `put`
  /// creates).
  pub fn plain(value: Value) -> Self {
    Self::data(value, true, true, true)
  }

  pub fn is_data(&self) -> bool {
    matches!(self.kind, PropertyKind::Data { .. })
  }

  pub fn is_accessor(&self) -> bool {
    matches!(self.kind, PropertyKind::Accessor { .. })
  }
}

/// The kind of property described by a [`Property`].
#[derive(Debug, Clone)]
pub enum PropertyKind {
  Data { value: Value, writable: bool },
  Accessor { get: Value, set: Value },
}

/// A partial descriptor fragment used by `DefineProperty`-style operations.
///
/// Missing fields mean "leave unchanged" for existing properties and default to
/// `false`/`Undefined` for new ones (unlike plain `put`, which creates fully
/// `true`-attributed data properties).
#[derive(Debug, Default, Clone)]
pub struct PropertyPatch {
  pub enumerable: Option<bool>,
  pub configurable: Option<bool>,
  pub value: Option<Value>,
  pub writable: Option<bool>,
  pub get: Option<Value>,
  pub set: Option<Value>,
}

impl PropertyPatch {
  pub fn value(value: Value) -> Self {
    Self {
      value: Some(value),
      ..Default::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.enumerable.is_none()
      && self.configurable.is_none()
      && self.value.is_none()
      && self.writable.is_none()
      && self.get.is_none()
      && self.set.is_none()
  }

  pub fn is_data_descriptor(&self) -> bool {
    self.value.is_some() || self.writable.is_some()
  }

  pub fn is_accessor_descriptor(&self) -> bool {
    self.get.is_some() || self.set.is_some()
  }

  pub fn is_generic_descriptor(&self) -> bool {
    !self.is_data_descriptor() && !self.is_accessor_descriptor()
  }

  /// A descriptor fragment cannot be both a data descriptor and an accessor
  /// descriptor. The engine turns a violation into a TypeError throw.
  pub fn is_valid(&self) -> bool {
    !(self.is_data_descriptor() && self.is_accessor_descriptor())
  }
}
