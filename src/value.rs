use crate::GcObject;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// An immutable, cheaply clonable language-level string.
///
/// Strings are primitives with value semantics in this runtime; they are shared
/// via reference counting rather than being heap(GC)-managed, since nothing can
/// mutate them after construction.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsStr(Rc<str>);

impl JsStr {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Deref for JsStr {
  type Target = str;

  fn deref(&self) -> &str {
    &self.0
  }
}

impl From<&str> for JsStr {
  fn from(value: &str) -> Self {
    Self(Rc::from(value))
  }
}

impl From<String> for JsStr {
  fn from(value: String) -> Self {
    Self(Rc::from(value))
  }
}

impl fmt::Debug for JsStr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&self.0, f)
  }
}

impl fmt::Display for JsStr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A language-level value.
///
/// This is the runtime's canonical value representation: the primitive kinds
/// plus GC-managed object references. Values are immutable; only the object a
/// reference points at has mutable state.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  /// The `undefined` value.
  Undefined,
  /// The `null` value.
  Null,
  /// A boolean.
  Bool(bool),
  /// A number (IEEE-754 double).
  Number(f64),
  /// An immutable string.
  String(JsStr),
  /// A GC-managed object reference.
  Object(GcObject),
}

impl Value {
  pub fn string(s: &str) -> Self {
    Value::String(JsStr::from(s))
  }

  pub fn is_undefined(&self) -> bool {
    matches!(self, Value::Undefined)
  }

  pub fn is_object(&self) -> bool {
    matches!(self, Value::Object(_))
  }

  pub fn as_object(&self) -> Option<GcObject> {
    match self {
      Value::Object(obj) => Some(*obj),
      _ => None,
    }
  }

  /// `SameValue(x, y)`.
  ///
  /// Differs from `==`/`===` for Numbers: `NaN` is the same as `NaN`, and `+0`
  /// and `-0` are distinct.
  pub fn same_value(&self, other: &Value) -> bool {
    match (self, other) {
      (Value::Number(a), Value::Number(b)) => {
        if a.is_nan() && b.is_nan() {
          return true;
        }
        if *a == 0.0 && *b == 0.0 {
          // Distinguish +0 and -0.
          return a.to_bits() == b.to_bits();
        }
        a == b
      }
      _ => self.strict_eq(other),
    }
  }

  /// Strict equality (`===`). Never coerces.
  pub fn strict_eq(&self, other: &Value) -> bool {
    match (self, other) {
      (Value::Undefined, Value::Undefined) => true,
      (Value::Null, Value::Null) => true,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Number(a), Value::Number(b)) => a == b,
      (Value::String(a), Value::String(b)) => a == b,
      (Value::Object(a), Value::Object(b)) => a == b,
      _ => false,
    }
  }

  /// The `typeof` classification of this value.
  ///
  /// `typeof` of a callable object is resolved by the engine (it needs to look
  /// at the object record); this returns the primitive classification with
  /// objects reported as `"object"`.
  pub fn type_of_primitive(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null => "object",
      Value::Bool(_) => "boolean",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Object(_) => "object",
    }
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Bool(value)
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Number(value)
  }
}

impl From<JsStr> for Value {
  fn from(value: JsStr) -> Self {
    Value::String(value)
  }
}

impl From<GcObject> for Value {
  fn from(value: GcObject) -> Self {
    Value::Object(value)
  }
}
