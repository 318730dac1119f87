//! Abstract coercion operations.
//!
//! The pure, total conversions live here as free functions; the conversions
//! that can observe user code (`ToPrimitive` and everything built on it for
//! object operands) are `Engine` methods, since they may invoke `valueOf`/
//! `toString` accessors.

use crate::engine::Engine;
use crate::value::{JsStr, Value};
use crate::EngineError;

/// The hint passed to `ToPrimitive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveHint {
  Number,
  String,
}

/// `ToBoolean`.
pub fn to_boolean(value: &Value) -> bool {
  match value {
    Value::Undefined | Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => *n != 0.0 && !n.is_nan(),
    Value::String(s) => !s.is_empty(),
    Value::Object(_) => true,
  }
}

/// `ToInt32`: truncate, then wrap modulo 2^32 into the signed range.
/// NaN and the infinities map to 0.
pub fn to_int32(n: f64) -> i32 {
  to_uint32(n) as i32
}

/// `ToUint32`: truncate, then wrap modulo 2^32.
/// NaN and the infinities map to 0.
pub fn to_uint32(n: f64) -> u32 {
  if !n.is_finite() || n == 0.0 {
    return 0;
  }
  let truncated = n.trunc();
  const TWO_32: f64 = 4_294_967_296.0;
  let modulo = truncated.rem_euclid(TWO_32);
  modulo as u32
}

/// `ToInteger`: truncation with NaN folded to 0 (infinities pass through).
pub fn to_integer(n: f64) -> f64 {
  if n.is_nan() {
    return 0.0;
  }
  n.trunc()
}

fn is_numeric_whitespace(c: char) -> bool {
  // Unicode White_Space plus the BOM, which the numeric grammar also folds.
  c.is_whitespace() || c == '\u{FEFF}'
}

/// The numeric string grammar of `ToNumber`.
///
/// Recognizes `0x`/`0X` hexadecimal and decimal forms, `Infinity`/`-Infinity`,
/// leading/trailing whitespace (ASCII and Unicode space classes), an empty or
/// all-whitespace string (0), and `-0…0` (negative zero; the sign survives the
/// zero result).
pub fn parse_number(s: &str) -> f64 {
  let body = s.trim_matches(is_numeric_whitespace);
  if body.is_empty() {
    return 0.0;
  }

  // Hexadecimal form: unsigned only.
  if let Some(digits) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
    if digits.is_empty() {
      return f64::NAN;
    }
    let mut value = 0.0f64;
    for c in digits.chars() {
      let Some(digit) = c.to_digit(16) else {
        return f64::NAN;
      };
      value = value * 16.0 + digit as f64;
    }
    return value;
  }

  let (negative, rest) = match body.strip_prefix('-') {
    Some(rest) => (true, rest),
    None => (false, body.strip_prefix('+').unwrap_or(body)),
  };

  if rest == "Infinity" {
    return if negative {
      f64::NEG_INFINITY
    } else {
      f64::INFINITY
    };
  }

  // Decimal form. Reject anything outside the decimal grammar's alphabet
  // before handing to the float parser (which would otherwise accept forms
  // like "inf" or "NaN" that the numeric grammar does not).
  if rest
    .chars()
    .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')))
  {
    return f64::NAN;
  }

  match rest.parse::<f64>() {
    Ok(value) => {
      if negative {
        -value
      } else {
        value
      }
    }
    Err(_) => f64::NAN,
  }
}

/// `ToString` for numbers.
pub fn number_to_string(n: f64) -> String {
  if n.is_nan() {
    return "NaN".to_string();
  }
  if n.is_infinite() {
    return if n.is_sign_negative() {
      "-Infinity".to_string()
    } else {
      "Infinity".to_string()
    };
  }
  if n == 0.0 {
    // `ToString(-0)` is `"0"`.
    return "0".to_string();
  }

  let mut buf = ryu::Buffer::new();
  let formatted = buf.format(n);
  // `ryu` formats `1.0` as `"1.0"`, but `ToString(1)` is `"1"`.
  let formatted = formatted.strip_suffix(".0").unwrap_or(formatted);

  // `ryu` omits the sign of a positive exponent (`1e21`); the language's
  // exponential form carries it (`1e+21`).
  if let Some(pos) = formatted.find('e') {
    let exponent = &formatted[pos + 1..];
    if !exponent.starts_with('-') {
      return format!("{}e+{}", &formatted[..pos], exponent);
    }
  }
  formatted.to_string()
}

impl Engine {
  /// `ToPrimitive`.
  ///
  /// For objects, tries the well-known candidate pair in hint order
  /// (`valueOf` then `toString` for the Number hint, reversed for String),
  /// accepting the first primitive result. The default hint is Number.
  pub fn to_primitive(&mut self, value: &Value, hint: PrimitiveHint) -> Result<Value, EngineError> {
    let Value::Object(obj) = value else {
      return Ok(value.clone());
    };

    let methods: [&str; 2] = match hint {
      PrimitiveHint::Number => ["valueOf", "toString"],
      PrimitiveHint::String => ["toString", "valueOf"],
    };

    for name in methods {
      let method = self.get_str(*obj, name)?;
      if self.is_callable(&method) {
        let result = self.call_value(&method, value.clone(), &[])?;
        if !result.is_object() {
          return Ok(result);
        }
      }
    }

    Err(self.throw_type_error("cannot convert object to primitive value"))
  }

  /// `ToNumber`.
  pub fn to_number(&mut self, value: &Value) -> Result<f64, EngineError> {
    Ok(match value {
      Value::Undefined => f64::NAN,
      Value::Null => 0.0,
      Value::Bool(b) => {
        if *b {
          1.0
        } else {
          0.0
        }
      }
      Value::Number(n) => *n,
      Value::String(s) => parse_number(s),
      Value::Object(_) => {
        let prim = self.to_primitive(value, PrimitiveHint::Number)?;
        self.to_number(&prim)?
      }
    })
  }

  /// `ToString`.
  pub fn to_js_string(&mut self, value: &Value) -> Result<JsStr, EngineError> {
    Ok(match value {
      Value::Undefined => JsStr::from("undefined"),
      Value::Null => JsStr::from("null"),
      Value::Bool(true) => JsStr::from("true"),
      Value::Bool(false) => JsStr::from("false"),
      Value::Number(n) => JsStr::from(number_to_string(*n)),
      Value::String(s) => s.clone(),
      Value::Object(_) => {
        let prim = self.to_primitive(value, PrimitiveHint::String)?;
        self.to_js_string(&prim)?
      }
    })
  }

  /// `ToUint32` over a full value.
  pub fn to_uint32_value(&mut self, value: &Value) -> Result<u32, EngineError> {
    Ok(to_uint32(self.to_number(value)?))
  }

  /// `ToInt32` over a full value.
  pub fn to_int32_value(&mut self, value: &Value) -> Result<i32, EngineError> {
    Ok(to_int32(self.to_number(value)?))
  }

  /// Abstract (`==`) equality: the standard coercion ladder.
  pub fn loose_eq(&mut self, a: &Value, b: &Value) -> Result<bool, EngineError> {
    Ok(match (a, b) {
      // Same-kind comparisons never coerce.
      (Value::Undefined, Value::Undefined)
      | (Value::Null, Value::Null)
      | (Value::Bool(_), Value::Bool(_))
      | (Value::Number(_), Value::Number(_))
      | (Value::String(_), Value::String(_))
      | (Value::Object(_), Value::Object(_)) => a.strict_eq(b),

      // Null and Undefined are mutually equal.
      (Value::Undefined, Value::Null) | (Value::Null, Value::Undefined) => true,

      // Number ~ String: compare numerically.
      (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
        *n == parse_number(s)
      }

      // Boolean operands coerce through ToNumber and retry.
      (Value::Bool(x), other) => {
        let n = Value::Number(if *x { 1.0 } else { 0.0 });
        self.loose_eq(&n, other)?
      }
      (other, Value::Bool(x)) => {
        let n = Value::Number(if *x { 1.0 } else { 0.0 });
        self.loose_eq(other, &n)?
      }

      // Object ~ Number/String: coerce the object via ToPrimitive and retry.
      (Value::Object(_), Value::Number(_) | Value::String(_)) => {
        let prim = self.to_primitive(a, PrimitiveHint::Number)?;
        self.loose_eq(&prim, b)?
      }
      (Value::Number(_) | Value::String(_), Value::Object(_)) => {
        let prim = self.to_primitive(b, PrimitiveHint::Number)?;
        self.loose_eq(a, &prim)?
      }

      _ => false,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_string_grammar() {
    assert_eq!(parse_number(""), 0.0);
    assert_eq!(parse_number("   \t\n  "), 0.0);
    assert_eq!(parse_number("\u{00A0}42\u{FEFF}"), 42.0);
    assert_eq!(parse_number("0x10"), 16.0);
    assert_eq!(parse_number("0XFF"), 255.0);
    assert_eq!(parse_number("  Infinity "), f64::INFINITY);
    assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
    assert_eq!(parse_number("1.5e3"), 1500.0);
    assert_eq!(parse_number(".5"), 0.5);
    assert!(parse_number("12abc").is_nan());
    assert!(parse_number("0x").is_nan());
    assert!(parse_number("-0x10").is_nan());
    assert!(parse_number("inf").is_nan());
    assert!(parse_number("NaN").is_nan());
  }

  #[test]
  fn negative_zero_survives_parsing() {
    let z = parse_number("-000000000000000000");
    assert_eq!(z, 0.0);
    assert!(z.is_sign_negative());
    assert_eq!(1.0 / z, f64::NEG_INFINITY);
  }

  #[test]
  fn int32_wraparound() {
    assert_eq!(to_uint32(f64::NAN), 0);
    assert_eq!(to_uint32(f64::INFINITY), 0);
    assert_eq!(to_uint32(-1.0), u32::MAX);
    assert_eq!(to_int32(2_147_483_648.0), i32::MIN);
    assert_eq!(to_int32(-2_147_483_649.0), i32::MAX);
    assert_eq!(to_uint32(4_294_967_296.0), 0);
    assert_eq!(to_uint32(4_294_967_297.5), 1);
  }

  #[test]
  fn number_formatting() {
    assert_eq!(number_to_string(1.0), "1");
    assert_eq!(number_to_string(-0.0), "0");
    assert_eq!(number_to_string(1.5), "1.5");
    assert_eq!(number_to_string(f64::NAN), "NaN");
    assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
  }
}
