//! Integrity levels: preventExtensions, seal, freeze.

mod common;

use common::*;
use interp_js::{Engine, PropertyKey, PropertyPatch, Value};

#[test]
fn prevent_extensions_blocks_new_keys_only() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.put_str(obj, "x", Value::Number(1.0), false).unwrap();
  engine.prevent_extensions(obj).unwrap();
  assert!(!engine.is_extensible(obj).unwrap());

  // Sloppy add is a silent no-op.
  engine.put_str(obj, "y", Value::Number(2.0), false).unwrap();
  assert_eq!(engine.get_str(obj, "y").unwrap(), Value::Undefined);

  // Strict add throws.
  let err = engine.put_str(obj, "y", Value::Number(2.0), true).unwrap_err();
  assert_eq!(thrown_name(&mut engine, &err), "TypeError");

  // Existing keys stay writable and deletable.
  engine.put_str(obj, "x", Value::Number(3.0), false).unwrap();
  assert_eq!(engine.get_str(obj, "x").unwrap(), Value::Number(3.0));
  assert!(engine.delete(obj, &PropertyKey::from_str("x"), false).unwrap());
}

#[test]
fn seal_pins_keys_but_keeps_values_mutable() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.put_str(obj, "x", Value::Number(1.0), false).unwrap();
  engine.seal(obj).unwrap();

  assert!(engine.is_sealed(obj).unwrap());
  assert!(!engine.is_frozen(obj).unwrap());

  assert!(!engine.delete(obj, &PropertyKey::from_str("x"), false).unwrap());
  engine.put_str(obj, "x", Value::Number(2.0), false).unwrap();
  assert_eq!(engine.get_str(obj, "x").unwrap(), Value::Number(2.0));
}

#[test]
fn freeze_pins_everything() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.put_str(obj, "x", Value::Number(1.0), false).unwrap();
  engine.freeze(obj).unwrap();

  assert!(engine.is_sealed(obj).unwrap());
  assert!(engine.is_frozen(obj).unwrap());

  engine.put_str(obj, "x", Value::Number(2.0), false).unwrap();
  assert_eq!(engine.get_str(obj, "x").unwrap(), Value::Number(1.0));
  assert!(!engine.delete(obj, &PropertyKey::from_str("x"), false).unwrap());
}

#[test]
fn freeze_is_idempotent() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.put_str(obj, "x", Value::Number(1.0), false).unwrap();
  engine.freeze(obj).unwrap();
  engine.freeze(obj).unwrap();
  assert!(engine.is_frozen(obj).unwrap());
  assert_eq!(engine.get_str(obj, "x").unwrap(), Value::Number(1.0));
}

#[test]
fn empty_nonextensible_object_is_frozen() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.prevent_extensions(obj).unwrap();
  assert!(engine.is_sealed(obj).unwrap());
  assert!(engine.is_frozen(obj).unwrap());
}

#[test]
fn frozen_array_length_is_pinned() {
  let mut engine = Engine::new();
  let arr = engine
    .array_from_values(&[Value::Number(1.0), Value::Number(2.0)])
    .unwrap();
  engine.freeze(arr).unwrap();

  assert!(engine.is_frozen(arr).unwrap());
  engine.put_str(arr, "length", Value::Number(0.0), false).unwrap();
  assert_eq!(engine.get_str(arr, "length").unwrap(), Value::Number(2.0));
  engine.put_str(arr, "0", Value::Number(9.0), false).unwrap();
  assert_eq!(engine.get_str(arr, "0").unwrap(), Value::Number(1.0));
}

#[test]
fn sealed_accessor_counts_as_frozen() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  let getter = engine.global_object();
  engine
    .define_property(
      obj,
      &PropertyKey::from_str("x"),
      PropertyPatch {
        get: Some(Value::Object(getter)),
        configurable: Some(true),
        ..Default::default()
      },
    )
    .unwrap();
  engine.freeze(obj).unwrap();
  // Accessors carry no writable bit, so sealing them is enough.
  assert!(engine.is_frozen(obj).unwrap());
}

#[test]
fn freeze_from_script_via_object_builtin() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("o", object_lit(vec![data_prop("a", num(1.0))])),
      expr(method(ident("Object"), "freeze", vec![ident("o")])),
      expr(assign(member(ident("o"), "a"), num(5.0))),
      expr(member(ident("o"), "a")),
    ],
  )
  .unwrap();
  assert_number(&result, 1.0);
}
