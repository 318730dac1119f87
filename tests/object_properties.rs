//! Prototype-based lookup, plain `put` semantics and own-key ordering.

mod common;

use common::*;
use interp_js::{Engine, PropertyKey, PropertyPatch, Value};

#[test]
fn get_walks_the_prototype_chain() {
  let mut engine = Engine::new();
  let proto = engine.new_object();
  let child = engine.new_object_with_prototype(Some(proto));

  engine.put_str(proto, "inherited", Value::Number(7.0), false).unwrap();
  assert_eq!(engine.get_str(child, "inherited").unwrap(), Value::Number(7.0));

  // An own property shadows.
  engine.put_str(child, "inherited", Value::Number(8.0), false).unwrap();
  assert_eq!(engine.get_str(child, "inherited").unwrap(), Value::Number(8.0));
  assert_eq!(engine.get_str(proto, "inherited").unwrap(), Value::Number(7.0));

  // An absent key yields Undefined once the chain is exhausted.
  assert_eq!(engine.get_str(child, "missing").unwrap(), Value::Undefined);
}

#[test]
fn put_creates_fully_writable_properties() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.put_str(obj, "x", Value::Number(1.0), false).unwrap();

  let prop = engine
    .get_own_property(obj, &PropertyKey::from_str("x"))
    .unwrap()
    .unwrap();
  assert!(prop.enumerable);
  assert!(prop.configurable);
  assert!(prop.is_data());
}

#[test]
fn put_through_inherited_readonly_fails_silently_or_throws() {
  let mut engine = Engine::new();
  let proto = engine.new_object();
  engine
    .define_property(
      proto,
      &PropertyKey::from_str("ro"),
      PropertyPatch {
        value: Some(Value::Number(1.0)),
        writable: Some(false),
        ..Default::default()
      },
    )
    .unwrap();
  let child = engine.new_object_with_prototype(Some(proto));

  // Sloppy: silent no-op, no own property created.
  engine.put_str(child, "ro", Value::Number(2.0), false).unwrap();
  assert!(engine
    .get_own_property(child, &PropertyKey::from_str("ro"))
    .unwrap()
    .is_none());
  assert_eq!(engine.get_str(child, "ro").unwrap(), Value::Number(1.0));

  // Strict: TypeError.
  let err = engine
    .put_str(child, "ro", Value::Number(2.0), true)
    .unwrap_err();
  assert_eq!(thrown_name(&mut engine, &err), "TypeError");
}

#[test]
fn accessors_run_with_the_original_receiver() {
  let mut engine = Engine::new();
  // { get x() { return this.base; } } on a prototype, read through a child.
  let result = eval(
    &mut engine,
    vec![
      var(
        "proto",
        object_lit(vec![getter_prop("x", vec![ret(member(Expr::This, "base"))])]),
      ),
      var("child", call(member(ident("Object"), "create"), vec![ident("proto")])),
      expr(assign(member(ident("child"), "base"), num(41.0))),
      expr(member(ident("child"), "x")),
    ],
  )
  .unwrap();
  assert_number(&result, 41.0);
}

use interp_js::ast::Expr;

#[test]
fn setter_intercepts_assignment() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var(
        "o",
        object_lit(vec![setter_prop(
          "x",
          "v",
          vec![expr(assign(
            member(Expr::This, "stored"),
            binary(interp_js::ast::BinaryOp::Mul, ident("v"), num(2.0)),
          ))],
        )]),
      ),
      expr(assign(member(ident("o"), "x"), num(21.0))),
      expr(member(ident("o"), "stored")),
    ],
  )
  .unwrap();
  assert_number(&result, 42.0);
}

#[test]
fn missing_setter_is_silent_in_sloppy_code() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("o", object_lit(vec![getter_prop("x", vec![ret(num(5.0))])])),
      expr(assign(member(ident("o"), "x"), num(9.0))),
      expr(member(ident("o"), "x")),
    ],
  )
  .unwrap();
  assert_number(&result, 5.0);
}

#[test]
fn own_keys_order_indices_first_then_insertion() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.put_str(obj, "b", Value::Number(0.0), false).unwrap();
  engine.put_str(obj, "2", Value::Number(0.0), false).unwrap();
  engine.put_str(obj, "a", Value::Number(0.0), false).unwrap();
  engine.put_str(obj, "0", Value::Number(0.0), false).unwrap();

  let keys: Vec<String> = engine
    .own_keys(obj)
    .unwrap()
    .iter()
    .map(|k| k.to_string())
    .collect();
  assert_eq!(keys, ["0", "2", "b", "a"]);
}

#[test]
fn index_keys_canonicalize_across_representations() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.put_str(obj, "10", Value::Number(1.0), false).unwrap();
  // The same key written through the numeric form overwrites, not duplicates.
  engine
    .put(obj, &PropertyKey::Index(10), Value::Number(2.0), false)
    .unwrap();
  assert_eq!(engine.own_keys(obj).unwrap().len(), 1);
  assert_eq!(engine.get_str(obj, "10").unwrap(), Value::Number(2.0));

  // Leading zeros do not canonicalize.
  engine.put_str(obj, "010", Value::Number(3.0), false).unwrap();
  assert_eq!(engine.own_keys(obj).unwrap().len(), 2);
}

#[test]
fn delete_respects_configurability() {
  let mut engine = Engine::new();
  let obj = engine.new_object();
  engine.put_str(obj, "gone", Value::Number(1.0), false).unwrap();
  assert!(engine.delete(obj, &PropertyKey::from_str("gone"), false).unwrap());
  assert_eq!(engine.get_str(obj, "gone").unwrap(), Value::Undefined);

  engine
    .define_property(
      obj,
      &PropertyKey::from_str("pinned"),
      PropertyPatch {
        value: Some(Value::Number(1.0)),
        configurable: Some(false),
        ..Default::default()
      },
    )
    .unwrap();
  assert!(!engine.delete(obj, &PropertyKey::from_str("pinned"), false).unwrap());
  let err = engine
    .delete(obj, &PropertyKey::from_str("pinned"), true)
    .unwrap_err();
  assert_eq!(thrown_name(&mut engine, &err), "TypeError");
  // Deleting an absent key reports success.
  assert!(engine.delete(obj, &PropertyKey::from_str("absent"), true).unwrap());
}

#[test]
fn prototype_cycles_are_rejected() {
  let mut engine = Engine::new();
  let a = engine.new_object();
  let b = engine.new_object_with_prototype(Some(a));
  assert!(engine.set_prototype(a, Some(b)).is_err());
}
