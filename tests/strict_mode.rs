//! Static strict-mode validation: violations stop evaluation before any
//! statement runs.

mod common;

use common::*;
use interp_js::ast::{Expr, UnaryOp};
use interp_js::{EarlyErrorKind, Engine, EngineError, Value};

fn use_strict() -> interp_js::ast::Stmt {
  expr(str_lit("use strict"))
}

fn expect_syntax(err: EngineError, kind: EarlyErrorKind) {
  match err {
    EngineError::Syntax(errors) => {
      assert!(
        errors.iter().any(|e| e.kind == kind),
        "expected {kind:?} in {errors:?}"
      );
    }
    other => panic!("expected a syntax error, got {other:?}"),
  }
}

#[test]
fn assigning_eval_is_rejected_before_execution() {
  let mut engine = Engine::new();
  // A side effect precedes the violation; it must not run.
  let err = eval(
    &mut engine,
    vec![
      use_strict(),
      var("marker", num(1.0)),
      expr(assign(ident("eval"), num(0.0))),
    ],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictAssignmentTarget);

  // `marker` was never declared on the global object.
  let result = eval(
    &mut engine,
    vec![expr(unary(UnaryOp::TypeOf, ident("marker")))],
  )
  .unwrap();
  assert_string(&result, "undefined");
}

#[test]
fn assigning_arguments_is_rejected() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![use_strict(), expr(assign(ident("arguments"), num(0.0)))],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictAssignmentTarget);
}

#[test]
fn binding_eval_or_arguments_is_rejected() {
  let mut engine = Engine::new();
  let err = eval(&mut engine, vec![use_strict(), var("eval", num(1.0))]).unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictBindingName);

  let err = eval(
    &mut engine,
    vec![use_strict(), func_decl("f", &["arguments"], vec![])],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictBindingName);

  let err = eval(
    &mut engine,
    vec![
      use_strict(),
      try_catch(vec![], "eval", vec![]),
    ],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictBindingName);
}

#[test]
fn reserved_words_are_rejected_as_bindings() {
  let mut engine = Engine::new();
  for word in ["implements", "interface", "let", "package", "yield", "static"] {
    let err = eval(&mut engine, vec![use_strict(), var(word, num(1.0))]).unwrap_err();
    expect_syntax(err, EarlyErrorKind::StrictBindingName);
  }
  // Sloppy code may use them freely.
  let result = eval(&mut engine, vec![var("let", num(3.0)), expr(ident("let"))]).unwrap();
  assert_number(&result, 3.0);
}

#[test]
fn with_is_rejected_in_strict_code() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![
      use_strict(),
      with_stmt(object_lit(vec![]), expr(num(1.0))),
    ],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictWith);
}

#[test]
fn duplicate_parameters_are_rejected_in_strict_code() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![use_strict(), func_decl("f", &["a", "a"], vec![])],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictDuplicateParameter);

  // Sloppy duplicates are legal; the last one wins.
  let result = eval(
    &mut engine,
    vec![
      func_decl("g", &["a", "a"], vec![ret(ident("a"))]),
      expr(call(ident("g"), vec![num(1.0), num(2.0)])),
    ],
  )
  .unwrap();
  assert_number(&result, 2.0);
}

#[test]
fn delete_of_an_unqualified_identifier_is_rejected() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![
      use_strict(),
      var("x", num(1.0)),
      expr(unary(UnaryOp::Delete, ident("x"))),
    ],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictDelete);

  // Deleting a property stays legal.
  let result = eval(
    &mut engine,
    vec![
      use_strict(),
      var("o", object_lit(vec![data_prop("p", num(1.0))])),
      expr(unary(UnaryOp::Delete, member(ident("o"), "p"))),
    ],
  )
  .unwrap();
  assert_eq!(result, Value::Bool(true));
}

#[test]
fn duplicate_object_literal_data_properties() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![
      use_strict(),
      expr(object_lit(vec![
        data_prop("k", num(1.0)),
        data_prop("k", num(2.0)),
      ])),
    ],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::DuplicateObjectLiteralProperty);

  // Sloppy duplicates are legal; the last definition wins.
  let result = eval(
    &mut engine,
    vec![expr(member(
      object_lit(vec![data_prop("k", num(1.0)), data_prop("k", num(2.0))]),
      "k",
    ))],
  )
  .unwrap();
  assert_number(&result, 2.0);
}

#[test]
fn data_and_accessor_clash_is_rejected_even_in_sloppy_code() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![expr(object_lit(vec![
      data_prop("k", num(1.0)),
      getter_prop("k", vec![ret(num(2.0))]),
    ]))],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::DuplicateObjectLiteralProperty);

  // A getter and a setter for the same key are fine anywhere.
  let result = eval(
    &mut engine,
    vec![expr(member(
      object_lit(vec![
        getter_prop("k", vec![ret(num(2.0))]),
        setter_prop("k", "v", vec![]),
      ]),
      "k",
    ))],
  )
  .unwrap();
  assert_number(&result, 2.0);
}

#[test]
fn an_inner_function_can_opt_in_independently() {
  let mut engine = Engine::new();
  // The outer program is sloppy; the violation sits in the strict inner
  // function.
  let err = eval(
    &mut engine,
    vec![func_decl(
      "outer",
      &[],
      vec![expr(Expr::Function(func_def(
        None,
        &[],
        vec![use_strict(), var("eval", num(1.0))],
      )))],
    )],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictBindingName);
}

#[test]
fn strict_mode_inherits_into_nested_functions() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![
      use_strict(),
      func_decl(
        "outer",
        &[],
        vec![func_decl("inner", &[], vec![var("package", num(1.0))])],
      ),
    ],
  )
  .unwrap_err();
  expect_syntax(err, EarlyErrorKind::StrictBindingName);
}

#[test]
fn all_violations_are_collected() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![
      use_strict(),
      var("eval", num(1.0)),
      expr(assign(ident("arguments"), num(0.0))),
    ],
  )
  .unwrap_err();
  match err {
    EngineError::Syntax(errors) => assert_eq!(errors.len(), 2),
    other => panic!("expected a syntax error, got {other:?}"),
  }
}

#[test]
fn strict_assignment_to_undeclared_name_throws_reference_error() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![use_strict(), expr(assign(ident("ghost"), num(1.0)))],
  )
  .unwrap_err();
  assert_eq!(thrown_name(&mut engine, &err), "ReferenceError");

  // Sloppy assignment creates a global property instead.
  let result = eval(
    &mut engine,
    vec![expr(assign(ident("ghost"), num(1.0))), expr(ident("ghost"))],
  )
  .unwrap();
  assert_number(&result, 1.0);
}
