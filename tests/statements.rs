//! Statement and expression semantics: for-in enumeration, `with`, `typeof`,
//! update expressions and the operator suite.

mod common;

use common::*;
use interp_js::ast::{BinaryOp, Expr, Stmt, UnaryOp, UpdateOp};
use interp_js::{Engine, Value};

fn append(log: &str, piece: Expr) -> Stmt {
  expr(assign(
    ident(log),
    binary(BinaryOp::Add, ident(log), piece),
  ))
}

#[test]
fn for_in_enumerates_indices_then_strings() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var(
        "o",
        object_lit(vec![
          data_prop("b", num(0.0)),
          data_prop("1", num(0.0)),
          data_prop("a", num(0.0)),
          data_prop("0", num(0.0)),
        ]),
      ),
      var("log", str_lit("")),
      for_in(ident("k"), ident("o"), append("log", ident("k"))),
      expr(ident("log")),
    ],
  )
  .unwrap();
  assert_string(&result, "01ba");
}

#[test]
fn for_in_walks_the_prototype_chain_with_shadowing() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var(
        "proto",
        object_lit(vec![
          data_prop("shared", num(1.0)),
          data_prop("own", num(1.0)),
        ]),
      ),
      var(
        "child",
        call(member(ident("Object"), "create"), vec![ident("proto")]),
      ),
      expr(assign(member(ident("child"), "shared"), num(2.0))),
      expr(assign(member(ident("child"), "extra"), num(3.0))),
      var("log", str_lit("")),
      for_in(
        ident("k"),
        ident("child"),
        append("log", binary(BinaryOp::Add, ident("k"), str_lit("."))),
      ),
      // Own keys first, then unshadowed prototype keys.
      expr(ident("log")),
    ],
  )
  .unwrap();
  assert_string(&result, "shared.extra.own.");
}

#[test]
fn for_in_skips_non_enumerable_properties_and_their_shadows() {
  let mut engine = Engine::new();
  let proto = engine.new_object();
  engine.put_str(proto, "visible", Value::Number(1.0), false).unwrap();
  engine
    .define_property(
      proto,
      &interp_js::PropertyKey::from_str("hidden"),
      interp_js::PropertyPatch {
        value: Some(Value::Number(1.0)),
        enumerable: Some(false),
        configurable: Some(true),
        ..Default::default()
      },
    )
    .unwrap();
  let child = engine.new_object_with_prototype(Some(proto));
  // A non-enumerable own property shadows an enumerable inherited one.
  engine
    .define_property(
      child,
      &interp_js::PropertyKey::from_str("visible"),
      interp_js::PropertyPatch {
        value: Some(Value::Number(2.0)),
        enumerable: Some(false),
        ..Default::default()
      },
    )
    .unwrap();
  let global = engine.global_object();
  engine.put_str(global, "o", Value::Object(child), false).unwrap();

  let result = eval(
    &mut engine,
    vec![
      var("log", str_lit("")),
      for_in(ident("k"), ident("o"), append("log", ident("k"))),
      expr(ident("log")),
    ],
  )
  .unwrap();
  assert_string(&result, "");
}

#[test]
fn for_in_over_a_non_object_runs_zero_iterations() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("hits", num(0.0)),
      for_in(
        ident("k"),
        num(5.0),
        expr(assign(
          ident("hits"),
          binary(BinaryOp::Add, ident("hits"), num(1.0)),
        )),
      ),
      for_in(ident("k"), Expr::Null, expr(num(0.0))),
      expr(ident("hits")),
    ],
  )
  .unwrap();
  assert_number(&result, 0.0);
}

#[test]
fn for_in_rechecks_presence_each_iteration() {
  let mut engine = Engine::new();
  // Deleting a not-yet-visited key during iteration suppresses it.
  let result = eval(
    &mut engine,
    vec![
      var(
        "o",
        object_lit(vec![
          data_prop("a", num(1.0)),
          data_prop("b", num(2.0)),
          data_prop("c", num(3.0)),
        ]),
      ),
      var("log", str_lit("")),
      for_in(
        ident("k"),
        ident("o"),
        block(vec![
          append("log", ident("k")),
          expr(unary(UnaryOp::Delete, member(ident("o"), "c"))),
        ]),
      ),
      expr(ident("log")),
    ],
  )
  .unwrap();
  assert_string(&result, "ab");
}

#[test]
fn with_resolves_names_against_the_object_first() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("x", num(1.0)),
      var(
        "o",
        object_lit(vec![data_prop("x", num(2.0)), data_prop("y", num(3.0))]),
      ),
      var("log", str_lit("")),
      with_stmt(
        ident("o"),
        block(vec![
          append("log", ident("x")),
          append("log", ident("y")),
          expr(assign(ident("x"), num(9.0))),
        ]),
      ),
      // The write went to o.x; the outer x is untouched.
      expr(binary(
        BinaryOp::Add,
        ident("log"),
        binary(
          BinaryOp::Add,
          str_lit(":"),
          binary(
            BinaryOp::Add,
            ident("x"),
            binary(BinaryOp::Add, str_lit(""), member(ident("o"), "x")),
          ),
        ),
      )),
    ],
  )
  .unwrap();
  assert_string(&result, "23:19");
}

#[test]
fn with_on_a_non_object_is_a_type_error() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![with_stmt(num(5.0), expr(num(1.0)))],
  )
  .unwrap_err();
  assert_eq!(thrown_name(&mut engine, &err), "TypeError");
}

#[test]
fn typeof_an_unresolved_identifier_does_not_throw() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![expr(unary(UnaryOp::TypeOf, ident("never_declared")))],
  )
  .unwrap();
  assert_string(&result, "undefined");

  // A plain read of the same name is a ReferenceError.
  let err = eval(&mut engine, vec![expr(ident("never_declared"))]).unwrap_err();
  assert_eq!(thrown_name(&mut engine, &err), "ReferenceError");
}

#[test]
fn update_expressions_prefix_and_postfix() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("n", num(5.0)),
      var(
        "post",
        Expr::Update {
          op: UpdateOp::Increment,
          prefix: false,
          target: Box::new(ident("n")),
        },
      ),
      var(
        "pre",
        Expr::Update {
          op: UpdateOp::Decrement,
          prefix: true,
          target: Box::new(ident("n")),
        },
      ),
      // post = 5 (old value), n went 5 -> 6 -> 5, pre = 5.
      expr(binary(
        BinaryOp::Add,
        ident("post"),
        binary(
          BinaryOp::Add,
          ident("pre"),
          ident("n"),
        ),
      )),
    ],
  )
  .unwrap();
  assert_number(&result, 15.0);
}

#[test]
fn update_coerces_strings_to_numbers() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("s", str_lit("41")),
      expr(Expr::Update {
        op: UpdateOp::Increment,
        prefix: true,
        target: Box::new(ident("s")),
      }),
    ],
  )
  .unwrap();
  assert_number(&result, 42.0);
}

#[test]
fn compound_assignment_operators() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("n", num(10.0)),
      expr(Expr::Assign {
        op: Some(BinaryOp::Sub),
        target: Box::new(ident("n")),
        value: Box::new(num(4.0)),
      }),
      expr(Expr::Assign {
        op: Some(BinaryOp::Mul),
        target: Box::new(ident("n")),
        value: Box::new(num(3.0)),
      }),
      expr(ident("n")),
    ],
  )
  .unwrap();
  assert_number(&result, 18.0);
}

#[test]
fn in_operator_sees_inherited_properties() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("o", object_lit(vec![data_prop("own", num(1.0))])),
      expr(binary(
        BinaryOp::Add,
        binary(BinaryOp::In, str_lit("own"), ident("o")),
        binary(
          BinaryOp::Add,
          binary(BinaryOp::In, str_lit("hasOwnProperty"), ident("o")),
          binary(BinaryOp::In, str_lit("missing"), ident("o")),
        ),
      )),
    ],
  )
  .unwrap();
  // true + (true + false) -> 1 + 1 -> 2
  assert_number(&result, 2.0);
}

#[test]
fn in_on_a_non_object_is_a_type_error() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![expr(binary(BinaryOp::In, str_lit("x"), num(1.0)))],
  )
  .unwrap_err();
  assert_eq!(thrown_name(&mut engine, &err), "TypeError");
}

#[test]
fn loose_equality_coerces_and_strict_does_not() {
  let mut engine = Engine::new();
  let check = |engine: &mut Engine, e: Expr, expected: bool| {
    let result = eval(engine, vec![expr(e)]).unwrap();
    assert_eq!(result, Value::Bool(expected));
  };

  check(
    &mut engine,
    binary(BinaryOp::LooseEq, num(1.0), str_lit("1")),
    true,
  );
  check(
    &mut engine,
    binary(BinaryOp::StrictEq, num(1.0), str_lit("1")),
    false,
  );
  check(
    &mut engine,
    binary(BinaryOp::LooseEq, Expr::Null, Expr::Ident("undefined".into())),
    true,
  );
  check(
    &mut engine,
    binary(BinaryOp::StrictEq, Expr::Null, Expr::Ident("undefined".into())),
    false,
  );
  check(
    &mut engine,
    binary(BinaryOp::LooseEq, Expr::Bool(true), num(1.0)),
    true,
  );
  // NaN compares unequal to itself either way.
  check(
    &mut engine,
    binary(BinaryOp::LooseEq, num(f64::NAN), num(f64::NAN)),
    false,
  );
}

#[test]
fn add_prefers_string_concatenation() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![expr(binary(
      BinaryOp::Add,
      binary(BinaryOp::Add, num(1.0), num(2.0)),
      str_lit("3"),
    ))],
  )
  .unwrap();
  assert_string(&result, "33");
}

#[test]
fn bitwise_operators_work_on_int32() {
  let mut engine = Engine::new();
  let check = |engine: &mut Engine, e: Expr, expected: f64| {
    let result = eval(engine, vec![expr(e)]).unwrap();
    assert_number(&result, expected);
  };

  check(
    &mut engine,
    binary(BinaryOp::BitOr, num(5.0), num(3.0)),
    7.0,
  );
  check(
    &mut engine,
    binary(BinaryOp::Shl, num(1.0), num(31.0)),
    -2147483648.0,
  );
  check(
    &mut engine,
    binary(BinaryOp::UShr, num(-1.0), num(0.0)),
    4294967295.0,
  );
  check(
    &mut engine,
    binary(BinaryOp::Shr, num(-8.0), num(1.0)),
    -4.0,
  );
  check(&mut engine, unary(UnaryOp::BitNot, num(0.0)), -1.0);
}

#[test]
fn conditional_and_sequence_expressions() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![expr(Expr::Conditional {
      test: Box::new(binary(BinaryOp::Gt, num(2.0), num(1.0))),
      consequent: Box::new(Expr::Seq(vec![num(1.0), num(2.0), num(3.0)])),
      alternate: Box::new(num(0.0)),
    })],
  )
  .unwrap();
  assert_number(&result, 3.0);
}

#[test]
fn void_always_yields_undefined() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![expr(unary(UnaryOp::Void, num(7.0)))],
  )
  .unwrap();
  assert_eq!(result, Value::Undefined);
}

#[test]
fn delete_of_a_declared_variable_fails_in_sloppy_code() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("x", num(1.0)),
      expr(binary(
        BinaryOp::Add,
        num(0.0),
        unary(UnaryOp::Delete, ident("x")),
      )),
      expr(ident("x")),
    ],
  )
  .unwrap();
  // The variable survives the delete attempt.
  assert_number(&result, 1.0);
}

#[test]
fn array_literals_preserve_holes() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var(
        "a",
        array_lit(vec![Some(num(1.0)), None, Some(num(3.0))]),
      ),
      expr(binary(
        BinaryOp::Add,
        member(ident("a"), "length"),
        binary(
          BinaryOp::Add,
          str_lit(":"),
          binary(
            BinaryOp::Add,
            binary(BinaryOp::In, str_lit("1"), ident("a")),
            method(ident("a"), "join", vec![]),
          ),
        ),
      )),
    ],
  )
  .unwrap();
  // length 3, index 1 absent, join renders the hole as empty.
  assert_string(&result, "3:false1,,3");
}

#[test]
fn compound_assignment_evaluates_the_member_base_once() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("n", num(0.0)),
      var("o", object_lit(vec![data_prop("x", num(1.0))])),
      func_decl(
        "f",
        &[],
        vec![
          expr(assign(ident("n"), binary(BinaryOp::Add, ident("n"), num(1.0)))),
          ret(ident("o")),
        ],
      ),
      expr(Expr::Assign {
        op: Some(BinaryOp::Add),
        target: Box::new(member(call(ident("f"), vec![]), "x")),
        value: Box::new(num(1.0)),
      }),
      expr(binary(
        BinaryOp::Add,
        binary(BinaryOp::Mul, ident("n"), num(10.0)),
        member(ident("o"), "x"),
      )),
    ],
  )
  .unwrap();
  // One call to f, and o.x went 1 -> 2.
  assert_number(&result, 12.0);
}

#[test]
fn update_expressions_evaluate_the_member_base_once() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("n", num(0.0)),
      var("o", object_lit(vec![data_prop("x", num(1.0))])),
      func_decl(
        "f",
        &[],
        vec![
          expr(assign(ident("n"), binary(BinaryOp::Add, ident("n"), num(1.0)))),
          ret(ident("o")),
        ],
      ),
      expr(Expr::Update {
        op: UpdateOp::Increment,
        prefix: false,
        target: Box::new(member(call(ident("f"), vec![]), "x")),
      }),
      expr(binary(
        BinaryOp::Add,
        binary(BinaryOp::Mul, ident("n"), num(10.0)),
        member(ident("o"), "x"),
      )),
    ],
  )
  .unwrap();
  assert_number(&result, 12.0);
}

#[test]
fn compound_assignment_evaluates_a_computed_key_once() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("keys", num(0.0)),
      var("o", object_lit(vec![data_prop("x", num(4.0))])),
      func_decl(
        "key",
        &[],
        vec![
          expr(assign(
            ident("keys"),
            binary(BinaryOp::Add, ident("keys"), num(1.0)),
          )),
          ret(str_lit("x")),
        ],
      ),
      expr(Expr::Assign {
        op: Some(BinaryOp::Add),
        target: Box::new(Expr::Member {
          object: Box::new(ident("o")),
          key: interp_js::ast::MemberKey::Computed(Box::new(call(
            ident("key"),
            vec![],
          ))),
        }),
        value: Box::new(num(1.0)),
      }),
      expr(binary(
        BinaryOp::Add,
        binary(BinaryOp::Mul, ident("keys"), num(10.0)),
        member(ident("o"), "x"),
      )),
    ],
  )
  .unwrap();
  // key() ran once, and o.x went 4 -> 5.
  assert_number(&result, 15.0);
}
