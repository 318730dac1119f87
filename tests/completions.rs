//! Abrupt completion routing: loops, labels, switch and try/catch/finally.

mod common;

use common::*;
use interp_js::ast::{BinaryOp, Expr, ForInit, Stmt};
use interp_js::{Engine, EngineError, Value};

fn plus_assign(name: &str, amount: Expr) -> Stmt {
  expr(assign(
    ident(name),
    binary(BinaryOp::Add, ident(name), amount),
  ))
}

fn lt(left: Expr, right: Expr) -> Expr {
  binary(BinaryOp::Lt, left, right)
}

fn for_loop(init: Stmt, test: Expr, update: Expr, body: Vec<Stmt>) -> Stmt {
  let init = match init {
    Stmt::VarDecl(decls) => Some(ForInit::VarDecl(decls)),
    Stmt::Expr(e) => Some(ForInit::Expr(e)),
    _ => None,
  };
  Stmt::For {
    init,
    test: Some(test),
    update: Some(update),
    body: Box::new(Stmt::Block(body)),
  }
}

fn incr(name: &str) -> Expr {
  assign(ident(name), binary(BinaryOp::Add, ident(name), num(1.0)))
}

#[test]
fn break_exits_the_nearest_loop() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("n", num(0.0)),
      while_stmt(
        Expr::Bool(true),
        block(vec![
          plus_assign("n", num(1.0)),
          if_stmt(binary(BinaryOp::Ge, ident("n"), num(3.0)), brk(None)),
        ]),
      ),
      expr(ident("n")),
    ],
  )
  .unwrap();
  assert_number(&result, 3.0);
}

#[test]
fn continue_skips_to_the_next_iteration() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("sum", num(0.0)),
      for_loop(
        var("i", num(0.0)),
        lt(ident("i"), num(6.0)),
        incr("i"),
        vec![
          if_stmt(
            binary(
              BinaryOp::StrictEq,
              binary(BinaryOp::Rem, ident("i"), num(2.0)),
              num(1.0),
            ),
            cont(None),
          ),
          plus_assign("sum", ident("i")),
        ],
      ),
      // 0 + 2 + 4
      expr(ident("sum")),
    ],
  )
  .unwrap();
  assert_number(&result, 6.0);
}

#[test]
fn labeled_break_exits_an_outer_loop() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("hits", num(0.0)),
      labeled(
        "outer",
        for_loop(
          var("i", num(0.0)),
          lt(ident("i"), num(3.0)),
          incr("i"),
          vec![for_loop(
            var("j", num(0.0)),
            lt(ident("j"), num(3.0)),
            incr("j"),
            vec![
              plus_assign("hits", num(1.0)),
              if_stmt(
                binary(BinaryOp::StrictEq, ident("hits"), num(4.0)),
                brk(Some("outer")),
              ),
            ],
          )],
        ),
      ),
      expr(ident("hits")),
    ],
  )
  .unwrap();
  assert_number(&result, 4.0);
}

#[test]
fn labeled_continue_resumes_the_outer_loop() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("hits", num(0.0)),
      labeled(
        "outer",
        for_loop(
          var("i", num(0.0)),
          lt(ident("i"), num(3.0)),
          incr("i"),
          vec![for_loop(
            var("j", num(0.0)),
            lt(ident("j"), num(3.0)),
            incr("j"),
            vec![
              if_stmt(
                binary(BinaryOp::StrictEq, ident("j"), num(1.0)),
                cont(Some("outer")),
              ),
              plus_assign("hits", num(1.0)),
            ],
          )],
        ),
      ),
      // One hit (j == 0) per outer iteration.
      expr(ident("hits")),
    ],
  )
  .unwrap();
  assert_number(&result, 3.0);
}

#[test]
fn do_while_runs_at_least_once() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("n", num(0.0)),
      Stmt::DoWhile {
        body: Box::new(block(vec![plus_assign("n", num(1.0))])),
        test: Expr::Bool(false),
      },
      expr(ident("n")),
    ],
  )
  .unwrap();
  assert_number(&result, 1.0);
}

#[test]
fn switch_matches_strictly_and_falls_through() {
  let mut engine = Engine::new();
  let run = |engine: &mut Engine, v: Expr| {
    eval(
      engine,
      vec![
        var("log", str_lit("")),
        switch_stmt(
          v,
          vec![
            case(num(1.0), vec![plus_assign("log", str_lit("one"))]),
            case(
              num(2.0),
              vec![plus_assign("log", str_lit("two")), brk(None)],
            ),
            default_case(vec![plus_assign("log", str_lit("default"))]),
            case(num(3.0), vec![plus_assign("log", str_lit("three"))]),
          ],
        ),
        expr(ident("log")),
      ],
    )
    .unwrap()
  };

  // 1 falls through into 2, then breaks.
  assert_string(&run(&mut engine, num(1.0)), "onetwo");
  assert_string(&run(&mut engine, num(2.0)), "two");
  // No match: default runs and falls through into 3.
  assert_string(&run(&mut engine, num(9.0)), "defaultthree");
  // `"1"` does not match `1` under strict equality.
  assert_string(&run(&mut engine, str_lit("1")), "defaultthree");
}

#[test]
fn thrown_values_are_caught_with_a_fresh_binding() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("e", str_lit("outer")),
      try_catch(
        vec![throw_stmt(num(42.0))],
        "e",
        vec![var("caught", ident("e"))],
      ),
      // The catch parameter shadowed, not overwrote, the outer binding.
      expr(binary(
        BinaryOp::Add,
        ident("caught"),
        binary(BinaryOp::Add, str_lit(":"), ident("e")),
      )),
    ],
  )
  .unwrap();
  assert_string(&result, "42:outer");
}

#[test]
fn finally_runs_on_every_path() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("log", str_lit("")),
      try_finally(
        vec![plus_assign("log", str_lit("body"))],
        vec![plus_assign("log", str_lit("+finally"))],
      ),
      try_catch_finally(
        vec![throw_stmt(str_lit("x"))],
        "e",
        vec![plus_assign("log", str_lit("+catch"))],
        vec![plus_assign("log", str_lit("+finally2"))],
      ),
      expr(ident("log")),
    ],
  )
  .unwrap();
  assert_string(&result, "body+finally+catch+finally2");
}

#[test]
fn finally_abrupt_completion_overrides_the_try_result() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      func_decl(
        "f",
        &[],
        vec![Stmt::Try {
          block: vec![ret(num(1.0))],
          catch: None,
          finally: Some(vec![ret(num(2.0))]),
        }],
      ),
      expr(call(ident("f"), vec![])),
    ],
  )
  .unwrap();
  assert_number(&result, 2.0);
}

#[test]
fn finally_throw_replaces_the_original_throw() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![Stmt::Try {
      block: vec![throw_stmt(str_lit("original"))],
      catch: None,
      finally: Some(vec![throw_stmt(str_lit("replacement"))]),
    }],
  )
  .unwrap_err();
  match err {
    EngineError::Throw(Value::String(s)) => assert_eq!(s.as_str(), "replacement"),
    other => panic!("expected a thrown string, got {other:?}"),
  }
}

#[test]
fn rethrow_propagates_out_of_catch() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![try_catch(
      vec![throw_stmt(num(1.0))],
      "e",
      vec![throw_stmt(binary(BinaryOp::Add, ident("e"), num(1.0)))],
    )],
  )
  .unwrap_err();
  match err {
    EngineError::Throw(Value::Number(n)) => assert_eq!(n, 2.0),
    other => panic!("expected a thrown number, got {other:?}"),
  }
}

#[test]
fn an_uncaught_throw_leaves_the_engine_usable() {
  let mut engine = Engine::new();
  let err = eval(
    &mut engine,
    vec![var("x", num(10.0)), throw_stmt(str_lit("boom"))],
  )
  .unwrap_err();
  assert!(matches!(err, EngineError::Throw(Value::String(_))));

  // Globals declared before the throw survive.
  let result = eval(&mut engine, vec![expr(ident("x"))]).unwrap();
  assert_number(&result, 10.0);
}

#[test]
fn break_crosses_a_finally_which_still_runs() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("log", str_lit("")),
      while_stmt(
        Expr::Bool(true),
        block(vec![try_finally(
          vec![brk(None)],
          vec![plus_assign("log", str_lit("cleanup"))],
        )]),
      ),
      expr(ident("log")),
    ],
  )
  .unwrap();
  assert_string(&result, "cleanup");
}

#[test]
fn program_completion_value_is_the_last_nonempty_one() {
  let mut engine = Engine::new();
  // An if with no taken branch is an empty completion; the 7 survives.
  let result = eval(
    &mut engine,
    vec![
      expr(num(7.0)),
      if_stmt(Expr::Bool(false), expr(num(8.0))),
    ],
  )
  .unwrap();
  assert_number(&result, 7.0);
}

#[test]
fn labeled_break_keeps_the_completion_value() {
  let mut engine = Engine::new();
  // The value accumulated before the jump rides along with the break.
  let result = eval(
    &mut engine,
    vec![labeled(
      "x",
      block(vec![expr(num(1.0)), brk(Some("x")), expr(num(2.0))]),
    )],
  )
  .unwrap();
  assert_number(&result, 1.0);
}

#[test]
fn loop_break_keeps_the_completion_value() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![while_stmt(
      Expr::Bool(true),
      block(vec![expr(num(7.0)), brk(None)]),
    )],
  )
  .unwrap();
  assert_number(&result, 7.0);
}

#[test]
fn continue_keeps_each_iterations_value() {
  let mut engine = Engine::new();
  let result = eval(
    &mut engine,
    vec![
      var("i", num(0.0)),
      while_stmt(
        lt(ident("i"), num(3.0)),
        block(vec![
          expr(incr("i")),
          expr(binary(BinaryOp::Mul, ident("i"), num(10.0))),
          cont(None),
        ]),
      ),
    ],
  )
  .unwrap();
  // The last iteration's value survives the continue.
  assert_number(&result, 30.0);
}
