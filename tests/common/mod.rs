#![allow(dead_code)]

use interp_js::ast::{
  BinaryOp, CatchClause, Expr, FunctionDef, LogicalOp, MemberKey, Program, PropertyInit,
  PropertyInitKind, Stmt, SwitchCase, UnaryOp,
};
use interp_js::{Engine, EngineError, Value};
use std::rc::Rc;

pub fn program(body: Vec<Stmt>) -> Program {
  Program::new(body)
}

pub fn eval(engine: &mut Engine, body: Vec<Stmt>) -> Result<Value, EngineError> {
  engine.evaluate(&program(body))
}

pub fn num(n: f64) -> Expr {
  Expr::Number(n)
}

pub fn str_lit(s: &str) -> Expr {
  Expr::Str(s.to_string())
}

pub fn ident(name: &str) -> Expr {
  Expr::Ident(name.to_string())
}

pub fn expr(e: Expr) -> Stmt {
  Stmt::Expr(e)
}

pub fn var(name: &str, init: Expr) -> Stmt {
  Stmt::VarDecl(vec![(name.to_string(), Some(init))])
}

pub fn var_bare(name: &str) -> Stmt {
  Stmt::VarDecl(vec![(name.to_string(), None)])
}

pub fn ret(e: Expr) -> Stmt {
  Stmt::Return(Some(e))
}

pub fn assign(target: Expr, value: Expr) -> Expr {
  Expr::Assign {
    op: None,
    target: Box::new(target),
    value: Box::new(value),
  }
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
  Expr::Binary {
    op,
    left: Box::new(left),
    right: Box::new(right),
  }
}

pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
  Expr::Logical {
    op,
    left: Box::new(left),
    right: Box::new(right),
  }
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
  Expr::Unary {
    op,
    operand: Box::new(operand),
  }
}

pub fn member(object: Expr, name: &str) -> Expr {
  Expr::Member {
    object: Box::new(object),
    key: MemberKey::Static(name.to_string()),
  }
}

pub fn index(object: Expr, i: f64) -> Expr {
  Expr::Member {
    object: Box::new(object),
    key: MemberKey::Computed(Box::new(num(i))),
  }
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
  Expr::Call {
    callee: Box::new(callee),
    args,
  }
}

pub fn method(object: Expr, name: &str, args: Vec<Expr>) -> Expr {
  call(member(object, name), args)
}

pub fn new_expr(callee: Expr, args: Vec<Expr>) -> Expr {
  Expr::New {
    callee: Box::new(callee),
    args,
  }
}

pub fn func_def(name: Option<&str>, params: &[&str], body: Vec<Stmt>) -> Rc<FunctionDef> {
  Rc::new(FunctionDef {
    name: name.map(str::to_string),
    params: params.iter().map(|p| p.to_string()).collect(),
    body,
  })
}

pub fn func_decl(name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
  Stmt::FunctionDecl(func_def(Some(name), params, body))
}

pub fn func_expr(params: &[&str], body: Vec<Stmt>) -> Expr {
  Expr::Function(func_def(None, params, body))
}

pub fn object_lit(props: Vec<PropertyInit>) -> Expr {
  Expr::ObjectLit(props)
}

pub fn data_prop(key: &str, value: Expr) -> PropertyInit {
  PropertyInit {
    key: key.to_string(),
    kind: PropertyInitKind::Data(value),
  }
}

pub fn getter_prop(key: &str, body: Vec<Stmt>) -> PropertyInit {
  PropertyInit {
    key: key.to_string(),
    kind: PropertyInitKind::Getter(func_def(None, &[], body)),
  }
}

pub fn setter_prop(key: &str, param: &str, body: Vec<Stmt>) -> PropertyInit {
  PropertyInit {
    key: key.to_string(),
    kind: PropertyInitKind::Setter(func_def(None, &[param], body)),
  }
}

pub fn array_lit(elements: Vec<Option<Expr>>) -> Expr {
  Expr::ArrayLit(elements)
}

pub fn block(body: Vec<Stmt>) -> Stmt {
  Stmt::Block(body)
}

pub fn if_stmt(test: Expr, consequent: Stmt) -> Stmt {
  Stmt::If {
    test,
    consequent: Box::new(consequent),
    alternate: None,
  }
}

pub fn if_else(test: Expr, consequent: Stmt, alternate: Stmt) -> Stmt {
  Stmt::If {
    test,
    consequent: Box::new(consequent),
    alternate: Some(Box::new(alternate)),
  }
}

pub fn while_stmt(test: Expr, body: Stmt) -> Stmt {
  Stmt::While {
    test,
    body: Box::new(body),
  }
}

pub fn for_in(target: Expr, object: Expr, body: Stmt) -> Stmt {
  Stmt::ForIn {
    target,
    object,
    body: Box::new(body),
  }
}

pub fn labeled(label: &str, body: Stmt) -> Stmt {
  Stmt::Labeled {
    label: label.to_string(),
    body: Box::new(body),
  }
}

pub fn brk(label: Option<&str>) -> Stmt {
  Stmt::Break(label.map(str::to_string))
}

pub fn cont(label: Option<&str>) -> Stmt {
  Stmt::Continue(label.map(str::to_string))
}

pub fn throw_stmt(e: Expr) -> Stmt {
  Stmt::Throw(e)
}

pub fn try_catch(block: Vec<Stmt>, param: &str, body: Vec<Stmt>) -> Stmt {
  Stmt::Try {
    block,
    catch: Some(CatchClause {
      param: param.to_string(),
      body,
    }),
    finally: None,
  }
}

pub fn try_finally(block: Vec<Stmt>, finally: Vec<Stmt>) -> Stmt {
  Stmt::Try {
    block,
    catch: None,
    finally: Some(finally),
  }
}

pub fn try_catch_finally(
  block: Vec<Stmt>,
  param: &str,
  body: Vec<Stmt>,
  finally: Vec<Stmt>,
) -> Stmt {
  Stmt::Try {
    block,
    catch: Some(CatchClause {
      param: param.to_string(),
      body,
    }),
    finally: Some(finally),
  }
}

pub fn switch_stmt(discriminant: Expr, cases: Vec<SwitchCase>) -> Stmt {
  Stmt::Switch {
    discriminant,
    cases,
  }
}

pub fn case(test: Expr, body: Vec<Stmt>) -> SwitchCase {
  SwitchCase {
    test: Some(test),
    body,
  }
}

pub fn default_case(body: Vec<Stmt>) -> SwitchCase {
  SwitchCase { test: None, body }
}

pub fn with_stmt(object: Expr, body: Stmt) -> Stmt {
  Stmt::With {
    object,
    body: Box::new(body),
  }
}

/// The `name` of a thrown error object, or an empty string for anything else.
pub fn thrown_name(engine: &mut Engine, err: &EngineError) -> String {
  match err {
    EngineError::Throw(Value::Object(obj)) => match engine.get_str(*obj, "name") {
      Ok(Value::String(s)) => s.to_string(),
      _ => String::new(),
    },
    _ => String::new(),
  }
}

pub fn assert_number(value: &Value, expected: f64) {
  match value {
    Value::Number(n) => assert_eq!(*n, expected, "expected {expected}, got {n}"),
    other => panic!("expected number {expected}, got {other:?}"),
  }
}

pub fn assert_string(value: &Value, expected: &str) {
  match value {
    Value::String(s) => assert_eq!(s.as_str(), expected),
    other => panic!("expected string {expected:?}, got {other:?}"),
  }
}
