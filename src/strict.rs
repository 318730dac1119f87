//! Strict-mode static validation.
//!
//! A single pre-evaluation pass over the syntax tree carrying one `strict`
//! flag. The flag flips to `true` when a scope's directive prologue contains
//! the exact literal `"use strict"`, is inherited by nested functions (it can
//! never be turned off by an inner scope), and an inner function may opt in
//! independently of a sloppy outer scope.
//!
//! Every violation prevents evaluation from starting; violations are collected
//! rather than reported first-failure.

use crate::ast::{
  CatchClause, Expr, ForInit, FunctionDef, Program, PropertyInitKind, Stmt, UnaryOp,
};
use crate::error::{EarlyError, EarlyErrorKind};
use ahash::{AHashMap, AHashSet};
use once_cell::sync::Lazy;

/// Identifiers reserved in strict mode (a fixed, closed set).
static STRICT_RESERVED: Lazy<AHashSet<&'static str>> = Lazy::new(|| {
  [
    "implements",
    "interface",
    "let",
    "package",
    "private",
    "protected",
    "public",
    "static",
    "yield",
  ]
  .into_iter()
  .collect()
});

/// Returns `true` if the leading directive prologue of `body` contains the
/// exact literal `"use strict"`.
///
/// The prologue is the maximal leading run of bare string-literal expression
/// statements.
pub fn has_use_strict_directive(body: &[Stmt]) -> bool {
  for stmt in body {
    let Stmt::Expr(Expr::Str(s)) = stmt else {
      return false;
    };
    if s == "use strict" {
      return true;
    }
  }
  false
}

/// Validates a whole program, returning every static-semantics violation.
pub fn validate_program(program: &Program) -> Vec<EarlyError> {
  let mut v = Validator { errors: Vec::new() };
  let strict = has_use_strict_directive(&program.body);
  v.check_stmts(&program.body, strict);
  v.errors
}

struct Validator {
  errors: Vec<EarlyError>,
}

impl Validator {
  fn error(&mut self, kind: EarlyErrorKind, message: String) {
    self.errors.push(EarlyError { kind, message });
  }

  fn check_binding_name(&mut self, name: &str, strict: bool, what: &str) {
    if !strict {
      return;
    }
    if name == "eval" || name == "arguments" {
      self.error(
        EarlyErrorKind::StrictBindingName,
        format!("cannot bind `{name}` as {what} in strict mode"),
      );
    } else if STRICT_RESERVED.contains(name) {
      self.error(
        EarlyErrorKind::StrictBindingName,
        format!("`{name}` is a reserved word in strict mode"),
      );
    }
  }

  fn check_function(&mut self, def: &FunctionDef, inherited_strict: bool) {
    let strict = inherited_strict || has_use_strict_directive(&def.body);

    if let Some(name) = &def.name {
      self.check_binding_name(name, strict, "a function name");
    }
    let mut seen = AHashSet::new();
    for param in &def.params {
      self.check_binding_name(param, strict, "a parameter");
      if strict && !seen.insert(param.as_str()) {
        self.error(
          EarlyErrorKind::StrictDuplicateParameter,
          format!("duplicate parameter name `{param}` in strict mode"),
        );
      }
    }
    self.check_stmts(&def.body, strict);
  }

  fn check_stmts(&mut self, stmts: &[Stmt], strict: bool) {
    for stmt in stmts {
      self.check_stmt(stmt, strict);
    }
  }

  fn check_stmt(&mut self, stmt: &Stmt, strict: bool) {
    match stmt {
      Stmt::Empty => {}
      Stmt::Expr(expr) => self.check_expr(expr, strict),
      Stmt::VarDecl(decls) => {
        for (name, init) in decls {
          self.check_binding_name(name, strict, "a variable");
          if let Some(init) = init {
            self.check_expr(init, strict);
          }
        }
      }
      Stmt::FunctionDecl(def) => self.check_function(def, strict),
      Stmt::Block(body) => self.check_stmts(body, strict),
      Stmt::If {
        test,
        consequent,
        alternate,
      } => {
        self.check_expr(test, strict);
        self.check_stmt(consequent, strict);
        if let Some(alt) = alternate {
          self.check_stmt(alt, strict);
        }
      }
      Stmt::While { test, body } => {
        self.check_expr(test, strict);
        self.check_stmt(body, strict);
      }
      Stmt::DoWhile { body, test } => {
        self.check_stmt(body, strict);
        self.check_expr(test, strict);
      }
      Stmt::For {
        init,
        test,
        update,
        body,
      } => {
        match init {
          Some(ForInit::Expr(expr)) => self.check_expr(expr, strict),
          Some(ForInit::VarDecl(decls)) => {
            for (name, init) in decls {
              self.check_binding_name(name, strict, "a variable");
              if let Some(init) = init {
                self.check_expr(init, strict);
              }
            }
          }
          None => {}
        }
        if let Some(test) = test {
          self.check_expr(test, strict);
        }
        if let Some(update) = update {
          self.check_expr(update, strict);
        }
        self.check_stmt(body, strict);
      }
      Stmt::ForIn {
        target,
        object,
        body,
      } => {
        self.check_assignment_target(target, strict);
        self.check_expr(object, strict);
        self.check_stmt(body, strict);
      }
      Stmt::Return(value) => {
        if let Some(value) = value {
          self.check_expr(value, strict);
        }
      }
      Stmt::Break(_) | Stmt::Continue(_) => {}
      Stmt::Labeled { body, .. } => self.check_stmt(body, strict),
      Stmt::Throw(expr) => self.check_expr(expr, strict),
      Stmt::Try {
        block,
        catch,
        finally,
      } => {
        self.check_stmts(block, strict);
        if let Some(CatchClause { param, body }) = catch {
          self.check_binding_name(param, strict, "a catch parameter");
          self.check_stmts(body, strict);
        }
        if let Some(finally) = finally {
          self.check_stmts(finally, strict);
        }
      }
      Stmt::Switch {
        discriminant,
        cases,
      } => {
        self.check_expr(discriminant, strict);
        for case in cases {
          if let Some(test) = &case.test {
            self.check_expr(test, strict);
          }
          self.check_stmts(&case.body, strict);
        }
      }
      Stmt::With { object, body } => {
        if strict {
          self.error(
            EarlyErrorKind::StrictWith,
            "`with` statements are not allowed in strict mode".to_string(),
          );
        }
        self.check_expr(object, strict);
        self.check_stmt(body, strict);
      }
    }
  }

  /// Checks an assignment/update/for-in target.
  ///
  /// Only a target that resolves to a bare identifier named `eval` or
  /// `arguments` is restricted; member-expression targets assign a property,
  /// not a binding.
  fn check_assignment_target(&mut self, target: &Expr, strict: bool) {
    if strict {
      if let Expr::Ident(name) = target {
        if name == "eval" || name == "arguments" {
          self.error(
            EarlyErrorKind::StrictAssignmentTarget,
            format!("cannot assign to `{name}` in strict mode"),
          );
        }
      }
    }
    self.check_expr(target, strict);
  }

  fn check_expr(&mut self, expr: &Expr, strict: bool) {
    match expr {
      Expr::Null | Expr::Bool(_) | Expr::Number(_) | Expr::Str(_) | Expr::This => {}
      Expr::Ident(_) => {}
      Expr::ArrayLit(elements) => {
        for element in elements.iter().flatten() {
          self.check_expr(element, strict);
        }
      }
      Expr::ObjectLit(props) => self.check_object_literal(props, strict),
      Expr::Function(def) => self.check_function(def, strict),
      Expr::Member { object, key } => {
        self.check_expr(object, strict);
        if let crate::ast::MemberKey::Computed(key) = key {
          self.check_expr(key, strict);
        }
      }
      Expr::Call { callee, args } | Expr::New { callee, args } => {
        self.check_expr(callee, strict);
        for arg in args {
          self.check_expr(arg, strict);
        }
      }
      Expr::Unary { op, operand } => {
        if *op == UnaryOp::Delete && strict {
          if let Expr::Ident(name) = operand.as_ref() {
            self.error(
              EarlyErrorKind::StrictDelete,
              format!("cannot delete unqualified identifier `{name}` in strict mode"),
            );
          }
        }
        self.check_expr(operand, strict);
      }
      Expr::Update { target, .. } => self.check_assignment_target(target, strict),
      Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
        self.check_expr(left, strict);
        self.check_expr(right, strict);
      }
      Expr::Conditional {
        test,
        consequent,
        alternate,
      } => {
        self.check_expr(test, strict);
        self.check_expr(consequent, strict);
        self.check_expr(alternate, strict);
      }
      Expr::Assign { target, value, .. } => {
        self.check_assignment_target(target, strict);
        self.check_expr(value, strict);
      }
      Expr::Seq(exprs) => {
        for expr in exprs {
          self.check_expr(expr, strict);
        }
      }
    }
  }

  fn check_object_literal(&mut self, props: &[crate::ast::PropertyInit], strict: bool) {
    #[derive(Default, Clone, Copy)]
    struct Seen {
      data: bool,
      getter: bool,
      setter: bool,
    }

    let mut seen: AHashMap<&str, Seen> = AHashMap::new();
    for prop in props {
      let entry = seen.entry(prop.key.as_str()).or_default();
      match &prop.kind {
        PropertyInitKind::Data(value) => {
          // Duplicate data properties are only rejected in strict code; a data
          // property clashing with an accessor is rejected everywhere.
          if (strict && entry.data) || entry.getter || entry.setter {
            self.error(
              EarlyErrorKind::DuplicateObjectLiteralProperty,
              format!("conflicting definitions for property `{}`", prop.key),
            );
          }
          entry.data = true;
          self.check_expr(value, strict);
        }
        PropertyInitKind::Getter(def) => {
          if entry.getter || entry.data {
            self.error(
              EarlyErrorKind::DuplicateObjectLiteralProperty,
              format!("conflicting definitions for property `{}`", prop.key),
            );
          }
          entry.getter = true;
          self.check_function(def, strict);
        }
        PropertyInitKind::Setter(def) => {
          if entry.setter || entry.data {
            self.error(
              EarlyErrorKind::DuplicateObjectLiteralProperty,
              format!("conflicting definitions for property `{}`", prop.key),
            );
          }
          entry.setter = true;
          self.check_function(def, strict);
        }
      }
    }
  }
}
