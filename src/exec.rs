//! The tree-walking evaluator: hoisting pre-pass, scope resolution, the
//! call/construct protocol and per-node evaluation.
//!
//! Abrupt control flow is explicit: statements evaluate to a [`Completion`]
//! propagated as an ordinary return value, and `throw` travels as
//! [`EngineError::Throw`] through the `Result` channel so it is consumable by
//! `try`/`catch` and visible to the host at the top level.

use crate::ast::{
  BinaryOp, CatchClause, Expr, ForInit, FunctionDef, LogicalOp, MemberKey, PropertyInitKind,
  Stmt, UnaryOp, UpdateOp,
};
use crate::convert::{to_boolean, to_uint32, PrimitiveHint};
use crate::engine::Engine;
use crate::env::{EnvKind, EnvRecord};
use crate::function::{Callable, JsFunction};
use crate::object::{ArgumentsData, ObjectKind, ObjectRecord};
use crate::property::{Property, PropertyKey, PropertyPatch};
use crate::strict::has_use_strict_directive;
use crate::value::{JsStr, Value};
use crate::{EngineError, GcEnv, GcObject};
use std::rc::Rc;

/// The result classification of evaluating a statement.
///
/// `Normal(None)` is the empty completion (a statement that produces no
/// value); a non-empty value survives across later empty completions, which is
/// how the completion value of a whole program is determined. `Break` and
/// `Continue` carry the value accumulated before the jump, so a labelled
/// break out of a block preserves the block's completion value.
#[derive(Debug, Clone)]
pub enum Completion {
  Normal(Option<Value>),
  Return(Value),
  Break(Option<String>, Option<Value>),
  Continue(Option<String>, Option<Value>),
}

impl Completion {
  fn empty() -> Self {
    Completion::Normal(None)
  }
}

/// Per-evaluation context: the active environment record and the static
/// strictness of the enclosing code.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ctx {
  pub env: GcEnv,
  pub strict: bool,
}

fn matches_label(label: &Option<String>, labels: &[String]) -> bool {
  match label {
    None => true,
    Some(l) => labels.iter().any(|candidate| candidate == l),
  }
}

/// Collects the `var` names and function declarations of one lexical level,
/// without descending into nested function bodies.
fn collect_hoisted<'a>(
  stmts: &'a [Stmt],
  vars: &mut Vec<&'a str>,
  funcs: &mut Vec<&'a Rc<FunctionDef>>,
) {
  for stmt in stmts {
    collect_hoisted_stmt(stmt, vars, funcs);
  }
}

fn collect_hoisted_stmt<'a>(
  stmt: &'a Stmt,
  vars: &mut Vec<&'a str>,
  funcs: &mut Vec<&'a Rc<FunctionDef>>,
) {
  match stmt {
    Stmt::VarDecl(decls) => {
      for (name, _) in decls {
        vars.push(name);
      }
    }
    Stmt::FunctionDecl(def) => funcs.push(def),
    Stmt::Block(body) => collect_hoisted(body, vars, funcs),
    Stmt::If {
      consequent,
      alternate,
      ..
    } => {
      collect_hoisted_stmt(consequent, vars, funcs);
      if let Some(alternate) = alternate {
        collect_hoisted_stmt(alternate, vars, funcs);
      }
    }
    Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
      collect_hoisted_stmt(body, vars, funcs)
    }
    Stmt::For { init, body, .. } => {
      if let Some(ForInit::VarDecl(decls)) = init {
        for (name, _) in decls {
          vars.push(name);
        }
      }
      collect_hoisted_stmt(body, vars, funcs);
    }
    Stmt::ForIn { body, .. } => collect_hoisted_stmt(body, vars, funcs),
    Stmt::Labeled { body, .. } => collect_hoisted_stmt(body, vars, funcs),
    Stmt::Try {
      block,
      catch,
      finally,
    } => {
      collect_hoisted(block, vars, funcs);
      if let Some(CatchClause { body, .. }) = catch {
        collect_hoisted(body, vars, funcs);
      }
      if let Some(finally) = finally {
        collect_hoisted(finally, vars, funcs);
      }
    }
    Stmt::Switch { cases, .. } => {
      for case in cases {
        collect_hoisted(&case.body, vars, funcs);
      }
    }
    Stmt::With { body, .. } => collect_hoisted_stmt(body, vars, funcs),
    Stmt::Empty | Stmt::Expr(_) | Stmt::Return(_) | Stmt::Break(_) | Stmt::Continue(_)
    | Stmt::Throw(_) => {}
  }
}

impl Engine {
  /// The hoisting pre-pass: pre-binds every `var` name (to Undefined, unless
  /// already bound) and every function declaration (to a fresh closure) of one
  /// lexical level before any statement of that level executes.
  pub(crate) fn hoist(&mut self, body: &[Stmt], ctx: Ctx) -> Result<(), EngineError> {
    let mut vars = Vec::new();
    let mut funcs = Vec::new();
    collect_hoisted(body, &mut vars, &mut funcs);

    for name in vars {
      self.hoist_binding(name, None, ctx)?;
    }
    for def in funcs {
      let function = self.instantiate_function(def.clone(), ctx)?;
      let name = def.name.as_deref().unwrap_or("");
      self.hoist_binding(name, Some(Value::Object(function)), ctx)?;
    }
    Ok(())
  }

  fn hoist_binding(
    &mut self,
    name: &str,
    value: Option<Value>,
    ctx: Ctx,
  ) -> Result<(), EngineError> {
    let record = self.heap.get_env(ctx.env)?;
    match &record.kind {
      EnvKind::Declarative { .. } => {
        let exists = record.binding_index(name).is_some();
        match value {
          Some(value) => {
            self
              .heap
              .get_env_mut(ctx.env)?
              .declare(JsStr::from(name), value, true);
          }
          None if !exists => {
            self
              .heap
              .get_env_mut(ctx.env)?
              .declare(JsStr::from(name), Value::Undefined, true);
          }
          None => {}
        }
      }
      EnvKind::Object { object } => {
        // Global-level bindings are non-configurable object properties.
        let object = *object;
        let key = PropertyKey::from_str(name);
        let exists = self.has_property(object, &key)?;
        match value {
          Some(value) if exists => self.put(object, &key, value, ctx.strict)?,
          Some(value) => self.define_property(
            object,
            &key,
            PropertyPatch {
              value: Some(value),
              writable: Some(true),
              enumerable: Some(true),
              configurable: Some(false),
              ..Default::default()
            },
          )?,
          None if !exists => self.define_property(
            object,
            &key,
            PropertyPatch {
              value: Some(Value::Undefined),
              writable: Some(true),
              enumerable: Some(true),
              configurable: Some(false),
              ..Default::default()
            },
          )?,
          None => {}
        }
      }
    }
    Ok(())
  }

  // Scope resolution.

  /// Resolves `name` to a value, throwing a ReferenceError if no record in the
  /// chain binds it.
  fn resolve_get(&mut self, name: &str, ctx: Ctx) -> Result<Value, EngineError> {
    match self.lookup_binding(name, ctx.env)? {
      Some(BindingRef::Declarative { env, index }) => {
        let record = self.heap.get_env(env)?;
        let EnvKind::Declarative { bindings } = &record.kind else {
          return Err(EngineError::InvalidHandle);
        };
        Ok(bindings[index].value.clone())
      }
      Some(BindingRef::Object { object }) => {
        self.get(object, &PropertyKey::from_str(name))
      }
      None => Err(self.throw_reference_error(&format!("{name} is not defined"))),
    }
  }

  /// Resolves `name` without throwing; `typeof` of an unresolved identifier is
  /// `"undefined"`, not a ReferenceError.
  fn resolve_typeof(&mut self, name: &str, ctx: Ctx) -> Result<Value, EngineError> {
    match self.lookup_binding(name, ctx.env)? {
      Some(_) => self.resolve_get(name, ctx),
      None => Ok(Value::Undefined),
    }
  }

  fn resolve_set(&mut self, name: &str, value: Value, ctx: Ctx) -> Result<(), EngineError> {
    match self.lookup_binding(name, ctx.env)? {
      Some(BindingRef::Declarative { env, index }) => {
        let record = self.heap.get_env_mut(env)?;
        let EnvKind::Declarative { bindings } = &mut record.kind else {
          return Err(EngineError::InvalidHandle);
        };
        if !bindings[index].mutable {
          if ctx.strict {
            return Err(
              self.throw_type_error(&format!("cannot assign to immutable binding `{name}`")),
            );
          }
          return Ok(());
        }
        bindings[index].value = value;
        Ok(())
      }
      Some(BindingRef::Object { object }) => {
        self.put(object, &PropertyKey::from_str(name), value, ctx.strict)
      }
      None => {
        if ctx.strict {
          return Err(self.throw_reference_error(&format!("{name} is not defined")));
        }
        // Sloppy assignment to an unresolved name creates a global property.
        let global = self.global;
        self.put(global, &PropertyKey::from_str(name), value, false)
      }
    }
  }

  /// `delete identifier` (sloppy only; strict code rejects it statically).
  fn resolve_delete(&mut self, name: &str, ctx: Ctx) -> Result<bool, EngineError> {
    match self.lookup_binding(name, ctx.env)? {
      Some(BindingRef::Declarative { .. }) => Ok(false),
      Some(BindingRef::Object { object }) => {
        self.delete(object, &PropertyKey::from_str(name), false)
      }
      None => Ok(true),
    }
  }

  fn lookup_binding(&self, name: &str, env: GcEnv) -> Result<Option<BindingRef>, EngineError> {
    let mut current = Some(env);
    while let Some(env) = current {
      let record = self.heap.get_env(env)?;
      match &record.kind {
        EnvKind::Declarative { .. } => {
          if let Some(index) = record.binding_index(name) {
            return Ok(Some(BindingRef::Declarative { env, index }));
          }
        }
        EnvKind::Object { object } => {
          let object = *object;
          if self.has_property(object, &PropertyKey::from_str(name))? {
            return Ok(Some(BindingRef::Object { object }));
          }
        }
      }
      current = record.outer;
    }
    Ok(None)
  }

  /// The `this` established by the nearest enclosing record that binds one.
  fn resolve_this(&self, env: GcEnv) -> Result<Value, EngineError> {
    let mut current = Some(env);
    while let Some(env) = current {
      let record = self.heap.get_env(env)?;
      if let Some(this_value) = &record.this_value {
        return Ok(this_value.clone());
      }
      current = record.outer;
    }
    Ok(Value::Undefined)
  }

  // Statements.

  pub(crate) fn eval_stmts(&mut self, stmts: &[Stmt], ctx: Ctx) -> Result<Completion, EngineError> {
    let mut result = None;
    for stmt in stmts {
      match self.eval_stmt(stmt, ctx)? {
        Completion::Normal(Some(value)) => result = Some(value),
        Completion::Normal(None) => {}
        // An empty jump completion picks up the value accumulated so far.
        Completion::Break(label, value) => {
          return Ok(Completion::Break(label, value.or(result)))
        }
        Completion::Continue(label, value) => {
          return Ok(Completion::Continue(label, value.or(result)))
        }
        abrupt => return Ok(abrupt),
      }
    }
    Ok(Completion::Normal(result))
  }

  fn eval_stmt(&mut self, stmt: &Stmt, ctx: Ctx) -> Result<Completion, EngineError> {
    match stmt {
      Stmt::Empty => Ok(Completion::empty()),
      Stmt::Expr(expr) => {
        let value = self.eval_expr(expr, ctx)?;
        Ok(Completion::Normal(Some(value)))
      }
      Stmt::VarDecl(decls) => {
        for (name, init) in decls {
          if let Some(init) = init {
            let value = self.eval_expr(init, ctx)?;
            self.resolve_set(name, value, ctx)?;
          }
        }
        Ok(Completion::empty())
      }
      // Bound during hoisting.
      Stmt::FunctionDecl(_) => Ok(Completion::empty()),
      Stmt::Block(body) => self.eval_stmts(body, ctx),
      Stmt::If {
        test,
        consequent,
        alternate,
      } => {
        let test = self.eval_expr(test, ctx)?;
        if to_boolean(&test) {
          self.eval_stmt(consequent, ctx)
        } else if let Some(alternate) = alternate {
          self.eval_stmt(alternate, ctx)
        } else {
          Ok(Completion::empty())
        }
      }
      Stmt::While { .. }
      | Stmt::DoWhile { .. }
      | Stmt::For { .. }
      | Stmt::ForIn { .. } => self.eval_loop(stmt, ctx, &[]),
      Stmt::Return(value) => {
        let value = match value {
          Some(expr) => self.eval_expr(expr, ctx)?,
          None => Value::Undefined,
        };
        Ok(Completion::Return(value))
      }
      Stmt::Break(label) => Ok(Completion::Break(label.clone(), None)),
      Stmt::Continue(label) => Ok(Completion::Continue(label.clone(), None)),
      Stmt::Labeled { .. } => {
        // Collapse a chain of labels onto the labelled statement.
        let mut labels = Vec::new();
        let mut inner = stmt;
        while let Stmt::Labeled { label, body } = inner {
          labels.push(label.clone());
          inner = body.as_ref();
        }
        let completion = match inner {
          Stmt::While { .. }
          | Stmt::DoWhile { .. }
          | Stmt::For { .. }
          | Stmt::ForIn { .. } => self.eval_loop(inner, ctx, &labels)?,
          other => self.eval_stmt(other, ctx)?,
        };
        match completion {
          Completion::Break(Some(label), value) if labels.contains(&label) => {
            Ok(Completion::Normal(value))
          }
          other => Ok(other),
        }
      }
      Stmt::Throw(expr) => {
        let value = self.eval_expr(expr, ctx)?;
        Err(EngineError::Throw(value))
      }
      Stmt::Try {
        block,
        catch,
        finally,
      } => self.eval_try(block, catch.as_ref(), finally.as_deref(), ctx),
      Stmt::Switch {
        discriminant,
        cases,
      } => self.eval_switch(discriminant, cases, ctx),
      Stmt::With { object, body } => {
        let value = self.eval_expr(object, ctx)?;
        let Some(object) = value.as_object() else {
          return Err(self.throw_type_error("`with` requires an object"));
        };
        let scope = self
          .heap
          .alloc_env(EnvRecord::object(Some(ctx.env), object));
        self.eval_stmt(body, Ctx { env: scope, ..ctx })
      }
    }
  }

  fn eval_loop(&mut self, stmt: &Stmt, ctx: Ctx, labels: &[String]) -> Result<Completion, EngineError> {
    let mut result = None;

    macro_rules! run_body {
      ($body:expr) => {
        match self.eval_stmt($body, ctx)? {
          Completion::Normal(Some(value)) => result = Some(value),
          Completion::Normal(None) => {}
          Completion::Continue(label, value) if matches_label(&label, labels) => {
            if value.is_some() {
              result = value;
            }
          }
          Completion::Break(label, value) if matches_label(&label, labels) => {
            return Ok(Completion::Normal(value.or(result)));
          }
          abrupt => return Ok(abrupt),
        }
      };
    }

    match stmt {
      Stmt::While { test, body } => loop {
        let test = self.eval_expr(test, ctx)?;
        if !to_boolean(&test) {
          break;
        }
        run_body!(body);
      },
      Stmt::DoWhile { body, test } => loop {
        run_body!(body);
        let test = self.eval_expr(test, ctx)?;
        if !to_boolean(&test) {
          break;
        }
      },
      Stmt::For {
        init,
        test,
        update,
        body,
      } => {
        match init {
          Some(ForInit::Expr(expr)) => {
            self.eval_expr(expr, ctx)?;
          }
          Some(ForInit::VarDecl(decls)) => {
            for (name, init) in decls {
              if let Some(init) = init {
                let value = self.eval_expr(init, ctx)?;
                self.resolve_set(name, value, ctx)?;
              }
            }
          }
          None => {}
        }
        loop {
          if let Some(test) = test {
            let test = self.eval_expr(test, ctx)?;
            if !to_boolean(&test) {
              break;
            }
          }
          run_body!(body);
          if let Some(update) = update {
            self.eval_expr(update, ctx)?;
          }
        }
      }
      Stmt::ForIn {
        target,
        object,
        body,
      } => {
        let value = self.eval_expr(object, ctx)?;
        // Undefined, Null and other non-objects enumerate nothing.
        let Some(object) = value.as_object() else {
          return Ok(Completion::Normal(result));
        };
        for key in self.enumeration_keys(object)? {
          // A property deleted before being visited is skipped.
          if !self.has_property(object, &key)? {
            continue;
          }
          self.assign_to_target(target, key.to_value(), ctx)?;
          run_body!(body);
        }
      }
      _ => unreachable!("eval_loop on a non-loop statement"),
    }

    Ok(Completion::Normal(result))
  }

  /// Enumeration order for `for (k in o)`: own enumerable keys first, then
  /// prototype levels outward; a key already seen on a nearer level (even a
  /// non-enumerable one) shadows.
  fn enumeration_keys(&self, object: GcObject) -> Result<Vec<PropertyKey>, EngineError> {
    let mut seen = ahash::AHashSet::new();
    let mut out = Vec::new();
    let mut current = Some(object);
    while let Some(obj) = current {
      for key in self.own_keys(obj)? {
        let Some(prop) = self.get_own_property(obj, &key)? else {
          continue;
        };
        if seen.insert(key.clone()) && prop.enumerable {
          out.push(key);
        }
      }
      current = self.heap.get(obj)?.prototype;
    }
    Ok(out)
  }

  fn eval_try(
    &mut self,
    block: &[Stmt],
    catch: Option<&CatchClause>,
    finally: Option<&[Stmt]>,
    ctx: Ctx,
  ) -> Result<Completion, EngineError> {
    let outcome = self.eval_stmts(block, ctx);
    let outcome = match (outcome, catch) {
      (Err(EngineError::Throw(thrown)), Some(CatchClause { param, body })) => {
        // The catch parameter lives in its own scope around the handler.
        let scope = self.heap.alloc_env(EnvRecord::declarative(Some(ctx.env)));
        self
          .heap
          .get_env_mut(scope)?
          .declare(JsStr::from(param.as_str()), thrown, true);
        self.eval_stmts(body, Ctx { env: scope, ..ctx })
      }
      (outcome, _) => outcome,
    };

    if let Some(finally) = finally {
      // An abrupt finalizer completion overrides the try/catch outcome.
      match self.eval_stmts(finally, ctx)? {
        Completion::Normal(_) => {}
        abrupt => return Ok(abrupt),
      }
    }
    outcome
  }

  fn eval_switch(
    &mut self,
    discriminant: &Expr,
    cases: &[crate::ast::SwitchCase],
    ctx: Ctx,
  ) -> Result<Completion, EngineError> {
    let discriminant = self.eval_expr(discriminant, ctx)?;

    let mut matched = None;
    for (i, case) in cases.iter().enumerate() {
      if let Some(test) = &case.test {
        let test = self.eval_expr(test, ctx)?;
        if discriminant.strict_eq(&test) {
          matched = Some(i);
          break;
        }
      }
    }
    // No case matched: fall through from `default`, if present.
    let start = match matched.or_else(|| cases.iter().position(|c| c.test.is_none())) {
      Some(start) => start,
      None => return Ok(Completion::empty()),
    };

    let mut result = None;
    for case in &cases[start..] {
      match self.eval_stmts(&case.body, ctx)? {
        Completion::Normal(Some(value)) => result = Some(value),
        Completion::Normal(None) => {}
        Completion::Break(None, value) => return Ok(Completion::Normal(value.or(result))),
        abrupt => return Ok(abrupt),
      }
    }
    Ok(Completion::Normal(result))
  }

  // Expressions.

  fn eval_expr(&mut self, expr: &Expr, ctx: Ctx) -> Result<Value, EngineError> {
    match expr {
      Expr::Null => Ok(Value::Null),
      Expr::Bool(b) => Ok(Value::Bool(*b)),
      Expr::Number(n) => Ok(Value::Number(*n)),
      Expr::Str(s) => Ok(Value::string(s)),
      Expr::Ident(name) => self.resolve_get(name, ctx),
      Expr::This => {
        let this = self.resolve_this(ctx.env)?;
        // A sloppy top-level or bare-call `this` is the global object.
        if !ctx.strict && matches!(this, Value::Undefined | Value::Null) {
          return Ok(Value::Object(self.global));
        }
        Ok(this)
      }
      Expr::ArrayLit(elements) => {
        let arr = self.new_array(elements.len() as u32);
        for (i, element) in elements.iter().enumerate() {
          if let Some(element) = element {
            let value = self.eval_expr(element, ctx)?;
            self.put(arr, &PropertyKey::Index(i as u32), value, ctx.strict)?;
          }
        }
        Ok(Value::Object(arr))
      }
      Expr::ObjectLit(props) => {
        let obj = self.new_object();
        for prop in props {
          let key = PropertyKey::from_str(&prop.key);
          match &prop.kind {
            PropertyInitKind::Data(value) => {
              let value = self.eval_expr(value, ctx)?;
              self.define_property(
                obj,
                &key,
                PropertyPatch {
                  value: Some(value),
                  writable: Some(true),
                  enumerable: Some(true),
                  configurable: Some(true),
                  ..Default::default()
                },
              )?;
            }
            PropertyInitKind::Getter(def) => {
              let getter = self.instantiate_function(def.clone(), ctx)?;
              self.define_property(
                obj,
                &key,
                PropertyPatch {
                  get: Some(Value::Object(getter)),
                  enumerable: Some(true),
                  configurable: Some(true),
                  ..Default::default()
                },
              )?;
            }
            PropertyInitKind::Setter(def) => {
              let setter = self.instantiate_function(def.clone(), ctx)?;
              self.define_property(
                obj,
                &key,
                PropertyPatch {
                  set: Some(Value::Object(setter)),
                  enumerable: Some(true),
                  configurable: Some(true),
                  ..Default::default()
                },
              )?;
            }
          }
        }
        Ok(Value::Object(obj))
      }
      Expr::Function(def) => {
        // A named function expression sees its own name as an immutable
        // binding in a private scope around the closure.
        if let Some(name) = &def.name {
          let scope = self.heap.alloc_env(EnvRecord::declarative(Some(ctx.env)));
          let function = self.instantiate_function(def.clone(), Ctx { env: scope, ..ctx })?;
          self.heap.get_env_mut(scope)?.declare(
            JsStr::from(name.as_str()),
            Value::Object(function),
            false,
          );
          Ok(Value::Object(function))
        } else {
          let function = self.instantiate_function(def.clone(), ctx)?;
          Ok(Value::Object(function))
        }
      }
      Expr::Member { object, key } => {
        let base = self.eval_expr(object, ctx)?;
        let key = self.member_key(key, ctx)?;
        self.get_member(&base, &key)
      }
      Expr::Call { callee, args } => {
        // A method-style call binds `this` to the receiver.
        let (func, this) = match callee.as_ref() {
          Expr::Member { object, key } => {
            let base = self.eval_expr(object, ctx)?;
            let key = self.member_key(key, ctx)?;
            let func = self.get_member(&base, &key)?;
            (func, base)
          }
          other => (self.eval_expr(other, ctx)?, Value::Undefined),
        };
        let args = self.eval_args(args, ctx)?;
        self.call_value(&func, this, &args)
      }
      Expr::New { callee, args } => {
        let func = self.eval_expr(callee, ctx)?;
        let args = self.eval_args(args, ctx)?;
        self.construct(&func, &args)
      }
      Expr::Unary { op, operand } => self.eval_unary(*op, operand, ctx),
      Expr::Update { op, prefix, target } => {
        let target = self.resolve_target(target, ctx)?;
        let old = self.read_target(&target, ctx)?;
        let old = self.to_number(&old)?;
        let new = match op {
          UpdateOp::Increment => old + 1.0,
          UpdateOp::Decrement => old - 1.0,
        };
        self.write_target(&target, Value::Number(new), ctx)?;
        Ok(Value::Number(if *prefix { new } else { old }))
      }
      Expr::Binary { op, left, right } => {
        let left = self.eval_expr(left, ctx)?;
        let right = self.eval_expr(right, ctx)?;
        self.eval_binary(*op, &left, &right)
      }
      Expr::Logical { op, left, right } => {
        let left = self.eval_expr(left, ctx)?;
        let short_circuit = match op {
          LogicalOp::And => !to_boolean(&left),
          LogicalOp::Or => to_boolean(&left),
        };
        if short_circuit {
          Ok(left)
        } else {
          self.eval_expr(right, ctx)
        }
      }
      Expr::Conditional {
        test,
        consequent,
        alternate,
      } => {
        let test = self.eval_expr(test, ctx)?;
        if to_boolean(&test) {
          self.eval_expr(consequent, ctx)
        } else {
          self.eval_expr(alternate, ctx)
        }
      }
      Expr::Assign { op, target, value } => {
        // The reference (member base and computed key) is evaluated once,
        // before the right-hand side.
        let target = self.resolve_target(target, ctx)?;
        let value = match op {
          None => self.eval_expr(value, ctx)?,
          Some(op) => {
            let current = self.read_target(&target, ctx)?;
            let rhs = self.eval_expr(value, ctx)?;
            self.eval_binary(*op, &current, &rhs)?
          }
        };
        self.write_target(&target, value.clone(), ctx)?;
        Ok(value)
      }
      Expr::Seq(exprs) => {
        let mut last = Value::Undefined;
        for expr in exprs {
          last = self.eval_expr(expr, ctx)?;
        }
        Ok(last)
      }
    }
  }

  fn eval_args(&mut self, args: &[Expr], ctx: Ctx) -> Result<Vec<Value>, EngineError> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
      out.push(self.eval_expr(arg, ctx)?);
    }
    Ok(out)
  }

  fn member_key(&mut self, key: &MemberKey, ctx: Ctx) -> Result<PropertyKey, EngineError> {
    Ok(match key {
      MemberKey::Static(name) => PropertyKey::from_str(name),
      MemberKey::Computed(expr) => {
        let value = self.eval_expr(expr, ctx)?;
        let s = self.to_js_string(&value)?;
        PropertyKey::from_js_str(s)
      }
    })
  }

  /// Property read off an arbitrary base value. Primitives have no property
  /// model in this runtime, so any non-object base is a TypeError.
  fn get_member(&mut self, base: &Value, key: &PropertyKey) -> Result<Value, EngineError> {
    match base.as_object() {
      Some(obj) => self.get(obj, key),
      None => Err(self.throw_type_error(&format!(
        "cannot read property `{key}` of {}",
        base.type_of_primitive()
      ))),
    }
  }

  /// Evaluates an assignment target's reference components (member base and
  /// computed key) exactly once.
  fn resolve_target<'a>(
    &mut self,
    target: &'a Expr,
    ctx: Ctx,
  ) -> Result<TargetRef<'a>, EngineError> {
    match target {
      Expr::Ident(name) => Ok(TargetRef::Ident(name)),
      Expr::Member { object, key } => {
        let base = self.eval_expr(object, ctx)?;
        let key = self.member_key(key, ctx)?;
        Ok(TargetRef::Member { base, key })
      }
      _ => Err(self.throw_reference_error("invalid assignment target")),
    }
  }

  fn read_target(&mut self, target: &TargetRef<'_>, ctx: Ctx) -> Result<Value, EngineError> {
    match target {
      TargetRef::Ident(name) => self.resolve_get(name, ctx),
      TargetRef::Member { base, key } => self.get_member(base, key),
    }
  }

  fn write_target(
    &mut self,
    target: &TargetRef<'_>,
    value: Value,
    ctx: Ctx,
  ) -> Result<(), EngineError> {
    match target {
      TargetRef::Ident(name) => self.resolve_set(name, value, ctx),
      TargetRef::Member { base, key } => match base.as_object() {
        Some(obj) => self.put(obj, key, value, ctx.strict),
        None => Err(self.throw_type_error(&format!(
          "cannot set property `{key}` of {}",
          base.type_of_primitive()
        ))),
      },
    }
  }

  fn assign_to_target(&mut self, target: &Expr, value: Value, ctx: Ctx) -> Result<(), EngineError> {
    let target = self.resolve_target(target, ctx)?;
    self.write_target(&target, value, ctx)
  }

  fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, ctx: Ctx) -> Result<Value, EngineError> {
    match op {
      UnaryOp::TypeOf => {
        // `typeof` never throws on an unresolved identifier.
        let value = match operand {
          Expr::Ident(name) => self.resolve_typeof(name, ctx)?,
          other => self.eval_expr(other, ctx)?,
        };
        Ok(Value::string(self.type_of(&value)))
      }
      UnaryOp::Delete => match operand {
        Expr::Ident(name) => {
          let deleted = self.resolve_delete(name, ctx)?;
          Ok(Value::Bool(deleted))
        }
        Expr::Member { object, key } => {
          let base = self.eval_expr(object, ctx)?;
          let key = self.member_key(key, ctx)?;
          match base.as_object() {
            Some(obj) => {
              let deleted = self.delete(obj, &key, ctx.strict)?;
              Ok(Value::Bool(deleted))
            }
            None => Ok(Value::Bool(true)),
          }
        }
        other => {
          self.eval_expr(other, ctx)?;
          Ok(Value::Bool(true))
        }
      },
      UnaryOp::Void => {
        self.eval_expr(operand, ctx)?;
        Ok(Value::Undefined)
      }
      UnaryOp::Not => {
        let value = self.eval_expr(operand, ctx)?;
        Ok(Value::Bool(!to_boolean(&value)))
      }
      UnaryOp::Neg => {
        let value = self.eval_expr(operand, ctx)?;
        let n = self.to_number(&value)?;
        Ok(Value::Number(-n))
      }
      UnaryOp::Plus => {
        let value = self.eval_expr(operand, ctx)?;
        let n = self.to_number(&value)?;
        Ok(Value::Number(n))
      }
      UnaryOp::BitNot => {
        let value = self.eval_expr(operand, ctx)?;
        let n = self.to_int32_value(&value)?;
        Ok(Value::Number(!n as f64))
      }
    }
  }

  fn eval_binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EngineError> {
    Ok(match op {
      BinaryOp::Add => {
        let lp = self.to_primitive(left, PrimitiveHint::Number)?;
        let rp = self.to_primitive(right, PrimitiveHint::Number)?;
        if matches!(lp, Value::String(_)) || matches!(rp, Value::String(_)) {
          let ls = self.to_js_string(&lp)?;
          let rs = self.to_js_string(&rp)?;
          Value::String(JsStr::from(format!("{ls}{rs}")))
        } else {
          let ln = self.to_number(&lp)?;
          let rn = self.to_number(&rp)?;
          Value::Number(ln + rn)
        }
      }
      BinaryOp::Sub => self.numeric_op(left, right, |a, b| a - b)?,
      BinaryOp::Mul => self.numeric_op(left, right, |a, b| a * b)?,
      BinaryOp::Div => self.numeric_op(left, right, |a, b| a / b)?,
      BinaryOp::Rem => self.numeric_op(left, right, |a, b| a % b)?,
      BinaryOp::Lt => {
        let (lp, rp) = self.comparison_operands(left, right)?;
        Value::Bool(prim_less(&lp, &rp) == Some(true))
      }
      BinaryOp::Gt => {
        let (lp, rp) = self.comparison_operands(left, right)?;
        Value::Bool(prim_less(&rp, &lp) == Some(true))
      }
      BinaryOp::Le => {
        let (lp, rp) = self.comparison_operands(left, right)?;
        Value::Bool(prim_less(&rp, &lp) == Some(false))
      }
      BinaryOp::Ge => {
        let (lp, rp) = self.comparison_operands(left, right)?;
        Value::Bool(prim_less(&lp, &rp) == Some(false))
      }
      BinaryOp::LooseEq => Value::Bool(self.loose_eq(left, right)?),
      BinaryOp::LooseNe => Value::Bool(!self.loose_eq(left, right)?),
      BinaryOp::StrictEq => Value::Bool(left.strict_eq(right)),
      BinaryOp::StrictNe => Value::Bool(!left.strict_eq(right)),
      BinaryOp::BitAnd => self.int32_op(left, right, |a, b| a & b)?,
      BinaryOp::BitOr => self.int32_op(left, right, |a, b| a | b)?,
      BinaryOp::BitXor => self.int32_op(left, right, |a, b| a ^ b)?,
      BinaryOp::Shl => self.int32_op(left, right, |a, b| a << (b & 0x1f))?,
      BinaryOp::Shr => self.int32_op(left, right, |a, b| a >> (b & 0x1f))?,
      BinaryOp::UShr => {
        let a = self.to_number(left)?;
        let b = self.to_number(right)?;
        Value::Number((to_uint32(a) >> (to_uint32(b) & 0x1f)) as f64)
      }
      BinaryOp::In => {
        let Some(obj) = right.as_object() else {
          return Err(self.throw_type_error("`in` requires an object operand"));
        };
        let key = self.to_js_string(left)?;
        Value::Bool(self.has_property(obj, &PropertyKey::from_js_str(key))?)
      }
      BinaryOp::InstanceOf => Value::Bool(self.instance_of(left, right)?),
    })
  }

  fn numeric_op(
    &mut self,
    left: &Value,
    right: &Value,
    op: fn(f64, f64) -> f64,
  ) -> Result<Value, EngineError> {
    let a = self.to_number(left)?;
    let b = self.to_number(right)?;
    Ok(Value::Number(op(a, b)))
  }

  fn int32_op(
    &mut self,
    left: &Value,
    right: &Value,
    op: fn(i32, i32) -> i32,
  ) -> Result<Value, EngineError> {
    let a = self.to_int32_value(left)?;
    let b = self.to_int32_value(right)?;
    Ok(Value::Number(op(a, b) as f64))
  }

  fn comparison_operands(
    &mut self,
    left: &Value,
    right: &Value,
  ) -> Result<(Value, Value), EngineError> {
    let lp = self.to_primitive(left, PrimitiveHint::Number)?;
    let rp = self.to_primitive(right, PrimitiveHint::Number)?;
    Ok((lp, rp))
  }

  fn instance_of(&mut self, value: &Value, constructor: &Value) -> Result<bool, EngineError> {
    if !self.is_callable(constructor) {
      return Err(self.throw_type_error("right-hand side of `instanceof` is not callable"));
    }
    let ctor = constructor.as_object().ok_or_else(|| EngineError::InvalidHandle)?;
    let prototype = self.get_str(ctor, "prototype")?;
    let Some(prototype) = prototype.as_object() else {
      return Err(self.throw_type_error("constructor `prototype` is not an object"));
    };
    let Some(mut current) = value.as_object() else {
      return Ok(false);
    };
    loop {
      match self.heap.get(current)?.prototype {
        Some(parent) if parent == prototype => return Ok(true),
        Some(parent) => current = parent,
        None => return Ok(false),
      }
    }
  }

  /// The `typeof` classification, resolving callables to `"function"`.
  pub fn type_of(&self, value: &Value) -> &'static str {
    if let Some(obj) = value.as_object() {
      if self.heap.get(obj).map_or(false, |r| r.as_function().is_some()) {
        return "function";
      }
    }
    value.type_of_primitive()
  }

  // Functions.

  /// Creates a function object closing over `ctx.env`, with the standard
  /// `prototype` property pre-linked for construction.
  pub(crate) fn instantiate_function(
    &mut self,
    def: Rc<FunctionDef>,
    ctx: Ctx,
  ) -> Result<GcObject, EngineError> {
    let strict = ctx.strict || has_use_strict_directive(&def.body);
    let function = JsFunction::ecma(def, ctx.env, strict);
    let obj = self.alloc_function(function)?;

    let prototype = self.new_object();
    self.define_property(
      prototype,
      &PropertyKey::from_str("constructor"),
      PropertyPatch {
        value: Some(Value::Object(obj)),
        writable: Some(true),
        enumerable: Some(false),
        configurable: Some(true),
        ..Default::default()
      },
    )?;
    self.define_property(
      obj,
      &PropertyKey::from_str("prototype"),
      PropertyPatch {
        value: Some(Value::Object(prototype)),
        writable: Some(true),
        enumerable: Some(false),
        configurable: Some(false),
        ..Default::default()
      },
    )?;
    Ok(obj)
  }

  pub(crate) fn alloc_function(&mut self, function: JsFunction) -> Result<GcObject, EngineError> {
    let prototype = self.intrinsics.function_prototype;
    let obj = self.heap.alloc_object(ObjectRecord::new(
      ObjectKind::Function(Box::new(function)),
      Some(prototype),
    ));
    // `name` and `length` metadata, non-writable and non-enumerable.
    let record = self.heap.get_mut(obj)?;
    let (name, length) = match record.as_function() {
      Some(f) => (Value::String(f.name.clone()), Value::Number(f.length as f64)),
      None => (Value::string(""), Value::Number(0.0)),
    };
    record.properties.set(
      PropertyKey::from_str("name"),
      Property::data(name, false, false, true),
    );
    record.properties.set(
      PropertyKey::from_str("length"),
      Property::data(length, false, false, true),
    );
    Ok(obj)
  }

  pub fn is_callable(&self, value: &Value) -> bool {
    value
      .as_object()
      .and_then(|obj| self.heap.get(obj).ok())
      .is_some_and(|record| record.as_function().is_some())
  }

  /// `[[Call]]`.
  pub fn call_value(
    &mut self,
    callee: &Value,
    this: Value,
    args: &[Value],
  ) -> Result<Value, EngineError> {
    let Some(obj) = callee.as_object() else {
      return Err(self.throw_type_error(&format!(
        "{} is not a function",
        callee.type_of_primitive()
      )));
    };
    enum Target {
      Native(crate::function::NativeFn),
      Ecma {
        def: Rc<FunctionDef>,
        env: GcEnv,
        strict: bool,
      },
    }
    let target = {
      let Some(function) = self.heap.get(obj)?.as_function() else {
        return Err(self.throw_type_error("value is not a function"));
      };
      match &function.callable {
        Callable::Native(f) => Target::Native(*f),
        Callable::Ecma { def, env, strict } => Target::Ecma {
          def: def.clone(),
          env: *env,
          strict: *strict,
        },
      }
    };

    self.enter_call()?;
    let result = match target {
      Target::Native(f) => f(self, this, args),
      Target::Ecma { def, env, strict } => {
        self.call_ecma(obj, &def, env, strict, this, args)
      }
    };
    self.call_depth -= 1;
    result
  }

  fn enter_call(&mut self) -> Result<(), EngineError> {
    if self.call_depth >= self.max_call_depth {
      return Err(self.throw_range_error("maximum call depth exceeded"));
    }
    self.call_depth += 1;
    Ok(())
  }

  fn call_ecma(
    &mut self,
    func_obj: GcObject,
    def: &Rc<FunctionDef>,
    closure_env: GcEnv,
    strict: bool,
    this: Value,
    args: &[Value],
  ) -> Result<Value, EngineError> {
    // `this` binding: strict functions take the value as passed; sloppy
    // functions receive the global object for Undefined/Null (primitives pass
    // through unwrapped).
    let this = if strict {
      this
    } else {
      match this {
        Value::Undefined | Value::Null => Value::Object(self.global),
        other => other,
      }
    };

    let mut activation = EnvRecord::declarative(Some(closure_env));
    activation.this_value = Some(this);
    for (i, param) in def.params.iter().enumerate() {
      let value = args.get(i).cloned().unwrap_or(Value::Undefined);
      activation.declare(JsStr::from(param.as_str()), value, true);
    }
    let env = self.heap.alloc_env(activation);

    // The arguments record, unless a parameter shadows the name.
    if !def.params.iter().any(|p| p == "arguments") {
      let arguments = self.create_arguments(func_obj, env, &def.params, args, strict)?;
      self.heap.get_env_mut(env)?.declare(
        JsStr::from("arguments"),
        Value::Object(arguments),
        false,
      );
    }

    let ctx = Ctx { env, strict };
    self.hoist(&def.body, ctx)?;
    match self.eval_stmts(&def.body, ctx)? {
      Completion::Return(value) => Ok(value),
      _ => Ok(Value::Undefined),
    }
  }

  /// Builds the per-call arguments record.
  ///
  /// Non-strict records carry a live two-way alias between indexed entries and
  /// the positional parameter bindings; strict records are plain objects whose
  /// `callee` access throws.
  fn create_arguments(
    &mut self,
    func_obj: GcObject,
    env: GcEnv,
    params: &[String],
    args: &[Value],
    strict: bool,
  ) -> Result<GcObject, EngineError> {
    let prototype = self.intrinsics.object_prototype;
    let kind = if strict {
      ObjectKind::Ordinary
    } else {
      let mapped = (0..args.len())
        .map(|i| params.get(i).map(|p| JsStr::from(p.as_str())))
        .collect();
      ObjectKind::Arguments(ArgumentsData { env, mapped })
    };
    let obj = self.heap.alloc_object(ObjectRecord::new(kind, Some(prototype)));

    for (i, arg) in args.iter().enumerate() {
      self
        .heap
        .get_mut(obj)?
        .properties
        .set(PropertyKey::Index(i as u32), Property::plain(arg.clone()));
    }
    self.heap.get_mut(obj)?.properties.set(
      PropertyKey::from_str("length"),
      Property::data(Value::Number(args.len() as f64), true, false, true),
    );

    if strict {
      // Reading (or writing) `callee` in a strict function is a TypeError.
      let thrower = Value::Object(self.intrinsics.type_error_thrower);
      self.heap.get_mut(obj)?.properties.set(
        PropertyKey::from_str("callee"),
        Property {
          enumerable: false,
          configurable: false,
          kind: crate::property::PropertyKind::Accessor {
            get: thrower.clone(),
            set: thrower,
          },
        },
      );
    } else {
      self.heap.get_mut(obj)?.properties.set(
        PropertyKey::from_str("callee"),
        Property::data(Value::Object(func_obj), true, false, true),
      );
    }
    Ok(obj)
  }

  /// `[[Construct]]`: allocates a fresh object whose prototype is the callee's
  /// `prototype` property, invokes the callee with it as `this`, and keeps the
  /// allocated object unless the callee explicitly returned another object.
  pub fn construct(&mut self, callee: &Value, args: &[Value]) -> Result<Value, EngineError> {
    let Some(ctor) = callee.as_object() else {
      return Err(self.throw_type_error(&format!(
        "{} is not a constructor",
        callee.type_of_primitive()
      )));
    };
    let constructable = self
      .heap
      .get(ctor)?
      .as_function()
      .map_or(false, |f| f.constructable);
    if !constructable {
      return Err(self.throw_type_error("value is not a constructor"));
    }

    let prototype = match self.get_str(ctor, "prototype")?.as_object() {
      Some(proto) => proto,
      None => self.intrinsics.object_prototype,
    };
    let this = self
      .heap
      .alloc_object(ObjectRecord::new(ObjectKind::Ordinary, Some(prototype)));

    let result = self.call_value(callee, Value::Object(this), args)?;
    Ok(match result {
      Value::Object(obj) => Value::Object(obj),
      _ => Value::Object(this),
    })
  }
}

enum BindingRef {
  Declarative { env: GcEnv, index: usize },
  Object { object: GcObject },
}

/// A resolved assignment target, held across the read and write of a compound
/// operation.
enum TargetRef<'a> {
  Ident(&'a str),
  Member { base: Value, key: PropertyKey },
}

/// The abstract relational comparison over primitives: `Some(a < b)`, or
/// `None` when NaN makes the comparison undefined.
fn prim_less(a: &Value, b: &Value) -> Option<bool> {
  if let (Value::String(a), Value::String(b)) = (a, b) {
    return Some(a.as_str() < b.as_str());
  }
  let a = prim_number(a);
  let b = prim_number(b);
  if a.is_nan() || b.is_nan() {
    return None;
  }
  Some(a < b)
}

/// `ToNumber` restricted to primitives (comparison operands are already
/// primitive).
fn prim_number(value: &Value) -> f64 {
  match value {
    Value::Undefined => f64::NAN,
    Value::Null => 0.0,
    Value::Bool(true) => 1.0,
    Value::Bool(false) => 0.0,
    Value::Number(n) => *n,
    Value::String(s) => crate::convert::parse_number(s),
    Value::Object(_) => f64::NAN,
  }
}
