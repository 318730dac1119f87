use crate::ast::FunctionDef;
use crate::engine::Engine;
use crate::heap::Tracer;
use crate::value::{JsStr, Value};
use crate::{EngineError, GcEnv};
use std::rc::Rc;

/// Signature of a host/native function implementation.
///
/// Natives receive the engine, the `this` value and the actual arguments. A
/// plain function pointer keeps function objects cheaply clonable and trivially
/// traceable; hosts needing per-call state hang it off
/// [`Engine::host_data`](crate::Engine::set_host_data).
pub type NativeFn = fn(&mut Engine, Value, &[Value]) -> Result<Value, EngineError>;

/// A function object's callable state.
///
/// Minimal and "spec-shaped": `[[Call]]` is required, `[[Construct]]` is gated
/// by [`JsFunction::constructable`].
#[derive(Debug)]
pub struct JsFunction {
  /// Function `name` metadata.
  pub(crate) name: JsStr,
  /// Function `length` metadata (declared parameter count).
  pub(crate) length: u32,
  pub(crate) callable: Callable,
  pub(crate) constructable: bool,
}

pub(crate) enum Callable {
  Native(NativeFn),
  /// A language-level closure: the shared function definition plus the
  /// environment captured at closure creation.
  Ecma {
    def: Rc<FunctionDef>,
    env: GcEnv,
    strict: bool,
  },
}

impl std::fmt::Debug for Callable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Callable::Native(_) => f.write_str("Callable::Native"),
      Callable::Ecma { strict, .. } => f
        .debug_struct("Callable::Ecma")
        .field("strict", strict)
        .finish_non_exhaustive(),
    }
  }
}

impl JsFunction {
  pub(crate) fn native(name: JsStr, length: u32, call: NativeFn, constructable: bool) -> Self {
    Self {
      name,
      length,
      callable: Callable::Native(call),
      constructable,
    }
  }

  pub(crate) fn ecma(def: Rc<FunctionDef>, env: GcEnv, strict: bool) -> Self {
    let name = JsStr::from(def.name.as_deref().unwrap_or(""));
    let length = def.params.len() as u32;
    Self {
      name,
      length,
      callable: Callable::Ecma { def, env, strict },
      constructable: true,
    }
  }

  pub(crate) fn trace(&self, tracer: &mut Tracer<'_>) {
    if let Callable::Ecma { env, .. } = &self.callable {
      tracer.trace_env(*env);
    }
  }
}
