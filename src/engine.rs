//! The embedding facade: one [`Engine`] per evaluation context.
//!
//! An engine owns the heap, the global object and environment, the intrinsic
//! object graph and the module registry. Hosts thread it explicitly through
//! every operation; independent engines in one process do not share state.

use crate::ast::Program;
use crate::env::EnvRecord;
use crate::exec::{Completion, Ctx};
use crate::function::{JsFunction, NativeFn};
use crate::heap::Heap;
use crate::intrinsics::{ErrorKind, Intrinsics};
use crate::object::{ObjectKind, ObjectRecord};
use crate::property::{Property, PropertyKey};
use crate::strict::{has_use_strict_directive, validate_program};
use crate::value::{JsStr, Value};
use crate::{EngineError, GcEnv, GcObject};
use ahash::AHashMap;
use std::any::Any;
use std::rc::Rc;

const DEFAULT_MAX_CALL_DEPTH: usize = 512;

/// A host-native value at the embedding boundary.
///
/// Collaborators lift their results (query rows, file contents) through
/// [`Engine::normalize_value`] without the core depending on any specific
/// host facility.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
  Undefined,
  Null,
  Bool(bool),
  Number(f64),
  String(String),
  List(Vec<HostValue>),
  /// Field name/value pairs; insertion order becomes property order.
  Record(Vec<(String, HostValue)>),
}

pub struct Engine {
  pub(crate) heap: Heap,
  pub(crate) intrinsics: Intrinsics,
  pub(crate) global: GcObject,
  pub(crate) global_env: GcEnv,
  pub(crate) call_depth: usize,
  pub(crate) max_call_depth: usize,
  modules: AHashMap<String, ModuleEntry>,
  host_data: Option<Box<dyn Any>>,
}

struct ModuleEntry {
  program: Rc<Program>,
  state: ModuleState,
}

enum ModuleState {
  Registered,
  Loading,
  Loaded(Value),
}

impl Default for Engine {
  fn default() -> Self {
    Self::new()
  }
}

impl Engine {
  /// Creates a fresh evaluation context with the standard intrinsics and
  /// global bindings installed.
  pub fn new() -> Self {
    let mut heap = Heap::new();
    let intrinsics = Intrinsics::create(&mut heap);

    let global = heap.alloc_object(ObjectRecord::new(
      ObjectKind::Global,
      Some(intrinsics.object_prototype),
    ));
    let mut global_env_record = EnvRecord::object(None, global);
    global_env_record.this_value = Some(Value::Object(global));
    let global_env = heap.alloc_env(global_env_record);

    let mut engine = Self {
      heap,
      intrinsics,
      global,
      global_env,
      call_depth: 0,
      max_call_depth: DEFAULT_MAX_CALL_DEPTH,
      modules: AHashMap::new(),
      host_data: None,
    };
    crate::builtins::install(&mut engine).expect("fresh realm handles are valid");
    engine
  }

  /// The root object record. Collaborators extend the language by installing
  /// properties here via `put`/`define_property`; that is the sole extension
  /// mechanism.
  pub fn global_object(&self) -> GcObject {
    self.global
  }

  /// Caps the call depth (each nested invocation counts one); exceeding it
  /// throws a RangeError.
  pub fn set_max_call_depth(&mut self, depth: usize) {
    self.max_call_depth = depth;
  }

  /// Allocates a plain object with the standard prototype linked.
  pub fn new_object(&mut self) -> GcObject {
    self.heap.alloc_object(ObjectRecord::new(
      ObjectKind::Ordinary,
      Some(self.intrinsics.object_prototype),
    ))
  }

  /// Allocates an ordinary object with an explicit prototype link.
  pub fn new_object_with_prototype(&mut self, prototype: Option<GcObject>) -> GcObject {
    self
      .heap
      .alloc_object(ObjectRecord::new(ObjectKind::Ordinary, prototype))
  }

  /// Wraps a host function in a callable function object. Installing the
  /// result on the global object (via `put`/`define_property`) is how hosts
  /// extend the language.
  pub fn create_native_function(
    &mut self,
    name: &str,
    length: u32,
    f: NativeFn,
  ) -> Result<GcObject, EngineError> {
    let function = JsFunction::native(JsStr::from(name), length, f, false);
    self.alloc_function(function)
  }

  /// Runs a syntax tree in the global scope, returning its completion value.
  ///
  /// Static-semantics validation runs first; any violation prevents
  /// evaluation from starting.
  pub fn evaluate(&mut self, program: &Program) -> Result<Value, EngineError> {
    let errors = validate_program(program);
    if !errors.is_empty() {
      return Err(EngineError::Syntax(errors));
    }
    let ctx = Ctx {
      env: self.global_env,
      strict: has_use_strict_directive(&program.body),
    };
    self.hoist(&program.body, ctx)?;
    match self.eval_stmts(&program.body, ctx)? {
      Completion::Normal(value) => Ok(value.unwrap_or(Value::Undefined)),
      Completion::Return(value) => Ok(value),
      _ => Ok(Value::Undefined),
    }
  }

  /// Registers a named module-like unit for [`Engine::evaluate_load_module`].
  /// Re-registering a name replaces the program and drops any cached value.
  pub fn register_module(&mut self, name: &str, program: Program) {
    self.modules.insert(
      name.to_string(),
      ModuleEntry {
        program: Rc::new(program),
        state: ModuleState::Registered,
      },
    );
  }

  /// Evaluates a registered unit once and caches its completion value;
  /// later loads return the cached value. A transitive self-load is a
  /// [`EngineError::ModuleCycle`].
  pub fn evaluate_load_module(&mut self, name: &str) -> Result<Value, EngineError> {
    let program = match self.modules.get_mut(name) {
      None => return Err(EngineError::UnknownModule(name.to_string())),
      Some(entry) => match &entry.state {
        ModuleState::Loaded(value) => return Ok(value.clone()),
        ModuleState::Loading => return Err(EngineError::ModuleCycle(name.to_string())),
        ModuleState::Registered => {
          entry.state = ModuleState::Loading;
          entry.program.clone()
        }
      },
    };

    log::debug!("loading module {name}");
    let result = self.evaluate(&program);
    if let Some(entry) = self.modules.get_mut(name) {
      entry.state = match &result {
        Ok(value) => ModuleState::Loaded(value.clone()),
        // A failed load stays registered so the host can retry.
        Err(_) => ModuleState::Registered,
      };
    }
    result
  }

  /// Lifts a host-native value into the value model.
  pub fn normalize_value(&mut self, host: &HostValue) -> Result<Value, EngineError> {
    Ok(match host {
      HostValue::Undefined => Value::Undefined,
      HostValue::Null => Value::Null,
      HostValue::Bool(b) => Value::Bool(*b),
      HostValue::Number(n) => Value::Number(*n),
      HostValue::String(s) => Value::string(s),
      HostValue::List(items) => {
        let arr = self.new_array(0);
        for (i, item) in items.iter().enumerate() {
          let value = self.normalize_value(item)?;
          self.put(arr, &PropertyKey::Index(i as u32), value, false)?;
        }
        Value::Object(arr)
      }
      HostValue::Record(fields) => {
        let obj = self.new_object();
        for (name, field) in fields {
          let value = self.normalize_value(field)?;
          self.put(obj, &PropertyKey::from_str(name), value, false)?;
        }
        Value::Object(obj)
      }
    })
  }

  // Host state.

  pub fn set_host_data(&mut self, data: Box<dyn Any>) {
    self.host_data = Some(data);
  }

  pub fn host_data<T: 'static>(&self) -> Option<&T> {
    self.host_data.as_ref()?.downcast_ref()
  }

  pub fn host_data_mut<T: 'static>(&mut self) -> Option<&mut T> {
    self.host_data.as_mut()?.downcast_mut()
  }

  // Garbage collection.

  /// Runs a mark/sweep cycle.
  ///
  /// This is a safe point operation: it must not be called from inside a
  /// native function while an evaluation is active, since activation records
  /// of in-flight calls are not part of the root set. Roots are the global
  /// object and environment, the intrinsic graph, cached module values and
  /// persistent roots registered on the heap.
  pub fn collect_garbage(&mut self) {
    let mut roots = vec![Value::Object(self.global)];
    roots.extend(self.intrinsics.roots());
    for entry in self.modules.values() {
      if let ModuleState::Loaded(value) = &entry.state {
        roots.push(value.clone());
      }
    }
    let env_roots = [self.global_env];
    self.heap.collect_garbage(&roots, &env_roots);
  }

  pub fn heap(&self) -> &Heap {
    &self.heap
  }

  pub fn heap_mut(&mut self) -> &mut Heap {
    &mut self.heap
  }

  // Error construction.

  /// Builds a structured error object (`name` via the per-kind prototype,
  /// `message` as an own property).
  pub fn make_error(&mut self, kind: ErrorKind, message: &str) -> Value {
    let prototype = self.intrinsics.error_prototype_for(kind);
    let obj = self
      .heap
      .alloc_object(ObjectRecord::new(ObjectKind::Ordinary, Some(prototype)));
    if let Ok(record) = self.heap.get_mut(obj) {
      record.properties.set(
        PropertyKey::from_str("message"),
        Property::data(Value::string(message), true, false, true),
      );
    }
    Value::Object(obj)
  }

  pub fn throw_error(&mut self, kind: ErrorKind, message: &str) -> EngineError {
    EngineError::Throw(self.make_error(kind, message))
  }

  /// Renders a value for host-side reporting (uncaught throws, logs).
  /// Error-shaped objects format as `name: message`; everything else goes
  /// through `ToString`, falling back to the `typeof` class if the conversion
  /// itself throws.
  pub fn describe_value(&mut self, value: &Value) -> String {
    if let Some(obj) = value.as_object() {
      let name = self.get_str(obj, "name").unwrap_or(Value::Undefined);
      let message = self.get_str(obj, "message").unwrap_or(Value::Undefined);
      if !name.is_undefined() && !message.is_undefined() {
        let name = self
          .to_js_string(&name)
          .unwrap_or_else(|_| JsStr::from("Error"));
        let message = self
          .to_js_string(&message)
          .unwrap_or_else(|_| JsStr::from(""));
        return if message.is_empty() {
          name.to_string()
        } else {
          format!("{name}: {message}")
        };
      }
    }
    match self.to_js_string(value) {
      Ok(s) => s.to_string(),
      Err(_) => self.type_of(value).to_string(),
    }
  }

  pub(crate) fn throw_type_error(&mut self, message: &str) -> EngineError {
    self.throw_error(ErrorKind::Type, message)
  }

  pub(crate) fn throw_range_error(&mut self, message: &str) -> EngineError {
    self.throw_error(ErrorKind::Range, message)
  }

  pub(crate) fn throw_reference_error(&mut self, message: &str) -> EngineError {
    self.throw_error(ErrorKind::Reference, message)
  }
}
