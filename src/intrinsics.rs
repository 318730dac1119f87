//! The intrinsic object graph: the standard prototypes every realm carries.
//!
//! Intrinsics are created before the global object and rooted independently of
//! it, so deleting a global binding (`delete globalThis.TypeError`) never
//! unroots the prototype the engine itself needs for error construction.

use crate::function::JsFunction;
use crate::heap::Heap;
use crate::object::{ArrayData, ObjectKind, ObjectRecord};
use crate::value::{JsStr, Value};
use crate::GcObject;

/// The built-in error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  Error,
  Type,
  Range,
  Reference,
  Syntax,
}

impl ErrorKind {
  pub fn name(self) -> &'static str {
    match self {
      ErrorKind::Error => "Error",
      ErrorKind::Type => "TypeError",
      ErrorKind::Range => "RangeError",
      ErrorKind::Reference => "ReferenceError",
      ErrorKind::Syntax => "SyntaxError",
    }
  }

  pub(crate) const ALL: [ErrorKind; 5] = [
    ErrorKind::Error,
    ErrorKind::Type,
    ErrorKind::Range,
    ErrorKind::Reference,
    ErrorKind::Syntax,
  ];
}

/// Handles to the per-realm intrinsic objects.
#[derive(Debug)]
pub(crate) struct Intrinsics {
  pub object_prototype: GcObject,
  /// Callable, as the standard requires.
  pub function_prototype: GcObject,
  /// An array of length 0, as the standard requires.
  pub array_prototype: GcObject,
  pub error_prototype: GcObject,
  pub type_error_prototype: GcObject,
  pub range_error_prototype: GcObject,
  pub reference_error_prototype: GcObject,
  pub syntax_error_prototype: GcObject,
  /// The shared accessor installed on restricted properties (strict
  /// `arguments.callee`).
  pub type_error_thrower: GcObject,
}

impl Intrinsics {
  /// Allocates the bare prototype skeleton. Builtin methods are installed
  /// afterwards by [`crate::builtins::install`], once an engine exists.
  pub(crate) fn create(heap: &mut Heap) -> Self {
    let object_prototype = heap.alloc_object(ObjectRecord::new(ObjectKind::Ordinary, None));

    let function_prototype = heap.alloc_object(ObjectRecord::new(
      ObjectKind::Function(Box::new(JsFunction::native(
        JsStr::from(""),
        0,
        crate::builtins::function_prototype_call_self,
        false,
      ))),
      Some(object_prototype),
    ));

    let array_prototype = heap.alloc_object(ObjectRecord::new(
      ObjectKind::Array(ArrayData::new(0)),
      Some(object_prototype),
    ));

    let error_prototype =
      heap.alloc_object(ObjectRecord::new(ObjectKind::Ordinary, Some(object_prototype)));
    let derived = |heap: &mut Heap| {
      heap.alloc_object(ObjectRecord::new(ObjectKind::Ordinary, Some(error_prototype)))
    };
    let type_error_prototype = derived(heap);
    let range_error_prototype = derived(heap);
    let reference_error_prototype = derived(heap);
    let syntax_error_prototype = derived(heap);

    let type_error_thrower = heap.alloc_object(ObjectRecord::new(
      ObjectKind::Function(Box::new(JsFunction::native(
        JsStr::from(""),
        0,
        crate::builtins::restricted_property_thrower,
        false,
      ))),
      Some(function_prototype),
    ));

    Self {
      object_prototype,
      function_prototype,
      array_prototype,
      error_prototype,
      type_error_prototype,
      range_error_prototype,
      reference_error_prototype,
      syntax_error_prototype,
      type_error_thrower,
    }
  }

  pub(crate) fn error_prototype_for(&self, kind: ErrorKind) -> GcObject {
    match kind {
      ErrorKind::Error => self.error_prototype,
      ErrorKind::Type => self.type_error_prototype,
      ErrorKind::Range => self.range_error_prototype,
      ErrorKind::Reference => self.reference_error_prototype,
      ErrorKind::Syntax => self.syntax_error_prototype,
    }
  }

  /// The GC root contribution of the intrinsic graph.
  pub(crate) fn roots(&self) -> Vec<Value> {
    vec![
      Value::Object(self.object_prototype),
      Value::Object(self.function_prototype),
      Value::Object(self.array_prototype),
      Value::Object(self.error_prototype),
      Value::Object(self.type_error_prototype),
      Value::Object(self.range_error_prototype),
      Value::Object(self.reference_error_prototype),
      Value::Object(self.syntax_error_prototype),
      Value::Object(self.type_error_thrower),
    ]
  }
}
