//! Native (host-implemented) builtin functions and the realm wiring that
//! installs them on the intrinsic prototypes and the global object.

use crate::convert::{to_boolean, to_uint32};
use crate::engine::Engine;
use crate::intrinsics::ErrorKind;
use crate::object::ObjectKind;
use crate::property::{Property, PropertyKey, PropertyKind, PropertyPatch};
use crate::value::{JsStr, Value};
use crate::{EngineError, GcObject};

/// Installs every builtin onto a freshly created realm.
pub(crate) fn install(engine: &mut Engine) -> Result<(), EngineError> {
  install_object_builtins(engine)?;
  install_function_builtins(engine)?;
  install_array_builtins(engine)?;
  install_error_builtins(engine)?;
  install_globals(engine)?;
  Ok(())
}

// Wiring helpers. These write the property tables directly: realm setup runs
// on fresh objects where descriptor validation cannot reject anything.

fn define_native(
  engine: &mut Engine,
  target: GcObject,
  name: &str,
  length: u32,
  f: crate::function::NativeFn,
) -> Result<GcObject, EngineError> {
  let function = crate::function::JsFunction::native(JsStr::from(name), length, f, false);
  let obj = engine.alloc_function(function)?;
  define_value(engine, target, name, Value::Object(obj))?;
  Ok(obj)
}

fn define_ctor(
  engine: &mut Engine,
  name: &str,
  length: u32,
  f: crate::function::NativeFn,
  prototype: GcObject,
) -> Result<GcObject, EngineError> {
  let function = crate::function::JsFunction::native(JsStr::from(name), length, f, true);
  let ctor = engine.alloc_function(function)?;
  engine.heap.get_mut(ctor)?.properties.set(
    PropertyKey::from_str("prototype"),
    Property::data(Value::Object(prototype), false, false, false),
  );
  engine.heap.get_mut(prototype)?.properties.set(
    PropertyKey::from_str("constructor"),
    Property::data(Value::Object(ctor), true, false, true),
  );
  let global = engine.global;
  define_value(engine, global, name, Value::Object(ctor))?;
  Ok(ctor)
}

fn define_value(
  engine: &mut Engine,
  target: GcObject,
  name: &str,
  value: Value,
) -> Result<(), EngineError> {
  engine.heap.get_mut(target)?.properties.set(
    PropertyKey::from_str(name),
    Property::data(value, true, false, true),
  );
  Ok(())
}

fn define_frozen(
  engine: &mut Engine,
  target: GcObject,
  name: &str,
  value: Value,
) -> Result<(), EngineError> {
  engine.heap.get_mut(target)?.properties.set(
    PropertyKey::from_str(name),
    Property::data(value, false, false, false),
  );
  Ok(())
}

fn this_object(engine: &mut Engine, this: &Value) -> Result<GcObject, EngineError> {
  match this.as_object() {
    Some(obj) => Ok(obj),
    None => Err(engine.throw_type_error("method receiver must be an object")),
  }
}

fn arg(args: &[Value], index: usize) -> Value {
  args.get(index).cloned().unwrap_or(Value::Undefined)
}

// Object.

fn install_object_builtins(engine: &mut Engine) -> Result<(), EngineError> {
  let proto = engine.intrinsics.object_prototype;
  define_native(engine, proto, "hasOwnProperty", 1, object_proto_has_own_property)?;
  define_native(engine, proto, "toString", 0, object_proto_to_string)?;
  define_native(engine, proto, "valueOf", 0, object_proto_value_of)?;
  define_native(engine, proto, "isPrototypeOf", 1, object_proto_is_prototype_of)?;
  define_native(
    engine,
    proto,
    "propertyIsEnumerable",
    1,
    object_proto_property_is_enumerable,
  )?;

  let ctor = define_ctor(engine, "Object", 1, object_constructor, proto)?;
  define_native(engine, ctor, "keys", 1, object_keys)?;
  define_native(engine, ctor, "getOwnPropertyNames", 1, object_get_own_property_names)?;
  define_native(
    engine,
    ctor,
    "getOwnPropertyDescriptor",
    2,
    object_get_own_property_descriptor,
  )?;
  define_native(engine, ctor, "defineProperty", 3, object_define_property)?;
  define_native(engine, ctor, "defineProperties", 2, object_define_properties)?;
  define_native(engine, ctor, "getPrototypeOf", 1, object_get_prototype_of)?;
  define_native(engine, ctor, "create", 2, object_create)?;
  define_native(engine, ctor, "freeze", 1, object_freeze)?;
  define_native(engine, ctor, "isFrozen", 1, object_is_frozen)?;
  define_native(engine, ctor, "seal", 1, object_seal)?;
  define_native(engine, ctor, "isSealed", 1, object_is_sealed)?;
  define_native(engine, ctor, "preventExtensions", 1, object_prevent_extensions)?;
  define_native(engine, ctor, "isExtensible", 1, object_is_extensible)?;
  Ok(())
}

fn object_constructor(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  // Without primitive wrapper objects, only an object argument passes
  // through; everything else yields a fresh plain object.
  match args.first() {
    Some(Value::Object(obj)) => Ok(Value::Object(*obj)),
    _ => Ok(Value::Object(engine.new_object())),
  }
}

fn object_proto_has_own_property(
  engine: &mut Engine,
  this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let key = engine.to_js_string(&arg(args, 0))?;
  let present = engine
    .get_own_property(obj, &PropertyKey::from_js_str(key))?
    .is_some();
  Ok(Value::Bool(present))
}

fn object_proto_to_string(engine: &mut Engine, this: Value, _args: &[Value]) -> Result<Value, EngineError> {
  let class = match &this {
    Value::Undefined => "Undefined",
    Value::Null => "Null",
    Value::Bool(_) => "Boolean",
    Value::Number(_) => "Number",
    Value::String(_) => "String",
    Value::Object(obj) => match &engine.heap.get(*obj)?.kind {
      ObjectKind::Ordinary | ObjectKind::Global => "Object",
      ObjectKind::Array(_) => "Array",
      ObjectKind::Function(_) => "Function",
      ObjectKind::Arguments(_) => "Arguments",
    },
  };
  Ok(Value::string(&format!("[object {class}]")))
}

fn object_proto_value_of(_engine: &mut Engine, this: Value, _args: &[Value]) -> Result<Value, EngineError> {
  Ok(this)
}

fn object_proto_is_prototype_of(
  engine: &mut Engine,
  this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let Some(target) = this.as_object() else {
    return Ok(Value::Bool(false));
  };
  let Some(mut current) = arg(args, 0).as_object() else {
    return Ok(Value::Bool(false));
  };
  loop {
    match engine.heap.get(current)?.prototype {
      Some(parent) if parent == target => return Ok(Value::Bool(true)),
      Some(parent) => current = parent,
      None => return Ok(Value::Bool(false)),
    }
  }
}

fn object_proto_property_is_enumerable(
  engine: &mut Engine,
  this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let key = engine.to_js_string(&arg(args, 0))?;
  let enumerable = engine
    .get_own_property(obj, &PropertyKey::from_js_str(key))?
    .is_some_and(|p| p.enumerable);
  Ok(Value::Bool(enumerable))
}

fn object_argument(engine: &mut Engine, args: &[Value]) -> Result<GcObject, EngineError> {
  match args.first().and_then(Value::as_object) {
    Some(obj) => Ok(obj),
    None => Err(engine.throw_type_error("argument must be an object")),
  }
}

fn object_keys(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  let keys: Vec<Value> = engine
    .own_enumerable_keys(obj)?
    .iter()
    .map(PropertyKey::to_value)
    .collect();
  Ok(Value::Object(engine.array_from_values(&keys)?))
}

fn object_get_own_property_names(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  let keys: Vec<Value> = engine.own_keys(obj)?.iter().map(PropertyKey::to_value).collect();
  Ok(Value::Object(engine.array_from_values(&keys)?))
}

fn object_get_own_property_descriptor(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  let key = engine.to_js_string(&arg(args, 1))?;
  let Some(prop) = engine.get_own_property(obj, &PropertyKey::from_js_str(key))? else {
    return Ok(Value::Undefined);
  };

  let out = engine.new_object();
  match &prop.kind {
    PropertyKind::Data { value, writable } => {
      engine.put_str(out, "value", value.clone(), false)?;
      engine.put_str(out, "writable", Value::Bool(*writable), false)?;
    }
    PropertyKind::Accessor { get, set } => {
      engine.put_str(out, "get", get.clone(), false)?;
      engine.put_str(out, "set", set.clone(), false)?;
    }
  }
  engine.put_str(out, "enumerable", Value::Bool(prop.enumerable), false)?;
  engine.put_str(out, "configurable", Value::Bool(prop.configurable), false)?;
  Ok(Value::Object(out))
}

/// Reads a descriptor object into a [`PropertyPatch`]; absent fields stay
/// unset (present-but-undefined counts as supplied).
fn to_property_patch(engine: &mut Engine, desc: &Value) -> Result<PropertyPatch, EngineError> {
  let Some(desc) = desc.as_object() else {
    return Err(engine.throw_type_error("property descriptor must be an object"));
  };
  let mut patch = PropertyPatch::default();

  let has = |engine: &mut Engine, name: &str| -> Result<bool, EngineError> {
    engine.has_property(desc, &PropertyKey::from_str(name))
  };

  if has(engine, "enumerable")? {
    let v = engine.get_str(desc, "enumerable")?;
    patch.enumerable = Some(to_boolean(&v));
  }
  if has(engine, "configurable")? {
    let v = engine.get_str(desc, "configurable")?;
    patch.configurable = Some(to_boolean(&v));
  }
  if has(engine, "value")? {
    patch.value = Some(engine.get_str(desc, "value")?);
  }
  if has(engine, "writable")? {
    let v = engine.get_str(desc, "writable")?;
    patch.writable = Some(to_boolean(&v));
  }
  if has(engine, "get")? {
    let v = engine.get_str(desc, "get")?;
    if !v.is_undefined() && !engine.is_callable(&v) {
      return Err(engine.throw_type_error("getter must be callable"));
    }
    patch.get = Some(v);
  }
  if has(engine, "set")? {
    let v = engine.get_str(desc, "set")?;
    if !v.is_undefined() && !engine.is_callable(&v) {
      return Err(engine.throw_type_error("setter must be callable"));
    }
    patch.set = Some(v);
  }
  Ok(patch)
}

fn object_define_property(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  let key = engine.to_js_string(&arg(args, 1))?;
  let patch = to_property_patch(engine, &arg(args, 2))?;
  engine.define_property(obj, &PropertyKey::from_js_str(key), patch)?;
  Ok(Value::Object(obj))
}

fn define_properties_from(
  engine: &mut Engine,
  obj: GcObject,
  props: &Value,
) -> Result<(), EngineError> {
  let Some(props) = props.as_object() else {
    return Err(engine.throw_type_error("property map must be an object"));
  };
  for key in engine.own_enumerable_keys(props)? {
    let desc = engine.get(props, &key)?;
    let patch = to_property_patch(engine, &desc)?;
    engine.define_property(obj, &key, patch)?;
  }
  Ok(())
}

fn object_define_properties(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  define_properties_from(engine, obj, &arg(args, 1))?;
  Ok(Value::Object(obj))
}

fn object_get_prototype_of(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  Ok(match engine.prototype_of(obj)? {
    Some(proto) => Value::Object(proto),
    None => Value::Null,
  })
}

fn object_create(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let prototype = match arg(args, 0) {
    Value::Null => None,
    Value::Object(obj) => Some(obj),
    _ => return Err(engine.throw_type_error("prototype must be an object or null")),
  };
  let obj = engine.new_object_with_prototype(prototype);
  if args.len() > 1 && !args[1].is_undefined() {
    define_properties_from(engine, obj, &args[1])?;
  }
  Ok(Value::Object(obj))
}

fn object_freeze(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  engine.freeze(obj)?;
  Ok(Value::Object(obj))
}

fn object_is_frozen(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  Ok(Value::Bool(engine.is_frozen(obj)?))
}

fn object_seal(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  engine.seal(obj)?;
  Ok(Value::Object(obj))
}

fn object_is_sealed(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  Ok(Value::Bool(engine.is_sealed(obj)?))
}

fn object_prevent_extensions(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  engine.prevent_extensions(obj)?;
  Ok(Value::Object(obj))
}

fn object_is_extensible(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = object_argument(engine, args)?;
  Ok(Value::Bool(engine.is_extensible(obj)?))
}

// Function.

fn install_function_builtins(engine: &mut Engine) -> Result<(), EngineError> {
  let proto = engine.intrinsics.function_prototype;
  define_native(engine, proto, "call", 1, function_proto_call)?;
  define_native(engine, proto, "apply", 2, function_proto_apply)?;
  Ok(())
}

/// `Function.prototype` is itself callable and returns Undefined.
pub(crate) fn function_prototype_call_self(
  _engine: &mut Engine,
  _this: Value,
  _args: &[Value],
) -> Result<Value, EngineError> {
  Ok(Value::Undefined)
}

/// The accessor installed on restricted properties (strict-mode
/// `arguments.callee`).
pub(crate) fn restricted_property_thrower(
  engine: &mut Engine,
  _this: Value,
  _args: &[Value],
) -> Result<Value, EngineError> {
  Err(engine.throw_type_error("access to a restricted property"))
}

fn function_proto_call(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let this_arg = arg(args, 0);
  let rest = args.get(1..).unwrap_or(&[]);
  engine.call_value(&this, this_arg, rest)
}

fn function_proto_apply(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let this_arg = arg(args, 0);
  let call_args = match arg(args, 1) {
    Value::Undefined | Value::Null => Vec::new(),
    Value::Object(list) => {
      let raw = engine.get_str(list, "length")?;
      let len = engine.to_uint32_value(&raw)?;
      let mut out = Vec::with_capacity(len as usize);
      for i in 0..len {
        out.push(engine.get(list, &PropertyKey::Index(i))?);
      }
      out
    }
    _ => return Err(engine.throw_type_error("argument list must be an object")),
  };
  engine.call_value(&this, this_arg, &call_args)
}

// Array.

fn install_array_builtins(engine: &mut Engine) -> Result<(), EngineError> {
  let proto = engine.intrinsics.array_prototype;
  define_native(engine, proto, "push", 1, array_proto_push)?;
  define_native(engine, proto, "pop", 0, array_proto_pop)?;
  define_native(engine, proto, "shift", 0, array_proto_shift)?;
  define_native(engine, proto, "unshift", 1, array_proto_unshift)?;
  define_native(engine, proto, "splice", 2, array_proto_splice)?;
  define_native(engine, proto, "reverse", 0, array_proto_reverse)?;
  define_native(engine, proto, "sort", 1, array_proto_sort)?;
  define_native(engine, proto, "indexOf", 1, array_proto_index_of)?;
  define_native(engine, proto, "lastIndexOf", 1, array_proto_last_index_of)?;
  define_native(engine, proto, "forEach", 1, array_proto_for_each)?;
  define_native(engine, proto, "map", 1, array_proto_map)?;
  define_native(engine, proto, "filter", 1, array_proto_filter)?;
  define_native(engine, proto, "every", 1, array_proto_every)?;
  define_native(engine, proto, "some", 1, array_proto_some)?;
  define_native(engine, proto, "reduce", 1, array_proto_reduce)?;
  define_native(engine, proto, "reduceRight", 1, array_proto_reduce_right)?;
  define_native(engine, proto, "join", 1, array_proto_join)?;
  define_native(engine, proto, "concat", 1, array_proto_concat)?;
  define_native(engine, proto, "slice", 2, array_proto_slice)?;
  define_native(engine, proto, "toString", 0, array_proto_to_string)?;

  let ctor = define_ctor(engine, "Array", 1, array_constructor, proto)?;
  define_native(engine, ctor, "isArray", 1, array_is_array)?;
  Ok(())
}

fn array_constructor(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  // One numeric argument sets the length, not the content.
  if args.len() == 1 {
    if let Value::Number(n) = &args[0] {
      let len = to_uint32(*n);
      if len as f64 != *n {
        return Err(engine.throw_range_error("invalid array length"));
      }
      return Ok(Value::Object(engine.new_array(len)));
    }
  }
  Ok(Value::Object(engine.array_from_values(args)?))
}

fn array_is_array(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let is_array = match arg(args, 0).as_object() {
    Some(obj) => engine.heap.get(obj)?.is_array(),
    None => false,
  };
  Ok(Value::Bool(is_array))
}

fn array_proto_push(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  engine.array_push(obj, args)
}

fn array_proto_pop(engine: &mut Engine, this: Value, _args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  engine.array_pop(obj)
}

fn array_proto_shift(engine: &mut Engine, this: Value, _args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  engine.array_shift(obj)
}

fn array_proto_unshift(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  engine.array_unshift(obj, args)
}

fn array_proto_splice(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let start = engine.to_number(&arg(args, 0))?;
  // With no explicit count, everything from `start` on is removed.
  let delete_count = if args.len() >= 2 {
    engine.to_number(&args[1])?
  } else {
    f64::INFINITY
  };
  let items = args.get(2..).unwrap_or(&[]);
  let removed = engine.array_splice(obj, start, delete_count, items)?;
  Ok(Value::Object(removed))
}

fn array_proto_reverse(engine: &mut Engine, this: Value, _args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  engine.array_reverse(obj)?;
  Ok(this)
}

fn array_proto_sort(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let comparator = match args.first() {
    None | Some(Value::Undefined) => None,
    Some(v) if engine.is_callable(v) => Some(v),
    Some(_) => return Err(engine.throw_type_error("comparator must be callable")),
  };
  engine.array_sort(obj, comparator)?;
  Ok(this)
}

fn array_proto_index_of(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let from = match args.get(1) {
    Some(v) => engine.to_number(v)?,
    None => 0.0,
  };
  let index = engine.array_index_of(obj, &arg(args, 0), from)?;
  Ok(Value::Number(index))
}

fn array_proto_last_index_of(
  engine: &mut Engine,
  this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let from = match args.get(1) {
    Some(v) => engine.to_number(v)?,
    None => f64::INFINITY,
  };
  let index = engine.array_last_index_of(obj, &arg(args, 0), from)?;
  Ok(Value::Number(index))
}

fn array_proto_for_each(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  engine.array_for_each(obj, &arg(args, 0), arg(args, 1))?;
  Ok(Value::Undefined)
}

fn array_proto_map(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let out = engine.array_map(obj, &arg(args, 0), arg(args, 1))?;
  Ok(Value::Object(out))
}

fn array_proto_filter(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let out = engine.array_filter(obj, &arg(args, 0), arg(args, 1))?;
  Ok(Value::Object(out))
}

fn array_proto_every(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let result = engine.array_every(obj, &arg(args, 0), arg(args, 1))?;
  Ok(Value::Bool(result))
}

fn array_proto_some(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let result = engine.array_some(obj, &arg(args, 0), arg(args, 1))?;
  Ok(Value::Bool(result))
}

fn array_proto_reduce(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let initial = if args.len() >= 2 { Some(args[1].clone()) } else { None };
  engine.array_reduce(obj, &arg(args, 0), initial)
}

fn array_proto_reduce_right(
  engine: &mut Engine,
  this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let initial = if args.len() >= 2 { Some(args[1].clone()) } else { None };
  engine.array_reduce_right(obj, &arg(args, 0), initial)
}

fn array_proto_join(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let joined = engine.array_join(obj, &arg(args, 0))?;
  Ok(Value::String(joined))
}

fn array_proto_concat(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let out = engine.array_concat(this, args)?;
  Ok(Value::Object(out))
}

fn array_proto_slice(engine: &mut Engine, this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let start = engine.to_number(&arg(args, 0))?;
  let end = match args.get(1) {
    None | Some(Value::Undefined) => None,
    Some(v) => Some(engine.to_number(v)?),
  };
  let out = engine.array_slice(obj, start, end)?;
  Ok(Value::Object(out))
}

fn array_proto_to_string(engine: &mut Engine, this: Value, _args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let joined = engine.array_join(obj, &Value::Undefined)?;
  Ok(Value::String(joined))
}

// Errors.

fn install_error_builtins(engine: &mut Engine) -> Result<(), EngineError> {
  for kind in ErrorKind::ALL {
    let proto = engine.intrinsics.error_prototype_for(kind);
    define_value(engine, proto, "name", Value::string(kind.name()))?;
    define_value(engine, proto, "message", Value::string(""))?;
    let ctor_fn = match kind {
      ErrorKind::Error => error_constructor,
      ErrorKind::Type => type_error_constructor,
      ErrorKind::Range => range_error_constructor,
      ErrorKind::Reference => reference_error_constructor,
      ErrorKind::Syntax => syntax_error_constructor,
    };
    define_ctor(engine, kind.name(), 1, ctor_fn, proto)?;
  }
  let base = engine.intrinsics.error_prototype;
  define_native(engine, base, "toString", 0, error_proto_to_string)?;
  Ok(())
}

fn error_ctor_impl(engine: &mut Engine, kind: ErrorKind, args: &[Value]) -> Result<Value, EngineError> {
  let message = match args.first() {
    None | Some(Value::Undefined) => None,
    Some(v) => Some(engine.to_js_string(v)?),
  };
  let error = engine.make_error(kind, message.as_deref().unwrap_or(""));
  if message.is_none() {
    // No argument: the prototype's empty `message` is inherited instead.
    if let Some(obj) = error.as_object() {
      engine
        .heap
        .get_mut(obj)?
        .properties
        .remove(&PropertyKey::from_str("message"));
    }
  }
  Ok(error)
}

fn error_constructor(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  error_ctor_impl(engine, ErrorKind::Error, args)
}

fn type_error_constructor(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  error_ctor_impl(engine, ErrorKind::Type, args)
}

fn range_error_constructor(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  error_ctor_impl(engine, ErrorKind::Range, args)
}

fn reference_error_constructor(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  error_ctor_impl(engine, ErrorKind::Reference, args)
}

fn syntax_error_constructor(
  engine: &mut Engine,
  _this: Value,
  args: &[Value],
) -> Result<Value, EngineError> {
  error_ctor_impl(engine, ErrorKind::Syntax, args)
}

fn error_proto_to_string(engine: &mut Engine, this: Value, _args: &[Value]) -> Result<Value, EngineError> {
  let obj = this_object(engine, &this)?;
  let name = engine.get_str(obj, "name")?;
  let name = if name.is_undefined() {
    JsStr::from("Error")
  } else {
    engine.to_js_string(&name)?
  };
  let message = engine.get_str(obj, "message")?;
  let message = if message.is_undefined() {
    JsStr::from("")
  } else {
    engine.to_js_string(&message)?
  };
  if message.is_empty() {
    Ok(Value::String(name))
  } else {
    Ok(Value::string(&format!("{name}: {message}")))
  }
}

// Global functions and value bindings.

fn install_globals(engine: &mut Engine) -> Result<(), EngineError> {
  let global = engine.global;
  define_frozen(engine, global, "undefined", Value::Undefined)?;
  define_frozen(engine, global, "NaN", Value::Number(f64::NAN))?;
  define_frozen(engine, global, "Infinity", Value::Number(f64::INFINITY))?;
  define_value(engine, global, "globalThis", Value::Object(global))?;
  define_native(engine, global, "isNaN", 1, global_is_nan)?;
  define_native(engine, global, "isFinite", 1, global_is_finite)?;
  Ok(())
}

fn global_is_nan(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let n = engine.to_number(&arg(args, 0))?;
  Ok(Value::Bool(n.is_nan()))
}

fn global_is_finite(engine: &mut Engine, _this: Value, args: &[Value]) -> Result<Value, EngineError> {
  let n = engine.to_number(&arg(args, 0))?;
  Ok(Value::Bool(n.is_finite()))
}
