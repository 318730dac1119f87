//! Object internal methods: `[[Get]]`, `[[Set]]`, `[[DefineOwnProperty]]`,
//! `[[Delete]]`, `[[HasProperty]]`, `[[OwnPropertyKeys]]` and the derived
//! integrity levels (preventExtensions / seal / freeze).

use crate::engine::Engine;
use crate::object::ObjectKind;
use crate::property::{Property, PropertyKey, PropertyKind, PropertyPatch};
use crate::value::Value;
use crate::{EngineError, GcObject};

/// Hard upper bound for prototype chain traversals.
///
/// `set_prototype` prevents cycles, but host embeddings can still build
/// pathological chains one link at a time.
pub const MAX_PROTOTYPE_CHAIN: usize = 10_000;

impl Engine {
  pub fn prototype_of(&self, obj: GcObject) -> Result<Option<GcObject>, EngineError> {
    Ok(self.heap.get(obj)?.prototype)
  }

  /// Sets the prototype link, rejecting cycles.
  pub fn set_prototype(
    &mut self,
    obj: GcObject,
    prototype: Option<GcObject>,
  ) -> Result<(), EngineError> {
    let mut walk = prototype;
    let mut steps = 0usize;
    while let Some(current) = walk {
      if current == obj {
        return Err(EngineError::PrototypeCycle);
      }
      steps += 1;
      if steps > MAX_PROTOTYPE_CHAIN {
        return Err(EngineError::PrototypeCycle);
      }
      walk = self.heap.get(current)?.prototype;
    }
    self.heap.get_mut(obj)?.prototype = prototype;
    Ok(())
  }

  pub fn is_extensible(&self, obj: GcObject) -> Result<bool, EngineError> {
    Ok(self.heap.get(obj)?.extensible)
  }

  pub fn prevent_extensions(&mut self, obj: GcObject) -> Result<(), EngineError> {
    self.heap.get_mut(obj)?.extensible = false;
    Ok(())
  }

  /// `[[GetOwnProperty]]`.
  ///
  /// Array `length` and mapped arguments entries are synthesized so callers
  /// observe one uniform descriptor model.
  pub fn get_own_property(
    &self,
    obj: GcObject,
    key: &PropertyKey,
  ) -> Result<Option<Property>, EngineError> {
    let record = self.heap.get(obj)?;

    if let ObjectKind::Array(data) = &record.kind {
      if matches!(key, PropertyKey::Str(s) if &**s == "length") {
        return Ok(Some(Property::data(
          Value::Number(data.length as f64),
          data.length_writable,
          false,
          false,
        )));
      }
      // Known holes skip the table lookup.
      if let PropertyKey::Index(idx) = key {
        if *idx < data.length && data.is_known_hole(*idx) {
          return Ok(None);
        }
      }
    }

    let Some(prop) = record.properties.get(key) else {
      return Ok(None);
    };
    let mut prop = prop.clone();

    // A mapped arguments entry reflects the parameter binding's current value.
    if let ObjectKind::Arguments(args) = &record.kind {
      if let (PropertyKey::Index(idx), PropertyKind::Data { value, .. }) =
        (key, &mut prop.kind)
      {
        if let Some(name) = args.mapped_name(*idx) {
          let env = self.heap.get_env(args.env)?;
          if let Some(pos) = env.binding_index(name) {
            if let crate::env::EnvKind::Declarative { bindings } = &env.kind {
              *value = bindings[pos].value.clone();
            }
          }
        }
      }
    }

    Ok(Some(prop))
  }

  /// `[[HasProperty]]`: own property or anywhere on the prototype chain.
  pub fn has_property(&self, obj: GcObject, key: &PropertyKey) -> Result<bool, EngineError> {
    let mut current = Some(obj);
    let mut steps = 0usize;
    while let Some(o) = current {
      if self.get_own_property(o, key)?.is_some() {
        return Ok(true);
      }
      steps += 1;
      if steps > MAX_PROTOTYPE_CHAIN {
        return Err(EngineError::PrototypeCycle);
      }
      current = self.heap.get(o)?.prototype;
    }
    Ok(false)
  }

  /// `[[Get]]`: walks the prototype chain; the first own data value wins, the
  /// first own getter is invoked with the original receiver as `this`.
  pub fn get(&mut self, obj: GcObject, key: &PropertyKey) -> Result<Value, EngineError> {
    self.get_with_receiver(obj, key, &Value::Object(obj))
  }

  pub fn get_str(&mut self, obj: GcObject, key: &str) -> Result<Value, EngineError> {
    self.get(obj, &PropertyKey::from_str(key))
  }

  pub(crate) fn get_with_receiver(
    &mut self,
    obj: GcObject,
    key: &PropertyKey,
    receiver: &Value,
  ) -> Result<Value, EngineError> {
    let mut current = obj;
    let mut steps = 0usize;
    loop {
      if let Some(prop) = self.get_own_property(current, key)? {
        return match prop.kind {
          PropertyKind::Data { value, .. } => Ok(value),
          PropertyKind::Accessor { get, .. } => {
            if get.is_undefined() {
              Ok(Value::Undefined)
            } else {
              self.call_value(&get, receiver.clone(), &[])
            }
          }
        };
      }
      steps += 1;
      if steps > MAX_PROTOTYPE_CHAIN {
        return Err(EngineError::PrototypeCycle);
      }
      match self.heap.get(current)?.prototype {
        Some(parent) => current = parent,
        None => return Ok(Value::Undefined),
      }
    }
  }

  /// `[[Set]]` / plain `put`.
  ///
  /// Setter (own or inherited) wins; a non-writable data property fails
  /// silently in sloppy contexts and throws a TypeError in strict ones;
  /// otherwise an own writable/enumerable/configurable data property is
  /// created or overwritten.
  pub fn put(
    &mut self,
    obj: GcObject,
    key: &PropertyKey,
    value: Value,
    strict: bool,
  ) -> Result<(), EngineError> {
    // Array `length` has its own assignment protocol.
    if self.heap.get(obj)?.is_array() {
      if matches!(key, PropertyKey::Str(s) if &**s == "length") {
        return self.array_put_length(obj, &value, strict);
      }
    }

    // Find the nearest own-or-inherited property controlling this key.
    let mut holder = obj;
    let found = loop {
      if let Some(prop) = self.get_own_property(holder, key)? {
        break Some((holder, prop));
      }
      match self.heap.get(holder)?.prototype {
        Some(parent) => holder = parent,
        None => break None,
      }
    };

    match found {
      Some((_, prop)) if prop.is_accessor() => {
        let PropertyKind::Accessor { set, .. } = prop.kind else {
          unreachable!("checked accessor above");
        };
        if set.is_undefined() {
          if strict {
            return Err(self.throw_type_error(&format!(
              "cannot set property `{key}` which has only a getter"
            )));
          }
          return Ok(());
        }
        self.call_value(&set, Value::Object(obj), &[value])?;
        Ok(())
      }
      Some((holder, prop)) => {
        let PropertyKind::Data { writable, .. } = prop.kind else {
          unreachable!("accessor handled above");
        };
        if !writable {
          if strict {
            return Err(self.throw_type_error(&format!(
              "cannot assign to read-only property `{key}`"
            )));
          }
          return Ok(());
        }
        if holder == obj {
          // Overwrite in place, preserving existing attributes.
          self.store_own_data_value(obj, key, value, strict)
        } else {
          self.create_own_plain(obj, key, value, strict)
        }
      }
      None => self.create_own_plain(obj, key, value, strict),
    }
  }

  pub fn put_str(
    &mut self,
    obj: GcObject,
    key: &str,
    value: Value,
    strict: bool,
  ) -> Result<(), EngineError> {
    self.put(obj, &PropertyKey::from_str(key), value, strict)
  }

  /// Updates the value of an existing own writable data property, preserving
  /// its attributes and maintaining arguments aliasing.
  fn store_own_data_value(
    &mut self,
    obj: GcObject,
    key: &PropertyKey,
    value: Value,
    strict: bool,
  ) -> Result<(), EngineError> {
    // Write through the parameter alias first, if any.
    self.arguments_write_through(obj, key, &value)?;

    let record = self.heap.get_mut(obj)?;
    if let Some(prop) = record.properties.get_mut(key) {
      if let PropertyKind::Data {
        value: stored, ..
      } = &mut prop.kind
      {
        *stored = value;
        return Ok(());
      }
    }
    // The property vanished between lookup and store (possible only through a
    // reentrant getter); fall back to a fresh plain property.
    self.create_own_plain(obj, key, value, strict)
  }

  /// Creates an own writable/enumerable/configurable data property (the plain
  /// `put` default, unlike `define_property`'s all-false defaults).
  fn create_own_plain(
    &mut self,
    obj: GcObject,
    key: &PropertyKey,
    value: Value,
    strict: bool,
  ) -> Result<(), EngineError> {
    if !self.heap.get(obj)?.extensible {
      if strict {
        return Err(self.throw_type_error(&format!(
          "cannot add property `{key}` to a non-extensible object"
        )));
      }
      return Ok(());
    }

    // Array index bookkeeping: length growth and hole tracking.
    if let PropertyKey::Index(idx) = key {
      let record = self.heap.get_mut(obj)?;
      if let ObjectKind::Array(data) = &mut record.kind {
        if *idx >= data.length {
          if !data.length_writable {
            drop(record);
            if strict {
              return Err(
                self.throw_type_error("cannot add an element beyond a read-only length"),
              );
            }
            return Ok(());
          }
          data.length = *idx + 1;
        } else {
          data.clear_hole(*idx);
        }
      }
    }

    self
      .heap
      .get_mut(obj)?
      .properties
      .set(key.clone(), Property::plain(value));
    Ok(())
  }

  /// `[[DefineOwnProperty]]` with `Object.defineProperty` semantics: merges
  /// the supplied attribute fragment over the existing descriptor (missing
  /// attributes default to `false` for new keys) and signals a TypeError for
  /// any incompatible transition, leaving the property unchanged.
  pub fn define_property(
    &mut self,
    obj: GcObject,
    key: &PropertyKey,
    patch: PropertyPatch,
  ) -> Result<(), EngineError> {
    if !patch.is_valid() {
      return Err(self.throw_type_error(
        "property descriptor cannot mix value/writable with get/set",
      ));
    }

    if self.heap.get(obj)?.is_array() {
      if matches!(key, PropertyKey::Str(s) if &**s == "length") {
        return self.array_define_length(obj, patch);
      }
      if let PropertyKey::Index(idx) = key {
        return self.array_define_index(obj, *idx, patch);
      }
    }

    self.define_property_ordinary(obj, key, patch)
  }

  pub(crate) fn define_property_ordinary(
    &mut self,
    obj: GcObject,
    key: &PropertyKey,
    patch: PropertyPatch,
  ) -> Result<(), EngineError> {
    let current = self.get_own_property(obj, key)?;
    let extensible = self.heap.get(obj)?.extensible;

    // Arguments aliasing: a value write keeps the mapping live; converting to
    // an accessor or freezing writability severs it.
    if current.is_some() {
      if let Some(value) = &patch.value {
        self.arguments_write_through(obj, key, value)?;
      }
      if patch.is_accessor_descriptor() || patch.writable == Some(false) {
        self.arguments_sever(obj, key)?;
      }
    }

    let next = match validate_and_merge(current, extensible, &patch) {
      Ok(next) => next,
      Err(reason) => {
        return Err(self.throw_type_error(&format!(
          "cannot redefine property `{key}`: {reason}"
        )))
      }
    };

    self.heap.get_mut(obj)?.properties.set(key.clone(), next);
    Ok(())
  }

  /// `[[Delete]]`: removes a configurable own property; fails silently (or
  /// throws, in strict contexts) otherwise. Array holes propagate into the
  /// sparse set; arguments mappings are severed.
  pub fn delete(
    &mut self,
    obj: GcObject,
    key: &PropertyKey,
    strict: bool,
  ) -> Result<bool, EngineError> {
    // Synthesized array `length` is never configurable.
    if self.heap.get(obj)?.is_array() {
      if matches!(key, PropertyKey::Str(s) if &**s == "length") {
        if strict {
          return Err(self.throw_type_error("cannot delete array `length`"));
        }
        return Ok(false);
      }
    }

    let Some(current) = self.get_own_property(obj, key)? else {
      return Ok(true);
    };
    if !current.configurable {
      if strict {
        return Err(self.throw_type_error(&format!(
          "cannot delete non-configurable property `{key}`"
        )));
      }
      return Ok(false);
    }

    self.arguments_sever(obj, key)?;

    let record = self.heap.get_mut(obj)?;
    record.properties.remove(key);
    if let (PropertyKey::Index(idx), ObjectKind::Array(data)) = (key, &mut record.kind) {
      if *idx < data.length {
        data.mark_hole(*idx);
      }
    }
    Ok(true)
  }

  /// `[[OwnPropertyKeys]]`: integer keys in ascending numeric order first,
  /// then string keys in insertion order (array `length` leads the strings).
  pub fn own_keys(&self, obj: GcObject) -> Result<Vec<PropertyKey>, EngineError> {
    let record = self.heap.get(obj)?;

    let mut index_keys: Vec<u32> = Vec::new();
    let mut string_keys: Vec<PropertyKey> = Vec::new();
    for key in record.properties.keys() {
      match key {
        PropertyKey::Index(idx) => index_keys.push(*idx),
        PropertyKey::Str(_) => string_keys.push(key.clone()),
      }
    }
    index_keys.sort_unstable();

    let mut out = Vec::with_capacity(index_keys.len() + string_keys.len() + 1);
    out.extend(index_keys.into_iter().map(PropertyKey::Index));
    if record.is_array() {
      out.push(PropertyKey::from_str("length"));
    }
    out.extend(string_keys);
    Ok(out)
  }

  /// Own enumerable keys, for `for (k in o)` and `Object.keys`.
  pub fn own_enumerable_keys(&self, obj: GcObject) -> Result<Vec<PropertyKey>, EngineError> {
    let keys = self.own_keys(obj)?;
    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
      if let Some(prop) = self.get_own_property(obj, &key)? {
        if prop.enumerable {
          out.push(key);
        }
      }
    }
    Ok(out)
  }

  /// `Object.seal`: prevent extensions and make every own property
  /// non-configurable.
  pub fn seal(&mut self, obj: GcObject) -> Result<(), EngineError> {
    self.prevent_extensions(obj)?;
    let record = self.heap.get_mut(obj)?;
    let keys: Vec<PropertyKey> = record.properties.keys().cloned().collect();
    for key in keys {
      if let Some(prop) = record.properties.get_mut(&key) {
        prop.configurable = false;
      }
    }
    Ok(())
  }

  /// `Object.freeze`: seal, and additionally make every own data property
  /// non-writable (array `length` included).
  pub fn freeze(&mut self, obj: GcObject) -> Result<(), EngineError> {
    self.seal(obj)?;
    let record = self.heap.get_mut(obj)?;
    let keys: Vec<PropertyKey> = record.properties.keys().cloned().collect();
    for key in &keys {
      if let Some(prop) = record.properties.get_mut(key) {
        if let PropertyKind::Data { writable, .. } = &mut prop.kind {
          *writable = false;
        }
      }
    }
    if let ObjectKind::Array(data) = &mut record.kind {
      data.length_writable = false;
    }
    // Freezing severs every remaining arguments mapping.
    if let ObjectKind::Arguments(args) = &mut record.kind {
      for slot in &mut args.mapped {
        *slot = None;
      }
    }
    Ok(())
  }

  pub fn is_sealed(&self, obj: GcObject) -> Result<bool, EngineError> {
    let record = self.heap.get(obj)?;
    if record.extensible {
      return Ok(false);
    }
    Ok(record.properties.iter().all(|(_, prop)| !prop.configurable))
  }

  pub fn is_frozen(&self, obj: GcObject) -> Result<bool, EngineError> {
    let record = self.heap.get(obj)?;
    if record.extensible {
      return Ok(false);
    }
    if let ObjectKind::Array(data) = &record.kind {
      if data.length_writable {
        return Ok(false);
      }
    }
    Ok(record.properties.iter().all(|(_, prop)| {
      !prop.configurable
        && match &prop.kind {
          PropertyKind::Data { writable, .. } => !writable,
          PropertyKind::Accessor { .. } => true,
        }
    }))
  }

  /// Writes `value` through a live arguments mapping for `key`, if present.
  fn arguments_write_through(
    &mut self,
    obj: GcObject,
    key: &PropertyKey,
    value: &Value,
  ) -> Result<(), EngineError> {
    let PropertyKey::Index(idx) = key else {
      return Ok(());
    };
    let record = self.heap.get(obj)?;
    let ObjectKind::Arguments(args) = &record.kind else {
      return Ok(());
    };
    let Some(name) = args.mapped_name(*idx).cloned() else {
      return Ok(());
    };
    let env = args.env;
    let env_record = self.heap.get_env_mut(env)?;
    if let crate::env::EnvKind::Declarative { bindings } = &mut env_record.kind {
      if let Some(binding) = bindings.iter_mut().find(|b| b.name == name) {
        binding.value = value.clone();
      }
    }
    Ok(())
  }

  fn arguments_sever(&mut self, obj: GcObject, key: &PropertyKey) -> Result<(), EngineError> {
    let PropertyKey::Index(idx) = key else {
      return Ok(());
    };
    let record = self.heap.get_mut(obj)?;
    if let ObjectKind::Arguments(args) = &mut record.kind {
      args.unmap(*idx);
    }
    Ok(())
  }
}

/// `ValidateAndApplyPropertyDescriptor`: merges `patch` over `current` or
/// explains why the transition is illegal.
fn validate_and_merge(
  current: Option<Property>,
  extensible: bool,
  patch: &PropertyPatch,
) -> Result<Property, &'static str> {
  let Some(current) = current else {
    if !extensible {
      return Err("object is not extensible");
    }
    // New property: missing attributes default to false/Undefined.
    let enumerable = patch.enumerable.unwrap_or(false);
    let configurable = patch.configurable.unwrap_or(false);
    let kind = if patch.is_accessor_descriptor() {
      PropertyKind::Accessor {
        get: patch.get.clone().unwrap_or(Value::Undefined),
        set: patch.set.clone().unwrap_or(Value::Undefined),
      }
    } else {
      // Generic fragments create data properties.
      PropertyKind::Data {
        value: patch.value.clone().unwrap_or(Value::Undefined),
        writable: patch.writable.unwrap_or(false),
      }
    };
    return Ok(Property {
      enumerable,
      configurable,
      kind,
    });
  };

  if patch.is_empty() {
    return Ok(current);
  }

  if !current.configurable {
    if patch.configurable == Some(true) {
      return Err("property is not configurable");
    }
    if let Some(enumerable) = patch.enumerable {
      if enumerable != current.enumerable {
        return Err("property is not configurable");
      }
    }
    if !patch.is_generic_descriptor() {
      let switching_kind = (current.is_data() && patch.is_accessor_descriptor())
        || (current.is_accessor() && patch.is_data_descriptor());
      if switching_kind {
        return Err("cannot change a non-configurable property between data and accessor");
      }
      match &current.kind {
        PropertyKind::Data { value, writable } => {
          if !writable {
            if patch.writable == Some(true) {
              return Err("property is not writable");
            }
            if let Some(new_value) = &patch.value {
              if !new_value.same_value(value) {
                return Err("property is not writable");
              }
            }
          }
        }
        PropertyKind::Accessor { get, set } => {
          if let Some(new_get) = &patch.get {
            if !new_get.same_value(get) {
              return Err("property is not configurable");
            }
          }
          if let Some(new_set) = &patch.set {
            if !new_set.same_value(set) {
              return Err("property is not configurable");
            }
          }
        }
      }
    }
  }

  Ok(merge_patch(current, patch))
}

fn merge_patch(current: Property, patch: &PropertyPatch) -> Property {
  let enumerable = patch.enumerable.unwrap_or(current.enumerable);
  let configurable = patch.configurable.unwrap_or(current.configurable);

  if patch.is_generic_descriptor() {
    return Property {
      enumerable,
      configurable,
      kind: current.kind,
    };
  }

  let kind = match (current.kind, patch.is_accessor_descriptor()) {
    (PropertyKind::Data { value, writable }, false) => PropertyKind::Data {
      value: patch.value.clone().unwrap_or(value),
      writable: patch.writable.unwrap_or(writable),
    },
    (PropertyKind::Accessor { get, set }, true) => PropertyKind::Accessor {
      get: patch.get.clone().unwrap_or(get),
      set: patch.set.clone().unwrap_or(set),
    },
    // Kind conversions restart from the new kind's defaults.
    (PropertyKind::Data { .. }, true) => PropertyKind::Accessor {
      get: patch.get.clone().unwrap_or(Value::Undefined),
      set: patch.set.clone().unwrap_or(Value::Undefined),
    },
    (PropertyKind::Accessor { .. }, false) => PropertyKind::Data {
      value: patch.value.clone().unwrap_or(Value::Undefined),
      writable: patch.writable.unwrap_or(false),
    },
  };

  Property {
    enumerable,
    configurable,
    kind,
  }
}
