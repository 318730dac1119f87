//! The array/sparse layer: `length` invariant enforcement and the generic
//! algorithm suite.
//!
//! The algorithms operate over any object exposing a `length` and indexed
//! properties, not only objects tagged as arrays. Holes (indices with no own
//! property) are skipped without invoking callbacks, but still advance the
//! index. The iteration bound is captured once, up front, via `ToUint32`.

use crate::convert::to_integer;
use crate::engine::Engine;
use crate::object::ObjectKind;
use crate::property::{PropertyKey, PropertyPatch};
use crate::value::{JsStr, Value};
use crate::{EngineError, GcObject};
use std::cmp::Ordering;

/// Key for a logical index that may exceed the canonical index range (array
/// generics can push an object's `length` past `2^32 - 2`).
fn idx_key(i: u64) -> PropertyKey {
  if i < u32::MAX as u64 {
    PropertyKey::Index(i as u32)
  } else {
    PropertyKey::Str(JsStr::from(i.to_string()))
  }
}

/// Clamps a possibly negative relative offset against `len`.
fn relative_index(rel: f64, len: u64) -> u64 {
  if rel < 0.0 {
    let back = -rel;
    if back >= len as f64 {
      0
    } else {
      len - back as u64
    }
  } else if rel >= len as f64 {
    len
  } else {
    rel as u64
  }
}

impl Engine {
  /// Allocates an array object of the given length with no own elements
  /// (every index below `length` is a hole). O(1) regardless of `length`:
  /// holes are the absence of index properties, not stored state.
  pub fn new_array(&mut self, length: u32) -> GcObject {
    let prototype = self.intrinsics.array_prototype;
    let data = crate::object::ArrayData::new(length);
    self.heap.alloc_object(crate::object::ObjectRecord::new(
      ObjectKind::Array(data),
      Some(prototype),
    ))
  }

  /// Allocates an array holding `values` at indices `0..values.len()`.
  pub fn array_from_values(&mut self, values: &[Value]) -> Result<GcObject, EngineError> {
    let arr = self.new_array(0);
    for (i, value) in values.iter().enumerate() {
      self.put(arr, &idx_key(i as u64), value.clone(), false)?;
    }
    Ok(arr)
  }

  /// The `length` captured for one algorithm run.
  fn length_of(&mut self, obj: GcObject) -> Result<u64, EngineError> {
    let raw = self.get_str(obj, "length")?;
    Ok(self.to_uint32_value(&raw)? as u64)
  }

  fn has_own(&self, obj: GcObject, key: &PropertyKey) -> Result<bool, EngineError> {
    Ok(self.get_own_property(obj, key)?.is_some())
  }

  /// Assignment to an array's `length` (`arr.length = v`).
  ///
  /// `ToNumber(v)` must round-trip through `ToUint32` exactly or the length is
  /// out of range. Shrinking deletes from the top down and stops at the first
  /// non-configurable element; the effective length is then that index + 1.
  pub(crate) fn array_put_length(
    &mut self,
    obj: GcObject,
    value: &Value,
    strict: bool,
  ) -> Result<(), EngineError> {
    let new_len = self.array_length_value(value)?;
    let writable = match &self.heap.get(obj)?.kind {
      ObjectKind::Array(data) => data.length_writable,
      _ => return Ok(()),
    };
    if !writable {
      if strict {
        return Err(self.throw_type_error("cannot assign to read-only `length`"));
      }
      return Ok(());
    }
    let fully = self.array_set_length(obj, new_len)?;
    if !fully && strict {
      return Err(
        self.throw_type_error("cannot shrink past a non-configurable element"),
      );
    }
    Ok(())
  }

  /// `ToUint32` with the exactness check of the array length domain.
  fn array_length_value(&mut self, value: &Value) -> Result<u32, EngineError> {
    let num = self.to_number(value)?;
    let len = crate::convert::to_uint32(num);
    if len as f64 != num {
      return Err(self.throw_range_error("invalid array length"));
    }
    Ok(len)
  }

  /// The raw length transition. Returns `false` if a shrink was blocked by a
  /// non-configurable element (the length then rests just above it).
  pub(crate) fn array_set_length(
    &mut self,
    obj: GcObject,
    new_len: u32,
  ) -> Result<bool, EngineError> {
    let record = self.heap.get_mut(obj)?;
    let ObjectKind::Array(data) = &mut record.kind else {
      return Ok(true);
    };
    let old_len = data.length;

    if new_len >= old_len {
      // Growth only moves the length; the uncovered range stays hole by
      // property-table absence.
      data.length = new_len;
      return Ok(true);
    }

    let mut doomed: Vec<u32> = record
      .properties
      .keys()
      .filter_map(|k| k.as_index())
      .filter(|&i| i >= new_len)
      .collect();
    doomed.sort_unstable_by(|a, b| b.cmp(a));

    for idx in doomed {
      let configurable = record
        .properties
        .get(&PropertyKey::Index(idx))
        .map_or(true, |p| p.configurable);
      if !configurable {
        let effective = idx + 1;
        if let ObjectKind::Array(data) = &mut record.kind {
          data.length = effective;
          data.truncate_holes(effective);
        }
        return Ok(false);
      }
      record.properties.remove(&PropertyKey::Index(idx));
    }

    if let ObjectKind::Array(data) = &mut record.kind {
      data.length = new_len;
      data.truncate_holes(new_len);
    }
    Ok(true)
  }

  /// `defineProperty(arr, "length", patch)`.
  pub(crate) fn array_define_length(
    &mut self,
    obj: GcObject,
    patch: PropertyPatch,
  ) -> Result<(), EngineError> {
    if patch.get.is_some() || patch.set.is_some() {
      return Err(self.throw_type_error("array `length` cannot become an accessor"));
    }
    if patch.enumerable == Some(true) || patch.configurable == Some(true) {
      return Err(self.throw_type_error("array `length` attributes are fixed"));
    }

    let (current_len, current_writable) = match &self.heap.get(obj)?.kind {
      ObjectKind::Array(data) => (data.length, data.length_writable),
      _ => return Ok(()),
    };

    if let Some(value) = patch.value.clone() {
      let new_len = self.array_length_value(&value)?;
      if !current_writable && new_len != current_len {
        return Err(self.throw_type_error("array `length` is not writable"));
      }
      let fully = self.array_set_length(obj, new_len)?;
      if !fully {
        // The writability downgrade still applies after a partial shrink.
        if patch.writable == Some(false) {
          self.set_array_length_writable(obj, false)?;
        }
        return Err(
          self.throw_type_error("cannot shrink past a non-configurable element"),
        );
      }
    }

    match patch.writable {
      Some(false) => self.set_array_length_writable(obj, false)?,
      Some(true) if !current_writable => {
        return Err(self.throw_type_error("array `length` is not writable"));
      }
      _ => {}
    }
    Ok(())
  }

  fn set_array_length_writable(&mut self, obj: GcObject, writable: bool) -> Result<(), EngineError> {
    if let ObjectKind::Array(data) = &mut self.heap.get_mut(obj)?.kind {
      data.length_writable = writable;
    }
    Ok(())
  }

  /// `defineProperty` on an array index: the length invariant gates additions
  /// past a read-only length, then ordinary descriptor merging applies.
  pub(crate) fn array_define_index(
    &mut self,
    obj: GcObject,
    idx: u32,
    patch: PropertyPatch,
  ) -> Result<(), EngineError> {
    let key = PropertyKey::Index(idx);
    let exists = self.has_own(obj, &key)?;
    if !exists {
      let (len, writable) = match &self.heap.get(obj)?.kind {
        ObjectKind::Array(data) => (data.length, data.length_writable),
        _ => (0, true),
      };
      if idx >= len && !writable {
        return Err(
          self.throw_type_error("cannot add an element beyond a read-only length"),
        );
      }
    }

    self.define_property_ordinary(obj, &key, patch)?;

    if let ObjectKind::Array(data) = &mut self.heap.get_mut(obj)?.kind {
      if idx >= data.length {
        data.length = idx + 1;
      } else {
        data.clear_hole(idx);
      }
    }
    Ok(())
  }

  // Mutate-in-place family.

  pub fn array_push(
    &mut self,
    obj: GcObject,
    items: &[Value],
  ) -> Result<Value, EngineError> {
    let mut len = self.length_of(obj)?;
    for item in items {
      self.put(obj, &idx_key(len), item.clone(), true)?;
      len += 1;
    }
    let new_len = Value::Number(len as f64);
    self.put_str(obj, "length", new_len.clone(), true)?;
    Ok(new_len)
  }

  pub fn array_pop(&mut self, obj: GcObject) -> Result<Value, EngineError> {
    let len = self.length_of(obj)?;
    if len == 0 {
      self.put_str(obj, "length", Value::Number(0.0), true)?;
      return Ok(Value::Undefined);
    }
    let key = idx_key(len - 1);
    let value = self.get(obj, &key)?;
    self.delete(obj, &key, true)?;
    self.put_str(obj, "length", Value::Number((len - 1) as f64), true)?;
    Ok(value)
  }

  pub fn array_shift(&mut self, obj: GcObject) -> Result<Value, EngineError> {
    let len = self.length_of(obj)?;
    if len == 0 {
      self.put_str(obj, "length", Value::Number(0.0), true)?;
      return Ok(Value::Undefined);
    }
    let first = self.get(obj, &idx_key(0))?;
    for to in 0..len - 1 {
      let from_key = idx_key(to + 1);
      if self.has_own(obj, &from_key)? {
        let value = self.get(obj, &from_key)?;
        self.put(obj, &idx_key(to), value, true)?;
      } else {
        self.delete(obj, &idx_key(to), true)?;
      }
    }
    self.delete(obj, &idx_key(len - 1), true)?;
    self.put_str(obj, "length", Value::Number((len - 1) as f64), true)?;
    Ok(first)
  }

  pub fn array_unshift(
    &mut self,
    obj: GcObject,
    items: &[Value],
  ) -> Result<Value, EngineError> {
    let len = self.length_of(obj)?;
    let shift = items.len() as u64;
    // Move existing elements up, highest first, preserving holes.
    for from in (0..len).rev() {
      let from_key = idx_key(from);
      let to_key = idx_key(from + shift);
      if self.has_own(obj, &from_key)? {
        let value = self.get(obj, &from_key)?;
        self.put(obj, &to_key, value, true)?;
      } else {
        self.delete(obj, &to_key, true)?;
      }
    }
    for (i, item) in items.iter().enumerate() {
      self.put(obj, &idx_key(i as u64), item.clone(), true)?;
    }
    let new_len = Value::Number((len + shift) as f64);
    self.put_str(obj, "length", new_len.clone(), true)?;
    Ok(new_len)
  }

  /// `splice(start, deleteCount, items...)`: returns the removed elements as
  /// a fresh array and splices `items` into the source in place.
  pub fn array_splice(
    &mut self,
    obj: GcObject,
    start: f64,
    delete_count: f64,
    items: &[Value],
  ) -> Result<GcObject, EngineError> {
    let len = self.length_of(obj)?;
    let start = relative_index(to_integer(start), len);
    let delete_count = to_integer(delete_count).clamp(0.0, (len - start) as f64) as u64;

    let removed = self.new_array(0);
    for i in 0..delete_count {
      let from_key = idx_key(start + i);
      if self.has_own(obj, &from_key)? {
        let value = self.get(obj, &from_key)?;
        self.put(removed, &idx_key(i), value, true)?;
      }
    }
    self.array_set_length(removed, delete_count as u32)?;

    let insert = items.len() as u64;
    if insert < delete_count {
      // Close the gap, then drop the tail.
      for to in start + insert..len - delete_count + insert {
        let from_key = idx_key(to + delete_count - insert);
        if self.has_own(obj, &from_key)? {
          let value = self.get(obj, &from_key)?;
          self.put(obj, &idx_key(to), value, true)?;
        } else {
          self.delete(obj, &idx_key(to), true)?;
        }
      }
      for idx in (len - delete_count + insert..len).rev() {
        self.delete(obj, &idx_key(idx), true)?;
      }
    } else if insert > delete_count {
      // Open the gap, highest first.
      for from in (start + delete_count..len).rev() {
        let from_key = idx_key(from);
        let to_key = idx_key(from + insert - delete_count);
        if self.has_own(obj, &from_key)? {
          let value = self.get(obj, &from_key)?;
          self.put(obj, &to_key, value, true)?;
        } else {
          self.delete(obj, &to_key, true)?;
        }
      }
    }
    for (i, item) in items.iter().enumerate() {
      self.put(obj, &idx_key(start + i as u64), item.clone(), true)?;
    }
    let new_len = len - delete_count + insert;
    self.put_str(obj, "length", Value::Number(new_len as f64), true)?;
    Ok(removed)
  }

  pub fn array_reverse(&mut self, obj: GcObject) -> Result<(), EngineError> {
    let len = self.length_of(obj)?;
    let mut lower = 0u64;
    while lower < len / 2 {
      let upper = len - lower - 1;
      let lower_key = idx_key(lower);
      let upper_key = idx_key(upper);
      let lower_present = self.has_own(obj, &lower_key)?;
      let upper_present = self.has_own(obj, &upper_key)?;
      let lower_value = self.get(obj, &lower_key)?;
      let upper_value = self.get(obj, &upper_key)?;
      match (lower_present, upper_present) {
        (true, true) => {
          self.put(obj, &lower_key, upper_value, true)?;
          self.put(obj, &upper_key, lower_value, true)?;
        }
        (true, false) => {
          self.put(obj, &upper_key, lower_value, true)?;
          self.delete(obj, &lower_key, true)?;
        }
        (false, true) => {
          self.put(obj, &lower_key, upper_value, true)?;
          self.delete(obj, &upper_key, true)?;
        }
        (false, false) => {}
      }
      lower += 1;
    }
    Ok(())
  }

  /// Sort: defined values first (ordered by the comparator, or by lexicographic
  /// comparison of `ToString` results), then Undefined values, then holes.
  ///
  /// A stable merge sort: equal comparator results preserve the original
  /// relative order.
  pub fn array_sort(
    &mut self,
    obj: GcObject,
    comparator: Option<&Value>,
  ) -> Result<(), EngineError> {
    let len = self.length_of(obj)?;

    let mut defined = Vec::new();
    let mut undefined_count = 0u64;
    let mut hole_count = 0u64;
    for i in 0..len {
      let key = idx_key(i);
      if !self.has_own(obj, &key)? {
        hole_count += 1;
        continue;
      }
      let value = self.get(obj, &key)?;
      if value.is_undefined() {
        undefined_count += 1;
      } else {
        defined.push(value);
      }
    }

    let sorted = self.merge_sort(defined, comparator)?;

    let mut cursor = 0u64;
    for value in sorted {
      self.put(obj, &idx_key(cursor), value, true)?;
      cursor += 1;
    }
    for _ in 0..undefined_count {
      self.put(obj, &idx_key(cursor), Value::Undefined, true)?;
      cursor += 1;
    }
    for _ in 0..hole_count {
      self.delete(obj, &idx_key(cursor), true)?;
      cursor += 1;
    }
    Ok(())
  }

  fn merge_sort(
    &mut self,
    mut items: Vec<Value>,
    comparator: Option<&Value>,
  ) -> Result<Vec<Value>, EngineError> {
    if items.len() <= 1 {
      return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = self.merge_sort(items, comparator)?;
    let right = self.merge_sort(right, comparator)?;

    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut l = left.into_iter().peekable();
    let mut r = right.into_iter().peekable();
    loop {
      match (l.peek(), r.peek()) {
        (Some(a), Some(b)) => {
          // `<=` keeps the left run's elements first on ties (stability).
          if self.sort_compare(a, b, comparator)? != Ordering::Greater {
            out.push(l.next().unwrap());
          } else {
            out.push(r.next().unwrap());
          }
        }
        (Some(_), None) => out.push(l.next().unwrap()),
        (None, Some(_)) => out.push(r.next().unwrap()),
        (None, None) => break,
      }
    }
    Ok(out)
  }

  fn sort_compare(
    &mut self,
    a: &Value,
    b: &Value,
    comparator: Option<&Value>,
  ) -> Result<Ordering, EngineError> {
    if let Some(comparator) = comparator {
      let result = self.call_value(comparator, Value::Undefined, &[a.clone(), b.clone()])?;
      let num = self.to_number(&result)?;
      // NaN and 0 both mean "equal"; otherwise the sign decides.
      return Ok(if num < 0.0 {
        Ordering::Less
      } else if num > 0.0 {
        Ordering::Greater
      } else {
        Ordering::Equal
      });
    }
    let a = self.to_js_string(a)?;
    let b = self.to_js_string(b)?;
    Ok(a.as_str().cmp(b.as_str()))
  }

  // Search family.

  pub fn array_index_of(
    &mut self,
    obj: GcObject,
    search: &Value,
    from: f64,
  ) -> Result<f64, EngineError> {
    let len = self.length_of(obj)?;
    if len == 0 {
      return Ok(-1.0);
    }
    let start = relative_index(to_integer(from), len);
    for i in start..len {
      let key = idx_key(i);
      if self.has_own(obj, &key)? && self.get(obj, &key)?.strict_eq(search) {
        return Ok(i as f64);
      }
    }
    Ok(-1.0)
  }

  pub fn array_last_index_of(
    &mut self,
    obj: GcObject,
    search: &Value,
    from: f64,
  ) -> Result<f64, EngineError> {
    let len = self.length_of(obj)?;
    if len == 0 {
      return Ok(-1.0);
    }
    let from = to_integer(from);
    // A backward search clamps an overflowing offset to the last index.
    let start = if from < 0.0 {
      if -from > len as f64 {
        return Ok(-1.0);
      }
      len - (-from) as u64
    } else if from >= (len - 1) as f64 {
      len - 1
    } else {
      from as u64
    };
    for i in (0..=start).rev() {
      let key = idx_key(i);
      if self.has_own(obj, &key)? && self.get(obj, &key)?.strict_eq(search) {
        return Ok(i as f64);
      }
    }
    Ok(-1.0)
  }

  // Iterate-with-callback family. The iteration bound is `length` as read
  // before the first callback; callbacks growing the object do not extend the
  // run.

  pub fn array_for_each(
    &mut self,
    obj: GcObject,
    callback: &Value,
    this_arg: Value,
  ) -> Result<(), EngineError> {
    let len = self.length_of(obj)?;
    self.require_callable(callback)?;
    for i in 0..len {
      let key = idx_key(i);
      if self.has_own(obj, &key)? {
        let value = self.get(obj, &key)?;
        self.call_value(
          callback,
          this_arg.clone(),
          &[value, Value::Number(i as f64), Value::Object(obj)],
        )?;
      }
    }
    Ok(())
  }

  pub fn array_map(
    &mut self,
    obj: GcObject,
    callback: &Value,
    this_arg: Value,
  ) -> Result<GcObject, EngineError> {
    let len = self.length_of(obj)?;
    self.require_callable(callback)?;
    let out = self.new_array(len.min(u32::MAX as u64) as u32);
    for i in 0..len {
      let key = idx_key(i);
      if self.has_own(obj, &key)? {
        let value = self.get(obj, &key)?;
        let mapped = self.call_value(
          callback,
          this_arg.clone(),
          &[value, Value::Number(i as f64), Value::Object(obj)],
        )?;
        self.put(out, &key, mapped, true)?;
      }
    }
    Ok(out)
  }

  pub fn array_filter(
    &mut self,
    obj: GcObject,
    callback: &Value,
    this_arg: Value,
  ) -> Result<GcObject, EngineError> {
    let len = self.length_of(obj)?;
    self.require_callable(callback)?;
    let out = self.new_array(0);
    let mut kept = 0u64;
    for i in 0..len {
      let key = idx_key(i);
      if self.has_own(obj, &key)? {
        let value = self.get(obj, &key)?;
        let keep = self.call_value(
          callback,
          this_arg.clone(),
          &[value.clone(), Value::Number(i as f64), Value::Object(obj)],
        )?;
        if crate::convert::to_boolean(&keep) {
          self.put(out, &idx_key(kept), value, true)?;
          kept += 1;
        }
      }
    }
    Ok(out)
  }

  pub fn array_every(
    &mut self,
    obj: GcObject,
    callback: &Value,
    this_arg: Value,
  ) -> Result<bool, EngineError> {
    let len = self.length_of(obj)?;
    self.require_callable(callback)?;
    for i in 0..len {
      let key = idx_key(i);
      if self.has_own(obj, &key)? {
        let value = self.get(obj, &key)?;
        let result = self.call_value(
          callback,
          this_arg.clone(),
          &[value, Value::Number(i as f64), Value::Object(obj)],
        )?;
        if !crate::convert::to_boolean(&result) {
          return Ok(false);
        }
      }
    }
    Ok(true)
  }

  pub fn array_some(
    &mut self,
    obj: GcObject,
    callback: &Value,
    this_arg: Value,
  ) -> Result<bool, EngineError> {
    let len = self.length_of(obj)?;
    self.require_callable(callback)?;
    for i in 0..len {
      let key = idx_key(i);
      if self.has_own(obj, &key)? {
        let value = self.get(obj, &key)?;
        let result = self.call_value(
          callback,
          this_arg.clone(),
          &[value, Value::Number(i as f64), Value::Object(obj)],
        )?;
        if crate::convert::to_boolean(&result) {
          return Ok(true);
        }
      }
    }
    Ok(false)
  }

  // Reduce family. With no initial value the first present element seeds the
  // accumulator; an effectively empty sequence is a TypeError.

  pub fn array_reduce(
    &mut self,
    obj: GcObject,
    callback: &Value,
    initial: Option<Value>,
  ) -> Result<Value, EngineError> {
    let len = self.length_of(obj)?;
    self.require_callable(callback)?;
    let mut acc = initial;
    for i in 0..len {
      let key = idx_key(i);
      if !self.has_own(obj, &key)? {
        continue;
      }
      let value = self.get(obj, &key)?;
      acc = Some(match acc {
        None => value,
        Some(acc) => self.call_value(
          callback,
          Value::Undefined,
          &[acc, value, Value::Number(i as f64), Value::Object(obj)],
        )?,
      });
    }
    match acc {
      Some(acc) => Ok(acc),
      None => Err(self.throw_type_error("reduce of empty array with no initial value")),
    }
  }

  pub fn array_reduce_right(
    &mut self,
    obj: GcObject,
    callback: &Value,
    initial: Option<Value>,
  ) -> Result<Value, EngineError> {
    let len = self.length_of(obj)?;
    self.require_callable(callback)?;
    let mut acc = initial;
    for i in (0..len).rev() {
      let key = idx_key(i);
      if !self.has_own(obj, &key)? {
        continue;
      }
      let value = self.get(obj, &key)?;
      acc = Some(match acc {
        None => value,
        Some(acc) => self.call_value(
          callback,
          Value::Undefined,
          &[acc, value, Value::Number(i as f64), Value::Object(obj)],
        )?,
      });
    }
    match acc {
      Some(acc) => Ok(acc),
      None => Err(self.throw_type_error("reduce of empty array with no initial value")),
    }
  }

  // Non-mutating combinators.

  pub fn array_join(&mut self, obj: GcObject, separator: &Value) -> Result<JsStr, EngineError> {
    let len = self.length_of(obj)?;
    let separator = if separator.is_undefined() {
      JsStr::from(",")
    } else {
      self.to_js_string(separator)?
    };
    let mut out = String::new();
    for i in 0..len {
      if i > 0 {
        out.push_str(&separator);
      }
      let element = self.get(obj, &idx_key(i))?;
      // Undefined and Null render as the empty string.
      if !matches!(element, Value::Undefined | Value::Null) {
        out.push_str(&self.to_js_string(&element)?);
      }
    }
    Ok(JsStr::from(out))
  }

  /// `concat`: array arguments are spread element-by-element (holes
  /// preserved), anything else is appended as a single element.
  pub fn array_concat(
    &mut self,
    this: Value,
    items: &[Value],
  ) -> Result<GcObject, EngineError> {
    let out = self.new_array(0);
    let mut cursor = 0u64;
    let mut append = |engine: &mut Engine, cursor: &mut u64, item: &Value| -> Result<(), EngineError> {
      let spread = item
        .as_object()
        .map(|obj| engine.heap.get(obj).map(|r| r.is_array()))
        .transpose()?
        .unwrap_or(false);
      if spread {
        let source = item.as_object().unwrap();
        let len = engine.length_of(source)?;
        for i in 0..len {
          let key = idx_key(i);
          if engine.has_own(source, &key)? {
            let value = engine.get(source, &key)?;
            engine.put(out, &idx_key(*cursor), value, true)?;
          }
          *cursor += 1;
        }
      } else {
        engine.put(out, &idx_key(*cursor), item.clone(), true)?;
        *cursor += 1;
      }
      Ok(())
    };
    append(self, &mut cursor, &this)?;
    for item in items {
      append(self, &mut cursor, item)?;
    }
    self.array_set_length(out, cursor.min(u32::MAX as u64) as u32)?;
    Ok(out)
  }

  pub fn array_slice(
    &mut self,
    obj: GcObject,
    start: f64,
    end: Option<f64>,
  ) -> Result<GcObject, EngineError> {
    let len = self.length_of(obj)?;
    let start = relative_index(to_integer(start), len);
    let end = match end {
      Some(end) => relative_index(to_integer(end), len),
      None => len,
    };
    let out = self.new_array(0);
    let mut cursor = 0u64;
    for i in start..end {
      let key = idx_key(i);
      if self.has_own(obj, &key)? {
        let value = self.get(obj, &key)?;
        self.put(out, &idx_key(cursor), value, true)?;
      }
      cursor += 1;
    }
    self.array_set_length(out, cursor.min(u32::MAX as u64) as u32)?;
    Ok(out)
  }

  fn require_callable(&mut self, value: &Value) -> Result<(), EngineError> {
    if self.is_callable(value) {
      Ok(())
    } else {
      Err(self.throw_type_error("callback is not a function"))
    }
  }
}
