use crate::function::JsFunction;
use crate::heap::Tracer;
use crate::property::{Property, PropertyKey, PropertyKind};
use crate::value::JsStr;
use crate::{GcEnv, GcObject};
use ahash::AHashMap;

/// The runtime representation of a language-level object: an ordered property
/// table, a prototype link, an extensibility flag and a closed kind tag.
///
/// The kind set is fixed by the language core (ordinary objects, array-like
/// objects, function objects, arguments records, the global object); dispatch
/// over it is a `match`, not open-ended subclassing.
#[derive(Debug)]
pub struct ObjectRecord {
  pub(crate) prototype: Option<GcObject>,
  pub(crate) extensible: bool,
  pub(crate) properties: PropertyTable,
  pub(crate) kind: ObjectKind,
}

impl ObjectRecord {
  pub(crate) fn new(kind: ObjectKind, prototype: Option<GcObject>) -> Self {
    Self {
      prototype,
      extensible: true,
      properties: PropertyTable::default(),
      kind,
    }
  }

  pub(crate) fn is_array(&self) -> bool {
    matches!(self.kind, ObjectKind::Array(_))
  }

  pub(crate) fn as_function(&self) -> Option<&JsFunction> {
    match &self.kind {
      ObjectKind::Function(f) => Some(f),
      _ => None,
    }
  }

  pub(crate) fn trace(&self, tracer: &mut Tracer<'_>) {
    if let Some(proto) = self.prototype {
      tracer.trace_object(proto);
    }
    for (_, prop) in self.properties.iter() {
      match &prop.kind {
        PropertyKind::Data { value, .. } => tracer.trace_value(value),
        PropertyKind::Accessor { get, set } => {
          tracer.trace_value(get);
          tracer.trace_value(set);
        }
      }
    }
    match &self.kind {
      ObjectKind::Ordinary | ObjectKind::Global => {}
      ObjectKind::Array(_) => {}
      ObjectKind::Function(f) => f.trace(tracer),
      ObjectKind::Arguments(args) => tracer.trace_env(args.env),
    }
  }
}

/// Per-kind extra state for an [`ObjectRecord`].
#[derive(Debug)]
pub enum ObjectKind {
  /// A plain object.
  Ordinary,
  /// An array: carries the `length` slot and the sparse-hole bookkeeping.
  Array(ArrayData),
  /// A callable (and possibly constructable) object.
  Function(Box<JsFunction>),
  /// A non-strict arguments record with live parameter aliasing.
  Arguments(ArgumentsData),
  /// The one global object of an evaluation context.
  Global,
}

/// Array-specific state: the `length` slot and the lazily allocated set of
/// known holes below `length`.
///
/// A hole is the absence of an own index property; the set is a subset of the
/// actual holes, populated only when an element is deleted. Length growth
/// (including allocation at an arbitrary length) never touches it.
#[derive(Debug)]
pub struct ArrayData {
  pub(crate) length: u32,
  pub(crate) length_writable: bool,
  /// Allocated the first time a hole is created; `None` means "no holes".
  pub(crate) sparse: Option<Box<SparseSet>>,
}

impl ArrayData {
  pub(crate) fn new(length: u32) -> Self {
    Self {
      length,
      length_writable: true,
      sparse: None,
    }
  }

  /// Records that `index` (below the current length) is a hole.
  pub(crate) fn mark_hole(&mut self, index: u32) {
    self
      .sparse
      .get_or_insert_with(|| Box::new(SparseSet::default()))
      .insert(index);
  }

  /// Records that `index` is no longer a hole (a value was stored there).
  pub(crate) fn clear_hole(&mut self, index: u32) {
    if let Some(set) = &mut self.sparse {
      set.remove(index);
    }
  }

  pub(crate) fn is_known_hole(&self, index: u32) -> bool {
    self
      .sparse
      .as_ref()
      .is_some_and(|set| set.contains(index))
  }

  /// Drops hole bookkeeping at/above `new_length` after a shrink.
  pub(crate) fn truncate_holes(&mut self, new_length: u32) {
    if let Some(set) = &mut self.sparse {
      set.truncate(new_length);
      if set.is_empty() {
        self.sparse = None;
      }
    }
  }
}

/// A word-packed bit-set of array indices.
#[derive(Debug, Default)]
pub struct SparseSet {
  words: Vec<u64>,
  len: usize,
}

impl SparseSet {
  pub(crate) fn insert(&mut self, index: u32) {
    let word = (index / 64) as usize;
    let bit = 1u64 << (index % 64);
    if word >= self.words.len() {
      self.words.resize(word + 1, 0);
    }
    if self.words[word] & bit == 0 {
      self.words[word] |= bit;
      self.len += 1;
    }
  }

  pub(crate) fn remove(&mut self, index: u32) {
    let word = (index / 64) as usize;
    let bit = 1u64 << (index % 64);
    if word < self.words.len() && self.words[word] & bit != 0 {
      self.words[word] &= !bit;
      self.len -= 1;
    }
  }

  pub(crate) fn contains(&self, index: u32) -> bool {
    let word = (index / 64) as usize;
    let bit = 1u64 << (index % 64);
    word < self.words.len() && self.words[word] & bit != 0
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Removes every member at/above `bound`.
  pub(crate) fn truncate(&mut self, bound: u32) {
    let keep_words = ((bound as usize) + 63) / 64;
    for word in self.words.iter_mut().skip(keep_words) {
      self.len -= word.count_ones() as usize;
      *word = 0;
    }
    if bound % 64 != 0 && keep_words > 0 && keep_words <= self.words.len() {
      let word = &mut self.words[keep_words - 1];
      let mask = (1u64 << (bound % 64)) - 1;
      let dropped = (*word & !mask).count_ones() as usize;
      *word &= mask;
      self.len -= dropped;
    }
  }
}

/// State for a non-strict arguments record: the activation record whose
/// parameter bindings the indexed entries alias, and the per-index parameter
/// name map. `None` entries are unmapped (severed by `delete` or by an
/// incompatible redefinition).
#[derive(Debug)]
pub struct ArgumentsData {
  pub(crate) env: GcEnv,
  pub(crate) mapped: Vec<Option<JsStr>>,
}

impl ArgumentsData {
  pub(crate) fn mapped_name(&self, index: u32) -> Option<&JsStr> {
    self
      .mapped
      .get(index as usize)
      .and_then(|slot| slot.as_ref())
  }

  pub(crate) fn unmap(&mut self, index: u32) {
    if let Some(slot) = self.mapped.get_mut(index as usize) {
      *slot = None;
    }
  }
}

/// An insertion-ordered property table with a hashed lookup index.
///
/// Insertion order is significant for enumeration, so entries live in a `Vec`;
/// the side index keeps lookup O(1). Removal is O(n) (it has to renumber later
/// entries), which is acceptable for an interpreter's property counts.
#[derive(Debug, Default)]
pub struct PropertyTable {
  entries: Vec<(PropertyKey, Property)>,
  index: AHashMap<PropertyKey, usize>,
}

impl PropertyTable {
  pub(crate) fn get(&self, key: &PropertyKey) -> Option<&Property> {
    self.index.get(key).map(|&pos| &self.entries[pos].1)
  }

  pub(crate) fn get_mut(&mut self, key: &PropertyKey) -> Option<&mut Property> {
    let pos = *self.index.get(key)?;
    Some(&mut self.entries[pos].1)
  }

  pub(crate) fn contains(&self, key: &PropertyKey) -> bool {
    self.index.contains_key(key)
  }

  /// Inserts or overwrites; new keys append at the end of the order.
  pub(crate) fn set(&mut self, key: PropertyKey, prop: Property) {
    match self.index.get(&key) {
      Some(&pos) => self.entries[pos].1 = prop,
      None => {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, prop));
      }
    }
  }

  pub(crate) fn remove(&mut self, key: &PropertyKey) -> Option<Property> {
    let pos = self.index.remove(key)?;
    let (_, prop) = self.entries.remove(pos);
    for (later_key, _) in &self.entries[pos..] {
      if let Some(entry) = self.index.get_mut(later_key) {
        *entry -= 1;
      }
    }
    Some(prop)
  }

  pub(crate) fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &Property)> {
    self.entries.iter().map(|(k, p)| (k, p))
  }

  /// Keys in insertion order (no index/string reordering applied here).
  pub(crate) fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
    self.entries.iter().map(|(k, _)| k)
  }
}
