use crate::env::EnvRecord;
use crate::object::ObjectRecord;
use crate::value::Value;
use crate::{EngineError, GcEnv, GcObject, RootId};

/// A non-moving arena heap for object and environment records, with
/// mark/sweep collection.
///
/// Records are stored in index-addressed slot vectors; handles carry
/// `{index, generation}` and become invalid once the record is collected
/// (future allocations may reuse the slot index with a newer generation).
///
/// Collection runs only at explicit safe points ([`Heap::collect_garbage`],
/// reached via `Engine::collect_garbage`), never during allocation, so callers
/// never need to root intermediate values across allocating operations. The
/// root set is supplied by the engine: the global object and environment, the
/// module cache, and the persistent roots managed here.
pub struct Heap {
  objects: Vec<ObjSlot>,
  object_free: Vec<u32>,
  envs: Vec<EnvSlot>,
  env_free: Vec<u32>,

  persistent_roots: Vec<Option<Value>>,
  persistent_roots_free: Vec<u32>,

  gc_runs: u64,
}

struct ObjSlot {
  record: Option<ObjectRecord>,
  generation: u32,
}

struct EnvSlot {
  record: Option<EnvRecord>,
  generation: u32,
}

impl Default for Heap {
  fn default() -> Self {
    Self::new()
  }
}

impl Heap {
  pub fn new() -> Self {
    Self {
      objects: Vec::new(),
      object_free: Vec::new(),
      envs: Vec::new(),
      env_free: Vec::new(),
      persistent_roots: Vec::new(),
      persistent_roots_free: Vec::new(),
      gc_runs: 0,
    }
  }

  /// Number of live object records.
  pub fn live_objects(&self) -> usize {
    self.objects.iter().filter(|s| s.record.is_some()).count()
  }

  /// Number of live environment records.
  pub fn live_envs(&self) -> usize {
    self.envs.iter().filter(|s| s.record.is_some()).count()
  }

  /// Total number of GC cycles that have run.
  pub fn gc_runs(&self) -> u64 {
    self.gc_runs
  }

  pub(crate) fn alloc_object(&mut self, record: ObjectRecord) -> GcObject {
    match self.object_free.pop() {
      Some(index) => {
        let slot = &mut self.objects[index as usize];
        debug_assert!(slot.record.is_none());
        slot.record = Some(record);
        GcObject {
          index,
          generation: slot.generation,
        }
      }
      None => {
        let index = self.objects.len() as u32;
        self.objects.push(ObjSlot {
          record: Some(record),
          generation: 0,
        });
        GcObject {
          index,
          generation: 0,
        }
      }
    }
  }

  pub(crate) fn alloc_env(&mut self, record: EnvRecord) -> GcEnv {
    match self.env_free.pop() {
      Some(index) => {
        let slot = &mut self.envs[index as usize];
        debug_assert!(slot.record.is_none());
        slot.record = Some(record);
        GcEnv {
          index,
          generation: slot.generation,
        }
      }
      None => {
        let index = self.envs.len() as u32;
        self.envs.push(EnvSlot {
          record: Some(record),
          generation: 0,
        });
        GcEnv {
          index,
          generation: 0,
        }
      }
    }
  }

  pub(crate) fn get(&self, obj: GcObject) -> Result<&ObjectRecord, EngineError> {
    self
      .objects
      .get(obj.index as usize)
      .filter(|slot| slot.generation == obj.generation)
      .and_then(|slot| slot.record.as_ref())
      .ok_or(EngineError::InvalidHandle)
  }

  pub(crate) fn get_mut(&mut self, obj: GcObject) -> Result<&mut ObjectRecord, EngineError> {
    self
      .objects
      .get_mut(obj.index as usize)
      .filter(|slot| slot.generation == obj.generation)
      .and_then(|slot| slot.record.as_mut())
      .ok_or(EngineError::InvalidHandle)
  }

  pub(crate) fn get_env(&self, env: GcEnv) -> Result<&EnvRecord, EngineError> {
    self
      .envs
      .get(env.index as usize)
      .filter(|slot| slot.generation == env.generation)
      .and_then(|slot| slot.record.as_ref())
      .ok_or(EngineError::InvalidHandle)
  }

  pub(crate) fn get_env_mut(&mut self, env: GcEnv) -> Result<&mut EnvRecord, EngineError> {
    self
      .envs
      .get_mut(env.index as usize)
      .filter(|slot| slot.generation == env.generation)
      .and_then(|slot| slot.record.as_mut())
      .ok_or(EngineError::InvalidHandle)
  }

  /// Returns `true` if `obj` currently points at a live object record.
  pub fn is_valid(&self, obj: GcObject) -> bool {
    self.get(obj).is_ok()
  }

  /// Adds a persistent root, keeping `value` live until the returned [`RootId`]
  /// is removed.
  pub fn add_root(&mut self, value: Value) -> RootId {
    let idx = match self.persistent_roots_free.pop() {
      Some(idx) => idx as usize,
      None => {
        self.persistent_roots.push(None);
        self.persistent_roots.len() - 1
      }
    };
    debug_assert!(self.persistent_roots[idx].is_none());
    self.persistent_roots[idx] = Some(value);
    RootId(idx as u32)
  }

  /// Returns the current value of a persistent root.
  pub fn get_root(&self, id: RootId) -> Option<Value> {
    self
      .persistent_roots
      .get(id.0 as usize)
      .and_then(|slot| slot.clone())
  }

  /// Updates a persistent root's value.
  pub fn set_root(&mut self, id: RootId, value: Value) {
    let idx = id.0 as usize;
    debug_assert!(idx < self.persistent_roots.len(), "invalid RootId");
    if let Some(slot) = self.persistent_roots.get_mut(idx) {
      debug_assert!(slot.is_some(), "RootId already removed");
      if slot.is_some() {
        *slot = Some(value);
      }
    }
  }

  /// Removes a persistent root previously created by [`Heap::add_root`].
  pub fn remove_root(&mut self, id: RootId) {
    let idx = id.0 as usize;
    debug_assert!(idx < self.persistent_roots.len(), "invalid RootId");
    if let Some(slot) = self.persistent_roots.get_mut(idx) {
      debug_assert!(slot.is_some(), "RootId already removed");
      if slot.take().is_some() {
        self.persistent_roots_free.push(id.0);
      }
    }
  }

  /// Runs a mark/sweep cycle. `extra_roots` supplies the engine-held roots
  /// (global object, global environment, module cache values).
  pub(crate) fn collect_garbage(&mut self, extra_roots: &[Value], extra_env_roots: &[GcEnv]) {
    self.gc_runs += 1;

    let mut obj_marks = vec![false; self.objects.len()];
    let mut env_marks = vec![false; self.envs.len()];

    // Mark.
    {
      let mut work = Vec::new();
      {
        let mut tracer = Tracer { work: &mut work };
        for value in extra_roots {
          tracer.trace_value(value);
        }
        for env in extra_env_roots {
          tracer.trace_env(*env);
        }
        for value in self.persistent_roots.iter().flatten() {
          tracer.trace_value(value);
        }
      }

      while let Some(item) = work.pop() {
        match item {
          WorkItem::Object(obj) => {
            let Some(slot) = self.objects.get(obj.index as usize) else {
              debug_assert!(false, "traced handle out of bounds: {obj:?}");
              continue;
            };
            if slot.generation != obj.generation {
              debug_assert!(false, "stale handle in root set: {obj:?}");
              continue;
            }
            let idx = obj.index as usize;
            if obj_marks[idx] {
              continue;
            }
            obj_marks[idx] = true;
            let Some(record) = slot.record.as_ref() else {
              debug_assert!(false, "validated handle points at a free slot");
              continue;
            };
            record.trace(&mut Tracer { work: &mut work });
          }
          WorkItem::Env(env) => {
            let Some(slot) = self.envs.get(env.index as usize) else {
              debug_assert!(false, "traced env handle out of bounds: {env:?}");
              continue;
            };
            if slot.generation != env.generation {
              debug_assert!(false, "stale env handle in root set: {env:?}");
              continue;
            }
            let idx = env.index as usize;
            if env_marks[idx] {
              continue;
            }
            env_marks[idx] = true;
            let Some(record) = slot.record.as_ref() else {
              debug_assert!(false, "validated env handle points at a free slot");
              continue;
            };
            record.trace(&mut Tracer { work: &mut work });
          }
        }
      }
    }

    // Sweep.
    let mut swept_objects = 0usize;
    for (idx, slot) in self.objects.iter_mut().enumerate() {
      if slot.record.is_some() && !obj_marks[idx] {
        slot.record = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.object_free.push(idx as u32);
        swept_objects += 1;
      }
    }
    let mut swept_envs = 0usize;
    for (idx, slot) in self.envs.iter_mut().enumerate() {
      if slot.record.is_some() && !env_marks[idx] {
        slot.record = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.env_free.push(idx as u32);
        swept_envs += 1;
      }
    }

    log::debug!(
      "gc cycle {run}: swept {swept_objects} objects, {swept_envs} envs",
      run = self.gc_runs
    );
  }
}

enum WorkItem {
  Object(GcObject),
  Env(GcEnv),
}

/// Mark-phase tracer: record `trace` implementations push their outgoing
/// references here.
pub struct Tracer<'a> {
  work: &'a mut Vec<WorkItem>,
}

impl Tracer<'_> {
  pub(crate) fn trace_value(&mut self, value: &Value) {
    if let Value::Object(obj) = value {
      self.work.push(WorkItem::Object(*obj));
    }
  }

  pub(crate) fn trace_object(&mut self, obj: GcObject) {
    self.work.push(WorkItem::Object(obj));
  }

  pub(crate) fn trace_env(&mut self, env: GcEnv) {
    self.work.push(WorkItem::Env(env));
  }
}

/// RAII wrapper for a persistent GC root created by [`Heap::add_root`].
///
/// While this guard is alive it holds a mutable borrow of the [`Heap`]. For
/// long-lived roots stored in host state, prefer storing the [`RootId`] from
/// [`Heap::add_root`] directly.
pub struct PersistentRoot<'a> {
  heap: &'a mut Heap,
  id: RootId,
}

impl<'a> PersistentRoot<'a> {
  /// Adds `value` to the persistent root set and returns a guard that removes
  /// it on drop.
  pub fn new(heap: &'a mut Heap, value: Value) -> Self {
    let id = heap.add_root(value);
    Self { heap, id }
  }

  #[inline]
  pub fn id(&self) -> RootId {
    self.id
  }

  #[inline]
  pub fn get(&self) -> Option<Value> {
    self.heap.get_root(self.id)
  }

  #[inline]
  pub fn set(&mut self, value: Value) {
    self.heap.set_root(self.id, value);
  }
}

impl Drop for PersistentRoot<'_> {
  fn drop(&mut self) {
    self.heap.remove_root(self.id);
  }
}
