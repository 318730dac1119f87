/// A generation-checked handle to an object record in the [`crate::Heap`].
///
/// A handle contains `{ index, generation }`; the `index` points into the heap's
/// object slot vector and the `generation` is incremented every time that slot is
/// freed. Handles are therefore stable across slot-vector reallocations, and a
/// handle used after its object was collected is detected (APIs return
/// [`crate::EngineError::InvalidHandle`]) rather than resolving to an unrelated
/// object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcObject {
  pub(crate) index: u32,
  pub(crate) generation: u32,
}

/// A generation-checked handle to an environment record in the [`crate::Heap`].
///
/// Environment records (activation records, object-backed scopes) live in their
/// own slot table but follow the same `{ index, generation }` validity rules as
/// [`GcObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcEnv {
  pub(crate) index: u32,
  pub(crate) generation: u32,
}

/// Identifier for a persistent GC root created by [`crate::Heap::add_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RootId(pub(crate) u32);
