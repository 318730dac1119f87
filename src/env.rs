use crate::heap::Tracer;
use crate::value::{JsStr, Value};
use crate::{GcEnv, GcObject};

/// A lexical environment record.
///
/// Records form an ordered chain (via `outer`) terminating at the one global
/// record of the evaluation context. Activation records are created on function
/// entry (and for `catch`/`with` blocks) and are kept alive only by closures
/// capturing them or by active calls; the heap reclaims the rest at the next
/// collection.
#[derive(Debug)]
pub struct EnvRecord {
  pub(crate) outer: Option<GcEnv>,
  pub(crate) kind: EnvKind,
  /// The `this` value established by the call that created this record.
  /// `None` for records that do not bind `this` (catch/with scopes); lookups
  /// walk outward.
  pub(crate) this_value: Option<Value>,
}

#[derive(Debug)]
pub(crate) enum EnvKind {
  /// An activation record: an ordered name → value binding table.
  Declarative { bindings: Vec<EnvBinding> },
  /// A record backed by an object's properties (the global record, `with`).
  Object { object: GcObject },
}

#[derive(Debug)]
pub(crate) struct EnvBinding {
  pub(crate) name: JsStr,
  pub(crate) value: Value,
  pub(crate) mutable: bool,
}

impl EnvRecord {
  pub(crate) fn declarative(outer: Option<GcEnv>) -> Self {
    Self {
      outer,
      kind: EnvKind::Declarative {
        bindings: Vec::new(),
      },
      this_value: None,
    }
  }

  pub(crate) fn object(outer: Option<GcEnv>, object: GcObject) -> Self {
    Self {
      outer,
      kind: EnvKind::Object { object },
      this_value: None,
    }
  }

  pub(crate) fn binding_index(&self, name: &str) -> Option<usize> {
    match &self.kind {
      EnvKind::Declarative { bindings } => bindings.iter().position(|b| &*b.name == name),
      EnvKind::Object { .. } => None,
    }
  }

  /// Declares (or re-uses) a binding in a declarative record.
  pub(crate) fn declare(&mut self, name: JsStr, value: Value, mutable: bool) {
    let EnvKind::Declarative { bindings } = &mut self.kind else {
      debug_assert!(false, "declare on object-backed environment record");
      return;
    };
    if let Some(existing) = bindings.iter_mut().find(|b| b.name == name) {
      existing.value = value;
      return;
    }
    bindings.push(EnvBinding {
      name,
      value,
      mutable,
    });
  }

  pub(crate) fn trace(&self, tracer: &mut Tracer<'_>) {
    if let Some(outer) = self.outer {
      tracer.trace_env(outer);
    }
    match &self.kind {
      EnvKind::Declarative { bindings } => {
        for binding in bindings {
          tracer.trace_value(&binding.value);
        }
      }
      EnvKind::Object { object } => tracer.trace_object(*object),
    }
    if let Some(this_value) = &self.this_value {
      tracer.trace_value(this_value);
    }
  }
}
