use crate::value::Value;
use std::fmt::Display;

/// Errors produced by the engine.
///
/// Language-level errors (TypeError, RangeError, ReferenceError, runtime
/// SyntaxError) are *thrown values*: they travel as [`EngineError::Throw`]
/// carrying an error object with at least `name` and `message` properties, and
/// are catchable from language code. Only conditions the language cannot
/// observe get their own variants.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
  /// A GC handle was used after the underlying record was freed (or the handle
  /// is otherwise malformed).
  #[error("invalid handle")]
  InvalidHandle,

  /// An attempted prototype mutation would introduce a cycle in the prototype
  /// chain.
  #[error("prototype cycle")]
  PrototypeCycle,

  /// A thrown language value. This is catchable from language code; at the
  /// top level it surfaces to the host as this error.
  #[error("uncaught exception")]
  Throw(Value),

  /// Early (static-semantics) errors produced before evaluation begins.
  ///
  /// Evaluation never starts when validation reports any of these.
  #[error("syntax error")]
  Syntax(Vec<EarlyError>),

  /// `evaluate_load_module` was asked for a unit no collaborator registered.
  #[error("unknown module: {0}")]
  UnknownModule(String),

  /// A module-like unit transitively loaded itself.
  #[error("module cycle while loading: {0}")]
  ModuleCycle(String),
}

/// A static-semantics violation detected before evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyError {
  pub kind: EarlyErrorKind,
  pub message: String,
}

impl Display for EarlyError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "SyntaxError: {}", self.message)
  }
}

/// Classification of an [`EarlyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EarlyErrorKind {
  /// Assignment or update targeting `eval`/`arguments` in strict code.
  StrictAssignmentTarget,
  /// `eval`/`arguments` or a strict-reserved word used as a binding name.
  StrictBindingName,
  /// Duplicate parameter name in a strict function.
  StrictDuplicateParameter,
  /// `with` statement in strict code.
  StrictWith,
  /// `delete` of an unqualified identifier in strict code.
  StrictDelete,
  /// Conflicting definitions for one name in an object literal.
  DuplicateObjectLiteralProperty,
}
