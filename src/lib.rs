//! An embeddable tree-walking interpreter core for an ECMAScript-family
//! dynamic language.
//!
//! The crate covers the object/value runtime and evaluation engine: the
//! property/attribute model with prototype-based lookup, the generic
//! array/sparse algorithm layer, the scope-resolution and function-invocation
//! pipeline (hoisting, `this` binding, the dual-mode arguments record) and the
//! strict-mode static validator that gates evaluation. The concrete grammar is
//! an external collaborator: callers hand the engine an [`ast::Program`].
//!
//! ```
//! use interp_js::ast::{Expr, BinaryOp, Program, Stmt};
//! use interp_js::{Engine, Value};
//!
//! let program = Program::new(vec![Stmt::Expr(Expr::Binary {
//!   op: BinaryOp::Add,
//!   left: Box::new(Expr::Number(2.0)),
//!   right: Box::new(Expr::Number(3.0)),
//! })]);
//!
//! let mut engine = Engine::new();
//! assert_eq!(engine.evaluate(&program).unwrap(), Value::Number(5.0));
//! ```

mod array;
pub mod ast;
mod builtins;
pub mod convert;
mod engine;
mod env;
mod error;
mod exec;
mod function;
mod handle;
mod heap;
mod intrinsics;
mod object;
mod object_ops;
mod property;
pub mod strict;
mod value;

pub use engine::{Engine, HostValue};
pub use error::{EarlyError, EarlyErrorKind, EngineError};
pub use exec::Completion;
pub use function::NativeFn;
pub use handle::{GcEnv, GcObject, RootId};
pub use heap::{Heap, PersistentRoot};
pub use intrinsics::ErrorKind;
pub use property::{Property, PropertyKey, PropertyKind, PropertyPatch};
pub use value::{JsStr, Value};
