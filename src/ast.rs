//! The input syntax tree.
//!
//! The concrete lexer/grammar is an external collaborator: a generated parser
//! is expected to produce these nodes. The types are deliberately plain enums
//! so collaborators (and tests) can construct trees directly.

use std::rc::Rc;

/// A complete program (script or module-like unit).
#[derive(Debug, Clone)]
pub struct Program {
  pub body: Vec<Stmt>,
}

impl Program {
  pub fn new(body: Vec<Stmt>) -> Self {
    Self { body }
  }
}

/// A function definition: shared by declarations, expressions and accessor
/// bodies in object literals.
#[derive(Debug, Clone)]
pub struct FunctionDef {
  pub name: Option<String>,
  pub params: Vec<String>,
  pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
  Empty,
  Expr(Expr),
  /// `var` declarations (one statement may declare several names).
  VarDecl(Vec<(String, Option<Expr>)>),
  FunctionDecl(Rc<FunctionDef>),
  Block(Vec<Stmt>),
  If {
    test: Expr,
    consequent: Box<Stmt>,
    alternate: Option<Box<Stmt>>,
  },
  While {
    test: Expr,
    body: Box<Stmt>,
  },
  DoWhile {
    body: Box<Stmt>,
    test: Expr,
  },
  For {
    init: Option<ForInit>,
    test: Option<Expr>,
    update: Option<Expr>,
    body: Box<Stmt>,
  },
  /// `for (target in object) body`; `target` is an identifier or member
  /// expression.
  ForIn {
    target: Expr,
    object: Expr,
    body: Box<Stmt>,
  },
  Return(Option<Expr>),
  Break(Option<String>),
  Continue(Option<String>),
  Labeled {
    label: String,
    body: Box<Stmt>,
  },
  Throw(Expr),
  Try {
    block: Vec<Stmt>,
    catch: Option<CatchClause>,
    finally: Option<Vec<Stmt>>,
  },
  Switch {
    discriminant: Expr,
    cases: Vec<SwitchCase>,
  },
  With {
    object: Expr,
    body: Box<Stmt>,
  },
}

#[derive(Debug, Clone)]
pub enum ForInit {
  Expr(Expr),
  VarDecl(Vec<(String, Option<Expr>)>),
}

#[derive(Debug, Clone)]
pub struct CatchClause {
  pub param: String,
  pub body: Vec<Stmt>,
}

/// One arm of a `switch`; `test == None` is the `default` clause.
#[derive(Debug, Clone)]
pub struct SwitchCase {
  pub test: Option<Expr>,
  pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Expr {
  Null,
  Bool(bool),
  Number(f64),
  Str(String),
  /// An array literal; `None` elements are holes (elisions).
  ArrayLit(Vec<Option<Expr>>),
  ObjectLit(Vec<PropertyInit>),
  Function(Rc<FunctionDef>),
  Ident(String),
  This,
  Member {
    object: Box<Expr>,
    key: MemberKey,
  },
  Call {
    callee: Box<Expr>,
    args: Vec<Expr>,
  },
  New {
    callee: Box<Expr>,
    args: Vec<Expr>,
  },
  Unary {
    op: UnaryOp,
    operand: Box<Expr>,
  },
  Update {
    op: UpdateOp,
    prefix: bool,
    target: Box<Expr>,
  },
  Binary {
    op: BinaryOp,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  Logical {
    op: LogicalOp,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  Conditional {
    test: Box<Expr>,
    consequent: Box<Expr>,
    alternate: Box<Expr>,
  },
  /// Plain (`op == None`) or compound assignment.
  Assign {
    op: Option<BinaryOp>,
    target: Box<Expr>,
    value: Box<Expr>,
  },
  /// Comma operator.
  Seq(Vec<Expr>),
}

#[derive(Debug, Clone)]
pub struct PropertyInit {
  pub key: String,
  pub kind: PropertyInitKind,
}

#[derive(Debug, Clone)]
pub enum PropertyInitKind {
  Data(Expr),
  Getter(Rc<FunctionDef>),
  Setter(Rc<FunctionDef>),
}

#[derive(Debug, Clone)]
pub enum MemberKey {
  /// `obj.name`
  Static(String),
  /// `obj[expr]`
  Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Neg,
  Plus,
  Not,
  BitNot,
  TypeOf,
  Void,
  Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
  Increment,
  Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  Lt,
  Gt,
  Le,
  Ge,
  LooseEq,
  LooseNe,
  StrictEq,
  StrictNe,
  BitAnd,
  BitOr,
  BitXor,
  Shl,
  Shr,
  UShr,
  In,
  InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
  And,
  Or,
}
