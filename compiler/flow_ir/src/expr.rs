//! The typed expression tree the frontend hands to the lowering pass.
//!
//! Every node is a kind plus a static type, children are [`ExprId`] indices
//! or flat ranges, and node identity *is* the index — the frontend shares a
//! sub-expression by reusing its `ExprId`, which is what the per-lambda CSE
//! keys on.
//!
//! The enum is closed over the kinds the schema admits. Kinds the pass does
//! not translate (blocks, loops, switches, …) are still representable so the
//! pass can reject them with a diagnostic instead of silently dropping them.

use crate::{
    BindingRange, ExprId, ExprRange, InitRange, LiteralId, MethodId, Name, NameRange, TypeId,
};

/// Expression node kinds.
///
/// All children are indices; the enum is `Copy` so the lowering pass can
/// copy a kind out of the arena before dispatching on it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    /// Bound lambda parameter. One node per (lambda, parameter); body
    /// occurrences reference the same node.
    Parameter(Name),

    /// Frontend-produced constant; payload lives in the arena's literal pool.
    Literal(LiteralId),

    /// `left op right`, including compound assignment and `ArrayIndex`.
    Binary { op: BinaryOp, left: ExprId, right: ExprId },

    /// `op operand`.
    Unary { op: UnaryOp, operand: ExprId },

    /// Ternary conditional: `test ? then_branch : else_branch`.
    Conditional { test: ExprId, then_branch: ExprId, else_branch: ExprId },

    /// Member access. `target == ExprId::INVALID` marks a static or
    /// closed-over member, which the pass captures as a constant.
    Member { target: ExprId, member: Name },

    /// Method call. `target == ExprId::INVALID` marks a static call.
    Call { target: ExprId, method: MethodId, args: ExprRange },

    /// Constructor call. A non-empty `members` list is the anonymous
    /// object-initialiser short form: `members[i]` is assigned `args[i]`.
    New { args: ExprRange, members: NameRange },

    /// Array literal: `new T[] { e0, e1, … }`.
    NewArrayInit { elements: ExprRange },

    /// Array allocation by bounds: `new T[n, m]`.
    NewArrayBounds { bounds: ExprRange },

    /// Object initialiser over an inner `New`: `new T(…) { M = e, … }`.
    MemberInit { new_expr: ExprId, bindings: BindingRange },

    /// Collection initialiser over an inner `New`. Only the empty form is
    /// translatable.
    ListInit { new_expr: ExprId, inits: InitRange },

    /// Parameterised body. `params` reference [`ExprKind::Parameter`] nodes.
    Lambda { params: ExprRange, body: ExprId },

    /// Quotation marking its child lambda as data to be lowered, not
    /// invoked. The driver matches on this to find lambdas; `visit` sees
    /// straight through it.
    Quote(ExprId),

    /// Indexer access. `object == ExprId::INVALID` for static indexers;
    /// `indexer == Name::EMPTY` when the indexer is unnamed.
    Index { object: ExprId, indexer: Name, args: ExprRange },

    // Kinds the schema admits but the pass rejects with
    // `UnsupportedExpression`.
    Block(ExprRange),
    Switch { subject: ExprId },
    Loop { body: ExprId },
    TryCatch { body: ExprId },
    Goto(Name),
    Label(Name),
    TypeIs { operand: ExprId, tested: TypeId },
    Default,
    Invoke { target: ExprId, args: ExprRange },
    Dynamic,
    DebugInfo,
}

impl ExprKind {
    /// Stable tag used in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            ExprKind::Parameter(_) => "Parameter",
            ExprKind::Literal(_) => "Constant",
            ExprKind::Binary { .. } => "Binary",
            ExprKind::Unary { .. } => "Unary",
            ExprKind::Conditional { .. } => "Conditional",
            ExprKind::Member { .. } => "MemberAccess",
            ExprKind::Call { .. } => "MethodCall",
            ExprKind::New { .. } => "New",
            ExprKind::NewArrayInit { .. } => "NewArrayInit",
            ExprKind::NewArrayBounds { .. } => "NewArrayBounds",
            ExprKind::MemberInit { .. } => "MemberInit",
            ExprKind::ListInit { .. } => "ListInit",
            ExprKind::Lambda { .. } => "Lambda",
            ExprKind::Quote(_) => "Quote",
            ExprKind::Index { .. } => "Index",
            ExprKind::Block(_) => "Block",
            ExprKind::Switch { .. } => "Switch",
            ExprKind::Loop { .. } => "Loop",
            ExprKind::TryCatch { .. } => "TryCatch",
            ExprKind::Goto(_) => "Goto",
            ExprKind::Label(_) => "Label",
            ExprKind::TypeIs { .. } => "TypeIs",
            ExprKind::Default => "Default",
            ExprKind::Invoke { .. } => "Invoke",
            ExprKind::Dynamic => "Dynamic",
            ExprKind::DebugInfo => "DebugInfo",
        }
    }
}

/// Binary operators, mirroring the binary opcodes one-to-one.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    And,
    Or,
    ExclusiveOr,
    LeftShift,
    RightShift,
    AndAlso,
    OrElse,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayIndex,
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    ModuloAssign,
    PowerAssign,
    AndAssign,
    OrAssign,
    ExclusiveOrAssign,
    LeftShiftAssign,
    RightShiftAssign,
}

/// Unary operators.
///
/// The last five are admitted by the schema but rejected by the pass.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Negate,
    NegateChecked,
    UnaryPlus,
    Not,
    OnesComplement,
    Increment,
    Decrement,
    PreIncrementAssign,
    PreDecrementAssign,
    PostIncrementAssign,
    PostDecrementAssign,
    Convert,
    ConvertChecked,
    TypeAs,
    ArrayLength,
    Throw,
    Unbox,
    IsTrue,
    IsFalse,
}

/// Opaque constant payload.
///
/// Floats are stored as bits so `Value` is `Eq + Hash`; strings are interned.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(Name),
}

impl Value {
    /// Wrap an `f64` as bits.
    pub fn float(v: f64) -> Self {
        Value::Float(v.to_bits())
    }

    /// Recover the `f64` payload, if this is a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

/// Reflected method handle carried by `Call` nodes and `Call` instructions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MethodRef {
    /// Declaring type.
    pub owner: TypeId,
    /// Method name.
    pub name: Name,
}

/// One binding of an object initialiser.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MemberBinding {
    /// `Member = value` — the only translatable form.
    Assign { member: Name, value: ExprId },
    /// Nested object binding: `Member = { … }`. Rejected by the pass.
    MemberMember { member: Name, bindings: BindingRange },
    /// Nested collection binding: `Member = [ … ]`. Rejected by the pass.
    MemberList { member: Name, inits: InitRange },
}

/// One element initialiser of a collection initialiser.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ElementInit {
    pub args: ExprRange,
}
