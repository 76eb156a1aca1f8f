//! The three-address instruction IR.
//!
//! One lambda lowers to one [`InstrSeq`]: a variable arena plus an ordered
//! instruction list. Temporaries carry an [`InstrId`] back-reference to the
//! instruction that defines them (its first destination), which keeps the
//! instruction↔variable cycle index-shaped.

use smallvec::SmallVec;

use crate::arena::to_u32;
use crate::expr::{BinaryOp, Value};
use crate::{InstrId, MethodId, Name, TypeId, VarId};

/// Closed catalogue of IR operations.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Opcode {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Negate,
    Increment,
    Decrement,
    OnesComplement,
    // Bitwise
    And,
    Or,
    ExclusiveOr,
    Not,
    LeftShift,
    RightShift,
    // Short-circuit boolean
    AndAlso,
    OrElse,
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Assignment
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
    PreIncrementAssign,
    PreDecrementAssign,
    PostIncrementAssign,
    PostDecrementAssign,
    // Structured
    Conditional,
    Convert,
    ArrayIndex,
    Index,
    Call,
    New,
    NewArrayInit,
    NewArrayBounds,
    MemberRead,
    MemberWrite,
}

impl Opcode {
    /// The opcode for a frontend binary operator. The map is total: every
    /// `BinaryOp` has exactly one opcode.
    pub fn of_binary(op: BinaryOp) -> Opcode {
        match op {
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Subtract => Opcode::Subtract,
            BinaryOp::Multiply => Opcode::Multiply,
            BinaryOp::Divide => Opcode::Divide,
            BinaryOp::Modulo => Opcode::Modulo,
            BinaryOp::Power => Opcode::Power,
            BinaryOp::And => Opcode::And,
            BinaryOp::Or => Opcode::Or,
            BinaryOp::ExclusiveOr => Opcode::ExclusiveOr,
            BinaryOp::LeftShift => Opcode::LeftShift,
            BinaryOp::RightShift => Opcode::RightShift,
            BinaryOp::AndAlso => Opcode::AndAlso,
            BinaryOp::OrElse => Opcode::OrElse,
            BinaryOp::Equal => Opcode::Equal,
            BinaryOp::NotEqual => Opcode::NotEqual,
            BinaryOp::LessThan => Opcode::LessThan,
            BinaryOp::LessThanOrEqual => Opcode::LessThanOrEqual,
            BinaryOp::GreaterThan => Opcode::GreaterThan,
            BinaryOp::GreaterThanOrEqual => Opcode::GreaterThanOrEqual,
            BinaryOp::ArrayIndex => Opcode::ArrayIndex,
            BinaryOp::Assign => Opcode::Assign,
            BinaryOp::AddAssign => Opcode::AddAssign,
            BinaryOp::SubtractAssign => Opcode::SubtractAssign,
            BinaryOp::MultiplyAssign => Opcode::MultiplyAssign,
            BinaryOp::DivideAssign => Opcode::DivideAssign,
            BinaryOp::ModuloAssign => Opcode::ModuloAssign,
            BinaryOp::PowerAssign => Opcode::PowerAssign,
            BinaryOp::AndAssign => Opcode::AndAssign,
            BinaryOp::OrAssign => Opcode::OrAssign,
            BinaryOp::ExclusiveOrAssign => Opcode::ExclusiveOrAssign,
            BinaryOp::LeftShiftAssign => Opcode::LeftShiftAssign,
            BinaryOp::RightShiftAssign => Opcode::RightShiftAssign,
        }
    }

    /// Mnemonic used in rendered instruction listings.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "Add",
            Opcode::Subtract => "Subtract",
            Opcode::Multiply => "Multiply",
            Opcode::Divide => "Divide",
            Opcode::Modulo => "Modulo",
            Opcode::Power => "Power",
            Opcode::Negate => "Negate",
            Opcode::Increment => "Increment",
            Opcode::Decrement => "Decrement",
            Opcode::OnesComplement => "OnesComplement",
            Opcode::And => "And",
            Opcode::Or => "Or",
            Opcode::ExclusiveOr => "ExclusiveOr",
            Opcode::Not => "Not",
            Opcode::LeftShift => "LeftShift",
            Opcode::RightShift => "RightShift",
            Opcode::AndAlso => "AndAlso",
            Opcode::OrElse => "OrElse",
            Opcode::Equal => "Equal",
            Opcode::NotEqual => "NotEqual",
            Opcode::LessThan => "LessThan",
            Opcode::LessThanOrEqual => "LessThanOrEqual",
            Opcode::GreaterThan => "GreaterThan",
            Opcode::GreaterThanOrEqual => "GreaterThanOrEqual",
            Opcode::Assign => "Assign",
            Opcode::AddAssign => "AddAssign",
            Opcode::SubtractAssign => "SubtractAssign",
            Opcode::MultiplyAssign => "MultiplyAssign",
            Opcode::DivideAssign => "DivideAssign",
            Opcode::ModuloAssign => "ModuloAssign",
            Opcode::PowerAssign => "PowerAssign",
            Opcode::AndAssign => "AndAssign",
            Opcode::OrAssign => "OrAssign",
            Opcode::ExclusiveOrAssign => "ExclusiveOrAssign",
            Opcode::LeftShiftAssign => "LeftShiftAssign",
            Opcode::RightShiftAssign => "RightShiftAssign",
            Opcode::PreIncrementAssign => "PreIncrementAssign",
            Opcode::PreDecrementAssign => "PreDecrementAssign",
            Opcode::PostIncrementAssign => "PostIncrementAssign",
            Opcode::PostDecrementAssign => "PostDecrementAssign",
            Opcode::Conditional => "Conditional",
            Opcode::Convert => "Convert",
            Opcode::ArrayIndex => "ArrayIndex",
            Opcode::Index => "Index",
            Opcode::Call => "Call",
            Opcode::New => "New",
            Opcode::NewArrayInit => "NewArrayInit",
            Opcode::NewArrayBounds => "NewArrayBounds",
            Opcode::MemberRead => "MemberRead",
            Opcode::MemberWrite => "MemberWrite",
        }
    }

    /// Normative `(sources, destinations)` counts for opcodes with fixed
    /// arity. `None` for variable-arity opcodes (`Call`, `New`, …) and for
    /// `Add`, whose unary-plus lowering legitimately produces a single
    /// source.
    pub fn fixed_arity(self) -> Option<(usize, usize)> {
        match self {
            // Unary-plus lowers to a one-source Add.
            Opcode::Add => None,

            Opcode::Subtract
            | Opcode::Multiply
            | Opcode::Divide
            | Opcode::Modulo
            | Opcode::Power
            | Opcode::And
            | Opcode::Or
            | Opcode::ExclusiveOr
            | Opcode::LeftShift
            | Opcode::RightShift
            | Opcode::AndAlso
            | Opcode::OrElse
            | Opcode::Equal
            | Opcode::NotEqual
            | Opcode::LessThan
            | Opcode::LessThanOrEqual
            | Opcode::GreaterThan
            | Opcode::GreaterThanOrEqual
            | Opcode::Assign
            | Opcode::AddAssign
            | Opcode::SubtractAssign
            | Opcode::MultiplyAssign
            | Opcode::DivideAssign
            | Opcode::ModuloAssign
            | Opcode::PowerAssign
            | Opcode::AndAssign
            | Opcode::OrAssign
            | Opcode::ExclusiveOrAssign
            | Opcode::LeftShiftAssign
            | Opcode::RightShiftAssign
            | Opcode::ArrayIndex => Some((2, 1)),

            Opcode::Negate
            | Opcode::Increment
            | Opcode::Decrement
            | Opcode::OnesComplement
            | Opcode::Not
            | Opcode::Convert
            | Opcode::PreIncrementAssign
            | Opcode::PreDecrementAssign
            | Opcode::PostIncrementAssign
            | Opcode::PostDecrementAssign => Some((1, 1)),

            Opcode::Conditional => Some((3, 1)),
            Opcode::MemberRead => Some((2, 1)),
            // host and name constant are destinations; the value is the source.
            Opcode::MemberWrite => Some((1, 2)),

            Opcode::Index
            | Opcode::Call
            | Opcode::New
            | Opcode::NewArrayInit
            | Opcode::NewArrayBounds => None,
        }
    }
}

/// A value slot referenced by instructions.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variable {
    /// Bound lambda parameter.
    Parameter { name: Name, ty: TypeId },
    /// Immutable constant, from the frontend or from constant capture.
    Constant { ty: TypeId, value: Value },
    /// Temporary defined by exactly one instruction; `def`'s first
    /// destination is this variable.
    Temp { ty: TypeId, def: InstrId },
}

impl Variable {
    /// Static type of the slot.
    pub fn ty(&self) -> TypeId {
        match self {
            Variable::Parameter { ty, .. }
            | Variable::Constant { ty, .. }
            | Variable::Temp { ty, .. } => *ty,
        }
    }

    /// Returns `true` for temporaries.
    pub fn is_temp(&self) -> bool {
        matches!(self, Variable::Temp { .. })
    }
}

/// Source operand list; three covers everything but calls and constructors.
pub type Sources = SmallVec<[VarId; 3]>;
/// Destination operand list; two covers `MemberWrite`.
pub type Destinations = SmallVec<[VarId; 2]>;

/// One three-address instruction.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Instruction {
    pub op: Opcode,
    pub sources: Sources,
    pub destinations: Destinations,
    /// Populated only when `op == Opcode::Call`.
    pub method: Option<MethodId>,
}

impl Instruction {
    /// The result slot: the first destination, when there is one.
    pub fn first_destination(&self) -> Option<VarId> {
        self.destinations.first().copied()
    }
}

/// One lambda's lowering output: a variable arena plus the ordered
/// instruction list.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct InstrSeq {
    vars: Vec<Variable>,
    instrs: Vec<Instruction>,
}

impl InstrSeq {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a variable slot.
    pub fn push_var(&mut self, var: Variable) -> VarId {
        let id = VarId::new(to_u32(self.vars.len(), "variables"));
        self.vars.push(var);
        id
    }

    /// Append an instruction.
    pub fn push_instr(&mut self, instr: Instruction) -> InstrId {
        let id = InstrId::new(to_u32(self.instrs.len(), "instructions"));
        self.instrs.push(instr);
        id
    }

    /// The id the next pushed instruction will receive. Used to seed a
    /// temp's `def` back-reference before the instruction exists.
    pub fn next_instr_id(&self) -> InstrId {
        InstrId::new(to_u32(self.instrs.len(), "instructions"))
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.index()]
    }

    pub fn instr(&self, id: InstrId) -> &Instruction {
        &self.instrs[id.index()]
    }

    /// All variables, in allocation order.
    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    /// All instructions, in emission order.
    pub fn instrs(&self) -> &[Instruction] {
        &self.instrs
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Returns `true` if no instructions were emitted.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
}
