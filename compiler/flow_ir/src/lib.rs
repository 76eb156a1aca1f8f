//! Flow IR — shared data model of the composition compiler's lowering pass.
//!
//! This crate contains everything both sides of the pass agree on:
//! - [`Name`]s and the shared [`StringInterner`]
//! - the typed expression tree ([`ExprArena`], [`ExprKind`]) the frontend
//!   produces
//! - the three-address IR ([`Opcode`], [`Variable`], [`Instruction`],
//!   [`InstrSeq`]) the pass emits
//! - the logical dataflow graph ([`LGraph`], [`LVertex`]) the sequences are
//!   attached to
//! - textual rendering of both worlds for diagnostics
//!
//! # Design
//!
//! - **Intern everything**: strings become `Name(u32)`, types become
//!   `TypeId(u32)`.
//! - **Flatten everything**: no boxed children; nodes, variables, and
//!   instructions are `u32` indices into contiguous arrays, and the
//!   temp → defining-instruction back-reference is an index, not a pointer.
//! - **Node identity is the index**: the frontend shares a sub-expression by
//!   reusing its [`ExprId`], which is exactly what per-lambda CSE keys on.

mod arena;
mod expr;
mod graph;
mod ids;
mod instr;
mod interner;
mod name;
pub mod render;
mod types;

pub use arena::ExprArena;
pub use expr::{BinaryOp, ElementInit, ExprKind, MemberBinding, MethodRef, UnaryOp, Value};
pub use graph::{LGraph, LVertex};
pub use ids::{
    BindingRange, ExprId, ExprRange, InitRange, InstrId, LiteralId, MethodId, NameRange, VarId,
    VertexId,
};
pub use instr::{Destinations, InstrSeq, Instruction, Opcode, Sources, Variable};
pub use interner::{SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use types::{Ty, TypeId, TypePool};
