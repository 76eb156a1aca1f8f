//! Lowering pass of the Flow composition compiler.
//!
//! Consumes the logical graph built over the frontend's typed expression
//! trees and attaches a three-address instruction sequence to every vertex
//! for every quoted lambda it owns.
//!
//! # Pipeline position
//!
//! ```text
//! frontend trees → graph builder → **lowering (this crate)** → code generation
//! ```
//!
//! # What happens during lowering
//!
//! 1. **Driver** (`build`): finds quoted lambdas among each vertex origin's
//!    arguments, skipping routing lambdas owned by other vertices.
//! 2. **Translation** (`lower_lambda`): a structural walk emitting one
//!    instruction per operation, with per-lambda identity-keyed CSE and
//!    constant dedup.
//! 3. **Constant capture** (`resolve`): closed member accesses become
//!    constants through the caller's [`ConstResolver`]; anything the
//!    resolver cannot produce fails the build.
//! 4. **Validation** (`validate`): debug builds assert the structural
//!    invariants of every sequence before it is attached.
//!
//! The pass is a translator, not an optimizer: no folding beyond constant
//! capture, no dead-code elimination, no inlining.

mod error;
mod lower;
mod resolve;
pub mod validate;

#[cfg(test)]
mod tests;

pub use error::LowerError;
pub use lower::{build, lower_lambda};
pub use resolve::{CapturedBindings, ConstResolver, NoCapture};
