//! Compile-time capture of closed member accesses.
//!
//! A member access with no target is a static or closed-over member. The
//! source platform evaluated such nodes by compiling and invoking a nullary
//! lambda; Rust has no dynamic compilation, so the frontend pre-folds the
//! values and hands the pass a [`ConstResolver`]. A resolver that cannot
//! produce a value answers `None`, and the pass reports the node as
//! unsupported — never as an evaluation error.

use rustc_hash::FxHashMap;

use flow_ir::{ExprArena, ExprId, ExprKind, Name, Value};

/// Supplies compile-time values for closed member accesses.
pub trait ConstResolver {
    /// Attempt to produce the value of `expr`.
    ///
    /// Implementations must not panic; `None` means "not evaluable" and is
    /// mapped to `UnsupportedExpression` by the pass.
    fn resolve(&self, arena: &ExprArena, expr: ExprId) -> Option<Value>;
}

/// Resolver that captures nothing. Every closed member access fails.
#[derive(Default)]
pub struct NoCapture;

impl ConstResolver for NoCapture {
    fn resolve(&self, _arena: &ExprArena, _expr: ExprId) -> Option<Value> {
        None
    }
}

/// Pre-folded closed-over values, keyed by member name.
///
/// The usual frontend strategy: it knows the captured environment, folds
/// each closed member to a [`Value`] while building the tree, and binds the
/// results here.
#[derive(Default)]
pub struct CapturedBindings {
    values: FxHashMap<Name, Value>,
}

impl CapturedBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a member name to its captured value.
    pub fn bind(&mut self, member: Name, value: Value) -> &mut Self {
        self.values.insert(member, value);
        self
    }
}

impl ConstResolver for CapturedBindings {
    fn resolve(&self, arena: &ExprArena, expr: ExprId) -> Option<Value> {
        match *arena.kind(expr) {
            ExprKind::Member { target, member } if !target.is_valid() => {
                self.values.get(&member).copied()
            }
            _ => None,
        }
    }
}
