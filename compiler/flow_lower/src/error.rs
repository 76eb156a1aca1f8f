//! Error taxonomy of the lowering pass.
//!
//! Both variants are fatal for the whole graph: there are no partial
//! results, and a caller that sees an error must discard every instruction
//! sequence attached during the failed build.

use thiserror::Error;

/// Fatal lowering failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    /// An expression kind the pass does not translate, a nested member
    /// binding, a non-empty collection initialiser, or a closed member
    /// access the resolver could not capture.
    #[error("unsupported expression kind `{kind}`: {rendering}")]
    UnsupportedExpression {
        /// Stable kind tag of the offending node.
        kind: &'static str,
        /// One-line rendering of the offending node.
        rendering: String,
    },

    /// A node missing a required child, or a structurally inconsistent
    /// graph handed to the driver.
    #[error("malformed `{kind}` node: {detail}")]
    MalformedNode {
        kind: &'static str,
        detail: &'static str,
    },
}
