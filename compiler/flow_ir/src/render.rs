//! Compact textual rendering of expressions and instruction listings.
//!
//! Used by diagnostics (the offending-node rendering attached to lowering
//! errors) and by tests comparing lowering output structurally.

use std::fmt::Write as _;

use crate::expr::{ExprKind, Value};
use crate::instr::{InstrSeq, Opcode, Variable};
use crate::{ExprArena, ExprId, StringLookup, VarId};

/// Cap on recursion depth; deeper sub-trees render as `…`.
const MAX_DEPTH: usize = 8;

/// Render one expression node (and its sub-tree) on a single line.
pub fn render_expr(arena: &ExprArena, id: ExprId) -> String {
    let mut out = String::new();
    write_expr(arena, id, 0, &mut out);
    out
}

fn write_expr(arena: &ExprArena, id: ExprId, depth: usize, out: &mut String) {
    if !id.is_valid() {
        out.push_str("<missing>");
        return;
    }
    if depth > MAX_DEPTH {
        out.push('…');
        return;
    }
    let names = arena.interner();

    match *arena.kind(id) {
        ExprKind::Parameter(name) => out.push_str(names.lookup(name)),
        ExprKind::Literal(lit) => write_value(arena.literal(lit), names, out),
        ExprKind::Binary { op, left, right } => {
            out.push('(');
            write_expr(arena, left, depth + 1, out);
            let _ = write!(out, " {op:?} ");
            write_expr(arena, right, depth + 1, out);
            out.push(')');
        }
        ExprKind::Unary { op, operand } => {
            let _ = write!(out, "{op:?}(");
            write_expr(arena, operand, depth + 1, out);
            out.push(')');
        }
        ExprKind::Conditional { test, then_branch, else_branch } => {
            out.push('(');
            write_expr(arena, test, depth + 1, out);
            out.push_str(" ? ");
            write_expr(arena, then_branch, depth + 1, out);
            out.push_str(" : ");
            write_expr(arena, else_branch, depth + 1, out);
            out.push(')');
        }
        ExprKind::Member { target, member } => {
            if target.is_valid() {
                write_expr(arena, target, depth + 1, out);
            } else {
                out.push_str("<static>");
            }
            out.push('.');
            out.push_str(names.lookup(member));
        }
        ExprKind::Call { target, method, args } => {
            if target.is_valid() {
                write_expr(arena, target, depth + 1, out);
                out.push('.');
            }
            out.push_str(names.lookup(arena.method(method).name));
            write_expr_list(arena, arena.expr_list(args), depth, out);
        }
        ExprKind::New { args, members } => {
            out.push_str("new");
            write_expr_list(arena, arena.expr_list(args), depth, out);
            if !members.is_empty() {
                out.push_str(" {");
                for (i, &name) in arena.member_names(members).iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push(' ');
                    out.push_str(names.lookup(name));
                }
                out.push_str(" }");
            }
        }
        ExprKind::NewArrayInit { elements } => {
            out.push_str("new[]");
            write_expr_list(arena, arena.expr_list(elements), depth, out);
        }
        ExprKind::NewArrayBounds { bounds } => {
            out.push_str("new[bounds]");
            write_expr_list(arena, arena.expr_list(bounds), depth, out);
        }
        ExprKind::MemberInit { new_expr, .. } => {
            write_expr(arena, new_expr, depth + 1, out);
            out.push_str(" { … }");
        }
        ExprKind::ListInit { new_expr, .. } => {
            write_expr(arena, new_expr, depth + 1, out);
            out.push_str(" [ … ]");
        }
        ExprKind::Lambda { params, body } => {
            write_expr_list(arena, arena.expr_list(params), depth, out);
            out.push_str(" => ");
            write_expr(arena, body, depth + 1, out);
        }
        ExprKind::Quote(inner) => {
            out.push_str("quote ");
            write_expr(arena, inner, depth + 1, out);
        }
        ExprKind::Index { object, indexer, args } => {
            if object.is_valid() {
                write_expr(arena, object, depth + 1, out);
            } else {
                out.push_str("<static>");
            }
            let _ = write!(out, ".{}[", names.lookup(indexer));
            for (i, &arg) in arena.expr_list(args).iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(arena, arg, depth + 1, out);
            }
            out.push(']');
        }
        // Untranslatable kinds render as their tag; the diagnostic already
        // carries the tag separately, this is just context.
        ref other => {
            let _ = write!(out, "<{}>", other.tag());
        }
    }
}

fn write_expr_list(arena: &ExprArena, items: &[ExprId], depth: usize, out: &mut String) {
    out.push('(');
    for (i, &item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(arena, item, depth + 1, out);
    }
    out.push(')');
}

fn write_value(value: &Value, names: &impl StringLookup, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Float(bits) => {
            let _ = write!(out, "{}", f64::from_bits(*bits));
        }
        Value::Str(name) => {
            let _ = write!(out, "\"{}\"", names.lookup(*name));
        }
    }
}

/// Variables are named the way listings name them: parameters by name,
/// constants by value, temporaries as `t<index>`.
fn write_var(seq: &InstrSeq, id: VarId, names: &impl StringLookup, out: &mut String) {
    match seq.var(id) {
        Variable::Parameter { name, .. } => out.push_str(names.lookup(*name)),
        Variable::Constant { value, .. } => write_value(value, names, out),
        Variable::Temp { .. } => {
            let _ = write!(out, "t{}", id.raw());
        }
    }
}

/// Render a whole instruction sequence, one instruction per line.
///
/// The shape is `dests = Mnemonic(sources)`, with the method name appended
/// for calls. Temp numbering follows variable ids, so two structurally
/// identical sequences render identically.
pub fn render_seq(seq: &InstrSeq, names: &impl StringLookup) -> String {
    let mut out = String::new();
    for instr in seq.instrs() {
        if !out.is_empty() {
            out.push('\n');
        }
        for (i, &dest) in instr.destinations.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_var(seq, dest, names, &mut out);
        }
        if !instr.destinations.is_empty() {
            out.push_str(" = ");
        }
        out.push_str(instr.op.mnemonic());
        out.push('(');
        for (i, &src) in instr.sources.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_var(seq, src, names, &mut out);
        }
        out.push(')');
        if instr.op == Opcode::Call {
            out.push_str(" ; method");
        }
    }
    out
}
