//! Debug-mode validation of lowered instruction sequences.
//!
//! Checked after every lambda in debug builds, before the sequence is
//! attached to its vertex:
//! - every temp used as a source is defined by an earlier instruction whose
//!   first destination is that temp
//! - fixed-arity opcodes carry exactly their normative operand counts
//! - `Add` carries one source (unary plus) or two
//! - every `Call` carries a method reference
//! - every temp's back-reference points at an in-bounds instruction that
//!   really defines it

use flow_ir::{InstrSeq, Opcode, VarId, Variable};

/// Assert all sequence invariants. Panics with a descriptive message on the
/// first violation; a no-op in release builds except through tests.
pub fn check(seq: &InstrSeq) {
    for (index, instr) in seq.instrs().iter().enumerate() {
        // Operand arity.
        if let Some((sources, destinations)) = instr.op.fixed_arity() {
            debug_assert!(
                instr.sources.len() == sources && instr.destinations.len() == destinations,
                "instr {index} ({}) has {}/{} operands, expected {sources}/{destinations}",
                instr.op.mnemonic(),
                instr.sources.len(),
                instr.destinations.len(),
            );
        }
        if instr.op == Opcode::Add {
            debug_assert!(
                matches!(instr.sources.len(), 1 | 2) && instr.destinations.len() == 1,
                "instr {index} (Add) has {}/{} operands, expected 1|2/1",
                instr.sources.len(),
                instr.destinations.len(),
            );
        }

        // Calls carry their reflected method.
        if instr.op == Opcode::Call {
            debug_assert!(instr.method.is_some(), "instr {index} (Call) has no method reference");
        } else {
            debug_assert!(
                instr.method.is_none(),
                "instr {index} ({}) carries a method reference",
                instr.op.mnemonic(),
            );
        }

        // Temp sources must be defined earlier.
        for &source in &instr.sources {
            check_use(seq, source, index);
        }
        // Destination temps are either defined by this instruction or are
        // uses of earlier results (a MemberWrite host is a destination slot
        // but was defined by its New).
        for &dest in &instr.destinations {
            check_use_or_def(seq, dest, index);
        }
    }

    // Every temp has a defining instruction whose first destination is it.
    for (index, var) in seq.vars().iter().enumerate() {
        if let Variable::Temp { def, .. } = var {
            let id = VarId::new(u32::try_from(index).unwrap_or(u32::MAX));
            debug_assert!(
                def.index() < seq.len(),
                "temp t{index} back-reference {def:?} is out of bounds",
            );
            debug_assert!(
                seq.instr(*def).first_destination() == Some(id),
                "temp t{index} is not the first destination of its defining instruction",
            );
        }
    }
}

/// A temp appearing as a source must have been defined strictly earlier.
fn check_use(seq: &InstrSeq, var: VarId, at: usize) {
    if let Variable::Temp { def, .. } = seq.var(var) {
        debug_assert!(
            def.index() < at,
            "instr {at} uses temp defined at {} (must be earlier)",
            def.index(),
        );
    }
}

/// A temp in a destination slot is either being defined here or must already
/// exist.
fn check_use_or_def(seq: &InstrSeq, var: VarId, at: usize) {
    if let Variable::Temp { def, .. } = seq.var(var) {
        debug_assert!(
            def.index() <= at,
            "instr {at} writes temp defined at {} (must not be later)",
            def.index(),
        );
    }
}
