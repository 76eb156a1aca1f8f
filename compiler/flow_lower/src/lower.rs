//! Expression tree → three-address IR lowering.
//!
//! The driver walks every vertex of the logical graph, finds the quoted
//! lambdas among the origin call's arguments, and lowers each into an
//! [`InstrSeq`] attached to the vertex. One [`Lowerer`] is constructed per
//! lambda; its caches (expression → instruction for CSE, constant dedup,
//! parameter registry) die with it, so nothing leaks between lambdas.
//!
//! Dispatch copies the node kind out of the arena before matching — the
//! kinds are `Copy` — so no borrow of the arena is held while the sequence
//! is being mutated.

use rustc_hash::FxHashMap;
use smallvec::smallvec;

use flow_ir::render::render_expr;
use flow_ir::{
    ExprArena, ExprId, ExprKind, InstrId, InstrSeq, Instruction, LGraph, MemberBinding, MethodId,
    Name, Opcode, Sources, TypeId, UnaryOp, Value, VarId, Variable,
};

use crate::resolve::ConstResolver;
use crate::LowerError;

/// Lower every eligible lambda of every vertex in the graph.
///
/// A vertex is eligible when it carries an originating call expression.
/// Each quoted-lambda argument of that call is lowered and attached under
/// the lambda's node id, except routing lambdas (a Symbol-typed parameter
/// plus a call body), which belong to another vertex.
///
/// On error the graph must be discarded: sequences attached before the
/// failure are not rolled back.
#[tracing::instrument(level = "debug", skip_all, fields(vertices = graph.len()))]
pub fn build<R: ConstResolver>(
    graph: &mut LGraph,
    arena: &ExprArena,
    env: &R,
) -> Result<(), LowerError> {
    for (vertex_id, vertex) in graph.iter_mut() {
        let origin = vertex.origin();
        if !origin.is_valid() {
            continue;
        }
        let ExprKind::Call { args, .. } = *arena.kind(origin) else {
            return Err(LowerError::MalformedNode {
                kind: arena.kind(origin).tag(),
                detail: "vertex origin is not a call expression",
            });
        };

        for &arg in arena.expr_list(args) {
            let ExprKind::Quote(lambda) = *arena.kind(arg) else {
                continue; // plain value argument
            };
            let ExprKind::Lambda { params, body } = *arena.kind(lambda) else {
                return Err(LowerError::MalformedNode {
                    kind: arena.kind(lambda).tag(),
                    detail: "quote does not wrap a lambda",
                });
            };

            if is_routing_lambda(arena, arena.expr_list(params), body) {
                tracing::trace!(
                    vertex = vertex_id.raw(),
                    lambda = lambda.raw(),
                    "skipping routing lambda"
                );
                continue;
            }

            let seq = lower_lambda(arena, env, lambda)?;
            tracing::trace!(
                vertex = vertex_id.raw(),
                lambda = lambda.raw(),
                instructions = seq.len(),
                "lowered lambda"
            );
            vertex.attach(lambda, seq);
        }
    }
    Ok(())
}

/// A lambda expresses cross-vertex routing — and is owned by another vertex —
/// when at least one parameter is Symbol-typed and its body is a call.
fn is_routing_lambda(arena: &ExprArena, params: &[ExprId], body: ExprId) -> bool {
    if !matches!(arena.kind(body), ExprKind::Call { .. }) {
        return false;
    }
    params.iter().any(|&p| arena.type_pool().is_symbol(arena.ty(p)))
}

/// Lower a single lambda node into a fresh instruction sequence.
///
/// Parameters are visited first so their variables exist in declaration
/// order, then the body. Debug builds validate the result before returning.
pub fn lower_lambda<R: ConstResolver>(
    arena: &ExprArena,
    env: &R,
    lambda: ExprId,
) -> Result<InstrSeq, LowerError> {
    let ExprKind::Lambda { params, body } = *arena.kind(lambda) else {
        return Err(LowerError::MalformedNode {
            kind: arena.kind(lambda).tag(),
            detail: "expected a lambda node",
        });
    };
    if !body.is_valid() {
        return Err(LowerError::MalformedNode {
            kind: "Lambda",
            detail: "lambda has no body",
        });
    }

    let mut lowerer = Lowerer::new(arena, env);
    for &param in arena.expr_list(params) {
        if !matches!(arena.kind(param), ExprKind::Parameter(_)) {
            return Err(LowerError::MalformedNode {
                kind: arena.kind(param).tag(),
                detail: "lambda parameter list entry is not a parameter node",
            });
        }
        lowerer.visit(param)?;
    }
    lowerer.visit(body)?;

    let seq = lowerer.finish();
    #[cfg(debug_assertions)]
    crate::validate::check(&seq);
    Ok(seq)
}

// ── Lowerer ─────────────────────────────────────────────────────────

/// Per-lambda lowering state.
///
/// All three caches are keyed by expression-node identity ([`ExprId`]), not
/// structural equality: the frontend shares a sub-expression by reusing its
/// node, and that sharing is what CSE honours. The caches are dropped with
/// the lowerer, which is the per-lambda reset the contract requires.
struct Lowerer<'a, R> {
    arena: &'a ExprArena,
    env: &'a R,
    seq: InstrSeq,
    /// CSE: node → instruction whose first destination holds its value.
    exprs: FxHashMap<ExprId, InstrId>,
    /// Constant dedup: node → constant variable.
    consts: FxHashMap<ExprId, VarId>,
    /// Parameter registry: node → parameter variable.
    params: FxHashMap<ExprId, VarId>,
}

impl<'a, R: ConstResolver> Lowerer<'a, R> {
    fn new(arena: &'a ExprArena, env: &'a R) -> Self {
        Self {
            arena,
            env,
            seq: InstrSeq::new(),
            exprs: FxHashMap::default(),
            consts: FxHashMap::default(),
            params: FxHashMap::default(),
        }
    }

    fn finish(self) -> InstrSeq {
        self.seq
    }

    // ── Emission helpers ────────────────────────────────────────

    /// Emit an instruction producing one temp, and remember it for CSE.
    fn emit(
        &mut self,
        node: ExprId,
        op: Opcode,
        sources: Sources,
        ty: TypeId,
        method: Option<MethodId>,
    ) -> VarId {
        let def = self.seq.next_instr_id();
        let dest = self.seq.push_var(Variable::Temp { ty, def });
        let instr = self.seq.push_instr(Instruction {
            op,
            sources,
            destinations: smallvec![dest],
            method,
        });
        self.exprs.insert(node, instr);
        dest
    }

    /// Emit a non-indexed member write: destinations `[host, name]`,
    /// source `[value]`. Produces no temp and is never CSE'd on its own —
    /// the owning `New`/`MemberInit` node is.
    fn emit_member_write(&mut self, host: VarId, member: Name, value: VarId) {
        let name = self.const_var(TypeId::STR, Value::Str(member));
        self.seq.push_instr(Instruction {
            op: Opcode::MemberWrite,
            sources: smallvec![value],
            destinations: smallvec![host, name],
            method: None,
        });
    }

    /// Allocate a constant variable slot.
    fn const_var(&mut self, ty: TypeId, value: Value) -> VarId {
        self.seq.push_var(Variable::Constant { ty, value })
    }

    /// Remember a multi-instruction node (member/list initialiser) under its
    /// object's defining instruction, so a revisit reuses the object instead
    /// of re-emitting the writes.
    fn remember_object(&mut self, node: ExprId, object: VarId) {
        if let Variable::Temp { def, .. } = self.seq.var(object) {
            self.exprs.insert(node, *def);
        }
    }

    // ── Diagnostics ─────────────────────────────────────────────

    fn unsupported(&self, id: ExprId) -> LowerError {
        LowerError::UnsupportedExpression {
            kind: self.arena.kind(id).tag(),
            rendering: render_expr(self.arena, id),
        }
    }

    fn malformed(&self, id: ExprId, detail: &'static str) -> LowerError {
        LowerError::MalformedNode { kind: self.arena.kind(id).tag(), detail }
    }

    // ── Visit ───────────────────────────────────────────────────

    /// Lower one node, returning the variable that holds its value.
    fn visit(&mut self, id: ExprId) -> Result<VarId, LowerError> {
        // CSE: a node already lowered to an instruction yields that
        // instruction's first destination, emitting nothing.
        if let Some(&cached) = self.exprs.get(&id) {
            if let Some(dest) = self.seq.instr(cached).first_destination() {
                return Ok(dest);
            }
        }

        let arena = self.arena;
        let kind = *arena.kind(id);
        let ty = arena.ty(id);

        match kind {
            ExprKind::Parameter(name) => {
                if let Some(&var) = self.params.get(&id) {
                    return Ok(var);
                }
                let var = self.seq.push_var(Variable::Parameter { name, ty });
                self.params.insert(id, var);
                Ok(var)
            }

            ExprKind::Literal(lit) => {
                if let Some(&var) = self.consts.get(&id) {
                    return Ok(var);
                }
                let var = self.const_var(ty, *arena.literal(lit));
                self.consts.insert(id, var);
                Ok(var)
            }

            ExprKind::Member { target, member } => {
                if target.is_valid() {
                    let host = self.visit(target)?;
                    let name = self.const_var(TypeId::STR, Value::Str(member));
                    Ok(self.emit(id, Opcode::MemberRead, smallvec![host, name], ty, None))
                } else {
                    // Static or closed-over member: capture as a constant.
                    if let Some(&var) = self.consts.get(&id) {
                        return Ok(var);
                    }
                    let Some(value) = self.env.resolve(arena, id) else {
                        return Err(self.unsupported(id));
                    };
                    let var = self.const_var(ty, value);
                    self.consts.insert(id, var);
                    Ok(var)
                }
            }

            ExprKind::Binary { op, left, right } => {
                if !left.is_valid() || !right.is_valid() {
                    return Err(self.malformed(id, "binary node is missing an operand"));
                }
                let l = self.visit(left)?;
                let r = self.visit(right)?;
                Ok(self.emit(id, Opcode::of_binary(op), smallvec![l, r], ty, None))
            }

            ExprKind::Unary { op, operand } => {
                if !operand.is_valid() {
                    return Err(self.malformed(id, "unary node is missing its operand"));
                }
                let opcode = match op {
                    UnaryOp::Negate | UnaryOp::NegateChecked => Opcode::Negate,
                    // Identity: a one-source Add.
                    UnaryOp::UnaryPlus => Opcode::Add,
                    UnaryOp::Not => Opcode::Not,
                    UnaryOp::OnesComplement => Opcode::OnesComplement,
                    UnaryOp::Increment => Opcode::Increment,
                    UnaryOp::Decrement => Opcode::Decrement,
                    UnaryOp::PreIncrementAssign => Opcode::PreIncrementAssign,
                    UnaryOp::PreDecrementAssign => Opcode::PreDecrementAssign,
                    UnaryOp::PostIncrementAssign => Opcode::PostIncrementAssign,
                    UnaryOp::PostDecrementAssign => Opcode::PostDecrementAssign,
                    UnaryOp::Convert | UnaryOp::ConvertChecked | UnaryOp::TypeAs => Opcode::Convert,
                    UnaryOp::ArrayLength
                    | UnaryOp::Throw
                    | UnaryOp::Unbox
                    | UnaryOp::IsTrue
                    | UnaryOp::IsFalse => return Err(self.unsupported(id)),
                };
                let operand = self.visit(operand)?;
                Ok(self.emit(id, opcode, smallvec![operand], ty, None))
            }

            // Quotes are transparent here; the driver is the only consumer
            // that treats them as markers.
            ExprKind::Quote(inner) => {
                if !inner.is_valid() {
                    return Err(self.malformed(id, "quote has no operand"));
                }
                self.visit(inner)
            }

            ExprKind::Conditional { test, then_branch, else_branch } => {
                if !test.is_valid() || !then_branch.is_valid() || !else_branch.is_valid() {
                    return Err(self.malformed(id, "conditional is missing a branch"));
                }
                let a = self.visit(test)?;
                let b = self.visit(then_branch)?;
                let c = self.visit(else_branch)?;
                Ok(self.emit(id, Opcode::Conditional, smallvec![a, b, c], ty, None))
            }

            ExprKind::Call { target, method, args } => {
                let mut sources = Sources::new();
                if target.is_valid() {
                    sources.push(self.visit(target)?);
                }
                for &arg in arena.expr_list(args) {
                    sources.push(self.visit(arg)?);
                }
                Ok(self.emit(id, Opcode::Call, sources, ty, Some(method)))
            }

            ExprKind::New { args, members } => {
                if members.is_empty() {
                    let mut sources = Sources::new();
                    for &arg in arena.expr_list(args) {
                        sources.push(self.visit(arg)?);
                    }
                    Ok(self.emit(id, Opcode::New, sources, ty, None))
                } else {
                    // Anonymous object-initialiser short form: the object is
                    // constructed empty, arguments are evaluated in order,
                    // then written member-by-member in initialiser order.
                    let names = arena.member_names(members);
                    let args = arena.expr_list(args);
                    if names.len() != args.len() {
                        return Err(
                            self.malformed(id, "member list and argument list lengths differ")
                        );
                    }
                    let object = self.emit(id, Opcode::New, Sources::new(), ty, None);
                    let mut values = Vec::with_capacity(args.len());
                    for &arg in args {
                        values.push(self.visit(arg)?);
                    }
                    for (&member, value) in names.iter().zip(values) {
                        self.emit_member_write(object, member, value);
                    }
                    Ok(object)
                }
            }

            ExprKind::NewArrayInit { elements } => {
                let mut sources = Sources::new();
                for &element in arena.expr_list(elements) {
                    sources.push(self.visit(element)?);
                }
                Ok(self.emit(id, Opcode::NewArrayInit, sources, ty, None))
            }

            ExprKind::NewArrayBounds { bounds } => {
                let mut sources = Sources::new();
                for &bound in arena.expr_list(bounds) {
                    sources.push(self.visit(bound)?);
                }
                Ok(self.emit(id, Opcode::NewArrayBounds, sources, ty, None))
            }

            ExprKind::MemberInit { new_expr, bindings } => {
                if !new_expr.is_valid() {
                    return Err(self.malformed(id, "member initialiser has no constructor"));
                }
                let object = self.visit(new_expr)?;

                // Evaluate every bound value first, then write in
                // initialiser order.
                let mut writes = Vec::with_capacity(bindings.len());
                for &binding in arena.bindings(bindings) {
                    match binding {
                        MemberBinding::Assign { member, value } => {
                            if !value.is_valid() {
                                return Err(self.malformed(id, "member binding has no value"));
                            }
                            writes.push((member, self.visit(value)?));
                        }
                        // Nested bindings never carried a test in the source
                        // system; rejecting is the safe stance.
                        MemberBinding::MemberMember { .. } | MemberBinding::MemberList { .. } => {
                            return Err(self.unsupported(id));
                        }
                    }
                }
                for (member, value) in writes {
                    self.emit_member_write(object, member, value);
                }
                self.remember_object(id, object);
                Ok(object)
            }

            ExprKind::ListInit { new_expr, inits } => {
                if !new_expr.is_valid() {
                    return Err(self.malformed(id, "list initialiser has no constructor"));
                }
                let object = self.visit(new_expr)?;
                if !inits.is_empty() {
                    return Err(self.unsupported(id));
                }
                self.remember_object(id, object);
                Ok(object)
            }

            // A nested lambda registers its parameters and yields its body's
            // value.
            ExprKind::Lambda { params, body } => {
                for &param in arena.expr_list(params) {
                    self.visit(param)?;
                }
                if !body.is_valid() {
                    return Err(self.malformed(id, "lambda has no body"));
                }
                self.visit(body)
            }

            ExprKind::Index { object, indexer, args } => {
                let host = if object.is_valid() {
                    self.visit(object)?
                } else {
                    self.const_var(TypeId::OBJECT, Value::Null)
                };
                // The indexer name is always present in source position one,
                // as the empty string when the indexer is unnamed.
                let name = self.const_var(TypeId::STR, Value::Str(indexer));
                let mut sources = smallvec![host, name];
                for &arg in arena.expr_list(args) {
                    sources.push(self.visit(arg)?);
                }
                Ok(self.emit(id, Opcode::Index, sources, ty, None))
            }

            ExprKind::Block(_)
            | ExprKind::Switch { .. }
            | ExprKind::Loop { .. }
            | ExprKind::TryCatch { .. }
            | ExprKind::Goto(_)
            | ExprKind::Label(_)
            | ExprKind::TypeIs { .. }
            | ExprKind::Default
            | ExprKind::Invoke { .. }
            | ExprKind::Dynamic
            | ExprKind::DebugInfo => Err(self.unsupported(id)),
        }
    }
}
