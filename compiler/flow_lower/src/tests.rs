//! Lowering tests: the concrete scenarios from the pass contract plus the
//! structural invariants, exercised through small hand-built trees.

use pretty_assertions::assert_eq;

use flow_ir::render::render_seq;
use flow_ir::{
    BinaryOp, ExprArena, ExprId, ExprKind, InstrSeq, LGraph, LVertex, MemberBinding, MethodRef,
    Opcode, Ty, TypeId, UnaryOp, Value, Variable, VertexId,
};

use crate::{build, lower_lambda, validate, CapturedBindings, LowerError, NoCapture};

/// Route `tracing` output from the instrumented driver through the test
/// harness. `RUST_LOG` controls verbosity; repeat initialisation is a no-op.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Tree-building helpers ───────────────────────────────────────────

fn int_lit(arena: &mut ExprArena, v: i64) -> ExprId {
    let lit = arena.alloc_literal(Value::Int(v));
    arena.alloc_expr(ExprKind::Literal(lit), TypeId::INT)
}

fn param(arena: &mut ExprArena, name: &str, ty: TypeId) -> ExprId {
    let name = arena.interner().intern(name);
    arena.alloc_expr(ExprKind::Parameter(name), ty)
}

fn binary(arena: &mut ExprArena, op: BinaryOp, left: ExprId, right: ExprId, ty: TypeId) -> ExprId {
    arena.alloc_expr(ExprKind::Binary { op, left, right }, ty)
}

fn unary(arena: &mut ExprArena, op: UnaryOp, operand: ExprId, ty: TypeId) -> ExprId {
    arena.alloc_expr(ExprKind::Unary { op, operand }, ty)
}

fn lambda(arena: &mut ExprArena, params: &[ExprId], body: ExprId) -> ExprId {
    let params = arena.alloc_expr_list(params);
    arena.alloc_expr(ExprKind::Lambda { params, body }, TypeId::OBJECT)
}

fn method_call(
    arena: &mut ExprArena,
    target: ExprId,
    method: &str,
    args: &[ExprId],
    ty: TypeId,
) -> ExprId {
    let name = arena.interner().intern(method);
    let method = arena.alloc_method(MethodRef { owner: TypeId::OBJECT, name });
    let args = arena.alloc_expr_list(args);
    arena.alloc_expr(ExprKind::Call { target, method, args }, ty)
}

fn lower(arena: &ExprArena, lambda: ExprId) -> InstrSeq {
    match lower_lambda(arena, &NoCapture, lambda) {
        Ok(seq) => seq,
        Err(e) => panic!("lowering failed: {e}"),
    }
}

/// The constant variable slots of a sequence, by value.
fn constants(seq: &InstrSeq) -> Vec<Value> {
    seq.vars()
        .iter()
        .filter_map(|var| match var {
            Variable::Constant { value, .. } => Some(*value),
            _ => None,
        })
        .collect()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn shared_binary_node_is_lowered_once() {
    // (x) => (x + 1) * (x + 1), both factors the same node.
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let one = int_lit(&mut arena, 1);
    let add = binary(&mut arena, BinaryOp::Add, x, one, TypeId::INT);
    let mul = binary(&mut arena, BinaryOp::Multiply, add, add, TypeId::INT);
    let lam = lambda(&mut arena, &[x], mul);

    let seq = lower(&arena, lam);

    assert_eq!(seq.len(), 2);
    assert_eq!(seq.instrs()[0].op, Opcode::Add);
    assert_eq!(seq.instrs()[1].op, Opcode::Multiply);
    // Both factors are the Add's result temp.
    let factors = &seq.instrs()[1].sources;
    assert_eq!(factors[0], factors[1]);
    assert!(seq.var(factors[0]).is_temp());
    assert_eq!(seq.instrs()[0].first_destination(), Some(factors[0]));
}

#[test]
fn conditional_lowers_test_then_else() {
    // (x) => x > 0 ? x : -x
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let zero = int_lit(&mut arena, 0);
    let test = binary(&mut arena, BinaryOp::GreaterThan, x, zero, TypeId::BOOL);
    let neg = unary(&mut arena, UnaryOp::Negate, x, TypeId::INT);
    let cond = arena.alloc_expr(
        ExprKind::Conditional { test, then_branch: x, else_branch: neg },
        TypeId::INT,
    );
    let lam = lambda(&mut arena, &[x], cond);

    let seq = lower(&arena, lam);

    assert_eq!(seq.len(), 3);
    assert_eq!(seq.instrs()[0].op, Opcode::GreaterThan);
    assert_eq!(seq.instrs()[1].op, Opcode::Negate);
    let cond = &seq.instrs()[2];
    assert_eq!(cond.op, Opcode::Conditional);
    assert_eq!(cond.sources.len(), 3);
    assert_eq!(Some(cond.sources[0]), seq.instrs()[0].first_destination());
    assert!(matches!(seq.var(cond.sources[1]), Variable::Parameter { .. }));
    assert_eq!(Some(cond.sources[2]), seq.instrs()[1].first_destination());
}

#[test]
fn member_initialiser_constructs_then_writes_in_order() {
    // (a, b) => new Point { X = a, Y = b + 1 }
    let mut arena = ExprArena::new();
    let point = arena.interner().intern("Point");
    let point_ty = arena.type_pool_mut().intern(Ty::Named(point));
    let x_name = arena.interner().intern("X");
    let y_name = arena.interner().intern("Y");

    let a = param(&mut arena, "a", TypeId::INT);
    let b = param(&mut arena, "b", TypeId::INT);
    let one = int_lit(&mut arena, 1);
    let add = binary(&mut arena, BinaryOp::Add, b, one, TypeId::INT);

    let new = arena.alloc_expr(
        ExprKind::New { args: flow_ir::ExprRange::EMPTY, members: flow_ir::NameRange::EMPTY },
        point_ty,
    );
    let bindings = arena.alloc_bindings(&[
        MemberBinding::Assign { member: x_name, value: a },
        MemberBinding::Assign { member: y_name, value: add },
    ]);
    let init = arena.alloc_expr(ExprKind::MemberInit { new_expr: new, bindings }, point_ty);
    let lam = lambda(&mut arena, &[a, b], init);

    let seq = lower(&arena, lam);

    let ops: Vec<Opcode> = seq.instrs().iter().map(|i| i.op).collect();
    assert_eq!(
        ops,
        vec![Opcode::New, Opcode::Add, Opcode::MemberWrite, Opcode::MemberWrite]
    );

    let object = seq.instrs()[0].first_destination();
    let write_x = &seq.instrs()[2];
    assert_eq!(Some(write_x.destinations[0]), object);
    assert_eq!(
        *seq.var(write_x.destinations[1]),
        Variable::Constant { ty: TypeId::STR, value: Value::Str(x_name) }
    );
    assert!(matches!(seq.var(write_x.sources[0]), Variable::Parameter { .. }));

    let write_y = &seq.instrs()[3];
    assert_eq!(Some(write_y.destinations[0]), object);
    assert_eq!(Some(write_y.sources[0]), seq.instrs()[1].first_destination());
}

#[test]
fn method_call_with_receiver_carries_method_reference() {
    // (s, x, y) => s.Foo(x, y)
    let mut arena = ExprArena::new();
    let s = param(&mut arena, "s", TypeId::OBJECT);
    let x = param(&mut arena, "x", TypeId::INT);
    let y = param(&mut arena, "y", TypeId::INT);
    let call = method_call(&mut arena, s, "Foo", &[x, y], TypeId::INT);
    let lam = lambda(&mut arena, &[s, x, y], call);

    let seq = lower(&arena, lam);

    assert_eq!(seq.len(), 1);
    let instr = &seq.instrs()[0];
    assert_eq!(instr.op, Opcode::Call);
    assert_eq!(instr.sources.len(), 3);
    let Some(method) = instr.method else {
        panic!("call instruction carries no method reference");
    };
    assert_eq!(arena.interner().lookup(arena.method(method).name), "Foo");
}

#[test]
fn routing_lambda_is_skipped_by_the_driver() {
    init_tracing();

    // Vertex origin: Compose(quote (h: Symbol) => h.Bar(42))
    let mut arena = ExprArena::new();
    let handle = arena.interner().intern("Handle");
    let symbol_ty = arena.type_pool_mut().intern(Ty::Symbol(handle));

    let h = param(&mut arena, "h", symbol_ty);
    let v = int_lit(&mut arena, 42);
    let body = method_call(&mut arena, h, "Bar", &[v], TypeId::INT);
    let lam = lambda(&mut arena, &[h], body);
    let quoted = arena.alloc_expr(ExprKind::Quote(lam), TypeId::OBJECT);

    let origin = method_call(&mut arena, ExprId::INVALID, "Compose", &[quoted], TypeId::OBJECT);

    let mut graph = LGraph::new();
    let id = VertexId::new(0);
    graph.insert(id, LVertex::new(origin));

    match build(&mut graph, &arena, &NoCapture) {
        Ok(()) => {}
        Err(e) => panic!("build failed: {e}"),
    }

    let Some(vertex) = graph.vertex(id) else { panic!("vertex disappeared") };
    assert!(vertex.program(lam).is_none());
    assert!(vertex.programs().is_empty());
}

#[test]
fn unsupported_kind_fails_the_build() {
    init_tracing();

    // Vertex origin: Compose(quote (x) => switch x { … })
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let switch = arena.alloc_expr(ExprKind::Switch { subject: x }, TypeId::INT);
    let lam = lambda(&mut arena, &[x], switch);
    let quoted = arena.alloc_expr(ExprKind::Quote(lam), TypeId::OBJECT);
    let origin = method_call(&mut arena, ExprId::INVALID, "Compose", &[quoted], TypeId::OBJECT);

    let mut graph = LGraph::new();
    let id = VertexId::new(7);
    graph.insert(id, LVertex::new(origin));

    match build(&mut graph, &arena, &NoCapture) {
        Err(LowerError::UnsupportedExpression { kind, .. }) => assert_eq!(kind, "Switch"),
        other => panic!("expected unsupported-expression error, got {other:?}"),
    }
    let Some(vertex) = graph.vertex(id) else { panic!("vertex disappeared") };
    assert!(vertex.program(lam).is_none());
}

// ── Visit rules ─────────────────────────────────────────────────────

#[test]
fn unary_plus_is_a_single_source_add() {
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let plus = unary(&mut arena, UnaryOp::UnaryPlus, x, TypeId::INT);
    let lam = lambda(&mut arena, &[x], plus);

    let seq = lower(&arena, lam);
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.instrs()[0].op, Opcode::Add);
    assert_eq!(seq.instrs()[0].sources.len(), 1);
}

#[test]
fn conversions_lower_to_convert() {
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let as_float = unary(&mut arena, UnaryOp::Convert, x, TypeId::FLOAT);
    let as_obj = unary(&mut arena, UnaryOp::TypeAs, as_float, TypeId::OBJECT);
    let lam = lambda(&mut arena, &[x], as_obj);

    let seq = lower(&arena, lam);
    assert_eq!(seq.len(), 2);
    assert!(seq.instrs().iter().all(|i| i.op == Opcode::Convert));
}

#[test]
fn rejected_unary_operator_is_unsupported() {
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::OBJECT);
    let len = unary(&mut arena, UnaryOp::ArrayLength, x, TypeId::INT);
    let lam = lambda(&mut arena, &[x], len);

    match lower_lambda(&arena, &NoCapture, lam) {
        Err(LowerError::UnsupportedExpression { kind, .. }) => assert_eq!(kind, "Unary"),
        other => panic!("expected unsupported-expression error, got {other:?}"),
    }
}

#[test]
fn member_read_prepends_the_name_constant() {
    // (s) => s.Name
    let mut arena = ExprArena::new();
    let s = param(&mut arena, "s", TypeId::OBJECT);
    let member = arena.interner().intern("Name");
    let read = arena.alloc_expr(ExprKind::Member { target: s, member }, TypeId::STR);
    let lam = lambda(&mut arena, &[s], read);

    let seq = lower(&arena, lam);
    assert_eq!(seq.len(), 1);
    let instr = &seq.instrs()[0];
    assert_eq!(instr.op, Opcode::MemberRead);
    assert_eq!(instr.sources.len(), 2);
    assert!(matches!(seq.var(instr.sources[0]), Variable::Parameter { .. }));
    assert_eq!(
        *seq.var(instr.sources[1]),
        Variable::Constant { ty: TypeId::STR, value: Value::Str(member) }
    );
}

#[test]
fn closed_member_access_captures_through_the_resolver() {
    let mut arena = ExprArena::new();
    let member = arena.interner().intern("captured");
    let closed =
        arena.alloc_expr(ExprKind::Member { target: ExprId::INVALID, member }, TypeId::INT);
    let lam = lambda(&mut arena, &[], closed);

    let mut env = CapturedBindings::new();
    env.bind(member, Value::Int(99));

    let seq = match lower_lambda(&arena, &env, lam) {
        Ok(seq) => seq,
        Err(e) => panic!("lowering failed: {e}"),
    };
    // No instruction — the access became a constant.
    assert!(seq.is_empty());
    assert_eq!(constants(&seq), vec![Value::Int(99)]);
}

#[test]
fn unresolvable_closed_member_access_is_unsupported() {
    let mut arena = ExprArena::new();
    let member = arena.interner().intern("captured");
    let closed =
        arena.alloc_expr(ExprKind::Member { target: ExprId::INVALID, member }, TypeId::INT);
    let lam = lambda(&mut arena, &[], closed);

    match lower_lambda(&arena, &NoCapture, lam) {
        Err(LowerError::UnsupportedExpression { kind, .. }) => assert_eq!(kind, "MemberAccess"),
        other => panic!("expected unsupported-expression error, got {other:?}"),
    }
}

#[test]
fn constants_are_deduplicated_by_node_identity() {
    // (x) => (x + c) * (x - c) with both uses sharing the literal node,
    // plus a second, distinct literal node with the same value.
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let shared = int_lit(&mut arena, 5);
    let distinct = int_lit(&mut arena, 5);
    let add = binary(&mut arena, BinaryOp::Add, x, shared, TypeId::INT);
    let sub = binary(&mut arena, BinaryOp::Subtract, x, shared, TypeId::INT);
    let mul = binary(&mut arena, BinaryOp::Multiply, add, sub, TypeId::INT);
    let outer = binary(&mut arena, BinaryOp::Multiply, mul, distinct, TypeId::INT);
    let lam = lambda(&mut arena, &[x], outer);

    let seq = lower(&arena, lam);

    // Identity dedup: the shared node yields one slot, the distinct node a
    // second one even though the values are equal.
    assert_eq!(constants(&seq), vec![Value::Int(5), Value::Int(5)]);
}

#[test]
fn static_index_synthesises_null_host_and_empty_name() {
    // () => <static>[3] with an unnamed indexer
    let mut arena = ExprArena::new();
    let three = int_lit(&mut arena, 3);
    let args = arena.alloc_expr_list(&[three]);
    let index = arena.alloc_expr(
        ExprKind::Index { object: ExprId::INVALID, indexer: flow_ir::Name::EMPTY, args },
        TypeId::INT,
    );
    let lam = lambda(&mut arena, &[], index);

    let seq = lower(&arena, lam);
    assert_eq!(seq.len(), 1);
    let instr = &seq.instrs()[0];
    assert_eq!(instr.op, Opcode::Index);
    assert_eq!(instr.sources.len(), 3);
    assert_eq!(
        *seq.var(instr.sources[0]),
        Variable::Constant { ty: TypeId::OBJECT, value: Value::Null }
    );
    assert_eq!(
        *seq.var(instr.sources[1]),
        Variable::Constant { ty: TypeId::STR, value: Value::Str(flow_ir::Name::EMPTY) }
    );
}

#[test]
fn array_literal_lowers_each_element() {
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let one = int_lit(&mut arena, 1);
    let sum = binary(&mut arena, BinaryOp::Add, x, one, TypeId::INT);
    let elements = arena.alloc_expr_list(&[x, sum]);
    let int_array = arena.type_pool_mut().intern(Ty::Array(TypeId::INT));
    let array = arena.alloc_expr(ExprKind::NewArrayInit { elements }, int_array);
    let lam = lambda(&mut arena, &[x], array);

    let seq = lower(&arena, lam);
    assert_eq!(seq.len(), 2);
    assert_eq!(seq.instrs()[1].op, Opcode::NewArrayInit);
    assert_eq!(seq.instrs()[1].sources.len(), 2);
}

#[test]
fn anonymous_constructor_writes_members_in_order() {
    // (a, b) => new { X = a, Y = b + 1 } (member-list short form)
    let mut arena = ExprArena::new();
    let x_name = arena.interner().intern("X");
    let y_name = arena.interner().intern("Y");
    let a = param(&mut arena, "a", TypeId::INT);
    let b = param(&mut arena, "b", TypeId::INT);
    let one = int_lit(&mut arena, 1);
    let add = binary(&mut arena, BinaryOp::Add, b, one, TypeId::INT);

    let args = arena.alloc_expr_list(&[a, add]);
    let members = arena.alloc_member_names(&[x_name, y_name]);
    let new = arena.alloc_expr(ExprKind::New { args, members }, TypeId::OBJECT);
    let lam = lambda(&mut arena, &[a, b], new);

    let seq = lower(&arena, lam);
    let ops: Vec<Opcode> = seq.instrs().iter().map(|i| i.op).collect();
    assert_eq!(
        ops,
        vec![Opcode::New, Opcode::Add, Opcode::MemberWrite, Opcode::MemberWrite]
    );
    // The New has no sources in the short form.
    assert!(seq.instrs()[0].sources.is_empty());
}

#[test]
fn nested_member_binding_is_unsupported() {
    let mut arena = ExprArena::new();
    let inner_name = arena.interner().intern("Inner");
    let new = arena.alloc_expr(
        ExprKind::New { args: flow_ir::ExprRange::EMPTY, members: flow_ir::NameRange::EMPTY },
        TypeId::OBJECT,
    );
    let nested = arena.alloc_bindings(&[]);
    let bindings = arena.alloc_bindings(&[MemberBinding::MemberMember {
        member: inner_name,
        bindings: nested,
    }]);
    let init = arena.alloc_expr(ExprKind::MemberInit { new_expr: new, bindings }, TypeId::OBJECT);
    let lam = lambda(&mut arena, &[], init);

    match lower_lambda(&arena, &NoCapture, lam) {
        Err(LowerError::UnsupportedExpression { kind, .. }) => assert_eq!(kind, "MemberInit"),
        other => panic!("expected unsupported-expression error, got {other:?}"),
    }
}

#[test]
fn empty_list_initialiser_yields_the_object() {
    let mut arena = ExprArena::new();
    let new = arena.alloc_expr(
        ExprKind::New { args: flow_ir::ExprRange::EMPTY, members: flow_ir::NameRange::EMPTY },
        TypeId::OBJECT,
    );
    let init = arena.alloc_expr(
        ExprKind::ListInit { new_expr: new, inits: flow_ir::InitRange::EMPTY },
        TypeId::OBJECT,
    );
    let lam = lambda(&mut arena, &[], init);

    let seq = lower(&arena, lam);
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.instrs()[0].op, Opcode::New);
}

#[test]
fn non_empty_list_initialiser_is_unsupported() {
    let mut arena = ExprArena::new();
    let new = arena.alloc_expr(
        ExprKind::New { args: flow_ir::ExprRange::EMPTY, members: flow_ir::NameRange::EMPTY },
        TypeId::OBJECT,
    );
    let one = int_lit(&mut arena, 1);
    let args = arena.alloc_expr_list(&[one]);
    let inits = arena.alloc_inits(&[flow_ir::ElementInit { args }]);
    let init = arena.alloc_expr(ExprKind::ListInit { new_expr: new, inits }, TypeId::OBJECT);
    let lam = lambda(&mut arena, &[], init);

    match lower_lambda(&arena, &NoCapture, lam) {
        Err(LowerError::UnsupportedExpression { kind, .. }) => assert_eq!(kind, "ListInit"),
        other => panic!("expected unsupported-expression error, got {other:?}"),
    }
}

#[test]
fn binary_missing_operand_is_malformed() {
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let broken = arena.alloc_expr(
        ExprKind::Binary { op: BinaryOp::Add, left: x, right: ExprId::INVALID },
        TypeId::INT,
    );
    let lam = lambda(&mut arena, &[x], broken);

    match lower_lambda(&arena, &NoCapture, lam) {
        Err(LowerError::MalformedNode { kind, .. }) => assert_eq!(kind, "Binary"),
        other => panic!("expected malformed-node error, got {other:?}"),
    }
}

// ── Driver behaviour ────────────────────────────────────────────────

#[test]
fn driver_lowers_computation_lambdas_and_skips_plain_arguments() {
    init_tracing();

    // Origin: Compose(17, quote (x) => x * x)
    let mut arena = ExprArena::new();
    let plain = int_lit(&mut arena, 17);
    let x = param(&mut arena, "x", TypeId::INT);
    let square = binary(&mut arena, BinaryOp::Multiply, x, x, TypeId::INT);
    let lam = lambda(&mut arena, &[x], square);
    let quoted = arena.alloc_expr(ExprKind::Quote(lam), TypeId::OBJECT);
    let origin =
        method_call(&mut arena, ExprId::INVALID, "Compose", &[plain, quoted], TypeId::OBJECT);

    let mut graph = LGraph::new();
    let id = VertexId::new(0);
    graph.insert(id, LVertex::new(origin));
    graph.insert(VertexId::new(1), LVertex::synthetic());

    match build(&mut graph, &arena, &NoCapture) {
        Ok(()) => {}
        Err(e) => panic!("build failed: {e}"),
    }

    let Some(vertex) = graph.vertex(id) else { panic!("vertex disappeared") };
    assert_eq!(vertex.programs().len(), 1);
    let Some(seq) = vertex.program(lam) else { panic!("no program for the lambda") };
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.instrs()[0].op, Opcode::Multiply);

    // The synthetic vertex stays untouched.
    let Some(synthetic) = graph.vertex(VertexId::new(1)) else { panic!("vertex disappeared") };
    assert!(synthetic.programs().is_empty());
}

#[test]
fn quote_around_non_lambda_is_malformed() {
    let mut arena = ExprArena::new();
    let value = int_lit(&mut arena, 3);
    let quoted = arena.alloc_expr(ExprKind::Quote(value), TypeId::OBJECT);
    let origin = method_call(&mut arena, ExprId::INVALID, "Compose", &[quoted], TypeId::OBJECT);

    let mut graph = LGraph::new();
    graph.insert(VertexId::new(0), LVertex::new(origin));

    match build(&mut graph, &arena, &NoCapture) {
        Err(LowerError::MalformedNode { kind, .. }) => assert_eq!(kind, "Constant"),
        other => panic!("expected malformed-node error, got {other:?}"),
    }
}

#[test]
fn non_call_origin_is_malformed() {
    let mut arena = ExprArena::new();
    let origin = int_lit(&mut arena, 1);
    let mut graph = LGraph::new();
    graph.insert(VertexId::new(0), LVertex::new(origin));

    match build(&mut graph, &arena, &NoCapture) {
        Err(LowerError::MalformedNode { kind, .. }) => assert_eq!(kind, "Constant"),
        other => panic!("expected malformed-node error, got {other:?}"),
    }
}

#[test]
fn lowering_is_deterministic_across_runs() {
    let mut arena = ExprArena::new();
    let x = param(&mut arena, "x", TypeId::INT);
    let y = param(&mut arena, "y", TypeId::INT);
    let one = int_lit(&mut arena, 1);
    let add = binary(&mut arena, BinaryOp::Add, x, one, TypeId::INT);
    let mul = binary(&mut arena, BinaryOp::Multiply, add, y, TypeId::INT);
    let call = method_call(&mut arena, x, "Combine", &[mul, add], TypeId::INT);
    let lam = lambda(&mut arena, &[x, y], call);

    let first = lower(&arena, lam);
    let second = lower(&arena, lam);

    assert_eq!(first, second);
    assert_eq!(
        render_seq(&first, arena.interner()),
        render_seq(&second, arena.interner())
    );
}

// ── Property tests ──────────────────────────────────────────────────

mod properties {
    use proptest::prelude::*;

    use super::*;

    /// Generator-side description of a random lambda body over three int
    /// parameters.
    #[derive(Debug, Clone)]
    enum Node {
        Param(u8),
        Lit(i8),
        Bin(u8, Box<Node>, Box<Node>),
        Neg(Box<Node>),
        Cond(Box<Node>, Box<Node>, Box<Node>),
    }

    fn arb_node() -> impl Strategy<Value = Node> {
        let leaf = prop_oneof![
            (0u8..3).prop_map(Node::Param),
            any::<i8>().prop_map(Node::Lit),
        ];
        leaf.prop_recursive(4, 24, 3, |inner| {
            prop_oneof![
                (0u8..4, inner.clone(), inner.clone())
                    .prop_map(|(op, a, b)| Node::Bin(op, Box::new(a), Box::new(b))),
                inner.clone().prop_map(|a| Node::Neg(Box::new(a))),
                (inner.clone(), inner.clone(), inner)
                    .prop_map(|(a, b, c)| Node::Cond(Box::new(a), Box::new(b), Box::new(c))),
            ]
        })
    }

    fn materialize(node: &Node, arena: &mut ExprArena, params: &[ExprId]) -> ExprId {
        match node {
            Node::Param(i) => params[*i as usize % params.len()],
            Node::Lit(v) => int_lit(arena, i64::from(*v)),
            Node::Bin(op, a, b) => {
                const OPS: [BinaryOp; 4] =
                    [BinaryOp::Add, BinaryOp::Subtract, BinaryOp::Multiply, BinaryOp::LessThan];
                let op = OPS[*op as usize % OPS.len()];
                let left = materialize(a, arena, params);
                let right = materialize(b, arena, params);
                let ty = if op == BinaryOp::LessThan { TypeId::BOOL } else { TypeId::INT };
                binary(arena, op, left, right, ty)
            }
            Node::Neg(a) => {
                let operand = materialize(a, arena, params);
                unary(arena, UnaryOp::Negate, operand, TypeId::INT)
            }
            Node::Cond(a, b, c) => {
                let test = materialize(a, arena, params);
                let then_branch = materialize(b, arena, params);
                let else_branch = materialize(c, arena, params);
                arena.alloc_expr(
                    ExprKind::Conditional { test, then_branch, else_branch },
                    TypeId::INT,
                )
            }
        }
    }

    proptest! {
        /// Any accepted tree lowers to a well-formed sequence, and lowering
        /// is a pure function of the tree.
        #[test]
        fn lowered_sequences_are_well_formed_and_deterministic(spec in arb_node()) {
            let mut arena = ExprArena::new();
            let params: Vec<ExprId> = ["p0", "p1", "p2"]
                .iter()
                .map(|name| param(&mut arena, name, TypeId::INT))
                .collect();
            let body = materialize(&spec, &mut arena, &params);
            let lam = lambda(&mut arena, &params, body);

            let first = match lower_lambda(&arena, &NoCapture, lam) {
                Ok(seq) => seq,
                Err(e) => return Err(TestCaseError::fail(format!("lowering failed: {e}"))),
            };
            validate::check(&first);

            // Binary instructions carry exactly two sources and one result.
            for instr in first.instrs() {
                if matches!(
                    instr.op,
                    Opcode::Subtract | Opcode::Multiply | Opcode::LessThan
                ) {
                    prop_assert_eq!(instr.sources.len(), 2);
                    prop_assert_eq!(instr.destinations.len(), 1);
                }
                if instr.op == Opcode::Conditional {
                    prop_assert_eq!(instr.sources.len(), 3);
                }
            }

            let second = match lower_lambda(&arena, &NoCapture, lam) {
                Ok(seq) => seq,
                Err(e) => return Err(TestCaseError::fail(format!("lowering failed: {e}"))),
            };
            prop_assert_eq!(first, second);
        }
    }
}
