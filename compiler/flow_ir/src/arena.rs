//! Arena storage for the typed expression tree.
//!
//! Struct-of-arrays layout: node kinds and node types live in parallel
//! vectors indexed by [`ExprId`]; lists and auxiliary payloads live in flat
//! side tables referenced by ranges. The arena also owns the string interner
//! and the type pool so a frontend can build a whole tree against one value.
//!
//! # Capacity limits
//! - nodes and pool entries: `u32::MAX`
//! - any single list: `u16::MAX`
//!
//! Both are enforced with clear panic messages.

use crate::expr::{ElementInit, ExprKind, MemberBinding, MethodRef, Value};
use crate::{
    BindingRange, ExprId, ExprRange, InitRange, LiteralId, MethodId, Name, NameRange,
    SharedInterner, StringInterner, TypeId, TypePool,
};

/// Panic helper for capacity overflow (cold path, never inlined).
#[cold]
#[inline(never)]
fn panic_capacity_exceeded(value: usize, context: &str, max: u64) -> ! {
    panic!("arena capacity exceeded: {context} has {value} elements, max is {max}")
}

/// Convert `usize` to `u32`, panicking with a clear message on overflow.
#[inline]
pub(crate) fn to_u32(value: usize, context: &str) -> u32 {
    u32::try_from(value)
        .unwrap_or_else(|_| panic_capacity_exceeded(value, context, u64::from(u32::MAX)))
}

/// Convert `usize` to `u16`, panicking with a clear message on overflow.
#[inline]
pub(crate) fn to_u16(value: usize, context: &str) -> u16 {
    u16::try_from(value)
        .unwrap_or_else(|_| panic_capacity_exceeded(value, context, u64::from(u16::MAX)))
}

/// Contiguous storage for one typed expression tree (or several trees the
/// frontend builds into the same space).
pub struct ExprArena {
    kinds: Vec<ExprKind>,
    types: Vec<TypeId>,
    expr_lists: Vec<ExprId>,
    literals: Vec<Value>,
    methods: Vec<MethodRef>,
    bindings: Vec<MemberBinding>,
    inits: Vec<ElementInit>,
    member_names: Vec<Name>,
    interner: SharedInterner,
    type_pool: TypePool,
}

impl ExprArena {
    /// Create an empty arena with a fresh interner and type pool.
    pub fn new() -> Self {
        Self::with_interner(SharedInterner::new())
    }

    /// Create an empty arena sharing an existing interner.
    pub fn with_interner(interner: SharedInterner) -> Self {
        Self {
            kinds: Vec::new(),
            types: Vec::new(),
            expr_lists: Vec::new(),
            literals: Vec::new(),
            methods: Vec::new(),
            bindings: Vec::new(),
            inits: Vec::new(),
            member_names: Vec::new(),
            interner,
            type_pool: TypePool::new(),
        }
    }

    // ── Nodes ───────────────────────────────────────────────────

    /// Allocate an expression node.
    pub fn alloc_expr(&mut self, kind: ExprKind, ty: TypeId) -> ExprId {
        let id = ExprId::new(to_u32(self.kinds.len(), "expressions"));
        self.kinds.push(kind);
        self.types.push(ty);
        id
    }

    /// Kind of a node.
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.kinds[id.index()]
    }

    /// Static type of a node.
    pub fn ty(&self, id: ExprId) -> TypeId {
        self.types[id.index()]
    }

    /// Number of nodes.
    pub fn expr_count(&self) -> usize {
        self.kinds.len()
    }

    /// Returns `true` if no nodes have been allocated.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // ── Expression lists ────────────────────────────────────────

    /// Store a list of node ids, returning its range.
    pub fn alloc_expr_list(&mut self, items: &[ExprId]) -> ExprRange {
        let start = to_u32(self.expr_lists.len(), "expression lists");
        let len = to_u16(items.len(), "expression list");
        self.expr_lists.extend_from_slice(items);
        ExprRange::new(start, len)
    }

    /// Resolve a range to its ids.
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.start as usize..range.start as usize + range.len()]
    }

    // ── Side tables ─────────────────────────────────────────────

    /// Store a literal value.
    pub fn alloc_literal(&mut self, value: Value) -> LiteralId {
        let id = LiteralId::new(to_u32(self.literals.len(), "literals"));
        self.literals.push(value);
        id
    }

    pub fn literal(&self, id: LiteralId) -> &Value {
        &self.literals[id.index()]
    }

    /// Store a method reference.
    pub fn alloc_method(&mut self, method: MethodRef) -> MethodId {
        let id = MethodId::new(to_u32(self.methods.len(), "method references"));
        self.methods.push(method);
        id
    }

    pub fn method(&self, id: MethodId) -> &MethodRef {
        &self.methods[id.index()]
    }

    /// Store object-initialiser bindings.
    pub fn alloc_bindings(&mut self, items: &[MemberBinding]) -> BindingRange {
        let start = to_u32(self.bindings.len(), "bindings");
        let len = to_u16(items.len(), "binding list");
        self.bindings.extend_from_slice(items);
        BindingRange::new(start, len)
    }

    pub fn bindings(&self, range: BindingRange) -> &[MemberBinding] {
        &self.bindings[range.start as usize..range.start as usize + range.len()]
    }

    /// Store element initialisers.
    pub fn alloc_inits(&mut self, items: &[ElementInit]) -> InitRange {
        let start = to_u32(self.inits.len(), "element initialisers");
        let len = to_u16(items.len(), "element initialiser list");
        self.inits.extend_from_slice(items);
        InitRange::new(start, len)
    }

    pub fn inits(&self, range: InitRange) -> &[ElementInit] {
        &self.inits[range.start as usize..range.start as usize + range.len()]
    }

    /// Store an anonymous-constructor member-name list.
    pub fn alloc_member_names(&mut self, items: &[Name]) -> NameRange {
        let start = to_u32(self.member_names.len(), "member names");
        let len = to_u16(items.len(), "member name list");
        self.member_names.extend_from_slice(items);
        NameRange::new(start, len)
    }

    pub fn member_names(&self, range: NameRange) -> &[Name] {
        &self.member_names[range.start as usize..range.start as usize + range.len()]
    }

    // ── Shared context ──────────────────────────────────────────

    /// The interner behind this arena's [`Name`]s.
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// The type pool behind this arena's [`TypeId`]s.
    pub fn type_pool(&self) -> &TypePool {
        &self.type_pool
    }

    /// Mutable pool access for frontends interning new types.
    pub fn type_pool_mut(&mut self) -> &mut TypePool {
        &mut self.type_pool
    }
}

impl Default for ExprArena {
    fn default() -> Self {
        Self::new()
    }
}
