//! The logical dataflow graph the lowering pass writes into.
//!
//! Vertices are service invocations; the graph builder records the
//! originating call expression on each vertex, and the lowering pass
//! attaches one [`InstrSeq`] per composed sub-lambda. Vertices live in a
//! `BTreeMap` so a build walks them in id order and stays deterministic.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::{ExprId, InstrSeq, VertexId};

/// One vertex of the logical graph.
#[derive(Default)]
pub struct LVertex {
    /// The service-call expression that created this vertex.
    /// `ExprId::INVALID` for synthetic vertices, which the pass skips.
    origin: ExprId,
    /// Lowered instruction sequences, keyed by lambda node identity.
    programs: FxHashMap<ExprId, InstrSeq>,
}

impl LVertex {
    /// Vertex with an originating call expression.
    pub fn new(origin: ExprId) -> Self {
        Self { origin, programs: FxHashMap::default() }
    }

    /// Synthetic vertex with no originating expression.
    pub fn synthetic() -> Self {
        Self::default()
    }

    /// The originating call expression, or `ExprId::INVALID`.
    pub fn origin(&self) -> ExprId {
        self.origin
    }

    /// The lowered program for one lambda, if attached.
    pub fn program(&self, lambda: ExprId) -> Option<&InstrSeq> {
        self.programs.get(&lambda)
    }

    /// All lowered programs.
    pub fn programs(&self) -> &FxHashMap<ExprId, InstrSeq> {
        &self.programs
    }

    /// Attach a lowered program for a lambda, replacing any previous one.
    pub fn attach(&mut self, lambda: ExprId, seq: InstrSeq) {
        self.programs.insert(lambda, seq);
    }
}

/// Map from vertex id to vertex.
#[derive(Default)]
pub struct LGraph {
    vertices: BTreeMap<VertexId, LVertex>,
}

impl LGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex, replacing any existing vertex with the same id.
    pub fn insert(&mut self, id: VertexId, vertex: LVertex) {
        self.vertices.insert(id, vertex);
    }

    pub fn vertex(&self, id: VertexId) -> Option<&LVertex> {
        self.vertices.get(&id)
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut LVertex> {
        self.vertices.get_mut(&id)
    }

    /// Vertices in id order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &LVertex)> {
        self.vertices.iter().map(|(&id, v)| (id, v))
    }

    /// Mutable iteration in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (VertexId, &mut LVertex)> {
        self.vertices.iter_mut().map(|(&id, v)| (id, v))
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
