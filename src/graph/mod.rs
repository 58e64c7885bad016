//! The graph trait surface shared by the three graph families.
//!
//! The algorithms of this crate are written against the [`Graph`] trait,
//! which exposes vertex and edge counting, incidence and adjacency
//! iteration, edge indexing and vertex-list traversal under one vocabulary.
//! It is implemented by [`UndirectedGraph`], [`RegularGraph`] and
//! [`crate::tree::Tree`].
//!
//! Vertex identifiers are `usize` values in `[0, num_vertices)` and edge
//! identifiers are `usize` values in `[0, num_edges)`; the sentinel
//! [`crate::INVALID`] marks absence in both spaces.

pub mod regular;
pub mod undirected;

pub use regular::RegularGraph;
pub use undirected::UndirectedGraph;

use crate::error::Result;
use std::ops::Range;

/// Common interface over the graph families of this crate.
///
/// `incidences(v)` is the central primitive: it yields `(edge_id, neighbor)`
/// pairs for every live edge incident to `v`, in the canonical incidence
/// order of the variant. Adjacency, out-edge and in-edge iteration are
/// derived from it; `adjacent_vertices` has its own associated iterator so
/// variants whose edge indexing is costlier than neighbor enumeration can
/// keep plain adjacency cheap.
pub trait Graph {
    /// Iterator over the neighbors of a vertex.
    type Neighbors<'a>: Iterator<Item = usize>
    where
        Self: 'a;
    /// Iterator over `(edge_id, neighbor)` pairs of a vertex.
    type Incidences<'a>: Iterator<Item = (usize, usize)>
    where
        Self: 'a;
    /// Iterator over the `(source, target)` pairs of all edges.
    type Edges<'a>: Iterator<Item = (usize, usize)>
    where
        Self: 'a;

    /// Number of vertices.
    fn num_vertices(&self) -> usize;

    /// Number of edge slots; for the explicit graph this includes removed
    /// edges, which still consume an identifier.
    fn num_edges(&self) -> usize;

    /// Neighbors of `v` in canonical incidence order.
    ///
    /// **Panics** if `v` is out of bounds.
    fn adjacent_vertices(&self, v: usize) -> Self::Neighbors<'_>;

    /// `(edge_id, neighbor)` pairs incident to `v`.
    ///
    /// **Panics** if `v` is out of bounds.
    fn incidences(&self, v: usize) -> Self::Incidences<'_>;

    /// All edges as `(source, target)` pairs, in edge-id order; a removed
    /// slot of the explicit graph yields `(INVALID, INVALID)`.
    fn edges(&self) -> Self::Edges<'_>;

    /// Endpoints of the edge with identifier `e`, in O(1).
    ///
    /// Fails with `OutOfRange` if `e` is not in `[0, num_edges)`.
    fn edge_from_id(&self, e: usize) -> Result<(usize, usize)>;

    /// The vertex identifiers `0..num_vertices`.
    fn vertices(&self) -> Range<usize> {
        0..self.num_vertices()
    }

    /// The edge identifiers `0..num_edges`, parallel to [`edges`](Graph::edges).
    fn edge_indices(&self) -> Range<usize> {
        0..self.num_edges()
    }

    /// Number of live edges incident to `v`.
    ///
    /// **Panics** if `v` is out of bounds.
    fn degree(&self, v: usize) -> usize {
        self.adjacent_vertices(v).count()
    }

    /// Identifiers of the edges incident to `v`.
    fn out_edge_indices(&self, v: usize) -> OutEdgeIndices<Self::Incidences<'_>> {
        OutEdgeIndices { inner: self.incidences(v) }
    }

    /// Incident edges of `v` as `(v, neighbor)` pairs.
    fn out_edges(&self, v: usize) -> OutEdges<Self::Neighbors<'_>> {
        OutEdges { source: v, inner: self.adjacent_vertices(v) }
    }

    /// Incident edges of `v` as `(neighbor, v)` pairs; for the undirected
    /// variants this is `out_edges` with the endpoints flipped.
    fn in_edges(&self, v: usize) -> InEdges<Self::Neighbors<'_>> {
        InEdges { target: v, inner: self.adjacent_vertices(v) }
    }
}

/// Iterator returned by [`Graph::out_edge_indices`].
#[derive(Debug, Clone)]
pub struct OutEdgeIndices<I> {
    inner: I,
}

impl<I: Iterator<Item = (usize, usize)>> Iterator for OutEdgeIndices<I> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.inner.next().map(|(e, _)| e)
    }
}

/// Iterator returned by [`Graph::out_edges`].
#[derive(Debug, Clone)]
pub struct OutEdges<I> {
    source: usize,
    inner: I,
}

impl<I: Iterator<Item = usize>> Iterator for OutEdges<I> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        self.inner.next().map(|t| (self.source, t))
    }
}

/// Iterator returned by [`Graph::in_edges`].
#[derive(Debug, Clone)]
pub struct InEdges<I> {
    target: usize,
    inner: I,
}

impl<I: Iterator<Item = usize>> Iterator for InEdges<I> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        self.inner.next().map(|s| (s, self.target))
    }
}

/// Copy any graph into an explicit [`UndirectedGraph`], preserving the edge
/// enumeration order (and therefore the edge identifiers) of the source.
pub fn copy_graph<G: Graph>(graph: &G) -> UndirectedGraph {
    let mut g = UndirectedGraph::new(graph.num_vertices());
    for (s, t) in graph.edges() {
        if s != crate::INVALID {
            g.add_edge(s, t).expect("source graph yielded an invalid edge");
        }
    }
    g
}
