//! Explicit undirected graph with owned edge and incidence lists.

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::INVALID;

/// An undirected graph storing an ordered edge sequence and per-vertex
/// incidence lists.
///
/// Edges are stored as `(s, t)` with `s <= t`; parallel edges and self loops
/// are permitted. Removing an edge turns its slot into
/// `(INVALID, INVALID)` while preserving the identifiers of all other
/// edges, so `num_edges` counts slots and [`Graph::degree`] counts live
/// incidences.
#[derive(Debug, Clone, Default)]
pub struct UndirectedGraph {
    edges: Vec<(usize, usize)>,
    // (edge_id, neighbor) pairs, in insertion order
    incidences: Vec<Vec<(usize, usize)>>,
}

impl UndirectedGraph {
    /// Create a graph with `n` vertices and no edges.
    pub fn new(n: usize) -> Self {
        UndirectedGraph {
            edges: Vec::new(),
            incidences: vec![Vec::new(); n],
        }
    }

    /// Add a new isolated vertex and return its identifier.
    pub fn add_vertex(&mut self) -> usize {
        self.incidences.push(Vec::new());
        self.incidences.len() - 1
    }

    /// Add an edge between `s` and `t` and return its identifier.
    ///
    /// Fails with `InvalidArgument` if either endpoint is out of range.
    pub fn add_edge(&mut self, s: usize, t: usize) -> Result<usize> {
        let n = self.num_vertices();
        if s >= n || t >= n {
            return Err(Error::invalid(format!(
                "edge ({s}, {t}) has an endpoint outside the vertex range [0, {n})"
            )));
        }
        let (s, t) = if s <= t { (s, t) } else { (t, s) };
        let e = self.edges.len();
        self.edges.push((s, t));
        self.incidences[s].push((e, t));
        self.incidences[t].push((e, s));
        Ok(e)
    }

    /// Add one edge per `(sources[i], targets[i])` pair.
    ///
    /// Fails with `InvalidArgument` if the two slices differ in length or an
    /// endpoint is out of range; no edge is added in that case.
    pub fn add_edges(&mut self, sources: &[usize], targets: &[usize]) -> Result<()> {
        if sources.len() != targets.len() {
            return Err(Error::invalid("sources and targets must have the same length"));
        }
        let n = self.num_vertices();
        if let Some((&s, &t)) = sources
            .iter()
            .zip(targets)
            .find(|&(&s, &t)| s >= n || t >= n)
        {
            return Err(Error::invalid(format!(
                "edge ({s}, {t}) has an endpoint outside the vertex range [0, {n})"
            )));
        }
        for (&s, &t) in sources.iter().zip(targets) {
            self.add_edge(s, t)?;
        }
        Ok(())
    }

    /// Remove the edge with identifier `e`.
    ///
    /// The edge slot becomes `(INVALID, INVALID)` and keeps its identifier;
    /// subsequent ids are unaffected. Fails with `OutOfRange` if `e` is not
    /// a valid identifier and with `InvalidArgument` if the edge was already
    /// removed.
    pub fn remove_edge(&mut self, e: usize) -> Result<()> {
        if e >= self.edges.len() {
            return Err(Error::out_of_range(format!(
                "edge id {e} outside [0, {})",
                self.edges.len()
            )));
        }
        let (s, t) = self.edges[e];
        if s == INVALID {
            return Err(Error::invalid(format!("edge {e} was already removed")));
        }
        self.edges[e] = (INVALID, INVALID);
        self.incidences[s].retain(|&(id, _)| id != e);
        if t != s {
            self.incidences[t].retain(|&(id, _)| id != e);
        }
        Ok(())
    }

    /// Source endpoints of all edge slots.
    pub fn sources(&self) -> Vec<usize> {
        self.edges.iter().map(|&(s, _)| s).collect()
    }

    /// Target endpoints of all edge slots.
    pub fn targets(&self) -> Vec<usize> {
        self.edges.iter().map(|&(_, t)| t).collect()
    }
}

/// Iterator over the neighbors of a vertex.
#[derive(Debug, Clone)]
pub struct Neighbors<'a> {
    inner: std::slice::Iter<'a, (usize, usize)>,
}

impl Iterator for Neighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.inner.next().map(|&(_, n)| n)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over the `(edge_id, neighbor)` incidences of a vertex.
#[derive(Debug, Clone)]
pub struct Incidences<'a> {
    inner: std::slice::Iter<'a, (usize, usize)>,
}

impl Iterator for Incidences<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl Graph for UndirectedGraph {
    type Neighbors<'a> = Neighbors<'a>;
    type Incidences<'a> = Incidences<'a>;
    type Edges<'a> = std::iter::Copied<std::slice::Iter<'a, (usize, usize)>>;

    fn num_vertices(&self) -> usize {
        self.incidences.len()
    }

    fn num_edges(&self) -> usize {
        self.edges.len()
    }

    fn adjacent_vertices(&self, v: usize) -> Neighbors<'_> {
        Neighbors { inner: self.incidences[v].iter() }
    }

    fn incidences(&self, v: usize) -> Incidences<'_> {
        Incidences { inner: self.incidences[v].iter() }
    }

    fn edges(&self) -> Self::Edges<'_> {
        self.edges.iter().copied()
    }

    fn edge_from_id(&self, e: usize) -> Result<(usize, usize)> {
        self.edges
            .get(e)
            .copied()
            .ok_or_else(|| Error::out_of_range(format!("edge id {e} outside [0, {})", self.edges.len())))
    }

    fn degree(&self, v: usize) -> usize {
        self.incidences[v].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_query() {
        let mut g = UndirectedGraph::new(4);
        let e0 = g.add_edge(0, 1).unwrap();
        let e1 = g.add_edge(3, 1).unwrap();
        let e2 = g.add_edge(1, 2).unwrap();
        assert_eq!((e0, e1, e2), (0, 1, 2));
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.num_edges(), 3);
        // normalized to (s, t) with s <= t
        assert_eq!(g.edge_from_id(1).unwrap(), (1, 3));
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 3), (1, 2)]);
        assert_eq!(g.degree(1), 3);
        assert_eq!(g.adjacent_vertices(1).collect::<Vec<_>>(), vec![0, 3, 2]);
        assert_eq!(g.incidences(1).collect::<Vec<_>>(), vec![(0, 0), (1, 3), (2, 2)]);
        assert_eq!(g.out_edges(1).collect::<Vec<_>>(), vec![(1, 0), (1, 3), (1, 2)]);
        assert_eq!(g.in_edges(1).collect::<Vec<_>>(), vec![(0, 1), (3, 1), (2, 1)]);
    }

    #[test]
    fn removal_keeps_edge_ids() {
        let mut g = UndirectedGraph::new(3);
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(0, 2).unwrap();
        g.remove_edge(1).unwrap();

        // the slot is kept, ids are stable
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.edge_from_id(1).unwrap(), (INVALID, INVALID));
        assert_eq!(g.edge_from_id(2).unwrap(), (0, 2));
        assert_eq!(g.degree(1), 1);
        assert_eq!(g.degree(2), 1);
        assert!(g.remove_edge(1).is_err());
        assert!(g.remove_edge(7).is_err());
    }

    #[test]
    fn parallel_edges_and_self_loops() {
        let mut g = UndirectedGraph::new(2);
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 0).unwrap();
        g.add_edge(0, 0).unwrap();
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.degree(0), 4);
        assert_eq!(g.degree(1), 2);
    }

    #[test]
    fn out_of_range_endpoint() {
        let mut g = UndirectedGraph::new(2);
        assert!(g.add_edge(0, 2).is_err());
        assert!(g.edge_from_id(0).is_err());
    }
}
