//! Implicit regular-grid graph defined by a shape and neighbor offsets.

use crate::embedding::GridEmbedding;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::INVALID;
use std::sync::OnceLock;

/// A regular graph over a grid: every vertex is a cell of the embedding and
/// its neighbors are the cells reached by a fixed list of offset vectors.
///
/// The neighbor *declaration order* is authoritative: adjacency iteration
/// follows it, and edges are ordered by `(source, offset index)`
/// lexicographically, each undirected edge being assigned to its first
/// incidence. A rectangular *safe interior* is precomputed where every
/// offset stays inside the grid; inside it adjacency reduces to adding
/// precomputed linear strides and no bounds checks run.
#[derive(Debug)]
pub struct RegularGraph {
    embedding: GridEmbedding,
    neighbors: Vec<Vec<i64>>,
    safe_lower: Vec<i64>,
    safe_upper: Vec<i64>,
    safe_nonempty: bool,
    relative: Vec<i64>,
    // index of the negated offset in `neighbors`, INVALID if absent
    reverse: Vec<usize>,
    edge_index: OnceLock<EdgeIndex>,
}

#[derive(Debug)]
struct EdgeIndex {
    // starts[v] = number of edges owned by vertices < v; starts[n] = total
    starts: Vec<usize>,
}

impl RegularGraph {
    /// Create a regular graph for `embedding` with the given neighbor
    /// offsets.
    ///
    /// Fails with `InvalidArgument` if an offset does not have one
    /// coordinate per embedding axis.
    pub fn new(embedding: GridEmbedding, neighbors: Vec<Vec<i64>>) -> Result<Self> {
        let dim = embedding.dimension();
        if neighbors.iter().any(|n| n.len() != dim) {
            return Err(Error::invalid(format!(
                "neighbor offsets must have {dim} coordinates"
            )));
        }

        // largest sub domain in which every neighbor of a vertex is inside
        // the grid, so adjacency can use precomputed linear strides
        let mut safe_lower = vec![0i64; dim];
        let mut safe_upper: Vec<i64> = embedding.shape().iter().map(|&s| s - 1).collect();
        for n in &neighbors {
            for i in 0..dim {
                safe_lower[i] = safe_lower[i].max(-n[i]);
                safe_upper[i] = safe_upper[i].min(embedding.shape()[i] - 1 - n[i]);
            }
        }
        let safe_nonempty = safe_lower.iter().zip(&safe_upper).all(|(l, u)| l <= u);

        let mut relative = Vec::with_capacity(neighbors.len());
        if safe_nonempty {
            let ref_index = embedding.grid_to_lin(&safe_lower) as i64;
            for n in &neighbors {
                let shifted: Vec<i64> = safe_lower.iter().zip(n).map(|(a, b)| a + b).collect();
                relative.push(embedding.grid_to_lin(&shifted) as i64 - ref_index);
            }
        }

        let reverse = neighbors
            .iter()
            .map(|n| {
                let negated: Vec<i64> = n.iter().map(|&c| -c).collect();
                neighbors
                    .iter()
                    .position(|m| *m == negated)
                    .unwrap_or(INVALID)
            })
            .collect();

        Ok(RegularGraph {
            embedding,
            neighbors,
            safe_lower,
            safe_upper,
            safe_nonempty,
            relative,
            reverse,
            edge_index: OnceLock::new(),
        })
    }

    /// The grid embedding of the graph.
    pub fn embedding(&self) -> &GridEmbedding {
        &self.embedding
    }

    /// The declared neighbor offsets.
    pub fn neighbor_offsets(&self) -> &[Vec<i64>] {
        &self.neighbors
    }

    fn in_safe_area(&self, coordinates: &[i64]) -> bool {
        self.safe_nonempty
            && coordinates
                .iter()
                .zip(self.safe_lower.iter().zip(&self.safe_upper))
                .all(|(&c, (&l, &u))| c >= l && c <= u)
    }

    // neighbor reached from `source` by offset `k`, if inside the grid
    fn neighbor_at(&self, source: usize, coordinates: &[i64], safe: bool, k: usize) -> Option<usize> {
        if safe {
            Some((source as i64 + self.relative[k]) as usize)
        } else {
            let target: Vec<i64> = coordinates
                .iter()
                .zip(&self.neighbors[k])
                .map(|(a, b)| a + b)
                .collect();
            if self.embedding.contains(&target) {
                Some(self.embedding.grid_to_lin(&target))
            } else {
                None
            }
        }
    }

    // an incidence (s, k) -> t owns the edge unless the reverse incidence
    // (t, reverse[k]) comes first lexicographically
    fn owns_edge(&self, s: usize, t: usize, k: usize) -> bool {
        !(t < s && self.reverse[k] != INVALID)
    }

    fn index(&self) -> &EdgeIndex {
        self.edge_index.get_or_init(|| {
            let n = self.embedding.size();
            let mut starts = Vec::with_capacity(n + 1);
            let mut count = 0;
            for v in 0..n {
                starts.push(count);
                let coordinates = self.embedding.lin_to_grid(v);
                let safe = self.in_safe_area(&coordinates);
                for k in 0..self.neighbors.len() {
                    if let Some(t) = self.neighbor_at(v, &coordinates, safe, k) {
                        if self.owns_edge(v, t, k) {
                            count += 1;
                        }
                    }
                }
            }
            starts.push(count);
            EdgeIndex { starts }
        })
    }

    // identifier of the edge carried by the incidence (s, k) -> t
    fn edge_id_at(&self, s: usize, t: usize, k: usize) -> usize {
        let (owner, owner_k) = if self.owns_edge(s, t, k) {
            (s, k)
        } else {
            (t, self.reverse[k])
        };
        let coordinates = self.embedding.lin_to_grid(owner);
        let safe = self.in_safe_area(&coordinates);
        let mut rank = 0;
        for kk in 0..owner_k {
            if let Some(tt) = self.neighbor_at(owner, &coordinates, safe, kk) {
                if self.owns_edge(owner, tt, kk) {
                    rank += 1;
                }
            }
        }
        self.index().starts[owner] + rank
    }
}

/// Iterator over the in-grid neighbors of a vertex.
#[derive(Debug)]
pub struct GridNeighbors<'a> {
    graph: &'a RegularGraph,
    source: usize,
    coordinates: Vec<i64>,
    safe: bool,
    k: usize,
}

impl Iterator for GridNeighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.k < self.graph.neighbors.len() {
            let k = self.k;
            self.k += 1;
            if let Some(t) = self.graph.neighbor_at(self.source, &self.coordinates, self.safe, k) {
                return Some(t);
            }
        }
        None
    }
}

/// Iterator over the `(edge_id, neighbor)` incidences of a vertex.
#[derive(Debug)]
pub struct GridIncidences<'a> {
    graph: &'a RegularGraph,
    source: usize,
    coordinates: Vec<i64>,
    safe: bool,
    k: usize,
}

impl Iterator for GridIncidences<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        while self.k < self.graph.neighbors.len() {
            let k = self.k;
            self.k += 1;
            if let Some(t) = self.graph.neighbor_at(self.source, &self.coordinates, self.safe, k) {
                return Some((self.graph.edge_id_at(self.source, t, k), t));
            }
        }
        None
    }
}

/// Iterator over the edges of a regular graph in `(source, offset)` order.
#[derive(Debug)]
pub struct GridEdges<'a> {
    graph: &'a RegularGraph,
    v: usize,
    coordinates: Vec<i64>,
    safe: bool,
    k: usize,
}

impl Iterator for GridEdges<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        let n = self.graph.embedding.size();
        while self.v < n {
            while self.k < self.graph.neighbors.len() {
                let k = self.k;
                self.k += 1;
                if let Some(t) = self.graph.neighbor_at(self.v, &self.coordinates, self.safe, k) {
                    if self.graph.owns_edge(self.v, t, k) {
                        return Some((self.v, t));
                    }
                }
            }
            self.v += 1;
            self.k = 0;
            if self.v < n {
                self.coordinates = self.graph.embedding.lin_to_grid(self.v);
                self.safe = self.graph.in_safe_area(&self.coordinates);
            }
        }
        None
    }
}

impl Graph for RegularGraph {
    type Neighbors<'a> = GridNeighbors<'a>;
    type Incidences<'a> = GridIncidences<'a>;
    type Edges<'a> = GridEdges<'a>;

    fn num_vertices(&self) -> usize {
        self.embedding.size()
    }

    fn num_edges(&self) -> usize {
        let starts = &self.index().starts;
        starts[starts.len() - 1]
    }

    fn adjacent_vertices(&self, v: usize) -> GridNeighbors<'_> {
        assert!(v < self.num_vertices(), "vertex {v} out of bounds");
        let coordinates = self.embedding.lin_to_grid(v);
        let safe = self.in_safe_area(&coordinates);
        GridNeighbors { graph: self, source: v, coordinates, safe, k: 0 }
    }

    fn incidences(&self, v: usize) -> GridIncidences<'_> {
        assert!(v < self.num_vertices(), "vertex {v} out of bounds");
        let coordinates = self.embedding.lin_to_grid(v);
        let safe = self.in_safe_area(&coordinates);
        GridIncidences { graph: self, source: v, coordinates, safe, k: 0 }
    }

    fn edges(&self) -> GridEdges<'_> {
        let coordinates = if self.embedding.size() > 0 {
            self.embedding.lin_to_grid(0)
        } else {
            vec![0; self.embedding.dimension()]
        };
        let safe = self.in_safe_area(&coordinates);
        GridEdges { graph: self, v: 0, coordinates, safe, k: 0 }
    }

    fn edge_from_id(&self, e: usize) -> Result<(usize, usize)> {
        let starts = &self.index().starts;
        let total = starts[starts.len() - 1];
        if e >= total {
            return Err(Error::out_of_range(format!("edge id {e} outside [0, {total})")));
        }
        // owner vertex: last v with starts[v] <= e
        let owner = starts.partition_point(|&x| x <= e) - 1;
        let mut rank = e - starts[owner];
        let coordinates = self.embedding.lin_to_grid(owner);
        let safe = self.in_safe_area(&coordinates);
        for k in 0..self.neighbors.len() {
            if let Some(t) = self.neighbor_at(owner, &coordinates, safe, k) {
                if self.owns_edge(owner, t, k) {
                    if rank == 0 {
                        return Ok((owner, t));
                    }
                    rank -= 1;
                }
            }
        }
        unreachable!("edge index is consistent with the offset list")
    }

    fn degree(&self, v: usize) -> usize {
        let coordinates = self.embedding.lin_to_grid(v);
        if self.in_safe_area(&coordinates) {
            self.neighbors.len()
        } else {
            self.adjacent_vertices(v).count()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn grid_4(h: usize, w: usize) -> RegularGraph {
        let embedding = GridEmbedding::new(&[h, w]).unwrap();
        RegularGraph::new(
            embedding,
            vec![vec![-1, 0], vec![0, -1], vec![0, 1], vec![1, 0]],
        )
        .unwrap()
    }

    #[test]
    fn four_adjacency_counts() {
        let g = grid_4(3, 4);
        assert_eq!(g.num_vertices(), 12);
        // 2 * h * w - h - w undirected edges
        assert_eq!(g.num_edges(), 17);
        assert_eq!(g.degree(5), 4); // interior
        assert_eq!(g.degree(0), 2); // corner
        assert_eq!(g.degree(1), 3); // border
    }

    #[test]
    fn adjacency_follows_declaration_order() {
        let g = grid_4(3, 4);
        // interior vertex: up, left, right, down
        assert_eq!(g.adjacent_vertices(5).collect::<Vec<_>>(), vec![1, 4, 6, 9]);
        // corner: only right and down are in range
        assert_eq!(g.adjacent_vertices(0).collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn edge_ids_are_consistent() {
        let g = grid_4(3, 4);
        let edges: Vec<_> = g.edges().collect();
        assert_eq!(edges.len(), g.num_edges());
        // per source: right edge first, then down edge
        assert_eq!(edges[0], (0, 1));
        assert_eq!(edges[1], (0, 4));
        for (e, &(s, t)) in edges.iter().enumerate() {
            assert_eq!(g.edge_from_id(e).unwrap(), (s, t));
        }
        // incidences report the id of the owning incidence
        for v in g.vertices() {
            for (e, t) in g.incidences(v) {
                let (a, b) = g.edge_from_id(e).unwrap();
                assert!((a, b) == (v, t) || (a, b) == (t, v));
            }
        }
    }

    #[test]
    fn handshake_lemma() {
        let g = grid_4(4, 4);
        let total: usize = g.vertices().map(|v| g.degree(v)).sum();
        assert_eq!(total, 2 * g.num_edges());
    }

    #[test]
    fn safe_interior_matches_checked_path() {
        let g = grid_4(8, 8);
        for v in g.vertices() {
            let by_iter: Vec<_> = g.adjacent_vertices(v).collect();
            let coordinates = g.embedding().lin_to_grid(v);
            let mut by_hand = Vec::new();
            for offset in g.neighbor_offsets() {
                let t: Vec<i64> = coordinates.iter().zip(offset).map(|(a, b)| a + b).collect();
                if g.embedding().contains(&t) {
                    by_hand.push(g.embedding().grid_to_lin(&t));
                }
            }
            assert_eq!(by_iter, by_hand);
        }
    }
}
