//! Immutable rooted tree stored as a topologically-sorted parent array.

use crate::error::{Error, Result};
use crate::graph::Graph;
use ndarray::Array1;
use std::iter::Rev;
use std::ops::Range;
use std::sync::OnceLock;

/// Whether a tree was produced as a component tree or a partition tree.
///
/// The category only decides which algorithms accept the tree; perimeter
/// lengths, for instance, are only defined on component trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeCategory {
    PartitionTree,
    ComponentTree,
}

/// Include or skip the leaves prefix / the root in a tree traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Include,
    Exclude,
}

/// A rooted tree whose node indices are in topological order.
///
/// The parent array satisfies three invariants, checked at construction:
///
/// * the last node is the root and is its own parent, and only the root is;
/// * `parents[v] > v` for every non-root `v`, so every node index is larger
///   than all of its descendants;
/// * the leaves are exactly the prefix `[0, num_leaves)`.
///
/// Iterating nodes in ascending index order therefore visits every node
/// after all its descendants, and descending order visits every node before
/// any descendant; all bottom-up and top-down sweeps in this crate are
/// plain index loops.
#[derive(Debug)]
pub struct Tree {
    parents: Array1<usize>,
    num_leaves: usize,
    category: TreeCategory,
    children: OnceLock<Vec<Vec<usize>>>,
}

impl Tree {
    /// Build a partition tree from a parent array.
    ///
    /// Fails with `InvalidArgument` if the array is empty, a parent is out
    /// of range, the nodes are not in topological order, a non-root node is
    /// its own parent, or the leaves are not a prefix of the index range.
    pub fn new(parents: Array1<usize>) -> Result<Self> {
        Tree::with_category(parents, TreeCategory::PartitionTree)
    }

    /// Build a tree from a parent array with an explicit category tag.
    pub fn with_category(parents: Array1<usize>, category: TreeCategory) -> Result<Self> {
        let n = parents.len();
        if n == 0 {
            return Err(Error::invalid("a tree has at least one node"));
        }
        let root = n - 1;
        if parents[root] != root {
            return Err(Error::invalid(
                "nodes are not in a topological order (last node is not a root)",
            ));
        }
        let mut has_child = vec![false; n];
        for v in 0..root {
            let p = parents[v];
            if p == v {
                return Err(Error::invalid("several root nodes detected"));
            }
            if p <= v || p >= n {
                return Err(Error::invalid("nodes are not in a topological order"));
            }
            has_child[p] = true;
        }
        let num_leaves = has_child.iter().position(|&c| c).unwrap_or(n);
        if has_child[num_leaves..].iter().any(|&c| !c) {
            return Err(Error::invalid("leaf nodes are not before internal nodes"));
        }

        Ok(Tree {
            parents,
            num_leaves,
            category,
            children: OnceLock::new(),
        })
    }

    /// The category tag of the tree.
    pub fn category(&self) -> TreeCategory {
        self.category
    }

    /// Number of nodes.
    pub fn num_vertices(&self) -> usize {
        self.parents.len()
    }

    /// Number of leaves; the leaves are the indices `[0, num_leaves)`.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Number of edges, i.e. `num_vertices() - 1`.
    pub fn num_edges(&self) -> usize {
        self.parents.len() - 1
    }

    /// The root node, i.e. `num_vertices() - 1`.
    pub fn root(&self) -> usize {
        self.parents.len() - 1
    }

    /// Whether `v` is a leaf.
    pub fn is_leaf(&self, v: usize) -> bool {
        v < self.num_leaves
    }

    /// Parent of `v`; the root is its own parent.
    ///
    /// **Panics** if `v` is out of bounds.
    pub fn parent(&self, v: usize) -> usize {
        self.parents[v]
    }

    /// The whole parent array.
    pub fn parents(&self) -> &Array1<usize> {
        &self.parents
    }

    // children lists are materialized on first request and cached
    fn children_lists(&self) -> &Vec<Vec<usize>> {
        self.children.get_or_init(|| {
            let n = self.num_vertices();
            let mut children = vec![Vec::new(); n];
            for v in 0..n - 1 {
                children[self.parents[v]].push(v);
            }
            children
        })
    }

    /// Children of `v`, in increasing index order.
    ///
    /// **Panics** if `v` is out of bounds.
    pub fn children(&self, v: usize) -> &[usize] {
        &self.children_lists()[v]
    }

    /// Number of children of `v`.
    pub fn num_children(&self, v: usize) -> usize {
        self.children_lists()[v].len()
    }

    /// The `k`-th child of `v`.
    ///
    /// **Panics** if `v` is out of bounds or `k >= num_children(v)`.
    pub fn child(&self, k: usize, v: usize) -> usize {
        self.children_lists()[v][k]
    }

    /// Node indices in ascending order: every node is visited after all of
    /// its descendants.
    pub fn leaves_to_root_iterator(&self, leaves: Inclusion, root: Inclusion) -> Range<usize> {
        let start = match leaves {
            Inclusion::Include => 0,
            Inclusion::Exclude => self.num_leaves,
        };
        let end = match root {
            Inclusion::Include => self.num_vertices(),
            Inclusion::Exclude => self.num_vertices() - 1,
        };
        start..end.max(start)
    }

    /// Node indices in descending order: every node is visited before any of
    /// its descendants.
    pub fn root_to_leaves_iterator(&self, leaves: Inclusion, root: Inclusion) -> Rev<Range<usize>> {
        self.leaves_to_root_iterator(leaves, root).rev()
    }

    /// The leaf indices `[0, num_leaves)`.
    pub fn leaves_iterator(&self) -> Range<usize> {
        0..self.num_leaves
    }
}

/// Iterator over the `(edge_id, neighbor)` incidences of a tree node:
/// children first, then the parent edge.
#[derive(Debug)]
pub struct TreeIncidences<'a> {
    children: std::slice::Iter<'a, usize>,
    parent: Option<(usize, usize)>,
}

impl Iterator for TreeIncidences<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        // the edge towards child c has id c, the edge towards the parent has id v
        if let Some(&c) = self.children.next() {
            return Some((c, c));
        }
        self.parent.take()
    }
}

/// Iterator over the neighbors of a tree node: children first, then the
/// parent.
#[derive(Debug)]
pub struct TreeNeighbors<'a> {
    inner: TreeIncidences<'a>,
}

impl Iterator for TreeNeighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.inner.next().map(|(_, n)| n)
    }
}

/// Iterator over the edges `(v, parent(v))` of a tree.
#[derive(Debug)]
pub struct TreeEdges<'a> {
    parents: &'a Array1<usize>,
    v: usize,
}

impl Iterator for TreeEdges<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.v + 1 < self.parents.len() {
            let v = self.v;
            self.v += 1;
            Some((v, self.parents[v]))
        } else {
            None
        }
    }
}

impl Graph for Tree {
    type Neighbors<'a> = TreeNeighbors<'a>;
    type Incidences<'a> = TreeIncidences<'a>;
    type Edges<'a> = TreeEdges<'a>;

    fn num_vertices(&self) -> usize {
        Tree::num_vertices(self)
    }

    fn num_edges(&self) -> usize {
        Tree::num_edges(self)
    }

    fn adjacent_vertices(&self, v: usize) -> TreeNeighbors<'_> {
        TreeNeighbors { inner: self.incidences(v) }
    }

    fn incidences(&self, v: usize) -> TreeIncidences<'_> {
        let parent = if v == self.root() {
            None
        } else {
            Some((v, self.parents[v]))
        };
        TreeIncidences {
            children: self.children(v).iter(),
            parent,
        }
    }

    fn edges(&self) -> TreeEdges<'_> {
        TreeEdges { parents: &self.parents, v: 0 }
    }

    fn edge_from_id(&self, e: usize) -> Result<(usize, usize)> {
        if e >= self.num_edges() {
            return Err(Error::out_of_range(format!(
                "edge id {e} outside [0, {})",
                self.num_edges()
            )));
        }
        Ok((e, self.parents[e]))
    }

    fn degree(&self, v: usize) -> usize {
        self.num_children(v) + usize::from(v != self.root())
    }
}
