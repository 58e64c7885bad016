//! A disjoint-set data structure with union by rank and path compression.

#[derive(Debug, Copy, Clone)]
struct Elt {
    rank: u32,
    set: usize,
}

/// A disjoint-set data structure or “Union & Find” datastructure.
///
/// <http://en.wikipedia.org/wiki/Disjoint-set_data_structure>
#[derive(Debug, Clone)]
pub struct UnionFind {
    v: Vec<Elt>,
}

impl UnionFind {
    /// Create a new `UnionFind` over `n` singleton sets.
    pub fn new(n: usize) -> Self {
        let v = (0..n).map(|index| Elt { rank: 0, set: index }).collect();
        UnionFind { v }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.v.len()
    }

    /// Whether the structure contains no element.
    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    /// Add a new singleton set and return its element.
    pub fn make_set(&mut self) -> usize {
        let index = self.v.len();
        self.v.push(Elt { rank: 0, set: index });
        index
    }

    /// Return the representative for `x` without modifying the structure.
    ///
    /// **Panics** if `x` is out of bounds.
    pub fn find(&self, x: usize) -> usize {
        let mut i = x;
        while self.v[i].set != i {
            i = self.v[i].set;
        }
        i
    }

    /// Return the representative for `x`.
    ///
    /// Find and write back the found representative, flattening the internal
    /// datastructure in the process and quicken future lookups.
    ///
    /// **Panics** if `x` is out of bounds.
    pub fn find_mut(&mut self, x: usize) -> usize {
        let root = self.find(x);
        // path compression: update set ids to point directly to the representative
        let mut i = x;
        while self.v[i].set != root {
            let next = self.v[i].set;
            self.v[i].set = root;
            i = next;
        }
        root
    }

    /// Unify the sets represented by the canonical elements `i` and `j` and
    /// return the canonical element of the union (either `i` or `j`).
    ///
    /// Both arguments must be representatives, i.e. `find(i) == i` and
    /// `find(j) == j`; the smaller-rank tree is attached below the other.
    ///
    /// **Panics** if `i` or `j` is out of bounds.
    pub fn link(&mut self, i: usize, j: usize) -> usize {
        debug_assert_eq!(self.v[i].set, i);
        debug_assert_eq!(self.v[j].set, j);
        let (child, root) = if self.v[i].rank > self.v[j].rank {
            (j, i)
        } else {
            if self.v[i].rank == self.v[j].rank {
                self.v[j].rank += 1;
            }
            (i, j)
        };
        self.v[child].set = root;
        root
    }

    /// Unify the two sets containing `x` and `y`.
    ///
    /// Return `false` if the sets were already the same, `true` if they were
    /// unified.
    ///
    /// **Panics** if `x` or `y` is out of bounds.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        if x == y {
            return false;
        }
        let xrep = self.find_mut(x);
        let yrep = self.find_mut(y);
        if xrep == yrep {
            return false;
        }
        self.link(xrep, yrep);
        true
    }
}
