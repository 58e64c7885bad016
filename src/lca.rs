//! Constant-time lowest common ancestor queries after an
//! O(n log n) preprocessing of the tree.
//!
//! The preprocessing runs an Euler tour of the tree, records the first
//! occurrence and the depth of every node, and builds a sparse
//! range-minimum table over the depths along the tour; `lca(u, v)` is then
//! the node of minimum depth between the first occurrences of `u` and `v`.

use crate::tree::{Inclusion, Tree};
use rayon::prelude::*;

/// LCA preprocessing of a [`Tree`].
#[derive(Debug)]
pub struct LcaFast {
    euler: Vec<usize>,
    depth: Vec<u64>,
    represent: Vec<usize>,
    number: Vec<usize>,
    // minim[j][i]: position of the minimum depth in the tour window
    // starting at i on level j
    minim: Vec<Vec<usize>>,
}

impl LcaFast {
    /// Preprocess `tree` in O(n log n) time.
    pub fn new(tree: &Tree) -> Self {
        let n = tree.num_vertices();
        let tour_len = 2 * n - 1;

        let mut depth = vec![0u64; n];
        for v in tree.root_to_leaves_iterator(Inclusion::Include, Inclusion::Exclude) {
            depth[v] = depth[tree.parent(v)] + 1;
        }

        let mut euler = vec![0usize; tour_len];
        let mut represent = vec![0usize; tour_len];
        let mut number = vec![0usize; n];
        let mut position = 0;
        let mut stack = vec![(tree.root(), true)];
        while let Some((node, first_visit)) = stack.pop() {
            euler[position] = node;
            if first_visit {
                number[node] = position;
                represent[position] = node;
                for &son in tree.children(node) {
                    stack.push((node, false));
                    stack.push((son, true));
                }
            }
            position += 1;
        }
        debug_assert_eq!(position, tour_len);

        let levels = if tour_len <= 1 {
            0
        } else {
            (usize::BITS - (tour_len - 1).leading_zeros()) as usize
        };
        let mut minim: Vec<Vec<usize>> = Vec::with_capacity(levels);
        if levels > 0 {
            let level0: Vec<usize> = (0..tour_len)
                .into_par_iter()
                .map(|i| {
                    if i + 1 < tour_len && depth[euler[i]] >= depth[euler[i + 1]] {
                        i + 1
                    } else {
                        i
                    }
                })
                .collect();
            minim.push(level0);
            for j in 1..levels {
                let k1 = 1usize << (j - 1);
                let k2 = k1 << 1;
                let prev = &minim[j - 1];
                let level: Vec<usize> = (0..tour_len)
                    .into_par_iter()
                    .map(|i| {
                        if i + k2 >= tour_len {
                            tour_len - 1
                        } else if depth[euler[prev[i]]] <= depth[euler[prev[i + k1]]] {
                            prev[i]
                        } else {
                            prev[i + k1]
                        }
                    })
                    .collect();
                minim.push(level);
            }
        }

        LcaFast { euler, depth, represent, number, minim }
    }

    /// Number of nodes of the preprocessed tree.
    pub fn num_vertices(&self) -> usize {
        self.number.len()
    }

    /// Lowest common ancestor of `u` and `v`, in O(1).
    ///
    /// **Panics** if `u` or `v` is out of bounds.
    pub fn lca(&self, u: usize, v: usize) -> usize {
        let mut ii = self.number[u];
        let mut jj = self.number[v];
        if ii == jj {
            return self.represent[ii];
        }
        if ii > jj {
            std::mem::swap(&mut ii, &mut jj);
        }
        let k = (usize::BITS - 1 - (jj - ii).leading_zeros()) as usize;
        let left = self.minim[k][ii];
        let right = self.minim[k][jj - (1 << k)];
        let position = if self.depth[self.euler[left]] < self.depth[self.euler[right]] {
            left
        } else {
            right
        };
        self.represent[self.number[self.euler[position]]]
    }

    /// Lowest common ancestors of a batch of pairs; the queries are
    /// independent and run in parallel.
    pub fn lca_pairs(&self, pairs: &[(usize, usize)]) -> Vec<usize> {
        pairs.par_iter().map(|&(u, v)| self.lca(u, v)).collect()
    }
}
