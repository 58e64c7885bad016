//! Cost-scaling assignment by push-relabel, after the CSA code of Goldberg
//! and Kennedy.
//!
//! The solver works on a bipartite graph with `lhs_n` left nodes and
//! `rhs_n` right nodes and minimizes the total cost of a perfect matching.
//! Left-node prices are implicit; an epsilon-scaling outer loop divides the
//! scaling parameter until it drops below `2 / (n + 1)`, running a *refine*
//! phase at each scale. Refine repeatedly performs double-pushes on active
//! (unmatched) left nodes, kept in LIFO order: saturate the
//! minimum-reduced-cost arc, displace the right node's previous mate, and
//! relabel the right node. Per left node, a best-list of `NUM_BEST`
//! candidate arcs with a `next_best` bound finds the minimum-reduced-cost
//! arc without scanning the whole adjacency list ("quick min").
//!
//! Termination requires a perfect matching to exist; this is a caller
//! obligation, the solver loops forever on infeasible inputs.

use crate::error::{Error, Result};
use crate::INVALID;

const NUM_BEST: usize = 3;
const DEFAULT_SCALE_FACTOR: f64 = 10.0;

pub(crate) struct Csa {
    lhs_n: usize,

    // arcs, grouped contiguously by left node
    arc_head: Vec<usize>,
    arc_cost: Vec<f64>,
    arc_edge: Vec<usize>,
    first_arc: Vec<usize>,

    // right-node prices and the current matching
    price: Vec<f64>,
    matched_arc: Vec<usize>,
    matched_lhs: Vec<usize>,

    // quick-min candidate lists
    best: Vec<[usize; NUM_BEST]>,
    next_best: Vec<f64>,
    few_arcs: Vec<bool>,

    active: Vec<usize>,
    epsilon: f64,
    min_epsilon: f64,
    po_cost_thresh: f64,
    total_e: usize,
}

impl Csa {
    /// Solve the assignment problem for the given edge list.
    ///
    /// `sources[i]` must lie in `[0, n/2)` and `targets[i]` in `[n/2, n)`;
    /// `n` must be even and positive and at least one edge is required.
    pub(crate) fn solve(
        sources: &[usize],
        targets: &[usize],
        num_vertices: usize,
        weights: &[i64],
        edge_ids: &[usize],
    ) -> Result<Vec<usize>> {
        if num_vertices == 0 || num_vertices % 2 != 0 {
            return Err(Error::invalid("the number of vertices must be positive and even"));
        }
        if sources.is_empty() {
            return Err(Error::invalid("the graph must have at least one edge"));
        }
        let lhs_n = num_vertices / 2;
        for (&s, &t) in sources.iter().zip(targets) {
            if s >= lhs_n || t < lhs_n || t >= num_vertices {
                return Err(Error::invalid(format!(
                    "edge ({s}, {t}) does not connect the left side [0, {lhs_n}) to the right side [{lhs_n}, {num_vertices})"
                )));
            }
        }

        let mut csa = Csa::init(sources, targets, lhs_n, weights, edge_ids)?;
        csa.run();
        Ok(csa.matching())
    }

    fn init(
        sources: &[usize],
        targets: &[usize],
        lhs_n: usize,
        weights: &[i64],
        edge_ids: &[usize],
    ) -> Result<Csa> {
        let m = sources.len();

        // bucket the arcs by left node, preserving input order inside a bucket
        let mut degree = vec![0usize; lhs_n];
        for &s in sources {
            degree[s] += 1;
        }
        if let Some(v) = degree.iter().position(|&d| d == 0) {
            return Err(Error::invalid(format!(
                "left vertex {v} has no incident edge, no perfect matching exists"
            )));
        }
        let mut first_arc = Vec::with_capacity(lhs_n + 1);
        let mut next = 0;
        for v in 0..lhs_n {
            first_arc.push(next);
            next += degree[v];
        }
        first_arc.push(next);

        let mut cursor = first_arc[..lhs_n].to_vec();
        let mut arc_head = vec![0usize; m];
        let mut arc_cost = vec![0.0; m];
        let mut arc_edge = vec![0usize; m];
        let mut max_cost = 0i64;
        for i in 0..m {
            let a = cursor[sources[i]];
            cursor[sources[i]] += 1;
            arc_head[a] = targets[i] - lhs_n;
            arc_cost[a] = weights[i] as f64;
            arc_edge[a] = edge_ids[i];
            max_cost = max_cost.max(weights[i].abs());
        }

        let few_arcs = (0..lhs_n)
            .map(|v| first_arc[v + 1] - first_arc[v] < NUM_BEST + 1)
            .collect();

        let n = 2 * lhs_n;
        let mut csa = Csa {
            lhs_n,
            arc_head,
            arc_cost,
            arc_edge,
            first_arc,
            price: vec![0.0; lhs_n],
            matched_arc: vec![INVALID; lhs_n],
            matched_lhs: vec![INVALID; lhs_n],
            best: vec![[INVALID; NUM_BEST]; lhs_n],
            next_best: vec![0.0; lhs_n],
            few_arcs,
            active: Vec::with_capacity(lhs_n),
            epsilon: max_cost as f64,
            min_epsilon: 2.0 / (n as f64 + 1.0),
            po_cost_thresh: 2.0 * n as f64 * (DEFAULT_SCALE_FACTOR + 1.0),
            total_e: 0,
        };
        for v in 0..lhs_n {
            if !csa.few_arcs[v] {
                csa.best_build(v);
            }
        }
        Ok(csa)
    }

    fn reduced_cost(&self, a: usize) -> f64 {
        self.arc_cost[a] - self.price[self.arc_head[a]]
    }

    // rebuild the best-list of v: the NUM_BEST arcs of minimum reduced
    // cost, sorted, plus a bound under which the list is trustworthy
    fn best_build(&mut self, v: usize) {
        let first = self.first_arc[v];
        let stop = self.first_arc[v + 1];
        let mut best = [INVALID; NUM_BEST];

        for i in 0..NUM_BEST {
            let a = first + i;
            let rc = self.reduced_cost(a);
            self.sort_insert(&mut best, i, a, rc, i + 1);
        }

        // initial next_best from the first arc beyond the list
        let mut a = first + NUM_BEST;
        let rc = self.reduced_cost(a);
        let worst = self.reduced_cost(best[NUM_BEST - 1]);
        let mut next_best;
        if rc < worst {
            self.sort_insert(&mut best, NUM_BEST, a, rc, NUM_BEST);
            next_best = worst;
        } else {
            next_best = rc;
        }
        a += 1;

        while a != stop {
            let rc = self.reduced_cost(a);
            if rc < next_best {
                let worst = self.reduced_cost(best[NUM_BEST - 1]);
                if rc < worst {
                    self.sort_insert(&mut best, NUM_BEST, a, rc, NUM_BEST);
                    next_best = worst;
                } else {
                    next_best = rc;
                }
            }
            a += 1;
        }

        self.best[v] = best;
        self.next_best[v] = next_best;
    }

    // insert arc a with reduced cost a_rc into the sorted prefix of length
    // `size`, the list holding `nsize` entries afterwards
    fn sort_insert(&self, best: &mut [usize; NUM_BEST], size: usize, a: usize, a_rc: f64, nsize: usize) {
        if size == 0 {
            best[0] = a;
            return;
        }
        let mut at = size.min(nsize - 1);
        for i in 0..size {
            if a_rc < self.reduced_cost(best[i]) {
                at = i;
                for k in ((i + 1)..nsize).rev() {
                    best[k] = best[k - 1];
                }
                break;
            }
        }
        best[at] = a;
    }

    // assume v is unmatched and perform a double push from it
    fn double_push(&mut self, v: usize) {
        let first = self.first_arc[v];
        let stop = self.first_arc[v + 1];

        // part I: the minimum-reduced-cost arc adm and the gap to the
        // second-minimum reduced cost
        let mut adm;
        let mut v_pref;
        let mut v_second;
        if self.few_arcs[v] {
            adm = first;
            v_pref = self.reduced_cost(first);
            v_second = v_pref + self.epsilon * (self.po_cost_thresh + 1.0);
            for a in first + 1..stop {
                let rc = self.reduced_cost(a);
                if v_pref > rc {
                    v_second = v_pref;
                    v_pref = rc;
                    adm = a;
                } else if v_second > rc {
                    v_second = rc;
                }
            }
        } else {
            adm = self.best[v][1];
            v_second = self.reduced_cost(adm);
            adm = self.best[v][0];
            v_pref = self.reduced_cost(adm);
            if v_pref > v_second {
                adm = self.best[v][1];
                std::mem::swap(&mut v_pref, &mut v_second);
            }
            for i in 2..NUM_BEST {
                let a = self.best[v][i];
                let rc = self.reduced_cost(a);
                if v_pref > rc {
                    v_second = v_pref;
                    v_pref = rc;
                    adm = a;
                } else if v_second > rc {
                    v_second = rc;
                }
            }
            if v_second > self.next_best[v] {
                // the list can no longer be trusted
                self.best_build(v);
                adm = self.best[v][0];
                v_pref = self.reduced_cost(adm);
                v_second = self.reduced_cost(self.best[v][1]);
            }
        }

        let adm_gap = v_second - v_pref;

        // part II: match v through adm, displacing the previous mate of the
        // right node, then relabel the right node so the matched arc has
        // implicit reduced cost -epsilon
        let w = self.arc_head[adm];
        let u = self.matched_lhs[w];
        if u != INVALID {
            self.matched_arc[u] = INVALID;
            self.active.push(u);
        } else {
            self.total_e -= 1;
        }
        self.matched_arc[v] = adm;
        self.matched_lhs[w] = v;
        self.price[w] -= adm_gap + self.epsilon;
    }

    // saturate all negative arcs (unmatch everything) and push until no
    // left node has excess
    fn refine(&mut self) {
        self.total_e = 0;
        self.active.clear();
        for v in 0..self.lhs_n {
            if self.matched_arc[v] != INVALID {
                let w = self.arc_head[self.matched_arc[v]];
                self.matched_lhs[w] = INVALID;
                self.matched_arc[v] = INVALID;
            }
            self.total_e += 1;
            self.active.push(v);
        }
        while self.total_e > 0 {
            let v = self.active.pop().expect("active count tracks total excess");
            self.double_push(v);
        }
    }

    fn run(&mut self) {
        loop {
            self.epsilon = (self.epsilon / DEFAULT_SCALE_FACTOR).max(self.min_epsilon);
            self.refine();
            if self.epsilon <= self.min_epsilon {
                return;
            }
        }
    }

    fn matching(&self) -> Vec<usize> {
        (0..self.lhs_n)
            .map(|v| self.arc_edge[self.matched_arc[v]])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Csa;

    #[test]
    fn unit_weights() {
        let sources = [0, 0, 1, 1, 2];
        let targets = [3, 4, 3, 5, 5];
        let weights = [1i64; 5];
        let ids = [0, 1, 2, 3, 4];
        let mut res = Csa::solve(&sources, &targets, 6, &weights, &ids).unwrap();
        res.sort_unstable();
        assert_eq!(res, vec![1, 2, 4]);
    }

    #[test]
    fn weighted_instance() {
        let sources = [0, 0, 1, 1, 2, 1];
        let targets = [3, 4, 3, 5, 5, 4];
        let weights = [3i64, 1, 6, 0, 10, 2];
        let ids = [0, 1, 2, 3, 4, 5];
        let mut res = Csa::solve(&sources, &targets, 6, &weights, &ids).unwrap();
        res.sort_unstable();
        assert_eq!(res, vec![0, 4, 5]);
    }

    #[test]
    fn single_edge() {
        let res = Csa::solve(&[0], &[1], 2, &[7], &[0]).unwrap();
        assert_eq!(res, vec![0]);
    }

    #[test]
    fn identity_permutation_is_cheapest() {
        // complete 4x4 bipartite graph where matching i -> i is free and
        // everything else costs 10
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        let mut weights = Vec::new();
        let mut ids = Vec::new();
        for s in 0..4usize {
            for t in 0..4usize {
                sources.push(s);
                targets.push(4 + t);
                weights.push(if s == t { 0 } else { 10 });
                ids.push(sources.len() - 1);
            }
        }
        let res = Csa::solve(&sources, &targets, 8, &weights, &ids).unwrap();
        let total: i64 = res.iter().map(|&e| weights[e]).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn rejects_odd_vertex_count() {
        assert!(Csa::solve(&[0], &[1], 3, &[1], &[0]).is_err());
    }

    #[test]
    fn rejects_wrong_sides() {
        assert!(Csa::solve(&[0, 2], &[2, 3], 4, &[1, 1], &[0, 1]).is_err());
        assert!(Csa::solve(&[0, 1], &[1, 3], 4, &[1, 1], &[0, 1]).is_err());
    }
}
