//! Monotonic regression of node altitudes on a tree.

use crate::accumulators::{
    accumulate_and_combine_sequential, propagate_sequential_and_accumulate, AccValue, Accumulator,
};
use crate::error::{Error, Result};
use crate::fibonacci_heap::{FibonacciHeap, Handle, HeapArena};
use crate::tree::{Inclusion, Tree};
use crate::unionfind::UnionFind;
use ndarray::Array1;
use num_traits::NumCast;

// heap items are ordered by decreasing value so the heap top is the
// largest child block mean
#[derive(Debug, Clone, Copy, PartialEq)]
struct Violator {
    value: f64,
    node: usize,
}

impl PartialOrd for Violator {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        other.value.partial_cmp(&self.value)
    }
}

/// Monotonic regression of `altitudes` on `tree` with unit weights.
///
/// `mode` selects the regression:
///
/// * `"max"`: the smallest pointwise-larger assignment that increases
///   from the leaves to the root;
/// * `"min"`: the largest pointwise-smaller assignment that increases
///   from the leaves to the root;
/// * `"least_square"`: the weighted least-squares fit under the
///   constraint `out[n] <= out[parent(n)]`.
///
/// An unknown mode fails with `OutOfRange`.
pub fn tree_monotonic_regression<T: AccValue>(
    tree: &Tree,
    altitudes: &Array1<T>,
    mode: &str,
) -> Result<Array1<T>> {
    monotonic_regression_impl(tree, altitudes, None, mode)
}

/// Monotonic regression with per-node positive weights; the weights only
/// participate in the `"least_square"` mode, the other modes ignore them
/// with a warning.
pub fn tree_monotonic_regression_weighted<T: AccValue>(
    tree: &Tree,
    altitudes: &Array1<T>,
    weights: &Array1<f64>,
    mode: &str,
) -> Result<Array1<T>> {
    if weights.len() != tree.num_vertices() {
        return Err(Error::invalid("weights must be a node weighting of the tree"));
    }
    monotonic_regression_impl(tree, altitudes, Some(weights), mode)
}

fn monotonic_regression_impl<T: AccValue>(
    tree: &Tree,
    altitudes: &Array1<T>,
    weights: Option<&Array1<f64>>,
    mode: &str,
) -> Result<Array1<T>> {
    if altitudes.len() != tree.num_vertices() {
        return Err(Error::invalid("altitudes must be a node weighting of the tree"));
    }
    match mode {
        "max" => {
            if weights.is_some() {
                log::warn!("the 'weights' argument is ignored with mode 'max'");
            }
            let leaf_altitudes = altitudes.slice(ndarray::s![..tree.num_leaves()]);
            let res = accumulate_and_combine_sequential(
                tree,
                altitudes.view().into_dyn(),
                leaf_altitudes.into_dyn(),
                Accumulator::Max,
                |a, b| if a > b { a } else { b },
            )?;
            Ok(res
                .into_dimensionality()
                .expect("1-d sweep yields a 1-d result"))
        }
        "min" => {
            if weights.is_some() {
                log::warn!("the 'weights' argument is ignored with mode 'min'");
            }
            let res = propagate_sequential_and_accumulate(
                tree,
                altitudes.view().into_dyn(),
                Accumulator::Min,
            )?;
            Ok(res
                .into_dimensionality()
                .expect("1-d sweep yields a 1-d result"))
        }
        "least_square" => least_square_regression(tree, altitudes, weights),
        _ => Err(Error::out_of_range(format!("unknown regression mode '{mode}'"))),
    }
}

// Pool-adjacent-violators generalized to trees. Blocks of fused nodes are
// maintained in a union-find; each block root carries the weighted sum and
// total weight of its block and a max-heap over the current means of its
// child blocks. Scanning the nodes from the leaves to the root, a block
// absorbs its largest-mean child block while that mean exceeds its own.
fn least_square_regression<T: AccValue>(
    tree: &Tree,
    altitudes: &Array1<T>,
    weights: Option<&Array1<f64>>,
) -> Result<Array1<T>> {
    let n = tree.num_vertices();
    let root = tree.root();

    let weight_of = |i: usize| weights.map_or(1.0, |w| w[i]);
    let altitude_of =
        |i: usize| -> f64 { NumCast::from(altitudes[i]).expect("altitude representable as f64") };

    let mut block_weight: Vec<f64> = (0..n).map(weight_of).collect();
    let mut block_sum: Vec<f64> = (0..n).map(|i| weight_of(i) * altitude_of(i)).collect();

    let mut arena = HeapArena::with_capacity(n);
    let mut heaps: Vec<FibonacciHeap> = (0..n).map(|_| FibonacciHeap::new()).collect();
    let mut handles: Vec<Handle> = vec![Handle::default(); n];
    for i in tree.leaves_to_root_iterator(Inclusion::Include, Inclusion::Exclude) {
        handles[i] = heaps[tree.parent(i)].push(&mut arena, Violator { value: altitude_of(i), node: i });
    }

    let mut uf = UnionFind::new(n);
    for i in tree.leaves_to_root_iterator(Inclusion::Include, Inclusion::Include) {
        let mut ic = uf.find_mut(i);

        // fuse with the most violating child block until none remains
        while let Some(&top) = heaps[ic].top(&arena) {
            if top.value <= block_sum[ic] / block_weight[ic] {
                break;
            }
            heaps[ic].pop(&mut arena);
            let kc = uf.find_mut(top.node);
            let new_ic = uf.link(ic, kc);
            let absorbed = if new_ic == ic { kc } else { ic };
            ic = new_ic;
            block_sum[ic] += block_sum[absorbed];
            block_weight[ic] += block_weight[absorbed];
            let other_heap = std::mem::take(&mut heaps[absorbed]);
            heaps[ic].merge(&mut arena, other_heap);
        }

        if i != root {
            let mean = block_sum[ic] / block_weight[ic];
            heaps[tree.parent(i)].update(&mut arena, handles[i], Violator { value: mean, node: i });
        }
    }

    let mut result = Array1::from_elem(n, altitudes[root]);
    for i in 0..n {
        let block = uf.find_mut(i);
        let mean = block_sum[block] / block_weight[block];
        result[i] = NumCast::from(mean).expect("block mean representable in the altitude type");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, array};

    #[test]
    fn already_monotonic_is_unchanged() {
        let tree = Tree::new(array![7, 7, 8, 8, 8, 9, 9, 10, 10, 11, 11, 11]).unwrap();
        let altitudes = arr1(&[0., 1., 0., 2., 0., 0., 0., 2., 3., 0., 5., 10.]);
        for mode in ["max", "min", "least_square"] {
            let res = tree_monotonic_regression(&tree, &altitudes, mode).unwrap();
            assert_eq!(res, altitudes, "mode {mode}");
        }
        let weights = Array1::from_iter((1..13).map(|x| x as f64));
        let res = tree_monotonic_regression_weighted(&tree, &altitudes, &weights, "least_square").unwrap();
        assert_eq!(res, altitudes);
    }

    #[test]
    fn unknown_mode() {
        let tree = Tree::new(array![2, 2, 2]).unwrap();
        let altitudes = arr1(&[0., 0., 1.]);
        assert!(tree_monotonic_regression(&tree, &altitudes, "truc").is_err());
    }

    #[test]
    fn mode_max() {
        let tree = Tree::new(array![7, 7, 8, 8, 8, 9, 9, 10, 10, 11, 11, 11]).unwrap();
        let altitudes = arr1(&[0., 3., 0., 2., 0., 0., 0., 2., 3., 0., 5., 4.]);
        let res = tree_monotonic_regression(&tree, &altitudes, "max").unwrap();
        assert_eq!(res, arr1(&[0., 3., 0., 2., 0., 0., 0., 3., 3., 0., 5., 5.]));
    }

    #[test]
    fn mode_min() {
        let tree = Tree::new(array![7, 7, 8, 8, 8, 9, 9, 10, 10, 11, 11, 11]).unwrap();
        let altitudes = arr1(&[0., 3., 0., 2., 0., 0., 0., 2., 3., 0., 5., 4.]);
        let res = tree_monotonic_regression(&tree, &altitudes, "min").unwrap();
        assert_eq!(res, arr1(&[0., 2., 0., 2., 0., 0., 0., 2., 3., 0., 4., 4.]));
    }

    #[test]
    fn least_square_uniform_weights() {
        let tree = Tree::new(array![5, 5, 6, 6, 7, 7, 7, 7]).unwrap();
        let altitudes = arr1(&[13., 14., 6., 8., 7., 11., 5., 10.]);
        let res = tree_monotonic_regression(&tree, &altitudes, "least_square").unwrap();
        let expected: [f64; 8] = [12., 12., 6., 6.5, 7., 12., 6.5, 12.];
        for (r, e) in res.iter().zip(expected) {
            assert!((r - e).abs() < 1e-9, "{res:?}");
        }
    }

    #[test]
    fn least_square_weighted() {
        let tree = Tree::new(array![5, 5, 6, 6, 7, 7, 7, 7]).unwrap();
        let altitudes = arr1(&[13., 14., 6., 8., 7., 11., 5., 10.]);
        let weights = arr1(&[1., 1., 1., 1., 1., 1., 2., 1.]);
        let res = tree_monotonic_regression_weighted(&tree, &altitudes, &weights, "least_square").unwrap();
        let expected: [f64; 8] = [12., 12., 6., 6., 7., 12., 6., 12.];
        for (r, e) in res.iter().zip(expected) {
            assert!((r - e).abs() < 1e-9, "{res:?}");
        }
    }

    #[test]
    fn output_is_monotonic() {
        let tree = Tree::new(array![5, 5, 6, 6, 7, 7, 7, 7]).unwrap();
        let altitudes = arr1(&[13., 14., 6., 8., 7., 11., 5., 10.]);
        for mode in ["max", "min", "least_square"] {
            let res = tree_monotonic_regression(&tree, &altitudes, mode).unwrap();
            for v in 0..tree.num_vertices() - 1 {
                assert!(
                    res[v] <= res[tree.parent(v)] + 1e-9,
                    "mode {mode}: res[{v}] > res[parent]"
                );
            }
        }
    }
}
