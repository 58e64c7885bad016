//! Dendrogram purity: a classification-quality measure of a hierarchy with
//! respect to a ground-truth labelling of its leaves.

use crate::accumulators::{accumulate_sequential, Accumulator};
use crate::attributes::{attribute_area, attribute_children_pair_sum_product};
use crate::error::{Error, Result};
use crate::tree::Tree;
use ndarray::{Array1, Array2, Axis};

/// Weighted average of the purity of each node of the tree with respect to
/// a ground-truth labelling of its leaves.
///
/// The purity of a leaf set `X` for a class `C` is the fraction of elements
/// of `X` belonging to `C`; the dendrogram purity averages, over all
/// same-class leaf pairs `{x, y}`, the purity of `lca(x, y)` for their
/// class. The score lies in `[0, 1]`, higher is better.
///
/// `leaf_labels` must hold one class id per leaf; class ids are the values
/// `0..=max_label`.
pub fn dendrogram_purity(tree: &Tree, leaf_labels: &Array1<usize>) -> Result<f64> {
    let num_l = tree.num_leaves();
    if leaf_labels.len() != num_l {
        return Err(Error::invalid("leaf labels must be a leaf weighting of the tree"));
    }

    let area = attribute_area(tree);
    let num_labels = leaf_labels.iter().max().map_or(0, |&m| m + 1);

    let mut label_histo_leaves = Array2::<f64>::zeros((num_l, num_labels));
    for (leaf, &label) in leaf_labels.iter().enumerate() {
        label_histo_leaves[[leaf, label]] = 1.0;
    }

    let label_histo = accumulate_sequential(tree, label_histo_leaves.view().into_dyn(), Accumulator::Sum)?;
    let label_histo = label_histo
        .into_dimensionality::<ndarray::Ix2>()
        .expect("2-d sweep yields a 2-d result");

    let weights = attribute_children_pair_sum_product(tree, label_histo.view().into_dyn())?;
    let weights = weights
        .into_dimensionality::<ndarray::Ix2>()
        .expect("2-d input yields a 2-d result");

    // per-node per-class purity, weighted by the number of same-class leaf
    // pairs for which this node is the lowest common ancestor
    let mut total = 0.0;
    let mut z = 0.0;
    for node in num_l..tree.num_vertices() {
        let node_area = area[node] as f64;
        let histo = label_histo.index_axis(Axis(0), node);
        let weight = weights.index_axis(Axis(0), node);
        for (h, w) in histo.iter().zip(weight) {
            total += (h / node_area) * w;
            z += w;
        }
    }

    Ok(total / z)
}
