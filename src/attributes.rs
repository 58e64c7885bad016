//! Attributes of tree nodes: area, volume, depth, height, extrema,
//! extinction values, dynamics and the various structural attributes used
//! by the higher-level algorithms.

use crate::accumulators::{accumulate_sequential, propagate_sequential, AccValue, Accumulator};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::lca::LcaFast;
use crate::tree::{Inclusion, Tree, TreeCategory};
use crate::INVALID;
use fixedbitset::FixedBitSet;
use ndarray::{Array1, ArrayD, ArrayViewD, Axis, IxDyn, Zip};
use num_traits::{Bounded, NumCast, Zero};
use std::ops::{Mul, Sub};

fn into_1d<T>(array: ArrayD<T>) -> Array1<T> {
    array
        .into_dimensionality()
        .expect("sweep over a 1-d input yields a 1-d output")
}

/// Area of every node: the number of leaves in its subtree.
pub fn attribute_area(tree: &Tree) -> Array1<u64> {
    let ones = Array1::<u64>::from_elem(tree.num_leaves(), 1);
    let res = accumulate_sequential(tree, ones.view().into_dyn(), Accumulator::Sum)
        .expect("unit leaf weighting always matches the tree");
    into_1d(res)
}

/// Area of every node for an arbitrary leaf area: the sum of the areas of
/// the leaves in its subtree.
pub fn attribute_area_weighted<T: AccValue>(tree: &Tree, leaf_area: &Array1<T>) -> Result<Array1<T>> {
    let res = accumulate_sequential(tree, leaf_area.view().into_dyn(), Accumulator::Sum)?;
    Ok(into_1d(res))
}

/// Volume of every node.
///
/// Leaves have volume 0 and an internal node `n` satisfies
/// `volume(n) = |altitude(n) - altitude(parent(n))| * area(n) + sum of the
/// volumes of the children of n`.
pub fn attribute_volume<T1, T2>(
    tree: &Tree,
    altitudes: &Array1<T1>,
    area: &Array1<T2>,
) -> Result<Array1<f64>>
where
    T1: Copy + NumCast,
    T2: Copy + NumCast,
{
    let n = tree.num_vertices();
    if altitudes.len() != n || area.len() != n {
        return Err(Error::invalid("altitudes and area must be node weightings of the tree"));
    }
    let altitude = |i: usize| -> f64 { NumCast::from(altitudes[i]).expect("altitude representable as f64") };
    let mut volume = Array1::<f64>::zeros(n);
    for i in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        let node_area: f64 = NumCast::from(area[i]).expect("area representable as f64");
        volume[i] = (altitude(i) - altitude(tree.parent(i))).abs() * node_area;
        for &c in tree.children(i) {
            volume[i] += volume[c];
        }
    }
    Ok(volume)
}

/// Depth of every node: the root has depth 0 and every other node has the
/// depth of its parent plus one.
pub fn attribute_depth(tree: &Tree) -> Array1<u64> {
    let mut depth = Array1::<u64>::zeros(tree.num_vertices());
    for i in tree.root_to_leaves_iterator(Inclusion::Include, Inclusion::Exclude) {
        depth[i] = depth[tree.parent(i)] + 1;
    }
    depth
}

/// Height of every node for altitudes varying monotonically from the leaves
/// to the root.
///
/// With increasing altitudes, the height of `n` is the difference between
/// the altitude of the parent of `n` and the altitude of the shallowest
/// non-leaf node of the subtree rooted in `n` (or the altitude of `n` if
/// all its children are leaves); decreasing altitudes are symmetric.
pub fn attribute_height<T>(tree: &Tree, altitudes: &Array1<T>, increasing_altitudes: bool) -> Result<Array1<T>>
where
    T: Copy + PartialOrd + Bounded + Sub<Output = T>,
{
    let n = tree.num_vertices();
    if altitudes.len() != n {
        return Err(Error::invalid("altitudes must be a node weighting of the tree"));
    }
    let (extreme, _) = subtree_extremum(tree, altitudes, increasing_altitudes);
    let mut height = Array1::from_elem(n, altitudes[tree.root()]);
    for i in 0..n {
        let parent_altitude = altitudes[tree.parent(i)];
        height[i] = if increasing_altitudes {
            parent_altitude - extreme[i]
        } else {
            extreme[i] - parent_altitude
        };
    }
    Ok(height)
}

// per node: the deepest (increasing: smallest, decreasing: largest)
// altitude of any non-leaf node in the subtree, the node's own altitude if
// all children are leaves, and for a leaf the altitude of its parent;
// also the child through which the extremum is reached, INVALID if none
fn subtree_extremum<T>(tree: &Tree, altitudes: &Array1<T>, increasing_altitudes: bool) -> (Vec<T>, Vec<usize>)
where
    T: Copy + PartialOrd + Bounded,
{
    let n = tree.num_vertices();
    let mut extreme = Vec::with_capacity(n);
    for i in 0..n {
        extreme.push(altitudes[tree.parent(i)]);
    }
    let mut ref_son = vec![INVALID; n];
    for node in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        let mut best = if increasing_altitudes { T::max_value() } else { T::min_value() };
        let mut only_leaves = true;
        for &c in tree.children(node) {
            if !tree.is_leaf(c) {
                only_leaves = false;
                let better = if increasing_altitudes {
                    extreme[c] < best
                } else {
                    extreme[c] > best
                };
                if better {
                    best = extreme[c];
                    ref_son[node] = c;
                }
            }
        }
        if only_leaves {
            best = altitudes[node];
        }
        extreme[node] = best;
    }
    (extreme, ref_son)
}

/// Identify the extrema of the hierarchy.
///
/// A node `n` is an extremum iff every non-leaf node of its subtree has the
/// altitude of `n` and the altitude of the parent of `n` differs from the
/// altitude of `n`.
pub fn attribute_extrema<T>(tree: &Tree, altitudes: &Array1<T>) -> Result<Array1<bool>>
where
    T: Copy + PartialEq,
{
    let n = tree.num_vertices();
    if altitudes.len() != n {
        return Err(Error::invalid("altitudes must be a node weighting of the tree"));
    }
    let mut extrema = Array1::from_elem(n, false);
    for node in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        let mut flag = true;
        for &c in tree.children(node) {
            let c_non_canonical = altitudes[c] == altitudes[node];
            if !(tree.is_leaf(c) || (c_non_canonical && extrema[c])) {
                flag = false;
            }
            extrema[c] = extrema[c] && !c_non_canonical;
        }
        extrema[node] = flag;
    }
    Ok(extrema)
}

/// Extinction value of every node for an increasing attribute.
///
/// The extinction of an extremum `M` is the attribute value of the smallest
/// ancestor of `M` containing an extremum that precedes `M` in the altitude
/// ordering; it is extended to internal nodes as the largest extinction of
/// a contained extremum and to leaves as the extinction of the extremum
/// they belong to (0 if none).
pub fn attribute_extinction_value<T, A>(
    tree: &Tree,
    altitudes: &Array1<T>,
    attribute: &Array1<A>,
    increasing_altitudes: bool,
) -> Result<Array1<A>>
where
    T: Copy + PartialOrd + PartialEq + Bounded,
    A: Copy + Zero + 'static,
{
    let n = tree.num_vertices();
    if altitudes.len() != n || attribute.len() != n {
        return Err(Error::invalid("altitudes and attribute must be node weightings of the tree"));
    }

    // path towards the deepest extremum of every subtree
    let (_, ref_son) = subtree_extremum(tree, altitudes, increasing_altitudes);

    let mut extinction = Array1::from_elem(n, A::zero());
    extinction[tree.root()] = attribute[tree.root()];
    for node in tree.root_to_leaves_iterator(Inclusion::Exclude, Inclusion::Exclude) {
        let parent = tree.parent(node);
        extinction[node] = if node == ref_son[parent] {
            extinction[parent]
        } else {
            attribute[node]
        };
    }

    // leaves inherit from the extremum they belong to
    let extrema = attribute_extrema(tree, altitudes)?;
    let mut indices = Array1::from_iter(0..n);
    if !extrema[tree.root()] {
        indices[tree.root()] = INVALID;
    }
    let not_extrema = extrema.mapv(|e| !e);
    let extrema_leaves = propagate_sequential(tree, indices.view().into_dyn(), &not_extrema)?;
    let extrema_leaves = into_1d(extrema_leaves);
    for leaf in tree.leaves_iterator() {
        extinction[leaf] = if extrema_leaves[leaf] != INVALID {
            extinction[extrema_leaves[leaf]]
        } else {
            A::zero()
        };
    }
    Ok(extinction)
}

/// Dynamics of every node: the extinction value of the height attribute.
pub fn attribute_dynamics<T>(tree: &Tree, altitudes: &Array1<T>, increasing_altitudes: bool) -> Result<Array1<T>>
where
    T: Copy + PartialOrd + Bounded + Sub<Output = T> + Zero + 'static,
{
    let height = attribute_height(tree, altitudes, increasing_altitudes)?;
    attribute_extinction_value(tree, altitudes, &height, increasing_altitudes)
}

/// For a node that is the `k`-th of the `N` children of its parent, the
/// index of the `(k + skip) mod N`-th child of the parent; a negative
/// `skip` wraps around and the root maps to itself.
pub fn attribute_sibling(tree: &Tree, skip: isize) -> Array1<usize> {
    let mut sibling = Array1::from_elem(tree.num_vertices(), 0);
    for node in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        let num_children = tree.num_children(node) as isize;
        for k in 0..num_children {
            let j = (k + skip).rem_euclid(num_children);
            sibling[tree.child(k as usize, node)] = tree.child(j as usize, node);
        }
    }
    sibling[tree.root()] = tree.root();
    sibling
}

/// Rank of every node in the children list of its parent; the root, which
/// has no parent, gets [`INVALID`].
pub fn attribute_child_number(tree: &Tree) -> Array1<usize> {
    let mut rank = Array1::from_elem(tree.num_vertices(), INVALID);
    for node in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        for (k, &c) in tree.children(node).iter().enumerate() {
            rank[c] = k;
        }
    }
    rank[tree.root()] = INVALID;
    rank
}

/// For every node of `t1`, the index of the smallest node of `t2`
/// containing all its leaves.
///
/// Both trees must be defined over the same leaf set. Bottom-up, the
/// enclosing shape of a parent is the lowest common ancestor in `t2` of the
/// enclosing shapes of its children.
pub fn attribute_smallest_enclosing_shape(t1: &Tree, t2: &Tree) -> Result<Array1<usize>> {
    if t1.num_leaves() != t2.num_leaves() {
        return Err(Error::invalid("both trees must have the same number of leaves"));
    }
    let lca = LcaFast::new(t2);
    let mut shape = Array1::from_elem(t1.num_vertices(), INVALID);
    for leaf in t1.leaves_iterator() {
        shape[leaf] = leaf;
    }
    for node in t1.leaves_to_root_iterator(Inclusion::Include, Inclusion::Exclude) {
        let parent = t1.parent(node);
        shape[parent] = if shape[parent] == INVALID {
            shape[node]
        } else {
            lca.lca(shape[parent], shape[node])
        };
    }
    Ok(shape)
}

/// For every node, the sum over all pairs of its children of the product of
/// their weights, elementwise over the payload dimensions:
/// `res(n) = sum_{i < j} w(child(i, n)) * w(child(j, n))`.
pub fn attribute_children_pair_sum_product<T>(
    tree: &Tree,
    node_weights: ArrayViewD<'_, T>,
) -> Result<ArrayD<T>>
where
    T: Copy + Zero + Mul<Output = T>,
{
    if node_weights.shape().is_empty() || node_weights.shape()[0] != tree.num_vertices() {
        return Err(Error::invalid("node weights must be a node weighting of the tree"));
    }
    let mut res = ArrayD::from_elem(IxDyn(node_weights.shape()), T::zero());
    for node in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        let children = tree.children(node);
        for (i, &c1) in children.iter().enumerate() {
            for &c2 in &children[i + 1..] {
                let w1 = node_weights.index_axis(Axis(0), c1);
                let w2 = node_weights.index_axis(Axis(0), c2);
                Zip::from(res.index_axis_mut(Axis(0), node))
                    .and(&w1)
                    .and(&w2)
                    .for_each(|r, &a, &b| *r = *r + a * b);
            }
        }
    }
    Ok(res)
}

/// Perimeter (contour length) of every node of a component tree, given the
/// perimeter of each vertex and the length of each edge of the base graph.
///
/// Bottom-up sum of the children's perimeters; whenever a leaf is merged,
/// the shared frontier with every already-visited base-graph neighbor is
/// subtracted twice. Fails with `Unsupported` on partition trees.
pub fn attribute_perimeter_length_component_tree<G: Graph>(
    tree: &Tree,
    base_graph: &G,
    vertex_perimeter: &Array1<f64>,
    edge_length: &Array1<f64>,
) -> Result<Array1<f64>> {
    if tree.category() != TreeCategory::ComponentTree {
        return Err(Error::unsupported(
            "perimeter lengths are only defined on component trees",
        ));
    }
    if tree.num_leaves() != base_graph.num_vertices() {
        return Err(Error::invalid("the leaves of the tree must be the vertices of the base graph"));
    }
    if vertex_perimeter.len() != tree.num_leaves() {
        return Err(Error::invalid("vertex perimeter must be a leaf weighting of the tree"));
    }
    if edge_length.len() != base_graph.num_edges() {
        return Err(Error::invalid("edge length must be an edge weighting of the base graph"));
    }

    let mut res = Array1::<f64>::zeros(tree.num_vertices());
    for leaf in tree.leaves_iterator() {
        res[leaf] = vertex_perimeter[leaf];
    }
    let mut visited = FixedBitSet::with_capacity(tree.num_leaves());
    for node in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        let mut total = 0.0;
        for &c in tree.children(node) {
            total += res[c];
            if tree.is_leaf(c) {
                for (e, neighbor) in base_graph.incidences(c) {
                    if visited.contains(neighbor) {
                        total -= 2.0 * edge_length[e];
                    }
                }
                visited.insert(c);
            }
        }
        res[node] = total;
    }
    Ok(res)
}
