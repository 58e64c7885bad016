//! Max-tree and min-tree construction from a vertex-weighted graph.
//!
//! The construction is the canonized union-find algorithm: vertices are
//! processed by decreasing (max-tree) weight, merging the connected
//! components of the upper level sets; the resulting pre-parent relation is
//! canonized so that flat zones collapse onto a single representative and
//! then expanded into a tree with one node per distinct-altitude step.

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::tree::{Tree, TreeCategory};
use crate::unionfind::UnionFind;
use crate::INVALID;
use fixedbitset::FixedBitSet;
use ndarray::Array1;
use std::cmp::Ordering;

/// A tree together with the altitude of each of its nodes, as produced by
/// the hierarchy construction algorithms.
#[derive(Debug)]
pub struct NodeWeightedTree<T> {
    pub tree: Tree,
    pub altitudes: Array1<T>,
}

/// Construct the max-tree of the vertex weighted graph.
///
/// The leaves of the result are the vertices of the graph; its internal
/// nodes are the connected components of the upper level sets
/// `{v : w(v) >= lambda}`, and the altitude of a node is the threshold at
/// which its component appears. The result is tagged
/// [`TreeCategory::ComponentTree`].
///
/// Fails with `InvalidArgument` if the weight array length differs from the
/// number of vertices.
pub fn component_tree_max_tree<G, T>(graph: &G, vertex_weights: &Array1<T>) -> Result<NodeWeightedTree<T>>
where
    G: Graph,
    T: Copy + PartialOrd,
{
    let sorted = stable_arg_sort(vertex_weights, false);
    tree_from_sorted_vertices(graph, vertex_weights, &sorted)
}

/// Construct the min-tree of the vertex weighted graph: the component tree
/// of the lower level sets `{v : w(v) <= lambda}`.
///
/// The min-tree of `w` is the max-tree of `-w` up to altitude negation.
pub fn component_tree_min_tree<G, T>(graph: &G, vertex_weights: &Array1<T>) -> Result<NodeWeightedTree<T>>
where
    G: Graph,
    T: Copy + PartialOrd,
{
    let sorted = stable_arg_sort(vertex_weights, true);
    tree_from_sorted_vertices(graph, vertex_weights, &sorted)
}

fn stable_arg_sort<T: Copy + PartialOrd>(weights: &Array1<T>, descending: bool) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..weights.len()).collect();
    indices.sort_by(|&a, &b| {
        let ord = weights[a].partial_cmp(&weights[b]).unwrap_or(Ordering::Equal);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    indices
}

fn tree_from_sorted_vertices<G, T>(
    graph: &G,
    vertex_weights: &Array1<T>,
    sorted_vertex_indices: &[usize],
) -> Result<NodeWeightedTree<T>>
where
    G: Graph,
    T: Copy + PartialOrd,
{
    let n = graph.num_vertices();
    if vertex_weights.len() != n {
        return Err(Error::invalid(format!(
            "vertex weights must have one value per vertex ({} values for {n} vertices)",
            vertex_weights.len()
        )));
    }
    if n == 0 {
        return Err(Error::invalid("cannot build a component tree on an empty graph"));
    }

    let mut parents = pre_tree_construction(graph, sorted_vertex_indices);
    canonize_tree(&mut parents, vertex_weights, sorted_vertex_indices);
    let (new_parents, altitudes) =
        expand_canonized_parent_relation(&parents, vertex_weights, sorted_vertex_indices);

    let tree = Tree::with_category(Array1::from_vec(new_parents), TreeCategory::ComponentTree)?;
    Ok(NodeWeightedTree { tree, altitudes: Array1::from_vec(altitudes) })
}

// Build the pre-parent relation by processing vertices in reverse sorted
// order with a union-find over the already-processed vertices. The
// `representing` array maps each canonical set element to the
// latest-processed vertex of its component.
fn pre_tree_construction<G: Graph>(graph: &G, sorted_vertex_indices: &[usize]) -> Vec<usize> {
    let n = graph.num_vertices();
    let mut parent = vec![0usize; n];
    let mut representing = vec![0usize; n];
    let mut processed = FixedBitSet::with_capacity(n);
    let mut uf = UnionFind::new(n);

    for &vertex in sorted_vertex_indices.iter().rev() {
        parent[vertex] = vertex;
        representing[vertex] = vertex;
        processed.insert(vertex);
        let mut vertex_repr = vertex;
        for neighbor in graph.adjacent_vertices(vertex) {
            if processed.contains(neighbor) {
                let neighbor_component = uf.find_mut(neighbor);
                if neighbor_component != vertex_repr {
                    parent[representing[neighbor_component]] = vertex;
                    vertex_repr = uf.link(neighbor_component, vertex_repr);
                    representing[vertex_repr] = vertex;
                }
            }
        }
    }
    parent
}

// Collapse flat zones of the pre-parent relation onto their canonical
// element, in place.
fn canonize_tree<T: Copy + PartialEq>(
    parents: &mut [usize],
    vertex_weights: &Array1<T>,
    sorted_vertex_indices: &[usize],
) {
    for &e in sorted_vertex_indices {
        let par = parents[e];
        if vertex_weights[parents[par]] == vertex_weights[par] {
            parents[e] = parents[par];
        }
    }
}

// Expand a canonized parent relation into a full tree: the original
// vertices become the leaves and one internal node is allocated per
// distinct-altitude step, in reverse sorted order so that the node indices
// are topologically sorted.
fn expand_canonized_parent_relation<T: Copy + PartialEq>(
    parents: &[usize],
    vertex_weights: &Array1<T>,
    sorted_vertex_indices: &[usize],
) -> (Vec<usize>, Vec<T>) {
    let n = parents.len();
    let mut altitudes: Vec<T> = vertex_weights.iter().copied().collect();
    let mut new_parents = vec![INVALID; n];
    let mut next = n;

    for &i in sorted_vertex_indices.iter().rev() {
        let par = if vertex_weights[i] != vertex_weights[parents[i]] {
            i
        } else {
            parents[i]
        };
        if new_parents[par] == INVALID {
            new_parents.push(next - 1);
            new_parents[par] = next;
            next += 1;
            altitudes.push(vertex_weights[par]);
        }
        new_parents[i] = new_parents[par];
    }

    for &i in sorted_vertex_indices.iter().rev() {
        if vertex_weights[i] != vertex_weights[parents[i]] {
            let node = new_parents[i];
            new_parents[node] = new_parents[parents[i]];
        }
    }
    let last = new_parents.len() - 1;
    new_parents[last] = last;

    (new_parents, altitudes)
}

/// Propagate the altitude of the closest non-deleted ancestor down to the
/// leaves: the standard way the result of a component-tree filter is read
/// back as vertex values.
///
/// `deleted[n]` marks the nodes removed by the filter; a deleted node takes
/// the reconstructed value of its parent. The returned array holds one
/// value per leaf.
pub fn reconstruct_leaf_data<T: Copy>(
    tree: &Tree,
    altitudes: &Array1<T>,
    deleted: &Array1<bool>,
) -> Result<Array1<T>> {
    let n = tree.num_vertices();
    if altitudes.len() != n || deleted.len() != n {
        return Err(Error::invalid("altitudes and deleted must be node weightings of the tree"));
    }
    let mut values: Vec<T> = altitudes.iter().copied().collect();
    for node in tree
        .root_to_leaves_iterator(crate::tree::Inclusion::Include, crate::tree::Inclusion::Exclude)
    {
        if deleted[node] {
            values[node] = values[tree.parent(node)];
        }
    }
    values.truncate(tree.num_leaves());
    Ok(Array1::from_vec(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::GridEmbedding;
    use crate::image::get_4_adjacency_implicit_graph;
    use ndarray::arr1;

    fn weights_4x4() -> Array1<f64> {
        arr1(&[
            0., 1., 4., 4., //
            7., 5., 6., 8., //
            2., 3., 4., 1., //
            9., 8., 6., 7.,
        ])
    }

    #[test]
    fn pre_tree_construction_4x4() {
        let graph = get_4_adjacency_implicit_graph(&GridEmbedding::new(&[4, 4]).unwrap()).unwrap();
        let weights = weights_4x4();
        let sorted = stable_arg_sort(&weights, false);
        let parents = pre_tree_construction(&graph, &sorted);
        assert_eq!(
            parents,
            vec![0, 0, 9, 2, 5, 10, 5, 6, 11, 8, 3, 1, 13, 14, 10, 14]
        );
    }

    #[test]
    fn canonize_tree_4x4() {
        let weights = weights_4x4();
        let sorted = stable_arg_sort(&weights, false);
        let mut parents = vec![0, 0, 9, 2, 5, 10, 5, 6, 11, 8, 3, 1, 13, 14, 10, 14];
        canonize_tree(&mut parents, &weights, &sorted);
        assert_eq!(
            parents,
            vec![0, 0, 9, 2, 5, 2, 5, 6, 1, 8, 2, 1, 13, 14, 2, 14]
        );
    }

    #[test]
    fn expand_canonized_4x4() {
        let weights = weights_4x4();
        let sorted = stable_arg_sort(&weights, false);
        let parents = vec![0, 0, 9, 2, 5, 2, 5, 6, 1, 8, 2, 1, 13, 14, 2, 14];
        let (new_parents, altitudes) = expand_canonized_parent_relation(&parents, &weights, &sorted);
        assert_eq!(
            new_parents,
            vec![
                28, 27, 24, 24, 20, 23, 22, 18, 26, 25, 24, 27, 16, 17, 21, 19, 17, 21, 22, 21,
                23, 24, 23, 24, 25, 26, 27, 28, 28
            ]
        );
        assert_eq!(
            altitudes,
            vec![
                0., 1., 4., 4., 7., 5., 6., 8., 2., 3., 4., 1., 9., 8., 6., 7., 9., 8., 8., 7.,
                7., 6., 6., 5., 4., 3., 2., 1., 0.
            ]
        );
    }

    #[test]
    fn max_tree_4x4() {
        let graph = get_4_adjacency_implicit_graph(&GridEmbedding::new(&[4, 4]).unwrap()).unwrap();
        let res = component_tree_max_tree(&graph, &weights_4x4()).unwrap();
        assert_eq!(res.tree.category(), TreeCategory::ComponentTree);
        assert_eq!(res.tree.num_vertices(), 29);
        assert_eq!(res.tree.num_leaves(), 16);
        assert_eq!(
            res.tree.parents().to_vec(),
            vec![
                28, 27, 24, 24, 20, 23, 22, 18, 26, 25, 24, 27, 16, 17, 21, 19, 17, 21, 22, 21,
                23, 24, 23, 24, 25, 26, 27, 28, 28
            ]
        );
        assert_eq!(
            res.altitudes.to_vec(),
            vec![
                0., 1., 4., 4., 7., 5., 6., 8., 2., 3., 4., 1., 9., 8., 6., 7., 9., 8., 8., 7.,
                7., 6., 6., 5., 4., 3., 2., 1., 0.
            ]
        );
    }

    #[test]
    fn min_tree_is_adjoint_of_max_tree() {
        let graph = get_4_adjacency_implicit_graph(&GridEmbedding::new(&[4, 4]).unwrap()).unwrap();
        let weights = weights_4x4();
        let negated = weights.mapv(|w| -w);

        let min = component_tree_min_tree(&graph, &negated).unwrap();
        let max = component_tree_max_tree(&graph, &weights).unwrap();
        assert_eq!(min.tree.parents(), max.tree.parents());
        assert_eq!(min.altitudes.mapv(|a| -a), max.altitudes);
    }

    #[test]
    fn weight_length_mismatch() {
        let graph = get_4_adjacency_implicit_graph(&GridEmbedding::new(&[4, 4]).unwrap()).unwrap();
        let weights = arr1(&[1.0, 2.0]);
        assert!(component_tree_max_tree(&graph, &weights).is_err());
    }

    #[test]
    fn max_tree_area_filter_reconstruction() {
        let graph = get_4_adjacency_implicit_graph(&GridEmbedding::new(&[5, 5]).unwrap()).unwrap();
        let weights = arr1(&[
            -5., 2., 2., 5., 5., //
            -4., 2., 2., 6., 5., //
            3., 3., 3., 3., 3., //
            -2., -2., -2., 9., 7., //
            -1., 0., -2., 8., 9.,
        ]);
        let res = component_tree_max_tree(&graph, &weights).unwrap();
        let area = crate::attributes::attribute_area(&res.tree);
        let deleted = area.mapv(|a| a <= 4);
        let filtered = reconstruct_leaf_data(&res.tree, &res.altitudes, &deleted).unwrap();
        assert_eq!(
            filtered.to_vec(),
            vec![
                -5., 2., 2., 3., 3., //
                -4., 2., 2., 3., 3., //
                3., 3., 3., 3., 3., //
                -2., -2., -2., 3., 3., //
                -2., -2., -2., 3., 3.
            ]
        );
    }
}
