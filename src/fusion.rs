//! Fusion of several trees sharing their leaves into a graph of shapes, and
//! the depth map of that graph.

use crate::attributes::{attribute_area, attribute_smallest_enclosing_shape};
use crate::error::{Error, Result};
use crate::tree::{Inclusion, Tree};
use ndarray::Array1;

/// Depth map associated to the fusion of the given trees.
///
/// All trees must be defined over the same domain, i.e. have the same
/// number of leaves. The nodes of all trees, merged under the inclusion
/// relation of the regions they represent, form a directed acyclic graph
/// with a single root, the *graph of shapes*; the depth of a node is the
/// length of the longest path from the root to it. The returned array
/// holds the depth of every leaf.
///
/// Depths are meaningful up to an additive constant only; compare
/// differences, not absolute values.
///
/// Fails with `InvalidArgument` when fewer than two trees are given or the
/// leaf counts differ.
pub fn tree_fusion_depth_map(trees: &[&Tree]) -> Result<Array1<i64>> {
    let ntrees = trees.len();
    if ntrees < 2 {
        return Err(Error::invalid("fusion requires at least two trees"));
    }
    let nleaves = trees[0].num_leaves();
    if trees.iter().any(|t| t.num_leaves() != nleaves) {
        return Err(Error::invalid("all trees must have the same number of leaves"));
    }

    // precompute areas and pairwise smallest enclosing shapes; the
    // diagonal entries are never read
    let areas: Vec<Array1<u64>> = trees.iter().map(|t| attribute_area(t)).collect();
    let mut ses: Vec<Array1<usize>> = Vec::with_capacity(ntrees * ntrees);
    for i in 0..ntrees {
        for j in 0..ntrees {
            if i == j {
                ses.push(Array1::from_vec(Vec::new()));
            } else {
                ses.push(attribute_smallest_enclosing_shape(trees[i], trees[j])?);
            }
        }
    }
    let ses = |i: usize, j: usize| &ses[i * ntrees + j];

    // the graph of shapes as plain successor lists; nodes 0..nleaves are
    // the shared leaves
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nleaves];

    // one node per distinct shape: a non-root internal node of tree i is a
    // duplicate iff its smallest enclosing shape in an earlier tree has the
    // same area, meaning both shapes cover the same leaf set
    let mut node_maps: Vec<Vec<usize>> = Vec::with_capacity(ntrees);
    for (i, tree) in trees.iter().enumerate() {
        let mut node_map = vec![0usize; tree.num_vertices()];
        for leaf in 0..nleaves {
            node_map[leaf] = leaf;
        }
        for n in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Exclude) {
            let mut keep = true;
            for j in 0..i {
                let shape = ses(i, j)[n];
                if areas[j][shape] == areas[i][n] {
                    keep = false;
                    node_map[n] = node_maps[j][shape];
                    break;
                }
            }
            if keep {
                node_map[n] = successors.len();
                successors.push(Vec::new());
            }
        }
        node_maps.push(node_map);
    }

    // all roots represent the full domain and collapse onto one GOS root
    let root_node = successors.len();
    successors.push(Vec::new());
    for (i, tree) in trees.iter().enumerate() {
        node_maps[i][tree.root()] = root_node;
    }

    // inclusion edges: parent edges of every tree, plus an edge from every
    // strictly-larger enclosing shape in the other trees
    for (i, tree) in trees.iter().enumerate() {
        for n in tree.leaves_to_root_iterator(Inclusion::Include, Inclusion::Exclude) {
            let represent_n = node_maps[i][n];
            successors[node_maps[i][tree.parent(n)]].push(represent_n);
            for j in 0..ntrees {
                if i != j {
                    let shape = ses(i, j)[n];
                    if areas[j][shape] != areas[i][n] {
                        successors[node_maps[j][shape]].push(represent_n);
                    }
                }
            }
        }
    }

    // iterative DFS topological sort: 0 = unseen, 1 = active, 2 = done;
    // sorted_nodes ends up in finish order (reverse topological)
    let num_nodes = successors.len();
    let mut sorted_nodes = Vec::with_capacity(num_nodes);
    let mut marks = vec![0u8; num_nodes];
    let mut stack = vec![root_node];
    while let Some(&n) = stack.last() {
        if marks[n] > 0 {
            stack.pop();
            if marks[n] == 1 {
                sorted_nodes.push(n);
                marks[n] = 2;
            }
        } else {
            marks[n] = 1;
            for &o in &successors[n] {
                if marks[o] != 2 {
                    stack.push(o);
                }
            }
        }
    }

    // longest path from the root, scanning in topological order
    let mut depth = vec![0i64; num_nodes];
    for &n in sorted_nodes.iter().rev() {
        for &o in &successors[n] {
            depth[o] = depth[o].max(depth[n] + 1);
        }
    }

    Ok(Array1::from_iter(depth[..nleaves].iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, array};

    fn assert_same_up_to_shift(result: &Array1<i64>, expected: &[i64]) {
        assert_eq!(result.len(), expected.len());
        let shift = expected[0] - result[0];
        for (r, &e) in result.iter().zip(expected) {
            assert_eq!(r + shift, e, "result {result:?} differs from {expected:?} up to shift");
        }
    }

    #[test]
    fn two_partition_trees() {
        let t1 = Tree::new(array![5, 5, 6, 6, 6, 7, 7, 7]).unwrap();
        let t2 = Tree::new(array![7, 7, 6, 5, 5, 6, 7, 7]).unwrap();
        let res = tree_fusion_depth_map(&[&t1, &t2]).unwrap();
        assert_same_up_to_shift(&res, &[2, 2, 2, 3, 3]);
    }

    #[test]
    fn trees_with_nested_shapes() {
        let t1 = Tree::new(array![4, 4, 6, 5, 6, 6, 6]).unwrap();
        let t2 = Tree::new(array![4, 5, 5, 5, 5, 5]).unwrap();
        let res = tree_fusion_depth_map(&[&t1, &t2]).unwrap();
        assert_same_up_to_shift(&res, &[3, 2, 1, 2]);
    }

    #[test]
    fn too_few_trees() {
        let t1 = Tree::new(array![2, 2, 2]).unwrap();
        assert!(tree_fusion_depth_map(&[&t1]).is_err());
    }

    #[test]
    fn mismatched_leaf_counts() {
        let t1 = Tree::new(array![2, 2, 2]).unwrap();
        let t2 = Tree::new(array![3, 3, 3, 3]).unwrap();
        assert!(tree_fusion_depth_map(&[&t1, &t2]).is_err());
    }

    #[test]
    fn fusion_of_max_trees() {
        use crate::component_tree::component_tree_max_tree;
        use crate::embedding::GridEmbedding;
        use crate::image::get_4_adjacency_implicit_graph;

        let g = get_4_adjacency_implicit_graph(&GridEmbedding::new(&[6, 7]).unwrap()).unwrap();
        let im1 = arr1(&[
            0, 0, 0, 0, 0, 0, 0, //
            3, 3, 3, 2, 1, 1, 1, //
            3, 3, 3, 2, 1, 1, 1, //
            3, 3, 3, 2, 1, 1, 1, //
            2, 2, 2, 2, 1, 1, 1, //
            1, 1, 1, 1, 1, 0, 0,
        ]);
        let im2 = arr1(&[
            0, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 0, 0, 0, 0, //
            0, 2, 1, 1, 1, 2, 0, //
            0, 1, 1, 1, 1, 2, 0, //
            0, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 0, 0, 0, 0,
        ]);
        let t1 = component_tree_max_tree(&g, &im1).unwrap();
        let t2 = component_tree_max_tree(&g, &im2).unwrap();
        let res = tree_fusion_depth_map(&[&t1.tree, &t2.tree]).unwrap();
        let expected = [
            0, 0, 0, 0, 0, 0, 0, //
            3, 3, 3, 2, 1, 1, 1, //
            3, 4, 3, 2, 2, 3, 1, //
            3, 3, 3, 2, 2, 3, 1, //
            2, 2, 2, 2, 1, 1, 1, //
            1, 1, 1, 1, 1, 0, 0,
        ];
        assert_same_up_to_shift(&res, &expected);
    }
}
