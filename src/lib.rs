//! **higraph** is a library for hierarchical image and graph analysis.
//!
//! It provides the primitives to construct, attribute and transform rooted
//! trees describing nested partitions of a graph's vertex set:
//!
//! * a uniform [`Graph`](graph::Graph) trait over three graph families:
//!   the explicit [`UndirectedGraph`](graph::UndirectedGraph), the implicit
//!   [`RegularGraph`](graph::RegularGraph) over a grid, and the rooted
//!   [`Tree`](tree::Tree);
//! * an immutable [`Tree`](tree::Tree) laid out in topological order, so
//!   that bottom-up and top-down sweeps are plain index loops, with
//!   constant-time lowest-common-ancestor queries after an
//!   [`LcaFast`](lca::LcaFast) preprocessing;
//! * [accumulators and propagators](accumulators) over tree nodes, from
//!   which the [node attributes](attributes) (area, volume, height,
//!   extinction values, ...) are built;
//! * [component trees](component_tree) (max-tree and min-tree) of
//!   vertex-weighted graphs, [tree fusion](fusion) depth maps,
//!   [monotonic regression](regression) on trees, 2-d
//!   [contour extraction](contour) with Ramer-Douglas-Peucker
//!   simplification, [bipartite utilities](bipartite) including a
//!   cost-scaling minimum-weight perfect matching, watershed-cut
//!   [labelling](watershed) and [dendrogram purity](purity).
//!
//! Weight arrays are dense [`ndarray`] arrays whose first axis runs over
//! vertices, edges, nodes or leaves; trailing axes are an opaque payload
//! processed elementwise. Inputs are only borrowed and never mutated;
//! every fallible operation validates its arguments up front and reports
//! failures through the [`Error`] taxonomy.

pub mod accumulators;
pub mod attributes;
pub mod bipartite;
pub mod component_tree;
pub mod contour;
pub mod embedding;
mod error;
pub mod fibonacci_heap;
pub mod fusion;
pub mod graph;
pub mod image;
pub mod lca;
pub mod purity;
pub mod regression;
pub mod tree;
pub mod unionfind;
pub mod watershed;

mod csa;

pub use crate::error::{Error, Result};

pub use crate::accumulators::{
    accumulate_and_combine_sequential, accumulate_parallel, accumulate_sequential,
    propagate_parallel, propagate_sequential, propagate_sequential_and_accumulate, AccValue,
    Accumulator, AccumulatorState,
};
pub use crate::attributes::{
    attribute_area, attribute_area_weighted, attribute_child_number,
    attribute_children_pair_sum_product, attribute_depth, attribute_dynamics, attribute_extrema,
    attribute_extinction_value, attribute_height, attribute_perimeter_length_component_tree,
    attribute_sibling, attribute_smallest_enclosing_shape, attribute_volume,
};
pub use crate::bipartite::{bipartite_graph_matching, is_bipartite_graph, is_bipartite_graph_edge_list};
pub use crate::component_tree::{
    component_tree_max_tree, component_tree_min_tree, reconstruct_leaf_data, NodeWeightedTree,
};
pub use crate::contour::{fit_contour_2d, Contour2d, ContourSegment2d, PolylineContour2d};
pub use crate::embedding::GridEmbedding;
pub use crate::fibonacci_heap::{FibonacciHeap, Handle, HeapArena};
pub use crate::fusion::tree_fusion_depth_map;
pub use crate::graph::{copy_graph, Graph, RegularGraph, UndirectedGraph};
pub use crate::image::{
    get_4_adjacency_graph, get_4_adjacency_implicit_graph, get_8_adjacency_graph,
    get_8_adjacency_implicit_graph, get_bipartite_matching_graph_contour_images_2d,
    graph_4_adjacency_to_khalimsky, khalimsky_to_graph_4_adjacency, ContourMatchingGraph,
};
pub use crate::lca::LcaFast;
pub use crate::purity::dendrogram_purity;
pub use crate::regression::{tree_monotonic_regression, tree_monotonic_regression_weighted};
pub use crate::tree::{Inclusion, Tree, TreeCategory};
pub use crate::unionfind::UnionFind;
pub use crate::watershed::labelisation_watershed;

/// The sentinel value marking an absent vertex, edge or node identifier.
pub const INVALID: usize = usize::MAX;
