//! Grid-graph builders for 2-d images and conversions between 4-adjacency
//! edge weightings and their Khalimsky-space rendering.

use crate::embedding::GridEmbedding;
use crate::error::{Error, Result};
use crate::graph::{copy_graph, Graph, RegularGraph, UndirectedGraph};
use hashbrown::HashMap;
use ndarray::{Array1, Array2};
use num_traits::{Bounded, Zero};

/// Create the 4-adjacency implicit regular graph for a 2-d embedding.
pub fn get_4_adjacency_implicit_graph(embedding: &GridEmbedding) -> Result<RegularGraph> {
    if embedding.dimension() != 2 {
        return Err(Error::invalid("4 adjacency requires a 2-d embedding"));
    }
    RegularGraph::new(
        embedding.clone(),
        vec![vec![-1, 0], vec![0, -1], vec![0, 1], vec![1, 0]],
    )
}

/// Create the 8-adjacency implicit regular graph for a 2-d embedding.
pub fn get_8_adjacency_implicit_graph(embedding: &GridEmbedding) -> Result<RegularGraph> {
    if embedding.dimension() != 2 {
        return Err(Error::invalid("8 adjacency requires a 2-d embedding"));
    }
    RegularGraph::new(
        embedding.clone(),
        vec![
            vec![-1, -1],
            vec![-1, 0],
            vec![-1, 1],
            vec![0, -1],
            vec![0, 1],
            vec![1, -1],
            vec![1, 0],
            vec![1, 1],
        ],
    )
}

/// Create the 4-adjacency graph of a 2-d embedding as an explicit
/// undirected graph; edge identifiers follow the implicit enumeration
/// order.
pub fn get_4_adjacency_graph(embedding: &GridEmbedding) -> Result<UndirectedGraph> {
    Ok(copy_graph(&get_4_adjacency_implicit_graph(embedding)?))
}

/// Create the 8-adjacency graph of a 2-d embedding as an explicit
/// undirected graph.
pub fn get_8_adjacency_graph(embedding: &GridEmbedding) -> Result<UndirectedGraph> {
    Ok(copy_graph(&get_8_adjacency_implicit_graph(embedding)?))
}

/// Render a 4-adjacency edge weighting in 2-d Khalimsky space.
///
/// The result has shape `(2h - 1, 2w - 1)`, or `(2h + 1, 2w + 1)` with
/// `add_extra_border`: 1-faces carry the weight of their edge (border
/// 1-faces carry `extra_border_value`) and every 0-face carries the
/// maximum of its incident 1-faces.
pub fn graph_4_adjacency_to_khalimsky<G, T>(
    graph: &G,
    embedding: &GridEmbedding,
    edge_weights: &Array1<T>,
    add_extra_border: bool,
    extra_border_value: T,
) -> Result<Array2<T>>
where
    G: Graph,
    T: Copy + PartialOrd + Bounded + Zero,
{
    if embedding.dimension() != 2 {
        return Err(Error::invalid("khalimsky rendering requires a 2-d embedding"));
    }
    if graph.num_vertices() != embedding.size() {
        return Err(Error::invalid("graph size does not match the embedding"));
    }
    if edge_weights.len() != graph.num_edges() {
        return Err(Error::invalid(
            "edge weights size does not match the number of edges in the graph",
        ));
    }

    let h = embedding.shape()[0] as usize;
    let w = embedding.shape()[1] as usize;
    let border = if add_extra_border { 1i64 } else { -1 };
    let kh = (2 * h as i64 + border) as usize;
    let kw = (2 * w as i64 + border) as usize;
    let mut res = Array2::from_elem((kh, kw), T::zero());

    let offset = i64::from(add_extra_border);
    for (e, (s, t)) in graph.edges().enumerate() {
        if s == crate::INVALID {
            continue;
        }
        let (s, t) = if s <= t { (s, t) } else { (t, s) };
        let si = embedding.lin_to_grid(s);
        let ti = embedding.lin_to_grid(t);
        let y = (si[0] + ti[0] + offset) as usize;
        let x = (si[1] + ti[1] + offset) as usize;
        res[[y, x]] = edge_weights[e];
    }

    if add_extra_border && extra_border_value != T::zero() {
        for x in (1..kw).step_by(2) {
            res[[0, x]] = extra_border_value;
            res[[kh - 1, x]] = extra_border_value;
        }
        for y in (1..kh).step_by(2) {
            res[[y, 0]] = extra_border_value;
            res[[y, kw - 1]] = extra_border_value;
        }
    }

    // 0-faces take the maximum of their incident 1-faces
    let y0 = if add_extra_border { 0 } else { 1 };
    let x0 = if add_extra_border { 0 } else { 1 };
    for y in (y0..kh).step_by(2) {
        for x in (x0..kw).step_by(2) {
            let mut max_v = T::min_value();
            if y > 0 && res[[y - 1, x]] > max_v {
                max_v = res[[y - 1, x]];
            }
            if y + 1 < kh && res[[y + 1, x]] > max_v {
                max_v = res[[y + 1, x]];
            }
            if x > 0 && res[[y, x - 1]] > max_v {
                max_v = res[[y, x - 1]];
            }
            if x + 1 < kw && res[[y, x + 1]] > max_v {
                max_v = res[[y, x + 1]];
            }
            res[[y, x]] = max_v;
        }
    }

    Ok(res)
}

/// Read back a 4-adjacency edge weighting from a 2-d Khalimsky rendering
/// (0-faces and 2-faces are ignored).
///
/// Returns the graph, its embedding and the edge weights.
pub fn khalimsky_to_graph_4_adjacency<T: Copy + Zero>(
    khalimsky: &Array2<T>,
    extra_border: bool,
) -> Result<(UndirectedGraph, GridEmbedding, Array1<T>)> {
    let (kh, kw) = khalimsky.dim();
    let border = if extra_border { 0 } else { 1 };
    let h = kh / 2 + border;
    let w = kw / 2 + border;
    let embedding = GridEmbedding::new(&[h, w])?;
    let graph = get_4_adjacency_graph(&embedding)?;

    let offset = i64::from(extra_border);
    let mut weights = Array1::from_elem(graph.num_edges(), T::zero());
    for (e, (s, t)) in graph.edges().enumerate() {
        let si = embedding.lin_to_grid(s);
        let ti = embedding.lin_to_grid(t);
        let y = (si[0] + ti[0] + offset) as usize;
        let x = (si[1] + ti[1] + offset) as usize;
        weights[e] = khalimsky[[y, x]];
    }

    Ok((graph, embedding, weights))
}

/// Edge list of a bipartite graph linking every nonzero pixel of the first
/// contour image to the nonzero pixels of the second one within
/// `max_distance`, as built for contour-alignment assessment.
#[derive(Debug)]
pub struct ContourMatchingGraph {
    /// Left endpoints, in `[0, num_nodes1)`.
    pub sources: Vec<usize>,
    /// Right endpoints, in `[num_nodes1, num_nodes1 + num_nodes2)`.
    pub targets: Vec<usize>,
    /// Euclidean pixel distance of each edge.
    pub weights: Vec<f64>,
    /// Linear pixel index represented by each graph node.
    pub node_map: Vec<usize>,
    pub num_nodes1: usize,
    pub num_nodes2: usize,
}

/// Build the bipartite matching graph between the nonzero pixels of two
/// contour images within the given maximum distance.
pub fn get_bipartite_matching_graph_contour_images_2d<T: Copy + Zero + PartialEq>(
    embedding: &GridEmbedding,
    contour_image1: &Array2<T>,
    contour_image2: &Array2<T>,
    max_distance: f64,
) -> Result<ContourMatchingGraph> {
    if embedding.dimension() != 2 {
        return Err(Error::invalid("contour matching requires a 2-d embedding"));
    }
    if contour_image1.dim() != contour_image2.dim() {
        return Err(Error::invalid("both contour images must have the same shape"));
    }
    let (h, w) = contour_image1.dim();
    if embedding.shape()[0] != h as i64 || embedding.shape()[1] != w as i64 {
        return Err(Error::invalid("embedding shape does not match the contour images"));
    }
    if max_distance < 0.0 {
        return Err(Error::invalid("max distance must be positive"));
    }

    // precompute the in-range displacement ball
    let reach = max_distance.ceil() as i64;
    let mut neighbors = Vec::new();
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let distance = ((dx * dx + dy * dy) as f64).sqrt();
            if distance <= max_distance {
                neighbors.push((dy, dx, distance));
            }
        }
    }

    let mut node_map1 = Vec::new();
    let mut node_map2: HashMap<usize, usize> = HashMap::new();
    let mut sources = Vec::new();
    let mut targets = Vec::new();
    let mut weights = Vec::new();

    for y in 0..h as i64 {
        for x in 0..w as i64 {
            if contour_image1[[y as usize, x as usize]] == T::zero() {
                continue;
            }
            let mut found = false;
            for &(dy, dx, distance) in &neighbors {
                let y2 = y + dy;
                let x2 = x + dx;
                if y2 < 0 || y2 >= h as i64 || x2 < 0 || x2 >= w as i64 {
                    continue;
                }
                if contour_image2[[y2 as usize, x2 as usize]] == T::zero() {
                    continue;
                }
                if !found {
                    node_map1.push(embedding.grid_to_lin(&[y, x]));
                    found = true;
                }
                let lin2 = embedding.grid_to_lin(&[y2, x2]);
                let next_id = node_map2.len();
                let node2 = *node_map2.entry(lin2).or_insert(next_id);
                sources.push(node_map1.len() - 1);
                targets.push(node2);
                weights.push(distance);
            }
        }
    }

    let num_nodes1 = node_map1.len();
    let num_nodes2 = node_map2.len();
    let mut node_map = vec![0usize; num_nodes1 + num_nodes2];
    node_map[..num_nodes1].copy_from_slice(&node_map1);
    for (&pixel, &node) in &node_map2 {
        node_map[num_nodes1 + node] = pixel;
    }
    for t in &mut targets {
        *t += num_nodes1;
    }

    Ok(ContourMatchingGraph {
        sources,
        targets,
        weights,
        node_map,
        num_nodes1,
        num_nodes2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn four_adjacency_edge_order() {
        let embedding = GridEmbedding::new(&[2, 3]).unwrap();
        let g = get_4_adjacency_graph(&embedding).unwrap();
        assert_eq!(g.num_vertices(), 6);
        assert_eq!(
            g.edges().collect::<Vec<_>>(),
            vec![(0, 1), (0, 3), (1, 2), (1, 4), (2, 5), (3, 4), (4, 5)]
        );
    }

    #[test]
    fn eight_adjacency_degree() {
        let embedding = GridEmbedding::new(&[3, 3]).unwrap();
        let g = get_8_adjacency_implicit_graph(&embedding).unwrap();
        assert_eq!(g.degree(4), 8);
        assert_eq!(g.degree(0), 3);
        let total: usize = g.vertices().map(|v| g.degree(v)).sum();
        assert_eq!(total, 2 * g.num_edges());
    }

    #[test]
    fn khalimsky_round_trip() {
        let embedding = GridEmbedding::new(&[2, 2]).unwrap();
        let g = get_4_adjacency_graph(&embedding).unwrap();
        // edges (0,1), (0,2), (1,3), (2,3)
        let weights = arr1(&[1, 2, 3, 4]);
        for border in [false, true] {
            let k = graph_4_adjacency_to_khalimsky(&g, &embedding, &weights, border, 0).unwrap();
            let expected = if border { (5, 5) } else { (3, 3) };
            assert_eq!(k.dim(), expected);
            let (g2, _, w2) = khalimsky_to_graph_4_adjacency(&k, border).unwrap();
            assert_eq!(g2.num_edges(), g.num_edges());
            assert_eq!(w2, weights);
        }
    }

    #[test]
    fn khalimsky_faces() {
        let embedding = GridEmbedding::new(&[1, 2]).unwrap();
        let g = get_4_adjacency_graph(&embedding).unwrap();
        let weights = arr1(&[5]);
        let k = graph_4_adjacency_to_khalimsky(&g, &embedding, &weights, false, 0).unwrap();
        // shape (1, 3): 2-face, 1-face, 2-face; no interior 0-face
        assert_eq!(k.dim(), (1, 3));
        assert_eq!(k[[0, 1]], 5);
    }

    #[test]
    fn contour_matching_graph() {
        let embedding = GridEmbedding::new(&[3, 3]).unwrap();
        let mut image1 = Array2::<i32>::zeros((3, 3));
        let mut image2 = Array2::<i32>::zeros((3, 3));
        image1[[1, 1]] = 1;
        image2[[1, 2]] = 1;
        image2[[0, 1]] = 1;

        let g =
            get_bipartite_matching_graph_contour_images_2d(&embedding, &image1, &image2, 1.5).unwrap();
        assert_eq!(g.num_nodes1, 1);
        assert_eq!(g.num_nodes2, 2);
        assert_eq!(g.sources.len(), 2);
        // both contour pixels of image2 are within distance 1
        assert!(g.weights.iter().all(|&w| (w - 1.0).abs() < 1e-12));
        assert_eq!(g.node_map[0], 4);
    }
}
