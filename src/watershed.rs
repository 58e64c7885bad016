//! Watershed cut labelling of an edge-weighted graph, following the
//! stream-based drop-of-water formulation of Cousty, Bertrand, Najman and
//! Couprie.

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::INVALID;
use ndarray::Array1;
use num_traits::Bounded;

/// Label the vertices of `graph` by their watershed-cut catchment basin.
///
/// For each vertex, `f-` is the minimum weight of its incident edges. A
/// *stream* follows steepest-descent edges (edges carrying the `f-` value
/// of their tip); every stream reaching no labelled vertex becomes a new
/// basin, numbered consecutively from 1, and streams flowing into a
/// labelled vertex inherit its label. The result assigns every vertex a
/// label in `1..=k` with `k` the number of minima of the edge weighting.
pub fn labelisation_watershed<G, T>(graph: &G, edge_weights: &Array1<T>) -> Result<Array1<usize>>
where
    G: Graph,
    T: Copy + PartialOrd + Bounded,
{
    if edge_weights.len() != graph.num_edges() {
        return Err(Error::invalid(
            "edge weights size does not match the number of edges in the graph",
        ));
    }

    let n = graph.num_vertices();
    let mut fminus = vec![T::max_value(); n];
    for v in graph.vertices() {
        for e in graph.out_edge_indices(v) {
            if edge_weights[e] < fminus[v] {
                fminus[v] = edge_weights[e];
            }
        }
    }

    let mut labels = vec![INVALID; n];
    let mut outside_stream = vec![true; n];

    // the vertices of the current stream, and the subset still to expand
    let mut stream = Vec::new();
    let mut frontier = Vec::new();

    let mut num_labels = 0;
    for v in graph.vertices() {
        if labels[v] != INVALID {
            continue;
        }

        stream.clear();
        frontier.clear();
        stream.push(v);
        frontier.push(v);
        outside_stream[v] = false;
        let mut inherited = INVALID;

        'grow: while let Some(y) = frontier.pop() {
            for (e, adjacent) in graph.incidences(y) {
                if outside_stream[adjacent] && edge_weights[e] == fminus[y] {
                    if labels[adjacent] != INVALID {
                        inherited = labels[adjacent];
                        break 'grow;
                    } else if fminus[adjacent] < fminus[y] {
                        // the stream drops: restart the expansion there
                        stream.push(adjacent);
                        outside_stream[adjacent] = false;
                        frontier.clear();
                        frontier.push(adjacent);
                        continue 'grow;
                    } else {
                        stream.push(adjacent);
                        outside_stream[adjacent] = false;
                        frontier.push(adjacent);
                    }
                }
            }
        }

        let label = if inherited == INVALID {
            num_labels += 1;
            num_labels
        } else {
            inherited
        };
        for &x in &stream {
            labels[x] = label;
            outside_stream[x] = true;
        }
    }

    Ok(Array1::from_vec(labels))
}
