use higraph::{fit_contour_2d, get_4_adjacency_graph, Contour2d, Graph, GridEmbedding, UndirectedGraph};
use ndarray::{arr1, Array1, Array2};
use std::collections::HashMap;

// render a traced contour back into (borderless) khalimsky space, marking
// the elements of the k-th segment with k and its two extremities with -k
fn contour_to_khalimsky(
    graph: &UndirectedGraph,
    shape: (usize, usize),
    contour: &Contour2d,
) -> Array2<i64> {
    let embedding = GridEmbedding::new(&[shape.0, shape.1]).unwrap();
    let mut result = Array2::<i64>::zeros((2 * shape.0 - 1, 2 * shape.1 - 1));
    let cell = |edge_index: usize| {
        let (s, t) = graph.edge_from_id(edge_index).unwrap();
        let si = embedding.lin_to_grid(s);
        let ti = embedding.lin_to_grid(t);
        ((si[0] + ti[0]) as usize, (si[1] + ti[1]) as usize)
    };
    let mut count = 0;
    for polyline in contour.iter() {
        for segment in polyline.iter() {
            count += 1;
            for &(e, _) in segment.iter() {
                let (y, x) = cell(e);
                result[[y, x]] = count;
            }
            let (y, x) = cell(segment.first().0);
            result[[y, x]] = -count;
            let (y, x) = cell(segment.last().0);
            result[[y, x]] = -count;
        }
    }
    result
}

// two labelled grids are equivalent if their label classes coincide
fn is_in_bijection(a: &Array2<i64>, b: &Array2<i64>) -> bool {
    assert_eq!(a.dim(), b.dim());
    let mut forward = HashMap::new();
    let mut backward = HashMap::new();
    for (&va, &vb) in a.iter().zip(b.iter()) {
        if *forward.entry(va).or_insert(vb) != vb {
            return false;
        }
        if *backward.entry(vb).or_insert(va) != va {
            return false;
        }
    }
    true
}

#[test]
fn contour_2d_empty() {
    let embedding = GridEmbedding::new(&[4, 5]).unwrap();
    let g = get_4_adjacency_graph(&embedding).unwrap();
    let weights = Array1::<i32>::zeros(g.num_edges());
    let contour = fit_contour_2d(&g, &embedding, &weights).unwrap();
    assert_eq!(contour.len(), 0);
}

#[test]
fn contour_2d_simple() {
    let embedding = GridEmbedding::new(&[4, 5]).unwrap();
    let g = get_4_adjacency_graph(&embedding).unwrap();
    let weights = arr1(&[
        0, 0, 1, 0, 2, 0, 3, 0, 0, 0, 0, 1, 0, 2, 0, 3, 0, 0, 0, 1, 1, 1, 2, 0, 3, 0, 0, 0, 0, 2,
        3,
    ]);

    let reference = Array2::from_shape_vec(
        (7, 9),
        vec![
            0, 0, 0, 9, 0, 7, 0, 8, 0, //
            0, 0, 0, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 1, 0, 2, 0, 3, 0, //
            0, 0, 0, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 1, 0, 2, 0, 3, 0, //
            9, 0, 1, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 0, 0, 7, 0, 8, 0,
        ],
    )
    .unwrap();

    let contour = fit_contour_2d(&g, &embedding, &weights).unwrap();
    // three boundary lines, each traced as one polyline of one segment
    assert_eq!(contour.len(), 3);
    let rendered = contour_to_khalimsky(&g, (4, 5), &contour);
    assert!(is_in_bijection(&reference, &rendered), "{rendered:?}");
}

#[test]
fn contour_2d_more_complex() {
    let embedding = GridEmbedding::new(&[4, 5]).unwrap();
    let g = get_4_adjacency_graph(&embedding).unwrap();
    let weights = arr1(&[
        0, 0, 1, 0, 2, 0, 3, 0, 0, 0, 0, 1, 0, 2, 4, 3, 0, 0, 0, 1, 1, 1, 2, 0, 3, 0, 0, 0, 1, 2,
        3,
    ]);

    let reference = Array2::from_shape_vec(
        (7, 9),
        vec![
            0, 0, 0, 1, 0, 6, 0, 8, 0, //
            0, 0, 0, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 1, 0, 6, 0, 9, 0, //
            0, 0, 0, 0, 5, 0, 0, 0, 0, //
            0, 0, 0, 2, 0, 7, 0, 9, 0, //
            3, 0, 3, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 4, 0, 7, 0, 8, 0,
        ],
    )
    .unwrap();

    let contour = fit_contour_2d(&g, &embedding, &weights).unwrap();
    let rendered = contour_to_khalimsky(&g, (4, 5), &contour);
    assert!(is_in_bijection(&reference, &rendered), "{rendered:?}");
}

#[test]
fn subdivide_steep_threshold_keeps_everything() {
    let embedding = GridEmbedding::new(&[4, 5]).unwrap();
    let g = get_4_adjacency_graph(&embedding).unwrap();
    let weights = arr1(&[
        0, 0, 1, 0, 2, 0, 3, 0, 0, 0, 0, 1, 0, 2, 4, 3, 0, 0, 0, 1, 1, 1, 2, 0, 3, 0, 0, 0, 1, 2,
        3,
    ]);

    let contour = fit_contour_2d(&g, &embedding, &weights).unwrap();
    let rendered = contour_to_khalimsky(&g, (4, 5), &contour);
    // with the default-like relative threshold nothing is split
    let subdivided = contour.subdivide(0.05, true, 2.0);
    let rendered_subdivided = contour_to_khalimsky(&g, (4, 5), &subdivided);
    assert!(is_in_bijection(&rendered, &rendered_subdivided));
}

#[test]
fn subdivide_splits_the_bent_line() {
    let embedding = GridEmbedding::new(&[4, 5]).unwrap();
    let g = get_4_adjacency_graph(&embedding).unwrap();
    let weights = arr1(&[
        0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0,
        0,
    ]);

    // one L-shaped boundary; a tiny absolute threshold splits it at the
    // corner into its vertical and horizontal runs
    let contour = fit_contour_2d(&g, &embedding, &weights).unwrap();
    assert_eq!(contour.len(), 1);
    assert_eq!(contour[0].number_of_elements(), 5);

    let subdivided = contour.subdivide(0.000001, false, 0.0);
    assert_eq!(subdivided.len(), 1);
    assert_eq!(subdivided[0].len(), 2);

    let reference = Array2::from_shape_vec(
        (7, 9),
        vec![
            0, 0, 0, 2, 0, 0, 0, 0, 0, //
            0, 0, 0, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 1, 0, 0, 0, 0, 0, //
            0, 0, 0, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 2, 0, 0, 0, 0, 0, //
            3, 0, 3, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 0, 0, 0, 0, 0, 0,
        ],
    )
    .unwrap();
    let rendered = contour_to_khalimsky(&g, (4, 5), &subdivided);
    assert!(is_in_bijection(&reference, &rendered), "{rendered:?}");
}

#[test]
fn subdivision_is_idempotent_on_traced_contours() {
    let embedding = GridEmbedding::new(&[4, 5]).unwrap();
    let g = get_4_adjacency_graph(&embedding).unwrap();
    let weights = arr1(&[
        0, 0, 1, 0, 2, 0, 3, 0, 0, 0, 0, 1, 0, 2, 4, 3, 0, 0, 0, 1, 1, 1, 2, 0, 3, 0, 0, 0, 1, 2,
        3,
    ]);
    let contour = fit_contour_2d(&g, &embedding, &weights).unwrap();
    for (epsilon, relative, min_size) in [(0.000001, false, 0.0), (0.05, true, 2.0), (0.5, false, 1.0)] {
        let once = contour.subdivide(epsilon, relative, min_size);
        let twice = once.subdivide(epsilon, relative, min_size);
        assert_eq!(once, twice);
    }
}
