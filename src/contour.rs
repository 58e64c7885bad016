//! 2-d contour extraction: tracing the polylines of a graph cut of a
//! 4-adjacency grid, and their simplification.

use crate::embedding::GridEmbedding;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::INVALID;
use fixedbitset::FixedBitSet;
use ndarray::{Array1, Array2};
use num_traits::Zero;

/// A (pseudo) line segment of a contour: an ordered list of
/// `(edge_id, midpoint)` elements, the midpoint being the `(y, x)` image
/// coordinates of the 1-face carried by the edge.
///
/// The elements of a contour segment do not necessarily form a straight
/// line in the geometric sense; segments are the subdivision unit of
/// [`Contour2d::subdivide`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSegment2d {
    elements: Vec<(usize, (f64, f64))>,
}

impl ContourSegment2d {
    /// Number of elements in the segment.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// First element of the segment.
    pub fn first(&self) -> (usize, (f64, f64)) {
        self.elements[0]
    }

    /// Last element of the segment.
    pub fn last(&self) -> (usize, (f64, f64)) {
        self.elements[self.elements.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (usize, (f64, f64))> {
        self.elements.iter()
    }
}

impl std::ops::Index<usize> for ContourSegment2d {
    type Output = (usize, (f64, f64));

    fn index(&self, i: usize) -> &Self::Output {
        &self.elements[i]
    }
}

/// A polyline of a contour: consecutive contour segments forming one
/// connected frontier between two intersections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolylineContour2d {
    segments: Vec<ContourSegment2d>,
}

impl PolylineContour2d {
    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total number of contour elements over all segments.
    pub fn number_of_elements(&self) -> usize {
        self.segments.iter().map(ContourSegment2d::len).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContourSegment2d> {
        self.segments.iter()
    }
}

impl std::ops::Index<usize> for PolylineContour2d {
    type Output = ContourSegment2d;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

/// The set of polylines separating the regions of a graph cut.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour2d {
    polylines: Vec<PolylineContour2d>,
}

impl Contour2d {
    /// Number of polylines.
    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PolylineContour2d> {
        self.polylines.iter()
    }

    /// Subdivide every segment of every polyline with the
    /// Ramer-Douglas-Peucker algorithm.
    ///
    /// A segment is recursively split at its element farthest from the
    /// line joining its extremities while that distance reaches the
    /// threshold: `epsilon` itself, or `epsilon` times the distance
    /// between the extremities when `relative_epsilon` is set. Segments
    /// whose extremities are closer than `min_size` are kept whole. The
    /// operation is idempotent at fixed parameters.
    pub fn subdivide(&self, epsilon: f64, relative_epsilon: bool, min_size: f64) -> Contour2d {
        let mut result = Contour2d::default();
        for polyline in &self.polylines {
            let mut subdivided = PolylineContour2d::default();
            for segment in &polyline.segments {
                subdivide_segment(segment, epsilon, relative_epsilon, min_size, &mut subdivided);
            }
            result.polylines.push(subdivided);
        }
        result
    }
}

impl std::ops::Index<usize> for Contour2d {
    type Output = PolylineContour2d;

    fn index(&self, i: usize) -> &Self::Output {
        &self.polylines[i]
    }
}

fn norm(v: (f64, f64), w: (f64, f64)) -> f64 {
    ((v.0 - w.0) * (v.0 - w.0) + (v.1 - w.1) * (v.1 - w.1)).sqrt()
}

// minimum distance between the line (v, w) and the point p
fn distance_to_line(v: (f64, f64), w: (f64, f64), p: (f64, f64)) -> f64 {
    let length = norm(v, w);
    if length == 0.0 {
        return norm(p, v);
    }
    // coordinates are (y, x)
    ((w.1 - v.1) * p.0 - (w.0 - v.0) * p.1 + w.0 * v.1 - w.1 * v.0).abs() / length
}

fn subdivide_segment(
    segment: &ContourSegment2d,
    epsilon: f64,
    relative_epsilon: bool,
    min_size: f64,
    out: &mut PolylineContour2d,
) {
    let size = segment.len();
    if size == 0 {
        return;
    }
    let mut is_subdivision_element = FixedBitSet::with_capacity(size);
    let mut stack = vec![(0usize, size - 1)];

    while let Some((first, last)) = stack.pop() {
        let coordinate_first = segment[first].1;
        let coordinate_last = segment[last].1;
        let span = norm(coordinate_first, coordinate_last);
        if span <= min_size {
            continue;
        }
        let threshold = if relative_epsilon { epsilon * span } else { epsilon };

        let mut max_distance = threshold;
        let mut max_element = INVALID;
        for i in first + 1..last {
            let d = distance_to_line(coordinate_first, coordinate_last, segment[i].1);
            if d >= max_distance {
                max_distance = d;
                max_element = i;
            }
        }
        if max_element != INVALID {
            is_subdivision_element.insert(max_element);
            stack.push((first, max_element));
            stack.push((max_element + 1, last));
        }
    }

    let mut piece = ContourSegment2d::default();
    let mut i = 1;
    piece.elements.push(segment[0]);
    while i < size {
        piece.elements.push(segment[i]);
        if is_subdivision_element.contains(i) {
            out.segments.push(std::mem::take(&mut piece));
            i += 1;
            if i < size {
                piece.elements.push(segment[i]);
            }
        }
        i += 1;
    }
    if !piece.is_empty() {
        out.segments.push(piece);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    North,
    East,
    South,
    West,
}

// the khalimsky rendering of the cut, with an implicit extra border:
// 1-faces carry the edge id of a nonzero edge, 0-faces any incident cut
// edge id, everything else INVALID
struct CutSpace {
    faces: Array2<usize>,
    height: usize,
    width: usize,
}

impl CutSpace {
    fn at(&self, y: usize, x: usize) -> usize {
        self.faces[[y, x]]
    }

    // a 0-face is an intersection if it lies on the image border or
    // touches three or four cut 1-faces
    fn is_intersection(&self, y: usize, x: usize) -> bool {
        if y == 0 || x == 0 || y == self.height - 1 || x == self.width - 1 {
            return true;
        }
        let mut count = 0;
        if self.at(y, x - 1) != INVALID {
            count += 1;
        }
        if self.at(y, x + 1) != INVALID {
            count += 1;
        }
        if self.at(y - 1, x) != INVALID {
            count += 1;
        }
        if self.at(y + 1, x) != INVALID {
            count += 1;
        }
        count > 2
    }
}

/// Trace the contours of a cut of a 4-adjacency graph on a 2-d grid.
///
/// Edges with a nonzero weight form the cut. Every maximal locally-straight
/// run of cut 1-faces between two intersection points of the Khalimsky
/// rendering becomes one [`ContourSegment2d`]; closed frontiers touching no
/// intersection are traced from their first 1-face in scan order.
pub fn fit_contour_2d<G, T>(
    graph: &G,
    embedding: &GridEmbedding,
    edge_weights: &Array1<T>,
) -> Result<Contour2d>
where
    G: Graph,
    T: Copy + Zero + PartialEq,
{
    if embedding.dimension() != 2 {
        return Err(Error::invalid("contour tracing requires a 2-d embedding"));
    }
    if graph.num_vertices() != embedding.size() {
        return Err(Error::invalid("graph size does not match the embedding"));
    }
    if edge_weights.len() != graph.num_edges() {
        return Err(Error::invalid(
            "edge weights size does not match the number of edges in the graph",
        ));
    }

    let height = 2 * embedding.shape()[0] as usize + 1;
    let width = 2 * embedding.shape()[1] as usize + 1;
    let mut faces = Array2::from_elem((height, width), INVALID);

    for (e, (s, t)) in graph.edges().enumerate() {
        if s == INVALID || edge_weights[e] == T::zero() {
            continue;
        }
        let si = embedding.lin_to_grid(s);
        let ti = embedding.lin_to_grid(t);
        let y = (si[0] + ti[0] + 1) as usize;
        let x = (si[1] + ti[1] + 1) as usize;
        faces[[y, x]] = e;
    }
    for y in (0..height).step_by(2) {
        for x in (0..width).step_by(2) {
            let mut any = INVALID;
            if x > 0 && faces[[y, x - 1]] != INVALID {
                any = faces[[y, x - 1]];
            }
            if x + 1 < width && faces[[y, x + 1]] != INVALID {
                any = faces[[y, x + 1]];
            }
            if y > 0 && faces[[y - 1, x]] != INVALID {
                any = faces[[y - 1, x]];
            }
            if y + 1 < height && faces[[y + 1, x]] != INVALID {
                any = faces[[y + 1, x]];
            }
            faces[[y, x]] = any;
        }
    }

    let space = CutSpace { faces, height, width };
    let mut processed = FixedBitSet::with_capacity(height * width);
    let mut result = Contour2d::default();

    // walks starting at intersections
    for y in (0..height).step_by(2) {
        for x in (0..width).step_by(2) {
            if space.at(y, x) == INVALID
                || processed.contains(y * width + x)
                || !space.is_intersection(y, x)
            {
                continue;
            }
            processed.insert(y * width + x);
            if x != 0 && space.at(y, x - 1) != INVALID && !processed.contains(y * width + x - 1) {
                trace_part(&space, &mut processed, y, x - 1, Side::East, None, &mut result);
            }
            if x != width - 1 && space.at(y, x + 1) != INVALID && !processed.contains(y * width + x + 1) {
                trace_part(&space, &mut processed, y, x + 1, Side::West, None, &mut result);
            }
            if y != 0 && space.at(y - 1, x) != INVALID && !processed.contains((y - 1) * width + x) {
                trace_part(&space, &mut processed, y - 1, x, Side::South, None, &mut result);
            }
            if y != height - 1 && space.at(y + 1, x) != INVALID && !processed.contains((y + 1) * width + x) {
                trace_part(&space, &mut processed, y + 1, x, Side::North, None, &mut result);
            }
        }
    }

    // frontiers without any intersection are closed curves; start them at
    // their first 1-face in scan order and stop when the walk comes back
    for y in 0..height {
        for x in 0..width {
            if (y + x) % 2 == 1 && space.at(y, x) != INVALID && !processed.contains(y * width + x) {
                let (stop, side) = if x % 2 == 0 {
                    ((y - 1, x), Side::North)
                } else {
                    ((y, x - 1), Side::West)
                };
                trace_part(&space, &mut processed, y, x, side, Some(stop), &mut result);
            }
        }
    }

    Ok(result)
}

// walk from a 1-face, alternating 1-face and 0-face moves, until an
// intersection (or the given stop 0-face) is reached; the walk produces
// one polyline holding one segment
fn trace_part(
    space: &CutSpace,
    processed: &mut FixedBitSet,
    mut y: usize,
    mut x: usize,
    entered_from: Side,
    stop: Option<(usize, usize)>,
    result: &mut Contour2d,
) {
    let width = space.width;
    let mut segment = ContourSegment2d::default();
    let mut previous = entered_from;

    loop {
        processed.insert(y * width + x);
        let edge_index = space.at(y, x);
        let midpoint = ((y as f64 - 1.0) / 2.0, (x as f64 - 1.0) / 2.0);
        segment.elements.push((edge_index, midpoint));

        if x % 2 == 0 {
            // the 1-face is drawn along y
            if previous == Side::North {
                y += 1;
            } else {
                y -= 1;
            }
        } else if previous == Side::West {
            x += 1;
        } else {
            x -= 1;
        }

        if space.is_intersection(y, x) || stop == Some((y, x)) {
            break;
        }
        processed.insert(y * width + x);

        if previous != Side::North && space.at(y - 1, x) != INVALID {
            previous = Side::South;
            y -= 1;
        } else if previous != Side::East && space.at(y, x + 1) != INVALID {
            previous = Side::West;
            x += 1;
        } else if previous != Side::South && space.at(y + 1, x) != INVALID {
            previous = Side::North;
            y += 1;
        } else if previous != Side::West && space.at(y, x - 1) != INVALID {
            previous = Side::East;
            x -= 1;
        } else {
            // a dangling end of the cut
            break;
        }
    }

    let mut polyline = PolylineContour2d::default();
    polyline.segments.push(segment);
    result.polylines.push(polyline);
}
