//! Bijection between multidimensional grid coordinates and linear indices.

use crate::error::{Error, Result};

/// A dense row-major grid of a given shape.
///
/// Maps coordinates to linear indices and back; coordinates are signed so
/// that out-of-grid neighbor positions can be represented and tested with
/// [`contains`](GridEmbedding::contains).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridEmbedding {
    shape: Vec<i64>,
    strides: Vec<i64>,
    size: usize,
}

impl GridEmbedding {
    /// Create an embedding for the given shape.
    ///
    /// Fails with `InvalidArgument` if the shape is empty or an axis is zero.
    pub fn new(shape: &[usize]) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::invalid("embedding shape must have at least one axis"));
        }
        if shape.iter().any(|&c| c == 0) {
            return Err(Error::invalid("axis size must be positive"));
        }
        let dim = shape.len();
        let mut strides = vec![1i64; dim];
        for i in (0..dim - 1).rev() {
            strides[i] = strides[i + 1] * shape[i + 1] as i64;
        }
        let size = shape.iter().product();
        Ok(GridEmbedding {
            shape: shape.iter().map(|&c| c as i64).collect(),
            strides,
            size,
        })
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.shape.len()
    }

    /// Total number of grid cells.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The grid shape.
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Whether `coordinates` lies inside the grid.
    pub fn contains(&self, coordinates: &[i64]) -> bool {
        coordinates
            .iter()
            .zip(&self.shape)
            .all(|(&c, &s)| c >= 0 && c < s)
    }

    /// Linear index of in-grid `coordinates`.
    pub fn grid_to_lin(&self, coordinates: &[i64]) -> usize {
        debug_assert_eq!(coordinates.len(), self.dimension());
        coordinates
            .iter()
            .zip(&self.strides)
            .map(|(&c, &s)| c * s)
            .sum::<i64>() as usize
    }

    /// Coordinates of the cell with linear index `index`.
    pub fn lin_to_grid(&self, index: usize) -> Vec<i64> {
        let mut index = index as i64;
        let mut result = vec![0i64; self.dimension()];
        for (i, &stride) in self.strides.iter().enumerate() {
            result[i] = index / stride;
            index %= stride;
        }
        result
    }
}
