//! Dense row-major tables addressed by a tuple of axis indices.
//!
//! Trajectory batches use three axes (sample, time, state) and index tables
//! use two (time, parameter). The last axis is contiguous in memory.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexGrid<T> {
    shape: Vec<usize>,
    values: Vec<T>,
}

impl<T: Clone> IndexGrid<T> {
    /// A grid of the given axis lengths with every cell set to `fill`.
    pub fn new(shape: Vec<usize>, fill: T) -> Self {
        let cells = shape.iter().product();
        Self {
            shape,
            values: vec![fill; cells],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.offset(index).map(|at| &self.values[at])
    }

    /// Overwrite one cell. Returns false when `index` is out of range.
    pub fn set(&mut self, index: &[usize], value: T) -> bool {
        match self.offset(index) {
            Some(at) => {
                self.values[at] = value;
                true
            }
            None => false,
        }
    }

    /// Raw cells in row-major order
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Cells under one index of the first axis, e.g. one sample's whole
    /// trajectory or one time's row of parameters.
    pub fn outer(&self, first: usize) -> Option<&[T]> {
        let (&rows, rest) = self.shape.split_first()?;
        if first >= rows {
            return None;
        }
        let width: usize = rest.iter().product();
        Some(&self.values[first * width..(first + 1) * width])
    }

    /// Cells along axis `dim` with every other axis pinned.
    ///
    /// `pinned` has one entry per axis. The entry at `dim` is ignored and
    /// every other entry must be `Some` and in range.
    pub fn axis(&self, dim: usize, pinned: &[Option<usize>]) -> Option<Vec<T>> {
        if dim >= self.shape.len() || pinned.len() != self.shape.len() {
            return None;
        }
        let mut index = Vec::with_capacity(pinned.len());
        for (d, p) in pinned.iter().enumerate() {
            index.push(if d == dim { 0 } else { (*p)? });
        }
        let start = self.offset(&index)?;
        let step = self.stride(dim);
        Some(
            (0..self.shape[dim])
                .map(|k| self.values[start + k * step].clone())
                .collect(),
        )
    }

    fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        index
            .iter()
            .zip(&self.shape)
            .try_fold(0, |acc, (&i, &len)| (i < len).then_some(acc * len + i))
    }

    fn stride(&self, dim: usize) -> usize {
        self.shape[dim + 1..].iter().product()
    }
}
