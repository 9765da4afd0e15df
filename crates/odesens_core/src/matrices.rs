//! Sample matrices and the column-substituted matrices each estimator needs.

use serde::{Deserialize, Serialize};

use crate::estimator::Estimator;

/// n × k matrix of parameter draws, stored row-major.
///
/// Columns follow the order of `parameter_names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMatrix {
    parameter_names: Vec<String>,
    nrows: usize,
    data: Vec<f64>,
}

impl SampleMatrix {
    /// Build from row-major data. Returns `None` if the length is not a
    /// multiple of the column count.
    pub fn from_rows(parameter_names: Vec<String>, data: Vec<f64>) -> Option<Self> {
        let k = parameter_names.len();
        if k == 0 || data.len() % k != 0 {
            return None;
        }
        Some(Self {
            nrows: data.len() / k,
            parameter_names,
            data,
        })
    }

    /// Build from one vector per parameter. All columns must share a length.
    pub fn from_columns(parameter_names: Vec<String>, columns: &[Vec<f64>]) -> Self {
        let k = columns.len();
        let nrows = columns.first().map_or(0, Vec::len);
        debug_assert!(columns.iter().all(|c| c.len() == nrows));
        let mut data = Vec::with_capacity(nrows * k);
        for i in 0..nrows {
            data.extend(columns.iter().map(|c| c[i]));
        }
        Self {
            parameter_names,
            nrows,
            data,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.parameter_names.len()
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let k = self.ncols();
        &self.data[i * k..(i + 1) * k]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.ncols())
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.ncols() + col]
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows().map(|r| r[j]).collect()
    }

    /// Copy of `self` with column `j` taken from `donor`.
    pub fn with_column_from(&self, donor: &SampleMatrix, j: usize) -> SampleMatrix {
        debug_assert_eq!(self.nrows, donor.nrows);
        debug_assert_eq!(self.ncols(), donor.ncols());
        let k = self.ncols();
        let mut data = self.data.clone();
        for i in 0..self.nrows {
            data[i * k + j] = donor.data[i * k + j];
        }
        SampleMatrix {
            parameter_names: self.parameter_names.clone(),
            nrows: self.nrows,
            data,
        }
    }
}

/// The base matrices and the k mixed matrices for one estimator.
///
/// - Jansen: `mixed[j]` is B with column j from A.
/// - Martinez: `mixed[j]` is A with column j from B.
#[derive(Debug, Clone)]
pub struct DesignMatrices {
    pub estimator: Estimator,
    pub a: SampleMatrix,
    pub b: SampleMatrix,
    pub mixed: Vec<SampleMatrix>,
}

impl DesignMatrices {
    pub fn build(estimator: Estimator, a: SampleMatrix, b: SampleMatrix) -> Self {
        let mixed = (0..a.ncols())
            .map(|j| match estimator {
                Estimator::Jansen => b.with_column_from(&a, j),
                Estimator::Martinez => a.with_column_from(&b, j),
            })
            .collect();
        Self {
            estimator,
            a,
            b,
            mixed,
        }
    }

    pub fn n(&self) -> usize {
        self.a.nrows()
    }

    /// Rows that need a model evaluation: n·(k+2)
    pub fn total_rows(&self) -> usize {
        self.a.nrows() * (self.mixed.len() + 2)
    }

    /// A, B, then the mixed matrices in parameter order
    pub fn iter(&self) -> impl Iterator<Item = &SampleMatrix> {
        [&self.a, &self.b].into_iter().chain(self.mixed.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(k: usize) -> Vec<String> {
        (0..k).map(|j| format!("p{j}")).collect()
    }

    fn base() -> (SampleMatrix, SampleMatrix) {
        let a = SampleMatrix::from_rows(names(3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = SampleMatrix::from_rows(names(3), vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0])
            .unwrap();
        (a, b)
    }

    #[test]
    fn test_from_columns_matches_rows() {
        let m = SampleMatrix::from_columns(names(2), &[vec![1.0, 3.0], vec![2.0, 4.0]]);
        assert_eq!(m.row(0), &[1.0, 2.0]);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert_eq!(m.column(1), vec![2.0, 4.0]);
        assert_eq!(m.get(1, 0), 3.0);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(SampleMatrix::from_rows(names(2), vec![1.0, 2.0, 3.0]).is_none());
        assert!(SampleMatrix::from_rows(Vec::new(), vec![]).is_none());
    }

    #[test]
    fn test_jansen_mixes_into_b() {
        let (a, b) = base();
        let design = DesignMatrices::build(Estimator::Jansen, a, b);
        assert_eq!(design.mixed.len(), 3);
        assert_eq!(design.mixed[1].row(0), &[10.0, 2.0, 30.0]);
        assert_eq!(design.mixed[1].row(1), &[40.0, 5.0, 60.0]);
    }

    #[test]
    fn test_martinez_mixes_into_a() {
        let (a, b) = base();
        let design = DesignMatrices::build(Estimator::Martinez, a, b);
        assert_eq!(design.mixed[0].row(0), &[10.0, 2.0, 3.0]);
        assert_eq!(design.mixed[2].row(1), &[4.0, 5.0, 60.0]);
    }

    #[test]
    fn test_total_rows_and_order() {
        let (a, b) = base();
        let design = DesignMatrices::build(Estimator::Jansen, a, b);
        assert_eq!(design.n(), 2);
        assert_eq!(design.total_rows(), 2 * (3 + 2));
        let firsts: Vec<f64> = design.iter().map(|m| m.get(0, 0)).collect();
        assert_eq!(firsts, vec![1.0, 10.0, 1.0, 10.0, 10.0]);
    }
}
