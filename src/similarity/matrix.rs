//! Similarity matrix construction.

use rayon::prelude::*;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use super::SimilarityError;

/// Square, symmetric matrix of pairwise similarities stored row-major.
///
/// The diagonal is always exactly `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build a matrix from precomputed rows.
    ///
    /// Rows must form a square. Values are taken as-is, so callers that
    /// build matrices by hand are responsible for symmetry.
    #[allow(dead_code)]
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, SimilarityError> {
        let size = rows.len();
        let mut values = Vec::with_capacity(size * size);

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(SimilarityError::DimensionMismatch {
                    expected: size,
                    got: row.len(),
                    index,
                });
            }
            values.extend(row);
        }

        Ok(Self { size, values })
    }

    /// Number of documents (rows).
    pub fn len(&self) -> usize {
        self.size
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Value at `(row, col)`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(row < self.size && col < self.size, "index out of bounds");
        self.values[row * self.size + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks(self.size.max(1))
    }

    /// Row-major nested copy, N rows of N values.
    #[allow(dead_code)]
    pub fn to_nested(&self) -> Vec<Vec<f32>> {
        self.rows().map(<[f32]>::to_vec).collect()
    }

    /// Entries of the strict upper triangle (`i < j`) in row-major order.
    pub(crate) fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.size).flat_map(move |i| {
            (i + 1..self.size).map(move |j| (i, j, self.values[i * self.size + j]))
        })
    }
}

impl Serialize for SimilarityMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.size))?;
        for row in self.rows() {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

/// Compute the pairwise similarity matrix for a set of embedding vectors.
///
/// Each off-diagonal entry is the dot product of the two vectors. That is the
/// cosine similarity only when every vector has unit length: the vectors are
/// NOT renormalized here. Run [`check_normalized`] on untrusted input first,
/// otherwise the matrix holds plain dot products.
///
/// The diagonal is set to `1.0` without computation. Each unordered pair is
/// computed once and mirrored.
pub fn compute_matrix(vectors: &[Vec<f32>]) -> Result<SimilarityMatrix, SimilarityError> {
    let first = vectors.first().ok_or(SimilarityError::EmptyInput)?;
    let dimensions = first.len();

    if let Some((index, vector)) = vectors
        .iter()
        .enumerate()
        .find(|(_, v)| v.len() != dimensions)
    {
        return Err(SimilarityError::DimensionMismatch {
            expected: dimensions,
            got: vector.len(),
            index,
        });
    }

    let size = vectors.len();
    log::debug!("computing similarity matrix for {size} vectors of {dimensions} dimensions");

    // Row i holds the scores against vectors i+1..N
    let upper: Vec<Vec<f32>> = (0..size)
        .into_par_iter()
        .map(|i| {
            vectors[i + 1..]
                .iter()
                .map(|other| dot(&vectors[i], other))
                .collect()
        })
        .collect();

    let mut values = vec![0.0; size * size];
    for (i, row) in upper.into_iter().enumerate() {
        values[i * size + i] = 1.0;
        for (offset, score) in row.into_iter().enumerate() {
            let j = i + 1 + offset;
            values[i * size + j] = score;
            values[j * size + i] = score;
        }
    }

    Ok(SimilarityMatrix { size, values })
}

/// Verify that every vector has unit L2 norm within `tolerance`.
///
/// Reports the first offending vector.
pub fn check_normalized(vectors: &[Vec<f32>], tolerance: f32) -> Result<(), SimilarityError> {
    for (index, vector) in vectors.iter().enumerate() {
        let norm = l2_norm(vector);
        // NaN norms fail this comparison too
        if !((norm - 1.0).abs() <= tolerance) {
            return Err(SimilarityError::NotNormalized { index, norm });
        }
    }
    Ok(())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
