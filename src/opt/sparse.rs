//! Minimal sparse matrices for constraint assembly.
//!
//! Constraints are collected as `(row, col, value)` triplets while the model
//! is enumerated, then converted once into compressed sparse column form for
//! the oracle. Rows grow with the square of the site count, so triplet
//! vectors are reserved up front by the caller and the conversion is a
//! single counting sort over columns.

/// Append-only `(row, col, value)` triplet collector.
#[derive(Debug, Clone)]
pub struct TripletMatrix {
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        TripletMatrix { nrows, ncols, rows: Vec::new(), cols: Vec::new(), values: Vec::new() }
    }

    pub fn with_capacity(nrows: usize, ncols: usize, capacity: usize) -> Self {
        TripletMatrix {
            nrows,
            ncols,
            rows: Vec::with_capacity(capacity),
            cols: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.nrows && col < self.ncols);
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Counting-sort the triplets by column into CSC form.
    pub fn to_csc(&self) -> CscMatrix {
        let mut counts = vec![0usize; self.ncols + 1];
        for &c in &self.cols {
            counts[c + 1] += 1;
        }
        for i in 0..self.ncols {
            counts[i + 1] += counts[i];
        }
        let col_ptr = counts.clone();

        let mut row_idx = vec![0usize; self.nnz()];
        let mut values = vec![0.0f64; self.nnz()];
        let mut next = counts;
        for k in 0..self.nnz() {
            let slot = next[self.cols[k]];
            next[self.cols[k]] += 1;
            row_idx[slot] = self.rows[k];
            values[slot] = self.values[k];
        }

        CscMatrix { nrows: self.nrows, ncols: self.ncols, col_ptr, row_idx, values }
    }
}

/// A compressed-sparse-column matrix; the oracle's wire format.
#[derive(Debug, Clone)]
pub struct CscMatrix {
    pub nrows: usize,
    pub ncols: usize,
    /// `col_ptr[j] .. col_ptr[j+1]` delimits column j in `row_idx`/`values`.
    pub col_ptr: Vec<usize>,
    pub row_idx: Vec<usize>,
    pub values: Vec<f64>,
}

impl CscMatrix {
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate the `(row, value)` entries of column `col`.
    pub fn column(&self, col: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.col_ptr[col]..self.col_ptr[col + 1];
        self.row_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }
}

/// Place blocks side by side into one wider CSC matrix.
///
/// `parts` are `(column offset, block)` pairs over a shared row space; the
/// blocks must not overlap. Columns covered by no block stay empty.
pub fn hstack(nrows: usize, ncols: usize, parts: &[(usize, &CscMatrix)]) -> CscMatrix {
    let nnz = parts.iter().map(|(_, m)| m.nnz()).sum();
    let mut col_ptr = Vec::with_capacity(ncols + 1);
    let mut row_idx = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);

    col_ptr.push(0);
    for col in 0..ncols {
        for &(offset, block) in parts {
            debug_assert_eq!(block.nrows, nrows);
            if col >= offset && col < offset + block.ncols {
                for (row, value) in block.column(col - offset) {
                    row_idx.push(row);
                    values.push(value);
                }
            }
        }
        col_ptr.push(row_idx.len());
    }

    CscMatrix { nrows, ncols, col_ptr, row_idx, values }
}
