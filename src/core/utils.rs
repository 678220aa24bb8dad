//! Utility functions for statevector operations.
//!
//! This module contains helper functions for:
//! - Building small controlled operators from a base matrix.
//! - Scattering and gathering qubit bits inside basis indices.
//! - Sanity checks on matrices (unitarity, trace).

use ndarray::Array2;
use num_complex::Complex64;

/// Tolerance used when comparing amplitudes and probabilities.
pub const TOLERANCE: f64 = 1e-10;

/// Computes the trace of a matrix (sum of diagonal elements).
pub fn trace(matrix: &Array2<Complex64>) -> Complex64 {
    matrix.diag().sum()
}

/// Generates the full operator matrix ($2^N \times 2^N$) on a small register.
///
/// It expands a local operator acting on `targets` (and controlled by `controls`)
/// to an operator on `num_total_qubits`. Used to derive the CNOT, CZ and Toffoli
/// matrices from their base Pauli.
pub fn expand_operator(
    num_total_qubits: usize,
    matrix: &Array2<Complex64>,
    targets: &[usize],
    controls: &[usize],
) -> Array2<Complex64> {
    let dim = 1 << num_total_qubits;
    let mut full_matrix = Array2::<Complex64>::zeros((dim, dim));

    let control_mask = mask_of(controls);
    let passive_mask = !mask_of(targets);

    for col_idx in 0..dim {
        // Controls not all set: identity on this column
        if (col_idx & control_mask) != control_mask {
            full_matrix[[col_idx, col_idx]] = Complex64::new(1.0, 0.0);
            continue;
        }

        let small_col = extract_bits(col_idx, targets);
        for small_row in 0..matrix.nrows() {
            let val = matrix[[small_row, small_col]];
            if val.norm_sqr() < f64::EPSILON {
                continue;
            }
            let row_idx = (col_idx & passive_mask) | deposit_bits(small_row, targets);
            full_matrix[[row_idx, col_idx]] = val;
        }
    }
    full_matrix
}

/// Bit mask with a 1 at every position listed in `indices`.
pub fn mask_of(indices: &[usize]) -> usize {
    indices.iter().fold(0usize, |mask, &i| mask | (1 << i))
}

/// Extracts the bits in positions `indices` of `value` into a compact integer.
///
/// Bit `k` of the result is bit `indices[k]` of `value`.
pub fn extract_bits(value: usize, indices: &[usize]) -> usize {
    let mut result = 0;
    for (i, &pos) in indices.iter().enumerate() {
        if (value >> pos) & 1 == 1 {
            result |= 1 << i;
        }
    }
    result
}

/// Scatters bits from `compact_value` into the positions specified by `indices`.
///
/// Inverse of [`extract_bits`].
pub fn deposit_bits(compact_value: usize, indices: &[usize]) -> usize {
    let mut result = 0;
    for (i, &pos) in indices.iter().enumerate() {
        if (compact_value >> i) & 1 == 1 {
            result |= 1 << pos;
        }
    }
    result
}

/// Find duplicate in a slice of usize
pub fn find_duplicate(indices: &[usize]) -> Option<usize> {
    let mut seen = std::collections::HashSet::new();
    indices.iter().find(|&&idx| !seen.insert(idx)).copied()
}

/// Checks if a given matrix is unitary ($U U^\dagger = I$).
pub fn is_unitary(matrix: &Array2<Complex64>) -> bool {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return false;
    }
    let eye = Array2::<Complex64>::eye(rows);
    let u_dagger = matrix.t().mapv(|x| x.conj());
    let product = matrix.dot(&u_dagger);

    product
        .iter()
        .zip(eye.iter())
        .all(|(a, b)| (*a - *b).norm() < 1e-9)
}
