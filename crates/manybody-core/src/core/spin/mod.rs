//! Spin algebra for arbitrary spin length.
//!
//! Site bases are ordered by descending Sz. Matrix elements follow the
//! standard ladder convention `<m±1|S±|m> = sqrt(s(s+1) - m(m±1))`. Charges
//! for U(1) bookkeeping are reported as twice the Sz value so half-integer
//! spins stay integral.

use crate::core::basis::QuantumNumbers;
use nalgebra::DMatrix;
use num_complex::Complex64;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SpinError {
    #[error("spin length must be a non-negative multiple of 1/2, got {0}")]
    InvalidSpin(f64),
}

/// The real spin operators of a single site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinAxis {
    Identity,
    Z,
    Plus,
    Minus,
    X,
}

fn multiplicity(s: f64) -> Result<usize, SpinError> {
    let doubled = 2.0 * s;
    if s < 0.0 || (doubled - doubled.round()).abs() > 1e-9 {
        return Err(SpinError::InvalidSpin(s));
    }
    Ok(doubled.round() as usize + 1)
}

/// Sz value of the `row`-th basis state of a spin-`s` site.
fn sz_value(s: f64, row: usize) -> f64 {
    s - row as f64
}

/// The matrix of a spin operator for spin length `s`.
pub fn spin_matrix(s: f64, axis: SpinAxis) -> Result<DMatrix<f64>, SpinError> {
    let dim = multiplicity(s)?;
    let mut matrix = DMatrix::zeros(dim, dim);
    match axis {
        SpinAxis::Identity => {
            matrix.fill_with_identity();
        }
        SpinAxis::Z => {
            for row in 0..dim {
                matrix[(row, row)] = sz_value(s, row);
            }
        }
        SpinAxis::Plus => {
            for col in 1..dim {
                let m = sz_value(s, col);
                matrix[(col - 1, col)] = (s * (s + 1.0) - m * (m + 1.0)).sqrt();
            }
        }
        SpinAxis::Minus => {
            for col in 0..dim - 1 {
                let m = sz_value(s, col);
                matrix[(col + 1, col)] = (s * (s + 1.0) - m * (m - 1.0)).sqrt();
            }
        }
        SpinAxis::X => {
            let plus = spin_matrix(s, SpinAxis::Plus)?;
            let minus = spin_matrix(s, SpinAxis::Minus)?;
            matrix = (plus + minus) * 0.5;
        }
    }
    Ok(matrix)
}

/// The imaginary spin operator Sy.
pub fn spin_matrix_y(s: f64) -> Result<DMatrix<Complex64>, SpinError> {
    let plus = spin_matrix(s, SpinAxis::Plus)?;
    let minus = spin_matrix(s, SpinAxis::Minus)?;
    let half_i = Complex64::new(0.0, -0.5);
    Ok((plus - minus).map(|x| half_i * x))
}

/// The doubled-Sz charges of the site basis, descending.
pub fn sz_charges(s: f64) -> Result<QuantumNumbers, SpinError> {
    let dim = multiplicity(s)?;
    Ok(QuantumNumbers::from_charges(
        "Sz",
        (0..dim)
            .map(|row| (2.0 * sz_value(s, row)).round() as i32)
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn spin_half_z_is_diag_half_minus_half() {
        let sz = spin_matrix(0.5, SpinAxis::Z).unwrap();
        assert!((sz[(0, 0)] - 0.5).abs() < TOLERANCE);
        assert!((sz[(1, 1)] + 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn spin_one_ladder_elements_are_sqrt_two() {
        let sp = spin_matrix(1.0, SpinAxis::Plus).unwrap();
        assert!((sp[(0, 1)] - 2.0f64.sqrt()).abs() < TOLERANCE);
        assert!((sp[(1, 2)] - 2.0f64.sqrt()).abs() < TOLERANCE);
    }

    #[test]
    fn plus_and_minus_are_transposes() {
        let sp = spin_matrix(1.5, SpinAxis::Plus).unwrap();
        let sm = spin_matrix(1.5, SpinAxis::Minus).unwrap();
        assert!((sp.transpose() - sm).norm() < TOLERANCE);
    }

    #[test]
    fn commutator_of_sz_and_splus_is_splus() {
        let sz = spin_matrix(1.0, SpinAxis::Z).unwrap();
        let sp = spin_matrix(1.0, SpinAxis::Plus).unwrap();
        let commutator = &sz * &sp - &sp * &sz;
        assert!((commutator - sp).norm() < TOLERANCE);
    }

    #[test]
    fn casimir_is_s_times_s_plus_one() {
        let s = 1.0;
        let sz = spin_matrix(s, SpinAxis::Z).unwrap();
        let sp = spin_matrix(s, SpinAxis::Plus).unwrap();
        let sm = spin_matrix(s, SpinAxis::Minus).unwrap();
        let casimir = &sz * &sz + (&sp * &sm + &sm * &sp) * 0.5;
        let expected = DMatrix::identity(3, 3) * (s * (s + 1.0));
        assert!((casimir - expected).norm() < TOLERANCE);
    }

    #[test]
    fn sy_is_hermitian_and_traceless() {
        let sy = spin_matrix_y(0.5).unwrap();
        let adjoint = sy.adjoint();
        assert!((&sy - adjoint).norm() < TOLERANCE);
        assert!(sy.trace().norm() < TOLERANCE);
    }

    #[test]
    fn charges_are_doubled_sz_descending() {
        let charges = sz_charges(1.0).unwrap();
        assert_eq!(charges.charges(), &[2, 0, -2]);
    }

    #[test]
    fn invalid_spin_length_is_rejected() {
        assert_eq!(spin_matrix(0.3, SpinAxis::Z), Err(SpinError::InvalidSpin(0.3)));
    }
}
