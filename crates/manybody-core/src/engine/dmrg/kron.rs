use crate::core::basis::QuantumNumbers;
use nalgebra::DMatrix;
use nalgebra_sparse::CooMatrix;
use std::collections::HashMap;

/// The product states of two charge-resolved bases carrying a target total
/// charge, in row-major (left index major) order.
#[derive(Debug, Clone)]
pub struct SectorBasis {
    pub indices: Vec<(usize, usize)>,
    lookup: HashMap<(usize, usize), usize>,
}

impl SectorBasis {
    pub fn new(left: &QuantumNumbers, right: &QuantumNumbers, target: i32) -> Self {
        let mut indices = Vec::new();
        for i in 0..left.len() {
            for j in 0..right.len() {
                if left.charge(i) + right.charge(j) == target {
                    indices.push((i, j));
                }
            }
        }
        let lookup = indices
            .iter()
            .enumerate()
            .map(|(rank, &pair)| (pair, rank))
            .collect();
        Self { indices, lookup }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn rank(&self, left: usize, right: usize) -> Option<usize> {
        self.lookup.get(&(left, right)).copied()
    }
}

fn nonzeros(matrix: &DMatrix<f64>) -> Vec<(usize, usize, f64)> {
    let mut entries = Vec::new();
    for i in 0..matrix.nrows() {
        for j in 0..matrix.ncols() {
            let value = matrix[(i, j)];
            if value != 0.0 {
                entries.push((i, j, value));
            }
        }
    }
    entries
}

/// The Kronecker product `a ⊗ b` restricted to a charge sector.
///
/// Only matrix elements that stay inside the sector are kept; elements
/// leading out of it are dropped, which is exact for charge-conserving
/// operator combinations.
pub fn kron_sector(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    sector: &SectorBasis,
) -> CooMatrix<f64> {
    let mut coo = CooMatrix::new(sector.len(), sector.len());
    let a_entries = nonzeros(a);
    let b_entries = nonzeros(b);
    for &(i, i2, av) in &a_entries {
        for &(j, j2, bv) in &b_entries {
            let (Some(row), Some(col)) = (sector.rank(i, j), sector.rank(i2, j2)) else {
                continue;
            };
            coo.push(row, col, av * bv);
        }
    }
    coo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spin::{SpinAxis, spin_matrix, sz_charges};
    use nalgebra_sparse::CsrMatrix;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn sector_basis_of_two_spin_halves_at_zero_sz_has_two_states() {
        let q = sz_charges(0.5).unwrap();
        let sector = SectorBasis::new(&q, &q, 0);
        assert_eq!(sector.len(), 2);
        assert_eq!(sector.indices, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn heisenberg_bond_in_the_zero_sector_reproduces_the_singlet() {
        let q = sz_charges(0.5).unwrap();
        let sector = SectorBasis::new(&q, &q, 0);
        let sz = spin_matrix(0.5, SpinAxis::Z).unwrap();
        let sp = spin_matrix(0.5, SpinAxis::Plus).unwrap();
        let sm = spin_matrix(0.5, SpinAxis::Minus).unwrap();

        let mut coo = kron_sector(&sz, &sz, &sector);
        for (r, c, v) in kron_sector(&sp, &sm, &sector).triplet_iter() {
            coo.push(r, c, 0.5 * v);
        }
        for (r, c, v) in kron_sector(&sm, &sp, &sector).triplet_iter() {
            coo.push(r, c, 0.5 * v);
        }
        let matrix = CsrMatrix::from(&coo);

        // In the {|ud>, |du>} basis the bond reads [[-1/4, 1/2], [1/2, -1/4]],
        // whose lowest eigenvalue is the singlet energy -3/4.
        let dense = DMatrix::from_fn(2, 2, |i, j| {
            matrix
                .get_entry(i, j)
                .map(|e| e.into_value())
                .unwrap_or(0.0)
        });
        let (values, _) = crate::core::utils::linalg::symmetric_eigen(dense);
        assert!((values[0] + 0.75).abs() < TOLERANCE);
    }

    #[test]
    fn charge_violating_elements_are_dropped() {
        let q = sz_charges(0.5).unwrap();
        let sector = SectorBasis::new(&q, &q, 0);
        let sp = spin_matrix(0.5, SpinAxis::Plus).unwrap();
        let identity = spin_matrix(0.5, SpinAxis::Identity).unwrap();
        // S+ x 1 raises the total charge and cannot stay inside the sector.
        let coo = kron_sector(&sp, &identity, &sector);
        assert_eq!(coo.nnz(), 0);
    }
}
