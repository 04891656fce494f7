use crate::core::basis::QuantumNumbers;
use crate::core::spin::{SpinAxis, spin_matrix, sz_charges};
use crate::core::utils::linalg::{self, kron};
use crate::engine::error::EngineError;
use nalgebra::DMatrix;

/// An XXZ spin chain in a transverse-free magnetic field:
/// `H = sum_i [ jxy/2 (S+ S- + S- S+) + jz Sz Sz ] - field * sum_i Sz`.
#[derive(Debug, Clone, Copy)]
pub struct SpinChainModel {
    pub spin: f64,
    pub jxy: f64,
    pub jz: f64,
    pub field: f64,
}

impl Default for SpinChainModel {
    fn default() -> Self {
        Self {
            spin: 0.5,
            jxy: 1.0,
            jz: 1.0,
            field: 0.0,
        }
    }
}

impl SpinChainModel {
    pub fn heisenberg(spin: f64) -> Self {
        Self {
            spin,
            ..Self::default()
        }
    }

    pub(crate) fn site_operators(&self) -> Result<SiteOperators, EngineError> {
        Ok(SiteOperators {
            identity: spin_matrix(self.spin, SpinAxis::Identity)?,
            sz: spin_matrix(self.spin, SpinAxis::Z)?,
            sp: spin_matrix(self.spin, SpinAxis::Plus)?,
            charges: sz_charges(self.spin)?,
        })
    }

    /// The two-site coupling in terms of edge operators of the two parts.
    pub(crate) fn bond(
        &self,
        left: (&DMatrix<f64>, &DMatrix<f64>),
        right: (&DMatrix<f64>, &DMatrix<f64>),
        product: impl Fn(&DMatrix<f64>, &DMatrix<f64>) -> DMatrix<f64>,
    ) -> DMatrix<f64> {
        let (sz_l, sp_l) = left;
        let (sz_r, sp_r) = right;
        let sm_l = sp_l.transpose();
        let sm_r = sp_r.transpose();
        product(sp_l, &sm_r) * (self.jxy / 2.0)
            + product(&sm_l, sp_r) * (self.jxy / 2.0)
            + product(sz_l, sz_r) * self.jz
    }
}

pub(crate) struct SiteOperators {
    pub identity: DMatrix<f64>,
    pub sz: DMatrix<f64>,
    pub sp: DMatrix<f64>,
    pub charges: QuantumNumbers,
}

/// A renormalized chain segment: its Hamiltonian, the spin operators of its
/// open boundary site, and the charge of every kept basis state.
#[derive(Debug, Clone)]
pub struct Block {
    pub length: usize,
    pub hamiltonian: DMatrix<f64>,
    pub edge_sz: DMatrix<f64>,
    pub edge_sp: DMatrix<f64>,
    pub sectors: QuantumNumbers,
}

impl Block {
    pub fn single_site(model: &SpinChainModel) -> Result<Self, EngineError> {
        let site = model.site_operators()?;
        Ok(Self {
            length: 1,
            hamiltonian: &site.sz * (-model.field),
            edge_sz: site.sz,
            edge_sp: site.sp,
            sectors: site.charges,
        })
    }

    pub fn dim(&self) -> usize {
        self.hamiltonian.nrows()
    }

    /// The block grown by one site, exactly.
    pub fn enlarged(&self, model: &SpinChainModel) -> Result<Self, EngineError> {
        let site = model.site_operators()?;
        let block_identity = DMatrix::identity(self.dim(), self.dim());

        let mut hamiltonian = kron(&self.hamiltonian, &site.identity)
            + kron(&block_identity, &(&site.sz * (-model.field)));
        hamiltonian += model.bond(
            (&self.edge_sz, &self.edge_sp),
            (&site.sz, &site.sp),
            kron,
        );

        Ok(Self {
            length: self.length + 1,
            hamiltonian,
            edge_sz: kron(&block_identity, &site.sz),
            edge_sp: kron(&block_identity, &site.sp),
            sectors: self.sectors.kron(&site.charges),
        })
    }

    /// Truncates the block into the `nmax` most probable density-matrix
    /// eigenstates, diagonalizing charge sector by charge sector so every
    /// kept state carries a sharp quantum number.
    ///
    /// Returns the truncated block, the discarded weight, and the kept
    /// state count.
    pub fn truncated(&self, rho: &DMatrix<f64>, nmax: usize) -> (Self, f64, usize) {
        let mut candidates: Vec<(f64, i32, nalgebra::DVector<f64>)> = Vec::new();
        let mut charges: Vec<i32> = self.sectors.charges().to_vec();
        charges.sort_unstable();
        charges.dedup();

        for &charge in &charges {
            let members = self.sectors.sector_indices(charge);
            let mut sub = DMatrix::zeros(members.len(), members.len());
            for (a, &i) in members.iter().enumerate() {
                for (b, &j) in members.iter().enumerate() {
                    sub[(a, b)] = rho[(i, j)];
                }
            }
            let (values, vectors) = linalg::symmetric_eigen(sub);
            for level in 0..values.len() {
                let mut embedded = nalgebra::DVector::zeros(self.dim());
                for (a, &i) in members.iter().enumerate() {
                    embedded[i] = vectors[(a, level)];
                }
                candidates.push((values[level], charge, embedded));
            }
        }
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let kept = nmax.min(candidates.len());
        let total: f64 = candidates.iter().map(|c| c.0).sum();
        let kept_weight: f64 = candidates[..kept].iter().map(|c| c.0).sum();
        let truncation_error = if total > 0.0 {
            (1.0 - kept_weight / total).max(0.0)
        } else {
            0.0
        };

        let transform = DMatrix::from_columns(
            &candidates[..kept]
                .iter()
                .map(|c| c.2.clone())
                .collect::<Vec<_>>(),
        );
        let rotate = |op: &DMatrix<f64>| transform.transpose() * op * &transform;

        let block = Self {
            length: self.length,
            hamiltonian: rotate(&self.hamiltonian),
            edge_sz: rotate(&self.edge_sz),
            edge_sp: rotate(&self.edge_sp),
            sectors: QuantumNumbers::from_charges(
                self.sectors.name(),
                candidates[..kept].iter().map(|c| c.1).collect(),
            ),
        };
        (block, truncation_error, kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-10;

    #[test]
    fn two_site_block_reproduces_the_bond_spectrum() {
        let model = SpinChainModel::heisenberg(0.5);
        let block = Block::single_site(&model).unwrap().enlarged(&model).unwrap();
        assert_eq!(block.length, 2);
        assert_eq!(block.dim(), 4);
        let (values, _) = linalg::symmetric_eigen(block.hamiltonian.clone());
        // Singlet at -3/4, triplet at 1/4.
        assert!((values[0] + 0.75).abs() < TOLERANCE);
        assert!((values[1] - 0.25).abs() < TOLERANCE);
        assert!((values[3] - 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn enlarged_sectors_follow_the_kron_order() {
        let model = SpinChainModel::heisenberg(0.5);
        let block = Block::single_site(&model).unwrap().enlarged(&model).unwrap();
        assert_eq!(block.sectors.charges(), &[2, 0, 0, -2]);
    }

    #[test]
    fn field_term_splits_the_single_site_levels() {
        let model = SpinChainModel {
            field: 0.3,
            ..SpinChainModel::heisenberg(0.5)
        };
        let block = Block::single_site(&model).unwrap();
        assert!((block.hamiltonian[(0, 0)] + 0.15).abs() < TOLERANCE);
        assert!((block.hamiltonian[(1, 1)] - 0.15).abs() < TOLERANCE);
    }

    #[test]
    fn truncation_keeps_the_dominant_density_matrix_states() {
        let model = SpinChainModel::heisenberg(0.5);
        let block = Block::single_site(&model).unwrap().enlarged(&model).unwrap();
        // A density matrix concentrated on the two Sz = 0 product states.
        let mut rho = DMatrix::zeros(4, 4);
        rho[(1, 1)] = 0.6;
        rho[(2, 2)] = 0.3;
        rho[(0, 0)] = 0.1;
        let (truncated, error, kept) = block.truncated(&rho, 2);
        assert_eq!(kept, 2);
        assert!((error - 0.1).abs() < TOLERANCE);
        assert_eq!(truncated.sectors.charges(), &[0, 0]);
        assert_eq!(truncated.hamiltonian.nrows(), 2);
    }
}
