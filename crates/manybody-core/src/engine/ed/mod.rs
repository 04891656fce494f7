//! Exact diagonalization.
//!
//! The engine assembles a sparse many-body Hamiltonian over an occupation
//! basis sector and diagonalizes it with the Lanczos iteration ([`lanczos`]).
//! Operator representations live in [`rep`]; the apps compute energy-level
//! scans ([`levels`]), zero-temperature Green's functions ([`green`]), and
//! the interacting density of states ([`dos`]).

pub mod dos;
pub mod green;
pub mod lanczos;
pub mod levels;
pub mod rep;

use crate::core::basis::{FockBasis, SectorRule};
use crate::core::fock::{DofConfig, Generator, IndexOrder, Term};
use crate::core::io::Model;
use crate::core::lattice::Lattice;
use crate::engine::error::EngineError;
use lanczos::LanczosOptions;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use num_complex::Complex64;
use rep::FactorChain;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Exact-diagonalization engine over one occupation sector.
pub struct EdEngine {
    lattice: Lattice,
    generator: Generator,
    basis: FockBasis,
}

impl EdEngine {
    /// Builds the engine. Spin-resolved bases force the spin-major index
    /// order so the basis bit layout and the sequence table agree.
    pub fn new(
        lattice: Lattice,
        config: DofConfig,
        terms: Vec<Term>,
        basis: FockBasis,
    ) -> Result<Self, EngineError> {
        let order = match basis.rule() {
            SectorRule::SpinResolved { .. } => IndexOrder::SpinMajor,
            _ => IndexOrder::SiteMajor,
        };
        let table = config.table(order, true);
        if table.len() != basis.nstate() {
            return Err(EngineError::InvalidConfig(format!(
                "the basis covers {} single-particle states but the lattice provides {}",
                basis.nstate(),
                table.len()
            )));
        }
        let generator = Generator::new(lattice.bonds().to_vec(), config, table, terms)?;
        debug!(
            nstate = basis.nstate(),
            sector = basis.len(),
            "exact-diagonalization engine ready"
        );
        Ok(Self {
            lattice,
            generator,
            basis,
        })
    }

    pub fn from_model(model: &Model) -> Result<Self, EngineError> {
        let basis = model.basis.clone().ok_or_else(|| {
            EngineError::InvalidConfig("the model defines no many-body basis".into())
        })?;
        Self::new(
            model.lattice.clone(),
            model.config.clone(),
            model.terms.clone(),
            basis,
        )
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn basis(&self) -> &FockBasis {
        &self.basis
    }

    /// The single-particle sequence table of this engine.
    pub fn table(&self) -> &crate::core::fock::IndexTable {
        self.generator.table()
    }

    /// Dimension of the single-particle space.
    pub fn nstate(&self) -> usize {
        self.generator.table().len()
    }

    pub fn update(&mut self, id: &str, value: f64) -> Result<(), EngineError> {
        self.generator.update(id, Complex64::new(value, 0.0))?;
        Ok(())
    }

    fn chains(&self) -> Result<Vec<FactorChain>, EngineError> {
        self.generator
            .operators()
            .map(|op| FactorChain::from_operator(op, self.generator.table()).map_err(Into::into))
            .collect()
    }

    /// The sparse Hamiltonian on this engine's basis sector.
    pub fn hamiltonian(&self) -> Result<CsrMatrix<Complex64>, EngineError> {
        self.hamiltonian_in(&self.basis)
    }

    /// The sparse Hamiltonian on an arbitrary sector of the same
    /// single-particle space, `sum of operators + h.c.`.
    #[instrument(skip_all, name = "ed_hamiltonian")]
    pub fn hamiltonian_in(&self, basis: &FockBasis) -> Result<CsrMatrix<Complex64>, EngineError> {
        let chains = self.chains()?;
        for chain in &chains {
            if chain.particle_delta() != 0 && basis.rule() != SectorRule::All {
                return Err(EngineError::InvalidConfig(
                    "particle-non-conserving terms need the full Fock basis".into(),
                ));
            }
        }

        #[cfg(not(feature = "parallel"))]
        let blocks: Vec<CooMatrix<Complex64>> = chains
            .iter()
            .map(|chain| self.chain_block(chain, basis))
            .collect::<Result<_, _>>()?;

        #[cfg(feature = "parallel")]
        let blocks: Vec<CooMatrix<Complex64>> = chains
            .par_iter()
            .map(|chain| self.chain_block(chain, basis))
            .collect::<Result<_, _>>()?;

        let mut coo = CooMatrix::new(basis.len(), basis.len());
        for block in blocks {
            for (row, col, value) in block.triplet_iter() {
                coo.push(row, col, *value);
            }
        }
        Ok(CsrMatrix::from(&coo))
    }

    fn chain_block(
        &self,
        chain: &FactorChain,
        basis: &FockBasis,
    ) -> Result<CooMatrix<Complex64>, EngineError> {
        let mut block = rep::chain_matrix(chain, basis, basis)?;
        let conjugate = rep::chain_matrix(&chain.dagger(), basis, basis)?;
        for (row, col, value) in conjugate.triplet_iter() {
            block.push(row, col, *value);
        }
        Ok(block)
    }

    /// Lowest `k` eigenvalues and eigenvectors.
    pub fn eigs(
        &self,
        k: usize,
        v0: Option<DVector<Complex64>>,
        opts: &LanczosOptions,
    ) -> Result<(Vec<f64>, Vec<DVector<Complex64>>), EngineError> {
        let matrix = self.hamiltonian()?;
        lanczos::lowest_eigenpairs(self.basis.len(), |v| csr_matvec(&matrix, v), k, v0, opts)
    }

    /// Ground-state energy and vector.
    pub fn ground_state(&self) -> Result<(f64, DVector<Complex64>), EngineError> {
        let (values, mut vectors) = self.eigs(1, None, &LanczosOptions::default())?;
        Ok((values[0], vectors.remove(0)))
    }
}

/// Sparse matrix-vector product.
pub(crate) fn csr_matvec(
    matrix: &CsrMatrix<Complex64>,
    v: &DVector<Complex64>,
) -> DVector<Complex64> {
    let mut out = DVector::zeros(matrix.nrows());
    for (row, lane) in matrix.row_iter().enumerate() {
        let mut acc = Complex64::new(0.0, 0.0);
        for (&col, value) in lane.col_indices().iter().zip(lane.values()) {
            acc += value * v[col];
        }
        out[row] = acc;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fock::FockDof;
    use crate::core::lattice::{Point, PointId};

    const TOLERANCE: f64 = 1e-8;

    pub(crate) fn hubbard_dimer(u: f64) -> EdEngine {
        let points: Vec<Point> = (0..2)
            .map(|i| Point::new(PointId::new("L2", i), DVector::from_column_slice(&[i as f64])))
            .collect();
        let lattice = Lattice::new("L2", points, vec![], 1).unwrap();
        let config = DofConfig::uniform(&lattice.pids(), FockDof::default());
        let basis = FockBasis::spin_resolved(4, 1, 1).unwrap();
        EdEngine::new(
            lattice,
            config,
            vec![Term::hopping("t", -1.0, 1), Term::hubbard("U", u).modulated()],
            basis,
        )
        .unwrap()
    }

    #[test]
    fn free_dimer_ground_state_is_minus_two() {
        let engine = hubbard_dimer(0.0);
        let (energy, _) = engine.ground_state().unwrap();
        assert!((energy + 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn hubbard_dimer_ground_state_matches_the_closed_form() {
        // E0 = (U - sqrt(U^2 + 16 t^2)) / 2 at half filling.
        let u = 8.0;
        let engine = hubbard_dimer(u);
        let (energy, _) = engine.ground_state().unwrap();
        let expected = (u - (u * u + 16.0).sqrt()) / 2.0;
        assert!((energy - expected).abs() < TOLERANCE);
    }

    #[test]
    fn hamiltonian_is_hermitian() {
        let engine = hubbard_dimer(4.0);
        let matrix = engine.hamiltonian().unwrap();
        for (row, col, value) in matrix.triplet_iter() {
            let mirrored = matrix
                .get_entry(col, row)
                .map(|e| e.into_value())
                .unwrap_or_else(|| Complex64::new(0.0, 0.0));
            assert!((value - mirrored.conj()).norm() < TOLERANCE);
        }
    }

    #[test]
    fn updating_the_interaction_moves_the_spectrum() {
        let mut engine = hubbard_dimer(0.0);
        let (free, _) = engine.ground_state().unwrap();
        engine.update("U", 8.0).unwrap();
        let (interacting, _) = engine.ground_state().unwrap();
        assert!(interacting > free);
    }

    #[test]
    fn basis_and_lattice_sizes_must_agree() {
        let points = vec![Point::new(
            PointId::new("L1", 0),
            DVector::from_column_slice(&[0.0]),
        )];
        let lattice = Lattice::new("L1", points, vec![], 0).unwrap();
        let config = DofConfig::uniform(&lattice.pids(), FockDof::default());
        let basis = FockBasis::spin_resolved(8, 2, 2).unwrap();
        assert!(matches!(
            EdEngine::new(lattice, config, vec![], basis),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn pairing_terms_require_the_full_fock_basis() {
        let points: Vec<Point> = (0..2)
            .map(|i| Point::new(PointId::new("L2", i), DVector::from_column_slice(&[i as f64])))
            .collect();
        let lattice = Lattice::new("L2", points, vec![], 1).unwrap();
        let config = DofConfig::uniform(&lattice.pids(), FockDof::default());
        let basis = FockBasis::spin_resolved(4, 1, 1).unwrap();
        let engine = EdEngine::new(
            lattice,
            config,
            vec![Term::pairing("delta", 0.3, 1)],
            basis,
        )
        .unwrap();
        assert!(matches!(
            engine.hamiltonian(),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}
