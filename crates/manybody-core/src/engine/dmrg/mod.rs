//! Density matrix renormalization group for spin chains.
//!
//! The classic two-block formulation: a system block grows site by site,
//! the superblock ground state is found in a fixed total-Sz sector, and the
//! block basis is truncated to the dominant eigenstates of the reduced
//! density matrix. Infinite-system growth provides the warmup; finite-system
//! sweeps refine a fixed chain length. Matrix product state utilities live
//! in [`mps`]; sector-projected tensor products in [`kron`].

pub mod block;
pub mod kron;
pub mod mps;

use crate::engine::ed::lanczos::{self, LanczosOptions};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use block::{Block, SpinChainModel};
use kron::{SectorBasis, kron_sector};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use num_complex::Complex64;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// One renormalization step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Superblock size at this step.
    pub nsite: usize,
    pub energy: f64,
    pub energy_per_site: f64,
    pub truncation_error: f64,
    pub kept: usize,
}

/// Result of the infinite-system algorithm.
#[derive(Debug, Clone)]
pub struct GrowthResult {
    pub steps: Vec<StepReport>,
    /// Bulk energy-per-site estimate from the last two superblocks.
    pub energy_per_site: f64,
}

/// Result of the finite-system algorithm.
#[derive(Debug, Clone)]
pub struct SweepResult {
    /// Ground-state energy at the symmetric cut, one entry per sweep.
    pub sweep_energies: Vec<f64>,
    pub energy: f64,
    pub max_truncation_error: f64,
}

/// Two-block DMRG engine for XXZ chains.
pub struct DmrgEngine {
    model: SpinChainModel,
    /// Total doubled Sz of the superblock.
    target: i32,
}

impl DmrgEngine {
    pub fn new(model: SpinChainModel, target: i32) -> Self {
        Self { model, target }
    }

    /// Infinite-system growth to (at least) `nsite` sites.
    #[instrument(skip_all, name = "dmrg_infinite")]
    pub fn infinite(
        &self,
        nsite: usize,
        nmax: usize,
        reporter: &ProgressReporter,
    ) -> Result<GrowthResult, EngineError> {
        if nsite < 4 || nsite % 2 != 0 {
            return Err(EngineError::InvalidConfig(
                "infinite-system growth needs an even chain of at least 4 sites".into(),
            ));
        }
        info!(nsite, nmax, "growing the chain");
        reporter.report(Progress::TaskStart {
            total_steps: (nsite as u64) / 2 - 1,
        });

        let mut sys = Block::single_site(&self.model)?;
        let mut steps: Vec<StepReport> = Vec::new();
        while 2 * (sys.length + 1) <= nsite {
            let enlarged = sys.enlarged(&self.model)?;
            let (energy, psi, sector) = self.superblock_ground(&enlarged, &enlarged)?;
            let rho = density_matrix(&psi, &sector, enlarged.dim());
            let (truncated, truncation_error, kept) = enlarged.truncated(&rho, nmax);

            let previous = steps.last().map(|s| s.energy);
            let nsite_now = 2 * (sys.length + 1);
            let energy_per_site = match previous {
                Some(prev) => (energy - prev) / 2.0,
                None => energy / nsite_now as f64,
            };
            debug!(
                nsite = nsite_now,
                energy, energy_per_site, truncation_error, kept, "growth step"
            );
            steps.push(StepReport {
                nsite: nsite_now,
                energy,
                energy_per_site,
                truncation_error,
                kept,
            });
            reporter.report(Progress::TaskIncrement);
            sys = truncated;
        }
        reporter.report(Progress::TaskFinish);

        let energy_per_site = steps
            .last()
            .map(|s| s.energy_per_site)
            .ok_or_else(|| EngineError::Internal("no growth steps were taken".into()))?;
        Ok(GrowthResult {
            steps,
            energy_per_site,
        })
    }

    /// Finite-system sweeps on a fixed even chain length.
    ///
    /// `nmaxs` is the kept-state schedule, one entry per sweep. The engine
    /// exploits reflection symmetry: one stored block family serves both
    /// chain halves.
    #[instrument(skip_all, name = "dmrg_finite")]
    pub fn finite(
        &self,
        nsite: usize,
        nmaxs: &[usize],
        reporter: &ProgressReporter,
    ) -> Result<SweepResult, EngineError> {
        if nsite < 4 || nsite % 2 != 0 {
            return Err(EngineError::InvalidConfig(
                "finite-system sweeps need an even chain of at least 4 sites".into(),
            ));
        }
        let Some(&warmup_nmax) = nmaxs.first() else {
            return Err(EngineError::InvalidConfig(
                "the sweep schedule must contain at least one entry".into(),
            ));
        };
        info!(nsite, sweeps = nmaxs.len(), "finite-system DMRG");

        let mut blocks: HashMap<usize, Block> = HashMap::new();
        blocks.insert(1, Block::single_site(&self.model)?);

        // Warmup: infinite growth to the middle of the chain.
        let mut length = 1;
        while 2 * (length + 1) < nsite {
            let (block, _, _) = self.finite_step(&blocks, length, length, warmup_nmax)?;
            length += 1;
            blocks.insert(length, block);
        }

        let symmetric_cut = nsite / 2 - 1;
        let mut sweep_energies = Vec::with_capacity(nmaxs.len());
        let mut max_truncation_error: f64 = 0.0;
        reporter.report(Progress::TaskStart {
            total_steps: nmaxs.len() as u64,
        });
        for (sweep, &nmax) in nmaxs.iter().enumerate() {
            let start = if sweep == 0 { symmetric_cut } else { 1 };
            let mut symmetric_energy = None;
            for sys_length in start..=nsite - 3 {
                let env_length = nsite - sys_length - 2;
                let (block, energy, truncation_error) =
                    self.finite_step(&blocks, sys_length, env_length, nmax)?;
                blocks.insert(sys_length + 1, block);
                max_truncation_error = max_truncation_error.max(truncation_error);
                if sys_length == symmetric_cut {
                    symmetric_energy = Some(energy);
                }
            }
            let energy = symmetric_energy
                .ok_or_else(|| EngineError::Internal("a sweep skipped the symmetric cut".into()))?;
            debug!(sweep, nmax, energy, "sweep finished");
            sweep_energies.push(energy);
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);

        let energy = *sweep_energies
            .last()
            .ok_or_else(|| EngineError::Internal("no sweeps were run".into()))?;
        Ok(SweepResult {
            sweep_energies,
            energy,
            max_truncation_error,
        })
    }

    fn finite_step(
        &self,
        blocks: &HashMap<usize, Block>,
        sys_length: usize,
        env_length: usize,
        nmax: usize,
    ) -> Result<(Block, f64, f64), EngineError> {
        let sys = blocks.get(&sys_length).ok_or_else(|| {
            EngineError::Internal(format!("no stored block of length {sys_length}"))
        })?;
        let env = blocks.get(&env_length).ok_or_else(|| {
            EngineError::Internal(format!("no stored block of length {env_length}"))
        })?;
        let sys_enlarged = sys.enlarged(&self.model)?;
        let env_enlarged = env.enlarged(&self.model)?;
        let (energy, psi, sector) = self.superblock_ground(&sys_enlarged, &env_enlarged)?;
        let rho = density_matrix(&psi, &sector, sys_enlarged.dim());
        let (truncated, truncation_error, _) = sys_enlarged.truncated(&rho, nmax);
        Ok((truncated, energy, truncation_error))
    }

    /// Ground state of `sys (+) env` in the target charge sector.
    fn superblock_ground(
        &self,
        sys: &Block,
        env: &Block,
    ) -> Result<(f64, DVector<f64>, SectorBasis), EngineError> {
        let sector = SectorBasis::new(&sys.sectors, &env.sectors, self.target);
        if sector.is_empty() {
            return Err(EngineError::InvalidConfig(format!(
                "the target sector {} is empty for this superblock",
                self.target
            )));
        }
        let sys_identity = DMatrix::identity(sys.dim(), sys.dim());
        let env_identity = DMatrix::identity(env.dim(), env.dim());

        let mut coo = CooMatrix::new(sector.len(), sector.len());
        let mut add = |block: CooMatrix<f64>, scale: f64| {
            for (r, c, v) in block.triplet_iter() {
                coo.push(r, c, v * scale);
            }
        };
        add(kron_sector(&sys.hamiltonian, &env_identity, &sector), 1.0);
        add(kron_sector(&sys_identity, &env.hamiltonian, &sector), 1.0);
        let sys_sm = sys.edge_sp.transpose();
        let env_sm = env.edge_sp.transpose();
        add(
            kron_sector(&sys.edge_sp, &env_sm, &sector),
            self.model.jxy / 2.0,
        );
        add(
            kron_sector(&sys_sm, &env.edge_sp, &sector),
            self.model.jxy / 2.0,
        );
        add(
            kron_sector(&sys.edge_sz, &env.edge_sz, &sector),
            self.model.jz,
        );
        let matrix = CsrMatrix::from(&coo);

        let (values, vectors) = lanczos::lowest_eigenpairs(
            sector.len(),
            |v| complex_matvec(&matrix, v),
            1,
            None,
            &LanczosOptions::default(),
        )?;
        let psi = vectors[0].map(|c| c.re);
        let norm = psi.norm();
        Ok((values[0], psi / norm, sector))
    }
}

fn complex_matvec(matrix: &CsrMatrix<f64>, v: &DVector<Complex64>) -> DVector<Complex64> {
    let mut out = DVector::zeros(matrix.nrows());
    for (row, lane) in matrix.row_iter().enumerate() {
        let mut acc = Complex64::new(0.0, 0.0);
        for (&col, value) in lane.col_indices().iter().zip(lane.values()) {
            acc += v[col] * *value;
        }
        out[row] = acc;
    }
    out
}

/// Reduced density matrix of the system half of a sector-restricted state.
fn density_matrix(psi: &DVector<f64>, sector: &SectorBasis, dim_sys: usize) -> DMatrix<f64> {
    let mut by_env: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();
    for (rank, &(i, j)) in sector.indices.iter().enumerate() {
        by_env.entry(j).or_default().push((i, psi[rank]));
    }
    let mut rho = DMatrix::zeros(dim_sys, dim_sys);
    for members in by_env.values() {
        for &(i, a) in members {
            for &(i2, b) in members {
                rho[(i, i2)] += a * b;
            }
        }
    }
    rho
}
