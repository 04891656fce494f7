use super::EdEngine;
use super::lanczos::{self, TridiagonalChain};
use super::rep::{self, FactorChain};
use crate::core::basis::FockBasis;
use crate::core::utils::linalg;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use tracing::{info, instrument};

/// Configuration of the zero-temperature Green's function.
#[derive(Debug, Clone)]
pub struct GreenApp {
    /// Maximum number of Lanczos steps per continued-fraction chain.
    pub nstep: usize,
}

impl Default for GreenApp {
    fn default() -> Self {
        Self { nstep: 200 }
    }
}

/// One prepared continued-fraction chain: the Krylov tridiagonal of an
/// electron- or hole-excited state plus the overlaps of all probe states.
#[derive(Debug, Clone)]
struct ChainData {
    norm: f64,
    chain: TridiagonalChain,
    /// `coeff[(j, k)] = <probe_j | krylov_k> * norm`.
    coeff: DMatrix<Complex64>,
}

impl Default for ChainData {
    fn default() -> Self {
        Self {
            norm: 0.0,
            chain: TridiagonalChain::default(),
            coeff: DMatrix::zeros(0, 0),
        }
    }
}

/// The prepared zero-temperature Green's function of a cluster.
///
/// Electron chains (h = 0) start from `c^+_i |gs>`, hole chains (h = 1)
/// from `c_i |gs>`; evaluation at a complex frequency solves one
/// tridiagonal system per chain, which is the continued-fraction expansion
/// in its block form.
#[derive(Debug, Clone)]
pub struct GreenFunction {
    nopt: usize,
    gse: f64,
    parts: [Vec<ChainData>; 2],
}

#[instrument(skip_all, name = "ed_green_prepare")]
pub fn prepare(
    engine: &EdEngine,
    app: &GreenApp,
    reporter: &ProgressReporter,
) -> Result<GreenFunction, EngineError> {
    let (gse, ground) = engine.ground_state()?;
    let nopt = engine.nstate();
    info!(gse, nopt, "preparing the cluster Green's function");

    reporter.report(Progress::TaskStart {
        total_steps: 2 * nopt as u64,
    });
    let mut parts: [Vec<ChainData>; 2] = [Vec::new(), Vec::new()];
    for h in 0..2 {
        let delta: i64 = if h == 0 { 1 } else { -1 };
        // Excitation operators: c^+_i for the electron part, c_i for holes.
        let chains: Vec<FactorChain> = (0..nopt)
            .map(|i| {
                let annihilator = FactorChain::annihilator(i);
                if h == 0 { annihilator.dagger() } else { annihilator }
            })
            .collect();

        // Excited states grouped by their target sector.
        let targets: Vec<Option<FockBasis>> = (0..nopt)
            .map(|i| engine.basis().shifted(i, delta).ok())
            .collect();
        let states: Vec<Option<DVector<Complex64>>> = (0..nopt)
            .map(|i| {
                let target = targets[i].as_ref()?;
                let matrix = rep::chain_matrix(&chains[i], engine.basis(), target).ok()?;
                Some(coo_matvec(&matrix, &ground, target.len()))
            })
            .collect();

        for i in 0..nopt {
            let data = match (&targets[i], &states[i]) {
                (Some(target), Some(state)) => {
                    let norm = state.norm();
                    if norm < 1e-12 {
                        ChainData::default()
                    } else {
                        let hamiltonian = engine.hamiltonian_in(target)?;
                        let probes: Vec<&DVector<Complex64>> = (0..nopt)
                            .map(|j| match (&targets[j], &states[j]) {
                                (Some(tj), Some(sj)) if tj.same_sector(target) => Some(sj),
                                _ => None,
                            })
                            .map(|p| p.unwrap_or(state))
                            .collect();
                        let same: Vec<bool> = (0..nopt)
                            .map(|j| {
                                matches!(&targets[j], Some(tj) if tj.same_sector(target))
                                    && states[j].is_some()
                            })
                            .collect();
                        let (chain, mut coeff) = lanczos::greens_chain(
                            |v| super::csr_matvec(&hamiltonian, v),
                            state,
                            app.nstep,
                            &probes,
                        );
                        for (j, keep) in same.iter().enumerate() {
                            if !keep {
                                coeff.row_mut(j).fill(Complex64::new(0.0, 0.0));
                            }
                        }
                        coeff *= Complex64::new(norm, 0.0);
                        ChainData { norm, chain, coeff }
                    }
                }
                _ => ChainData::default(),
            };
            parts[h].push(data);
            reporter.report(Progress::TaskIncrement);
        }
    }
    reporter.report(Progress::TaskFinish);

    Ok(GreenFunction { nopt, gse, parts })
}

fn coo_matvec(
    matrix: &nalgebra_sparse::CooMatrix<Complex64>,
    v: &DVector<Complex64>,
    nrows: usize,
) -> DVector<Complex64> {
    let mut out = DVector::zeros(nrows);
    for (row, col, value) in matrix.triplet_iter() {
        out[row] += value * v[col];
    }
    out
}

impl GreenFunction {
    pub fn nopt(&self) -> usize {
        self.nopt
    }

    /// Ground-state energy of the underlying sector.
    pub fn gse(&self) -> f64 {
        self.gse
    }

    /// The Green's function matrix at a complex frequency.
    pub fn evaluate(&self, omega: Complex64) -> DMatrix<Complex64> {
        let mut gf = DMatrix::<Complex64>::zeros(self.nopt, self.nopt);
        for h in 0..2 {
            let excitation_sign = if h == 0 { 1.0 } else { -1.0 };
            for (i, data) in self.parts[h].iter().enumerate() {
                let n = data.chain.len();
                if n == 0 {
                    continue;
                }
                let diag: Vec<Complex64> = (0..n)
                    .map(|k| omega - excitation_sign * (data.chain.alphas[k] - self.gse))
                    .collect();
                let off: Vec<Complex64> = data.chain.betas[..n - 1]
                    .iter()
                    .map(|&b| Complex64::new(-excitation_sign * b, 0.0))
                    .collect();
                let mut rhs = vec![Complex64::new(0.0, 0.0); n];
                rhs[0] = Complex64::new(1.0, 0.0);
                let solution = linalg::solve_tridiagonal(&diag, &off, &off, &rhs);
                for j in 0..self.nopt {
                    let mut amplitude = Complex64::new(0.0, 0.0);
                    for (k, x) in solution.iter().enumerate() {
                        amplitude += data.coeff[(j, k)] * x;
                    }
                    if h == 0 {
                        gf[(j, i)] += amplitude;
                    } else {
                        gf[(i, j)] += amplitude;
                    }
                }
            }
        }
        gf
    }
}
