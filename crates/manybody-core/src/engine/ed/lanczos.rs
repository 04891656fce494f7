use crate::core::utils::linalg;
use crate::engine::error::EngineError;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use rand::Rng;

/// Controls for the Lanczos iteration.
#[derive(Debug, Clone)]
pub struct LanczosOptions {
    pub max_steps: usize,
    /// Residual tolerance on the lowest Ritz value between steps.
    pub tol: f64,
    /// Re-orthogonalize every new vector against the whole Krylov basis.
    /// Costs memory but keeps small-gap spectra clean.
    pub reorthogonalize: bool,
}

impl Default for LanczosOptions {
    fn default() -> Self {
        Self {
            max_steps: 300,
            tol: 1e-12,
            reorthogonalize: true,
        }
    }
}

fn random_start(dim: usize) -> DVector<Complex64> {
    let mut rng = rand::rng();
    let mut v =
        DVector::from_fn(dim, |_, _| Complex64::new(rng.random::<f64>() - 0.5, 0.0));
    let norm = v.norm();
    v /= Complex64::new(norm, 0.0);
    v
}

/// The tridiagonal coefficients of a Krylov chain.
#[derive(Debug, Clone, Default)]
pub struct TridiagonalChain {
    pub alphas: Vec<f64>,
    /// `betas[k]` couples steps `k` and `k + 1`.
    pub betas: Vec<f64>,
}

impl TridiagonalChain {
    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }

    fn as_dense(&self, n: usize) -> DMatrix<f64> {
        let mut t = DMatrix::zeros(n, n);
        for i in 0..n {
            t[(i, i)] = self.alphas[i];
            if i + 1 < n {
                t[(i, i + 1)] = self.betas[i];
                t[(i + 1, i)] = self.betas[i];
            }
        }
        t
    }
}

/// Lowest `k` eigenvalues (and vectors) of a Hermitian operator given as a
/// matrix-vector product.
///
/// The iteration stops when the lowest Ritz value stops moving by more than
/// the tolerance, the Krylov space exhausts the full space, or `max_steps`
/// is reached.
pub fn lowest_eigenpairs(
    dim: usize,
    matvec: impl Fn(&DVector<Complex64>) -> DVector<Complex64>,
    k: usize,
    v0: Option<DVector<Complex64>>,
    opts: &LanczosOptions,
) -> Result<(Vec<f64>, Vec<DVector<Complex64>>), EngineError> {
    if dim == 0 || k == 0 {
        return Err(EngineError::InvalidConfig(
            "the Lanczos iteration needs a non-empty space and k > 0".into(),
        ));
    }
    let max_steps = opts.max_steps.min(dim);
    let mut chain = TridiagonalChain::default();
    let mut vectors: Vec<DVector<Complex64>> = Vec::with_capacity(max_steps);
    let mut q = match v0 {
        Some(v) => {
            let norm = v.norm();
            v / Complex64::new(norm, 0.0)
        }
        None => random_start(dim),
    };
    let mut previous: Option<DVector<Complex64>> = None;
    let mut last_ritz: Vec<f64> = Vec::new();

    for step in 0..max_steps {
        let mut w = matvec(&q);
        let alpha = q.dotc(&w).re;
        chain.alphas.push(alpha);
        w -= &q * Complex64::new(alpha, 0.0);
        if let Some(prev) = &previous {
            let beta_prev = chain.betas.last().copied().unwrap_or(0.0);
            w -= prev * Complex64::new(beta_prev, 0.0);
        }
        if opts.reorthogonalize {
            for v in &vectors {
                let overlap = v.dotc(&w);
                w -= v * overlap;
            }
            let overlap = q.dotc(&w);
            w -= &q * overlap;
        }
        vectors.push(q.clone());

        // Convergence is judged on all requested Ritz values at once.
        let n = chain.alphas.len();
        let (ritz, _) = linalg::symmetric_eigen(chain.as_dense(n));
        let lowest: Vec<f64> = ritz.iter().take(k).copied().collect();
        let converged = n >= k
            && last_ritz.len() == lowest.len()
            && last_ritz
                .iter()
                .zip(&lowest)
                .all(|(old, new)| (old - new).abs() < opts.tol);
        last_ritz = lowest;

        let beta = w.norm();
        if converged || beta < 1e-14 || step + 1 == max_steps {
            break;
        }
        chain.betas.push(beta);
        previous = Some(q);
        q = w / Complex64::new(beta, 0.0);
    }

    let n = chain.alphas.len();
    if n < k {
        return Err(EngineError::Convergence { iterations: n });
    }
    let (values, ritz_vectors) = linalg::symmetric_eigen(chain.as_dense(n));
    let mut eigvals = Vec::with_capacity(k);
    let mut eigvecs = Vec::with_capacity(k);
    for level in 0..k {
        eigvals.push(values[level]);
        let mut vector = DVector::<Complex64>::zeros(dim);
        for (step, basis_vector) in vectors.iter().enumerate() {
            vector += basis_vector * Complex64::new(ritz_vectors[(step, level)], 0.0);
        }
        let norm = vector.norm();
        vector /= Complex64::new(norm, 0.0);
        eigvecs.push(vector);
    }
    Ok((eigvals, eigvecs))
}

/// Runs a plain Lanczos chain from a fixed start vector, collecting the
/// tridiagonal coefficients and the overlaps of a set of probe states with
/// every Krylov vector.
///
/// This is the workhorse of the continued-fraction Green's function: the
/// returned overlaps form one row block of the spectral coefficients.
pub fn greens_chain(
    matvec: impl Fn(&DVector<Complex64>) -> DVector<Complex64>,
    v0: &DVector<Complex64>,
    nstep: usize,
    probes: &[&DVector<Complex64>],
) -> (TridiagonalChain, DMatrix<Complex64>) {
    let mut chain = TridiagonalChain::default();
    let mut overlaps = DMatrix::<Complex64>::zeros(probes.len(), nstep);
    let norm = v0.norm();
    if norm < 1e-14 || nstep == 0 {
        return (chain, overlaps);
    }
    let mut q = v0 / Complex64::new(norm, 0.0);
    let mut previous: Option<DVector<Complex64>> = None;

    for step in 0..nstep {
        for (j, probe) in probes.iter().enumerate() {
            overlaps[(j, step)] = probe.dotc(&q);
        }
        let mut w = matvec(&q);
        let alpha = q.dotc(&w).re;
        chain.alphas.push(alpha);
        if step + 1 == nstep {
            break;
        }
        w -= &q * Complex64::new(alpha, 0.0);
        if let Some(prev) = &previous {
            let beta_prev = chain.betas.last().copied().unwrap_or(0.0);
            w -= prev * Complex64::new(beta_prev, 0.0);
        }
        let beta = w.norm();
        if beta < 1e-14 {
            break;
        }
        chain.betas.push(beta);
        previous = Some(q);
        q = w / Complex64::new(beta, 0.0);
    }
    (chain, overlaps)
}
