use super::CptEngine;
use crate::core::kspace::{Mesh, ParamSpace};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use num_complex::Complex64;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Spectral-function map along a reciprocal-space path.
#[derive(Debug, Clone)]
pub struct SpectrumApp {
    pub path: ParamSpace,
    /// Chemical potential added to every probe frequency.
    pub mu: f64,
    pub emin: f64,
    pub emax: f64,
    pub ne: usize,
    pub eta: f64,
}

#[derive(Debug, Clone)]
pub struct SpectrumResult {
    /// Cumulative distance along the path.
    pub distances: Vec<f64>,
    /// The probed energies.
    pub energies: Vec<f64>,
    /// `intensity[k][e]`: spectral weight per path point and energy.
    pub intensity: Vec<Vec<f64>>,
}

#[instrument(skip_all, name = "cpt_spectrum")]
pub fn run(
    engine: &CptEngine,
    app: &SpectrumApp,
    reporter: &ProgressReporter,
) -> Result<SpectrumResult, EngineError> {
    let Mesh::Vectors(kpoints) = app.path.mesh("k")? else {
        return Err(EngineError::InvalidConfig(
            "the spectral path must carry a vectorial k mesh".into(),
        ));
    };
    let kpoints = kpoints.clone();
    let energies: Vec<f64> = (0..app.ne)
        .map(|i| app.emin + (app.emax - app.emin) * i as f64 / app.ne.saturating_sub(1).max(1) as f64)
        .collect();
    info!(
        nk = kpoints.len(),
        ne = app.ne,
        "computing the cluster-perturbed spectral function"
    );
    reporter.report(Progress::TaskStart {
        total_steps: kpoints.len() as u64,
    });

    let row = |k: &nalgebra::DVector<f64>| -> Result<Vec<f64>, EngineError> {
        energies
            .iter()
            .map(|&e| engine.spectral_weight(k, Complex64::new(e + app.mu, app.eta)))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let intensity: Vec<Vec<f64>> = kpoints
        .iter()
        .map(|k| {
            let r = row(k);
            reporter.report(Progress::TaskIncrement);
            r
        })
        .collect::<Result<_, _>>()?;

    #[cfg(feature = "parallel")]
    let intensity: Vec<Vec<f64>> = kpoints
        .par_iter()
        .map(|k| {
            let r = row(k);
            reporter.report(Progress::TaskIncrement);
            r
        })
        .collect::<Result<_, _>>()?;

    reporter.report(Progress::TaskFinish);

    let mut distances = Vec::with_capacity(kpoints.len());
    let mut walked = 0.0;
    for (i, k) in kpoints.iter().enumerate() {
        if i > 0 {
            walked += (k - &kpoints[i - 1]).norm();
        }
        distances.push(walked);
    }

    Ok(SpectrumResult {
        distances,
        energies,
        intensity,
    })
}
