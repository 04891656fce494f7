use super::CptEngine;
use crate::core::kspace::{Mesh, ParamSpace};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use num_complex::Complex64;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Lattice density of states from the periodized propagator.
#[derive(Debug, Clone)]
pub struct CptDosApp {
    /// The Brillouin-zone mesh to average over.
    pub kspace: ParamSpace,
    pub mu: f64,
    pub emin: f64,
    pub emax: f64,
    pub ne: usize,
    pub eta: f64,
}

#[derive(Debug, Clone)]
pub struct CptDosResult {
    pub energies: Vec<f64>,
    pub dos: Vec<f64>,
}

#[instrument(skip_all, name = "cpt_dos")]
pub fn run(
    engine: &CptEngine,
    app: &CptDosApp,
    reporter: &ProgressReporter,
) -> Result<CptDosResult, EngineError> {
    let Mesh::Vectors(kpoints) = app.kspace.mesh("k")? else {
        return Err(EngineError::InvalidConfig(
            "the DOS needs a vectorial k mesh".into(),
        ));
    };
    let kpoints = kpoints.clone();
    info!(nk = kpoints.len(), ne = app.ne, "averaging the spectral weight over the zone");
    reporter.report(Progress::TaskStart {
        total_steps: kpoints.len() as u64,
    });

    let energies: Vec<f64> = (0..app.ne)
        .map(|i| app.emin + (app.emax - app.emin) * i as f64 / app.ne.saturating_sub(1).max(1) as f64)
        .collect();

    let weight_row = |k: &nalgebra::DVector<f64>| -> Result<Vec<f64>, EngineError> {
        energies
            .iter()
            .map(|&e| engine.spectral_weight(k, Complex64::new(e + app.mu, app.eta)))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = kpoints
        .iter()
        .map(|k| {
            let r = weight_row(k);
            reporter.report(Progress::TaskIncrement);
            r
        })
        .collect::<Result<_, _>>()?;

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = kpoints
        .par_iter()
        .map(|k| {
            let r = weight_row(k);
            reporter.report(Progress::TaskIncrement);
            r
        })
        .collect::<Result<_, _>>()?;

    reporter.report(Progress::TaskFinish);

    let nk = rows.len().max(1) as f64;
    let mut dos = vec![0.0; app.ne];
    for row in rows {
        for (total, weight) in dos.iter_mut().zip(row) {
            *total += weight / nk;
        }
    }
    Ok(CptDosResult { energies, dos })
}
