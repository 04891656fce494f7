use super::TbaEngine;
use crate::core::kspace::{IterMode, ParamSpace};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Density-of-states calculation with Lorentzian broadening.
#[derive(Debug, Clone)]
pub struct DosApp {
    pub kspace: Option<ParamSpace>,
    pub emin: Option<f64>,
    pub emax: Option<f64>,
    pub ne: usize,
    pub eta: f64,
}

#[derive(Debug, Clone)]
pub struct DosResult {
    pub energies: Vec<f64>,
    pub dos: Vec<f64>,
}

#[instrument(skip_all, name = "tba_dos")]
pub fn run(
    engine: &mut TbaEngine,
    app: &DosApp,
    reporter: &ProgressReporter,
) -> Result<DosResult, EngineError> {
    let eigvals: Vec<f64> = engine
        .eigvals(app.kspace.as_ref(), IterMode::Product)?
        .into_iter()
        .flatten()
        .collect();
    let emin = app
        .emin
        .unwrap_or_else(|| eigvals.iter().copied().fold(f64::INFINITY, f64::min));
    let emax = app
        .emax
        .unwrap_or_else(|| eigvals.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    info!(nlevels = eigvals.len(), emin, emax, "computing density of states");

    reporter.report(Progress::TaskStart {
        total_steps: app.ne as u64,
    });
    let mut energies = Vec::with_capacity(app.ne);
    let mut dos = Vec::with_capacity(app.ne);
    for i in 0..app.ne {
        let omega = emin + (emax - emin) * i as f64 / app.ne.saturating_sub(1).max(1) as f64;
        let weight: f64 = eigvals
            .iter()
            .map(|e| app.eta / ((omega - e).powi(2) + app.eta * app.eta))
            .sum();
        energies.push(omega);
        dos.push(weight);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(DosResult { energies, dos })
}
