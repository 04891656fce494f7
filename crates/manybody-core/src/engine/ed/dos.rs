use super::EdEngine;
use super::green::{self, GreenApp, GreenFunction};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use num_complex::Complex64;
use tracing::{info, instrument};

/// Interacting density of states from the cluster Green's function.
#[derive(Debug, Clone)]
pub struct EdDosApp {
    /// Chemical potential added to every probe frequency.
    pub mu: f64,
    pub emin: f64,
    pub emax: f64,
    pub ne: usize,
    pub eta: f64,
    pub green: GreenApp,
}

#[derive(Debug, Clone)]
pub struct EdDosResult {
    pub energies: Vec<f64>,
    pub dos: Vec<f64>,
}

#[instrument(skip_all, name = "ed_dos")]
pub fn run(
    engine: &EdEngine,
    app: &EdDosApp,
    reporter: &ProgressReporter,
) -> Result<EdDosResult, EngineError> {
    let gf = green::prepare(engine, &app.green, reporter)?;
    Ok(evaluate(&gf, app, reporter))
}

/// Evaluates the DOS from an already prepared Green's function.
pub fn evaluate(
    gf: &GreenFunction,
    app: &EdDosApp,
    reporter: &ProgressReporter,
) -> EdDosResult {
    info!(
        emin = app.emin,
        emax = app.emax,
        ne = app.ne,
        "computing the interacting density of states"
    );
    reporter.report(Progress::TaskStart {
        total_steps: app.ne as u64,
    });
    let mut energies = Vec::with_capacity(app.ne);
    let mut dos = Vec::with_capacity(app.ne);
    for i in 0..app.ne {
        let energy = app.emin + (app.emax - app.emin) * i as f64 / app.ne.saturating_sub(1).max(1) as f64;
        let omega = Complex64::new(energy + app.mu, app.eta);
        let matrix = gf.evaluate(omega);
        energies.push(energy);
        dos.push(-2.0 * matrix.trace().im);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    EdDosResult { energies, dos }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ed::tests::hubbard_dimer;

    #[test]
    fn free_dimer_dos_peaks_at_the_bonding_levels() {
        let engine = hubbard_dimer(0.0);
        let app = EdDosApp {
            mu: 0.0,
            emin: -3.0,
            emax: 3.0,
            ne: 121,
            eta: 0.08,
            green: GreenApp { nstep: 30 },
        };
        let result = run(&engine, &app, &ProgressReporter::new()).unwrap();

        let value_at = |target: f64| -> f64 {
            let index = result
                .energies
                .iter()
                .position(|&e| (e - target).abs() < 0.026)
                .unwrap();
            result.dos[index]
        };
        // Peaks at the single-particle levels, suppressed in between.
        assert!(value_at(-1.0) > value_at(0.0));
        assert!(value_at(1.0) > value_at(0.0));
        assert!(result.dos.iter().all(|&d| d >= -1e-9));
    }

    #[test]
    fn interacting_dos_opens_a_gap_at_the_fermi_level() {
        let u = 8.0;
        let engine = hubbard_dimer(u);
        let app = EdDosApp {
            mu: u / 2.0,
            emin: -8.0,
            emax: 8.0,
            ne: 161,
            eta: 0.1,
            green: GreenApp { nstep: 50 },
        };
        let result = run(&engine, &app, &ProgressReporter::new()).unwrap();
        let at_fermi = result.dos[result.energies.len() / 2];
        let maximum = result.dos.iter().copied().fold(0.0, f64::max);
        assert!(at_fermi < 0.2 * maximum);
    }
}
