use super::EdEngine;
use super::lanczos::LanczosOptions;
use crate::core::kspace::{IterMode, ParamSpace, SampleValue};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Energy-level scan over a one-axis parameter space.
#[derive(Debug, Clone)]
pub struct LevelsApp {
    pub path: ParamSpace,
    /// Number of levels to track.
    pub ns: usize,
    /// Order of numerical derivatives to append.
    pub nder: usize,
}

#[derive(Debug, Clone)]
pub struct LevelsResult {
    /// Scan positions: the first scalar axis, or the sample index.
    pub parameters: Vec<f64>,
    /// `levels[sample][level]`, ascending per sample.
    pub levels: Vec<Vec<f64>>,
    /// `derivatives[order - 1][sample][level]` for orders `1..=nder`.
    pub derivatives: Vec<Vec<Vec<f64>>>,
}

#[instrument(skip_all, name = "ed_levels")]
pub fn run(
    engine: &mut EdEngine,
    app: &LevelsApp,
    reporter: &ProgressReporter,
) -> Result<LevelsResult, EngineError> {
    let samples = app.path.samples(IterMode::Zip)?;
    info!(nsamples = samples.len(), ns = app.ns, "scanning energy levels");
    reporter.report(Progress::TaskStart {
        total_steps: samples.len() as u64,
    });

    let mut parameters = Vec::with_capacity(samples.len());
    let mut levels = Vec::with_capacity(samples.len());
    for (position, sample) in samples.iter().enumerate() {
        let mut abscissa = None;
        for (tag, value) in sample.iter() {
            if let SampleValue::Scalar(s) = value {
                engine.update(tag, *s)?;
                if abscissa.is_none() {
                    abscissa = Some(*s);
                }
            }
        }
        let (values, _) = engine.eigs(app.ns, None, &LanczosOptions::default())?;
        parameters.push(abscissa.unwrap_or(position as f64));
        levels.push(values);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    let mut derivatives = Vec::with_capacity(app.nder);
    let mut current = levels.clone();
    for _ in 0..app.nder {
        current = differentiate(&parameters, &current);
        derivatives.push(current.clone());
    }

    Ok(LevelsResult {
        parameters,
        levels,
        derivatives,
    })
}

/// Central finite differences per level, one-sided at the ends.
fn differentiate(x: &[f64], y: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = x.len();
    let nlevels = y.first().map(Vec::len).unwrap_or(0);
    let mut result = vec![vec![0.0; nlevels]; n];
    if n < 2 {
        return result;
    }
    for level in 0..nlevels {
        for i in 0..n {
            let (lo, hi) = match i {
                0 => (0, 1),
                _ if i == n - 1 => (n - 2, n - 1),
                _ => (i - 1, i + 1),
            };
            let dx = x[hi] - x[lo];
            result[i][level] = if dx.abs() < 1e-14 {
                0.0
            } else {
                (y[hi][level] - y[lo][level]) / dx
            };
        }
    }
    result
}
