use super::TbaEngine;
use crate::core::utils::linalg;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::{info, instrument};

/// Berry-curvature and Chern-number calculation of the filled bands.
///
/// Uses the lattice-gauge plaquette construction: link variables are
/// determinants of occupied-subspace overlaps, the curvature of a plaquette
/// is the argument of the product of its four links.
#[derive(Debug, Clone)]
pub struct BerryApp {
    /// Number of plaquettes along each reciprocal vector.
    pub nk: usize,
    /// Chemical potential separating filled from empty bands.
    pub mu: f64,
}

#[derive(Debug, Clone)]
pub struct BerryResult {
    /// Plaquette base points in cartesian reciprocal coordinates.
    pub kpoints: Vec<DVector<f64>>,
    /// Berry curvature per plaquette (integrated over the plaquette).
    pub curvature: Vec<f64>,
    pub chern_number: f64,
    pub filled_bands: usize,
}

#[instrument(skip_all, name = "tba_berry")]
pub fn run(
    engine: &TbaEngine,
    app: &BerryApp,
    reporter: &ProgressReporter,
) -> Result<BerryResult, EngineError> {
    let reciprocals = engine.lattice().reciprocals().to_vec();
    if reciprocals.len() != 2 {
        return Err(EngineError::InvalidConfig(
            "the Berry curvature needs a two-dimensional reciprocal cell".into(),
        ));
    }
    let nk = app.nk;

    // Occupied eigenvector frames on the (periodic) k-grid.
    let mut frames: Vec<DMatrix<Complex64>> = Vec::with_capacity(nk * nk);
    let mut filled_bands = None;
    reporter.report(Progress::TaskStart {
        total_steps: (nk * nk) as u64,
    });
    let mut kpoints = Vec::with_capacity(nk * nk);
    for i in 0..nk {
        for j in 0..nk {
            let k = &reciprocals[0] * (i as f64 / nk as f64)
                + &reciprocals[1] * (j as f64 / nk as f64);
            let (values, vectors) = linalg::hermitian_eigen(engine.matrix(Some(&k))?);
            let occupied = values.iter().filter(|&&e| e < app.mu).count();
            match filled_bands {
                None => filled_bands = Some(occupied),
                Some(expected) if expected != occupied => {
                    return Err(EngineError::InvalidConfig(format!(
                        "the chemical potential {} crosses a band ({} vs {} filled levels)",
                        app.mu, expected, occupied
                    )));
                }
                Some(_) => {}
            }
            frames.push(vectors.columns(0, occupied).into_owned());
            kpoints.push(k);
            reporter.report(Progress::TaskIncrement);
        }
    }
    reporter.report(Progress::TaskFinish);
    let filled_bands = filled_bands.unwrap_or(0);
    if filled_bands == 0 {
        return Err(EngineError::InvalidConfig(
            "no filled bands below the chemical potential".into(),
        ));
    }

    let link = |a: &DMatrix<Complex64>, b: &DMatrix<Complex64>| -> Complex64 {
        let overlap = a.adjoint() * b;
        let det = overlap.determinant();
        det / Complex64::new(det.norm(), 0.0)
    };
    let at = |i: usize, j: usize| &frames[(i % nk) * nk + (j % nk)];

    let mut curvature = Vec::with_capacity(nk * nk);
    let mut chern = 0.0;
    for i in 0..nk {
        for j in 0..nk {
            let u1 = link(at(i, j), at(i + 1, j));
            let u2 = link(at(i + 1, j), at(i + 1, j + 1));
            let u3 = link(at(i + 1, j + 1), at(i, j + 1));
            let u4 = link(at(i, j + 1), at(i, j));
            let field = (u1 * u2 * u3 * u4).arg();
            curvature.push(field);
            chern += field;
        }
    }
    let chern_number = chern / (2.0 * PI);
    info!(chern_number, filled_bands, "computed Berry curvature");

    Ok(BerryResult {
        kpoints,
        curvature,
        chern_number,
        filled_bands,
    })
}
