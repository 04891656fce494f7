use super::TbaEngine;
use crate::core::kspace::{Mesh, ParamSpace};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Energy-band calculation along a reciprocal-space path.
#[derive(Debug, Clone)]
pub struct BandsApp {
    pub path: ParamSpace,
}

/// Band energies along a path.
#[derive(Debug, Clone)]
pub struct BandsResult {
    /// Cumulative distance along the path, one entry per k-point.
    pub distances: Vec<f64>,
    /// Band energies per k-point, ascending within each point.
    pub energies: Vec<Vec<f64>>,
}

#[instrument(skip_all, name = "tba_bands")]
pub fn run(
    engine: &mut TbaEngine,
    app: &BandsApp,
    reporter: &ProgressReporter,
) -> Result<BandsResult, EngineError> {
    let Mesh::Vectors(kpoints) = app.path.mesh("k")? else {
        return Err(EngineError::InvalidConfig(
            "the band path must carry a vectorial k mesh".into(),
        ));
    };
    let kpoints = kpoints.clone();
    info!(nk = kpoints.len(), "computing energy bands");
    reporter.report(Progress::TaskStart {
        total_steps: kpoints.len() as u64,
    });

    let mut distances = Vec::with_capacity(kpoints.len());
    let mut energies = Vec::with_capacity(kpoints.len());
    let mut walked = 0.0;
    for (i, k) in kpoints.iter().enumerate() {
        if i > 0 {
            walked += (k - &kpoints[i - 1]).norm();
        }
        distances.push(walked);
        energies.push(engine.eigvals_at(Some(k))?);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok(BandsResult { distances, energies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fock::{DofConfig, FockDof, Term};
    use crate::core::kspace;
    use crate::core::lattice::{Lattice, Point, PointId};
    use nalgebra::DVector;

    fn chain_engine() -> TbaEngine {
        let points = vec![Point::new(
            PointId::new("L1", 0),
            DVector::from_column_slice(&[0.0]),
        )];
        let lattice =
            Lattice::new("L1", points, vec![DVector::from_column_slice(&[1.0])], 1).unwrap();
        let config = DofConfig::uniform(&lattice.pids(), FockDof::default());
        TbaEngine::new(lattice, config, vec![Term::hopping("t", -1.0, 1)], false).unwrap()
    }

    #[test]
    fn bands_cover_the_whole_path_with_monotone_distances() {
        let mut engine = chain_engine();
        let reciprocals = engine.lattice().reciprocals().to_vec();
        let path = kspace::path(&reciprocals, &[&[0.0], &[0.5]], 16).unwrap();
        let result = run(&mut engine, &BandsApp { path }, &ProgressReporter::new()).unwrap();
        assert_eq!(result.energies.len(), 17);
        assert!(result.distances.windows(2).all(|w| w[1] >= w[0]));
        // Band bottom at Gamma, top at the zone boundary.
        assert!((result.energies[0][0] + 2.0).abs() < 1e-9);
        assert!((result.energies[16][0] - 2.0).abs() < 1e-9);
    }
}
