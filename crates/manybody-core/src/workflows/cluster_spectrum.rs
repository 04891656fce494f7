use crate::core::io::Model;
use crate::core::lattice::Lattice;
use crate::engine::cpt::dos::{self as cpt_dos, CptDosApp, CptDosResult};
use crate::engine::cpt::spectrum::{self, SpectrumApp, SpectrumResult};
use crate::engine::cpt::CptEngine;
use crate::engine::ed::dos::{self as ed_dos, EdDosApp, EdDosResult};
use crate::engine::ed::green::GreenApp;
use crate::engine::ed::levels::{self, LevelsApp, LevelsResult};
use crate::engine::ed::EdEngine;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// An interacting-cluster calculation.
#[derive(Debug, Clone)]
pub enum ClusterJob {
    /// Lanczos level scan over a parameter space.
    Levels(LevelsApp),
    /// Interacting density of states of the cluster itself.
    ClusterDos(EdDosApp),
    /// Cluster-perturbed spectral function along a path.
    Spectrum { app: SpectrumApp, green: GreenApp },
    /// Cluster-perturbed lattice density of states.
    LatticeDos { app: CptDosApp, green: GreenApp },
}

#[derive(Debug, Clone)]
pub struct ClusterSpectrumConfig {
    pub job: ClusterJob,
}

#[derive(Debug, Clone)]
pub enum ClusterSpectrumResult {
    Levels(LevelsResult),
    ClusterDos(EdDosResult),
    Spectrum(SpectrumResult),
    LatticeDos(CptDosResult),
}

#[instrument(skip_all, name = "cluster_spectrum_workflow")]
pub fn run(
    model: &Model,
    config: &ClusterSpectrumConfig,
    reporter: &ProgressReporter,
) -> Result<ClusterSpectrumResult, EngineError> {
    match &config.job {
        ClusterJob::Levels(app) => {
            let mut engine = prepare_ed(model, reporter)?;
            reporter.report(Progress::PhaseStart { name: "Levels" });
            let result = levels::run(&mut engine, app, reporter)?;
            reporter.report(Progress::PhaseFinish);
            Ok(ClusterSpectrumResult::Levels(result))
        }
        ClusterJob::ClusterDos(app) => {
            let engine = prepare_ed(model, reporter)?;
            reporter.report(Progress::PhaseStart {
                name: "Density of States",
            });
            let result = ed_dos::run(&engine, app, reporter)?;
            reporter.report(Progress::PhaseFinish);
            Ok(ClusterSpectrumResult::ClusterDos(result))
        }
        ClusterJob::Spectrum { app, green } => {
            let engine = prepare_cpt(model, green, reporter)?;
            reporter.report(Progress::PhaseStart { name: "Spectrum" });
            let result = spectrum::run(&engine, app, reporter)?;
            reporter.report(Progress::PhaseFinish);
            Ok(ClusterSpectrumResult::Spectrum(result))
        }
        ClusterJob::LatticeDos { app, green } => {
            let engine = prepare_cpt(model, green, reporter)?;
            reporter.report(Progress::PhaseStart {
                name: "Density of States",
            });
            let result = cpt_dos::run(&engine, app, reporter)?;
            reporter.report(Progress::PhaseFinish);
            Ok(ClusterSpectrumResult::LatticeDos(result))
        }
    }
}

fn prepare_ed(model: &Model, reporter: &ProgressReporter) -> Result<EdEngine, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(model = model.name, "building the exact-diagonalization engine");
    let engine = EdEngine::from_model(model)?;
    reporter.report(Progress::PhaseFinish);
    Ok(engine)
}

/// Builds the cluster-perturbation engine of a model: the model's lattice
/// supplies the tiling, its open cluster is solved exactly.
fn prepare_cpt(
    model: &Model,
    green: &GreenApp,
    reporter: &ProgressReporter,
) -> Result<CptEngine, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(model = model.name, "building the cluster-perturbation engine");
    if model.lattice.vectors().is_empty() {
        return Err(EngineError::InvalidConfig(
            "cluster perturbation theory needs a periodic lattice".into(),
        ));
    }
    let basis = model.basis.clone().ok_or_else(|| {
        EngineError::InvalidConfig("the model defines no many-body basis".into())
    })?;
    let cluster = Lattice::new(
        model.lattice.name(),
        model.lattice.points().to_vec(),
        vec![],
        model.lattice.nneighbour(),
    )?;
    let subsystem = EdEngine::new(cluster, model.config.clone(), model.terms.clone(), basis)?;
    let mut engine = CptEngine::new(
        model.lattice.clone(),
        model.config.clone(),
        model.terms.clone(),
        vec![subsystem],
    )?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Cluster Solution",
    });
    engine.prepare(green, reporter)?;
    reporter.report(Progress::PhaseFinish);
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::model::{
        BasisKindSpec, BasisSpec, DofSpec, LatticeSpec, ModelFile, ModelMeta, TermKindSpec,
        TermSpec,
    };
    use crate::core::kspace::{Mesh, ParamSpace};

    fn dimer_model(periodic: bool) -> Model {
        Model::from_file(ModelFile {
            model: ModelMeta {
                name: "dimer".into(),
            },
            lattice: LatticeSpec {
                preset: None,
                rcoords: Some(vec![vec![0.0], vec![1.0]]),
                vectors: vec![vec![2.0]],
                nneighbour: 1,
                periodic,
            },
            dof: DofSpec::default(),
            terms: vec![
                TermSpec {
                    kind: TermKindSpec::Hopping,
                    id: "t".into(),
                    value: -1.0,
                    neighbour: Some(1),
                    modulate: false,
                    coupling: None,
                },
                TermSpec {
                    kind: TermKindSpec::Hubbard,
                    id: "U".into(),
                    value: 0.0,
                    neighbour: None,
                    modulate: true,
                    coupling: None,
                },
            ],
            basis: Some(BasisSpec {
                kind: BasisKindSpec::Spinz,
                nparticle: None,
                nup: Some(1),
                ndown: Some(1),
            }),
        })
        .unwrap()
    }

    #[test]
    fn level_scan_runs_on_the_open_cluster() {
        let model = dimer_model(false);
        let config = ClusterSpectrumConfig {
            job: ClusterJob::Levels(LevelsApp {
                path: ParamSpace::single("U", Mesh::Scalars(vec![0.0, 2.0]), None),
                ns: 2,
                nder: 0,
            }),
        };
        let result = run(&model, &config, &ProgressReporter::new()).unwrap();
        let ClusterSpectrumResult::Levels(levels) = result else {
            panic!("wrong result kind");
        };
        assert_eq!(levels.levels.len(), 2);
    }

    #[test]
    fn lattice_spectrum_requires_a_periodic_model() {
        let model = dimer_model(false);
        let reciprocals = vec![nalgebra::DVector::from_column_slice(&[
            std::f64::consts::PI,
        ])];
        let config = ClusterSpectrumConfig {
            job: ClusterJob::Spectrum {
                app: SpectrumApp {
                    path: crate::core::kspace::path(&reciprocals, &[&[0.0], &[0.5]], 4).unwrap(),
                    mu: 0.0,
                    emin: -3.0,
                    emax: 3.0,
                    ne: 11,
                    eta: 0.1,
                },
                green: GreenApp { nstep: 20 },
            },
        };
        assert!(matches!(
            run(&model, &config, &ProgressReporter::new()),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn lattice_spectrum_runs_on_the_periodic_model() {
        let model = dimer_model(true);
        let reciprocals = model.lattice.reciprocals().to_vec();
        let config = ClusterSpectrumConfig {
            job: ClusterJob::Spectrum {
                app: SpectrumApp {
                    path: crate::core::kspace::path(&reciprocals, &[&[0.0], &[0.5]], 4).unwrap(),
                    mu: 0.0,
                    emin: -3.0,
                    emax: 3.0,
                    ne: 31,
                    eta: 0.1,
                },
                green: GreenApp { nstep: 20 },
            },
        };
        let result = run(&model, &config, &ProgressReporter::new()).unwrap();
        let ClusterSpectrumResult::Spectrum(spectrum) = result else {
            panic!("wrong result kind");
        };
        assert_eq!(spectrum.intensity.len(), 5);
        assert_eq!(spectrum.energies.len(), 31);
    }
}
