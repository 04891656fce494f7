use crate::cli::{CptArgs, CptJob};
use crate::error::{CliError, Result};
use crate::output;
use crate::progress::CliProgress;
use manybody::core::io::Model;
use manybody::core::kspace;
use manybody::engine::cpt::dos::CptDosApp;
use manybody::engine::cpt::spectrum::SpectrumApp;
use manybody::engine::ed::green::GreenApp;
use manybody::workflows::cluster_spectrum::{
    self, ClusterJob, ClusterSpectrumConfig, ClusterSpectrumResult,
};
use tracing::info;

pub fn run(args: CptArgs, quiet: bool) -> Result<()> {
    let model = Model::load(&args.model)?;
    info!(model = model.name, "loaded model");

    let green = GreenApp { nstep: args.nstep };
    let job = match args.job {
        CptJob::Spectrum => ClusterJob::Spectrum {
            app: SpectrumApp {
                path: super::band_path(&model.lattice, args.path, args.nk)?,
                mu: args.mu,
                emin: args.emin,
                emax: args.emax,
                ne: args.ne,
                eta: args.eta,
            },
            green,
        },
        CptJob::Dos => {
            let reciprocals = model.lattice.reciprocals().to_vec();
            if reciprocals.is_empty() {
                return Err(CliError::InvalidArgument(
                    "the model has no translation vectors, so there is no zone to average".into(),
                ));
            }
            ClusterJob::LatticeDos {
                app: CptDosApp {
                    kspace: kspace::kspace(&reciprocals, args.nk, None, false),
                    mu: args.mu,
                    emin: args.emin,
                    emax: args.emax,
                    ne: args.ne,
                    eta: args.eta,
                },
                green,
            }
        }
    };

    let progress = CliProgress::new(quiet);
    let reporter = progress.reporter();
    let config = ClusterSpectrumConfig { job };
    match cluster_spectrum::run(&model, &config, &reporter)? {
        ClusterSpectrumResult::Spectrum(result) => {
            output::write_spectrum(&args.out, &model.name, &result)?;
        }
        ClusterSpectrumResult::LatticeDos(result) => {
            output::write_cpt_dos(&args.out, &model.name, &result)?;
        }
        _ => {
            return Err(CliError::InvalidArgument(
                "unexpected result kind for a cluster-perturbation job".into(),
            ));
        }
    }
    Ok(())
}
