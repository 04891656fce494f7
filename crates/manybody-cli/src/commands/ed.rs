use crate::cli::{EdArgs, EdJob};
use crate::error::{CliError, Result};
use crate::output;
use crate::progress::CliProgress;
use manybody::core::io::Model;
use manybody::engine::ed::dos::EdDosApp;
use manybody::engine::ed::green::GreenApp;
use manybody::engine::ed::levels::LevelsApp;
use manybody::workflows::cluster_spectrum::{
    self, ClusterJob, ClusterSpectrumConfig, ClusterSpectrumResult,
};
use tracing::info;

pub fn run(args: EdArgs, quiet: bool) -> Result<()> {
    let model = Model::load(&args.model)?;
    info!(model = model.name, "loaded model");

    let job = match args.job {
        EdJob::Levels => {
            let scan = args.scan.as_deref().ok_or_else(|| {
                CliError::InvalidArgument(
                    "a level scan needs --scan <id>:<from>:<to>:<samples>".into(),
                )
            })?;
            ClusterJob::Levels(LevelsApp {
                path: super::parse_scan(scan)?,
                ns: args.ns,
                nder: args.nder,
            })
        }
        EdJob::Dos => ClusterJob::ClusterDos(EdDosApp {
            mu: args.mu,
            emin: args.emin,
            emax: args.emax,
            ne: args.ne,
            eta: args.eta,
            green: GreenApp { nstep: args.nstep },
        }),
    };

    let progress = CliProgress::new(quiet);
    let reporter = progress.reporter();
    let config = ClusterSpectrumConfig { job };
    match cluster_spectrum::run(&model, &config, &reporter)? {
        ClusterSpectrumResult::Levels(result) => {
            output::write_levels(&args.out, &model.name, &result)?;
        }
        ClusterSpectrumResult::ClusterDos(result) => {
            output::write_dos(&args.out, &model.name, &result.energies, &result.dos)?;
        }
        _ => {
            return Err(CliError::InvalidArgument(
                "unexpected result kind for an exact-diagonalization job".into(),
            ));
        }
    }
    Ok(())
}
