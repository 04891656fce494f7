use crate::cli::{TbaArgs, TbaJob};
use crate::error::Result;
use crate::output;
use crate::progress::CliProgress;
use manybody::core::io::Model;
use manybody::core::kspace;
use manybody::engine::tba::bands::BandsApp;
use manybody::engine::tba::berry::BerryApp;
use manybody::engine::tba::dos::DosApp;
use manybody::workflows::free_spectrum::{
    self, FreeJob, FreeSpectrumConfig, FreeSpectrumResult,
};
use tracing::info;

pub fn run(args: TbaArgs, quiet: bool) -> Result<()> {
    let model = Model::load(&args.model)?;
    info!(model = model.name, "loaded model");

    let job = match args.job {
        TbaJob::Bands => FreeJob::Bands(BandsApp {
            path: super::band_path(&model.lattice, args.path, args.nk)?,
        }),
        TbaJob::Dos => {
            let reciprocals = model.lattice.reciprocals().to_vec();
            let zone = if reciprocals.is_empty() {
                None
            } else {
                Some(kspace::kspace(&reciprocals, args.nk, None, false))
            };
            FreeJob::Dos(DosApp {
                kspace: zone,
                emin: args.emin,
                emax: args.emax,
                ne: args.ne,
                eta: args.eta,
            })
        }
        TbaJob::Berry => FreeJob::Berry(BerryApp {
            nk: args.nk,
            mu: args.mu,
        }),
    };

    let progress = CliProgress::new(quiet);
    let reporter = progress.reporter();
    let config = FreeSpectrumConfig {
        nambu: args.nambu,
        job,
    };
    match free_spectrum::run(&model, &config, &reporter)? {
        FreeSpectrumResult::Bands(result) => {
            output::write_bands(&args.out, &model.name, &result)?;
        }
        FreeSpectrumResult::Dos(result) => {
            output::write_dos(&args.out, &model.name, &result.energies, &result.dos)?;
        }
        FreeSpectrumResult::Berry(result) => {
            println!(
                "Chern number: {:.6} ({} filled bands)",
                result.chern_number, result.filled_bands
            );
            output::write_berry(&args.out, &model.name, &result)?;
        }
    }
    Ok(())
}
