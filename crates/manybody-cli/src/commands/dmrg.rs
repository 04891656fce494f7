use crate::cli::{DmrgAlgorithm, DmrgArgs};
use crate::error::{CliError, Result};
use crate::output;
use crate::progress::CliProgress;
use manybody::engine::dmrg::block::SpinChainModel;
use manybody::workflows::ground_state::{
    self, DmrgJob, GroundStateConfig, GroundStateResult,
};
use tracing::info;

fn parse_sweeps(text: &str) -> Result<Vec<usize>> {
    text.split(',')
        .map(|part| {
            part.trim().parse().map_err(|_| {
                CliError::InvalidArgument(format!("bad kept-state count '{part}'"))
            })
        })
        .collect()
}

pub fn run(args: DmrgArgs, quiet: bool) -> Result<()> {
    let model = SpinChainModel {
        spin: args.spin,
        jxy: args.jxy,
        jz: args.jz,
        field: args.field,
    };
    let job = match args.algorithm {
        DmrgAlgorithm::Infinite => DmrgJob::Infinite {
            nsite: args.nsite,
            nmax: args.nmax,
        },
        DmrgAlgorithm::Finite => {
            let nmaxs = match &args.sweeps {
                Some(text) => parse_sweeps(text)?,
                None => vec![args.nmax; 3],
            };
            DmrgJob::Finite {
                nsite: args.nsite,
                nmaxs,
            }
        }
    };
    info!(name = args.name, nsite = args.nsite, "ground-state search");

    let progress = CliProgress::new(quiet);
    let reporter = progress.reporter();
    let config = GroundStateConfig {
        model,
        target: args.target,
        job,
    };
    match ground_state::run(&config, &reporter)? {
        GroundStateResult::Growth(result) => {
            println!("Energy per site: {:.8}", result.energy_per_site);
            output::write_growth(&args.out, &args.name, &result)?;
        }
        GroundStateResult::Sweep(result) => {
            println!("Ground-state energy: {:.8}", result.energy);
            output::write_sweeps(&args.out, &args.name, &result)?;
        }
    }
    Ok(())
}
