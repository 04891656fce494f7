use crate::engine::dmrg::block::SpinChainModel;
use crate::engine::dmrg::{DmrgEngine, GrowthResult, SweepResult};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// A DMRG ground-state calculation.
#[derive(Debug, Clone)]
pub enum DmrgJob {
    /// Infinite-system growth to the given chain length.
    Infinite { nsite: usize, nmax: usize },
    /// Finite-system sweeps with a kept-state schedule.
    Finite { nsite: usize, nmaxs: Vec<usize> },
}

#[derive(Debug, Clone)]
pub struct GroundStateConfig {
    pub model: SpinChainModel,
    /// Total doubled Sz of the superblock.
    pub target: i32,
    pub job: DmrgJob,
}

#[derive(Debug, Clone)]
pub enum GroundStateResult {
    Growth(GrowthResult),
    Sweep(SweepResult),
}

#[instrument(skip_all, name = "ground_state_workflow")]
pub fn run(
    config: &GroundStateConfig,
    reporter: &ProgressReporter,
) -> Result<GroundStateResult, EngineError> {
    let engine = DmrgEngine::new(config.model, config.target);
    match &config.job {
        DmrgJob::Infinite { nsite, nmax } => {
            info!(nsite, nmax, "infinite-system ground-state search");
            reporter.report(Progress::PhaseStart { name: "Growth" });
            let result = engine.infinite(*nsite, *nmax, reporter)?;
            reporter.report(Progress::PhaseFinish);
            Ok(GroundStateResult::Growth(result))
        }
        DmrgJob::Finite { nsite, nmaxs } => {
            info!(nsite, sweeps = nmaxs.len(), "finite-system ground-state search");
            reporter.report(Progress::PhaseStart { name: "Sweeps" });
            let result = engine.finite(*nsite, nmaxs, reporter)?;
            reporter.report(Progress::PhaseFinish);
            Ok(GroundStateResult::Sweep(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_job_returns_growth_steps() {
        let config = GroundStateConfig {
            model: SpinChainModel::heisenberg(0.5),
            target: 0,
            job: DmrgJob::Infinite { nsite: 8, nmax: 12 },
        };
        let result = run(&config, &ProgressReporter::new()).unwrap();
        let GroundStateResult::Growth(growth) = result else {
            panic!("wrong result kind");
        };
        assert_eq!(growth.steps.len(), 3);
        assert!(growth.energy_per_site < 0.0);
    }

    #[test]
    fn finite_job_returns_sweep_energies() {
        let config = GroundStateConfig {
            model: SpinChainModel::heisenberg(0.5),
            target: 0,
            job: DmrgJob::Finite {
                nsite: 6,
                nmaxs: vec![8, 8],
            },
        };
        let result = run(&config, &ProgressReporter::new()).unwrap();
        let GroundStateResult::Sweep(sweeps) = result else {
            panic!("wrong result kind");
        };
        assert_eq!(sweeps.sweep_energies.len(), 2);
    }
}
