use crate::core::io::Model;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tba::bands::{self, BandsApp, BandsResult};
use crate::engine::tba::berry::{self, BerryApp, BerryResult};
use crate::engine::tba::dos::{self, DosApp, DosResult};
use crate::engine::tba::TbaEngine;
use tracing::{info, instrument};

/// A free-fermion calculation.
#[derive(Debug, Clone)]
pub enum FreeJob {
    Bands(BandsApp),
    Dos(DosApp),
    Berry(BerryApp),
}

#[derive(Debug, Clone)]
pub struct FreeSpectrumConfig {
    /// Particle-hole double the single-particle space (BdG).
    pub nambu: bool,
    pub job: FreeJob,
}

#[derive(Debug, Clone)]
pub enum FreeSpectrumResult {
    Bands(BandsResult),
    Dos(DosResult),
    Berry(BerryResult),
}

#[instrument(skip_all, name = "free_spectrum_workflow")]
pub fn run(
    model: &Model,
    config: &FreeSpectrumConfig,
    reporter: &ProgressReporter,
) -> Result<FreeSpectrumResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(model = model.name, "building the tight-binding engine");
    let mut engine = TbaEngine::from_model(model, config.nambu)?;
    reporter.report(Progress::PhaseFinish);

    let result = match &config.job {
        FreeJob::Bands(app) => {
            reporter.report(Progress::PhaseStart { name: "Bands" });
            let result = FreeSpectrumResult::Bands(bands::run(&mut engine, app, reporter)?);
            reporter.report(Progress::PhaseFinish);
            result
        }
        FreeJob::Dos(app) => {
            reporter.report(Progress::PhaseStart {
                name: "Density of States",
            });
            let result = FreeSpectrumResult::Dos(dos::run(&mut engine, app, reporter)?);
            reporter.report(Progress::PhaseFinish);
            result
        }
        FreeJob::Berry(app) => {
            reporter.report(Progress::PhaseStart {
                name: "Berry Curvature",
            });
            let result = FreeSpectrumResult::Berry(berry::run(&engine, app, reporter)?);
            reporter.report(Progress::PhaseFinish);
            result
        }
    };
    Ok(result)
}
