use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "manybody",
    version,
    about = "Operator representations and many-body solvers for lattice Hamiltonians"
)]
pub struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all terminal output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Mirror logs into a file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Size of the global worker pool.
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tight-binding and BdG spectra.
    Tba(TbaArgs),
    /// Exact diagonalization of a cluster.
    Ed(EdArgs),
    /// Cluster-perturbation lattice spectra.
    Cpt(CptArgs),
    /// DMRG ground states of spin chains.
    Dmrg(DmrgArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TbaJob {
    Bands,
    Dos,
    Berry,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Pick from the lattice geometry.
    Auto,
    Square,
    Hexagon,
}

#[derive(Args, Debug)]
pub struct TbaArgs {
    /// TOML model description.
    #[arg(long)]
    pub model: PathBuf,

    #[arg(long, value_enum, default_value_t = TbaJob::Bands)]
    pub job: TbaJob,

    /// k-points per path segment or per zone direction.
    #[arg(long, default_value_t = 100)]
    pub nk: usize,

    #[arg(long, value_enum, default_value_t = PathKind::Auto)]
    pub path: PathKind,

    #[arg(long)]
    pub emin: Option<f64>,

    #[arg(long)]
    pub emax: Option<f64>,

    /// Number of energy sample points.
    #[arg(long, default_value_t = 400)]
    pub ne: usize,

    /// Lorentzian broadening.
    #[arg(long, default_value_t = 0.05)]
    pub eta: f64,

    /// Chemical potential (Berry curvature band filling).
    #[arg(long, default_value_t = 0.0)]
    pub mu: f64,

    /// Particle-hole double the single-particle space.
    #[arg(long)]
    pub nambu: bool,

    /// Output directory.
    #[arg(long, default_value = "result")]
    pub out: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdJob {
    Levels,
    Dos,
}

#[derive(Args, Debug)]
pub struct EdArgs {
    /// TOML model description.
    #[arg(long)]
    pub model: PathBuf,

    #[arg(long, value_enum, default_value_t = EdJob::Levels)]
    pub job: EdJob,

    /// Parameter scan as `<id>:<from>:<to>:<samples>`.
    #[arg(long)]
    pub scan: Option<String>,

    /// Number of levels to track.
    #[arg(long, default_value_t = 6)]
    pub ns: usize,

    /// Order of numerical derivatives of the levels.
    #[arg(long, default_value_t = 0)]
    pub nder: usize,

    #[arg(long, default_value_t = 0.0)]
    pub mu: f64,

    #[arg(long, default_value_t = -10.0)]
    pub emin: f64,

    #[arg(long, default_value_t = 10.0)]
    pub emax: f64,

    #[arg(long, default_value_t = 400)]
    pub ne: usize,

    #[arg(long, default_value_t = 0.05)]
    pub eta: f64,

    /// Lanczos steps per Green's function chain.
    #[arg(long, default_value_t = 200)]
    pub nstep: usize,

    /// Output directory.
    #[arg(long, default_value = "result")]
    pub out: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CptJob {
    Spectrum,
    Dos,
}

#[derive(Args, Debug)]
pub struct CptArgs {
    /// TOML model description (a periodic cluster tiling).
    #[arg(long)]
    pub model: PathBuf,

    #[arg(long, value_enum, default_value_t = CptJob::Spectrum)]
    pub job: CptJob,

    /// k-points per path segment or per zone direction.
    #[arg(long, default_value_t = 50)]
    pub nk: usize,

    #[arg(long, value_enum, default_value_t = PathKind::Auto)]
    pub path: PathKind,

    #[arg(long, default_value_t = 0.0)]
    pub mu: f64,

    #[arg(long, default_value_t = -6.0)]
    pub emin: f64,

    #[arg(long, default_value_t = 6.0)]
    pub emax: f64,

    #[arg(long, default_value_t = 400)]
    pub ne: usize,

    #[arg(long, default_value_t = 0.05)]
    pub eta: f64,

    /// Lanczos steps per Green's function chain.
    #[arg(long, default_value_t = 200)]
    pub nstep: usize,

    /// Output directory.
    #[arg(long, default_value = "result")]
    pub out: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmrgAlgorithm {
    Infinite,
    Finite,
}

#[derive(Args, Debug)]
pub struct DmrgArgs {
    /// Label used for the output files.
    #[arg(long, default_value = "chain")]
    pub name: String,

    #[arg(long, value_enum, default_value_t = DmrgAlgorithm::Infinite)]
    pub algorithm: DmrgAlgorithm,

    /// Spin length per site.
    #[arg(long, default_value_t = 0.5)]
    pub spin: f64,

    /// Transverse exchange.
    #[arg(long, default_value_t = 1.0)]
    pub jxy: f64,

    /// Longitudinal exchange.
    #[arg(long, default_value_t = 1.0)]
    pub jz: f64,

    /// Magnetic field along z.
    #[arg(long, default_value_t = 0.0)]
    pub field: f64,

    /// Chain length.
    #[arg(long, default_value_t = 32)]
    pub nsite: usize,

    /// Kept states during infinite growth.
    #[arg(long, default_value_t = 64)]
    pub nmax: usize,

    /// Kept-state schedule of the finite sweeps, comma separated.
    #[arg(long)]
    pub sweeps: Option<String>,

    /// Total doubled Sz of the superblock.
    #[arg(long, default_value_t = 0)]
    pub target: i32,

    /// Output directory.
    #[arg(long, default_value = "result")]
    pub out: PathBuf,
}
