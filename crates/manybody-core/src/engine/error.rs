use crate::core::basis::BasisError;
use crate::core::fock::FockError;
use crate::core::kspace::KspaceError;
use crate::core::lattice::LatticeError;
use crate::core::spin::SpinError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Lattice error: {source}")]
    Lattice {
        #[from]
        source: LatticeError,
    },

    #[error("Degree-of-freedom error: {source}")]
    Fock {
        #[from]
        source: FockError,
    },

    #[error("Basis error: {source}")]
    Basis {
        #[from]
        source: BasisError,
    },

    #[error("Parameter space error: {source}")]
    Kspace {
        #[from]
        source: KspaceError,
    },

    #[error("Spin algebra error: {source}")]
    Spin {
        #[from]
        source: SpinError,
    },

    #[error("Eigensolver failed to converge after {iterations} iterations")]
    Convergence { iterations: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
