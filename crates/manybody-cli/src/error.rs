use manybody::core::io::ModelError;
use manybody::core::kspace::KspaceError;
use manybody::engine::error::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Parameter space error: {0}")]
    Kspace(#[from] KspaceError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
