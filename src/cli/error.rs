//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0} reference issue(s) found")]
    Validation(usize),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Validation(_) => exitcode::DATAERR,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Json { .. } => exitcode::SOFTWARE,
                InfraError::Application(app) => application_exit_code(app),
            },
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Domain(DomainError::InvalidApplicationId(_)) => exitcode::USAGE,
        ApplicationError::Domain(_) => exitcode::DATAERR,
        ApplicationError::ApplicationNotFound(_) => exitcode::NOINPUT,
        ApplicationError::StoreFailed { source, .. } => io_exit_code(source),
        ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::OperationFailed { source, .. } => {
            if source.downcast_ref::<serde_json::Error>().is_some() {
                exitcode::DATAERR
            } else if let Some(io) = source.downcast_ref::<std::io::Error>() {
                io_exit_code(io)
            } else {
                exitcode::SOFTWARE
            }
        }
    }
}

fn io_exit_code(e: &std::io::Error) -> i32 {
    match e.kind() {
        std::io::ErrorKind::NotFound => exitcode::NOINPUT,
        std::io::ErrorKind::InvalidInput | std::io::ErrorKind::InvalidData => exitcode::DATAERR,
        _ => exitcode::IOERR,
    }
}
