//! Application-level errors (wraps domain errors)

use std::io;

use thiserror::Error;

use crate::domain::DomainError;

/// Errors of lineage use cases: domain violations plus store and input failures.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("application not found: {0}")]
    ApplicationNotFound(String),

    /// The record store refused or failed a read or insert.
    #[error("record store failed for application {application}")]
    StoreFailed {
        application: String,
        #[source]
        source: io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Map a store error for `application`; `NotFound` means no such application.
    pub fn from_store(application: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::ApplicationNotFound(application.to_string()),
            _ => Self::StoreFailed {
                application: application.to_string(),
                source,
            },
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
