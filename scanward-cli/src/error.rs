//! CLI-specific error types and exit code mapping

use scanward_core::error::ScanwardError;
use scanward_scan_queue::ScanQueueError;
use scanward_verifier::VerifierError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The request was refused by verification or admission.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP-style status code of the rejection.
        status: u16,
        /// Rejection reason.
        message: String,
    },

    /// The scan failed or reported findings.
    #[error("scan error: {0}")]
    Scan(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from scanward-core.
    #[error("{0}")]
    Core(#[from] ScanwardError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                 |
    /// |------|-----------------------------------------|
    /// | 0    | Success                                 |
    /// | 1    | General / command error                 |
    /// | 2    | Configuration error                     |
    /// | 3    | Request rejected                        |
    /// | 4    | Scan failed or findings present         |
    /// | 10   | IO error                                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(ScanwardError::Config(_)) => 2,
            Self::Rejected { .. } => 3,
            Self::Scan(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<VerifierError> for CliError {
    fn from(e: VerifierError) -> Self {
        match e {
            VerifierError::Config { .. } => Self::Config(e.to_string()),
            VerifierError::Storage(_) => Self::Command(e.to_string()),
            other => Self::Rejected {
                status: other.status_code(),
                message: other.to_string(),
            },
        }
    }
}

impl From<ScanQueueError> for CliError {
    fn from(e: ScanQueueError) -> Self {
        match e {
            ScanQueueError::Config { .. } => Self::Config(e.to_string()),
            ScanQueueError::Storage(_) => Self::Command(e.to_string()),
            other => Self::Rejected {
                status: other.status_code(),
                message: other.to_string(),
            },
        }
    }
}

impl From<scanward_scan_executor::ExecutorError> for CliError {
    fn from(e: scanward_scan_executor::ExecutorError) -> Self {
        Self::Config(e.to_string())
    }
}
