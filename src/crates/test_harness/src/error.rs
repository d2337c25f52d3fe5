use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Result alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while loading commands, driving the simulator, or
/// collecting its results.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read input document {path}: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed input document: {0}")]
    InputDocument(#[source] serde_json::Error),
    #[error("command {index} is invalid: {reason}")]
    InvalidCommand { index: usize, reason: String },
    #[error("failed to start simulator {path}: {source}")]
    FailedToStart {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("simulator exited with {status}")]
    SimulatorFailure {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    #[error("simulator did not finish within {0:?}")]
    Timeout(Duration),
    #[error("simulator output line {index} is malformed ({reason}): {line}")]
    MalformedOutput {
        index: usize,
        line: String,
        reason: String,
    },
    #[error("simulator produced {actual} step results for {expected} STEP commands")]
    CountMismatch { expected: usize, actual: usize },
    #[error("failed to write output document {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse failure classes, one per pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Config,
    InputParse,
    Process,
    OutputParse,
    OutputWrite,
}

impl ErrorClass {
    /// Process exit code reported by the CLI for this class.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorClass::Config => 1,
            ErrorClass::InputParse => 2,
            ErrorClass::Process => 3,
            ErrorClass::OutputParse => 4,
            ErrorClass::OutputWrite => 5,
        }
    }
}

impl HarnessError {
    pub(crate) fn invalid_command(index: usize, reason: impl Into<String>) -> Self {
        HarnessError::InvalidCommand {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(index: usize, line: &str, reason: impl ToString) -> Self {
        HarnessError::MalformedOutput {
            index,
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            HarnessError::Config(_) => ErrorClass::Config,
            HarnessError::InputRead { .. }
            | HarnessError::InputDocument(_)
            | HarnessError::InvalidCommand { .. } => ErrorClass::InputParse,
            HarnessError::FailedToStart { .. }
            | HarnessError::SimulatorFailure { .. }
            | HarnessError::Timeout(_)
            | HarnessError::Io(_) => ErrorClass::Process,
            HarnessError::MalformedOutput { .. } | HarnessError::CountMismatch { .. } => {
                ErrorClass::OutputParse
            }
            HarnessError::OutputWrite { .. } => ErrorClass::OutputWrite,
        }
    }

    /// Captured simulator output attached to a failed run, if any.
    pub fn diagnostics(&self) -> Option<(&str, &str)> {
        match self {
            HarnessError::SimulatorFailure { stdout, stderr, .. } => {
                Some((stdout.as_str(), stderr.as_str()))
            }
            _ => None,
        }
    }
}
