//! Domain error types.

use std::fmt;

/// Failure taxonomy surfaced by both pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DataUnavailable,
    InsufficientHistory,
    ModelUnavailable,
    ComputationError,
    Config,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::DataUnavailable => "DataUnavailable",
            ErrorKind::InsufficientHistory => "InsufficientHistory",
            ErrorKind::ModelUnavailable => "ModelUnavailable",
            ErrorKind::ComputationError => "ComputationError",
            ErrorKind::Config => "Config",
            ErrorKind::Io => "Io",
        };
        f.write_str(name)
    }
}

/// Top-level error type for deepcoin.
#[derive(Debug, thiserror::Error)]
pub enum DeepcoinError {
    #[error("data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("insufficient history: have {points} points, need {minimum}")]
    InsufficientHistory { points: usize, minimum: usize },

    #[error("model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    #[error("computation error: {reason}")]
    Computation { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeepcoinError {
    pub fn data_unavailable(reason: impl Into<String>) -> Self {
        DeepcoinError::DataUnavailable {
            reason: reason.into(),
        }
    }

    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        DeepcoinError::ModelUnavailable {
            reason: reason.into(),
        }
    }

    pub fn computation(reason: impl Into<String>) -> Self {
        DeepcoinError::Computation {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DeepcoinError::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            DeepcoinError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            DeepcoinError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            DeepcoinError::Computation { .. } => ErrorKind::ComputationError,
            DeepcoinError::ConfigParse { .. } | DeepcoinError::ConfigInvalid { .. } => {
                ErrorKind::Config
            }
            DeepcoinError::Io(_) => ErrorKind::Io,
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Render the single-field `{"error": ...}` object shared by every failure path.
pub fn error_body(err: &DeepcoinError) -> String {
    let message = err.to_string();
    serde_json::to_string(&ErrorBody { error: &message })
        .unwrap_or_else(|_| String::from(r#"{"error":"internal error"}"#))
}

impl From<&DeepcoinError> for std::process::ExitCode {
    fn from(err: &DeepcoinError) -> Self {
        let code: u8 = match err.kind() {
            ErrorKind::Io => 1,
            ErrorKind::Config => 2,
            ErrorKind::DataUnavailable | ErrorKind::InsufficientHistory => 5,
            ErrorKind::ModelUnavailable => 6,
            ErrorKind::ComputationError => 7,
        };
        std::process::ExitCode::from(code)
    }
}
