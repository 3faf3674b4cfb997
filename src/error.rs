use std::fmt;

use serde::Serialize;
use ts_rs::TS;

/// Structured error type for the application. The frontend matches on `code`
/// to decide whether a failure is recoverable or needs to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum AppError {
    /// The native host could not be reached or rejected the call.
    Transport { message: String },
    /// The host answered, but not with a sequence of commands.
    ShapeValidation { message: String },
    /// A persisted snapshot could not be parsed.
    CacheParse { key: String, message: String },
    /// A theme config supplied for import is not valid JSON.
    ImportParse { message: String },
    /// The host reported a failure while running a command.
    Execution { message: String },
    /// The key-value store failed to read or write.
    Storage { message: String },
    IoError { message: String },
    NotFound { what: String },
    ValidationError { message: String },
}

impl AppError {
    pub fn transport(message: impl Into<String>) -> Self {
        AppError::Transport {
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        AppError::Execution {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        AppError::Storage {
            message: message.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transport { message } => write!(f, "Native host unavailable: {message}"),
            AppError::ShapeValidation { message } => {
                write!(f, "Unexpected command data from host: {message}")
            }
            AppError::CacheParse { key, message } => {
                write!(f, "Failed to parse stored '{key}': {message}")
            }
            AppError::ImportParse { message } => write!(f, "Invalid theme config JSON: {message}"),
            AppError::Execution { message } => write!(f, "{message}"),
            AppError::Storage { message } => write!(f, "Storage error: {message}"),
            AppError::IoError { message } => write!(f, "I/O error: {message}"),
            AppError::NotFound { what } => write!(f, "{what} not found"),
            AppError::ValidationError { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::ValidationError {
            message: e.to_string(),
        }
    }
}

/// Allow converting AppError to String for Tauri IPC.
impl From<AppError> for String {
    fn from(e: AppError) -> String {
        e.to_string()
    }
}
