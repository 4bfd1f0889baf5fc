// In: src/error.rs

//! This module defines the single, unified error type for the entire sfh binding.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SfhError {
    // =========================================================================
    // === Handle-level errors (raised locally, never reach libsfh)
    // =========================================================================
    #[error("Shotfile header not open")]
    NotOpen,

    #[error("Unsupported format key: {0}")]
    UnsupportedFormat(String),

    // =========================================================================
    // === Native library errors
    // =========================================================================
    /// A libsfh entry point reported a nonzero error code.
    #[error(
        "libsfh error {code} in {entry}{}",
        message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    Native {
        entry: &'static str,
        code: i32,
        message: Option<String>,
    },

    #[error("Failed to load native library '{}': {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Native entry point '{symbol}' could not be resolved: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    // =========================================================================
    // === Configuration errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl SfhError {
    /// The native error code, if this error came from libsfh.
    pub fn native_code(&self) -> Option<i32> {
        match self {
            SfhError::Native { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SfhError>;

// =============================================================================
// === Python conversion ===
// =============================================================================

#[cfg(feature = "python")]
impl From<SfhError> for pyo3::PyErr {
    fn from(err: SfhError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyOSError, PyRuntimeError, PyValueError};
        match err {
            SfhError::UnsupportedFormat(_) | SfhError::Config(_) | SfhError::SerdeJson(_) => {
                PyValueError::new_err(err.to_string())
            }
            SfhError::Io(_) => PyOSError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}
