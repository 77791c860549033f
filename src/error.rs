use miette::Diagnostic;
use thiserror::Error;

use crate::psd::PsdError;

/// Main error type for psdpack operations
#[derive(Error, Diagnostic, Debug)]
pub enum PackError {
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(psdpack::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("PSD error: {0}")]
    #[diagnostic(
        code(psdpack::psd),
        help("Make sure the document is an 8-bit RGB Photoshop file")
    )]
    Psd(#[from] PsdError),

    #[error("Parse error: {message}")]
    #[diagnostic(code(psdpack::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(psdpack::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Export error: {message}")]
    #[diagnostic(code(psdpack::export))]
    Export {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl PackError {
    /// Wrap a filesystem failure with the path that caused it.
    pub fn io(path: impl Into<std::path::PathBuf>, message: impl Into<String>) -> Self {
        PackError::Io {
            path: path.into(),
            message: message.into(),
            help: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PackError>;
