use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for charset detection and normalization.
#[derive(Error, Debug)]
pub enum CharsetError {
    /// IO error while reading, writing or renaming files.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The source path does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A directory was given where a file was expected.
    #[error("Expected a file but found a directory: {}", .0.display())]
    IsDirectory(PathBuf),

    /// Empty file or no data.
    #[error("File is empty")]
    EmptyInput,

    /// No candidate encoding could decode the sample, even permissively.
    #[error("No candidate encoding could decode the sample")]
    Undecodable,

    /// Content could not be carried from the source encoding into the target.
    #[error("Cannot convert file from '{from}' to '{to}': {reason}")]
    Conversion {
        from: String,
        to: String,
        reason: String,
    },

    /// Encoding name that neither the alias table nor `encoding_rs` knows.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Newline token other than LF, CRLF or CR.
    #[error("Invalid newline style '{0}': expected LF, CRLF or CR")]
    InvalidNewline(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse error taxonomy, useful for bindings that map errors onto exception classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Decode,
    Conversion,
    Config,
    Io,
}

impl CharsetError {
    /// Returns the taxonomy bucket of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            CharsetError::NotFound(_) | CharsetError::IsDirectory(_) | CharsetError::EmptyInput => {
                ErrorCategory::Input
            }
            CharsetError::Undecodable => ErrorCategory::Decode,
            CharsetError::Conversion { .. } | CharsetError::UnsupportedEncoding(_) => {
                ErrorCategory::Conversion
            }
            CharsetError::InvalidNewline(_) | CharsetError::InvalidConfig(_) => {
                ErrorCategory::Config
            }
            CharsetError::Io(_) => ErrorCategory::Io,
        }
    }
}

/// Result type alias for detection and normalization.
pub type Result<T> = std::result::Result<T, CharsetError>;
