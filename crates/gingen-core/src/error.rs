//! Error handling for the gingen code generation library.
//!
//! This module defines the main error type `Error` used throughout the
//! library, along with a convenient `Result` type alias. It uses `thiserror`
//! and implements conversions from common error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for gingen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gingen operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in a `.gin` template
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Emission template error
    #[error("template error: {0}")]
    Template(String),

    /// Template engine error
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Input template file does not exist
    #[error("template file not found: {0}")]
    NotFound(PathBuf),
}

impl Error {
    /// Create a new syntax error carrying the offending line
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        Self::Syntax(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Self::Template(msg.into())
    }
}
