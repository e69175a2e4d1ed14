//! Error types and exit codes for closure-deps

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for dependency resolution runs
///
/// Every variant is fatal to the run that produced it. Graph errors carry
/// the file paths and names needed to fix the offending source directly.
#[derive(Error, Debug)]
pub enum DepsError {
    #[error("'{name}' is already provided by {}\n  second provider: {}", original.display(), path.display())]
    DuplicateProvider {
        name: String,
        path: PathBuf,
        original: PathBuf,
    },

    #[error("'{name}' required from {} is not provided by any file", file.display())]
    MissingDependency { file: PathBuf, name: String },

    #[error("{} has a cyclic dependency on {}", file.display(), target.display())]
    CyclicDependency { file: PathBuf, target: PathBuf },

    #[error("Syntax error in {}:{line}:{column}: {message}", path.display())]
    SyntaxError {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error at {}: {message}", path.display())]
    IoError { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resolution cancelled")]
    Cancelled,
}

impl DepsError {
    /// Convert error to a process exit code:
    /// - 0: Success
    /// - 1: IO error
    /// - 2: Configuration, pattern or language error
    /// - 3: Syntax error in a source file
    /// - 4: Dependency graph error (duplicate, missing, cyclic)
    /// - 5: Cancelled
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::IoError { .. } | Self::Io(_) => ExitCode::from(1),
            Self::UnsupportedLanguage { .. }
            | Self::InvalidPattern { .. }
            | Self::ConfigError { .. } => ExitCode::from(2),
            Self::SyntaxError { .. } => ExitCode::from(3),
            Self::DuplicateProvider { .. }
            | Self::MissingDependency { .. }
            | Self::CyclicDependency { .. } => ExitCode::from(4),
            Self::Cancelled => ExitCode::from(5),
        }
    }

    /// True for errors describing the shape of the dependency graph
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateProvider { .. }
                | Self::MissingDependency { .. }
                | Self::CyclicDependency { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::IoError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for closure-deps operations
pub type Result<T> = std::result::Result<T, DepsError>;
