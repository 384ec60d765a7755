use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = ToolchainError> = std::result::Result<T, E>;

/// Failures raised while matching or provisioning a toolchain.
///
/// A catalog that simply has no package for a query is not an error; lookups
/// return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The toolchain registry holds an entry that cannot be used. Aborts the
    /// whole resolution.
    #[error("misconfigured toolchains: {0}")]
    Misconfigured(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected catalog response from {url}: {message}")]
    CatalogFormat { url: String, message: String },

    #[error("archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("sha256 mismatch for {path} (expected {expected}, got {actual})")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("failed to read toolchain registry {path}: {message}")]
    RegistryRead { path: PathBuf, message: String },

    #[error("failed to update toolchain registry {path}: {message}")]
    RegistryWrite { path: PathBuf, message: String },

    #[error("{program} failed: {message}")]
    Subprocess { program: String, message: String },

    #[error("invalid requirement: {0}")]
    InvalidRequirement(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ToolchainError {
    pub(crate) fn archive(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn registry_write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::RegistryWrite {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn registry_read(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::RegistryRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn subprocess(program: impl Into<String>, message: impl ToString) -> Self {
        Self::Subprocess {
            program: program.into(),
            message: message.to_string(),
        }
    }
}
