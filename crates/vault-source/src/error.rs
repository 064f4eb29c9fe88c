//! Error types for vault access.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Vault root does not exist or is not a directory: {0}")]
    MissingRoot(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk vault: {0}")]
    Walk(#[from] walkdir::Error),
}
