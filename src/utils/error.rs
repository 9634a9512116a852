//! Error types for the leafcheck pipeline.
//!
//! Uses thiserror for ergonomic error definitions. Checkpoint absence is
//! deliberately not represented here: a missing artifact is a valid state
//! that routes inference to the heuristic fallback.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for leafcheck operations
#[derive(Error, Debug)]
pub enum LeafError {
    /// No candidate directory under the source root contains class folders.
    /// Fatal for a split run.
    #[error("no dataset found under {0:?}: no candidate directory contains class folders")]
    DatasetNotFound(PathBuf),

    /// A mapped class folder does not exist on disk. Non-fatal: the class is
    /// skipped for the run and reported.
    #[error("class folder '{0}' not found in source tree")]
    ClassFolderMissing(String),

    /// Error with dataset contents (empty split, unknown class in val, ...)
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Error during a training run
    #[error("training error: {0}")]
    Training(String),

    /// Error in model or tensor handling
    #[error("model error: {0}")]
    Model(String),

    /// The persisted artifact does not match the expected architecture or
    /// class count. Fatal at load time.
    #[error("corrupt checkpoint: {0}")]
    CorruptCheckpoint(String),

    /// Input bytes are not a decodable image. Per-request; surfaced to the
    /// caller, never a crash.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience Result type for leafcheck operations
pub type Result<T> = std::result::Result<T, LeafError>;
