use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::history::record::META_FILE;
use crate::raster::RASTER_EXTENSION;

/// Errors that can occur while writing to or scanning the history store
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to encode image {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to serialize record metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to read history directory {}: {source}", path.display())]
    ReadRoot { path: PathBuf, source: io::Error },

    #[error("Failed to commit record {} to {}: {source}", from.display(), to.display())]
    Commit {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Could not allocate a unique record id starting from {0}")]
    IdExhausted(String),
}

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a directory in the history store was not accepted as a record.
///
/// These are skip reasons for listing, not failures.
#[derive(Debug, Error)]
pub enum RecordIssue {
    #[error("no {meta}", meta = META_FILE)]
    MissingMeta,

    #[error("cannot read {meta}: {0}", meta = META_FILE)]
    UnreadableMeta(#[source] io::Error),

    #[error("cannot parse {meta}: {0}", meta = META_FILE)]
    UnparsableMeta(#[source] serde_json::Error),

    #[error("metadata id {id} does not match folder {folder}")]
    IdMismatch { folder: String, id: String },

    #[error("no composite.{ext}", ext = RASTER_EXTENSION)]
    MissingComposite,
}

/// Errors that can occur while loading a font file for composition
#[derive(Debug, Error)]
pub enum FontError {
    #[error("Failed to read font file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{} is not a TrueType or OpenType font", .0.display())]
    NotAFont(PathBuf),
}
