use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeepError {
    #[error("Cannot open archive {path}: {source}")]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Archive entry escapes the extraction directory: {entry}")]
    PathTraversal { entry: String },

    #[error("Cannot read archive entry {entry}: {reason}")]
    EntryRead { entry: String, reason: String },

    #[error("Error reading file {entry}: {source}")]
    Decode {
        entry: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Note {record} has no creation timestamp")]
    MissingTimestamp { record: String },

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Document error: {0}")]
    Document(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl KeepError {
    /// Archive-level failures stop the stream; everything else is reported per sink.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KeepError::ArchiveOpen { .. }
                | KeepError::PathTraversal { .. }
                | KeepError::EntryRead { .. }
                | KeepError::Decode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, KeepError>;
