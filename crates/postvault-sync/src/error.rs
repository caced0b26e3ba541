use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot read snapshot {}: {source}", path.display())]
    ReadSnapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot {}: {source}", path.display())]
    ParseSnapshot {
        path: PathBuf,
        #[source]
        source: postvault_core::CoreError,
    },

    #[error("cannot serialize dataset for {target}: {source}")]
    Serialize {
        target: String,
        #[source]
        source: postvault_core::CoreError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
