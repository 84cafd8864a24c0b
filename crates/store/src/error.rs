use std::path::PathBuf;

use seatplan_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Section '{section}' could not be (de)serialized: {source}")]
    Serde {
        section: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corrupt store: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serde(section: &str, source: serde_json::Error) -> Self {
        Self::Serde {
            section: section.to_string(),
            source,
        }
    }
}
