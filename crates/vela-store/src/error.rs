//! Store errors

use thiserror::Error;
use vela_core::VelaError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid blob name: {0:?}")]
    InvalidName(String),

    #[error("Failed to encode blob {blob}: {source}")]
    Encode {
        blob: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on blob {blob}: {source}")]
    Io {
        blob: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<StoreError> for VelaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { source, .. } => VelaError::Io(source),
            StoreError::InvalidName(name) => VelaError::CorruptData {
                blob: name,
                reason: "invalid blob name".to_owned(),
            },
            StoreError::Encode { blob, source } => VelaError::CorruptData {
                blob,
                reason: source.to_string(),
            },
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
