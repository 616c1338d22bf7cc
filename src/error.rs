//! Crate-wide error types.

use thiserror::Error;

pub type CallfreqResult<T> = Result<T, CallfreqError>;

#[derive(Debug, Error)]
pub enum CallfreqError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Why a blob could not become a report. Every variant is recoverable: the
/// caller may submit again with the same or a different blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The bytes are not UTF-8, or the text is not JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// The JSON parsed but does not have the report shape.
    #[error("schema error at {path}: {message}")]
    Schema { path: String, message: String },

    /// The declared media type is one this build cannot decode.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl IngestError {
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Schema { .. } => "schema",
            Self::UnsupportedFormat(_) => "unsupported_format",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("an ingestion is already in flight (ticket {0})")]
    Busy(u64),

    #[error("no report is loaded (state: {0})")]
    NotLoaded(&'static str),
}
