use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    /// Server-classified failure (422/500) with the localized message the
    /// array attached, when it attached one.
    #[error("Unisphere error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// The metric catalog matched more paths than a realtime query can carry.
    #[error("{0} matched metric paths exceed the realtime query limit of 48")]
    CatalogOverflow(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
