use thiserror::Error;

/// Failures that stop a run before anything is sent.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("discovery failed: {0:#}")]
    Discovery(anyhow::Error),

    #[error("no report files found at {listing}")]
    NoCandidates { listing: String },

    #[error("download failed: {0:#}")]
    Download(anyhow::Error),

    #[error("workbook unreadable: {0:#}")]
    Workbook(anyhow::Error),

    #[error("no deaths/injuries sheet for Reiwa {era_year}; sheets: {available:?}")]
    SheetNotFound {
        era_year: String,
        available: Vec<String>,
    },
}
