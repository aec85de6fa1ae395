use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The selected provider has no usable credential.
    #[error("{0} is not set for the selected API provider")]
    MissingCredential(&'static str),
}

/// Why a single page could not be turned into structured programs.
///
/// Every variant is a soft failure: the page is logged and skipped, the batch
/// carries on.
#[derive(Debug, Error)]
pub enum StructuringError {
    #[error("collaborator call failed: {0}")]
    Collaborator(String),

    #[error("collaborator returned an empty response")]
    EmptyResponse,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("response does not match the program schema: {0}")]
    Schema(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Output of an earlier phase is missing or unreadable.
    #[error("cannot read {}: {reason} (run the {phase} phase first)", path.display())]
    MissingInput {
        path: PathBuf,
        phase: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
