use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while defining or synthesizing a stack.
#[derive(Error, Debug)]
pub enum SynthError {
    #[error("invalid construct id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("construct '{id}' already exists under '{parent}'")]
    DuplicateConstruct { parent: String, id: String },

    #[error("unsupported runtime '{0}'")]
    UnsupportedRuntime(String),

    #[error("invalid handler '{handler}' for runtime {runtime}: {reason}")]
    InvalidHandler {
        handler: String,
        runtime: String,
        reason: String,
    },

    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),

    #[error("invalid tag '{key}': {reason}")]
    InvalidTag { key: String, reason: String },

    #[error("invalid function setting: {0}")]
    InvalidFunction(String),

    #[error("invalid rest api setting: {0}")]
    InvalidRestApi(String),

    #[error("construct '{0}' is not of the expected kind")]
    UnexpectedConstruct(String),

    #[error("cannot resolve code asset '{}': {reason}", path.display())]
    UnresolvedAsset { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SynthError {
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
