use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SynthError;

pub const DEFAULT_CODE_PATH: &str = "lambda";

/// A local directory bundled into the function's deployment package.
///
/// Relative paths are resolved by the [`AssetResolver`] against the
/// application root; nothing touches the filesystem at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeAsset {
    path: PathBuf,
}

impl CodeAsset {
    pub fn from_directory(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for CodeAsset {
    fn default() -> Self {
        Self::from_directory(DEFAULT_CODE_PATH)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    /// A pre-built archive uploaded as-is.
    File,
}

/// A code asset after fingerprinting (and optionally staging).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedAsset {
    pub fingerprint: String,
    /// Absolute source directory the fingerprint was computed from.
    pub source_path: PathBuf,
    /// File name of the staged archive inside the assembly directory.
    pub staged_file: String,
    pub packaging: Packaging,
}

impl StagedAsset {
    pub fn object_key(&self) -> String {
        format!("{}.zip", self.fingerprint)
    }
}

pub fn staged_file_name(fingerprint: &str) -> String {
    format!("asset.{fingerprint}.zip")
}

/// Turns a code asset reference into a fingerprinted, stageable artifact.
pub trait AssetResolver {
    fn resolve(&self, asset: &CodeAsset) -> Result<StagedAsset, SynthError>;
}
