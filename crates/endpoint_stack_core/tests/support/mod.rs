use std::path::PathBuf;

use endpoint_stack_core::asset::{staged_file_name, Packaging};
use endpoint_stack_core::{AssetResolver, CodeAsset, StagedAsset, SynthError};

/// Resolves every asset to the same fingerprint without touching the disk.
pub struct StaticResolver {
    pub fingerprint: &'static str,
}

impl Default for StaticResolver {
    fn default() -> Self {
        Self {
            fingerprint: "0123456789abcdef",
        }
    }
}

impl AssetResolver for StaticResolver {
    fn resolve(&self, asset: &CodeAsset) -> Result<StagedAsset, SynthError> {
        Ok(StagedAsset {
            fingerprint: self.fingerprint.to_string(),
            source_path: PathBuf::from("/workspace").join(asset.path()),
            staged_file: staged_file_name(self.fingerprint),
            packaging: Packaging::File,
        })
    }
}

/// Fails like a missing code directory would.
pub struct MissingResolver;

impl AssetResolver for MissingResolver {
    fn resolve(&self, asset: &CodeAsset) -> Result<StagedAsset, SynthError> {
        Err(SynthError::UnresolvedAsset {
            path: asset.path().to_path_buf(),
            reason: "directory does not exist".to_string(),
        })
    }
}
