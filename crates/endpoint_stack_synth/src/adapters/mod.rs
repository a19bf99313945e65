pub mod asset_staging;

pub use asset_staging::{fingerprint_directory, DirectoryAssetResolver};
