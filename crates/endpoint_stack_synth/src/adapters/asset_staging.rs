use std::cmp::Ordering;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use endpoint_stack_core::asset::{staged_file_name, Packaging};
use endpoint_stack_core::{AssetResolver, CodeAsset, StagedAsset, SynthError};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

const EXECUTABLE_ENTRY: &str = "bootstrap";

#[derive(Debug, Clone, PartialEq, Eq)]
enum BundleEntry {
    Directory(String),
    File(String),
}

impl BundleEntry {
    fn relative_path(&self) -> &str {
        match self {
            Self::Directory(path) | Self::File(path) => path,
        }
    }
}

/// Resolves code assets from local directories.
///
/// Relative asset paths resolve against `base_dir`. When a staging
/// directory is set, each bundle is also zipped into it as
/// `asset.<fingerprint>.zip`.
#[derive(Debug, Clone)]
pub struct DirectoryAssetResolver {
    base_dir: PathBuf,
    staging_dir: Option<PathBuf>,
}

impl DirectoryAssetResolver {
    pub fn fingerprint_only(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            staging_dir: None,
        }
    }

    pub fn staging(
        base_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            staging_dir: Some(staging_dir.into()),
        }
    }

    pub fn source_path(&self, asset: &CodeAsset) -> PathBuf {
        if asset.path().is_absolute() {
            asset.path().to_path_buf()
        } else {
            self.base_dir.join(asset.path())
        }
    }
}

impl AssetResolver for DirectoryAssetResolver {
    fn resolve(&self, asset: &CodeAsset) -> Result<StagedAsset, SynthError> {
        let source = self.source_path(asset);
        let source = source.canonicalize().map_err(|error| SynthError::UnresolvedAsset {
            path: source.clone(),
            reason: error.to_string(),
        })?;
        if !source.is_dir() {
            return Err(SynthError::UnresolvedAsset {
                path: source,
                reason: "code asset must be a directory".to_string(),
            });
        }

        let entries = collect_entries(&source)?;
        let fingerprint = fingerprint_entries(&source, &entries)?;
        let staged_file = staged_file_name(&fingerprint);

        if let Some(staging_dir) = &self.staging_dir {
            let destination = staging_dir.join(&staged_file);
            if destination.exists() {
                debug!(path = %destination.display(), "asset already staged");
            } else {
                fs::create_dir_all(staging_dir)?;
                write_bundle_zip(&source, &entries, &destination)?;
                info!(
                    source = %source.display(),
                    staged = %destination.display(),
                    files = entries.len(),
                    "staged code asset"
                );
            }
        }

        Ok(StagedAsset {
            fingerprint,
            source_path: source,
            staged_file,
            packaging: Packaging::File,
        })
    }
}

/// SHA-256 over the sorted relative paths and contents of a directory.
pub fn fingerprint_directory(path: &Path) -> Result<String, SynthError> {
    let entries = collect_entries(path)?;
    fingerprint_entries(path, &entries)
}

fn fingerprint_entries(root: &Path, entries: &[BundleEntry]) -> Result<String, SynthError> {
    let mut hasher = Sha256::new();
    for entry in entries {
        match entry {
            BundleEntry::Directory(relative) => {
                hasher.update(b"dir:");
                hasher.update(relative.as_bytes());
                hasher.update(b"\n");
            }
            BundleEntry::File(relative) => {
                let contents = fs::read(root.join(relative))?;
                hasher.update(b"file:");
                hasher.update(relative.as_bytes());
                hasher.update(b"\n");
                hasher.update((contents.len() as u64).to_le_bytes());
                hasher.update(&contents);
            }
        }
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn collect_entries(root: &Path) -> Result<Vec<BundleEntry>, SynthError> {
    let mut entries = Vec::new();
    walk(root, root, &mut entries)?;
    entries.sort_by(by_relative_path);
    Ok(entries)
}

fn by_relative_path(a: &BundleEntry, b: &BundleEntry) -> Ordering {
    a.relative_path().cmp(b.relative_path())
}

fn walk(root: &Path, dir: &Path, entries: &mut Vec<BundleEntry>) -> Result<(), SynthError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        let relative = relative_path(root, &path)?;

        if file_type.is_dir() {
            entries.push(BundleEntry::Directory(relative));
            walk(root, &path, entries)?;
        } else if file_type.is_file() {
            entries.push(BundleEntry::File(relative));
        } else if file_type.is_symlink() && fs::metadata(&path).is_ok_and(|meta| meta.is_file()) {
            // Symlinked directories are skipped to avoid cycles.
            entries.push(BundleEntry::File(relative));
        }
    }
    Ok(())
}

fn relative_path(root: &Path, path: &Path) -> Result<String, SynthError> {
    let relative = path.strip_prefix(root).map_err(|_| SynthError::UnresolvedAsset {
        path: path.to_path_buf(),
        reason: format!("path escapes bundle root '{}'", root.display()),
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn write_bundle_zip(
    root: &Path,
    entries: &[BundleEntry],
    destination: &Path,
) -> Result<(), SynthError> {
    let partial = destination.with_extension("zip.partial");
    let zip_error = |error: zip::result::ZipError| SynthError::UnresolvedAsset {
        path: root.to_path_buf(),
        reason: format!("failed to write bundle archive: {error}"),
    };

    let file = fs::File::create(&partial)?;
    let mut zip = ZipWriter::new(file);
    // Fixed timestamps keep the archive bytes a function of the bundle contents.
    let base_options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for entry in entries {
        match entry {
            BundleEntry::Directory(relative) => {
                let options = base_options.unix_permissions(0o755);
                zip.add_directory(format!("{relative}/"), options)
                    .map_err(zip_error)?;
            }
            BundleEntry::File(relative) => {
                let mode = if file_name(relative) == EXECUTABLE_ENTRY {
                    0o755
                } else {
                    0o644
                };
                let options = base_options.unix_permissions(mode);
                zip.start_file(relative.as_str(), options)
                    .map_err(zip_error)?;
                let mut source = fs::File::open(root.join(relative))?;
                io::copy(&mut source, &mut zip)?;
            }
        }
    }

    let mut file = zip.finish().map_err(zip_error)?;
    file.flush()?;
    fs::rename(&partial, destination)?;
    Ok(())
}

fn file_name(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}
