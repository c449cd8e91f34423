//! Tier archive extraction.

use regex::Regex;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};
use tracing::info;
use walkdir::WalkDir;
use zip::ZipArchive;

use super::TierError;

/// A zip archive unpacked into a scratch directory, removed on drop
pub(crate) struct ExtractedArchive {
    dir: TempDir,
}

impl ExtractedArchive {
    pub fn open(path: &Path) -> Result<Self, TierError> {
        info!("Extracting {}", path.display());

        let file = File::open(path).map_err(|source| TierError::Archive {
            path: path.to_path_buf(),
            source: source.into(),
        })?;
        let mut archive = ZipArchive::new(file).map_err(|source| TierError::Archive {
            path: path.to_path_buf(),
            source,
        })?;

        let dir = Builder::new().prefix("spectrum-tiers-").tempdir()?;
        archive
            .extract(dir.path())
            .map_err(|source| TierError::Archive {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Extracted {} entries", archive.len());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// First `Tier{n}_*.shp` under `root`, in path order
pub fn find_tier_file(root: &Path, tier: u8) -> Option<PathBuf> {
    let pattern = Regex::new(&format!(r"(?i)^Tier{}_.*\.shp$", tier)).ok()?;

    let mut matches: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| pattern.is_match(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();

    matches.sort();
    matches.into_iter().next()
}
