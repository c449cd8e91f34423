//! Tier boundary loading.
//!
//! Unpacks the service-area archive, reads each tier's shapefile and links
//! every tier to the tier above it by spatial intersection.

mod archive;
mod join;
mod layer;
mod reader;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use archive::ExtractedArchive;

pub use archive::find_tier_file;
pub use join::spatial_join;
pub use layer::{dbf_field_name, TierFeature, TierLayer};
pub use reader::read_tier_file;

#[derive(Debug, Error)]
pub enum TierError {
    #[error("failed to extract archive {path}: {source}")]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("failed to read shapes from {path}: {source}")]
    Shapefile {
        path: PathBuf,
        source: shapefile::Error,
    },

    #[error("failed to read attributes from {path}: {reason}")]
    Attributes { path: PathBuf, reason: String },

    #[error("tier {tier} has no {column} column to join on")]
    MissingColumn { tier: u8, column: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Load tiers `1..=tier_count` from a zip archive of shapefiles.
///
/// Tiers with no file in the archive are skipped with a warning. Each
/// loaded tier after the first is joined against the last tier loaded
/// before it.
pub fn load_tiers(
    archive_path: &Path,
    tier_count: u8,
    area_id_column: &str,
) -> Result<Vec<TierLayer>, TierError> {
    let archive = ExtractedArchive::open(archive_path)?;
    let layers = load_tier_dir(archive.path(), tier_count, area_id_column)?;
    Ok(layers)
}

/// Load and join tiers from an already unpacked directory
pub fn load_tier_dir(
    root: &Path,
    tier_count: u8,
    area_id_column: &str,
) -> Result<Vec<TierLayer>, TierError> {
    let mut layers: Vec<TierLayer> = Vec::new();

    for tier in 1..=tier_count {
        let Some(path) = find_tier_file(root, tier) else {
            warn!("No file found for tier {} (Tier{}_*.shp)", tier, tier);
            continue;
        };

        let mut layer = read_tier_file(&path, tier)?;
        if let Some(parent) = layers.last() {
            layer = spatial_join(layer, parent, area_id_column)?;
        }
        layers.push(layer);
    }

    info!("Loaded {} of {} tiers", layers.len(), tier_count);
    Ok(layers)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::LoaderConfig;

    type Areas<'a> = &'a [(&'a str, [f64; 4])];

    /// Zip one shapefile per `(file stem, areas)` into `zip_path`, all
    /// keyed by `column`
    pub(crate) fn write_tier_archive(zip_path: &Path, column: &str, tiers: &[(&str, Areas)]) {
        let src = tempfile::tempdir().unwrap();
        let data = src.path().join("CanadaServiceAreas");
        std::fs::create_dir_all(&data).unwrap();
        for (stem, areas) in tiers {
            reader::tests::write_tier_shapefile(
                &data.join(format!("{}.shp", stem)),
                column,
                areas,
            );
        }
        archive::tests::zip_dir(zip_path, src.path());
    }

    /// Two tiers: 2-001 inside 1-001, 2-002 outside both parents and 2-003
    /// straddling the gap between them
    pub(crate) fn two_tier_archive(zip_path: &Path, column: &str) {
        let tier1: Areas = &[
            ("1-001", [0.0, 0.0, 10.0, 10.0]),
            ("1-002", [20.0, 0.0, 30.0, 10.0]),
        ];
        let tier2: Areas = &[
            ("2-001", [1.0, 1.0, 3.0, 3.0]),
            ("2-002", [40.0, 40.0, 41.0, 41.0]),
            ("2-003", [8.0, 1.0, 22.0, 3.0]),
        ];
        write_tier_archive(
            zip_path,
            column,
            &[
                ("Tier1_Niveau1_Canada", tier1),
                ("Tier2_Niveau2_Regions", tier2),
            ],
        );
    }

    #[test]
    fn test_default_config_joins_shapefile_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let loader = LoaderConfig::default();
        let zip_path = dir.path().join(&loader.archive_name);
        two_tier_archive(&zip_path, &loader.area_id_column);

        let layers = load_tiers(&zip_path, loader.tier_count, &loader.area_id_column).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].len(), 2);

        let tier2 = &layers[1];
        assert_eq!(tier2.columns, vec!["Service_Ar", "Tier1_Service_Ar"]);
        let rows: Vec<(Option<&str>, Option<&str>)> = tier2
            .features
            .iter()
            .map(|f| (f.attributes[0].as_deref(), f.attributes[1].as_deref()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (Some("2-001"), Some("1-001")),
                (Some("2-002"), None),
                (Some("2-003"), Some("1-001")),
                (Some("2-003"), Some("1-002")),
            ]
        );
    }

    #[test]
    fn test_mapinfo_column_name_finds_dbf_field() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("areas.zip");
        two_tier_archive(&zip_path, "Service_Ar");

        let layers = load_tiers(&zip_path, 2, "Service_Area_Zone_de_service").unwrap();
        assert_eq!(layers[1].columns[1], "Tier1_Service_Ar");
    }

    #[test]
    fn test_missing_tier_joins_against_previous_present_tier() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("areas.zip");
        let tier1: Areas = &[("1-001", [0.0, 0.0, 10.0, 10.0])];
        let tier3: Areas = &[
            ("3-001", [2.0, 2.0, 4.0, 4.0]),
            ("3-002", [50.0, 50.0, 51.0, 51.0]),
        ];
        write_tier_archive(
            &zip_path,
            "Service_Ar",
            &[("Tier1_A", tier1), ("Tier3_C", tier3)],
        );

        let layers = load_tiers(&zip_path, 5, "Service_Ar").unwrap();
        let tiers: Vec<u8> = layers.iter().map(|l| l.tier).collect();
        assert_eq!(tiers, vec![1, 3]);

        let tables: Vec<String> = layers.iter().map(TierLayer::table_name).collect();
        assert_eq!(tables, vec!["Tier1_Areas", "Tier3_Areas"]);

        let tier3 = &layers[1];
        assert_eq!(tier3.columns, vec!["Service_Ar", "Tier1_Service_Ar"]);
        let rows: Vec<Vec<Option<String>>> =
            tier3.features.iter().map(|f| f.attributes.clone()).collect();
        assert_eq!(
            rows,
            vec![
                vec![Some("3-001".to_string()), Some("1-001".to_string())],
                vec![Some("3-002".to_string()), None],
            ]
        );
    }

    #[test]
    fn test_archive_without_tiers_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("areas.zip");
        archive::tests::write_zip(&zip_path, &["readme.txt"]);

        let layers = load_tiers(&zip_path, 5, "Service_Area_Zone_de_service").unwrap();
        assert!(layers.is_empty());
    }

    #[test]
    fn test_unreadable_tier_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Tier1_A.shp"), b"not a shapefile").unwrap();
        std::fs::write(dir.path().join("Tier1_A.dbf"), b"not a dbf").unwrap();

        assert!(load_tier_dir(dir.path(), 1, "Service_Area_Zone_de_service").is_err());
    }
}
