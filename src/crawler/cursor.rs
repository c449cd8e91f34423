//! Persisted crawl cursor.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CursorFile {
    last_visited: Option<String>,
}

/// Last processed decision page, stored as `{"last_visited": ...}`
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cursor. A missing or corrupt file means "no cursor".
    pub fn load(&self) -> Option<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Error reading cursor file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<CursorFile>(&content) {
            Ok(file) => {
                debug!(cursor = ?file.last_visited, "Loaded cursor");
                file.last_visited
            }
            Err(e) => {
                warn!("Error parsing cursor file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrite the cursor. Failures are logged, never returned.
    pub fn save(&self, url: &str) {
        if let Err(e) = self.write(url) {
            error!("Error saving cursor to {}: {}", self.path.display(), e);
        }
    }

    fn write(&self, url: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string(&CursorFile {
            last_visited: Some(url.to_string()),
        })?;
        fs::write(&self.path, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CursorStore::new(dir.path().join("Backend").join("last_visited.json"));

        assert_eq!(store.load(), None);

        store.save("https://example.org/decision/1");
        assert_eq!(
            store.load().as_deref(),
            Some("https://example.org/decision/1")
        );

        store.save("https://example.org/decision/2");
        assert_eq!(
            store.load().as_deref(),
            Some("https://example.org/decision/2")
        );
    }

    #[test]
    fn test_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_visited.json");
        fs::write(&path, "{\"last_visited\": ").unwrap();

        assert_eq!(CursorStore::new(&path).load(), None);
    }

    #[test]
    fn test_null_cursor_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_visited.json");
        fs::write(&path, r#"{"last_visited": null}"#).unwrap();

        assert_eq!(CursorStore::new(&path).load(), None);
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_visited.json");
        CursorStore::new(&path).save("https://example.org/a");

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["last_visited"], "https://example.org/a");
    }

    #[test]
    fn test_unwritable_save_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // The cursor path is an existing directory, so the write fails
        let store = CursorStore::new(dir.path());
        store.save("https://example.org/a");
        assert_eq!(store.load(), None);
    }
}
