//! JSON-based scan storage.
//!
//! Stores each scan as a separate JSON file for simplicity and durability.
//! Supports listing, prefix lookup, and age-based cleanup.

use crate::config::Paths;
use crate::error::{StoreError, StoreResult};
use crate::scanner::DeviceScan;
use crate::types::ScanId;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;

/// JSON file-based scan storage.
pub struct ScanStore {
    scans_dir: PathBuf,
}

impl ScanStore {
    /// Create a store rooted at the default data directory.
    pub fn new() -> StoreResult<Self> {
        let paths = Paths::get().map_err(|e| StoreError::Directory(e.to_string()))?;
        Self::at(paths.scans_dir())
    }

    /// Create a store rooted at an explicit directory.
    pub fn at(scans_dir: PathBuf) -> StoreResult<Self> {
        fs::create_dir_all(&scans_dir).map_err(|e| StoreError::Directory(e.to_string()))?;
        Ok(Self { scans_dir })
    }

    /// Save a scan record.
    pub fn save(&self, scan: &DeviceScan) -> StoreResult<()> {
        let file = self.scan_file(&scan.id);
        let content = serde_json::to_string_pretty(scan)?;

        fs::write(&file, content).map_err(|e| StoreError::SaveFailed(e.to_string()))
    }

    /// Load a scan record by ID.
    pub fn load(&self, id: &ScanId) -> StoreResult<DeviceScan> {
        let file = self.scan_file(id);

        if !file.exists() {
            return Err(StoreError::ScanNotFound(id.to_string()));
        }

        let content =
            fs::read_to_string(&file).map_err(|e| StoreError::LoadFailed(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| StoreError::LoadFailed(e.to_string()))
    }

    /// Find a scan by short ID prefix.
    pub fn find_by_prefix(&self, prefix: &str) -> StoreResult<DeviceScan> {
        let matches: Vec<_> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.to_string().starts_with(prefix))
            .collect();

        match matches.len() {
            0 => Err(StoreError::ScanNotFound(prefix.to_string())),
            1 => self.load(&matches[0]),
            n => Err(StoreError::LoadFailed(format!(
                "ambiguous prefix '{}': {} matches",
                prefix, n
            ))),
        }
    }

    /// List all scan IDs.
    pub fn list_ids(&self) -> StoreResult<Vec<ScanId>> {
        let mut ids = Vec::new();

        for entry in
            fs::read_dir(&self.scans_dir).map_err(|e| StoreError::Directory(e.to_string()))?
        {
            let entry = entry.map_err(|e| StoreError::Directory(e.to_string()))?;
            let path = entry.path();

            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    if let Ok(id) = stem.to_string_lossy().parse::<ScanId>() {
                        ids.push(id);
                    }
                }
            }
        }

        Ok(ids)
    }

    /// List all scan records, most recent first.
    pub fn list(&self) -> StoreResult<Vec<DeviceScan>> {
        let ids = self.list_ids()?;
        let mut records = Vec::new();

        for id in ids {
            if let Ok(record) = self.load(&id) {
                records.push(record);
            }
        }

        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Ok(records)
    }

    /// List recent scans (last n).
    pub fn list_recent(&self, count: usize) -> StoreResult<Vec<DeviceScan>> {
        let mut records = self.list()?;
        records.truncate(count);
        Ok(records)
    }

    /// Delete a scan record.
    pub fn delete(&self, id: &ScanId) -> StoreResult<()> {
        let file = self.scan_file(id);

        if !file.exists() {
            return Err(StoreError::ScanNotFound(id.to_string()));
        }

        fs::remove_file(&file).map_err(|e| StoreError::SaveFailed(e.to_string()))
    }

    /// Delete all scan records, returning how many were removed.
    pub fn clear(&self) -> StoreResult<usize> {
        let ids = self.list_ids()?;
        let count = ids.len();
        for id in ids {
            self.delete(&id)?;
        }
        Ok(count)
    }

    /// Delete scans older than a given duration, returning how many.
    pub fn cleanup(&self, max_age: chrono::Duration) -> StoreResult<usize> {
        let cutoff = Utc::now() - max_age;
        let mut deleted = 0;

        for record in self.list()? {
            if record.started_at < cutoff {
                self.delete(&record.id)?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    /// Get the file path for a scan.
    fn scan_file(&self, id: &ScanId) -> PathBuf {
        self.scans_dir.join(format!("{}.json", id))
    }
}
