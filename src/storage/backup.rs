//! Snapshots — versioned, checksummed copies of the culture document
//!
//! Each snapshot is a full copy of the document plus a manifest entry with its
//! SHA-256, so a bad edit or a corrupted document can be rolled back.

use crate::culture::CultureRecord;
use crate::error::{CultureError, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::PathBuf;

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    pub checksum: String,
    pub size_bytes: u64,
    pub record_count: usize,
    pub description: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotManifest {
    snapshots: Vec<SnapshotMeta>,
    next_version: u64,
}

impl Default for SnapshotManifest {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            next_version: 1,
        }
    }
}

pub struct SnapshotManager {
    dir: PathBuf,
    manifest: SnapshotManifest,
}

fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

impl SnapshotManager {
    /// Open a snapshot directory.
    ///
    /// A missing manifest starts an empty history; a manifest that exists but
    /// cannot be read or parsed is an error, so versions never restart over it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let manifest = match std::fs::read_to_string(dir.join(MANIFEST_FILE)) {
            Ok(json) => serde_json::from_str::<SnapshotManifest>(&json)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot manifest in {}", dir.display());
                SnapshotManifest::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { dir, manifest })
    }

    fn write_manifest(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(self.dir.join(MANIFEST_FILE), json)?;
        Ok(())
    }

    fn meta(&self, version: u64) -> Result<&SnapshotMeta> {
        self.manifest
            .snapshots
            .iter()
            .find(|s| s.version == version)
            .ok_or_else(|| CultureError::Snapshot(format!("no snapshot v{}", version)))
    }

    /// Snapshot file contents, or an error if they no longer match the manifest
    fn read_verified(&self, meta: &SnapshotMeta) -> Result<String> {
        let data = std::fs::read_to_string(self.dir.join(&meta.filename))?;
        let actual = sha256_hex(&data);
        if actual != meta.checksum {
            return Err(CultureError::Snapshot(format!(
                "v{} is corrupted: manifest says {}, file hashes to {}",
                meta.version, meta.checksum, actual
            )));
        }
        Ok(data)
    }

    /// Write `data` (a serialized culture document) as the next version
    pub fn create_snapshot(
        &mut self,
        data: &str,
        record_count: usize,
        description: &str,
    ) -> Result<SnapshotMeta> {
        std::fs::create_dir_all(&self.dir)?;

        let version = self.manifest.next_version;
        let timestamp = Utc::now();
        let filename = format!("cells_v{:04}_{}.json", version, timestamp.format("%Y%m%d_%H%M%S"));
        std::fs::write(self.dir.join(&filename), data)?;

        let meta = SnapshotMeta {
            version,
            timestamp,
            checksum: sha256_hex(data),
            size_bytes: data.len() as u64,
            record_count,
            description: description.to_string(),
            filename,
        };
        self.manifest.snapshots.push(meta.clone());
        self.manifest.next_version = version + 1;
        self.write_manifest()?;

        info!("Snapshot v{} of {} cultures written to {}", version, record_count, meta.filename);
        Ok(meta)
    }

    /// Verified, parsed culture records of one version
    pub fn load_records(&self, version: u64) -> Result<Vec<CultureRecord>> {
        let data = self.read_verified(self.meta(version)?)?;
        let records: Vec<CultureRecord> = serde_json::from_str(&data)?;
        info!("Read snapshot v{} ({} cultures)", version, records.len());
        Ok(records)
    }

    pub fn latest_version(&self) -> Option<u64> {
        self.manifest.snapshots.last().map(|s| s.version)
    }

    pub fn list_snapshots(&self) -> &[SnapshotMeta] {
        &self.manifest.snapshots
    }

    /// `(version, intact)` for every snapshot
    pub fn verify_all(&self) -> Vec<(u64, bool)> {
        self.manifest
            .snapshots
            .iter()
            .map(|meta| (meta.version, self.read_verified(meta).is_ok()))
            .collect()
    }

    /// Drop the oldest snapshots so at most `keep` remain; returns how many went
    pub fn retain_latest(&mut self, keep: usize) -> Result<usize> {
        let excess = self.manifest.snapshots.len().saturating_sub(keep);
        if excess == 0 {
            return Ok(0);
        }
        for meta in self.manifest.snapshots.drain(..excess) {
            if let Err(e) = std::fs::remove_file(self.dir.join(&meta.filename)) {
                warn!("Could not remove snapshot file {}: {}", meta.filename, e);
            }
        }
        self.write_manifest()?;
        info!("Pruned {} snapshot(s); {} remain", excess, keep);
        Ok(excess)
    }

    pub fn total_size(&self) -> u64 {
        self.manifest.snapshots.iter().map(|s| s.size_bytes).sum()
    }
}
