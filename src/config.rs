//! Runtime configuration for the culture store and its snapshots

use log::warn;
use std::path::PathBuf;

/// Incubation time assumed for a passage when none is given (hours)
pub const DEFAULT_HOURS: f64 = 48.0;

/// Incubation hours from operator input; must be a finite number
pub fn parse_hours(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|h| h.is_finite())
}

/// Where the culture document and its snapshots live
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// The single JSON document holding every culture record
    pub data_file: PathBuf,
    /// Directory for versioned snapshots of the document
    pub backup_dir: PathBuf,
    /// How many snapshots to keep when pruning
    pub keep_snapshots: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("cells.json"),
            backup_dir: PathBuf::from("cellline-backups"),
            keep_snapshots: 20,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `CELLLINE_DATA_FILE`, `CELLLINE_BACKUP_DIR`
    /// and `CELLLINE_KEEP_SNAPSHOTS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("CELLLINE_DATA_FILE") {
            config.data_file = PathBuf::from(path);
        }
        if let Some(dir) = lookup("CELLLINE_BACKUP_DIR") {
            config.backup_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("CELLLINE_KEEP_SNAPSHOTS") {
            match raw.parse::<usize>() {
                Ok(0) => warn!("Ignoring CELLLINE_KEEP_SNAPSHOTS=0: the newest snapshot is always kept"),
                Ok(keep) => config.keep_snapshots = keep,
                Err(_) => warn!("Ignoring CELLLINE_KEEP_SNAPSHOTS={:?}: not a count", raw),
            }
        }
        config
    }
}
