//! Local storage for culture records
//!
//! The whole collection lives in memory and is rewritten to a single JSON
//! document after every mutation. Open at startup → mutate → close.

pub mod backup;

use crate::culture::{generate_id, CultureRecord, LineageIndex, NewCulture};
use crate::error::{CultureError, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// What `CultureStore::open` found on disk
#[derive(Debug)]
pub enum LoadReport {
    /// No document yet; starting empty
    Fresh,
    Loaded { count: usize },
    /// The document could not be read or parsed; starting empty.
    /// The unreadable file is kept at `preserved_at` when the copy succeeded.
    Recovered {
        error: CultureError,
        preserved_at: Option<PathBuf>,
    },
}

impl LoadReport {
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Recovered { error, preserved_at } => Some(match preserved_at {
                Some(copy) => format!(
                    "could not load culture document ({}); starting empty, original kept at {}",
                    error,
                    copy.display()
                ),
                None => format!("could not load culture document ({}); starting empty", error),
            }),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CultureStore {
    records: Vec<CultureRecord>,
    path: Option<PathBuf>,
}

impl CultureStore {
    /// Load the document at `path`, falling back to an empty collection
    pub fn open(path: impl AsRef<Path>) -> (Self, LoadReport) {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            records: Vec::new(),
            path: Some(path.clone()),
        };

        if !path.exists() {
            info!("No culture document at {}, starting fresh", path.display());
            return (store, LoadReport::Fresh);
        }

        match Self::read_document(&path) {
            Ok(records) => {
                info!("Loaded {} cultures from {}", records.len(), path.display());
                let count = records.len();
                store.records = records;
                (store, LoadReport::Loaded { count })
            }
            Err(error) => {
                warn!("Failed to load {}: {}; starting with no cultures", path.display(), error);
                let preserved_at = Self::preserve_unreadable(&path);
                (store, LoadReport::Recovered { error, preserved_at })
            }
        }
    }

    /// A store without a backing document; `persist` does nothing
    pub fn in_memory() -> Self {
        Self {
            records: Vec::new(),
            path: None,
        }
    }

    fn read_document(path: &Path) -> Result<Vec<CultureRecord>> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn preserve_unreadable(path: &Path) -> Option<PathBuf> {
        let mut copy = path.as_os_str().to_owned();
        copy.push(".corrupt");
        let copy = PathBuf::from(copy);
        match std::fs::copy(path, &copy) {
            Ok(_) => Some(copy),
            Err(e) => {
                warn!("Could not keep a copy of {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rewrite the whole document from the in-memory collection
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Final flush before the store is dropped
    pub fn close(self) -> Result<()> {
        self.persist()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Register a culture and persist the collection.
    ///
    /// If the write fails the record stays in memory and the error is returned.
    pub fn create(&mut self, fields: NewCulture) -> Result<CultureRecord> {
        let record = self.stage(fields);
        info!("Created culture {}: {}", record.id, record.summary());
        self.persist()?;
        Ok(record)
    }

    /// Append a record without persisting; callers flush afterwards
    pub(crate) fn stage(&mut self, fields: NewCulture) -> CultureRecord {
        let record = CultureRecord::from_new(self.fresh_id(), fields);
        self.records.push(record.clone());
        record
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = generate_id();
            if self.find(&id).is_none() {
                return id;
            }
        }
    }

    /// Records in insertion order
    pub fn all(&self) -> &[CultureRecord] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<&CultureRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut CultureRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Drop a record from memory without persisting
    pub(crate) fn take(&mut self, id: &str) -> Option<CultureRecord> {
        let pos = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(pos))
    }

    /// Look up a record by a unique id prefix
    pub fn resolve(&self, prefix: &str) -> Result<&CultureRecord> {
        if let Some(exact) = self.find(prefix) {
            return Ok(exact);
        }
        let mut matching = self.records.iter().filter(|r| r.id.starts_with(prefix));
        match (matching.next(), matching.next()) {
            (Some(only), None) if !prefix.is_empty() => Ok(only),
            _ => Err(CultureError::not_found(prefix)),
        }
    }

    /// Swap in a whole collection (snapshot restore) and persist it
    pub fn replace_all(&mut self, records: Vec<CultureRecord>) -> Result<()> {
        info!("Replacing {} cultures with {}", self.records.len(), records.len());
        self.records = records;
        self.persist()
    }

    pub fn index(&self) -> LineageIndex<'_> {
        LineageIndex::build(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> String {
        let roots = self.records.iter().filter(|r| r.is_root()).count();
        let max_passage = self.records.iter().map(|r| r.passage).max().unwrap_or(0);
        let max_pdl = self.records.iter().map(|r| r.pdl).fold(0.0, f64::max);
        let cell_types: Vec<String> = {
            let mut t: Vec<String> = self.records.iter().map(|r| r.cell_type.clone()).collect();
            t.sort(); t.dedup(); t
        };
        format!(
            "CultureStore | {} cultures | {} lineages | max P{} | max PDL {:.2} | cell types: {:?}",
            self.records.len(), roots, max_passage, max_pdl, cell_types
        )
    }
}
