//! Cellline — cell culture lineage tracking
//!
//! Records every culture generation, derives population doubling level and
//! doubling time at each passage, and exposes the parent/child history as a
//! navigable lineage forest backed by a single JSON document.

pub mod config;
pub mod culture;
pub mod error;
pub mod growth;
pub mod guard;
pub mod passage;
pub mod storage;

pub use config::StoreConfig;
pub use culture::{CultureRecord, CultureStatus, LineageIndex, NewCulture};
pub use error::{CultureError, Result};
pub use guard::delete_culture;
pub use passage::{register_passage, PassageRequest};
pub use storage::{CultureStore, LoadReport};
