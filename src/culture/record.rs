//! CultureRecord — one seed-to-harvest cycle of a culture

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of generated culture ids
pub const ID_LEN: usize = 8;

/// Lifecycle state of a culture
///
/// Passaging a culture does not move it out of `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CultureStatus {
    #[default]
    Active,
}

/// A single culture generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureRecord {
    pub id: String,
    /// `None` for a founding culture
    pub parent_id: Option<String>,
    pub cell_type: String,
    pub label: String,
    pub date: NaiveDate,
    pub passage: u32,
    pub seeded_count: u64,
    /// Set once the culture is harvested for a passage
    pub harvested_count: Option<u64>,
    /// Cumulative population doubling level when this culture was seeded
    pub pdl: f64,
    /// Hours per doubling, set once the culture is harvested
    pub doubling_time: Option<f64>,
    pub status: CultureStatus,
}

/// User-supplied fields for a new culture
#[derive(Debug, Clone, PartialEq)]
pub struct NewCulture {
    pub cell_type: String,
    pub label: String,
    pub passage: u32,
    pub seeded_count: u64,
    pub parent_id: Option<String>,
    pub pdl: f64,
}

impl NewCulture {
    /// A founding culture with no ancestry and zero PDL
    pub fn root(
        cell_type: impl Into<String>,
        label: impl Into<String>,
        passage: u32,
        seeded_count: u64,
    ) -> Self {
        Self {
            cell_type: cell_type.into(),
            label: label.into(),
            passage,
            seeded_count,
            parent_id: None,
            pdl: 0.0,
        }
    }
}

impl CultureRecord {
    /// Materialize a record with a given id, stamped with today's date
    pub fn from_new(id: String, fields: NewCulture) -> Self {
        Self {
            id,
            parent_id: fields.parent_id,
            cell_type: fields.cell_type,
            label: fields.label,
            date: Local::now().date_naive(),
            passage: fields.passage,
            seeded_count: fields.seeded_count,
            harvested_count: None,
            pdl: fields.pdl,
            doubling_time: None,
            status: CultureStatus::Active,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_harvested(&self) -> bool {
        self.harvested_count.is_some()
    }

    /// Label if present, otherwise the id
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    pub fn summary(&self) -> String {
        let dt = self
            .doubling_time
            .map(|h| format!("{:.1}h", h))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} P{} '{}' | seeded {} | PDL {:.2} | DT {} | {}",
            self.cell_type,
            self.passage,
            self.label,
            self.seeded_count,
            self.pdl,
            dt,
            self.date,
        )
    }
}

/// Fresh short id from a v4 uuid
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()[..ID_LEN].to_string()
}
