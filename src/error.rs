//! Errors surfaced by store, guard and passage operations

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, CultureError>;

/// Failure outcomes of culture record operations
#[derive(Debug, thiserror::Error)]
pub enum CultureError {
    #[error("Culture not found: {id}")]
    NotFound { id: String },

    #[error("Culture {id} has {} child culture(s) and cannot be deleted: {}", .children.len(), .children.join(", "))]
    HasChildren { id: String, children: Vec<String> },

    #[error("Culture {id} is at passage {passage} and cannot be passaged further")]
    PassageLimit { id: String, passage: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl CultureError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Whether the failure came from reading or writing the durable document
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Json(_))
    }
}
