//! Region model
//!
//! Regions form a shallow hierarchy expressed by `level` and hierarchical
//! codes (e.g. `DE` at level 0, `DE-BY` at level 1). There is no parent
//! foreign key; the code convention carries the structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Region entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    /// Unique identifier
    pub id: i64,
    /// Unique region code (e.g. "DE", "DE-BY")
    pub code: String,
    /// Human-readable name
    pub name: String,
    /// Hierarchy depth (0 = country, 1 = state, ...)
    pub level: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegionInput {
    /// Region code
    pub code: String,
    /// Human-readable name
    pub name: String,
    /// Hierarchy depth
    pub level: i32,
}

impl CreateRegionInput {
    /// Create a new CreateRegionInput
    pub fn new(code: impl Into<String>, name: impl Into<String>, level: i32) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            level,
        }
    }
}

/// Input for updating an existing region
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRegionInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New level (optional)
    pub level: Option<i32>,
}

impl UpdateRegionInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.level.is_some()
    }
}
