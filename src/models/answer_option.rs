//! Answer option model
//!
//! Poll items carry an ordered set of answer options. Within one item both
//! the display order and the stored value are unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JsonField;

/// Answer option entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Unique identifier
    pub id: i64,
    /// Owning content item ID
    pub item_id: i64,
    /// Stored answer value (unique per item)
    pub value: String,
    /// Display label
    pub label: String,
    /// Display position (unique per item)
    pub sort_order: i32,
    /// When selected, excludes all other options
    pub is_exclusive: bool,
    /// Free-form metadata (JSON)
    #[serde(default)]
    pub meta: JsonField,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new answer option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnswerOptionInput {
    /// Stored answer value
    pub value: String,
    /// Display label
    pub label: String,
    /// Display position
    pub sort_order: i32,
    /// Whether the option is exclusive
    #[serde(default)]
    pub is_exclusive: bool,
    /// Free-form metadata
    #[serde(default)]
    pub meta: JsonField,
}

impl CreateAnswerOptionInput {
    /// Create a new CreateAnswerOptionInput
    pub fn new(value: impl Into<String>, label: impl Into<String>, sort_order: i32) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            sort_order,
            is_exclusive: false,
            meta: JsonField::DbNull,
        }
    }

    /// Mark the option as exclusive
    pub fn exclusive(mut self) -> Self {
        self.is_exclusive = true;
        self
    }
}

/// Input for updating an existing answer option
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAnswerOptionInput {
    /// New value (optional)
    pub value: Option<String>,
    /// New label (optional)
    pub label: Option<String>,
    /// New sort order (optional)
    pub sort_order: Option<i32>,
    /// New exclusivity flag (optional)
    pub is_exclusive: Option<bool>,
    /// New metadata (optional)
    pub meta: Option<JsonField>,
}

impl UpdateAnswerOptionInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.value.is_some()
            || self.label.is_some()
            || self.sort_order.is_some()
            || self.is_exclusive.is_some()
            || self.meta.is_some()
    }
}
