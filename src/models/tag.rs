//! Tag model
//!
//! Tags label both topics and content items through join tables. Each tag
//! has a unique slug derived from its label.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Display label
    pub label: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Tag with item usage count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    /// The tag
    #[serde(flatten)]
    pub tag: Tag,
    /// Number of content items using this tag
    pub item_count: i64,
}
