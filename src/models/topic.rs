//! Topic model
//!
//! Topics group content items and carry a locale. Each topic has a unique
//! URL-friendly slug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Locale;

/// Topic entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Topic title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Content locale
    pub locale: Locale,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTopicInput {
    /// Topic title
    pub title: String,
    /// Optional explicit slug (generated from the title when absent)
    pub slug: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Content locale
    pub locale: Locale,
}

impl CreateTopicInput {
    /// Create a new CreateTopicInput
    pub fn new(title: impl Into<String>, locale: Locale) -> Self {
        Self {
            title: title.into(),
            slug: None,
            description: None,
            locale,
        }
    }

    /// Set an explicit slug
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Input for updating an existing topic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTopicInput {
    /// New title (optional)
    pub title: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
    /// New locale (optional)
    pub locale: Option<Locale>,
}

impl UpdateTopicInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.locale.is_some()
    }
}
