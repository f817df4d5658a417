//! Content item model
//!
//! This module provides:
//! - `ContentItem` entity representing a single publishable piece of content
//! - `ContentKind`, `PublishStatus` and `RegionMode` enums
//! - Input types for creating and updating items
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JsonField, Locale};

/// Content item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier
    pub id: i64,
    /// Content kind
    pub kind: ContentKind,
    /// Content locale
    pub locale: Locale,
    /// Owning topic ID
    pub topic_id: i64,
    /// Plain text body
    pub text: String,
    /// Optional rich text body (HTML)
    pub rich_text: Option<String>,
    /// Publication status
    pub status: PublishStatus,
    /// Scheduled or actual publication timestamp
    pub publish_at: Option<DateTime<Utc>>,
    /// Expiry timestamp; past this the item is no longer live
    pub expire_at: Option<DateTime<Utc>>,
    /// How the effective region is determined
    pub region_mode: RegionMode,
    /// Explicitly assigned region (used when region_mode is Manual)
    pub manual_region_id: Option<i64>,
    /// Resolved region; NULL means the item is global
    pub effective_region_id: Option<i64>,
    /// Automatic region rules (JSON)
    #[serde(default)]
    pub region_auto: JsonField,
    /// Validation rules for answers (JSON)
    #[serde(default)]
    pub validation: JsonField,
    /// Free-form metadata (JSON)
    #[serde(default)]
    pub meta: JsonField,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Content kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    /// Swipeable statement card
    Swipe,
    /// Dated event announcement
    Event,
    /// Weekly poll with answer options
    SundayPoll,
}

impl ContentKind {
    /// Convert kind to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Swipe => "SWIPE",
            ContentKind::Event => "EVENT",
            ContentKind::SundayPoll => "SUNDAY_POLL",
        }
    }

    /// Parse kind from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SWIPE" => Some(ContentKind::Swipe),
            "EVENT" => Some(ContentKind::Event),
            "SUNDAY_POLL" => Some(ContentKind::SundayPoll),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    /// Draft - being authored
    Draft,
    /// Review - awaiting editorial approval
    Review,
    /// Published - live (subject to publish_at/expire_at)
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl Default for PublishStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl PublishStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Draft => "draft",
            PublishStatus::Review => "review",
            PublishStatus::Published => "published",
            PublishStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(PublishStatus::Draft),
            "review" => Some(PublishStatus::Review),
            "published" => Some(PublishStatus::Published),
            "archived" => Some(PublishStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an item's effective region is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionMode {
    /// Resolved from region_auto rules
    Auto,
    /// Taken from manual_region_id
    Manual,
}

impl Default for RegionMode {
    fn default() -> Self {
        Self::Auto
    }
}

impl RegionMode {
    /// Convert mode to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionMode::Auto => "AUTO",
            RegionMode::Manual => "MANUAL",
        }
    }

    /// Parse mode from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "AUTO" => Some(RegionMode::Auto),
            "MANUAL" => Some(RegionMode::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for RegionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContentItemInput {
    /// Content kind
    pub kind: ContentKind,
    /// Content locale
    pub locale: Locale,
    /// Owning topic ID
    pub topic_id: i64,
    /// Plain text body
    pub text: String,
    /// Optional rich text body
    pub rich_text: Option<String>,
    /// Scheduled publication timestamp (optional)
    pub publish_at: Option<DateTime<Utc>>,
    /// Expiry timestamp (optional)
    pub expire_at: Option<DateTime<Utc>>,
    /// Region mode (defaults to Auto)
    #[serde(default)]
    pub region_mode: RegionMode,
    /// Explicit region for Manual mode
    pub manual_region_id: Option<i64>,
    /// Automatic region rules
    #[serde(default)]
    pub region_auto: JsonField,
    /// Validation rules
    #[serde(default)]
    pub validation: JsonField,
    /// Free-form metadata
    #[serde(default)]
    pub meta: JsonField,
}

impl CreateContentItemInput {
    /// Create a new CreateContentItemInput with defaults
    pub fn new(kind: ContentKind, locale: Locale, topic_id: i64, text: impl Into<String>) -> Self {
        Self {
            kind,
            locale,
            topic_id,
            text: text.into(),
            rich_text: None,
            publish_at: None,
            expire_at: None,
            region_mode: RegionMode::Auto,
            manual_region_id: None,
            region_auto: JsonField::DbNull,
            validation: JsonField::DbNull,
            meta: JsonField::DbNull,
        }
    }

    /// Set the region mode
    pub fn with_region_mode(mut self, mode: RegionMode) -> Self {
        self.region_mode = mode;
        self
    }

    /// Set the manual region
    pub fn with_manual_region(mut self, region_id: i64) -> Self {
        self.manual_region_id = Some(region_id);
        self
    }

    /// Set the automatic region rules
    pub fn with_region_auto(mut self, rules: serde_json::Value) -> Self {
        self.region_auto = JsonField::from(rules);
        self
    }

    /// Set the scheduled publication timestamp
    pub fn with_publish_at(mut self, at: DateTime<Utc>) -> Self {
        self.publish_at = Some(at);
        self
    }

    /// Set the expiry timestamp
    pub fn with_expire_at(mut self, at: DateTime<Utc>) -> Self {
        self.expire_at = Some(at);
        self
    }
}

/// Input for updating an existing content item
///
/// A JSON column is left untouched when its field is `None`; to clear one,
/// send `JsonField::DbNull` explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContentItemInput {
    /// New text body (optional)
    pub text: Option<String>,
    /// New rich text body (optional)
    pub rich_text: Option<String>,
    /// New scheduled publication timestamp (optional)
    pub publish_at: Option<DateTime<Utc>>,
    /// New expiry timestamp (optional)
    pub expire_at: Option<DateTime<Utc>>,
    /// New region mode (optional)
    pub region_mode: Option<RegionMode>,
    /// New manual region (optional)
    pub manual_region_id: Option<i64>,
    /// New automatic region rules (optional)
    pub region_auto: Option<JsonField>,
    /// New validation rules (optional)
    pub validation: Option<JsonField>,
    /// New metadata (optional)
    pub meta: Option<JsonField>,
}

impl UpdateContentItemInput {
    /// Create a new empty UpdateContentItemInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.text.is_some()
            || self.rich_text.is_some()
            || self.publish_at.is_some()
            || self.expire_at.is_some()
            || self.region_mode.is_some()
            || self.manual_region_id.is_some()
            || self.region_auto.is_some()
            || self.validation.is_some()
            || self.meta.is_some()
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_roundtrip() {
        for kind in [ContentKind::Swipe, ContentKind::Event, ContentKind::SundayPoll] {
            assert_eq!(ContentKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_content_kind_unknown_rejected() {
        assert_eq!(ContentKind::from_str("swipe"), None);
        assert_eq!(ContentKind::from_str("POLL"), None);
    }

    #[test]
    fn test_publish_status_roundtrip() {
        for status in [
            PublishStatus::Draft,
            PublishStatus::Review,
            PublishStatus::Published,
            PublishStatus::Archived,
        ] {
            assert_eq!(PublishStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_publish_status_case_insensitive() {
        assert_eq!(PublishStatus::from_str("DRAFT"), Some(PublishStatus::Draft));
        assert_eq!(PublishStatus::from_str("unknown"), None);
    }

    #[test]
    fn test_region_mode_roundtrip() {
        for mode in [RegionMode::Auto, RegionMode::Manual] {
            assert_eq!(RegionMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(RegionMode::from_str("auto"), None);
    }

    #[test]
    fn test_list_params_clamping() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_list_params_offset() {
        let params = ListParams::new(3, 20);
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_paged_result_navigation() {
        let params = ListParams::new(2, 10);
        let result: PagedResult<i32> = PagedResult::new(vec![1, 2, 3], 25, &params);
        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());
        assert!(result.has_prev());
        assert_eq!(result.len(), 3);
    }
}
