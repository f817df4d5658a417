//! Business logic services
//!
//! Services sit between the HTTP handlers and the repositories. They own
//! validation, the publication lifecycle, region resolution and feed caching.

pub mod content_item;
pub mod region;
pub mod tag;
pub mod topic;

pub use content_item::{ContentItemService, ContentItemServiceError, ItemDetail};
pub use region::{RegionAutoRules, RegionService, RegionServiceError};
pub use tag::{TagService, TagServiceError};
pub use topic::{generate_slug, TopicService, TopicServiceError};
