//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod answer_option;
pub mod content_item;
pub mod region;
pub mod tag;
pub mod topic;

pub use answer_option::{AnswerOptionRepository, SqlxAnswerOptionRepository};
pub use content_item::{ContentItemRepository, LiveQuery, SqlxContentItemRepository};
pub use region::{RegionRepository, SqlxRegionRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use topic::{SqlxTopicRepository, TopicRepository};
