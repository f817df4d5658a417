//! Data models
//!
//! This module contains all data structures used throughout Contentdeck.
//! Models represent:
//! - Database entities (Region, Topic, Tag, ContentItem, AnswerOption)
//! - API request/response types
//! - Internal data transfer objects

mod answer_option;
mod content_item;
mod json_field;
mod locale;
mod region;
mod tag;
mod topic;

pub use answer_option::{AnswerOption, CreateAnswerOptionInput, UpdateAnswerOptionInput};
pub use content_item::{
    ContentItem, ContentKind, CreateContentItemInput, ListParams, PagedResult, PublishStatus,
    RegionMode, UpdateContentItemInput,
};
pub use json_field::JsonField;
pub use locale::Locale;
pub use region::{CreateRegionInput, Region, UpdateRegionInput};
pub use tag::{Tag, TagWithCount};
pub use topic::{CreateTopicInput, Topic, UpdateTopicInput};
