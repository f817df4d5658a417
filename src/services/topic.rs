//! Topic service
//!
//! Business logic for topics: validation, slug generation and uniqueness.

use crate::db::repositories::TopicRepository;
use crate::models::{CreateTopicInput, ListParams, PagedResult, Topic, UpdateTopicInput};
use anyhow::Context;
use std::sync::Arc;

/// Error types for topic service operations
#[derive(Debug, thiserror::Error)]
pub enum TopicServiceError {
    /// Topic not found
    #[error("Topic not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("Topic slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Topic service for managing content topics
pub struct TopicService {
    repo: Arc<dyn TopicRepository>,
}

impl TopicService {
    /// Create a new topic service
    pub fn new(repo: Arc<dyn TopicRepository>) -> Self {
        Self { repo }
    }

    /// Create a topic
    ///
    /// When no slug is supplied one is generated from the title. A slug
    /// that is already taken is rejected rather than suffixed, so editors
    /// see the collision.
    pub async fn create(&self, input: &CreateTopicInput) -> Result<Topic, TopicServiceError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(TopicServiceError::ValidationError(
                "Topic title cannot be empty".to_string(),
            ));
        }

        let slug = match &input.slug {
            Some(slug) => {
                let slug = slug.trim().to_string();
                if slug.is_empty() {
                    return Err(TopicServiceError::ValidationError(
                        "Topic slug cannot be empty".to_string(),
                    ));
                }
                slug
            }
            None => generate_slug(title),
        };
        if slug.is_empty() {
            return Err(TopicServiceError::ValidationError(format!(
                "Cannot derive a slug from title: {}",
                title
            )));
        }

        if self
            .repo
            .exists_by_slug(&slug)
            .await
            .context("Failed to check existing slug")?
        {
            return Err(TopicServiceError::DuplicateSlug(slug));
        }

        let created = self
            .repo
            .create(&slug, input)
            .await
            .context("Failed to create topic")?;

        Ok(created)
    }

    /// Get topic by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Topic>, TopicServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get topic by ID")
            .map_err(Into::into)
    }

    /// Get topic by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Topic>, TopicServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get topic by slug")
            .map_err(Into::into)
    }

    /// List topics with pagination, newest first
    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<Topic>, TopicServiceError> {
        let topics = self
            .repo
            .list(params)
            .await
            .context("Failed to list topics")?;
        let total = self.repo.count().await.context("Failed to count topics")?;

        Ok(PagedResult::new(topics, total, params))
    }

    /// Update a topic
    pub async fn update(
        &self,
        id: i64,
        input: &UpdateTopicInput,
    ) -> Result<Topic, TopicServiceError> {
        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(TopicServiceError::ValidationError(
                    "Topic title cannot be empty".to_string(),
                ));
            }
        }

        self.repo
            .update(id, input)
            .await
            .context("Failed to update topic")?
            .ok_or_else(|| TopicServiceError::NotFound(format!("Topic with ID {} not found", id)))
    }

    /// Delete a topic
    ///
    /// All content items under the topic are removed with it via CASCADE.
    pub async fn delete(&self, id: i64) -> Result<(), TopicServiceError> {
        let topic = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get topic")?
            .ok_or_else(|| {
                TopicServiceError::NotFound(format!("Topic with ID {} not found", id))
            })?;

        self.repo
            .delete(topic.id)
            .await
            .context("Failed to delete topic")?;

        Ok(())
    }
}

/// Generate a URL-friendly slug from a title
///
/// Lowercases, keeps alphanumerics and non-ASCII characters, collapses
/// everything else into single hyphens.
pub fn generate_slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || !c.is_ascii() {
                c
            } else {
                '-'
            }
        })
        .collect();

    let mut result = String::new();
    let mut prev_hyphen = false;

    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}
