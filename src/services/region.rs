//! Region service
//!
//! Business logic for the region catalog and for resolving which region a
//! content item is shown in. Items either pin a region manually or carry a
//! JSON rule set (`{"codes": [...], "min_level": n}`) that is matched against
//! the catalog; the first code that exists wins. Items that resolve to no
//! region are global.

use crate::db::repositories::RegionRepository;
use crate::models::{
    ContentItem, CreateRegionInput, JsonField, Region, RegionMode, UpdateRegionInput,
};
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Error types for region service operations
#[derive(Debug, thiserror::Error)]
pub enum RegionServiceError {
    /// Region not found
    #[error("Region not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Region code already exists
    #[error("Region code already exists: {0}")]
    DuplicateCode(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Auto-resolution rules stored in a content item's `region_auto` column
///
/// Unknown JSON keys are ignored so editors can carry extra hints without
/// breaking resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionAutoRules {
    /// Region codes to try, in priority order
    #[serde(default)]
    pub codes: Vec<String>,
    /// Minimum catalog level a candidate region must have
    #[serde(default)]
    pub min_level: Option<i32>,
}

impl RegionAutoRules {
    /// Parse rules from a JSON column value
    ///
    /// Database NULL and JSON null both mean "no rules", which resolves to
    /// the global audience.
    pub fn from_field(field: &JsonField) -> Result<Option<Self>, RegionServiceError> {
        match field {
            JsonField::DbNull | JsonField::JsonNull => Ok(None),
            JsonField::Value(value) => {
                let rules: RegionAutoRules = serde_json::from_value(value.clone())
                    .map_err(|e| {
                        RegionServiceError::ValidationError(format!(
                            "Invalid region_auto rules: {}",
                            e
                        ))
                    })?;
                Ok(Some(rules))
            }
        }
    }
}

/// Region service for the region catalog and item resolution
pub struct RegionService {
    repo: Arc<dyn RegionRepository>,
}

impl RegionService {
    /// Create a new region service
    pub fn new(repo: Arc<dyn RegionRepository>) -> Self {
        Self { repo }
    }

    /// Create a region
    ///
    /// Codes are normalized to trimmed uppercase and must be unique.
    /// Levels are non-negative, 0 being the coarsest (country).
    pub async fn create(&self, input: &CreateRegionInput) -> Result<Region, RegionServiceError> {
        let code = normalize_code(&input.code);
        if code.is_empty() {
            return Err(RegionServiceError::ValidationError(
                "Region code cannot be empty".to_string(),
            ));
        }
        if input.name.trim().is_empty() {
            return Err(RegionServiceError::ValidationError(
                "Region name cannot be empty".to_string(),
            ));
        }
        if input.level < 0 {
            return Err(RegionServiceError::ValidationError(
                "Region level cannot be negative".to_string(),
            ));
        }

        if self
            .repo
            .get_by_code(&code)
            .await
            .context("Failed to check existing region")?
            .is_some()
        {
            return Err(RegionServiceError::DuplicateCode(code));
        }

        let normalized = CreateRegionInput {
            code,
            name: input.name.trim().to_string(),
            level: input.level,
        };
        let created = self
            .repo
            .create(&normalized)
            .await
            .context("Failed to create region")?;

        Ok(created)
    }

    /// Get region by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Region>, RegionServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get region by ID")
            .map_err(Into::into)
    }

    /// Get region by code (normalized before lookup)
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Region>, RegionServiceError> {
        self.repo
            .get_by_code(&normalize_code(code))
            .await
            .context("Failed to get region by code")
            .map_err(Into::into)
    }

    /// List all regions ordered by level, then code
    pub async fn list(&self) -> Result<Vec<Region>, RegionServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list regions")
            .map_err(Into::into)
    }

    /// Update a region's name or level
    pub async fn update(
        &self,
        id: i64,
        input: &UpdateRegionInput,
    ) -> Result<Region, RegionServiceError> {
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(RegionServiceError::ValidationError(
                    "Region name cannot be empty".to_string(),
                ));
            }
        }
        if let Some(level) = input.level {
            if level < 0 {
                return Err(RegionServiceError::ValidationError(
                    "Region level cannot be negative".to_string(),
                ));
            }
        }

        self.repo
            .update(id, input)
            .await
            .context("Failed to update region")?
            .ok_or_else(|| RegionServiceError::NotFound(format!("Region with ID {} not found", id)))
    }

    /// Delete a region
    ///
    /// Items pointing at it keep working; their manual and effective region
    /// columns fall back to NULL via the foreign keys.
    pub async fn delete(&self, id: i64) -> Result<(), RegionServiceError> {
        let region = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get region")?
            .ok_or_else(|| {
                RegionServiceError::NotFound(format!("Region with ID {} not found", id))
            })?;

        self.repo
            .delete(region.id)
            .await
            .context("Failed to delete region")?;

        Ok(())
    }

    /// Resolve the effective region for a content item
    ///
    /// Manual mode takes the pinned region as-is. Auto mode walks the item's
    /// rule codes in order and returns the first region that exists in the
    /// catalog and clears the min_level bar. No match means global (None).
    pub async fn resolve(&self, item: &ContentItem) -> Result<Option<i64>, RegionServiceError> {
        match item.region_mode {
            RegionMode::Manual => Ok(item.manual_region_id),
            RegionMode::Auto => {
                let Some(rules) = RegionAutoRules::from_field(&item.region_auto)? else {
                    return Ok(None);
                };

                for code in &rules.codes {
                    let code = normalize_code(code);
                    if code.is_empty() {
                        continue;
                    }
                    if let Some(region) = self
                        .repo
                        .get_by_code(&code)
                        .await
                        .context("Failed to look up region code")?
                    {
                        if let Some(min_level) = rules.min_level {
                            if region.level < min_level {
                                debug!(
                                    code = %region.code,
                                    level = region.level,
                                    min_level,
                                    "Region below min_level, skipping"
                                );
                                continue;
                            }
                        }
                        return Ok(Some(region.id));
                    }
                }

                Ok(None)
            }
        }
    }
}

/// Normalize a region code for storage and lookup
fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxRegionRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{ContentKind, CreateContentItemInput, Locale};
    use serde_json::json;

    async fn setup_test_service() -> (DynDatabasePool, RegionService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let repo = SqlxRegionRepository::boxed(pool.clone());
        (pool, RegionService::new(repo))
    }

    fn auto_item(region_auto: JsonField) -> ContentItem {
        let mut input = CreateContentItemInput::new(ContentKind::Swipe, Locale::De, 1, "x");
        input.region_auto = region_auto;
        ContentItem {
            id: 1,
            kind: input.kind,
            locale: input.locale,
            topic_id: input.topic_id,
            text: input.text,
            rich_text: None,
            status: Default::default(),
            publish_at: None,
            expire_at: None,
            region_mode: RegionMode::Auto,
            manual_region_id: None,
            effective_region_id: None,
            region_auto: input.region_auto,
            validation: JsonField::DbNull,
            meta: JsonField::DbNull,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_code() {
        let (_pool, service) = setup_test_service().await;

        let region = service
            .create(&CreateRegionInput::new("  de ", "Germany", 0))
            .await
            .expect("Failed to create region");

        assert_eq!(region.code, "DE");
        assert_eq!(region.name, "Germany");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_code() {
        let (_pool, service) = setup_test_service().await;

        let result = service.create(&CreateRegionInput::new("   ", "X", 0)).await;
        assert!(matches!(result, Err(RegionServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_level() {
        let (_pool, service) = setup_test_service().await;

        let result = service.create(&CreateRegionInput::new("DE", "Germany", -1)).await;
        assert!(matches!(result, Err(RegionServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_code_rejected() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(&CreateRegionInput::new("DE", "Germany", 0))
            .await
            .expect("create");
        let result = service.create(&CreateRegionInput::new("de", "Duplicate", 0)).await;

        assert!(matches!(result, Err(RegionServiceError::DuplicateCode(_))));
    }

    #[tokio::test]
    async fn test_get_by_code_case_insensitive() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(&CreateRegionInput::new("DE-BY", "Bavaria", 1))
            .await
            .expect("create");

        let found = service
            .get_by_code("de-by")
            .await
            .expect("Failed to get region")
            .expect("Region not found");
        assert_eq!(found.name, "Bavaria");
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .update(
                99999,
                &UpdateRegionInput {
                    name: Some("X".to_string()),
                    level: None,
                },
            )
            .await;
        assert!(matches!(result, Err(RegionServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.delete(99999).await;
        assert!(matches!(result, Err(RegionServiceError::NotFound(_))));
    }

    // ========================================================================
    // Resolution tests
    // ========================================================================

    #[tokio::test]
    async fn test_resolve_manual_mode_uses_pinned_region() {
        let (_pool, service) = setup_test_service().await;

        let mut item = auto_item(JsonField::DbNull);
        item.region_mode = RegionMode::Manual;
        item.manual_region_id = Some(42);

        let resolved = service.resolve(&item).await.expect("Failed to resolve");
        assert_eq!(resolved, Some(42));
    }

    #[tokio::test]
    async fn test_resolve_manual_mode_without_region_is_global() {
        let (_pool, service) = setup_test_service().await;

        let mut item = auto_item(JsonField::DbNull);
        item.region_mode = RegionMode::Manual;

        let resolved = service.resolve(&item).await.expect("Failed to resolve");
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_resolve_auto_first_existing_code_wins() {
        let (_pool, service) = setup_test_service().await;

        let at = service
            .create(&CreateRegionInput::new("AT", "Austria", 0))
            .await
            .expect("create");
        service
            .create(&CreateRegionInput::new("CH", "Switzerland", 0))
            .await
            .expect("create");

        let item = auto_item(JsonField::Value(json!({"codes": ["XX", "AT", "CH"]})));
        let resolved = service.resolve(&item).await.expect("Failed to resolve");

        assert_eq!(resolved, Some(at.id));
    }

    #[tokio::test]
    async fn test_resolve_auto_respects_min_level() {
        let (_pool, service) = setup_test_service().await;

        service
            .create(&CreateRegionInput::new("DE", "Germany", 0))
            .await
            .expect("create");
        let bavaria = service
            .create(&CreateRegionInput::new("DE-BY", "Bavaria", 1))
            .await
            .expect("create");

        let item = auto_item(JsonField::Value(
            json!({"codes": ["DE", "DE-BY"], "min_level": 1}),
        ));
        let resolved = service.resolve(&item).await.expect("Failed to resolve");

        assert_eq!(resolved, Some(bavaria.id));
    }

    #[tokio::test]
    async fn test_resolve_auto_null_rules_is_global() {
        let (_pool, service) = setup_test_service().await;

        let resolved = service
            .resolve(&auto_item(JsonField::DbNull))
            .await
            .expect("Failed to resolve");
        assert_eq!(resolved, None);

        let resolved = service
            .resolve(&auto_item(JsonField::JsonNull))
            .await
            .expect("Failed to resolve");
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_resolve_auto_no_match_is_global() {
        let (_pool, service) = setup_test_service().await;

        let item = auto_item(JsonField::Value(json!({"codes": ["XX", "YY"]})));
        let resolved = service.resolve(&item).await.expect("Failed to resolve");
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_resolve_auto_malformed_rules_rejected() {
        let (_pool, service) = setup_test_service().await;

        let item = auto_item(JsonField::Value(json!({"codes": "not-an-array"})));
        let result = service.resolve(&item).await;
        assert!(matches!(result, Err(RegionServiceError::ValidationError(_))));
    }

    #[test]
    fn test_rules_ignore_unknown_keys() {
        let field = JsonField::Value(json!({"codes": ["DE"], "editor_note": "keep"}));
        let rules = RegionAutoRules::from_field(&field)
            .expect("Failed to parse rules")
            .expect("Rules missing");
        assert_eq!(rules.codes, vec!["DE"]);
        assert!(rules.min_level.is_none());
    }
}
