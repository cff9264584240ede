//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use crate::phrase::ALL_CATEGORIES;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty app name, cache version or
    /// category list, and `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - a category is duplicated, contains a path separator, or is "All"
    /// - `offline_page` is not part of `shell_assets`
    /// - `max_bytes`, `timeout_ms` or `search_debounce_ms` are out of range
    /// - a page size or increment is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Missing { field: "app_name".into(), hint: "Set EIKAN_APP_NAME".into() });
        }
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set EIKAN_CACHE_VERSION".into(),
            });
        }

        let origin = url::Url::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }

        if self.categories.is_empty() {
            return Err(ConfigError::Missing {
                field: "categories".into(),
                hint: "List at least one category data file".into(),
            });
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.is_empty() || category.contains('/') || category.contains('\\') {
                return Err(invalid("categories", format!("invalid category id {category:?}")));
            }
            if category == ALL_CATEGORIES {
                return Err(invalid("categories", "\"All\" is reserved for the unfiltered view"));
            }
            if !seen.insert(category.as_str()) {
                return Err(invalid("categories", format!("duplicate category {category:?}")));
            }
        }

        if !self.shell_assets.contains(&self.offline_page) {
            return Err(invalid("offline_page", "must be listed in shell_assets so it is pre-cached"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if !(50..=2_000).contains(&self.search_debounce_ms) {
            return Err(invalid("search_debounce_ms", "must be between 50 and 2000"));
        }

        if self.page_size_narrow == 0 || self.page_size_wide == 0 {
            return Err(invalid("page_size", "must be greater than 0"));
        }
        if self.page_increment == 0 {
            return Err(invalid("page_increment", "must be greater than 0"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.brand.contains('/') || self.brand.contains('\\') {
            return Err(invalid("brand", "must not contain path separators"));
        }

        if self.page_size_narrow > self.page_size_wide {
            tracing::warn!(
                narrow = self.page_size_narrow,
                wide = self.page_size_wide,
                "narrow viewport page size exceeds the wide one"
            );
        }

        Ok(())
    }
}
