//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (EIKAN_*)
//! 2. TOML config file (if EIKAN_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::search::{SearchScope, Viewport};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (EIKAN_*)
/// 2. TOML config file (if EIKAN_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application id used as cache partition prefix.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Cache generation tag. Bumping it invalidates every older partition
    /// on the next activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin the phrasebook assets are served from.
    ///
    /// Set via EIKAN_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Category identifiers, one `data/<category>.json` file each.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// App shell paths pre-cached on install, relative to the origin.
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,

    /// Page served to document requests when the network is unreachable.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Path to SQLite cache database.
    ///
    /// Set via EIKAN_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Whether a query searches every category or only the active one.
    #[serde(default)]
    pub search_scope: SearchScope,

    /// Idle delay after the last keystroke before a search pass runs.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Viewport class used to pick the initial page size.
    #[serde(default)]
    pub viewport: Viewport,

    #[serde(default = "default_page_size_narrow")]
    pub page_size_narrow: usize,

    #[serde(default = "default_page_size_wide")]
    pub page_size_wide: usize,

    /// Items added per "show more" request.
    #[serde(default = "default_page_increment")]
    pub page_increment: usize,

    /// Maximum suggestions per source on an empty result.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Brand used in export filenames.
    #[serde(default = "default_brand")]
    pub brand: String,

    /// Footer label printed on every exported page.
    #[serde(default = "default_brand_label")]
    pub brand_label: String,

    /// Web form receiving phrase reports.
    #[serde(default = "default_report_form_url")]
    pub report_form_url: String,

    /// Query parameter of the report form carrying the phrase summary.
    #[serde(default = "default_report_field")]
    pub report_field: String,

    /// Directory exported images and documents are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Whether export through the headless browser is enabled.
    ///
    /// Set via EIKAN_RENDER_ENABLED environment variable.
    #[serde(default)]
    pub render_enabled: bool,
}

fn default_app_name() -> String {
    "eikan".into()
}

fn default_cache_version() -> String {
    "1.2.5".into()
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_categories() -> Vec<String> {
    ["menu", "sign", "pay", "hotel", "admin"].iter().map(|c| c.to_string()).collect()
}

fn default_shell_assets() -> Vec<String> {
    ["./", "./index.html", "./style.css", "./script.js", "./offline.html"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_offline_page() -> String {
    "./offline.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./eikan-cache.sqlite")
}

fn default_user_agent() -> String {
    "eikan/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_search_debounce_ms() -> u64 {
    150
}

fn default_page_size_narrow() -> usize {
    8
}

fn default_page_size_wide() -> usize {
    16
}

fn default_page_increment() -> usize {
    8
}

fn default_suggestion_limit() -> usize {
    3
}

fn default_brand() -> String {
    "Eikan".into()
}

fn default_brand_label() -> String {
    "英換 - EIKAN PROJECT".into()
}

fn default_report_form_url() -> String {
    "https://docs.google.com/forms/d/e/1FAIpQLSfpbhutXoLYXMmI6aKyk0huRF_zpWxHVUwzdPWBwE8Q79xeIQ/viewform?usp=dialog"
        .into()
}

fn default_report_field() -> String {
    "entry.1588045473".into()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./exports")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            categories: default_categories(),
            shell_assets: default_shell_assets(),
            offline_page: default_offline_page(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            search_scope: SearchScope::default(),
            search_debounce_ms: default_search_debounce_ms(),
            viewport: Viewport::default(),
            page_size_narrow: default_page_size_narrow(),
            page_size_wide: default_page_size_wide(),
            page_increment: default_page_increment(),
            suggestion_limit: default_suggestion_limit(),
            brand: default_brand(),
            brand_label: default_brand_label(),
            report_form_url: default_report_form_url(),
            report_field: default_report_field(),
            export_dir: default_export_dir(),
            render_enabled: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Search debounce delay as Duration.
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Initial page size for the configured viewport.
    pub fn initial_page_size(&self) -> usize {
        match self.viewport {
            Viewport::Narrow => self.page_size_narrow,
            Viewport::Wide => self.page_size_wide,
        }
    }

    /// Relative path of a category data file.
    pub fn category_path(category: &str) -> String {
        format!("./data/{category}.json")
    }

    /// Every path pre-cached on install: the app shell, then each category file.
    pub fn manifest(&self) -> Vec<String> {
        let mut paths = self.shell_assets.clone();
        paths.extend(self.categories.iter().map(|c| Self::category_path(c)));
        paths
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `EIKAN_`
    /// 2. TOML file from `EIKAN_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("EIKAN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("EIKAN_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./eikan-cache.sqlite"));
        assert_eq!(config.user_agent, "eikan/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.categories, vec!["menu", "sign", "pay", "hotel", "admin"]);
        assert_eq!(config.search_scope, SearchScope::Global);
        assert!(!config.render_enabled);
    }

    #[test]
    fn test_manifest_includes_shell_and_categories() {
        let config = AppConfig::default();
        let manifest = config.manifest();
        assert_eq!(manifest.len(), 10);
        assert!(manifest.contains(&"./offline.html".to_string()));
        assert!(manifest.contains(&"./data/admin.json".to_string()));
        assert_eq!(manifest.last().map(String::as_str), Some("./data/admin.json"));
    }

    #[test]
    fn test_initial_page_size_by_viewport() {
        let wide = AppConfig::default();
        assert_eq!(wide.initial_page_size(), 16);

        let narrow = AppConfig { viewport: Viewport::Narrow, ..Default::default() };
        assert_eq!(narrow.initial_page_size(), 8);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.search_debounce(), Duration::from_millis(150));
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("EIKAN_CACHE_VERSION", "2.0.0");
            jail.set_env("EIKAN_SEARCH_SCOPE", "within_category");
            jail.set_env("EIKAN_VIEWPORT", "narrow");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_version, "2.0.0");
            assert_eq!(config.search_scope, SearchScope::WithinCategory);
            assert_eq!(config.viewport, Viewport::Narrow);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("eikan.toml", "categories = [\"menu\", \"pay\"]\nbrand = \"Test\"")?;
            jail.set_env("EIKAN_CONFIG_FILE", "eikan.toml");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.categories, vec!["menu", "pay"]);
            assert_eq!(config.brand, "Test");
            Ok(())
        });
    }
}
