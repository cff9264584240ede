//! Catalog loading from the per-category data files.

use std::sync::Arc;

use futures_util::future::try_join_all;
use reqwest::Url;

use eikan_core::{AppConfig, Catalog, Error, PhraseEntry};

use crate::fetch::{AssetRequest, Destination, Fetcher, resolve};

/// Loads every category file of the app and assembles a [`Catalog`].
pub struct CatalogLoader {
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
}

impl CatalogLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, origin: Url) -> Self {
        Self { fetcher, origin }
    }

    /// Fetch all category files in parallel and build one catalog.
    ///
    /// # Errors
    ///
    /// `Error::LoadFailed` if any single file fails to fetch, answers with a
    /// non-2xx status or doesn't parse; no partial catalog is produced.
    pub async fn load(&self, categories: &[String]) -> Result<Catalog, Error> {
        let lists = try_join_all(categories.iter().map(|category| self.load_category(category))).await?;
        let catalog = Catalog::from_categories(lists)?;
        tracing::info!(entries = catalog.len(), categories = categories.len(), "catalog loaded");
        Ok(catalog)
    }

    async fn load_category(&self, category: &str) -> Result<(String, Vec<PhraseEntry>), Error> {
        let url = resolve(&self.origin, &AppConfig::category_path(category))
            .map_err(|e| Error::LoadFailed(format!("{category}: {e}")))?;
        let request = AssetRequest::get(url).with_destination(Destination::Json);

        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| Error::LoadFailed(format!("{category}: {e}")))?;

        if !response.is_success() {
            return Err(Error::LoadFailed(format!(
                "{category}: {} answered {}",
                response.url,
                response.status.as_u16()
            )));
        }

        let entries: Vec<PhraseEntry> = serde_json::from_slice(&response.bytes)
            .map_err(|e| Error::LoadFailed(format!("{category}: invalid JSON: {e}")))?;

        tracing::debug!(category, entries = entries.len(), "category file parsed");
        Ok((category.to_string(), entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::MockFetcher;
    use crate::fetch::parse_origin;

    const ORIGIN: &str = "https://eikan.example/";

    fn loader(fetcher: Arc<MockFetcher>) -> CatalogLoader {
        CatalogLoader::new(fetcher, parse_origin(ORIGIN).unwrap())
    }

    fn categories(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_flattens_categories() {
        let fetcher = Arc::new(MockFetcher::default());
        fetcher.route(
            "https://eikan.example/data/menu.json",
            200,
            r#"[{"jp":"水","en":"Water","tag":"menu"},{"jp":"お茶","en":"Tea","tag":"menu","featured":true}]"#,
        );
        fetcher.route("https://eikan.example/data/sign.json", 200, r#"[{"jp":"出口","en":"Exit","tag":"sign"}]"#);

        let catalog = loader(fetcher.clone()).load(&categories(&["menu", "sign"])).await.unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.categories(), ["menu".to_string(), "sign".to_string()]);
        assert_eq!(catalog.entries()[0].jp, "お茶");
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_category_fails_whole_load() {
        let fetcher = Arc::new(MockFetcher::default());
        fetcher.route("https://eikan.example/data/menu.json", 200, r#"[{"jp":"水","en":"Water","tag":"menu"}]"#);

        let result = loader(fetcher).load(&categories(&["menu", "admin"])).await;
        assert!(matches!(result, Err(Error::LoadFailed(msg)) if msg.contains("admin") && msg.contains("404")));
    }

    #[tokio::test]
    async fn test_invalid_json_fails_load() {
        let fetcher = Arc::new(MockFetcher::default());
        fetcher.route("https://eikan.example/data/pay.json", 200, "<html>oops</html>");

        let result = loader(fetcher).load(&categories(&["pay"])).await;
        assert!(matches!(result, Err(Error::LoadFailed(msg)) if msg.contains("invalid JSON")));
    }

    #[tokio::test]
    async fn test_network_failure_fails_load() {
        let fetcher = Arc::new(MockFetcher::default());
        fetcher.set_offline(true);

        let result = loader(fetcher).load(&categories(&["hotel"])).await;
        assert!(matches!(result, Err(Error::LoadFailed(msg)) if msg.starts_with("hotel")));
    }

    #[tokio::test]
    async fn test_foreign_tag_fails_load() {
        let fetcher = Arc::new(MockFetcher::default());
        fetcher.route("https://eikan.example/data/menu.json", 200, r#"[{"jp":"水","en":"Water","tag":"drinks"}]"#);

        let result = loader(fetcher).load(&categories(&["menu"])).await;
        assert!(matches!(result, Err(Error::LoadFailed(_))));
    }
}
