//! Shared state behind every tool call.

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use eikan_client::{CatalogLoader, Exporter, Fetcher, OfflineConfig, OfflineController, PageRenderer};
use eikan_core::{AppConfig, AppState, CacheDb, Error, View};

/// Configuration, session state and services of one server process.
pub struct AppContext {
    pub config: AppConfig,
    pub state: Mutex<AppState>,
    pub controller: Arc<OfflineController>,
    loader: CatalogLoader,
    renderer: OnceCell<Arc<dyn PageRenderer>>,
}

impl AppContext {
    /// Wire the offline controller in front of `network` and the catalog
    /// loader behind the controller.
    pub fn new(config: AppConfig, db: CacheDb, network: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let offline = OfflineConfig::from_app_config(&config)?;
        let origin = offline.origin.clone();
        let controller = Arc::new(OfflineController::new(db, network, offline));
        let loader = CatalogLoader::new(controller.clone(), origin);

        Ok(Self {
            state: Mutex::new(AppState::new(&config)),
            config,
            controller,
            loader,
            renderer: OnceCell::new(),
        })
    }

    /// Use `renderer` for exports instead of launching a browser.
    #[cfg(test)]
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = OnceCell::from(renderer);
        self
    }

    /// Load the catalog again and render the resulting view.
    ///
    /// A failed load leaves the previous catalog in place and renders the
    /// error view; a load overtaken by a newer one is discarded.
    pub async fn reload(&self) -> View {
        let ticket = self.state.lock().await.begin_load();
        let result = self.loader.load(&self.config.categories).await;

        let mut state = self.state.lock().await;
        state.finish_load(ticket, result);
        state.render()
    }

    /// Exporter over the configured renderer, launching it on first use.
    pub async fn exporter(&self) -> Result<Exporter, Error> {
        let renderer = self.renderer.get_or_try_init(|| launch_renderer(&self.config)).await?;
        Ok(Exporter::new(renderer.clone(), self.config.brand.as_str(), self.config.brand_label.as_str()))
    }
}

#[cfg(feature = "render")]
async fn launch_renderer(config: &AppConfig) -> Result<Arc<dyn PageRenderer>, Error> {
    if !config.render_enabled {
        return Err(Error::RenderDisabled);
    }
    let renderer = eikan_client::HeadlessRenderer::new(config.timeout()).await?;
    tracing::info!("headless renderer launched");
    Ok(Arc::new(renderer))
}

#[cfg(not(feature = "render"))]
async fn launch_renderer(_config: &AppConfig) -> Result<Arc<dyn PageRenderer>, Error> {
    Err(Error::RenderDisabled)
}
