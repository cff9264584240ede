//! Headless browser rendering of printable pages.
//!
//! This module provides a renderer trait used by export and a feature-gated
//! implementation using chromiumoxide for headless Chrome/Chromium control.

#[cfg(feature = "render")]
use std::time::Duration;
use thiserror::Error;

use eikan_core::Error as CoreError;

/// Errors that can occur during page rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to load the page markup.
    #[error("content load failed: {0}")]
    Content(String),

    /// Failed to capture a screenshot or print a document.
    #[error("capture failed: {0}")]
    Capture(String),

    /// Timeout waiting for the browser.
    #[error("render timeout after {0}ms")]
    Timeout(u64),
}

impl From<RenderError> for CoreError {
    fn from(err: RenderError) -> Self {
        CoreError::ExportFailed(err.to_string())
    }
}

/// Turns standalone HTML documents into images and PDFs.
#[async_trait::async_trait]
pub trait PageRenderer: Send + Sync {
    /// Rasterise `html` at `viewport` CSS pixels and the given device scale.
    async fn render_png(&self, html: &str, viewport: (u32, u32), scale: f64) -> Result<Vec<u8>, RenderError>;

    /// Print `html` to PDF, honouring its `@page` rules.
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Headless Chrome/Chromium renderer using chromiumoxide.
#[cfg(feature = "render")]
pub struct HeadlessRenderer {
    browser: chromiumoxide::Browser,
    timeout: Duration,
}

#[cfg(feature = "render")]
impl HeadlessRenderer {
    /// Create a new headless renderer by launching a browser instance.
    ///
    /// The browser uses a background task to handle Chrome DevTools
    /// Protocol events.
    pub async fn new(timeout: Duration) -> Result<Self, RenderError> {
        use chromiumoxide::browser::{Browser, BrowserConfig};
        use futures_util::StreamExt;

        let (browser, mut handler) =
            Browser::launch(BrowserConfig::builder().build().map_err(RenderError::BrowserLaunch)?)
                .await
                .map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        Ok(Self { browser, timeout })
    }

    async fn blank_page(&self) -> Result<chromiumoxide::Page, RenderError> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Content(e.to_string()))
    }

    async fn close(page: chromiumoxide::Page) {
        if let Err(e) = page.close().await {
            tracing::debug!("failed to close page: {e}");
        }
    }

    async fn with_timeout<T>(
        &self, work: impl std::future::Future<Output = Result<T, RenderError>>,
    ) -> Result<T, RenderError> {
        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| RenderError::Timeout(self.timeout.as_millis() as u64))?
    }
}

#[cfg(feature = "render")]
#[async_trait::async_trait]
impl PageRenderer for HeadlessRenderer {
    async fn render_png(&self, html: &str, viewport: (u32, u32), scale: f64) -> Result<Vec<u8>, RenderError> {
        use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
        use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
        use chromiumoxide::page::ScreenshotParams;

        let page = self.blank_page().await?;
        let png = self
            .with_timeout(async {
                page.set_content(html).await.map_err(|e| RenderError::Content(e.to_string()))?;
                page.execute(SetDeviceMetricsOverrideParams::new(
                    i64::from(viewport.0),
                    i64::from(viewport.1),
                    scale,
                    false,
                ))
                .await
                .map_err(|e| RenderError::Capture(e.to_string()))?;

                page.screenshot(ScreenshotParams::builder().format(CaptureScreenshotFormat::Png).build())
                    .await
                    .map_err(|e| RenderError::Capture(e.to_string()))
            })
            .await;
        Self::close(page).await;
        png
    }

    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;

        let page = self.blank_page().await?;
        let pdf = self
            .with_timeout(async {
                page.set_content(html).await.map_err(|e| RenderError::Content(e.to_string()))?;
                let params = PrintToPdfParams {
                    landscape: Some(true),
                    print_background: Some(true),
                    prefer_css_page_size: Some(true),
                    ..Default::default()
                };
                page.pdf(params).await.map_err(|e| RenderError::Capture(e.to_string()))
            })
            .await;
        Self::close(page).await;
        pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_maps_to_export_failed() {
        let err: CoreError = RenderError::Timeout(1500).into();
        assert!(matches!(&err, CoreError::ExportFailed(msg) if msg.contains("1500ms")));
        assert!(err.to_string().starts_with("EXPORT_FAILED"));
    }

    #[cfg(feature = "render")]
    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_headless_renderer_new() {
        let renderer = HeadlessRenderer::new(Duration::from_secs(30)).await;
        assert!(renderer.is_ok());
    }

    #[cfg(feature = "render")]
    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_render_page_png() {
        let renderer = HeadlessRenderer::new(Duration::from_secs(30)).await.unwrap();
        let html = eikan_core::export::print_document(
            &eikan_core::PrintPage { jp: "出口".into(), en: "Exit".into() },
            "EIKAN",
        );
        let png = renderer.render_png(&html, (1123, 794), 2.0).await.unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[cfg(feature = "render")]
    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_timed_out_render_closes_its_page() {
        let renderer = HeadlessRenderer::new(Duration::from_millis(1)).await.unwrap();
        let before = renderer.browser.pages().await.unwrap().len();

        let result = renderer.render_pdf("<p>出口</p>").await;
        assert!(matches!(result, Err(RenderError::Timeout(1))));
        assert_eq!(renderer.browser.pages().await.unwrap().len(), before);
    }
}
