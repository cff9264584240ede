//! Image and PDF export of phrase cards.
//!
//! Every page is rasterised from the same A4 landscape template. A batch
//! PDF is assembled from one raster per selected card, produced strictly
//! one after the other.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eikan_core::Error;
use eikan_core::PrintPage;
use eikan_core::export::{A4_LANDSCAPE_PX, RASTER_SCALE, document, image_filename, pdf_filename, print_document, raster_section};

use crate::render::PageRenderer;

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Where an artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SavedExport {
    pub path: PathBuf,
    pub mime: String,
    pub bytes: usize,
}

impl ExportArtifact {
    /// Write the artifact into `dir`, creating the directory if needed.
    pub async fn save(&self, dir: &Path) -> Result<SavedExport, Error> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::ExportFailed(format!("cannot create {}: {e}", dir.display())))?;

        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.bytes)
            .await
            .map_err(|e| Error::ExportFailed(format!("cannot write {}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "export saved");
        Ok(SavedExport { path, mime: self.mime.to_string(), bytes: self.bytes.len() })
    }
}

/// Renders cards through a [`PageRenderer`].
pub struct Exporter {
    renderer: Arc<dyn PageRenderer>,
    brand: String,
    brand_label: String,
}

impl Exporter {
    pub fn new(renderer: Arc<dyn PageRenderer>, brand: impl Into<String>, brand_label: impl Into<String>) -> Self {
        Self { renderer, brand: brand.into(), brand_label: brand_label.into() }
    }

    async fn rasterise(&self, page: &PrintPage) -> Result<Vec<u8>, Error> {
        let html = print_document(page, &self.brand_label);
        let png = self.renderer.render_png(&html, A4_LANDSCAPE_PX, RASTER_SCALE).await?;
        Ok(png)
    }

    /// One card as `<brand>_<jp>.png`.
    pub async fn export_image(&self, page: &PrintPage) -> Result<ExportArtifact, Error> {
        let bytes = self.rasterise(page).await?;
        Ok(ExportArtifact { filename: image_filename(&self.brand, &page.jp), mime: "image/png", bytes })
    }

    /// All pages, in order, as one `<brand>_<timestamp>.pdf`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty page list, `ExportFailed` as soon as one
    /// page fails to render; no partial document is produced.
    pub async fn export_pdf(&self, pages: &[PrintPage], at: DateTime<Utc>) -> Result<ExportArtifact, Error> {
        if pages.is_empty() {
            return Err(Error::InvalidInput("no cards selected".into()));
        }

        let mut sections = String::new();
        for (index, page) in pages.iter().enumerate() {
            let png = self.rasterise(page).await?;
            sections.push_str(&raster_section(&BASE64.encode(&png)));
            sections.push('\n');
            tracing::debug!(page = index + 1, total = pages.len(), "page rasterised");
        }

        let bytes = self.renderer.render_pdf(&document(&sections)).await?;
        Ok(ExportArtifact { filename: pdf_filename(&self.brand, &at), mime: "application/pdf", bytes })
    }
}
