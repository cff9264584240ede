//! phrase_export tool implementation.
//!
//! Exports the selected cards as one PDF, one A4 landscape page per card,
//! and unchecks the exported cards once the file is written.

use chrono::Utc;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use eikan_client::SavedExport;
use eikan_core::Error;

use super::json_result;
use crate::context::AppContext;

/// Output structure for phrase_export tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhraseExportOutput {
    /// Number of pages in the document.
    pub pages: usize,
    #[serde(flatten)]
    pub saved: SavedExport,
}

/// Implementation of the phrase_export tool.
///
/// The selection is kept if anything fails, so the export can be retried.
pub async fn export_impl(ctx: &AppContext) -> Result<CallToolResult, McpError> {
    let pages = ctx.state.lock().await.selection().pages().to_vec();
    if pages.is_empty() {
        return Err(Error::InvalidInput("no cards selected".into()).into());
    }

    let artifact = ctx.exporter().await?.export_pdf(&pages, Utc::now()).await?;
    let saved = artifact.save(&ctx.config.export_dir).await?;

    ctx.state.lock().await.selection_exported(&pages);
    tracing::info!(pages = pages.len(), path = %saved.path.display(), "selection exported");

    json_result(&PhraseExportOutput { pages: pages.len(), saved })
}
