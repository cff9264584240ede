//! phrase_card tool implementation.
//!
//! Runs one of a card's actions: fullscreen, copy, print, save_image,
//! report or select.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use eikan_client::SavedExport;
use eikan_core::export::{Fullscreen, print_document, report_url};
use eikan_core::session::CardAction;
use eikan_core::{Action, Error, PhraseEntry, PrintPage};

use super::json_result;
use crate::context::AppContext;

/// Input parameters for phrase_card tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhraseCardParams {
    /// Japanese text of the card.
    pub jp: String,

    /// The action to run.
    pub action: CardAction,
}

/// Output structure for phrase_card tool, one shape per action.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PhraseCardOutput {
    Fullscreen(Fullscreen),
    Copy { text: String },
    Print { html: String },
    SaveImage(SavedExport),
    Report { url: String },
    Select { selected: bool, count: usize },
}

/// Implementation of the phrase_card tool.
pub async fn card_impl(ctx: &AppContext, params: PhraseCardParams) -> Result<CallToolResult, McpError> {
    let entry = lookup(ctx, &params.jp).await?;
    let page = PrintPage::from(&entry);

    let output = match params.action {
        CardAction::Fullscreen => PhraseCardOutput::Fullscreen(Fullscreen::new(&page)),
        CardAction::Copy => PhraseCardOutput::Copy { text: entry.en.clone() },
        CardAction::Print => PhraseCardOutput::Print { html: print_document(&page, &ctx.config.brand_label) },
        CardAction::SaveImage => {
            let artifact = ctx.exporter().await?.export_image(&page).await?;
            PhraseCardOutput::SaveImage(artifact.save(&ctx.config.export_dir).await?)
        }
        CardAction::Report => {
            let url = report_url(&ctx.config.report_form_url, &ctx.config.report_field, &entry)?;
            PhraseCardOutput::Report { url: url.to_string() }
        }
        CardAction::Select => {
            let mut state = ctx.state.lock().await;
            state.apply(Action::ToggleSelection { jp: entry.jp.clone() })?;
            PhraseCardOutput::Select {
                selected: state.selection().contains(&entry.jp),
                count: state.selection().len(),
            }
        }
    };

    json_result(&output)
}

async fn lookup(ctx: &AppContext, jp: &str) -> Result<PhraseEntry, Error> {
    let state = ctx.state.lock().await;
    let catalog = state
        .catalog()
        .ok_or_else(|| Error::InvalidInput("catalog is not loaded".into()))?;
    catalog.get(jp).cloned().ok_or_else(|| Error::PhraseNotFound(jp.to_string()))
}
