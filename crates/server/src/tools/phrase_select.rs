//! phrase_select and phrase_selection tool implementations.
//!
//! Batch-select mode: cards are collected in selection order for a
//! combined PDF export.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use eikan_core::{Action, AppState, PrintPage};

use super::json_result;
use crate::context::AppContext;

/// Input parameters for phrase_select tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhraseSelectParams {
    /// Japanese text of the card.
    pub jp: String,

    /// Set the checkbox explicitly; toggles when omitted.
    #[serde(default)]
    pub selected: Option<bool>,
}

/// Input parameters for phrase_selection tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PhraseSelectionParams {
    /// Leave select mode, dropping every selected card.
    #[serde(default)]
    pub clear: bool,
}

/// The current selection, in selection order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectionOutput {
    pub count: usize,
    pub pages: Vec<PrintPage>,
}

impl SelectionOutput {
    fn of(state: &AppState) -> Self {
        Self { count: state.selection().len(), pages: state.selection().pages().to_vec() }
    }
}

/// Implementation of the phrase_select tool.
pub async fn select_impl(ctx: &AppContext, params: PhraseSelectParams) -> Result<CallToolResult, McpError> {
    let mut state = ctx.state.lock().await;
    let action = match params.selected {
        Some(selected) => Action::SetSelection { jp: params.jp, selected },
        None => Action::ToggleSelection { jp: params.jp },
    };
    state.apply(action)?;
    json_result(&SelectionOutput::of(&state))
}

/// Implementation of the phrase_selection tool.
pub async fn selection_impl(ctx: &AppContext, params: PhraseSelectionParams) -> Result<CallToolResult, McpError> {
    let mut state = ctx.state.lock().await;
    if params.clear {
        state.apply(Action::ExitSelectMode)?;
    }
    json_result(&SelectionOutput::of(&state))
}
