//! phrase_search, phrase_more and phrase_categories tool implementations.
//!
//! Drive the grid: search text, active category and "show more" paging.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use eikan_core::Action;
use eikan_core::phrase::ALL_CATEGORIES;

use super::json_result;
use crate::context::AppContext;

/// Input parameters for phrase_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhraseSearchParams {
    /// Search text. Words are matched against the Japanese text, the
    /// English text and the keywords; hiragana also matches katakana.
    /// Empty shows the category view.
    #[serde(default)]
    pub query: String,

    /// Category to switch to before searching ("All" or a category id).
    #[serde(default)]
    pub category: Option<String>,
}

/// Implementation of the phrase_search tool.
pub async fn search_impl(ctx: &AppContext, params: PhraseSearchParams) -> Result<CallToolResult, McpError> {
    let mut state = ctx.state.lock().await;
    if let Some(category) = params.category {
        state.apply(Action::SelectCategory { category })?;
    }
    state.apply(Action::Search { query: params.query })?;
    json_result(&state.render())
}

/// Implementation of the phrase_more tool.
pub async fn more_impl(ctx: &AppContext) -> Result<CallToolResult, McpError> {
    let mut state = ctx.state.lock().await;
    state.apply(Action::ShowMore)?;
    json_result(&state.render())
}

/// One category button.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryInfo {
    pub id: String,
    pub entries: usize,
}

/// Output structure for phrase_categories tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhraseCategoriesOutput {
    /// The active category.
    pub active: String,
    /// "All" first, then every loaded category in load order.
    pub categories: Vec<CategoryInfo>,
}

/// Implementation of the phrase_categories tool.
pub async fn categories_impl(ctx: &AppContext) -> Result<CallToolResult, McpError> {
    let state = ctx.state.lock().await;
    let mut categories = Vec::new();
    if let Some(catalog) = state.catalog() {
        categories.push(CategoryInfo { id: ALL_CATEGORIES.to_string(), entries: catalog.len() });
        categories.extend(
            catalog
                .category_counts()
                .into_iter()
                .map(|(id, entries)| CategoryInfo { id, entries }),
        );
    }

    json_result(&PhraseCategoriesOutput { active: state.category().to_string(), categories })
}
