//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use crate::context::AppContext;
use crate::tools::{
    asset_get::{AssetGetParams, asset_impl},
    catalog::reload_impl,
    offline::{status_impl, update_impl},
    phrase_card::{PhraseCardParams, card_impl},
    phrase_export::export_impl,
    phrase_search::{PhraseSearchParams, categories_impl, more_impl, search_impl},
    phrase_select::{PhraseSelectParams, PhraseSelectionParams, select_impl, selection_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for eikan.
#[derive(Clone)]
pub struct EikanServer {
    tool_router: ToolRouter<Self>,
    ctx: Arc<AppContext>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl EikanServer {
    /// Create a new server handler over a shared context.
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { tool_router: Self::tool_router(), ctx }
    }

    #[tool(
        description = "Search the phrasebook. Matches Japanese, English and keywords (hiragana also finds katakana). Optionally switch category first. Returns the card grid view."
    )]
    async fn phrase_search(&self, params: Parameters<PhraseSearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Show more cards in the category view.")]
    async fn phrase_more(&self) -> Result<CallToolResult, McpError> {
        more_impl(&self.ctx).await
    }

    #[tool(description = "List categories with entry counts and the active category.")]
    async fn phrase_categories(&self) -> Result<CallToolResult, McpError> {
        categories_impl(&self.ctx).await
    }

    #[tool(
        description = "Run a card action: fullscreen, copy, print, save_image, report or select. The card is addressed by its Japanese text."
    )]
    async fn phrase_card(&self, params: Parameters<PhraseCardParams>) -> Result<CallToolResult, McpError> {
        card_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Toggle or set a card's batch-export checkbox. Returns the selection in order.")]
    async fn phrase_select(&self, params: Parameters<PhraseSelectParams>) -> Result<CallToolResult, McpError> {
        select_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Show the current selection, or leave select mode with clear=true.")]
    async fn phrase_selection(&self, params: Parameters<PhraseSelectionParams>) -> Result<CallToolResult, McpError> {
        selection_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Export the selected cards as one A4 landscape PDF and leave select mode.")]
    async fn phrase_export(&self) -> Result<CallToolResult, McpError> {
        export_impl(&self.ctx).await
    }

    #[tool(description = "Reload every category file. A failed load keeps the previous phrases.")]
    async fn catalog_reload(&self) -> Result<CallToolResult, McpError> {
        reload_impl(&self.ctx).await
    }

    #[tool(description = "Show the offline cache state: worker state, active version and partitions.")]
    async fn offline_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.ctx).await
    }

    #[tool(description = "Install and activate the configured cache version, deleting older generations.")]
    async fn offline_update(&self) -> Result<CallToolResult, McpError> {
        update_impl(&self.ctx).await
    }

    #[tool(description = "Fetch an app asset through the offline cache and report where it was served from.")]
    async fn asset_get(&self, params: Parameters<AssetGetParams>) -> Result<CallToolResult, McpError> {
        asset_impl(&self.ctx, params.0).await
    }
}

impl ServerHandler for EikanServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "eikan".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::context;

    #[tokio::test]
    async fn test_lists_every_tool() {
        let server = EikanServer::new(context().await);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "asset_get",
                "catalog_reload",
                "offline_status",
                "offline_update",
                "phrase_card",
                "phrase_categories",
                "phrase_export",
                "phrase_more",
                "phrase_search",
                "phrase_select",
                "phrase_selection",
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = EikanServer::new(context().await);
        assert_eq!(server.get_info().server_info.name, "eikan");
    }
}
