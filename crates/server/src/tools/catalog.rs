//! catalog_reload tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;
use crate::context::AppContext;

/// Implementation of the catalog_reload tool.
///
/// Reloads every category file and returns the resulting view. A failed
/// load is reported as an error view, not a tool error.
pub async fn reload_impl(ctx: &AppContext) -> Result<CallToolResult, McpError> {
    let view = ctx.reload().await;
    json_result(&view)
}
