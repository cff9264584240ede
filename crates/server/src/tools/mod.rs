//! MCP tool implementations.
//!
//! This module contains all tools exposed by the eikan server. Each tool is
//! an `*_impl` function over the shared [`AppContext`](crate::context::AppContext)
//! returning its output as pretty JSON text.

pub mod asset_get;
pub mod catalog;
pub mod offline;
pub mod phrase_card;
pub mod phrase_export;
pub mod phrase_search;
pub mod phrase_select;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use eikan_core::Error;

/// Serialize a tool output into a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
