//! asset_get tool implementation.
//!
//! Requests one app asset through the offline cache controller and reports
//! where the response came from.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use eikan_client::fetch::{Destination, canonicalize, resolve};
use eikan_client::{AssetRequest, ServedFrom};
use eikan_core::Error;

use super::json_result;
use crate::context::AppContext;

/// Input parameters for asset_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetGetParams {
    /// Absolute URL, or a path relative to the app origin (e.g. "./data/menu.json").
    pub url: String,

    /// Request destination; guessed from the path when omitted.
    #[serde(default)]
    pub destination: Option<Destination>,
}

/// Output structure for asset_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetGetOutput {
    pub url: String,
    pub status: u16,
    pub source: ServedFrom,
    pub content_type: Option<String>,
    /// Body size in bytes.
    pub bytes: usize,
    /// Body as text, when it is valid UTF-8.
    pub text: Option<String>,
}

/// Implementation of the asset_get tool.
pub async fn asset_impl(ctx: &AppContext, params: AssetGetParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let url = if params.url.contains("://") {
        canonicalize(&params.url).map_err(Error::from)?
    } else {
        resolve(&ctx.controller.config().origin, &params.url).map_err(Error::from)?
    };

    let mut request = AssetRequest::get(url);
    if let Some(destination) = params.destination {
        request = request.with_destination(destination);
    }

    let served = ctx.controller.respond(&request).await?;
    let response = served.response;

    json_result(&AssetGetOutput {
        url: request.url.to_string(),
        status: response.status.as_u16(),
        source: served.source,
        content_type: response.content_type,
        bytes: response.bytes.len(),
        text: String::from_utf8(response.bytes.to_vec()).ok(),
    })
}
