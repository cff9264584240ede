//! offline_status and offline_update tool implementations.
//!
//! Inspect and roll the versioned asset cache.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;
use crate::context::AppContext;

/// Implementation of the offline_status tool.
pub async fn status_impl(ctx: &AppContext) -> Result<CallToolResult, McpError> {
    let status = ctx.controller.status().await?;
    json_result(&status)
}

/// Implementation of the offline_update tool.
///
/// Installs the configured cache version and activates it right away,
/// deleting older generations. On failure the previous generation keeps
/// serving.
pub async fn update_impl(ctx: &AppContext) -> Result<CallToolResult, McpError> {
    let report = ctx.controller.register().await?;
    json_result(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{config, context_with, network, output};
    use eikan_client::{OfflineStatus, UpdateReport, WorkerState};

    #[tokio::test]
    async fn test_update_then_status() {
        let ctx = context_with(config("eikan-offline"), network()).await;

        let before: OfflineStatus = output(&status_impl(&ctx).await.unwrap());
        assert_eq!(before.state, WorkerState::Parsed);
        assert!(before.registration.is_none());

        let report: UpdateReport = output(&update_impl(&ctx).await.unwrap());
        assert_eq!(report.version, "1.2.5");
        assert_eq!(report.cached, 7);

        let after: OfflineStatus = output(&status_impl(&ctx).await.unwrap());
        assert_eq!(after.state, WorkerState::Activated);
        let seeded = after.partitions.iter().find(|p| p.name == "eikan-static-1.2.5").unwrap();
        assert_eq!(seeded.entries, 7);
    }

    #[tokio::test]
    async fn test_update_fails_on_missing_asset() {
        let mut cfg = config("eikan-offline");
        cfg.categories.push("admin".into());
        let ctx = context_with(cfg, network()).await;

        let err = update_impl(&ctx).await.unwrap_err();
        assert_eq!(err.code.0, -32021);
        assert!(err.message.contains("admin.json"));

        let status: OfflineStatus = output(&status_impl(&ctx).await.unwrap());
        assert_eq!(status.state, WorkerState::Redundant);
        assert!(status.partitions.is_empty());
    }
}
