//! Client code for eikan.
//!
//! This crate provides the HTTP fetch pipeline, the catalog loader, the
//! offline cache controller, debounced live search and card export,
//! shared by the server.

pub mod export;
pub mod fetch;
pub mod live;
pub mod loader;
pub mod offline;
pub mod render;

pub use export::{ExportArtifact, Exporter, SavedExport};
pub use fetch::{AssetRequest, AssetResponse, Destination, FetchClient, FetchConfig, Fetcher};
pub use live::{CancellableTimer, LiveSearch};
pub use loader::CatalogLoader;
pub use offline::{OfflineConfig, OfflineController, OfflineStatus, Served, ServedFrom, UpdateReport, WorkerState};
pub use render::{PageRenderer, RenderError};

#[cfg(feature = "render")]
pub use render::HeadlessRenderer;
