//! Core types and shared functionality for eikan.
//!
//! This crate provides:
//! - The phrase catalog, kana-aware search and suggestions
//! - Session state (category, query, paging, selection) rendered as views
//! - Printable page templates and export naming
//! - Response cache partitions with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod phrase;
pub mod search;
pub mod session;

pub use cache::{CacheDb, CachedResponse, PartitionStats, Registration};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use export::PrintPage;
pub use phrase::{Catalog, PhraseEntry};
pub use search::{SearchScope, Viewport};
pub use session::{Action, AppState, View};
