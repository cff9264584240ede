//! SQLite-backed storage for the offline cache controller.
//!
//! Responses live in named partitions (`<app>-static-<version>`,
//! `<app>-dynamic-<version>`); dropping a partition drops its entries. It
//! supports:
//!
//! - Request keys hashed with SHA-256
//! - Automatic schema migrations
//! - WAL mode so several processes can share one cache file
//! - Atomic seeding of a partition from a complete set of responses

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;
pub mod registrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use partitions::PartitionStats;
pub use registrations::Registration;
