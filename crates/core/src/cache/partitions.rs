//! Named cache partitions.
//!
//! A partition is created on first write (or explicitly with
//! [`CacheDb::open_partition`]) and deleted as a whole; its entries go with it.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Entry count and stored body size of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionStats {
    pub name: String,
    pub entries: u64,
    pub bytes: u64,
}

impl CacheDb {
    /// Create a partition if it doesn't exist yet.
    pub async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// All partition names, oldest first.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_partitions ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_partitions WHERE name = ?1", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and every entry in it.
    ///
    /// Returns whether the partition existed.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_partitions WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Per-partition entry counts and sizes, oldest partition first.
    pub async fn partition_stats(&self) -> Result<Vec<PartitionStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, COUNT(e.key_hash), COALESCE(SUM(LENGTH(e.body)), 0)
                     FROM cache_partitions p
                     LEFT JOIN cache_entries e ON e.partition_name = p.name
                     GROUP BY p.name
                     ORDER BY p.created_at, p.name",
                )?;
                let stats = stmt
                    .query_map([], |row| {
                        Ok(PartitionStats {
                            name: row.get(0)?,
                            entries: row.get::<_, i64>(1)?.max(0) as u64,
                            bytes: row.get::<_, i64>(2)?.max(0) as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}
