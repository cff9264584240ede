//! Stored responses.
//!
//! Only GET responses are ever stored, so an entry is addressed by its
//! partition and the canonical URL of the request.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

const CACHED_METHOD: &str = "GET";

/// A response stored in a cache partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Canonical request URL.
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    /// Response headers as (name, value) pairs.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    pub fn key(&self) -> String {
        compute_request_key(CACHED_METHOD, &self.url)
    }
}

fn upsert(conn: &rusqlite::Connection, partition: &str, response: &CachedResponse) -> Result<(), Error> {
    let headers_json =
        serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(format!("headers: {e}")))?;
    conn.execute(
        "INSERT INTO cache_entries (
            partition_name, key_hash, url, status_code, content_type, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(partition_name, key_hash) DO UPDATE SET
            url = excluded.url,
            status_code = excluded.status_code,
            content_type = excluded.content_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            partition,
            response.key(),
            &response.url,
            response.status_code as i64,
            &response.content_type,
            headers_json,
            &response.body,
            &response.stored_at,
        ],
    )?;
    Ok(())
}

fn ensure_partition(conn: &rusqlite::Connection, partition: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_partitions (name, created_at) VALUES (?1, ?2)",
        params![partition, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn select(conn: &rusqlite::Connection, partition: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
    let row = conn
        .query_row(
            "SELECT url, status_code, content_type, headers_json, body, stored_at
             FROM cache_entries WHERE partition_name = ?1 AND key_hash = ?2",
            params![partition, key],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((url, status_code, content_type, headers_json, body, stored_at)) = row else {
        return Ok(None);
    };

    let headers = match headers_json {
        Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(%url, error = %e, "dropping unreadable cached headers");
            Vec::new()
        }),
        None => Vec::new(),
    };

    Ok(Some(CachedResponse {
        url,
        status_code: u16::try_from(status_code).unwrap_or(500),
        content_type,
        headers,
        body,
        stored_at,
    }))
}

impl CacheDb {
    /// Store a response, creating the partition if needed.
    ///
    /// Uses UPSERT semantics: a second put for the same URL replaces the first.
    pub async fn put_entry(&self, partition: &str, response: &CachedResponse) -> Result<(), Error> {
        let partition = partition.to_string();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_partition(&tx, &partition)?;
                upsert(&tx, &partition, &response)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Create a partition holding exactly `responses`, all or nothing.
    pub async fn seed_partition(&self, partition: &str, responses: Vec<CachedResponse>) -> Result<(), Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_partition(&tx, &partition)?;
                for response in &responses {
                    upsert(&tx, &partition, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a response in one partition.
    ///
    /// Returns None if the partition or the entry doesn't exist.
    pub async fn match_entry(&self, partition: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        let partition = partition.to_string();
        let key = compute_request_key(CACHED_METHOD, url);
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> { select(conn, &partition, &key) })
            .await
            .map_err(Error::from)
    }

    /// Look up a response in several partitions, first hit wins.
    pub async fn match_first(
        &self, partitions: &[String], url: &str,
    ) -> Result<Option<(String, CachedResponse)>, Error> {
        let partitions = partitions.to_vec();
        let key = compute_request_key(CACHED_METHOD, url);
        self.conn
            .call(move |conn| -> Result<Option<(String, CachedResponse)>, Error> {
                for partition in partitions {
                    if let Some(hit) = select(conn, &partition, &key)? {
                        return Ok(Some((partition, hit)));
                    }
                }
                Ok(None)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_response(url: &str, body: &str) -> CachedResponse {
        CachedResponse {
            url: url.to_string(),
            status_code: 200,
            content_type: Some("application/json".to_string()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let response = make_response("https://eikan.example/data/menu.json", "[]");

        db.put_entry("eikan-dynamic-1", &response).await.unwrap();

        let hit = db
            .match_entry("eikan-dynamic-1", "https://eikan.example/data/menu.json")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit, response);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let miss = db.match_entry("eikan-static-1", "https://eikan.example/").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://eikan.example/script.js";
        db.put_entry("p", &make_response(url, "old")).await.unwrap();
        db.put_entry("p", &make_response(url, "new")).await.unwrap();

        let hit = db.match_entry("p", url).await.unwrap().unwrap();
        assert_eq!(hit.body, b"new");
    }

    #[tokio::test]
    async fn test_match_first_prefers_earlier_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://eikan.example/index.html";
        db.put_entry("static", &make_response(url, "static copy")).await.unwrap();
        db.put_entry("dynamic", &make_response(url, "dynamic copy")).await.unwrap();

        let partitions = vec!["static".to_string(), "dynamic".to_string()];
        let (partition, hit) = db.match_first(&partitions, url).await.unwrap().unwrap();
        assert_eq!(partition, "static");
        assert_eq!(hit.body, b"static copy");

        let reversed = vec!["dynamic".to_string(), "static".to_string()];
        let (partition, _) = db.match_first(&reversed, url).await.unwrap().unwrap();
        assert_eq!(partition, "dynamic");
    }

    #[tokio::test]
    async fn test_seed_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let responses = vec![
            make_response("https://eikan.example/", "<html>"),
            make_response("https://eikan.example/data/pay.json", "[]"),
        ];
        db.seed_partition("eikan-static-1", responses).await.unwrap();

        assert!(db.match_entry("eikan-static-1", "https://eikan.example/").await.unwrap().is_some());
        assert!(
            db.match_entry("eikan-static-1", "https://eikan.example/data/pay.json")
                .await
                .unwrap()
                .is_some()
        );
    }
}
