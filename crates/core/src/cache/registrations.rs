//! The active cache generation of each app.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

/// Which cache version currently controls an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Registration {
    pub app: String,
    pub active_version: String,
    pub activated_at: String,
}

impl CacheDb {
    pub async fn active_registration(&self, app: &str) -> Result<Option<Registration>, Error> {
        let app = app.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Registration>, Error> {
                let registration = conn
                    .query_row(
                        "SELECT app, active_version, activated_at FROM registrations WHERE app = ?1",
                        params![app],
                        |row| Ok(Registration { app: row.get(0)?, active_version: row.get(1)?, activated_at: row.get(2)? }),
                    )
                    .optional()?;
                Ok(registration)
            })
            .await
            .map_err(Error::from)
    }

    /// Record `version` as the active generation of `app`.
    pub async fn set_active_version(&self, app: &str, version: &str) -> Result<Registration, Error> {
        let registration = Registration {
            app: app.to_string(),
            active_version: version.to_string(),
            activated_at: chrono::Utc::now().to_rfc3339(),
        };
        let row = registration.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO registrations (app, active_version, activated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(app) DO UPDATE SET
                        active_version = excluded.active_version,
                        activated_at = excluded.activated_at",
                    params![row.app, row.active_version, row.activated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;
        Ok(registration)
    }
}
