//! Offline cache controller.
//!
//! Serves the app's own assets cache-first out of two versioned partitions:
//! a static one seeded on install with the app shell and every category
//! file, and a dynamic one filled on demand with network responses. When
//! the network is unreachable, document requests fall back to the cached
//! offline page.
//!
//! The controller moves through the worker lifecycle
//! `parsed -> installing -> installed -> activating -> activated`; a failed
//! install ends in `redundant` and leaves the previously activated
//! generation (as recorded in the registration table) serving.

use std::sync::Arc;

use futures_util::future::try_join_all;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use eikan_core::{AppConfig, CacheDb, CachedResponse, Error, PartitionStats, Registration};

use crate::fetch::{AssetRequest, AssetResponse, Destination, Fetcher, canonicalize, parse_origin, resolve, same_origin};

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServedFrom {
    /// Not intercepted: non-GET, cross-origin, or no generation active.
    Bypass,
    Cache,
    Network,
    /// The offline page, in place of an unreachable document.
    Offline,
}

/// A response together with its source.
#[derive(Debug, Clone)]
pub struct Served {
    pub source: ServedFrom,
    pub response: AssetResponse,
}

/// Settings of one cache generation.
#[derive(Debug, Clone)]
pub struct OfflineConfig {
    pub app_name: String,
    pub version: String,
    pub origin: Url,
    /// App-relative paths seeded on install.
    pub manifest: Vec<String>,
    pub offline_page: String,
}

impl OfflineConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            app_name: config.app_name.clone(),
            version: config.cache_version.clone(),
            origin: parse_origin(&config.origin)?,
            manifest: config.manifest(),
            offline_page: config.offline_page.clone(),
        })
    }

    /// Static and dynamic partition names of a version.
    pub fn partitions_for(&self, version: &str) -> (String, String) {
        (format!("{}-static-{version}", self.app_name), format!("{}-dynamic-{version}", self.app_name))
    }

    pub fn static_partition(&self) -> String {
        self.partitions_for(&self.version).0
    }

    pub fn dynamic_partition(&self) -> String {
        self.partitions_for(&self.version).1
    }
}

/// Result of a successful install plus activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateReport {
    pub version: String,
    /// Number of assets seeded into the static partition.
    pub cached: usize,
    /// Partitions of older generations that were deleted.
    pub deleted: Vec<String>,
}

/// Snapshot of the controller for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OfflineStatus {
    pub state: WorkerState,
    pub version: String,
    pub static_partition: String,
    pub dynamic_partition: String,
    /// The generation currently serving, if any was ever activated.
    pub registration: Option<Registration>,
    pub partitions: Vec<PartitionStats>,
}

/// Cache-first controller in front of a network fetcher.
pub struct OfflineController {
    db: CacheDb,
    network: Arc<dyn Fetcher>,
    config: OfflineConfig,
    state: RwLock<WorkerState>,
}

impl OfflineController {
    pub fn new(db: CacheDb, network: Arc<dyn Fetcher>, config: OfflineConfig) -> Self {
        Self { db, network, config, state: RwLock::new(WorkerState::Parsed) }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    async fn set_state(&self, state: WorkerState) {
        let mut current = self.state.write().await;
        tracing::debug!(from = ?*current, to = ?state, version = %self.config.version, "worker state change");
        *current = state;
    }

    /// Fetch every manifest asset and seed the static partition with them.
    ///
    /// Nothing is written unless every fetch succeeds with a 2xx status.
    /// Returns the number of cached assets.
    ///
    /// # Errors
    ///
    /// `Error::CacheSeedFailed` naming the first failing asset; the
    /// controller becomes redundant.
    pub async fn install(&self) -> Result<usize, Error> {
        self.set_state(WorkerState::Installing).await;

        let seeded = match self.fetch_manifest().await {
            Ok(responses) => {
                let count = responses.len();
                self.db
                    .seed_partition(&self.config.static_partition(), responses)
                    .await
                    .map(|()| count)
            }
            Err(e) => Err(e),
        };

        match seeded {
            Ok(count) => {
                self.set_state(WorkerState::Installed).await;
                tracing::info!(version = %self.config.version, assets = count, "offline cache installed");
                Ok(count)
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::warn!(version = %self.config.version, error = %e, "offline cache install failed");
                Err(e)
            }
        }
    }

    async fn fetch_manifest(&self) -> Result<Vec<CachedResponse>, Error> {
        let urls = self
            .config
            .manifest
            .iter()
            .map(|path| resolve(&self.config.origin, path))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::CacheSeedFailed(e.to_string()))?;

        try_join_all(urls.into_iter().map(|url| async move {
            let request = AssetRequest::get(url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::CacheSeedFailed(format!("{url}: {e}")))?;
            if !response.is_success() {
                return Err(Error::CacheSeedFailed(format!("{url}: status {}", response.status.as_u16())));
            }
            Ok(response.to_cached(&url))
        }))
        .await
    }

    /// Delete every partition but the current pair, open the dynamic
    /// partition and record this version as the active one.
    ///
    /// Returns the names of the deleted partitions.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let state = self.state().await;
        if !matches!(state, WorkerState::Installed | WorkerState::Activated) {
            return Err(Error::InvalidInput(format!("cannot activate a worker in state {state:?}")));
        }
        self.set_state(WorkerState::Activating).await;

        match self.claim().await {
            Ok(deleted) => {
                self.set_state(WorkerState::Activated).await;
                tracing::info!(version = %self.config.version, deleted = ?deleted, "offline cache activated");
                Ok(deleted)
            }
            Err(e) => {
                self.set_state(WorkerState::Installed).await;
                Err(e)
            }
        }
    }

    async fn claim(&self) -> Result<Vec<String>, Error> {
        let keep = [self.config.static_partition(), self.config.dynamic_partition()];

        let mut deleted = Vec::new();
        for name in self.db.partition_names().await? {
            if !keep.contains(&name) && self.db.delete_partition(&name).await? {
                deleted.push(name);
            }
        }

        self.db.open_partition(&keep[1]).await?;
        self.db.set_active_version(&self.config.app_name, &self.config.version).await?;
        Ok(deleted)
    }

    /// Install and activate right away, without waiting for older clients.
    pub async fn register(&self) -> Result<UpdateReport, Error> {
        let cached = self.install().await?;
        let deleted = self.activate().await?;
        Ok(UpdateReport { version: self.config.version.clone(), cached, deleted })
    }

    /// Partitions serving requests right now: this generation once
    /// activated, otherwise whichever generation was last activated.
    async fn serving_partitions(&self) -> Result<Option<(String, String)>, Error> {
        if self.state().await == WorkerState::Activated {
            return Ok(Some(self.config.partitions_for(&self.config.version)));
        }
        let registration = self.db.active_registration(&self.config.app_name).await?;
        Ok(registration.map(|r| self.config.partitions_for(&r.active_version)))
    }

    /// Answer a request cache-first.
    ///
    /// # Errors
    ///
    /// Propagates the network error when neither the cache nor the offline
    /// fallback can answer.
    pub async fn respond(&self, request: &AssetRequest) -> Result<Served, Error> {
        let intercept = request.method == Method::GET && same_origin(&request.url, &self.config.origin);
        let partitions = if intercept { self.serving_partitions().await? } else { None };

        let Some((static_partition, dynamic_partition)) = partitions else {
            let response = self.network.fetch(request).await?;
            return Ok(Served { source: ServedFrom::Bypass, response });
        };

        let url = canonicalize(request.url.as_str())?;
        let lookup = [static_partition.clone(), dynamic_partition.clone()];
        if let Some((partition, hit)) = self.db.match_first(&lookup, url.as_str()).await? {
            tracing::trace!(%url, partition = %partition, "served from cache");
            return Ok(Served { source: ServedFrom::Cache, response: AssetResponse::from_cached(hit)? });
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success()
                    && let Err(e) = self.db.put_entry(&dynamic_partition, &response.to_cached(&url)).await
                {
                    tracing::warn!(%url, error = %e, "failed to store response");
                }
                Ok(Served { source: ServedFrom::Network, response })
            }
            Err(e) if e.is_network_failure() && request.destination == Destination::Document => {
                let offline_url = resolve(&self.config.origin, &self.config.offline_page)?;
                match self.db.match_entry(&static_partition, offline_url.as_str()).await? {
                    Some(page) => {
                        tracing::debug!(%url, "network unreachable, serving offline page");
                        Ok(Served { source: ServedFrom::Offline, response: AssetResponse::from_cached(page)? })
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    pub async fn status(&self) -> Result<OfflineStatus, Error> {
        Ok(OfflineStatus {
            state: self.state().await,
            version: self.config.version.clone(),
            static_partition: self.config.static_partition(),
            dynamic_partition: self.config.dynamic_partition(),
            registration: self.db.active_registration(&self.config.app_name).await?,
            partitions: self.db.partition_stats().await?,
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for OfflineController {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, Error> {
        self.respond(request).await.map(|served| served.response)
    }
}
