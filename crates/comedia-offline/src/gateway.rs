//! Network-first, cache-fallback gateway.
//!
//! A GET is resolved in two steps:
//!
//! ```text
//! Request ─▶ network_first ─▶ Fetched { outcome ─▶ caller
//!                                      write_back ─▶ dispatch ─▶ JoinSet (background) }
//! ```
//!
//! The caller gets `outcome` as soon as the network answers; the cache write
//! runs as a separate task and its failure is only logged.

use crate::config::GatewayConfig;
use crate::error::{CacheError, GatewayError, GatewayResult, LifecycleError};
use crate::lifecycle::{ClientMessage, Lifecycle, WorkerPhase};
use crate::network::Network;
use crate::request::{Request, RequestKey, Response};
use crate::store::CacheStorage;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

/// How a request was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself
    PassThrough,
    /// Fresh response from the network
    Network(Response),
    /// Network failed; stored copy of this request
    Cache(Response),
    /// Network failed on a navigation; stored root document
    Fallback(Response),
    /// Network failed and nothing usable was stored
    Unresolved,
}

impl FetchOutcome {
    /// Response delivered to the caller, if any
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Network(r) | Self::Cache(r) | Self::Fallback(r) => Some(r),
            Self::PassThrough | Self::Unresolved => None,
        }
    }

    /// Consume into the delivered response
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Network(r) | Self::Cache(r) | Self::Fallback(r) => Some(r),
            Self::PassThrough | Self::Unresolved => None,
        }
    }

    /// Short name of the source
    #[must_use]
    pub fn source(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass-through",
            Self::Network(_) => "network",
            Self::Cache(_) => "cache",
            Self::Fallback(_) => "offline fallback",
            Self::Unresolved => "unresolved",
        }
    }
}

/// Pending copy of a network response into the live cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBack {
    cache_name: String,
    key: RequestKey,
    response: Response,
}

impl WriteBack {
    /// Key that will be written
    #[inline]
    #[must_use]
    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    /// Target store name
    #[inline]
    #[must_use]
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Perform the write, overwriting any previous entry for the key
    pub async fn apply<S: CacheStorage + ?Sized>(self, storage: &S) -> Result<(), CacheError> {
        let store = storage.open(&self.cache_name).await?;
        store.put(self.key, self.response).await
    }
}

/// Result of the network-first step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// What the caller receives
    pub outcome: FetchOutcome,
    /// Cache write to run after responding
    pub write_back: Option<WriteBack>,
}

impl Fetched {
    fn respond(outcome: FetchOutcome) -> Self {
        Self {
            outcome,
            write_back: None,
        }
    }
}

/// Summary of an install
#[derive(Debug)]
pub struct InstallReport {
    /// Manifest entries stored
    pub cached: usize,
    /// Why precaching failed, if it did
    pub error: Option<GatewayError>,
}

/// Summary of awaiting background writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    /// Writes that completed
    pub written: usize,
    /// Writes that failed or panicked
    pub failed: usize,
}

impl SettleReport {
    fn record(&mut self, joined: Result<Result<(), CacheError>, JoinError>) {
        match joined {
            Ok(Ok(())) => self.written += 1,
            Ok(Err(_)) => self.failed += 1,
            Err(err) => {
                tracing::warn!(%err, "background cache write panicked");
                self.failed += 1;
            }
        }
    }
}

/// Background writes still running, plus the tally of those already reaped
#[derive(Debug)]
struct WriteBacks {
    running: JoinSet<Result<(), CacheError>>,
    finished: SettleReport,
}

impl WriteBacks {
    fn new() -> Self {
        Self {
            running: JoinSet::new(),
            finished: SettleReport::default(),
        }
    }

    fn reap(&mut self) {
        while let Some(joined) = self.running.try_join_next() {
            self.finished.record(joined);
        }
    }
}

/// Request interceptor with versioned cache mirroring
#[derive(Debug)]
pub struct OfflineGateway<N, S> {
    config: GatewayConfig,
    network: N,
    storage: Arc<S>,
    lifecycle: Mutex<Lifecycle>,
    writes: Mutex<WriteBacks>,
}

impl<N, S> OfflineGateway<N, S>
where
    N: Network,
    S: CacheStorage + 'static,
{
    /// Gateway in the `Parsed` phase
    #[must_use]
    pub fn new(config: GatewayConfig, network: N, storage: Arc<S>) -> Self {
        Self {
            config,
            network,
            storage,
            lifecycle: Mutex::new(Lifecycle::default()),
            writes: Mutex::new(WriteBacks::new()),
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Cache storage
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Network collaborator
    #[inline]
    #[must_use]
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> WorkerPhase {
        self.lifecycle.lock().phase()
    }

    /// Whether open clients are controlled by this gateway
    #[must_use]
    pub fn controls_clients(&self) -> bool {
        self.lifecycle.lock().controls_clients()
    }

    /// Whether skip-waiting is in effect
    #[must_use]
    pub fn skips_waiting(&self) -> bool {
        self.lifecycle.lock().skips_waiting()
    }

    /// Answer `request`, scheduling the cache write in the background
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        let fetched = self.network_first(request).await;
        if let Some(write_back) = fetched.write_back {
            self.dispatch(write_back);
        }
        fetched.outcome
    }

    /// Resolve `request` without performing any cache write
    pub async fn network_first(&self, request: &Request) -> Fetched {
        if !request.is_get() {
            return Fetched::respond(FetchOutcome::PassThrough);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                let write_back = response.is_cacheable().then(|| WriteBack {
                    cache_name: self.config.cache_name.clone(),
                    key: request.key(),
                    response: response.clone(),
                });
                Fetched {
                    outcome: FetchOutcome::Network(response),
                    write_back,
                }
            }
            Err(err) => {
                tracing::debug!(url = %request.url(), %err, "network failed, trying cache");
                Fetched::respond(self.from_cache(request).await)
            }
        }
    }

    async fn from_cache(&self, request: &Request) -> FetchOutcome {
        if let Some(cached) = self.storage.match_any(&request.key()).await {
            return FetchOutcome::Cache(cached);
        }
        if !request.is_navigation() {
            tracing::debug!(url = %request.url(), "no cached copy");
            return FetchOutcome::Unresolved;
        }

        let root = match self.config.root_url() {
            Ok(url) => RequestKey::from(&url),
            Err(err) => {
                tracing::warn!(%err, "root document url is invalid");
                return FetchOutcome::Unresolved;
            }
        };
        match self.storage.match_any(&root).await {
            Some(document) => FetchOutcome::Fallback(document),
            None => FetchOutcome::Unresolved,
        }
    }

    /// Run a write-back as an independent task
    ///
    /// Writes that already finished are reaped first, so the task set only
    /// grows with writes that are still in flight.
    pub fn dispatch(&self, write_back: WriteBack) {
        let storage = Arc::clone(&self.storage);
        let mut writes = self.writes.lock();
        writes.reap();
        writes.running.spawn(async move {
            let key = write_back.key().clone();
            let cache = write_back.cache_name().to_string();
            let result = write_back.apply(storage.as_ref()).await;
            if let Err(err) = &result {
                tracing::warn!(%key, %cache, %err, "background cache write failed");
            }
            result
        });
    }

    /// Background writes not yet finished
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        let mut writes = self.writes.lock();
        writes.reap();
        writes.running.len()
    }

    /// Wait for every background write dispatched so far
    ///
    /// The report covers every write since the previous settle, including
    /// those that finished and were reaped in the meantime.
    pub async fn settle(&self) -> SettleReport {
        let (mut running, mut report) = {
            let mut writes = self.writes.lock();
            (
                std::mem::replace(&mut writes.running, JoinSet::new()),
                std::mem::take(&mut writes.finished),
            )
        };
        while let Some(joined) = running.join_next().await {
            report.record(joined);
        }
        report
    }

    /// Precache the manifest and, unless configured to wait, request
    /// immediate activation
    ///
    /// A failed precache is logged and reported but does not abort the
    /// install; nothing from a failed manifest is stored.
    pub async fn install(&self) -> Result<InstallReport, LifecycleError> {
        tracing::info!(cache = %self.config.cache_name, "installing");
        self.lifecycle.lock().transition(WorkerPhase::Installing)?;

        let report = match self.precache().await {
            Ok(cached) => InstallReport {
                cached,
                error: None,
            },
            Err(err) => {
                tracing::error!(%err, "precache failed");
                InstallReport {
                    cached: 0,
                    error: Some(err),
                }
            }
        };

        let mut lifecycle = self.lifecycle.lock();
        lifecycle.transition(WorkerPhase::Installed)?;
        if self.config.skip_waiting {
            lifecycle.skip_waiting();
        } else {
            tracing::info!("installed, waiting for skip-waiting");
        }
        Ok(report)
    }

    async fn precache(&self) -> GatewayResult<usize> {
        let mut entries = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            let request = Request::get(self.config.resolve(path)?);
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| CacheError::Precache {
                    url: path.clone(),
                    reason: e.to_string(),
                })?;
            if !response.status.is_success() {
                return Err(CacheError::Precache {
                    url: path.clone(),
                    reason: format!("status {}", response.status),
                }
                .into());
            }
            entries.push((request.key(), response));
        }

        let count = entries.len();
        let store = self.storage.open(&self.config.cache_name).await?;
        store.put_all(entries).await?;
        Ok(count)
    }

    /// Purge every cache but the current version and claim clients
    ///
    /// An installed worker without skip-waiting stays waiting. Returns the
    /// names of the deleted caches.
    pub async fn activate(&self) -> Result<Vec<String>, LifecycleError> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.phase() == WorkerPhase::Installed && !lifecycle.ready_to_activate() {
                return Err(LifecycleError::Waiting);
            }
            lifecycle.transition(WorkerPhase::Activating)?;
        }

        let mut purged = Vec::new();
        for name in self.storage.names().await {
            if name != self.config.cache_name && self.storage.delete(&name).await {
                tracing::info!(cache = %name, "deleted old cache");
                purged.push(name);
            }
        }

        let mut lifecycle = self.lifecycle.lock();
        lifecycle.transition(WorkerPhase::Activated)?;
        lifecycle.claim_clients();
        tracing::info!(cache = %self.config.cache_name, "activated");
        Ok(purged)
    }

    /// Handle a message from the hosting page
    ///
    /// `SkipWaiting` activates a worker left waiting after install; sent
    /// earlier, it lets the next activation proceed. Returns `true` when the
    /// message activated the worker.
    pub async fn on_message(&self, message: &ClientMessage) -> Result<bool, LifecycleError> {
        match message {
            ClientMessage::SkipWaiting => {
                let waiting = {
                    let mut lifecycle = self.lifecycle.lock();
                    let waiting = lifecycle.phase() == WorkerPhase::Installed
                        && !lifecycle.ready_to_activate();
                    lifecycle.skip_waiting();
                    waiting
                };
                if waiting {
                    tracing::info!("skip-waiting requested, activating");
                    self.activate().await?;
                }
                Ok(waiting)
            }
            ClientMessage::Unknown(kind) => {
                tracing::debug!(%kind, "ignoring client message");
                Ok(false)
            }
        }
    }
}
