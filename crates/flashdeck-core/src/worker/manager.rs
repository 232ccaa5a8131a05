//! One versioned generation of the offline asset cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{self, StreamExt};
use reqwest::Url;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{
    cache_key, CacheMode, CacheStorage, Method, Network, PrecacheError, Request, Response,
};

// ============================================================================
// Constants
// ============================================================================

/// Name of the bucket owned by this build. Bump it to evict every asset
/// cached by earlier deployments.
pub const CACHE_VERSION: &str = "pwa-cards-v2";

/// Assets fetched into the bucket at install time. Anything else is only
/// cached after its first successful fetch. Must be kept in sync with the
/// deployed files by hand.
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/app.js",
    "/cards.json",
    "/manifest.json",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
];

/// Shell page served when the network is unreachable
pub const SHELL_PATH: &str = "/index.html";

/// Body of the last-resort response when even the shell is not cached
pub const OFFLINE_BODY: &str = "Offline";

/// Maximum concurrent precache fetches during install.
const MAX_CONCURRENT_PRECACHE: usize = 4;

// ============================================================================
// Lifecycle
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Replaced by a newer generation
    Redundant,
}

/// Outcome of precaching the manifest. Install never fails as a whole.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Buckets from earlier generations that were deleted
    pub deleted: Vec<String>,
}

pub struct CacheWorker<N: Network> {
    version: String,
    origin: Url,
    manifest: Vec<String>,
    network: Arc<N>,
    storage: Arc<CacheStorage>,
    state: Mutex<WorkerState>,
    skip_waiting: AtomicBool,
    /// Cache writes spawned from `handle_fetch`
    pending_puts: Mutex<JoinSet<()>>,
}

impl<N: Network> CacheWorker<N> {
    /// Worker for the compiled-in version and manifest
    pub fn new(origin: Url, network: Arc<N>, storage: Arc<CacheStorage>) -> Self {
        Self::with_version(origin, network, storage, CACHE_VERSION)
    }

    pub fn with_version(
        origin: Url,
        network: Arc<N>,
        storage: Arc<CacheStorage>,
        version: &str,
    ) -> Self {
        Self {
            version: version.to_string(),
            origin,
            manifest: PRECACHE_MANIFEST.iter().map(|s| s.to_string()).collect(),
            network,
            storage,
            state: Mutex::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            pending_puts: Mutex::new(JoinSet::new()),
        }
    }

    pub fn with_manifest(mut self, manifest: &[&str]) -> Self {
        self.manifest = manifest.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> WorkerState {
        *self.lock_state()
    }

    fn set_state(&self, state: WorkerState) {
        debug!(version = %self.version, ?state, "Worker state change");
        *self.lock_state() = state;
    }

    pub(crate) fn mark_redundant(&self) {
        self.set_state(WorkerState::Redundant);
    }

    /// Ask to take over from the active generation as soon as installed
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    // ===== Install =====

    /// Open this generation's bucket and precache every manifest asset.
    /// Each asset is fetched independently; failures are logged and reported.
    pub async fn install(&self) -> InstallReport {
        self.set_state(WorkerState::Installing);
        info!(version = %self.version, assets = self.manifest.len(), "Caching app shell");

        if let Err(e) = self.storage.open_bucket(&self.version).await {
            warn!(version = %self.version, error = %e, "Failed to open cache bucket");
        }

        let results: Vec<(String, Result<(), PrecacheError>)> = stream::iter(self.manifest.iter())
            .map(|path| async move { (path.clone(), self.precache(path).await) })
            .buffer_unordered(MAX_CONCURRENT_PRECACHE)
            .collect()
            .await;

        let mut report = InstallReport::default();
        for (path, result) in results {
            match result {
                Ok(()) => report.cached.push(path),
                Err(e) => {
                    warn!(asset = %path, error = %e, "Failed to precache asset");
                    report.failed.push((path, e.to_string()));
                }
            }
        }
        // Keep manifest order regardless of completion order
        let position = |p: &String| self.manifest.iter().position(|m| m == p);
        report.cached.sort_by_key(|p| position(p));
        report.failed.sort_by_key(|(p, _)| position(p));

        info!(
            version = %self.version,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "Install complete"
        );
        self.set_state(WorkerState::Installed);
        report
    }

    async fn precache(&self, path: &str) -> Result<(), PrecacheError> {
        let request = Request::get(path).with_cache_mode(CacheMode::Reload);
        let key = request.cache_key(&self.origin)?;
        let response = self.network.fetch(&request).await?;
        if !response.is_ok() {
            return Err(PrecacheError::Status(response.status));
        }
        self.storage.put(&self.version, &key, response).await?;
        Ok(())
    }

    // ===== Activate =====

    /// Delete every bucket that does not belong to this generation
    pub async fn activate(&self) -> ActivationReport {
        self.set_state(WorkerState::Activating);

        let mut report = ActivationReport::default();
        for name in self.storage.keys().await {
            if name == self.version {
                continue;
            }
            match self.storage.delete(&name).await {
                Ok(_) => {
                    info!(cache = %name, "Deleting stale cache");
                    report.deleted.push(name);
                }
                Err(e) => warn!(cache = %name, error = %e, "Failed to delete stale cache"),
            }
        }

        self.set_state(WorkerState::Activated);
        report
    }

    // ===== Fetch =====

    /// Answer a fetch cache-first. Never fails: a network error degrades to
    /// the cached shell page and then to a literal offline response.
    pub async fn handle_fetch(&self, request: Request) -> Response {
        let key = match request.cache_key(&self.origin) {
            Ok(key) => Some(key),
            Err(e) => {
                debug!(url = %request.url, error = %e, "Request has no cache key");
                None
            }
        };

        if let Some(ref key) = key {
            if let Some(cached) = self.storage.match_request(key).await {
                debug!(key = %key, "Cache hit");
                return cached;
            }
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                if request.method == Method::Get && response.is_cacheable() {
                    if let Some(key) = key {
                        self.store_in_background(key, response.clone());
                    }
                }
                response
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "Network fetch failed, serving offline fallback");
                self.offline_fallback().await
            }
        }
    }

    fn store_in_background(&self, key: String, response: Response) {
        let storage = Arc::clone(&self.storage);
        let bucket = self.version.clone();
        let mut pending = self.pending_puts.lock().unwrap_or_else(|e| e.into_inner());
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            if let Err(e) = storage.put(&bucket, &key, response).await {
                warn!(key = %key, error = %e, "Failed to cache response");
            }
        });
    }

    async fn offline_fallback(&self) -> Response {
        if let Ok(key) = cache_key(&self.origin, SHELL_PATH) {
            if let Some(shell) = self.storage.match_request(&key).await {
                return shell;
            }
        }
        Response::text(OFFLINE_BODY)
    }

    /// Wait for cache writes started by earlier fetches to finish
    pub async fn settle(&self) {
        let mut pending = {
            let mut guard = self.pending_puts.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        while pending.join_next().await.is_some() {}
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::{test_origin, FakeNetwork};
    use crate::worker::ResponseKind;

    fn worker(network: &FakeNetwork, storage: &Arc<CacheStorage>) -> CacheWorker<FakeNetwork> {
        CacheWorker::new(test_origin(), Arc::new(network.clone()), Arc::clone(storage))
    }

    fn serve_manifest(network: &FakeNetwork) {
        for path in PRECACHE_MANIFEST {
            network.serve(path, &format!("asset {}", path));
        }
    }

    fn key(path: &str) -> String {
        cache_key(&test_origin(), path).unwrap()
    }

    // -------------------------------------------------------------------------
    // Install
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_install_caches_manifest() {
        let network = FakeNetwork::new();
        serve_manifest(&network);
        let storage = Arc::new(CacheStorage::in_memory());
        let worker = worker(&network, &storage);

        let report = worker.install().await;

        assert!(report.is_complete());
        assert_eq!(report.cached.len(), PRECACHE_MANIFEST.len());
        assert_eq!(report.cached[0], "/");
        assert_eq!(worker.state(), WorkerState::Installed);
        assert_eq!(storage.entry_keys(CACHE_VERSION).await.len(), PRECACHE_MANIFEST.len());
        let cards = storage.match_in(CACHE_VERSION, &key("/cards.json")).await.unwrap();
        assert_eq!(cards.body_text(), "asset /cards.json");
    }

    #[tokio::test]
    async fn test_install_bypasses_http_cache() {
        let network = FakeNetwork::new();
        serve_manifest(&network);
        let storage = Arc::new(CacheStorage::in_memory());

        worker(&network, &storage).install().await;

        let calls = network.calls();
        assert_eq!(calls.len(), PRECACHE_MANIFEST.len());
        assert!(calls.iter().all(|r| r.cache_mode == CacheMode::Reload));
    }

    #[tokio::test]
    async fn test_install_is_best_effort() {
        let network = FakeNetwork::new();
        serve_manifest(&network);
        network.fail("/icons/icon-512.png");
        network.respond("/manifest.json", Response::new(404, ResponseKind::Basic, ""));
        let storage = Arc::new(CacheStorage::in_memory());
        let worker = worker(&network, &storage);

        let report = worker.install().await;

        assert_eq!(report.cached.len(), PRECACHE_MANIFEST.len() - 2);
        let failed: Vec<&str> = report.failed.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(failed, vec!["/manifest.json", "/icons/icon-512.png"]);
        assert_eq!(worker.state(), WorkerState::Installed);
        assert!(storage.match_request(&key("/index.html")).await.is_some());
        assert!(storage.match_request(&key("/manifest.json")).await.is_none());
    }

    #[tokio::test]
    async fn test_install_with_everything_offline() {
        let network = FakeNetwork::new();
        network.set_offline(true);
        let storage = Arc::new(CacheStorage::in_memory());
        let worker = worker(&network, &storage);

        let report = worker.install().await;

        assert!(report.cached.is_empty());
        assert_eq!(report.failed.len(), PRECACHE_MANIFEST.len());
        assert_eq!(worker.state(), WorkerState::Installed);
        assert!(storage.has(CACHE_VERSION).await);
    }

    // -------------------------------------------------------------------------
    // Activate
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_activate_evicts_stale_buckets() {
        let network = FakeNetwork::new();
        let storage = Arc::new(CacheStorage::in_memory());
        storage.open_bucket("pwa-cards-v1").await.unwrap();
        storage.open_bucket("pwa-cards-v2").await.unwrap();
        let worker = worker(&network, &storage);

        let report = worker.activate().await;

        assert_eq!(report.deleted, vec!["pwa-cards-v1"]);
        assert_eq!(storage.keys().await, vec!["pwa-cards-v2"]);
        assert_eq!(worker.state(), WorkerState::Activated);
    }

    // -------------------------------------------------------------------------
    // Fetch
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_fetch_cache_hit_skips_network() {
        let network = FakeNetwork::new();
        let storage = Arc::new(CacheStorage::in_memory());
        storage
            .put(CACHE_VERSION, &key("/cards.json"), Response::new(200, ResponseKind::Basic, "[]"))
            .await
            .unwrap();
        let worker = worker(&network, &storage);

        let response = worker.handle_fetch(Request::get("cards.json")).await;

        assert_eq!(response.body_text(), "[]");
        assert_eq!(network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_miss_then_store() {
        let network = FakeNetwork::new();
        network.serve("/extra.css", "body {}");
        let storage = Arc::new(CacheStorage::in_memory());
        let worker = worker(&network, &storage);

        let first = worker.handle_fetch(Request::get("/extra.css")).await;
        worker.settle().await;
        let second = worker.handle_fetch(Request::get("/extra.css")).await;

        assert_eq!(first.body_text(), "body {}");
        assert_eq!(second, first);
        assert_eq!(network.call_count(), 1);
        assert!(storage.match_in(CACHE_VERSION, &key("/extra.css")).await.is_some());
    }

    #[tokio::test]
    async fn test_fetch_does_not_store_uncacheable() {
        let network = FakeNetwork::new();
        network.respond("/cdn.js", Response::new(200, ResponseKind::Cors, "x"));
        network.respond("/gone", Response::new(404, ResponseKind::Basic, "no"));
        network.serve("/submit", "ok");
        let storage = Arc::new(CacheStorage::in_memory());
        let worker = worker(&network, &storage);

        let cors = worker.handle_fetch(Request::get("/cdn.js")).await;
        let missing = worker.handle_fetch(Request::get("/gone")).await;
        let posted = worker.handle_fetch(Request::post("/submit")).await;
        worker.settle().await;

        assert_eq!(cors.kind, ResponseKind::Cors);
        assert_eq!(missing.status, 404);
        assert_eq!(posted.body_text(), "ok");
        assert!(storage.entry_keys(CACHE_VERSION).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_offline_serves_shell() {
        let network = FakeNetwork::new();
        network.set_offline(true);
        let storage = Arc::new(CacheStorage::in_memory());
        storage
            .put(CACHE_VERSION, &key(SHELL_PATH), Response::new(200, ResponseKind::Basic, "<html>"))
            .await
            .unwrap();
        let worker = worker(&network, &storage);

        let response = worker.handle_fetch(Request::get("/not-cached.png")).await;

        assert_eq!(response.body_text(), "<html>");
    }

    #[tokio::test]
    async fn test_fetch_offline_without_shell() {
        let network = FakeNetwork::new();
        network.set_offline(true);
        let storage = Arc::new(CacheStorage::in_memory());
        let worker = worker(&network, &storage);

        let response = worker.handle_fetch(Request::get("/cards.json")).await;

        assert_eq!(response.body_text(), OFFLINE_BODY);
        assert_eq!(response.kind, ResponseKind::Default);
        assert_eq!(network.call_count(), 1);
    }

    #[tokio::test]
    async fn test_skip_waiting_flag() {
        let network = FakeNetwork::new();
        let storage = Arc::new(CacheStorage::in_memory());
        let worker = worker(&network, &storage);
        assert!(!worker.skips_waiting());
        worker.skip_waiting();
        assert!(worker.skips_waiting());
        assert_eq!(worker.state(), WorkerState::Parsed);
    }
}
