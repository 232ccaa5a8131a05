//! Offline asset cache for the flashdeck shell and card data.
//!
//! This module provides the background half of flashdeck:
//! - `CacheWorker`: one versioned cache generation. It precaches the asset
//!   manifest on install, evicts every other generation on activate, and
//!   answers fetches cache-first with a network fallback.
//! - `Registration`: owns the active and waiting generations and routes each
//!   client's fetches through its controlling worker.
//! - `CacheStorage`: the named buckets of URL to response entries, in memory
//!   or persisted as JSON files.
//! - `Network`: the transport seam, with `HttpNetwork` as the reqwest-backed
//!   implementation.

pub mod error;
pub mod manager;
pub mod network;
pub mod registration;
pub mod request;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{NetworkError, PrecacheError, RegistrationError, StorageError};
pub use manager::{
    ActivationReport, CacheWorker, InstallReport, WorkerState, CACHE_VERSION, OFFLINE_BODY,
    PRECACHE_MANIFEST, SHELL_PATH,
};
pub use network::{HttpNetwork, Network};
pub use registration::{ClientId, Registration, RegistrationOutcome};
pub use request::{cache_key, resolve_url, CacheMode, Method, Request, Response, ResponseKind};
pub use storage::{BucketSummary, CacheStorage, CachedData};
