//! The registration that owns worker generations and routes client fetches.
//!
//! Clients never call into a worker directly. They register it once and then
//! send every fetch through `Registration::fetch`, which hands the request to
//! the worker controlling that client (or straight to the network if the
//! client is not controlled yet).

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info};

use super::{
    ActivationReport, CacheWorker, InstallReport, Network, RegistrationError, Request, Response,
};

pub type ClientId = u64;

/// What `register` did with the offered worker
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// Same version already active; nothing to do
    Unchanged,
    /// Installed and now controlling every client
    Activated {
        install: InstallReport,
        activation: ActivationReport,
    },
    /// Installed, waiting for the current generation's clients to close
    Waiting { install: InstallReport },
}

pub struct Registration<N: Network> {
    scope: Url,
    script: String,
    network: Arc<N>,
    active: Option<Arc<CacheWorker<N>>>,
    waiting: Option<Arc<CacheWorker<N>>>,
    /// Controlling worker per open client
    clients: HashMap<ClientId, Option<Arc<CacheWorker<N>>>>,
    next_client: ClientId,
}

impl<N: Network> Registration<N> {
    pub fn new(scope: Url, script: &str, network: Arc<N>) -> Self {
        Self {
            scope,
            script: script.to_string(),
            network,
            active: None,
            waiting: None,
            clients: HashMap::new(),
            next_client: 1,
        }
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn active_version(&self) -> Option<&str> {
        self.active.as_ref().map(|w| w.version())
    }

    pub fn waiting_version(&self) -> Option<&str> {
        self.waiting.as_ref().map(|w| w.version())
    }

    pub fn active(&self) -> Option<&Arc<CacheWorker<N>>> {
        self.active.as_ref()
    }

    fn check_scope(&self, worker: &CacheWorker<N>) -> Result<(), RegistrationError> {
        if worker.origin().origin() != self.scope.origin() {
            return Err(RegistrationError::ScopeMismatch {
                scope: self.scope.to_string(),
                worker: worker.origin().to_string(),
            });
        }
        Ok(())
    }

    // ===== Clients =====

    /// Open a client. It is controlled by the active generation, if any.
    pub fn add_client(&mut self) -> ClientId {
        let id = self.next_client;
        self.next_client += 1;
        self.clients.insert(id, self.active.clone());
        debug!(client = id, controlled = self.active.is_some(), "Client added");
        id
    }

    /// Close a client. Cache writes started by its fetches are finished
    /// first. When the last client closes, a waiting generation takes over.
    pub async fn close_client(&mut self, id: ClientId) -> Option<ActivationReport> {
        if let Some(Some(controller)) = self.clients.remove(&id) {
            controller.settle().await;
        }
        if self.clients.is_empty() {
            if let Some(waiting) = self.waiting.take() {
                return Some(self.promote(waiting).await);
            }
        }
        None
    }

    pub fn controller_version(&self, id: ClientId) -> Option<&str> {
        self.clients
            .get(&id)
            .and_then(|c| c.as_ref())
            .map(|w| w.version())
    }

    // ===== Lifecycle =====

    /// Re-adopt a generation installed by an earlier session. Succeeds only
    /// if the worker's bucket already exists in storage; no network access.
    pub async fn resume(&mut self, worker: CacheWorker<N>) -> Result<bool, RegistrationError> {
        self.check_scope(&worker)?;
        if self.active.is_some() || !worker.storage().has(worker.version()).await {
            return Ok(false);
        }
        info!(version = %worker.version(), "Resuming installed worker");
        self.promote(Arc::new(worker)).await;
        Ok(true)
    }

    /// Install a worker and activate it if nothing is active or it asked to
    /// skip waiting.
    pub async fn register(
        &mut self,
        worker: CacheWorker<N>,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        self.check_scope(&worker)?;
        if self.active_version() == Some(worker.version()) {
            debug!(version = %worker.version(), "Worker already active");
            return Ok(RegistrationOutcome::Unchanged);
        }

        info!(script = %self.script, version = %worker.version(), "Registering worker");
        let worker = Arc::new(worker);
        let install = worker.install().await;

        if worker.skips_waiting() || self.active.is_none() {
            if let Some(stale) = self.waiting.take() {
                stale.mark_redundant();
            }
            let activation = self.promote(worker).await;
            Ok(RegistrationOutcome::Activated {
                install,
                activation,
            })
        } else {
            if let Some(stale) = self.waiting.replace(worker) {
                stale.mark_redundant();
            }
            Ok(RegistrationOutcome::Waiting { install })
        }
    }

    async fn promote(&mut self, worker: Arc<CacheWorker<N>>) -> ActivationReport {
        let report = worker.activate().await;
        if let Some(previous) = self.active.replace(Arc::clone(&worker)) {
            previous.mark_redundant();
        }
        self.claim();
        report
    }

    /// Make the active generation control every open client
    fn claim(&mut self) {
        for controller in self.clients.values_mut() {
            *controller = self.active.clone();
        }
        debug!(clients = self.clients.len(), "Clients claimed");
    }

    // ===== Fetch =====

    /// Send a client's request through its controlling worker. An
    /// uncontrolled client goes straight to the network.
    pub async fn fetch(
        &self,
        client: ClientId,
        request: Request,
    ) -> Result<Response, RegistrationError> {
        let controller = self
            .clients
            .get(&client)
            .ok_or(RegistrationError::UnknownClient(client))?;

        match controller {
            Some(worker) => Ok(worker.handle_fetch(request).await),
            None => Ok(self.network.fetch(&request).await?),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
