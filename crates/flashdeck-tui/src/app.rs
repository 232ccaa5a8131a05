//! Application state management for flashdeck.
//!
//! `App` plays the part of the page: it owns the display state, opens the
//! deck through the registration, and registers the cache worker once the
//! deck is on screen. It never touches worker state directly.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use flashdeck_core::deck::{
    Direction, FilePositionStore, NavEvent, Navigator, SwipeTracker, SystemClock,
};
use flashdeck_core::worker::{
    CacheStorage, CacheWorker, ClientId, HttpNetwork, Registration, RegistrationOutcome,
};
use flashdeck_core::{load_cards, Config, Url};
use tracing::{debug, error, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Path the cache worker is registered under
pub const WORKER_SCRIPT: &str = "sw.js";

/// Shown when `cards.json` cannot be fetched or parsed
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load cards. Check cards.json.";

/// Shown when `cards.json` holds an empty list
pub const NO_CARDS_MESSAGE: &str = "No cards to display";

/// Shown when a new cache generation replaced the one controlling the deck
pub const UPDATE_INSTALLED_MESSAGE: &str = "Update installed. Restart to load the new version.";

/// Shown when a new cache generation is installed but not yet active
pub const UPDATE_WAITING_MESSAGE: &str = "Update available. Restart to apply it.";

pub type DeckNavigator = Navigator<SystemClock, FilePositionStore>;

// ============================================================================
// UI State Types
// ============================================================================

/// What the card area shows
pub enum DeckView {
    Loading,
    /// Initialisation halted with a user-facing message
    Message(&'static str),
    Cards(DeckNavigator),
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    Quitting,
}

/// Footer buttons, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Prev,
    Random,
    Next,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub origin: Url,
    registration: Registration<HttpNetwork>,
    storage: Arc<CacheStorage>,
    network: Arc<HttpNetwork>,
    client: ClientId,
    data_dir: PathBuf,

    pub state: AppState,
    pub deck: DeckView,
    swipe: SwipeTracker,
    cell_width_px: f64,

    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub async fn new(config: &Config, origin: Url) -> Result<Self> {
        debug!(origin = %origin, "Origin configured");

        let storage = Arc::new(open_storage(config, &origin));
        let data_dir = config
            .data_dir(&origin)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let network = Arc::new(HttpNetwork::new(origin.clone())?);

        let mut registration =
            Registration::new(origin.clone(), WORKER_SCRIPT, Arc::clone(&network));

        // A generation installed by an earlier session controls us from the start
        let worker = CacheWorker::new(origin.clone(), Arc::clone(&network), Arc::clone(&storage));
        match registration.resume(worker).await {
            Ok(true) => info!(version = ?registration.active_version(), "Offline cache available"),
            Ok(false) => debug!("No installed cache worker yet"),
            Err(e) => warn!(error = %e, "Failed to resume cache worker"),
        }
        let client = registration.add_client();
        let cell_width_px = config.cell_width_px();

        Ok(Self {
            origin,
            registration,
            storage,
            network,
            client,
            data_dir,
            state: AppState::Normal,
            deck: DeckView::Loading,
            swipe: SwipeTracker::new(),
            cell_width_px,
            status_message: None,
        })
    }

    /// Load the deck through the registration. A load failure or an empty
    /// deck halts initialisation with a message.
    pub async fn init(&mut self) {
        let cards = match load_cards(&self.registration, self.client).await {
            Ok(cards) => cards,
            Err(e) => {
                error!(error = %e, "Failed to initialise deck");
                self.deck = DeckView::Message(LOAD_FAILED_MESSAGE);
                return;
            }
        };

        if cards.is_empty() {
            self.deck = DeckView::Message(NO_CARDS_MESSAGE);
            return;
        }

        let store = FilePositionStore::open(self.data_dir.clone());
        self.deck = DeckView::Cards(Navigator::new(cards, SystemClock, store));
    }

    /// One-time worker registration. Failure is logged; the app keeps
    /// working online-only.
    pub async fn register_worker(&mut self) {
        if !matches!(self.deck, DeckView::Cards(_)) {
            return;
        }

        let worker = CacheWorker::new(
            self.origin.clone(),
            Arc::clone(&self.network),
            Arc::clone(&self.storage),
        );
        worker.skip_waiting();

        let previous = self.registration.active_version().map(str::to_string);
        match self.registration.register(worker).await {
            Ok(outcome) => {
                match &outcome {
                    RegistrationOutcome::Unchanged => debug!("Cache worker already active"),
                    RegistrationOutcome::Activated {
                        install,
                        activation,
                    } => info!(
                        cached = install.cached.len(),
                        failed = install.failed.len(),
                        evicted = activation.deleted.len(),
                        "Cache worker registered"
                    ),
                    RegistrationOutcome::Waiting { install } => {
                        info!(cached = install.cached.len(), "Cache worker waiting")
                    }
                }
                if let Some(message) = registration_status(previous.as_deref(), &outcome) {
                    self.status_message = Some(message);
                }
            }
            Err(e) => {
                error!(error = %e, "Cache worker registration failed");
            }
        }
    }

    pub fn navigator(&self) -> Option<&DeckNavigator> {
        match self.deck {
            DeckView::Cards(ref nav) => Some(nav),
            _ => None,
        }
    }

    fn navigator_mut(&mut self) -> Option<&mut DeckNavigator> {
        match self.deck {
            DeckView::Cards(ref mut nav) => Some(nav),
            _ => None,
        }
    }

    /// Active cache generation, for the status bar
    pub fn cache_version(&self) -> Option<&str> {
        self.registration.controller_version(self.client)
    }

    // ===== Navigation =====

    pub fn go_prev(&mut self) {
        if let Some(nav) = self.navigator_mut() {
            nav.advance(Direction::Backward);
        }
    }

    pub fn go_next(&mut self) {
        if let Some(nav) = self.navigator_mut() {
            nav.advance(Direction::Forward);
        }
    }

    pub fn go_random(&mut self) {
        if let Some(nav) = self.navigator_mut() {
            nav.jump_random(&mut rand::thread_rng());
        }
    }

    pub fn press(&mut self, button: Button) {
        match button {
            Button::Prev => self.go_prev(),
            Button::Random => self.go_random(),
            Button::Next => self.go_next(),
        }
    }

    /// Whether a footer button currently does anything
    pub fn is_enabled(&self, button: Button) -> bool {
        let Some(nav) = self.navigator() else {
            return false;
        };
        match button {
            Button::Prev => nav.can_go_back(),
            Button::Next => nav.can_go_forward(),
            Button::Random => nav.len() > 1,
        }
    }

    // ===== Swipe =====

    /// Mouse press at terminal column `column`
    pub fn swipe_start(&mut self, column: u16) {
        self.swipe.start(f64::from(column) * self.cell_width_px);
    }

    /// Mouse release; returns true if it was a swipe
    pub fn swipe_end(&mut self, column: u16) -> bool {
        match self.swipe.end(f64::from(column) * self.cell_width_px) {
            Some(Direction::Forward) => {
                self.go_next();
                true
            }
            Some(Direction::Backward) => {
                self.go_prev();
                true
            }
            None => false,
        }
    }

    // ===== Timer =====

    /// Drive the transition machine; called once per loop iteration
    pub fn tick(&mut self) {
        if let Some(nav) = self.navigator_mut() {
            if let Some(NavEvent::Rendered { index }) = nav.poll() {
                debug!(index = index, "Card shown");
            }
        }
    }

    /// Close our client. This waits for pending cache writes and lets a
    /// waiting generation take over next time.
    pub async fn shutdown(&mut self) {
        if let Some(report) = self.registration.close_client(self.client).await {
            info!(evicted = report.deleted.len(), "Waiting cache worker activated");
        }
    }
}

/// Status line after registering a worker. A new generation replacing one
/// that already controlled the deck is announced as an update.
fn registration_status(previous: Option<&str>, outcome: &RegistrationOutcome) -> Option<String> {
    match outcome {
        RegistrationOutcome::Unchanged => None,
        RegistrationOutcome::Activated { install, .. } if !install.is_complete() => Some(format!(
            "Offline cache incomplete: {} of {} assets",
            install.cached.len(),
            install.cached.len() + install.failed.len()
        )),
        RegistrationOutcome::Activated { .. } => previous.map(|_| {
            info!("App update available");
            UPDATE_INSTALLED_MESSAGE.to_string()
        }),
        RegistrationOutcome::Waiting { .. } => {
            info!("App update available");
            Some(UPDATE_WAITING_MESSAGE.to_string())
        }
    }
}

fn open_storage(config: &Config, origin: &Url) -> CacheStorage {
    let dir = match config.cache_dir(origin) {
        Ok(dir) => dir,
        Err(e) => {
            warn!(error = %e, "No cache directory, keeping cache in memory");
            return CacheStorage::in_memory();
        }
    };
    match CacheStorage::open(dir) {
        Ok(storage) => storage,
        Err(e) => {
            warn!(error = %e, "Failed to open cache storage, keeping cache in memory");
            CacheStorage::in_memory()
        }
    }
}
