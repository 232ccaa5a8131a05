//! Scripted in-process network for worker tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use reqwest::Url;

use super::{cache_key, Network, NetworkError, Request, Response, ResponseKind};

pub(crate) const TEST_ORIGIN: &str = "https://cards.test/";

pub(crate) fn test_origin() -> Url {
    Url::parse(TEST_ORIGIN).expect("valid test origin")
}

#[derive(Default)]
struct FakeState {
    routes: HashMap<String, Response>,
    failing: HashSet<String>,
    offline: bool,
    calls: Vec<Request>,
}

/// Canned responses keyed by normalised URL, with a call log
#[derive(Clone, Default)]
pub(crate) struct FakeNetwork {
    state: Arc<Mutex<FakeState>>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn key(url: &str) -> String {
        cache_key(&test_origin(), url).expect("valid test url")
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().expect("fake network lock");
        f(&mut state)
    }

    /// Serve a same-origin 200 response for `url`
    pub(crate) fn serve(&self, url: &str, body: &str) -> &Self {
        self.respond(url, Response::new(200, ResponseKind::Basic, body))
    }

    pub(crate) fn respond(&self, url: &str, response: Response) -> &Self {
        let key = Self::key(url);
        self.with_state(|s| s.routes.insert(key, response));
        self
    }

    /// Make requests for `url` fail at the transport level
    pub(crate) fn fail(&self, url: &str) -> &Self {
        let key = Self::key(url);
        self.with_state(|s| s.failing.insert(key));
        self
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.with_state(|s| s.offline = offline);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.with_state(|s| s.calls.len())
    }

    pub(crate) fn calls(&self) -> Vec<Request> {
        self.with_state(|s| s.calls.clone())
    }
}

impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let key = Self::key(&request.url);
        self.with_state(|s| {
            s.calls.push(request.clone());
            if s.offline || s.failing.contains(&key) {
                return Err(NetworkError::Unreachable(key.clone()));
            }
            Ok(s
                .routes
                .get(&key)
                .cloned()
                .unwrap_or_else(|| Response::new(404, ResponseKind::Basic, "Not Found")))
        })
    }
}
