//! Test doubles: a scripted network and a ready-made scope.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use folio_core::{AppConfig, Error, Network, Request, Response};

use crate::scope::Scope;

/// Origin used by every test scope.
pub const TEST_ORIGIN: &str = "https://portfolio.test";

/// A network that answers from a fixed table and records every call.
///
/// Unknown URLs get a `404`. While offline, every fetch fails.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url().to_string();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {url}")));
        }

        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(routes
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}

/// Default scope rooted at [`TEST_ORIGIN`].
pub fn scope() -> Scope {
    scope_named("gm-campbell-v5")
}

pub fn scope_named(cache_name: &str) -> Scope {
    let config = AppConfig { origin: TEST_ORIGIN.into(), cache_name: cache_name.into(), ..Default::default() };
    match Scope::from_config(&config) {
        Ok(scope) => scope,
        Err(e) => panic!("test scope is invalid: {e}"),
    }
}

/// Absolute URL string for a path under the scope's origin.
pub fn page(scope: &Scope, path: &str) -> String {
    format!("{}{}", scope.origin().as_str().trim_end_matches('/'), path)
}

/// A network serving every manifest entry with `200`.
pub fn site_network(scope: &Scope) -> ScriptedNetwork {
    let network = ScriptedNetwork::new();
    for (path, url) in scope.manifest() {
        let content_type = match path.rsplit('.').next() {
            Some("css") => "text/css",
            Some("js") => "text/javascript",
            Some("json") => "application/manifest+json",
            _ => "text/html",
        };
        network.serve(url.as_str(), Response::new(200, format!("v1 {path}")).with_header("Content-Type", content_type));
    }
    network
}
