//! Event dispatcher owning the controller's collaborators.

use std::sync::Arc;

use folio_core::{CacheDb, Error, Network, Request};
use tokio::sync::RwLock;

use crate::event::{Event, FetchOutcome, Outcome};
use crate::lifecycle;
use crate::router::Router;
use crate::scope::Scope;
use crate::state::WorkerState;

/// One controller version.
///
/// Lifecycle events move it through [`WorkerState`]; fetch events are only
/// routed once it is activated. Fetches hold no lock while they run, so
/// independent requests proceed concurrently.
pub struct Controller {
    scope: Scope,
    cache: CacheDb,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
}

impl Controller {
    pub fn new(scope: Scope, cache: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { scope, cache, network, state: RwLock::new(WorkerState::Parsed) }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Run the handler for `event` to completion.
    pub async fn dispatch(&self, event: Event) -> Result<Outcome, Error> {
        match event {
            Event::Install => self.install().await,
            Event::Activate => self.activate().await,
            Event::Fetch(request) => Ok(Outcome::Fetch(self.handle_fetch(&request).await)),
        }
    }

    /// Cache the core asset manifest.
    ///
    /// Valid only from `parsed`. On failure the controller is `redundant`
    /// and never activates.
    pub async fn install(&self) -> Result<Outcome, Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing).await?;

        match lifecycle::install(&self.cache, self.network.as_ref(), &self.scope).await {
            Ok(cached) => {
                self.set_state(WorkerState::Installed).await;
                tracing::info!(cache_name = self.scope.cache_name(), cached, "installed");
                Ok(Outcome::Installed { cache_name: self.scope.cache_name().to_string(), cached, skip_waiting: true })
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant).await;
                tracing::warn!(cache_name = self.scope.cache_name(), error = %e, "install failed");
                Err(e)
            }
        }
    }

    /// Delete stale buckets and take control of open pages.
    ///
    /// Valid only from `installed`. On failure the controller goes back to
    /// `installed` so the host may retry.
    pub async fn activate(&self) -> Result<Outcome, Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating).await?;

        match lifecycle::activate(&self.cache, &self.scope).await {
            Ok(deleted) => {
                self.set_state(WorkerState::Activated).await;
                tracing::info!(cache_name = self.scope.cache_name(), deleted = deleted.len(), "activated");
                Ok(Outcome::Activated {
                    cache_name: self.scope.cache_name().to_string(),
                    deleted,
                    claim_clients: true,
                })
            }
            Err(e) => {
                self.set_state(WorkerState::Installed).await;
                tracing::warn!(cache_name = self.scope.cache_name(), error = %e, "activation failed");
                Err(e)
            }
        }
    }

    /// Route one intercepted request. Never fails: every error ends in a
    /// substitute response, `Unavailable`, or a pass-through.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        let state = self.state().await;
        if !state.can_intercept_fetch() {
            tracing::debug!("passthrough {}: controller is {}", request, state);
            return FetchOutcome::Passthrough;
        }

        Router::new(&self.cache, self.network.as_ref(), &self.scope)
            .route(request)
            .await
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(Error::InvalidState(format!("cannot move to {to} from {}, expected {from}", *state)));
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: WorkerState) {
        *self.state.write().await = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ResponseSource;
    use crate::testing::{ScriptedNetwork, page, scope, scope_named, site_network};
    use bytes::Bytes;
    use folio_core::Response;
    use url::Url;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    async fn activated(network: Arc<ScriptedNetwork>) -> Controller {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let controller = Controller::new(scope(), cache, network);
        controller.install().await.unwrap();
        controller.activate().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn test_lifecycle_happy_path() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = Controller::new(scope.clone(), CacheDb::open_in_memory().await.unwrap(), network);
        assert_eq!(controller.state().await, WorkerState::Parsed);

        let installed = controller.dispatch(Event::Install).await.unwrap();
        assert_eq!(
            installed,
            Outcome::Installed {
                cache_name: "gm-campbell-v5".into(),
                cached: scope.manifest().len() as u64,
                skip_waiting: true,
            }
        );
        assert_eq!(controller.state().await, WorkerState::Installed);

        let activated = controller.dispatch(Event::Activate).await.unwrap();
        assert!(matches!(activated, Outcome::Activated { claim_clients: true, .. }));
        assert_eq!(controller.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_install_failure_is_terminal() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        network.serve(&page(&scope, "/js/main.js"), Response::new(500, "boom"));
        let controller = Controller::new(scope, CacheDb::open_in_memory().await.unwrap(), network);

        assert!(matches!(controller.install().await, Err(Error::InstallFailed { .. })));
        assert_eq!(controller.state().await, WorkerState::Redundant);

        assert!(matches!(controller.install().await, Err(Error::InvalidState(_))));
        assert!(matches!(controller.activate().await, Err(Error::InvalidState(_))));
        let outcome = controller.handle_fetch(&get("https://portfolio.test/")).await;
        assert!(outcome.is_passthrough());
    }

    #[tokio::test]
    async fn test_activate_before_install_rejected() {
        let controller = Controller::new(
            scope(),
            CacheDb::open_in_memory().await.unwrap(),
            Arc::new(ScriptedNetwork::new()),
        );

        assert!(matches!(controller.activate().await, Err(Error::InvalidState(_))));
        assert_eq!(controller.state().await, WorkerState::Parsed);
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = Controller::new(scope.clone(), CacheDb::open_in_memory().await.unwrap(), network.clone());
        controller.install().await.unwrap();
        let calls_after_install = network.calls().len();

        let outcome = controller.dispatch(Event::Fetch(get(&page(&scope, "/css/styles.css")))).await.unwrap();

        assert_eq!(outcome, Outcome::Fetch(FetchOutcome::Passthrough));
        assert_eq!(network.calls().len(), calls_after_install);
    }

    #[tokio::test]
    async fn test_bucket_isolation_after_activation() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let old_scope = scope_named("gm-campbell-v4");
        let old = Controller::new(old_scope.clone(), cache.clone(), Arc::new(site_network(&old_scope)));
        old.install().await.unwrap();
        old.activate().await.unwrap();

        let new_scope = scope();
        let new = Controller::new(new_scope.clone(), cache.clone(), Arc::new(site_network(&new_scope)));
        new.install().await.unwrap();
        assert_eq!(cache.bucket_names().await.unwrap(), vec!["gm-campbell-v4", "gm-campbell-v5"]);

        let outcome = new.activate().await.unwrap();

        assert!(matches!(outcome, Outcome::Activated { ref deleted, .. } if deleted == &vec!["gm-campbell-v4".to_string()]));
        assert_eq!(cache.bucket_names().await.unwrap(), vec!["gm-campbell-v5"]);
        assert_eq!(cache.entry_count("gm-campbell-v4").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_manifest_completeness_after_install() {
        let scope = scope();
        let cache = CacheDb::open_in_memory().await.unwrap();
        let controller = Controller::new(scope.clone(), cache.clone(), Arc::new(site_network(&scope)));

        controller.install().await.unwrap();

        for (path, url) in scope.manifest() {
            let hit = cache.match_entry(scope.cache_name(), &Request::get(url.clone())).await.unwrap();
            assert_eq!(hit.map(|r| r.body), Some(Bytes::from(format!("v1 {path}"))));
        }
    }

    // GET / with Accept: text/html, network up.
    #[tokio::test]
    async fn test_page_network_first_updates_cache() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        let root = page(&scope, "/");
        network.serve(&root, Response::new(200, "v2 home").with_header("Content-Type", "text/html"));

        let request = get(&root).with_header("Accept", "text/html");
        let outcome = controller.handle_fetch(&request).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert_eq!(outcome.response().map(|r| r.body.clone()), Some(Bytes::from_static(b"v2 home")));
        let stored = controller.cache().match_entry(scope.cache_name(), &request).await.unwrap().unwrap();
        assert_eq!(stored.body, Bytes::from_static(b"v2 home"));
    }

    // Same request, network down: previously cached entry.
    #[tokio::test]
    async fn test_page_offline_serves_cached_entry() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        network.set_offline(true);

        let outcome = controller.handle_fetch(&get(&page(&scope, "/")).with_header("Accept", "text/html")).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(outcome.response().map(|r| r.body.clone()), Some(Bytes::from_static(b"v1 /")));
    }

    // Same request, network down, no entry for the page: offline page.
    #[tokio::test]
    async fn test_page_offline_without_entry_serves_offline_page() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        network.set_offline(true);

        let outcome = controller.handle_fetch(&get(&page(&scope, "/projects")).navigation()).await;

        assert_eq!(outcome.source(), Some(ResponseSource::OfflineFallback));
        assert_eq!(outcome.response().map(|r| r.body.clone()), Some(Bytes::from_static(b"v1 /offline.html")));
    }

    // GET /css/styles.css already cached: no network call.
    #[tokio::test]
    async fn test_asset_cache_hit_skips_network() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        let css = page(&scope, "/css/styles.css");
        let before = network.call_count(&css);

        let outcome = controller.handle_fetch(&get(&css)).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(network.call_count(&css), before);
    }

    // GET /images/new-photo.png, not cached, network 200: stored.
    #[tokio::test]
    async fn test_asset_miss_is_fetched_and_stored() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        let photo = page(&scope, "/images/new-photo.png");
        network.serve(&photo, Response::new(200, vec![0x89, b'P', b'N', b'G']).with_header("Content-Type", "image/png"));

        let outcome = controller.handle_fetch(&get(&photo)).await;

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        let stored = controller.cache().match_entry(scope.cache_name(), &get(&photo)).await.unwrap().unwrap();
        assert_eq!(stored.content_type(), Some("image/png"));
    }

    // GET /images/missing.png, network 404: returned, not stored.
    #[tokio::test]
    async fn test_asset_404_not_stored() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        let missing = page(&scope, "/images/missing.png");
        let entries_before = controller.cache().entry_count(scope.cache_name()).await.unwrap();

        let outcome = controller.handle_fetch(&get(&missing)).await;

        assert_eq!(outcome.response().map(|r| r.status), Some(404));
        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert!(controller.cache().match_entry(scope.cache_name(), &get(&missing)).await.unwrap().is_none());
        assert_eq!(controller.cache().entry_count(scope.cache_name()).await.unwrap(), entries_before);
    }

    #[tokio::test]
    async fn test_asset_offline_falls_back_to_offline_page() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        network.set_offline(true);

        let outcome = controller.handle_fetch(&get(&page(&scope, "/images/portrait.jpg"))).await;

        assert_eq!(outcome.source(), Some(ResponseSource::OfflineFallback));
        assert_eq!(outcome.response().and_then(|r| r.content_type()), Some("text/html"));
    }

    #[tokio::test]
    async fn test_idempotent_caching() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        let about = page(&scope, "/about");
        network.serve(&about, Response::new(200, "about v1"));
        let request = get(&about).navigation();

        controller.handle_fetch(&request).await;
        let count = controller.cache().entry_count(scope.cache_name()).await.unwrap();
        network.serve(&about, Response::new(200, "about v2"));
        controller.handle_fetch(&request).await;

        assert_eq!(controller.cache().entry_count(scope.cache_name()).await.unwrap(), count);
        let stored = controller.cache().match_entry(scope.cache_name(), &request).await.unwrap().unwrap();
        assert_eq!(stored.body, Bytes::from_static(b"about v2"));
    }

    #[tokio::test]
    async fn test_cross_origin_never_cached() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        let font = "https://fonts.googleapis.com/css2?family=Montserrat:wght@300;400;600&display=swap";
        let entries_before = controller.cache().entry_count(scope.cache_name()).await.unwrap();

        let outcome = controller.handle_fetch(&get(font)).await;

        assert!(outcome.is_passthrough());
        assert_eq!(network.call_count(font), 0);
        assert_eq!(controller.cache().entry_count(scope.cache_name()).await.unwrap(), entries_before);
    }

    #[tokio::test]
    async fn test_post_never_intercepted() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let controller = activated(network.clone()).await;
        let calls_before = network.calls().len();

        let request = Request::new("POST", Url::parse(&page(&scope, "/")).unwrap()).with_header("Accept", "text/html");
        let outcome = controller.handle_fetch(&request).await;

        assert!(outcome.is_passthrough());
        assert_eq!(network.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_concurrent_fetches() {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        for n in 0..8 {
            network.serve(&page(&scope, &format!("/images/{n}.png")), Response::new(200, format!("img {n}")));
        }
        let controller = Arc::new(activated(network.clone()).await);

        let mut handles = Vec::new();
        for n in 0..8 {
            let controller = controller.clone();
            let url = page(&scope, &format!("/images/{n}.png"));
            handles.push(tokio::spawn(async move { controller.handle_fetch(&get(&url)).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().source(), Some(ResponseSource::Network));
        }

        let entries = controller.cache().entries(scope.cache_name()).await.unwrap();
        assert_eq!(entries.iter().filter(|e| e.url.contains("/images/")).count(), 8);
    }
}
