//! Fetch routing policy.
//!
//! In order:
//! 1. Non-GET requests pass through.
//! 2. Requests outside the site origin pass through.
//! 3. Page requests go network-first, asset requests cache-first.
//!
//! Only `200` same-origin responses no larger than the entry limit are
//! stored; anything else is still handed back. When the network fails and
//! the cache has nothing for the descriptor, the cached offline page is
//! served, even for assets such as images.

use folio_core::{CacheDb, Network, Request, Response, http::GET};
use serde::{Deserialize, Serialize};

use crate::event::{FetchOutcome, ResponseSource};
use crate::scope::Scope;

/// How a same-origin GET is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Navigations and HTML: network-first.
    Page,
    /// Everything else: cache-first.
    Asset,
}

/// Classify a request as a page or an asset.
///
/// A page is a navigation, anything accepting `text/html`, the site root,
/// or the offline page itself.
pub fn classify(request: &Request, offline_page: &str) -> RequestClass {
    let accepts_html = request.header("accept").is_some_and(|accept| accept.contains("text/html"));
    let path = request.url().path();

    if request.is_navigation() || accepts_html || path == "/" || path.ends_with(offline_page) {
        RequestClass::Page
    } else {
        RequestClass::Asset
    }
}

pub(crate) struct Router<'a> {
    cache: &'a CacheDb,
    network: &'a dyn Network,
    scope: &'a Scope,
}

impl<'a> Router<'a> {
    pub(crate) fn new(cache: &'a CacheDb, network: &'a dyn Network, scope: &'a Scope) -> Self {
        Self { cache, network, scope }
    }

    pub(crate) async fn route(&self, request: &Request) -> FetchOutcome {
        if request.method() != GET {
            tracing::debug!("passthrough {}: method", request);
            return FetchOutcome::Passthrough;
        }
        if !self.scope.contains(request.url()) {
            tracing::debug!("passthrough {}: foreign origin", request);
            return FetchOutcome::Passthrough;
        }

        match classify(request, self.scope.offline_page()) {
            RequestClass::Page => self.network_first(request).await,
            RequestClass::Asset => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &Request) -> FetchOutcome {
        match self.network.fetch(request).await {
            Ok(response) => self.from_network(request, response).await,
            Err(e) => {
                tracing::debug!("network failed for page {}: {}", request, e);
                if let Some(response) = self.lookup(request).await {
                    return FetchOutcome::Respond { response, source: ResponseSource::Cache };
                }
                self.offline_fallback().await
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> FetchOutcome {
        if let Some(response) = self.lookup(request).await {
            tracing::debug!("cache hit for {}", request);
            return FetchOutcome::Respond { response, source: ResponseSource::Cache };
        }

        match self.network.fetch(request).await {
            Ok(response) => self.from_network(request, response).await,
            Err(e) => {
                tracing::debug!("network failed for asset {}: {}", request, e);
                self.offline_fallback().await
            }
        }
    }

    /// Store a copy of a cacheable response, then hand the original back.
    async fn from_network(&self, request: &Request, response: Response) -> FetchOutcome {
        if !response.is_cacheable() {
            tracing::debug!("not caching {}: status {} ({})", request, response.status, response.kind.as_str());
        } else if response.body.len() > self.scope.max_entry_bytes() {
            tracing::debug!(
                "not caching {}: {} bytes exceeds {}",
                request,
                response.body.len(),
                self.scope.max_entry_bytes()
            );
        } else {
            self.store(request, &response).await;
        }
        FetchOutcome::Respond { response, source: ResponseSource::Network }
    }

    async fn offline_fallback(&self) -> FetchOutcome {
        match self.lookup(&self.scope.offline_request()).await {
            Some(response) => FetchOutcome::Respond { response, source: ResponseSource::OfflineFallback },
            None => {
                tracing::warn!("offline page {} is not cached", self.scope.offline_page());
                FetchOutcome::Unavailable
            }
        }
    }

    /// A failed read is a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.cache.match_entry(self.scope.cache_name(), request).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("cache read failed for {}: {}", request, e);
                None
            }
        }
    }

    /// A failed write is logged; the caller still gets its response.
    async fn store(&self, request: &Request, response: &Response) {
        if let Err(e) = self.cache.put_entry(self.scope.cache_name(), request, response).await {
            tracing::warn!("cache write failed for {}: {}", request, e);
        }
    }
}
