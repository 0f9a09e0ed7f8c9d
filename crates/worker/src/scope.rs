//! What the controller controls: an origin, a bucket name, a manifest.

use folio_core::{AppConfig, Error, Request};
use url::Url;

/// Resolved controller settings.
///
/// Built once from [`AppConfig`]; every path is already resolved against the
/// origin so handlers never deal with parse errors.
#[derive(Debug, Clone)]
pub struct Scope {
    origin: Url,
    cache_name: String,
    offline_page: String,
    offline_url: Url,
    manifest: Vec<(String, Url)>,
    max_entry_bytes: usize,
}

impl Scope {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        config.validate().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let origin = config.site_origin().map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let join = |path: &str| origin.join(path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")));

        let mut manifest = Vec::with_capacity(config.core_assets.len());
        for path in &config.core_assets {
            manifest.push((path.clone(), join(path)?));
        }
        let offline_url = join(&config.offline_page)?;

        Ok(Self {
            cache_name: config.cache_name.clone(),
            offline_page: config.offline_page.clone(),
            offline_url,
            manifest,
            max_entry_bytes: config.max_bytes,
            origin,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn offline_page(&self) -> &str {
        &self.offline_page
    }

    /// Manifest paths paired with their resolved URLs, in manifest order.
    pub fn manifest(&self) -> &[(String, Url)] {
        &self.manifest
    }

    /// Largest body the cache stores. Bigger responses are still served.
    pub fn max_entry_bytes(&self) -> usize {
        self.max_entry_bytes
    }

    /// The descriptor the offline page is stored under.
    pub fn offline_request(&self) -> Request {
        Request::get(self.offline_url.clone())
    }

    /// Same scheme and origin as the site. Opaque origins (data:, extension
    /// schemes) never match, and neither do `blob:` URLs wrapping a
    /// same-origin URL.
    pub fn contains(&self, url: &Url) -> bool {
        url.scheme() == self.origin.scheme() && url.origin() == self.origin.origin()
    }
}
