//! Install and activate handlers.

use folio_core::{CacheDb, Error, Network, Request};

use crate::scope::Scope;

/// Fetch every manifest entry and store them all in the current bucket.
///
/// All fetches complete before anything is written, and the write is one
/// transaction. A transport failure, a non-2xx status, or a body over the
/// entry limit on any entry fails the whole install and leaves the cache
/// storage untouched.
///
/// Returns the number of entries in the bucket afterwards.
pub async fn install(cache: &CacheDb, network: &dyn Network, scope: &Scope) -> Result<u64, Error> {
    let mut pairs = Vec::with_capacity(scope.manifest().len());

    for (path, url) in scope.manifest() {
        let request = Request::get(url.clone());
        let response = network
            .fetch(&request)
            .await
            .map_err(|e| Error::InstallFailed { path: path.clone(), reason: e.to_string() })?;

        if !response.is_ok() {
            return Err(Error::InstallFailed { path: path.clone(), reason: format!("status {}", response.status) });
        }
        if response.body.len() > scope.max_entry_bytes() {
            let too_large = Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                response.body.len(),
                scope.max_entry_bytes()
            ));
            return Err(Error::InstallFailed { path: path.clone(), reason: too_large.to_string() });
        }

        pairs.push((request, response));
    }

    let cached = cache.put_all(scope.cache_name(), pairs).await?;
    tracing::debug!(cache_name = scope.cache_name(), cached, "core assets cached");
    Ok(cached)
}

/// Delete every bucket whose name differs from the current one.
///
/// Returns the deleted names.
pub async fn activate(cache: &CacheDb, scope: &Scope) -> Result<Vec<String>, Error> {
    let deleted = cache.retain_bucket(scope.cache_name()).await?;
    for name in &deleted {
        tracing::debug!(bucket = %name, "deleted stale cache bucket");
    }
    Ok(deleted)
}
