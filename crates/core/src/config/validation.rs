//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

/// Same-origin absolute path: starts with `/` but is not protocol-relative.
fn is_site_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}

impl AppConfig {
    /// Parse `origin` into a URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an http(s) URL made
    /// of scheme, host and optional port only.
    pub fn site_origin(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("origin", "must include a host"));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("origin", "must not carry a path, query or fragment"));
        }

        Ok(url)
    }

    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not a bare http(s) origin
    /// - `cache_name` is blank
    /// - `core_assets` is empty or holds anything but same-origin paths
    /// - `offline_page` is not one of the core assets
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.site_origin()?;

        if self.cache_name.trim().is_empty() {
            return Err(invalid("cache_name", "must not be empty"));
        }

        if self.core_assets.is_empty() {
            return Err(invalid("core_assets", "must list at least the offline page"));
        }
        if let Some(bad) = self.core_assets.iter().find(|p| !is_site_path(p)) {
            return Err(invalid("core_assets", format!("not a same-origin path: {bad}")));
        }

        if !is_site_path(&self.offline_page) {
            return Err(invalid("offline_page", "must be a same-origin path"));
        }
        if !self.core_assets.contains(&self.offline_page) {
            return Err(invalid("offline_page", "must be listed in core_assets"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        let mut seen = std::collections::HashSet::new();
        for path in &self.core_assets {
            if !seen.insert(path) {
                tracing::warn!(path = %path, "core_assets lists the same path twice; it is cached once");
            }
        }

        Ok(())
    }
}
