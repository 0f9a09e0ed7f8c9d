//! SQLite-backed cache storage.
//!
//! Models the browser cache storage a service worker sees: a set of named
//! buckets, each mapping request descriptors to captured responses. Access
//! is async via tokio-rusqlite. It supports:
//!
//! - Descriptor keys derived with SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-bucket deletion (the only eviction there is)

pub mod buckets;
pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;

/// UTC timestamp with a fixed number of fractional digits, so stored values
/// sort lexically in time order.
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
