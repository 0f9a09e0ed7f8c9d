//! Cache storage tools.
//!
//! These read and manage buckets directly, without dispatching controller
//! events.

pub mod delete;
pub mod entries;
pub mod get;
pub mod keys;

pub use delete::{CacheDeleteParams, delete_impl};
pub use entries::{CacheEntriesParams, entries_impl};
pub use get::{CacheMatchParams, match_impl};
pub use keys::keys_impl;
