//! The offline cache controller.
//!
//! A [`Controller`] is driven by three events dispatched by its host:
//!
//! - `Install` caches the core asset manifest into the current bucket
//! - `Activate` deletes every bucket whose name is not the current one
//! - `Fetch` routes one intercepted request (network-first for pages,
//!   cache-first for assets, offline page as the last resort)
//!
//! Each handler works against a [`folio_core::CacheDb`] and a
//! [`folio_core::Network`], so the whole policy runs without a browser.

pub mod controller;
pub mod event;
pub mod lifecycle;
pub mod router;
pub mod scope;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use controller::Controller;
pub use event::{Event, FetchOutcome, Outcome, ResponseSource};
pub use router::RequestClass;
pub use scope::Scope;
pub use state::WorkerState;
