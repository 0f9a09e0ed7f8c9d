//! Client code for folio-sw.
//!
//! This crate provides the reqwest-backed network the controller fetches
//! through, and URL resolution against the site origin.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, UrlError, resolve};
