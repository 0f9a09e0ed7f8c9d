//! Core types and shared functionality for folio-sw.
//!
//! This crate provides:
//! - Cache storage (named buckets of captured responses) with SQLite backend
//! - HTTP value types and the `Network` seam
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CachedEntry};
pub use config::AppConfig;
pub use error::Error;
pub use http::{Network, Request, Response, ResponseKind};
