//! Events the host dispatches and what the controller answers.

use folio_core::{Request, Response};
use serde::{Deserialize, Serialize};

/// An event dispatched by the host.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
}

/// Where a response handed back to the host came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The cached offline page, served in place of whatever was asked for.
    OfflineFallback,
}

/// Decision for one intercepted fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs its default network handling.
    Passthrough,
    Respond { response: Response, source: ResponseSource },
    /// Intercepted, but neither the network nor the cache could answer.
    /// The host reports a network error to the page.
    Unavailable,
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Respond { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, FetchOutcome::Passthrough)
    }
}

/// Result of a dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The manifest is cached; `skip_waiting` asks the host to make this
    /// version eligible for activation right away.
    Installed { cache_name: String, cached: u64, skip_waiting: bool },
    /// Stale buckets are gone; `claim_clients` asks the host to hand every
    /// open page to this version without a reload.
    Activated { cache_name: String, deleted: Vec<String>, claim_clients: bool },
    Fetch(FetchOutcome),
}
