//! Crawler module for probing and spidering
//!
//! This module contains the core scanning logic, including:
//! - HTTP probing through the `HttpClient` seam
//! - HTML eligibility checks and link extraction
//! - Extension mangling of wordlist entries
//! - The deduplicating work queue, workers and worker pool
//! - The scanner that seeds and drives a whole scan

mod fetcher;
mod mangle;
mod parser;
mod pool;
mod queue;
mod scanner;
mod types;
mod worker;

pub use fetcher::{
    build_http_client, ClientFactory, HttpClient, ProbeError, ProbeErrorKind, ProbeMethod,
    ProbeResponse, ReqwestClient, ReqwestClientFactory,
};
pub use mangle::{mangle, mangle_url};
pub use parser::{extract_links, is_eligible, MAX_HTML_LENGTH};
pub use pool::{PoolHandle, WorkerPool};
pub use queue::{QueueHold, WorkQueue, WorkSink};
pub use scanner::{ScanSummary, Scanner};
pub use types::{Candidate, Provenance, ScanResult};
pub use worker::{Worker, WorkerContext, WorkerStats};

#[cfg(test)]
pub(crate) use worker::tests::ScriptedClient;
