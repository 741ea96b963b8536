//! Scan worker
//!
//! A worker processes one dequeued candidate at a time:
//! 1. Expands wordlist candidates into their mangled variants
//! 2. Probes each variant and reports a `ScanResult`
//! 3. For spider-code responses, extracts links and the redirect target
//! 4. Gates them through scope and robots policy and adds them back
//! 5. Reports the item done

use crate::config::ScanSettings;
use crate::crawler::fetcher::{HttpClient, ProbeResponse};
use crate::crawler::mangle::mangle_url;
use crate::crawler::parser::extract_links;
use crate::crawler::queue::WorkSink;
use crate::crawler::types::{Candidate, Provenance, ScanResult};
use crate::robots::RobotsGate;
use crate::url::ScopePolicy;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use url::Url;

/// Read-only state shared by every worker of a scan
#[derive(Clone)]
pub struct WorkerContext {
    pub settings: Arc<ScanSettings>,
    pub scope: Arc<ScopePolicy>,
    pub robots: Arc<RobotsGate>,
    pub results: mpsc::Sender<ScanResult>,
}

impl WorkerContext {
    /// Returns true if a discovered URL may be queued
    pub fn admits(&self, url: &Url) -> bool {
        if !self.scope.admits(url) {
            tracing::debug!("Out of scope: {}", url);
            return false;
        }
        if !self.robots.allows(url) {
            tracing::debug!("Disallowed by robots.txt: {}", url);
            return false;
        }
        true
    }
}

/// Counters for one worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Dequeued items processed
    pub items: usize,
    /// Requests issued
    pub probes: usize,
    /// Requests that failed at the transport level
    pub errors: usize,
}

impl std::ops::AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.items += other.items;
        self.probes += other.probes;
        self.errors += other.errors;
    }
}

/// Reports the item done when dropped, after all follow-on adds
struct DoneGuard<'a>(&'a dyn WorkSink);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.done();
    }
}

pub struct Worker {
    id: usize,
    client: Arc<dyn HttpClient>,
    ctx: WorkerContext,
    sink: Arc<dyn WorkSink>,
    stats: WorkerStats,
}

impl Worker {
    pub fn new(
        id: usize,
        client: Arc<dyn HttpClient>,
        ctx: WorkerContext,
        sink: Arc<dyn WorkSink>,
    ) -> Self {
        Self {
            id,
            client,
            ctx,
            sink,
            stats: WorkerStats::default(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// Processes one dequeued candidate
    ///
    /// Calls `done()` on the sink exactly once, after every follow-on add.
    pub async fn handle(&mut self, candidate: Candidate) {
        let sink = self.sink.clone();
        let _done = DoneGuard(sink.as_ref());
        self.stats.items += 1;

        for variant in self.expand(candidate) {
            let discovered = self.probe(&variant).await;
            if !discovered.is_empty() {
                tracing::debug!(
                    "Worker {} queueing {} links from {}",
                    self.id,
                    discovered.len(),
                    variant.url
                );
                sink.add(discovered).await;
            }

            if let Some(pause) = self.ctx.settings.sleep() {
                tokio::time::sleep(pause).await;
            }
        }
    }

    /// The concrete URLs to probe for a candidate
    ///
    /// Wordlist entries expand to themselves plus their extension variants
    /// when mangling is enabled; everything else is probed as is.
    fn expand(&self, candidate: Candidate) -> Vec<Candidate> {
        let settings = &self.ctx.settings;
        if candidate.provenance != Provenance::Wordlist || !settings.mangle {
            return vec![candidate];
        }

        mangle_url(&candidate.url, &settings.extensions)
            .into_iter()
            .enumerate()
            .map(|(i, url)| {
                let provenance = if i == 0 {
                    candidate.provenance
                } else {
                    Provenance::Mangled
                };
                Candidate::new(url, provenance)
            })
            .filter(|variant| variant.provenance != Provenance::Mangled || self.ctx.admits(&variant.url))
            .collect()
    }

    /// Probes one URL, reports the result and returns the follow-on candidates
    async fn probe(&mut self, candidate: &Candidate) -> Vec<Candidate> {
        let method = self.ctx.settings.method;
        let start = Instant::now();
        let outcome = self.client.probe(method, &candidate.url).await;
        let elapsed = start.elapsed();
        self.stats.probes += 1;

        match outcome {
            Ok(response) => {
                let result = ScanResult::from_response(candidate, method, &response, elapsed);
                tracing::debug!(
                    "Worker {}: {} {} ({:?})",
                    self.id,
                    response.status,
                    candidate.url,
                    elapsed
                );
                let follow_on = self.follow_on(&result, &response);
                self.emit(result).await;
                follow_on
            }
            Err(e) => {
                tracing::debug!("Worker {}: {} failed: {}", self.id, candidate.url, e);
                self.stats.errors += 1;
                self.emit(ScanResult::from_error(candidate, method, e, elapsed))
                    .await;
                Vec::new()
            }
        }
    }

    /// Links worth queueing from a response
    ///
    /// Only responses with a spider code are considered; their body links
    /// (when HTML parsing is on) and their redirect target are gated through
    /// scope and robots policy.
    fn follow_on(&self, result: &ScanResult, response: &ProbeResponse) -> Vec<Candidate> {
        let settings = &self.ctx.settings;
        if !settings.is_spider_code(response.status) {
            return Vec::new();
        }

        let mut links = HashSet::new();
        if settings.parse_html {
            if let Some(body) = &response.body {
                links = extract_links(&result.url, body);
            }
        }
        if let Some(target) = &result.redirect {
            links.insert(target.clone());
        }

        let mut accepted: Vec<Url> = links
            .into_iter()
            .filter(|url| self.ctx.admits(url))
            .collect();
        accepted.sort();
        accepted.into_iter().map(Candidate::discovered).collect()
    }

    async fn emit(&self, result: ScanResult) {
        if self.ctx.results.send(result).await.is_err() {
            tracing::debug!("Worker {}: result channel closed", self.id);
        }
    }
}
