//! Scan dispatcher
//!
//! The scanner turns settings into a running scan:
//! 1. Builds the scope list from the configured base URLs
//! 2. Retrieves robots.txt per origin when the robots mode needs it
//! 3. Starts the worker pool and seeds the queue with scope roots, wordlist
//!    candidates and robots seeds
//! 4. Waits for the queue to drain and reports a summary

use crate::config::{scopes, ScanSettings};
use crate::crawler::fetcher::ClientFactory;
use crate::crawler::pool::WorkerPool;
use crate::crawler::queue::WorkQueue;
use crate::crawler::types::{Candidate, Provenance, ScanResult};
use crate::crawler::worker::WorkerContext;
use crate::robots::{RobotsGate, RobotsMode, RobotsSource};
use crate::url::ScopePolicy;
use crate::wordlist::load_wordlist;
use crate::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Totals for a finished scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Distinct candidates admitted to the queue
    pub queued: usize,
    /// Requests issued (including mangled variants)
    pub probes: usize,
    /// Requests that failed at the transport level
    pub errors: usize,
    /// Wall-clock duration of the scan
    pub elapsed: Duration,
    /// Whether the scan was stopped before the queue drained
    pub cancelled: bool,
}

pub struct Scanner {
    settings: Arc<ScanSettings>,
    clients: Arc<dyn ClientFactory>,
    robots_source: Arc<dyn RobotsSource>,
    words: Option<Vec<String>>,
    token: CancellationToken,
}

impl Scanner {
    pub fn new(
        settings: Arc<ScanSettings>,
        clients: Arc<dyn ClientFactory>,
        robots_source: Arc<dyn RobotsSource>,
    ) -> Self {
        Self {
            settings,
            clients,
            robots_source,
            words: None,
            token: CancellationToken::new(),
        }
    }

    /// Uses `words` instead of loading the configured wordlist
    pub fn with_words(mut self, words: Vec<String>) -> Self {
        self.words = Some(words);
        self
    }

    /// A token that stops the scan when cancelled
    ///
    /// Workers finish their current item; queued work is discarded.
    pub fn stop_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs the scan to completion
    ///
    /// Every probe result is sent to `results`. The channel is closed when
    /// the scan ends, so a consumer can simply drain it.
    ///
    /// # Returns
    ///
    /// * `Ok(ScanSummary)` - The scan ran (possibly cancelled)
    /// * `Err(BorerError)` - Invalid configuration or a worker panicked
    pub async fn run(&self, results: mpsc::Sender<ScanResult>) -> Result<ScanSummary> {
        let started = Instant::now();
        let settings = self.settings.clone();

        let scope_urls = scopes(&settings)?;
        let words = match &self.words {
            Some(words) => words.clone(),
            None => load_wordlist(settings.wordlist.as_deref().map(Path::new))?,
        };
        let scope = Arc::new(ScopePolicy::new(
            scope_urls.clone(),
            settings.allow_upgrade,
            settings.exclude.clone(),
        ));
        let robots = Arc::new(self.load_robots(&scope_urls).await);

        let finished = CancellationToken::new();
        let _finished = finished.clone().drop_guard();
        tokio::spawn(watch_receiver(results.clone(), self.token.clone(), finished));

        let ctx = WorkerContext {
            settings: settings.clone(),
            scope: scope.clone(),
            robots: robots.clone(),
            results,
        };

        let queue = Arc::new(WorkQueue::new(settings.queue_size));
        let hold = queue.hold();
        let pool = WorkerPool::start_with_token(
            settings.workers,
            queue.clone(),
            self.clients.as_ref(),
            ctx,
            self.token.child_token(),
        );

        let seeds = seed_candidates(&scope, &robots, &words);
        tracing::info!(
            "Seeding {} candidates across {} scopes",
            seeds.len(),
            scope.scopes().len()
        );
        queue.add(seeds).await;
        drop(hold);

        let stats = pool.join().await?;
        let summary = ScanSummary {
            queued: queue.admitted(),
            probes: stats.probes,
            errors: stats.errors,
            elapsed: started.elapsed(),
            cancelled: self.token.is_cancelled(),
        };
        tracing::info!(
            "Scan finished: {} probes, {} errors in {:?}",
            summary.probes,
            summary.errors,
            summary.elapsed
        );
        Ok(summary)
    }

    /// Retrieves robots.txt once per scope origin
    async fn load_robots(&self, scope_urls: &[Url]) -> RobotsGate {
        let mode = self.settings.robots_mode;
        let mut gate = RobotsGate::new(mode, self.settings.user_agent.clone());
        if !mode.needs_rules() {
            return gate;
        }

        let mut fetched = HashSet::new();
        for scope in scope_urls {
            if !fetched.insert(scope.origin().ascii_serialization()) {
                continue;
            }
            let rules = self.robots_source.fetch(scope).await;
            gate.insert_rules(scope, rules);
        }
        gate
    }
}

/// Stops the scan if the result receiver goes away before the scan ends
async fn watch_receiver(results: mpsc::Sender<ScanResult>, stop: CancellationToken, finished: CancellationToken) {
    tokio::select! {
        _ = results.closed() => {
            tracing::warn!("Result receiver closed, stopping scan");
            stop.cancel();
        }
        _ = finished.cancelled() => {}
    }
}

/// The initial candidates of a scan, in seeding order
///
/// Scope roots first, then each word joined to each scope, then (in Seed
/// mode) the paths robots.txt lists. Everything passes the scope and robots
/// gates; duplicates are left to the queue.
fn seed_candidates(scope: &ScopePolicy, robots: &RobotsGate, words: &[String]) -> Vec<Candidate> {
    let mut seeds = Vec::new();
    let admit = |url: &Url| scope.admits(url) && robots.allows(url);

    for root in scope.scopes() {
        if admit(root) {
            seeds.push(Candidate::new(root.clone(), Provenance::ScopeRoot));
        } else {
            tracing::debug!("Scope root {} filtered by policy", root);
        }
    }

    for root in scope.scopes() {
        for word in words {
            match join_word(root, word) {
                Some(url) if admit(&url) => seeds.push(Candidate::new(url, Provenance::Wordlist)),
                Some(url) => tracing::debug!("Wordlist candidate {} filtered by policy", url),
                None => tracing::debug!("Unable to join {} to {}", word, root),
            }
        }
    }

    if robots.mode() == RobotsMode::Seed {
        for root in scope.scopes() {
            let mut found: Vec<Url> = robots.decide(root).seeds.into_iter().collect();
            found.sort();
            for url in found {
                if scope.admits(&url) {
                    seeds.push(Candidate::new(url, Provenance::RobotsSeed));
                } else {
                    tracing::debug!("Robots seed {} out of scope", url);
                }
            }
        }
    }

    seeds
}

/// Joins a wordlist entry below a scope directory
///
/// The scope is treated as a directory even without a trailing slash, and a
/// leading slash on the word is ignored.
fn join_word(scope: &Url, word: &str) -> Option<Url> {
    let word = word.trim_start_matches('/');
    if word.is_empty() {
        return None;
    }

    let mut base = scope.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.join(word).ok()
}
