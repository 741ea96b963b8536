//! Robots.txt handling module
//!
//! This module decides how a site's robots.txt affects the scan: ignored,
//! obeyed as a filter, or mined for extra paths to probe. Retrieval lives in
//! [`source`]; the core only consumes the parsed ruleset.

mod parser;
pub mod source;

pub use parser::{product_token, RobotsEntry, RobotsRules};
pub use source::{HttpRobotsSource, RobotsSource};

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// How robots.txt is used during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotsMode {
    /// Robots.txt is not consulted
    #[default]
    Ignore,
    /// Disallowed paths are never probed
    Obey,
    /// Every path robots.txt mentions is probed
    Seed,
}

impl RobotsMode {
    pub const ALL: [RobotsMode; 3] = [Self::Ignore, Self::Obey, Self::Seed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Obey => "obey",
            Self::Seed => "seed",
        }
    }

    /// Returns true if the mode needs robots.txt to be retrieved
    pub fn needs_rules(&self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

impl fmt::Display for RobotsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RobotsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown Robots Mode: {}", s))
    }
}

/// Outcome of applying the robots policy to one candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsDecision {
    /// Whether the candidate may be probed
    pub allowed: bool,
    /// Extra candidates revealed by robots.txt (Seed mode only)
    pub seeds: HashSet<Url>,
}

/// Applies the robots policy to a candidate
///
/// # Arguments
///
/// * `mode` - The scan's robots mode
/// * `rules` - The robots.txt ruleset for the candidate's origin
/// * `candidate` - The URL being considered
/// * `user_agent` - The scan's User-Agent
///
/// # Returns
///
/// * `Ignore` - allowed, no seeds
/// * `Obey` - allowed unless the rules disallow the path, no seeds
/// * `Seed` - allowed, with every Allow/Disallow path and Sitemap URL
///   resolved against the candidate
pub fn filter(mode: RobotsMode, rules: &RobotsRules, candidate: &Url, user_agent: &str) -> RobotsDecision {
    match mode {
        RobotsMode::Ignore => RobotsDecision {
            allowed: true,
            seeds: HashSet::new(),
        },
        RobotsMode::Obey => RobotsDecision {
            allowed: rules.is_allowed(candidate.as_str(), user_agent),
            seeds: HashSet::new(),
        },
        RobotsMode::Seed => RobotsDecision {
            allowed: true,
            seeds: seed_urls(rules, candidate),
        },
    }
}

/// Resolves every path-bearing directive into a URL
fn seed_urls(rules: &RobotsRules, base: &Url) -> HashSet<Url> {
    let mut seeds = HashSet::new();

    for entry in rules.entries() {
        let target = match &entry {
            RobotsEntry::Sitemap(location) => location.as_str(),
            RobotsEntry::Allow(path) | RobotsEntry::Disallow(path) => literal_prefix(path),
        };
        if target.is_empty() {
            continue;
        }

        match base.join(target) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                seeds.insert(url);
            }
            Ok(url) => tracing::debug!("Skipping non-HTTP robots entry {}", url),
            Err(e) => tracing::debug!("Unable to resolve robots entry {}: {}", target, e),
        }
    }

    seeds
}

/// The literal part of a robots path pattern (before `*`, without `$`)
fn literal_prefix(pattern: &str) -> &str {
    let pattern = pattern.split('*').next().unwrap_or_default();
    pattern.strip_suffix('$').unwrap_or(pattern)
}

/// Robots policy for a whole scan: mode, User-Agent and per-origin rules
#[derive(Debug, Clone, Default)]
pub struct RobotsGate {
    mode: RobotsMode,
    user_agent: String,
    rules: HashMap<String, RobotsRules>,
}

impl RobotsGate {
    pub fn new(mode: RobotsMode, user_agent: impl Into<String>) -> Self {
        Self {
            mode,
            user_agent: user_agent.into(),
            rules: HashMap::new(),
        }
    }

    pub fn mode(&self) -> RobotsMode {
        self.mode
    }

    /// Registers the ruleset for the origin of `url`
    pub fn insert_rules(&mut self, url: &Url, rules: RobotsRules) {
        self.rules.insert(origin_key(url), rules);
    }

    /// The ruleset for the origin of `url` (empty when none was retrieved)
    pub fn rules_for(&self, url: &Url) -> RobotsRules {
        self.rules.get(&origin_key(url)).cloned().unwrap_or_default()
    }

    /// Applies [`filter`] with the rules for the candidate's origin
    pub fn decide(&self, candidate: &Url) -> RobotsDecision {
        match self.rules.get(&origin_key(candidate)) {
            Some(rules) => filter(self.mode, rules, candidate, &self.user_agent),
            None => filter(self.mode, &RobotsRules::empty(), candidate, &self.user_agent),
        }
    }

    /// Returns true if the candidate may be probed
    pub fn allows(&self, candidate: &Url) -> bool {
        if self.mode != RobotsMode::Obey {
            return true;
        }
        self.decide(candidate).allowed
    }
}

fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}
