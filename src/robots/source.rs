//! Robots.txt retrieval
//!
//! A missing or unreachable robots.txt is never fatal: the scan proceeds as
//! if the file were empty.

use crate::crawler::HttpClient;
use crate::robots::RobotsRules;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Retrieves the robots.txt ruleset for a scope
#[async_trait]
pub trait RobotsSource: Send + Sync {
    /// Fetches and parses `/robots.txt` for the origin of `scope`
    ///
    /// Failures produce an empty ruleset.
    async fn fetch(&self, scope: &Url) -> RobotsRules;
}

/// Fetches robots.txt over HTTP with the scan's own client
pub struct HttpRobotsSource {
    client: Arc<dyn HttpClient>,
}

impl HttpRobotsSource {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }
}

/// Location of robots.txt for the origin of `scope`
pub fn robots_url(scope: &Url) -> Option<Url> {
    scope.join("/robots.txt").ok()
}

#[async_trait]
impl RobotsSource for HttpRobotsSource {
    async fn fetch(&self, scope: &Url) -> RobotsRules {
        let Some(url) = robots_url(scope) else {
            tracing::warn!("Unable to build robots.txt URL for {}", scope);
            return RobotsRules::empty();
        };

        tracing::debug!("Fetching {}", url);
        match self.client.fetch_text(&url).await {
            Ok((status, body)) if (200..300).contains(&status) => {
                let rules = RobotsRules::from_content(&body);
                tracing::info!("Loaded {} ({} directives)", url, rules.entries().len());
                rules
            }
            Ok((status, _)) => {
                tracing::warn!("No robots.txt at {} (status {})", url, status);
                RobotsRules::empty()
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                RobotsRules::empty()
            }
        }
    }
}
