//! Robots.txt parser implementation
//!
//! Permission checks are delegated to the robotstxt crate's port of
//! Google's matcher; the path listing used for seeding is a plain line scan.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt ruleset
///
/// An empty ruleset (no robots.txt, or one that could not be retrieved)
/// allows everything and lists nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

/// One path-bearing directive of a robots.txt file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsEntry {
    Allow(String),
    Disallow(String),
    Sitemap(String),
}

impl RobotsEntry {
    /// The path or URL carried by the directive
    pub fn value(&self) -> &str {
        match self {
            Self::Allow(v) | Self::Disallow(v) | Self::Sitemap(v) => v,
        }
    }
}

impl RobotsRules {
    /// Creates a ruleset from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Creates the permissive empty ruleset
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if there are no rules at all
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL (or bare path) to check
    /// * `user_agent` - The full User-Agent string; only its product token
    ///   is matched against `User-agent:` lines
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url)
    }

    /// Lists every Allow, Disallow and Sitemap directive, in file order
    ///
    /// Directives are collected regardless of the user-agent group they
    /// belong to. Empty values (`Disallow:`) are skipped.
    pub fn entries(&self) -> Vec<RobotsEntry> {
        let mut entries = Vec::new();

        for line in self.content.lines() {
            // Strip comments
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            };

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };

            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.trim().to_ascii_lowercase().as_str() {
                "allow" => entries.push(RobotsEntry::Allow(value.to_string())),
                "disallow" => entries.push(RobotsEntry::Disallow(value.to_string())),
                "sitemap" | "site-map" => entries.push(RobotsEntry::Sitemap(value.to_string())),
                _ => {}
            }
        }

        entries
    }
}

/// Reduces a User-Agent string to its product token
///
/// `borer/0.1 (+https://x)` becomes `borer`.
pub fn product_token(user_agent: &str) -> &str {
    let token = user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    if token.is_empty() {
        "*"
    } else {
        token
    }
}
