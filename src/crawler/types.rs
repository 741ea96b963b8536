use crate::crawler::fetcher::{ProbeError, ProbeMethod, ProbeResponse};
use std::fmt;
use std::time::Duration;
use url::Url;

/// How a candidate URL came to be probed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// A configured base URL
    ScopeRoot,
    /// A wordlist entry joined to a scope
    Wordlist,
    /// An extension variant of a wordlist entry
    Mangled,
    /// A link (or redirect target) found in a response
    Discovered,
    /// A path listed in robots.txt
    RobotsSeed,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScopeRoot => "scope-root",
            Self::Wordlist => "wordlist",
            Self::Mangled => "mangled",
            Self::Discovered => "discovered",
            Self::RobotsSeed => "robots-seed",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL queued for probing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub url: Url,
    pub provenance: Provenance,
}

impl Candidate {
    pub fn new(url: Url, provenance: Provenance) -> Self {
        Self { url, provenance }
    }

    pub fn discovered(url: Url) -> Self {
        Self::new(url, Provenance::Discovered)
    }
}

/// Outcome of one probe
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// The probed URL
    pub url: Url,
    /// How the URL was derived
    pub provenance: Provenance,
    /// The request method used
    pub method: ProbeMethod,
    /// HTTP status code, absent on transport error
    pub status: Option<u16>,
    /// Declared content length
    pub content_length: Option<u64>,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Redirect target (resolved Location header), if any
    pub redirect: Option<Url>,
    /// Time from request start to response headers (or failure)
    pub elapsed: Duration,
    /// Transport error, if the request failed
    pub error: Option<ProbeError>,
}

impl ScanResult {
    /// Builds the result of a completed request
    pub fn from_response(
        candidate: &Candidate,
        method: ProbeMethod,
        response: &ProbeResponse,
        elapsed: Duration,
    ) -> Self {
        let redirect = response
            .location
            .as_deref()
            .and_then(|location| candidate.url.join(location).ok());

        Self {
            url: candidate.url.clone(),
            provenance: candidate.provenance,
            method,
            status: Some(response.status),
            content_length: response.content_length,
            content_type: response.content_type.clone(),
            redirect,
            elapsed,
            error: None,
        }
    }

    /// Builds the result of a failed request
    pub fn from_error(
        candidate: &Candidate,
        method: ProbeMethod,
        error: ProbeError,
        elapsed: Duration,
    ) -> Self {
        Self {
            url: candidate.url.clone(),
            provenance: candidate.provenance,
            method,
            status: None,
            content_length: None,
            content_type: None,
            redirect: None,
            elapsed,
            error: Some(error),
        }
    }

    /// Returns true for 3xx results
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, Some(300..=399))
    }

    /// Returns true if the request failed at the transport level
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
