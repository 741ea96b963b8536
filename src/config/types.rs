use crate::crawler::ProbeMethod;
use crate::robots::RobotsMode;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default User-Agent sent with every probe
pub const DEFAULT_USER_AGENT: &str = concat!("borer/", env!("CARGO_PKG_VERSION"));

/// Settings for one scan
///
/// Built once at startup (defaults, then config file, then flags) and shared
/// read-only with every component of the scan.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScanSettings {
    /// Starting points and scopes of the scan
    pub urls: Vec<String>,

    /// Runtime threads the workers are scheduled on
    pub threads: usize,

    /// Number of concurrent workers
    pub workers: usize,

    /// Path prefixes that are never probed
    pub exclude: Vec<String>,

    /// Proxies, assigned to workers round-robin
    pub proxies: Vec<String>,

    /// Parse HTML responses for links to follow
    pub parse_html: bool,

    /// Pause after each request, per worker (milliseconds)
    pub sleep: u64,

    /// Wordlist path; the built-in list is used when unset
    pub wordlist: Option<String>,

    /// Extensions used for mangling
    pub extensions: Vec<String>,

    /// Whether wordlist entries are mangled with extensions
    pub mangle: bool,

    /// Capacity of the work queue buffer
    pub queue_size: usize,

    /// Per-request network timeout (milliseconds)
    pub timeout: u64,

    /// HTTP method used for probes
    pub method: ProbeMethod,

    /// User-Agent for requests
    pub user_agent: String,

    /// Whether redirect responses are reported
    pub include_redirects: bool,

    /// How robots.txt is used
    pub robots_mode: RobotsMode,

    /// Allow HTTP scopes to match HTTPS candidates
    pub allow_upgrade: bool,

    /// Status codes whose responses may be spidered
    pub spider_codes: BTreeSet<u16>,

    /// Report format
    pub output_format: OutputFormat,

    /// Report path; stdout when unset (required for sqlite)
    pub output_path: Option<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            urls: Vec::new(),
            threads: cpus,
            workers: cpus * 2,
            exclude: Vec::new(),
            proxies: Vec::new(),
            parse_html: true,
            sleep: 0,
            wordlist: None,
            extensions: ["html", "php", "asp", "aspx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mangle: true,
            queue_size: 1024,
            timeout: 30_000,
            method: ProbeMethod::Get,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            include_redirects: false,
            robots_mode: RobotsMode::Ignore,
            allow_upgrade: false,
            spider_codes: BTreeSet::from([200]),
            output_format: OutputFormat::Text,
            output_path: None,
        }
    }
}

impl ScanSettings {
    /// Per-request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Pause between requests as a `Duration`, if any
    pub fn sleep(&self) -> Option<Duration> {
        (self.sleep > 0).then(|| Duration::from_millis(self.sleep))
    }

    /// Returns true if links in responses with this status may be followed
    pub fn is_spider_code(&self, status: u16) -> bool {
        self.spider_codes.contains(&status)
    }
}

/// Report formats supported by the output layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Markdown,
    Sqlite,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [Self::Text, Self::Markdown, Self::Sqlite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown output format: {}", s))
    }
}
