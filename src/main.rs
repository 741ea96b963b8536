//! Borer main entry point
//!
//! This is the command-line interface for the Borer content-discovery scanner.

use borer::config::{
    default_config_paths, find_config_file, load_settings_with_hash, validate, OutputFormat,
    ScanSettings,
};
use borer::crawler::{ClientFactory, ProbeMethod, ReqwestClientFactory, Scanner};
use borer::output::{consume_results, open_writer, print_statistics};
use borer::robots::{HttpRobotsSource, RobotsMode};
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Results buffered between the workers and the report writer
const RESULT_CHANNEL_SIZE: usize = 256;

/// Borer: a concurrent web content-discovery scanner
///
/// Borer probes wordlist paths (optionally mangled with file extensions)
/// under each base URL and follows links found in HTML responses, staying
/// inside the configured scopes.
#[derive(Parser, Debug)]
#[command(name = "borer")]
#[command(version)]
#[command(about = "A concurrent web content-discovery scanner", long_about = None)]
struct Cli {
    /// Base URLs to scan (in addition to --url)
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Base URL to scan; repeat or separate with commas
    #[arg(short, long = "url", value_delimiter = ',')]
    url: Vec<String>,

    /// Number of runtime threads
    #[arg(long)]
    threads: Option<usize>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Path prefix to never probe; repeat or separate with commas
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Proxy for requests; repeat to rotate between several
    #[arg(long = "proxy", value_delimiter = ',')]
    proxies: Vec<String>,

    /// Do not parse HTML responses for links
    #[arg(long)]
    no_html: bool,

    /// Pause after each request, per worker (milliseconds)
    #[arg(long, value_name = "MS")]
    sleep: Option<u64>,

    /// Wordlist file (default built-in)
    #[arg(long, value_name = "FILE")]
    wordlist: Option<String>,

    /// Extensions for mangling, comma separated
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Do not mangle wordlist entries with extensions
    #[arg(long)]
    no_mangle: bool,

    /// Work queue buffer size
    #[arg(long)]
    queue_size: Option<usize>,

    /// Per-request timeout (milliseconds)
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Probe with HEAD instead of GET (disables link extraction)
    #[arg(long)]
    head: bool,

    /// User-Agent header for requests
    #[arg(long)]
    user_agent: Option<String>,

    /// Report redirect responses
    #[arg(long)]
    include_redirects: bool,

    /// How robots.txt is used: ignore, obey or seed
    #[arg(long)]
    robots_mode: Option<RobotsMode>,

    /// Let HTTP scopes match HTTPS links
    #[arg(long)]
    allow_upgrade: bool,

    /// Status codes whose responses are spidered, comma separated
    #[arg(long, value_delimiter = ',')]
    spider_codes: Option<Vec<u16>>,

    /// Report format: text, markdown or sqlite
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Report file (stdout when omitted; required for sqlite)
    #[arg(short, long, value_name = "FILE")]
    outfile: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_parser = ["error", "warn", "info", "debug", "trace"])]
    loglevel: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    logfile: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate settings and print them without scanning
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.loglevel.as_deref(), cli.logfile.as_ref())?;

    let (settings, config_hash) = match load_settings(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&settings);
        return Ok(());
    }

    let runtime = build_runtime(settings.threads)?;
    runtime.block_on(handle_scan(settings, config_hash))
}

/// Builds the multi-threaded runtime the scan runs on
fn build_runtime(threads: usize) -> std::io::Result<tokio::runtime::Runtime> {
    tracing::debug!("Starting runtime with {} threads", threads);
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(threads)
        .enable_all()
        .build()
}

/// Sets up the logging/tracing subscriber
///
/// An explicit `--loglevel` wins over `-v` counts. With `--logfile`, output
/// goes to that file without ANSI colors.
fn setup_logging(
    verbose: u8,
    loglevel: Option<&str>,
    logfile: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match (loglevel, verbose) {
        (Some(level), _) => EnvFilter::new(format!("borer={},warn", level)),
        (None, 0) => EnvFilter::new("warn"),
        (None, 1) => EnvFilter::new("borer=info,warn"),
        (None, 2) => EnvFilter::new("borer=debug,info"),
        (None, _) => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match logfile {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

/// Builds the effective settings: defaults, then config file, then flags
fn load_settings(cli: &Cli) -> Result<(ScanSettings, Option<String>), Box<dyn std::error::Error>> {
    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(&default_config_paths()),
    };

    let (mut settings, hash) = match config_path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (settings, hash) = load_settings_with_hash(&path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (settings, Some(hash))
        }
        None => (ScanSettings::default(), None),
    };

    apply_overrides(cli, &mut settings);
    validate(&settings)?;
    Ok((settings, hash))
}

/// Applies the command-line flags on top of loaded settings
fn apply_overrides(cli: &Cli, settings: &mut ScanSettings) {
    let urls: Vec<String> = cli
        .url
        .iter()
        .chain(cli.urls.iter())
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    if !urls.is_empty() {
        settings.urls = urls;
    }

    if let Some(threads) = cli.threads {
        settings.threads = threads;
    }
    if let Some(workers) = cli.workers {
        settings.workers = workers;
    }
    if !cli.exclude.is_empty() {
        settings.exclude = cli.exclude.clone();
    }
    if !cli.proxies.is_empty() {
        settings.proxies = cli.proxies.clone();
    }
    if cli.no_html {
        settings.parse_html = false;
    }
    if let Some(sleep) = cli.sleep {
        settings.sleep = sleep;
    }
    if let Some(wordlist) = &cli.wordlist {
        settings.wordlist = Some(wordlist.clone());
    }
    if let Some(extensions) = &cli.extensions {
        settings.extensions = extensions.clone();
    }
    if cli.no_mangle {
        settings.mangle = false;
    }
    if let Some(queue_size) = cli.queue_size {
        settings.queue_size = queue_size;
    }
    if let Some(timeout) = cli.timeout {
        settings.timeout = timeout;
    }
    if cli.head {
        settings.method = ProbeMethod::Head;
    }
    if let Some(user_agent) = &cli.user_agent {
        settings.user_agent = user_agent.clone();
    }
    if cli.include_redirects {
        settings.include_redirects = true;
    }
    if let Some(mode) = cli.robots_mode {
        settings.robots_mode = mode;
    }
    if cli.allow_upgrade {
        settings.allow_upgrade = true;
    }
    if let Some(codes) = &cli.spider_codes {
        settings.spider_codes = codes.iter().copied().collect();
    }
    if let Some(format) = cli.format {
        settings.output_format = format;
    }
    if let Some(outfile) = &cli.outfile {
        settings.output_path = Some(outfile.clone());
    }
}

/// Handles the --dry-run mode: prints the effective settings
fn handle_dry_run(settings: &ScanSettings) {
    println!("=== Borer Dry Run ===\n");

    println!("Base URLs ({}):", settings.urls.len());
    for url in &settings.urls {
        println!("  - {}", url);
    }

    println!("\nScan:");
    println!("  Threads: {}", settings.threads);
    println!("  Workers: {}", settings.workers);
    println!("  Queue size: {}", settings.queue_size);
    println!("  Method: {}", settings.method);
    println!("  Timeout: {}ms", settings.timeout);
    println!("  Sleep: {}ms", settings.sleep);
    println!("  User agent: {}", settings.user_agent);
    println!("  Proxies: {}", settings.proxies.len());

    println!("\nDiscovery:");
    println!(
        "  Wordlist: {}",
        settings.wordlist.as_deref().unwrap_or("(built-in)")
    );
    println!("  Mangle: {}", settings.mangle);
    println!("  Extensions: {}", settings.extensions.join(", "));
    println!("  Parse HTML: {}", settings.parse_html);
    let codes: Vec<String> = settings.spider_codes.iter().map(|c| c.to_string()).collect();
    println!("  Spider codes: {}", codes.join(", "));
    println!("  Robots mode: {}", settings.robots_mode);
    println!("  Allow upgrade: {}", settings.allow_upgrade);
    if !settings.exclude.is_empty() {
        println!("  Excluded: {}", settings.exclude.join(", "));
    }

    println!("\nOutput:");
    println!("  Format: {}", settings.output_format);
    println!(
        "  Path: {}",
        settings.output_path.as_deref().unwrap_or("(stdout)")
    );
    println!("  Include redirects: {}", settings.include_redirects);

    println!("\n✓ Configuration is valid");
}

/// Handles the main scan operation
async fn handle_scan(
    settings: ScanSettings,
    config_hash: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Arc::new(settings);
    let clients = Arc::new(ReqwestClientFactory::new(&settings)?);
    let robots = Arc::new(HttpRobotsSource::new(clients.client_for(0)));

    let writer = open_writer(&settings, config_hash.as_deref())?;
    let (tx, rx) = mpsc::channel(RESULT_CHANNEL_SIZE);
    let output = tokio::spawn(consume_results(rx, writer, settings.include_redirects));

    let scanner = Scanner::new(settings.clone(), clients, robots);
    let stop = scanner.stop_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping scan");
            stop.cancel();
        }
    });

    tracing::info!("Scanning {}", settings.urls.join(", "));
    let summary = match scanner.run(tx).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Scan failed: {}", e);
            return Err(e.into());
        }
    };

    let stats = output.await??;
    print_statistics(&stats);
    eprintln!(
        "Scan {}: {} candidates queued, {} probes, {} errors",
        if summary.cancelled { "interrupted" } else { "complete" },
        summary.queued,
        summary.probes,
        summary.errors
    );

    Ok(())
}
