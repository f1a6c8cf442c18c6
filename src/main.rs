//! Sumi-Audit main entry point
//!
//! This is the command-line interface for the Sumi-Audit website auditor.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use sumi_audit::audit::{EXIT_FATAL, EXIT_PASSED};
use sumi_audit::checks::CheckKind;
use sumi_audit::config::{apply_env_overrides, load_config_with_hash, validate, Config};
use sumi_audit::Auditor;
use tracing_subscriber::EnvFilter;

/// Sumi-Audit: A polite website auditor
///
/// Sumi-Audit crawls one website breadth-first and checks it for broken
/// links, missing SEO tags, sitemap drift and slow page loads. The exit code
/// is 0 when every check passes, 1 when one fails and 2 on a fatal error.
#[derive(Parser, Debug)]
#[command(name = "sumi-audit")]
#[command(version = "1.0.0")]
#[command(about = "A polite website auditor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Website to audit (overrides WEBSITE_URL)
    #[arg(short, long)]
    url: Option<String>,

    /// Check to run; repeat for several (default: all)
    #[arg(long = "check", value_enum)]
    checks: Vec<CheckArg>,

    /// Maximum number of pages to crawl (overrides MAX_PAGES)
    #[arg(long)]
    max_pages: Option<u32>,

    /// Fail the SEO check on any finding, including length warnings
    #[arg(long)]
    strict_seo: bool,

    /// Never open issues, even when GitHub credentials are set
    #[arg(long)]
    no_publish: bool,

    /// Also write the report to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Validate the configuration and show what would be checked
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CheckArg {
    Links,
    Seo,
    Sitemap,
    Performance,
}

impl From<CheckArg> for CheckKind {
    fn from(arg: CheckArg) -> Self {
        match arg {
            CheckArg::Links => CheckKind::Links,
            CheckArg::Seo => CheckKind::Seo,
            CheckArg::Sitemap => CheckKind::Sitemap,
            CheckArg::Performance => CheckKind::Performance,
        }
    }
}

impl Cli {
    /// Applies command-line overrides, the highest configuration layer
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.target.website_url = Some(url.clone());
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if self.strict_seo {
            config.seo.strict = true;
        }
        if self.no_publish {
            config.publish.enabled = false;
        }
    }

    fn selected_checks(&self) -> Vec<CheckKind> {
        if self.checks.is_empty() {
            CheckKind::ALL.to_vec()
        } else {
            self.checks.iter().copied().map(CheckKind::from).collect()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())
        .context("Invalid environment configuration")?;
    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    let checks = cli.selected_checks();

    if cli.dry_run {
        print_plan(&config, &checks);
        return Ok(EXIT_PASSED);
    }

    let report = Auditor::new(config)
        .with_checks(checks)
        .run()
        .await
        .context("Audit aborted")?;

    let markdown = report.render();
    println!("{}", markdown);

    if let Some(path) = &cli.output {
        write_report(path, &markdown);
    }

    for issue in &report.published {
        tracing::info!("Published issue #{}: {}", issue.number, issue.url);
    }

    Ok(report.exit_code())
}

/// Writes the report copy requested with --output
///
/// A failed write is logged and never changes the exit code.
fn write_report(path: &Path, markdown: &str) -> bool {
    match std::fs::write(path, markdown) {
        Ok(()) => {
            tracing::info!("Report written to {}", path.display());
            true
        }
        Err(e) => {
            tracing::warn!("Failed to write report to {}: {}", path.display(), e);
            false
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries only the report.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_audit=info,warn"),
            1 => EnvFilter::new("sumi_audit=debug,info"),
            2 => EnvFilter::new("sumi_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: shows the effective configuration
fn print_plan(config: &Config, checks: &[CheckKind]) {
    println!("=== Sumi-Audit Dry Run ===\n");

    println!(
        "Target: {}",
        config.target.website_url.as_deref().unwrap_or("-")
    );

    println!("\nChecks:");
    for check in checks {
        println!("  - {} ({})", check.title(), check.name());
    }

    println!("\nCrawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!("  Crawl delay: {}ms", config.crawler.crawl_delay_ms);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!(
        "  Check external links: {}",
        config.crawler.check_external_links
    );
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nProfiler Configuration:");
    println!("  WebDriver: {}", config.profiler.webdriver_url);
    println!(
        "  Viewport: {}x{}",
        config.profiler.viewport_width, config.profiler.viewport_height
    );
    println!(
        "  Page load timeout: {}ms",
        config.profiler.page_load_timeout_ms
    );

    println!("\nPublishing:");
    if config.publish.is_configured() {
        println!(
            "  GitHub issues on {}",
            config.publish.github_repository.as_deref().unwrap_or("-")
        );
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid");
}
