//! Shadow-Harvester main entry point
//!
//! This is the command-line interface for the Shadow-Harvester email harvester.

use clap::Parser;
use shadow_harvester::config::{load_config_with_hash, resolve_target, validate, Config};
use shadow_harvester::crawler::harvest_until;
use shadow_harvester::output::print_report;
use shadow_harvester::proxy::ProxyPool;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Shadow-Harvester: an anonymized email harvester
///
/// Crawls a target domain and the documents it links to, extracts email
/// addresses from pages, PDFs and Word files, and writes a deduplicated
/// table of addresses with the URLs they were found on.
#[derive(Parser, Debug)]
#[command(name = "shadow-harvester")]
#[command(version)]
#[command(about = "Crawl a domain through rotating proxies and harvest email addresses", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Override the target from the configuration
    #[arg(short, long, value_name = "DOMAIN_OR_URL")]
    target: Option<String>,

    /// Override the CSV output path from the configuration
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(target) = cli.target {
        config.target.url = target;
    }
    if let Some(output) = cli.output {
        config.output.path = output.display().to_string();
    }
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    handle_harvest(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shadow_harvester=info,warn"),
            1 => EnvFilter::new("shadow_harvester=debug,info"),
            2 => EnvFilter::new("shadow_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) -> ExitCode {
    let target = match resolve_target(&config.target.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("=== Shadow-Harvester Dry Run ===\n");

    println!("Target:");
    println!("  URL: {}", target);
    println!("  Include subdomains: {}", config.target.include_subdomains);
    for path in &config.target.seed_paths {
        println!("  Seed: {}", path);
    }
    if config.target.include_subdomains {
        for label in &config.target.seed_subdomains {
            println!("  Seed subdomain: {}", label);
        }
    }

    println!("\nCrawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Page budget: {}", config.crawler.page_budget);
    println!("  Max concurrent fetches: {}", config.crawler.max_concurrent_fetches);
    match config.crawler.run_timeout_secs {
        0 => println!("  Run timeout: none"),
        secs => println!("  Run timeout: {}s", secs),
    }
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!(
        "  Politeness delay: {}-{}ms",
        config.crawler.delay_ms[0], config.crawler.delay_ms[1]
    );

    println!("\nFetch:");
    println!("  Timeout: {}ms", config.fetch.timeout_ms);
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!(
        "  Backoff: {}ms doubling to {}ms",
        config.fetch.backoff_base_ms, config.fetch.backoff_max_ms
    );
    println!("  User agents: {}", config.fetch.user_agents.len());

    println!("\nProxy routes:");
    match ProxyPool::from_config(&config.proxy, &config.fetch, None) {
        Ok(pool) => {
            for route in pool.snapshot() {
                println!("  - {}", route.id);
            }
        }
        Err(e) => {
            tracing::error!("Failed to build proxy routes: {}", e);
            return ExitCode::FAILURE;
        }
    }
    println!(
        "  Degraded after {} failures, banned after {}, grace {}s",
        config.proxy.degraded_after, config.proxy.banned_after, config.proxy.exhaustion_grace_secs
    );

    println!("\nOutput:");
    println!("  CSV: {}", config.output.path);
    if let Some(json) = &config.output.json_path {
        println!("  JSON: {}", json);
    }

    println!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> ExitCode {
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    match harvest_until(config, shutdown).await {
        Ok(report) => {
            print_report(&report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
