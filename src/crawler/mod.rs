//! Crawler module for fetching, extracting and following links
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching through the proxy pool with retry logic
//! - HTML parsing and link extraction
//! - The breadth-first frontier with depth and budget limits
//! - Overall run coordination and export

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod retry;

pub use coordinator::{CrawlOutcome, Crawler};
pub use fetcher::{build_http_client, FetchResult, FetchStatus, FetchTask, Fetcher};
pub use frontier::{CrawlState, Rejection};
pub use parser::{parse_page, DiscoveredLink, ParsedPage};
pub use retry::{RetryDecision, RetryPolicy, RetryState};

use crate::config::{Config, OutputConfig};
use crate::output::{CsvExporter, Exporter, JsonExporter, RunStats};
use crate::state::{AbortReason, RunState};
use crate::{ExportError, HarvestError};
use std::future::Future;
use std::path::PathBuf;

/// How a run ended, from the caller's point of view
#[derive(Debug)]
pub enum RunOutcome {
    /// Every configured output was written
    Exported(Vec<PathBuf>),
    /// The run stopped early; nothing was written
    Aborted(AbortReason),
    /// The crawl completed but the results could not be saved
    ExportFailed(ExportError),
}

/// Final report of a run
#[derive(Debug)]
pub struct RunReport {
    pub target: String,
    pub state: RunState,
    pub stats: RunStats,
    pub outcome: RunOutcome,
}

impl RunReport {
    /// True only when results were exported
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Exported(_))
    }
}

/// Runs a complete harvest: crawl, extract, aggregate, export
///
/// # Returns
///
/// * `Ok(RunReport)` - The run ended; see [`RunReport::outcome`]
/// * `Err(HarvestError)` - The run could not start (bad config or target)
pub async fn harvest(config: Config) -> Result<RunReport, HarvestError> {
    harvest_until(config, std::future::pending()).await
}

/// Like [`harvest`], aborting without export when `shutdown` resolves
pub async fn harvest_until<F>(config: Config, shutdown: F) -> Result<RunReport, HarvestError>
where
    F: Future<Output = ()>,
{
    let output = config.output.clone();
    let crawler = Crawler::new(config)?;
    let crawl = crawler.run_until(shutdown).await;

    let outcome = match &crawl.state {
        RunState::Aborted(reason) => RunOutcome::Aborted(reason.clone()),
        _ => export(&output, &crawl),
    };

    Ok(RunReport {
        target: crawl.target.to_string(),
        state: crawl.state,
        stats: crawl.stats,
        outcome,
    })
}

/// Writes the JSON report, when configured, and then the CSV table
///
/// The CSV table is the primary result and is written last, so a run that
/// reports `ExportFailed` never leaves a fresh table behind.
fn export(output: &OutputConfig, crawl: &CrawlOutcome) -> RunOutcome {
    let mut targets: Vec<(Box<dyn Exporter>, PathBuf)> = Vec::with_capacity(2);
    if let Some(json_path) = &output.json_path {
        targets.push((
            Box::new(JsonExporter::new(crawl.target.as_str(), crawl.stats.clone())),
            PathBuf::from(json_path),
        ));
    }
    targets.push((
        Box::new(CsvExporter::new(output.source_delimiter.clone())),
        PathBuf::from(&output.path),
    ));

    let mut written = Vec::with_capacity(targets.len());
    for (exporter, path) in targets {
        if let Err(e) = exporter.export(&crawl.results, &path) {
            tracing::error!("{} export to {} failed: {}", exporter.format_name(), path.display(), e);
            return RunOutcome::ExportFailed(e);
        }
        tracing::info!(
            "Wrote {} addresses to {} ({})",
            crawl.results.len(),
            path.display(),
            exporter.format_name()
        );
        written.push(path);
    }

    RunOutcome::Exported(written)
}
