//! Run statistics and the end-of-run report
//!
//! This module provides the counters collected by the coordinator and the
//! human-readable summary printed when a run ends, however it ends.

use crate::crawler::{RunOutcome, RunReport};
use crate::extract::ContentKind;
use crate::state::PageState;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Resources dispatched to a pipeline that reached a final state
    pub pages_visited: u64,

    /// Resources whose fetch failed (dead, blocked, unreachable, ...)
    pub pages_failed: u64,

    /// Resources not fetched because robots.txt disallowed them
    pub pages_skipped: u64,

    /// PDF, DOCX and DOC files fetched successfully
    pub documents_processed: u64,

    /// Documents that could not be decoded
    pub extraction_errors: u64,

    /// Unique addresses in the result set
    pub addresses_found: u64,

    /// Extra fetch attempts beyond the first
    pub retries: u64,

    /// Whether the run timeout cut the crawl short
    pub timed_out: bool,

    /// Final state counts keyed by state name
    pub pages_by_state: BTreeMap<&'static str, u64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts for one finished resource
    pub fn record_page(&mut self, state: PageState, content: ContentKind, attempts: u32) {
        self.pages_visited += 1;
        self.retries += u64::from(attempts.saturating_sub(1));
        *self.pages_by_state.entry(state.as_str()).or_insert(0) += 1;

        if state.is_error() {
            self.pages_failed += 1;
        }
        if state.is_skipped() {
            self.pages_skipped += 1;
        }
        if state == PageState::Malformed {
            self.extraction_errors += 1;
        }
        if state == PageState::Processed && content.is_document() {
            self.documents_processed += 1;
        }
    }

    /// Visited resources whose content was retrieved
    pub fn pages_fetched(&self) -> u64 {
        self.pages_visited
            .saturating_sub(self.pages_failed)
            .saturating_sub(self.pages_skipped)
    }

    /// Share of visited resources that were fetched, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        (self.pages_fetched() as f64 / self.pages_visited as f64) * 100.0
    }
}

/// Prints the end-of-run summary to stdout
pub fn print_report(report: &RunReport) {
    let stats = &report.stats;

    println!("=== Harvest Report ===\n");
    println!("Target: {}", report.target);
    println!("Run state: {}", report.state);
    if stats.timed_out {
        println!("Run timeout reached; results are partial");
    }
    println!();

    println!("Overview:");
    println!("  Pages visited: {}", stats.pages_visited);
    println!("  Pages failed: {}", stats.pages_failed);
    println!("  Pages skipped (robots.txt): {}", stats.pages_skipped);
    println!("  Documents processed: {}", stats.documents_processed);
    println!("  Extraction errors: {}", stats.extraction_errors);
    println!("  Retries: {}", stats.retries);
    println!("  Addresses found: {}", stats.addresses_found);
    println!();

    if !stats.pages_by_state.is_empty() {
        println!("Pages by State:");
        let mut state_counts: Vec<_> = stats.pages_by_state.iter().collect();
        state_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (state, count) in state_counts {
            let percentage = (*count as f64 / stats.pages_visited as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", state, count, percentage);
        }
        println!();
    }

    match &report.outcome {
        RunOutcome::Exported(paths) => {
            for path in paths {
                println!("Exported: {}", path.display());
            }
        }
        RunOutcome::Aborted(reason) => println!("Aborted: {} (nothing exported)", reason),
        RunOutcome::ExportFailed(error) => println!("Export failed: {}", error),
    }

    println!(
        "Success Rate: {:.1}% ({} / {} resources fetched)",
        stats.success_rate(),
        stats.pages_fetched(),
        stats.pages_visited
    );
}
