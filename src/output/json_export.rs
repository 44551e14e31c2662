use crate::aggregate::ResultSet;
use crate::extract::ExtractionMethod;
use crate::output::stats::RunStats;
use crate::output::traits::{write_atomically, Exporter};
use crate::ExportError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Full machine-readable report: run metadata, statistics and addresses
#[derive(Debug, Clone)]
pub struct JsonExporter {
    pub target: String,
    pub stats: RunStats,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    generated_at: DateTime<Utc>,
    stats: &'a RunStats,
    addresses: Vec<JsonAddress<'a>>,
}

#[derive(Serialize)]
struct JsonAddress<'a> {
    email: &'a str,
    first_seen_url: &'a str,
    source_urls: &'a BTreeSet<String>,
    discovered_at: DateTime<Utc>,
    methods: &'a BTreeSet<ExtractionMethod>,
}

impl JsonExporter {
    pub fn new(target: impl Into<String>, stats: RunStats) -> Self {
        Self {
            target: target.into(),
            stats,
        }
    }
}

impl Exporter for JsonExporter {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn export(&self, results: &ResultSet, destination: &Path) -> Result<(), ExportError> {
        let report = JsonReport {
            target: &self.target,
            generated_at: Utc::now(),
            stats: &self.stats,
            addresses: results
                .iter()
                .map(|(email, record)| JsonAddress {
                    email,
                    first_seen_url: &record.first_seen_url,
                    source_urls: &record.source_urls,
                    discovered_at: record.discovered_at,
                    methods: &record.methods,
                })
                .collect(),
        };

        write_atomically(destination, |out| {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            out.write_all(b"\n")?;
            Ok(())
        })
    }
}
