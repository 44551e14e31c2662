use crate::aggregate::ResultSet;
use crate::output::traits::{write_atomically, Exporter};
use crate::ExportError;
use chrono::SecondsFormat;
use std::path::Path;

/// Column order of the result table
pub const CSV_HEADER: [&str; 4] = ["email", "first_seen_url", "source_urls", "discovered_at"];

/// One row per address, ordered by address
#[derive(Debug, Clone)]
pub struct CsvExporter {
    /// Joins the entries of the `source_urls` column
    pub source_delimiter: String,
}

impl CsvExporter {
    pub fn new(source_delimiter: impl Into<String>) -> Self {
        Self {
            source_delimiter: source_delimiter.into(),
        }
    }
}

impl Exporter for CsvExporter {
    fn format_name(&self) -> &'static str {
        "csv"
    }

    fn export(&self, results: &ResultSet, destination: &Path) -> Result<(), ExportError> {
        write_atomically(destination, |out| {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(CSV_HEADER)?;

            for (address, record) in results.iter() {
                let sources = record
                    .source_urls
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(&self.source_delimiter);
                let discovered_at = record
                    .discovered_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true);

                writer.write_record([
                    address.as_str(),
                    record.first_seen_url.as_str(),
                    sources.as_str(),
                    discovered_at.as_str(),
                ])?;
            }

            writer.flush()?;
            Ok(())
        })
    }
}
