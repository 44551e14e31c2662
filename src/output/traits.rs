//! Exporter trait and the atomic write helper shared by all formats

use crate::aggregate::ResultSet;
use crate::ExportError;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes a result set to a destination
///
/// Implementations must leave `destination` either untouched or fully
/// written; a partially written file is never observable.
pub trait Exporter {
    /// Short name used in log messages
    fn format_name(&self) -> &'static str;

    fn export(&self, results: &ResultSet, destination: &Path) -> Result<(), ExportError>;
}

/// Writes to a temporary file next to `destination`, then renames it over
///
/// The temporary file lives in the destination directory so the rename
/// stays on one filesystem. On any error the temporary file is removed.
pub fn write_atomically<F>(destination: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), ExportError>,
{
    let unwritable = |source: std::io::Error| ExportError::Unwritable {
        path: destination.display().to_string(),
        source,
    };

    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(directory).map_err(unwritable)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(destination).map_err(|e| unwritable(e.error))?;
    Ok(())
}
