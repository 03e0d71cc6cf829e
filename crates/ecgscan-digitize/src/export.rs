// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exporter — writes a calibrated dataset as delimited text:
//
//     sample period <float>
//     <blank line>
//     <lead><sep><lead>...
//     <value><sep><value>...   (one row per sample index)
//
// Columns follow the canonical lead rank; every line ends in '\n'.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ecgscan_core::error::Result;
use ecgscan_core::types::CalibratedDataset;
use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};

/// Summary of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    /// Number of data rows written (the aligned sequence length).
    pub rows: usize,
    /// Number of lead columns written.
    pub columns: usize,
    /// Whether an existing file at `path` was replaced.
    pub overwrote: bool,
}

/// Export `dataset` to `destination`.
///
/// The dataset is validated before anything touches the disk. Rows are
/// written to a temporary file next to the destination, which replaces the
/// destination only once every row has been flushed, so a failed export
/// never leaves a truncated file behind. Replacing an existing file is
/// allowed but logged as a warning and flagged in the report.
///
/// The replaced file's permissions carry over to the new one. A new file on
/// Unix gets mode 0644 rather than the owner-only mode of the staging file.
#[instrument(skip_all, fields(path = %destination.as_ref().display(), leads = dataset.leads.len()))]
pub fn export(
    dataset: &CalibratedDataset,
    destination: impl AsRef<Path>,
    separator: &str,
) -> Result<ExportReport> {
    let destination = destination.as_ref();
    let rows = dataset.validate()?;

    let overwrote = destination.exists();
    if overwrote {
        warn!(path = %destination.display(), "Output file will be overwritten");
    }

    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(directory)?;
    if overwrote {
        let permissions = std::fs::metadata(destination)?.permissions();
        staging.as_file().set_permissions(permissions)?;
    } else {
        set_default_permissions(staging.as_file())?;
    }
    {
        let mut writer = BufWriter::new(staging.as_file_mut());
        write_dataset(dataset, &mut writer, separator)?;
        writer.flush()?;
    }
    staging.as_file().sync_all()?;
    staging.persist(destination).map_err(|err| err.error)?;

    info!(rows, columns = dataset.leads.len(), overwrote, "Signals exported");
    Ok(ExportReport {
        path: destination.to_path_buf(),
        rows,
        columns: dataset.leads.len(),
        overwrote,
    })
}

#[cfg(unix)]
fn set_default_permissions(file: &File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &File) -> Result<()> {
    Ok(())
}

/// Serialize `dataset` into any writer using the export layout.
///
/// Returns the number of data rows written.
pub fn write_dataset<W: Write>(
    dataset: &CalibratedDataset,
    writer: &mut W,
    separator: &str,
) -> Result<usize> {
    let rows = dataset.validate()?;

    // BTreeMap iteration is already in LeadId order; sort by rank explicitly
    // so the column order does not hinge on the map type.
    let mut columns: Vec<_> = dataset.leads.iter().collect();
    columns.sort_by_key(|(lead, _)| lead.rank());

    writeln!(writer, "sample period {}", format_value(dataset.sampling_period))?;
    writeln!(writer)?;

    let header: Vec<&str> = columns.iter().map(|(lead, _)| lead.name()).collect();
    writeln!(writer, "{}", header.join(separator))?;

    let mut line = String::new();
    for row in 0..rows {
        line.clear();
        for (index, (_, samples)) in columns.iter().enumerate() {
            if index > 0 {
                line.push_str(separator);
            }
            line.push_str(&format_value(samples[row]));
        }
        line.push('\n');
        writer.write_all(line.as_bytes())?;
    }
    Ok(rows)
}

/// Render the export layout into a string.
pub fn render_dataset(dataset: &CalibratedDataset, separator: &str) -> Result<String> {
    let mut buffer = Vec::new();
    write_dataset(dataset, &mut buffer, separator)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Shortest round-trip text for a float, always with a decimal point or
/// exponent (`5.0`, not `5`).
fn format_value(value: f64) -> String {
    format!("{value:?}")
}
