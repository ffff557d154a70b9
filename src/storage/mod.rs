//! Reassignment table and run summary persistence

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;
use serde_json::to_string_pretty;

use crate::cluster::{Reassignment, ReassignmentTable};
use crate::config::DEFAULT_TABLE_FILE;
use crate::error::{AmalgamateError, Result};

/// Table sink used when the caller names none
pub fn default_table_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_TABLE_FILE)
}

/// Per-round variant of a table path: `dir/table.csv` -> `dir/table_3.csv`
pub fn round_table_path(base: &Path, round: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "amalgamation_table".to_string());

    let file_name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, round, ext.to_string_lossy()),
        None => format!("{}_{}", stem, round),
    };

    base.with_file_name(file_name)
}

/// Write the table as two-column CSV without a header
pub fn write_table(table: &ReassignmentTable, path: &Path) -> Result<()> {
    log::info!("Writing {} reassignments to {}", table.len(), path.display());

    write_rows(table, path).map_err(|source| AmalgamateError::TableWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn write_rows(table: &ReassignmentTable, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let (originals, news): (Vec<&str>, Vec<&str>) = table
        .entries()
        .iter()
        .map(|entry| (entry.original.as_str(), entry.new.as_str()))
        .unzip();

    let mut frame = DataFrame::new(vec![
        Column::new("original".into(), originals),
        Column::new("new".into(), news),
    ])
    .map_err(std::io::Error::other)?;

    // Default quote style only quotes fields that need it
    let mut file = BufWriter::new(File::create(path)?);
    CsvWriter::new(&mut file)
        .include_header(false)
        .finish(&mut frame)
        .map_err(std::io::Error::other)?;
    file.flush()
}

/// Read a table written by [`write_table`]
pub fn read_table(path: &Path) -> Result<ReassignmentTable> {
    log::info!("Reading reassignment table: {}", path.display());

    if fs::metadata(path)?.len() == 0 {
        return Ok(ReassignmentTable::default());
    }

    let frame = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let [original, new] = frame.get_columns() else {
        return Err(AmalgamateError::shape(
            "2 columns in reassignment table",
            format!("{} columns", frame.width()),
        ));
    };

    let entries = original
        .str()?
        .into_iter()
        .zip(new.str()?.into_iter())
        .map(|(original, new)| Reassignment {
            original: original.unwrap_or_default().to_string(),
            new: new.unwrap_or_default().to_string(),
        })
        .collect();

    Ok(ReassignmentTable::new(entries))
}

/// Save a JSON summary of a run
pub fn save_summary<T: Serialize>(summary: &T, path: &Path) -> Result<()> {
    log::info!("Saving summary to {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(summary)?.as_bytes())?;

    Ok(())
}
