//! Dataset loader: CSV file -> normalized [`Dataset`].
//!
//! Normalization order: trim and upper-case headers, drop administrative
//! columns, rename known columns, infer column kinds, then replace null text
//! cells with [`config::NOT_SPECIFIED`]. Bad rows fail soft; only a file that
//! cannot be opened or read as a table is an error.

use crate::config::{self, LoaderConfig};
use crate::error::LoadError;
use crate::types::{Cell, Column, ColumnKind, Dataset, Record, Schema};
use crate::util::parse_f64_safe;
use csv::ReaderBuilder;
use log::{debug, info, warn};
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Data rows seen, including the dropped ones.
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Rows the CSV reader could not decode.
    pub dropped_rows: usize,
    /// Numeric cells that did not parse and were set to null.
    pub coerced_cells: usize,
    pub dropped_columns: Vec<String>,
}

/// Load `path` with the default [`LoaderConfig`], labelling the dataset with
/// the file stem.
pub fn load(path: &Path) -> Result<Dataset, LoadError> {
    let label = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string();
    load_with(path, &label, &LoaderConfig::default()).map(|(ds, _)| ds)
}

pub fn load_with(
    path: &Path,
    label: &str,
    cfg: &LoaderConfig,
) -> Result<(Dataset, LoadReport), LoadError> {
    let rdr = ReaderBuilder::new()
        .flexible(true)
        .delimiter(cfg.delimiter)
        .from_path(path)
        .map_err(|source| LoadError::Open { path: path.to_path_buf(), source })?;
    read_table(rdr, path, label, cfg)
}

/// Load from any reader; `origin` only names the source in errors.
pub fn load_from_reader<R: io::Read>(
    reader: R,
    origin: &Path,
    label: &str,
    cfg: &LoaderConfig,
) -> Result<(Dataset, LoadReport), LoadError> {
    let rdr = ReaderBuilder::new()
        .flexible(true)
        .delimiter(cfg.delimiter)
        .from_reader(reader);
    read_table(rdr, origin, label, cfg)
}

fn read_table<R: io::Read>(
    mut rdr: csv::Reader<R>,
    origin: &Path,
    label: &str,
    cfg: &LoaderConfig,
) -> Result<(Dataset, LoadReport), LoadError> {
    let raw_headers: Vec<String> = rdr
        .headers()
        .map_err(|source| LoadError::NotTabular { path: origin.to_path_buf(), source })?
        .iter()
        .map(|h| h.trim().to_uppercase())
        .collect();
    if raw_headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::NoHeader { path: origin.to_path_buf() });
    }

    let mut report = LoadReport::default();
    let mut kept: Vec<usize> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    for (i, h) in raw_headers.iter().enumerate() {
        if config::DROPPED_COLUMNS.contains(&h.as_str()) {
            report.dropped_columns.push(h.clone());
            continue;
        }
        kept.push(i);
        names.push(normalize_column_name(h));
    }
    debug!("{label}: dropped columns {:?}", report.dropped_columns);

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("{label}: dropping row {}: {e}", report.total_rows);
                report.dropped_rows += 1;
                continue;
            }
        };
        // Extra trailing fields are ignored, missing ones read as null.
        let row = kept
            .iter()
            .map(|&i| {
                record
                    .get(i)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| v.to_string())
            })
            .collect();
        raw_rows.push(row);
    }

    let kinds: Vec<ColumnKind> = names
        .iter()
        .enumerate()
        .map(|(c, name)| infer_kind(name, raw_rows.iter().map(|r| r[c].as_deref()), cfg))
        .collect();

    let rows: Vec<Record> = raw_rows
        .into_iter()
        .map(|raw| {
            raw.into_iter()
                .zip(&kinds)
                .map(|(value, kind)| to_cell(value, *kind, &mut report.coerced_cells))
                .collect()
        })
        .collect();

    report.kept_rows = rows.len();
    if report.dropped_rows > 0 {
        warn!("{label}: {} malformed rows skipped", report.dropped_rows);
    }
    if report.coerced_cells > 0 {
        warn!("{label}: {} unparseable numeric cells set to null", report.coerced_cells);
    }

    let columns = names
        .into_iter()
        .zip(kinds)
        .map(|(name, kind)| Column { name, kind })
        .collect();
    info!("{label}: loaded {} rows from {}", report.kept_rows, origin.display());
    Ok((Dataset::new(label, Schema::new(columns), rows), report))
}

/// Map an upper-cased raw header onto the fixed vocabulary; unknown headers
/// pass through unchanged.
pub fn normalize_column_name(upper: &str) -> String {
    config::COLUMN_RENAMES
        .get(upper)
        .map(|s| s.to_string())
        .unwrap_or_else(|| upper.to_string())
}

fn infer_kind<'a>(
    name: &str,
    values: impl Iterator<Item = Option<&'a str>>,
    cfg: &LoaderConfig,
) -> ColumnKind {
    if config::FORCED_TEXT_COLUMNS.contains(&name) {
        return ColumnKind::Text;
    }
    let mut seen = 0usize;
    for v in values.take(cfg.infer_schema_rows).flatten() {
        if parse_f64_safe(Some(v)).is_none() {
            return ColumnKind::Text;
        }
        seen += 1;
    }
    if seen > 0 {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

fn to_cell(value: Option<String>, kind: ColumnKind, coerced: &mut usize) -> Cell {
    match kind {
        ColumnKind::Text => {
            Cell::Text(value.unwrap_or_else(|| config::NOT_SPECIFIED.to_string()))
        }
        ColumnKind::Numeric => match value {
            None => Cell::Null,
            Some(v) => match parse_f64_safe(Some(&v)) {
                Some(n) => Cell::Number(n),
                None => {
                    *coerced += 1;
                    Cell::Null
                }
            },
        },
    }
}
