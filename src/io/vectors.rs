//! Delimited feature-vector output.
//!
//! Columns are the registry's sensor names in registry order followed by
//! the five activity label columns. A header row repeats those names.

use crate::collector::types::ActivityLabel;
use crate::core::registry::SensorRegistry;
use crate::core::vector::{ActivityLabels, FeatureVector};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;

/// How an output file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Emit a header row (only into an empty file when appending)
    #[serde(default = "default_true")]
    pub include_headers: bool,
    /// Append to an existing file instead of replacing it
    #[serde(default = "default_true")]
    pub append: bool,
}

fn default_true() -> bool {
    true
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            include_headers: true,
            append: true,
        }
    }
}

/// Output column names for `registry`.
pub fn header(registry: &SensorRegistry) -> Vec<String> {
    registry
        .names()
        .map(str::to_string)
        .chain(ActivityLabel::ALL.iter().map(|l| l.column_name().to_string()))
        .collect()
}

/// Write `vectors` to `writer`, optionally preceded by a header row.
///
/// A vector whose width differs from the registry fails the write with
/// `MalformedRecord` before its row is emitted.
pub fn write_vectors<W: Write>(
    writer: W,
    registry: &SensorRegistry,
    vectors: &[FeatureVector],
    include_header: bool,
) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    if include_header {
        csv_writer.write_record(header(registry))?;
    }

    for (i, vector) in vectors.iter().enumerate() {
        if vector.values.len() != registry.len() {
            return Err(Error::MalformedRecord {
                row: i + 1,
                reason: format!(
                    "feature vector has {} values, registry has {} sensors",
                    vector.values.len(),
                    registry.len()
                ),
            });
        }
        let row = vector
            .values
            .iter()
            .map(|v| v.to_string())
            .chain(vector.labels.flags().into_iter().map(|f| f.to_string()));
        csv_writer.write_record(row)?;
    }

    csv_writer.flush()?;
    Ok(vectors.len())
}

/// Write `vectors` to a file.
///
/// When appending, the header goes in only if the file is new or empty so
/// repeated runs never interleave header rows with data.
pub fn write_vectors_to_path(
    path: &Path,
    registry: &SensorRegistry,
    vectors: &[FeatureVector],
    options: WriteOptions,
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(options.append)
        .truncate(!options.append)
        .open(path)?;

    let is_empty = file.metadata()?.len() == 0;
    let include_header = options.include_headers && (!options.append || is_empty);

    let written = write_vectors(file, registry, vectors, include_header)?;
    tracing::info!(
        path = %path.display(),
        vectors = written,
        append = options.append,
        "Wrote feature vectors"
    );
    Ok(written)
}

/// A parsed output file, addressed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl VectorTable {
    /// Parse a file that starts with a header row.
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for (i, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row = record
                .iter()
                .map(|field| {
                    field.trim().parse::<f64>().map_err(|e| Error::MalformedRecord {
                        row: i + 1,
                        reason: format!("{field:?}: {e}"),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read(file)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let i = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[i]).collect())
    }

    /// Rebuild feature vectors for `registry`, looking every column up by
    /// name. Fails if a sensor or label column is missing.
    pub fn to_vectors(&self, registry: &SensorRegistry) -> Result<Vec<FeatureVector>> {
        let missing = |name: &str| Error::MalformedRecord {
            row: 0,
            reason: format!("missing column {name:?}"),
        };

        let value_columns = registry
            .names()
            .map(|name| self.column_index(name).ok_or_else(|| missing(name)))
            .collect::<Result<Vec<usize>>>()?;
        let label_columns = ActivityLabel::ALL
            .iter()
            .map(|l| {
                self.column_index(l.column_name())
                    .ok_or_else(|| missing(l.column_name()))
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(self
            .rows
            .iter()
            .map(|row| {
                let mut flags = [0u8; 5];
                for (flag, &col) in flags.iter_mut().zip(&label_columns) {
                    *flag = u8::from(row[col] != 0.0);
                }
                FeatureVector {
                    values: value_columns.iter().map(|&c| row[c]).collect(),
                    labels: ActivityLabels::from_flags(flags),
                }
            })
            .collect())
    }
}
