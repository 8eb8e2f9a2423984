//! Per-location CSV series.
//!
//! The first group fixes the location table: location `i` is the `i`th
//! feature of that group, and every later group must list the same locations
//! in the same order. Output is `index.csv` (location → grid cell) plus one
//! `<i>.csv` per location holding its `Time,Value` series. The `Time,Value`
//! header line is written once when a location file is created, ahead of the
//! one row per group.
//!
//! Values are written as they appear in the input: `5` stays `5`, large
//! integers keep every digit and strings are written without quotes.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDateTime, TimeDelta};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use csv::WriterBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::Transform;
use super::aggregate::GHI;
use crate::feature::FeatureGroup;
use crate::output::append_records;

/// When buffered series rows are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CsvFlush {
    /// Append to the location files after every input file.
    #[default]
    PerFile,
    /// Hold the whole run in memory and write once at the end.
    AtEnd,
}

#[derive(Debug, Serialize)]
struct IndexRow {
    index: usize,
    x: Value,
    y: Value,
}

#[derive(Debug, Serialize)]
struct SeriesRow {
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Value")]
    value: String,
}

pub struct CsvExporter {
    output_dir: PathBuf,
    flush: CsvFlush,
    locations: Vec<Value>,
    series: Vec<Vec<SeriesRow>>,
    rows_written: usize,
}

impl CsvExporter {
    pub fn new(output_dir: PathBuf, flush: CsvFlush) -> Self {
        Self {
            output_dir,
            flush,
            locations: Vec::new(),
            series: Vec::new(),
            rows_written: 0,
        }
    }

    /// Number of locations in the table, 0 until the first group arrives.
    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    fn check_locations(&self, group: &FeatureGroup) -> Result<()> {
        if group.len() != self.locations.len() {
            bail!(
                "group has {} locations, expected {}",
                group.len(),
                self.locations.len()
            );
        }
        for (i, (feature, known)) in group.iter().zip(&self.locations).enumerate() {
            if &feature.geometry.coordinates != known {
                bail!(
                    "location {i} is {} but was {} in the first group",
                    feature.geometry.coordinates,
                    known
                );
            }
        }
        Ok(())
    }

    fn write_series(&mut self) -> Result<()> {
        let series = std::mem::take(&mut self.series);
        for (index, rows) in series.iter().enumerate() {
            append_records(&location_file(&self.output_dir, index), rows)?;
            self.rows_written += rows.len();
        }
        self.series = (0..self.locations.len()).map(|_| Vec::new()).collect();
        Ok(())
    }

    fn write_index(&self) -> Result<()> {
        let path = self.output_dir.join("index.csv");
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writer.write_record(["Location Index", "X", "Y"])?;
        for (index, coords) in self.locations.iter().enumerate() {
            writer.serialize(IndexRow {
                index,
                x: coords.get(0).cloned().unwrap_or(Value::Null),
                y: coords.get(1).cloned().unwrap_or(Value::Null),
            })?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl Transform for CsvExporter {
    fn append(&mut self, instant: NaiveDateTime, _duration: TimeDelta, group: FeatureGroup) -> Result<()> {
        if self.locations.is_empty() {
            self.locations = group.iter().map(|f| f.geometry.coordinates.clone()).collect();
            self.series = (0..self.locations.len()).map(|_| Vec::new()).collect();
            debug!(locations = self.locations.len(), "Location table built");
        } else {
            self.check_locations(&group)
                .with_context(|| format!("Group at {instant} does not match the location table"))?;
        }

        let time = instant.format("%Y-%m-%dT%H:%M:%S").to_string();
        for (rows, feature) in self.series.iter_mut().zip(&group) {
            rows.push(SeriesRow {
                time: time.clone(),
                value: render_value(feature.value(GHI)?),
            });
        }

        Ok(())
    }

    fn end_file(&mut self) -> Result<()> {
        match self.flush {
            CsvFlush::PerFile => self.write_series(),
            CsvFlush::AtEnd => Ok(()),
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.write_series()?;
        self.write_index()?;
        info!(
            locations = self.locations.len(),
            rows = self.rows_written,
            "CSV export complete"
        );
        Ok(())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Location file path helper for callers reading the export back.
pub fn location_file(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("{index}.csv"))
}
