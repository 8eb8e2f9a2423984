//! Run options and environment-driven settings.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::path::PathBuf;

use crate::transforms::{CsvFlush, Operation};

/// Default grid endpoint: the NREL WIND Toolkit coordinate dataset, sampled
/// every 32nd row and 60th column.
pub const DEFAULT_GRID_URL: &str = "https://developer.nrel.gov/api/hsds//datasets/d-70e214c6-85f4-11e7-bf89-0242ac110008/value?select=[0:1601:32,0:2975:60]&host=/nrel/wtk-us.h5";

/// Query parameter that carries the NREL API key.
pub const API_KEY_PARAM: &str = "api_key";

/// Format accepted for `--epoch`.
pub const EPOCH_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Everything the pipeline needs to know about one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub operation: Operation,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Time covered by each input group.
    pub interval: TimeDelta,
    /// Instant of time index 0.
    pub epoch: NaiveDateTime,
    pub csv_flush: CsvFlush,
}

impl RunConfig {
    /// A config with the default epoch, a one-hour interval and per-file CSV flushing.
    pub fn new(operation: Operation, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            operation,
            input: input.into(),
            output: output.into(),
            interval: TimeDelta::hours(1),
            epoch: default_epoch(),
            csv_flush: CsvFlush::default(),
        }
    }

    pub fn with_interval_hours(mut self, hours: u32) -> Result<Self> {
        self.interval = interval_from_hours(hours)?;
        Ok(self)
    }
}

/// Start of the source dataset, 2007-01-01T00:00:00.
pub fn default_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2007, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

pub fn parse_epoch(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, EPOCH_FORMAT)
        .with_context(|| format!("Epoch '{s}' does not match {EPOCH_FORMAT}"))
}

pub fn interval_from_hours(hours: u32) -> Result<TimeDelta> {
    if hours == 0 {
        bail!("Interval must be at least one hour");
    }
    Ok(TimeDelta::hours(i64::from(hours)))
}

/// Where and how to fetch the coordinate grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSettings {
    pub url: String,
    pub api_key: Option<String>,
}

impl GridSettings {
    /// Reads `GHI_GRID_URL` and `NREL_API_KEY`; an explicit `url` wins over the environment.
    pub fn from_env(url: Option<String>) -> Self {
        let url = url
            .or_else(|| std::env::var("GHI_GRID_URL").ok())
            .unwrap_or_else(|| DEFAULT_GRID_URL.to_string());
        let api_key = std::env::var("NREL_API_KEY").ok().filter(|k| !k.is_empty());

        Self { url, api_key }
    }
}
