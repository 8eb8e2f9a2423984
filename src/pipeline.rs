//! Drives a transform over every input file.
//!
//! Files are read one at a time and fed group by group into the transform;
//! the transform's state carries across files and is finalized once after
//! the last one.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::files::{self, InputFile, instant_for};
use crate::reader::read_groups;
use crate::services::grid_api::GridApi;
use crate::transforms::{self, Operation, Transform};

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub groups: usize,
}

/// Checks that `output` exists, is a directory, and is empty.
///
/// # Errors
///
/// Returns an error describing which precondition failed.
pub fn ensure_output_dir(output: &Path) -> Result<()> {
    if !output.is_dir() {
        bail!("Output directory {} must already exist", output.display());
    }

    let mut entries = fs::read_dir(output)
        .with_context(|| format!("Failed to list output directory {}", output.display()))?;
    if entries.next().is_some() {
        bail!("Output directory {} must be empty", output.display());
    }

    Ok(())
}

/// Lists the input files in processing order for `op`.
///
/// Files without a start index are dropped with a warning when `op` needs
/// absolute instants, and read as index 0 otherwise.
pub fn plan_files(input: &Path, op: Operation) -> Result<(Vec<InputFile>, usize)> {
    let mut found = files::discover(input)?;

    if op.sorts_files() {
        files::sort_by_start_index(&mut found);
    } else {
        found.sort_by(|a, b| a.path.cmp(&b.path));
    }

    if !op.needs_time_index() {
        let planned = found
            .into_iter()
            .map(|f| InputFile {
                start_index: Some(0),
                ..f
            })
            .collect();
        return Ok((planned, 0));
    }

    let (planned, skipped): (Vec<_>, Vec<_>) = found.into_iter().partition(|f| f.start_index.is_some());
    for file in &skipped {
        warn!(path = %file.path.display(), "File name has no numeric start index, skipping");
    }

    Ok((planned, skipped.len()))
}

/// Feeds every planned file through `transform` and finalizes it.
#[tracing::instrument(skip_all, fields(operation = ?config.operation, files = planned.len()))]
pub fn process(config: &RunConfig, planned: &[InputFile], transform: &mut dyn Transform) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    info!(interval = %config.interval, epoch = %config.epoch, "Processing files");

    for (file_index, file) in planned.iter().enumerate() {
        let start_index = file.start_index.unwrap_or(0);
        info!(
            path = %file.path.display(),
            start = ?instant_for(config.epoch, config.interval, start_index),
            "File start time"
        );

        let groups = read_groups(&file.path)?;

        transform.start_file(&file.path)?;
        for (time_index, group) in groups.into_iter().enumerate() {
            let index = start_index + time_index as u64;
            let instant = instant_for(config.epoch, config.interval, index)
                .with_context(|| format!("Time index {index} in {} is out of range", file.path.display()))?;
            transform
                .append(instant, config.interval, group)
                .with_context(|| format!("Failed on group {time_index} of {}", file.path.display()))?;
            summary.groups += 1;
        }
        transform.end_file()?;

        summary.files_processed += 1;
        info!("File {} of {} completed", file_index + 1, planned.len());
    }

    transform.finish()?;
    Ok(summary)
}

/// Runs `config.operation` end to end.
///
/// The output directory is validated before any input is read and before
/// the coordinate grid is requested.
pub fn run(config: &RunConfig, grid: &dyn GridApi) -> Result<RunSummary> {
    ensure_output_dir(&config.output)?;

    let (planned, skipped) = plan_files(&config.input, config.operation)?;
    let mut transform = transforms::build(config.operation, &config.output, config.csv_flush, grid)?;

    let mut summary = process(config, &planned, transform.as_mut())?;
    summary.files_skipped = skipped;

    info!(
        processed = summary.files_processed,
        skipped = summary.files_skipped,
        groups = summary.groups,
        "Run complete"
    );
    Ok(summary)
}
