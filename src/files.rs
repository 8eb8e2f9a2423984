//! Input discovery and filename-encoded time indices.
//!
//! Input files are named `<start index>-<anything>`, where the start index is
//! the number of intervals between the run epoch and the file's first group.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDateTime, TimeDelta};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An input file together with the time index parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub start_index: Option<u64>,
}

/// Parses the numeric prefix before the first `-` of a file name.
///
/// Returns `None` when there is no `-` or the prefix is not a non-negative integer.
pub fn parse_start_index(file_name: &str) -> Option<u64> {
    let (prefix, _) = file_name.split_once('-')?;
    prefix.parse().ok()
}

/// Absolute instant of the group at `index`: `epoch + index × interval`.
pub fn instant_for(epoch: NaiveDateTime, interval: TimeDelta, index: u64) -> Option<NaiveDateTime> {
    let steps = i32::try_from(index).ok()?;
    epoch.checked_add_signed(interval.checked_mul(steps)?)
}

/// Lists the candidate files for `input`: the file itself, or the regular
/// files directly inside a directory.
///
/// # Errors
///
/// Returns an error if `input` is neither a file nor a directory, or the
/// directory cannot be read.
pub fn discover(input: &Path) -> Result<Vec<InputFile>> {
    let paths = if input.is_file() {
        vec![input.to_path_buf()]
    } else if input.is_dir() {
        let mut paths = Vec::new();
        for entry in fs::read_dir(input)
            .with_context(|| format!("Failed to list input directory {}", input.display()))?
        {
            let path = entry?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths
    } else {
        bail!("Input {} is not a file or directory", input.display());
    };

    let files = paths
        .into_iter()
        .map(|path| {
            let start_index = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_start_index);
            debug!(path = %path.display(), ?start_index, "Discovered input file");
            InputFile { path, start_index }
        })
        .collect();

    Ok(files)
}

/// Orders files by start index, index-less files last, ties broken by path.
pub fn sort_by_start_index(files: &mut [InputFile]) {
    files.sort_by(|a, b| {
        (a.start_index.is_none(), a.start_index, &a.path)
            .cmp(&(b.start_index.is_none(), b.start_index, &b.path))
    });
}
