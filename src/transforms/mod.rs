//! The one-pass record transforms.
//!
//! Every transform consumes a stream of `(instant, duration, group)` tuples
//! bracketed by file boundaries, and writes its results into the output
//! directory. The set is closed: [`Operation`] selects one and [`build`]
//! constructs it.

pub mod aggregate;
pub mod csv_export;
pub mod enrich;
pub mod fix;
pub mod period;
pub mod split;

use anyhow::Result;
use chrono::{NaiveDateTime, TimeDelta};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

use crate::feature::FeatureGroup;
use crate::services::grid_api::GridApi;

pub use aggregate::Aggregator;
pub use csv_export::{CsvExporter, CsvFlush};
pub use enrich::CoordinateEnricher;
pub use fix::StructureFixer;
pub use period::Period;
pub use split::IndexSplitter;

/// A streaming transform driven by the pipeline.
pub trait Transform {
    /// Called before the first group of each input file.
    fn start_file(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }

    /// Consumes one group of records that share `instant`, each covering `duration`.
    fn append(&mut self, instant: NaiveDateTime, duration: TimeDelta, group: FeatureGroup) -> Result<()>;

    /// Called after the last group of each input file.
    fn end_file(&mut self) -> Result<()> {
        Ok(())
    }

    /// Writes whatever is still buffered. Called exactly once, after the last file.
    fn finish(&mut self) -> Result<()>;
}

/// The transform selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    Hourly,
    Daily,
    Monthly,
    Yearly,
    Addlatlon,
    Splitindex,
    Tocsv,
    Fix,
}

impl Operation {
    /// Whether groups need an absolute instant derived from the file name.
    ///
    /// Files without a start index are skipped for these operations and read
    /// as index 0 for the others.
    pub fn needs_time_index(self) -> bool {
        !matches!(self, Operation::Addlatlon | Operation::Fix)
    }

    /// Whether files are processed in start-index order.
    pub fn sorts_files(self) -> bool {
        !matches!(self, Operation::Fix)
    }

    pub fn period(self) -> Option<Period> {
        match self {
            Operation::Hourly => Some(Period::Hourly),
            Operation::Daily => Some(Period::Daily),
            Operation::Monthly => Some(Period::Monthly),
            Operation::Yearly => Some(Period::Yearly),
            _ => None,
        }
    }
}

/// Constructs the transform for `op`, writing into `output`.
///
/// The coordinate grid is only loaded for [`Operation::Addlatlon`].
pub fn build(
    op: Operation,
    output: &Path,
    csv_flush: CsvFlush,
    grid: &dyn GridApi,
) -> Result<Box<dyn Transform>> {
    let output: PathBuf = output.to_path_buf();

    let transform: Box<dyn Transform> = match op {
        Operation::Hourly => Box::new(Aggregator::new(Period::Hourly, output)),
        Operation::Daily => Box::new(Aggregator::new(Period::Daily, output)),
        Operation::Monthly => Box::new(Aggregator::new(Period::Monthly, output)),
        Operation::Yearly => Box::new(Aggregator::new(Period::Yearly, output)),
        Operation::Addlatlon => Box::new(CoordinateEnricher::new(grid.load_grid()?, output)),
        Operation::Splitindex => Box::new(IndexSplitter::new(output)),
        Operation::Tocsv => Box::new(CsvExporter::new(output, csv_flush)),
        Operation::Fix => Box::new(StructureFixer::new(output)),
    };

    Ok(transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_match_cli() {
        let names: Vec<_> = Operation::value_variants()
            .iter()
            .filter_map(|op| op.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(
            names,
            ["hourly", "daily", "monthly", "yearly", "addlatlon", "splitindex", "tocsv", "fix"]
        );
    }

    #[test]
    fn test_time_index_requirements() {
        assert!(Operation::Daily.needs_time_index());
        assert!(Operation::Tocsv.needs_time_index());
        assert!(Operation::Splitindex.needs_time_index());
        assert!(!Operation::Addlatlon.needs_time_index());
        assert!(!Operation::Fix.needs_time_index());
        assert!(!Operation::Fix.sorts_files());
    }

    #[test]
    fn test_period_mapping() {
        assert_eq!(Operation::Monthly.period(), Some(Period::Monthly));
        assert_eq!(Operation::Tocsv.period(), None);
    }
}
