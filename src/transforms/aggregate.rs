//! Streaming energy aggregation over time buckets.
//!
//! Groups arrive in non-decreasing time order. Each one is integrated over
//! its duration (irradiance assumed constant across the interval) and merged
//! position by position into the bucket for its period. A bucket is written
//! as soon as a group for a later period arrives, so only one bucket is ever
//! held in memory. Buckets are not tied to input files.

use anyhow::{Result, bail};
use chrono::{NaiveDateTime, TimeDelta};
use std::path::PathBuf;
use tracing::{debug, info};

use super::Transform;
use super::period::{Period, key_file_name};
use crate::feature::FeatureGroup;
use crate::output::write_json;

/// Raw irradiance property consumed by the aggregation.
pub const GHI: &str = "ghi";

pub struct Aggregator {
    period: Period,
    output_dir: PathBuf,
    current: Option<Bucket>,
    buckets_written: usize,
}

struct Bucket {
    key: NaiveDateTime,
    features: FeatureGroup,
}

impl Aggregator {
    pub fn new(period: Period, output_dir: PathBuf) -> Self {
        Self {
            period,
            output_dir,
            current: None,
            buckets_written: 0,
        }
    }

    /// Number of buckets flushed so far.
    pub fn buckets_written(&self) -> usize {
        self.buckets_written
    }

    /// Replaces `ghi` with `ghi × seconds` under the period's energy property.
    fn integrate(&self, group: &mut FeatureGroup, seconds: f64) -> Result<()> {
        let property = self.period.energy_property();
        for feature in group.iter_mut() {
            let ghi = feature.take_number(GHI)?;
            feature.set_number(property, ghi * seconds);
        }
        Ok(())
    }

    /// Writes the in-progress bucket, if any.
    pub fn flush(&mut self) -> Result<()> {
        let Some(bucket) = self.current.take() else {
            return Ok(());
        };

        let path = self.output_dir.join(key_file_name(bucket.key));
        write_json(&path, &bucket.features)?;
        self.buckets_written += 1;

        info!(
            key = %bucket.key,
            locations = bucket.features.len(),
            path = %path.display(),
            "Bucket written"
        );
        Ok(())
    }
}

/// Adds `incoming` into `bucket` pairwise, after checking that both groups
/// describe the same locations in the same order.
fn merge_into(bucket: &mut FeatureGroup, incoming: &FeatureGroup, property: &str) -> Result<()> {
    if bucket.len() != incoming.len() {
        bail!(
            "group has {} locations but the bucket has {}",
            incoming.len(),
            bucket.len()
        );
    }

    for (i, (acc, next)) in bucket.iter_mut().zip(incoming).enumerate() {
        if acc.geometry.coordinates != next.geometry.coordinates {
            bail!(
                "location {i} moved from {} to {}; groups must keep the same location order",
                acc.geometry.coordinates,
                next.geometry.coordinates
            );
        }
        let sum = acc.number(property)? + next.number(property)?;
        acc.set_number(property, sum);
    }

    Ok(())
}

impl Transform for Aggregator {
    fn append(&mut self, instant: NaiveDateTime, duration: TimeDelta, mut group: FeatureGroup) -> Result<()> {
        let key = self.period.truncate(instant);

        let seconds = duration.num_milliseconds() as f64 / 1000.0;
        self.integrate(&mut group, seconds)?;

        match &mut self.current {
            Some(bucket) if bucket.key == key => {
                let property = self.period.energy_property();
                merge_into(&mut bucket.features, &group, property)
                    .map_err(|e| e.context(format!("Cannot merge group at {instant} into bucket {key}")))?;
            }
            Some(bucket) if key < bucket.key => {
                bail!(
                    "Group at {instant} belongs to bucket {key}, which precedes the bucket in progress ({}); input must be in time order",
                    bucket.key
                );
            }
            _ => {
                self.flush()?;
                debug!(%key, "Starting bucket");
                self.current = Some(Bucket { key, features: group });
            }
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()?;
        info!(buckets = self.buckets_written, period = ?self.period, "Aggregation complete");
        Ok(())
    }
}
