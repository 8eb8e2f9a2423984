//! Repairs records that carry their date in the properties.
//!
//! The affected files hold polygons mislabelled with a point geometry type,
//! the raw value under `ghi` instead of `energy`, and a `time_stamp` date
//! string. Features are regrouped by that calendar date, one document per date.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

use super::Transform;
use super::aggregate::GHI;
use super::period::key_file_name;
use crate::feature::{Feature, FeatureGroup};
use crate::output::write_json;

const TIME_STAMP: &str = "time_stamp";
const TIME_STAMP_FORMAT: &str = "%Y-%m-%d";
const ENERGY: &str = "energy";
const GEOMETRY_TYPE: &str = "Polygon";

pub struct StructureFixer {
    output_dir: PathBuf,
    by_date: BTreeMap<NaiveDate, Vec<Feature>>,
}

impl StructureFixer {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            by_date: BTreeMap::new(),
        }
    }

    fn repair(feature: &mut Feature) -> Result<NaiveDate> {
        let stamp = feature.take_string(TIME_STAMP)?;
        let date = NaiveDate::parse_from_str(&stamp, TIME_STAMP_FORMAT)
            .with_context(|| format!("'{stamp}' is not a {TIME_STAMP_FORMAT} date"))?;

        let value = feature.take_value(GHI)?;
        feature.properties.insert(ENERGY.to_string(), value);
        feature.geometry.kind = Some(GEOMETRY_TYPE.to_string());

        Ok(date)
    }
}

impl Transform for StructureFixer {
    fn append(&mut self, _instant: NaiveDateTime, _duration: TimeDelta, group: FeatureGroup) -> Result<()> {
        for mut feature in group {
            let date = Self::repair(&mut feature)?;
            self.by_date.entry(date).or_default().push(feature);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let dates = self.by_date.len();
        for (date, features) in std::mem::take(&mut self.by_date) {
            let name = key_file_name(date.and_time(NaiveTime::MIN));
            write_json(&self.output_dir.join(name), &features)?;
        }
        info!(dates, "Date documents written");
        Ok(())
    }
}
