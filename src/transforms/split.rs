use anyhow::Result;
use chrono::{NaiveDateTime, TimeDelta};
use std::path::PathBuf;
use tracing::debug;

use super::Transform;
use crate::feature::FeatureGroup;
use crate::output::write_json;

/// Writes every group to its own `<instant>.json` document, named like
/// `2007-01-01T020000.json` so the name is valid on every filesystem.
pub struct IndexSplitter {
    output_dir: PathBuf,
    written: usize,
}

impl IndexSplitter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            written: 0,
        }
    }
}

impl Transform for IndexSplitter {
    fn append(&mut self, instant: NaiveDateTime, _duration: TimeDelta, group: FeatureGroup) -> Result<()> {
        let name = format!("{}.json", instant.format("%Y-%m-%dT%H%M%S"));
        write_json(&self.output_dir.join(&name), &group)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        debug!(documents = self.written, "Split complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use chrono::NaiveDate;
    use serde_json::{Value, json};
    use std::fs;

    #[test]
    fn test_one_document_per_group() {
        let dir = tempfile::tempdir().unwrap();
        let mut split = IndexSplitter::new(dir.path().to_path_buf());
        let feature: Feature = serde_json::from_value(json!({
            "geometry": {"type": "Point", "coordinates": [1, 2]},
            "properties": {"ghi": 3}
        }))
        .unwrap();

        let start = NaiveDate::from_ymd_opt(2007, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        for h in 0..3 {
            split
                .append(start + TimeDelta::hours(h), TimeDelta::hours(1), vec![feature.clone()])
                .unwrap();
        }
        split.finish().unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
        let doc: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("2007-01-01T020000.json")).unwrap()).unwrap();
        assert_eq!(doc[0]["properties"]["ghi"], json!(3));
    }
}
