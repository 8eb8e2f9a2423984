//! Replaces grid-cell point geometries with their lon/lat cell polygon.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, TimeDelta};
use serde_json::{Value, json};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Transform;
use crate::feature::{Feature, FeatureGroup};
use crate::output::write_json;
use crate::services::grid_api::CoordinateGrid;

pub struct CoordinateEnricher {
    grid: CoordinateGrid,
    output_dir: PathBuf,
    file_name: Option<OsString>,
    records: Vec<Feature>,
    dropped: usize,
}

impl CoordinateEnricher {
    pub fn new(grid: CoordinateGrid, output_dir: PathBuf) -> Self {
        let (max_x, max_y) = grid.dims();
        debug!(max_x, max_y, "Coordinate grid ready");
        Self {
            grid,
            output_dir,
            file_name: None,
            records: Vec::new(),
            dropped: 0,
        }
    }

    /// Closed polygon around cell `(x, y)` as `[[pt1, pt2, pt3, pt4, pt1]]` in
    /// `[lon, lat]` order, or `None` when `x + 1` or `y + 1` falls off the grid.
    pub fn cell_polygon(&self, x: usize, y: usize) -> Option<Value> {
        let corner = |x: usize, y: usize| self.grid.get(x, y).map(|[lat, lon]| json!([lon, lat]));

        let pt1 = corner(x, y)?;
        let pt2 = corner(x + 1, y)?;
        let pt3 = corner(x + 1, y + 1)?;
        let pt4 = corner(x, y + 1)?;

        Some(json!([[pt1.clone(), pt2, pt3, pt4, pt1]]))
    }

    /// Features dropped so far because their cell sits on the grid edge.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Transform for CoordinateEnricher {
    fn start_file(&mut self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .with_context(|| format!("Input path {} has no file name", path.display()))?;
        self.file_name = Some(name.to_os_string());
        self.records.clear();
        Ok(())
    }

    fn append(&mut self, _instant: NaiveDateTime, _duration: TimeDelta, group: FeatureGroup) -> Result<()> {
        for mut feature in group {
            let (x, y) = feature.geometry.grid_index()?;
            match self.cell_polygon(x, y) {
                Some(polygon) => {
                    feature.geometry.coordinates = polygon;
                    self.records.push(feature);
                }
                None => {
                    debug!(x, y, "Cell on grid edge, dropping feature");
                    self.dropped += 1;
                }
            }
        }
        Ok(())
    }

    fn end_file(&mut self) -> Result<()> {
        let name = self
            .file_name
            .take()
            .context("end_file called without a matching start_file")?;

        let path = self.output_dir.join(&name);
        write_json(&path, &self.records)?;
        info!(file = %path.display(), features = self.records.len(), "Enriched file written");

        self.records.clear();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.dropped > 0 {
            warn!(dropped = self.dropped, "Features on the grid edge were dropped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // lat = 40 + x, lon = -100 + y
    fn grid(max_x: usize, max_y: usize) -> CoordinateGrid {
        let rows = (0..max_x)
            .map(|x| (0..max_y).map(|y| [40.0 + x as f64, -100.0 + y as f64]).collect())
            .collect();
        CoordinateGrid::new(rows).unwrap()
    }

    fn cell(x: u64, y: u64) -> Feature {
        serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [x, y]},
            "properties": {"energy": 1.0}
        }))
        .unwrap()
    }

    fn at() -> NaiveDateTime {
        NaiveDateTime::default()
    }

    #[test]
    fn test_polygon_vertex_order_and_axis_swap() {
        let enricher = CoordinateEnricher::new(grid(3, 3), PathBuf::new());
        let polygon = enricher.cell_polygon(1, 0).unwrap();
        assert_eq!(
            polygon,
            json!([[
                [-100.0, 41.0],
                [-100.0, 42.0],
                [-99.0, 42.0],
                [-99.0, 41.0],
                [-100.0, 41.0]
            ]])
        );
    }

    #[test]
    fn test_edge_cells_have_no_polygon() {
        let enricher = CoordinateEnricher::new(grid(3, 4), PathBuf::new());
        assert!(enricher.cell_polygon(1, 2).is_some());
        assert!(enricher.cell_polygon(2, 0).is_none());
        assert!(enricher.cell_polygon(0, 3).is_none());
        assert!(enricher.cell_polygon(9, 9).is_none());
    }

    #[test]
    fn test_file_output_drops_edge_features() {
        let dir = tempfile::tempdir().unwrap();
        let mut enricher = CoordinateEnricher::new(grid(2, 2), dir.path().to_path_buf());

        enricher.start_file(Path::new("/data/in/0-1.json")).unwrap();
        enricher
            .append(at(), TimeDelta::hours(1), vec![cell(0, 0), cell(1, 0), cell(0, 1)])
            .unwrap();
        enricher.end_file().unwrap();
        enricher.finish().unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("0-1.json")).unwrap()).unwrap();
        let features = doc.as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"][0][0], json!([-100.0, 40.0]));
        assert_eq!(features[0]["properties"]["energy"], json!(1.0));
        assert_eq!(enricher.dropped(), 2);
    }

    #[test]
    fn test_records_do_not_leak_between_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut enricher = CoordinateEnricher::new(grid(3, 3), dir.path().to_path_buf());

        for name in ["a.json", "b.json"] {
            enricher.start_file(Path::new(name)).unwrap();
            enricher.append(at(), TimeDelta::hours(1), vec![cell(0, 0)]).unwrap();
            enricher.end_file().unwrap();
        }

        let doc: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("b.json")).unwrap()).unwrap();
        assert_eq!(doc.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_path_without_file_name_is_rejected() {
        let mut enricher = CoordinateEnricher::new(grid(2, 2), PathBuf::new());
        let err = enricher.start_file(Path::new("/data/..")).unwrap_err();
        assert!(err.to_string().contains("/data/.."));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_file_name_is_kept() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let mut enricher = CoordinateEnricher::new(grid(2, 2), dir.path().to_path_buf());
        let name = OsStr::from_bytes(b"day-\xff.json");

        enricher.start_file(&Path::new("/data").join(name)).unwrap();
        enricher.append(at(), TimeDelta::hours(1), vec![cell(0, 0)]).unwrap();
        enricher.end_file().unwrap();

        assert!(dir.path().join(name).exists());
    }

    #[test]
    fn test_non_index_geometry_is_an_error() {
        let mut enricher = CoordinateEnricher::new(grid(3, 3), PathBuf::new());
        let mut feature = cell(0, 0);
        feature.geometry.coordinates = json!("somewhere");
        assert!(enricher.append(at(), TimeDelta::hours(1), vec![feature]).is_err());
    }
}
