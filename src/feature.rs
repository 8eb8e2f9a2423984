//! GeoJSON feature model for the irradiance records.
//!
//! Only the parts the transforms touch are typed; everything else rides
//! along in flattened maps so that a feature written back out keeps every
//! key it was read with.

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// All locations' records for one time instant, index-aligned across groups.
pub type FeatureGroup = Vec<Feature>;

/// One location's record at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub coordinates: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Geometry {
    /// Reads `coordinates` as an `(x, y)` grid cell index.
    ///
    /// # Errors
    ///
    /// Returns an error unless the coordinates are a pair of non-negative integers.
    pub fn grid_index(&self) -> Result<(usize, usize)> {
        let pair = self
            .coordinates
            .as_array()
            .filter(|c| c.len() >= 2)
            .ok_or_else(|| anyhow!("geometry coordinates are not an [x, y] pair: {}", self.coordinates))?;

        let axis = |v: &Value| -> Result<usize> {
            v.as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| anyhow!("grid index component {v} is not a non-negative integer"))
        };

        Ok((axis(&pair[0])?, axis(&pair[1])?))
    }
}

impl Feature {
    /// Removes a numeric property and returns its value.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is missing or not a number.
    pub fn take_number(&mut self, key: &str) -> Result<f64> {
        match self.properties.shift_remove(key) {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| anyhow!("property '{key}' is not numeric: {value}")),
            None => bail!("feature is missing property '{key}'"),
        }
    }

    /// Reads a numeric property without removing it.
    pub fn number(&self, key: &str) -> Result<f64> {
        match self.properties.get(key) {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| anyhow!("property '{key}' is not numeric: {value}")),
            None => bail!("feature is missing property '{key}'"),
        }
    }

    /// Removes a property and returns it untouched, whatever its JSON type.
    pub fn take_value(&mut self, key: &str) -> Result<Value> {
        self.properties
            .shift_remove(key)
            .ok_or_else(|| anyhow!("feature is missing property '{key}'"))
    }

    pub fn value(&self, key: &str) -> Result<&Value> {
        self.properties
            .get(key)
            .ok_or_else(|| anyhow!("feature is missing property '{key}'"))
    }

    /// Removes a string property and returns it.
    pub fn take_string(&mut self, key: &str) -> Result<String> {
        match self.properties.shift_remove(key) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => bail!("property '{key}' is not a string: {other}"),
            None => bail!("feature is missing property '{key}'"),
        }
    }

    pub fn set_number(&mut self, key: &str, value: f64) {
        self.properties.insert(key.to_string(), Value::from(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(x: u64, y: u64, ghi: f64) -> Feature {
        serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [x, y]},
            "properties": {"ghi": ghi, "site": "a"}
        }))
        .unwrap()
    }

    #[test]
    fn test_unknown_keys_survive_a_round_trip() {
        let raw = json!({
            "type": "Feature",
            "id": 7,
            "geometry": {"type": "Point", "coordinates": [1, 2], "crs": "grid"},
            "properties": {"ghi": 5}
        });
        let feature: Feature = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(feature.extra.get("id"), Some(&json!(7)));
        assert_eq!(serde_json::to_value(&feature).unwrap(), raw);
    }

    #[test]
    fn test_missing_type_is_not_invented() {
        let feature: Feature = serde_json::from_value(json!({
            "geometry": {"coordinates": [0, 0]},
            "properties": {}
        }))
        .unwrap();
        let out = serde_json::to_value(&feature).unwrap();
        assert!(out.get("type").is_none());
        assert!(out["geometry"].get("type").is_none());
    }

    #[test]
    fn test_grid_index() {
        assert_eq!(point(3, 4, 0.0).geometry.grid_index().unwrap(), (3, 4));

        let mut bad = point(0, 0, 0.0);
        bad.geometry.coordinates = json!([-1, 2]);
        assert!(bad.geometry.grid_index().is_err());

        bad.geometry.coordinates = json!([[1.5, 2.0]]);
        assert!(bad.geometry.grid_index().is_err());
    }

    #[test]
    fn test_take_number_removes_property() {
        let mut feature = point(0, 0, 12.5);
        assert_eq!(feature.take_number("ghi").unwrap(), 12.5);
        assert!(!feature.properties.contains_key("ghi"));
        assert!(feature.take_number("ghi").is_err());
    }

    #[test]
    fn test_take_number_rejects_strings() {
        let mut feature = point(0, 0, 1.0);
        assert!(feature.take_number("site").is_err());
    }

    #[test]
    fn test_take_value_keeps_the_raw_json() {
        let mut feature = point(0, 0, 0.0);
        feature.properties.insert("ghi".to_string(), json!(9007199254740993u64));
        assert_eq!(feature.value("site").unwrap(), &json!("a"));
        assert_eq!(feature.take_value("ghi").unwrap(), json!(9007199254740993u64));
        assert!(feature.take_value("ghi").is_err());
        assert!(feature.value("ghi").is_err());
    }

    #[test]
    fn test_take_string() {
        let mut feature = point(0, 0, 1.0);
        assert_eq!(feature.take_string("site").unwrap(), "a");
        assert!(feature.take_string("ghi").is_err());
    }
}
