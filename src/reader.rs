//! Loads one input file into ordered feature groups.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::feature::{Feature, FeatureGroup};

/// Reads and normalizes the groups in `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not have one of the
/// accepted shapes.
pub fn read_groups(path: &Path) -> Result<Vec<FeatureGroup>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;

    normalize(value).with_context(|| format!("Unexpected record layout in {}", path.display()))
}

/// Accepts either a bare array of groups or a `{"features": [...]}` wrapper.
/// An array element is a group of features; an object element is a group of one.
pub fn normalize(value: Value) -> Result<Vec<FeatureGroup>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("features") {
            Some(Value::Array(items)) => items,
            Some(_) => bail!("'features' is not an array"),
            None => bail!("object has no 'features' member"),
        },
        other => bail!("expected an array or a feature collection, found {}", kind_of(&other)),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Array(_) => serde_json::from_value::<FeatureGroup>(item)
                .with_context(|| format!("group {i} is not a list of features")),
            Value::Object(_) => serde_json::from_value::<Feature>(item)
                .map(|f| vec![f])
                .with_context(|| format!("item {i} is not a feature")),
            other => bail!("item {i} is {}, expected a feature or feature list", kind_of(&other)),
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
