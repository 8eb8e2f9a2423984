//! Trait and types for the geographic coordinate grid.

use anyhow::{Result, bail};
use serde::Deserialize;

/// A `[x][y] → [lat, lon]` lookup over a fixed geographic grid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoordinateGrid {
    value: Vec<Vec<[f64; 2]>>,
}

impl CoordinateGrid {
    /// Builds a grid from rows of `[lat, lon]` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid is empty or its rows differ in length.
    pub fn new(value: Vec<Vec<[f64; 2]>>) -> Result<Self> {
        let grid = Self { value };
        grid.validate()?;
        Ok(grid)
    }

    /// Parses the `{"value": [[[lat, lon], ...], ...]}` document served by the grid endpoint.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let grid: Self = serde_json::from_slice(bytes)?;
        grid.validate()?;
        Ok(grid)
    }

    fn validate(&self) -> Result<()> {
        let Some(first) = self.value.first() else {
            bail!("coordinate grid has no rows");
        };
        if first.is_empty() {
            bail!("coordinate grid has empty rows");
        }
        if let Some(row) = self.value.iter().position(|r| r.len() != first.len()) {
            bail!(
                "coordinate grid row {row} has {} cells, expected {}",
                self.value[row].len(),
                first.len()
            );
        }
        Ok(())
    }

    /// Grid dimensions as `(max_x, max_y)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.value.len(), self.value.first().map_or(0, Vec::len))
    }

    /// The `[lat, lon]` pair at cell `(x, y)`, if it is inside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<[f64; 2]> {
        self.value.get(x)?.get(y).copied()
    }
}

/// Abstraction over where the coordinate grid comes from.
pub trait GridApi {
    /// Loads the full grid. Called at most once per run.
    fn load_grid(&self) -> Result<CoordinateGrid>;
}

/// An already loaded grid serves itself.
impl GridApi for CoordinateGrid {
    fn load_grid(&self) -> Result<CoordinateGrid> {
        Ok(self.clone())
    }
}
