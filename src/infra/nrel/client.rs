use anyhow::{Context, Result};
use tracing::info;

use ghi_transformer::config::{API_KEY_PARAM, GridSettings};
use ghi_transformer::fetch::auth::UrlParam;
use ghi_transformer::fetch::{BasicClient, HttpClient, fetch_bytes};
use ghi_transformer::services::grid_api::{CoordinateGrid, GridApi};

/// Fetches the coordinate grid from the NREL HSDS endpoint.
///
/// Nothing is requested until [`GridApi::load_grid`] is called, so runs that
/// never need the grid never touch the network.
pub struct NrelGridClient {
    settings: GridSettings,
}

impl NrelGridClient {
    pub fn new(settings: GridSettings) -> Self {
        Self { settings }
    }

    fn get<C: HttpClient>(&self, client: &C) -> Result<CoordinateGrid> {
        let bytes = fetch_bytes(client, &self.settings.url)
            .with_context(|| format!("Failed to fetch coordinate grid from {}", self.settings.url))?;
        CoordinateGrid::from_json(&bytes).context("Failed to parse coordinate grid")
    }
}

impl GridApi for NrelGridClient {
    #[tracing::instrument(skip(self), fields(url = %self.settings.url, keyed = self.settings.api_key.is_some()))]
    fn load_grid(&self) -> Result<CoordinateGrid> {
        let client = BasicClient::new()?;

        let grid = match &self.settings.api_key {
            Some(key) => self.get(&UrlParam {
                inner: client,
                param_name: API_KEY_PARAM.to_string(),
                key: key.clone(),
            })?,
            None => self.get(&client)?,
        };

        let (max_x, max_y) = grid.dims();
        info!(max_x, max_y, "Coordinate grid fetched");
        Ok(grid)
    }
}
