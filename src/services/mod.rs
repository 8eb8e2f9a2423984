pub mod grid_api;
