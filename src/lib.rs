pub mod config;
pub mod feature;
pub mod fetch;
pub mod files;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod services;
pub mod transforms;
