pub mod config;
pub mod data;
pub mod engine;
pub mod layers;
pub mod raster;
pub mod scene;
pub mod server;
pub mod style;
pub mod types;
