use crate::types::BaseLayer;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub map: MapConfig,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub input: InputConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    /// Initial view center as [lat, lon].
    pub center: [f64; 2],
    pub zoom: u8,
    /// Base layers available on this map, in toggle-cycle order. Two- and
    /// three-layer cycles are both valid setups.
    #[serde(default = "default_base_layers")]
    pub base_layers: Vec<BaseLayer>,
    #[serde(default = "default_search_zoom")]
    pub search_zoom: u8,
    #[serde(default = "default_fly_duration")]
    pub fly_duration_secs: f64,
}

fn default_base_layers() -> Vec<BaseLayer> {
    BaseLayer::ALL.to_vec()
}

fn default_search_zoom() -> u8 {
    12
}

fn default_fly_duration() -> f64 {
    1.5
}

/// Tile/WMS addresses per layer kind. Opaque to the engine; it never fetches
/// them itself, it only hands them to whichever backend is attached.
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    pub street: String,
    pub satellite: String,
    pub topo: String,
    pub watershed: String,
    pub land_use: String,
    pub forest_cover: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InputConfig {
    /// Claims GeoJSON. When absent the built-in sample dataset is used.
    pub claims: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub snapshot_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
