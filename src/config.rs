//! Startup configuration.
//!
//! Read once from `assets/config.json` before the app is built. A
//! missing file silently falls back to defaults; a file that exists but
//! fails to parse is a fatal startup error, since silently ignoring a
//! typo in a config people handed us is worse than refusing to run.

use std::fs;
use std::io;
use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Directory holding all save slots
    pub save_root: String,
    /// Active save slot name
    pub slot: String,
    /// Seed for worlds created in a fresh slot
    pub seed: String,
    /// Tileset texture, relative to the asset root
    pub tileset: String,
    /// Tile descriptor file, relative to the asset root
    pub definitions: String,
    /// Sprite cells along each axis of the tileset
    pub atlas_grid: [i32; 2],
    /// On-screen size of one tile at default zoom
    pub pixels_per_tile: f32,
    /// Wall-clock length of one actor step, in milliseconds
    pub motion_duration_ms: u64,
    /// Chunks beyond the visible rectangle kept resident
    pub stream_margin: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            save_root: String::from("saves"),
            slot: String::from("default"),
            seed: String::from("0"),
            tileset: String::from("tilesets/terrain.png"),
            definitions: String::from("tiles/definitions.json"),
            atlas_grid: [8, 8],
            pixels_per_tile: 32.0,
            motion_duration_ms: 150,
            stream_margin: 2,
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
