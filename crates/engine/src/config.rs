use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::app::{LayoutError, ScreenLayout};
use crate::world::{TerrainKind, MAX_CHUNK_SIZE};

pub const CONFIG_ENV_VAR: &str = "MAHOU_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// One rung of the generation ladder: samples strictly below `below` map to `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerrainBand {
    pub below: f64,
    pub kind: TerrainKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum WorldBounds {
    #[default]
    Unbounded,
    /// Positions with `|x| > radius` or `|y| > radius` read as a border tile.
    Bordered { radius: i32 },
}

impl WorldBounds {
    pub fn contains(self, x: i32, y: i32) -> bool {
        match self {
            WorldBounds::Unbounded => true,
            WorldBounds::Bordered { radius } => {
                let radius = radius.unsigned_abs();
                x.unsigned_abs() <= radius && y.unsigned_abs() <= radius
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    pub chunk_size: u32,
    pub eviction_window_turns: u64,
    pub noise_scale: f64,
    pub terrain_bands: Vec<TerrainBand>,
    pub entity_capacity: usize,
    pub bounds: WorldBounds,
    pub screen_width: u32,
    pub screen_height: u32,
    pub view_half_width: u32,
    pub view_half_height: u32,
    pub log_capacity: usize,
    pub npc_count: u32,
    pub rng_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            eviction_window_turns: 10,
            noise_scale: 0.1,
            terrain_bands: vec![
                TerrainBand {
                    below: 0.45,
                    kind: TerrainKind::Grass,
                },
                TerrainBand {
                    below: 0.85,
                    kind: TerrainKind::Ground,
                },
                TerrainBand {
                    below: 1.0,
                    kind: TerrainKind::Rock,
                },
            ],
            entity_capacity: 0x1000,
            bounds: WorldBounds::Unbounded,
            screen_width: 80,
            screen_height: 45,
            view_half_width: 15,
            view_half_height: 15,
            log_capacity: 64,
            npc_count: 8,
            rng_seed: 0x6d61_686f_75,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path} at `{field}`: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("chunk_size must be a power of two >= 2, got {0}")]
    ChunkSizeNotPowerOfTwo(u32),
    #[error("chunk_size must be at most {max}, got {size}")]
    ChunkSizeTooLarge { size: u32, max: u32 },
    #[error("entity_capacity must be at least 1")]
    ZeroEntityCapacity,
    #[error("log_capacity must be at least 1")]
    ZeroLogCapacity,
    #[error("terrain_bands must not be empty")]
    EmptyTerrainBands,
    #[error("terrain_bands must be strictly ascending; band {index} has below={below}")]
    UnsortedTerrainBands { index: usize, below: f64 },
    #[error("noise_scale must be finite and positive, got {0}")]
    InvalidNoiseScale(f64),
    #[error("bordered world radius must be positive, got {0}")]
    InvalidBorderRadius(i32),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size < 2 || !self.chunk_size.is_power_of_two() {
            return Err(ConfigError::ChunkSizeNotPowerOfTwo(self.chunk_size));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::ChunkSizeTooLarge {
                size: self.chunk_size,
                max: MAX_CHUNK_SIZE,
            });
        }
        if self.entity_capacity == 0 {
            return Err(ConfigError::ZeroEntityCapacity);
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        if !self.noise_scale.is_finite() || self.noise_scale <= 0.0 {
            return Err(ConfigError::InvalidNoiseScale(self.noise_scale));
        }
        if self.terrain_bands.is_empty() {
            return Err(ConfigError::EmptyTerrainBands);
        }
        for (index, pair) in self.terrain_bands.windows(2).enumerate() {
            if !(pair[1].below > pair[0].below) {
                return Err(ConfigError::UnsortedTerrainBands {
                    index: index + 1,
                    below: pair[1].below,
                });
            }
        }
        if let WorldBounds::Bordered { radius } = self.bounds {
            if radius <= 0 {
                return Err(ConfigError::InvalidBorderRadius(radius));
            }
        }
        self.layout()?;
        Ok(())
    }

    pub fn layout(&self) -> Result<ScreenLayout, LayoutError> {
        ScreenLayout::new(
            self.screen_width,
            self.screen_height,
            self.view_half_width,
            self.view_half_height,
        )
    }
}

pub fn load_world_config(path: &Path) -> Result<WorldConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_world_config(&text, path)
}

fn parse_world_config(text: &str, path: &Path) -> Result<WorldConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let config: WorldConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                field: error.path().to_string(),
                source: error.into_inner(),
            }
        })?;
    config.validate()?;
    Ok(config)
}

/// Loads `MAHOU_CONFIG` when set, otherwise `<assets_dir>/config.json` when it
/// exists, otherwise the defaults.
pub fn resolve_world_config(assets_dir: &Path) -> Result<WorldConfig, ConfigError> {
    if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(explicit);
        info!(path = %path.display(), source = CONFIG_ENV_VAR, "config_load");
        return load_world_config(&path);
    }

    let default_path = assets_dir.join(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        info!(path = %default_path.display(), "config_load");
        return load_world_config(&default_path);
    }

    info!(path = %default_path.display(), "config_missing_using_defaults");
    let config = WorldConfig::default();
    config.validate()?;
    Ok(config)
}
