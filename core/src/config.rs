//! Session configuration loaded from TOML.
//!
//! Every balance constant the systems consult lives here; `Config::default()`
//! reproduces the values of the shipped game.

use std::{fs, io, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors raised while loading or validating a [`Config`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
    /// The configuration text is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration parsed but describes an unusable session.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete session configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grid dimensions.
    pub grid: GridConfig,
    /// Chain parameters.
    pub snake: SnakeConfig,
    /// Collectible rewards and lifetimes.
    pub collectibles: CollectibleConfig,
}

impl Config {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), columns = config.grid.columns, rows = config.grid.rows, "Loaded configuration");
        Ok(config)
    }

    /// Rejects configurations that cannot describe a playable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.columns == 0 || self.grid.rows == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.columns, self.grid.rows
            )));
        }
        if self.snake.move_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "snake.move_interval_ms must be positive".to_owned(),
            ));
        }
        if self.snake.initial_length == 0 {
            return Err(ConfigError::Invalid(
                "snake.initial_length must be positive".to_owned(),
            ));
        }
        if self.collectibles.lifetime_ms == 0 {
            return Err(ConfigError::Invalid(
                "collectibles.lifetime_ms must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Grid dimensions in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of columns.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 31,
            rows: 25,
        }
    }
}

/// Chain parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    /// Milliseconds between successive steps.
    pub move_interval_ms: u64,
    /// Links in a freshly spawned chain, head included.
    pub initial_length: u32,
}

impl SnakeConfig {
    /// Step interval as a [`Duration`].
    #[must_use]
    pub const fn move_interval(&self) -> Duration {
        Duration::from_millis(self.move_interval_ms)
    }
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            move_interval_ms: 110,
            initial_length: 3,
        }
    }
}

/// Score and growth granted by one collectible type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Score before the freshness bonus.
    pub base_score: u32,
    /// Segments before the freshness bonus.
    pub segments: u32,
}

impl Reward {
    /// Creates a reward descriptor.
    #[must_use]
    pub const fn new(base_score: u32, segments: u32) -> Self {
        Self {
            base_score,
            segments,
        }
    }
}

/// Collectible rewards and lifetimes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectibleConfig {
    /// Milliseconds a collectible stays on the board.
    pub lifetime_ms: u64,
    /// Bonus segments per unit of freshness, floored.
    pub growth_per_freshness: u32,
    /// Bonus score per unit of freshness, floored.
    pub score_per_freshness: u32,
    /// Candle reward.
    pub candle: Reward,
    /// Hellfire reward.
    pub hellfire: Reward,
    /// Reward applied when an eaten entity no longer carries its record.
    pub fallback: Reward,
}

impl CollectibleConfig {
    /// Lifetime as a [`Duration`].
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    /// Total segments granted for a pickup: `segments + floor(freshness * growth_per_freshness)`.
    #[must_use]
    pub fn growth_for(&self, segments: u32, freshness: f32) -> u32 {
        segments.saturating_add(freshness_bonus(freshness, self.growth_per_freshness))
    }

    /// Total score granted for a pickup: `base_score + floor(freshness * score_per_freshness)`.
    #[must_use]
    pub fn score_for(&self, base_score: u32, freshness: f32) -> u32 {
        base_score.saturating_add(freshness_bonus(freshness, self.score_per_freshness))
    }
}

impl Default for CollectibleConfig {
    fn default() -> Self {
        Self {
            lifetime_ms: 14_000,
            growth_per_freshness: 3,
            score_per_freshness: 100,
            candle: Reward::new(10, 1),
            hellfire: Reward::new(25, 2),
            fallback: Reward::new(10, 1),
        }
    }
}

fn freshness_bonus(freshness: f32, scale: u32) -> u32 {
    let freshness = if freshness.is_nan() {
        0.0
    } else {
        freshness.clamp(0.0, 1.0)
    };
    (f64::from(freshness) * f64::from(scale)).floor() as u32
}
