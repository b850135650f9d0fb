//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

use crate::game::r#match::MatchConfig;
use crate::util::time::DEFAULT_FRAME_RATE;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Driver frames per second
    pub frame_rate: u32,
    /// Broadcast a snapshot every N frames
    pub snapshot_every: u32,
    /// Match rules, terrain and physics constants
    pub game: MatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_rate: DEFAULT_FRAME_RATE,
            snapshot_every: 1,
            game: MatchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    /// Every variable is optional; unset ones keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(rate) = parse(&lookup, "FRAME_RATE")? {
            config.frame_rate = rate;
        }
        if let Some(every) = parse(&lookup, "SNAPSHOT_EVERY")? {
            config.snapshot_every = every;
        }
        if let Some(seed) = parse(&lookup, "MATCH_SEED")? {
            config.game.seed = Some(seed);
        }
        if let Some(resolution) = parse(&lookup, "TERRAIN_RESOLUTION")? {
            config.game.terrain.resolution = resolution;
        }
        if let Some(smoothness) = parse(&lookup, "TERRAIN_SMOOTHNESS")? {
            config.game.terrain.smoothness = smoothness;
        }
        if let Some(gravity) = parse(&lookup, "GRAVITY")? {
            config.game.ballistics.gravity = gravity;
        }
        if let Some(height) = parse(&lookup, "PLAYFIELD_HEIGHT")? {
            config.game.ballistics.playfield_height = height;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::OutOfRange("FRAME_RATE"));
        }
        if self.snapshot_every == 0 {
            return Err(ConfigError::OutOfRange("SNAPSHOT_EVERY"));
        }
        if self.game.terrain.resolution < 2 {
            return Err(ConfigError::OutOfRange("TERRAIN_RESOLUTION"));
        }
        // Shots only come down, and trajectories only end, with positive gravity.
        let gravity = self.game.ballistics.gravity;
        if !(gravity.is_finite() && gravity > 0.0) {
            return Err(ConfigError::OutOfRange("GRAVITY"));
        }
        let height = self.game.ballistics.playfield_height;
        if !(height.is_finite() && height > 0.0) {
            return Err(ConfigError::OutOfRange("PLAYFIELD_HEIGHT"));
        }
        Ok(())
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let parsed = raw.trim().parse::<T>();
    match parsed {
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(ConfigError::Invalid { key, value: raw }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Environment variable {0} is out of range")]
    OutOfRange(&'static str),
}
