//! Simulation configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use spades_engine::{
    entities::{GameFormat, GameMode, SpecialRules},
    game::GameSettings,
    table::TableConfig,
};

/// Complete simulation configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Number of games to play
    pub games: u32,
    /// Partners or solo
    pub mode: GameMode,
    /// Bidding format
    pub format: GameFormat,
    /// Screamer / assassin
    pub special_rules: SpecialRules,
    /// Game-over threshold
    pub max_points: i32,
    /// Losing threshold
    pub min_points: i32,
    /// Base seed; game `n` uses `seed + n`
    pub seed: Option<u64>,
    /// Give up on a game after this many hands
    pub max_hands: u32,
    /// Drive games through a table actor with one simulated human
    pub via_table: bool,
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct SimOverrides {
    pub games: Option<u32>,
    pub mode: Option<String>,
    pub format: Option<String>,
    pub seed: Option<u64>,
    pub via_table: bool,
}

impl SimConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values parsed from CLI args
    ///
    /// # Errors
    ///
    /// Returns error if a mode or format name is unknown, or the rules don't
    /// validate
    pub fn from_env(overrides: SimOverrides) -> Result<Self, ConfigError> {
        let mode = match overrides.mode.or_else(|| std::env::var("SIM_MODE").ok()) {
            Some(value) => value.parse().map_err(|e| ConfigError::Invalid {
                var: "SIM_MODE".to_string(),
                reason: format!("{e}"),
            })?,
            None => GameMode::Partners,
        };

        let format = match overrides.format.or_else(|| std::env::var("SIM_FORMAT").ok()) {
            Some(value) => value.parse().map_err(|e| ConfigError::Invalid {
                var: "SIM_FORMAT".to_string(),
                reason: format!("{e}"),
            })?,
            None => GameFormat::Regular,
        };

        let defaults = TableConfig::default();
        let config = Self {
            games: overrides
                .games
                .unwrap_or_else(|| parse_env_or("SIM_GAMES", 100)),
            mode,
            format,
            special_rules: SpecialRules {
                screamer: parse_env_or("SIM_SCREAMER", false),
                assassin: parse_env_or("SIM_ASSASSIN", false),
            },
            max_points: parse_env_or("SIM_MAX_POINTS", defaults.max_points),
            min_points: parse_env_or("SIM_MIN_POINTS", defaults.min_points),
            seed: overrides
                .seed
                .or_else(|| std::env::var("SIM_SEED").ok().and_then(|v| v.parse().ok())),
            max_hands: parse_env_or("SIM_MAX_HANDS", 200),
            via_table: overrides.via_table || parse_env_or("SIM_VIA_TABLE", false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.games == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_GAMES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.max_hands == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_MAX_HANDS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.table_config(0)
            .validate()
            .map_err(|e| ConfigError::Invalid {
                var: "rules".to_string(),
                reason: e.to_string(),
            })
    }

    /// Seed for the `index`-th game
    pub fn game_seed(&self, index: u32) -> Option<u64> {
        self.seed.map(|seed| seed.wrapping_add(u64::from(index)))
    }

    /// Table configuration for the `index`-th game
    pub fn table_config(&self, index: u32) -> TableConfig {
        TableConfig {
            name: format!("Sim {}", index + 1),
            mode: self.mode,
            format: self.format,
            special_rules: self.special_rules,
            max_points: self.max_points,
            min_points: self.min_points,
            seed: self.game_seed(index),
            ..Default::default()
        }
    }

    /// Game settings for the `index`-th game
    pub fn game_settings(&self, index: u32) -> GameSettings {
        self.table_config(index).game_settings()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spades_engine::entities::Gimmick;

    fn config() -> SimConfig {
        SimConfig {
            games: 10,
            mode: GameMode::Partners,
            format: GameFormat::Regular,
            special_rules: SpecialRules::default(),
            max_points: 500,
            min_points: -500,
            seed: Some(40),
            max_hands: 100,
            via_table: false,
        }
    }

    #[test]
    fn test_overrides_pick_format() {
        let config = SimConfig::from_env(SimOverrides {
            games: Some(3),
            mode: Some("partners".to_string()),
            format: Some("SUICIDE".to_string()),
            seed: Some(1),
            via_table: false,
        })
        .unwrap();
        assert_eq!(config.games, 3);
        assert_eq!(config.format, GameFormat::Gimmick(Gimmick::Suicide));
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = SimConfig::from_env(SimOverrides {
            mode: Some("trios".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("SIM_MODE"));
    }

    #[test]
    fn test_config_validation_zero_games() {
        let config = SimConfig {
            games: 0,
            ..config()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_config_validation_solo_suicide() {
        let config = SimConfig {
            mode: GameMode::Solo,
            format: GameFormat::Gimmick(Gimmick::Suicide),
            ..config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("suicide requires partners"));
    }

    #[test]
    fn test_game_seeds_advance() {
        let config = config();
        assert_eq!(config.game_seed(0), Some(40));
        assert_eq!(config.game_seed(2), Some(42));
        assert_eq!(config.game_settings(2).seed, Some(42));
    }
}
