//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::game::{
    GameSettings,
    constants::{DEFAULT_MAX_POINTS, DEFAULT_MIN_POINTS, POINTS_CEILING, POINTS_FLOOR},
    entities::{GameFormat, GameMode, Gimmick, SpecialRules},
};

/// Reasons a table configuration is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be between -1000 and 10000, got {value}")]
    PointsOutOfRange { field: &'static str, value: i32 },

    #[error("min points ({min}) must be below max points ({max})")]
    PointsInverted { min: i32, max: i32 },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("max consecutive timeouts must be at least 1")]
    NoTimeoutLimit,

    #[error("suicide requires partners mode")]
    SuicideRequiresPartners,

    #[error("screamer and assassin can't both be enabled")]
    ConflictingSpecialRules,
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Partners or solo scoring
    pub mode: GameMode,

    /// Bidding format
    pub format: GameFormat,

    /// Screamer / assassin play rules
    pub special_rules: SpecialRules,

    /// Game ends when any score reaches this (default: 500)
    pub max_points: i32,

    /// Game ends when any score falls to this (default: -500)
    pub min_points: i32,

    /// Whether nil bids are allowed in free-choice formats
    pub allow_nil: bool,

    /// Whether blind nil is allowed in free-choice formats
    pub allow_blind_nil: bool,

    /// Seconds a human has to act before a bot acts for them
    pub turn_timeout_secs: u64,

    /// Consecutive timeouts before the seat is vacated
    pub max_consecutive_timeouts: u32,

    /// Seconds a vacated seat waits for a human before a bot takes it
    pub seat_replacement_timeout_secs: u64,

    /// Seconds humans have to confirm a rematch
    pub play_again_timeout_secs: u64,

    /// Buy-in per seat, settled by the economy collaborator
    pub buy_in: i64,

    /// Fixed shuffle seed, for audits and tests
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Spades Table".to_string(),
            mode: GameMode::Partners,
            format: GameFormat::Regular,
            special_rules: SpecialRules::default(),
            max_points: DEFAULT_MAX_POINTS,
            min_points: DEFAULT_MIN_POINTS,
            allow_nil: true,
            allow_blind_nil: false,
            turn_timeout_secs: 30,
            max_consecutive_timeouts: 3,
            seat_replacement_timeout_secs: 60,
            play_again_timeout_secs: 30,
            buy_in: 0,
            seed: None,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("max_points", self.max_points), ("min_points", self.min_points)] {
            if !(POINTS_FLOOR..=POINTS_CEILING).contains(&value) {
                return Err(ConfigError::PointsOutOfRange { field, value });
            }
        }

        if self.min_points >= self.max_points {
            return Err(ConfigError::PointsInverted {
                min: self.min_points,
                max: self.max_points,
            });
        }

        for (field, secs) in [
            ("turn_timeout_secs", self.turn_timeout_secs),
            ("seat_replacement_timeout_secs", self.seat_replacement_timeout_secs),
            ("play_again_timeout_secs", self.play_again_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ZeroTimeout(field));
            }
        }

        if self.max_consecutive_timeouts == 0 {
            return Err(ConfigError::NoTimeoutLimit);
        }

        if self.format == GameFormat::Gimmick(Gimmick::Suicide) && self.mode != GameMode::Partners {
            return Err(ConfigError::SuicideRequiresPartners);
        }

        if self.special_rules.screamer && self.special_rules.assassin {
            return Err(ConfigError::ConflictingSpecialRules);
        }

        Ok(())
    }

    /// Rules handed to every game started at this table.
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            mode: self.mode,
            format: self.format,
            special_rules: self.special_rules,
            max_points: self.max_points,
            min_points: self.min_points,
            allow_nil: self.allow_nil,
            allow_blind_nil: self.allow_blind_nil,
            seed: self.seed,
        }
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn seat_replacement_timeout(&self) -> Duration {
        Duration::from_secs(self.seat_replacement_timeout_secs)
    }

    pub fn play_again_timeout(&self) -> Duration {
        Duration::from_secs(self.play_again_timeout_secs)
    }
}
