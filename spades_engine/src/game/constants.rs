//! Fixed table and scoring constants.

/// Seats at every table.
pub const PLAYERS: usize = 4;

/// Cards dealt to each seat, and therefore tricks played per hand.
pub const CARDS_PER_HAND: usize = 13;

pub const DECK_SIZE: usize = PLAYERS * CARDS_PER_HAND;

pub const TRICKS_PER_HAND: usize = CARDS_PER_HAND;

/// Highest bid a seat may make.
pub const MAX_BID: u8 = 13;

pub const DEFAULT_MAX_POINTS: i32 = 500;
pub const DEFAULT_MIN_POINTS: i32 = -500;

/// Bounds accepted for either game-over threshold.
pub const POINTS_FLOOR: i32 = -1000;
pub const POINTS_CEILING: i32 = 10_000;

/// Points per contracted trick.
pub const POINTS_PER_TRICK: i32 = 10;

pub const PARTNERS_NIL_BONUS: i32 = 100;
pub const SOLO_NIL_BONUS: i32 = 50;

/// Blind nil pays (and costs) this many times the nil bonus.
pub const BLIND_NIL_MULTIPLIER: i32 = 2;

pub const PARTNERS_BAG_THRESHOLD: i32 = 10;
pub const PARTNERS_BAG_PENALTY: i32 = 100;
pub const SOLO_BAG_THRESHOLD: i32 = 5;
pub const SOLO_BAG_PENALTY: i32 = 50;
