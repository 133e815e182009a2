//! Spades game engine - core FSM and game logic.
//!
//! This module provides:
//! - Cards, deck and dealing
//! - Format and bid rules, resolved once per hand
//! - Trick legality under the standard, screamer and assassin rules
//! - Partners and solo scoring with nil, blind nil and bags
//! - A typestate FSM that owns the game and mutates it one event at a time

pub mod constants;
pub mod entities;
pub mod errors;
pub mod rules;
pub mod scoring;
pub mod state_machine;
pub mod states;
pub mod tricks;

pub use errors::{BidError, ErrorCode, GameError, PlayError, Severity};
pub use state_machine::{
    Game, GameData, GameEvent, GameSettings, GameStateManagement, GameView, PendingTurn,
    PlayerView, SeatManagement, SeatView, SpadesState, TurnKey,
};
