//! # Spades Engine
//!
//! A four-seat Spades game server core built around a type-safe finite
//! state machine.
//!
//! The game moves through five phases, each its own type:
//!
//! - **Waiting**: seats are filling up
//! - **Bidding**: each seat bids in turn, starting left of the dealer
//! - **Playing**: thirteen tricks under the standard, screamer or assassin rules
//! - **HandCompleted**: the hand is scored, then the deal rotates left
//! - **Finished**: a score crossed the game-over threshold
//!
//! Partners and solo scoring, nil and blind nil, bags and the gimmick
//! formats are resolved once per hand into a rules object.
//!
//! ## Core Modules
//!
//! - [`game`]: Game state machine, entities, rules and scoring
//! - [`bot`]: Bot policy used for bots and timed-out humans
//! - [`table`]: Per-table actors, timers and the table manager
//! - [`recorder`]: Persistence collaborator
//! - [`economy`]: Buy-in and payout collaborator
//!
//! ## Example
//!
//! ```
//! use spades_engine::{GameSettings, SpadesState};
//! use spades_engine::game::GameStateManagement;
//! use spades_engine::game::entities::GameStatus;
//!
//! // Create a new game waiting for players
//! let game = SpadesState::new(GameSettings::default());
//! assert_eq!(game.status(), GameStatus::Waiting);
//! ```

/// Bot players and autoplay.
pub mod bot;

/// Buy-in and payout collaborator.
pub mod economy;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameError, GameSettings, SpadesState,
    constants::{self, PLAYERS},
    entities,
};

/// Persistence collaborator.
pub mod recorder;

/// Table actors and management.
pub mod table;
