//! Spades tables, one async actor each.
//!
//! Contents:
//! - TableActor: Async actor owning a single spades game
//! - TableManager: Spawns, lists and closes table actors
//! - Message-based communication with tokio channels
//! - Turn, seat replacement and rematch timers
//!
//! ## Architecture
//!
//! Every table is its own Tokio task reading a bounded mpsc inbox.
//! Player intents and timer expiries arrive through the same inbox, so a
//! game is only ever mutated by one event at a time. Persistence and payouts
//! are spawned after the mutation and never block the table.
//!
//! ## Example
//!
//! ```no_run
//! use spades_engine::economy::NoopSettlement;
//! use spades_engine::recorder::LogRecorder;
//! use spades_engine::table::{TableActor, TableConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TableConfig::default();
//!     let (actor, handle) =
//!         TableActor::new(1, config, Arc::new(LogRecorder), Arc::new(NoopSettlement));
//!
//!     tokio::spawn(actor.run());
//!
//!     let response = handle.join_seat(42, "alice", None).await;
//!     assert!(response.is_success());
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;
pub mod timers;

pub use actor::{TableActor, TableHandle};
pub use config::{ConfigError, TableConfig};
pub use manager::{ManagerError, TableManager, TableMetadata};
pub use messages::{
    NotificationKind, TableMessage, TableNotification, TableResponse, TableSnapshot, VacateReason,
};
pub use timers::TimerSlot;
