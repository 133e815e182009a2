//! Bot players.
//!
//! Bots fill empty seats on request, replace seats vacated by humans, and
//! act on behalf of humans whose turn timed out. All three use the single
//! [`BotPolicy`].

pub mod autoplay;
pub mod decision;

pub use autoplay::{AutoplayReport, apply_action, play_bot_game};
pub use decision::{BotAction, BotPolicy, BotPolicyConfig};

use crate::game::entities::{Player, PlayerKind, SeatIndex, UserId};

/// Bot ids are negative so they never collide with user ids.
#[must_use]
pub fn bot_id(seat: SeatIndex) -> UserId {
    -(seat as UserId + 1)
}

#[must_use]
pub fn bot_player(seat: SeatIndex) -> Player {
    Player {
        id: bot_id(seat),
        name: format!("Bot {}", seat + 1),
        kind: PlayerKind::Bot,
        seat,
    }
}
