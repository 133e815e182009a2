//! Table actor message types.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::timers::TimerSlot;
use crate::{
    bot::BotAction,
    game::{
        ErrorCode, GameError, GameView, PlayerView,
        entities::{Bid, Card, CompletedTrick, GameId, SeatIndex, TableId, UserId},
        scoring::GameResult,
        states::HandSummary,
    },
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Take a seat. `seat: None` takes the lowest open seat.
    JoinSeat {
        user_id: UserId,
        username: String,
        seat: Option<SeatIndex>,
        response: oneshot::Sender<TableResponse>,
    },

    /// Give up a seat
    LeaveSeat {
        user_id: UserId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Bid for the current hand
    SubmitBid {
        user_id: UserId,
        bid: Bid,
        response: oneshot::Sender<TableResponse>,
    },

    /// Play a card to the current trick
    PlayCard {
        user_id: UserId,
        card: Card,
        response: oneshot::Sender<TableResponse>,
    },

    /// Put a bot into an open seat
    RequestBotFill {
        user_id: UserId,
        seat: SeatIndex,
        response: oneshot::Sender<TableResponse>,
    },

    /// Look at one's own cards. Rules out blind nil for this hand.
    GetHand {
        user_id: UserId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Confirm a rematch after the game finished
    PlayAgain {
        user_id: UserId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Get current table state
    GetSnapshot {
        response: oneshot::Sender<TableSnapshot>,
    },

    /// Get the private view for a seated user
    GetPlayerView {
        user_id: UserId,
        response: oneshot::Sender<Option<PlayerView>>,
    },

    /// Subscribe to state change notifications
    Subscribe {
        user_id: UserId,
        sender: mpsc::Sender<TableNotification>,
    },

    /// Unsubscribe from state change notifications
    Unsubscribe { user_id: UserId },

    /// Close table
    Close {
        response: oneshot::Sender<TableResponse>,
    },

    /// Internal: a timer armed by the actor expired
    TimerFired { slot: TimerSlot, generation: u64 },
}

/// Response from table operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableResponse {
    /// Operation succeeded
    Success,

    /// Seat taken
    Seated { seat: SeatIndex },

    /// The caller's cards
    Hand(Vec<Card>),

    /// Intent refused; table state unchanged
    Rejected { code: ErrorCode, message: String },
}

impl From<GameError> for TableResponse {
    fn from(err: GameError) -> Self {
        TableResponse::Rejected {
            code: err.code(),
            message: err.client_message(),
        }
    }
}

impl TableResponse {
    /// Rejection for messages that reach a closed table
    pub fn closed() -> Self {
        TableResponse::Rejected {
            code: ErrorCode::TableClosed,
            message: "Table is closed".to_string(),
        }
    }

    /// Check if response is success
    pub fn is_success(&self) -> bool {
        !matches!(self, TableResponse::Rejected { .. })
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Rejected { code, message } => Some(format!("{code}: {message}")),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            TableResponse::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Table state attached to every notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSnapshot {
    /// Table ID
    pub table_id: TableId,

    /// Table name
    pub table_name: String,

    /// Public game state
    pub game: GameView,

    /// Consecutive turn timeouts per seat
    pub timeouts: Vec<u32>,

    /// Seats vacated mid-game and waiting for a replacement
    pub vacated: Vec<SeatIndex>,

    /// Humans that confirmed a rematch
    pub play_again: Vec<UserId>,

    /// Is table closed
    pub is_closed: bool,
}

/// Why a seat was vacated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VacateReason {
    Left,
    TimedOut,
    NoRematch,
}

/// What changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NotificationKind {
    SeatJoined {
        seat: SeatIndex,
        user_id: UserId,
    },
    SeatVacated {
        seat: SeatIndex,
        user_id: UserId,
        reason: VacateReason,
    },
    BotInserted {
        seat: SeatIndex,
    },
    GameStarted {
        game_id: GameId,
        dealer: SeatIndex,
    },
    HandDealt {
        hand_no: u32,
        dealer: SeatIndex,
    },
    BidUpdated {
        seat: SeatIndex,
        bid: Bid,
    },
    CardPlayed {
        seat: SeatIndex,
        card: Card,
    },
    TrickResolved {
        trick: CompletedTrick,
    },
    /// Per-hand scores plus running totals and bags
    HandCompleted {
        summary: HandSummary,
    },
    GameOver {
        result: GameResult,
    },
    PlayerTimedOut {
        seat: SeatIndex,
        action: BotAction,
    },
    FailsafeApplied {
        hand_no: u32,
        tricks_played: usize,
    },
    GameReset {
        game_id: GameId,
    },
    GameAborted {
        reason: String,
    },
    TableClosed,
}

/// Notification sent when table state changes
#[derive(Debug, Clone, Serialize)]
pub struct TableNotification {
    pub table_id: TableId,
    pub kind: NotificationKind,
    pub snapshot: Arc<TableSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::PlayError;
    use crate::game::entities::Suit;

    #[test]
    fn game_errors_become_rejections() {
        let response = TableResponse::from(GameError::from(PlayError::MustFollowSuit(Suit::Club)));
        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some(ErrorCode::IllegalPlay));
        assert_eq!(
            response.error_message().unwrap(),
            "ILLEGAL_PLAY: illegal play: must follow ♣"
        );
    }

    #[test]
    fn notifications_serialize_with_snapshot() {
        use crate::game::{GameSettings, GameStateManagement, SpadesState};

        let snapshot = TableSnapshot {
            table_id: 3,
            table_name: "Spades".to_string(),
            game: SpadesState::new(GameSettings::default()).view(),
            timeouts: vec![0; 4],
            vacated: vec![],
            play_again: vec![],
            is_closed: false,
        };
        let notification = TableNotification {
            table_id: 3,
            kind: NotificationKind::SeatVacated {
                seat: 1,
                user_id: 7,
                reason: VacateReason::TimedOut,
            },
            snapshot: Arc::new(snapshot),
        };

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["snapshot"]["table_name"], "Spades");
        assert_eq!(json["kind"]["SeatVacated"]["reason"], "timed_out");
    }

    #[test]
    fn closed_table_response() {
        assert_eq!(TableResponse::closed().error_code(), Some(ErrorCode::TableClosed));
        assert!(TableResponse::Seated { seat: 2 }.is_success());
    }
}
