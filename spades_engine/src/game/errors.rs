//! Error types for the game engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::entities::{Bid, Suit};

/// Why a bid was refused.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum BidError {
    #[error("bid must be between {min} and {max}")]
    OutOfRange { min: u8, max: u8 },
    #[error("nil is disabled at this table")]
    NilDisabled,
    #[error("blind nil is disabled at this table")]
    BlindNilDisabled,
    #[error("this hand requires a bid of {required}")]
    ForcedBid { required: Bid },
    #[error("allowed bids are {}", display_bids(.allowed))]
    NotAllowed { allowed: Vec<Bid> },
    #[error("your partner bid a number, you must bid nil")]
    SuicideNilRequired,
    #[error("your partner bid nil, you must bid a number")]
    PartnerAlreadyNil,
}

fn display_bids(bids: &[Bid]) -> String {
    bids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which play rule a card violated.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum PlayError {
    #[error("must follow {0}")]
    MustFollowSuit(Suit),
    #[error("spades have not been broken")]
    SpadesNotBroken,
    #[error("screamer: can't play a spade while holding another suit")]
    ScreamerNoSpades,
    #[error("assassin: must lead a spade")]
    AssassinMustLeadSpades,
    #[error("assassin: must cut with a spade")]
    AssassinMustCut,
}

/// Errors produced by game operations. Validation errors leave the game
/// untouched; `Corrupted` means an internal invariant broke.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("not your turn")]
    OutOfTurn,
    #[error("card not in hand")]
    CardNotInHand,
    #[error("invalid bid: {0}")]
    InvalidBid(#[from] BidError),
    #[error("illegal play: {0}")]
    IllegalPlay(#[from] PlayError),
    #[error("action not allowed while {0}")]
    PhaseMismatch(String),
    #[error("seat is taken")]
    SeatTaken,
    #[error("seat is empty")]
    SeatEmpty,
    #[error("not seated at this table")]
    NotSeated,
    #[error("already seated at this table")]
    AlreadySeated,
    #[error("table is full")]
    TableFull,
    #[error("hand already seen, blind nil not allowed")]
    HandAlreadySeen,
    #[error("invalid game state: no dealer")]
    NoDealer,
    #[error("invalid game state: trick incomplete")]
    IncompleteTrick,
    #[error("invalid seat {0}")]
    InvalidSeat(usize),
    #[error("invalid game state: {0}")]
    Corrupted(String),
}

/// Stable machine-readable codes that collaborators can switch on.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotYourTurn,
    CardNotInHand,
    InvalidBid,
    IllegalPlay,
    WrongPhase,
    SeatUnavailable,
    NotSeated,
    TableFull,
    HandAlreadySeen,
    InternalError,
    TableClosed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::CardNotInHand => "CARD_NOT_IN_HAND",
            Self::InvalidBid => "INVALID_BID",
            Self::IllegalPlay => "ILLEGAL_PLAY",
            Self::WrongPhase => "WRONG_PHASE",
            Self::SeatUnavailable => "SEAT_UNAVAILABLE",
            Self::NotSeated => "NOT_SEATED",
            Self::TableFull => "TABLE_FULL",
            Self::HandAlreadySeen => "HAND_ALREADY_SEEN",
            Self::InternalError => "INTERNAL_ERROR",
            Self::TableClosed => "TABLE_CLOSED",
        };
        write!(f, "{repr}")
    }
}

/// How the table should react to an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// Bad input from a seat; reject and carry on.
    Validation,
    /// Request doesn't fit the current phase or seating.
    InvalidState,
    /// The game can't continue and must be aborted.
    Fatal,
}

impl GameError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::OutOfTurn => ErrorCode::NotYourTurn,
            Self::CardNotInHand => ErrorCode::CardNotInHand,
            Self::InvalidBid(_) => ErrorCode::InvalidBid,
            Self::IllegalPlay(_) => ErrorCode::IllegalPlay,
            Self::PhaseMismatch(_) => ErrorCode::WrongPhase,
            Self::SeatTaken | Self::SeatEmpty | Self::InvalidSeat(_) => {
                ErrorCode::SeatUnavailable
            }
            Self::NotSeated | Self::AlreadySeated => ErrorCode::NotSeated,
            Self::TableFull => ErrorCode::TableFull,
            Self::HandAlreadySeen => ErrorCode::HandAlreadySeen,
            Self::NoDealer | Self::IncompleteTrick | Self::Corrupted(_) => ErrorCode::InternalError,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::OutOfTurn
            | Self::CardNotInHand
            | Self::InvalidBid(_)
            | Self::IllegalPlay(_)
            | Self::HandAlreadySeen => Severity::Validation,
            Self::PhaseMismatch(_)
            | Self::SeatTaken
            | Self::SeatEmpty
            | Self::NotSeated
            | Self::AlreadySeated
            | Self::TableFull
            | Self::InvalidSeat(_)
            | Self::NoDealer
            | Self::IncompleteTrick => Severity::InvalidState,
            Self::Corrupted(_) => Severity::Fatal,
        }
    }

    /// Message safe to show to a player. Internal details stay in the logs.
    #[must_use]
    pub fn client_message(&self) -> String {
        match (self.severity(), self.code()) {
            (Severity::Fatal, _) => "Internal game error, the game was aborted".to_string(),
            (_, ErrorCode::InternalError) => "Internal game error, action dropped".to_string(),
            _ => self.to_string(),
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
