//! Phase types for the spades FSM.
//!
//! Each phase carries only the data that exists during that phase. Hand-level
//! data is created when a hand is dealt and dropped when the next one starts.

use serde::{Deserialize, Serialize};

use crate::game::{
    constants::PLAYERS,
    entities::{Bid, CompletedTrick, GameStatus, SeatIndex, Trick},
    rules::HandRules,
    scoring::{GameOutcome, GameResult, HandScore},
};

/// Context shared by every phase of a single hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandContext {
    /// 1-based hand number within the game.
    pub number: u32,
    pub dealer: SeatIndex,
    pub rules: HandRules,
}

/// Scoring record of a finished hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandSummary {
    pub number: u32,
    pub dealer: SeatIndex,
    pub score: HandScore,
    /// Running totals after this hand, bag penalties included.
    pub totals: Vec<i32>,
    pub bags: Vec<i32>,
    /// Bag penalties applied per scoring entity this hand.
    pub penalties: Vec<u32>,
}

/// Read access to the per-phase data used for views.
pub trait Phase {
    fn status(&self) -> GameStatus;

    fn hand(&self) -> Option<&HandContext> {
        None
    }

    fn bids(&self) -> [Option<Bid>; PLAYERS] {
        [None; PLAYERS]
    }

    fn actor(&self) -> Option<SeatIndex> {
        None
    }

    fn trick(&self) -> Option<&Trick> {
        None
    }

    fn tricks_won(&self) -> [u8; PLAYERS] {
        [0; PLAYERS]
    }

    fn last_trick(&self) -> Option<&CompletedTrick> {
        None
    }

    fn spades_broken(&self) -> bool {
        false
    }
}

/// Seats are filling up; nothing has been dealt.
#[derive(Debug, Default)]
pub struct Waiting {}

impl Phase for Waiting {
    fn status(&self) -> GameStatus {
        GameStatus::Waiting
    }
}

/// Cards are dealt and seats bid in turn from the dealer's left.
#[derive(Clone, Debug)]
pub struct Bidding {
    pub hand: HandContext,
    pub bids: [Option<Bid>; PLAYERS],
    pub current: SeatIndex,
}

impl Bidding {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.bids.iter().all(Option::is_some)
    }

    #[must_use]
    pub fn placed(&self) -> usize {
        self.bids.iter().filter(|bid| bid.is_some()).count()
    }
}

impl Phase for Bidding {
    fn status(&self) -> GameStatus {
        GameStatus::Bidding
    }

    fn hand(&self) -> Option<&HandContext> {
        Some(&self.hand)
    }

    fn bids(&self) -> [Option<Bid>; PLAYERS] {
        self.bids
    }

    fn actor(&self) -> Option<SeatIndex> {
        Some(self.current)
    }
}

/// Thirteen tricks are played.
#[derive(Clone, Debug)]
pub struct Playing {
    pub hand: HandContext,
    pub bids: [Bid; PLAYERS],
    pub trick: Trick,
    pub completed: Vec<CompletedTrick>,
    pub tricks_won: [u8; PLAYERS],
    pub spades_broken: bool,
    pub actor: SeatIndex,
}

impl Playing {
    /// Cards played so far this hand, used to key turns.
    #[must_use]
    pub fn cards_played(&self) -> usize {
        self.completed.len() * PLAYERS + self.trick.len()
    }
}

impl Phase for Playing {
    fn status(&self) -> GameStatus {
        GameStatus::Playing
    }

    fn hand(&self) -> Option<&HandContext> {
        Some(&self.hand)
    }

    fn bids(&self) -> [Option<Bid>; PLAYERS] {
        self.bids.map(Some)
    }

    fn actor(&self) -> Option<SeatIndex> {
        Some(self.actor)
    }

    fn trick(&self) -> Option<&Trick> {
        Some(&self.trick)
    }

    fn tricks_won(&self) -> [u8; PLAYERS] {
        self.tricks_won
    }

    fn last_trick(&self) -> Option<&CompletedTrick> {
        self.completed.last()
    }

    fn spades_broken(&self) -> bool {
        self.spades_broken
    }
}

/// The hand is scored; the next step either deals again or finishes.
#[derive(Clone, Debug)]
pub struct HandCompleted {
    pub hand: HandContext,
    pub last_trick: Option<CompletedTrick>,
    pub summary: HandSummary,
    pub outcome: GameOutcome,
}

impl Phase for HandCompleted {
    fn status(&self) -> GameStatus {
        GameStatus::HandCompleted
    }

    fn hand(&self) -> Option<&HandContext> {
        Some(&self.hand)
    }

    fn bids(&self) -> [Option<Bid>; PLAYERS] {
        self.summary.score.bids.map(Some)
    }

    fn tricks_won(&self) -> [u8; PLAYERS] {
        self.summary.score.tricks
    }

    fn last_trick(&self) -> Option<&CompletedTrick> {
        self.last_trick.as_ref()
    }
}

/// Terminal phase. A rematch starts a new game from here.
#[derive(Clone, Debug)]
pub struct Finished {
    pub result: GameResult,
}

impl Phase for Finished {
    fn status(&self) -> GameStatus {
        GameStatus::Finished
    }
}
