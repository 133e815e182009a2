//! Scoring engine.
//!
//! Scores are kept per scoring entity: two teams in partners mode, four
//! seats in solo mode. See [`GameMode::entity_of`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    constants::{
        BLIND_NIL_MULTIPLIER, PARTNERS_BAG_PENALTY, PARTNERS_BAG_THRESHOLD, PARTNERS_NIL_BONUS,
        PLAYERS, POINTS_PER_TRICK, SOLO_BAG_PENALTY, SOLO_BAG_THRESHOLD, SOLO_NIL_BONUS,
        TRICKS_PER_HAND,
    },
    entities::{Bid, GameId, GameMode, SeatIndex},
};

/// Non-fatal scoring anomaly. Logged, never propagated to gameplay.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ScoringError {
    #[error("hand recorded {total} tricks instead of 13")]
    TrickCountMismatch { total: usize },
}

/// Score change for one entity over one hand.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityDelta {
    /// Combined non-nil bid of the entity.
    pub contract: u8,
    /// Tricks counted toward the contract.
    pub contract_tricks: u8,
    /// Contract points, including +1 per overtrick.
    pub contract_points: i32,
    /// Nil and blind nil bonuses and penalties.
    pub nil_points: i32,
    /// Bags added this hand, before any penalty.
    pub bags: i32,
}

impl EntityDelta {
    #[must_use]
    pub fn points(&self) -> i32 {
        self.contract_points + self.nil_points
    }
}

/// Scoring breakdown for one completed hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandScore {
    pub mode: GameMode,
    pub bids: [Bid; PLAYERS],
    pub tricks: [u8; PLAYERS],
    pub deltas: Vec<EntityDelta>,
    pub anomaly: Option<ScoringError>,
}

fn nil_value(mode: GameMode, bid: Bid) -> i32 {
    let base = match mode {
        GameMode::Partners => PARTNERS_NIL_BONUS,
        GameMode::Solo => SOLO_NIL_BONUS,
    };
    match bid {
        Bid::BlindNil => base * BLIND_NIL_MULTIPLIER,
        _ => base,
    }
}

/// Score one hand from final bids and tricks taken per seat.
///
/// Nil seats score their fixed bonus or penalty and never count toward a
/// partner's contract; tricks they take become bags for their entity.
#[must_use]
pub fn score_hand(mode: GameMode, bids: &[Bid; PLAYERS], tricks: &[u8; PLAYERS]) -> HandScore {
    let bids = bids.map(Bid::normalized);
    let mut deltas = vec![EntityDelta::default(); mode.entities()];

    for seat in 0..PLAYERS {
        let delta = &mut deltas[mode.entity_of(seat)];
        let bid = bids[seat];
        let taken = tricks[seat];
        if bid.is_nil() {
            let value = nil_value(mode, bid);
            if taken == 0 {
                delta.nil_points += value;
            } else {
                delta.nil_points -= value;
                delta.bags += i32::from(taken);
            }
        } else {
            delta.contract += bid.contract();
            delta.contract_tricks += taken;
        }
    }

    for delta in &mut deltas {
        let contract = i32::from(delta.contract);
        let made = i32::from(delta.contract_tricks);
        if made >= contract {
            let over = made - contract;
            delta.contract_points = contract * POINTS_PER_TRICK + over;
            delta.bags += over;
        } else {
            delta.contract_points = -contract * POINTS_PER_TRICK;
        }
    }

    let total: usize = tricks.iter().map(|t| usize::from(*t)).sum();
    let anomaly = (total != TRICKS_PER_HAND).then_some(ScoringError::TrickCountMismatch { total });
    if let Some(anomaly) = &anomaly {
        log::error!("Scoring sanity check failed: {anomaly}");
    }

    HandScore {
        mode,
        bids,
        tricks: *tricks,
        deltas,
        anomaly,
    }
}

/// Running totals for a game.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScoreBoard {
    pub mode: GameMode,
    pub scores: Vec<i32>,
    pub bags: Vec<i32>,
}

impl ScoreBoard {
    #[must_use]
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            scores: vec![0; mode.entities()],
            bags: vec![0; mode.entities()],
        }
    }

    #[must_use]
    pub fn bag_threshold(&self) -> i32 {
        match self.mode {
            GameMode::Partners => PARTNERS_BAG_THRESHOLD,
            GameMode::Solo => SOLO_BAG_THRESHOLD,
        }
    }

    #[must_use]
    pub fn bag_penalty(&self) -> i32 {
        match self.mode {
            GameMode::Partners => PARTNERS_BAG_PENALTY,
            GameMode::Solo => SOLO_BAG_PENALTY,
        }
    }

    /// Add a hand's deltas to the running totals. Each time an entity's bag
    /// counter reaches the threshold the penalty is applied and the counter
    /// is reduced by the threshold, keeping any overflow. Returns the number
    /// of penalties applied per entity.
    pub fn apply(&mut self, hand: &HandScore) -> Vec<u32> {
        let threshold = self.bag_threshold();
        let penalty = self.bag_penalty();
        let mut penalties = vec![0; self.scores.len()];
        for (entity, delta) in hand.deltas.iter().enumerate() {
            self.scores[entity] += delta.points();
            self.bags[entity] += delta.bags;
            while self.bags[entity] >= threshold {
                self.scores[entity] -= penalty;
                self.bags[entity] -= threshold;
                penalties[entity] += 1;
            }
        }
        penalties
    }

    #[must_use]
    pub fn score_of(&self, seat: SeatIndex) -> i32 {
        self.scores[self.mode.entity_of(seat)]
    }
}

/// Who won a finished game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// Partnership index; team 0 holds seats 0 and 2.
    Team(usize),
    Seat(SeatIndex),
}

impl Winner {
    /// Seats that share in the win.
    #[must_use]
    pub fn seats(self) -> Vec<SeatIndex> {
        match self {
            Self::Team(team) => vec![team, team + 2],
            Self::Seat(seat) => vec![seat],
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameOutcome {
    /// No threshold crossed.
    Continue,
    /// A threshold was crossed but the top score is shared.
    TiedAtThreshold,
    Won(Winner),
}

/// Check the running totals against the game's point thresholds.
#[must_use]
pub fn check_game_over(board: &ScoreBoard, max_points: i32, min_points: i32) -> GameOutcome {
    let crossed = board
        .scores
        .iter()
        .any(|score| *score >= max_points || *score <= min_points);
    if !crossed {
        return GameOutcome::Continue;
    }
    let Some(top) = board.scores.iter().copied().max() else {
        return GameOutcome::Continue;
    };
    let leaders: Vec<usize> = board
        .scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score == top)
        .map(|(entity, _)| entity)
        .collect();
    match leaders.as_slice() {
        [entity] => GameOutcome::Won(match board.mode {
            GameMode::Partners => Winner::Team(*entity),
            GameMode::Solo => Winner::Seat(*entity),
        }),
        _ => GameOutcome::TiedAtThreshold,
    }
}

/// Final record of a finished game, handed to the recorder and settlement.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameResult {
    pub game_id: GameId,
    pub mode: GameMode,
    pub winner: Winner,
    pub final_scores: Vec<i32>,
    pub final_bags: Vec<i32>,
    pub hands_played: u32,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: fn(u8) -> Bid = Bid::Tricks;

    #[test]
    fn partners_contract_made_with_bags() {
        let hand = score_hand(GameMode::Partners, &[T(4), T(3), T(2), T(3)], &[4, 3, 3, 3]);
        assert_eq!(hand.deltas[0].contract, 6);
        assert_eq!(hand.deltas[0].points(), 61);
        assert_eq!(hand.deltas[0].bags, 1);
        assert_eq!(hand.deltas[1].points(), 60);
        assert_eq!(hand.deltas[1].bags, 0);
        assert!(hand.anomaly.is_none());
    }

    #[test]
    fn partners_contract_set() {
        let hand = score_hand(GameMode::Partners, &[T(5), T(3), T(4), T(1)], &[4, 5, 3, 1]);
        assert_eq!(hand.deltas[0].points(), -90);
        assert_eq!(hand.deltas[1].points(), 42);
        assert_eq!(hand.deltas[1].bags, 2);
    }

    #[test]
    fn nil_made_scores_bonus_without_bags() {
        let hand = score_hand(GameMode::Partners, &[Bid::Nil, T(4), T(5), T(4)], &[0, 4, 5, 4]);
        assert_eq!(hand.deltas[0].nil_points, 100);
        assert_eq!(hand.deltas[0].points(), 150);
        assert_eq!(hand.deltas[0].bags, 0);
    }

    #[test]
    fn nil_set_gives_penalty_and_bags() {
        let hand = score_hand(GameMode::Partners, &[Bid::Nil, T(4), T(4), T(3)], &[2, 4, 4, 3]);
        assert_eq!(hand.deltas[0].nil_points, -100);
        assert_eq!(hand.deltas[0].bags, 2);
        // Partner's four is scored on its own tricks only.
        assert_eq!(hand.deltas[0].contract_points, 40);
    }

    #[test]
    fn blind_nil_doubles() {
        let made = score_hand(GameMode::Partners, &[Bid::BlindNil, T(4), T(5), T(4)], &[0, 4, 5, 4]);
        assert_eq!(made.deltas[0].nil_points, 200);
        let set = score_hand(GameMode::Partners, &[Bid::BlindNil, T(4), T(4), T(4)], &[1, 4, 4, 4]);
        assert_eq!(set.deltas[0].nil_points, -200);
        assert_eq!(set.deltas[0].bags, 1);
    }

    #[test]
    fn solo_nil_uses_half_scale() {
        let hand = score_hand(GameMode::Solo, &[Bid::Nil, Bid::BlindNil, T(6), T(6)], &[0, 1, 6, 6]);
        assert_eq!(hand.deltas.len(), 4);
        assert_eq!(hand.deltas[0].points(), 50);
        assert_eq!(hand.deltas[1].points(), -100);
        assert_eq!(hand.deltas[1].bags, 1);
        assert_eq!(hand.deltas[2].points(), 60);
    }

    #[test]
    fn forced_zero_scores_as_nil() {
        let hand = score_hand(GameMode::Partners, &[T(0), T(4), T(5), T(4)], &[0, 4, 5, 4]);
        assert_eq!(hand.bids[0], Bid::Nil);
        assert_eq!(hand.deltas[0].nil_points, 100);
    }

    #[test]
    fn bag_penalty_keeps_overflow() {
        let mut board = ScoreBoard::new(GameMode::Partners);
        board.bags[0] = 8;
        let hand = score_hand(GameMode::Partners, &[T(3), T(3), T(3), T(1)], &[5, 3, 4, 1]);
        assert_eq!(hand.deltas[0].bags, 3);
        let penalties = board.apply(&hand);
        assert_eq!(penalties, vec![1, 0]);
        assert_eq!(board.bags[0], 1);
        assert_eq!(board.scores[0], 63 - 100);
    }

    #[test]
    fn bag_penalty_exactly_at_threshold() {
        let mut board = ScoreBoard::new(GameMode::Solo);
        board.bags[2] = 3;
        let hand = score_hand(GameMode::Solo, &[T(3), T(3), T(2), T(1)], &[3, 3, 4, 3]);
        let penalties = board.apply(&hand);
        assert_eq!(penalties[2], 1);
        assert_eq!(board.bags[2], 0);
        assert_eq!(board.scores[2], 22 - 50);
        assert_eq!(board.bags[3], 2);
    }

    #[test]
    fn mismatch_is_reported_not_fatal() {
        let hand = score_hand(GameMode::Partners, &[T(3), T(3), T(3), T(3)], &[3, 3, 3, 3]);
        assert_eq!(hand.anomaly, Some(ScoringError::TrickCountMismatch { total: 12 }));
    }

    #[test]
    fn game_over_detection() {
        let mut board = ScoreBoard::new(GameMode::Partners);
        board.scores = vec![510, 300];
        assert_eq!(check_game_over(&board, 500, -500), GameOutcome::Won(Winner::Team(0)));
        board.scores = vec![490, 300];
        assert_eq!(check_game_over(&board, 500, -500), GameOutcome::Continue);
        board.scores = vec![520, 520];
        assert_eq!(check_game_over(&board, 500, -500), GameOutcome::TiedAtThreshold);
        board.scores = vec![-510, 120];
        assert_eq!(check_game_over(&board, 500, -500), GameOutcome::Won(Winner::Team(1)));
    }

    #[test]
    fn solo_highest_individual_wins() {
        let mut board = ScoreBoard::new(GameMode::Solo);
        board.scores = vec![200, 260, 180, 240];
        assert_eq!(check_game_over(&board, 250, -250), GameOutcome::Won(Winner::Seat(1)));
        assert_eq!(Winner::Team(1).seats(), vec![1, 3]);
    }
}
