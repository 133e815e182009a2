//! Drive a game to completion with bots in every seat.
//!
//! Used by the simulator, the benchmarks and the property tests.

use super::{
    bot_player,
    decision::{BotAction, BotPolicy},
};
use crate::game::{
    GameSettings, GameStateManagement, SeatManagement, SpadesState,
    constants::PLAYERS,
    entities::GameStatus,
    errors::GameError,
    scoring::GameResult,
    states::HandSummary,
};

/// Result of a simulated game.
#[derive(Clone, Debug)]
pub struct AutoplayReport {
    pub result: GameResult,
    pub hands: Vec<HandSummary>,
}

/// Apply one bot action to the game.
pub fn apply_action(
    state: &mut SpadesState,
    seat: usize,
    action: BotAction,
) -> Result<(), GameError> {
    match action {
        BotAction::Bid(bid) => state.place_bid(seat, bid),
        BotAction::Play(card) => state.play_card(seat, card),
    }
}

/// Play until a single hand has been scored. The game is left in
/// `HandCompleted`.
pub fn play_hand(state: &mut SpadesState, policy: &BotPolicy) -> Result<(), GameError> {
    while let Some(turn) = state.pending_turn() {
        let action = policy
            .decide(state, turn.seat)
            .ok_or_else(|| GameError::Corrupted(format!("seat {} has no move", turn.seat)))?;
        apply_action(state, turn.seat, action)?;
    }
    Ok(())
}

/// Seat four bots and play a full game under `settings`. Gives up with an
/// error after `max_hands` hands.
pub fn play_bot_game(
    settings: GameSettings,
    policy: &BotPolicy,
    max_hands: u32,
) -> Result<AutoplayReport, GameError> {
    let mut state = SpadesState::new(settings);
    for seat in 0..PLAYERS {
        state.seat_player(bot_player(seat))?;
    }
    state = state.step();

    loop {
        play_hand(&mut state, policy)?;
        match state.status() {
            GameStatus::HandCompleted => state = state.step(),
            GameStatus::Finished => break,
            status => return Err(GameError::PhaseMismatch(status.to_string())),
        }
        if state.data().hand_no > max_hands {
            return Err(GameError::Corrupted(format!(
                "no winner after {max_hands} hands"
            )));
        }
        state.drain_events();
    }

    let result = state
        .result()
        .cloned()
        .ok_or_else(|| GameError::Corrupted("finished without a result".to_string()))?;
    Ok(AutoplayReport {
        result,
        hands: state.data().history.clone(),
    })
}
