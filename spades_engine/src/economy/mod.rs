//! Economy collaborator.
//!
//! Buy-ins and payouts are settled once per game, strictly after the game
//! reached `FINISHED`. A crash mid-hand therefore never pays out.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::game::{
    entities::{GameId, TableId, UserId},
    scoring::GameResult,
};

/// Settlement errors
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Economy refused the settlement
    #[error("Settlement rejected: {0}")]
    Rejected(String),

    /// Economy unavailable
    #[error("Economy unavailable: {0}")]
    Unavailable(String),
}

impl SettlementError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            SettlementError::Unavailable(_) => "Payout delayed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Who pays and who collects for a finished game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payout {
    pub table_id: TableId,
    pub game_id: GameId,
    pub buy_in: i64,
    /// Human winners; bots never collect.
    pub winners: Vec<UserId>,
    pub losers: Vec<UserId>,
    pub result: GameResult,
}

#[async_trait]
pub trait Settlement: Send + Sync {
    async fn settle_game(&self, payout: Payout) -> Result<(), SettlementError>;
}

/// Accepts every settlement without moving anything.
#[derive(Debug, Default, Clone)]
pub struct NoopSettlement;

#[async_trait]
impl Settlement for NoopSettlement {
    async fn settle_game(&self, payout: Payout) -> Result<(), SettlementError> {
        log::debug!(
            "Table {}: game {} settled ({} winners, buy-in {})",
            payout.table_id,
            payout.game_id,
            payout.winners.len(),
            payout.buy_in
        );
        Ok(())
    }
}
