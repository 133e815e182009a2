//! Persistence collaborator.
//!
//! The table hands every record to a [`GameRecorder`] from a spawned task.
//! Recording is best effort: failures are logged by the table and never
//! reach gameplay.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::game::{
    constants::PLAYERS,
    entities::{Bid, Card, CompletedTrick, GameId, SeatIndex, TableId},
    scoring::GameResult,
    states::HandSummary,
};

/// Recorder errors
#[derive(Debug, Error)]
pub enum RecordError {
    /// Record could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing store unavailable
    #[error("Recorder unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandDealtRecord {
    pub table_id: TableId,
    pub game_id: GameId,
    pub hand_no: u32,
    pub dealer: SeatIndex,
    pub hands: [Vec<Card>; PLAYERS],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidRecord {
    pub table_id: TableId,
    pub game_id: GameId,
    pub hand_no: u32,
    pub seat: SeatIndex,
    pub bid: Bid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrickRecord {
    pub table_id: TableId,
    pub game_id: GameId,
    pub hand_no: u32,
    pub trick: CompletedTrick,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandScoreRecord {
    pub table_id: TableId,
    pub game_id: GameId,
    pub summary: HandSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResultRecord {
    pub table_id: TableId,
    pub result: GameResult,
}

/// Anything a recorder can be asked to store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum RecordEntry {
    HandDealt(HandDealtRecord),
    Bid(BidRecord),
    Trick(TrickRecord),
    HandScore(HandScoreRecord),
    GameResult(GameResultRecord),
}

/// Durable log of rounds, tricks, scores and results.
#[async_trait]
pub trait GameRecorder: Send + Sync {
    async fn log_hand_dealt(&self, record: HandDealtRecord) -> Result<(), RecordError>;

    async fn log_bid(&self, record: BidRecord) -> Result<(), RecordError>;

    async fn log_trick(&self, record: TrickRecord) -> Result<(), RecordError>;

    async fn log_hand_score(&self, record: HandScoreRecord) -> Result<(), RecordError>;

    async fn log_game_result(&self, record: GameResultRecord) -> Result<(), RecordError>;

    /// Route an entry to its method.
    async fn record(&self, entry: RecordEntry) -> Result<(), RecordError> {
        match entry {
            RecordEntry::HandDealt(record) => self.log_hand_dealt(record).await,
            RecordEntry::Bid(record) => self.log_bid(record).await,
            RecordEntry::Trick(record) => self.log_trick(record).await,
            RecordEntry::HandScore(record) => self.log_hand_score(record).await,
            RecordEntry::GameResult(record) => self.log_game_result(record).await,
        }
    }
}

/// Writes each record as a JSON log line.
#[derive(Debug, Default, Clone)]
pub struct LogRecorder;

impl LogRecorder {
    fn write(entry: &RecordEntry) -> Result<(), RecordError> {
        let line = serde_json::to_string(entry)?;
        log::info!(target: "spades_engine::record", "{line}");
        Ok(())
    }
}

#[async_trait]
impl GameRecorder for LogRecorder {
    async fn log_hand_dealt(&self, record: HandDealtRecord) -> Result<(), RecordError> {
        Self::write(&RecordEntry::HandDealt(record))
    }

    async fn log_bid(&self, record: BidRecord) -> Result<(), RecordError> {
        Self::write(&RecordEntry::Bid(record))
    }

    async fn log_trick(&self, record: TrickRecord) -> Result<(), RecordError> {
        Self::write(&RecordEntry::Trick(record))
    }

    async fn log_hand_score(&self, record: HandScoreRecord) -> Result<(), RecordError> {
        Self::write(&RecordEntry::HandScore(record))
    }

    async fn log_game_result(&self, record: GameResultRecord) -> Result<(), RecordError> {
        Self::write(&RecordEntry::GameResult(record))
    }
}

/// Keeps records in memory. Handy for tests and the simulator.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecorder {
    entries: Arc<Mutex<Vec<RecordEntry>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<RecordEntry> {
        self.entries.lock().await.clone()
    }

    async fn push(&self, entry: RecordEntry) -> Result<(), RecordError> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

#[async_trait]
impl GameRecorder for MemoryRecorder {
    async fn log_hand_dealt(&self, record: HandDealtRecord) -> Result<(), RecordError> {
        self.push(RecordEntry::HandDealt(record)).await
    }

    async fn log_bid(&self, record: BidRecord) -> Result<(), RecordError> {
        self.push(RecordEntry::Bid(record)).await
    }

    async fn log_trick(&self, record: TrickRecord) -> Result<(), RecordError> {
        self.push(RecordEntry::Trick(record)).await
    }

    async fn log_hand_score(&self, record: HandScoreRecord) -> Result<(), RecordError> {
        self.push(RecordEntry::HandScore(record)).await
    }

    async fn log_game_result(&self, record: GameResultRecord) -> Result<(), RecordError> {
        self.push(RecordEntry::GameResult(record)).await
    }
}
