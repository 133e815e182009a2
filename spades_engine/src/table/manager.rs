//! Table manager for spawning and managing multiple table actors.

use super::{
    actor::{TableActor, TableHandle},
    config::{ConfigError, TableConfig},
    messages::TableSnapshot,
};
use crate::{
    economy::{NoopSettlement, Settlement},
    game::entities::{GameFormat, GameMode, GameStatus, TableId},
    recorder::{GameRecorder, LogRecorder},
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("invalid table config: {0}")]
    Config(#[from] ConfigError),

    #[error("table {0} not found")]
    NotFound(TableId),

    #[error("table {0} is closed")]
    Closed(TableId),
}

/// Table metadata for discovery
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    pub id: TableId,
    pub name: String,
    pub player_count: usize,
    pub bot_count: usize,
    pub mode: GameMode,
    pub format: GameFormat,
    pub status: GameStatus,
    pub max_points: i32,
}

impl From<&TableSnapshot> for TableMetadata {
    fn from(snapshot: &TableSnapshot) -> Self {
        let seated = snapshot.game.seats.iter().filter_map(|seat| seat.player.as_ref());
        let (bots, humans): (Vec<_>, Vec<_>) = seated.partition(|player| player.is_bot());
        Self {
            id: snapshot.table_id,
            name: snapshot.table_name.clone(),
            player_count: humans.len(),
            bot_count: bots.len(),
            mode: snapshot.game.mode,
            format: snapshot.game.format,
            status: snapshot.game.status,
            max_points: snapshot.game.max_points,
        }
    }
}

/// Table manager for managing multiple table instances
pub struct TableManager {
    /// Persistence collaborator shared by every table
    recorder: Arc<dyn GameRecorder>,

    /// Economy collaborator shared by every table
    settlement: Arc<dyn Settlement>,

    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Next table ID
    next_table_id: Arc<RwLock<TableId>>,
}

impl Default for TableManager {
    fn default() -> Self {
        Self::new(Arc::new(LogRecorder), Arc::new(NoopSettlement))
    }
}

impl TableManager {
    /// Create a new table manager
    ///
    /// # Arguments
    ///
    /// * `recorder` - Persistence collaborator handed to each table
    /// * `settlement` - Economy collaborator handed to each table
    pub fn new(recorder: Arc<dyn GameRecorder>, settlement: Arc<dyn Settlement>) -> Self {
        Self {
            recorder,
            settlement,
            tables: Arc::new(RwLock::new(HashMap::new())),
            next_table_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Create a new table and spawn its actor
    ///
    /// # Returns
    ///
    /// * `Result<TableId, ManagerError>` - Table ID, or why the config was refused
    pub async fn create_table(&self, config: TableConfig) -> Result<TableId, ManagerError> {
        config.validate()?;

        let mut next_id = self.next_table_id.write().await;
        let table_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let name = config.name.clone();
        let (actor, handle) = TableActor::new(
            table_id,
            config,
            Arc::clone(&self.recorder),
            Arc::clone(&self.settlement),
        );

        let mut tables = self.tables.write().await;
        tables.insert(table_id, handle);
        drop(tables);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned table {} '{}'", table_id, name);

        Ok(table_id)
    }

    /// Get a table handle
    pub async fn get_table(&self, table_id: TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).cloned()
    }

    /// Get a table handle, or an error naming the table
    pub async fn require_table(&self, table_id: TableId) -> Result<TableHandle, ManagerError> {
        self.get_table(table_id)
            .await
            .ok_or(ManagerError::NotFound(table_id))
    }

    /// Get table state
    pub async fn get_table_snapshot(&self, table_id: TableId) -> Result<TableSnapshot, ManagerError> {
        self.require_table(table_id)
            .await?
            .snapshot()
            .await
            .ok_or(ManagerError::Closed(table_id))
    }

    /// List all live tables, ordered by id
    pub async fn list_tables(&self) -> Vec<TableMetadata> {
        let handles: Vec<TableHandle> = {
            let tables = self.tables.read().await;
            tables.values().cloned().collect()
        };

        let mut metadata_list = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Some(snapshot) = handle.snapshot().await {
                metadata_list.push(TableMetadata::from(&snapshot));
            }
        }
        metadata_list.sort_by_key(|metadata| metadata.id);
        metadata_list
    }

    /// Close a table
    pub async fn close_table(&self, table_id: TableId) -> Result<(), ManagerError> {
        let handle = self
            .tables
            .write()
            .await
            .remove(&table_id)
            .ok_or(ManagerError::NotFound(table_id))?;

        // Already torn down by the actor is fine.
        let _ = handle.close().await;

        log::info!("Closed table {}", table_id);

        Ok(())
    }

    /// Forget tables whose actors have stopped on their own
    ///
    /// # Returns
    ///
    /// * `usize` - Number of tables removed
    pub async fn prune_closed(&self) -> usize {
        let mut tables = self.tables.write().await;
        let before = tables.len();
        tables.retain(|_, handle| !handle.is_closed());
        let pruned = before - tables.len();
        if pruned > 0 {
            log::debug!("Pruned {} closed tables", pruned);
        }
        pruned
    }

    /// Get active table count
    pub async fn active_table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }
}
