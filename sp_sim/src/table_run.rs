//! Drive a game through a real table actor.
//!
//! One simulated human sits in seat 0 and acts through the table handle the
//! way a transport would; the other three seats are bots.

use anyhow::{Result, bail, ensure};
use spades_engine::{
    PLAYERS,
    bot::{BotAction, BotPolicy},
    entities::UserId,
    game::scoring::GameResult,
    table::{NotificationKind, TableConfig, TableHandle, TableManager},
};
use tokio::sync::mpsc;

const SIM_USER: UserId = 1;

/// Play one game at a fresh table and close it.
pub async fn run_table_game(
    manager: &TableManager,
    config: TableConfig,
    policy: &BotPolicy,
) -> Result<GameResult> {
    let table_id = manager.create_table(config).await?;
    let handle = manager.require_table(table_id).await?;

    let (tx, mut rx) = mpsc::channel(1024);
    handle.subscribe(SIM_USER, tx).await;

    let seated = handle.join_seat(SIM_USER, "sim", Some(0)).await;
    ensure!(seated.is_success(), "join refused: {:?}", seated.error_message());
    for seat in 1..PLAYERS {
        let filled = handle.request_bot_fill(SIM_USER, seat).await;
        ensure!(filled.is_success(), "bot fill refused: {:?}", filled.error_message());
    }

    let result = loop {
        take_turn(&handle, policy).await?;
        let Some(notification) = rx.recv().await else {
            bail!("table {table_id} stopped without a result");
        };
        match notification.kind {
            NotificationKind::GameOver { result } => break result,
            NotificationKind::GameAborted { reason } => bail!("table {table_id} aborted: {reason}"),
            NotificationKind::TableClosed => bail!("table {table_id} closed mid-game"),
            NotificationKind::PlayerTimedOut { seat, action } => {
                log::warn!("Table {}: seat {} timed out, played {:?}", table_id, seat, action);
            }
            _ => {}
        }
    };

    manager.close_table(table_id).await?;
    Ok(result)
}

/// Act if the table is waiting on us.
async fn take_turn(handle: &TableHandle, policy: &BotPolicy) -> Result<()> {
    let Some(mut view) = handle.player_view(SIM_USER).await else {
        return Ok(());
    };
    if view.game.actor != Some(view.seat) {
        return Ok(());
    }
    if view.hand.is_none() {
        handle.get_hand(SIM_USER).await;
        view = match handle.player_view(SIM_USER).await {
            Some(view) => view,
            None => return Ok(()),
        };
    }

    let Some(action) = policy.decide_from_view(&view) else {
        return Ok(());
    };
    let response = match action {
        BotAction::Bid(bid) => handle.submit_bid(SIM_USER, bid).await,
        BotAction::Play(card) => handle.play_card(SIM_USER, card).await,
    };
    if let Some(message) = response.error_message() {
        bail!("table refused {action:?}: {message}");
    }
    Ok(())
}
