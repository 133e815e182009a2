//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; those records are bridged into
//! tracing by `tracing-subscriber`'s default `tracing-log` feature.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG` and default to `info`. Per-record game
/// logs (`spades_engine::record`) stay hidden unless `RUST_LOG` asks for them.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spades_engine::record=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Structured logging initialized");
}

/// Log a finished game with structured fields
pub fn log_game_summary(index: u32, hands: u32, winner: &str, scores: &[i32]) {
    tracing::info!(
        game = index + 1,
        hands = hands,
        winner = winner,
        scores = ?scores,
        "Game finished"
    );
}
