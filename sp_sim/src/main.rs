//! Headless Spades simulation runner.
//!
//! Plays a batch of bot games, either straight through the engine or through
//! table actors, and prints a JSON summary.

mod config;
mod logging;
mod table_run;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use serde::Serialize;
use spades_engine::{
    bot::{BotPolicy, play_bot_game},
    economy::NoopSettlement,
    game::scoring::{GameResult, Winner},
    recorder::LogRecorder,
    table::TableManager,
};
use std::sync::Arc;

use config::{SimConfig, SimOverrides};

const HELP: &str = "\
Run headless Spades games between bots

USAGE:
  sp_sim [OPTIONS]

OPTIONS:
  --games      N           Number of games to play      [default: env SIM_GAMES or 100]
  --mode       MODE        partners | solo              [default: env SIM_MODE or partners]
  --format     FORMAT      regular | whiz | mirror | suicide | bid4_or_nil |
                           bid3 | bidhearts | crazy_aces [default: env SIM_FORMAT or regular]
  --seed       N           Base shuffle seed            [default: env SIM_SEED or random]

FLAGS:
  --via-table              Play through table actors with one simulated human
  -h, --help               Print help information

ENVIRONMENT:
  SIM_MAX_POINTS           Game-over threshold (default 500)
  SIM_MIN_POINTS           Losing threshold (default -500)
  SIM_SCREAMER             Enable the screamer rule (true/false)
  SIM_ASSASSIN             Enable the assassin rule (true/false)
  SIM_MAX_HANDS            Abandon a game after this many hands (default 200)
  RUST_LOG                 Log filter (default info)
";

/// Aggregate results of a run
#[derive(Debug, Default, Serialize)]
struct Summary {
    games: u32,
    failed: u32,
    hands: u32,
    avg_hands: f64,
    /// Wins per team (partners) or per seat (solo)
    wins: Vec<u32>,
    highest_score: i32,
    lowest_score: i32,
}

impl Summary {
    fn new(entities: usize) -> Self {
        Self {
            wins: vec![0; entities],
            ..Default::default()
        }
    }

    fn add(&mut self, result: &GameResult) {
        self.games += 1;
        self.hands += result.hands_played;
        let winner = match result.winner {
            Winner::Team(team) => team,
            Winner::Seat(seat) => seat,
        };
        if let Some(wins) = self.wins.get_mut(winner) {
            *wins += 1;
        }
        for score in &result.final_scores {
            self.highest_score = self.highest_score.max(*score);
            self.lowest_score = self.lowest_score.min(*score);
        }
        self.avg_hands = f64::from(self.hands) / f64::from(self.games);
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = SimOverrides {
        games: pargs.opt_value_from_str("--games")?,
        mode: pargs.opt_value_from_str("--mode")?,
        format: pargs.opt_value_from_str("--format")?,
        seed: pargs.opt_value_from_str("--seed")?,
        via_table: pargs.contains("--via-table"),
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = SimConfig::from_env(overrides)?;
    info!(
        "Simulating {} {} games ({}), seed {:?}",
        config.games, config.mode, config.format, config.seed
    );

    let policy = BotPolicy::default();
    let manager = TableManager::new(Arc::new(LogRecorder), Arc::new(NoopSettlement));
    let mut summary = Summary::new(config.mode.entities());

    for index in 0..config.games {
        let outcome = if config.via_table {
            table_run::run_table_game(&manager, config.table_config(index), &policy).await
        } else {
            play_bot_game(config.game_settings(index), &policy, config.max_hands)
                .map(|report| report.result)
                .map_err(Error::from)
        };

        match outcome {
            Ok(result) => {
                logging::log_game_summary(
                    index,
                    result.hands_played,
                    &format!("{:?}", result.winner),
                    &result.final_scores,
                );
                summary.add(&result);
            }
            Err(e) => {
                log::error!("Game {} failed: {:#}", index + 1, e);
                summary.failed += 1;
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.failed > 0 {
        anyhow::bail!("{} of {} games failed", summary.failed, config.games);
    }
    Ok(())
}
