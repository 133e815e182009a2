/// Property-based tests for the game engine using proptest
///
/// These tests drive seeded bot games through every format and rule set and
/// check the invariants that must hold for any deal.
use proptest::prelude::*;
use spades_engine::{
    GameSettings, SpadesState,
    bot::{BotPolicy, apply_action, bot_player, play_bot_game},
    constants::{DECK_SIZE, PLAYERS, TRICKS_PER_HAND},
    entities::{
        Card, Deck, GameFormat, GameMode, GameStatus, Gimmick, SpecialRules, Trick, TrickPlay,
    },
    game::{
        GameStateManagement, SeatManagement,
        tricks::{PlayRule, check_play, legal_cards},
    },
};
use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashSet;

const FORMATS: [GameFormat; 8] = [
    GameFormat::Regular,
    GameFormat::Whiz,
    GameFormat::Mirror,
    GameFormat::Gimmick(Gimmick::Suicide),
    GameFormat::Gimmick(Gimmick::Bid4OrNil),
    GameFormat::Gimmick(Gimmick::Bid3),
    GameFormat::Gimmick(Gimmick::BidHearts),
    GameFormat::Gimmick(Gimmick::CrazyAces),
];

// Strategy for any valid rule combination
fn settings_strategy() -> impl Strategy<Value = GameSettings> {
    (
        any::<u64>(),
        0..FORMATS.len(),
        any::<bool>(),
        0u8..3,
        any::<bool>(),
    )
        .prop_map(|(seed, format_idx, solo, special, blind_nil)| {
            let format = FORMATS[format_idx];
            // Suicide is a partners-only format.
            let mode = if solo && format != GameFormat::Gimmick(Gimmick::Suicide) {
                GameMode::Solo
            } else {
                GameMode::Partners
            };
            GameSettings {
                mode,
                format,
                special_rules: SpecialRules {
                    screamer: special == 1,
                    assassin: special == 2,
                },
                allow_blind_nil: blind_nil,
                seed: Some(seed),
                ..Default::default()
            }
        })
}

fn rule_strategy() -> impl Strategy<Value = PlayRule> {
    prop_oneof![
        Just(PlayRule::Standard),
        Just(PlayRule::Screamer),
        Just(PlayRule::Assassin),
    ]
}

fn seated(settings: GameSettings) -> SpadesState {
    let mut state = SpadesState::new(settings);
    for seat in 0..PLAYERS {
        state.seat_player(bot_player(seat)).unwrap();
    }
    state.step()
}

/// Every card is either in a hand, in the current trick, or in a completed
/// trick, exactly once.
fn assert_cards_conserved(state: &SpadesState) {
    let SpadesState::Playing(game) = state else {
        return;
    };
    let mut seen = HashSet::new();
    let held = game.data.hands.iter().flatten().copied();
    let played = game
        .state
        .completed
        .iter()
        .flat_map(|trick| trick.plays.iter().map(|play| play.card));
    let current = game.state.trick.plays.iter().map(|play| play.card);
    for card in held.chain(played).chain(current) {
        assert!(seen.insert(card), "{card} seen twice");
    }
    assert_eq!(seen.len(), DECK_SIZE);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_hand_invariants_hold(settings in settings_strategy()) {
        let mut state = seated(settings);
        let policy = BotPolicy::default();

        while let Some(turn) = state.pending_turn() {
            let was_bidding = state.status() == GameStatus::Bidding;
            let action = policy.decide(&state, turn.seat).unwrap();
            apply_action(&mut state, turn.seat, action).unwrap();

            match &state {
                // Bidding only ends once all four bids are in.
                SpadesState::Bidding(game) => prop_assert!(!game.state.is_complete()),
                SpadesState::Playing(game) if was_bidding => {
                    prop_assert_eq!(game.state.cards_played(), 0);
                }
                _ => {}
            }
            assert_cards_conserved(&state);
        }

        let SpadesState::HandCompleted(game) = &state else {
            panic!("hand ended in {}", state.status());
        };
        let tricks: u8 = game.state.summary.score.tricks.iter().sum();
        prop_assert_eq!(usize::from(tricks), TRICKS_PER_HAND);
        prop_assert!(game.state.summary.score.anomaly.is_none());
        prop_assert!(game.data.hands.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_bot_games_always_finish(settings in settings_strategy()) {
        let mode = settings.mode;
        let report = play_bot_game(settings, &BotPolicy::default(), 400).unwrap();
        prop_assert_eq!(report.result.final_scores.len(), mode.entities());
        prop_assert_eq!(report.hands.len() as u32, report.result.hands_played);
        let last = report.hands.last().unwrap();
        prop_assert_eq!(&last.totals, &report.result.final_scores);
    }

    #[test]
    fn test_legal_cards_are_nonempty_subset_of_hand(
        seed in any::<u64>(),
        hand_size in 1usize..=13,
        trick_size in 0usize..4,
        spades_broken in any::<bool>(),
        rule in rule_strategy(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut deck = Deck::default();
        deck.shuffle(&mut rng);
        let hand: Vec<Card> = (0..hand_size).filter_map(|_| deck.deal_card()).collect();
        let trick = Trick {
            plays: (0..trick_size)
                .filter_map(|seat| deck.deal_card().map(|card| TrickPlay { seat: seat + 1, card }))
                .collect(),
        };

        let legal = legal_cards(&hand, &trick, spades_broken, rule);
        prop_assert!(!legal.is_empty());
        for card in &hand {
            let allowed = check_play(&hand, &trick, spades_broken, rule, *card).is_ok();
            prop_assert_eq!(allowed, legal.contains(card), "{} disagrees", card);
        }
        prop_assert!(legal.iter().all(|card| hand.contains(card)));
    }
}
