//! Spades game state machine.
//!
//! The game is a typestate FSM: `Game<T>` pairs the data shared by every
//! phase with phase-specific state `T`, and [`SpadesState`] is the closed set
//! of phases. All mutation of a game goes through the methods on
//! [`SpadesState`], one event at a time.

use enum_dispatch::enum_dispatch;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashSet, VecDeque},
    fmt,
};

use super::{
    constants::{DECK_SIZE, DEFAULT_MAX_POINTS, DEFAULT_MIN_POINTS, PLAYERS, TRICKS_PER_HAND},
    entities::{
        ActionKind, Bid, Card, CompletedTrick, GameFormat, GameId, GameMode, GameStatus, Player,
        SeatIndex, SpecialRules, TrickPlay, UserId, deal_hands, next_seat,
    },
    errors::GameError,
    rules::{BidRequirement, HandRules},
    scoring::{GameOutcome, GameResult, ScoreBoard, check_game_over, score_hand},
    states::{Bidding, Finished, HandCompleted, HandContext, HandSummary, Phase, Playing, Waiting},
    tricks::{check_play, complete_trick, legal_cards},
};

/// Rules a game is played under. Fixed for the lifetime of a game.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub mode: GameMode,
    pub format: GameFormat,
    pub special_rules: SpecialRules,
    pub max_points: i32,
    pub min_points: i32,
    pub allow_nil: bool,
    pub allow_blind_nil: bool,
    /// Seed for deterministic shuffles and dealer selection.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::Partners,
            format: GameFormat::Regular,
            special_rules: SpecialRules::default(),
            max_points: DEFAULT_MAX_POINTS,
            min_points: DEFAULT_MIN_POINTS,
            allow_nil: true,
            allow_blind_nil: false,
            seed: None,
        }
    }
}

impl GameSettings {
    #[must_use]
    pub fn hand_rules(&self) -> HandRules {
        HandRules::resolve(
            self.mode,
            self.format,
            self.allow_nil,
            self.allow_blind_nil,
            self.special_rules,
        )
    }
}

/// Things that happened inside the game, drained by the table after every
/// event and turned into notifications and persistence calls.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum GameEvent {
    GameStarted {
        game_id: GameId,
        dealer: SeatIndex,
    },
    HandDealt {
        hand_no: u32,
        dealer: SeatIndex,
        hands: [Vec<Card>; PLAYERS],
    },
    BidPlaced {
        hand_no: u32,
        seat: SeatIndex,
        bid: Bid,
    },
    BiddingComplete {
        hand_no: u32,
        bids: [Bid; PLAYERS],
    },
    CardPlayed {
        hand_no: u32,
        seat: SeatIndex,
        card: Card,
    },
    TrickResolved {
        hand_no: u32,
        trick: CompletedTrick,
    },
    HandScored(HandSummary),
    TiedAtThreshold {
        hand_no: u32,
    },
    FailsafeApplied {
        hand_no: u32,
        tricks_played: usize,
    },
    GameOver(GameResult),
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameStarted { game_id, dealer } => {
                write!(f, "game {game_id} started, seat {dealer} deals")
            }
            Self::HandDealt { hand_no, dealer, .. } => {
                write!(f, "hand {hand_no} dealt by seat {dealer}")
            }
            Self::BidPlaced { seat, bid, .. } => write!(f, "seat {seat} bid {bid}"),
            Self::BiddingComplete { hand_no, .. } => write!(f, "bidding closed for hand {hand_no}"),
            Self::CardPlayed { seat, card, .. } => write!(f, "seat {seat} played {card}"),
            Self::TrickResolved { trick, .. } => {
                write!(f, "trick {} won by seat {}", trick.number, trick.winner)
            }
            Self::HandScored(summary) => {
                write!(f, "hand {} scored, totals {:?}", summary.number, summary.totals)
            }
            Self::TiedAtThreshold { hand_no } => {
                write!(f, "tied at threshold after hand {hand_no}, playing on")
            }
            Self::FailsafeApplied {
                hand_no,
                tricks_played,
            } => write!(
                f,
                "hand {hand_no} force-completed after {tricks_played} tricks"
            ),
            Self::GameOver(result) => write!(f, "game over, {:?} wins", result.winner),
        }
    }
}

/// Data shared across all phases.
#[derive(Debug)]
pub struct GameData {
    pub id: GameId,
    pub settings: GameSettings,
    pub players: [Option<Player>; PLAYERS],
    /// Each seat's remaining cards. Hands stay with the seat while it is
    /// vacated so a replacement can pick them up.
    pub hands: [Vec<Card>; PLAYERS],
    /// Dealer of the current (or last) hand.
    pub dealer: Option<SeatIndex>,
    pub hand_no: u32,
    pub scores: ScoreBoard,
    pub history: Vec<HandSummary>,
    /// Whether each seat has looked at its hand since the deal.
    pub(crate) hand_seen: [bool; PLAYERS],
    rng: StdRng,
    pub(super) events: VecDeque<GameEvent>,
}

impl Default for GameData {
    fn default() -> Self {
        GameSettings::default().into()
    }
}

impl From<GameSettings> for GameData {
    fn from(value: GameSettings) -> Self {
        let rng = match value.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            id: GameId::new_v4(),
            scores: ScoreBoard::new(value.mode),
            settings: value,
            players: Default::default(),
            hands: Default::default(),
            dealer: None,
            hand_no: 0,
            history: Vec::new(),
            hand_seen: [false; PLAYERS],
            rng,
            events: VecDeque::new(),
        }
    }
}

impl GameData {
    #[must_use]
    pub fn player(&self, seat: SeatIndex) -> Option<&Player> {
        self.players.get(seat).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn all_seated(&self) -> bool {
        self.players.iter().all(Option::is_some)
    }

    #[must_use]
    pub fn human_count(&self) -> usize {
        self.players
            .iter()
            .flatten()
            .filter(|player| !player.is_bot())
            .count()
    }

    #[must_use]
    pub fn open_seats(&self) -> Vec<SeatIndex> {
        (0..PLAYERS).filter(|seat| self.players[*seat].is_none()).collect()
    }

    /// Shuffle and deal a new hand for `dealer`, who must be seated.
    fn deal(&mut self, dealer: SeatIndex) -> Result<HandContext, GameError> {
        if self.player(dealer).is_none() {
            return Err(GameError::NoDealer);
        }
        self.hand_no += 1;
        self.dealer = Some(dealer);
        self.hands = deal_hands(dealer, &mut self.rng);
        self.hand_seen = [false; PLAYERS];
        self.events.push_back(GameEvent::HandDealt {
            hand_no: self.hand_no,
            dealer,
            hands: self.hands.clone(),
        });
        Ok(HandContext {
            number: self.hand_no,
            dealer,
            rules: self.settings.hand_rules(),
        })
    }

    fn start_new_game(&mut self) {
        self.id = GameId::new_v4();
        self.scores = ScoreBoard::new(self.settings.mode);
        self.history.clear();
        self.hands = Default::default();
        self.hand_seen = [false; PLAYERS];
        self.dealer = None;
        self.hand_no = 0;
    }
}

/// Public view of one seat.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SeatView {
    pub player: Option<Player>,
    pub bid: Option<Bid>,
    pub tricks: u8,
    pub cards: usize,
}

/// Everything any observer of the table may see.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameView {
    pub game_id: GameId,
    pub status: GameStatus,
    pub mode: GameMode,
    pub format: GameFormat,
    pub special_rules: SpecialRules,
    pub hand_no: u32,
    pub dealer: Option<SeatIndex>,
    pub actor: Option<SeatIndex>,
    pub seats: Vec<SeatView>,
    pub trick: Vec<TrickPlay>,
    pub last_trick: Option<CompletedTrick>,
    pub spades_broken: bool,
    pub scores: Vec<i32>,
    pub bags: Vec<i32>,
    pub max_points: i32,
    pub min_points: i32,
}

/// A seat's private view: the public view plus its own cards once seen.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerView {
    pub seat: SeatIndex,
    pub game: GameView,
    pub hand: Option<Vec<Card>>,
    pub legal_cards: Vec<Card>,
    pub bid_requirement: Option<BidRequirement>,
}

/// Identifies one specific decision in a game, so late answers to an old
/// turn can be recognised.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TurnKey {
    pub game_id: GameId,
    pub hand_no: u32,
    pub kind: ActionKind,
    /// Bids placed or cards played in the hand before this turn.
    pub step: usize,
}

/// The seat the game is waiting on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PendingTurn {
    pub seat: SeatIndex,
    pub kind: ActionKind,
    pub key: TurnKey,
}

#[enum_dispatch]
pub trait GameStateManagement {
    fn status(&self) -> GameStatus;

    fn data(&self) -> &GameData;

    fn drain_events(&mut self) -> VecDeque<GameEvent>;

    /// Public view of the game.
    #[must_use]
    fn view(&self) -> GameView;
}

/// Seat changes. Allowed in every phase; mid-game only vacated seats can be
/// taken.
#[enum_dispatch]
pub trait SeatManagement {
    fn seat_player(&mut self, player: Player) -> Result<SeatIndex, GameError>;

    /// Remove the occupant of `seat`. The seat's hand and bid stay.
    fn vacate_seat(&mut self, seat: SeatIndex) -> Result<Player, GameError>;

    fn seat_of(&self, user_id: UserId) -> Option<SeatIndex>;
}

/// A spades game with data and logic for running it end-to-end.
#[derive(Debug)]
pub struct Game<T> {
    pub data: GameData,
    pub state: T,
}

impl<T: Phase> GameStateManagement for Game<T> {
    fn status(&self) -> GameStatus {
        self.state.status()
    }

    fn data(&self) -> &GameData {
        &self.data
    }

    fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.data.events)
    }

    fn view(&self) -> GameView {
        let bids = self.state.bids();
        let tricks = self.state.tricks_won();
        let seats = (0..PLAYERS)
            .map(|seat| SeatView {
                player: self.data.players[seat].clone(),
                bid: bids[seat],
                tricks: tricks[seat],
                cards: self.data.hands[seat].len(),
            })
            .collect();
        GameView {
            game_id: self.data.id,
            status: self.state.status(),
            mode: self.data.settings.mode,
            format: self.data.settings.format,
            special_rules: self.data.settings.special_rules,
            hand_no: self.data.hand_no,
            dealer: self.data.dealer,
            actor: self.state.actor(),
            seats,
            trick: self
                .state
                .trick()
                .map(|trick| trick.plays.clone())
                .unwrap_or_default(),
            last_trick: self.state.last_trick().cloned(),
            spades_broken: self.state.spades_broken(),
            scores: self.data.scores.scores.clone(),
            bags: self.data.scores.bags.clone(),
            max_points: self.data.settings.max_points,
            min_points: self.data.settings.min_points,
        }
    }
}

impl<T> SeatManagement for Game<T> {
    fn seat_player(&mut self, mut player: Player) -> Result<SeatIndex, GameError> {
        let seat = player.seat;
        if seat >= PLAYERS {
            return Err(GameError::InvalidSeat(seat));
        }
        if self.seat_of(player.id).is_some() {
            return Err(GameError::AlreadySeated);
        }
        if self.data.players[seat].is_some() {
            return Err(GameError::SeatTaken);
        }
        player.seat = seat;
        self.data.players[seat] = Some(player);
        Ok(seat)
    }

    fn vacate_seat(&mut self, seat: SeatIndex) -> Result<Player, GameError> {
        let slot = self
            .data
            .players
            .get_mut(seat)
            .ok_or(GameError::InvalidSeat(seat))?;
        slot.take().ok_or(GameError::SeatEmpty)
    }

    fn seat_of(&self, user_id: UserId) -> Option<SeatIndex> {
        self.data
            .players
            .iter()
            .position(|player| player.as_ref().is_some_and(|p| p.id == user_id))
    }
}

impl Game<Waiting> {
    /// Pick a random first dealer and deal the first hand.
    fn start(mut self) -> SpadesState {
        let dealer = self.data.rng.random_range(0..PLAYERS);
        self.data.events.push_back(GameEvent::GameStarted {
            game_id: self.data.id,
            dealer,
        });
        match self.data.deal(dealer) {
            Ok(hand) => Game {
                data: self.data,
                state: Bidding {
                    hand,
                    bids: [None; PLAYERS],
                    current: next_seat(dealer),
                },
            }
            .into(),
            Err(err) => {
                log::error!("Game {}: failed to deal first hand: {err}", self.data.id);
                self.into()
            }
        }
    }
}

impl Game<Bidding> {
    /// Record a bid for `seat`. Returns whether all four bids are in.
    fn place_bid(&mut self, seat: SeatIndex, bid: Bid) -> Result<bool, GameError> {
        if seat != self.state.current {
            return Err(GameError::OutOfTurn);
        }
        let hand = &self.data.hands[seat];
        let rules = self.state.hand.rules.bids;
        if bid == Bid::BlindNil
            && rules
                .requirement(seat, hand, &self.state.bids)
                .accepts_blind_nil()
            && self.data.hand_seen[seat]
        {
            return Err(GameError::HandAlreadySeen);
        }
        let bid = rules.validate(seat, hand, &self.state.bids, bid)?;

        self.state.bids[seat] = Some(bid);
        self.data.events.push_back(GameEvent::BidPlaced {
            hand_no: self.state.hand.number,
            seat,
            bid,
        });

        let mut next = next_seat(seat);
        while next != seat && self.state.bids[next].is_some() {
            next = next_seat(next);
        }
        self.state.current = next;
        Ok(self.state.is_complete())
    }

    fn requirement(&self, seat: SeatIndex) -> BidRequirement {
        self.state
            .hand
            .rules
            .bids
            .requirement(seat, &self.data.hands[seat], &self.state.bids)
    }
}

impl From<Game<Bidding>> for Game<Playing> {
    fn from(value: Game<Bidding>) -> Self {
        let Game { mut data, state } = value;
        let bids = state.bids.map(|bid| bid.unwrap_or(Bid::Nil));
        data.events.push_back(GameEvent::BiddingComplete {
            hand_no: state.hand.number,
            bids,
        });
        Self {
            data,
            state: Playing {
                actor: next_seat(state.hand.dealer),
                hand: state.hand,
                bids,
                trick: Default::default(),
                completed: Vec::with_capacity(TRICKS_PER_HAND),
                tricks_won: [0; PLAYERS],
                spades_broken: false,
            },
        }
    }
}

impl Game<Playing> {
    /// Play `card` from `seat`. Returns whether the hand is over.
    fn play_card(&mut self, seat: SeatIndex, card: Card) -> Result<bool, GameError> {
        if seat != self.state.actor {
            return Err(GameError::OutOfTurn);
        }
        let hand = &self.data.hands[seat];
        let pos = hand
            .iter()
            .position(|c| *c == card)
            .ok_or(GameError::CardNotInHand)?;
        check_play(
            hand,
            &self.state.trick,
            self.state.spades_broken,
            self.state.hand.rules.play,
            card,
        )?;
        // Playing moves cards without copying them, so checking before the
        // last card of a trick leaves state untouched when it fails.
        if self.state.trick.plays.len() + 1 == PLAYERS {
            self.verify_cards()?;
        }

        self.data.hands[seat].remove(pos);
        self.state.trick.plays.push(TrickPlay { seat, card });
        if card.is_spade() {
            self.state.spades_broken = true;
        }
        let hand_no = self.state.hand.number;
        self.data
            .events
            .push_back(GameEvent::CardPlayed { hand_no, seat, card });

        if self.state.trick.is_complete() {
            let trick = std::mem::take(&mut self.state.trick);
            let completed = complete_trick(trick, self.state.completed.len() + 1)?;
            self.state.tricks_won[completed.winner] += 1;
            self.state.actor = completed.winner;
            self.data.events.push_back(GameEvent::TrickResolved {
                hand_no,
                trick: completed.clone(),
            });
            self.state.completed.push(completed);
        } else {
            self.state.actor = next_seat(seat);
        }

        if self.state.completed.len() == TRICKS_PER_HAND {
            return Ok(true);
        }
        // Nobody can continue: complete the hand with what we have.
        Ok(self.data.hands[self.state.actor].is_empty())
    }

    /// No card may be held or played twice across hands, resolved tricks
    /// and the trick in progress. Missing cards are only logged; the hand
    /// is completed with what is left once a seat runs out.
    fn verify_cards(&self) -> Result<(), GameError> {
        let mut seen = HashSet::with_capacity(DECK_SIZE);
        let cards = self
            .data
            .hands
            .iter()
            .flatten()
            .copied()
            .chain(self.state.completed.iter().flat_map(|t| t.plays.iter().map(|p| p.card)))
            .chain(self.state.trick.cards());
        for card in cards {
            if !seen.insert(card) {
                return Err(GameError::Corrupted(format!("card {card} appears twice")));
            }
        }
        if seen.len() != DECK_SIZE {
            log::warn!(
                "Game {}: hand {} has {} of {DECK_SIZE} cards accounted for",
                self.data.id,
                self.state.hand.number,
                seen.len()
            );
        }
        Ok(())
    }
}

impl From<Game<Playing>> for Game<HandCompleted> {
    fn from(value: Game<Playing>) -> Self {
        let Game { mut data, state } = value;
        let hand_no = state.hand.number;
        if state.completed.len() != TRICKS_PER_HAND {
            log::warn!(
                "Game {}: hand {hand_no} ended after {} tricks, forcing completion",
                data.id,
                state.completed.len()
            );
            data.events.push_back(GameEvent::FailsafeApplied {
                hand_no,
                tricks_played: state.completed.len(),
            });
        }

        let score = score_hand(data.settings.mode, &state.bids, &state.tricks_won);
        let penalties = data.scores.apply(&score);
        let outcome = check_game_over(
            &data.scores,
            data.settings.max_points,
            data.settings.min_points,
        );
        let summary = HandSummary {
            number: hand_no,
            dealer: state.hand.dealer,
            score,
            totals: data.scores.scores.clone(),
            bags: data.scores.bags.clone(),
            penalties,
        };
        data.history.push(summary.clone());
        data.events.push_back(GameEvent::HandScored(summary.clone()));
        if outcome == GameOutcome::TiedAtThreshold {
            log::info!("Game {}: tied at threshold after hand {hand_no}", data.id);
            data.events.push_back(GameEvent::TiedAtThreshold { hand_no });
        }

        Self {
            data,
            state: HandCompleted {
                hand: state.hand,
                last_trick: state.completed.last().cloned(),
                summary,
                outcome,
            },
        }
    }
}

impl Game<HandCompleted> {
    /// Finish the game or deal the next hand with the deal rotated left.
    /// Stays put while a seat is empty.
    fn next(mut self) -> SpadesState {
        if let GameOutcome::Won(winner) = self.state.outcome {
            let result = GameResult {
                game_id: self.data.id,
                mode: self.data.settings.mode,
                winner,
                final_scores: self.data.scores.scores.clone(),
                final_bags: self.data.scores.bags.clone(),
                hands_played: self.data.hand_no,
                finished_at: chrono::Utc::now(),
            };
            self.data.events.push_back(GameEvent::GameOver(result.clone()));
            return Game {
                data: self.data,
                state: Finished { result },
            }
            .into();
        }
        if !self.data.all_seated() {
            return self.into();
        }
        let dealer = next_seat(self.state.hand.dealer);
        match self.data.deal(dealer) {
            Ok(hand) => Game {
                data: self.data,
                state: Bidding {
                    hand,
                    bids: [None; PLAYERS],
                    current: next_seat(dealer),
                },
            }
            .into(),
            Err(err) => {
                log::error!("Game {}: failed to deal: {err}", self.data.id);
                self.into()
            }
        }
    }
}

/// The closed set of game phases.
#[derive(Debug)]
#[enum_dispatch(GameStateManagement, SeatManagement)]
pub enum SpadesState {
    Waiting(Game<Waiting>),
    Bidding(Game<Bidding>),
    Playing(Game<Playing>),
    HandCompleted(Game<HandCompleted>),
    Finished(Game<Finished>),
}

impl Default for SpadesState {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl SpadesState {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Game {
            data: settings.into(),
            state: Waiting {},
        }
        .into()
    }

    /// Advance through phases that need no player input: start once all
    /// four seats are filled, and move on from a scored hand.
    #[must_use]
    pub fn step(self) -> Self {
        match self {
            Self::Waiting(game) if game.data.all_seated() => game.start(),
            Self::HandCompleted(game) => game.next(),
            other => other,
        }
    }

    pub fn place_bid(&mut self, seat: SeatIndex, bid: Bid) -> Result<(), GameError> {
        let complete = match self {
            Self::Bidding(game) => game.place_bid(seat, bid)?,
            other => return Err(GameError::PhaseMismatch(other.status().to_string())),
        };
        if complete {
            *self = match std::mem::take(self) {
                Self::Bidding(game) => Self::Playing(game.into()),
                other => other,
            };
        }
        Ok(())
    }

    pub fn play_card(&mut self, seat: SeatIndex, card: Card) -> Result<(), GameError> {
        let hand_over = match self {
            Self::Playing(game) => game.play_card(seat, card)?,
            other => return Err(GameError::PhaseMismatch(other.status().to_string())),
        };
        if hand_over {
            *self = match std::mem::take(self) {
                Self::Playing(game) => Self::HandCompleted(game.into()),
                other => other,
            };
        }
        Ok(())
    }

    /// Who the game is waiting on, if anyone.
    #[must_use]
    pub fn pending_turn(&self) -> Option<PendingTurn> {
        let (data, seat, kind, step) = match self {
            Self::Bidding(game) => (
                &game.data,
                game.state.current,
                ActionKind::Bid,
                game.state.placed(),
            ),
            Self::Playing(game) => (
                &game.data,
                game.state.actor,
                ActionKind::Play,
                game.state.cards_played(),
            ),
            _ => return None,
        };
        Some(PendingTurn {
            seat,
            kind,
            key: TurnKey {
                game_id: data.id,
                hand_no: data.hand_no,
                kind,
                step,
            },
        })
    }

    #[must_use]
    pub fn hand(&self, seat: SeatIndex) -> &[Card] {
        self.data()
            .hands
            .get(seat)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Cards `seat` may play right now. Empty unless it is that seat's turn
    /// to play.
    #[must_use]
    pub fn legal_cards(&self, seat: SeatIndex) -> Vec<Card> {
        match self {
            Self::Playing(game) if game.state.actor == seat => legal_cards(
                &game.data.hands[seat],
                &game.state.trick,
                game.state.spades_broken,
                game.state.hand.rules.play,
            ),
            _ => Vec::new(),
        }
    }

    /// What `seat` may bid, while it is that seat's turn to bid.
    #[must_use]
    pub fn bid_requirement(&self, seat: SeatIndex) -> Option<BidRequirement> {
        match self {
            Self::Bidding(game) if game.state.current == seat => Some(game.requirement(seat)),
            _ => None,
        }
    }

    /// Show `seat` its cards. After this the seat can no longer bid blind
    /// nil for the current hand.
    pub fn reveal_hand(&mut self, seat: SeatIndex) -> Result<Vec<Card>, GameError> {
        if seat >= PLAYERS {
            return Err(GameError::InvalidSeat(seat));
        }
        let data = match self {
            Self::Waiting(game) => &mut game.data,
            Self::Bidding(game) => &mut game.data,
            Self::Playing(game) => &mut game.data,
            Self::HandCompleted(game) => &mut game.data,
            Self::Finished(game) => &mut game.data,
        };
        if !data.hands[seat].is_empty() {
            data.hand_seen[seat] = true;
        }
        Ok(data.hands[seat].clone())
    }

    #[must_use]
    pub fn player_view(&self, seat: SeatIndex) -> PlayerView {
        let data = self.data();
        let hand = data
            .hand_seen
            .get(seat)
            .copied()
            .unwrap_or(false)
            .then(|| data.hands[seat].clone());
        PlayerView {
            seat,
            game: self.view(),
            hand,
            legal_cards: self.legal_cards(seat),
            bid_requirement: self.bid_requirement(seat),
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        match self {
            Self::Finished(game) => Some(&game.state.result),
            _ => None,
        }
    }

    /// Discard the current game and return to waiting with the same seats,
    /// a new game id and zeroed scores.
    #[must_use]
    pub fn reset(self) -> Self {
        let mut data = match self {
            Self::Waiting(game) => game.data,
            Self::Bidding(game) => game.data,
            Self::Playing(game) => game.data,
            Self::HandCompleted(game) => game.data,
            Self::Finished(game) => game.data,
        };
        data.start_new_game();
        Game {
            data,
            state: Waiting {},
        }
        .into()
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.status().in_progress()
    }
}
