use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use super::constants::{CARDS_PER_HAND, DECK_SIZE, PLAYERS};

/// Index of a seat at the table, `0..4`. Seats 0/2 and 1/3 are partners.
pub type SeatIndex = usize;

/// Authenticated user id handed to us by the transport layer. Bots are
/// assigned negative ids so they never collide with real users.
pub type UserId = i64;

pub type TableId = i64;

/// Identity of one game instance. A table gets a fresh game id for every
/// rematch.
pub type GameId = uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Face cards and aces, used by the bidding heuristic.
    #[must_use]
    pub fn is_honor(self) -> bool {
        self >= Rank::Jack
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Ten => "10",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Ace => "A",
        };
        write!(f, "{repr}")
    }
}

/// A card is a rank and a suit. Ordering is by rank first so that the
/// minimum of any set of cards is its lowest card, with spades sorting last
/// among equal ranks.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Rank, pub Suit);

impl Card {
    #[must_use]
    pub fn rank(self) -> Rank {
        self.0
    }

    #[must_use]
    pub fn suit(self) -> Suit {
        self.1
    }

    #[must_use]
    pub fn is_spade(self) -> bool {
        self.1 == Suit::Spade
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

/// Count the cards of `suit` in `hand`.
#[must_use]
pub fn count_suit(hand: &[Card], suit: Suit) -> usize {
    hand.iter().filter(|card| card.suit() == suit).count()
}

#[must_use]
pub fn has_suit(hand: &[Card], suit: Suit) -> bool {
    hand.iter().any(|card| card.suit() == suit)
}

#[derive(Debug)]
pub struct Deck {
    cards: [Card; DECK_SIZE],
    pub deck_idx: usize,
}

impl Deck {
    /// Next card off the top, or `None` once all 52 have been dealt.
    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied()?;
        self.deck_idx += 1;
        Some(card)
    }

    /// Uniform Fisher-Yates permutation of the full deck.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        DECK_SIZE - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = [Card(Rank::Two, Suit::Club); DECK_SIZE];
        for (i, suit) in Suit::ALL.into_iter().enumerate() {
            for (j, rank) in Rank::ALL.into_iter().enumerate() {
                cards[i * Rank::ALL.len() + j] = Card(rank, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Seat `steps` places clockwise of `seat`.
#[inline]
#[must_use]
pub fn seat_offset(seat: SeatIndex, steps: usize) -> SeatIndex {
    (seat + steps) % PLAYERS
}

/// Seat to the left of `seat`, i.e. the next to act.
#[inline]
#[must_use]
pub fn next_seat(seat: SeatIndex) -> SeatIndex {
    seat_offset(seat, 1)
}

#[inline]
#[must_use]
pub fn partner_of(seat: SeatIndex) -> SeatIndex {
    seat_offset(seat, 2)
}

/// Partnership index derived from seat parity.
#[inline]
#[must_use]
pub fn team_of(seat: SeatIndex) -> usize {
    seat % 2
}

/// Shuffle a fresh deck and deal it one card at a time, starting with the
/// seat left of the dealer, until every seat holds 13 cards. Hands come back
/// sorted.
pub fn deal_hands<R: Rng + ?Sized>(dealer: SeatIndex, rng: &mut R) -> [Vec<Card>; PLAYERS] {
    let mut deck = Deck::default();
    deck.shuffle(rng);
    deal_from(&mut deck, dealer)
}

/// Deal an already shuffled deck relative to `dealer`.
pub fn deal_from(deck: &mut Deck, dealer: SeatIndex) -> [Vec<Card>; PLAYERS] {
    let mut hands: [Vec<Card>; PLAYERS] = Default::default();
    for hand in &mut hands {
        hand.reserve(CARDS_PER_HAND);
    }
    let mut seat = next_seat(dealer);
    while let Some(card) = deck.deal_card() {
        hands[seat].push(card);
        seat = next_seat(seat);
    }
    for hand in &mut hands {
        hand.sort_by_key(|card| (card.suit(), card.rank()));
    }
    hands
}

/// A bid. Nil is a promise to take no tricks; blind nil is the same promise
/// made before looking at the hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Bid {
    Tricks(u8),
    Nil,
    BlindNil,
}

impl Bid {
    /// Decode the integer form used by clients: `0` is nil, `-1` blind nil.
    #[must_use]
    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Self::BlindNil),
            0 => Some(Self::Nil),
            n if n > 0 => Some(Self::Tricks(n as u8)),
            _ => None,
        }
    }

    #[must_use]
    pub fn value(self) -> i8 {
        match self {
            Self::Tricks(n) => n as i8,
            Self::Nil => 0,
            Self::BlindNil => -1,
        }
    }

    /// `Tricks(0)` means nil.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Tricks(0) => Self::Nil,
            other => other,
        }
    }

    #[must_use]
    pub fn is_nil(self) -> bool {
        matches!(self.normalized(), Self::Nil | Self::BlindNil)
    }

    /// Tricks this bid contributes to a contract. Nil bids contribute none.
    #[must_use]
    pub fn contract(self) -> u8 {
        match self {
            Self::Tricks(n) => n,
            Self::Nil | Self::BlindNil => 0,
        }
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.normalized() {
            Self::Tricks(n) => write!(f, "{n}"),
            Self::Nil => write!(f, "nil"),
            Self::BlindNil => write!(f, "blind nil"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Partners,
    Solo,
}

impl GameMode {
    /// Number of scoring entities: two teams or four individuals.
    #[must_use]
    pub fn entities(self) -> usize {
        match self {
            Self::Partners => 2,
            Self::Solo => PLAYERS,
        }
    }

    /// Scoring entity a seat belongs to.
    #[must_use]
    pub fn entity_of(self, seat: SeatIndex) -> usize {
        match self {
            Self::Partners => team_of(seat),
            Self::Solo => seat,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Partners => write!(f, "partners"),
            Self::Solo => write!(f, "solo"),
        }
    }
}

/// Gimmick bidding variants.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gimmick {
    /// One partner on each team must bid nil.
    Suicide,
    /// Bid exactly four or nil.
    Bid4OrNil,
    /// Bid exactly three.
    Bid3,
    /// Bid the number of hearts held.
    BidHearts,
    /// Bid three per ace held.
    CrazyAces,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameFormat {
    Regular,
    Whiz,
    Mirror,
    Gimmick(Gimmick),
}

impl fmt::Display for GameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Whiz => write!(f, "whiz"),
            Self::Mirror => write!(f, "mirror"),
            Self::Gimmick(g) => write!(f, "gimmick ({g:?})"),
        }
    }
}

/// A mode or format name that isn't recognised.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for GameMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "partners" => Ok(Self::Partners),
            "solo" => Ok(Self::Solo),
            _ => Err(UnknownVariant {
                kind: "mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Accepts both the plain names and the upper-case names used by clients,
/// e.g. `"bid4_or_nil"` or `"BID4ORNIL"`.
impl FromStr for GameFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let format = match name.as_str() {
            "regular" => Self::Regular,
            "whiz" => Self::Whiz,
            "mirror" => Self::Mirror,
            "suicide" => Self::Gimmick(Gimmick::Suicide),
            "bid4ornil" => Self::Gimmick(Gimmick::Bid4OrNil),
            "bid3" => Self::Gimmick(Gimmick::Bid3),
            "bidhearts" => Self::Gimmick(Gimmick::BidHearts),
            "crazyaces" => Self::Gimmick(Gimmick::CrazyAces),
            _ => {
                return Err(UnknownVariant {
                    kind: "format",
                    value: s.to_string(),
                });
            }
        };
        Ok(format)
    }
}

/// Optional play-legality variants. At most one may be enabled.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SpecialRules {
    pub screamer: bool,
    pub assassin: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Human,
    Bot,
}

/// An occupant of a seat.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Player {
    pub id: UserId,
    pub name: String,
    pub kind: PlayerKind,
    pub seat: SeatIndex,
}

impl Player {
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.kind == PlayerKind::Bot
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Waiting,
    Bidding,
    Playing,
    HandCompleted,
    Finished,
}

impl GameStatus {
    /// Whether cards are out and the seat layout is locked.
    #[must_use]
    pub fn in_progress(self) -> bool {
        matches!(self, Self::Bidding | Self::Playing | Self::HandCompleted)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Bidding => "bidding",
            Self::Playing => "playing",
            Self::HandCompleted => "hand completed",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// The kind of decision a seat owes the table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Bid,
    Play,
}

/// One card placed into a trick.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TrickPlay {
    pub seat: SeatIndex,
    pub card: Card,
}

/// The trick currently being played, in play order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Trick {
    pub plays: Vec<TrickPlay>,
}

impl Trick {
    #[must_use]
    pub fn lead_suit(&self) -> Option<Suit> {
        self.plays.first().map(|play| play.card.suit())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.plays.len() == PLAYERS
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.plays.iter().map(|play| play.card)
    }
}

/// A resolved trick. Produced exactly once from a complete [`Trick`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CompletedTrick {
    /// 1-based trick number within the hand.
    pub number: usize,
    pub plays: Vec<TrickPlay>,
    pub winner: SeatIndex,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn parses_modes_and_formats() {
        assert_eq!("Solo".parse::<GameMode>(), Ok(GameMode::Solo));
        assert_eq!(
            "BID4ORNIL".parse::<GameFormat>(),
            Ok(GameFormat::Gimmick(Gimmick::Bid4OrNil))
        );
        assert_eq!(
            "crazy_aces".parse::<GameFormat>(),
            Ok(GameFormat::Gimmick(Gimmick::CrazyAces))
        );
        let err = "hearts".parse::<GameFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown format 'hearts'");
    }

    #[test]
    fn deck_has_52_unique_cards() {
        let mut deck = Deck::default();
        let mut seen = HashSet::new();
        while let Some(card) = deck.deal_card() {
            assert!(seen.insert(card), "duplicate {card}");
        }
        assert_eq!(seen.len(), DECK_SIZE);
        assert_eq!(deck.remaining(), 0);
        assert!(deck.deal_card().is_none());
    }

    #[test]
    fn deal_gives_thirteen_each_without_duplicates() {
        let mut rng = StdRng::seed_from_u64(7);
        let hands = deal_hands(2, &mut rng);
        let mut seen = HashSet::new();
        for hand in &hands {
            assert_eq!(hand.len(), CARDS_PER_HAND);
            for card in hand {
                assert!(seen.insert(*card));
            }
        }
        assert_eq!(seen.len(), DECK_SIZE);
    }

    #[test]
    fn deal_starts_left_of_dealer() {
        let mut deck = Deck::default();
        let top = deck.cards[0];
        let second = deck.cards[1];
        let hands = deal_from(&mut deck, 3);
        assert!(hands[0].contains(&top));
        assert!(hands[1].contains(&second));
    }

    #[test]
    fn bid_integer_encoding() {
        assert_eq!(Bid::from_value(-1), Some(Bid::BlindNil));
        assert_eq!(Bid::from_value(0), Some(Bid::Nil));
        assert_eq!(Bid::from_value(4), Some(Bid::Tricks(4)));
        assert_eq!(Bid::from_value(-2), None);
        assert_eq!(Bid::Tricks(0).normalized(), Bid::Nil);
        assert!(Bid::Tricks(0).is_nil());
        assert_eq!(Bid::BlindNil.contract(), 0);
    }

    #[test]
    fn card_ordering_is_rank_first() {
        let low_spade = Card(Rank::Two, Suit::Spade);
        let high_club = Card(Rank::Ace, Suit::Club);
        assert!(low_spade < high_club);
        assert!(Card(Rank::Five, Suit::Heart) < Card(Rank::Five, Suit::Spade));
    }

    #[test]
    fn seat_math_wraps() {
        assert_eq!(next_seat(3), 0);
        assert_eq!(partner_of(1), 3);
        assert_eq!(team_of(2), 0);
        assert_eq!(GameMode::Solo.entity_of(3), 3);
        assert_eq!(GameMode::Partners.entity_of(3), 1);
    }
}
