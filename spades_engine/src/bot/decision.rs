//! Bot decision-making: bids and card choice.
//!
//! The same policy drives permanent bot seats and stands in for humans whose
//! turn timer ran out, so every decision it makes goes through the same
//! legality rules as a human's.

use serde::{Deserialize, Serialize};

use crate::game::{
    PlayerView, SpadesState,
    constants::{MAX_BID, PLAYERS},
    entities::{
        Bid, Card, GameMode, GameStatus, Rank, SeatIndex, Suit, Trick, count_suit, partner_of,
    },
    rules::BidRequirement,
    tricks::{PlayRule, legal_cards},
};

/// Something a bot wants to do on its turn.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BotAction {
    Bid(Bid),
    Play(Card),
}

/// Tuning for the bidding heuristic. Trick estimates are counted in half
/// tricks so the whole heuristic stays in integers.
///
/// # Examples
///
/// ```
/// use spades_engine::bot::decision::BotPolicyConfig;
///
/// let config = BotPolicyConfig::default();
/// assert_eq!(config.max_estimate, 6);
/// ```
#[derive(Clone, Debug)]
pub struct BotPolicyConfig {
    /// Outside kings only count in suits at most this long.
    ///
    /// **Effect**: 3 = a king with three or fewer cards is a likely winner
    pub king_max_length: usize,

    /// Outside queens earn half a trick in suits at least this long.
    pub queen_min_length: usize,

    /// Spade length at which a void or short side suit adds half a trick
    /// for cutting.
    pub cut_min_spades: usize,

    /// Side suits at most this long count as short for cutting.
    pub short_suit_length: usize,

    /// Lowest number bid a bot will make.
    pub min_estimate: u8,

    /// Highest number bid a bot will make.
    ///
    /// **Range**: 4-13 (typical: 6)
    /// **Lower** = more conservative, fewer sets
    pub max_estimate: u8,

    /// Most spades a hand may hold and still go nil.
    pub nil_max_spades: usize,

    /// Outside aces are safe for nil only in suits at least this long.
    pub nil_ace_min_length: usize,

    /// The last bidder stretches by one when the table total is under this.
    pub stretch_table_total: u8,
}

impl Default for BotPolicyConfig {
    fn default() -> Self {
        Self {
            king_max_length: 3,
            queen_min_length: 3,
            cut_min_spades: 4,
            short_suit_length: 2,
            min_estimate: 1,
            max_estimate: 6,
            nil_max_spades: 2,
            nil_ace_min_length: 5,
            stretch_table_total: 10,
        }
    }
}

/// What the bidding heuristic knows about the table.
#[derive(Clone, Copy, Debug)]
pub struct BidContext {
    pub seat: SeatIndex,
    pub mode: GameMode,
    pub bids: [Option<Bid>; PLAYERS],
}

impl BidContext {
    fn partner_bid_nil(&self) -> bool {
        self.mode == GameMode::Partners
            && self.bids[partner_of(self.seat)].is_some_and(Bid::is_nil)
    }

    fn is_last_bidder(&self) -> bool {
        self.bids.iter().filter(|bid| bid.is_some()).count() == PLAYERS - 1
    }

    fn table_total(&self) -> u8 {
        self.bids.iter().flatten().map(|bid| bid.contract()).sum()
    }
}

fn cards_of(hand: &[Card], suit: Suit) -> Vec<Rank> {
    hand.iter()
        .filter(|card| card.suit() == suit)
        .map(|card| card.rank())
        .collect()
}

/// Deterministic heuristic policy.
#[derive(Clone, Debug, Default)]
pub struct BotPolicy {
    config: BotPolicyConfig,
}

impl BotPolicy {
    #[must_use]
    pub fn new(config: BotPolicyConfig) -> Self {
        Self { config }
    }

    /// Estimated tricks, rounded down.
    #[must_use]
    pub fn estimate_tricks(&self, hand: &[Card]) -> u8 {
        let cfg = &self.config;
        let mut halves = 0usize;

        for suit in [Suit::Club, Suit::Diamond, Suit::Heart] {
            let ranks = cards_of(hand, suit);
            let len = ranks.len();
            if ranks.contains(&Rank::Ace) {
                halves += 2;
            }
            if ranks.contains(&Rank::King) && len <= cfg.king_max_length {
                halves += 2;
            }
            if ranks.contains(&Rank::Queen) && len >= cfg.queen_min_length {
                halves += 1;
            }
        }

        let spades = cards_of(hand, Suit::Spade);
        let spade_len = spades.len();
        if spades.contains(&Rank::Ace) {
            halves += 2;
        }
        if spades.contains(&Rank::King) {
            halves += 2;
        }
        if spades.contains(&Rank::Queen) {
            halves += match spade_len {
                0..=1 => 0,
                2 => 1,
                _ => 2,
            };
        }
        if spade_len >= 5 && spades.contains(&Rank::Ace) && spades.contains(&Rank::Jack) {
            halves += 2;
        }

        // A protected queen needs its spades; no cutting bonus then.
        let guards_queen = spade_len == 3 && spades.contains(&Rank::Queen);
        let has_short_suit = [Suit::Club, Suit::Diamond, Suit::Heart]
            .into_iter()
            .any(|suit| count_suit(hand, suit) <= cfg.short_suit_length);
        if !guards_queen && spade_len >= cfg.cut_min_spades && has_short_suit {
            halves += 1;
        }

        (halves / 2).min(usize::from(MAX_BID)) as u8
    }

    /// Whether the hand looks safe for a nil bid.
    #[must_use]
    pub fn nil_safe(&self, hand: &[Card]) -> bool {
        let spades = cards_of(hand, Suit::Spade);
        if spades.iter().any(|rank| *rank >= Rank::Jack) {
            return false;
        }
        if spades.len() > self.config.nil_max_spades {
            return false;
        }
        [Suit::Club, Suit::Diamond, Suit::Heart]
            .into_iter()
            .all(|suit| {
                let ranks = cards_of(hand, suit);
                !ranks.contains(&Rank::Ace) || ranks.len() >= self.config.nil_ace_min_length
            })
    }

    fn number_bid(&self, hand: &[Card], ctx: &BidContext, max: u8) -> u8 {
        let cfg = &self.config;
        let mut estimate = self
            .estimate_tricks(hand)
            .clamp(cfg.min_estimate, cfg.max_estimate);

        if ctx.is_last_bidder() && ctx.table_total() + estimate < cfg.stretch_table_total {
            let spades = cards_of(hand, Suit::Spade);
            let backbone = spades.len() >= 5 || spades.contains(&Rank::Ace);
            let short_ace = [Suit::Club, Suit::Diamond, Suit::Heart]
                .into_iter()
                .any(|suit| {
                    let ranks = cards_of(hand, suit);
                    ranks.len() <= 3 && ranks.contains(&Rank::Ace)
                });
            if estimate < 4 && (backbone || short_ace) {
                estimate += 1;
            }
        }
        estimate.min(max).max(1)
    }

    /// Pick a bid satisfying `requirement`. Bots never bid blind nil.
    #[must_use]
    pub fn choose_bid(&self, hand: &[Card], requirement: &BidRequirement, ctx: &BidContext) -> Bid {
        let wants_nil = self.nil_safe(hand) && !ctx.partner_bid_nil();
        match requirement {
            BidRequirement::Forced(bid) => *bid,
            BidRequirement::OneOf(allowed) => {
                if wants_nil && allowed.contains(&Bid::Nil) {
                    return Bid::Nil;
                }
                let target = i16::from(self.number_bid(hand, ctx, MAX_BID));
                allowed
                    .iter()
                    .copied()
                    .filter(|bid| matches!(bid, Bid::Tricks(_)))
                    .min_by_key(|bid| (i16::from(bid.contract()) - target).abs())
                    .or_else(|| allowed.iter().copied().find(|bid| *bid == Bid::Nil))
                    .or_else(|| allowed.first().copied())
                    .unwrap_or(Bid::Nil)
            }
            BidRequirement::Range { max, nil, .. } => {
                if *nil && wants_nil {
                    Bid::Nil
                } else {
                    Bid::Tricks(self.number_bid(hand, ctx, *max))
                }
            }
        }
    }

    /// Lowest legal card; when following suit, the lowest card of that suit.
    #[must_use]
    pub fn choose_card(
        &self,
        hand: &[Card],
        trick: &Trick,
        spades_broken: bool,
        rule: PlayRule,
    ) -> Option<Card> {
        let legal = legal_cards(hand, trick, spades_broken, rule);
        if let Some(lead) = trick.lead_suit() {
            if let Some(card) = legal.iter().filter(|c| c.suit() == lead).min() {
                return Some(*card);
            }
        }
        legal.into_iter().min()
    }

    /// The action `seat` should take, if the game is waiting on it.
    #[must_use]
    pub fn decide(&self, state: &SpadesState, seat: SeatIndex) -> Option<BotAction> {
        match state {
            SpadesState::Bidding(game) if game.state.current == seat => {
                let requirement = state.bid_requirement(seat)?;
                let ctx = BidContext {
                    seat,
                    mode: game.data.settings.mode,
                    bids: game.state.bids,
                };
                Some(BotAction::Bid(self.choose_bid(
                    &game.data.hands[seat],
                    &requirement,
                    &ctx,
                )))
            }
            SpadesState::Playing(game) if game.state.actor == seat => self
                .choose_card(
                    &game.data.hands[seat],
                    &game.state.trick,
                    game.state.spades_broken,
                    game.state.hand.rules.play,
                )
                .map(BotAction::Play),
            _ => None,
        }
    }

    /// Same as [`BotPolicy::decide`], working from what a seat can see.
    /// Needs the hand to have been revealed.
    #[must_use]
    pub fn decide_from_view(&self, view: &PlayerView) -> Option<BotAction> {
        let hand = view.hand.as_deref()?;
        if view.game.actor != Some(view.seat) {
            return None;
        }
        match view.game.status {
            GameStatus::Bidding => {
                let requirement = view.bid_requirement.as_ref()?;
                let mut bids = [None; PLAYERS];
                for (slot, seat) in bids.iter_mut().zip(&view.game.seats) {
                    *slot = seat.bid;
                }
                let ctx = BidContext {
                    seat: view.seat,
                    mode: view.game.mode,
                    bids,
                };
                Some(BotAction::Bid(self.choose_bid(hand, requirement, &ctx)))
            }
            GameStatus::Playing => {
                let trick = Trick {
                    plays: view.game.trick.clone(),
                };
                self.choose_card(
                    hand,
                    &trick,
                    view.game.spades_broken,
                    view.game.special_rules.into(),
                )
                .map(BotAction::Play)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::TrickPlay;

    fn hand(cards: &[(Rank, Suit)]) -> Vec<Card> {
        cards.iter().map(|(r, s)| Card(*r, *s)).collect()
    }

    fn ctx() -> BidContext {
        BidContext {
            seat: 0,
            mode: GameMode::Partners,
            bids: [None; PLAYERS],
        }
    }

    fn free() -> BidRequirement {
        BidRequirement::Range {
            max: 13,
            nil: true,
            blind_nil: true,
        }
    }

    fn strong_hand() -> Vec<Card> {
        hand(&[
            (Rank::Ace, Suit::Spade),
            (Rank::King, Suit::Spade),
            (Rank::Queen, Suit::Spade),
            (Rank::Jack, Suit::Spade),
            (Rank::Four, Suit::Spade),
            (Rank::Ace, Suit::Heart),
            (Rank::King, Suit::Heart),
            (Rank::Ace, Suit::Club),
            (Rank::Two, Suit::Club),
            (Rank::Three, Suit::Diamond),
            (Rank::Four, Suit::Diamond),
            (Rank::Five, Suit::Diamond),
            (Rank::Six, Suit::Diamond),
        ])
    }

    fn weak_hand() -> Vec<Card> {
        hand(&[
            (Rank::Two, Suit::Spade),
            (Rank::Three, Suit::Heart),
            (Rank::Four, Suit::Heart),
            (Rank::Five, Suit::Heart),
            (Rank::Six, Suit::Heart),
            (Rank::Two, Suit::Club),
            (Rank::Three, Suit::Club),
            (Rank::Four, Suit::Club),
            (Rank::Five, Suit::Club),
            (Rank::Two, Suit::Diamond),
            (Rank::Three, Suit::Diamond),
            (Rank::Four, Suit::Diamond),
            (Rank::Seven, Suit::Diamond),
        ])
    }

    #[test]
    fn strong_hand_bids_high() {
        let policy = BotPolicy::default();
        // Spades 8 halves, hearts 4, clubs 2, cutting 1.
        assert_eq!(policy.estimate_tricks(&strong_hand()), 7);
        assert!(!policy.nil_safe(&strong_hand()));
        assert_eq!(policy.choose_bid(&strong_hand(), &free(), &ctx()), Bid::Tricks(6));
    }

    #[test]
    fn weak_hand_goes_nil() {
        let policy = BotPolicy::default();
        assert!(policy.nil_safe(&weak_hand()));
        assert_eq!(policy.choose_bid(&weak_hand(), &free(), &ctx()), Bid::Nil);
    }

    #[test]
    fn never_doubles_partner_nil() {
        let policy = BotPolicy::default();
        let mut ctx = ctx();
        ctx.bids[2] = Some(Bid::Nil);
        assert_eq!(policy.choose_bid(&weak_hand(), &free(), &ctx), Bid::Tricks(1));
    }

    #[test]
    fn forced_bids_are_followed() {
        let policy = BotPolicy::default();
        let forced = BidRequirement::Forced(Bid::Tricks(3));
        assert_eq!(policy.choose_bid(&weak_hand(), &forced, &ctx()), Bid::Tricks(3));
        let four_or_nil = BidRequirement::OneOf(vec![Bid::Tricks(4), Bid::Nil]);
        assert_eq!(policy.choose_bid(&strong_hand(), &four_or_nil, &ctx()), Bid::Tricks(4));
        assert_eq!(policy.choose_bid(&weak_hand(), &four_or_nil, &ctx()), Bid::Nil);
    }

    #[test]
    fn no_nil_when_disabled() {
        let policy = BotPolicy::default();
        let req = BidRequirement::Range {
            max: 13,
            nil: false,
            blind_nil: false,
        };
        assert_eq!(policy.choose_bid(&weak_hand(), &req, &ctx()), Bid::Tricks(1));
    }

    #[test]
    fn leads_lowest_legal_card() {
        let policy = BotPolicy::default();
        let h = hand(&[(Rank::Two, Suit::Spade), (Rank::Nine, Suit::Heart), (Rank::Four, Suit::Club)]);
        let card = policy.choose_card(&h, &Trick::default(), false, PlayRule::Standard);
        assert_eq!(card, Some(Card(Rank::Four, Suit::Club)));
    }

    #[test]
    fn follows_with_lowest_of_suit() {
        let policy = BotPolicy::default();
        let h = hand(&[(Rank::King, Suit::Heart), (Rank::Three, Suit::Heart), (Rank::Two, Suit::Club)]);
        let trick = Trick {
            plays: vec![TrickPlay {
                seat: 3,
                card: Card(Rank::Ten, Suit::Heart),
            }],
        };
        assert_eq!(
            policy.choose_card(&h, &trick, false, PlayRule::Standard),
            Some(Card(Rank::Three, Suit::Heart))
        );
    }

    #[test]
    fn void_plays_lowest_legal() {
        let policy = BotPolicy::default();
        let h = hand(&[(Rank::Five, Suit::Spade), (Rank::Two, Suit::Club)]);
        let trick = Trick {
            plays: vec![TrickPlay {
                seat: 3,
                card: Card(Rank::Ten, Suit::Heart),
            }],
        };
        assert_eq!(
            policy.choose_card(&h, &trick, false, PlayRule::Standard),
            Some(Card(Rank::Two, Suit::Club))
        );
        assert_eq!(
            policy.choose_card(&h, &trick, false, PlayRule::Assassin),
            Some(Card(Rank::Five, Suit::Spade))
        );
    }

    #[test]
    fn view_decisions_match_full_state() {
        use crate::bot::{apply_action, bot_player};
        use crate::game::{GameSettings, SeatManagement};

        let mut state = SpadesState::new(GameSettings {
            seed: Some(3),
            ..Default::default()
        });
        for seat in 0..PLAYERS {
            state.seat_player(bot_player(seat)).unwrap();
        }
        state = state.step();
        let policy = BotPolicy::default();

        let first = state.pending_turn().unwrap().seat;
        assert!(policy.decide_from_view(&state.player_view(first)).is_none());

        while let Some(turn) = state.pending_turn() {
            state.reveal_hand(turn.seat).unwrap();
            let action = policy.decide(&state, turn.seat).unwrap();
            assert_eq!(
                policy.decide_from_view(&state.player_view(turn.seat)),
                Some(action)
            );
            apply_action(&mut state, turn.seat, action).unwrap();
        }
    }
}
