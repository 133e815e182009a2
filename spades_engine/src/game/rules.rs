//! Format and bid rules.
//!
//! A table's format, gimmick and nil options are resolved once per hand into
//! a [`HandRules`] value. Bidding asks it for the [`BidRequirement`] of the
//! seat on turn, and play asks it for the active [`PlayRule`].

use serde::{Deserialize, Serialize};

use super::{
    constants::{MAX_BID, PLAYERS},
    entities::{Bid, Card, GameFormat, GameMode, Gimmick, Rank, SeatIndex, SpecialRules, Suit},
    entities::{count_suit, partner_of},
    errors::BidError,
    tricks::PlayRule,
};

/// What a seat may bid right now.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum BidRequirement {
    /// Exactly one bid is legal.
    Forced(Bid),
    /// Any of a small fixed set.
    OneOf(Vec<Bid>),
    /// A free choice of `1..=max` tricks, plus nil and blind nil when enabled.
    Range { max: u8, nil: bool, blind_nil: bool },
}

impl BidRequirement {
    /// Check `bid` against this requirement, returning the normalized bid.
    pub fn validate(&self, bid: Bid) -> Result<Bid, BidError> {
        let bid = bid.normalized();
        match self {
            Self::Forced(required) => {
                if bid == *required {
                    Ok(bid)
                } else {
                    Err(BidError::ForcedBid {
                        required: *required,
                    })
                }
            }
            Self::OneOf(allowed) => {
                if allowed.contains(&bid) {
                    Ok(bid)
                } else {
                    Err(BidError::NotAllowed {
                        allowed: allowed.clone(),
                    })
                }
            }
            Self::Range {
                max,
                nil,
                blind_nil,
            } => match bid {
                Bid::Tricks(n) if (1..=*max).contains(&n) => Ok(bid),
                Bid::Tricks(_) => Err(BidError::OutOfRange {
                    min: if *nil { 0 } else { 1 },
                    max: *max,
                }),
                Bid::Nil if *nil => Ok(bid),
                Bid::Nil => Err(BidError::NilDisabled),
                Bid::BlindNil if *blind_nil => Ok(bid),
                Bid::BlindNil => Err(BidError::BlindNilDisabled),
            },
        }
    }

    /// Every bid this requirement accepts.
    #[must_use]
    pub fn allowed_bids(&self) -> Vec<Bid> {
        match self {
            Self::Forced(bid) => vec![*bid],
            Self::OneOf(allowed) => allowed.clone(),
            Self::Range {
                max,
                nil,
                blind_nil,
            } => {
                let mut bids: Vec<Bid> = (1..=*max).map(Bid::Tricks).collect();
                if *nil {
                    bids.push(Bid::Nil);
                }
                if *blind_nil {
                    bids.push(Bid::BlindNil);
                }
                bids
            }
        }
    }

    #[must_use]
    pub fn accepts_blind_nil(&self) -> bool {
        match self {
            Self::Forced(bid) => *bid == Bid::BlindNil,
            Self::OneOf(allowed) => allowed.contains(&Bid::BlindNil),
            Self::Range { blind_nil, .. } => *blind_nil,
        }
    }
}

/// Bidding options for one hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BidRules {
    pub mode: GameMode,
    pub format: GameFormat,
    pub allow_nil: bool,
    pub allow_blind_nil: bool,
}

impl BidRules {
    /// Requirement for `seat` holding `hand`, given the bids placed so far.
    #[must_use]
    pub fn requirement(
        &self,
        seat: SeatIndex,
        hand: &[Card],
        bids: &[Option<Bid>; PLAYERS],
    ) -> BidRequirement {
        match self.format {
            GameFormat::Regular => self.free_choice(),
            GameFormat::Whiz => {
                let spades = count_suit(hand, Suit::Spade) as u8;
                // No spades forces a nil whatever the nil setting says.
                let mut allowed = if spades == 0 {
                    vec![Bid::Nil]
                } else if self.allow_nil {
                    vec![Bid::Tricks(spades), Bid::Nil]
                } else {
                    vec![Bid::Tricks(spades)]
                };
                if self.blind_nil_allowed() {
                    allowed.push(Bid::BlindNil);
                }
                match allowed.as_slice() {
                    [only] => BidRequirement::Forced(*only),
                    _ => BidRequirement::OneOf(allowed),
                }
            }
            GameFormat::Mirror => forced_count(count_suit(hand, Suit::Spade)),
            GameFormat::Gimmick(Gimmick::Bid3) => BidRequirement::Forced(Bid::Tricks(3)),
            GameFormat::Gimmick(Gimmick::BidHearts) => forced_count(count_suit(hand, Suit::Heart)),
            GameFormat::Gimmick(Gimmick::CrazyAces) => {
                let aces = hand.iter().filter(|card| card.rank() == Rank::Ace).count();
                forced_count(3 * aces)
            }
            GameFormat::Gimmick(Gimmick::Bid4OrNil) => {
                BidRequirement::OneOf(vec![Bid::Tricks(4), Bid::Nil])
            }
            GameFormat::Gimmick(Gimmick::Suicide) => match bids[partner_of(seat)] {
                // Partner went nil, so this seat carries the team's contract.
                Some(partner) if partner.is_nil() => BidRequirement::Range {
                    max: MAX_BID,
                    nil: false,
                    blind_nil: false,
                },
                Some(_) if self.allow_blind_nil => {
                    BidRequirement::OneOf(vec![Bid::Nil, Bid::BlindNil])
                }
                Some(_) => BidRequirement::Forced(Bid::Nil),
                None => BidRequirement::Range {
                    max: MAX_BID,
                    nil: true,
                    blind_nil: self.allow_blind_nil,
                },
            },
        }
    }

    /// Validate a bid, producing the error that names the violated
    /// constraint.
    pub fn validate(
        &self,
        seat: SeatIndex,
        hand: &[Card],
        bids: &[Option<Bid>; PLAYERS],
        bid: Bid,
    ) -> Result<Bid, BidError> {
        let requirement = self.requirement(seat, hand, bids);
        if matches!(self.format, GameFormat::Gimmick(Gimmick::Suicide)) {
            if let Some(partner) = bids[partner_of(seat)] {
                if partner.is_nil() && bid.is_nil() {
                    return Err(BidError::PartnerAlreadyNil);
                }
                if !partner.is_nil() && !bid.is_nil() {
                    return Err(BidError::SuicideNilRequired);
                }
            }
        }
        requirement
            .validate(bid)
            .map_err(|err| match (self.format, bid.normalized()) {
                (GameFormat::Whiz, Bid::Nil) if !self.allow_nil => BidError::NilDisabled,
                (GameFormat::Whiz, Bid::BlindNil) if !self.blind_nil_allowed() => {
                    BidError::BlindNilDisabled
                }
                _ => err,
            })
    }

    fn blind_nil_allowed(&self) -> bool {
        self.allow_nil && self.allow_blind_nil
    }

    fn free_choice(&self) -> BidRequirement {
        BidRequirement::Range {
            max: MAX_BID,
            nil: self.allow_nil,
            blind_nil: self.blind_nil_allowed(),
        }
    }
}

/// Count-based forced bid; a count of zero is a nil.
fn forced_count(count: usize) -> BidRequirement {
    let count = count.min(MAX_BID as usize) as u8;
    BidRequirement::Forced(Bid::Tricks(count).normalized())
}

/// Rules resolved once at the start of each hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandRules {
    pub bids: BidRules,
    pub play: PlayRule,
}

impl HandRules {
    #[must_use]
    pub fn resolve(
        mode: GameMode,
        format: GameFormat,
        allow_nil: bool,
        allow_blind_nil: bool,
        special: SpecialRules,
    ) -> Self {
        Self {
            bids: BidRules {
                mode,
                format,
                allow_nil,
                allow_blind_nil,
            },
            play: PlayRule::from(special),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(format: GameFormat) -> BidRules {
        BidRules {
            mode: GameMode::Partners,
            format,
            allow_nil: true,
            allow_blind_nil: false,
        }
    }

    fn hand(cards: &[(Rank, Suit)]) -> Vec<Card> {
        cards.iter().map(|(r, s)| Card(*r, *s)).collect()
    }

    const NO_BIDS: [Option<Bid>; PLAYERS] = [None; PLAYERS];

    #[test]
    fn regular_accepts_range_and_nil() {
        let rules = rules(GameFormat::Regular);
        let hand = hand(&[(Rank::Ace, Suit::Spade)]);
        assert_eq!(rules.validate(0, &hand, &NO_BIDS, Bid::Tricks(13)), Ok(Bid::Tricks(13)));
        assert_eq!(rules.validate(0, &hand, &NO_BIDS, Bid::Tricks(0)), Ok(Bid::Nil));
        assert_eq!(
            rules.validate(0, &hand, &NO_BIDS, Bid::Tricks(14)),
            Err(BidError::OutOfRange { min: 0, max: 13 })
        );
        assert_eq!(
            rules.validate(0, &hand, &NO_BIDS, Bid::BlindNil),
            Err(BidError::BlindNilDisabled)
        );
    }

    #[test]
    fn nil_disabled_is_named() {
        let mut rules = rules(GameFormat::Regular);
        rules.allow_nil = false;
        assert_eq!(
            rules.validate(0, &[], &NO_BIDS, Bid::Nil),
            Err(BidError::NilDisabled)
        );
    }

    #[test]
    fn mirror_forces_spade_count() {
        let rules = rules(GameFormat::Mirror);
        let spades = hand(&[(Rank::Two, Suit::Spade), (Rank::Ten, Suit::Spade), (Rank::Ace, Suit::Heart)]);
        assert_eq!(
            rules.requirement(1, &spades, &NO_BIDS),
            BidRequirement::Forced(Bid::Tricks(2))
        );
        assert_eq!(
            rules.validate(1, &spades, &NO_BIDS, Bid::Tricks(3)),
            Err(BidError::ForcedBid {
                required: Bid::Tricks(2)
            })
        );
        let none = hand(&[(Rank::Ace, Suit::Heart)]);
        assert_eq!(rules.requirement(1, &none, &NO_BIDS), BidRequirement::Forced(Bid::Nil));
    }

    #[test]
    fn whiz_is_spades_or_nil() {
        let rules = rules(GameFormat::Whiz);
        let three = hand(&[
            (Rank::Two, Suit::Spade),
            (Rank::Three, Suit::Spade),
            (Rank::Four, Suit::Spade),
        ]);
        assert_eq!(
            rules.requirement(0, &three, &NO_BIDS).allowed_bids(),
            vec![Bid::Tricks(3), Bid::Nil]
        );
        assert!(rules.validate(0, &three, &NO_BIDS, Bid::Tricks(2)).is_err());
        assert_eq!(rules.requirement(0, &[], &NO_BIDS), BidRequirement::Forced(Bid::Nil));
    }

    #[test]
    fn whiz_honours_nil_settings() {
        let one = hand(&[(Rank::Two, Suit::Spade), (Rank::Ace, Suit::Heart)]);

        let mut blind = rules(GameFormat::Whiz);
        blind.allow_blind_nil = true;
        assert_eq!(
            blind.validate(0, &one, &NO_BIDS, Bid::BlindNil),
            Ok(Bid::BlindNil)
        );
        assert_eq!(
            rules(GameFormat::Whiz).validate(0, &one, &NO_BIDS, Bid::BlindNil),
            Err(BidError::BlindNilDisabled)
        );

        let mut no_nil = rules(GameFormat::Whiz);
        no_nil.allow_nil = false;
        assert_eq!(
            no_nil.requirement(0, &one, &NO_BIDS),
            BidRequirement::Forced(Bid::Tricks(1))
        );
        assert_eq!(
            no_nil.validate(0, &one, &NO_BIDS, Bid::Nil),
            Err(BidError::NilDisabled)
        );
        // Holding no spades still forces the nil.
        assert_eq!(no_nil.validate(0, &[], &NO_BIDS, Bid::Nil), Ok(Bid::Nil));
    }

    #[test]
    fn gimmicks() {
        let aces = hand(&[(Rank::Ace, Suit::Club), (Rank::Ace, Suit::Spade), (Rank::Two, Suit::Heart)]);
        assert_eq!(
            rules(GameFormat::Gimmick(Gimmick::CrazyAces)).requirement(0, &aces, &NO_BIDS),
            BidRequirement::Forced(Bid::Tricks(6))
        );
        assert_eq!(
            rules(GameFormat::Gimmick(Gimmick::BidHearts)).requirement(0, &aces, &NO_BIDS),
            BidRequirement::Forced(Bid::Tricks(1))
        );
        assert_eq!(
            rules(GameFormat::Gimmick(Gimmick::Bid3)).requirement(0, &aces, &NO_BIDS),
            BidRequirement::Forced(Bid::Tricks(3))
        );
        let four_or_nil = rules(GameFormat::Gimmick(Gimmick::Bid4OrNil));
        assert!(four_or_nil.validate(0, &aces, &NO_BIDS, Bid::Tricks(4)).is_ok());
        assert!(four_or_nil.validate(0, &aces, &NO_BIDS, Bid::Nil).is_ok());
        assert!(matches!(
            four_or_nil.validate(0, &aces, &NO_BIDS, Bid::Tricks(5)),
            Err(BidError::NotAllowed { .. })
        ));
    }

    #[test]
    fn suicide_forces_one_nil_per_team() {
        let rules = rules(GameFormat::Gimmick(Gimmick::Suicide));
        let mut bids = NO_BIDS;
        bids[0] = Some(Bid::Tricks(4));
        assert_eq!(rules.requirement(2, &[], &bids), BidRequirement::Forced(Bid::Nil));
        assert_eq!(
            rules.validate(2, &[], &bids, Bid::Tricks(3)),
            Err(BidError::SuicideNilRequired)
        );

        bids[1] = Some(Bid::Nil);
        assert_eq!(
            rules.validate(3, &[], &bids, Bid::Nil),
            Err(BidError::PartnerAlreadyNil)
        );
        assert!(rules.validate(3, &[], &bids, Bid::Tricks(5)).is_ok());
    }

    #[test]
    fn range_enumerates_all_bids() {
        let req = BidRequirement::Range {
            max: 13,
            nil: true,
            blind_nil: true,
        };
        let bids = req.allowed_bids();
        assert_eq!(bids.len(), 15);
        assert!(req.accepts_blind_nil());
        for bid in bids {
            assert!(req.validate(bid).is_ok());
        }
    }
}
