//! Trick legality and resolution.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Card, CompletedTrick, SeatIndex, SpecialRules, Suit, Trick, has_suit},
    errors::{GameError, PlayError},
};

/// Which legality rule set governs card play for a hand.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayRule {
    #[default]
    Standard,
    /// Spades may only be played when nothing else is left, except to
    /// follow a spade lead.
    Screamer,
    /// Spades must be played whenever the rules allow it.
    Assassin,
}

impl From<SpecialRules> for PlayRule {
    fn from(value: SpecialRules) -> Self {
        if value.assassin {
            Self::Assassin
        } else if value.screamer {
            Self::Screamer
        } else {
            Self::Standard
        }
    }
}

/// Check a single card against the rule set. The caller is responsible for
/// making sure the card is actually in `hand`.
pub fn check_play(
    hand: &[Card],
    trick: &Trick,
    spades_broken: bool,
    rule: PlayRule,
    card: Card,
) -> Result<(), PlayError> {
    let has_other = hand.iter().any(|c| !c.is_spade());
    let has_spade = has_suit(hand, Suit::Spade);

    match trick.lead_suit() {
        Some(lead) => {
            if has_suit(hand, lead) {
                if card.suit() != lead {
                    return Err(PlayError::MustFollowSuit(lead));
                }
                return Ok(());
            }
            match rule {
                PlayRule::Standard => Ok(()),
                PlayRule::Screamer if card.is_spade() && has_other => {
                    Err(PlayError::ScreamerNoSpades)
                }
                PlayRule::Assassin if !card.is_spade() && has_spade => {
                    Err(PlayError::AssassinMustCut)
                }
                PlayRule::Screamer | PlayRule::Assassin => Ok(()),
            }
        }
        None => match rule {
            PlayRule::Screamer if card.is_spade() && has_other => Err(PlayError::ScreamerNoSpades),
            PlayRule::Assassin if spades_broken && has_spade && !card.is_spade() => {
                Err(PlayError::AssassinMustLeadSpades)
            }
            _ if card.is_spade() && !spades_broken && has_other => {
                Err(PlayError::SpadesNotBroken)
            }
            _ => Ok(()),
        },
    }
}

/// Cards in `hand` that may legally be played to `trick`, lowest first.
/// Never empty for a non-empty hand.
#[must_use]
pub fn legal_cards(hand: &[Card], trick: &Trick, spades_broken: bool, rule: PlayRule) -> Vec<Card> {
    let mut legal: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|card| check_play(hand, trick, spades_broken, rule, *card).is_ok())
        .collect();
    legal.sort();
    legal
}

/// Whether `a` beats `b` in a trick led with `lead`. Spades trump.
#[must_use]
pub fn card_beats(a: Card, b: Card, lead: Suit) -> bool {
    match (a.is_spade(), b.is_spade()) {
        (true, false) => true,
        (false, true) => false,
        (true, true) => a.rank() > b.rank(),
        (false, false) => {
            let a_follows = a.suit() == lead;
            let b_follows = b.suit() == lead;
            match (a_follows, b_follows) {
                (true, false) => true,
                (true, true) => a.rank() > b.rank(),
                _ => false,
            }
        }
    }
}

/// Winner of a complete trick: the highest spade if any spade was played,
/// otherwise the highest card of the lead suit.
pub fn resolve_trick(trick: &Trick) -> Result<SeatIndex, GameError> {
    if !trick.is_complete() {
        return Err(GameError::IncompleteTrick);
    }
    let lead = trick.lead_suit().ok_or(GameError::IncompleteTrick)?;
    let mut best = trick.plays[0];
    for play in &trick.plays[1..] {
        if card_beats(play.card, best.card, lead) {
            best = *play;
        }
    }
    Ok(best.seat)
}

/// Resolve and consume the current trick. Taking the trick by value means a
/// trick can only ever be resolved once.
pub fn complete_trick(trick: Trick, number: usize) -> Result<CompletedTrick, GameError> {
    let winner = resolve_trick(&trick)?;
    Ok(CompletedTrick {
        number,
        plays: trick.plays,
        winner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Rank, TrickPlay};

    fn c(rank: Rank, suit: Suit) -> Card {
        Card(rank, suit)
    }

    fn trick(plays: &[(SeatIndex, Card)]) -> Trick {
        Trick {
            plays: plays
                .iter()
                .map(|(seat, card)| TrickPlay {
                    seat: *seat,
                    card: *card,
                })
                .collect(),
        }
    }

    #[test]
    fn standard_must_follow_suit() {
        let hand = vec![c(Rank::Two, Suit::Heart), c(Rank::Ace, Suit::Club)];
        let t = trick(&[(0, c(Rank::Ten, Suit::Heart))]);
        assert_eq!(
            legal_cards(&hand, &t, false, PlayRule::Standard),
            vec![c(Rank::Two, Suit::Heart)]
        );
        assert_eq!(
            check_play(&hand, &t, false, PlayRule::Standard, c(Rank::Ace, Suit::Club)),
            Err(PlayError::MustFollowSuit(Suit::Heart))
        );
    }

    #[test]
    fn standard_cannot_lead_unbroken_spades() {
        let hand = vec![c(Rank::Two, Suit::Spade), c(Rank::Five, Suit::Diamond)];
        let empty = Trick::default();
        assert_eq!(
            check_play(&hand, &empty, false, PlayRule::Standard, c(Rank::Two, Suit::Spade)),
            Err(PlayError::SpadesNotBroken)
        );
        assert_eq!(legal_cards(&hand, &empty, true, PlayRule::Standard).len(), 2);

        let all_spades = vec![c(Rank::Two, Suit::Spade), c(Rank::Nine, Suit::Spade)];
        assert_eq!(legal_cards(&all_spades, &empty, false, PlayRule::Standard).len(), 2);
    }

    #[test]
    fn void_may_cut_with_spade() {
        let hand = vec![c(Rank::Two, Suit::Spade), c(Rank::Five, Suit::Diamond)];
        let t = trick(&[(3, c(Rank::Ten, Suit::Heart))]);
        assert_eq!(legal_cards(&hand, &t, false, PlayRule::Standard).len(), 2);
    }

    #[test]
    fn screamer_excludes_spade_when_following_hearts() {
        let hand = vec![c(Rank::Two, Suit::Spade), c(Rank::Five, Suit::Heart)];
        let t = trick(&[(0, c(Rank::Ten, Suit::Heart))]);
        assert_eq!(
            legal_cards(&hand, &t, false, PlayRule::Screamer),
            vec![c(Rank::Five, Suit::Heart)]
        );
    }

    #[test]
    fn screamer_forbids_cutting_and_leading_spades() {
        let hand = vec![c(Rank::Two, Suit::Spade), c(Rank::Five, Suit::Club)];
        let t = trick(&[(0, c(Rank::Ten, Suit::Heart))]);
        assert_eq!(
            check_play(&hand, &t, true, PlayRule::Screamer, c(Rank::Two, Suit::Spade)),
            Err(PlayError::ScreamerNoSpades)
        );
        assert_eq!(
            check_play(&hand, &Trick::default(), true, PlayRule::Screamer, c(Rank::Two, Suit::Spade)),
            Err(PlayError::ScreamerNoSpades)
        );
        let only_spades = vec![c(Rank::Two, Suit::Spade)];
        assert_eq!(legal_cards(&only_spades, &t, false, PlayRule::Screamer).len(), 1);
    }

    #[test]
    fn screamer_follows_spade_lead() {
        let hand = vec![c(Rank::Two, Suit::Spade), c(Rank::Five, Suit::Club)];
        let t = trick(&[(0, c(Rank::Ten, Suit::Spade))]);
        assert_eq!(
            legal_cards(&hand, &t, true, PlayRule::Screamer),
            vec![c(Rank::Two, Suit::Spade)]
        );
    }

    #[test]
    fn assassin_must_cut_when_void() {
        let hand = vec![c(Rank::Three, Suit::Spade), c(Rank::Four, Suit::Club)];
        let t = trick(&[(0, c(Rank::Ten, Suit::Heart))]);
        assert_eq!(
            legal_cards(&hand, &t, false, PlayRule::Assassin),
            vec![c(Rank::Three, Suit::Spade)]
        );
        assert_eq!(
            check_play(&hand, &t, false, PlayRule::Assassin, c(Rank::Four, Suit::Club)),
            Err(PlayError::AssassinMustCut)
        );
    }

    #[test]
    fn assassin_leads_spades_once_broken() {
        let hand = vec![c(Rank::Three, Suit::Spade), c(Rank::Four, Suit::Club)];
        let empty = Trick::default();
        assert_eq!(
            legal_cards(&hand, &empty, true, PlayRule::Assassin),
            vec![c(Rank::Three, Suit::Spade)]
        );
        assert_eq!(
            legal_cards(&hand, &empty, false, PlayRule::Assassin),
            vec![c(Rank::Four, Suit::Club)]
        );
    }

    #[test]
    fn highest_spade_wins() {
        let t = trick(&[
            (1, c(Rank::Ace, Suit::Heart)),
            (2, c(Rank::Two, Suit::Spade)),
            (3, c(Rank::King, Suit::Heart)),
            (0, c(Rank::Three, Suit::Spade)),
        ]);
        assert_eq!(resolve_trick(&t), Ok(0));
    }

    #[test]
    fn highest_of_lead_suit_wins_without_spades() {
        let t = trick(&[
            (2, c(Rank::Nine, Suit::Diamond)),
            (3, c(Rank::Ace, Suit::Club)),
            (0, c(Rank::Jack, Suit::Diamond)),
            (1, c(Rank::Four, Suit::Diamond)),
        ]);
        assert_eq!(resolve_trick(&t), Ok(0));
    }

    #[test]
    fn incomplete_trick_cannot_resolve() {
        let t = trick(&[(0, c(Rank::Nine, Suit::Diamond))]);
        assert_eq!(resolve_trick(&t), Err(GameError::IncompleteTrick));
        assert_eq!(complete_trick(t, 1), Err(GameError::IncompleteTrick));
    }
}
