use crate::deck::{ACE, HARD_ACE};
use std::fmt::Display;

/// The total every participant is trying to reach.
pub const BLACKJACK: u32 = 21;

/// The ordered cards held by a single participant during one game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<u8>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand {
            cards: Vec::with_capacity(4),
        }
    }

    /// Builds a hand holding `cards` in the given order.
    pub fn from_cards<I: IntoIterator<Item = u8>>(cards: I) -> Hand {
        Hand {
            cards: cards.into_iter().collect(),
        }
    }

    pub fn receive_card(&mut self, card: u8) {
        self.cards.push(card);
    }

    /// Sum of the current card values. Not cached, recomputed on every call.
    pub fn total(&self) -> u32 {
        self.cards.iter().map(|&card| card as u32).sum()
    }

    /// Whether the hand still holds an ace counted as eleven.
    pub fn has_soft_ace(&self) -> bool {
        self.cards.contains(&ACE)
    }

    /// Revalues the first soft ace in the hand to one. Only the first match is changed, any other soft aces
    /// are left alone. Returns `false` if the hand holds no soft ace.
    pub fn harden_first_soft_ace(&mut self) -> bool {
        match self.cards.iter().position(|&card| card == ACE) {
            Some(idx) => {
                self.cards[idx] = HARD_ACE;
                true
            }
            None => false,
        }
    }

    pub fn is_bust(&self) -> bool {
        self.total() > BLACKJACK
    }

    /// A hand is a blackjack whenever it totals exactly 21, whether dealt or drawn to.
    pub fn is_blackjack(&self) -> bool {
        self.total() == BLACKJACK
    }

    pub fn cards(&self) -> &[u8] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(|card| card.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "[{}] ({})", cards, self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_recomputed_after_each_card() {
        let mut hand = Hand::from_cards([10, 6]);
        assert_eq!(hand.total(), 16);
        hand.receive_card(4);
        assert_eq!(hand.total(), 20);
        assert!(!hand.is_bust());
        hand.receive_card(2);
        assert!(hand.is_bust());
    }

    #[test]
    fn only_the_first_soft_ace_is_hardened() {
        let mut hand = Hand::from_cards([11, 11, 10]);
        assert_eq!(hand.total(), 32);
        assert!(hand.harden_first_soft_ace());
        assert_eq!(hand.cards(), &[1, 11, 10]);
        assert_eq!(hand.total(), 22);
        assert!(hand.has_soft_ace());
    }

    #[test]
    fn first_soft_ace_is_found_after_hard_aces() {
        let mut hand = Hand::from_cards([1, 5, 11, 11]);
        assert!(hand.harden_first_soft_ace());
        assert_eq!(hand.cards(), &[1, 5, 1, 11]);
    }

    #[test]
    fn hardening_without_soft_ace_does_nothing() {
        let mut hand = Hand::from_cards([1, 10, 10]);
        assert!(!hand.has_soft_ace());
        assert!(!hand.harden_first_soft_ace());
        assert_eq!(hand.cards(), &[1, 10, 10]);
    }

    #[test]
    fn blackjack_is_any_twenty_one() {
        assert!(Hand::from_cards([11, 10]).is_blackjack());
        assert!(Hand::from_cards([7, 7, 7]).is_blackjack());
        assert!(!Hand::from_cards([10, 10]).is_blackjack());
    }

    #[test]
    fn display_shows_cards_and_total() {
        assert_eq!(Hand::from_cards([11, 6]).to_string(), "[11, 6] (17)");
    }
}
