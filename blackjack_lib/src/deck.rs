use crate::BlackjackGameError;
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;
use std::str::FromStr;

/// Value of an ace while it is still counted soft.
pub const ACE: u8 = 11;

/// Value of an ace after it has been revalued to avoid a bust.
pub const HARD_ACE: u8 = 1;

/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// Selects how cards are drawn from a `Deck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawMode {
    /// Every draw samples from a full deck with replacement, the deck is never depleted.
    Infinite,
    /// Cards are dealt off the front of a shuffled deck without replacement.
    SingleDeck,
}

impl DrawMode {
    pub const ALL: [DrawMode; 2] = [DrawMode::Infinite, DrawMode::SingleDeck];

    pub fn name(&self) -> &'static str {
        match self {
            DrawMode::Infinite => "infinite",
            DrawMode::SingleDeck => "single-deck",
        }
    }
}

impl Display for DrawMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DrawMode {
    type Err = BlackjackGameError;

    /// Accepts the kebab-case names as well as the numeric codes `1` (infinite) and `2` (single deck).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "infinite" | "infinite-deck" | "1" => Ok(DrawMode::Infinite),
            "single-deck" | "single" | "2" => Ok(DrawMode::SingleDeck),
            _ => Err(BlackjackGameError::UnknownDrawMode(s.to_string())),
        }
    }
}

/// An ordered sequence of card values. Cards carry no suit, only the number of points they are worth,
/// with jacks, queens and kings collapsed into ten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: VecDeque<u8>,
}

impl Deck {
    /// Builds an unshuffled 52 card deck: the four aces first, then four copies of each of 2 through 10,
    /// then the twelve jacks, queens and kings.
    pub fn new() -> Deck {
        let mut cards = VecDeque::with_capacity(DECK_SIZE);
        cards.extend([ACE; 4]);
        for value in 2..=10 {
            cards.extend([value; 4]);
        }
        cards.extend([10; 12]);
        Deck { cards }
    }

    /// Builds a deck that will deal `cards` in the given order.
    pub fn from_cards<I: IntoIterator<Item = u8>>(cards: I) -> Deck {
        Deck {
            cards: cards.into_iter().collect(),
        }
    }

    /// Randomly permutes the remaining cards.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.make_contiguous().shuffle(rng);
    }

    /// Draws a single card according to `mode`.
    ///
    /// In `DrawMode::Infinite` a value is sampled uniformly from the deck and the deck is left untouched.
    /// In `DrawMode::SingleDeck` the front card is removed and returned. Either mode fails with
    /// `BlackjackGameError::DeckExhausted` if there is nothing left to draw.
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        mode: DrawMode,
        rng: &mut R,
    ) -> Result<u8, BlackjackGameError> {
        let card = match mode {
            DrawMode::Infinite => {
                if self.cards.is_empty() {
                    return Err(BlackjackGameError::DeckExhausted);
                }
                self.cards[rng.gen_range(0..self.cards.len())]
            }
            DrawMode::SingleDeck => self
                .cards
                .pop_front()
                .ok_or(BlackjackGameError::DeckExhausted)?,
        };
        trace!("drew {} ({} mode, {} left)", card, mode, self.cards.len());
        Ok(card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Number of cards of the given value left in the deck.
    pub fn count(&self, value: u8) -> usize {
        self.cards.iter().filter(|&&card| card == value).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &u8> {
        self.cards.iter()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Deck::new()
    }
}

/// Returns a fresh, unshuffled 52 card deck. Callers drawing in `DrawMode::SingleDeck` must shuffle it first.
pub fn create_deck() -> Deck {
    Deck::new()
}

/// Draws a card from `deck`, see `Deck::draw`.
pub fn draw_card<R: Rng + ?Sized>(
    deck: &mut Deck,
    mode: DrawMode,
    rng: &mut R,
) -> Result<u8, BlackjackGameError> {
    deck.draw(mode, rng)
}
