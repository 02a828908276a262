//! The core of the blackjack policy simulator: building and drawing from a deck, resolving a single
//! participant's turn, and resolving a full game between a player and the house dealer into a single score.
//!
//! The engine holds no state across games and never reaches for ambient randomness. Every operation that needs
//! randomness takes a `rand::Rng` from its caller so that games can be reproduced from a seed.

pub mod deck;
pub mod error;
pub mod game;
pub mod hand;
pub mod policy;
pub mod turn;

pub use deck::{create_deck, draw_card, Deck, DrawMode, ACE, DECK_SIZE, HARD_ACE};
pub use error::BlackjackGameError;
pub use game::{deal_hands, play_dealt_game, play_game, Score, BLACKJACK_SCORE, BUST_SCORE, DEALER_BUST_SCORE};
pub use hand::{Hand, BLACKJACK};
pub use policy::{DealerPolicy, DecisionPolicy, PlayerPolicy, DEALER_STANDS_ON};
pub use turn::resolve_turn;

pub mod prelude {
    pub use super::{
        create_deck, deal_hands, draw_card, play_dealt_game, play_game, resolve_turn, BlackjackGameError,
        DealerPolicy, DecisionPolicy, Deck, DrawMode, Hand, PlayerPolicy, Score,
    };
}
