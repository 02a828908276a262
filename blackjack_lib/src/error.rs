use thiserror::Error;

/// Errors that can be raised by the blackjack engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackjackGameError {
    /// A single deck ran out of cards in the middle of a game.
    #[error("deck exhausted, no cards left to draw")]
    DeckExhausted,

    #[error("policy `{0}` not recognized")]
    UnknownPolicy(String),

    #[error("draw mode `{0}` not recognized, expected `infinite` or `single-deck`")]
    UnknownDrawMode(String),
}
