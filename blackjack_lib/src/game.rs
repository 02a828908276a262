use crate::deck::{create_deck, Deck, DrawMode};
use crate::hand::Hand;
use crate::policy::{DealerPolicy, DecisionPolicy};
use crate::turn::resolve_turn;
use crate::BlackjackGameError;
use log::debug;
use rand::Rng;

/// Signed result of a single game, seen from the player's side.
pub type Score = i32;

/// The player reached exactly 21, dealt or drawn. The dealer never plays.
pub const BLACKJACK_SCORE: Score = 100;

/// The player busted. The dealer never plays.
pub const BUST_SCORE: Score = -100;

/// The dealer busted. Reported as a flat 1 regardless of the player's margin.
pub const DEALER_BUST_SCORE: Score = 1;

/// Deals the opening hands off `deck`: two cards to the player, then two to the dealer.
/// Returns `(player_hand, dealer_hand)`.
pub fn deal_hands<R>(
    deck: &mut Deck,
    mode: DrawMode,
    rng: &mut R,
) -> Result<(Hand, Hand), BlackjackGameError>
where
    R: Rng + ?Sized,
{
    let mut player_hand = Hand::new();
    let mut dealer_hand = Hand::new();
    for _ in 0..2 {
        player_hand.receive_card(deck.draw(mode, rng)?);
    }
    for _ in 0..2 {
        dealer_hand.receive_card(deck.draw(mode, rng)?);
    }
    Ok((player_hand, dealer_hand))
}

/// Plays one complete game of `policy` against the house dealer.
///
/// A fresh deck is built for the game (and shuffled when drawing in `DrawMode::SingleDeck`), the opening hands
/// are dealt with `deal_hands`, and the game is resolved with `play_dealt_game`.
pub fn play_game<P, R>(policy: &P, mode: DrawMode, rng: &mut R) -> Result<Score, BlackjackGameError>
where
    P: DecisionPolicy,
    R: Rng + ?Sized,
{
    let mut deck = create_deck();
    if mode == DrawMode::SingleDeck {
        deck.shuffle(rng);
    }

    let (mut player_hand, mut dealer_hand) = deal_hands(&mut deck, mode, rng)?;
    play_dealt_game(
        &mut deck,
        &mut player_hand,
        &mut dealer_hand,
        policy,
        mode,
        rng,
    )
}

/// Resolves a game whose initial cards have already been dealt.
///
/// The player's turn is played first. A player total of 21 scores `BLACKJACK_SCORE` and a bust scores
/// `BUST_SCORE`; in both cases the dealer never draws. Otherwise the dealer plays `DealerPolicy`: a dealer bust
/// scores `DEALER_BUST_SCORE`, anything else scores the player's total minus the dealer's.
pub fn play_dealt_game<P, R>(
    deck: &mut Deck,
    player_hand: &mut Hand,
    dealer_hand: &mut Hand,
    policy: &P,
    mode: DrawMode,
    rng: &mut R,
) -> Result<Score, BlackjackGameError>
where
    P: DecisionPolicy,
    R: Rng + ?Sized,
{
    let player_total = resolve_turn(deck, player_hand, policy, mode, rng)?;

    let score = if player_hand.is_blackjack() {
        BLACKJACK_SCORE
    } else if player_hand.is_bust() {
        BUST_SCORE
    } else {
        let dealer_total = resolve_turn(deck, dealer_hand, &DealerPolicy, mode, rng)?;
        if dealer_hand.is_bust() {
            DEALER_BUST_SCORE
        } else {
            player_total as Score - dealer_total as Score
        }
    };

    debug!(
        "player {} vs dealer {} scored {}",
        player_hand, dealer_hand, score
    );
    Ok(score)
}
