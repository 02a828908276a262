use crate::deck::{Deck, DrawMode};
use crate::hand::{Hand, BLACKJACK};
use crate::policy::DecisionPolicy;
use crate::BlackjackGameError;
use log::trace;
use rand::Rng;

/// Plays out one participant's turn and returns the final total of `hand`.
///
/// A hand already at 21 ends the turn without consulting `policy`. Otherwise cards are drawn from `deck` for as
/// long as `policy` asks for them. After each draw the turn ends on exactly 21; a total over 21 revalues the
/// first soft ace in the hand to one and asks `policy` again; a total over 21 with no soft ace left is a bust and
/// ends the turn.
///
/// The loop always terminates: every iteration either ends the turn or spends one of the hand's soft aces.
/// The only failure is `BlackjackGameError::DeckExhausted` when a single deck runs dry.
pub fn resolve_turn<P, R>(
    deck: &mut Deck,
    hand: &mut Hand,
    policy: &P,
    mode: DrawMode,
    rng: &mut R,
) -> Result<u32, BlackjackGameError>
where
    P: DecisionPolicy,
    R: Rng + ?Sized,
{
    if hand.is_blackjack() {
        return Ok(BLACKJACK);
    }

    while policy.hit(hand, rng) {
        hand.receive_card(deck.draw(mode, rng)?);
        if hand.is_blackjack() {
            break;
        } else if hand.is_bust() && hand.harden_first_soft_ace() {
            trace!("revalued soft ace, hand is now {}", hand);
        } else if hand.is_bust() {
            break;
        }
    }

    Ok(hand.total())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{DealerPolicy, PlayerPolicy};
    use crate::DECK_SIZE;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::cell::Cell;

    fn always_hit(_: &Hand) -> bool {
        true
    }

    #[test]
    fn twenty_one_never_consults_the_policy() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut deck = Deck::from_cards([5, 5]);
        let mut hand = Hand::from_cards([11, 10]);
        let asked = Cell::new(0);
        let policy = |_: &Hand| {
            asked.set(asked.get() + 1);
            true
        };

        let total =
            resolve_turn(&mut deck, &mut hand, &policy, DrawMode::SingleDeck, &mut rng).unwrap();
        assert_eq!(total, 21);
        assert_eq!(asked.get(), 0);
        assert_eq!(deck.len(), 2);
    }

    #[test]
    fn always_stand_keeps_the_initial_total() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for mode in DrawMode::ALL {
            let mut deck = Deck::new();
            let mut hand = Hand::from_cards([9, 4]);
            let total =
                resolve_turn(&mut deck, &mut hand, &PlayerPolicy::AlwaysStand, mode, &mut rng)
                    .unwrap();
            assert_eq!(total, 13);
            assert_eq!(hand.len(), 2);
            assert_eq!(deck.len(), DECK_SIZE);
        }
    }

    #[test]
    fn policy_is_asked_again_after_a_soft_ace_is_revalued() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut deck = Deck::from_cards([10, 3, 8]);
        let mut hand = Hand::from_cards([11, 5]);

        let total = resolve_turn(
            &mut deck,
            &mut hand,
            &PlayerPolicy::HitBelow17,
            DrawMode::SingleDeck,
            &mut rng,
        )
        .unwrap();
        assert_eq!(total, 19);
        assert_eq!(hand.cards(), &[1, 5, 10, 3]);
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn bust_without_soft_ace_ends_the_turn() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut deck = Deck::from_cards([10, 2]);
        let mut hand = Hand::from_cards([10, 6]);

        let total =
            resolve_turn(&mut deck, &mut hand, &always_hit, DrawMode::SingleDeck, &mut rng)
                .unwrap();
        assert_eq!(total, 26);
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn drawing_to_21_stops_even_if_the_policy_would_hit() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut deck = Deck::from_cards([6, 2]);
        let mut hand = Hand::from_cards([10, 5]);

        let total =
            resolve_turn(&mut deck, &mut hand, &always_hit, DrawMode::SingleDeck, &mut rng)
                .unwrap();
        assert_eq!(total, 21);
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn soft_aces_are_revalued_one_at_a_time() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut deck = Deck::from_cards([10, 10, 10]);
        let mut hand = Hand::from_cards([11, 11]);

        let total =
            resolve_turn(&mut deck, &mut hand, &always_hit, DrawMode::SingleDeck, &mut rng)
                .unwrap();
        assert_eq!(hand.cards(), &[1, 1, 10, 10, 10]);
        assert_eq!(total, 32);
        assert!(deck.is_empty());
    }

    #[test]
    fn dealt_pair_of_aces_is_not_revalued_before_the_policy_is_asked() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut deck = Deck::new();
        let mut hand = Hand::from_cards([11, 11]);

        let total =
            resolve_turn(&mut deck, &mut hand, &DealerPolicy, DrawMode::Infinite, &mut rng)
                .unwrap();
        assert_eq!(total, 22);
    }

    #[test]
    fn always_hit_terminates_in_every_mode() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for mode in DrawMode::ALL {
            for _ in 0..2000 {
                let mut deck = Deck::new();
                deck.shuffle(&mut rng);
                let mut hand = Hand::new();
                hand.receive_card(deck.draw(mode, &mut rng).unwrap());
                hand.receive_card(deck.draw(mode, &mut rng).unwrap());

                let total = resolve_turn(&mut deck, &mut hand, &always_hit, mode, &mut rng).unwrap();
                assert!(total >= 21);
                assert!(hand.len() <= DECK_SIZE);
            }
        }
    }

    #[test]
    fn exhausted_single_deck_is_an_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut deck = Deck::from_cards([2]);
        let mut hand = Hand::from_cards([2, 2]);

        let result =
            resolve_turn(&mut deck, &mut hand, &always_hit, DrawMode::SingleDeck, &mut rng);
        assert_eq!(result, Err(BlackjackGameError::DeckExhausted));
    }
}
