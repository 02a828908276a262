//! Decision policies. A policy looks at a hand and decides whether its holder keeps drawing.

use crate::{BlackjackGameError, Hand};
use lazy_static::lazy_static;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// Total at which the house dealer stops drawing.
pub const DEALER_STANDS_ON: u32 = 17;

/// Trait for anything that can decide whether a participant should draw another card.
///
/// `rng` is supplied for policies that randomize their choice; deterministic policies simply ignore it.
/// Any `Fn(&Hand) -> bool` closure is a policy as well.
pub trait DecisionPolicy {
    fn hit<R: Rng + ?Sized>(&self, hand: &Hand, rng: &mut R) -> bool;
}

impl<F> DecisionPolicy for F
where
    F: Fn(&Hand) -> bool,
{
    fn hit<R: Rng + ?Sized>(&self, hand: &Hand, _rng: &mut R) -> bool {
        self(hand)
    }
}

/// The house dealer's fixed policy: draw while the total is strictly below 17.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DealerPolicy;

impl DecisionPolicy for DealerPolicy {
    fn hit<R: Rng + ?Sized>(&self, hand: &Hand, _rng: &mut R) -> bool {
        hand.total() < DEALER_STANDS_ON
    }
}

/// The closed set of player policies evaluated by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerPolicy {
    /// Hit while the total is below 17, exactly like the dealer.
    #[serde(rename = "hit-below-17")]
    HitBelow17,
    /// Like `HitBelow17` but keeps hitting a soft 17 or better, only standing on a hard 17+.
    #[serde(rename = "hit-soft-17")]
    HitSoft17,
    /// Stands on a hard 17+, flips a coin on a soft 17+, hits anything lower.
    #[serde(rename = "coin-flip-soft-17")]
    CoinFlipSoft17,
    /// Never draws.
    #[serde(rename = "always-stand")]
    AlwaysStand,
    /// Hit while the total is 15 or less.
    #[serde(rename = "hit-below-16")]
    HitBelow16,
    /// Only hits soft hands totalling 16 or less.
    #[serde(rename = "hit-soft-below-17")]
    HitSoftBelow17,
}

lazy_static! {
    static ref POLICIES_BY_NAME: HashMap<&'static str, PlayerPolicy> = PlayerPolicy::ALL
        .iter()
        .map(|policy| (policy.name(), *policy))
        .collect();
}

impl PlayerPolicy {
    pub const ALL: [PlayerPolicy; 6] = [
        PlayerPolicy::HitBelow17,
        PlayerPolicy::HitSoft17,
        PlayerPolicy::CoinFlipSoft17,
        PlayerPolicy::AlwaysStand,
        PlayerPolicy::HitBelow16,
        PlayerPolicy::HitSoftBelow17,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PlayerPolicy::HitBelow17 => "hit-below-17",
            PlayerPolicy::HitSoft17 => "hit-soft-17",
            PlayerPolicy::CoinFlipSoft17 => "coin-flip-soft-17",
            PlayerPolicy::AlwaysStand => "always-stand",
            PlayerPolicy::HitBelow16 => "hit-below-16",
            PlayerPolicy::HitSoftBelow17 => "hit-soft-below-17",
        }
    }

    /// The 1-based number the policy is reported under.
    pub fn number(&self) -> usize {
        match self {
            PlayerPolicy::HitBelow17 => 1,
            PlayerPolicy::HitSoft17 => 2,
            PlayerPolicy::CoinFlipSoft17 => 3,
            PlayerPolicy::AlwaysStand => 4,
            PlayerPolicy::HitBelow16 => 5,
            PlayerPolicy::HitSoftBelow17 => 6,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PlayerPolicy::HitBelow17 => "hit while total < 17",
            PlayerPolicy::HitSoft17 => "hit while total < 17 or the hand is soft",
            PlayerPolicy::CoinFlipSoft17 => {
                "stand on hard 17+, coin flip on soft 17+, otherwise hit"
            }
            PlayerPolicy::AlwaysStand => "never hit",
            PlayerPolicy::HitBelow16 => "hit while total <= 15",
            PlayerPolicy::HitSoftBelow17 => "hit only soft hands with total <= 16",
        }
    }
}

impl DecisionPolicy for PlayerPolicy {
    fn hit<R: Rng + ?Sized>(&self, hand: &Hand, rng: &mut R) -> bool {
        let total = hand.total();
        let soft = hand.has_soft_ace();
        match self {
            PlayerPolicy::HitBelow17 => total < 17,
            PlayerPolicy::HitSoft17 => total < 17 || soft,
            PlayerPolicy::CoinFlipSoft17 => match (total >= 17, soft) {
                (true, false) => false,
                (true, true) => rng.gen_bool(0.5),
                (false, _) => true,
            },
            PlayerPolicy::AlwaysStand => false,
            PlayerPolicy::HitBelow16 => total <= 15,
            PlayerPolicy::HitSoftBelow17 => total <= 16 && soft,
        }
    }
}

impl Display for PlayerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PlayerPolicy {
    type Err = BlackjackGameError;

    /// Accepts either the kebab-case name of a policy or its number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if let Some(policy) = POLICIES_BY_NAME.get(key.as_str()) {
            return Ok(*policy);
        }
        key.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| PlayerPolicy::ALL.get(idx).copied())
            .ok_or_else(|| BlackjackGameError::UnknownPolicy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn decide(policy: PlayerPolicy, cards: &[u8]) -> bool {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        policy.hit(&Hand::from_cards(cards.iter().copied()), &mut rng)
    }

    #[test]
    fn dealer_hits_strictly_below_seventeen() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(DealerPolicy.hit(&Hand::from_cards([10, 6]), &mut rng));
        assert!(!DealerPolicy.hit(&Hand::from_cards([10, 7]), &mut rng));
        assert!(!DealerPolicy.hit(&Hand::from_cards([11, 6]), &mut rng));
    }

    #[test]
    fn hit_below_17() {
        assert!(decide(PlayerPolicy::HitBelow17, &[10, 6]));
        assert!(!decide(PlayerPolicy::HitBelow17, &[10, 7]));
    }

    #[test]
    fn hit_soft_17_stands_only_on_hard_totals() {
        assert!(decide(PlayerPolicy::HitSoft17, &[11, 7]));
        assert!(!decide(PlayerPolicy::HitSoft17, &[1, 10, 7]));
        assert!(decide(PlayerPolicy::HitSoft17, &[1, 10, 5]));
    }

    #[test]
    fn coin_flip_soft_17_flips_only_on_soft_17_or_better() {
        assert!(!decide(PlayerPolicy::CoinFlipSoft17, &[10, 8]));
        assert!(decide(PlayerPolicy::CoinFlipSoft17, &[10, 4]));
        assert!(decide(PlayerPolicy::CoinFlipSoft17, &[11, 4]));

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let hand = Hand::from_cards([11, 7]);
        let hits = (0..1000)
            .filter(|_| PlayerPolicy::CoinFlipSoft17.hit(&hand, &mut rng))
            .count();
        assert!(hits > 400 && hits < 600, "{} hits out of 1000", hits);
    }

    #[test]
    fn always_stand_never_hits() {
        assert!(!decide(PlayerPolicy::AlwaysStand, &[2, 2]));
        assert!(!decide(PlayerPolicy::AlwaysStand, &[11, 11]));
    }

    #[test]
    fn hit_below_16() {
        assert!(decide(PlayerPolicy::HitBelow16, &[10, 5]));
        assert!(!decide(PlayerPolicy::HitBelow16, &[10, 6]));
    }

    #[test]
    fn hit_soft_below_17_needs_a_soft_ace() {
        assert!(decide(PlayerPolicy::HitSoftBelow17, &[11, 5]));
        assert!(!decide(PlayerPolicy::HitSoftBelow17, &[10, 5]));
        assert!(!decide(PlayerPolicy::HitSoftBelow17, &[11, 6]));
    }

    #[test]
    fn closures_are_policies() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let two_cards_only = |hand: &Hand| hand.len() < 2;
        assert!(!two_cards_only.hit(&Hand::from_cards([4, 5]), &mut rng));
        assert!(two_cards_only.hit(&Hand::from_cards([4]), &mut rng));
    }

    #[test]
    fn serde_names_match_the_policy_names() {
        for policy in PlayerPolicy::ALL {
            let json = serde_json::to_string(&policy).unwrap();
            assert_eq!(json, format!("\"{}\"", policy.name()));
            assert_eq!(serde_json::from_str::<PlayerPolicy>(&json).unwrap(), policy);
        }
        assert!(serde_json::from_str::<PlayerPolicy>("\"hit-below17\"").is_err());
    }

    #[test]
    fn policies_parse_from_names_and_numbers() {
        for policy in PlayerPolicy::ALL {
            assert_eq!(policy.name().parse::<PlayerPolicy>(), Ok(policy));
            assert_eq!(policy.number().to_string().parse::<PlayerPolicy>(), Ok(policy));
        }
        assert_eq!(
            "Always-Stand".parse::<PlayerPolicy>(),
            Ok(PlayerPolicy::AlwaysStand)
        );
        assert!("0".parse::<PlayerPolicy>().is_err());
        assert!("7".parse::<PlayerPolicy>().is_err());
        assert_eq!(
            "count-cards".parse::<PlayerPolicy>(),
            Err(BlackjackGameError::UnknownPolicy("count-cards".to_string()))
        );
    }
}
