use blackjack_lib::{DrawMode, PlayerPolicy, Score, BLACKJACK_SCORE, BUST_SCORE};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt::Display;

/// Category a single game score is tallied under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The player reached 21. Counted as a win as well.
    Blackjack,
    Win,
    Draw,
    Loss,
    /// The player went over 21. Counted as a loss as well.
    Bust,
}

impl Outcome {
    /// Associated method for classifying a score returned by `play_game`.
    pub fn from_score(score: Score) -> Outcome {
        match score {
            BLACKJACK_SCORE => Outcome::Blackjack,
            BUST_SCORE => Outcome::Bust,
            s if s > 0 => Outcome::Win,
            s if s < 0 => Outcome::Loss,
            _ => Outcome::Draw,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Blackjack | Outcome::Win)
    }

    pub fn is_loss(&self) -> bool {
        matches!(self, Outcome::Bust | Outcome::Loss)
    }
}

/// `numerator` as a percentage of `denominator`, zero when there is nothing to divide by.
fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// Simple struct for recording the outcome tallies of one policy played in one draw mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    pub label: String,
    pub policy: PlayerPolicy,
    pub mode: DrawMode,
    pub games: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub busts: u64,
    pub blackjacks: u64,
}

impl SimulationSummary {
    pub fn new(policy: PlayerPolicy, mode: DrawMode) -> SimulationSummary {
        SimulationSummary {
            label: format!("policy {} ({}), {}", policy.number(), policy.name(), mode),
            policy,
            mode,
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            busts: 0,
            blackjacks: 0,
        }
    }

    /// Method for tallying the score of a single game.
    pub fn record(&mut self, score: Score) {
        let outcome = Outcome::from_score(score);
        self.games += 1;
        if outcome.is_win() {
            self.wins += 1;
        } else if outcome.is_loss() {
            self.losses += 1;
        } else {
            self.draws += 1;
        }
        match outcome {
            Outcome::Blackjack => self.blackjacks += 1,
            Outcome::Bust => self.busts += 1,
            _ => {}
        }
    }

    /// Method for folding the tallies of a partial summary into `self`.
    pub fn merge(&mut self, other: &SimulationSummary) {
        self.games += other.games;
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self.busts += other.busts;
        self.blackjacks += other.blackjacks;
    }

    pub fn win_rate(&self) -> f64 {
        percent(self.wins, self.games)
    }

    pub fn loss_rate(&self) -> f64 {
        percent(self.losses, self.games)
    }

    pub fn draw_rate(&self) -> f64 {
        percent(self.draws, self.games)
    }

    /// Share of the losses that were busts.
    pub fn bust_rate(&self) -> f64 {
        percent(self.busts, self.losses)
    }

    /// Share of the wins that were blackjacks.
    pub fn blackjack_rate(&self) -> f64 {
        percent(self.blackjacks, self.wins)
    }

    /// Share of all games that were blackjacks.
    pub fn overall_blackjack_rate(&self) -> f64 {
        percent(self.blackjacks, self.games)
    }
}

impl Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const WIDTH: usize = 80;
        const TEXT_WIDTH: usize = "blackjacks as a share of games (%)".len() + 4;
        const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;
        let body = format!(
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
            {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n",
            "policy",
            self.label,
            "games played",
            self.games,
            "games won",
            self.wins,
            "games lost",
            self.losses,
            "games drawn",
            self.draws,
            "player busts",
            self.busts,
            "player blackjacks",
            self.blackjacks,
            "win rate (%)",
            self.win_rate(),
            "loss rate (%)",
            self.loss_rate(),
            "draw rate (%)",
            self.draw_rate(),
            "busts as a share of losses (%)",
            self.bust_rate(),
            "blackjacks as a share of wins (%)",
            self.blackjack_rate(),
            "blackjacks as a share of games (%)",
            self.overall_blackjack_rate(),
        );
        write!(f, "{}", body)
    }
}

impl Serialize for SimulationSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SimulationSummary", 16)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("policy", &self.policy)?;
        state.serialize_field("policy_number", &self.policy.number())?;
        state.serialize_field("mode", &self.mode)?;
        state.serialize_field("games", &self.games)?;
        state.serialize_field("wins", &self.wins)?;
        state.serialize_field("losses", &self.losses)?;
        state.serialize_field("draws", &self.draws)?;
        state.serialize_field("busts", &self.busts)?;
        state.serialize_field("blackjacks", &self.blackjacks)?;
        state.serialize_field("win_rate", &self.win_rate())?;
        state.serialize_field("loss_rate", &self.loss_rate())?;
        state.serialize_field("draw_rate", &self.draw_rate())?;
        state.serialize_field("bust_rate", &self.bust_rate())?;
        state.serialize_field("blackjack_rate", &self.blackjack_rate())?;
        state.serialize_field("overall_blackjack_rate", &self.overall_blackjack_rate())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_of(scores: &[Score]) -> SimulationSummary {
        let mut summary = SimulationSummary::new(PlayerPolicy::HitBelow17, DrawMode::Infinite);
        for &score in scores {
            summary.record(score);
        }
        summary
    }

    #[test]
    fn scores_are_classified_like_the_tally() {
        assert_eq!(Outcome::from_score(100), Outcome::Blackjack);
        assert_eq!(Outcome::from_score(-100), Outcome::Bust);
        assert_eq!(Outcome::from_score(1), Outcome::Win);
        assert_eq!(Outcome::from_score(3), Outcome::Win);
        assert_eq!(Outcome::from_score(-4), Outcome::Loss);
        assert_eq!(Outcome::from_score(0), Outcome::Draw);
        assert!(Outcome::Blackjack.is_win());
        assert!(Outcome::Bust.is_loss());
        assert!(!Outcome::Draw.is_win() && !Outcome::Draw.is_loss());
    }

    #[test]
    fn record_counts_blackjacks_as_wins_and_busts_as_losses() {
        let summary = summary_of(&[100, 100, 2, 1, -100, -3, 0]);
        assert_eq!(summary.games, 7);
        assert_eq!(summary.wins, 4);
        assert_eq!(summary.blackjacks, 2);
        assert_eq!(summary.losses, 2);
        assert_eq!(summary.busts, 1);
        assert_eq!(summary.draws, 1);
    }

    #[test]
    fn rates_are_percentages() {
        let summary = summary_of(&[100, 2, -100, -3, 0, 0, 5, -100]);
        assert_eq!(summary.win_rate(), 37.5);
        assert_eq!(summary.loss_rate(), 37.5);
        assert_eq!(summary.draw_rate(), 25.0);
        assert!((summary.bust_rate() - 200.0 / 3.0).abs() < 1e-9);
        assert!((summary.blackjack_rate() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.overall_blackjack_rate(), 12.5);
    }

    #[test]
    fn empty_denominators_report_zero() {
        let summary = summary_of(&[0, 0]);
        assert_eq!(summary.bust_rate(), 0.0);
        assert_eq!(summary.blackjack_rate(), 0.0);

        let empty = summary_of(&[]);
        assert_eq!(empty.win_rate(), 0.0);
        assert_eq!(empty.overall_blackjack_rate(), 0.0);
    }

    #[test]
    fn merge_adds_partial_tallies() {
        let mut total = summary_of(&[100, -2]);
        total.merge(&summary_of(&[0, -100, 3]));
        assert_eq!(total, summary_of(&[100, -2, 0, -100, 3]));
    }

    #[test]
    fn display_lists_label_and_rates() {
        let text = summary_of(&[100, -100]).to_string();
        assert!(text.contains("policy 1 (hit-below-17), infinite"));
        assert!(text.contains("win rate (%)"));
        assert!(text.contains("50.00"));
        assert!(text.lines().all(|line| line.len() <= 80));
    }

    #[test]
    fn serializes_tallies_and_rates() {
        let value = serde_json::to_value(summary_of(&[100, 0])).unwrap();
        assert_eq!(value["policy"], "hit-below-17");
        assert_eq!(value["policy_number"], 1);
        assert_eq!(value["mode"], "infinite");
        assert_eq!(value["games"], 2);
        assert_eq!(value["win_rate"], 50.0);
        assert_eq!(value["blackjack_rate"], 100.0);
    }
}
