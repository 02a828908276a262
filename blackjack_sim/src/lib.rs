//! Monte Carlo driver for the `blackjack_lib` engine. Plays each player policy many times in each draw mode, one
//! thread per simulation, and tallies the outcomes into summaries and a final `Report`.

pub mod stats;
pub mod write;

use blackjack_lib::{play_game, BlackjackGameError, DrawMode, PlayerPolicy};
use log::{debug, error, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use thiserror::Error;

pub use stats::{Outcome, SimulationSummary};
pub use write::{BestPolicies, Report, ReportFormat};

pub mod prelude {
    pub use super::{
        BestPolicies, BlackjackSimulator, BlackjackSimulatorConfig,
        BlackjackSimulatorConfigBuilder, MulPolicyBlackjackSimulator,
        MulPolicyBlackjackSimulatorBuilder, Outcome, Report, ReportFormat, SimulationError,
        SimulationRequest, SimulationSummary,
    };
    pub use blackjack_lib::prelude::*;
}

/// Number of games played per policy and draw mode unless configured otherwise.
pub const DEFAULT_ITERATIONS: u64 = 50_000;

/// Number of games a simulation plays between two partial summaries.
pub const DEFAULT_BATCH_SIZE: u64 = 1_000;

/// A partial summary tagged with the id of the simulation that produced it. `None` marks the simulation as done.
pub type SummaryMessage = (Option<SimulationSummary>, usize);

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("simulation #{id} failed: {source}")]
    GameError {
        id: usize,
        source: BlackjackGameError,
    },
    #[error("unable to deliver simulation results: {0}")]
    SendingError(String),
    #[error("{0} thread panicked")]
    ThreadPanicked(String),
    #[error("invalid configuration: {0}")]
    ConfigError(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Independent ChaCha stream for every policy and draw mode pair, so a seed reproduces the same games for a pair
/// no matter which other pairs run alongside it.
fn stream_id(policy: PlayerPolicy, mode: DrawMode) -> u64 {
    let mode_bit = match mode {
        DrawMode::Infinite => 0,
        DrawMode::SingleDeck => 1,
    };
    ((policy.number() as u64) << 1) | mode_bit
}

/// Struct for running the games of a single policy in a single draw mode.
///
/// Games are played in batches of `batch_size`; every batch yields a partial `SimulationSummary` so a caller can
/// stream results while the simulation is still running. The simulator owns its random source, seeded from the
/// config seed on the stream belonging to its policy and mode.
#[derive(Debug, Clone)]
pub struct BlackjackSimulator {
    policy: PlayerPolicy,
    mode: DrawMode,
    seed: u64,
    rng: ChaCha8Rng,
    iterations: u64,
    batch_size: u64,
    games_played: u64,
    accumulated: SimulationSummary,
    silent: bool,
}

impl BlackjackSimulator {
    pub fn new(
        policy: PlayerPolicy,
        mode: DrawMode,
        config: &BlackjackSimulatorConfig,
    ) -> BlackjackSimulator {
        BlackjackSimulator {
            policy,
            mode,
            seed: config.seed,
            rng: Self::seeded_rng(config.seed, policy, mode),
            iterations: config.iterations,
            batch_size: config.batch_size.max(1),
            games_played: 0,
            accumulated: SimulationSummary::new(policy, mode),
            silent: config.silent,
        }
    }

    fn seeded_rng(seed: u64, policy: PlayerPolicy, mode: DrawMode) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream_id(policy, mode));
        rng
    }

    /// Method that plays the next batch of games. Returns the partial summary of that batch, or `None` once every
    /// game has been played.
    pub fn run_batch(&mut self) -> Result<Option<SimulationSummary>, BlackjackGameError> {
        if self.is_finished() {
            return Ok(None);
        }
        let games = self.batch_size.min(self.iterations - self.games_played);
        let mut partial = SimulationSummary::new(self.policy, self.mode);
        for _ in 0..games {
            partial.record(play_game(&self.policy, self.mode, &mut self.rng)?);
        }
        self.games_played += games;
        self.accumulated.merge(&partial);

        if !self.silent {
            info!(
                "{}: {}/{} games, win rate {:.2}%",
                self.accumulated.label,
                self.games_played,
                self.iterations,
                self.accumulated.win_rate()
            );
        }
        Ok(Some(partial))
    }

    /// Method that plays every remaining game and returns the accumulated summary.
    pub fn run(&mut self) -> Result<&SimulationSummary, BlackjackGameError> {
        while self.run_batch()?.is_some() {}
        Ok(&self.accumulated)
    }

    pub fn is_finished(&self) -> bool {
        self.games_played >= self.iterations
    }

    pub fn summary(&self) -> &SimulationSummary {
        &self.accumulated
    }

    /// Method for resetting the simulation. The random source is rewound as well, so running again replays the
    /// same games.
    pub fn reset(&mut self) {
        self.rng = Self::seeded_rng(self.seed, self.policy, self.mode);
        self.games_played = 0;
        self.accumulated = SimulationSummary::new(self.policy, self.mode);
    }
}

/// This struct is for testing several policies and draw modes at once. Every (policy, mode) pair is played by its
/// own `BlackjackSimulator` on its own thread, the partial summaries are sent over a channel to a single
/// collecting thread.
#[derive(Debug, Clone)]
pub struct MulPolicyBlackjackSimulator {
    simulations: Vec<(PlayerPolicy, DrawMode)>,
    pub config: BlackjackSimulatorConfig,
}

impl MulPolicyBlackjackSimulator {
    /// Method that returns a new `MulPolicyBlackjackSimulatorBuilder` object.
    pub fn new(config: BlackjackSimulatorConfig) -> MulPolicyBlackjackSimulatorBuilder {
        MulPolicyBlackjackSimulatorBuilder {
            simulations: None,
            config,
        }
    }

    pub fn simulations(&self) -> &[(PlayerPolicy, DrawMode)] {
        &self.simulations
    }

    /// Runs every simulation and hands the receiving end of the summary channel, along with the ids of all
    /// simulations, to `collector` on a thread of its own. Ids are 1-based, in the order simulations were added.
    /// Returns whatever `collector` produces, unless a simulation fails first.
    pub fn run_with<F, T>(&self, collector: F) -> Result<T, SimulationError>
    where
        F: FnOnce(Receiver<SummaryMessage>, HashSet<usize>) -> Result<T, SimulationError>
            + Send
            + 'static,
        T: Send + 'static,
    {
        info!(
            "running {} simulation(s) of {} games each, seed {}",
            self.simulations.len(),
            self.config.iterations,
            self.config.seed
        );

        let (sender, receiver) = mpsc::channel::<SummaryMessage>();
        let ids: HashSet<usize> = (1..=self.simulations.len()).collect();
        let collect_handle = thread::spawn(move || collector(receiver, ids));

        let mut handles = Vec::with_capacity(self.simulations.len());
        for (idx, &(policy, mode)) in self.simulations.iter().enumerate() {
            let id = idx + 1;
            let sender = sender.clone();
            let mut simulation = BlackjackSimulator::new(policy, mode, &self.config);

            let handle = thread::spawn(move || -> Result<(), SimulationError> {
                debug!("simulation #{} started: {}", id, simulation.summary().label);
                while let Some(partial) = simulation
                    .run_batch()
                    .map_err(|source| SimulationError::GameError { id, source })?
                {
                    sender
                        .send((Some(partial), id))
                        .map_err(|e| SimulationError::SendingError(e.to_string()))?;
                }
                sender
                    .send((None, id))
                    .map_err(|e| SimulationError::SendingError(e.to_string()))?;
                info!(
                    "simulation #{} finished: {}, win rate {:.2}%",
                    id,
                    simulation.summary().label,
                    simulation.summary().win_rate()
                );
                Ok(())
            });
            handles.push((id, handle));
        }
        // The collector sees a closed channel if every simulation thread is gone without finishing.
        drop(sender);

        let mut first_error = None;
        for (id, handle) in handles {
            let result = handle.join().unwrap_or_else(|_| {
                Err(SimulationError::ThreadPanicked(format!("simulation #{}", id)))
            });
            if let Err(e) = result {
                error!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        let collected = collect_handle
            .join()
            .unwrap_or_else(|_| Err(SimulationError::ThreadPanicked(String::from("collector"))));

        match first_error {
            Some(e) => Err(e),
            None => collected,
        }
    }

    /// Runs every simulation and returns the final `Report`.
    pub fn report(&self) -> Result<Report, SimulationError> {
        let (seed, iterations) = (self.config.seed, self.config.iterations);
        self.run_with(move |receiver, ids| {
            let summaries = write::collect_summaries(receiver, ids)?;
            Ok(Report::new(seed, iterations, summaries.into_values()))
        })
    }

    /// Runs every simulation, writes the `Report` to `file_out` in `format` from the collecting thread, and returns it.
    pub fn run(
        &self,
        file_out: Box<dyn Write + Send + 'static>,
        format: ReportFormat,
    ) -> Result<Report, SimulationError> {
        let (seed, iterations) = (self.config.seed, self.config.iterations);
        self.run_with(move |receiver, ids| {
            let summaries = write::collect_summaries(receiver, ids)?;
            let report = Report::new(seed, iterations, summaries.into_values());
            report.write(format, file_out)?;
            Ok(report)
        })
    }
}

/// Struct for building a `MulPolicyBlackjackSimulator` object
pub struct MulPolicyBlackjackSimulatorBuilder {
    simulations: Option<Vec<(PlayerPolicy, DrawMode)>>,
    config: BlackjackSimulatorConfig,
}

impl MulPolicyBlackjackSimulatorBuilder {
    /// Method for adding a simulation of `policy` in `mode`, configured by the `BlackjackSimulatorConfig` the
    /// builder was created with.
    pub fn simulation(&mut self, policy: PlayerPolicy, mode: DrawMode) -> &mut Self {
        let simulations = self.simulations.get_or_insert_with(Vec::new);
        if !simulations.contains(&(policy, mode)) {
            simulations.push((policy, mode));
        }
        self
    }

    /// Method for adding every policy in every mode of `modes`. Modes are the outer loop.
    pub fn all_policies(&mut self, modes: &[DrawMode]) -> &mut Self {
        for &mode in modes {
            for policy in PlayerPolicy::ALL {
                self.simulation(policy, mode);
            }
        }
        self
    }

    /// Method that builds a `MulPolicyBlackjackSimulator` object
    pub fn build(&mut self) -> MulPolicyBlackjackSimulator {
        MulPolicyBlackjackSimulator {
            simulations: self.simulations.take().unwrap_or_default(),
            config: self.config,
        }
    }
}

/// Struct for configuring a `BlackjackSimulator` object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackjackSimulatorConfig {
    pub iterations: u64,
    pub batch_size: u64,
    pub seed: u64,
    pub silent: bool,
}

impl BlackjackSimulatorConfig {
    /// Associated method for returning a new `BlackjackSimulatorConfigBuilder` object.
    pub fn new() -> BlackjackSimulatorConfigBuilder {
        BlackjackSimulatorConfigBuilder {
            iterations: None,
            batch_size: None,
            seed: None,
            silent: None,
        }
    }
}

impl Default for BlackjackSimulatorConfig {
    /// Returns the standard configuration with a freshly drawn seed.
    fn default() -> Self {
        BlackjackSimulatorConfig::new().build()
    }
}

/// Struct to implement builder pattern for `BlackjackSimulatorConfig`
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackjackSimulatorConfigBuilder {
    iterations: Option<u64>,
    batch_size: Option<u64>,
    seed: Option<u64>,
    silent: Option<bool>,
}

impl BlackjackSimulatorConfigBuilder {
    /// Method for setting the number of games played by each simulation.
    pub fn iterations(&mut self, n: u64) -> &mut Self {
        self.iterations = Some(n);
        self
    }

    /// Method for setting how many games are played between two partial summaries.
    pub fn batch_size(&mut self, n: u64) -> &mut Self {
        self.batch_size = Some(n);
        self
    }

    /// Method for fixing the seed every simulation derives its random source from.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Method for setting a boolean flag, if set to false every simulation logs its progress after each batch.
    pub fn silent(&mut self, silent: bool) -> &mut Self {
        self.silent = Some(silent);
        self
    }

    /// Method for building a `BlackjackSimulatorConfig`. A missing seed is drawn at random.
    pub fn build(&mut self) -> BlackjackSimulatorConfig {
        BlackjackSimulatorConfig {
            iterations: self.iterations.unwrap_or(DEFAULT_ITERATIONS),
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
            seed: self.seed.unwrap_or_else(rand::random),
            silent: self.silent.unwrap_or(true),
        }
    }
}

/// The parameters of a run as they arrive from a config file or an HTTP request. Every field is optional, empty
/// lists stand for every mode and every policy. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationRequest {
    pub iterations: Option<u64>,
    pub batch_size: Option<u64>,
    pub seed: Option<u64>,
    pub modes: Vec<DrawMode>,
    pub policies: Vec<PlayerPolicy>,
}

impl SimulationRequest {
    /// Associated method for reading a request from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<SimulationRequest, SimulationError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SimulationError::ConfigError(format!("unable to open {}: {}", path.display(), e))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            SimulationError::ConfigError(format!("unable to parse {}: {}", path.display(), e))
        })
    }

    /// Layers `overrides` on top of `self`: every value set in `overrides` wins.
    pub fn overridden_by(self, overrides: SimulationRequest) -> SimulationRequest {
        SimulationRequest {
            iterations: overrides.iterations.or(self.iterations),
            batch_size: overrides.batch_size.or(self.batch_size),
            seed: overrides.seed.or(self.seed),
            modes: if overrides.modes.is_empty() {
                self.modes
            } else {
                overrides.modes
            },
            policies: if overrides.policies.is_empty() {
                self.policies
            } else {
                overrides.policies
            },
        }
    }

    pub fn config(&self, silent: bool) -> BlackjackSimulatorConfig {
        let mut builder = BlackjackSimulatorConfig::new();
        builder.silent(silent);
        if let Some(n) = self.iterations {
            builder.iterations(n);
        }
        if let Some(n) = self.batch_size {
            builder.batch_size(n);
        }
        if let Some(seed) = self.seed {
            builder.seed(seed);
        }
        builder.build()
    }

    /// Builds a simulator running every requested policy in every requested mode.
    pub fn simulator(&self, silent: bool) -> MulPolicyBlackjackSimulator {
        let modes: &[DrawMode] = if self.modes.is_empty() {
            &DrawMode::ALL
        } else {
            &self.modes
        };
        let policies: &[PlayerPolicy] = if self.policies.is_empty() {
            &PlayerPolicy::ALL
        } else {
            &self.policies
        };

        let mut builder = MulPolicyBlackjackSimulator::new(self.config(silent));
        for &mode in modes {
            for &policy in policies {
                builder.simulation(policy, mode);
            }
        }
        builder.build()
    }
}
