use crate::{SimulationError, SimulationSummary, SummaryMessage};
use blackjack_lib::{DrawMode, PlayerPolicy};
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::mpsc::Receiver;

const WIDTH: usize = 80;
const TEXT_WIDTH: usize = "highest draw rate (single-deck)".len() + 9;
const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;

/// Output format of a `Report`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Receives partial summaries until every simulation in `ids` has sent its closing `None`, merging the partials of
/// each simulation. Returns the merged summaries keyed by simulation id.
pub fn collect_summaries(
    receiver: Receiver<SummaryMessage>,
    mut ids: HashSet<usize>,
) -> Result<BTreeMap<usize, SimulationSummary>, SimulationError> {
    let mut summaries: BTreeMap<usize, SimulationSummary> = BTreeMap::new();
    while !ids.is_empty() {
        match receiver.recv() {
            Ok((Some(partial), id)) => match summaries.get_mut(&id) {
                Some(summary) => summary.merge(&partial),
                None => {
                    summaries.insert(id, partial);
                }
            },
            Ok((None, id)) => {
                debug!("simulation #{} has nothing more to send", id);
                ids.remove(&id);
            }
            Err(_) => {
                return Err(SimulationError::SendingError(format!(
                    "channel closed with {} simulation(s) still running",
                    ids.len()
                )))
            }
        }
    }
    Ok(summaries)
}

/// The policies that came out on top for one draw mode. Ties go to the lowest numbered policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestPolicies {
    pub mode: DrawMode,
    pub highest_win_rate: Option<PlayerPolicy>,
    pub highest_loss_rate: Option<PlayerPolicy>,
    pub highest_draw_rate: Option<PlayerPolicy>,
}

/// Final results of a run: every simulation's summary in the order the simulations were added, plus the best
/// policies for each draw mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub seed: u64,
    pub iterations: u64,
    pub summaries: Vec<SimulationSummary>,
    pub best: Vec<BestPolicies>,
}

/// Policy in `mode` with the greatest `rate`, the lowest policy number winning a tie.
fn best_by<F>(summaries: &[SimulationSummary], mode: DrawMode, rate: F) -> Option<PlayerPolicy>
where
    F: Fn(&SimulationSummary) -> f64,
{
    summaries
        .iter()
        .filter(|summary| summary.mode == mode)
        .fold(None, |best: Option<&SimulationSummary>, summary| match best {
            Some(b)
                if rate(b) > rate(summary)
                    || (rate(b) == rate(summary)
                        && b.policy.number() < summary.policy.number()) =>
            {
                Some(b)
            }
            _ => Some(summary),
        })
        .map(|summary| summary.policy)
}

impl Report {
    pub fn new<I>(seed: u64, iterations: u64, summaries: I) -> Report
    where
        I: IntoIterator<Item = SimulationSummary>,
    {
        let summaries: Vec<SimulationSummary> = summaries.into_iter().collect();
        let mut modes: Vec<DrawMode> = Vec::new();
        for summary in &summaries {
            if !modes.contains(&summary.mode) {
                modes.push(summary.mode);
            }
        }
        let best = modes
            .into_iter()
            .map(|mode| BestPolicies {
                mode,
                highest_win_rate: best_by(&summaries, mode, SimulationSummary::win_rate),
                highest_loss_rate: best_by(&summaries, mode, SimulationSummary::loss_rate),
                highest_draw_rate: best_by(&summaries, mode, SimulationSummary::draw_rate),
            })
            .collect();

        Report {
            seed,
            iterations,
            summaries,
            best,
        }
    }

    /// Looks up the summary of `policy` played in `mode`.
    pub fn summary(&self, policy: PlayerPolicy, mode: DrawMode) -> Option<&SimulationSummary> {
        self.summaries
            .iter()
            .find(|summary| summary.policy == policy && summary.mode == mode)
    }

    /// Method for writing the report to `writer` in the chosen `format`.
    pub fn write<W: Write>(&self, format: ReportFormat, writer: W) -> Result<(), SimulationError> {
        match format {
            ReportFormat::Table => write_table(self, writer),
            ReportFormat::Json => write_json(self, writer),
        }
    }
}

fn policy_cell(policy: Option<PlayerPolicy>) -> String {
    match policy {
        Some(p) => format!("policy {} ({})", p.number(), p.name()),
        None => String::from("-"),
    }
}

/// Writes every summary as an aligned text block followed by the best policies for each draw mode.
pub fn write_table<W: Write>(report: &Report, mut writer: W) -> Result<(), SimulationError> {
    writeln!(
        writer,
        "{:-^WIDTH$}",
        format!(" seed {}, {} games per simulation ", report.seed, report.iterations)
    )?;
    for (i, summary) in report.summaries.iter().enumerate() {
        let sim_num = format!(" simulation #{} ", i + 1);
        write!(writer, "{:-^WIDTH$}\n{}", sim_num, summary)?;
    }
    for best in &report.best {
        writeln!(writer, "{:-^WIDTH$}", format!(" best policies, {} ", best.mode))?;
        for (text, policy) in [
            ("highest win rate", best.highest_win_rate),
            ("highest loss rate", best.highest_loss_rate),
            ("highest draw rate", best.highest_draw_rate),
        ] {
            writeln!(
                writer,
                "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
                format!("{} ({})", text, best.mode),
                policy_cell(policy)
            )?;
        }
    }
    writeln!(writer, "{}", "-".repeat(WIDTH))?;
    writer.flush()?;
    Ok(())
}

/// Writes the report as pretty printed JSON.
pub fn write_json<W: Write>(report: &Report, mut writer: W) -> Result<(), SimulationError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
