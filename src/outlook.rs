use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{ProjectionError, Result};
use crate::projection::{PreparedSeason, ProjectionConfig, ProjectionInput};
use crate::records::RankedRow;

/// How one team finished across many simulated seasons.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamOutlook {
    pub team: String,
    pub mean_points: f64,
    pub mean_rank: f64,
    pub best_rank: usize,
    pub worst_rank: usize,
    pub title_probability: f64,

    /// Entry `i` is the share of runs finishing in position `i + 1`
    pub position_probabilities: Vec<f64>,
}

/// Aggregate of many independent projections of the same remaining schedule.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonOutlook {
    pub runs: usize,

    /// Highest mean points first
    pub teams: Vec<TeamOutlook>,

    /// Warnings depend only on the inputs, so they are reported once
    pub warnings: Vec<Warning>,
}

impl SeasonOutlook {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn team(&self, name: &str) -> Option<&TeamOutlook> {
        self.teams.iter().find(|t| t.team == name)
    }
}

#[derive(Clone, Debug)]
struct Tally {
    points: i64,
    ranks: usize,
    best: usize,
    worst: usize,
    positions: Vec<usize>,
}

impl Tally {
    fn new(team_count: usize) -> Self {
        Tally {
            points: 0,
            ranks: 0,
            best: usize::MAX,
            worst: 0,
            positions: vec![0; team_count],
        }
    }

    fn add(&mut self, ranked: &RankedRow) {
        self.points += ranked.row.points as i64;
        self.ranks += ranked.rank;
        self.best = self.best.min(ranked.rank);
        self.worst = self.worst.max(ranked.rank);
        self.positions[ranked.rank - 1] += 1;
    }
}

/// Fit once, then simulate the remaining schedule `runs` times in parallel.
///
/// Each run gets its own generator seeded from a master generator, so a
/// fixed config seed gives the same outlook regardless of thread count.
///
/// # Arguments
/// * `input` - Historical results, current standings and remaining fixtures
/// * `config` - Master seed, team aliases and fit settings
/// * `runs` - Number of simulated seasons (at least 1)
///
/// # Returns
/// Per-team finishing statistics, highest mean points first, plus the
/// warnings of a single run
pub fn project_outlook(input: ProjectionInput, config: &ProjectionConfig, runs: usize) -> Result<SeasonOutlook> {
    if runs == 0 {
        return Err(ProjectionError::validation("number of runs must be at least 1"));
    }

    let season = PreparedSeason::prepare(input, config)?;

    let mut master = config.rng();
    let seeds: Vec<u64> = (0..runs).map(|_| master.gen::<u64>()).collect();

    let mut tables: Vec<(Vec<RankedRow>, Diagnostics)> = seeds
        .par_iter()
        .enumerate()
        .map(|(i, &seed)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let diagnostics = if i == 0 {
                Diagnostics::new()
            } else {
                Diagnostics::quiet()
            };
            let run = season.simulate_with(&mut rng, diagnostics);
            (run.table, run.diagnostics)
        })
        .collect();

    let warnings = tables
        .first_mut()
        .map(|(_, diagnostics)| std::mem::take(diagnostics).into_warnings())
        .unwrap_or_default();

    let teams = season.teams();
    let team_count = teams.len();
    let mut tallies: HashMap<&str, Tally> = teams
        .iter()
        .map(|&team| (team, Tally::new(team_count)))
        .collect();

    for (table, _) in &tables {
        for ranked in table {
            if let Some(tally) = tallies.get_mut(ranked.row.team.as_str()) {
                tally.add(ranked);
            }
        }
    }

    let n = runs as f64;
    let mut outlook: Vec<TeamOutlook> = teams
        .iter()
        .filter_map(|&team| {
            let tally = tallies.get(team)?;
            Some(TeamOutlook {
                team: team.to_string(),
                mean_points: tally.points as f64 / n,
                mean_rank: tally.ranks as f64 / n,
                best_rank: tally.best,
                worst_rank: tally.worst,
                title_probability: tally.positions.first().copied().unwrap_or(0) as f64 / n,
                position_probabilities: tally.positions.iter().map(|&c| c as f64 / n).collect(),
            })
        })
        .collect();

    outlook.sort_by(|a, b| {
        b.mean_points
            .total_cmp(&a.mean_points)
            .then(a.mean_rank.total_cmp(&b.mean_rank))
    });

    log::info!("Aggregated {} simulated seasons for {} teams", runs, team_count);

    Ok(SeasonOutlook {
        runs,
        teams: outlook,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FixtureRecord, MatchRecord, StandingsRow};

    fn make_input() -> ProjectionInput {
        let mut matches = Vec::new();
        for _ in 0..4 {
            matches.push(MatchRecord::new("Leeds", "Hull", 3, 0));
            matches.push(MatchRecord::new("Hull", "Leeds", 0, 2));
            matches.push(MatchRecord::new("Leeds", "Stoke", 2, 1));
            matches.push(MatchRecord::new("Stoke", "Leeds", 1, 1));
            matches.push(MatchRecord::new("Hull", "Stoke", 1, 1));
            matches.push(MatchRecord::new("Stoke", "Hull", 2, 1));
        }

        let mut standings = vec![
            StandingsRow::empty("Leeds"),
            StandingsRow::empty("Hull"),
            StandingsRow::empty("Stoke"),
        ];
        standings[0].points = 10;
        standings[0].won = 3;
        standings[0].drawn = 1;

        let fixtures = vec![
            FixtureRecord::new("Leeds", "Hull"),
            FixtureRecord::new("Hull", "Stoke"),
            FixtureRecord::new("Stoke", "Leeds"),
        ];

        ProjectionInput::new(matches, standings, fixtures)
    }

    #[test]
    fn test_zero_runs_rejected() {
        let err = project_outlook(make_input(), &ProjectionConfig::with_seed(1), 0).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let outlook = project_outlook(make_input(), &ProjectionConfig::with_seed(8), 500).unwrap();
        assert_eq!(outlook.runs, 500);
        assert_eq!(outlook.teams.len(), 3);

        let titles: f64 = outlook.teams.iter().map(|t| t.title_probability).sum();
        assert!((titles - 1.0).abs() < 1e-9);

        for team in &outlook.teams {
            let total: f64 = team.position_probabilities.iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
            assert!(team.best_rank <= team.worst_rank);
            assert!(team.mean_rank >= 1.0 && team.mean_rank <= 3.0);
        }
    }

    #[test]
    fn test_leader_favoured() {
        let outlook = project_outlook(make_input(), &ProjectionConfig::with_seed(8), 500).unwrap();

        assert_eq!(outlook.teams[0].team, "Leeds");
        let leeds = outlook.team("Leeds").unwrap();
        // a 10 point lead with three fixtures left cannot be overturned
        assert_eq!(leeds.title_probability, 1.0);
        assert!(leeds.mean_points >= 10.0);
    }

    #[test]
    fn test_outlook_deterministic_with_seed() {
        let first = project_outlook(make_input(), &ProjectionConfig::with_seed(21), 200).unwrap();
        let second = project_outlook(make_input(), &ProjectionConfig::with_seed(21), 200).unwrap();
        assert_eq!(first.teams, second.teams);
    }

    #[test]
    fn test_warnings_reported_once() {
        let mut input = make_input();
        input.fixtures.push(FixtureRecord::new("Leeds", "Barnsley"));

        let outlook = project_outlook(input, &ProjectionConfig::with_seed(3), 50).unwrap();
        // two fallback rates plus the skipped ledger update
        assert_eq!(outlook.warnings.len(), 3);
    }
}
