use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::SUCCESS_MESSAGE;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{ProjectionError, Result};
use crate::ledger::StandingsLedger;
use crate::model::{FitOptions, LeagueAverages, ScoringModel};
use crate::names::TeamNameMap;
use crate::ranking::rank;
use crate::records::{FixtureRecord, MatchRecord, RankedRow, SimulatedResult, StandingsRow};
use crate::simulator::simulate_fixture;
use crate::tables::{self, Record};

/// Settings for one projection request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionConfig {
    /// Fixed seed for reproducible runs; `None` draws one from the OS
    pub seed: Option<u64>,

    pub aliases: TeamNameMap,

    /// Extra `variant,canonical` lines read on top of `aliases`
    pub aliases_file: Option<PathBuf>,

    pub fit: FitOptions,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            seed: None,
            aliases: TeamNameMap::with_defaults(),
            aliases_file: None,
            fit: FitOptions::default(),
        }
    }
}

impl ProjectionConfig {
    pub fn with_seed(seed: u64) -> Self {
        ProjectionConfig {
            seed: Some(seed),
            ..ProjectionConfig::default()
        }
    }

    /// The alias map to normalize with, including any alias file entries.
    pub fn team_names(&self) -> Result<TeamNameMap> {
        let mut names = self.aliases.clone();
        if let Some(path) = &self.aliases_file {
            names.read_from_file(path)?;
            log::info!("Loaded team aliases from {}", path.display());
        }
        Ok(names)
    }

    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

/// The three tables a projection works from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub matches: Vec<MatchRecord>,
    pub standings: Vec<StandingsRow>,
    pub fixtures: Vec<FixtureRecord>,
}

impl ProjectionInput {
    pub fn new(matches: Vec<MatchRecord>, standings: Vec<StandingsRow>, fixtures: Vec<FixtureRecord>) -> Self {
        ProjectionInput {
            matches,
            standings,
            fixtures,
        }
    }

    /// Convert column-keyed tables into typed records.
    pub fn from_records(matches: &[Record], standings: &[Record], fixtures: &[Record]) -> Result<Self> {
        Ok(ProjectionInput {
            standings: tables::parse_standings(standings)?,
            fixtures: tables::parse_fixtures(fixtures)?,
            matches: tables::parse_matches(matches)?,
        })
    }

    /// Convert record-oriented JSON tables into typed records.
    pub fn from_json(matches: &str, standings: &str, fixtures: &str) -> Result<Self> {
        let matches = tables::records_from_json(matches, "historical results")?;
        let standings = tables::records_from_json(standings, "standings")?;
        let fixtures = tables::records_from_json(fixtures, "fixtures")?;
        ProjectionInput::from_records(&matches, &standings, &fixtures)
    }

    /// Apply the alias map to every team column of every table.
    pub fn normalized(mut self, names: &TeamNameMap) -> Self {
        if names.is_empty() {
            return self;
        }
        for m in &mut self.matches {
            m.home_team = names.normalize(&m.home_team);
            m.away_team = names.normalize(&m.away_team);
        }
        for f in &mut self.fixtures {
            f.home_team = names.normalize(&f.home_team);
            f.away_team = names.normalize(&f.away_team);
        }
        for row in &mut self.standings {
            row.team = names.normalize(&row.team);
        }
        self
    }
}

/// One simulated run of the remaining schedule.
#[derive(Clone, Debug)]
pub struct SeasonRun {
    pub results: Vec<SimulatedResult>,
    pub table: Vec<RankedRow>,
    pub diagnostics: Diagnostics,
}

/// Validated inputs plus a fitted model, ready to simulate any number of times.
#[derive(Clone, Debug)]
pub struct PreparedSeason {
    model: ScoringModel,
    averages: LeagueAverages,
    fixtures: Vec<FixtureRecord>,
    ledger: StandingsLedger,
}

impl PreparedSeason {
    /// Normalize and validate the tables, then fit the scoring model.
    pub fn prepare(input: ProjectionInput, config: &ProjectionConfig) -> Result<Self> {
        let input = input.normalized(&config.team_names()?);
        log::info!(
            "Projecting from {} historical matches, {} standings rows, {} fixtures",
            input.matches.len(),
            input.standings.len(),
            input.fixtures.len()
        );

        if let Some(f) = input.fixtures.iter().find(|f| f.home_team == f.away_team) {
            return Err(ProjectionError::validation(format!(
                "fixture lists '{}' as both home and away team",
                f.home_team
            )));
        }
        let ledger = StandingsLedger::new(input.standings)?;

        let model = ScoringModel::fit(&input.matches, &config.fit)?;
        log::debug!("Teams in training data: {:?}", model.teams());
        let averages = model.averages();

        Ok(PreparedSeason {
            model,
            averages,
            fixtures: input.fixtures,
            ledger,
        })
    }

    /// Simulate every fixture in order against a fresh copy of the table.
    pub fn simulate<R: Rng>(&self, rng: &mut R) -> SeasonRun {
        self.simulate_with(rng, Diagnostics::new())
    }

    pub fn simulate_with<R: Rng>(&self, rng: &mut R, mut diagnostics: Diagnostics) -> SeasonRun {
        let mut ledger = self.ledger.clone();
        let mut results = Vec::with_capacity(self.fixtures.len());

        for fixture in &self.fixtures {
            let result = simulate_fixture(fixture, &self.model, &self.averages, rng, &mut diagnostics);
            ledger.apply_result(&result, &mut diagnostics);
            results.push(result);
        }

        SeasonRun {
            results,
            table: rank(&ledger),
            diagnostics,
        }
    }

    pub fn model(&self) -> &ScoringModel {
        &self.model
    }

    pub fn fixtures(&self) -> &[FixtureRecord] {
        &self.fixtures
    }

    /// Teams in the standings, in table input order.
    pub fn teams(&self) -> Vec<&str> {
        self.ledger.rows().iter().map(|r| r.team.as_str()).collect()
    }
}

/// Outcome of a projection request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// One per fixture, in fixture order
    pub simulated_results: Vec<SimulatedResult>,

    pub predicted_standings: Vec<RankedRow>,

    pub warnings: Vec<Warning>,

    pub message: String,
}

impl Projection {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<SeasonRun> for Projection {
    fn from(run: SeasonRun) -> Self {
        Projection {
            simulated_results: run.results,
            predicted_standings: run.table,
            warnings: run.diagnostics.into_warnings(),
            message: SUCCESS_MESSAGE.to_string(),
        }
    }
}

/// Fit, simulate and rank, drawing randomness from the configured seed.
///
/// Team names are normalized, the standings and fixtures validated, and the
/// scoring model fitted before any fixture is simulated.
///
/// # Arguments
/// * `input` - Historical results, current standings and remaining fixtures
/// * `config` - Seed, team aliases and fit settings
///
/// # Returns
/// Simulated results in fixture order, the ranked final table and any
/// warnings, or a `ValidationError` / `ModelFitError`
pub fn project(input: ProjectionInput, config: &ProjectionConfig) -> Result<Projection> {
    let mut rng = config.rng();
    project_with_rng(input, config, &mut rng)
}

/// As [`project`], with a caller-supplied generator.
///
/// # Arguments
/// * `input` - Historical results, current standings and remaining fixtures
/// * `config` - Team aliases and fit settings; the seed is ignored
/// * `rng` - Source of every Poisson draw, home goals before away goals
///
/// # Returns
/// The same response as [`project`]
pub fn project_with_rng<R: Rng>(input: ProjectionInput, config: &ProjectionConfig, rng: &mut R) -> Result<Projection> {
    let season = PreparedSeason::prepare(input, config)?;
    let run = season.simulate(rng);
    log::info!(
        "Simulated {} fixtures with {} warning(s)",
        run.results.len(),
        run.diagnostics.len()
    );
    Ok(Projection::from(run))
}
