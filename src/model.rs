use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::constants::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, MAX_ABS_LINEAR_PREDICTOR, MIN_TRAINING_TEAMS,
    SINGULAR_VALUE_CUTOFF,
};
use crate::diagnostics::UnseenTeam;
use crate::error::{ProjectionError, Result};
use crate::records::{MatchRecord, Side};

/// IRLS settings for fitting the scoring-rate regressions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitOptions {
    pub max_iterations: usize,

    /// Absolute change in deviance that counts as converged
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Mean goals per match across the training corpus, used as fallback rates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueAverages {
    pub home_goals: f64,
    pub away_goals: f64,
}

impl LeagueAverages {
    /// Arithmetic means of home and away goals; `None` for an empty corpus.
    pub fn from_matches(matches: &[MatchRecord]) -> Option<Self> {
        if matches.is_empty() {
            return None;
        }
        let n = matches.len() as f64;
        let home: u64 = matches.iter().map(|m| m.home_goals as u64).sum();
        let away: u64 = matches.iter().map(|m| m.away_goals as u64).sum();

        Some(LeagueAverages {
            home_goals: home as f64 / n,
            away_goals: away as f64 / n,
        })
    }

    pub fn rate(&self, side: Side) -> f64 {
        match side {
            Side::Home => self.home_goals,
            Side::Away => self.away_goals,
        }
    }
}

/// Expected goals for one side of a pairing, or why there is none.
#[derive(Clone, Debug, PartialEq)]
pub enum RateEstimate {
    Available(f64),

    /// Lists the teams without training history on the side they need it.
    /// Empty when the fitted value itself was not finite.
    Unavailable(Vec<UnseenTeam>),
}

impl RateEstimate {
    pub fn rate(&self) -> Option<f64> {
        match self {
            RateEstimate::Available(rate) => Some(*rate),
            RateEstimate::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, RateEstimate::Available(_))
    }
}

/// Predicted scoring rates for a home/away pairing.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchRates {
    pub home: RateEstimate,
    pub away: RateEstimate,
}

impl MatchRates {
    pub fn get(&self, side: Side) -> &RateEstimate {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// Categorical levels of one team column, sorted; the first is the baseline.
#[derive(Clone, Debug)]
struct Levels {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Levels {
    fn from_names<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let sorted: BTreeSet<&str> = names.collect();
        let names: Vec<String> = sorted.into_iter().map(str::to_string).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Levels { names, index }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of indicator columns under treatment coding
    fn indicator_count(&self) -> usize {
        self.names.len().saturating_sub(1)
    }
}

/// One fitted log-linear Poisson regression.
#[derive(Clone, Debug)]
pub struct PoissonRegression {
    coefficients: DVector<f64>,
    deviance: f64,
    iterations: usize,
    converged: bool,
}

impl PoissonRegression {
    /// Fit by iteratively reweighted least squares.
    ///
    /// A rank-deficient design is solved with the pseudo-inverse, so the
    /// minimum-norm coefficients are returned rather than an error.
    pub fn fit(design: &DMatrix<f64>, response: &DVector<f64>, options: &FitOptions) -> Result<Self> {
        let n = response.len();
        let p = design.ncols();
        let mean = response.mean();
        if !(mean > 0.0) {
            return Err(ProjectionError::model_fit(
                "response has no positive counts; log rate is undefined",
            ));
        }

        let mut mu = response.map(|y| (y + mean) / 2.0);
        let mut eta = mu.map(f64::ln);
        let mut deviance = poisson_deviance(response, &mu);
        let mut coefficients = DVector::<f64>::zeros(p);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < options.max_iterations {
            iterations += 1;

            let working = DVector::from_iterator(
                n,
                (0..n).map(|i| eta[i] + (response[i] - mu[i]) / mu[i]),
            );
            let sqrt_weights = mu.map(f64::sqrt);
            let weighted_design = DMatrix::from_fn(n, p, |i, j| design[(i, j)] * sqrt_weights[i]);
            let weighted_working = working.component_mul(&sqrt_weights);

            coefficients = solve_least_squares(weighted_design, &weighted_working)?;

            eta = (design * &coefficients)
                .map(|v| v.clamp(-MAX_ABS_LINEAR_PREDICTOR, MAX_ABS_LINEAR_PREDICTOR));
            mu = eta.map(f64::exp);

            let new_deviance = poisson_deviance(response, &mu);
            let change = (new_deviance - deviance).abs();
            deviance = new_deviance;
            if change <= options.tolerance {
                converged = true;
                break;
            }
        }

        if coefficients.iter().any(|c| !c.is_finite()) || !deviance.is_finite() {
            return Err(ProjectionError::model_fit(
                "regression produced non-finite coefficients",
            ));
        }
        if !converged {
            log::warn!(
                "IRLS did not converge after {} iterations (deviance {:.6})",
                iterations,
                deviance
            );
        }

        Ok(PoissonRegression {
            coefficients,
            deviance,
            iterations,
            converged,
        })
    }

    /// Expected count for one design row.
    pub fn predict(&self, row: &DVector<f64>) -> f64 {
        row.dot(&self.coefficients).exp()
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    pub fn deviance(&self) -> f64 {
        self.deviance
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

fn solve_least_squares(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let svd = a.svd(true, true);
    let largest = svd.singular_values.max();
    let eps = (largest * SINGULAR_VALUE_CUTOFF).max(0.0);

    svd.solve(b, eps)
        .map_err(|e| ProjectionError::model_fit(format!("least squares solve failed: {}", e)))
}

/// Poisson deviance; a zero count contributes `2 * mu`.
fn poisson_deviance(response: &DVector<f64>, mu: &DVector<f64>) -> f64 {
    response
        .iter()
        .zip(mu.iter())
        .map(|(&y, &m)| {
            let log_term = if y > 0.0 { y * (y / m).ln() } else { 0.0 };
            2.0 * (log_term - (y - m))
        })
        .sum()
}

/// Two independent scoring-rate regressions, one per goal column.
///
/// Both use the home team and the away team as categorical predictors:
/// `log(rate) = intercept + home_effect[home] + away_effect[away]`.
#[derive(Clone, Debug)]
pub struct ScoringModel {
    home_levels: Levels,
    away_levels: Levels,
    home_goals: PoissonRegression,
    away_goals: PoissonRegression,
    averages: LeagueAverages,
}

impl ScoringModel {
    /// Fit both regressions over the training corpus.
    ///
    /// # Arguments
    /// * `matches` - Historical results with team names already normalized
    /// * `options` - IRLS iteration limit and deviance tolerance
    ///
    /// # Returns
    /// The fitted model, or a `ModelFitError` for an empty corpus, fewer than
    /// two teams, a goal column without goals, or non-finite coefficients
    pub fn fit(matches: &[MatchRecord], options: &FitOptions) -> Result<Self> {
        let averages = LeagueAverages::from_matches(matches)
            .ok_or_else(|| ProjectionError::model_fit("training corpus is empty"))?;

        let teams = training_teams(matches);
        if teams.len() < MIN_TRAINING_TEAMS {
            return Err(ProjectionError::model_fit(format!(
                "training corpus names {} distinct team(s); at least {} are required",
                teams.len(),
                MIN_TRAINING_TEAMS
            )));
        }

        let home_levels = Levels::from_names(matches.iter().map(|m| m.home_team.as_str()));
        let away_levels = Levels::from_names(matches.iter().map(|m| m.away_team.as_str()));

        let n = matches.len();
        let p = 1 + home_levels.indicator_count() + away_levels.indicator_count();
        let mut design = DMatrix::<f64>::zeros(n, p);
        for (i, m) in matches.iter().enumerate() {
            // Every training team is a known level of its own column
            let h = home_levels.position(&m.home_team).unwrap_or(0);
            let a = away_levels.position(&m.away_team).unwrap_or(0);
            design.set_row(i, &design_row(&home_levels, &away_levels, h, a).transpose());
        }

        let home_response = DVector::from_iterator(n, matches.iter().map(|m| m.home_goals as f64));
        let away_response = DVector::from_iterator(n, matches.iter().map(|m| m.away_goals as f64));

        let home_goals = PoissonRegression::fit(&design, &home_response, options)
            .map_err(|e| context(e, "home goals"))?;
        let away_goals = PoissonRegression::fit(&design, &away_response, options)
            .map_err(|e| context(e, "away goals"))?;

        log::info!(
            "Fitted scoring model on {} matches, {} teams ({} parameters)",
            n,
            teams.len(),
            p
        );
        log::debug!(
            "Home goals model: {} iterations, deviance {:.4}",
            home_goals.iterations(),
            home_goals.deviance()
        );
        log::debug!(
            "Away goals model: {} iterations, deviance {:.4}",
            away_goals.iterations(),
            away_goals.deviance()
        );
        log::info!(
            "League averages: {:.3} home goals, {:.3} away goals",
            averages.home_goals,
            averages.away_goals
        );

        Ok(ScoringModel {
            home_levels,
            away_levels,
            home_goals,
            away_goals,
            averages,
        })
    }

    /// Expected goals for both sides of a pairing.
    ///
    /// # Returns
    /// A `RateEstimate` per side; `Unavailable` lists the unseen teams
    ///
    /// Both regressions need the home team's home effect and the away team's
    /// away effect, so a team unseen on its side makes both rates unavailable.
    pub fn predict(&self, home_team: &str, away_team: &str) -> MatchRates {
        let home_position = self.home_levels.position(home_team);
        let away_position = self.away_levels.position(away_team);

        let (h, a) = match (home_position, away_position) {
            (Some(h), Some(a)) => (h, a),
            _ => {
                let mut unseen = Vec::new();
                if home_position.is_none() {
                    unseen.push(UnseenTeam {
                        team: home_team.to_string(),
                        side: Side::Home,
                    });
                }
                if away_position.is_none() {
                    unseen.push(UnseenTeam {
                        team: away_team.to_string(),
                        side: Side::Away,
                    });
                }
                return MatchRates {
                    home: RateEstimate::Unavailable(unseen.clone()),
                    away: RateEstimate::Unavailable(unseen),
                };
            }
        };

        let row = design_row(&self.home_levels, &self.away_levels, h, a);

        MatchRates {
            home: finite_rate(self.home_goals.predict(&row)),
            away: finite_rate(self.away_goals.predict(&row)),
        }
    }

    pub fn averages(&self) -> LeagueAverages {
        self.averages
    }

    /// Every team named in the training corpus, sorted.
    pub fn teams(&self) -> Vec<String> {
        let all: BTreeSet<&String> = self
            .home_levels
            .names
            .iter()
            .chain(self.away_levels.names.iter())
            .collect();
        all.into_iter().cloned().collect()
    }

    pub fn knows(&self, team: &str, side: Side) -> bool {
        match side {
            Side::Home => self.home_levels.position(team).is_some(),
            Side::Away => self.away_levels.position(team).is_some(),
        }
    }

    pub fn home_goals_regression(&self) -> &PoissonRegression {
        &self.home_goals
    }

    pub fn away_goals_regression(&self) -> &PoissonRegression {
        &self.away_goals
    }
}

/// Treatment-coded row: intercept, home indicators, then away indicators.
fn design_row(home_levels: &Levels, away_levels: &Levels, home: usize, away: usize) -> DVector<f64> {
    let home_columns = home_levels.indicator_count();
    let mut row = DVector::<f64>::zeros(1 + home_columns + away_levels.indicator_count());
    row[0] = 1.0;
    if home > 0 {
        row[home] = 1.0;
    }
    if away > 0 {
        row[home_columns + away] = 1.0;
    }
    row
}

fn finite_rate(rate: f64) -> RateEstimate {
    if rate.is_finite() {
        RateEstimate::Available(rate)
    } else {
        RateEstimate::Unavailable(Vec::new())
    }
}

fn training_teams(matches: &[MatchRecord]) -> BTreeSet<&str> {
    matches
        .iter()
        .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
        .collect()
}

fn context(err: ProjectionError, target: &str) -> ProjectionError {
    match err {
        ProjectionError::ModelFit(msg) => ProjectionError::ModelFit(format!("{}: {}", target, msg)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Double round-robin of four teams with no scoreless side per team.
    fn round_robin() -> Vec<MatchRecord> {
        let teams = ["Arsenal", "Brentford", "Chelsea", "Everton"];
        let goals = [3, 1, 2, 2, 1, 4, 0, 2, 1, 3, 2, 1];
        let mut matches = Vec::new();
        let mut k = 0;
        for home in teams {
            for away in teams {
                if home == away {
                    continue;
                }
                let hg = goals[k % goals.len()];
                let ag = goals[(k + 5) % goals.len()];
                matches.push(MatchRecord::new(home, away, hg, ag));
                k += 1;
            }
        }
        // second leg with different scores so every level has goals both ways
        let legs = matches.clone();
        for m in legs {
            matches.push(MatchRecord::new(&m.home_team, &m.away_team, m.away_goals + 1, m.home_goals));
        }
        matches
    }

    fn example_corpus() -> Vec<MatchRecord> {
        vec![
            MatchRecord::new("A", "B", 2, 1),
            MatchRecord::new("B", "A", 0, 3),
            MatchRecord::new("A", "C", 1, 1),
        ]
    }

    #[test]
    fn test_league_averages() {
        let averages = LeagueAverages::from_matches(&example_corpus()).unwrap();
        assert!((averages.home_goals - 1.0).abs() < 1e-12);
        assert!((averages.away_goals - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(averages.rate(Side::Home), averages.home_goals);
    }

    #[test]
    fn test_empty_corpus_fails() {
        let err = ScoringModel::fit(&[], &FitOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "ModelFitError");
    }

    #[test]
    fn test_single_team_corpus_fails() {
        let matches = vec![MatchRecord::new("A", "A", 1, 0)];
        let err = ScoringModel::fit(&matches, &FitOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "ModelFitError");
    }

    #[test]
    fn test_scoreless_away_column_fails() {
        let matches = vec![
            MatchRecord::new("A", "B", 2, 0),
            MatchRecord::new("B", "A", 1, 0),
        ];
        let err = ScoringModel::fit(&matches, &FitOptions::default()).unwrap_err();
        assert!(err.to_string().contains("away goals"));
    }

    #[test]
    fn test_fitted_rates_match_observed_totals() {
        // With a log link and an intercept, the MLE reproduces the observed
        // goal totals for every home level.
        let matches = round_robin();
        let model = ScoringModel::fit(&matches, &FitOptions::default()).unwrap();
        assert!(model.home_goals_regression().converged());
        assert!(model.away_goals_regression().converged());

        for team in model.teams() {
            let rows: Vec<&MatchRecord> = matches.iter().filter(|m| m.home_team == team).collect();
            let observed: f64 = rows.iter().map(|m| m.home_goals as f64).sum();
            let fitted: f64 = rows
                .iter()
                .map(|m| model.predict(&m.home_team, &m.away_team).home.rate().unwrap())
                .sum();
            assert!(
                (observed - fitted).abs() < 1e-4,
                "{}: observed {} fitted {}",
                team,
                observed,
                fitted
            );
        }

        let total_away: f64 = matches.iter().map(|m| m.away_goals as f64).sum();
        let fitted_away: f64 = matches
            .iter()
            .map(|m| model.predict(&m.home_team, &m.away_team).away.rate().unwrap())
            .sum();
        assert!((total_away - fitted_away).abs() < 1e-4);
    }

    #[test]
    fn test_small_rank_deficient_corpus_still_fits() {
        let model = ScoringModel::fit(&example_corpus(), &FitOptions::default()).unwrap();
        let rates = model.predict("A", "C");

        let home = rates.home.rate().unwrap();
        let away = rates.away.rate().unwrap();
        assert!(home.is_finite() && home > 0.0);
        assert!(away.is_finite() && away > 0.0);
        assert_eq!(model.teams(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_unseen_home_side_is_unavailable() {
        let model = ScoringModel::fit(&example_corpus(), &FitOptions::default()).unwrap();

        // C only ever played away
        assert!(!model.knows("C", Side::Home));
        let rates = model.predict("C", "A");
        let expected = vec![UnseenTeam {
            team: "C".to_string(),
            side: Side::Home,
        }];
        assert_eq!(rates.home, RateEstimate::Unavailable(expected.clone()));
        assert_eq!(rates.away, RateEstimate::Unavailable(expected));
    }

    #[test]
    fn test_unknown_teams_listed_per_side() {
        let model = ScoringModel::fit(&example_corpus(), &FitOptions::default()).unwrap();
        let rates = model.predict("Z", "Y");

        match rates.get(Side::Away) {
            RateEstimate::Unavailable(unseen) => {
                assert_eq!(unseen.len(), 2);
                assert_eq!(unseen[0].side, Side::Home);
                assert_eq!(unseen[1].team, "Y");
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_stronger_attack_gets_higher_rate() {
        let mut matches = Vec::new();
        for _ in 0..5 {
            matches.push(MatchRecord::new("Strong", "Weak", 4, 1));
            matches.push(MatchRecord::new("Weak", "Strong", 1, 3));
            matches.push(MatchRecord::new("Strong", "Mid", 3, 1));
            matches.push(MatchRecord::new("Mid", "Strong", 1, 2));
            matches.push(MatchRecord::new("Weak", "Mid", 1, 2));
            matches.push(MatchRecord::new("Mid", "Weak", 2, 1));
        }
        let model = ScoringModel::fit(&matches, &FitOptions::default()).unwrap();

        let strong_home = model.predict("Strong", "Weak").home.rate().unwrap();
        let weak_home = model.predict("Weak", "Strong").home.rate().unwrap();
        assert!(strong_home > weak_home);
    }
}
