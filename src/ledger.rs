use std::collections::HashMap;

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{ProjectionError, Result};
use crate::records::{Outcome, SimulatedResult, StandingsRow};

/// Live league table for one projection, keyed by team id.
///
/// Rows keep the order they were loaded in; that order breaks exact ties
/// when the table is ranked.
#[derive(Clone, Debug, Default)]
pub struct StandingsLedger {
    rows: Vec<StandingsRow>,
    index: HashMap<String, usize>,
}

impl StandingsLedger {
    /// Build a ledger from the current table; team ids must be unique.
    pub fn new(rows: Vec<StandingsRow>) -> Result<Self> {
        let mut index = HashMap::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            if index.insert(row.team.clone(), i).is_some() {
                return Err(ProjectionError::validation(format!(
                    "duplicate team '{}' in standings",
                    row.team
                )));
            }
            if row.goal_difference != row.computed_goal_difference() {
                log::warn!(
                    "{}: GD {} does not match F - A = {}",
                    row.team,
                    row.goal_difference,
                    row.computed_goal_difference()
                );
            }
        }

        Ok(StandingsLedger { rows, index })
    }

    pub fn get(&self, team: &str) -> Option<&StandingsRow> {
        self.index.get(team).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, team: &str) -> bool {
        self.index.contains_key(team)
    }

    pub fn rows(&self) -> &[StandingsRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<StandingsRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Record one match result for both teams.
    ///
    /// If either team is missing the ledger is left untouched and a warning
    /// is recorded; otherwise both rows are updated. Returns the home side's
    /// outcome when the result was applied.
    pub fn apply(
        &mut self,
        home_team: &str,
        away_team: &str,
        home_goals: u32,
        away_goals: u32,
        diagnostics: &mut Diagnostics,
    ) -> Option<Outcome> {
        let (home, away) = match (self.index.get(home_team), self.index.get(away_team)) {
            (Some(&h), Some(&a)) => (h, a),
            (h, a) => {
                let mut missing = Vec::new();
                if h.is_none() {
                    missing.push(home_team.to_string());
                }
                if a.is_none() {
                    missing.push(away_team.to_string());
                }
                diagnostics.push(Warning::TeamNotInStandings {
                    home_team: home_team.to_string(),
                    away_team: away_team.to_string(),
                    missing,
                });
                return None;
            }
        };

        let outcome = self.rows[home].record(home_goals, away_goals);
        self.rows[away].record(away_goals, home_goals);
        Some(outcome)
    }

    pub fn apply_result(&mut self, result: &SimulatedResult, diagnostics: &mut Diagnostics) -> Option<Outcome> {
        self.apply(
            &result.home_team,
            &result.away_team,
            result.home_goals,
            result.away_goals,
            diagnostics,
        )
    }
}
