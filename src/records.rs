use serde::{Deserialize, Serialize};

use crate::constants::{POINTS_FOR_DRAW, POINTS_FOR_WIN};

/// A completed historical match, used as training data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "HomeTeam")]
    pub home_team: String,

    #[serde(rename = "AwayTeam")]
    pub away_team: String,

    /// Full-time home goals
    #[serde(rename = "FTHG")]
    pub home_goals: u32,

    /// Full-time away goals
    #[serde(rename = "FTAG")]
    pub away_goals: u32,
}

impl MatchRecord {
    pub fn new(home_team: &str, away_team: &str, home_goals: u32, away_goals: u32) -> Self {
        MatchRecord {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals,
            away_goals,
        }
    }
}

/// A scheduled match that has not been played yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRecord {
    #[serde(rename = "HomeTeam")]
    pub home_team: String,

    #[serde(rename = "AwayTeam")]
    pub away_team: String,
}

impl FixtureRecord {
    pub fn new(home_team: &str, away_team: &str) -> Self {
        FixtureRecord {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
        }
    }
}

/// Which side of a fixture a team or rate belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(&self) -> &str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

/// Result of a single match from one side's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn from_score(goals_for: u32, goals_against: u32) -> Self {
        if goals_for > goals_against {
            Outcome::Win
        } else if goals_for < goals_against {
            Outcome::Loss
        } else {
            Outcome::Draw
        }
    }

    pub fn points(&self) -> i32 {
        match self {
            Outcome::Win => POINTS_FOR_WIN,
            Outcome::Draw => POINTS_FOR_DRAW,
            Outcome::Loss => 0,
        }
    }
}

/// One team's line in the league table.
///
/// Column names match the usual table layout (P, W, D, L, F, A, GD, Points).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    #[serde(rename = "Team")]
    pub team: String,

    #[serde(rename = "P")]
    pub played: u32,

    #[serde(rename = "W")]
    pub won: u32,

    #[serde(rename = "D")]
    pub drawn: u32,

    #[serde(rename = "L")]
    pub lost: u32,

    #[serde(rename = "F")]
    pub goals_for: u32,

    #[serde(rename = "A")]
    pub goals_against: u32,

    /// May disagree with F - A on input; recomputed whenever a result is recorded
    #[serde(rename = "GD")]
    pub goal_difference: i32,

    /// Can be negative after points deductions
    #[serde(rename = "Points")]
    pub points: i32,
}

impl StandingsRow {
    /// A row for a team that has not played yet.
    pub fn empty(team: &str) -> Self {
        StandingsRow {
            team: team.to_string(),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    /// Fold one match result into the row.
    pub fn record(&mut self, goals_for: u32, goals_against: u32) -> Outcome {
        let outcome = Outcome::from_score(goals_for, goals_against);

        self.played = self.played.saturating_add(1);
        self.goals_for = self.goals_for.saturating_add(goals_for);
        self.goals_against = self.goals_against.saturating_add(goals_against);
        self.goal_difference = self.computed_goal_difference();

        match outcome {
            Outcome::Win => self.won = self.won.saturating_add(1),
            Outcome::Draw => self.drawn = self.drawn.saturating_add(1),
            Outcome::Loss => self.lost = self.lost.saturating_add(1),
        }
        self.points = self.points.saturating_add(outcome.points());

        outcome
    }

    /// F - A, saturated to the `i32` range of the GD column.
    pub fn computed_goal_difference(&self) -> i32 {
        let gd = self.goals_for as i64 - self.goals_against as i64;
        gd.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Sort key for the table: points, then goal difference, then goals scored.
    pub fn ranking_key(&self) -> (i32, i32, u32) {
        (self.points, self.goal_difference, self.goals_for)
    }
}

/// Simulated scoreline for one fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedResult {
    #[serde(rename = "HomeTeam")]
    pub home_team: String,

    #[serde(rename = "AwayTeam")]
    pub away_team: String,

    #[serde(rename = "HomeGoals")]
    pub home_goals: u32,

    #[serde(rename = "AwayGoals")]
    pub away_goals: u32,
}

/// A standings row with its final position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRow {
    /// 1-based, unique even among tied rows
    #[serde(rename = "Rank")]
    pub rank: usize,

    #[serde(flatten)]
    pub row: StandingsRow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_win() {
        let mut row = StandingsRow::empty("A");
        let outcome = row.record(2, 0);

        assert_eq!(outcome, Outcome::Win);
        assert_eq!(row.played, 1);
        assert_eq!(row.won, 1);
        assert_eq!(row.points, 3);
        assert_eq!(row.goals_for, 2);
        assert_eq!(row.goals_against, 0);
        assert_eq!(row.goal_difference, 2);
    }

    #[test]
    fn test_record_loss_and_draw() {
        let mut row = StandingsRow::empty("C");
        row.record(0, 2);
        row.record(1, 1);

        assert_eq!(row.played, 2);
        assert_eq!(row.lost, 1);
        assert_eq!(row.drawn, 1);
        assert_eq!(row.points, 1);
        assert_eq!(row.goal_difference, -2);
    }

    #[test]
    fn test_record_recomputes_stale_goal_difference() {
        let mut row = StandingsRow::empty("A");
        row.goals_for = 10;
        row.goals_against = 4;
        row.goal_difference = 0;

        row.record(1, 0);
        assert_eq!(row.goal_difference, 7);
    }

    #[test]
    fn test_record_huge_counts_keep_goal_difference_sign() {
        let mut row = StandingsRow::empty("A");
        row.goals_for = 3_000_000_000;

        row.record(1, 0);
        assert_eq!(row.goal_difference, i32::MAX);

        row.goals_for = u32::MAX;
        row.record(2, 0);
        assert_eq!(row.goals_for, u32::MAX);
        assert!(row.goal_difference > 0);
    }

    #[test]
    fn test_ranked_row_serializes_flat() {
        let ranked = RankedRow {
            rank: 1,
            row: StandingsRow::empty("A"),
        };
        let json = serde_json::to_value(&ranked).unwrap();

        assert_eq!(json["Rank"], 1);
        assert_eq!(json["Team"], "A");
        assert_eq!(json["Points"], 0);
    }
}
