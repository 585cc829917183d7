use serde::Serialize;
use std::fmt;

use crate::records::Side;

/// A team with no training history on one side of the pitch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnseenTeam {
    pub team: String,
    pub side: Side,
}

impl fmt::Display for UnseenTeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({} side)", self.team, self.side.as_str())
    }
}

/// Non-fatal anomaly recorded while projecting.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// A predicted rate was unavailable and the league average was used.
    #[serde(rename_all = "camelCase")]
    FallbackRate {
        home_team: String,
        away_team: String,
        /// Which goal count fell back
        side: Side,
        unseen: Vec<UnseenTeam>,
        rate: f64,
    },

    /// A fixture named a team outside the standings; its result was not applied.
    #[serde(rename_all = "camelCase")]
    TeamNotInStandings {
        home_team: String,
        away_team: String,
        missing: Vec<String>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::FallbackRate {
                home_team,
                away_team,
                side,
                unseen,
                rate,
            } => {
                let names: Vec<String> = unseen.iter().map(|u| u.to_string()).collect();
                let cause = if names.is_empty() {
                    "non-finite prediction".to_string()
                } else {
                    format!("not found in training data: {}", names.join(", "))
                };
                write!(
                    f,
                    "{} vs {}: {}; using league average {:.3} for {} goals",
                    home_team,
                    away_team,
                    cause,
                    rate,
                    side.as_str()
                )
            }
            Warning::TeamNotInStandings {
                home_team,
                away_team,
                missing,
            } => write!(
                f,
                "{} vs {}: {} not found in standings; result not applied",
                home_team,
                away_team,
                missing.join(", ")
            ),
        }
    }
}

/// Warnings collected alongside a result, in the order they occurred.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    warnings: Vec<Warning>,

    #[serde(skip)]
    emit: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics {
            warnings: Vec::new(),
            emit: true,
        }
    }

    /// Collects warnings without logging them; for repeated runs over the same inputs.
    pub fn quiet() -> Self {
        Diagnostics {
            warnings: Vec::new(),
            emit: false,
        }
    }

    /// Record a warning and emit it through the log facade.
    pub fn push(&mut self, warning: Warning) {
        if self.emit {
            log::warn!("{}", warning);
        }
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_message_names_team_and_side() {
        let warning = Warning::FallbackRate {
            home_team: "Ipswich".to_string(),
            away_team: "Arsenal".to_string(),
            side: Side::Home,
            unseen: vec![UnseenTeam {
                team: "Ipswich".to_string(),
                side: Side::Home,
            }],
            rate: 1.5,
        };

        let msg = warning.to_string();
        assert!(msg.contains("'Ipswich' (home side)"));
        assert!(msg.contains("1.500 for home goals"));
    }

    #[test]
    fn test_warning_serializes_tagged() {
        let warning = Warning::TeamNotInStandings {
            home_team: "A".to_string(),
            away_team: "Z".to_string(),
            missing: vec!["Z".to_string()],
        };
        let json = serde_json::to_value(&warning).unwrap();

        assert_eq!(json["kind"], "teamNotInStandings");
        assert_eq!(json["homeTeam"], "A");
        assert_eq!(json["missing"][0], "Z");
    }

    #[test]
    fn test_push_preserves_order() {
        let mut diagnostics = Diagnostics::new();
        for team in ["X", "Y"] {
            diagnostics.push(Warning::TeamNotInStandings {
                home_team: team.to_string(),
                away_team: "A".to_string(),
                missing: vec![team.to_string()],
            });
        }

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.messages()[0].starts_with("X vs A"));
    }
}
