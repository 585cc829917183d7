use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::constants::DEFAULT_TEAM_ALIASES;
use crate::error::{ProjectionError, Result};

/// Spelling variants of team names mapped onto one canonical id.
///
/// The mapping is applied once, uniformly, to every table before modelling.
/// It is not transitive: a canonical name is never looked up again.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamNameMap {
    aliases: HashMap<String, String>,
}

impl TeamNameMap {
    pub fn new() -> Self {
        TeamNameMap {
            aliases: HashMap::new(),
        }
    }

    /// Mapping pre-populated with the built-in aliases.
    pub fn with_defaults() -> Self {
        let mut map = TeamNameMap::new();
        for (variant, canonical) in DEFAULT_TEAM_ALIASES {
            map.add_alias(variant, canonical);
        }
        map
    }

    /// Read aliases from a file.
    /// Format: variant,canonical
    pub fn read_from_file(&mut self, filepath: impl AsRef<Path>) -> Result<()> {
        let path = filepath.as_ref();
        let file = File::open(path).map_err(|e| {
            ProjectionError::validation(format!("Failed to open alias file {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(file);

        for line in reader.lines() {
            let line = line.map_err(|e| {
                ProjectionError::validation(format!("Failed to read alias file: {}", e))
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != 2 {
                return Err(ProjectionError::validation(format!(
                    "Alias line must be 'variant,canonical': {}",
                    line
                )));
            }

            self.add_alias(parts[0].trim(), parts[1].trim());
        }

        Ok(())
    }

    pub fn add_alias(&mut self, variant: &str, canonical: &str) {
        self.aliases.insert(variant.to_string(), canonical.to_string());
    }

    /// Canonical id for `name`; unknown names map to themselves.
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn normalize(&self, name: &str) -> String {
        self.canonical(name).to_string()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl FromIterator<(String, String)> for TeamNameMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        TeamNameMap {
            aliases: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_collapse_bournemouth() {
        let map = TeamNameMap::with_defaults();
        assert_eq!(map.canonical("AFC Bournemouth"), "Bournemouth");
        assert_eq!(map.canonical("Arsenal"), "Arsenal");
    }

    #[test]
    fn test_mapping_is_not_transitive() {
        let mut map = TeamNameMap::new();
        map.add_alias("Man Utd", "Manchester United");
        map.add_alias("Manchester United", "MUFC");

        assert_eq!(map.canonical("Man Utd"), "Manchester United");
    }

    #[test]
    fn test_read_from_file() {
        let path = std::env::temp_dir().join(format!("aliases_{}.csv", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "# variant,canonical").unwrap();
            writeln!(file, "Spurs, Tottenham").unwrap();
            writeln!(file).unwrap();
            writeln!(file, "Wolves,Wolverhampton").unwrap();
        }

        let mut map = TeamNameMap::new();
        map.read_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(map.len(), 2);
        assert_eq!(map.canonical("Spurs"), "Tottenham");
        assert_eq!(map.canonical("Wolves"), "Wolverhampton");
    }

    #[test]
    fn test_read_from_missing_file_is_validation_error() {
        let mut map = TeamNameMap::new();
        let err = map.read_from_file("/nonexistent/aliases.csv").unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }
}
