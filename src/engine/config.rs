use serde::{Deserialize, Serialize};

/// Knobs consumed by [`crate::engine::search::SearchEngine`]. Usually
/// produced from a [`Difficulty`] label; embedders may also load one
/// from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub depth: u8,
    pub quiescence_depth: u8,
    /// Uniform score jitter applied to the root choice; 0 disables it
    /// and makes the search fully deterministic.
    pub randomness: i32,
    pub time_budget_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Difficulty::Medium.config()
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Master,
}

impl Difficulty {
    pub const ALL: [Self; 5] = [
        Self::Beginner,
        Self::Easy,
        Self::Medium,
        Self::Hard,
        Self::Master,
    ];

    #[must_use]
    pub const fn config(self) -> SearchConfig {
        match self {
            Self::Beginner => SearchConfig {
                depth: 3,
                quiescence_depth: 2,
                randomness: 150,
                time_budget_ms: 1_000,
            },
            Self::Easy => SearchConfig {
                depth: 4,
                quiescence_depth: 3,
                randomness: 30,
                time_budget_ms: 2_000,
            },
            Self::Medium => SearchConfig {
                depth: 5,
                quiescence_depth: 4,
                randomness: 0,
                time_budget_ms: 3_000,
            },
            Self::Hard => SearchConfig {
                depth: 6,
                quiescence_depth: 5,
                randomness: 0,
                time_budget_ms: 5_000,
            },
            Self::Master => SearchConfig {
                depth: 8,
                quiescence_depth: 6,
                randomness: 0,
                time_budget_ms: 10_000,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_table_matches_expectations() {
        let master = Difficulty::Master.config();
        assert_eq!(master.depth, 8);
        assert_eq!(master.quiescence_depth, 6);
        assert_eq!(master.randomness, 0);
        assert_eq!(master.time_budget_ms, 10_000);

        let beginner = Difficulty::Beginner.config();
        assert_eq!(beginner.depth, 3);
        assert_eq!(beginner.randomness, 150);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = SearchConfig::from_json(r#"{ "depth": 7 }"#).unwrap();
        assert_eq!(config.depth, 7);
        assert_eq!(config.quiescence_depth, Difficulty::Medium.config().quiescence_depth);
    }

    #[test]
    fn difficulty_labels_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&Difficulty::Master).unwrap(),
            "\"master\""
        );
        let parsed: Difficulty = serde_json::from_str("\"beginner\"").unwrap();
        assert_eq!(parsed, Difficulty::Beginner);
    }
}
