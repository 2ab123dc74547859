//! Communication overhead as a function of team size.
//!
//! The factor is reported alongside the other metrics. It does not feed
//! back into anyone's productivity.

use serde::{Deserialize, Serialize};
use simlab_env::ConfigError;
use std::str::FromStr;

/// How coordination cost grows with headcount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationOverheadModel {
    /// O(n)
    Linear,
    /// O(n²) pairwise channels
    #[default]
    Quadratic,
    /// O(log n), well-structured organisations
    Hierarchical,
}

impl CommunicationOverheadModel {
    pub const ALL: [CommunicationOverheadModel; 3] = [
        CommunicationOverheadModel::Linear,
        CommunicationOverheadModel::Quadratic,
        CommunicationOverheadModel::Hierarchical,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CommunicationOverheadModel::Linear => "linear",
            CommunicationOverheadModel::Quadratic => "quadratic",
            CommunicationOverheadModel::Hierarchical => "hierarchical",
        }
    }

    /// Overhead multiplier for a team of `team_size`; 1.0 means none.
    pub fn calculate(&self, team_size: usize) -> f64 {
        if team_size <= 1 {
            return 1.0;
        }
        let n = team_size as f64;
        match self {
            CommunicationOverheadModel::Linear => 1.0 + 0.05 * (n - 1.0),
            CommunicationOverheadModel::Quadratic => {
                let channels = n * (n - 1.0) / 2.0;
                1.0 + channels / 100.0
            }
            CommunicationOverheadModel::Hierarchical => 1.0 + 0.1 * n.log2(),
        }
    }
}

impl std::fmt::Display for CommunicationOverheadModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CommunicationOverheadModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ConfigError::unknown_variant(
                    "communication_overhead_model",
                    s,
                    &["linear", "quadratic", "hierarchical"],
                )
            })
    }
}
