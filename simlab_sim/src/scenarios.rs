//! Built-in team scenarios.

use crate::scenario::ScenarioConfig;
use simlab_core::{AiAgentConfig, AiModelType, CommunicationOverheadModel, ExperienceLevel};
use simlab_env::ConfigError;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// Five mid-level developers
    Baseline,

    /// Three developers
    SmallTeam,

    /// Fifteen developers under quadratic overhead
    BrooksLaw,

    /// Two seniors bringing six juniors up to speed
    OnboardingWave,

    /// Four developers plus two AI agents
    MixedTeam,

    /// Two seniors supervising six AI agents
    AiHeavy,

    /// Mixed team whose AI agents may review human work
    AiReviewers,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::SmallTeam,
            ScenarioId::BrooksLaw,
            ScenarioId::OnboardingWave,
            ScenarioId::MixedTeam,
            ScenarioId::AiHeavy,
            ScenarioId::AiReviewers,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::SmallTeam => "small-team",
            ScenarioId::BrooksLaw => "brooks-law",
            ScenarioId::OnboardingWave => "onboarding-wave",
            ScenarioId::MixedTeam => "mixed-team",
            ScenarioId::AiHeavy => "ai-heavy",
            ScenarioId::AiReviewers => "ai-reviewers",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Five mid-level developers, default parameters",
            ScenarioId::SmallTeam => "Three developers with little coordination cost",
            ScenarioId::BrooksLaw => "Fifteen developers, many still onboarding",
            ScenarioId::OnboardingWave => "Two seniors and six fresh junior hires",
            ScenarioId::MixedTeam => "Four developers working with two Claude Sonnet agents",
            ScenarioId::AiHeavy => "Two seniors supervising six AI agents of mixed models",
            ScenarioId::AiReviewers => "Mixed team where AI agents review human PRs",
        }
    }

    /// Returns true if the scenario includes AI agents.
    pub fn has_ai(&self) -> bool {
        matches!(
            self,
            ScenarioId::MixedTeam | ScenarioId::AiHeavy | ScenarioId::AiReviewers
        )
    }

    /// Builds the scenario's configuration.
    pub fn config(&self, seed: u64) -> ScenarioConfig {
        let base = ScenarioConfig::new(self.name())
            .with_description(self.description())
            .with_seed(seed);

        match self {
            ScenarioId::Baseline => base.with_team_count(5).with_tags(&["human"]),
            ScenarioId::SmallTeam => base.with_team_count(3).with_tags(&["human"]),
            ScenarioId::BrooksLaw => base
                .with_level(ExperienceLevel::Senior, 3)
                .with_level(ExperienceLevel::Mid, 8)
                .with_level(ExperienceLevel::Junior, 4)
                .with_overhead_model(CommunicationOverheadModel::Quadratic)
                .with_tags(&["human", "scaling"]),
            ScenarioId::OnboardingWave => base
                .with_level(ExperienceLevel::Senior, 2)
                .with_level(ExperienceLevel::Junior, 6)
                .with_tags(&["human", "onboarding"]),
            ScenarioId::MixedTeam => base
                .with_team_count(4)
                .with_ai_count(2, AiModelType::ClaudeSonnet)
                .with_tags(&["mixed"]),
            ScenarioId::AiHeavy => base
                .with_level(ExperienceLevel::Senior, 2)
                .with_ai_count(3, AiModelType::ClaudeSonnet)
                .with_ai_agent(AiAgentConfig::new(AiModelType::Codellama).with_name("AI-codellama-1"))
                .with_ai_agent(AiAgentConfig::new(AiModelType::Codellama).with_name("AI-codellama-2"))
                .with_ai_agent(AiAgentConfig::new(AiModelType::Gpt4).with_name("AI-gpt4-1"))
                .with_tags(&["mixed", "ai"]),
            ScenarioId::AiReviewers => base
                .with_team_count(4)
                .with_ai_agent(
                    AiAgentConfig::new(AiModelType::ClaudeSonnet)
                        .with_name("AI-reviewer-1")
                        .reviewing_human_prs(5.0),
                )
                .with_ai_agent(
                    AiAgentConfig::new(AiModelType::ClaudeSonnet)
                        .with_name("AI-reviewer-2")
                        .reviewing_human_prs(5.0),
                )
                .with_tags(&["mixed", "ai-review"]),
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('_', "-");
        ScenarioId::all()
            .into_iter()
            .find(|id| id.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = ScenarioId::all().iter().map(|id| id.name()).collect();
                ConfigError::unknown_variant("scenario", s, &names)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_build() {
        for id in ScenarioId::all() {
            let config = id.config(42);
            assert_eq!(config.name, id.name());
            let sim = config.build().unwrap();
            assert!(!sim.members().is_empty());
            assert_eq!(sim.ai_agents().count() > 0, id.has_ai());
        }
    }

    #[test]
    fn test_team_sizes() {
        let size = |id: ScenarioId| id.config(1).build().unwrap().members().len();
        assert_eq!(size(ScenarioId::Baseline), 5);
        assert_eq!(size(ScenarioId::SmallTeam), 3);
        assert_eq!(size(ScenarioId::BrooksLaw), 15);
        assert_eq!(size(ScenarioId::OnboardingWave), 8);
        assert_eq!(size(ScenarioId::AiHeavy), 8);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("brooks_law".parse::<ScenarioId>().unwrap(), ScenarioId::BrooksLaw);
        assert_eq!("AI-Heavy".parse::<ScenarioId>().unwrap(), ScenarioId::AiHeavy);
        assert!("chaos".parse::<ScenarioId>().is_err());
    }
}
