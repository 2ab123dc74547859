//! Scenario input.
//!
//! A scenario is a plain nested key-value document: team composition plus
//! run parameters. [`ScenarioConfig::from_value`] accepts it as a
//! `serde_json::Value`, fills defaults, and validates everything before a
//! simulation is built.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use simlab_core::{
    AiAgentConfig, AiModelType, CommunicationOverheadModel, DeveloperConfig, ExperienceLevel,
    SdlcSimulation, SimulationParams,
};
use simlab_env::ConfigError;
use std::collections::BTreeMap;
use tracing::debug;

/// Complete scenario description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub team: TeamConfig,
    pub simulation: RunConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "Unnamed Scenario".to_string(),
            description: None,
            tags: Vec::new(),
            author: None,
            team: TeamConfig::default(),
            simulation: RunConfig::default(),
        }
    }
}

/// Who is on the team.
///
/// Explicit entries come first, then `count` generic developers
/// (`Dev-1`, `Dev-2`, ...), then the `distribution` by experience level
/// (`Senior-1`, ...). AI agents follow the same pattern with `ai_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    pub developers: Vec<DeveloperConfig>,
    pub count: Option<usize>,
    pub distribution: BTreeMap<String, usize>,
    pub ai_agents: Vec<AiAgentConfig>,
    pub ai_count: Option<usize>,
    pub ai_model: AiModelType,
}

/// Run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub duration_weeks: u32,
    pub timestep_days: u32,
    pub random_seed: Option<u64>,
    pub communication_loss_factor: f64,
    pub communication_overhead_model: String,
    pub incident_rate: f64,
    pub tech_debt_accumulation_rate: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        let params = SimulationParams::default();
        Self {
            duration_weeks: 12,
            timestep_days: params.timestep_days,
            random_seed: None,
            communication_loss_factor: params.communication_loss_factor,
            communication_overhead_model: params.overhead_model.name().to_string(),
            incident_rate: params.incident_rate,
            tech_debt_accumulation_rate: params.tech_debt_accumulation_rate,
        }
    }
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses and validates a scenario document.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: ScenarioConfig =
            serde_json::from_value(value).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        debug!(name = %config.name, "Scenario parsed");
        Ok(config)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulation.random_seed = Some(seed);
        self
    }

    pub fn with_weeks(mut self, weeks: u32) -> Self {
        self.simulation.duration_weeks = weeks;
        self
    }

    pub fn with_overhead_model(mut self, model: CommunicationOverheadModel) -> Self {
        self.simulation.communication_overhead_model = model.name().to_string();
        self
    }

    /// Sets the generic developer headcount.
    pub fn with_team_count(mut self, count: usize) -> Self {
        self.team.count = Some(count);
        self
    }

    pub fn with_level(mut self, level: ExperienceLevel, count: usize) -> Self {
        self.team.distribution.insert(level.name().to_string(), count);
        self
    }

    pub fn with_developer(mut self, config: DeveloperConfig) -> Self {
        self.team.developers.push(config);
        self
    }

    pub fn with_ai_count(mut self, count: usize, model: AiModelType) -> Self {
        self.team.ai_count = Some(count);
        self.team.ai_model = model;
        self
    }

    pub fn with_ai_agent(mut self, config: AiAgentConfig) -> Self {
        self.team.ai_agents.push(config);
        self
    }

    /// Days the scenario runs for.
    pub fn duration_days(&self) -> u64 {
        u64::from(self.simulation.duration_weeks) * 7
    }

    pub fn overhead_model(&self) -> Result<CommunicationOverheadModel, ConfigError> {
        self.simulation.communication_overhead_model.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.duration_weeks < 1 {
            return Err(ConfigError::out_of_range(
                "duration_weeks",
                f64::from(self.simulation.duration_weeks),
                1.0,
                f64::INFINITY,
            ));
        }
        self.params()?.validate()?;
        for developer in self.developers()? {
            developer.validate()?;
        }
        for agent in self.ai_agents() {
            agent.resolve()?;
        }
        Ok(())
    }

    /// Engine parameters for this scenario.
    pub fn params(&self) -> Result<SimulationParams, ConfigError> {
        let run = &self.simulation;
        Ok(SimulationParams {
            name: self.name.clone(),
            timestep_days: run.timestep_days,
            seed: run.random_seed,
            communication_loss_factor: run.communication_loss_factor,
            overhead_model: self.overhead_model()?,
            incident_rate: run.incident_rate,
            tech_debt_accumulation_rate: run.tech_debt_accumulation_rate,
        })
    }

    /// Human developer configs in admission order.
    pub fn developers(&self) -> Result<Vec<DeveloperConfig>, ConfigError> {
        let mut configs = self.team.developers.clone();

        for i in 0..self.team.count.unwrap_or(0) {
            configs.push(DeveloperConfig::default().with_name(format!("Dev-{}", i + 1)));
        }

        for (level_name, &count) in &self.team.distribution {
            let level: ExperienceLevel = level_name.parse()?;
            for i in 0..count {
                configs.push(
                    DeveloperConfig::default()
                        .with_name(format!("{}-{}", level.title(), i + 1))
                        .with_experience(level),
                );
            }
        }
        Ok(configs)
    }

    /// AI agent configs in admission order.
    pub fn ai_agents(&self) -> Vec<AiAgentConfig> {
        let mut configs = self.team.ai_agents.clone();
        let model = self.team.ai_model;
        for i in 0..self.team.ai_count.unwrap_or(0) {
            configs.push(AiAgentConfig::new(model).with_name(format!("AI-{}-{}", model, i + 1)));
        }
        configs
    }

    /// Builds a ready-to-run simulation: humans first, then AI agents.
    pub fn build(&self) -> Result<SdlcSimulation, ConfigError> {
        self.validate()?;
        let mut sim = SdlcSimulation::new(self.params()?)?;
        for developer in self.developers()? {
            sim.add_developer(developer)?;
        }
        for agent in self.ai_agents() {
            sim.add_ai_agent(&agent)?;
        }
        Ok(sim)
    }
}
