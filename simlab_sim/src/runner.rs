//! Scenario runner - builds a simulation from a scenario and runs it.

use crate::error::SimError;
use crate::exporter::{RunExport, ScenarioHeader};
use crate::scenario::ScenarioConfig;
use simlab_core::{MemberStats, MetricsSnapshot, SdlcSimulation, StopHandle};
use std::path::Path;
use tracing::info;

/// Runs one scenario and holds on to the finished simulation.
pub struct ScenarioRunner {
    scenario: ScenarioConfig,
    simulation: Option<SdlcSimulation>,
}

impl ScenarioRunner {
    pub fn new(scenario: ScenarioConfig) -> Self {
        Self {
            scenario,
            simulation: None,
        }
    }

    pub fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    /// The simulation, once set up.
    pub fn simulation(&self) -> Option<&SdlcSimulation> {
        self.simulation.as_ref()
    }

    /// Builds the simulation if it does not exist yet.
    pub fn setup(&mut self) -> Result<&mut SdlcSimulation, SimError> {
        let simulation = match self.simulation.take() {
            Some(sim) => sim,
            None => self.scenario.build()?,
        };
        Ok(self.simulation.insert(simulation))
    }

    /// Stop handle of the underlying simulation, setting it up if needed.
    pub fn stop_handle(&mut self) -> Result<StopHandle, SimError> {
        Ok(self.setup()?.stop_handle())
    }

    /// Runs the full duration and returns the final metrics.
    ///
    /// The simulation is kept between calls, so a second `run` continues
    /// from where the first stopped and later exports cover both runs.
    /// Use a fresh runner to start over.
    pub fn run(&mut self) -> Result<MetricsSnapshot, SimError> {
        self.run_with_progress(0, |_| {})
    }

    /// Runs the full duration, calling `observer` with a snapshot every
    /// `every_days` days. Continues an earlier run, like [`Self::run`].
    pub fn run_with_progress<F>(
        &mut self,
        every_days: u64,
        observer: F,
    ) -> Result<MetricsSnapshot, SimError>
    where
        F: FnMut(&MetricsSnapshot),
    {
        let days = self.scenario.duration_days();
        let name = self.scenario.name.clone();
        let sim = self.setup()?;

        info!(
            scenario = %name,
            humans = sim.humans().count(),
            ai_agents = sim.ai_agents().count(),
            days,
            "Running scenario"
        );
        sim.run_observed(days, every_days, observer);

        let metrics = sim.metrics();
        info!(
            scenario = %name,
            merged = metrics.total_prs_merged,
            prs_per_week = metrics.prs_per_week,
            change_failure_rate = metrics.change_failure_rate,
            "Scenario complete"
        );
        Ok(metrics)
    }

    fn finished(&self) -> Result<&SdlcSimulation, SimError> {
        self.simulation
            .as_ref()
            .ok_or_else(|| SimError::NotRun(self.scenario.name.clone()))
    }

    /// Per-member statistics.
    pub fn member_stats(&self) -> Result<Vec<MemberStats>, SimError> {
        Ok(self.finished()?.members().iter().map(|m| m.stats()).collect())
    }

    pub fn export(&self) -> Result<RunExport, SimError> {
        let sim = self.finished()?;
        Ok(RunExport {
            scenario: ScenarioHeader {
                name: self.scenario.name.clone(),
                description: self.scenario.description.clone(),
                tags: self.scenario.tags.clone(),
            },
            seed: sim.master_seed(),
            configuration: self.scenario.clone(),
            metrics: sim.metrics(),
            developers: self.member_stats()?,
            events: sim.events().events().to_vec(),
        })
    }

    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        self.export()?.write_to_file(path)?;
        info!(path = %path.display(), "Results exported");
        Ok(())
    }
}
