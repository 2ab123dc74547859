//! SimLab scenario harness
//!
//! Turns scenario documents into running simulations and reports on them.
//!
//! # Pieces
//!
//! - [`ScenarioConfig`]: nested key-value scenario input with defaults and validation
//! - [`ScenarioId`]: built-in team presets (baseline, Brooks' law, mixed teams, ...)
//! - [`ScenarioRunner`]: builds, runs and exports a single scenario
//! - [`ScenarioComparison`]: runs several scenarios and picks per-metric winners
//!
//! # Usage
//!
//! ```ignore
//! use simlab_sim::{ScenarioId, ScenarioRunner};
//!
//! let mut runner = ScenarioRunner::new(ScenarioId::MixedTeam.config(42));
//! let metrics = runner.run()?;
//! println!("{:.1} PRs/week", metrics.prs_per_week);
//! runner.export_to_file("results/mixed-team.json")?;
//! ```

pub mod comparison;
pub mod error;
pub mod exporter;
pub mod runner;
pub mod scenario;
pub mod scenarios;

pub use comparison::{ComparisonTable, MetricComparison, ScenarioComparison, ScenarioOutcome};
pub use error::SimError;
pub use exporter::{write_json, RunExport, ScenarioHeader};
pub use runner::ScenarioRunner;
pub use scenario::{RunConfig, ScenarioConfig, TeamConfig};
pub use scenarios::ScenarioId;
