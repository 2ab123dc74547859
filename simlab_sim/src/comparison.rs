//! Side-by-side comparison of several scenarios.
//!
//! Each scenario runs in its own simulation; nothing is shared, so the
//! parallel mode simply hands every run to a blocking tokio task and
//! collects the results in the order the scenarios were added.

use crate::error::SimError;
use crate::exporter::write_json;
use crate::runner::ScenarioRunner;
use crate::scenario::ScenarioConfig;
use serde::{Deserialize, Serialize};
use simlab_core::MetricsSnapshot;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Metrics shown in the comparison table: (key, label, higher is better).
const COMPARED_METRICS: [(&str, &str, bool); 9] = [
    ("total_developers", "Team Size", false),
    ("human_developers", "Humans", false),
    ("ai_agents", "AI Agents", false),
    ("prs_per_week", "PRs/Week", true),
    ("change_failure_rate", "Failure Rate", false),
    ("avg_cycle_time_days", "Avg Cycle Time", false),
    ("ai_total_cost", "AI Cost", false),
    ("human_prs_per_week", "Human PRs/Week", true),
    ("ai_prs_per_week", "AI PRs/Week", true),
];

/// Result of one scenario in a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub description: Option<String>,
    pub metrics: MetricsSnapshot,
    #[serde(skip)]
    pub config: ScenarioConfig,
}

impl ScenarioOutcome {
    fn metric(&self, key: &str) -> f64 {
        self.metrics.value(key).unwrap_or(0.0)
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricComparison {
    pub key: String,
    pub name: String,
    pub values: Vec<f64>,
    pub best_scenario: Option<String>,
    pub higher_is_better: bool,
}

/// Table of compared metrics plus derived insights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub scenarios: Vec<String>,
    pub metrics: Vec<MetricComparison>,
    pub winners: BTreeMap<String, String>,
    pub insights: Vec<String>,
}

/// Index of the best value. Lower-is-better ignores zeros; all-zero rows
/// have no winner. Ties go to the earliest scenario.
fn best_index(values: &[f64], higher_is_better: bool) -> Option<usize> {
    if values.iter().all(|v| *v == 0.0) {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if !higher_is_better && value <= 0.0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, current)) if higher_is_better => value > current,
            Some((_, current)) => value < current,
        };
        if better {
            best = Some((idx, value));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Collects scenarios, runs them, and compares the results.
#[derive(Debug, Default)]
pub struct ScenarioComparison {
    scenarios: Vec<ScenarioConfig>,
    results: Vec<ScenarioOutcome>,
}

impl ScenarioComparison {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scenario(&mut self, scenario: ScenarioConfig) {
        info!(name = %scenario.name, "Added scenario");
        self.scenarios.push(scenario);
    }

    pub fn add_scenarios(&mut self, scenarios: impl IntoIterator<Item = ScenarioConfig>) {
        for scenario in scenarios {
            self.add_scenario(scenario);
        }
    }

    pub fn scenarios(&self) -> &[ScenarioConfig] {
        &self.scenarios
    }

    pub fn results(&self) -> &[ScenarioOutcome] {
        &self.results
    }

    fn run_one(config: ScenarioConfig) -> Result<ScenarioOutcome, SimError> {
        let mut runner = ScenarioRunner::new(config);
        let metrics = runner.run()?;
        let config = runner.scenario().clone();
        Ok(ScenarioOutcome {
            name: config.name.clone(),
            description: config.description.clone(),
            metrics,
            config,
        })
    }

    /// Runs every scenario one after another.
    pub fn run_sequential(&mut self) -> Result<&[ScenarioOutcome], SimError> {
        if self.scenarios.is_empty() {
            return Err(SimError::NoScenarios);
        }
        info!(count = self.scenarios.len(), "Running scenario comparison");

        let mut results = Vec::with_capacity(self.scenarios.len());
        for (i, config) in self.scenarios.iter().enumerate() {
            info!("[{}/{}] Running: {}", i + 1, self.scenarios.len(), config.name);
            results.push(Self::run_one(config.clone())?);
        }
        self.results = results;
        Ok(&self.results)
    }

    /// Runs every scenario on its own blocking task. Results keep the order
    /// in which scenarios were added.
    pub async fn run_parallel(&mut self) -> Result<&[ScenarioOutcome], SimError> {
        if self.scenarios.is_empty() {
            return Err(SimError::NoScenarios);
        }
        info!(count = self.scenarios.len(), "Running scenarios in parallel");

        let handles: Vec<_> = self
            .scenarios
            .iter()
            .cloned()
            .map(|config| {
                let name = config.name.clone();
                (name, tokio::task::spawn_blocking(move || Self::run_one(config)))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = handle.await.map_err(|e| SimError::Task {
                name: name.clone(),
                reason: e.to_string(),
            })??;
            info!(name = %name, "Completed");
            results.push(outcome);
        }
        self.results = results;
        Ok(&self.results)
    }

    /// Runs all scenarios, in parallel if asked.
    pub async fn run_all(&mut self, parallel: bool) -> Result<&[ScenarioOutcome], SimError> {
        if parallel {
            self.run_parallel().await
        } else {
            self.run_sequential()
        }
    }

    pub fn comparison_table(&self) -> Result<ComparisonTable, SimError> {
        if self.results.is_empty() {
            return Err(SimError::NotRun("comparison".to_string()));
        }

        let mut metrics = Vec::with_capacity(COMPARED_METRICS.len());
        let mut winners = BTreeMap::new();
        for (key, label, higher_is_better) in COMPARED_METRICS {
            let values: Vec<f64> = self.results.iter().map(|r| r.metric(key)).collect();
            let best_scenario =
                best_index(&values, higher_is_better).map(|idx| self.results[idx].name.clone());
            if let Some(name) = &best_scenario {
                winners.insert(key.to_string(), name.clone());
            }
            metrics.push(MetricComparison {
                key: key.to_string(),
                name: label.to_string(),
                values,
                best_scenario,
                higher_is_better,
            });
        }

        Ok(ComparisonTable {
            scenarios: self.results.iter().map(|r| r.name.clone()).collect(),
            metrics,
            winners,
            insights: self.insights(),
        })
    }

    /// Plain-language observations about the results.
    pub fn insights(&self) -> Vec<String> {
        let mut insights = Vec::new();
        let Some(leader) = self
            .results
            .iter()
            .reduce(|best, r| if r.metric("prs_per_week") > best.metric("prs_per_week") { r } else { best })
        else {
            return insights;
        };
        insights.push(format!(
            "Highest throughput: {} with {:.1} PRs/week",
            leader.name,
            leader.metric("prs_per_week")
        ));

        let quality_leader = self
            .results
            .iter()
            .filter(|r| r.metric("change_failure_rate") > 0.0)
            .reduce(|best, r| {
                if r.metric("change_failure_rate") < best.metric("change_failure_rate") {
                    r
                } else {
                    best
                }
            });
        if let Some(best) = quality_leader {
            insights.push(format!(
                "Best quality: {} with {:.1}% failure rate",
                best.name,
                best.metric("change_failure_rate") * 100.0
            ));
        }

        let (mixed, human_only): (Vec<&ScenarioOutcome>, Vec<&ScenarioOutcome>) =
            self.results.iter().partition(|r| r.metrics.ai_agents > 0);

        let most_efficient = mixed
            .iter()
            .map(|r| (r, r.metric("prs_per_week") / r.metric("ai_total_cost").max(0.01)))
            .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best });
        if let Some((result, prs_per_dollar)) = most_efficient {
            insights.push(format!(
                "Most cost-efficient: {} with {:.1} PRs/$",
                result.name, prs_per_dollar
            ));
        }

        if !mixed.is_empty() && !human_only.is_empty() {
            let average = |group: &[&ScenarioOutcome]| {
                group.iter().map(|r| r.metric("prs_per_week")).sum::<f64>() / group.len() as f64
            };
            let human_avg = average(&human_only);
            let mixed_avg = average(&mixed);
            if human_avg > 0.0 && mixed_avg > human_avg {
                let improvement = (mixed_avg / human_avg - 1.0) * 100.0;
                insights.push(format!(
                    "Mixed teams avg {:.0}% higher throughput than human-only teams",
                    improvement
                ));
            }
        }

        insights
    }

    /// Text rendering of the comparison table.
    pub fn render(&self) -> Result<String, SimError> {
        let table = self.comparison_table()?;
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = writeln!(out, "Scenarios:");
        for (i, result) in self.results.iter().enumerate() {
            let _ = writeln!(out, "  [{}] {}", i + 1, result.name);
            if let Some(description) = &result.description {
                let _ = writeln!(out, "      {}", description);
            }
        }

        let mut header = format!("{:<30}", "Metric");
        for i in 0..self.results.len() {
            let _ = write!(header, " | Scenario {:>2}", i + 1);
        }
        header.push_str(" | Winner");
        let _ = writeln!(out, "\n{}", header);
        let _ = writeln!(out, "{}", "-".repeat(header.len()));

        for row in &table.metrics {
            let mut line = format!("{:<30}", row.name);
            for (result, value) in self.results.iter().zip(&row.values) {
                let mut cell = if row.key.ends_with("_rate") {
                    format!("{:.1}%", value * 100.0)
                } else {
                    format!("{:.1}", value)
                };
                if row.best_scenario.as_deref() == Some(result.name.as_str()) {
                    cell.push_str(" *");
                }
                let _ = write!(line, " | {:>11}", cell);
            }
            let winner = row
                .best_scenario
                .as_ref()
                .and_then(|name| table.scenarios.iter().position(|s| s == name));
            match winner {
                Some(idx) => {
                    let _ = write!(line, " | Scenario {}", idx + 1);
                }
                None => line.push_str(" | -"),
            }
            let _ = writeln!(out, "{}", line);
        }

        if !table.insights.is_empty() {
            let _ = writeln!(out, "\nKey insights:");
            for insight in &table.insights {
                let _ = writeln!(out, "  - {}", insight);
            }
        }
        Ok(out)
    }

    /// Writes the table and the full per-scenario metrics to JSON.
    pub fn export_to_json(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        #[derive(Serialize)]
        struct ComparisonExport<'a> {
            comparison: ComparisonTable,
            full_results: &'a [ScenarioOutcome],
        }

        let export = ComparisonExport {
            comparison: self.comparison_table()?,
            full_results: &self.results,
        };
        write_json(&export, path)?;
        Ok(())
    }

    /// Writes the comparison table as CSV: one row per metric, one column
    /// per scenario.
    pub fn export_to_csv(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let table = self.comparison_table()?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["Metric".to_string()];
        header.extend(table.scenarios.iter().cloned());
        writer.write_record(&header)?;

        for row in &table.metrics {
            let mut record = vec![row.name.clone()];
            record.extend(row.values.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        info!(path = %path.display(), "Comparison exported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ScenarioId;

    fn outcome(name: &str, prs_per_week: f64, failure: f64, ai_agents: usize, cost: f64) -> ScenarioOutcome {
        ScenarioOutcome {
            name: name.to_string(),
            description: None,
            metrics: MetricsSnapshot {
                prs_per_week,
                change_failure_rate: failure,
                ai_agents,
                ai_total_cost: cost,
                ..MetricsSnapshot::default()
            },
            config: ScenarioConfig::new(name),
        }
    }

    #[test]
    fn test_best_index_rules() {
        assert_eq!(best_index(&[1.0, 3.0, 2.0], true), Some(1));
        assert_eq!(best_index(&[0.0, 0.2, 0.1], false), Some(2));
        assert_eq!(best_index(&[0.0, 0.0], false), None);
        assert_eq!(best_index(&[0.0, 0.0], true), None);
        assert_eq!(best_index(&[2.0, 2.0], true), Some(0));
    }

    #[test]
    fn test_insights() {
        let comparison = ScenarioComparison {
            scenarios: Vec::new(),
            results: vec![
                outcome("humans", 4.0, 0.10, 0, 0.0),
                outcome("mixed", 6.0, 0.05, 2, 10.0),
            ],
        };
        let insights = comparison.insights();
        assert_eq!(insights[0], "Highest throughput: mixed with 6.0 PRs/week");
        assert_eq!(insights[1], "Best quality: mixed with 5.0% failure rate");
        assert_eq!(insights[2], "Most cost-efficient: mixed with 0.6 PRs/$");
        assert_eq!(insights[3], "Mixed teams avg 50% higher throughput than human-only teams");

        let table = comparison.comparison_table().unwrap();
        assert_eq!(table.winners.get("prs_per_week").map(String::as_str), Some("mixed"));
        assert!(table.winners.get("human_prs_per_week").is_none());
        assert!(comparison.render().unwrap().contains("Scenario  2"));
    }

    #[test]
    fn test_empty_comparison_errors() {
        let mut comparison = ScenarioComparison::new();
        assert!(matches!(comparison.run_sequential(), Err(SimError::NoScenarios)));
        assert!(comparison.comparison_table().is_err());
    }

    #[test]
    fn test_export_to_csv() {
        let comparison = ScenarioComparison {
            scenarios: Vec::new(),
            results: vec![
                outcome("humans", 4.0, 0.10, 0, 0.0),
                outcome("mixed", 6.5, 0.05, 2, 10.0),
            ],
        };
        let dir = std::env::temp_dir().join("simlab_csv_export");
        let path = dir.join("comparison.csv");
        comparison.export_to_csv(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, vec!["Metric", "humans", "mixed"]);

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), COMPARED_METRICS.len());
        let throughput = rows.iter().find(|r| &r[0] == "PRs/Week").unwrap();
        assert_eq!(&throughput[1], "4");
        assert_eq!(&throughput[2], "6.5");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_matches_sequential() {
        let configs: Vec<ScenarioConfig> = [ScenarioId::Baseline, ScenarioId::MixedTeam]
            .iter()
            .map(|id| id.config(42).with_weeks(4))
            .collect();

        let mut sequential = ScenarioComparison::new();
        sequential.add_scenarios(configs.clone());
        sequential.run_all(false).await.unwrap();

        let mut parallel = ScenarioComparison::new();
        parallel.add_scenarios(configs);
        parallel.run_all(true).await.unwrap();

        let names: Vec<&str> = parallel.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["baseline", "mixed-team"]);
        for (a, b) in sequential.results().iter().zip(parallel.results()) {
            assert_eq!(a.metrics, b.metrics);
        }
    }
}
