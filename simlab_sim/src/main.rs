//! SimLab CLI
//!
//! Run team scenarios and compare their delivery metrics.

use clap::Parser;
use simlab_core::{AiModelType, CommunicationOverheadModel, MetricsSnapshot};
use simlab_env::resolve_seed;
use simlab_sim::scenarios::ScenarioId;
use simlab_sim::{ScenarioComparison, ScenarioConfig, ScenarioRunner, SimError};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// SimLab software delivery simulator
#[derive(Parser, Debug)]
#[command(name = "simlab")]
#[command(about = "Simulate human and AI software delivery teams", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (baseline, small-team, brooks-law, onboarding-wave,
    /// mixed-team, ai-heavy, ai-reviewers, all)
    #[arg(short = 'S', long, default_value = "baseline")]
    scenario: String,

    /// Override the run length in weeks
    #[arg(short, long)]
    weeks: Option<u32>,

    /// Replace the human team with this many mid-level developers
    #[arg(short, long)]
    developers: Option<usize>,

    /// Replace the AI agents with this many agents
    #[arg(short, long)]
    ai_agents: Option<usize>,

    /// Model for --ai-agents (claude-sonnet, claude-opus, gpt4, codellama)
    #[arg(long)]
    ai_model: Option<String>,

    /// Communication overhead model (linear, quadratic, hierarchical)
    #[arg(long)]
    overhead_model: Option<String>,

    /// Compare the selected scenarios side by side
    #[arg(long)]
    compare: bool,

    /// Run compared scenarios in parallel
    #[arg(long)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,

    /// Export results to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::new(if verbose { "debug" } else { "info" })
}

fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose))
}

/// Applies command-line overrides to a preset.
fn apply_overrides(mut config: ScenarioConfig, args: &Args) -> Result<ScenarioConfig, SimError> {
    if let Some(weeks) = args.weeks {
        config = config.with_weeks(weeks);
    }
    if let Some(count) = args.developers {
        config.team.developers.clear();
        config.team.distribution.clear();
        config = config.with_team_count(count);
    }
    if let Some(count) = args.ai_agents {
        let model = match &args.ai_model {
            Some(name) => name.parse::<AiModelType>()?,
            None => config.team.ai_model,
        };
        config.team.ai_agents.clear();
        config = config.with_ai_count(count, model);
    }
    if let Some(name) = &args.overhead_model {
        let model: CommunicationOverheadModel = name.parse()?;
        config = config.with_overhead_model(model);
    }
    config.validate()?;
    Ok(config)
}

fn log_summary(metrics: &MetricsSnapshot) {
    info!(
        "  Team: {} ({} human, {} AI) | overhead {:.2}x",
        metrics.total_developers,
        metrics.human_developers,
        metrics.ai_agents,
        metrics.communication_overhead
    );
    info!(
        "  PRs: {} created, {} merged, {} reverted | {:.1} PRs/week",
        metrics.total_prs_created,
        metrics.total_prs_merged,
        metrics.total_prs_reverted,
        metrics.prs_per_week
    );
    info!(
        "  Quality: {:.1}% failure rate | {:.1} days avg cycle time",
        metrics.change_failure_rate * 100.0,
        metrics.avg_cycle_time_days
    );
    info!(
        "  Debt: {} active items ({:.1}% impact) | incidents: {} active, {} total",
        metrics.tech_debt_count,
        metrics.tech_debt_productivity_impact * 100.0,
        metrics.active_incidents,
        metrics.total_incidents
    );
    if metrics.ai_agents > 0 {
        info!(
            "  AI: {} PRs, ${:.2} total, ${:.2} per PR",
            metrics.ai_prs_created, metrics.ai_total_cost, metrics.ai_avg_cost_per_pr
        );
    }
}

async fn compare(configs: Vec<ScenarioConfig>, args: &Args) -> Result<(), SimError> {
    let mut comparison = ScenarioComparison::new();
    comparison.add_scenarios(configs);
    comparison.run_all(args.parallel).await?;

    if args.json {
        let table = comparison.comparison_table()?;
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        println!("{}", comparison.render()?);
    }

    if let Some(path) = &args.export {
        comparison.export_to_json(path)?;
        info!("Comparison exported to {}", path);
    }
    Ok(())
}

fn run_each(configs: Vec<ScenarioConfig>, args: &Args) -> Result<(), SimError> {
    if args.export.is_some() && configs.len() > 1 {
        return Err(SimError::InvalidArgs(
            "--export only supports a single scenario; use --compare for several".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(configs.len());
    for config in configs {
        let mut runner = ScenarioRunner::new(config);
        let metrics = runner.run()?;

        if !args.json {
            info!("✓ {}", runner.scenario().name);
            log_summary(&metrics);
        }
        if let Some(path) = &args.export {
            runner.export_to_file(path)?;
        }
        results.push((runner.scenario().name.clone(), metrics));
    }

    if args.json {
        let summary = serde_json::json!({
            "total": results.len(),
            "results": results.iter().map(|(name, metrics)| {
                serde_json::json!({
                    "scenario": name,
                    "metrics": metrics,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), SimError> {
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse()?]
    };

    let seed = resolve_seed((args.seed != 0).then_some(args.seed));
    if !args.json {
        info!("SimLab v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("Seed: {}", seed);
    }

    let configs = scenarios
        .iter()
        .map(|id| apply_overrides(id.config(seed), &args))
        .collect::<Result<Vec<_>, _>>()?;

    if args.compare {
        compare(configs, &args).await
    } else {
        run_each(configs, &args)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(args.verbose))
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if let Err(e) = run(args).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
