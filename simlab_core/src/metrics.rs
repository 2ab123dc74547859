//! Delivery metrics.
//!
//! [`MetricsSnapshot::collect`] is a pure read of the orchestrator's
//! registries and can be taken at any tick. Every ratio reports 0 when its
//! denominator is 0.

use crate::engine::SdlcSimulation;
use crate::work::PullRequest;
use serde::{Deserialize, Serialize};

/// Rounds to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn average_cycle_time<'a>(prs: impl Iterator<Item = &'a PullRequest>) -> f64 {
    let (sum, count) = prs
        .filter_map(PullRequest::cycle_time)
        .fold((0u64, 0u64), |(sum, count), days| (sum + days, count + 1));
    ratio(sum as f64, count as f64)
}

/// Point-in-time view of one simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub current_day: u64,
    pub current_week: u64,

    // Team composition
    pub total_developers: usize,
    pub human_developers: usize,
    pub ai_agents: usize,

    // Overall delivery
    pub total_prs_created: usize,
    pub total_prs_merged: usize,
    pub total_prs_reverted: usize,
    pub open_prs: usize,
    pub avg_cycle_time_days: f64,
    pub change_failure_rate: f64,
    pub prs_per_week: f64,
    pub communication_overhead: f64,

    // Human split
    pub human_prs_created: usize,
    pub human_prs_merged: usize,
    pub human_prs_reverted: usize,
    pub human_failure_rate: f64,
    pub human_prs_per_week: f64,
    pub human_avg_cycle_time_days: f64,
    pub human_total_cost: f64,
    pub human_avg_cost_per_pr: f64,

    // AI split
    pub ai_prs_created: usize,
    pub ai_prs_merged: usize,
    pub ai_prs_reverted: usize,
    pub ai_failure_rate: f64,
    pub ai_prs_per_week: f64,
    pub ai_avg_cycle_time_days: f64,
    pub ai_total_cost: f64,
    pub ai_avg_cost_per_pr: f64,

    // Technical debt
    pub tech_debt_count: usize,
    pub tech_debt_productivity_impact: f64,
    pub tech_debt_total_created: usize,
    pub tech_debt_total_paid: usize,
    pub tech_debt_effort_to_fix: f64,

    // Incidents
    pub total_incidents: usize,
    pub active_incidents: usize,
    pub resolved_incidents: usize,
    pub avg_mttr_days: f64,
}

impl MetricsSnapshot {
    /// Computes the snapshot from the simulation's current state.
    pub fn collect(sim: &SdlcSimulation) -> Self {
        let day = sim.current_day();
        let weeks = (day / 7).max(1) as f64;

        let ai_agents = sim.ai_agents().count();
        let human_developers = sim.humans().count();
        let total_developers = sim.members().len();

        let created = sim.prs();
        let ai_created = created.iter().filter(|p| p.is_ai_authored()).count();
        let merged: Vec<&PullRequest> = sim.merged_prs().collect();
        let ai_merged = merged.iter().filter(|p| p.is_ai_authored()).count();
        let reverted: Vec<&PullRequest> = sim.reverted_prs().collect();
        let ai_reverted = reverted.iter().filter(|p| p.is_ai_authored()).count();

        let human_created = created.len() - ai_created;
        let human_merged = merged.len() - ai_merged;
        let human_reverted = reverted.len() - ai_reverted;

        let ai_total_cost: f64 = sim.ai_agents().map(|a| a.total_cost_incurred).sum();

        let debt = sim.debt().stats();

        let incidents = sim.incidents();
        let resolve_times: Vec<u64> = incidents
            .iter()
            .filter_map(|i| i.time_to_resolve())
            .collect();
        let resolved_incidents = resolve_times.len();
        let mttr = ratio(
            resolve_times.iter().sum::<u64>() as f64,
            resolved_incidents as f64,
        );

        Self {
            current_day: day,
            current_week: day / 7,

            total_developers,
            human_developers,
            ai_agents,

            total_prs_created: created.len(),
            total_prs_merged: merged.len(),
            total_prs_reverted: reverted.len(),
            open_prs: sim.open_prs().count(),
            avg_cycle_time_days: round_to(average_cycle_time(merged.iter().copied()), 2),
            change_failure_rate: round_to(
                ratio(reverted.len() as f64, merged.len() as f64),
                3,
            ),
            prs_per_week: round_to(merged.len() as f64 / weeks, 2),
            communication_overhead: round_to(sim.communication_overhead(), 2),

            human_prs_created: human_created,
            human_prs_merged: human_merged,
            human_prs_reverted: human_reverted,
            human_failure_rate: round_to(
                ratio(human_reverted as f64, human_merged as f64),
                3,
            ),
            human_prs_per_week: round_to(human_merged as f64 / weeks, 2),
            human_avg_cycle_time_days: round_to(
                average_cycle_time(merged.iter().copied().filter(|p| !p.is_ai_authored())),
                2,
            ),
            human_total_cost: 0.0,
            human_avg_cost_per_pr: 0.0,

            ai_prs_created: ai_created,
            ai_prs_merged: ai_merged,
            ai_prs_reverted: ai_reverted,
            ai_failure_rate: round_to(ratio(ai_reverted as f64, ai_merged as f64), 3),
            ai_prs_per_week: round_to(ai_merged as f64 / weeks, 2),
            ai_avg_cycle_time_days: round_to(
                average_cycle_time(merged.iter().copied().filter(|p| p.is_ai_authored())),
                2,
            ),
            ai_total_cost: round_to(ai_total_cost, 2),
            ai_avg_cost_per_pr: round_to(ratio(ai_total_cost, ai_created as f64), 2),

            tech_debt_count: debt.active_debt_count,
            tech_debt_productivity_impact: round_to(debt.productivity_impact, 3),
            tech_debt_total_created: debt.total_debt_created,
            tech_debt_total_paid: debt.total_debt_paid,
            tech_debt_effort_to_fix: round_to(debt.total_effort_to_fix, 2),

            total_incidents: incidents.len(),
            active_incidents: incidents.len() - resolved_incidents,
            resolved_incidents,
            avg_mttr_days: round_to(mttr, 2),
        }
    }

    /// Named numeric view used for scenario comparison.
    pub fn value(&self, key: &str) -> Option<f64> {
        let value = match key {
            "total_developers" => self.total_developers as f64,
            "human_developers" => self.human_developers as f64,
            "ai_agents" => self.ai_agents as f64,
            "total_prs_created" => self.total_prs_created as f64,
            "total_prs_merged" => self.total_prs_merged as f64,
            "total_prs_reverted" => self.total_prs_reverted as f64,
            "open_prs" => self.open_prs as f64,
            "avg_cycle_time_days" => self.avg_cycle_time_days,
            "change_failure_rate" => self.change_failure_rate,
            "prs_per_week" => self.prs_per_week,
            "communication_overhead" => self.communication_overhead,
            "human_prs_per_week" => self.human_prs_per_week,
            "ai_prs_per_week" => self.ai_prs_per_week,
            "ai_total_cost" => self.ai_total_cost,
            "ai_avg_cost_per_pr" => self.ai_avg_cost_per_pr,
            "tech_debt_count" => self.tech_debt_count as f64,
            "total_incidents" => self.total_incidents as f64,
            "avg_mttr_days" => self.avg_mttr_days,
            _ => return None,
        };
        Some(value)
    }
}
