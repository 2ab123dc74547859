//! SDLC Orchestrator
//! =================
//!
//! Drives one simulated team through the delivery loop. Each day:
//!
//! 1. every member takes a turn (may open a PR, may finish reviews)
//! 2. reviewers are assigned to open PRs
//! 3. approved PRs are merged
//! 4. latent defects in recent merges are discovered and reverted
//! 5. unreverted defects may turn into technical debt
//! 6. production incidents are rolled
//! 7. the clock advances
//!
//! The orchestrator owns every registry (PRs, reviews, incidents, debt).
//! Members only hold ids. All randomness comes from streams derived from
//! one master seed, so a seeded run is reproducible end to end.

use crate::clock::{Clock, StopHandle};
use crate::debt::DebtLedger;
use crate::events::{EventKind, EventLog};
use crate::member::{AiAgentConfig, DeveloperConfig, TeamMember, TurnOutcome};
use crate::metrics::MetricsSnapshot;
use crate::overhead::CommunicationOverheadModel;
use crate::work::{CodeReview, Incident, PrState, PullRequest, Severity};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use simlab_env::{
    derive_rng, AgentId, ConfigError, DebtId, IncidentId, Participant, PrId, ReviewId, SimRng,
    StepContext,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// RNG stream used by the orchestrator's own passes.
const ORCHESTRATOR_STREAM: u64 = 0x0C0C_0000;

/// First RNG stream handed to members; member `i` gets `MEMBER_STREAM_BASE + i`.
const MEMBER_STREAM_BASE: u64 = 0x1000;

/// Days after a merge during which defects can surface.
const DISCOVERY_WINDOW_DAYS: u64 = 7;

/// Daily chance that a latent defect in the window is found.
const DAILY_DISCOVERY_PROBABILITY: f64 = 0.10;

/// Incident likelihood grows by this much per recent revert.
const REVERT_INCIDENT_FACTOR: f64 = 0.1;

/// Run-wide parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub name: String,

    /// Recorded with the run; one tick is always one day
    pub timestep_days: u32,

    pub seed: Option<u64>,

    /// Information lost in team communication, in [0, 1]
    pub communication_loss_factor: f64,

    pub overhead_model: CommunicationOverheadModel,

    /// Chance per member per week of an incident
    pub incident_rate: f64,

    /// Chance per day that a defective merge creates debt
    pub tech_debt_accumulation_rate: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            name: "SDLC Simulation".to_string(),
            timestep_days: 1,
            seed: None,
            communication_loss_factor: 0.3,
            overhead_model: CommunicationOverheadModel::Quadratic,
            incident_rate: 0.05,
            tech_debt_accumulation_rate: 0.15,
        }
    }
}

impl SimulationParams {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_overhead_model(mut self, model: CommunicationOverheadModel) -> Self {
        self.overhead_model = model;
        self
    }

    pub fn with_incident_rate(mut self, rate: f64) -> Self {
        self.incident_rate = rate;
        self
    }

    pub fn with_tech_debt_rate(mut self, rate: f64) -> Self {
        self.tech_debt_accumulation_rate = rate;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestep_days < 1 {
            return Err(ConfigError::out_of_range(
                "timestep_days",
                f64::from(self.timestep_days),
                1.0,
                f64::INFINITY,
            ));
        }
        ConfigError::check_range(
            "communication_loss_factor",
            self.communication_loss_factor,
            0.0,
            1.0,
        )?;
        ConfigError::check_range("incident_rate", self.incident_rate, 0.0, 1.0)?;
        ConfigError::check_range(
            "tech_debt_accumulation_rate",
            self.tech_debt_accumulation_rate,
            0.0,
            1.0,
        )?;
        Ok(())
    }
}

/// One team, one run.
pub struct SdlcSimulation {
    params: SimulationParams,
    clock: Clock<TeamMember>,
    rng: SimRng,
    next_member_stream: u64,

    prs: Vec<PullRequest>,
    pr_index: HashMap<PrId, usize>,
    open_prs: Vec<PrId>,
    merged_prs: Vec<PrId>,
    reverted_prs: Vec<PrId>,

    reviews: Vec<CodeReview>,
    review_index: HashMap<ReviewId, usize>,

    debt: DebtLedger,
    incidents: Vec<Incident>,
}

impl SdlcSimulation {
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let clock = Clock::new(params.seed);
        let rng = derive_rng(clock.master_seed(), ORCHESTRATOR_STREAM);
        Ok(Self {
            params,
            clock,
            rng,
            next_member_stream: 0,
            prs: Vec::new(),
            pr_index: HashMap::new(),
            open_prs: Vec::new(),
            merged_prs: Vec::new(),
            reverted_prs: Vec::new(),
            reviews: Vec::new(),
            review_index: HashMap::new(),
            debt: DebtLedger::new(),
            incidents: Vec::new(),
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// The seed all of this run's streams derive from.
    pub fn master_seed(&self) -> u64 {
        self.clock.master_seed()
    }

    // =========================================================================
    // TEAM
    // =========================================================================

    /// Next member RNG stream, by admission order.
    pub fn member_rng(&mut self) -> SimRng {
        let rng = derive_rng(
            self.clock.master_seed(),
            MEMBER_STREAM_BASE + self.next_member_stream,
        );
        self.next_member_stream += 1;
        rng
    }

    pub fn add_developer(&mut self, config: DeveloperConfig) -> Result<AgentId, ConfigError> {
        let rng = self.member_rng();
        let member = TeamMember::developer(config, rng)?;
        Ok(self.add_member(member))
    }

    pub fn add_ai_agent(&mut self, config: &AiAgentConfig) -> Result<AgentId, ConfigError> {
        let rng = self.member_rng();
        let member = TeamMember::ai_agent(config, rng)?;
        Ok(self.add_member(member))
    }

    /// Admits an already-built member.
    pub fn add_member(&mut self, member: TeamMember) -> AgentId {
        self.clock.add(member)
    }

    pub fn remove_member(&mut self, id: AgentId) -> Option<TeamMember> {
        self.clock.remove(id)
    }

    pub fn members(&self) -> &[TeamMember] {
        self.clock.participants()
    }

    pub fn member(&self, id: AgentId) -> Option<&TeamMember> {
        self.clock.get(id)
    }

    pub fn humans(&self) -> impl Iterator<Item = &TeamMember> {
        self.members().iter().filter(|m| !m.is_ai())
    }

    pub fn ai_agents(&self) -> impl Iterator<Item = &TeamMember> {
        self.members().iter().filter(|m| m.is_ai())
    }

    // =========================================================================
    // TIME
    // =========================================================================

    pub fn current_day(&self) -> u64 {
        self.clock.current_day()
    }

    pub fn context(&self) -> StepContext {
        self.clock.context()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.clock.stop_handle()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Runs one simulated day.
    pub fn step(&mut self) {
        let day = self.clock.current_day();

        let turns = self.clock.take_turns();
        self.absorb_turns(turns, day);

        self.assign_reviewers(day);
        self.process_merges(day);
        self.process_quality_issues(day);
        self.generate_technical_debt(day);
        self.generate_incidents(day);

        self.clock.advance();
    }

    /// Runs up to `days` days. Returns the number of days executed.
    pub fn run(&mut self, days: u64) -> u64 {
        self.run_observed(days, 0, |_| {})
    }

    /// Runs up to `days` days, handing a metrics snapshot to `observer`
    /// after every `every` days (never, if `every` is 0). Stops early when
    /// the stop handle fires.
    pub fn run_observed<F>(&mut self, days: u64, every: u64, mut observer: F) -> u64
    where
        F: FnMut(&MetricsSnapshot),
    {
        info!(
            name = %self.params.name,
            members = self.members().len(),
            days,
            "Simulation starting"
        );
        self.clock.begin_run();

        let mut executed = 0;
        for _ in 0..days {
            if self.clock.should_stop() {
                info!(day = self.current_day(), "Simulation stopped early");
                break;
            }
            self.step();
            executed += 1;
            if every > 0 && executed % every == 0 {
                observer(&self.metrics());
            }
        }

        self.clock.end_run();
        info!(
            day = self.current_day(),
            merged = self.merged_prs.len(),
            reverted = self.reverted_prs.len(),
            "Simulation finished"
        );
        executed
    }

    /// Back to day 0 with an empty team and empty registries.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.rng = derive_rng(self.clock.master_seed(), ORCHESTRATOR_STREAM);
        self.next_member_stream = 0;
        self.prs.clear();
        self.pr_index.clear();
        self.open_prs.clear();
        self.merged_prs.clear();
        self.reverted_prs.clear();
        self.reviews.clear();
        self.review_index.clear();
        self.debt = DebtLedger::new();
        self.incidents.clear();
    }

    // =========================================================================
    // PASSES
    // =========================================================================

    fn absorb_turns(&mut self, turns: Vec<TurnOutcome>, day: u64) {
        for outcome in turns {
            for pr in outcome.created {
                self.register_pr(pr, day);
            }
            for review_id in outcome.completed_reviews {
                match self.review_index.get(&review_id) {
                    Some(&idx) => self.reviews[idx].complete(day, true),
                    None => debug!(review = %review_id, "Completed review is unknown"),
                }
            }
        }
    }

    fn register_pr(&mut self, pr: PullRequest, day: u64) {
        let pr_id = pr.id;
        let author_id = pr.author_id;
        self.pr_index.insert(pr_id, self.prs.len());
        if pr.state == PrState::Open {
            self.open_prs.push(pr_id);
        }
        self.prs.push(pr);
        self.clock.events_mut().log(
            EventKind::PrCreated,
            day,
            Some(author_id),
            json!({ "pr_id": pr_id }),
        );
        debug!(pr = %pr_id, author = %author_id, day, "PR created");
    }

    fn assign_reviewers(&mut self, day: u64) {
        let needing_review: Vec<usize> = self
            .open_prs
            .iter()
            .filter_map(|id| self.pr_index.get(id).copied())
            .filter(|&idx| {
                let pr = &self.prs[idx];
                pr.state == PrState::Open && pr.reviewers.len() < pr.required_approvals
            })
            .collect();

        for idx in needing_review {
            let pr = &self.prs[idx];
            let Some(author) = self.clock.get(pr.author_id) else {
                debug!(pr = %pr.id, "Author unknown, skipping review assignment");
                continue;
            };
            let is_ai_pr = pr.is_ai_authored();

            let pool: Vec<AgentId> = self
                .clock
                .participants()
                .iter()
                .filter(|m| m.id() != pr.author_id && !pr.reviewers.contains(&m.id()))
                .filter(|m| {
                    if is_ai_pr {
                        !m.is_ai()
                    } else {
                        !m.is_ai() || m.can_review(pr)
                    }
                })
                .map(|m| m.id())
                .collect();

            let Some(&reviewer_id) = pool.choose(&mut self.rng) else {
                continue;
            };

            let supervision = author.supervision_hours_for_pr(pr);
            let author_id = pr.author_id;
            let pr_id = pr.id;

            let review_id = ReviewId::from_rng(&mut self.rng);
            let mut review = CodeReview::new(review_id, pr_id, reviewer_id, day);
            if let Some(hours) = supervision {
                review.time_invested = hours;
                if let Some(author) = self.clock.get_mut(author_id) {
                    author.record_supervision(hours);
                }
            }
            self.review_index.insert(review_id, self.reviews.len());
            self.reviews.push(review);

            let mut reviewer_is_ai = false;
            if let Some(reviewer) = self.clock.get_mut(reviewer_id) {
                reviewer.assign_review(review_id);
                reviewer_is_ai = reviewer.is_ai();
            }

            let pr = &mut self.prs[idx];
            pr.reviewers.push(reviewer_id);
            if let Err(err) = pr.start_review() {
                warn!(%err, "Review start refused");
            }

            self.clock.events_mut().log(
                EventKind::ReviewAssigned,
                day,
                Some(reviewer_id),
                json!({
                    "pr_id": pr_id,
                    "author_id": author_id,
                    "is_ai_pr": is_ai_pr,
                    "reviewer_is_ai": reviewer_is_ai,
                }),
            );
            debug!(pr = %pr_id, reviewer = %reviewer_id, "Reviewer assigned");
        }
    }

    fn process_merges(&mut self, day: u64) {
        let mut approvals: HashMap<PrId, Vec<AgentId>> = HashMap::new();
        for review in self.reviews.iter().filter(|r| r.is_complete() && r.approved) {
            approvals.entry(review.pr_id).or_default().push(review.reviewer_id);
        }

        for pr_id in self.open_prs.clone() {
            let Some(approvers) = approvals.get(&pr_id) else {
                continue;
            };
            let Some(&idx) = self.pr_index.get(&pr_id) else {
                continue;
            };

            let pr = &mut self.prs[idx];
            for approver in approvers {
                if let Err(err) = pr.add_approval(*approver) {
                    warn!(%err, "Approval refused");
                }
            }
            if pr.state != PrState::Approved {
                continue;
            }

            let author_id = pr.author_id;
            let Some(author) = self.clock.get_mut(author_id) else {
                debug!(pr = %pr_id, "Author unknown, leaving PR unmerged");
                continue;
            };
            if let Err(err) = pr.merge(day) {
                warn!(%err, "Merge refused");
                continue;
            }
            author.record_merge(pr_id);
            let cycle_time = pr.cycle_time();

            self.open_prs.retain(|id| *id != pr_id);
            self.merged_prs.push(pr_id);
            self.clock.events_mut().log(
                EventKind::PrMerged,
                day,
                Some(author_id),
                json!({ "pr_id": pr_id, "cycle_time": cycle_time }),
            );
            debug!(pr = %pr_id, ?cycle_time, "PR merged");
        }
    }

    /// Merged PRs inside the discovery window, in merge order.
    fn recently_merged(&self, day: u64) -> Vec<usize> {
        let cutoff = day.saturating_sub(DISCOVERY_WINDOW_DAYS);
        self.merged_prs
            .iter()
            .filter_map(|id| self.pr_index.get(id).copied())
            .filter(|&idx| {
                let pr = &self.prs[idx];
                pr.merged_at.is_some_and(|merged| merged >= cutoff) && !pr.was_reverted
            })
            .collect()
    }

    fn process_quality_issues(&mut self, day: u64) {
        let at_risk: Vec<usize> = self
            .recently_merged(day)
            .into_iter()
            .filter(|&idx| !self.prs[idx].will_succeed)
            .collect();

        for idx in at_risk {
            if self.rng.gen::<f64>() >= DAILY_DISCOVERY_PROBABILITY {
                continue;
            }

            let pr = &mut self.prs[idx];
            let pr_id = pr.id;
            let author_id = pr.author_id;
            let Some(author) = self.clock.get_mut(author_id) else {
                debug!(pr = %pr_id, "Author unknown, skipping revert");
                continue;
            };

            let merged_at = pr.merged_at.unwrap_or(day);
            if let Err(err) = pr.revert(day) {
                warn!(%err, "Revert refused");
                continue;
            }
            author.record_revert();

            self.merged_prs.retain(|id| *id != pr_id);
            self.reverted_prs.push(pr_id);
            let days_after_merge = day.saturating_sub(merged_at);
            self.clock.events_mut().log(
                EventKind::PrReverted,
                day,
                Some(author_id),
                json!({ "pr_id": pr_id, "days_after_merge": days_after_merge }),
            );
            debug!(pr = %pr_id, days_after_merge, "PR reverted");
        }
    }

    fn generate_technical_debt(&mut self, day: u64) {
        for idx in self.recently_merged(day) {
            let pr = &self.prs[idx];
            if pr.will_succeed {
                continue;
            }
            if self.rng.gen::<f64>() >= self.params.tech_debt_accumulation_rate {
                continue;
            }

            let pr_id = pr.id;
            let author_id = pr.author_id;
            let Some(author) = self.clock.get(author_id) else {
                continue;
            };
            let severity = 2.0 - author.config().code_quality;

            let debt_id = DebtId::from_rng(&mut self.rng);
            self.debt.add_debt(debt_id, day, Some(pr_id), severity);
            self.clock.events_mut().log(
                EventKind::TechDebtCreated,
                day,
                Some(author_id),
                json!({ "debt_id": debt_id, "pr_id": pr_id, "severity": severity }),
            );
            debug!(debt = %debt_id, pr = %pr_id, severity, "Technical debt created");
        }
    }

    /// Today's per-member incident probability.
    pub fn incident_probability(&self) -> f64 {
        let day = self.current_day();
        let cutoff = day.saturating_sub(DISCOVERY_WINDOW_DAYS);
        let recent_reverts = self
            .reverted_prs()
            .filter(|pr| pr.reverted_at.is_some_and(|at| at >= cutoff))
            .count();

        let daily_rate = self.params.incident_rate / 7.0;
        let debt_multiplier = 1.0 + self.debt.total_productivity_impact();
        let quality_multiplier = 1.0 + REVERT_INCIDENT_FACTOR * recent_reverts as f64;
        daily_rate * debt_multiplier * quality_multiplier
    }

    fn generate_incidents(&mut self, day: u64) {
        let probability = self.incident_probability();
        let team: Vec<AgentId> = self.members().iter().map(|m| m.id()).collect();

        for _ in 0..team.len() {
            if self.rng.gen::<f64>() >= probability {
                continue;
            }

            let severity = Severity::from_roll(self.rng.gen::<f64>());
            let incident_id = IncidentId::from_rng(&mut self.rng);
            let mut incident = Incident::new(incident_id, day, severity);

            if severity == Severity::Critical {
                let responders = team.len().min(self.rng.gen_range(2..=3));
                for id in team.choose_multiple(&mut self.rng, responders) {
                    incident.assign(*id);
                }
            } else if let Some(id) = team.choose(&mut self.rng) {
                incident.assign(*id);
            }

            self.clock.events_mut().log(
                EventKind::IncidentCreated,
                day,
                None,
                json!({
                    "incident_id": incident_id,
                    "severity": severity,
                    "assigned_to": incident.assigned_to,
                }),
            );
            debug!(incident = %incident_id, %severity, "Incident created");
            self.incidents.push(incident);
        }
    }

    // =========================================================================
    // INCIDENT AND DEBT OPERATIONS
    // =========================================================================

    /// Resolves an open incident today. Returns false if unknown or
    /// already resolved.
    pub fn resolve_incident(&mut self, id: IncidentId) -> bool {
        let day = self.current_day();
        match self.incidents.iter_mut().find(|i| i.id == id) {
            Some(incident) if !incident.is_resolved() => {
                incident.resolve(day);
                true
            }
            _ => false,
        }
    }

    /// Logs response hours against an incident.
    pub fn add_incident_work(&mut self, id: IncidentId, hours: f64) -> bool {
        match self.incidents.iter_mut().find(|i| i.id == id) {
            Some(incident) => {
                incident.add_work(hours);
                true
            }
            None => false,
        }
    }

    pub fn pay_off_debt(&mut self, id: DebtId) -> bool {
        let day = self.current_day();
        self.debt.pay_off_debt(id, day)
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    pub fn prs(&self) -> &[PullRequest] {
        &self.prs
    }

    pub fn pr(&self, id: PrId) -> Option<&PullRequest> {
        self.pr_index.get(&id).map(|&idx| &self.prs[idx])
    }

    fn lookup<'a>(&'a self, ids: &'a [PrId]) -> impl Iterator<Item = &'a PullRequest> + 'a {
        ids.iter().filter_map(move |id| self.pr(*id))
    }

    /// PRs awaiting merge, in creation order.
    pub fn open_prs(&self) -> impl Iterator<Item = &PullRequest> {
        self.lookup(&self.open_prs)
    }

    /// Currently merged PRs, in merge order.
    pub fn merged_prs(&self) -> impl Iterator<Item = &PullRequest> {
        self.lookup(&self.merged_prs)
    }

    pub fn reverted_prs(&self) -> impl Iterator<Item = &PullRequest> {
        self.lookup(&self.reverted_prs)
    }

    pub fn reviews(&self) -> &[CodeReview] {
        &self.reviews
    }

    pub fn review(&self, id: ReviewId) -> Option<&CodeReview> {
        self.review_index.get(&id).map(|&idx| &self.reviews[idx])
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn debt(&self) -> &DebtLedger {
        &self.debt
    }

    pub fn events(&self) -> &EventLog {
        self.clock.events()
    }

    /// Overhead factor for the current headcount.
    pub fn communication_overhead(&self) -> f64 {
        self.params.overhead_model.calculate(self.members().len())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot::collect(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::AiModelType;
    use approx::assert_relative_eq;

    fn seeded(seed: u64) -> SdlcSimulation {
        SdlcSimulation::new(SimulationParams::default().with_seed(seed)).unwrap()
    }

    fn onboarded() -> DeveloperConfig {
        DeveloperConfig::default().with_onboarding_time(0)
    }

    #[test]
    fn test_params_validation() {
        let mut params = SimulationParams::default();
        params.communication_loss_factor = 1.5;
        assert!(SdlcSimulation::new(params).is_err());

        let params = SimulationParams {
            timestep_days: 0,
            ..SimulationParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_single_developer_week() {
        let mut sim = seeded(42);
        let dev = sim.add_developer(onboarded()).unwrap();
        sim.run(7);

        let member = sim.member(dev).unwrap();
        assert!(member.total_prs_created >= 1);
        assert!(member.total_prs_created >= member.total_prs_merged);
        // Nobody else can review, so nothing merges
        assert_eq!(sim.merged_prs().count(), 0);
        assert_eq!(sim.reviews().len(), 0);
    }

    #[test]
    fn test_empty_team_runs() {
        let mut sim = seeded(1);
        assert_eq!(sim.run(7), 7);
        assert_eq!(sim.current_day(), 7);
        assert!(sim.prs().is_empty());
        assert!(sim.incidents().is_empty());
    }

    #[test]
    fn test_reviews_lead_to_merges() {
        let mut sim = seeded(7);
        for _ in 0..4 {
            sim.add_developer(onboarded()).unwrap();
        }
        sim.run(28);

        assert!(sim.merged_prs().count() + sim.reverted_prs().count() > 0);
        for review in sim.reviews() {
            let pr = sim.pr(review.pr_id).unwrap();
            assert_ne!(review.reviewer_id, pr.author_id);
        }
        for pr in sim.merged_prs() {
            assert_eq!(pr.state, PrState::Merged);
            assert!(pr.merged_at.is_some());
            assert!(pr.approvals.len() >= pr.required_approvals);
        }
        for pr in sim.reverted_prs() {
            assert!(pr.was_reverted);
            assert!(pr.merged_at.is_none());
        }
    }

    #[test]
    fn test_ai_prs_reviewed_by_humans_only() {
        let mut sim = seeded(11);
        sim.add_developer(onboarded()).unwrap();
        sim.add_ai_agent(&AiAgentConfig::new(AiModelType::ClaudeSonnet))
            .unwrap();
        sim.add_ai_agent(&AiAgentConfig::new(AiModelType::Gpt4).reviewing_human_prs(5.0))
            .unwrap();
        sim.run(21);

        for review in sim.reviews() {
            let pr = sim.pr(review.pr_id).unwrap();
            let reviewer = sim.member(review.reviewer_id).unwrap();
            if pr.is_ai_authored() {
                assert!(!reviewer.is_ai());
                assert!(review.time_invested > 0.0);
            }
        }
        let ai_cost: f64 = sim.ai_agents().map(|a| a.total_cost_incurred).sum();
        assert!(ai_cost > 0.0);
    }

    #[test]
    fn test_same_seed_same_history() {
        let build = || {
            let mut sim = seeded(99);
            for _ in 0..5 {
                sim.add_developer(onboarded()).unwrap();
            }
            sim.add_ai_agent(&AiAgentConfig::default()).unwrap();
            sim.run(35);
            sim
        };
        let a = build();
        let b = build();

        let ids_a: Vec<PrId> = a.prs().iter().map(|p| p.id).collect();
        let ids_b: Vec<PrId> = b.prs().iter().map(|p| p.id).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.merged_prs().count(), b.merged_prs().count());
        assert_eq!(a.events().len(), b.events().len());
        assert_eq!(a.incidents().len(), b.incidents().len());
    }

    #[test]
    fn test_stop_handle_halts_run() {
        let mut sim = seeded(3);
        sim.add_developer(onboarded()).unwrap();
        let handle = sim.stop_handle();

        let executed = sim.run_observed(30, 5, |snapshot| {
            if snapshot.current_day >= 10 {
                handle.stop();
            }
        });
        assert_eq!(executed, 10);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_incident_and_debt_operations() {
        let mut sim = SdlcSimulation::new(
            SimulationParams::default()
                .with_seed(5)
                .with_incident_rate(1.0)
                .with_tech_debt_rate(1.0),
        )
        .unwrap();
        for _ in 0..6 {
            sim.add_developer(onboarded().with_code_quality(0.3)).unwrap();
        }
        sim.run(42);

        assert!(!sim.incidents().is_empty());
        for incident in sim.incidents() {
            let expected = if incident.severity == Severity::Critical { 2..=3 } else { 1..=1 };
            assert!(expected.contains(&incident.assigned_to.len()));
        }

        let first = sim.incidents()[0].id;
        assert!(sim.add_incident_work(first, 3.0));
        assert!(sim.resolve_incident(first));
        assert!(!sim.resolve_incident(first));
        assert!(sim.metrics().resolved_incidents >= 1);

        let impact = sim.debt().total_productivity_impact();
        assert!((0.0..=0.5).contains(&impact));
        if let Some(item) = sim.debt().items().first() {
            let id = item.id;
            assert!(sim.pay_off_debt(id));
        }
    }

    #[test]
    fn test_events_recorded_per_kind() {
        let mut sim = seeded(8);
        for _ in 0..3 {
            sim.add_developer(onboarded()).unwrap();
        }
        sim.run(14);

        let events = sim.events();
        assert_eq!(events.count(EventKind::AgentAdded), 3);
        assert_eq!(events.count(EventKind::PrCreated), sim.prs().len());
        assert_eq!(events.count(EventKind::ReviewAssigned), sim.reviews().len());
    }

    #[test]
    fn test_removed_author_pr_never_merges() {
        let mut sim = seeded(21);
        let author = sim.add_developer(onboarded().with_productivity_rate(5.0)).unwrap();
        sim.add_developer(onboarded().with_productivity_rate(0.0)).unwrap();
        sim.step();
        assert_eq!(sim.prs().len(), 1);

        sim.remove_member(author);
        sim.run(14);
        assert_eq!(sim.merged_prs().count(), 0);
        assert_eq!(sim.open_prs().count(), 1);
    }

    #[test]
    fn test_reset_clears_registries() {
        let mut sim = seeded(4);
        sim.add_developer(onboarded()).unwrap();
        sim.run(5);
        sim.reset();
        assert_eq!(sim.current_day(), 0);
        assert!(sim.members().is_empty());
        assert!(sim.prs().is_empty());
        assert!(sim.events().is_empty());
    }

    /// Puts a defective PR straight into the merged registry.
    fn insert_merged(
        sim: &mut SdlcSimulation,
        author: AgentId,
        reviewer: AgentId,
        merged_on: u64,
    ) -> PrId {
        let id = PrId::from_seed(sim.prs.len() as u64 + 1);
        let mut pr = PullRequest::opened(id, author, merged_on, false);
        pr.start_review().unwrap();
        pr.add_approval(reviewer).unwrap();
        pr.merge(merged_on).unwrap();
        sim.pr_index.insert(id, sim.prs.len());
        sim.prs.push(pr);
        sim.merged_prs.push(id);
        id
    }

    fn insert_reverted(
        sim: &mut SdlcSimulation,
        author: AgentId,
        reviewer: AgentId,
        reverted_on: u64,
    ) -> PrId {
        let id = insert_merged(sim, author, reviewer, reverted_on);
        let idx = sim.pr_index[&id];
        sim.prs[idx].revert(reverted_on).unwrap();
        sim.merged_prs.retain(|p| *p != id);
        sim.reverted_prs.push(id);
        id
    }

    fn debt_prone(seed: u64) -> (SdlcSimulation, AgentId, AgentId) {
        let mut sim = SdlcSimulation::new(
            SimulationParams::default()
                .with_seed(seed)
                .with_tech_debt_rate(1.0),
        )
        .unwrap();
        let author = sim.add_developer(onboarded().with_code_quality(0.4)).unwrap();
        let reviewer = sim.add_developer(onboarded()).unwrap();
        (sim, author, reviewer)
    }

    #[test]
    fn test_defects_outside_window_stay_merged() {
        let (mut sim, author, reviewer) = debt_prone(12);
        let old = insert_merged(&mut sim, author, reviewer, 0);

        // Day 8: the window starts at day 1
        for _ in 0..200 {
            sim.process_quality_issues(8);
            sim.generate_technical_debt(8);
        }
        let pr = sim.pr(old).unwrap();
        assert_eq!(pr.state, PrState::Merged);
        assert!(!pr.was_reverted);
        assert_eq!(sim.debt().items().len(), 0);
        assert_eq!(sim.events().count(EventKind::PrReverted), 0);

        // Same defect merged on the window's first day is still in play
        let recent = insert_merged(&mut sim, author, reviewer, 1);
        sim.generate_technical_debt(8);
        assert_eq!(sim.debt().items().len(), 1);
        assert_eq!(sim.debt().items()[0].caused_by_pr, Some(recent));
        assert_relative_eq!(sim.debt().items()[0].severity, 1.6);
    }

    #[test]
    fn test_reverted_prs_never_create_debt() {
        let (mut sim, author, reviewer) = debt_prone(13);
        let id = insert_merged(&mut sim, author, reviewer, 2);

        let mut passes = 0;
        while sim.pr(id).unwrap().state != PrState::Reverted {
            sim.process_quality_issues(3);
            passes += 1;
            assert!(passes < 1000, "defect never discovered");
        }
        assert!(sim.pr(id).unwrap().was_reverted);
        assert_eq!(sim.member(author).unwrap().total_prs_reverted, 1);

        for _ in 0..50 {
            sim.generate_technical_debt(3);
        }
        assert!(sim.debt().items().is_empty());
    }

    #[test]
    fn test_incident_probability_multipliers() {
        let (mut sim, author, reviewer) = debt_prone(14);
        for _ in 0..4 {
            sim.clock.advance();
        }
        let base = 0.05 / 7.0;
        assert_relative_eq!(sim.incident_probability(), base);

        // Two items of severity 5: impact 0.10
        sim.debt.add_debt(DebtId::from_seed(1), 0, None, 5.0);
        sim.debt.add_debt(DebtId::from_seed(2), 0, None, 5.0);
        assert_relative_eq!(sim.incident_probability(), base * 1.10);

        // Three reverts inside the last week
        for _ in 0..3 {
            insert_reverted(&mut sim, author, reviewer, 2);
        }
        assert_relative_eq!(sim.incident_probability(), base * 1.10 * 1.3);

        // A week later those reverts no longer count
        for _ in 0..6 {
            sim.clock.advance();
        }
        assert_eq!(sim.current_day(), 10);
        assert_relative_eq!(sim.incident_probability(), base * 1.10);

        // Debt impact is capped at 0.50
        for i in 0..10 {
            sim.debt.add_debt(DebtId::from_seed(10 + i), 0, None, 10.0);
        }
        assert_relative_eq!(sim.incident_probability(), base * 1.5);
    }
}
