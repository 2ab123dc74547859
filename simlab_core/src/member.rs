//! Team members: human developers and AI coding agents.
//!
//! Both are a [`TeamMember`]. What differs is configuration and a small set
//! of [`Capabilities`] flags, not the turn logic:
//!
//! | capability           | human | AI    |
//! |----------------------|-------|-------|
//! | reviews by default   | yes   | no    |
//! | onboarding curve     | yes   | no    |
//! | work days per week   | 5     | 7     |
//!
//! A turn never touches shared state. It returns a [`TurnOutcome`] that the
//! orchestrator absorbs.

use crate::metrics::round_to;
use crate::work::{PullRequest, META_AI_MODEL, META_CREATED_BY_AI, META_REQUIRES_HUMAN_REVIEW};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use simlab_env::{AgentId, ConfigError, Participant, PrId, ReviewId, SimRng, StepContext};
use std::str::FromStr;

/// Nominal working hours in a week.
const WEEK_HOURS: f64 = 40.0;

/// Human review hours an average AI-authored PR needs at full supervision.
const BASE_SUPERVISION_HOURS: f64 = 2.0;

/// Reviews are worked on a five-day cadence for every member.
const REVIEW_DAYS_PER_WEEK: f64 = 5.0;

// =============================================================================
// EXPERIENCE AND MODEL TYPES
// =============================================================================

/// Seniority of a human developer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    #[default]
    Mid,
    Senior,
    Staff,
    Principal,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 5] = [
        ExperienceLevel::Junior,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Staff,
        ExperienceLevel::Principal,
    ];

    /// Scales the daily PR creation probability.
    pub fn multiplier(&self) -> f64 {
        match self {
            ExperienceLevel::Junior => 0.5,
            ExperienceLevel::Mid => 1.0,
            ExperienceLevel::Senior => 1.3,
            ExperienceLevel::Staff => 1.5,
            ExperienceLevel::Principal => 1.7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Staff => "staff",
            ExperienceLevel::Principal => "principal",
        }
    }

    /// Capitalized form used for generated member names.
    pub fn title(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Staff => "Staff",
            ExperienceLevel::Principal => "Principal",
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ExperienceLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|l| l.name()).collect();
                ConfigError::unknown_variant("experience_level", s, &names)
            })
    }
}

/// The model behind an AI agent, which supplies its default parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiModelType {
    #[default]
    #[serde(rename = "claude-sonnet")]
    ClaudeSonnet,
    #[serde(rename = "claude-opus")]
    ClaudeOpus,
    #[serde(rename = "gpt4")]
    Gpt4,
    #[serde(rename = "codellama")]
    Codellama,
}

impl AiModelType {
    pub const ALL: [AiModelType; 4] = [
        AiModelType::ClaudeSonnet,
        AiModelType::ClaudeOpus,
        AiModelType::Gpt4,
        AiModelType::Codellama,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AiModelType::ClaudeSonnet => "claude-sonnet",
            AiModelType::ClaudeOpus => "claude-opus",
            AiModelType::Gpt4 => "gpt4",
            AiModelType::Codellama => "codellama",
        }
    }

    /// PRs per week, working around the clock.
    pub fn default_productivity_rate(&self) -> f64 {
        match self {
            AiModelType::ClaudeSonnet => 10.0,
            AiModelType::ClaudeOpus => 7.0,
            AiModelType::Gpt4 => 9.0,
            AiModelType::Codellama => 12.0,
        }
    }

    pub fn default_code_quality(&self) -> f64 {
        match self {
            AiModelType::ClaudeSonnet => 0.85,
            AiModelType::ClaudeOpus => 0.88,
            AiModelType::Gpt4 => 0.82,
            AiModelType::Codellama => 0.78,
        }
    }

    /// Fraction of a full human review each PR needs.
    pub fn default_supervision_requirement(&self) -> f64 {
        match self {
            AiModelType::ClaudeSonnet => 0.30,
            AiModelType::ClaudeOpus => 0.20,
            AiModelType::Gpt4 => 0.35,
            AiModelType::Codellama => 0.50,
        }
    }

    /// USD per PR.
    pub fn default_cost_per_pr(&self) -> f64 {
        match self {
            AiModelType::ClaudeSonnet => 0.25,
            AiModelType::ClaudeOpus => 1.20,
            AiModelType::Gpt4 => 0.60,
            AiModelType::Codellama => 0.05,
        }
    }
}

impl std::fmt::Display for AiModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AiModelType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model| model.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.name()).collect();
                ConfigError::unknown_variant("model_type", s, &names)
            })
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Parameters of a human developer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeveloperConfig {
    pub name: Option<String>,
    pub experience_level: ExperienceLevel,

    /// PRs per week at full productivity
    pub productivity_rate: f64,

    /// Probability a PR is sound, in [0, 1]
    pub code_quality: f64,

    /// PRs reviewed per week
    pub review_capacity: f64,

    /// Weeks to full productivity; 0 means already onboarded
    pub onboarding_time: u32,

    /// Effective one-to-one connections
    pub communication_bandwidth: f64,

    /// Share of time available for work, in [0, 1]
    pub availability: f64,

    pub meeting_hours_per_week: f64,
    pub specializations: Vec<String>,
}

impl Default for DeveloperConfig {
    fn default() -> Self {
        Self {
            name: None,
            experience_level: ExperienceLevel::Mid,
            productivity_rate: 3.5,
            code_quality: 0.85,
            review_capacity: 5.0,
            onboarding_time: 10,
            communication_bandwidth: 7.0,
            availability: 0.70,
            meeting_hours_per_week: 5.0,
            specializations: Vec::new(),
        }
    }
}

impl DeveloperConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_experience(mut self, level: ExperienceLevel) -> Self {
        self.experience_level = level;
        self
    }

    pub fn with_productivity_rate(mut self, rate: f64) -> Self {
        self.productivity_rate = rate;
        self
    }

    pub fn with_code_quality(mut self, quality: f64) -> Self {
        self.code_quality = quality;
        self
    }

    pub fn with_review_capacity(mut self, capacity: f64) -> Self {
        self.review_capacity = capacity;
        self
    }

    pub fn with_onboarding_time(mut self, weeks: u32) -> Self {
        self.onboarding_time = weeks;
        self
    }

    pub fn with_availability(mut self, availability: f64) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_meeting_hours(mut self, hours: f64) -> Self {
        self.meeting_hours_per_week = hours;
        self
    }

    /// Checks every numeric field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_non_negative("productivity_rate", self.productivity_rate)?;
        ConfigError::check_range("code_quality", self.code_quality, 0.0, 1.0)?;
        ConfigError::check_non_negative("review_capacity", self.review_capacity)?;
        ConfigError::check_non_negative("communication_bandwidth", self.communication_bandwidth)?;
        ConfigError::check_range("availability", self.availability, 0.0, 1.0)?;
        ConfigError::check_range(
            "meeting_hours_per_week",
            self.meeting_hours_per_week,
            0.0,
            WEEK_HOURS,
        )?;
        Ok(())
    }

    /// Hours available for work in a week after meetings.
    pub fn weekly_hours(&self) -> f64 {
        let meeting_fraction = self.meeting_hours_per_week / WEEK_HOURS;
        WEEK_HOURS * self.availability * (1.0 - meeting_fraction)
    }
}

/// Parameters of an AI agent. Unset rates fall back to the model defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiAgentConfig {
    pub name: Option<String>,
    pub model_type: AiModelType,
    pub productivity_rate: Option<f64>,
    pub code_quality: Option<f64>,
    pub supervision_requirement: Option<f64>,
    pub cost_per_pr: Option<f64>,

    /// Reviews per week; AI agents do not review unless given capacity
    pub review_capacity: f64,

    pub requires_human_review: bool,
    pub can_review_human_prs: bool,
    pub can_review_ai_prs: bool,
    pub specializations: Vec<String>,
}

impl Default for AiAgentConfig {
    fn default() -> Self {
        Self {
            name: None,
            model_type: AiModelType::ClaudeSonnet,
            productivity_rate: None,
            code_quality: None,
            supervision_requirement: None,
            cost_per_pr: None,
            review_capacity: 0.0,
            requires_human_review: true,
            can_review_human_prs: false,
            can_review_ai_prs: false,
            specializations: Vec::new(),
        }
    }
}

impl AiAgentConfig {
    pub fn new(model_type: AiModelType) -> Self {
        Self {
            model_type,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_productivity_rate(mut self, rate: f64) -> Self {
        self.productivity_rate = Some(rate);
        self
    }

    pub fn with_code_quality(mut self, quality: f64) -> Self {
        self.code_quality = Some(quality);
        self
    }

    pub fn with_cost_per_pr(mut self, cost: f64) -> Self {
        self.cost_per_pr = Some(cost);
        self
    }

    /// Lets the agent review human-authored PRs at the given weekly capacity.
    pub fn reviewing_human_prs(mut self, capacity: f64) -> Self {
        self.can_review_human_prs = true;
        self.review_capacity = capacity;
        self
    }

    /// Fills defaults from the model type and validates the result.
    pub fn resolve(&self) -> Result<AiProfile, ConfigError> {
        let model = self.model_type;
        let profile = AiProfile {
            model_type: model,
            productivity_rate: self
                .productivity_rate
                .unwrap_or_else(|| model.default_productivity_rate()),
            code_quality: self
                .code_quality
                .unwrap_or_else(|| model.default_code_quality()),
            supervision_requirement: self
                .supervision_requirement
                .unwrap_or_else(|| model.default_supervision_requirement()),
            cost_per_pr: self.cost_per_pr.unwrap_or_else(|| model.default_cost_per_pr()),
            requires_human_review: self.requires_human_review,
            can_review_human_prs: self.can_review_human_prs,
            can_review_ai_prs: self.can_review_ai_prs,
        };

        ConfigError::check_non_negative("productivity_rate", profile.productivity_rate)?;
        ConfigError::check_range("code_quality", profile.code_quality, 0.0, 1.0)?;
        ConfigError::check_range(
            "supervision_requirement",
            profile.supervision_requirement,
            0.0,
            1.0,
        )?;
        ConfigError::check_non_negative("cost_per_pr", profile.cost_per_pr)?;
        ConfigError::check_non_negative("review_capacity", self.review_capacity)?;
        Ok(profile)
    }

    /// The developer-shaped parameters an AI agent runs with: senior
    /// equivalent, always available, no meetings, no onboarding.
    pub fn to_developer_config(&self, profile: &AiProfile) -> DeveloperConfig {
        DeveloperConfig {
            name: Some(
                self.name
                    .clone()
                    .unwrap_or_else(|| format!("AI-{}", profile.model_type)),
            ),
            experience_level: ExperienceLevel::Senior,
            productivity_rate: profile.productivity_rate,
            code_quality: profile.code_quality,
            review_capacity: self.review_capacity,
            onboarding_time: 0,
            communication_bandwidth: 50.0,
            availability: 1.0,
            meeting_hours_per_week: 0.0,
            specializations: self.specializations.clone(),
        }
    }
}

/// Fully resolved AI agent parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    pub model_type: AiModelType,
    pub productivity_rate: f64,
    pub code_quality: f64,
    pub supervision_requirement: f64,
    pub cost_per_pr: f64,
    pub requires_human_review: bool,
    pub can_review_human_prs: bool,
    pub can_review_ai_prs: bool,
}

/// Behavioural switches that distinguish the two kinds of member.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub reviews_by_default: bool,
    pub onboarding_curve: bool,
    pub work_days_per_week: f64,
}

impl Capabilities {
    pub const HUMAN: Capabilities = Capabilities {
        reviews_by_default: true,
        onboarding_curve: true,
        work_days_per_week: 5.0,
    };

    pub const AI: Capabilities = Capabilities {
        reviews_by_default: false,
        onboarding_curve: false,
        work_days_per_week: 7.0,
    };
}

// =============================================================================
// TEAM MEMBER
// =============================================================================

/// What one member produced in one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// Newly opened PRs, to be registered by the orchestrator
    pub created: Vec<PullRequest>,
    /// Reviews finished (approved) this turn
    pub completed_reviews: Vec<ReviewId>,
}

impl TurnOutcome {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.completed_reviews.is_empty()
    }
}

/// A human developer or an AI agent.
#[derive(Debug, Clone)]
pub struct TeamMember {
    id: AgentId,
    config: DeveloperConfig,
    capabilities: Capabilities,
    ai: Option<AiProfile>,
    rng: SimRng,
    created_at: Option<u64>,

    pub weeks_in_role: u32,
    pub is_fully_onboarded: bool,
    pub productivity_multiplier: f64,
    pub hours_available_this_week: f64,

    pub active_prs: Vec<PrId>,
    pub pending_reviews: Vec<ReviewId>,

    pub total_prs_created: usize,
    pub total_prs_merged: usize,
    pub total_prs_reverted: usize,
    pub total_reviews_completed: usize,

    /// USD, AI agents only
    pub total_cost_incurred: f64,

    /// Human review hours requested by this member's PRs
    pub total_supervision_hours: f64,
}

impl TeamMember {
    /// Creates a human developer. The id is drawn from `rng`, which the
    /// member keeps for all its later draws.
    pub fn developer(config: DeveloperConfig, mut rng: SimRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let id = AgentId::from_rng(&mut rng);
        Ok(Self::with_parts(id, config, Capabilities::HUMAN, None, rng))
    }

    /// Creates an AI agent from its model defaults and overrides.
    pub fn ai_agent(config: &AiAgentConfig, mut rng: SimRng) -> Result<Self, ConfigError> {
        let profile = config.resolve()?;
        let dev_config = config.to_developer_config(&profile);
        let id = AgentId::from_rng(&mut rng);
        let mut member = Self::with_parts(id, dev_config, Capabilities::AI, Some(profile), rng);
        member.is_fully_onboarded = true;
        member.productivity_multiplier = 1.0;
        Ok(member)
    }

    fn with_parts(
        id: AgentId,
        config: DeveloperConfig,
        capabilities: Capabilities,
        ai: Option<AiProfile>,
        rng: SimRng,
    ) -> Self {
        Self {
            id,
            config,
            capabilities,
            ai,
            rng,
            created_at: None,
            weeks_in_role: 0,
            is_fully_onboarded: false,
            productivity_multiplier: 1.0,
            hours_available_this_week: 0.0,
            active_prs: Vec::new(),
            pending_reviews: Vec::new(),
            total_prs_created: 0,
            total_prs_merged: 0,
            total_prs_reverted: 0,
            total_reviews_completed: 0,
            total_cost_incurred: 0.0,
            total_supervision_hours: 0.0,
        }
    }

    pub fn config(&self) -> &DeveloperConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn ai_profile(&self) -> Option<&AiProfile> {
        self.ai.as_ref()
    }

    pub fn is_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Display name; falls back to the short id.
    pub fn name(&self) -> String {
        self.config
            .name
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Daily probability of opening a new PR.
    pub fn daily_pr_probability(&self) -> f64 {
        let base = self.config.productivity_rate / self.capabilities.work_days_per_week;
        if self.capabilities.onboarding_curve {
            base * self.productivity_multiplier * self.config.experience_level.multiplier()
        } else {
            base
        }
    }

    fn start_new_week(&mut self) {
        self.weeks_in_role += 1;
        self.hours_available_this_week = self.config.weekly_hours();
    }

    fn update_onboarding(&mut self) {
        if !self.capabilities.onboarding_curve {
            self.is_fully_onboarded = true;
            self.productivity_multiplier = 1.0;
            return;
        }
        if self.is_fully_onboarded {
            return;
        }

        let onboarding_time = self.config.onboarding_time;
        if self.weeks_in_role >= onboarding_time {
            self.is_fully_onboarded = true;
            self.productivity_multiplier = 1.0;
        } else {
            self.productivity_multiplier = self.weeks_in_role as f64 / onboarding_time as f64;
        }
    }

    /// Opens a new PR authored by this member.
    ///
    /// Whether the PR is sound is decided here, once, from code quality.
    /// AI agents tag the PR and accrue its cost.
    pub fn create_pr(&mut self, ctx: &StepContext) -> PullRequest {
        let will_succeed = self.rng.gen::<f64>() < self.config.code_quality;
        let pr_id = PrId::from_rng(&mut self.rng);
        let mut pr = PullRequest::opened(pr_id, self.id, ctx.current_day, will_succeed);

        if let Some(profile) = &self.ai {
            pr.metadata
                .insert(META_CREATED_BY_AI.to_string(), Value::Bool(true));
            pr.metadata.insert(
                META_AI_MODEL.to_string(),
                Value::String(profile.model_type.name().to_string()),
            );
            pr.metadata.insert(
                META_REQUIRES_HUMAN_REVIEW.to_string(),
                Value::Bool(profile.requires_human_review),
            );
            self.total_cost_incurred += profile.cost_per_pr;
        }

        self.active_prs.push(pr_id);
        self.total_prs_created += 1;
        pr
    }

    fn work_on_reviews(&mut self) -> Vec<ReviewId> {
        if self.pending_reviews.is_empty() {
            return Vec::new();
        }

        let completion_probability = self.config.review_capacity / REVIEW_DAYS_PER_WEEK;
        let mut completed = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending_reviews.len());
        for review_id in std::mem::take(&mut self.pending_reviews) {
            if self.rng.gen::<f64>() < completion_probability {
                completed.push(review_id);
            } else {
                still_pending.push(review_id);
            }
        }

        self.total_reviews_completed += completed.len();
        self.pending_reviews = still_pending;
        completed
    }

    /// Whether this member may review `pr`.
    ///
    /// Humans review anything but their own work. AI agents only review
    /// what their configuration explicitly allows.
    pub fn can_review(&self, pr: &PullRequest) -> bool {
        if pr.author_id == self.id {
            return false;
        }
        match &self.ai {
            None => self.capabilities.reviews_by_default,
            Some(profile) if pr.is_ai_authored() => profile.can_review_ai_prs,
            Some(profile) => profile.can_review_human_prs,
        }
    }

    /// Human review hours one of this agent's PRs needs. `None` for humans.
    pub fn supervision_hours_for_pr(&self, _pr: &PullRequest) -> Option<f64> {
        self.ai
            .as_ref()
            .map(|profile| BASE_SUPERVISION_HOURS * profile.supervision_requirement)
    }

    /// Queues a review for this member.
    pub fn assign_review(&mut self, review_id: ReviewId) {
        self.pending_reviews.push(review_id);
    }

    pub fn record_merge(&mut self, pr_id: PrId) {
        self.total_prs_merged += 1;
        self.active_prs.retain(|id| *id != pr_id);
    }

    pub fn record_revert(&mut self) {
        self.total_prs_reverted += 1;
    }

    pub fn record_supervision(&mut self, hours: f64) {
        self.total_supervision_hours += hours;
    }

    pub fn stats(&self) -> MemberStats {
        MemberStats {
            agent_id: self.id,
            name: self.name(),
            agent_type: if self.is_ai() { "ai" } else { "human" }.to_string(),
            experience_level: self.config.experience_level,
            weeks_in_role: self.weeks_in_role,
            is_fully_onboarded: self.is_fully_onboarded,
            productivity_multiplier: self.productivity_multiplier,
            total_prs_created: self.total_prs_created,
            total_prs_merged: self.total_prs_merged,
            total_prs_reverted: self.total_prs_reverted,
            total_reviews_completed: self.total_reviews_completed,
            active_prs: self.active_prs.len(),
            pending_reviews: self.pending_reviews.len(),
            ai: self.ai.as_ref().map(|profile| AiMemberStats {
                model_type: profile.model_type,
                total_cost_incurred: round_to(self.total_cost_incurred, 2),
                avg_cost_per_pr: round_to(
                    self.total_cost_incurred / self.total_prs_created.max(1) as f64,
                    2,
                ),
                supervision_requirement: profile.supervision_requirement,
                total_supervision_hours: round_to(self.total_supervision_hours, 2),
                requires_human_review: profile.requires_human_review,
                can_review_human_prs: profile.can_review_human_prs,
                can_review_ai_prs: profile.can_review_ai_prs,
            }),
        }
    }
}

impl Participant for TeamMember {
    type Turn = TurnOutcome;

    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> &'static str {
        if self.is_ai() {
            "ai_agent"
        } else {
            "developer"
        }
    }

    fn created_at(&self) -> Option<u64> {
        self.created_at
    }

    fn on_admitted(&mut self, timestep: u64) {
        self.created_at = Some(timestep);
        self.hours_available_this_week = self.config.weekly_hours();
    }

    fn take_turn(&mut self, ctx: &StepContext) -> TurnOutcome {
        if ctx.is_week_start() {
            self.start_new_week();
        }
        self.update_onboarding();

        let mut outcome = TurnOutcome::default();
        if self.rng.gen::<f64>() < self.daily_pr_probability() {
            outcome.created.push(self.create_pr(ctx));
        }
        outcome.completed_reviews = self.work_on_reviews();
        outcome
    }
}

/// Serializable per-member summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberStats {
    pub agent_id: AgentId,
    pub name: String,
    pub agent_type: String,
    pub experience_level: ExperienceLevel,
    pub weeks_in_role: u32,
    pub is_fully_onboarded: bool,
    pub productivity_multiplier: f64,
    pub total_prs_created: usize,
    pub total_prs_merged: usize,
    pub total_prs_reverted: usize,
    pub total_reviews_completed: usize,
    pub active_prs: usize,
    pub pending_reviews: usize,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiMemberStats>,
}

/// AI-only additions to [`MemberStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMemberStats {
    pub model_type: AiModelType,
    pub total_cost_incurred: f64,
    pub avg_cost_per_pr: f64,
    pub supervision_requirement: f64,
    pub total_supervision_hours: f64,
    pub requires_human_review: bool,
    pub can_review_human_prs: bool,
    pub can_review_ai_prs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use simlab_env::derive_rng;

    fn human(config: DeveloperConfig) -> TeamMember {
        human_on(config, 0)
    }

    fn human_on(config: DeveloperConfig, stream: u64) -> TeamMember {
        TeamMember::developer(config, derive_rng(42, stream)).unwrap()
    }

    fn ai(config: AiAgentConfig) -> TeamMember {
        ai_on(config, 100)
    }

    fn ai_on(config: AiAgentConfig, stream: u64) -> TeamMember {
        TeamMember::ai_agent(&config, derive_rng(42, stream)).unwrap()
    }

    #[test]
    fn test_developer_defaults() {
        let config = DeveloperConfig::default();
        assert_eq!(config.experience_level, ExperienceLevel::Mid);
        assert_relative_eq!(config.productivity_rate, 3.5);
        assert_relative_eq!(config.code_quality, 0.85);
        assert_eq!(config.onboarding_time, 10);
        assert_relative_eq!(config.weekly_hours(), 40.0 * 0.7 * (1.0 - 5.0 / 40.0));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let bad_quality = DeveloperConfig::default().with_code_quality(1.2);
        assert!(matches!(
            bad_quality.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));

        let bad_rate = DeveloperConfig::default().with_productivity_rate(-1.0);
        assert!(matches!(bad_rate.validate(), Err(ConfigError::Negative { .. })));

        let bad_meetings = DeveloperConfig::default().with_meeting_hours(41.0);
        assert!(bad_meetings.validate().is_err());

        assert!(TeamMember::developer(bad_quality, derive_rng(1, 1)).is_err());
    }

    #[test]
    fn test_experience_parsing() {
        assert_eq!("senior".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Senior);
        assert_eq!("Staff".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Staff);
        assert!(matches!(
            "wizard".parse::<ExperienceLevel>(),
            Err(ConfigError::UnknownVariant { .. })
        ));
        assert_relative_eq!(ExperienceLevel::Principal.multiplier(), 1.7);
    }

    #[test]
    fn test_model_defaults_ordering() {
        for model in AiModelType::ALL {
            let rate = model.default_productivity_rate();
            let quality = model.default_code_quality();
            assert!((5.0..=15.0).contains(&rate));
            assert!((0.75..=0.90).contains(&quality));
        }
        let cheapest = AiModelType::ALL
            .into_iter()
            .min_by(|a, b| a.default_cost_per_pr().total_cmp(&b.default_cost_per_pr()));
        assert_eq!(cheapest, Some(AiModelType::Codellama));
        assert_eq!("gpt4".parse::<AiModelType>().unwrap(), AiModelType::Gpt4);
    }

    #[test]
    fn test_onboarding_ramp() {
        let mut dev = human(DeveloperConfig::default().with_onboarding_time(4));
        dev.on_admitted(0);

        dev.take_turn(&StepContext::new(0, None));
        assert_eq!(dev.weeks_in_role, 1);
        assert_relative_eq!(dev.productivity_multiplier, 0.25);
        assert!(!dev.is_fully_onboarded);

        for day in 1..=21 {
            dev.take_turn(&StepContext::new(day, None));
        }
        assert_eq!(dev.weeks_in_role, 4);
        assert!(dev.is_fully_onboarded);
        assert_relative_eq!(dev.productivity_multiplier, 1.0);
    }

    #[test]
    fn test_zero_onboarding_is_immediate() {
        let mut dev = human(DeveloperConfig::default().with_onboarding_time(0));
        dev.on_admitted(0);
        dev.take_turn(&StepContext::new(0, None));
        assert!(dev.is_fully_onboarded);
        assert_relative_eq!(dev.daily_pr_probability(), 3.5 / 5.0);
    }

    #[test]
    fn test_ai_agent_has_no_onboarding() {
        let agent = ai(AiAgentConfig::default());
        assert!(agent.is_fully_onboarded);
        assert_eq!(agent.config().experience_level, ExperienceLevel::Senior);
        assert_relative_eq!(agent.config().availability, 1.0);
        assert_relative_eq!(agent.daily_pr_probability(), 10.0 / 7.0);
        assert_eq!(agent.name(), "AI-claude-sonnet");
    }

    #[test]
    fn test_ai_cost_accumulates_exactly() {
        let mut agent = ai(AiAgentConfig::default().with_cost_per_pr(0.50));
        let ctx = StepContext::new(0, Some(42));
        for _ in 0..3 {
            let pr = agent.create_pr(&ctx);
            assert!(pr.is_ai_authored());
            assert_eq!(pr.metadata[META_AI_MODEL], "claude-sonnet");
        }
        assert_eq!(agent.total_cost_incurred, 1.50);
        assert_eq!(agent.total_prs_created, 3);
        assert_eq!(agent.active_prs.len(), 3);

        let stats = agent.stats();
        let ai_stats = stats.ai.unwrap();
        assert_relative_eq!(ai_stats.avg_cost_per_pr, 0.5);
    }

    #[test]
    fn test_review_eligibility() {
        let dev = human_on(DeveloperConfig::default(), 1);
        let agent = ai_on(AiAgentConfig::default(), 2);
        let reviewer_ai = ai_on(AiAgentConfig::default().reviewing_human_prs(5.0), 3);

        let ctx = StepContext::new(0, None);
        let human_pr = human_on(DeveloperConfig::default(), 4).create_pr(&ctx);
        let ai_pr = ai_on(AiAgentConfig::new(AiModelType::Gpt4), 5).create_pr(&ctx);

        assert!(!agent.can_review(&human_pr));
        assert!(!agent.can_review(&ai_pr));
        assert!(reviewer_ai.can_review(&human_pr));
        assert!(!reviewer_ai.can_review(&ai_pr));
        assert!(dev.can_review(&ai_pr));
    }

    #[test]
    fn test_author_cannot_review_own_pr() {
        let mut dev = human(DeveloperConfig::default());
        let pr = dev.create_pr(&StepContext::new(0, None));
        assert!(!dev.can_review(&pr));
    }

    #[test]
    fn test_supervision_hours() {
        let agent = ai(AiAgentConfig::new(AiModelType::Codellama));
        let dev = human(DeveloperConfig::default());
        let pr = PullRequest::opened(PrId::from_seed(1), agent.id(), 0, true);
        assert_eq!(agent.supervision_hours_for_pr(&pr), Some(1.0));
        assert_eq!(dev.supervision_hours_for_pr(&pr), None);
    }

    #[test]
    fn test_reviews_complete_at_full_capacity() {
        let mut dev = human(
            DeveloperConfig::default()
                .with_review_capacity(5.0)
                .with_productivity_rate(0.0),
        );
        dev.on_admitted(0);
        dev.assign_review(ReviewId::from_seed(1));
        dev.assign_review(ReviewId::from_seed(2));

        let outcome = dev.take_turn(&StepContext::new(0, None));
        assert!(outcome.created.is_empty());
        assert_eq!(outcome.completed_reviews.len(), 2);
        assert!(dev.pending_reviews.is_empty());
        assert_eq!(dev.total_reviews_completed, 2);
    }

    #[test]
    fn test_ai_without_capacity_never_reviews() {
        let mut agent = ai(AiAgentConfig::default().with_productivity_rate(0.0));
        agent.assign_review(ReviewId::from_seed(1));
        for day in 0..30 {
            let outcome = agent.take_turn(&StepContext::new(day, None));
            assert!(outcome.is_empty());
        }
        assert_eq!(agent.pending_reviews.len(), 1);
    }

    #[test]
    fn test_merge_and_revert_counters() {
        let mut dev = human(DeveloperConfig::default());
        let pr = dev.create_pr(&StepContext::new(0, None));
        dev.record_merge(pr.id);
        dev.record_revert();

        assert!(dev.active_prs.is_empty());
        assert_eq!(dev.total_prs_merged, 1);
        assert_eq!(dev.total_prs_reverted, 1);

        let stats = dev.stats();
        assert_eq!(stats.agent_type, "human");
        assert!(stats.ai.is_none());
    }

    #[test]
    fn test_same_rng_same_behaviour() {
        let run = || {
            let mut dev = human(DeveloperConfig::default().with_onboarding_time(0));
            dev.on_admitted(0);
            (0..20)
                .map(|day| dev.take_turn(&StepContext::new(day, None)).created.len())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
