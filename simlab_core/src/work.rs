//! Work items: pull requests, code reviews and production incidents.
//!
//! Pull requests are the atomic unit of delivered work. Their lifecycle is a
//! small state machine:
//!
//! ```text
//! Draft ──open──► Open ──start_review──► InReview ──add_approval──► Approved ──merge──► Merged ──revert──► Reverted
//!   │              │                        │                          │
//!   └──────────────┴────────── close ───────┴──────────────────────────┘──► Closed
//! ```
//!
//! Every transition is checked; an illegal edge returns a [`TransitionError`]
//! and leaves the pull request untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use simlab_env::{AgentId, IncidentId, PrId, ReviewId};
use std::collections::BTreeMap;
use thiserror::Error;

/// Metadata key marking AI authorship.
pub const META_CREATED_BY_AI: &str = "created_by_ai";
/// Metadata key holding the authoring model name.
pub const META_AI_MODEL: &str = "ai_model";
/// Metadata key recording whether a human must review the PR.
pub const META_REQUIRES_HUMAN_REVIEW: &str = "requires_human_review";

/// Pull request states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    Draft,
    Open,
    InReview,
    Approved,
    Merged,
    Reverted,
    Closed,
}

impl PrState {
    /// Returns the state name.
    pub fn name(&self) -> &'static str {
        match self {
            PrState::Draft => "draft",
            PrState::Open => "open",
            PrState::InReview => "in_review",
            PrState::Approved => "approved",
            PrState::Merged => "merged",
            PrState::Reverted => "reverted",
            PrState::Closed => "closed",
        }
    }

    /// States from which the PR can still be abandoned.
    pub fn is_pre_merge(&self) -> bool {
        matches!(
            self,
            PrState::Draft | PrState::Open | PrState::InReview | PrState::Approved
        )
    }
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A refused pull-request state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} PR {pr} in state {from}")]
pub struct TransitionError {
    pub pr: PrId,
    pub from: PrState,
    pub action: &'static str,
}

/// A pull request in the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: PrId,
    pub author_id: AgentId,
    pub created_at: u64,

    /// Relative complexity (1.0 = average)
    pub complexity: f64,

    pub state: PrState,

    /// Assigned reviewers, in assignment order
    pub reviewers: Vec<AgentId>,

    /// Distinct approvers, in approval order
    pub approvals: Vec<AgentId>,
    pub required_approvals: usize,

    pub opened_at: Option<u64>,
    pub merged_at: Option<u64>,
    pub reverted_at: Option<u64>,
    pub closed_at: Option<u64>,

    /// Decided once at creation from the author's code quality
    pub will_succeed: bool,
    pub was_reverted: bool,

    /// 0-1, reserved for communication-loss modelling
    pub requirements_clarity: f64,

    pub metadata: BTreeMap<String, Value>,
}

impl PullRequest {
    /// Creates a draft PR.
    pub fn new(id: PrId, author_id: AgentId, created_at: u64, will_succeed: bool) -> Self {
        Self {
            id,
            author_id,
            created_at,
            complexity: 1.0,
            state: PrState::Draft,
            reviewers: Vec::new(),
            approvals: Vec::new(),
            required_approvals: 1,
            opened_at: None,
            merged_at: None,
            reverted_at: None,
            closed_at: None,
            will_succeed,
            was_reverted: false,
            requirements_clarity: 1.0,
            metadata: BTreeMap::new(),
        }
    }

    /// Creates a PR that is already open, the way authors publish work.
    pub fn opened(id: PrId, author_id: AgentId, timestep: u64, will_succeed: bool) -> Self {
        let mut pr = Self::new(id, author_id, timestep, will_succeed);
        pr.state = PrState::Open;
        pr.opened_at = Some(timestep);
        pr
    }

    fn refuse(&self, action: &'static str) -> TransitionError {
        TransitionError {
            pr: self.id,
            from: self.state,
            action,
        }
    }

    /// Draft → Open.
    pub fn open(&mut self, timestep: u64) -> Result<(), TransitionError> {
        if self.state != PrState::Draft {
            return Err(self.refuse("open"));
        }
        self.state = PrState::Open;
        self.opened_at = Some(timestep);
        Ok(())
    }

    /// Open → InReview.
    pub fn start_review(&mut self) -> Result<(), TransitionError> {
        if self.state != PrState::Open {
            return Err(self.refuse("start review on"));
        }
        self.state = PrState::InReview;
        Ok(())
    }

    /// Records an approval; the PR becomes Approved once enough distinct
    /// reviewers have approved. Repeated approvals are no-ops.
    pub fn add_approval(&mut self, reviewer_id: AgentId) -> Result<(), TransitionError> {
        if !matches!(
            self.state,
            PrState::Open | PrState::InReview | PrState::Approved
        ) {
            return Err(self.refuse("approve"));
        }

        if !self.approvals.contains(&reviewer_id) {
            self.approvals.push(reviewer_id);
        }

        if self.approvals.len() >= self.required_approvals {
            self.state = PrState::Approved;
        }
        Ok(())
    }

    /// Approved → Merged.
    pub fn merge(&mut self, timestep: u64) -> Result<(), TransitionError> {
        if self.state != PrState::Approved {
            return Err(self.refuse("merge"));
        }
        self.state = PrState::Merged;
        self.merged_at = Some(timestep);
        Ok(())
    }

    /// Merged → Reverted. Clears `merged_at`; `was_reverted` is permanent.
    pub fn revert(&mut self, timestep: u64) -> Result<(), TransitionError> {
        if self.state != PrState::Merged {
            return Err(self.refuse("revert"));
        }
        self.state = PrState::Reverted;
        self.reverted_at = Some(timestep);
        self.merged_at = None;
        self.was_reverted = true;
        Ok(())
    }

    /// Abandons an unmerged PR.
    pub fn close(&mut self, timestep: u64) -> Result<(), TransitionError> {
        if !self.state.is_pre_merge() {
            return Err(self.refuse("close"));
        }
        self.state = PrState::Closed;
        self.closed_at = Some(timestep);
        Ok(())
    }

    pub fn is_merged(&self) -> bool {
        self.state == PrState::Merged
    }

    /// Days from open to merge, once both have happened.
    pub fn cycle_time(&self) -> Option<u64> {
        match (self.opened_at, self.merged_at) {
            (Some(opened), Some(merged)) => Some(merged.saturating_sub(opened)),
            _ => None,
        }
    }

    /// True if the PR carries AI authorship metadata.
    pub fn is_ai_authored(&self) -> bool {
        self.metadata
            .get(META_CREATED_BY_AI)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// One reviewer's pass over one pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeReview {
    pub id: ReviewId,
    pub pr_id: PrId,
    pub reviewer_id: AgentId,
    pub started_at: u64,
    pub completed_at: Option<u64>,
    pub approved: bool,

    /// Hours spent reviewing
    pub time_invested: f64,
}

impl CodeReview {
    pub fn new(id: ReviewId, pr_id: PrId, reviewer_id: AgentId, started_at: u64) -> Self {
        Self {
            id,
            pr_id,
            reviewer_id,
            started_at,
            completed_at: None,
            approved: false,
            time_invested: 0.0,
        }
    }

    /// Marks the review complete.
    pub fn complete(&mut self, timestep: u64, approved: bool) {
        self.completed_at = Some(timestep);
        self.approved = approved;
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Incident severity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Baseline resolution effort in hours.
    pub fn estimated_hours(&self) -> f64 {
        match self {
            Severity::Low => 4.0,
            Severity::Medium => 8.0,
            Severity::High => 12.0,
            Severity::Critical => 16.0,
        }
    }

    /// Maps a uniform draw in `[0, 1)` onto the severity distribution
    /// (10% critical, 20% high, 40% medium, 30% low).
    pub fn from_roll(roll: f64) -> Self {
        if roll < 0.1 {
            Severity::Critical
        } else if roll < 0.3 {
            Severity::High
        } else if roll < 0.7 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A production incident requiring developer attention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub created_at: u64,
    pub resolved_at: Option<u64>,
    pub severity: Severity,
    pub assigned_to: Vec<AgentId>,
    pub estimated_hours: f64,
    pub hours_invested: f64,
    pub caused_by_pr: Option<PrId>,
}

impl Incident {
    pub fn new(id: IncidentId, created_at: u64, severity: Severity) -> Self {
        Self {
            id,
            created_at,
            resolved_at: None,
            severity,
            assigned_to: Vec::new(),
            estimated_hours: severity.estimated_hours(),
            hours_invested: 0.0,
            caused_by_pr: None,
        }
    }

    /// Assigns a responder (no duplicates).
    pub fn assign(&mut self, agent_id: AgentId) {
        if !self.assigned_to.contains(&agent_id) {
            self.assigned_to.push(agent_id);
        }
    }

    pub fn add_work(&mut self, hours: f64) {
        self.hours_invested += hours;
    }

    pub fn resolve(&mut self, timestep: u64) {
        self.resolved_at = Some(timestep);
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Days from creation to resolution.
    pub fn time_to_resolve(&self) -> Option<u64> {
        self.resolved_at
            .map(|resolved| resolved.saturating_sub(self.created_at))
    }
}
