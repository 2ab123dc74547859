//! Append-only simulation event log.
//!
//! Events are a record of what happened; nothing in the engine reads them
//! back to make decisions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use simlab_env::{AgentId, EventId, SimRng};

/// Kinds of events the simulation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AgentAdded,
    AgentRemoved,
    PrCreated,
    ReviewAssigned,
    PrMerged,
    PrReverted,
    TechDebtCreated,
    IncidentCreated,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::AgentAdded => "agent_added",
            EventKind::AgentRemoved => "agent_removed",
            EventKind::PrCreated => "pr_created",
            EventKind::ReviewAssigned => "review_assigned",
            EventKind::PrMerged => "pr_merged",
            EventKind::PrReverted => "pr_reverted",
            EventKind::TechDebtCreated => "tech_debt_created",
            EventKind::IncidentCreated => "incident_created",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single recorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub timestep: u64,
    pub agent_id: Option<AgentId>,
    /// JSON object with kind-specific fields
    pub data: Value,
}

/// Ordered event store. Ids come from a dedicated RNG stream so that a
/// seeded run reproduces them.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<SimulationEvent>,
    id_rng: SimRng,
}

impl EventLog {
    pub fn new(id_rng: SimRng) -> Self {
        Self {
            events: Vec::new(),
            id_rng,
        }
    }

    /// Appends an event and returns its id.
    pub fn log(
        &mut self,
        kind: EventKind,
        timestep: u64,
        agent_id: Option<AgentId>,
        data: Value,
    ) -> EventId {
        let id = EventId::from_rng(&mut self.id_rng);
        self.events.push(SimulationEvent {
            id,
            kind,
            timestep,
            agent_id,
            data,
        });
        id
    }

    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    pub fn by_kind(&self, kind: EventKind) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn by_agent(&self, agent_id: AgentId) -> impl Iterator<Item = &SimulationEvent> {
        self.events
            .iter()
            .filter(move |e| e.agent_id == Some(agent_id))
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.by_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
