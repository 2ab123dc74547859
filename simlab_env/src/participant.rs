//! The contract every turn-taking participant fulfils.

use crate::{AgentId, StepContext};

/// A participant registered with the simulation clock.
///
/// The clock calls [`take_turn`](Participant::take_turn) once per tick, in
/// registration order. Participants never reach back into the simulation:
/// whatever a turn produces is returned as `Turn` and absorbed by the
/// owner of the clock.
pub trait Participant {
    /// What a single turn hands back to the orchestrator.
    type Turn;

    /// Stable identity of this participant.
    fn id(&self) -> AgentId;

    /// Short type label used in event payloads (e.g. `"developer"`).
    fn kind(&self) -> &'static str;

    /// Timestep at which the participant was admitted, if it has been.
    fn created_at(&self) -> Option<u64>;

    /// Called once when the participant is added to a simulation.
    fn on_admitted(&mut self, timestep: u64);

    /// Executes one simulated day.
    ///
    /// Must not panic: there is no isolation between participants within
    /// a tick.
    fn take_turn(&mut self, ctx: &StepContext) -> Self::Turn;
}
