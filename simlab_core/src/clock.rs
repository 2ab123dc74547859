//! Discrete-time simulation clock.
//!
//! The clock owns the participants, the day counter and the event log. One
//! tick gives every participant a turn, in registration order, then moves
//! the day forward. Whatever the turns produce goes back to the caller.

use crate::events::{EventKind, EventLog};
use serde_json::json;
use simlab_env::{derive_rng, resolve_seed, AgentId, Participant, StepContext};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// RNG stream extension reserved for event ids.
const EVENT_STREAM: u64 = 0xE7E7_0000;

/// Shared flag that asks a running simulation to stop between ticks.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Takes effect before the next tick.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub(crate) fn clear(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }
}

/// Day counter, participants and event log for one run.
pub struct Clock<P: Participant> {
    current_day: u64,
    seed: Option<u64>,
    master_seed: u64,
    participants: Vec<P>,
    events: EventLog,
    stop: StopHandle,
    is_running: bool,
}

impl<P: Participant> Clock<P> {
    /// Creates a clock at day 0. Unseeded clocks draw a master seed from
    /// OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let master_seed = resolve_seed(seed);
        Self {
            current_day: 0,
            seed,
            master_seed,
            participants: Vec::new(),
            events: EventLog::new(derive_rng(master_seed, EVENT_STREAM)),
            stop: StopHandle::new(),
            is_running: false,
        }
    }

    pub fn current_day(&self) -> u64 {
        self.current_day
    }

    /// The configured seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// The seed every RNG stream of this run derives from.
    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Admits a participant, stamping its creation day.
    pub fn add(&mut self, mut participant: P) -> AgentId {
        participant.on_admitted(self.current_day);
        let id = participant.id();
        self.events.log(
            EventKind::AgentAdded,
            self.current_day,
            Some(id),
            json!({ "agent_type": participant.kind() }),
        );
        debug!(agent = %id, kind = participant.kind(), day = self.current_day, "Participant added");
        self.participants.push(participant);
        id
    }

    /// Removes a participant by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: AgentId) -> Option<P> {
        let index = self.participants.iter().position(|p| p.id() == id)?;
        let participant = self.participants.remove(index);
        self.events.log(
            EventKind::AgentRemoved,
            self.current_day,
            Some(id),
            json!({ "agent_type": participant.kind() }),
        );
        Some(participant)
    }

    pub fn participants(&self) -> &[P] {
        &self.participants
    }

    pub fn participants_mut(&mut self) -> &mut [P] {
        &mut self.participants
    }

    pub fn get(&self, id: AgentId) -> Option<&P> {
        self.participants.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut P> {
        self.participants.iter_mut().find(|p| p.id() == id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    /// Read-only view of the current day for participants.
    pub fn context(&self) -> StepContext {
        StepContext::new(self.current_day, self.seed)
    }

    /// Gives every participant its turn for the current day.
    pub fn take_turns(&mut self) -> Vec<P::Turn> {
        let ctx = self.context();
        self.participants
            .iter_mut()
            .map(|p| p.take_turn(&ctx))
            .collect()
    }

    /// Moves to the next day.
    pub fn advance(&mut self) {
        self.current_day += 1;
    }

    /// One full tick: turns, then advance.
    pub fn step(&mut self) -> Vec<P::Turn> {
        let turns = self.take_turns();
        self.advance();
        turns
    }

    /// Steps up to `num_steps` times, stopping early if a stop is requested.
    /// Returns the number of ticks executed.
    pub fn run(&mut self, num_steps: u64) -> u64 {
        self.begin_run();
        let mut executed = 0;
        for _ in 0..num_steps {
            if self.should_stop() {
                break;
            }
            self.step();
            executed += 1;
        }
        self.end_run();
        executed
    }

    /// Handle for stopping a run from outside the tick loop.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub(crate) fn begin_run(&mut self) {
        self.stop.clear();
        self.is_running = true;
    }

    pub(crate) fn end_run(&mut self) {
        self.is_running = false;
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.stop.is_stop_requested()
    }

    /// Back to day 0 with no participants and no events.
    pub fn reset(&mut self) {
        self.current_day = 0;
        self.events.clear();
        self.participants.clear();
        self.stop.clear();
        self.is_running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        id: AgentId,
        admitted: Option<u64>,
        days_seen: Vec<u64>,
        stop_on: Option<(u64, StopHandle)>,
    }

    impl Counter {
        fn new(seed: u64) -> Self {
            Self {
                id: AgentId::from_seed(seed),
                admitted: None,
                days_seen: Vec::new(),
                stop_on: None,
            }
        }
    }

    impl Participant for Counter {
        type Turn = u64;

        fn id(&self) -> AgentId {
            self.id
        }

        fn kind(&self) -> &'static str {
            "counter"
        }

        fn created_at(&self) -> Option<u64> {
            self.admitted
        }

        fn on_admitted(&mut self, timestep: u64) {
            self.admitted = Some(timestep);
        }

        fn take_turn(&mut self, ctx: &StepContext) -> u64 {
            self.days_seen.push(ctx.current_day);
            if let Some((day, handle)) = &self.stop_on {
                if *day == ctx.current_day {
                    handle.stop();
                }
            }
            ctx.current_day
        }
    }

    #[test]
    fn test_add_stamps_creation_and_logs() {
        let mut clock: Clock<Counter> = Clock::new(Some(42));
        clock.advance();
        clock.advance();
        let id = clock.add(Counter::new(1));

        assert_eq!(clock.get(id).and_then(|c| c.created_at()), Some(2));
        assert_eq!(clock.events().count(EventKind::AgentAdded), 1);
        let event = &clock.events().events()[0];
        assert_eq!(event.data["agent_type"], "counter");
    }

    #[test]
    fn test_step_runs_turns_in_order_then_advances() {
        let mut clock = Clock::new(Some(1));
        clock.add(Counter::new(1));
        clock.add(Counter::new(2));

        let turns = clock.step();
        assert_eq!(turns, vec![0, 0]);
        assert_eq!(clock.current_day(), 1);
        assert_eq!(clock.context().current_week, 0);
    }

    #[test]
    fn test_run_and_context_week() {
        let mut clock = Clock::new(Some(1));
        clock.add(Counter::new(1));
        assert_eq!(clock.run(15), 15);
        assert_eq!(clock.current_day(), 15);
        assert_eq!(clock.context().current_week, 2);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_stop_between_ticks() {
        let mut clock = Clock::new(Some(1));
        let mut counter = Counter::new(1);
        counter.stop_on = Some((3, clock.stop_handle()));
        clock.add(counter);

        let executed = clock.run(10);
        assert_eq!(executed, 4);
        assert_eq!(clock.current_day(), 4);
    }

    #[test]
    fn test_remove_and_reset() {
        let mut clock = Clock::new(Some(1));
        let a = clock.add(Counter::new(1));
        clock.add(Counter::new(2));

        assert!(clock.remove(a).is_some());
        assert!(clock.remove(a).is_none());
        assert_eq!(clock.len(), 1);
        assert_eq!(clock.events().count(EventKind::AgentRemoved), 1);

        clock.step();
        clock.reset();
        assert_eq!(clock.current_day(), 0);
        assert!(clock.is_empty());
        assert!(clock.events().is_empty());
    }

    #[test]
    fn test_seeded_clock_keeps_seed() {
        let clock: Clock<Counter> = Clock::new(Some(77));
        assert_eq!(clock.seed(), Some(77));
        assert_eq!(clock.master_seed(), 77);
    }
}
