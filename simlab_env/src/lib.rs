//! SimLab Environment Abstraction Layer
//!
//! This crate holds everything the SimLab engine needs from "outside" a
//! single simulated day, so that the engine itself stays a pure function of
//! its inputs and one 64-bit seed:
//! - **Identity**: UUID-backed ids minted from the run's seeded RNG
//! - **Time**: a logical day counter exposed through [`StepContext`]
//! - **Randomness**: ChaCha8 streams derived from a master seed
//! - **Participation**: the [`Participant`] contract the clock drives
//!
//! By deriving all entropy from a single seed, any run becomes
//! reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use simlab_env::{derive_rng, StepContext, Participant};
//!
//! let mut rng = derive_rng(42, 0);
//! let ctx = StepContext::new(8, Some(42));
//! assert_eq!(ctx.current_week, 1);
//! let turn = member.take_turn(&ctx);
//! ```

mod context;
mod error;
mod participant;
mod types;

pub use context::{derive_rng, resolve_seed, SimRng, StepContext};
pub use error::ConfigError;
pub use participant::Participant;
pub use types::{AgentId, DebtId, EventId, IncidentId, PrId, ReviewId};
