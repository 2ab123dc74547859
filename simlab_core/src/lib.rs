//! SimLab Core - discrete-time simulation of software delivery teams
//!
//! Human developers and AI coding agents open pull requests, review each
//! other's work, merge, and occasionally revert. Around that loop the engine
//! models:
//! 1. **Onboarding**: new hires ramp up linearly over their onboarding time
//! 2. **Quality**: latent defects surface as reverts or turn into debt
//! 3. **Operations**: incidents scale with debt and recent reverts
//! 4. **Coordination**: communication overhead reported per team size

pub mod clock;
pub mod debt;
pub mod engine;
pub mod events;
pub mod member;
pub mod metrics;
pub mod overhead;
pub mod work;

// Re-export key types for convenience
pub use clock::{Clock, StopHandle};
pub use debt::{DebtLedger, DebtStats, TechnicalDebtItem};
pub use engine::{SdlcSimulation, SimulationParams};
pub use events::{EventKind, EventLog, SimulationEvent};
pub use member::{
    AiAgentConfig, AiModelType, AiProfile, Capabilities, DeveloperConfig, ExperienceLevel,
    MemberStats, TeamMember, TurnOutcome,
};
pub use metrics::MetricsSnapshot;
pub use overhead::CommunicationOverheadModel;
pub use work::{CodeReview, Incident, PrState, PullRequest, Severity, TransitionError};
