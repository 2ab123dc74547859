//! Identifier types shared by every SimLab crate.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random id from OS entropy.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from a UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Draws a v4 id from a seeded RNG (for simulation).
            pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
                let bytes: [u8; 16] = rng.gen();
                Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }

            /// Creates a deterministic id from a seed.
            pub fn from_seed(seed: u64) -> Self {
                let mut bytes = [0u8; 16];
                bytes[0..8].copy_from_slice(&seed.to_le_bytes());
                bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
                Self(Uuid::from_bytes(bytes))
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // Show first 8 chars for readability
                write!(f, "{}", &self.0.to_string()[..8])
            }
        }
    };
}

define_id!(
    /// Unique identifier for a team member (human developer or AI agent).
    AgentId
);

define_id!(
    /// Unique identifier for a pull request.
    PrId
);

define_id!(
    /// Unique identifier for a code review.
    ReviewId
);

define_id!(
    /// Unique identifier for a production incident.
    IncidentId
);

define_id!(
    /// Unique identifier for a technical-debt item.
    DebtId
);

define_id!(
    /// Unique identifier for a logged simulation event.
    EventId
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive_rng;

    #[test]
    fn test_ids_from_same_rng_seed_match() {
        let mut rng1 = derive_rng(42, 7);
        let mut rng2 = derive_rng(42, 7);

        assert_eq!(PrId::from_rng(&mut rng1), PrId::from_rng(&mut rng2));
    }

    #[test]
    fn test_ids_from_rng_are_distinct() {
        let mut rng = derive_rng(42, 0);
        let a = AgentId::from_rng(&mut rng);
        let b = AgentId::from_rng(&mut rng);

        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_from_seed_is_deterministic() {
        assert_eq!(AgentId::from_seed(3), AgentId::from_seed(3));
        assert_ne!(AgentId::from_seed(3), AgentId::from_seed(4));
    }

    #[test]
    fn test_display_is_short() {
        let id = ReviewId::from_seed(1);
        assert_eq!(id.to_string().len(), 8);
    }
}
