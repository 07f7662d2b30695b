//! Branded/newtype id types for type safety.
//!
//! Each id wraps a [`Uuid`] — the spec calls these "opaque 128-bit ids", and
//! `Uuid` is the idiomatic wire/storage representation for that (serializes
//! as a plain string, parses back losslessly, `Copy`).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing uuid (e.g. one read back from storage).
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_id!(
    /// Identifies one duel from creation through resolution.
    BattleId
);

define_id!(
    /// Opaque id of the match this battle belongs to, carried to end events.
    MatchId
);

define_id!(
    /// Identifies a connected player; matched against a battle's two sides.
    PlayerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_string() {
        let id = BattleId::new_random();
        let s = id.to_string();
        let parsed: BattleId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = BattleId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn distinct_ids_are_distinct() {
        assert_ne!(BattleId::new_random(), BattleId::new_random());
    }
}
