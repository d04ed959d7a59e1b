// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stable entity identifiers.
//!
//! Coordinate tables and indexes are keyed by these ids, never by object
//! identity, so a layout stays meaningful across clones of a study.

use core::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the raw identifier.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifies a [`Phase`](crate::Phase).
    PhaseId
);
entity_id!(
    /// Identifies a [`Group`](crate::Group).
    GroupId
);
entity_id!(
    /// Identifies a [`Treatment`](crate::Treatment).
    TreatmentId
);
entity_id!(
    /// Identifies a [`Sampling`](crate::Sampling).
    SamplingId
);
entity_id!(
    /// Identifies a [`Measurement`](crate::Measurement).
    MeasurementId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_transparent_in_json() {
        let id: GroupId = serde_json::from_str("7").unwrap();
        assert_eq!(id, GroupId(7));
        assert_eq!(serde_json::to_string(&PhaseId(3)).unwrap(), "3");
        assert_eq!(id.to_string(), "7");
    }
}
