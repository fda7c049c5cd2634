//! Strongly-typed identifier value objects.
//!
//! Every persisted row in the billing workflow is keyed by a UUID. The
//! `uuid_id!` macro generates the newtype plus the conversions the adapters
//! need, so ids of different entities can never be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generates a UUID-backed identifier newtype.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a recurring billing agreement.
    SubscriptionId
);
uuid_id!(
    /// Identifier of a catalog plan.
    PlanId
);
uuid_id!(
    /// Identifier of a single billing event.
    InvoiceId
);
uuid_id!(
    /// Identifier of a donation.
    DonationId
);
uuid_id!(
    /// Identifier of an account holder, issued by the hosted auth backend.
    UserId
);
