//! Typed identifiers for every entity in the KollabX schema.
//!
//! The backend keys every row with a UUID. Wrapping each table's key in its
//! own newtype keeps a `ChannelId` from ever being passed where a
//! `ProjectId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
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

entity_id! {
    /// Identifier of a user account (and of its profile row).
    UserId
}

entity_id! {
    /// Identifier of a project.
    ProjectId
}

entity_id! {
    /// Identifier of a chat channel within a project.
    ChannelId
}

entity_id! {
    /// Identifier of a single chat message.
    MessageId
}

entity_id! {
    /// Identifier of a project application.
    ApplicationId
}

entity_id! {
    /// Identifier of a notification row.
    NotificationId
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
